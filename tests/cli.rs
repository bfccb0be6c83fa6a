//! 命令行集成测试

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const PAGE: &str = "<html><head><meta charset=\"utf-8\"></head><body><h1>Hello  world</h1><p>Stay</p></body></html>";

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page.html"), PAGE).unwrap();
    fs::create_dir(dir.path().join("translations")).unwrap();
    fs::write(
        dir.path().join("translations").join("about.json"),
        r#"{"en": {"Hello world": "Bonjour"}, "th": null}"#,
    )
    .unwrap();
    dir
}

fn pagelingo(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pagelingo").unwrap();
    cmd.current_dir(dir).env("PAGELINGO_LOG_LEVEL", "error").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_translates_to_output_file() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about?lang=en",
            "--translations",
            "translations",
            "-o",
            "out.html",
        ])
        .assert()
        .success();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("about [en] apply"));
    assert!(stderr.contains("written=1"));

    let html = fs::read_to_string(dir.path().join("out.html")).unwrap();
    assert!(html.contains("<h1>Bonjour</h1>"));
    assert!(html.contains("<p>Stay</p>"));
}

#[test]
fn test_lang_flag_overrides_url() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about",
            "--lang",
            "en",
            "--translations",
            "translations",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("<h1>Bonjour</h1>"));
}

#[test]
fn test_absent_language_is_empty_table() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about?lang=th",
            "--translations",
            "translations",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("<h1>Hello  world</h1>"));
}

#[test]
fn test_missing_document_writes_original() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/contacts?lang=en",
            "--translations",
            "translations",
        ])
        .assert()
        .success();

    let output = assert.get_output();
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert!(stdout.contains("<h1>Hello  world</h1>"));
    assert!(stderr.contains("contacts [en] untranslated"));
}

#[test]
fn test_strict_fails_on_missing_document() {
    let dir = workspace();

    pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/contacts?lang=en",
            "--translations",
            "translations",
            "--strict",
        ])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_switcher_injection() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about?lang=en",
            "--translations",
            "translations",
            "--switcher",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("id=\"tilda-lang-switcher\""));
    assert!(stdout.contains("data-lang=\"th\""));
    assert!(stdout.contains(">EN</button>"));
}

#[test]
fn test_config_file_changes_languages() {
    let dir = workspace();
    fs::write(
        dir.path().join("custom.toml"),
        "[languages]\nsupported = [\"en\", \"de\"]\ndefault = \"en\"\n",
    )
    .unwrap();

    // en 是默认语言，不需要翻译文档
    let assert = pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/missing?lang=en",
            "--translations",
            "translations",
            "--config",
            "custom.toml",
            "--strict",
        ])
        .assert()
        .success();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("missing [en] restore"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = workspace();
    fs::write(
        dir.path().join("broken.toml"),
        "[languages]\nsupported = [\"en\"]\ndefault = \"fr\"\n",
    )
    .unwrap();

    pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about",
            "--config",
            "broken.toml",
        ])
        .assert()
        .failure();
}

#[test]
fn test_invalid_env_override_is_rejected() {
    let dir = workspace();

    let assert = pagelingo(dir.path())
        .env("PAGELINGO_RESCAN_INTERVAL_MS", "soon")
        .args([
            "page.html",
            "--url",
            "https://site.example/about?lang=en",
            "--translations",
            "translations",
        ])
        .assert()
        .failure()
        .code(1);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("PAGELINGO_RESCAN_INTERVAL_MS"));
}

#[test]
fn test_env_help() {
    let dir = tempfile::tempdir().unwrap();

    let assert = pagelingo(dir.path()).arg("--env-help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("PAGELINGO_LOG_LEVEL"));
    assert!(stdout.contains("PAGELINGO_RESCAN_INTERVAL_MS"));
}

#[test]
fn test_init_config_round_trips() {
    let dir = workspace();

    pagelingo(dir.path())
        .args(["--init-config", "generated.toml"])
        .assert()
        .success();

    pagelingo(dir.path())
        .args([
            "page.html",
            "--url",
            "https://site.example/about?lang=en",
            "--translations",
            "translations",
            "--config",
            "generated.toml",
        ])
        .assert()
        .success();
}
