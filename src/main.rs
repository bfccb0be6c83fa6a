//! 命令行预渲染入口
//!
//! 读入 HTML，按页面地址解析语言，替换译文后输出静态文档。

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::Level;

use pagelingo::config::ConfigManager;
use pagelingo::dom::{load_document, serialize_document};
use pagelingo::env::{self, EnvVar};
use pagelingo::error::{LingoError, LingoResult};
use pagelingo::location::{PageLocation, SessionState};
use pagelingo::source::FileSource;
use pagelingo::{prerender, switcher, EngineConfig, PassReport, TranslationSource};

/// 将页面文本替换为指定语言的译文
#[derive(Debug, Parser)]
#[command(name = "pagelingo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Substitute page text with translations resolved from the page URL")]
struct Cli {
    /// Input HTML file, `-` for stdin
    #[arg(required_unless_present_any = ["env_help", "init_config"])]
    input: Option<String>,

    /// Address the page is served from (language and page id are derived from it)
    #[arg(short, long, required_unless_present_any = ["env_help", "init_config"])]
    url: Option<String>,

    /// Override the language carried by the URL
    #[arg(short, long)]
    lang: Option<String>,

    /// Read `{page}.json` translation documents from this directory
    #[arg(short, long, conflicts_with = "remote")]
    translations: Option<PathBuf>,

    /// Fetch translation documents from the configured remote source
    #[arg(long)]
    remote: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Fallback charset of the input document
    #[arg(short = 'E', long, default_value = "utf-8")]
    encoding: String,

    /// Inject the language switcher widget
    #[arg(short, long)]
    switcher: bool,

    /// Fail when the translation table cannot be loaded
    #[arg(long)]
    strict: bool,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_help: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<String>,
}

fn init_logging() {
    let level = env::core::LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let no_color = env::core::NoColor::get_or_default(false);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> LingoResult<EngineConfig> {
    let manager = match path {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    Ok(manager.into_config())
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Ok(data)
    } else {
        fs::read(input)
    }
}

async fn translate<S: TranslationSource>(
    cli: &Cli,
    data: &[u8],
    location: &PageLocation,
    config: &EngineConfig,
    source: &S,
) -> LingoResult<(Vec<u8>, Result<PassReport, LingoError>)> {
    let (dom, encoding) = load_document(data, &cli.encoding)?;

    let result = prerender(&dom.document, location, config, source).await;
    if let Err(LingoError::Load(error)) = &result {
        if cli.strict {
            return Err(LingoError::Load(error.clone()));
        }
        tracing::warn!("翻译表不可用，输出原文: {}", error);
    }

    if cli.switcher {
        let session = SessionState::resolve(location, config);
        switcher::ensure_switcher(&dom, &config.language_set(), &session.language);
    }

    let bytes = serialize_document(&dom.document, &encoding)?;
    Ok((bytes, result))
}

async fn run(cli: Cli) -> LingoResult<()> {
    let (Some(input), Some(url)) = (cli.input.as_deref(), cli.url.as_deref()) else {
        return Err(LingoError::Config("缺少输入文件或页面地址".to_string()));
    };

    let config = load_config(cli.config.as_deref())?;

    let mut location = PageLocation::parse(url)?;
    if let Some(lang) = cli.lang.as_deref() {
        location = PageLocation::from(location.with_language(&config.languages.query_param, lang));
    }

    let data = read_input(input)?;

    let (bytes, result) = match (&cli.translations, cli.remote) {
        (Some(dir), _) => translate(&cli, &data, &location, &config, &FileSource::new(dir)).await?,
        (None, true) => remote_translate(&cli, &data, &location, &config).await?,
        (None, false) => {
            return Err(LingoError::Config(
                "需要通过 --translations 或 --remote 指定翻译源".to_string(),
            ))
        }
    };

    match &cli.output {
        Some(path) => fs::write(path, &bytes)?,
        None => io::stdout().write_all(&bytes)?,
    }

    let session = SessionState::resolve(&location, &config);
    match result {
        Ok(report) => eprintln!("{} [{}] {}", session.page_id, session.language, report),
        Err(LingoError::Load(error)) => {
            eprintln!("{} [{}] untranslated: {}", session.page_id, session.language, error)
        }
        Err(error) => return Err(error),
    }

    Ok(())
}

#[cfg(feature = "http")]
async fn remote_translate(
    cli: &Cli,
    data: &[u8],
    location: &PageLocation,
    config: &EngineConfig,
) -> LingoResult<(Vec<u8>, Result<PassReport, LingoError>)> {
    let source = pagelingo::source::HttpSource::new(&config.source)?;
    translate(cli, data, location, config, &source).await
}

#[cfg(not(feature = "http"))]
async fn remote_translate(
    _cli: &Cli,
    _data: &[u8],
    _location: &PageLocation,
    _config: &EngineConfig,
) -> LingoResult<(Vec<u8>, Result<PassReport, LingoError>)> {
    Err(LingoError::Config(
        "未启用 http 特性，请使用 --translations 指定本地目录".to_string(),
    ))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if cli.env_help {
        print!("{}", env::generate_env_docs());
        return;
    }

    if let Some(path) = cli.init_config.as_deref() {
        if let Err(error) = ConfigManager::generate_example_config(path) {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
        return;
    }

    if let Err(error) = run(cli).await {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}
