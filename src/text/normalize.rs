//! 文本规范化
//!
//! 翻译表的键和快照条目的键都必须经过同一个函数，任何分歧都会让匹配静默失效。

use std::sync::OnceLock;

use regex::Regex;

fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    // 在小写之后运行，所以只需匹配小写拼写
    ENTITY.get_or_init(|| Regex::new(r"&(?:nbsp|#0*160|#x0*a0);").expect("valid entity regex"))
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// 规范化文本：小写、不换行空格实体替换为空格、折叠空白、去除首尾空白
///
/// 实体替换先于空白折叠，保证 `normalize(normalize(s)) == normalize(s)`。
///
/// # Examples
///
/// ```rust
/// use pagelingo::text::normalize;
///
/// assert_eq!(normalize("  Hello\n\tWORLD "), "hello world");
/// assert_eq!(normalize("Hello&nbsp;World"), "hello world");
/// assert_eq!(normalize("Hello\u{a0}World"), "hello world");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let decoded = entity_regex().replace_all(&lowered, " ");
    whitespace_regex()
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_runs() {
        assert_eq!(normalize("Hello   \r\n  world"), "hello world");
        assert_eq!(normalize("\n\n"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_nbsp_spellings_are_equivalent() {
        let expected = "hello world";
        assert_eq!(normalize("Hello&nbsp;world"), expected);
        assert_eq!(normalize("Hello&NBSP;world"), expected);
        assert_eq!(normalize("Hello&#160;world"), expected);
        assert_eq!(normalize("Hello&#xA0;world"), expected);
        assert_eq!(normalize("Hello\u{a0}world"), expected);
        assert_eq!(normalize("Hello &nbsp; world"), expected);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(normalize("ПРИВЕТ Мир"), normalize("привет мир"));
        assert_eq!(normalize("Hello World"), normalize("hELLO wORLD"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "  Mixed CASE\ttext\n",
            "a &nbsp; &#160; b",
            "&&nbsp;nbsp;",
            "\u{a0}\u{2003}x\u{3000}",
            "İstanbul ẞ",
            "",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_inner_punctuation_untouched() {
        assert_eq!(normalize("Price: 10$ / month."), "price: 10$ / month.");
    }
}
