//! 语言切换器
//!
//! 页面右下角的浮动控件，每种语言一个按钮，当前语言高亮。
//! 控件的 id 在默认配置中被排除在文本发现之外，按钮文字不会被翻译。

use markup5ever_rcdom::{Handle, RcDom};
use url::Url;

use crate::config::{constants, EngineConfig};
use crate::dom::{
    append_child, body_of, create_element, create_text, find_element_by_id, get_node_attr,
    get_node_name, parent_of, set_node_attr,
};
use crate::host::Navigator;
use crate::location::{LanguageSet, PageLocation};

const CONTAINER_STYLE: &str = "position: fixed; bottom: 20px; right: 20px; z-index: 9999; \
display: flex; gap: 8px; background: white; padding: 10px; border-radius: 8px; \
box-shadow: 0 2px 10px rgba(0,0,0,0.1); font-family: Arial, sans-serif";

const BUTTON_STYLE: &str = "padding: 5px 10px; border: 1px solid #ddd; border-radius: 4px; cursor: pointer";

const LANG_ATTR: &str = "data-lang";

fn button_style(active: bool) -> String {
    let background = if active { "#f0f0f0" } else { "#fff" };
    format!("{}; background: {}", BUTTON_STYLE, background)
}

/// 确保切换器存在
///
/// 已存在（按 id）时不重复创建，只更新高亮。文档没有 `body` 时返回 `None`。
pub fn ensure_switcher(dom: &RcDom, languages: &LanguageSet, current: &str) -> Option<Handle> {
    if let Some(existing) = find_element_by_id(&dom.document, constants::SWITCHER_ID) {
        highlight(&existing, current);
        return Some(existing);
    }

    let body = body_of(&dom.document)?;
    let container = create_element(
        dom,
        "div",
        &[("id", constants::SWITCHER_ID), ("style", CONTAINER_STYLE)],
    );

    for lang in languages.supported() {
        let style = button_style(lang == current);
        let button = create_element(
            dom,
            "button",
            &[("type", "button"), (LANG_ATTR, lang.as_str()), ("style", style.as_str())],
        );
        append_child(&button, create_text(&lang.to_uppercase()));
        append_child(&container, button);
    }

    append_child(&body, container.clone());
    tracing::debug!("已创建语言切换器: 当前语言={}", current);
    Some(container)
}

/// 更新按钮高亮，返回被改动的按钮数
///
/// `root` 可以是切换器本身，也可以是包含它的任意祖先。
pub fn highlight(root: &Handle, current: &str) -> usize {
    let container = if get_node_attr(root, "id").as_deref() == Some(constants::SWITCHER_ID) {
        root.clone()
    } else {
        match find_element_by_id(root, constants::SWITCHER_ID) {
            Some(container) => container,
            None => return 0,
        }
    };

    let buttons: Vec<Handle> = container.children.borrow().iter().cloned().collect();
    let mut changed = 0;
    for button in buttons {
        let Some(lang) = get_node_attr(&button, LANG_ATTR) else {
            continue;
        };
        let style = button_style(lang == current);
        if get_node_attr(&button, "style").as_deref() != Some(style.as_str()) {
            set_node_attr(&button, "style", Some(style));
            changed += 1;
        }
    }
    changed
}

/// 被点击元素对应的语言
///
/// 点击可能落在按钮内的文本上，向上查找最近的切换器按钮。
pub fn button_language(node: &Handle) -> Option<String> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if get_node_name(&candidate) == Some("button") {
            return get_node_attr(&candidate, LANG_ATTR);
        }
        current = parent_of(&candidate);
    }
    None
}

/// 切换判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchDecision {
    /// 目标就是当前语言
    Unchanged,
    Unsupported,
    /// 需要导航到新地址
    Navigate(Url),
}

/// 语言切换控制器
#[derive(Debug, Clone)]
pub struct LanguageSwitchController {
    languages: LanguageSet,
    query_param: String,
}

impl LanguageSwitchController {
    pub fn new(languages: LanguageSet, query_param: impl Into<String>) -> Self {
        Self {
            languages,
            query_param: query_param.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.language_set(), config.languages.query_param.clone())
    }

    /// 判断切换到 `requested` 需要做什么
    pub fn decide(&self, location: &PageLocation, requested: &str) -> SwitchDecision {
        let current = location.language(&self.languages, &self.query_param);
        if requested == current {
            return SwitchDecision::Unchanged;
        }
        if !self.languages.is_supported(requested) {
            return SwitchDecision::Unsupported;
        }
        SwitchDecision::Navigate(location.with_language(&self.query_param, requested))
    }

    /// 切换语言：写入新地址后整页重载
    pub fn switch_to<N: Navigator>(
        &self,
        navigator: &mut N,
        location: &PageLocation,
        requested: &str,
    ) -> SwitchDecision {
        let decision = self.decide(location, requested);
        match &decision {
            SwitchDecision::Navigate(url) => {
                tracing::info!("切换语言并重新加载: {}", url);
                navigator.push_state(url);
                navigator.reload();
            }
            SwitchDecision::Unchanged => {
                tracing::debug!("语言未变化: {}", requested);
            }
            SwitchDecision::Unsupported => {
                tracing::warn!("不支持的语言: {}", requested);
            }
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{descendants, html_to_dom, text_content};
    use crate::host::DetachedNavigator;

    fn langs() -> LanguageSet {
        LanguageSet::new(vec!["ru".into(), "en".into(), "th".into()], "ru")
    }

    #[test]
    fn test_switcher_is_idempotent() {
        let dom = html_to_dom(b"<p>Hi</p>", "utf-8").unwrap();
        let first = ensure_switcher(&dom, &langs(), "en").unwrap();
        let second = ensure_switcher(&dom, &langs(), "en").unwrap();
        assert!(std::rc::Rc::ptr_eq(&first, &second));

        let count = descendants(&dom.document)
            .filter(|node| get_node_attr(node, "id").as_deref() == Some(constants::SWITCHER_ID))
            .count();
        assert_eq!(count, 1);

        let labels: Vec<String> = first
            .children
            .borrow()
            .iter()
            .filter_map(|button| button.children.borrow().first().and_then(text_content))
            .collect();
        assert_eq!(labels, vec!["RU", "EN", "TH"]);
    }

    #[test]
    fn test_highlight_follows_language() {
        let dom = html_to_dom(b"<p>Hi</p>", "utf-8").unwrap();
        let switcher = ensure_switcher(&dom, &langs(), "ru").unwrap();

        assert_eq!(highlight(&dom.document, "ru"), 0);
        assert_eq!(highlight(&dom.document, "th"), 2);

        let button = switcher.children.borrow()[2].clone();
        assert!(get_node_attr(&button, "style").unwrap().contains("#f0f0f0"));
    }

    #[test]
    fn test_button_language_from_text() {
        let dom = html_to_dom(b"<p>Hi</p>", "utf-8").unwrap();
        let switcher = ensure_switcher(&dom, &langs(), "ru").unwrap();
        let label = switcher.children.borrow()[1].children.borrow()[0].clone();

        assert_eq!(button_language(&label).as_deref(), Some("en"));
        assert_eq!(button_language(&switcher), None);
    }

    #[test]
    fn test_switch_to_navigates() {
        let controller = LanguageSwitchController::new(langs(), "lang");
        let location = PageLocation::parse("https://site.example/about?lang=en&x=1").unwrap();
        let mut navigator = DetachedNavigator::default();

        assert_eq!(controller.switch_to(&mut navigator, &location, "en"), SwitchDecision::Unchanged);
        assert_eq!(controller.switch_to(&mut navigator, &location, "de"), SwitchDecision::Unsupported);
        assert_eq!(navigator.reloads, 0);

        let decision = controller.switch_to(&mut navigator, &location, "th");
        let SwitchDecision::Navigate(url) = decision else {
            panic!("expected navigation");
        };
        assert_eq!(url.as_str(), "https://site.example/about?x=1&lang=th");
        assert_eq!(navigator.current.as_ref(), Some(&url));
        assert_eq!(navigator.reloads, 1);
    }
}
