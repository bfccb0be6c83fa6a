//! 文本节点发现
//!
//! 从容器选择器命中的元素开始，先序遍历其子树，产出内容非空的文本节点。
//! `script` / `style` 等不透明元素整个跳过。遍历使用显式栈，不受嵌套深度限制，
//! 每次调用 [`discover`] 都是一次全新、有限的遍历。

use markup5ever_rcdom::{Handle, NodeData};

use crate::config::DiscoveryConfig;
use crate::dom::get_node_attr;
use crate::error::{helpers::config_error, LingoResult};

/// 容器选择器
///
/// 支持的写法：`tag`、`.class`、`#id`、`[class*="fragment"]`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Class(String),
    Id(String),
    ClassContains(String),
}

impl Selector {
    /// 解析选择器
    pub fn parse(raw: &str) -> LingoResult<Self> {
        let raw = raw.trim();

        if let Some(class) = raw.strip_prefix('.') {
            return Self::checked(class, raw).map(|c| Selector::Class(c.to_string()));
        }

        if let Some(id) = raw.strip_prefix('#') {
            return Self::checked(id, raw).map(|i| Selector::Id(i.to_string()));
        }

        if let Some(inner) = raw.strip_prefix("[class*=").and_then(|s| s.strip_suffix(']')) {
            let fragment = inner.trim_matches(|c| c == '"' || c == '\'');
            return Self::checked(fragment, raw).map(|f| Selector::ClassContains(f.to_string()));
        }

        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Ok(Selector::Tag(raw.to_ascii_lowercase()));
        }

        Err(config_error(format!("不支持的选择器: {}", raw)))
    }

    fn checked<'a>(name: &'a str, raw: &str) -> LingoResult<&'a str> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(name)
        } else {
            Err(config_error(format!("不支持的选择器: {}", raw)))
        }
    }

    /// 元素是否命中选择器
    pub fn matches(&self, node: &Handle) -> bool {
        let NodeData::Element { ref name, .. } = node.data else {
            return false;
        };

        match self {
            Selector::Tag(tag) => &*name.local == tag.as_str(),
            Selector::Id(id) => get_node_attr(node, "id").as_deref() == Some(id.as_str()),
            Selector::Class(class) => get_node_attr(node, "class")
                .map(|value| value.split_ascii_whitespace().any(|c| c == class))
                .unwrap_or(false),
            Selector::ClassContains(fragment) => get_node_attr(node, "class")
                .map(|value| value.contains(fragment.as_str()))
                .unwrap_or(false),
        }
    }
}

/// 文本发现规则集合
#[derive(Debug, Clone)]
pub struct SelectorSet {
    containers: Vec<Selector>,
    opaque_tags: Vec<String>,
    excluded_ids: Vec<String>,
}

impl SelectorSet {
    pub fn new(containers: Vec<Selector>, opaque_tags: Vec<String>, excluded_ids: Vec<String>) -> Self {
        Self {
            containers,
            opaque_tags: opaque_tags.into_iter().map(|t| t.to_ascii_lowercase()).collect(),
            excluded_ids,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> LingoResult<Self> {
        let containers = config
            .container_selectors
            .iter()
            .map(|raw| Selector::parse(raw))
            .collect::<LingoResult<Vec<_>>>()?;

        Ok(Self::new(
            containers,
            config.opaque_tags.clone(),
            config.excluded_ids.clone(),
        ))
    }

    /// 元素是否为文本容器
    pub fn is_container(&self, node: &Handle) -> bool {
        self.containers.iter().any(|selector| selector.matches(node))
    }

    /// 元素子树是否整个跳过
    pub fn is_opaque(&self, node: &Handle) -> bool {
        match node.data {
            NodeData::Element { ref name, .. } => {
                if self.opaque_tags.iter().any(|tag| &*name.local == tag.as_str()) {
                    return true;
                }
                !self.excluded_ids.is_empty()
                    && get_node_attr(node, "id")
                        .map(|id| self.excluded_ids.contains(&id))
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl Default for SelectorSet {
    fn default() -> Self {
        // 默认配置中的选择器都是合法的
        Self::from_config(&DiscoveryConfig::default()).unwrap_or_else(|_| {
            Self::new(Vec::new(), vec!["script".into(), "style".into()], Vec::new())
        })
    }
}

/// 发现 `root` 之下的可翻译文本节点
pub fn discover<'a>(root: &Handle, selectors: &'a SelectorSet) -> TextNodes<'a> {
    TextNodes {
        stack: vec![(root.clone(), false)],
        selectors,
    }
}

/// 文本节点的先序迭代器
///
/// 栈中每一项记录节点以及它是否已处于某个容器之内。
pub struct TextNodes<'a> {
    stack: Vec<(Handle, bool)>,
    selectors: &'a SelectorSet,
}

enum Visit {
    Yield,
    Descend(bool),
    Skip,
}

impl Iterator for TextNodes<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        while let Some((node, inside)) = self.stack.pop() {
            let visit = match node.data {
                NodeData::Text { ref contents } => {
                    if inside && !contents.borrow().trim().is_empty() {
                        Visit::Yield
                    } else {
                        Visit::Skip
                    }
                }
                NodeData::Element { .. } => {
                    if self.selectors.is_opaque(&node) {
                        Visit::Skip
                    } else {
                        Visit::Descend(inside || self.selectors.is_container(&node))
                    }
                }
                NodeData::Document => Visit::Descend(inside),
                _ => Visit::Skip,
            };

            match visit {
                Visit::Yield => return Some(node),
                Visit::Descend(inside) => {
                    let children = node.children.borrow();
                    self.stack
                        .extend(children.iter().rev().map(|child| (child.clone(), inside)));
                }
                Visit::Skip => {}
            }
        }
        None
    }
}
