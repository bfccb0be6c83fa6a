use std::cell::RefCell;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::create_element as build_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use crate::error::LingoResult;

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> LingoResult<RcDom> {
    let s = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    };

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())?;

    Ok(dom)
}

/// 解析文档，`<meta>` 声明了其他可识别的字符集时按该字符集重新解析
///
/// 返回 DOM 和最终使用的字符集。
pub fn load_document(data: &[u8], fallback_encoding: &str) -> LingoResult<(RcDom, String)> {
    let mut document_encoding = fallback_encoding.to_string();
    let mut dom = html_to_dom(data, &document_encoding)?;

    if let Some(charset) = get_charset(&dom.document) {
        if let Some(encoding) = Encoding::for_label_no_replacement(charset.as_bytes()) {
            if !encoding.name().eq_ignore_ascii_case(&document_encoding) {
                document_encoding = encoding.name().to_string();
                dom = html_to_dom(data, &document_encoding)?;
            }
        }
    }

    Ok((dom, document_encoding))
}

/// 读取 `<meta charset>` 或 `http-equiv="content-type"` 中声明的字符集
pub fn get_charset(document: &Handle) -> Option<String> {
    let head = get_child_node_by_name(document, "html")
        .and_then(|html| get_child_node_by_name(&html, "head"))?;

    let metas: Vec<Handle> = head
        .children
        .borrow()
        .iter()
        .filter(|child| get_node_name(child) == Some("meta"))
        .cloned()
        .collect();

    for meta in metas {
        if let Some(charset) = get_node_attr(&meta, "charset") {
            return Some(charset.trim().to_string());
        }

        let is_content_type = get_node_attr(&meta, "http-equiv")
            .map(|value| value.eq_ignore_ascii_case("content-type"))
            .unwrap_or(false);
        if is_content_type {
            let content = get_node_attr(&meta, "content").unwrap_or_default();
            let charset = content
                .split(';')
                .filter_map(|part| part.trim().split_once('='))
                .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
                .map(|(_, value)| value.trim().trim_matches('"').to_string());
            if charset.is_some() {
                return charset;
            }
        }
    }

    None
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取文档的 body 元素
pub fn body_of(document: &Handle) -> Option<Handle> {
    get_child_node_by_name(document, "html").and_then(|html| get_child_node_by_name(&html, "body"))
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置节点属性，`None` 表示删除
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut found_existing_attr = false;

        attrs_mut.retain_mut(|attr| {
            if &*attr.name.local != attr_name {
                return true;
            }
            found_existing_attr = true;
            match &attr_value {
                Some(value) => {
                    attr.value.clear();
                    attr.value.push_slice(value);
                    true
                }
                None => false,
            }
        });

        if !found_existing_attr {
            if let Some(value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", value),
                });
            }
        }
    }
}

/// 获取父节点
///
/// rcdom 的父指针存放在 `Cell` 中，读取时必须放回。
pub fn parent_of(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 节点是否仍挂在 `root` 之下
pub fn is_attached(node: &Handle, root: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if Rc::ptr_eq(&current, root) {
            return true;
        }
        match parent_of(&current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// 将节点从父节点中移除
pub fn detach(node: &Handle) {
    if let Some(parent) = parent_of(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// 追加子节点
pub fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 创建元素节点
pub fn create_element(dom: &RcDom, tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: format_tendril!("{}", value),
        })
        .collect();

    build_element(dom, QualName::new(None, ns!(html), LocalName::from(tag)), attrs)
}

/// 创建文本节点
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// 读取文本节点内容
pub fn text_content(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 改写文本节点内容，内容相同则不写
///
/// 返回是否发生了写入。
pub fn set_text_content(node: &Handle, text: &str) -> bool {
    match &node.data {
        NodeData::Text { contents } => {
            if &**contents.borrow() == text {
                return false;
            }
            let mut contents = contents.borrow_mut();
            contents.clear();
            contents.push_slice(text);
            true
        }
        _ => false,
    }
}

/// 按 id 查找元素
pub fn find_element_by_id(root: &Handle, id: &str) -> Option<Handle> {
    descendants(root).find(|node| get_node_attr(node, "id").as_deref() == Some(id))
}

/// 先序遍历 `root` 下的所有元素
pub fn descendants(root: &Handle) -> Descendants {
    Descendants {
        stack: vec![root.clone()],
    }
}

/// 元素的先序迭代器（显式栈）
pub struct Descendants {
    stack: Vec<Handle>,
}

impl Iterator for Descendants {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        while let Some(node) = self.stack.pop() {
            self.stack
                .extend(node.children.borrow().iter().rev().cloned());
            if let NodeData::Element { .. } = node.data {
                return Some(node);
            }
        }
        None
    }
}
