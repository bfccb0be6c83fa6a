//! DOM解析和处理模块
//!
//! - `tree`: 基础DOM操作（解析、属性、父子关系、文本读写）
//! - `serializer`: 序列化功能

pub mod serializer;
pub mod tree;

pub use serializer::serialize_document;
pub use tree::{
    append_child, body_of, create_element, create_text, descendants, detach, find_element_by_id,
    get_charset, get_child_node_by_name, get_node_attr, get_node_name, html_to_dom, is_attached,
    load_document, parent_of, set_node_attr, set_text_content, text_content,
};
