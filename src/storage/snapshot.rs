//! 文本节点快照
//!
//! 每个文本节点在第一次被看到时记录原文及其规范化键，之后永不覆盖。
//! 存储只持有弱引用，节点本身归 DOM 所有。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, WeakHandle};

use crate::dom::{is_attached, set_text_content, text_content};
use crate::storage::table::TranslationTable;
use crate::text::normalize;

/// 节点身份键
///
/// 取自共享分配的地址。条目持有弱引用期间该分配不会被释放，地址不会被复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn of(node: &Handle) -> Self {
        NodeKey(Rc::as_ptr(node) as usize)
    }
}

/// 快照条目
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    node: WeakHandle,
    original: String,
    normalized_key: String,
}

/// 单次写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    /// 节点已被释放，或写入译文时已脱离文档
    Stale,
}

impl SnapshotEntry {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }

    /// 节点仍然存活时返回强引用
    pub fn node(&self) -> Option<Handle> {
        self.node.upgrade()
    }

    /// 仅当节点仍挂在 `root` 下时写入
    pub fn write(&self, root: &Handle, text: &str) -> WriteOutcome {
        match self.node.upgrade() {
            Some(node) if is_attached(&node, root) => Self::set(&node, text),
            _ => WriteOutcome::Stale,
        }
    }

    /// 写回原文，节点存活即可，不要求仍在文档中
    pub fn restore(&self) -> WriteOutcome {
        match self.node.upgrade() {
            Some(node) => Self::set(&node, &self.original),
            None => WriteOutcome::Stale,
        }
    }

    fn set(node: &Handle, text: &str) -> WriteOutcome {
        if set_text_content(node, text) {
            WriteOutcome::Written
        } else {
            WriteOutcome::Unchanged
        }
    }
}

/// 一轮写入的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// 命中翻译表（或需恢复）的条目数
    pub matched: usize,
    /// 翻译表中没有对应键的条目数
    pub missed: usize,
    /// 实际改变了内容的节点数
    pub written: usize,
    /// 跳过的失效节点数
    pub stale: usize,
}

impl WriteSummary {
    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => {
                self.matched += 1;
                self.written += 1;
            }
            WriteOutcome::Unchanged => self.matched += 1,
            WriteOutcome::Stale => self.stale += 1,
        }
    }
}

/// 节点 → 快照条目
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: HashMap<NodeKey, SnapshotEntry>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, node: &Handle) -> Option<&SnapshotEntry> {
        self.entries.get(&NodeKey::of(node))
    }

    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.values()
    }

    /// 记录尚未见过的节点，已有条目保持不变
    ///
    /// 规范化后为空的文本不记录。返回新增条目数。
    pub fn capture_all<I>(&mut self, nodes: I) -> usize
    where
        I: IntoIterator<Item = Handle>,
    {
        let mut captured = 0;

        for node in nodes {
            let key = NodeKey::of(&node);
            if self.entries.contains_key(&key) {
                continue;
            }

            let Some(original) = text_content(&node) else {
                continue;
            };
            let normalized_key = normalize(&original);
            if normalized_key.is_empty() {
                continue;
            }

            self.entries.insert(
                key,
                SnapshotEntry {
                    node: Rc::downgrade(&node),
                    original,
                    normalized_key,
                },
            );
            captured += 1;
        }

        captured
    }

    /// 把每个条目恢复为原文
    ///
    /// 覆盖整个存储：暂时脱离文档的节点同样恢复，重新挂回后不会残留上一种语言。
    /// 只有已释放的节点计为 `stale`。
    pub fn restore_all(&self) -> WriteSummary {
        let mut summary = WriteSummary::default();
        for entry in self.entries.values() {
            summary.record(entry.restore());
        }
        summary
    }

    /// 按规范化键精确查表并改写，未命中的节点保持原样
    pub fn apply_table(&self, root: &Handle, table: &TranslationTable) -> WriteSummary {
        let mut summary = WriteSummary::default();
        for entry in self.entries.values() {
            match table.lookup(&entry.normalized_key) {
                Some(translated) => summary.record(entry.write(root, translated)),
                None => summary.missed += 1,
            }
        }
        summary
    }

    /// 移除节点已被释放的条目，返回移除数
    ///
    /// 脱离文档但仍存活的节点保留，重新挂回时不会把译文当成原文再次记录。
    pub fn prune_dropped(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.node.strong_count() > 0);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{append_child, body_of, detach, html_to_dom};
    use crate::text::{discover, SelectorSet};
    use markup5ever_rcdom::RcDom;

    fn parse(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").unwrap()
    }

    fn capture(store: &mut SnapshotStore, dom: &RcDom) -> usize {
        let selectors = SelectorSet::default();
        store.capture_all(discover(&dom.document, &selectors))
    }

    #[test]
    fn test_capture_is_insert_if_absent() {
        let dom = parse("<p>Hello  World</p>");
        let mut store = SnapshotStore::new();

        assert_eq!(capture(&mut store, &dom), 1);
        let node = store.entries().next().unwrap().node().unwrap();
        set_text_content(&node, "Bonjour");

        assert_eq!(capture(&mut store, &dom), 0);
        let entry = store.get(&node).unwrap();
        assert_eq!(entry.original(), "Hello  World");
        assert_eq!(entry.normalized_key(), "hello world");
    }

    #[test]
    fn test_entity_only_text_not_captured() {
        let dom = parse("<p>&amp;nbsp;</p><p>Real</p>");
        let mut store = SnapshotStore::new();
        assert_eq!(capture(&mut store, &dom), 1);
    }

    #[test]
    fn test_restore_covers_detached_nodes() {
        let dom = parse("<p>One</p><p>Two</p>");
        let mut store = SnapshotStore::new();
        capture(&mut store, &dom);

        let nodes: Vec<Handle> = store.entries().filter_map(|e| e.node()).collect();
        for node in &nodes {
            set_text_content(node, "changed");
        }
        detach(&nodes[0]);

        let summary = store.restore_all();
        assert_eq!(summary.stale, 0);
        assert_eq!(summary.written, 2);
        assert_ne!(text_content(&nodes[0]).as_deref(), Some("changed"));
        assert_eq!(
            text_content(&nodes[0]).as_deref(),
            store.get(&nodes[0]).map(|e| e.original())
        );
    }

    #[test]
    fn test_apply_skips_detached_nodes() {
        let dom = parse("<p>One</p>");
        let mut store = SnapshotStore::new();
        capture(&mut store, &dom);

        let node = store.entries().next().unwrap().node().unwrap();
        detach(&node);

        let raw = [("one".to_string(), "Uno".to_string())].into_iter().collect();
        let summary = store.apply_table(&dom.document, &TranslationTable::from_raw(raw));
        assert_eq!(summary.stale, 1);
        assert_eq!(text_content(&node).as_deref(), Some("One"));
    }

    #[test]
    fn test_restore_counts_dropped_nodes_as_stale() {
        let dom = parse("<p>One</p>");
        let mut store = SnapshotStore::new();
        capture(&mut store, &dom);

        let body = body_of(&dom.document).unwrap();
        let paragraph = body.children.borrow()[0].clone();
        detach(&paragraph);
        drop(paragraph);

        let summary = store.restore_all();
        assert_eq!(summary.stale, 1);
        assert_eq!(summary.written, 0);
    }

    #[test]
    fn test_prune_only_dropped_nodes() {
        let dom = parse("<p>Keep</p><p>Drop</p><p>Move</p>");
        let mut store = SnapshotStore::new();
        capture(&mut store, &dom);
        assert_eq!(store.len(), 3);

        let body = body_of(&dom.document).unwrap();
        let paragraphs: Vec<Handle> = body.children.borrow().iter().cloned().collect();

        // 第二段连同文本一起被丢弃
        detach(&paragraphs[1]);
        drop(paragraphs);
        let body_children: Vec<Handle> = body.children.borrow().iter().cloned().collect();

        // 第三段的文本暂时脱离，但仍被持有
        let moved = body_children[1].children.borrow()[0].clone();
        detach(&moved);

        assert_eq!(store.prune_dropped(), 1);
        assert_eq!(store.len(), 2);

        append_child(&body_children[0], moved.clone());
        assert_eq!(capture(&mut store, &dom), 0);
    }
}
