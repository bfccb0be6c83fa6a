//! DOM 变更订阅
//!
//! 宿主通过 [`MutationHub`] 投递结构变更，引擎通过 [`ChangeWatcher`] 接收。
//! 同一时刻最多只有一个活动订阅：新订阅会顶替旧订阅，旧订阅的接收端随即关闭。

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

/// 一次结构变更（子节点增删）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added: usize,
    pub removed: usize,
}

impl MutationRecord {
    pub fn child_list(added: usize, removed: usize) -> Self {
        Self { added, removed }
    }
}

/// 合并后的一批变更
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn added(&self) -> usize {
        self.records.iter().map(|r| r.added).sum()
    }

    pub fn removed(&self) -> usize {
        self.records.iter().map(|r| r.removed).sum()
    }
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    active: Option<(u64, mpsc::UnboundedSender<MutationRecord>)>,
}

/// 变更投递点（宿主侧）
#[derive(Debug, Clone, Default)]
pub struct MutationHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MutationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 建立订阅，顶替已有的订阅
    pub fn observe(&self) -> (Subscription, mpsc::UnboundedReceiver<MutationRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        if inner.active.replace((id, tx)).is_some() {
            tracing::debug!("变更订阅 {} 顶替了旧订阅", id);
        }

        let subscription = Subscription {
            id,
            inner: Arc::clone(&self.inner),
        };
        (subscription, rx)
    }

    /// 投递一次变更，没有订阅者时返回 `false`
    pub fn notify(&self, record: MutationRecord) -> bool {
        let mut inner = self.lock();
        let delivered = match inner.active.as_ref() {
            Some((_, tx)) => tx.send(record).is_ok(),
            None => false,
        };
        if !delivered {
            inner.active = None;
        }
        delivered
    }

    pub fn has_observer(&self) -> bool {
        self.lock().active.is_some()
    }
}

/// 订阅句柄，丢弃即取消订阅
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    inner: Arc<Mutex<HubInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(inner.active, Some((id, _)) if id == self.id) {
            inner.active = None;
        }
    }
}

/// 引擎侧的变更接收器
#[derive(Debug)]
pub struct ChangeWatcher {
    hub: MutationHub,
    connection: Option<(Subscription, mpsc::UnboundedReceiver<MutationRecord>)>,
}

impl ChangeWatcher {
    pub fn new(hub: MutationHub) -> Self {
        Self {
            hub,
            connection: None,
        }
    }

    /// 订阅变更，先取消自己已有的订阅
    pub fn connect(&mut self) {
        self.disconnect();
        self.connection = Some(self.hub.observe());
    }

    pub fn disconnect(&mut self) {
        if let Some((subscription, _)) = self.connection.take() {
            tracing::debug!("取消变更订阅 {}", subscription.id());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// 等待下一批变更
    ///
    /// 已排队的通知会被合并成一批。未连接时永远挂起；
    /// 订阅被其他观察者顶替时断开并返回 `None`。
    pub async fn next_batch(&mut self) -> Option<MutationBatch> {
        let Some((_, receiver)) = self.connection.as_mut() else {
            return std::future::pending().await;
        };

        let Some(first) = receiver.recv().await else {
            tracing::warn!("变更订阅已被顶替");
            self.connection = None;
            return None;
        };

        let mut batch = MutationBatch {
            records: vec![first],
        };
        while let Ok(record) = receiver.try_recv() {
            batch.records.push(record);
        }
        Some(batch)
    }
}
