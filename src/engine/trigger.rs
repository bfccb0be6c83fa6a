//! 协调触发队列
//!
//! 变更通知和定时器都只是"需要一轮协调"的信号。信号到达时若已有一轮在等待，
//! 直接并入，不再额外安排；等待的截止时间从第一个信号起算，持续的变更不会无限推迟协调。

use std::time::Duration;

use tokio::time::Instant;

/// 触发来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// DOM 结构变更
    Mutation,
    /// 周期性重扫
    Tick,
}

/// 被合并成一轮的触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBatch {
    pub first: Trigger,
    pub mutations: usize,
    pub ticks: usize,
}

impl TriggerBatch {
    fn new(first: Trigger) -> Self {
        let mut batch = Self {
            first,
            mutations: 0,
            ticks: 0,
        };
        batch.record(first);
        batch
    }

    fn record(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Mutation => self.mutations += 1,
            Trigger::Tick => self.ticks += 1,
        }
    }

    /// 合并的触发总数
    pub fn total(&self) -> usize {
        self.mutations + self.ticks
    }
}

/// 去抖队列
#[derive(Debug)]
pub struct TriggerQueue {
    debounce: Duration,
    pending: Option<(Instant, TriggerBatch)>,
}

impl TriggerQueue {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
        }
    }

    /// 记录一个触发
    ///
    /// 返回 `true` 表示安排了新的一轮，`false` 表示并入了已在等待的一轮。
    pub fn request(&mut self, trigger: Trigger, now: Instant) -> bool {
        match self.pending.as_mut() {
            Some((_, batch)) => {
                batch.record(trigger);
                false
            }
            None => {
                self.pending = Some((now + self.debounce, TriggerBatch::new(trigger)));
                true
            }
        }
    }

    /// 等待中那一轮的截止时间
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 取出等待中的一轮
    pub fn take(&mut self) -> Option<TriggerBatch> {
        self.pending.take().map(|(_, batch)| batch)
    }
}
