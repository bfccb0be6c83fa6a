//! 协调引擎
//!
//! 状态机 `Idle → Loading → Active → (Applying | Restoring) → Active`，
//! 由变更通知和固定周期的定时器反复驱动，直到会话结束。
//!
//! - `reconciler`: 会话内的状态机，拥有快照和翻译缓存
//! - `trigger`: 合并重复触发的去抖队列
//! - `watcher`: DOM 变更订阅，保证同一时刻只有一个订阅
//! - `runtime`: 单线程协作式驱动循环
//! - `prerender`: 一次性的预渲染流程

pub mod prerender;
pub mod reconciler;
pub mod runtime;
pub mod trigger;
pub mod watcher;

use std::fmt;

use crate::error::LoadError;

pub use prerender::prerender;
pub use reconciler::Reconciler;
pub use runtime::{Command, PageSession, SessionExit, SessionHandle};
pub use trigger::{Trigger, TriggerBatch, TriggerQueue};
pub use watcher::{ChangeWatcher, MutationBatch, MutationHub, MutationRecord, Subscription};

/// 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    Loading,
    Active,
    Applying,
    Restoring,
}

/// 一轮协调做了什么
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// 按翻译表改写
    Apply,
    /// 恢复原文（默认语言）
    Restore,
    /// 翻译表尚不可用，只记录原文
    CaptureOnly,
}

/// 单轮协调的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub kind: PassKind,
    /// 新记录的快照条目
    pub captured: usize,
    /// 因节点被释放而移除的条目
    pub pruned: usize,
    pub matched: usize,
    /// 未命中翻译表，保持原样
    pub missed: usize,
    /// 实际改变了内容的节点
    pub written: usize,
    /// 已脱离文档、被跳过的节点
    pub stale: usize,
}

impl PassReport {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            captured: 0,
            pruned: 0,
            matched: 0,
            missed: 0,
            written: 0,
            stale: 0,
        }
    }

    /// 本轮是否改变了任何节点
    pub fn changed(&self) -> bool {
        self.written > 0
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PassKind::Apply => "apply",
            PassKind::Restore => "restore",
            PassKind::CaptureOnly => "capture",
        };
        write!(
            f,
            "{}: captured={} pruned={} matched={} missed={} written={} stale={}",
            kind, self.captured, self.pruned, self.matched, self.missed, self.written, self.stale
        )
    }
}

/// 一次翻译表加载的凭据
///
/// 加载完成时凭据必须仍是当前凭据，否则结果被视为过期。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub language: String,
    pub page_id: String,
    pub generation: u64,
}

/// 初始化的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// 无需加载，已经完成一轮协调
    Ready(PassReport),
    /// 需要先加载翻译表
    Load(LoadTicket),
}

/// 加载完成后的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(PassReport),
    /// 加载失败，页面保持原文
    Failed(LoadError),
    /// 凭据已过期，结果未被应用
    Superseded,
}
