//! 协调状态机
//!
//! 会话对象：快照、翻译缓存和当前语言都归它所有，随会话创建，随导航丢弃。
//! 所有 DOM 读写都在同步方法内完成，异步加载由调用方驱动，
//! 通过 [`LoadTicket`] 把结果交回。

use markup5ever_rcdom::Handle;

use super::{Begin, EngineState, LoadOutcome, LoadTicket, PassKind, PassReport};
use crate::config::EngineConfig;
use crate::error::{LingoResult, LoadError};
use crate::host::RedrawHook;
use crate::location::{LanguageSet, SessionState};
use crate::storage::{SnapshotStore, TranslationCache, TranslationTable, WriteSummary};
use crate::text::{discover, SelectorSet};

/// 协调引擎
pub struct Reconciler {
    languages: LanguageSet,
    selectors: SelectorSet,
    session: SessionState,
    state: EngineState,
    snapshots: SnapshotStore,
    cache: TranslationCache,
    redraw: Box<dyn RedrawHook>,
    generation: u64,
    pending: Option<LoadTicket>,
    /// 当前语言的上一次加载失败，等待重试
    load_failed: bool,
    /// 上一次失败是否值得重试（例如 404 不重试）
    retryable: bool,
}

impl Reconciler {
    /// 创建引擎，初始状态为 `Idle`
    pub fn new(config: &EngineConfig, session: SessionState, redraw: Box<dyn RedrawHook>) -> LingoResult<Self> {
        Ok(Self {
            languages: config.language_set(),
            selectors: config.selector_set()?,
            session,
            state: EngineState::Idle,
            snapshots: SnapshotStore::new(),
            cache: TranslationCache::new(),
            redraw,
            generation: 0,
            pending: None,
            load_failed: false,
            retryable: false,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// 当前等待中的加载
    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending.as_ref()
    }

    /// 上一次加载是否失败
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn set_redraw(&mut self, redraw: Box<dyn RedrawHook>) {
        self.redraw = redraw;
    }

    /// 初始化或语言切换：`Idle → Loading`
    ///
    /// 先记录一次原文。默认语言和已缓存的语言不需要加载，直接进入 `Active`
    /// 并完成一轮协调；否则返回加载凭据，由调用方取表后交给 [`complete_load`]。
    ///
    /// [`complete_load`]: Reconciler::complete_load
    pub fn begin(&mut self, root: &Handle) -> Begin {
        self.state = EngineState::Loading;
        self.generation += 1;
        self.pending = None;
        self.load_failed = false;

        tracing::info!(
            "初始化语言会话: 语言={} 页面={}",
            self.session.language,
            self.session.page_id
        );

        if self.languages.is_default(&self.session.language) || self.cache.contains(&self.session.language) {
            self.state = EngineState::Active;
            return Begin::Ready(self.reconcile(root));
        }

        let report = self.reconcile(root);
        tracing::debug!("加载前记录原文 {}", report);

        let ticket = self.issue_ticket();
        Begin::Load(ticket)
    }

    fn issue_ticket(&mut self) -> LoadTicket {
        let ticket = LoadTicket {
            language: self.session.language.clone(),
            page_id: self.session.page_id.clone(),
            generation: self.generation,
        };
        self.pending = Some(ticket.clone());
        ticket
    }

    /// 交回加载结果
    ///
    /// 凭据不是当前凭据（期间发生了切换或重新初始化）时结果不会被应用；
    /// 成功取得的表仍会进入缓存，下次切到该语言时无需再请求。
    pub fn complete_load(
        &mut self,
        root: &Handle,
        ticket: &LoadTicket,
        result: Result<TranslationTable, LoadError>,
    ) -> LoadOutcome {
        if self.pending.as_ref() != Some(ticket) || ticket.language != self.session.language {
            tracing::warn!(
                "丢弃过期的加载结果: 语言={} 代次={} (当前代次={})",
                ticket.language,
                ticket.generation,
                self.generation
            );
            if let Ok(table) = result {
                if ticket.page_id == self.session.page_id {
                    self.cache.install(&ticket.language, table);
                }
            }
            return LoadOutcome::Superseded;
        }

        self.pending = None;
        self.state = EngineState::Active;

        match result {
            Ok(table) => {
                self.cache.install(&ticket.language, table);
                self.load_failed = false;
                LoadOutcome::Applied(self.reconcile(root))
            }
            Err(error) => {
                self.load_failed = true;
                self.retryable = error.is_retryable();
                tracing::info!("翻译表不可用，页面保持原文: 语言={}", ticket.language);
                LoadOutcome::Failed(error)
            }
        }
    }

    /// 为失败的加载签发新的凭据
    ///
    /// 只有当前语言上一次加载以可重试的错误失败、且没有加载在途时才会签发。
    pub fn retry_load(&mut self) -> Option<LoadTicket> {
        if !self.load_failed
            || !self.retryable
            || self.pending.is_some()
            || self.cache.contains(&self.session.language)
        {
            return None;
        }

        self.load_failed = false;
        self.state = EngineState::Loading;
        self.generation += 1;
        let ticket = self.issue_ticket();
        tracing::info!("重试加载翻译表: 语言={} 代次={}", ticket.language, ticket.generation);
        Some(ticket)
    }

    /// 一轮协调：清理 → 发现 → 记录 → 应用或恢复
    pub fn reconcile(&mut self, root: &Handle) -> PassReport {
        let pruned = self.snapshots.prune_dropped();
        let captured = self.snapshots.capture_all(discover(root, &self.selectors));

        let resting = if self.state == EngineState::Loading {
            EngineState::Loading
        } else {
            EngineState::Active
        };

        let language = self.session.language.as_str();
        let (kind, summary) = if self.languages.is_default(language) {
            self.state = EngineState::Restoring;
            (PassKind::Restore, self.snapshots.restore_all())
        } else if let Some(table) = self.cache.get(language) {
            self.state = EngineState::Applying;
            (PassKind::Apply, self.snapshots.apply_table(root, table))
        } else {
            (PassKind::CaptureOnly, WriteSummary::default())
        };

        self.state = resting;

        let report = PassReport {
            kind,
            captured,
            pruned,
            matched: summary.matched,
            missed: summary.missed,
            written: summary.written,
            stale: summary.stale,
        };

        if report.changed() {
            self.redraw.notify_redraw(root);
        }

        tracing::debug!("协调完成 {}", report);
        report
    }

    /// 原地切换语言
    ///
    /// 先把全部快照恢复为原文，避免新表未覆盖的节点残留上一种语言，
    /// 再按新语言重新开始。目标与当前语言相同或不受支持时返回 `None`。
    pub fn switch_in_place(&mut self, root: &Handle, lang: &str) -> Option<Begin> {
        if lang == self.session.language || !self.languages.is_supported(lang) {
            return None;
        }

        let session = SessionState {
            language: lang.to_string(),
            page_id: self.session.page_id.clone(),
        };
        Some(self.reinitialize(root, session))
    }

    /// 以新的会话状态重新开始（例如地址被外部改变）
    ///
    /// 页面标识变化时旧的翻译表不再适用，缓存被清空。
    pub fn reinitialize(&mut self, root: &Handle, session: SessionState) -> Begin {
        self.state = EngineState::Restoring;
        let restored = self.snapshots.restore_all();
        tracing::debug!(
            "切换前恢复原文: 写入={} 跳过={}",
            restored.written,
            restored.stale
        );

        if session.page_id != self.session.page_id {
            self.cache = TranslationCache::new();
        }

        tracing::info!("语言切换: {} -> {}", self.session.language, session.language);
        self.session = session;
        self.state = EngineState::Idle;
        self.begin(root)
    }
}
