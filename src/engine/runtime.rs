//! 会话驱动循环
//!
//! DOM 节点是 `Rc`，整个会话运行在单个任务里：命令、加载完成、变更批次、
//! 去抖截止和定时重扫由 `tokio::select!` 依次取出，每个分支内的 DOM 读写都是同步完成的，
//! 不会相互交错。加载中的请求不被取消，过期的结果由 [`LoadTicket`] 拒绝。

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use markup5ever_rcdom::{Handle, RcDom};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

use super::trigger::{Trigger, TriggerQueue};
use super::watcher::{ChangeWatcher, MutationHub};
use super::{Begin, LoadOutcome, LoadTicket, Reconciler};
use crate::config::{EngineConfig, SwitchMode};
use crate::error::{LingoResult, LoadError};
use crate::host::{Navigator, NoopRedraw, RedrawHook};
use crate::location::{PageLocation, SessionState};
use crate::source::TranslationSource;
use crate::storage::{fetch_table, TranslationTable};
use crate::switcher::{self, LanguageSwitchController, SwitchDecision};

type PendingLoad = Pin<Box<dyn Future<Output = (LoadTicket, Result<TranslationTable, LoadError>)>>>;

/// 外部发给会话的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 切换到指定语言
    SwitchLanguage(String),
    /// 地址被外部改变（历史记录前进/后退）
    LocationChanged(Url),
    Shutdown,
}

/// 会话句柄，可以被切换器或宿主持有
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// 请求切换语言，会话已结束时返回 `false`
    pub fn switch_to(&self, lang: &str) -> bool {
        self.tx.send(Command::SwitchLanguage(lang.to_string())).is_ok()
    }

    pub fn location_changed(&self, url: Url) -> bool {
        self.tx.send(Command::LocationChanged(url)).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(Command::Shutdown).is_ok()
    }
}

/// 会话结束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// 已导航到新地址，宿主应丢弃当前文档并重新开始
    Navigated(Url),
    Shutdown,
}

/// 一个页面的语言会话
pub struct PageSession<S, N> {
    config: EngineConfig,
    dom: Rc<RcDom>,
    location: PageLocation,
    source: Arc<S>,
    navigator: N,
    controller: LanguageSwitchController,
    reconciler: Reconciler,
    commands: mpsc::UnboundedReceiver<Command>,
    handle: SessionHandle,
}

impl<S, N> PageSession<S, N>
where
    S: TranslationSource,
    N: Navigator,
{
    pub fn new(
        config: EngineConfig,
        dom: Rc<RcDom>,
        location: PageLocation,
        source: Arc<S>,
        navigator: N,
    ) -> LingoResult<Self> {
        config.validate()?;
        let session = SessionState::resolve(&location, &config);
        let reconciler = Reconciler::new(&config, session, Box::new(NoopRedraw))?;
        let controller = LanguageSwitchController::from_config(&config);
        let (tx, commands) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            dom,
            location,
            source,
            navigator,
            controller,
            reconciler,
            commands,
            handle: SessionHandle { tx },
        })
    }

    /// 设置重绘钩子
    pub fn with_redraw<R: RedrawHook + 'static>(mut self, redraw: R) -> Self {
        self.reconciler.set_redraw(Box::new(redraw));
        self
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// 运行会话，直到导航离开或收到关闭命令
    ///
    /// 切换器和变更订阅在初始化时建立，不受翻译表加载结果影响；
    /// 加载失败时页面保持原文，由定时器重试。
    pub async fn run(&mut self, hub: &MutationHub) -> SessionExit {
        let root = self.dom.document.clone();
        let mut watcher = ChangeWatcher::new(hub.clone());
        let mut triggers = TriggerQueue::new(self.config.debounce());
        let mut loads: FuturesUnordered<PendingLoad> = FuturesUnordered::new();

        let begin = self.reconciler.begin(&root);
        self.start(begin, &mut loads);
        self.refresh_switcher();
        watcher.connect();

        let period = self.config.rescan_interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            let deadline = triggers.deadline();

            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    // 会话自己持有发送端，通道不会关闭
                    let Some(command) = command else {
                        break SessionExit::Shutdown;
                    };
                    if let Some(exit) = self.handle_command(&root, command, &mut loads, &mut watcher) {
                        break exit;
                    }
                }

                Some((ticket, result)) = loads.next(), if !loads.is_empty() => {
                    if let LoadOutcome::Applied(report) = self.reconciler.complete_load(&root, &ticket, result) {
                        tracing::info!("翻译已应用 {}", report);
                    }
                }

                Some(batch) = watcher.next_batch() => {
                    tracing::trace!("收到 {} 条变更", batch.len());
                    triggers.request(Trigger::Mutation, Instant::now());
                }

                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(batch) = triggers.take() {
                        tracing::trace!("合并 {} 个触发为一轮协调", batch.total());
                        self.reconciler.reconcile(&root);
                    }
                }

                _ = ticker.tick() => {
                    if self.config.schedule.retry_failed_loads {
                        if let Some(ticket) = self.reconciler.retry_load() {
                            loads.push(self.load(ticket));
                        }
                    }
                    triggers.request(Trigger::Tick, Instant::now());
                }
            }
        };

        watcher.disconnect();
        tracing::info!("语言会话结束: {:?}", exit);
        exit
    }

    fn handle_command(
        &mut self,
        root: &Handle,
        command: Command,
        loads: &mut FuturesUnordered<PendingLoad>,
        watcher: &mut ChangeWatcher,
    ) -> Option<SessionExit> {
        match command {
            Command::Shutdown => Some(SessionExit::Shutdown),
            Command::SwitchLanguage(lang) => match self.config.switcher.mode {
                SwitchMode::Navigate => {
                    match self.controller.switch_to(&mut self.navigator, &self.location, &lang) {
                        SwitchDecision::Navigate(url) => Some(SessionExit::Navigated(url)),
                        SwitchDecision::Unchanged | SwitchDecision::Unsupported => None,
                    }
                }
                SwitchMode::InPlace => {
                    if let SwitchDecision::Navigate(url) = self.controller.decide(&self.location, &lang) {
                        self.navigator.push_state(&url);
                        self.location = PageLocation::from(url);
                        if let Some(begin) = self.reconciler.switch_in_place(root, &lang) {
                            self.start(begin, loads);
                        }
                        self.refresh_switcher();
                    }
                    None
                }
            },
            Command::LocationChanged(url) => {
                self.location = PageLocation::from(url);
                let session = SessionState::resolve(&self.location, &self.config);
                let begin = self.reconciler.reinitialize(root, session);
                self.start(begin, loads);
                self.refresh_switcher();
                watcher.connect();
                None
            }
        }
    }

    fn start(&mut self, begin: Begin, loads: &mut FuturesUnordered<PendingLoad>) {
        match begin {
            Begin::Ready(report) => tracing::debug!("无需加载翻译表 {}", report),
            Begin::Load(ticket) => loads.push(self.load(ticket)),
        }
    }

    fn load(&self, ticket: LoadTicket) -> PendingLoad {
        let source = Arc::clone(&self.source);
        Box::pin(async move {
            let result = fetch_table(source.as_ref(), &ticket.language, &ticket.page_id).await;
            (ticket, result)
        })
    }

    fn refresh_switcher(&self) {
        if self.config.switcher.enabled {
            let current = &self.reconciler.session().language;
            switcher::ensure_switcher(&self.dom, self.reconciler.languages(), current);
        }
    }
}
