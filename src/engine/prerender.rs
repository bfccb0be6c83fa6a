//! 一次性预渲染
//!
//! 不订阅变更、不启动定时器：初始化一次，必要时加载翻译表，完成一轮协调后返回。

use markup5ever_rcdom::Handle;

use super::{Begin, LoadOutcome, PassReport, Reconciler};
use crate::config::EngineConfig;
use crate::error::{LingoError, LingoResult};
use crate::host::NoopRedraw;
use crate::location::{PageLocation, SessionState};
use crate::source::TranslationSource;
use crate::storage::fetch_table;

/// 按 `location` 解析出的语言翻译 `root` 之下的文本
///
/// 加载失败时文档保持原文，错误原样返回，由调用方决定是否仍然输出。
pub async fn prerender<S: TranslationSource>(
    root: &Handle,
    location: &PageLocation,
    config: &EngineConfig,
    source: &S,
) -> LingoResult<PassReport> {
    let session = SessionState::resolve(location, config);
    let mut reconciler = Reconciler::new(config, session, Box::new(NoopRedraw))?;

    let ticket = match reconciler.begin(root) {
        Begin::Ready(report) => return Ok(report),
        Begin::Load(ticket) => ticket,
    };

    let result = fetch_table(source, &ticket.language, &ticket.page_id).await;
    match reconciler.complete_load(root, &ticket, result) {
        LoadOutcome::Applied(report) => Ok(report),
        LoadOutcome::Failed(error) => Err(LingoError::Load(error)),
        LoadOutcome::Superseded => Err(LingoError::Dom(format!(
            "加载凭据 {} 在预渲染期间失效",
            ticket.generation
        ))),
    }
}
