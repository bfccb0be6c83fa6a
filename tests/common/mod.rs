// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use markup5ever_rcdom::{Handle, RcDom};
use url::Url;

use pagelingo::config::{EngineConfig, LanguageConfig};
use pagelingo::dom::{
    append_child, body_of, create_element, create_text, descendants, detach, get_node_name,
    html_to_dom, text_content,
};
use pagelingo::engine::{Begin, LoadOutcome, PassReport};
use pagelingo::error::LoadError;
use pagelingo::host::{Navigator, RedrawHook};
use pagelingo::location::SessionState;
use pagelingo::source::{RawTable, StaticSource, TranslationSource};
use pagelingo::storage::TranslationTable;
use pagelingo::Reconciler;

/// HTML 测试辅助
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 创建测试 DOM
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").expect("test HTML should parse")
    }

    /// 两段英文的页面
    pub fn create_two_paragraph_page() -> String {
        "<html><head><title>Demo</title></head><body><p>Hello</p><p>World</p></body></html>".to_string()
    }

    /// 模拟页面构建器的标记
    pub fn create_builder_page() -> String {
        r#"<html><head><style>.t-title { color: red }</style></head><body>
            <div class="t-cover__title">  Welcome
                aboard </div>
            <div class="tn-elem tn_text_1712"><span>Our&nbsp;story</span></div>
            <p>Contact us</p>
            <script>var label = "Hello";</script>
        </body></html>"#
            .to_string()
    }

    /// 每个段落的文本（按文档顺序）
    pub fn paragraph_texts(dom: &RcDom) -> Vec<String> {
        descendants(&dom.document)
            .filter(|node| get_node_name(node) == Some("p"))
            .map(|p| Self::inner_text(&p))
            .collect()
    }

    /// 元素下所有直接文本子节点的拼接
    pub fn inner_text(node: &Handle) -> String {
        node.children
            .borrow()
            .iter()
            .filter_map(text_content)
            .collect::<Vec<_>>()
            .join("")
    }

    /// 所有段落元素
    pub fn paragraphs(dom: &RcDom) -> Vec<Handle> {
        descendants(&dom.document)
            .filter(|node| get_node_name(node) == Some("p"))
            .collect()
    }

    /// 模拟外部代码追加一个段落
    pub fn append_paragraph(dom: &RcDom, text: &str) -> Handle {
        let body = body_of(&dom.document).expect("document should have a body");
        let p = create_element(dom, "p", &[]);
        append_child(&p, create_text(text));
        append_child(&body, p.clone());
        p
    }

    /// 模拟外部代码移除一个元素
    pub fn remove(node: &Handle) {
        detach(node);
    }
}

/// 配置辅助
pub struct ConfigHelper;

impl ConfigHelper {
    /// 英文为默认语言，俄文和泰文为译文
    pub fn english_default() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.languages = LanguageConfig {
            supported: vec!["en".to_string(), "ru".to_string(), "th".to_string()],
            default: "en".to_string(),
            query_param: "lang".to_string(),
        };
        config
    }

    /// 会话测试用的短周期配置
    pub fn fast_session() -> EngineConfig {
        let mut config = Self::english_default();
        config.schedule.rescan_interval_ms = 100;
        config.schedule.debounce_ms = 5;
        config
    }
}

/// 由键值对构建翻译表
pub fn table(pairs: &[(&str, &str)]) -> TranslationTable {
    TranslationTable::from_raw(raw(pairs))
}

pub fn raw(pairs: &[(&str, &str)]) -> RawTable {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 创建处于指定语言的引擎
pub fn engine(config: &EngineConfig, lang: &str) -> Reconciler {
    let session = SessionState {
        language: lang.to_string(),
        page_id: "index".to_string(),
    };
    Reconciler::new(config, session, Box::new(CountingRedraw::default())).expect("engine should build")
}

/// 初始化并装入翻译表，返回应用那一轮的统计
pub fn begin_with_table(engine: &mut Reconciler, dom: &RcDom, translations: &[(&str, &str)]) -> PassReport {
    match engine.begin(&dom.document) {
        Begin::Ready(report) => report,
        Begin::Load(ticket) => match engine.complete_load(&dom.document, &ticket, Ok(table(translations))) {
            LoadOutcome::Applied(report) => report,
            other => panic!("load should apply, got {:?}", other),
        },
    }
}

/// 记录导航请求
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub pushed: Vec<Url>,
    pub reloads: usize,
}

impl Navigator for RecordingNavigator {
    fn push_state(&mut self, url: &Url) {
        self.pushed.push(url.clone());
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

/// 统计重绘次数
#[derive(Debug, Clone, Default)]
pub struct CountingRedraw {
    pub count: Rc<Cell<usize>>,
}

impl RedrawHook for CountingRedraw {
    fn notify_redraw(&self, _root: &Handle) {
        self.count.set(self.count.get() + 1);
    }
}

/// 始终失败的翻译源
#[derive(Debug, Default)]
pub struct FailingSource {
    pub calls: AtomicUsize,
}

impl TranslationSource for FailingSource {
    async fn fetch_translations(&self, _lang: &str, _page_id: &str) -> Result<RawTable, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LoadError::Network("connection refused".to_string()))
    }
}

/// 前几次失败、之后转发给内部源
#[derive(Debug)]
pub struct FlakySource {
    pub inner: StaticSource,
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl FlakySource {
    pub fn new(inner: StaticSource, failures: usize) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TranslationSource for FlakySource {
    async fn fetch_translations(&self, lang: &str, page_id: &str) -> Result<RawTable, LoadError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(LoadError::Status {
                status: 503,
                url: format!("flaky://{}", page_id),
            });
        }
        self.inner.fetch_translations(lang, page_id).await
    }
}

/// 按语言延迟返回
#[derive(Debug)]
pub struct DelayedSource {
    pub inner: StaticSource,
    pub delays: HashMap<String, Duration>,
    pub calls: AtomicUsize,
}

impl DelayedSource {
    pub fn new(inner: StaticSource, delays: &[(&str, u64)]) -> Self {
        Self {
            inner,
            delays: delays
                .iter()
                .map(|(lang, ms)| (lang.to_string(), Duration::from_millis(*ms)))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl TranslationSource for DelayedSource {
    async fn fetch_translations(&self, lang: &str, page_id: &str) -> Result<RawTable, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(lang) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.fetch_translations(lang, page_id).await
    }
}
