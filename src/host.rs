//! 宿主环境接口
//!
//! 引擎之外的两个协作者：写入后的重绘通知，以及整页导航。

use markup5ever_rcdom::Handle;
use url::Url;

use crate::config::constants;
use crate::dom::{descendants, get_node_attr, set_node_attr};
use crate::text::Selector;

/// 重绘钩子
///
/// 页面构建器在文本被改写后不一定会重新布局，应用翻译后引擎会调用此钩子。
/// 只有真正改变了节点内容的轮次才会触发。
pub trait RedrawHook {
    /// 通知宿主重绘
    ///
    /// # 参数
    ///
    /// * `root` - 文档根节点
    fn notify_redraw(&self, root: &Handle);
}

/// 什么都不做
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRedraw;

impl RedrawHook for NoopRedraw {
    fn notify_redraw(&self, _root: &Handle) {}
}

/// 给图片和动画块设置 `opacity: 0.999`，迫使页面构建器重绘
#[derive(Debug, Clone)]
pub struct OpacityNudge {
    targets: Vec<Selector>,
}

impl OpacityNudge {
    pub fn new() -> Self {
        let targets = constants::REDRAW_SELECTORS
            .iter()
            .filter_map(|raw| Selector::parse(raw).ok())
            .collect();
        Self { targets }
    }

    pub fn with_targets(targets: Vec<Selector>) -> Self {
        Self { targets }
    }
}

impl Default for OpacityNudge {
    fn default() -> Self {
        Self::new()
    }
}

impl RedrawHook for OpacityNudge {
    fn notify_redraw(&self, root: &Handle) {
        let mut touched = 0usize;
        for node in descendants(root) {
            if self.targets.iter().any(|selector| selector.matches(&node)) {
                let style = merge_style(get_node_attr(&node, "style").as_deref(), "opacity", "0.999");
                set_node_attr(&node, "style", Some(style));
                touched += 1;
            }
        }
        tracing::trace!("重绘提示已写入 {} 个元素", touched);
    }
}

/// 在内联样式中设置一条声明，已有的同名声明被替换
fn merge_style(existing: Option<&str>, property: &str, value: &str) -> String {
    let mut declarations: Vec<String> = existing
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            decl.split(':')
                .next()
                .map(|name| !name.trim().eq_ignore_ascii_case(property))
                .unwrap_or(true)
        })
        .map(str::to_string)
        .collect();

    declarations.push(format!("{}: {}", property, value));
    declarations.join("; ")
}

/// 整页导航
///
/// 语言切换默认通过导航完成：先写入新地址，再重新加载执行环境，整个流程从空状态开始。
pub trait Navigator {
    /// 写入新的地址状态（不加载）
    fn push_state(&mut self, url: &Url);

    /// 重新加载当前地址
    fn reload(&mut self);
}

/// 记录导航请求，不做任何事
///
/// 用于命令行预渲染：那里没有可以重新加载的执行环境。
#[derive(Debug, Clone, Default)]
pub struct DetachedNavigator {
    pub current: Option<Url>,
    pub reloads: usize,
}

impl Navigator for DetachedNavigator {
    fn push_state(&mut self, url: &Url) {
        self.current = Some(url.clone());
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}
