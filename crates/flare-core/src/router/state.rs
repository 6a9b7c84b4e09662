use crate::endpoint::SharedPool;
use crate::invocation::{Invocation, ServiceUrl};
use crate::router::cache::RouterCache;
use crate::view::EndpointView;

/// 可缓存路由器：昂贵的匹配计算在后台预生成 [`RouterCache`]，
/// 热路径凭缓存条目对视图做廉价的位图收窄。
///
/// # 教案式说明
/// - **意图 (Why)**：标签分组、网格规则一类的匹配结果只随地址池或规则内容
///   变化，按池代预计算一次即可服务海量调用；
/// - **契约 (What)**：
///   - [`Self::name`] 是缓存键，同一条链内必须唯一；
///   - [`Self::notify`] 在每次地址池替换时被同步调用，可刷新内部索引，
///     但不得做长耗时工作——它运行在推送线程上；
///   - [`Self::pool`] 只会在后台重建线程上执行，耗时不设上限；
///     需要限时的实现应在内部自行兜底；
///   - [`Self::route`] 必须容忍拿到默认（未计算）条目：按“不匹配任何端点”
///     处理，不得 panic；
///   - [`Self::should_re_pool`] 返回 `true` 时，即便地址池未变也强制重算
///     （规则内容热更新的典型场景）；
/// - **权衡 (Trade-offs)**：缓存条目与池代绑定，池刚替换而缓存未追上的窗口内
///   条目是过期的；视图的长度钳制保证过期条目只会少选、不会越界。
pub trait StateRouter: Send + Sync {
    /// 缓存键兼诊断名称。
    fn name(&self) -> &str;

    /// 执行优先级：数值小者先执行，同值按注册顺序。
    fn priority(&self) -> i32 {
        0
    }

    /// 是否参与热路径路由；关闭后缓存仍会预计算，便于随时启用。
    fn enabled(&self) -> bool {
        true
    }

    /// 地址池整代替换的同步通知；默认忽略。
    fn notify(&self, pool: &SharedPool) {
        let _ = pool;
    }

    /// 面向一代地址池全量预计算本规则的缓存条目。
    fn pool(&self, pool: &SharedPool) -> crate::Result<RouterCache>;

    /// 是否要求下一轮重建强制重算（规则内容变更时返回 `true`）。
    fn should_re_pool(&self) -> bool {
        false
    }

    /// 凭缓存条目收窄视图，返回新视图。
    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        url: &ServiceUrl,
        invocation: &Invocation,
    ) -> crate::Result<EndpointView>;
}
