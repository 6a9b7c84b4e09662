//! # error 模块说明
//!
//! 路由链引擎对外的细粒度错误，调用方可据此区分“暂不可路由”（可等待重试）
//! 与“规则执行失败”（应走调用失败策略）。通过 `From` 收敛到
//! [`FlareError`]，使上层 `?` 传播无需显式转换。

use flare_core::FlareError;
use flare_core::error::codes;
use thiserror::Error;

/// 路由链错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：热路径上只有两类失败需要调用方分别决策——缓存尚未发布、
///   某个路由器自身报错；前者是时序问题，后者是规则问题；
/// - **契约 (What)**：
///   - [`Self::CacheNotReady`] 只在整链从未发布过快照时出现；一旦发布过，
///     后续调用至多拿到过期快照，不会再见到此错误；
///   - [`Self::RouteFailed`] 原样携带规则侧错误，引擎不吞错、不重试；
/// - **权衡 (Trade-offs)**：错误携带 `String` 上下文，牺牲少量分配换取
///   诊断信息自包含。
#[derive(Clone, Debug, Error)]
pub enum RouterError {
    /// 地址缓存从未发布，本次调用暂不可路由。
    #[error("address cache not built yet for service `{service}` (method `{method}`)")]
    CacheNotReady { service: String, method: String },

    /// 某个路由器在热路径上失败。
    #[error("router `{router}` failed while routing: {cause}")]
    RouteFailed { router: String, cause: FlareError },
}

impl From<RouterError> for FlareError {
    /// 依据错误类别挑选稳定错误码，拼装自包含的诊断描述。
    fn from(value: RouterError) -> Self {
        match value {
            RouterError::CacheNotReady { service, method } => FlareError::new(
                codes::CACHE_NOT_READY,
                format!(
                    "service `{service}` has no published address cache; method `{method}` cannot be routed yet"
                ),
            ),
            RouterError::RouteFailed { router, cause } => FlareError::new(
                codes::RULE_ROUTE_FAILED,
                format!("router `{router}` failed on the route path: {cause}"),
            ),
        }
    }
}
