//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为路由域提供统一的领域错误载体：稳定错误码 + 人类可读描述，
//!   便于上层按码归类告警，而不必解析描述文本；
//! - 实现侧 crate（如 `flare-router`）各自维护细粒度 `thiserror` 枚举，
//!   并通过 `From` 收敛到本类型，`?` 运算符即可完成传播。
//!
//! ## 设计要求（What）
//! - 错误码取值集中在 [`codes`] 常量模块中，新增码位需同步更新告警规则；
//! - 错误本身可克隆、可比较，方便在测试与重试策略中直接断言。

use std::borrow::Cow;

use thiserror::Error;

/// 路由域稳定错误码。
///
/// - **意图 (Why)**：观测与告警系统按码聚合，码位一经发布不再变更语义；
/// - **契约 (What)**：所有码位均以 `router.` 前缀标识所属域。
pub mod codes {
    /// 地址缓存从未发布，调用暂不可路由。
    pub const CACHE_NOT_READY: &str = "router.cache.not_ready";
    /// 某个可缓存路由器在重建路径上的预计算失败。
    pub const RULE_POOL_FAILED: &str = "router.rule.pool_failed";
    /// 某个路由器在热路径 `route` 上失败。
    pub const RULE_ROUTE_FAILED: &str = "router.rule.route_failed";
    /// 重建工作线程无法创建或已退出。
    pub const WORKER_UNAVAILABLE: &str = "router.worker.unavailable";
}

/// 路由域统一错误。
///
/// # 教案式说明
/// - **意图 (Why)**：上层调用方（集群、负载均衡）只面向一种错误类型做失败决策，
///   细分语义由错误码表达；
/// - **契约 (What)**：`code` 为稳定标识，优先取自 [`codes`]；`message` 为诊断文本，
///   可随版本调整措辞，不应被程序逻辑解析；
/// - **权衡 (Trade-offs)**：`Cow<'static, str>` 让常量码零分配，同时保留插件侧
///   动态构码的余地。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct FlareError {
    code: Cow<'static, str>,
    message: String,
}

impl FlareError {
    /// 以错误码与描述构造错误。
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 读取稳定错误码。
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 读取诊断描述。
    pub fn message(&self) -> &str {
        &self.message
    }
}
