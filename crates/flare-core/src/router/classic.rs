use std::sync::Arc;

use crate::endpoint::{Endpoint, SharedPool};
use crate::invocation::{Invocation, ServiceUrl};

/// 无状态路由器：每次调用在具体候选列表上全量重算，没有任何缓存。
///
/// # 教案式说明
/// - **意图 (Why)**：有些规则的判定依赖每次调用都会变化的输入（方法级条件、
///   调用方染色），缓存无从谈起，直接在物化后的列表上过滤最简单；
/// - **契约 (What)**：
///   - [`Self::route`] 对相同输入必须给出相同输出（确定性）；
///   - 实现抛出的错误原样上抛给调用方，引擎不吞错、不重试；
///   - [`Self::notify`] 在地址池整代替换时同步回调，必须保持轻量；
/// - **权衡 (Trade-offs)**：重算发生在候选集已被可缓存规则收窄之后，
///   通常只剩少量端点，列表级过滤的开销可以接受。
pub trait Router: Send + Sync {
    /// 诊断名称，用于错误与日志标注，不参与任何匹配逻辑。
    fn name(&self) -> &str;

    /// 执行优先级：数值小者先执行，同值按注册顺序。
    fn priority(&self) -> i32 {
        0
    }

    /// 地址池整代替换的同步通知；默认忽略。
    fn notify(&self, pool: &SharedPool) {
        let _ = pool;
    }

    /// 在候选列表上过滤，返回保序的新候选列表。
    fn route(
        &self,
        candidates: Vec<Arc<Endpoint>>,
        url: &ServiceUrl,
        invocation: &Invocation,
    ) -> crate::Result<Vec<Arc<Endpoint>>>;
}
