//! # flare-core
//!
//! ## 定位与职责（Why）
//! - 作为 flare 框架路由域的契约层，集中定义“一次调用可以投递给哪些远端端点”
//!   所需的数据结构与能力接口，供路由链引擎（`flare-router`）、规则插件与上层
//!   集群调用方共同依赖。
//! - 契约层不承载任何调度或缓存策略：重建时机、快照发布、触发合并均属于引擎侧
//!   的实现细节，规则插件只需面向本 crate 的接口编程。
//!
//! ## 模块结构（How）
//! - `endpoint`：不可变端点与整批替换的地址池；
//! - `invocation`：消费方订阅标识与单次调用描述；
//! - `view`：基于位图的零拷贝候选视图，支撑多级规则逐层收窄；
//! - `router`：两类路由器能力契约（无状态 `Router` 与可缓存 `StateRouter`）
//!   及其预计算产物 `RouterCache`；
//! - `error`：统一领域错误与稳定错误码。
//!
//! ## 使用契约（What）
//! - 所有共享数据默认以 `Arc` 承载，读路径不加锁；
//! - 映射结构统一使用 `BTreeMap`，保证迭代顺序确定，便于测试与日志比对。

pub mod endpoint;
pub mod error;
pub mod invocation;
pub mod router;
pub mod view;

pub use endpoint::{Endpoint, EndpointPool, SharedPool};
pub use error::FlareError;
pub use invocation::{Invocation, ServiceUrl};
pub use router::{Router, RouterCache, StateRouter};
pub use view::{BitMask, EndpointView};

/// 领域统一的 `Result` 别名，默认错误类型为 [`FlareError`]。
pub type Result<T, E = FlareError> = core::result::Result<T, E>;
