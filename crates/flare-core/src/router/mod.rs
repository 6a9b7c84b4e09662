//! Router 契约模块：定义路由链两类规则插件的能力接口与预计算产物。
//!
//! # 教案级说明（Why）
//! - 路由规则（标签、条件、网格等）由外部模块实现并注入路由链，本模块
//!   只沉淀它们与引擎之间的最小契约面，引擎与规则得以独立演进；
//! - 两类能力刻意分离：[`Router`] 每次调用全量重算，语义直观；
//!   [`StateRouter`] 把昂贵计算移到异步重建，热路径只做位图收窄。
//!
//! # 模块结构（How）
//! - `classic`：无状态路由器契约；
//! - `state`：可缓存路由器契约；
//! - `cache`：可缓存路由器的预计算产物 [`RouterCache`]。
//!
//! # 排序契约（What）
//! - 两类路由器都暴露 `priority()`，数值小者先执行；
//! - 引擎必须使用稳定排序，同优先级保持注册顺序。

pub mod cache;
pub mod classic;
pub mod state;

pub use cache::RouterCache;
pub use classic::Router;
pub use state::StateRouter;
