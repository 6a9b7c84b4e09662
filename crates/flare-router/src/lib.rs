//! # flare-router
//!
//! ## 定位与职责（Why）
//! - 实现 `flare-core` 路由契约的默认引擎：持有地址池与两类路由器的有序列表，
//!   在热路径上把候选集逐级收窄，在后台把可缓存规则的昂贵预计算离线成
//!   原子发布的地址缓存快照。
//! - 读写彻底分离：`route` 只读原子引用，永不等待重建；重建由专职线程串行
//!   执行，是快照的唯一写者。
//!
//! ## 模块结构（How）
//! - `chain`：路由链编排器（[`RouterChain`]）与其构造器；
//! - `cache`：整链缓存快照 [`AddressCache`]；
//! - `rebuild`：重建触发的按类合并闸门与后台工作循环；
//! - `error`：引擎对外错误，经 `From` 收敛到 `flare_core::FlareError`。
//!
//! ## 并发契约（What）
//! - 地址池、活跃路由器列表与已发布快照全部经 `arc-swap` 读取，热路径零锁；
//! - 管理操作（整代换池、规则合并）在一把互斥锁内串行，频率低、临界区短；
//! - 同类重建触发最多“一个在跑 + 一个在排”，突发换池不会堆积重建任务。

pub mod cache;
pub mod chain;
pub mod error;

mod rebuild;

pub use cache::AddressCache;
pub use chain::{RouterChain, RouterChainBuilder};
pub use error::RouterError;
