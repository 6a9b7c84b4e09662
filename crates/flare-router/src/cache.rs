//! # cache 模块说明
//!
//! 整链地址缓存快照：一代地址池加上“路由器名 → 预计算条目”的只读映射。
//! 快照由重建线程独家构建，经 `arc-swap` 原子发布；发布后任何字段不再变动，
//! 任意数量的并发读者无锁共享。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use flare_core::endpoint::{EndpointPool, SharedPool};
use flare_core::router::RouterCache;

/// 整链缓存快照。
///
/// # 教案式说明
/// - **意图 (Why)**：把“每个可缓存路由器对这代池的判定”捆成一个不可变整体，
///   热路径一次 `load` 即可拿到彼此一致的全部条目，不存在跨代混读；
/// - **契约 (What)**：
///   - `pool` 是快照构建时的池代引用，仅用于过期判断与诊断，
///     热路径的候选底座始终取现场池；
///   - 条目缺失表示该路由器在构建时不在活跃列表中，读取方应以默认条目兜底；
/// - **生命周期**：整体替换、从不修补；旧快照在最后一个读者释放后自然回收。
pub struct AddressCache {
    pool: SharedPool,
    routers: BTreeMap<String, Arc<RouterCache>>,
}

impl AddressCache {
    pub(crate) fn new(pool: SharedPool, routers: BTreeMap<String, Arc<RouterCache>>) -> Self {
        Self { pool, routers }
    }

    /// 快照构建所依据的池代。
    pub fn pool(&self) -> &SharedPool {
        &self.pool
    }

    /// 读取指定路由器的预计算条目。
    pub fn router(&self, name: &str) -> Option<&Arc<RouterCache>> {
        self.routers.get(name)
    }

    /// 遍历快照内全部路由器名。
    pub fn router_names(&self) -> impl Iterator<Item = &str> {
        self.routers.keys().map(String::as_str)
    }

    /// 快照是否已落后于现场池代。
    ///
    /// 过期是活性问题而非正确性问题：地址永远取现场池，过期的只是规则缓存。
    pub fn is_stale(&self, live: &SharedPool) -> bool {
        !EndpointPool::same_generation(&self.pool, live)
    }
}

impl fmt::Debug for AddressCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressCache")
            .field("pool_len", &self.pool.len())
            .field("routers", &self.routers.keys().collect::<Vec<_>>())
            .finish()
    }
}
