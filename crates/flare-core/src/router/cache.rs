use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::view::BitMask;

/// 单个可缓存路由器面向一代地址池的预计算产物。
///
/// # 教案式说明
/// - **意图 (Why)**：把“哪些端点满足规则”的昂贵判定离线成若干命名子池
///   （如标签值 → 成员掩码），热路径查键取掩码即可；
/// - **契约 (What)**：
///   - `pools` 的键由规则自行定义（标签值、机房名等），引擎不解释；
///   - `attachment` 是规则私有的关联状态（如解析后的规则体），
///     引擎只负责随条目一起发布与回收；
///   - [`Default`] 值表示“尚未计算”：没有任何子池、没有附件，
///     规则侧必须把它当作“不匹配任何端点”；
/// - **权衡 (Trade-offs)**：附件用 `Arc<dyn Any>` 承载，换取条目结构对
///   规则类型零感知；取用方以 [`Self::attachment`] 按类型取回。
#[derive(Clone, Default)]
pub struct RouterCache {
    pools: BTreeMap<String, BitMask>,
    attachment: Option<Arc<dyn Any + Send + Sync>>,
}

impl RouterCache {
    /// 构造空条目，等价于 [`Default`]。
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个命名子池。
    pub fn insert_pool(&mut self, key: impl Into<String>, mask: BitMask) {
        self.pools.insert(key.into(), mask);
    }

    /// 读取命名子池的成员掩码。
    pub fn pool(&self, key: &str) -> Option<&BitMask> {
        self.pools.get(key)
    }

    /// 遍历全部命名子池。
    pub fn pools(&self) -> impl Iterator<Item = (&str, &BitMask)> {
        self.pools.iter().map(|(key, mask)| (key.as_str(), mask))
    }

    /// 挂载规则私有的关联状态。
    pub fn with_attachment(mut self, attachment: Arc<dyn Any + Send + Sync>) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// 按类型取回关联状态；类型不符或未挂载时返回 `None`。
    pub fn attachment<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.attachment.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// 条目是否仍处于“尚未计算”状态。
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty() && self.attachment.is_none()
    }
}

impl fmt::Debug for RouterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterCache")
            .field("pools", &self.pools.keys().collect::<Vec<_>>())
            .field("attachment", &self.attachment.is_some())
            .finish()
    }
}
