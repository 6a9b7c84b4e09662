//! # view 模块说明
//!
//! ## 角色定位（Why）
//! - 路由链由多级规则串联，每级都要在候选集上做一次收窄。若每级都复制列表，
//!   热路径的分配开销会随规则数线性放大；本模块以“共享底座 + 位图成员标记”
//!   取代复制：底座（地址池）全程只读，收窄只翻转位。
//! - 同一底座上的两个视图可以直接按位求交，规则间组合决策无需回读端点本体。
//!
//! ## 行为概览（How）
//! - [`BitMask`]：定长位向量，64 位一块，提供置位、求交、按位遍历；
//! - [`EndpointView`]：`SharedPool + BitMask`，包裹（全员在场）、谓词收窄、
//!   掩码求交、物化为有序候选列表。
//!
//! ## 使用契约（What）
//! - 任何操作都不修改、不复制底座序列；物化结果保持池内原始顺序；
//! - **长度钳制**：与另一代池尺寸的掩码求交时，超出较短一方的位一律清零。
//!   过期缓存条目因此天然安全——宁可错杀候选，也不会越界或放大集合。

use std::fmt;
use std::sync::Arc;

use crate::endpoint::{Endpoint, SharedPool};

const BLOCK_BITS: usize = 64;

/// 定长位向量，表示“池内第 i 个端点是否仍在候选集中”。
///
/// # 教案式说明
/// - **意图 (Why)**：布尔数组的紧凑表示，求交一块 64 位并行完成；
/// - **契约 (What)**：`len` 固定于构造时刻；尾块中超出 `len` 的位恒为 0，
///   `count_ones`/`iter_ones` 据此无需逐位判界；
/// - **权衡 (Trade-offs)**：不提供动态扩缩——地址池整代替换的模型下，
///   掩码与池同寿命，扩缩反而是误用信号。
#[derive(Clone, PartialEq, Eq)]
pub struct BitMask {
    blocks: Vec<u64>,
    len: usize,
}

impl BitMask {
    /// 构造全 1 掩码：所有位置初始在场。
    pub fn filled(len: usize) -> Self {
        let mut blocks = vec![u64::MAX; len.div_ceil(BLOCK_BITS)];
        let tail = len % BLOCK_BITS;
        if tail != 0 {
            if let Some(last) = blocks.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self { blocks, len }
    }

    /// 构造全 0 掩码：所有位置初始缺席。
    pub fn empty(len: usize) -> Self {
        Self {
            blocks: vec![0; len.div_ceil(BLOCK_BITS)],
            len,
        }
    }

    /// 掩码覆盖的位置总数（含 0 位）。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否不覆盖任何位置。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 读取指定位置；越界视为缺席。
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.blocks[index / BLOCK_BITS] >> (index % BLOCK_BITS) & 1 == 1
    }

    /// 将指定位置标记为在场。
    ///
    /// # Panics
    /// 位置越界时 panic：掩码与池同长是调用方必须维持的不变量。
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        self.blocks[index / BLOCK_BITS] |= 1 << (index % BLOCK_BITS);
    }

    /// 将指定位置标记为缺席。
    ///
    /// # Panics
    /// 位置越界时 panic，理由同 [`Self::set`]。
    pub fn clear(&mut self, index: usize) {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        self.blocks[index / BLOCK_BITS] &= !(1 << (index % BLOCK_BITS));
    }

    /// 在场位置总数。
    pub fn count_ones(&self) -> usize {
        self.blocks.iter().map(|block| block.count_ones() as usize).sum()
    }

    /// 与另一掩码按位求交，结果就地写回自身。
    ///
    /// 两掩码长度可以不同：对方缺失的块按全 0 处理（长度钳制，见模块文档）。
    pub fn intersect(&mut self, other: &BitMask) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            *block &= other.blocks.get(index).copied().unwrap_or(0);
        }
    }

    /// 按升序遍历所有在场位置。
    pub fn iter_ones(&self) -> IterOnes<'_> {
        IterOnes {
            blocks: &self.blocks,
            block_index: 0,
            current: self.blocks.first().copied().unwrap_or(0),
        }
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitMask")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}

/// [`BitMask::iter_ones`] 的迭代器：按块扫描，逐个弹出最低置位。
pub struct IterOnes<'a> {
    blocks: &'a [u64],
    block_index: usize,
    current: u64,
}

impl Iterator for IterOnes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.block_index += 1;
            if self.block_index >= self.blocks.len() {
                return None;
            }
            self.current = self.blocks[self.block_index];
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.block_index * BLOCK_BITS + bit)
    }
}

/// 地址池上的零拷贝候选视图。
///
/// # 教案式说明
/// - **意图 (Why)**：让“池 → 规则1 → 规则2 → … → 候选列表”的收窄链路
///   只在最后一步分配结果列表；
/// - **契约 (What)**：
///   - 视图持有池的 `Arc`，底座在视图存续期内不可变；
///   - 收窄操作取值自身并返回新视图，天然适配逐级折叠的调用形态；
///   - [`Self::materialize`] 按池内原始顺序输出候选；
/// - **权衡 (Trade-offs)**：视图按值流转（一个 `Arc` 加一个位向量），
///   避免生命周期参数在 trait 对象接口上的传染。
#[derive(Clone, Debug)]
pub struct EndpointView {
    pool: SharedPool,
    mask: BitMask,
}

impl EndpointView {
    /// 包裹一代地址池，所有端点初始在场。
    pub fn wrap(pool: SharedPool) -> Self {
        let mask = BitMask::filled(pool.len());
        Self { pool, mask }
    }

    /// 视图背后的地址池。
    pub fn pool(&self) -> &SharedPool {
        &self.pool
    }

    /// 当前成员掩码。
    pub fn mask(&self) -> &BitMask {
        &self.mask
    }

    /// 仍在场的候选数量。
    pub fn len(&self) -> usize {
        self.mask.count_ones()
    }

    /// 是否已无候选。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 以谓词收窄：只访问仍在场的位置，谓词拒绝的位置被清除。
    pub fn retain(mut self, mut keep: impl FnMut(&Endpoint) -> bool) -> Self {
        let cleared: Vec<usize> = self
            .mask
            .iter_ones()
            .filter(|&index| match self.pool.get(index) {
                Some(endpoint) => !keep(endpoint),
                None => true,
            })
            .collect();
        for index in cleared {
            self.mask.clear(index);
        }
        self
    }

    /// 以掩码收窄：成员集取交集，允许对方掩码来自另一代池（长度钳制）。
    pub fn narrow(mut self, mask: &BitMask) -> Self {
        self.mask.intersect(mask);
        self
    }

    /// 与同底座的另一视图求交。
    ///
    /// # Panics
    /// 两视图底座不是同一代池时 panic：跨代求交没有可定义的语义。
    pub fn intersect(mut self, other: &EndpointView) -> Self {
        assert!(
            Arc::ptr_eq(&self.pool, &other.pool),
            "views must share the same pool generation"
        );
        self.mask.intersect(&other.mask);
        self
    }

    /// 物化为有序候选列表：只走在场位置，按池内原始顺序克隆端点指针。
    pub fn materialize(&self) -> Vec<Arc<Endpoint>> {
        let mut candidates = Vec::with_capacity(self.mask.count_ones());
        for index in self.mask.iter_ones() {
            if let Some(endpoint) = self.pool.get(index) {
                candidates.push(Arc::clone(endpoint));
            }
        }
        candidates
    }
}
