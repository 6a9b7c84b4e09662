//! # rebuild 模块说明
//!
//! ## 角色定位（Why）
//! - 地址池或规则内容的每次变更都希望尽快反映到地址缓存里，但变更常成簇到达
//!   （注册中心抖动、规则批量下发）。本模块以“按触发类合并 + 专职线程串行重建”
//!   把突发触发压成至多“一个在跑 + 一个在排”，重建吞吐与变更频率解耦。
//! - 两类触发语义不同：换池触发强制所有可缓存路由器重算；规则触发把重算决策
//!   交还给每个路由器（条目缺失或 `should_re_pool`）。因此闸门按类各设一个，
//!   互不代偿。
//!
//! ## 行为概览（How）
//! 1. 触发方经 [`TriggerGates::admit`] 抢占本类唯一排队名额，成功才投递；
//! 2. 工作线程出队后**先放行闸门、再读现场池**：重建运行期内落入的同类触发
//!    会排进下一轮，而被闸门合并掉的触发，其意图已被本轮读到的最新池代覆盖；
//! 3. 逐个路由器决定“复用旧条目还是重算”，失败只记数不中断其余路由器；
//! 4. 任何一个路由器失败都丢弃整份草稿，上一份快照保持发布（全有或全无）。
//!
//! ## 并发契约（What）
//! - 本模块是已发布快照的唯一写者；
//! - 不取消、不限时：慢规则拖慢的只是缓存新鲜度，从不拖慢 `route` 调用方。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use tracing::{debug, error, warn};

use flare_core::endpoint::SharedPool;
use flare_core::router::{RouterCache, StateRouter};

use crate::cache::AddressCache;
use crate::chain::ChainState;

/// 重建触发的类别，决定可缓存路由器是否被强制重算。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RebuildTrigger {
    /// 地址池整代替换：全部路由器强制重算。
    Address,
    /// 规则内容变更：按路由器自身策略决定是否重算。
    Content,
}

/// 按触发类的单名额准入闸门。
///
/// 同类触发在“已排队或在跑且未放行”期间到达时被合并掉；
/// 跨类触发互不影响，避免规则触发顶掉换池触发的强制重算语义。
pub(crate) struct TriggerGates {
    address: AtomicBool,
    content: AtomicBool,
}

impl TriggerGates {
    pub(crate) fn new() -> Self {
        Self {
            address: AtomicBool::new(false),
            content: AtomicBool::new(false),
        }
    }

    fn slot(&self, trigger: RebuildTrigger) -> &AtomicBool {
        match trigger {
            RebuildTrigger::Address => &self.address,
            RebuildTrigger::Content => &self.content,
        }
    }

    /// 尝试占用本类名额；返回 `false` 表示已有同类触发排队，本次合并。
    pub(crate) fn admit(&self, trigger: RebuildTrigger) -> bool {
        self.slot(trigger)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 放行本类名额，允许下一个同类触发排队。
    pub(crate) fn release(&self, trigger: RebuildTrigger) {
        self.slot(trigger).store(false, Ordering::Release);
    }
}

/// 重建工作线程主循环：触发通道关闭（链被析构）即退出。
pub(crate) fn run(state: Arc<ChainState>, triggers: Receiver<RebuildTrigger>) {
    while let Ok(trigger) = triggers.recv() {
        // 先放行闸门再读池：保证被合并触发的最终池代必然进入某一轮重建。
        state.gates.release(trigger);
        rebuild(&state, trigger == RebuildTrigger::Address);
    }
    debug!(service = %state.service, "rebuild worker stopped");
}

/// 执行一轮重建：构草稿、全有或全无地发布。
pub(crate) fn rebuild(state: &ChainState, force_re_pool: bool) {
    let pool = state.pool.load_full();
    let previous = state.cache.load_full();
    let state_routers = state.state_routers.load_full();

    let mut draft = BTreeMap::new();
    let mut failures = 0usize;
    for router in state_routers.iter() {
        match pool_entry(router.as_ref(), previous.as_deref(), &pool, force_re_pool) {
            Ok(entry) => {
                draft.insert(router.name().to_owned(), entry);
            }
            Err(cause) => {
                failures += 1;
                error!(
                    service = %state.service,
                    router = router.name(),
                    code = flare_core::error::codes::RULE_POOL_FAILED,
                    %cause,
                    "state router failed to pool the address generation"
                );
            }
        }
    }

    if failures != 0 {
        warn!(
            service = %state.service,
            failures,
            "draft address cache discarded; previous snapshot stays published"
        );
        return;
    }

    state
        .cache
        .store(Some(Arc::new(AddressCache::new(pool, draft))));
    debug!(
        service = %state.service,
        routers = state_routers.len(),
        forced = force_re_pool,
        "address cache published"
    );
}

/// 单个路由器的条目决策：能复用旧条目则复用，否则调用 `pool` 重算。
fn pool_entry(
    router: &dyn StateRouter,
    previous: Option<&AddressCache>,
    pool: &SharedPool,
    force_re_pool: bool,
) -> flare_core::Result<Arc<RouterCache>> {
    if !force_re_pool && !router.should_re_pool() {
        if let Some(entry) = previous.and_then(|cache| cache.router(router.name())) {
            return Ok(Arc::clone(entry));
        }
    }
    router.pool(pool).map(Arc::new)
}
