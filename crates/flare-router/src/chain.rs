//! # chain 模块说明
//!
//! ## 角色定位（Why）
//! - [`RouterChain`] 是路由域的编排器：对接发现层的整代换池、治理层的规则
//!   合并，以及调用层的每次路由请求；
//! - 读写分工是本模块的全部设计：热路径 `route` 只做原子读与位图收窄，
//!   所有可能阻塞的工作（规则预计算）都被推到专职重建线程。
//!
//! ## 行为概览（How）
//! - 换池：在管理锁内“存池 → 逐个通知路由器”，随后请求一次强制重建；
//! - 规则合并：活跃列表 = 常驻内置 ∪ 本次下发，稳定排序后整体替换，
//!   随后请求一次非强制重建；
//! - 路由：加载已发布快照与现场池，先折叠启用的可缓存路由器（凭快照条目
//!   收窄视图），物化后再折叠无状态路由器。
//!
//! ## 使用契约（What）
//! - 快照从未发布前，`route` 以 [`RouterError::CacheNotReady`] 同步失败，
//!   重试时机交由调用方决策；
//! - 链析构时关闭触发通道并汇合重建线程，进行中的一轮重建会先行跑完。

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;
use tracing::{debug, warn};

use flare_core::FlareError;
use flare_core::endpoint::{Endpoint, EndpointPool, SharedPool};
use flare_core::error::codes;
use flare_core::invocation::{Invocation, ServiceUrl};
use flare_core::router::{Router, RouterCache, StateRouter};
use flare_core::view::EndpointView;

use crate::cache::AddressCache;
use crate::error::RouterError;
use crate::rebuild::{self, RebuildTrigger, TriggerGates};

/// 链与重建线程共享的全部状态。
///
/// 字段分三组：热路径只读的 `arc-swap` 槽位（池、活跃列表、快照）、
/// 管理路径独占的内置列表（锁内），以及触发合并闸门。
pub(crate) struct ChainState {
    pub(crate) service: String,
    pub(crate) pool: ArcSwap<EndpointPool>,
    pub(crate) routers: ArcSwap<Vec<Arc<dyn Router>>>,
    pub(crate) state_routers: ArcSwap<Vec<Arc<dyn StateRouter>>>,
    pub(crate) cache: ArcSwapOption<AddressCache>,
    pub(crate) admin: Mutex<AdminState>,
    pub(crate) gates: TriggerGates,
}

/// 管理锁保护的常驻内置列表：规则内容热更新时作为合并基底，实例全程不换。
pub(crate) struct AdminState {
    builtin_routers: Vec<Arc<dyn Router>>,
    builtin_state_routers: Vec<Arc<dyn StateRouter>>,
}

/// 稳定排序：优先级小者在前，同值保持原有相对顺序。
fn sort_routers(routers: &mut [Arc<dyn Router>]) {
    routers.sort_by_key(|router| router.priority());
}

fn sort_state_routers(routers: &mut [Arc<dyn StateRouter>]) {
    routers.sort_by_key(|router| router.priority());
}

/// [`RouterChain`] 的构造器：收集服务名与常驻内置路由器。
///
/// # 教案式说明
/// - **意图 (Why)**：内置路由器必须在首次地址通知之前就位，构造器把
///   “先装规则、再通地址”的顺序固化在类型层面；
/// - **契约 (What)**：[`Self::build`] 失败仅因重建线程无法创建；
///   成功返回的链可立即跨线程共享。
pub struct RouterChainBuilder {
    service: String,
    builtin_routers: Vec<Arc<dyn Router>>,
    builtin_state_routers: Vec<Arc<dyn StateRouter>>,
}

impl RouterChainBuilder {
    /// 以订阅的服务名开始构造。
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            builtin_routers: Vec::new(),
            builtin_state_routers: Vec::new(),
        }
    }

    /// 注册一个常驻的无状态路由器。
    pub fn builtin_router(mut self, router: Arc<dyn Router>) -> Self {
        self.builtin_routers.push(router);
        self
    }

    /// 注册一个常驻的可缓存路由器。
    pub fn builtin_state_router(mut self, router: Arc<dyn StateRouter>) -> Self {
        self.builtin_state_routers.push(router);
        self
    }

    /// 组装路由链并启动重建工作线程。
    pub fn build(self) -> flare_core::Result<RouterChain> {
        let worker_name = format!("flare-router-rebuild-{}", self.service);

        let mut routers = self.builtin_routers.clone();
        sort_routers(&mut routers);
        let mut state_routers = self.builtin_state_routers.clone();
        sort_state_routers(&mut state_routers);

        let state = Arc::new(ChainState {
            service: self.service,
            pool: ArcSwap::from_pointee(EndpointPool::default()),
            routers: ArcSwap::from_pointee(routers),
            state_routers: ArcSwap::from_pointee(state_routers),
            cache: ArcSwapOption::empty(),
            admin: Mutex::new(AdminState {
                builtin_routers: self.builtin_routers,
                builtin_state_routers: self.builtin_state_routers,
            }),
            gates: TriggerGates::new(),
        });

        let (trigger_tx, trigger_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(worker_name)
            .spawn({
                let state = Arc::clone(&state);
                move || rebuild::run(state, trigger_rx)
            })
            .map_err(|cause| {
                FlareError::new(
                    codes::WORKER_UNAVAILABLE,
                    format!("failed to spawn rebuild worker: {cause}"),
                )
            })?;

        Ok(RouterChain {
            state,
            trigger_tx: Some(trigger_tx),
            worker: Some(worker),
        })
    }
}

/// 路由链编排器。
///
/// # 教案式说明
/// - **意图 (Why)**：见模块文档；一个服务订阅对应一条链，实例通常以 `Arc`
///   注入调用层长期持有；
/// - **契约 (What)**：
///   - [`Self::route`] 可在任意线程并发调用，永不阻塞于重建；
///   - 管理操作（[`Self::set_endpoints`]、[`Self::merge_routers`]、
///     [`Self::merge_state_routers`]）内部串行，调用方无需额外同步；
///   - 快照发布具备全有或全无语义：任何规则预计算失败都不会让半成品可见；
/// - **权衡 (Trade-offs)**：重建不可取消、不限时——慢规则只拖慢缓存新鲜度；
///   需要限时的规则应在自身 `pool` 实现内兜底。
pub struct RouterChain {
    state: Arc<ChainState>,
    trigger_tx: Option<Sender<RebuildTrigger>>,
    worker: Option<JoinHandle<()>>,
}

impl RouterChain {
    /// 进入构造器。
    pub fn builder(service: impl Into<String>) -> RouterChainBuilder {
        RouterChainBuilder::new(service)
    }

    /// 本链订阅的服务名。
    pub fn service(&self) -> &str {
        &self.state.service
    }

    /// 接受发现层的整代地址推送；`None` 归一化为空池。
    ///
    /// 顺序约定：先存池、再按优先级同步通知可缓存路由器与无状态路由器，
    /// 最后请求强制重建。通知运行在推送线程上，路由器实现必须保持轻量。
    pub fn set_endpoints(&self, endpoints: Option<Vec<Arc<Endpoint>>>) {
        let pool: SharedPool = Arc::new(EndpointPool::new(endpoints.unwrap_or_default()));
        {
            let _admin = self.state.admin.lock();
            self.state.pool.store(Arc::clone(&pool));
            for router in self.state.state_routers.load().iter() {
                router.notify(&pool);
            }
            for router in self.state.routers.load().iter() {
                router.notify(&pool);
            }
        }
        debug!(service = %self.state.service, endpoints = pool.len(), "address pool replaced");
        self.request_rebuild(RebuildTrigger::Address);
    }

    /// 合并治理层下发的无状态路由器：活跃列表 = 内置 ∪ 本次下发。
    ///
    /// 重复调用以最近一次下发为准（上一次下发的非内置实例被整体替换）。
    pub fn merge_routers(&self, supplied: Vec<Arc<dyn Router>>) {
        {
            let admin = self.state.admin.lock();
            let mut active: Vec<Arc<dyn Router>> = admin
                .builtin_routers
                .iter()
                .cloned()
                .chain(supplied)
                .collect();
            sort_routers(&mut active);
            self.state.routers.store(Arc::new(active));
        }
        debug!(service = %self.state.service, "classic routers merged");
        self.request_rebuild(RebuildTrigger::Content);
    }

    /// 合并治理层下发的可缓存路由器，语义同 [`Self::merge_routers`]。
    pub fn merge_state_routers(&self, supplied: Vec<Arc<dyn StateRouter>>) {
        {
            let admin = self.state.admin.lock();
            let mut active: Vec<Arc<dyn StateRouter>> = admin
                .builtin_state_routers
                .iter()
                .cloned()
                .chain(supplied)
                .collect();
            sort_state_routers(&mut active);
            self.state.state_routers.store(Arc::new(active));
        }
        debug!(service = %self.state.service, "state routers merged");
        self.request_rebuild(RebuildTrigger::Content);
    }

    /// 为一次调用产出过滤后的有序候选列表。
    ///
    /// 执行序：已发布快照缺失即失败；现场池包裹为全员视图；启用的可缓存
    /// 路由器按优先级凭快照条目收窄（条目缺失以默认条目兜底）；物化；
    /// 无状态路由器按优先级在列表上重算。
    pub fn route(
        &self,
        url: &ServiceUrl,
        invocation: &Invocation,
    ) -> Result<Vec<Arc<Endpoint>>, RouterError> {
        let Some(cache) = self.state.cache.load_full() else {
            return Err(RouterError::CacheNotReady {
                service: self.state.service.clone(),
                method: invocation.method().to_owned(),
            });
        };

        let pool = self.state.pool.load_full();
        let mut view = EndpointView::wrap(pool);
        let not_computed = RouterCache::default();

        let state_routers = self.state.state_routers.load();
        for router in state_routers.iter() {
            if !router.enabled() {
                continue;
            }
            let entry = cache
                .router(router.name())
                .map(|entry| entry.as_ref())
                .unwrap_or(&not_computed);
            view = router
                .route(view, entry, url, invocation)
                .map_err(|cause| RouterError::RouteFailed {
                    router: router.name().to_owned(),
                    cause,
                })?;
        }

        let mut candidates = view.materialize();

        let routers = self.state.routers.load();
        for router in routers.iter() {
            candidates = router
                .route(candidates, url, invocation)
                .map_err(|cause| RouterError::RouteFailed {
                    router: router.name().to_owned(),
                    cause,
                })?;
        }

        Ok(candidates)
    }

    /// 现场地址池（最新一代）。
    pub fn endpoints(&self) -> SharedPool {
        self.state.pool.load_full()
    }

    /// 当前活跃的无状态路由器列表。
    pub fn routers(&self) -> Arc<Vec<Arc<dyn Router>>> {
        self.state.routers.load_full()
    }

    /// 当前活跃的可缓存路由器列表。
    pub fn state_routers(&self) -> Arc<Vec<Arc<dyn StateRouter>>> {
        self.state.state_routers.load_full()
    }

    /// 当前已发布的地址缓存快照；从未发布时为 `None`。
    pub fn address_cache(&self) -> Option<Arc<AddressCache>> {
        self.state.cache.load_full()
    }

    /// 是否已发布过至少一份快照（即 `route` 是否可用）。
    pub fn is_ready(&self) -> bool {
        self.state.cache.load().is_some()
    }

    /// 请求一轮重建；同类触发已在排队时本次合并。
    fn request_rebuild(&self, trigger: RebuildTrigger) {
        if !self.state.gates.admit(trigger) {
            return;
        }
        let Some(trigger_tx) = self.trigger_tx.as_ref() else {
            self.state.gates.release(trigger);
            return;
        };
        if trigger_tx.send(trigger).is_err() {
            self.state.gates.release(trigger);
            warn!(
                service = %self.state.service,
                ?trigger,
                "rebuild worker unavailable; trigger dropped"
            );
        }
    }
}

impl Drop for RouterChain {
    fn drop(&mut self) {
        // 关闭触发通道令工作线程退出循环，再汇合，保证析构后无游离线程。
        self.trigger_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
