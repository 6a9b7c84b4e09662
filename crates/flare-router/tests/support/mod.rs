//! 集成测试共用的路由器桩与等待工具。
//!
//! 桩实现刻意保持“最小但真实”：可缓存路由器都按契约预生成命名子池，
//! 热路径只做掩码收窄；计数器用于断言重建次数与合并效果。

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use flare_core::FlareError;
use flare_core::endpoint::{Endpoint, SharedPool};
use flare_core::invocation::{Invocation, ServiceUrl};
use flare_core::router::{Router, RouterCache, StateRouter};
use flare_core::view::{BitMask, EndpointView};

pub fn endpoint(host: &str) -> Arc<Endpoint> {
    Arc::new(Endpoint::new(host, 20880))
}

pub fn tagged(host: &str, tag: &str) -> Arc<Endpoint> {
    Arc::new(Endpoint::new(host, 20880).with_param("tag", tag))
}

/// 轮询等待条件成立；超时返回 `false`。
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// 按主机名白名单收窄的可缓存路由器：预计算出名为 `keep` 的子池。
pub struct KeepStateRouter {
    name: &'static str,
    priority: i32,
    enabled: bool,
    keep: Vec<String>,
    pub pool_calls: Arc<AtomicUsize>,
}

impl KeepStateRouter {
    pub fn new(name: &'static str, priority: i32, keep: &[&str]) -> Self {
        Self {
            name,
            priority,
            enabled: true,
            keep: keep.iter().map(|host| (*host).to_owned()).collect(),
            pool_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl StateRouter for KeepStateRouter {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        self.pool_calls.fetch_add(1, Ordering::SeqCst);
        let mut mask = BitMask::empty(pool.len());
        for (index, endpoint) in pool.iter().enumerate() {
            if self.keep.iter().any(|host| host == endpoint.host()) {
                mask.set(index);
            }
        }
        let mut entry = RouterCache::new();
        entry.insert_pool("keep", mask);
        Ok(entry)
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        match cache.pool("keep") {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

/// 按 `tag` 标签分组的可缓存路由器：每个标签值一个子池。
pub struct TagStateRouter {
    priority: i32,
}

impl TagStateRouter {
    pub fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl StateRouter for TagStateRouter {
    fn name(&self) -> &str {
        "tag"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        let mut groups: BTreeMap<String, BitMask> = BTreeMap::new();
        for (index, endpoint) in pool.iter().enumerate() {
            if let Some(tag) = endpoint.param("tag") {
                groups
                    .entry(tag.to_owned())
                    .or_insert_with(|| BitMask::empty(pool.len()))
                    .set(index);
            }
        }
        let mut entry = RouterCache::new();
        for (tag, mask) in groups {
            entry.insert_pool(tag, mask);
        }
        Ok(entry)
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        let Some(tag) = invocation.attachment("tag") else {
            return Ok(view.narrow(&BitMask::empty(len)));
        };
        match cache.pool(tag) {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

/// 预计算耗时可控的路由器：用于制造“重建尚未完成又来触发”的窗口。
pub struct SlowStateRouter {
    delay: Duration,
    pub pool_calls: Arc<AtomicUsize>,
}

impl SlowStateRouter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pool_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StateRouter for SlowStateRouter {
    fn name(&self) -> &str {
        "slow"
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        self.pool_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        let mut entry = RouterCache::new();
        entry.insert_pool("all", BitMask::filled(pool.len()));
        Ok(entry)
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        match cache.pool("all") {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

/// 可随时拨成失败的路由器：验证全有或全无的快照发布。
pub struct FailSwitchStateRouter {
    pub fail: Arc<AtomicBool>,
    pub pool_calls: Arc<AtomicUsize>,
}

impl FailSwitchStateRouter {
    pub fn new() -> Self {
        Self {
            fail: Arc::new(AtomicBool::new(false)),
            pool_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StateRouter for FailSwitchStateRouter {
    fn name(&self) -> &str {
        "flaky"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        self.pool_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(FlareError::new("test.pool", "switched to failure"));
        }
        let mut entry = RouterCache::new();
        entry.insert_pool("all", BitMask::filled(pool.len()));
        Ok(entry)
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        match cache.pool("all") {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

/// 把快照世代号写进条目附件的路由器：`lead` 侧自增计数，跟随侧读取计数。
/// 同一轮重建里两者必然写入同一个世代号，跨代混读会被读者当场发现。
pub struct GenerationStateRouter {
    name: &'static str,
    priority: i32,
    lead: bool,
    counter: Arc<AtomicU64>,
}

impl GenerationStateRouter {
    pub fn pair(counter: &Arc<AtomicU64>) -> (Self, Self) {
        (
            Self {
                name: "gen-lead",
                priority: 0,
                lead: true,
                counter: Arc::clone(counter),
            },
            Self {
                name: "gen-follow",
                priority: 1,
                lead: false,
                counter: Arc::clone(counter),
            },
        )
    }
}

impl StateRouter for GenerationStateRouter {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        let generation = if self.lead {
            self.counter.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.counter.load(Ordering::SeqCst)
        };
        let mut entry = RouterCache::new();
        entry.insert_pool("all", BitMask::filled(pool.len()));
        Ok(entry.with_attachment(Arc::new(generation)))
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        match cache.pool("all") {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

/// 输出在两次调用之间交替的无状态路由器：证明热路径没有任何缓存。
pub struct ToggleRouter {
    flip: AtomicBool,
}

impl ToggleRouter {
    pub fn new() -> Self {
        Self {
            flip: AtomicBool::new(false),
        }
    }
}

impl Router for ToggleRouter {
    fn name(&self) -> &str {
        "toggle"
    }

    fn route(
        &self,
        mut candidates: Vec<Arc<Endpoint>>,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<Vec<Arc<Endpoint>>> {
        let odd_call = self.flip.fetch_xor(true, Ordering::SeqCst);
        if odd_call && !candidates.is_empty() {
            candidates.remove(0);
        }
        Ok(candidates)
    }
}

/// 无条件剔除指定主机的无状态路由器。
pub struct ExcludeRouter {
    host: String,
}

impl ExcludeRouter {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_owned(),
        }
    }
}

impl Router for ExcludeRouter {
    fn name(&self) -> &str {
        "exclude"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn route(
        &self,
        mut candidates: Vec<Arc<Endpoint>>,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<Vec<Arc<Endpoint>>> {
        candidates.retain(|endpoint| endpoint.host() != self.host);
        Ok(candidates)
    }
}

/// 热路径上固定报错的无状态路由器。
pub struct ErrorRouter;

impl Router for ErrorRouter {
    fn name(&self) -> &str {
        "always-error"
    }

    fn route(
        &self,
        _candidates: Vec<Arc<Endpoint>>,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<Vec<Arc<Endpoint>>> {
        Err(FlareError::new("test.route", "rejected on purpose"))
    }
}

/// 记录 `notify` 到达顺序的共享日志。
#[derive(Default)]
pub struct EventLog {
    entries: std::sync::Mutex<Vec<String>>,
}

impl EventLog {
    pub fn push(&self, entry: String) {
        self.entries.lock().expect("日志锁不应中毒").push(entry);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().expect("日志锁不应中毒").clone()
    }
}

pub struct RecordingStateRouter {
    name: &'static str,
    log: Arc<EventLog>,
}

impl RecordingStateRouter {
    pub fn new(name: &'static str, log: &Arc<EventLog>) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }
}

impl StateRouter for RecordingStateRouter {
    fn name(&self) -> &str {
        self.name
    }

    fn notify(&self, pool: &SharedPool) {
        self.log.push(format!("state:{}:{}", self.name, pool.len()));
    }

    fn pool(&self, pool: &SharedPool) -> flare_core::Result<RouterCache> {
        let mut entry = RouterCache::new();
        entry.insert_pool("all", BitMask::filled(pool.len()));
        Ok(entry)
    }

    fn route(
        &self,
        view: EndpointView,
        cache: &RouterCache,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<EndpointView> {
        let len = view.mask().len();
        match cache.pool("all") {
            Some(mask) => Ok(view.narrow(mask)),
            None => Ok(view.narrow(&BitMask::empty(len))),
        }
    }
}

pub struct RecordingRouter {
    name: &'static str,
    log: Arc<EventLog>,
}

impl RecordingRouter {
    pub fn new(name: &'static str, log: &Arc<EventLog>) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }
}

impl Router for RecordingRouter {
    fn name(&self) -> &str {
        self.name
    }

    fn notify(&self, pool: &SharedPool) {
        self.log.push(format!("classic:{}:{}", self.name, pool.len()));
    }

    fn route(
        &self,
        candidates: Vec<Arc<Endpoint>>,
        _url: &ServiceUrl,
        _invocation: &Invocation,
    ) -> flare_core::Result<Vec<Arc<Endpoint>>> {
        Ok(candidates)
    }
}
