//! # endpoint 模块说明
//!
//! ## 角色定位（Why）
//! - 建模“可路由的远端目的地”与“某一时刻的全量地址集合”。注册中心每次推送
//!   都会整批替换地址池，路由引擎据此重建缓存；
//! - 端点一经入池即不可变，读路径可以放心跨线程共享引用而无需任何同步。
//!
//! ## 使用契约（What）
//! - 端点以 `Arc<Endpoint>` 形式在池、视图与候选列表之间流转，过滤阶段只克隆
//!   指针，从不复制端点本体；
//! - 地址池的“代际”以 `Arc` 指针身份区分：两次推送即便内容相同也是两代，
//!   缓存快照据此判断自身是否过期。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 共享地址池别名：注册中心一代推送对应一个 `Arc`。
pub type SharedPool = Arc<EndpointPool>;

/// 不可变的远端端点：网络地址加上注册中心附带的元数据标签。
///
/// # 教案式说明
/// - **意图 (Why)**：路由规则依赖标签（如分组、机房、灰度标记）做匹配，标签随
///   端点一起从注册中心下发，进程内不再修改；
/// - **契约 (What)**：`params` 使用 `BTreeMap` 保证序列化与迭代顺序稳定；
///   相等性覆盖全部字段，便于测试直接比较；
/// - **权衡 (Trade-offs)**：保留 `serde` 派生以直接承接发现层的推送载荷，
///   代价是字段命名成为对外兼容面。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

impl Endpoint {
    /// 以主机与端口构造端点，初始不带任何标签。
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            params: BTreeMap::new(),
        }
    }

    /// 追加一个元数据标签，按构造者风格链式使用。
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 读取主机名。
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 读取端口。
    pub fn port(&self) -> u16 {
        self.port
    }

    /// 读取指定标签；缺失返回 `None`。
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// 以 `host:port` 形式拼出可读地址，用于日志与诊断。
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 某一代的全量地址池。
///
/// # 教案式说明
/// - **意图 (Why)**：发现层整批替换优于逐条增删——路由缓存面向“一代池”预计算，
///   增量修补反而会破坏快照一致性；
/// - **契约 (What)**：池内顺序即注册中心推送顺序，路由全流程保序；
///   池本体只读，引擎通过 [`SharedPool`] 原子替换整代；
/// - **权衡 (Trade-offs)**：每代整批分配一个 `Vec`，换来读路径零锁与代际判断
///   只需一次指针比较。
#[derive(Clone, Debug, Default)]
pub struct EndpointPool {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointPool {
    /// 以端点列表构造一代地址池。
    pub fn new(endpoints: Vec<Arc<Endpoint>>) -> Self {
        Self { endpoints }
    }

    /// 池内端点数量。
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// 池是否为空。
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// 按下标读取端点；越界返回 `None`。
    pub fn get(&self, index: usize) -> Option<&Arc<Endpoint>> {
        self.endpoints.get(index)
    }

    /// 按推送顺序遍历端点。
    pub fn iter(&self) -> core::slice::Iter<'_, Arc<Endpoint>> {
        self.endpoints.iter()
    }

    /// 以切片形式暴露全部端点。
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// 判断两个共享池是否为同一代（指针身份，而非内容相等）。
    pub fn same_generation(left: &SharedPool, right: &SharedPool) -> bool {
        Arc::ptr_eq(left, right)
    }
}
