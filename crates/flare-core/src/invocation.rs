//! # invocation 模块说明
//!
//! 承载路由判定的两类输入：消费方订阅了什么（[`ServiceUrl`]），以及本次调用
//! 是什么（[`Invocation`]）。两者都是只读描述，规则插件据此做匹配，
//! 不应在路由过程中修改。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 消费方侧的订阅标识：服务名加上消费方配置参数。
///
/// # 教案式说明
/// - **意图 (Why)**：规则经常需要消费方视角的配置（应用名、灰度开关等），
///   与单次调用解耦后可在多次调用间复用同一份描述；
/// - **契约 (What)**：构造后只读；`params` 迭代顺序确定。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrl {
    service: String,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

impl ServiceUrl {
    /// 以服务名构造订阅标识。
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            params: BTreeMap::new(),
        }
    }

    /// 追加一个消费方参数。
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 读取服务名。
    pub fn service(&self) -> &str {
        &self.service
    }

    /// 读取指定参数；缺失返回 `None`。
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// 单次调用的只读描述。
///
/// # 教案式说明
/// - **意图 (Why)**：路由规则按方法名与调用附件（如 `tag`）收窄候选集，
///   附件由调用方或治理层在发起调用前写入；
/// - **契约 (What)**：路由链及规则插件一律只读；附件键值均为字符串，
///   跨进程传递时与主流注册中心的约定保持一致。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    method: String,
    #[serde(default)]
    attachments: BTreeMap<String, String>,
}

impl Invocation {
    /// 以方法名构造调用描述。
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            attachments: BTreeMap::new(),
        }
    }

    /// 追加一个调用附件。
    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attachments.insert(key.into(), value.into());
        self
    }

    /// 读取方法名。
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 读取指定附件；缺失返回 `None`。
    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }
}
