//! 组件描述符
//!
//! 插件元数据处理后得到的静态注册数据，创建后不可变。

use crate::factory::Constructible;
use infrastructure_common::{ComponentKey, PluginId};
use serde::{Deserialize, Serialize};

/// 组件选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ComponentOptions {
    /// 只在内部模式下注册
    pub internal: bool,
    /// 工程级持久化语义，容器本身不解释
    pub workspace: bool,
    /// 必须替换已存在的同键组件
    pub overrides: bool,
}

impl ComponentOptions {
    /// 默认选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置内部标记
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// 设置工作区标记
    pub fn workspace(mut self) -> Self {
        self.workspace = true;
        self
    }

    /// 设置覆盖标记
    pub fn overrides(mut self) -> Self {
        self.overrides = true;
        self
    }
}

/// 组件描述符
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    key: ComponentKey,
    implementation: Option<Constructible>,
    origin: PluginId,
    options: ComponentOptions,
}

impl ComponentDescriptor {
    /// 创建新的组件描述符，来源默认为核心插件
    pub fn new(key: ComponentKey, implementation: impl Into<Constructible>) -> Self {
        Self {
            key,
            implementation: Some(implementation.into()),
            origin: PluginId::core(),
            options: ComponentOptions::default(),
        }
    }

    /// 创建注销描述符（没有实现）
    pub fn unregister(key: ComponentKey) -> Self {
        Self {
            key,
            implementation: None,
            origin: PluginId::core(),
            options: ComponentOptions::default(),
        }
    }

    /// 设置来源插件
    pub fn with_origin(mut self, origin: impl Into<PluginId>) -> Self {
        self.origin = origin.into();
        self
    }

    /// 设置选项
    pub fn with_options(mut self, options: ComponentOptions) -> Self {
        self.options = options;
        self
    }

    /// 组件键
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    /// 实现，`None` 表示注销
    pub fn implementation(&self) -> Option<&Constructible> {
        self.implementation.as_ref()
    }

    /// 来源插件
    pub fn origin(&self) -> &PluginId {
        &self.origin
    }

    /// 选项
    pub fn options(&self) -> ComponentOptions {
        self.options
    }

    /// 是否为注销描述符
    pub fn is_unregister(&self) -> bool {
        self.implementation.is_none()
    }
}
