//! 插件组件发现接口
//!
//! 插件加载方负责读取插件元数据，这里只定义边界：元数据的形状和描述源 trait。

use crate::descriptor::ComponentOptions;
use async_trait::async_trait;
use infrastructure_common::{ComponentError, PluginId};
use serde::{Deserialize, Serialize};

/// 插件元数据中的一条组件声明
///
/// 接口和实现都用名称表示，由实现目录解析成组件键和构造能力。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentConfig {
    /// 接口名称；省略时使用实现名称（自注册组件）
    #[serde(default)]
    pub interface: Option<String>,
    /// 实现名称；省略表示注销该接口
    #[serde(default)]
    pub implementation: Option<String>,
    /// 无界面模式下使用的实现名称
    #[serde(default)]
    pub headless_implementation: Option<String>,
    /// 组件选项
    #[serde(default)]
    pub options: ComponentOptions,
}

impl ComponentConfig {
    /// 创建组件声明
    pub fn new(interface: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            interface: Some(interface.into()),
            implementation: Some(implementation.into()),
            headless_implementation: None,
            options: ComponentOptions::default(),
        }
    }

    /// 设置无界面实现
    pub fn with_headless_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.headless_implementation = Some(implementation.into());
        self
    }

    /// 设置选项
    pub fn with_options(mut self, options: ComponentOptions) -> Self {
        self.options = options;
        self
    }

    /// 组件的接口名称
    pub fn interface_name(&self) -> Option<&str> {
        self.interface
            .as_deref()
            .or(self.implementation.as_deref())
    }

    /// 按运行模式选择实现名称
    pub fn implementation_name(&self, headless: bool) -> Option<&str> {
        if headless {
            if let Some(name) = self.headless_implementation.as_deref() {
                return Some(name);
            }
        }
        self.implementation.as_deref()
    }
}

/// 一个插件声明的全部组件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginComponents {
    /// 插件标识
    pub id: PluginId,
    /// 组件声明，顺序即注册顺序
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl PluginComponents {
    /// 创建插件组件声明
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            components: Vec::new(),
        }
    }

    /// 添加组件声明
    pub fn with_component(mut self, component: ComponentConfig) -> Self {
        self.components.push(component);
        self
    }
}

/// 插件描述源 trait
///
/// 按插件加载顺序返回组件声明批次。
#[async_trait]
pub trait PluginDescriptorSource: Send + Sync {
    /// 读取所有插件的组件声明
    async fn plugins(&self) -> Result<Vec<PluginComponents>, ComponentError>;

    /// 描述源名称
    fn name(&self) -> &str;
}
