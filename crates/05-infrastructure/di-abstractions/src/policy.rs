//! 容器策略接口
//!
//! 错误处理策略和注册适用性过滤器，由嵌入方在创建容器时注入。

use crate::descriptor::ComponentDescriptor;
use infrastructure_common::{ComponentKey, DependencyError, PluginId};
use serde::{Deserialize, Serialize};

/// 错误处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// 记录后继续，失败的组件对后续调用不可见
    Continue,
    /// 把错误返回给调用方
    Abort,
}

/// 组件错误处理策略
///
/// 所有组件构造失败都汇集到这一个扩展点，而不是抛给任意的调用方。
pub trait ComponentErrorPolicy: Send + Sync {
    /// 处理组件错误
    fn on_component_error(
        &self,
        error: &DependencyError,
        key: &ComponentKey,
        origin: &PluginId,
    ) -> ErrorAction;
}

/// 进程运行模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeMode {
    /// 内部模式，启用 `internal` 组件
    pub internal: bool,
    /// 无界面模式，插件元数据可以为其指定不同的实现
    pub headless: bool,
}

impl RuntimeMode {
    /// 内部模式
    pub fn internal() -> Self {
        Self {
            internal: true,
            ..Self::default()
        }
    }

    /// 无界面模式
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Self::default()
        }
    }
}

/// 适用性过滤器
///
/// 决定一个描述符是否应该注册到容器中。
pub trait SuitabilityFilter: Send + Sync {
    /// 描述符是否适用
    fn is_suitable(&self, descriptor: &ComponentDescriptor) -> bool;
}

impl<F> SuitabilityFilter for F
where
    F: Fn(&ComponentDescriptor) -> bool + Send + Sync,
{
    fn is_suitable(&self, descriptor: &ComponentDescriptor) -> bool {
        self(descriptor)
    }
}
