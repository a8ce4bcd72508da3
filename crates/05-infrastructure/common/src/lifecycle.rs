//! 容器与组件适配器的生命周期状态

use serde::{Deserialize, Serialize};

/// 容器生命周期状态
///
/// 状态只能向前推进：`Bootstrapped → ComponentsRegistered → ComponentsCreated → Disposed`。
/// 仅做懒加载的容器可以跳过 `ComponentsCreated`；`Disposed` 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// 已创建，尚未注册组件
    Bootstrapped,
    /// 已注册至少一批组件
    ComponentsRegistered,
    /// 已执行批量预创建
    ComponentsCreated,
    /// 已销毁
    Disposed,
}

impl ContainerState {
    /// 是否允许从当前状态转换到目标状态
    ///
    /// 同一状态之间的转换是允许的（多批注册、重复的预创建），回到更早的状态不允许。
    pub fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Disposed => false,
            _ => target >= self,
        }
    }
}

impl Default for ContainerState {
    fn default() -> Self {
        Self::Bootstrapped
    }
}

/// 组件适配器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterState {
    /// 已注册，尚未创建实例
    Registered,
    /// 正在创建实例
    Instantiating,
    /// 实例已就绪
    Ready,
    /// 已销毁
    Disposed,
}

impl Default for AdapterState {
    fn default() -> Self {
        Self::Registered
    }
}
