//! 诊断与错误处理策略
//!
//! 集中处理三类问题：组件构造失败交给 [`ComponentErrorPolicy`]，
//! 循环构造总是记录日志，重复销毁和销毁后使用总是硬错误。

use di_abstractions::{ComponentErrorPolicy, ContainerConfig, CyclicConstructionPolicy, ErrorAction};
use infrastructure_common::{BoxError, ComponentKey, DependencyError, PluginId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, warn};

/// 默认策略：记录后继续
///
/// 一个插件组件构造失败不会阻止其余组件的创建。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAndContinue;

impl ComponentErrorPolicy for LogAndContinue {
    fn on_component_error(
        &self,
        error: &DependencyError,
        key: &ComponentKey,
        origin: &PluginId,
    ) -> ErrorAction {
        error!("组件 {} (插件 {}) 处理失败: {}", key, origin, error);
        ErrorAction::Continue
    }
}

/// 快速失败策略：记录后把错误交还给调用方
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFast;

impl ComponentErrorPolicy for FailFast {
    fn on_component_error(
        &self,
        error: &DependencyError,
        key: &ComponentKey,
        origin: &PluginId,
    ) -> ErrorAction {
        error!("组件 {} (插件 {}) 处理失败，中止: {}", key, origin, error);
        ErrorAction::Abort
    }
}

/// 收集到的组件错误
#[derive(Debug, Clone)]
pub struct ReportedError {
    /// 组件键
    pub key: ComponentKey,
    /// 来源插件
    pub origin: PluginId,
    /// 错误信息
    pub message: String,
}

/// 收集错误的策略
///
/// 记录每一次报告，并按构造时给定的动作答复。适合需要在启动结束后
/// 汇总展示失败组件的嵌入方。
#[derive(Debug)]
pub struct CollectingErrorPolicy {
    action: ErrorAction,
    errors: Mutex<Vec<ReportedError>>,
}

impl CollectingErrorPolicy {
    /// 创建记录后继续的收集策略
    pub fn new() -> Self {
        Self::with_action(ErrorAction::Continue)
    }

    /// 创建按指定动作答复的收集策略
    pub fn with_action(action: ErrorAction) -> Self {
        Self {
            action,
            errors: Mutex::new(Vec::new()),
        }
    }

    /// 已收集的错误
    pub fn errors(&self) -> Vec<ReportedError> {
        self.errors.lock().clone()
    }

    /// 某个组件是否报告过错误
    pub fn has_error_for(&self, key: &ComponentKey) -> bool {
        self.errors.lock().iter().any(|reported| reported.key == *key)
    }
}

impl Default for CollectingErrorPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentErrorPolicy for CollectingErrorPolicy {
    fn on_component_error(
        &self,
        error: &DependencyError,
        key: &ComponentKey,
        origin: &PluginId,
    ) -> ErrorAction {
        warn!("组件 {} (插件 {}) 处理失败: {}", key, origin, error);
        self.errors.lock().push(ReportedError {
            key: *key,
            origin: origin.clone(),
            message: error.to_string(),
        });
        self.action
    }
}

/// 容器内部的诊断入口
pub(crate) struct Diagnostics {
    container: String,
    policy: Arc<dyn ComponentErrorPolicy>,
    cyclic_construction: CyclicConstructionPolicy,
    max_resolution_depth: usize,
}

impl Diagnostics {
    pub(crate) fn new(config: &ContainerConfig, policy: Arc<dyn ComponentErrorPolicy>) -> Self {
        Self {
            container: config.name.clone(),
            policy,
            cyclic_construction: config.cyclic_construction,
            max_resolution_depth: config.max_resolution_depth.max(1),
        }
    }

    pub(crate) fn container(&self) -> &str {
        &self.container
    }

    pub(crate) fn cyclic_construction(&self) -> CyclicConstructionPolicy {
        self.cyclic_construction
    }

    pub(crate) fn max_resolution_depth(&self) -> usize {
        self.max_resolution_depth
    }

    /// 组件处理失败，硬错误不经过策略
    pub(crate) fn component_failed(
        &self,
        error: &DependencyError,
        key: &ComponentKey,
        origin: &PluginId,
    ) -> ErrorAction {
        if error.is_fatal() {
            error!("[{}] 组件 {} 遇到不可恢复的错误: {}", self.container, key, error);
            return ErrorAction::Abort;
        }
        self.policy.on_component_error(error, key, origin)
    }

    pub(crate) fn cycle_detected(&self, key: &ComponentKey, origin: &PluginId, depth: usize) {
        error!(
            "[{}] 检测到循环构造: {} (插件 {}), 嵌套深度 {}, 策略 {:?}",
            self.container, key, origin, depth, self.cyclic_construction
        );
    }

    pub(crate) fn teardown_failed(&self, key: &ComponentKey, origin: &PluginId, cause: &BoxError) {
        warn!(
            "[{}] 组件 {} (插件 {}) 销毁失败，继续销毁其余组件: {}",
            self.container, key, origin, cause
        );
    }
}
