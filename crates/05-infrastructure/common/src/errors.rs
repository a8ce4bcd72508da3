//! 错误类型定义

use crate::key::{ComponentKey, PluginId};
use crate::lifecycle::ContainerState;
use thiserror::Error;

/// 组件构造和生命周期钩子使用的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入错误类型
///
/// 容器在注册、解析、创建和销毁组件时产生的所有错误。
/// [`DependencyError::ContainerAlreadyDisposed`] 和
/// [`DependencyError::IllegalLifecycleTransition`] 表示嵌入方的编程错误，不能被吞掉。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {key}")]
    ComponentNotRegistered { key: ComponentKey },

    #[error("覆盖目标不存在: {key} (插件 {origin})")]
    OverrideTargetMissing { key: ComponentKey, origin: PluginId },

    #[error("覆盖已实例化的组件: {key} (插件 {origin})")]
    OverrideOfInstantiatedComponent { key: ComponentKey, origin: PluginId },

    #[error("组件创建失败: {key} (插件 {origin}), 原因: {source}")]
    ComponentConstructionFailed {
        key: ComponentKey,
        origin: PluginId,
        #[source]
        source: BoxError,
    },

    #[error("检测到循环构造: {key} (插件 {origin})")]
    CyclicConstructionDetected { key: ComponentKey, origin: PluginId },

    #[error("容器已销毁: {container}")]
    ContainerAlreadyDisposed { container: String },

    #[error("非法的生命周期转换: {from:?} -> {to:?}")]
    IllegalLifecycleTransition {
        from: ContainerState,
        to: ContainerState,
    },

    #[error("组件类型不匹配: {key}, 实现 {implementation} 不可赋值给该键")]
    TypeMismatch {
        key: ComponentKey,
        implementation: ComponentKey,
    },

    #[error("组件不存在: {key}")]
    NoSuchComponent { key: ComponentKey },

    #[error("父容器不可用: {container}")]
    ParentUnavailable { container: String },
}

impl DependencyError {
    /// 是否为必须中止的硬错误（嵌入方的编程错误）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ContainerAlreadyDisposed { .. } | Self::IllegalLifecycleTransition { .. }
        )
    }

    /// 创建组件构造失败错误
    pub fn construction_failed(
        key: ComponentKey,
        origin: PluginId,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ComponentConstructionFailed {
            key,
            origin,
            source: source.into(),
        }
    }

    /// 创建容器已销毁错误
    pub fn disposed(container: impl Into<String>) -> Self {
        Self::ContainerAlreadyDisposed {
            container: container.into(),
        }
    }
}

/// 组件错误类型
///
/// 插件元数据转换为组件描述符时产生的错误，只影响出错的那一条描述。
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {message}")]
    ScanError { message: String },

    #[error("未知的组件接口: {name} (插件 {origin})")]
    UnknownInterface { name: String, origin: PluginId },

    #[error("未知的组件实现: {name} (插件 {origin})")]
    UnknownImplementation { name: String, origin: PluginId },

    #[error("组件元数据无效: {message}")]
    InvalidMetadata { message: String },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
        }
    }

    /// 创建元数据无效错误
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("依赖注入错误: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("组件错误: {source}")]
    Component {
        #[from]
        source: ComponentError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("组件批量创建已取消: 已创建 {created}/{total}")]
    Cancelled { created: usize, total: usize },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    struct Storage;

    #[test]
    fn test_fatal_classification() {
        assert!(DependencyError::disposed("root").is_fatal());
        assert!(DependencyError::IllegalLifecycleTransition {
            from: ContainerState::Disposed,
            to: ContainerState::ComponentsRegistered,
        }
        .is_fatal());
        assert!(!DependencyError::CyclicConstructionDetected {
            key: ComponentKey::of::<Storage>(),
            origin: PluginId::core(),
        }
        .is_fatal());
    }

    #[test]
    fn test_construction_failure_keeps_cause() {
        let error = DependencyError::construction_failed(
            ComponentKey::of::<Storage>(),
            PluginId::new("com.example.storage"),
            "磁盘不可用",
        );
        let message = error.to_string();
        assert!(message.contains("Storage"));
        assert!(message.contains("com.example.storage"));
        assert_eq!(error.source().unwrap().to_string(), "磁盘不可用");
    }
}
