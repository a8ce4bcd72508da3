//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentDescriptor`] - 组件描述符（键、实现、来源、选项）
//! - [`Implementation`] / [`Constructible`] - 组件构造能力
//! - [`ComponentInstance`] - 已构造的共享实例及其视图
//! - [`ComponentResolver`] - 构造函数用来解析依赖的窄接口
//! - [`ComponentErrorPolicy`] / [`SuitabilityFilter`] - 容器策略
//! - [`PluginDescriptorSource`] - 插件组件声明来源

pub mod container;
pub mod descriptor;
pub mod discovery;
pub mod factory;
pub mod instance;
pub mod policy;
pub mod resolver;

pub use container::*;
pub use descriptor::*;
pub use discovery::*;
pub use factory::*;
pub use instance::*;
pub use policy::*;
pub use resolver::*;
