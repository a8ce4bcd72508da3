//! # Infrastructure Common
//!
//! 组件容器的公共基础：组件键、组件生命周期 trait、状态机枚举、进度/取消接口以及错误类型。
//!
//! ## 核心类型
//!
//! - [`ComponentKey`] - 组件的抽象标识（通常是 trait 对象类型）
//! - [`PluginId`] - 注册组件的插件标识，仅用于诊断和归属
//! - [`Component`] - 所有组件实现必须实现的生命周期 trait
//! - [`ContainerState`] / [`AdapterState`] - 容器和适配器的状态机
//! - [`ProgressIndicator`] - 批量创建时的进度与取消接口
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的组件标识，按类型而不是名称查找
//! - 错误集中定义，容器层和组合层共享同一套错误分类

pub mod component;
pub mod errors;
pub mod key;
pub mod lifecycle;
pub mod progress;

pub use component::*;
pub use errors::*;
pub use key::*;
pub use lifecycle::*;
pub use progress::*;
