//! # 组件容器实现
//!
//! 提供组件适配器、容器注册表、创建顺序记录和组件管理器。
//!
//! ```
//! use di_impl::ComponentManager;
//! use di_abstractions::{ComponentDescriptor, Implementation};
//! use infrastructure_common::{Component, ComponentKey, EmptyProgressIndicator};
//!
//! #[derive(Default)]
//! struct Clock;
//! impl Component for Clock {}
//!
//! let manager = ComponentManager::new(None);
//! manager
//!     .register_all(vec![ComponentDescriptor::new(
//!         ComponentKey::of::<Clock>(),
//!         Implementation::<Clock>::default_constructed(),
//!     )])
//!     .unwrap();
//! manager.create_all_eagerly(&EmptyProgressIndicator).unwrap();
//! assert!(manager.get_component::<Clock>().unwrap().is_some());
//! manager.dispose().unwrap();
//! ```

pub mod adapter;
pub mod creation_order;
pub mod diagnostics;
pub mod manager;
pub mod registry;
pub mod suitability;

pub use adapter::{AdapterHandle, ComponentAdapter};
pub use creation_order::{CreationOrder, CreationRecord};
pub use diagnostics::{CollectingErrorPolicy, FailFast, LogAndContinue, ReportedError};
pub use manager::{
    AssignableComponents, ComponentManager, ComponentManagerBuilder, CreationSummary, DisposalFailure,
    DisposalSummary, RegistrationSummary,
};
pub use registry::{AssignableAdapters, ContainerRegistry};
pub use suitability::{AcceptAll, InternalModeFilter};
