//! # 组件容器组合层
//!
//! 负责把各个部分组合成一个可运行的容器：
//!
//! - **设置加载**: 默认值、配置文件和环境变量合并为 [`ComponentSettings`]
//! - **日志初始化**: 基于 `tracing-subscriber`
//! - **插件元数据**: 从目录或内存读取插件的组件声明，经 [`ImplementationCatalog`] 转换成描述符
//! - **启动**: [`ContainerBootstrapper`] 逐个插件注册组件并在后台线程批量预创建
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{
//!     ComponentSettings, ContainerBootstrapper, ImplementationCatalog, TomlPluginSource,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ComponentSettings::load(None)?;
//!     let catalog = Arc::new(ImplementationCatalog::new());
//!     let source = Arc::new(TomlPluginSource::new("plugins"));
//!
//!     let container = ContainerBootstrapper::new(settings, source, catalog)
//!         .bootstrap()
//!         .await?;
//!     println!("已创建组件: {}", container.summary.creation.created);
//!
//!     container.manager.dispose()?;
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod catalog;
pub mod logging;
pub mod plugin_source;
pub mod settings;

pub use bootstrapper::{
    BootstrapSummary, BootstrappedContainer, CancellationProgress, ContainerBootstrapper, ProgressCallback,
};
pub use catalog::ImplementationCatalog;
pub use logging::{init_logging, LoggingConfig};
pub use plugin_source::{StaticPluginSource, TomlPluginSource};
pub use settings::{ComponentSettings, SettingsLoader, DEFAULT_ENV_PREFIX};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
