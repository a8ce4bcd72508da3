//! 容器启动器
//!
//! 负责协调容器的启动顺序：读取插件元数据、逐个插件注册组件、在阻塞线程池中批量预创建。

use crate::catalog::ImplementationCatalog;
use crate::settings::ComponentSettings;
use di_abstractions::{ComponentErrorPolicy, PluginDescriptorSource, SuitabilityFilter};
use di_impl::{ComponentManager, CreationSummary, RegistrationSummary};
use infrastructure_common::{InfrastructureError, InfrastructureResult, ProgressIndicator};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 进度回调
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// 基于取消令牌的进度指示器
pub struct CancellationProgress {
    token: CancellationToken,
    fraction_bits: AtomicU64,
    callback: Option<ProgressCallback>,
}

impl CancellationProgress {
    /// 创建进度指示器
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            fraction_bits: AtomicU64::new(0.0_f64.to_bits()),
            callback: None,
        }
    }

    /// 设置进度回调
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// 最近一次报告的比例
    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.fraction_bits.load(Ordering::SeqCst))
    }
}

impl ProgressIndicator for CancellationProgress {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn report_fraction(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.fraction_bits.store(fraction.to_bits(), Ordering::SeqCst);
        if let Some(callback) = &self.callback {
            callback(fraction);
        }
    }
}

impl fmt::Debug for CancellationProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationProgress")
            .field("cancelled", &self.token.is_cancelled())
            .field("fraction", &self.fraction())
            .finish()
    }
}

/// 启动结果统计
#[derive(Debug, Clone, Default)]
pub struct BootstrapSummary {
    /// 读取到的插件数量
    pub plugins: usize,
    /// 被跳过的元数据条目数量
    pub metadata_errors: usize,
    /// 注册统计
    pub registration: RegistrationSummary,
    /// 预创建统计
    pub creation: CreationSummary,
}

/// 启动完成的容器
#[derive(Debug)]
pub struct BootstrappedContainer {
    /// 容器
    pub manager: Arc<ComponentManager>,
    /// 启动统计
    pub summary: BootstrapSummary,
}

/// 容器启动器
pub struct ContainerBootstrapper {
    settings: ComponentSettings,
    source: Arc<dyn PluginDescriptorSource>,
    catalog: Arc<ImplementationCatalog>,
    parent: Option<Arc<ComponentManager>>,
    error_policy: Option<Arc<dyn ComponentErrorPolicy>>,
    suitability: Option<Arc<dyn SuitabilityFilter>>,
    token: CancellationToken,
    progress_callback: Option<ProgressCallback>,
    eager: bool,
}

impl ContainerBootstrapper {
    /// 创建启动器
    pub fn new(
        settings: ComponentSettings,
        source: Arc<dyn PluginDescriptorSource>,
        catalog: Arc<ImplementationCatalog>,
    ) -> Self {
        Self {
            settings,
            source,
            catalog,
            parent: None,
            error_policy: None,
            suitability: None,
            token: CancellationToken::new(),
            progress_callback: None,
            eager: true,
        }
    }

    /// 作为指定容器的子容器启动
    pub fn with_parent(mut self, parent: &Arc<ComponentManager>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// 设置错误处理策略
    pub fn with_error_policy(mut self, policy: Arc<dyn ComponentErrorPolicy>) -> Self {
        self.error_policy = Some(policy);
        self
    }

    /// 设置适用性过滤器
    pub fn with_suitability(mut self, filter: Arc<dyn SuitabilityFilter>) -> Self {
        self.suitability = Some(filter);
        self
    }

    /// 使用外部取消令牌
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// 设置预创建进度回调
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// 是否执行批量预创建，默认执行
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// 取消令牌，取消后启动在下一个组件边界停止
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 启动容器
    ///
    /// 被取消时销毁部分创建的容器并返回 [`InfrastructureError::Cancelled`]。
    pub async fn bootstrap(self) -> InfrastructureResult<BootstrappedContainer> {
        let manager = self.build_manager();
        info!(
            "开始启动容器 {}，描述源: {}",
            manager.name(),
            self.source.name()
        );

        let plugins = match self.source.plugins().await {
            Ok(plugins) => plugins,
            Err(e) => {
                error!("读取插件元数据失败: {}", e);
                Self::discard(&manager);
                return Err(e.into());
            }
        };

        let mut summary = BootstrapSummary {
            plugins: plugins.len(),
            ..BootstrapSummary::default()
        };
        let runtime = manager.config().runtime;
        for plugin in &plugins {
            if self.token.is_cancelled() {
                Self::discard(&manager);
                return Err(InfrastructureError::Cancelled {
                    created: 0,
                    total: summary.registration.registered,
                });
            }

            let (descriptors, errors) = self.catalog.resolve(plugin, &runtime);
            for e in &errors {
                warn!("插件 {} 的组件声明被跳过: {}", plugin.id, e);
            }
            summary.metadata_errors += errors.len();

            match manager.register_all(descriptors) {
                Ok(registration) => summary.registration += registration,
                Err(e) => {
                    error!("插件 {} 注册失败: {}", plugin.id, e);
                    Self::discard(&manager);
                    return Err(e.into());
                }
            }
        }

        if self.eager {
            let mut progress = CancellationProgress::new(self.token.clone());
            if let Some(callback) = self.progress_callback.clone() {
                progress = progress.with_callback(callback);
            }

            let eager_manager = Arc::clone(&manager);
            let creation = tokio::task::spawn_blocking(move || eager_manager.create_all_eagerly(&progress))
                .await
                .map_err(|e| InfrastructureError::BootstrapFailed {
                    message: format!("预创建任务异常结束: {}", e),
                });

            let creation = match creation {
                Ok(Ok(creation)) => creation,
                Ok(Err(e)) => {
                    Self::discard(&manager);
                    return Err(e.into());
                }
                Err(e) => {
                    Self::discard(&manager);
                    return Err(e);
                }
            };

            if creation.cancelled {
                Self::discard(&manager);
                return Err(InfrastructureError::Cancelled {
                    created: creation.created + creation.already_created,
                    total: creation.total,
                });
            }
            summary.creation = creation;
        }

        info!(
            "容器 {} 启动完成: 插件 {}, 注册 {}, 创建 {}, 失败 {}",
            manager.name(),
            summary.plugins,
            summary.registration.registered,
            summary.creation.created,
            summary.creation.failed + summary.registration.failed
        );
        Ok(BootstrappedContainer { manager, summary })
    }

    fn build_manager(&self) -> Arc<ComponentManager> {
        let mut builder = ComponentManager::builder().config(self.settings.container.clone());
        if let Some(parent) = &self.parent {
            builder = builder.parent(parent);
        }
        if let Some(policy) = &self.error_policy {
            builder = builder.error_policy(Arc::clone(policy));
        }
        if let Some(filter) = &self.suitability {
            builder = builder.suitability(Arc::clone(filter));
        }
        builder.build()
    }

    fn discard(manager: &ComponentManager) {
        if let Err(e) = manager.dispose() {
            warn!("销毁未完成启动的容器失败: {}", e);
        }
    }
}

impl fmt::Debug for ContainerBootstrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBootstrapper")
            .field("container", &self.settings.container.name)
            .field("source", &self.source.name())
            .field("has_parent", &self.parent.is_some())
            .field("eager", &self.eager)
            .finish()
    }
}
