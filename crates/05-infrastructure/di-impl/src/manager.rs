//! 组件管理器
//!
//! 容器的公开入口：批量注册、批量预创建、沿父容器链解析以及按创建顺序逆序销毁。
//! 容器总是以 `Arc<ComponentManager>` 的形式传递，子容器只持有父容器的弱引用。

use crate::adapter::{AdapterHandle, CreationContext, CreationFailure};
use crate::creation_order::{CreationOrder, CreationRecord};
use crate::diagnostics::{Diagnostics, LogAndContinue};
use crate::registry::{AssignableAdapters, ContainerRegistry};
use crate::suitability::InternalModeFilter;
use di_abstractions::{
    ComponentDescriptor, ComponentErrorPolicy, ComponentInstance, ComponentResolver, Constructible,
    ContainerConfig, ErrorAction, SuitabilityFilter,
};
use infrastructure_common::{
    ComponentKey, ContainerState, DependencyError, DependencyResult, PluginId, ProgressIndicator,
};
use parking_lot::RwLock;
use std::fmt;
use std::ops::AddAssign;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 批量注册结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// 新安装的适配器数量
    pub registered: usize,
    /// 被适用性过滤器跳过的描述符数量
    pub skipped: usize,
    /// 注销描述符数量
    pub unregistered: usize,
    /// 注册失败并被错误策略放行的数量
    pub failed: usize,
}

impl AddAssign for RegistrationSummary {
    fn add_assign(&mut self, other: Self) {
        self.registered += other.registered;
        self.skipped += other.skipped;
        self.unregistered += other.unregistered;
        self.failed += other.failed;
    }
}

/// 批量预创建结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationSummary {
    /// 预创建开始时的适配器总数
    pub total: usize,
    /// 本次新创建的组件数量
    pub created: usize,
    /// 开始前已经就绪的组件数量
    pub already_created: usize,
    /// 创建失败并被错误策略放行的数量
    pub failed: usize,
    /// 是否因取消而提前结束
    pub cancelled: bool,
}

/// 一次销毁失败
#[derive(Debug, Clone)]
pub struct DisposalFailure {
    /// 组件键
    pub key: ComponentKey,
    /// 来源插件
    pub origin: PluginId,
    /// 错误信息
    pub message: String,
}

/// 容器销毁结果
#[derive(Debug, Clone, Default)]
pub struct DisposalSummary {
    /// 执行了销毁钩子的组件数量
    pub disposed: usize,
    /// 销毁钩子失败的组件
    pub failures: Vec<DisposalFailure>,
}

/// 组件管理器
pub struct ComponentManager {
    id: Uuid,
    config: ContainerConfig,
    parent: Option<Weak<ComponentManager>>,
    registry: ContainerRegistry,
    creation_order: CreationOrder,
    state: RwLock<ContainerState>,
    diagnostics: Diagnostics,
    suitability: Arc<dyn SuitabilityFilter>,
}

impl ComponentManager {
    /// 使用默认配置创建容器，可选父容器
    pub fn new(parent: Option<&Arc<ComponentManager>>) -> Arc<Self> {
        let mut builder = Self::builder();
        if let Some(parent) = parent {
            builder = builder.parent(parent);
        }
        builder.build()
    }

    /// 创建构建器
    pub fn builder() -> ComponentManagerBuilder {
        ComponentManagerBuilder::new()
    }

    /// 容器实例标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 容器名称
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 当前生命周期状态
    pub fn state(&self) -> ContainerState {
        *self.state.read()
    }

    /// 父容器，父容器已被释放时返回 `None`
    pub fn parent(&self) -> Option<Arc<ComponentManager>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// 注册单个描述符，错误直接返回给调用方
    ///
    /// 被适用性过滤器拒绝的描述符返回 `Ok(None)`。
    pub fn register_component(
        &self,
        descriptor: &ComponentDescriptor,
    ) -> DependencyResult<Option<AdapterHandle>> {
        self.ensure_can_enter(ContainerState::ComponentsRegistered)?;
        if !self.is_suitable(descriptor) {
            return Ok(None);
        }
        let adapter = self.registry.register(descriptor)?;
        self.advance(ContainerState::ComponentsRegistered)?;
        Ok(adapter)
    }

    /// 按顺序注册一批描述符
    ///
    /// 单个描述符的注册错误交给错误策略；策略要求中止时返回该错误，已注册的描述符保留。
    pub fn register_all<I>(&self, descriptors: I) -> DependencyResult<RegistrationSummary>
    where
        I: IntoIterator<Item = ComponentDescriptor>,
    {
        self.ensure_can_enter(ContainerState::ComponentsRegistered)?;

        let mut summary = RegistrationSummary::default();
        for descriptor in descriptors {
            if !self.is_suitable(&descriptor) {
                summary.skipped += 1;
                continue;
            }
            match self.registry.register(&descriptor) {
                Ok(Some(_)) => summary.registered += 1,
                Ok(None) => summary.unregistered += 1,
                Err(error) => {
                    let key = descriptor.key();
                    match self.diagnostics.component_failed(&error, &key, descriptor.origin()) {
                        ErrorAction::Continue => summary.failed += 1,
                        ErrorAction::Abort => {
                            self.advance(ContainerState::ComponentsRegistered)?;
                            return Err(error);
                        }
                    }
                }
            }
        }

        self.advance(ContainerState::ComponentsRegistered)?;
        info!(
            "[{}] 注册完成: 新增 {}, 跳过 {}, 注销 {}, 失败 {}",
            self.name(),
            summary.registered,
            summary.skipped,
            summary.unregistered,
            summary.failed
        );
        Ok(summary)
    }

    /// 按注册顺序创建所有尚未创建的组件
    ///
    /// 每处理一个组件报告一次进度；取消信号只在组件之间检查。被取消的容器保持部分创建的状态，
    /// 调用方应当丢弃它。
    pub fn create_all_eagerly(&self, progress: &dyn ProgressIndicator) -> DependencyResult<CreationSummary> {
        self.ensure_can_enter(ContainerState::ComponentsCreated)?;

        let adapters = self.registry.snapshot();
        let mut summary = CreationSummary {
            total: adapters.len(),
            ..CreationSummary::default()
        };
        info!("[{}] 开始预创建 {} 个组件", self.name(), summary.total);

        for (index, adapter) in adapters.iter().enumerate() {
            if progress.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if adapter.is_instantiated() {
                summary.already_created += 1;
            } else {
                match self.instantiate(adapter) {
                    Ok(_) => summary.created += 1,
                    Err(CreationFailure {
                        action: ErrorAction::Continue,
                        ..
                    }) => summary.failed += 1,
                    Err(CreationFailure { error, .. }) => return Err(error),
                }
            }

            progress.report_fraction((index + 1) as f64 / summary.total as f64);
        }

        if summary.cancelled {
            warn!(
                "[{}] 预创建被取消: 已处理 {}/{}",
                self.name(),
                summary.created + summary.already_created + summary.failed,
                summary.total
            );
            return Ok(summary);
        }

        if summary.total == 0 {
            progress.report_fraction(1.0);
        }
        self.advance(ContainerState::ComponentsCreated)?;
        info!(
            "[{}] 预创建完成: 新建 {}, 已存在 {}, 失败 {}",
            self.name(),
            summary.created,
            summary.already_created,
            summary.failed
        );
        Ok(summary)
    }

    /// 获取组件实例
    ///
    /// 本地未注册时委派给父容器；不会为未注册的键创建实例。构造失败且错误策略放行时返回 `Ok(None)`。
    pub fn get(&self, key: &ComponentKey) -> DependencyResult<Option<ComponentInstance>> {
        self.ensure_active()?;
        match self.registry.lookup(key) {
            Some(adapter) => match self.instantiate(&adapter) {
                Ok(instance) => Ok(Some(instance)),
                Err(CreationFailure {
                    action: ErrorAction::Continue,
                    ..
                }) => Ok(None),
                Err(CreationFailure { error, .. }) => Err(error),
            },
            None => match self.parent_handle()? {
                Some(parent) => parent.get(key),
                None => Ok(None),
            },
        }
    }

    /// 按类型获取组件
    pub fn get_component<T: ?Sized + 'static>(&self) -> DependencyResult<Option<Arc<T>>> {
        let key = ComponentKey::of::<T>();
        self.get(&key)?
            .map(|instance| {
                instance.get::<T>().ok_or_else(|| DependencyError::TypeMismatch {
                    key,
                    implementation: instance.implementation(),
                })
            })
            .transpose()
    }

    /// 本地或父容器是否注册了指定的键，销毁后总是返回 `false`
    pub fn has(&self, key: &ComponentKey) -> bool {
        if self.state() == ContainerState::Disposed {
            return false;
        }
        self.registry.contains(key) || self.parent().is_some_and(|parent| parent.has(key))
    }

    /// 按类型判断组件是否存在
    pub fn has_component<T: ?Sized + 'static>(&self) -> bool {
        self.has(&ComponentKey::of::<T>())
    }

    /// 本容器中所有可以赋值给 `base` 的组件，不包含父容器的组件
    ///
    /// 返回的序列是注册表快照，迭代时才创建实例。
    pub fn get_all_assignable(&self, base: &ComponentKey) -> DependencyResult<AssignableComponents<'_>> {
        self.ensure_active()?;
        Ok(AssignableComponents {
            manager: self,
            adapters: self.registry.enumerate_assignable(base),
        })
    }

    /// 按类型获取本容器中的所有组件
    pub fn get_components<T: ?Sized + 'static>(&self) -> DependencyResult<Vec<Arc<T>>> {
        let instances = self.get_all_assignable(&ComponentKey::of::<T>())?.instances()?;
        Ok(instances.iter().filter_map(ComponentInstance::get::<T>).collect())
    }

    /// 销毁容器
    ///
    /// 按创建顺序逆序调用销毁钩子；单个组件销毁失败只记录日志，不影响其余组件。
    pub fn dispose(&self) -> DependencyResult<DisposalSummary> {
        {
            let mut state = self.state.write();
            if *state == ContainerState::Disposed {
                return Err(DependencyError::disposed(self.name()));
            }
            *state = ContainerState::Disposed;
        }
        info!("[{}] 开始销毁容器", self.name());

        // 等待进行中的构造结束，之后不会再有新的创建记录
        for adapter in self.registry.snapshot().iter() {
            adapter.mark_disposed();
        }

        let mut summary = DisposalSummary::default();
        for record in self.creation_order.drain().into_iter().rev() {
            debug!("[{}] 销毁组件: {}", self.name(), record.key);
            match record.instance.dispose() {
                Ok(()) => summary.disposed += 1,
                Err(cause) => {
                    self.diagnostics.teardown_failed(&record.key, &record.origin, &cause);
                    summary.failures.push(DisposalFailure {
                        key: record.key,
                        origin: record.origin,
                        message: cause.to_string(),
                    });
                }
            }
        }
        self.registry.clear();

        info!(
            "[{}] 容器已销毁: 成功 {}, 失败 {}",
            self.name(),
            summary.disposed,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// 已注册的组件键，按注册顺序
    pub fn registered_keys(&self) -> Vec<ComponentKey> {
        self.registry.keys()
    }

    /// 已创建的组件键，按创建顺序
    pub fn created_components(&self) -> Vec<ComponentKey> {
        self.creation_order.keys()
    }

    /// 创建记录快照，按创建顺序
    pub fn creation_records(&self) -> Vec<CreationRecord> {
        self.creation_order.snapshot()
    }

    /// 本地适配器
    pub fn adapter(&self, key: &ComponentKey) -> Option<AdapterHandle> {
        self.registry.lookup(key)
    }

    /// 替换尚未实例化的组件的实现，仅用于测试
    pub fn force_implementation(
        &self,
        key: &ComponentKey,
        implementation: Constructible,
    ) -> DependencyResult<()> {
        self.ensure_active()?;
        let adapter = self
            .registry
            .lookup(key)
            .ok_or(DependencyError::NoSuchComponent { key: *key })?;
        if !implementation.is_assignable_to(key) {
            return Err(DependencyError::TypeMismatch {
                key: *key,
                implementation: implementation.implementation(),
            });
        }
        adapter.force_implementation(implementation, self.name())?;
        warn!("[{}] 强制替换组件实现: {} -> {}", self.name(), key, adapter.implementation());
        Ok(())
    }

    /// 直接设置组件实例，返回之前缓存的实例，仅用于测试
    ///
    /// 设置的实例不进入创建顺序，容器销毁时不会调用它的销毁钩子。
    pub fn force_instance(
        &self,
        key: &ComponentKey,
        instance: ComponentInstance,
    ) -> DependencyResult<Option<ComponentInstance>> {
        self.ensure_active()?;
        let adapter = self
            .registry
            .lookup(key)
            .ok_or(DependencyError::NoSuchComponent { key: *key })?;
        warn!("[{}] 强制设置组件实例: {} -> {}", self.name(), key, instance.implementation());
        adapter.force_instance(instance, self.name())
    }

    fn instantiate(&self, adapter: &AdapterHandle) -> Result<ComponentInstance, CreationFailure> {
        let context = CreationContext {
            resolver: self,
            creation_order: &self.creation_order,
            diagnostics: &self.diagnostics,
        };
        adapter.get_or_create(&context)
    }

    fn is_suitable(&self, descriptor: &ComponentDescriptor) -> bool {
        let suitable = self.suitability.is_suitable(descriptor);
        if !suitable {
            debug!(
                "[{}] 跳过不适用的组件: {} (插件 {})",
                self.name(),
                descriptor.key(),
                descriptor.origin()
            );
        }
        suitable
    }

    fn parent_handle(&self) -> DependencyResult<Option<Arc<ComponentManager>>> {
        match &self.parent {
            None => Ok(None),
            Some(parent) => parent
                .upgrade()
                .map(Some)
                .ok_or_else(|| DependencyError::ParentUnavailable {
                    container: self.name().to_string(),
                }),
        }
    }

    fn ensure_active(&self) -> DependencyResult<()> {
        if self.state() == ContainerState::Disposed {
            return Err(DependencyError::disposed(self.name()));
        }
        Ok(())
    }

    fn ensure_can_enter(&self, target: ContainerState) -> DependencyResult<()> {
        let from = self.state();
        if from == ContainerState::Disposed {
            return Err(DependencyError::IllegalLifecycleTransition { from, to: target });
        }
        Ok(())
    }

    /// 推进到目标状态，已经处于更靠后的状态时保持不变
    fn advance(&self, target: ContainerState) -> DependencyResult<()> {
        let mut state = self.state.write();
        if !state.can_transition_to(target) {
            if *state != ContainerState::Disposed {
                return Ok(());
            }
            return Err(DependencyError::IllegalLifecycleTransition {
                from: *state,
                to: target,
            });
        }
        if *state != target {
            info!("[{}] 容器状态: {:?} -> {:?}", self.config.name, *state, target);
            *state = target;
        }
        Ok(())
    }
}

impl ComponentResolver for ComponentManager {
    fn resolve(&self, key: &ComponentKey) -> Result<ComponentInstance, DependencyError> {
        self.ensure_active()?;
        match self.registry.lookup(key) {
            Some(adapter) => self.instantiate(&adapter).map_err(|failure| failure.error),
            None => match self.parent_handle()? {
                Some(parent) => parent.resolve(key),
                None => Err(DependencyError::ComponentNotRegistered { key: *key }),
            },
        }
    }

    fn can_resolve(&self, key: &ComponentKey) -> bool {
        self.has(key)
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("registered", &self.registry.len())
            .field("created", &self.creation_order.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// 可赋值组件序列
///
/// 持有注册表快照，可以反复迭代；每次迭代按需创建实例。
pub struct AssignableComponents<'a> {
    manager: &'a ComponentManager,
    adapters: AssignableAdapters,
}

impl<'a> AssignableComponents<'a> {
    /// 迭代实例，跳过创建失败的组件
    pub fn iter(&self) -> impl Iterator<Item = ComponentInstance> + '_ {
        let manager = self.manager;
        self.adapters
            .iter()
            .filter_map(move |adapter| manager.instantiate(adapter).ok())
    }

    /// 收集全部实例，错误策略要求中止时返回错误
    pub fn instances(&self) -> DependencyResult<Vec<ComponentInstance>> {
        let mut instances = Vec::new();
        for adapter in self.adapters.iter() {
            match self.manager.instantiate(adapter) {
                Ok(instance) => instances.push(instance),
                Err(CreationFailure {
                    action: ErrorAction::Continue,
                    ..
                }) => {}
                Err(CreationFailure { error, .. }) => return Err(error),
            }
        }
        Ok(instances)
    }

    /// 匹配的组件键，不触发创建
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.adapters.iter().map(|adapter| adapter.key()).collect()
    }
}

impl fmt::Debug for AssignableComponents<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignableComponents")
            .field("container", &self.manager.name())
            .field("base", &self.adapters.base())
            .finish()
    }
}

/// 组件管理器构建器
pub struct ComponentManagerBuilder {
    config: ContainerConfig,
    parent: Option<Weak<ComponentManager>>,
    suitability: Option<Arc<dyn SuitabilityFilter>>,
    error_policy: Option<Arc<dyn ComponentErrorPolicy>>,
}

impl ComponentManagerBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            parent: None,
            suitability: None,
            error_policy: None,
        }
    }

    /// 设置容器配置
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置容器名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// 设置父容器
    pub fn parent(mut self, parent: &Arc<ComponentManager>) -> Self {
        self.parent = Some(Arc::downgrade(parent));
        self
    }

    /// 设置适用性过滤器，默认按运行模式过滤 `internal` 组件
    pub fn suitability(mut self, filter: Arc<dyn SuitabilityFilter>) -> Self {
        self.suitability = Some(filter);
        self
    }

    /// 设置错误处理策略，默认记录后继续
    pub fn error_policy(mut self, policy: Arc<dyn ComponentErrorPolicy>) -> Self {
        self.error_policy = Some(policy);
        self
    }

    /// 构建容器
    pub fn build(self) -> Arc<ComponentManager> {
        let suitability = self
            .suitability
            .unwrap_or_else(|| Arc::new(InternalModeFilter::for_mode(&self.config.runtime)));
        let policy = self.error_policy.unwrap_or_else(|| Arc::new(LogAndContinue));
        let diagnostics = Diagnostics::new(&self.config, policy);

        let manager = ComponentManager {
            id: Uuid::new_v4(),
            parent: self.parent,
            registry: ContainerRegistry::new(),
            creation_order: CreationOrder::new(),
            state: RwLock::new(ContainerState::Bootstrapped),
            diagnostics,
            suitability,
            config: self.config,
        };
        info!(
            "创建容器: {} ({}), 父容器: {}",
            manager.name(),
            manager.id,
            manager
                .parent()
                .map_or_else(|| "-".to_string(), |parent| parent.name().to_string())
        );
        Arc::new(manager)
    }
}

impl Default for ComponentManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
