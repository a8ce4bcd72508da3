//! 组件适配器
//!
//! 每个描述符对应一个适配器，负责线程安全、只执行一次的懒加载构造。
//!
//! 构造使用“检查-加锁-再检查”：就绪后读取实例不需要加锁；慢路径只锁住本适配器，
//! 一个慢构造函数不会阻塞其他组件的解析。锁是可重入的，同一线程在构造过程中
//! 再次请求本适配器会被识别为循环构造。

use crate::creation_order::CreationOrder;
use crate::diagnostics::Diagnostics;
use arc_swap::ArcSwapOption;
use di_abstractions::{
    ComponentDescriptor, ComponentInstance, ComponentOptions, ComponentResolver, Constructible,
    CyclicConstructionPolicy, ErrorAction,
};
use infrastructure_common::{AdapterState, ComponentKey, DependencyError, PluginId};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(1);

/// 适配器句柄
pub type AdapterHandle = Arc<ComponentAdapter>;

/// 构造所需的容器上下文
pub(crate) struct CreationContext<'a> {
    pub(crate) resolver: &'a dyn ComponentResolver,
    pub(crate) creation_order: &'a CreationOrder,
    pub(crate) diagnostics: &'a Diagnostics,
}

/// 构造失败
///
/// `action` 是错误策略的答复，决定公开 API 是吞掉错误还是返回错误。
#[derive(Debug)]
pub(crate) struct CreationFailure {
    pub(crate) error: DependencyError,
    pub(crate) action: ErrorAction,
}

impl CreationFailure {
    fn fatal(error: DependencyError) -> Self {
        Self {
            error,
            action: ErrorAction::Abort,
        }
    }
}

#[derive(Debug)]
struct AdapterSlot {
    state: AdapterState,
    depth: usize,
}

/// 组件适配器
pub struct ComponentAdapter {
    id: u64,
    key: ComponentKey,
    origin: PluginId,
    options: ComponentOptions,
    implementation: RwLock<Constructible>,
    instance: ArcSwapOption<ComponentInstance>,
    slot: ReentrantMutex<RefCell<AdapterSlot>>,
}

impl ComponentAdapter {
    /// 从描述符创建适配器，注销描述符没有实现，返回 `None`
    pub fn from_descriptor(descriptor: &ComponentDescriptor) -> Option<Self> {
        let implementation = descriptor.implementation()?.clone();
        Some(Self {
            id: NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed),
            key: descriptor.key(),
            origin: descriptor.origin().clone(),
            options: descriptor.options(),
            implementation: RwLock::new(implementation),
            instance: ArcSwapOption::empty(),
            slot: ReentrantMutex::new(RefCell::new(AdapterSlot {
                state: AdapterState::Registered,
                depth: 0,
            })),
        })
    }

    /// 适配器唯一标识
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 组件键
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    /// 来源插件
    pub fn origin(&self) -> &PluginId {
        &self.origin
    }

    /// 组件选项
    pub fn options(&self) -> ComponentOptions {
        self.options
    }

    /// 当前实现类型
    pub fn implementation(&self) -> ComponentKey {
        self.implementation.read().implementation()
    }

    /// 实现是否可以赋值给指定的键
    pub fn is_assignable_to(&self, key: &ComponentKey) -> bool {
        self.implementation.read().is_assignable_to(key)
    }

    /// 是否已有实例
    pub fn is_instantiated(&self) -> bool {
        self.instance.load().is_some()
    }

    /// 已缓存的实例，不触发构造
    pub fn cached_instance(&self) -> Option<ComponentInstance> {
        self.instance.load_full().map(|instance| (*instance).clone())
    }

    /// 当前状态
    ///
    /// 其他线程正在构造时会等待构造结束。
    pub fn state(&self) -> AdapterState {
        let guard = self.slot.lock();
        let state = guard.borrow().state;
        state
    }

    /// 获取或创建实例
    pub(crate) fn get_or_create(
        &self,
        context: &CreationContext<'_>,
    ) -> Result<ComponentInstance, CreationFailure> {
        if let Some(instance) = self.cached_instance() {
            return Ok(instance);
        }

        let guard = self.slot.lock();
        if let Some(instance) = self.cached_instance() {
            return Ok(instance);
        }

        {
            let mut slot = guard.borrow_mut();
            match slot.state {
                AdapterState::Disposed => {
                    return Err(CreationFailure::fatal(DependencyError::disposed(
                        context.diagnostics.container(),
                    )));
                }
                AdapterState::Instantiating => {
                    context.diagnostics.cycle_detected(&self.key, &self.origin, slot.depth);
                    let cycle = DependencyError::CyclicConstructionDetected {
                        key: self.key,
                        origin: self.origin.clone(),
                    };
                    match context.diagnostics.cyclic_construction() {
                        CyclicConstructionPolicy::Fail => {
                            return Err(CreationFailure {
                                error: cycle,
                                action: ErrorAction::Continue,
                            });
                        }
                        CyclicConstructionPolicy::Proceed
                            if slot.depth >= context.diagnostics.max_resolution_depth() =>
                        {
                            return Err(CreationFailure {
                                error: DependencyError::construction_failed(
                                    self.key,
                                    self.origin.clone(),
                                    cycle,
                                ),
                                action: ErrorAction::Continue,
                            });
                        }
                        CyclicConstructionPolicy::Proceed => {}
                    }
                }
                AdapterState::Registered | AdapterState::Ready => {}
            }
            slot.state = AdapterState::Instantiating;
            slot.depth += 1;
        }

        // 构造期间不持有 RefCell 借用，依赖解析可能重入本适配器
        let implementation = self.implementation.read().clone();
        debug!(
            "[{}] 创建组件: {} -> {}",
            context.diagnostics.container(),
            self.key,
            implementation.implementation()
        );
        // 嵌套构造已经就绪时不再初始化外层实例
        let mut initialized = false;
        let result = implementation.construct(context.resolver).and_then(|instance| {
            if self.is_instantiated() {
                return Ok(instance);
            }
            initialized = true;
            instance.init().map(|()| instance)
        });

        let mut slot = guard.borrow_mut();
        slot.depth -= 1;

        match result {
            Ok(instance) => {
                if let Some(existing) = self.cached_instance() {
                    // 嵌套构造已经先完成，保留先就绪的实例
                    drop(slot);
                    warn!(
                        "[{}] 组件 {} 在嵌套构造中已就绪，丢弃外层构造的实例",
                        context.diagnostics.container(),
                        self.key
                    );
                    if initialized {
                        if let Err(cause) = instance.dispose() {
                            context.diagnostics.teardown_failed(&self.key, &self.origin, &cause);
                        }
                    }
                    return Ok(existing);
                }

                context
                    .creation_order
                    .record(self.id, self.key, &self.origin, &instance);
                self.instance.store(Some(Arc::new(instance.clone())));
                slot.state = AdapterState::Ready;
                debug!("[{}] 组件就绪: {}", context.diagnostics.container(), self.key);
                Ok(instance)
            }
            Err(cause) => {
                if let Some(existing) = self.cached_instance() {
                    warn!(
                        "[{}] 组件 {} 外层构造失败，但嵌套构造已就绪: {}",
                        context.diagnostics.container(),
                        self.key,
                        cause
                    );
                    return Ok(existing);
                }
                if slot.depth == 0 && slot.state == AdapterState::Instantiating {
                    slot.state = AdapterState::Registered;
                }
                drop(slot);

                let error = DependencyError::construction_failed(self.key, self.origin.clone(), cause);
                let action = context
                    .diagnostics
                    .component_failed(&error, &self.key, &self.origin);
                Err(CreationFailure { error, action })
            }
        }
    }

    /// 替换实现，只允许在实例化之前
    pub(crate) fn force_implementation(
        &self,
        implementation: Constructible,
        container: &str,
    ) -> Result<(), DependencyError> {
        let guard = self.slot.lock();
        let state = guard.borrow().state;
        match state {
            AdapterState::Registered => {
                *self.implementation.write() = implementation;
                Ok(())
            }
            AdapterState::Disposed => Err(DependencyError::disposed(container)),
            AdapterState::Instantiating | AdapterState::Ready => {
                Err(DependencyError::OverrideOfInstantiatedComponent {
                    key: self.key,
                    origin: self.origin.clone(),
                })
            }
        }
    }

    /// 直接设置实例并标记为就绪，返回之前缓存的实例
    ///
    /// 不写入创建顺序。
    pub(crate) fn force_instance(
        &self,
        instance: ComponentInstance,
        container: &str,
    ) -> Result<Option<ComponentInstance>, DependencyError> {
        let guard = self.slot.lock();
        let mut slot = guard.borrow_mut();
        if slot.state == AdapterState::Disposed {
            return Err(DependencyError::disposed(container));
        }
        if !instance.provides(&self.key) {
            return Err(DependencyError::TypeMismatch {
                key: self.key,
                implementation: instance.implementation(),
            });
        }

        let previous = self.instance.swap(Some(Arc::new(instance)));
        slot.state = AdapterState::Ready;
        Ok(previous.map(|previous| (*previous).clone()))
    }

    /// 标记为已销毁，等待进行中的构造结束
    pub(crate) fn mark_disposed(&self) {
        let guard = self.slot.lock();
        guard.borrow_mut().state = AdapterState::Disposed;
        self.instance.store(None);
    }
}

impl fmt::Debug for ComponentAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentAdapter")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("origin", &self.origin)
            .field("implementation", &self.implementation())
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}
