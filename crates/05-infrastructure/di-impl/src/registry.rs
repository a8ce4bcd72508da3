//! 容器注册表
//!
//! 维护组件键到适配器的有序绑定，与实例化策略无关，也不向父容器委派。

use crate::adapter::{AdapterHandle, ComponentAdapter};
use di_abstractions::ComponentDescriptor;
use indexmap::IndexMap;
use infrastructure_common::{ComponentKey, DependencyError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// 容器注册表
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    adapters: RwLock<IndexMap<ComponentKey, AdapterHandle>>,
}

impl ContainerRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按描述符注册适配器
    ///
    /// - 没有实现的描述符等同于注销，返回 `Ok(None)`
    /// - 实现必须可以赋值给描述符的键
    /// - `overrides` 要求同键适配器已存在且尚未实例化
    /// - 普通描述符遇到同键适配器时，后注册的生效
    pub fn register(&self, descriptor: &ComponentDescriptor) -> Result<Option<AdapterHandle>, DependencyError> {
        let key = descriptor.key();
        let Some(adapter) = ComponentAdapter::from_descriptor(descriptor) else {
            let removed = self.unregister(&key);
            debug!("注销组件: {} (插件 {}), 存在: {}", key, descriptor.origin(), removed.is_some());
            return Ok(None);
        };
        if !adapter.is_assignable_to(&key) {
            return Err(DependencyError::TypeMismatch {
                key,
                implementation: adapter.implementation(),
            });
        }
        let adapter = Arc::new(adapter);

        let mut adapters = self.adapters.write();
        match adapters.get(&key) {
            None if descriptor.options().overrides => {
                return Err(DependencyError::OverrideTargetMissing {
                    key,
                    origin: descriptor.origin().clone(),
                });
            }
            Some(existing) if descriptor.options().overrides => {
                if existing.is_instantiated() {
                    return Err(DependencyError::OverrideOfInstantiatedComponent {
                        key,
                        origin: descriptor.origin().clone(),
                    });
                }
                debug!(
                    "组件 {} 的实现被插件 {} 覆盖 (原插件 {})",
                    key,
                    descriptor.origin(),
                    existing.origin()
                );
            }
            Some(existing) => {
                warn!(
                    "组件 {} 重复注册，插件 {} 的实现取代插件 {} 的实现",
                    key,
                    descriptor.origin(),
                    existing.origin()
                );
            }
            None => {}
        }

        // 重新注册的键移动到末尾，枚举顺序始终是注册顺序
        adapters.shift_remove(&key);
        adapters.insert(key, Arc::clone(&adapter));
        debug!("注册组件: {} -> {} (插件 {})", key, adapter.implementation(), adapter.origin());
        Ok(Some(adapter))
    }

    /// 注销组件，不销毁其实例
    pub fn unregister(&self, key: &ComponentKey) -> Option<AdapterHandle> {
        self.adapters.write().shift_remove(key)
    }

    /// 本地查找，不向父容器委派
    pub fn lookup(&self, key: &ComponentKey) -> Option<AdapterHandle> {
        self.adapters.read().get(key).cloned()
    }

    /// 是否包含指定的键
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.adapters.read().contains_key(key)
    }

    /// 按注册顺序枚举可以赋值给 `base` 的适配器
    ///
    /// 结果基于调用时的快照，之后的注册不影响它，可以反复迭代。
    pub fn enumerate_assignable(&self, base: &ComponentKey) -> AssignableAdapters {
        AssignableAdapters {
            base: *base,
            snapshot: self.snapshot(),
        }
    }

    /// 按注册顺序的全部适配器快照
    pub fn snapshot(&self) -> Arc<[AdapterHandle]> {
        self.adapters.read().values().cloned().collect()
    }

    /// 已注册的组件键
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.adapters.read().keys().copied().collect()
    }

    /// 适配器数量
    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.adapters.read().is_empty()
    }

    /// 清空注册表
    pub fn clear(&self) {
        self.adapters.write().clear();
    }
}

/// 可赋值适配器序列
///
/// 持有注册表快照，迭代时才判断可赋值性。
#[derive(Debug, Clone)]
pub struct AssignableAdapters {
    base: ComponentKey,
    snapshot: Arc<[AdapterHandle]>,
}

impl AssignableAdapters {
    /// 查询的基础键
    pub fn base(&self) -> ComponentKey {
        self.base
    }

    /// 迭代匹配的适配器
    pub fn iter(&self) -> impl Iterator<Item = &AdapterHandle> + '_ {
        self.snapshot
            .iter()
            .filter(move |adapter| adapter.is_assignable_to(&self.base))
    }
}

impl<'a> IntoIterator for &'a AssignableAdapters {
    type Item = &'a AdapterHandle;
    type IntoIter = Box<dyn Iterator<Item = &'a AdapterHandle> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
