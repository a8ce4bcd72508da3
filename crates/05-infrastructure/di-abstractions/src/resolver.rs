//! 组件解析器抽象接口
//!
//! 构造函数拿到的唯一能力：把组件键解析成实例（可能沿父容器链查找）。

use crate::instance::ComponentInstance;
use infrastructure_common::{ComponentKey, DependencyError};
use std::sync::Arc;

/// 组件解析器 trait
pub trait ComponentResolver: Send + Sync {
    /// 解析组件键，必要时创建实例
    fn resolve(&self, key: &ComponentKey) -> Result<ComponentInstance, DependencyError>;

    /// 是否可以解析指定的键
    fn can_resolve(&self, key: &ComponentKey) -> bool;
}

/// [`ComponentResolver`] 的类型化扩展
pub trait TypedComponentResolver {
    /// 解析类型 `T` 对应的组件
    fn resolve_typed<T: ?Sized + 'static>(&self) -> Result<Arc<T>, DependencyError>;

    /// 解析可选依赖，未注册时返回 `None`
    fn resolve_optional<T: ?Sized + 'static>(&self) -> Result<Option<Arc<T>>, DependencyError>;
}

impl<R: ComponentResolver + ?Sized> TypedComponentResolver for R {
    fn resolve_typed<T: ?Sized + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        let key = ComponentKey::of::<T>();
        let instance = self.resolve(&key)?;
        instance
            .get::<T>()
            .ok_or_else(|| DependencyError::TypeMismatch {
                key,
                implementation: instance.implementation(),
            })
    }

    fn resolve_optional<T: ?Sized + 'static>(&self) -> Result<Option<Arc<T>>, DependencyError> {
        if !self.can_resolve(&ComponentKey::of::<T>()) {
            return Ok(None);
        }
        self.resolve_typed::<T>().map(Some)
    }
}
