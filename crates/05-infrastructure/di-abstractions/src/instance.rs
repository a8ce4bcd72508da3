//! 组件实例
//!
//! 容器中每个已就绪的组件都以 [`ComponentInstance`] 的形式共享给调用方。
//! 一个实例可以通过多个视图（具体类型以及它声明可赋值的 trait 对象）访问。

use infrastructure_common::{BoxError, Component, ComponentKey};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的实例值
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// 视图转换函数：把擦除后的值转换成某个视图的 `Arc<T>`，再装箱成 `Any`
type ViewCaster = Arc<dyn Fn(&ErasedValue) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 视图表
///
/// 记录一个实现类型可以赋值给哪些组件键，以及如何完成转换。
#[derive(Clone)]
pub struct ViewTable {
    implementation: ComponentKey,
    entries: Vec<(ComponentKey, ViewCaster)>,
}

impl ViewTable {
    /// 创建只包含实现类型自身视图的视图表
    pub fn of<I: Component>() -> Self {
        let mut table = Self {
            implementation: ComponentKey::of::<I>(),
            entries: Vec::new(),
        };
        table.add::<I, I, _>(|it| it);
        table
    }

    /// 添加一个视图，重复的键以最后一次为准
    pub fn add<I, T, F>(&mut self, cast: F)
    where
        I: Component,
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<T> + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<T>();
        let caster: ViewCaster = Arc::new(move |value: &ErasedValue| {
            let concrete = Arc::clone(value).downcast::<I>().ok()?;
            Some(Box::new(cast(concrete)) as Box<dyn Any + Send + Sync>)
        });

        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.push((key, caster));
    }

    /// 实现类型
    pub fn implementation(&self) -> ComponentKey {
        self.implementation
    }

    /// 是否可以赋值给指定的键
    pub fn provides(&self, key: &ComponentKey) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// 所有视图键
    pub fn keys(&self) -> impl Iterator<Item = ComponentKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// 为一个具体值生成实例
    ///
    /// 值的类型与视图表的实现类型不一致时返回 `None`。
    pub fn instantiate<I: Component>(&self, value: Arc<I>) -> Option<ComponentInstance> {
        if ComponentKey::of::<I>() != self.implementation {
            return None;
        }
        Some(self.materialize(value))
    }

    fn materialize<I: Component>(&self, value: Arc<I>) -> ComponentInstance {
        let erased: ErasedValue = value.clone();
        let views = self
            .entries
            .iter()
            .filter_map(|(key, caster)| caster(&erased).map(|view| (key.id(), view)))
            .collect();

        ComponentInstance(Arc::new(InstanceInner {
            implementation: self.implementation,
            value: erased,
            component: value,
            views,
        }))
    }
}

impl fmt::Debug for ViewTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTable")
            .field("implementation", &self.implementation)
            .field("views", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct InstanceInner {
    implementation: ComponentKey,
    value: ErasedValue,
    component: Arc<dyn Component>,
    views: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

/// 组件实例
///
/// 克隆代价很低，所有克隆共享同一个底层值。
#[derive(Clone)]
pub struct ComponentInstance(Arc<InstanceInner>);

impl ComponentInstance {
    /// 用只包含自身视图的视图表包装一个值
    pub fn new<I: Component>(value: Arc<I>) -> Self {
        Self::builder(value).build()
    }

    /// 创建实例构建器，可以声明额外的视图
    pub fn builder<I: Component>(value: Arc<I>) -> ComponentInstanceBuilder<I> {
        ComponentInstanceBuilder {
            value,
            views: ViewTable::of::<I>(),
        }
    }

    /// 实现类型
    pub fn implementation(&self) -> ComponentKey {
        self.0.implementation
    }

    /// 以指定视图获取实例
    ///
    /// 实现类型没有声明该视图时返回 `None`。
    pub fn get<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.0
            .views
            .get(&TypeId::of::<T>())
            .and_then(|view| view.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// 是否可以通过指定的键访问
    pub fn provides(&self, key: &ComponentKey) -> bool {
        self.0.views.contains_key(&key.id())
    }

    /// 是否与另一个实例引用同一个底层值
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.value, &other.0.value)
    }

    /// 调用构造后初始化钩子
    pub fn init(&self) -> Result<(), BoxError> {
        self.0.component.init_component()
    }

    /// 调用销毁钩子
    pub fn dispose(&self) -> Result<(), BoxError> {
        self.0.component.dispose_component()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("implementation", &self.0.implementation)
            .field("views", &self.0.views.len())
            .finish()
    }
}

/// 组件实例构建器
pub struct ComponentInstanceBuilder<I: Component> {
    value: Arc<I>,
    views: ViewTable,
}

impl<I: Component> ComponentInstanceBuilder<I> {
    /// 声明实例可以通过 `T` 访问
    pub fn provides<T, F>(mut self, cast: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<T> + Send + Sync + 'static,
    {
        self.views.add::<I, T, F>(cast);
        self
    }

    /// 构建实例
    pub fn build(self) -> ComponentInstance {
        self.views.materialize(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    trait Unrelated: Send + Sync {}

    struct English;

    impl Component for English {}

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_views_resolve_to_same_value() {
        let instance = ComponentInstance::builder(Arc::new(English))
            .provides::<dyn Greeter, _>(|it| it)
            .build();

        let greeter = instance.get::<dyn Greeter>().unwrap();
        let concrete = instance.get::<English>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert_eq!(
            Arc::as_ptr(&greeter).cast::<()>(),
            Arc::as_ptr(&concrete).cast::<()>()
        );

        assert!(instance.provides(&ComponentKey::of::<dyn Greeter>()));
        assert!(instance.get::<dyn Unrelated>().is_none());
        assert_eq!(instance.implementation(), ComponentKey::of::<English>());
    }

    #[test]
    fn test_ptr_eq_tracks_underlying_value() {
        let value = Arc::new(English);
        let first = ComponentInstance::new(value.clone());
        let second = ComponentInstance::new(value);
        let other = ComponentInstance::new(Arc::new(English));

        assert!(first.ptr_eq(&first.clone()));
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&other));
    }

    #[test]
    fn test_view_table_rejects_foreign_values() {
        struct Other;
        impl Component for Other {}

        let table = ViewTable::of::<English>();
        assert!(table.instantiate(Arc::new(Other)).is_none());
        assert!(table.instantiate(Arc::new(English)).is_some());
    }
}
