//! 组件工厂抽象
//!
//! 容器本身从不按名称查找实现类型，只调用插件加载方提供的不透明构造能力：
//! `construct(implementation, resolver) -> instance`。

use crate::instance::{ComponentInstance, ViewTable};
use crate::resolver::ComponentResolver;
use infrastructure_common::{BoxError, Component, ComponentKey};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type ErasedFactory =
    Arc<dyn Fn(&dyn ComponentResolver) -> Result<ComponentInstance, BoxError> + Send + Sync>;

/// 类型化的组件实现
///
/// 由构造函数和视图表组成。构造函数通过 [`ComponentResolver`] 解析自己的依赖，
/// 每个依赖都会走同一个容器的懒加载流程。
///
/// ```
/// use di_abstractions::{Implementation, TypedComponentResolver};
/// use infrastructure_common::Component;
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {}
///
/// struct ConsoleLogger;
/// impl Component for ConsoleLogger {}
/// impl Logger for ConsoleLogger {}
///
/// struct Service {
///     logger: Arc<dyn Logger>,
/// }
/// impl Component for Service {}
///
/// let logger = Implementation::new(|_| Ok(ConsoleLogger)).provides::<dyn Logger, _>(|it| it);
/// let service = Implementation::new(|resolver| {
///     Ok(Service {
///         logger: resolver.resolve_typed::<dyn Logger>()?,
///     })
/// });
/// # let _ = (logger.into_constructible(), service.into_constructible());
/// ```
pub struct Implementation<I: Component> {
    factory: Arc<dyn Fn(&dyn ComponentResolver) -> Result<I, BoxError> + Send + Sync>,
    views: ViewTable,
    _marker: PhantomData<fn() -> I>,
}

impl<I: Component> Implementation<I> {
    /// 使用构造函数创建实现
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&dyn ComponentResolver) -> Result<I, BoxError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            views: ViewTable::of::<I>(),
            _marker: PhantomData,
        }
    }

    /// 声明实现可以赋值给 `T`
    pub fn provides<T, F>(mut self, cast: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<T> + Send + Sync + 'static,
    {
        self.views.add::<I, T, F>(cast);
        self
    }

    /// 擦除类型，得到容器使用的构造能力
    pub fn into_constructible(self) -> Constructible {
        let Self { factory, views, .. } = self;
        let table = views.clone();
        let erased: ErasedFactory = Arc::new(move |resolver: &dyn ComponentResolver| {
            let value = Arc::new(factory(resolver)?);
            table
                .instantiate(value)
                .ok_or_else(|| BoxError::from("实现类型与视图表不一致"))
        });

        Constructible {
            factory: erased,
            views,
        }
    }
}

impl<I: Component + Default> Implementation<I> {
    /// 使用 `Default` 构造、没有依赖的实现
    pub fn default_constructed() -> Self {
        Self::new(|_| Ok(I::default()))
    }
}

impl<I: Component> From<Implementation<I>> for Constructible {
    fn from(implementation: Implementation<I>) -> Self {
        implementation.into_constructible()
    }
}

/// 类型擦除的构造能力
///
/// 容器只通过它创建实例和判断可赋值性。
#[derive(Clone)]
pub struct Constructible {
    factory: ErasedFactory,
    views: ViewTable,
}

impl Constructible {
    /// 实现类型
    pub fn implementation(&self) -> ComponentKey {
        self.views.implementation()
    }

    /// 实现是否可以赋值给指定的键
    pub fn is_assignable_to(&self, key: &ComponentKey) -> bool {
        self.views.provides(key)
    }

    /// 所有可赋值的键
    pub fn provided_keys(&self) -> Vec<ComponentKey> {
        self.views.keys().collect()
    }

    /// 构造实例
    ///
    /// 不调用初始化钩子，初始化由容器在构造成功后负责。
    pub fn construct(&self, resolver: &dyn ComponentResolver) -> Result<ComponentInstance, BoxError> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for Constructible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructible")
            .field("implementation", &self.implementation())
            .field("views", &self.views)
            .finish()
    }
}
