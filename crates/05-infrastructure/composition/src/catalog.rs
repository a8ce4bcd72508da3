//! 实现目录
//!
//! 插件元数据只用名称引用接口和实现。目录把这些名称映射到组件键和构造能力，
//! 容器本身从不做基于名称的查找。

use dashmap::DashMap;
use di_abstractions::{ComponentConfig, ComponentDescriptor, Constructible, PluginComponents, RuntimeMode};
use infrastructure_common::{ComponentError, ComponentKey, PluginId};
use tracing::debug;

/// 实现目录
#[derive(Debug, Default)]
pub struct ImplementationCatalog {
    interfaces: DashMap<String, ComponentKey>,
    implementations: DashMap<String, Constructible>,
}

impl ImplementationCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记接口名称
    pub fn register_interface<T: ?Sized + 'static>(&self, name: impl Into<String>) {
        let name = name.into();
        debug!("登记接口: {} -> {}", name, ComponentKey::of::<T>());
        self.interfaces.insert(name, ComponentKey::of::<T>());
    }

    /// 登记实现名称
    pub fn register_implementation(&self, name: impl Into<String>, implementation: impl Into<Constructible>) {
        let name = name.into();
        let implementation = implementation.into();
        debug!("登记实现: {} -> {}", name, implementation.implementation());
        self.implementations.insert(name, implementation);
    }

    /// 登记接口名称，构建器形式
    pub fn with_interface<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.register_interface::<T>(name);
        self
    }

    /// 登记实现名称，构建器形式
    pub fn with_implementation(self, name: impl Into<String>, implementation: impl Into<Constructible>) -> Self {
        self.register_implementation(name, implementation);
        self
    }

    /// 已登记的接口数量
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// 已登记的实现数量
    pub fn implementation_count(&self) -> usize {
        self.implementations.len()
    }

    /// 把一个插件的组件声明转换成描述符
    ///
    /// 每条声明独立转换，出错的声明只产生一条错误，其余声明照常返回。
    pub fn resolve(
        &self,
        plugin: &PluginComponents,
        mode: &RuntimeMode,
    ) -> (Vec<ComponentDescriptor>, Vec<ComponentError>) {
        let mut descriptors = Vec::with_capacity(plugin.components.len());
        let mut errors = Vec::new();

        for component in &plugin.components {
            match self.resolve_component(&plugin.id, component, mode) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(error) => errors.push(error),
            }
        }

        debug!(
            "插件 {} 元数据转换完成: 描述符 {}, 错误 {}",
            plugin.id,
            descriptors.len(),
            errors.len()
        );
        (descriptors, errors)
    }

    fn resolve_component(
        &self,
        origin: &PluginId,
        component: &ComponentConfig,
        mode: &RuntimeMode,
    ) -> Result<ComponentDescriptor, ComponentError> {
        let interface = component.interface_name().ok_or_else(|| {
            ComponentError::invalid_metadata(format!("插件 {origin} 的组件声明既没有接口也没有实现"))
        })?;
        let key = self.interface_key(interface).ok_or_else(|| ComponentError::UnknownInterface {
            name: interface.to_string(),
            origin: origin.clone(),
        })?;

        let descriptor = match component.implementation_name(mode.headless) {
            None => ComponentDescriptor::unregister(key),
            Some(name) => {
                let implementation = self
                    .implementations
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| ComponentError::UnknownImplementation {
                        name: name.to_string(),
                        origin: origin.clone(),
                    })?;
                if !implementation.is_assignable_to(&key) {
                    return Err(ComponentError::invalid_metadata(format!(
                        "插件 {origin} 的实现 {name} 不能赋值给接口 {interface}"
                    )));
                }
                ComponentDescriptor::new(key, implementation)
            }
        };

        Ok(descriptor.with_origin(origin.clone()).with_options(component.options))
    }

    /// 接口名称对应的键；自注册组件的接口名称就是实现名称
    fn interface_key(&self, name: &str) -> Option<ComponentKey> {
        self.interfaces
            .get(name)
            .map(|entry| *entry.value())
            .or_else(|| {
                self.implementations
                    .get(name)
                    .map(|entry| entry.value().implementation())
            })
    }
}
