//! 注册适用性过滤器

use di_abstractions::{ComponentDescriptor, RuntimeMode, SuitabilityFilter};

/// 内部模式过滤器
///
/// 非内部模式下跳过带 `internal` 选项的描述符。
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalModeFilter {
    internal_mode: bool,
}

impl InternalModeFilter {
    /// 创建过滤器
    pub fn new(internal_mode: bool) -> Self {
        Self { internal_mode }
    }

    /// 按运行模式创建过滤器
    pub fn for_mode(mode: &RuntimeMode) -> Self {
        Self::new(mode.internal)
    }
}

impl SuitabilityFilter for InternalModeFilter {
    fn is_suitable(&self, descriptor: &ComponentDescriptor) -> bool {
        self.internal_mode || !descriptor.options().internal
    }
}

/// 接受所有描述符
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SuitabilityFilter for AcceptAll {
    fn is_suitable(&self, _descriptor: &ComponentDescriptor) -> bool {
        true
    }
}
