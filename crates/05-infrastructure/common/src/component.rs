//! 组件基础接口定义
//!
//! 提供所有注册到容器的组件实现必须实现的生命周期 trait

use crate::errors::BoxError;

/// 组件基础 trait
///
/// 所有组件实现都必须实现此 trait。两个钩子都有空的默认实现，
/// 只关心构造的组件写一个空的 `impl Component for X {}` 即可。
pub trait Component: Send + Sync + 'static {
    /// 构造完成后、实例对外可见之前调用
    ///
    /// 返回错误时实例不会被缓存，视为构造失败。
    fn init_component(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// 容器销毁时按创建顺序的逆序调用
    ///
    /// 返回的错误只会被记录，不会中断其他组件的销毁。
    fn dispose_component(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Component for Plain {}

    #[test]
    fn test_default_hooks_are_noops() {
        let component: &dyn Component = &Plain;
        assert!(component.init_component().is_ok());
        assert!(component.dispose_component().is_ok());
    }
}
