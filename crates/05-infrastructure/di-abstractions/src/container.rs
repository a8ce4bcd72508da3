//! 容器配置

use crate::policy::RuntimeMode;
use serde::{Deserialize, Serialize};

/// 循环构造处理策略
///
/// 适配器在构造自身的过程中再次被请求时触发。检测总是会被记录，
/// 区别在于之后是立即失败还是继续递归构造。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclicConstructionPolicy {
    /// 记录后让本次解析失败
    #[default]
    Fail,
    /// 记录后继续构造，嵌套深度受 `max_resolution_depth` 限制
    Proceed,
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 容器名称，用于日志和错误信息
    pub name: String,
    /// 循环构造处理策略
    pub cyclic_construction: CyclicConstructionPolicy,
    /// 同一适配器允许的最大嵌套构造深度
    pub max_resolution_depth: usize,
    /// 运行模式
    pub runtime: RuntimeMode,
}

impl ContainerConfig {
    /// 使用指定名称创建默认配置
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            cyclic_construction: CyclicConstructionPolicy::Fail,
            max_resolution_depth: 100,
            runtime: RuntimeMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_partial() {
        let config: ContainerConfig = serde_json::from_str(
            r#"{"name": "project", "cyclic_construction": "proceed", "runtime": {"internal": true}}"#,
        )
        .unwrap();

        assert_eq!(config.name, "project");
        assert_eq!(config.cyclic_construction, CyclicConstructionPolicy::Proceed);
        assert_eq!(config.max_resolution_depth, 100);
        assert!(config.runtime.internal);
        assert!(!config.runtime.headless);
    }
}
