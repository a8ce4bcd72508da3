//! 组件系统设置
//!
//! 依次合并默认值、可选的配置文件和环境变量。环境变量使用前缀 `COMPONENTS`，
//! 层级分隔符为 `__`，例如 `COMPONENTS__CONTAINER__RUNTIME__INTERNAL=true`。

use crate::logging::LoggingConfig;
use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// 环境变量默认前缀
pub const DEFAULT_ENV_PREFIX: &str = "COMPONENTS";

/// 组件系统设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentSettings {
    /// 容器配置
    pub container: ContainerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 插件元数据目录
    pub plugins_dir: Option<PathBuf>,
}

impl ComponentSettings {
    /// 从配置文件和默认前缀的环境变量加载
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut loader = SettingsLoader::new();
        if let Some(path) = path {
            loader = loader.file(path);
        }
        loader.load()
    }

    /// 创建加载器
    pub fn loader() -> SettingsLoader {
        SettingsLoader::new()
    }
}

/// 设置加载器
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl SettingsLoader {
    /// 创建使用默认环境变量前缀的加载器
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
        }
    }

    /// 设置配置文件，格式由扩展名决定（toml 或 json）
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// 设置环境变量前缀
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 不读取环境变量
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// 加载设置
    pub fn load(self) -> ConfigResult<ComponentSettings> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError { source: Box::new(e) }
        })?;

        let settings: ComponentSettings = settings.try_deserialize().map_err(|e| {
            error!("配置绑定失败: {}", e);
            ConfigError::ParseError { source: Box::new(e) }
        })?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.container.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "container.name 不能为空".to_string(),
            });
        }
        if self.container.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "container.max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::CyclicConstructionPolicy;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings = SettingsLoader::new().without_env().load().unwrap();
        assert_eq!(settings, ComponentSettings::default());
        assert_eq!(settings.container.name, "root");
        assert_eq!(settings.container.max_resolution_depth, 100);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
plugins_dir = "plugins"

[container]
name = "application"
cyclic_construction = "proceed"

[container.runtime]
headless = true

[logging]
level = "debug"
"#
        )
        .unwrap();

        let settings = SettingsLoader::new().without_env().file(file.path()).load().unwrap();
        assert_eq!(settings.container.name, "application");
        assert_eq!(settings.container.cyclic_construction, CyclicConstructionPolicy::Proceed);
        assert!(settings.container.runtime.headless);
        assert!(!settings.container.runtime.internal);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.plugins_dir, Some(PathBuf::from("plugins")));
    }

    #[test]
    fn test_environment_overrides_file() {
        std::env::set_var("COMPONENTS_SETTINGS_TEST__CONTAINER__RUNTIME__INTERNAL", "true");
        std::env::set_var("COMPONENTS_SETTINGS_TEST__CONTAINER__NAME", "from-env");

        let settings = SettingsLoader::new()
            .env_prefix("COMPONENTS_SETTINGS_TEST")
            .load()
            .unwrap();
        assert!(settings.container.runtime.internal);
        assert_eq!(settings.container.name, "from-env");

        std::env::remove_var("COMPONENTS_SETTINGS_TEST__CONTAINER__RUNTIME__INTERNAL");
        std::env::remove_var("COMPONENTS_SETTINGS_TEST__CONTAINER__NAME");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = SettingsLoader::new()
            .without_env()
            .file("/nonexistent/components.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_depth_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[container]\nmax_resolution_depth = 0").unwrap();

        let result = SettingsLoader::new().without_env().file(file.path()).load();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
