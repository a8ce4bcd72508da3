//! 插件描述源实现

use async_trait::async_trait;
use di_abstractions::{PluginComponents, PluginDescriptorSource};
use infrastructure_common::ComponentError;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 从目录读取插件元数据
///
/// 目录中每个 `*.toml` 或 `*.json` 文件描述一个插件，按文件名排序决定加载顺序。
/// 无法解析的文件记录错误后跳过，不影响其他插件。
#[derive(Debug, Clone)]
pub struct TomlPluginSource {
    directory: PathBuf,
}

impl TomlPluginSource {
    /// 创建目录描述源
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// 插件目录
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    async fn read_plugin(path: &Path) -> Result<PluginComponents, ComponentError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ComponentError::scan_error(format!("读取插件文件失败: {}: {}", path.display(), e)))?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => toml::from_str(&content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| {
            ComponentError::invalid_metadata(format!("插件文件 {} 解析失败: {}", path.display(), message))
        })
    }
}

#[async_trait]
impl PluginDescriptorSource for TomlPluginSource {
    async fn plugins(&self) -> Result<Vec<PluginComponents>, ComponentError> {
        let mut entries = tokio::fs::read_dir(&self.directory).await.map_err(|e| {
            ComponentError::scan_error(format!("读取插件目录失败: {}: {}", self.directory.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ComponentError::scan_error(format!("遍历插件目录失败: {}", e)))?
        {
            let path = entry.path();
            if matches!(path.extension().and_then(|ext| ext.to_str()), Some("toml" | "json")) {
                files.push(path);
            }
        }
        files.sort();

        let mut plugins = Vec::with_capacity(files.len());
        for path in files {
            match Self::read_plugin(&path).await {
                Ok(plugin) => {
                    debug!(
                        "读取插件 {}: {} 个组件 ({})",
                        plugin.id,
                        plugin.components.len(),
                        path.display()
                    );
                    plugins.push(plugin);
                }
                Err(e) => error!("跳过插件文件: {}", e),
            }
        }

        info!("从 {} 读取到 {} 个插件", self.directory.display(), plugins.len());
        Ok(plugins)
    }

    fn name(&self) -> &str {
        "toml-directory"
    }
}

/// 内存中的插件描述源
#[derive(Debug, Clone, Default)]
pub struct StaticPluginSource {
    plugins: Vec<PluginComponents>,
}

impl StaticPluginSource {
    /// 创建内存描述源
    pub fn new(plugins: Vec<PluginComponents>) -> Self {
        Self { plugins }
    }

    /// 追加一个插件
    pub fn with_plugin(mut self, plugin: PluginComponents) -> Self {
        self.plugins.push(plugin);
        self
    }
}

#[async_trait]
impl PluginDescriptorSource for StaticPluginSource {
    async fn plugins(&self) -> Result<Vec<PluginComponents>, ComponentError> {
        Ok(self.plugins.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
