//! # 示例应用程序
//!
//! 从插件文件构建两级容器：应用级容器持有日志和时钟，工程级容器持有版本控制和索引服务，
//! 工程级组件通过父容器获得应用级依赖。

use anyhow::Context;
use clap::Parser;
use di_abstractions::{Implementation, TypedComponentResolver};
use di_impl::ComponentManager;
use infrastructure_common::{BoxError, Component};
use infrastructure_composition::{
    init_logging, ComponentSettings, ContainerBootstrapper, ImplementationCatalog, SettingsLoader,
    TomlPluginSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "组件容器示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 插件目录，包含 application 和 project 两个子目录
    #[arg(short, long, default_value = "plugins")]
    plugins: PathBuf,

    /// 启用内部模式
    #[arg(long)]
    internal: bool,

    /// 启用无界面模式
    #[arg(long)]
    headless: bool,

    /// 日志级别，覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

trait Clock: Send + Sync {
    fn now_millis(&self) -> u128;
}

trait Vcs: Send + Sync {
    fn current_revision(&self) -> String;
}

#[derive(Default)]
struct ConsoleLogger;

impl Component for ConsoleLogger {
    fn dispose_component(&self) -> Result<(), BoxError> {
        info!("控制台日志关闭");
        Ok(())
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        info!(target: "example_app::console", "{}", message);
    }
}

#[derive(Default)]
struct SystemClock;

impl Component for SystemClock {}

impl Clock for SystemClock {
    fn now_millis(&self) -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default()
    }
}

/// 只在内部模式下注册
#[derive(Default)]
struct DiagnosticsReporter;

impl Component for DiagnosticsReporter {
    fn init_component(&self) -> Result<(), BoxError> {
        info!("内部诊断报告已启用");
        Ok(())
    }
}

struct GitVcs {
    logger: Arc<dyn Logger>,
}

impl Component for GitVcs {
    fn init_component(&self) -> Result<(), BoxError> {
        self.logger.log("Git 仓库已打开");
        Ok(())
    }
}

impl Vcs for GitVcs {
    fn current_revision(&self) -> String {
        "a1b2c3d".to_string()
    }
}

#[derive(Default)]
struct ReadOnlyVcs;

impl Component for ReadOnlyVcs {}

impl Vcs for ReadOnlyVcs {
    fn current_revision(&self) -> String {
        "read-only".to_string()
    }
}

struct Indexer {
    vcs: Arc<dyn Vcs>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
}

impl Indexer {
    fn run(&self) {
        self.logger.log(&format!(
            "索引修订 {}，时间戳 {}",
            self.vcs.current_revision(),
            self.clock.now_millis()
        ));
    }
}

impl Component for Indexer {
    fn dispose_component(&self) -> Result<(), BoxError> {
        self.logger.log("索引服务关闭");
        Ok(())
    }
}

fn catalog() -> ImplementationCatalog {
    ImplementationCatalog::new()
        .with_interface::<dyn Logger>("app.Logger")
        .with_interface::<dyn Clock>("app.Clock")
        .with_interface::<dyn Vcs>("project.Vcs")
        .with_implementation(
            "app.ConsoleLogger",
            Implementation::<ConsoleLogger>::default_constructed().provides::<dyn Logger, _>(|it| it),
        )
        .with_implementation(
            "app.SystemClock",
            Implementation::<SystemClock>::default_constructed().provides::<dyn Clock, _>(|it| it),
        )
        .with_implementation(
            "app.DiagnosticsReporter",
            Implementation::<DiagnosticsReporter>::default_constructed(),
        )
        .with_implementation(
            "project.GitVcs",
            Implementation::<GitVcs>::new(|resolver| {
                Ok(GitVcs {
                    logger: resolver.resolve_typed::<dyn Logger>()?,
                })
            })
            .provides::<dyn Vcs, _>(|it| it),
        )
        .with_implementation(
            "project.ReadOnlyVcs",
            Implementation::<ReadOnlyVcs>::default_constructed().provides::<dyn Vcs, _>(|it| it),
        )
        .with_implementation(
            "project.Indexer",
            Implementation::new(|resolver| {
                Ok(Indexer {
                    vcs: resolver.resolve_typed::<dyn Vcs>()?,
                    clock: resolver.resolve_typed::<dyn Clock>()?,
                    logger: resolver.resolve_typed::<dyn Logger>()?,
                })
            }),
        )
}

fn load_settings(args: &Args) -> anyhow::Result<ComponentSettings> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut settings = loader.load().context("加载设置失败")?;

    if args.internal {
        settings.container.runtime.internal = true;
    }
    if args.headless {
        settings.container.runtime.headless = true;
    }
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }
    Ok(settings)
}

async fn bootstrap(
    settings: ComponentSettings,
    plugins: PathBuf,
    catalog: &Arc<ImplementationCatalog>,
    parent: Option<&Arc<ComponentManager>>,
) -> anyhow::Result<Arc<ComponentManager>> {
    let source = Arc::new(TomlPluginSource::new(&plugins));
    let mut bootstrapper = ContainerBootstrapper::new(settings, source, Arc::clone(catalog))
        .on_progress(|fraction| info!("预创建进度: {:.0}%", fraction * 100.0));
    if let Some(parent) = parent {
        bootstrapper = bootstrapper.with_parent(parent);
    }

    let bootstrapped = bootstrapper
        .bootstrap()
        .await
        .with_context(|| format!("启动容器失败: {}", plugins.display()))?;
    info!("启动统计: {:?}", bootstrapped.summary);
    Ok(bootstrapped.manager)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;
    init_logging(&settings.logging)?;

    info!("启动组件容器示例应用");
    let catalog = Arc::new(catalog());
    let plugins_root = settings.plugins_dir.clone().unwrap_or_else(|| args.plugins.clone());

    let application = bootstrap(settings.clone(), plugins_root.join("application"), &catalog, None).await?;

    let mut project_settings = settings;
    project_settings.container.name = "project".to_string();
    let project = bootstrap(
        project_settings,
        plugins_root.join("project"),
        &catalog,
        Some(&application),
    )
    .await?;

    let indexer = project
        .get_component::<Indexer>()?
        .context("索引服务未注册")?;
    indexer.run();

    info!("应用级组件: {:?}", application.created_components());
    info!("工程级组件: {:?}", project.created_components());
    info!(
        "内部诊断报告: {}",
        if application.has_component::<DiagnosticsReporter>() {
            "已注册"
        } else {
            "未注册"
        }
    );

    // 先销毁子容器，再销毁父容器
    let disposed = project.dispose()?;
    info!("工程级容器已销毁: {} 个组件", disposed.disposed);
    let disposed = application.dispose()?;
    info!("应用级容器已销毁: {} 个组件", disposed.disposed);
    Ok(())
}
