//! 插件目录驱动的容器层级集成测试
//!
//! 从临时目录中的 TOML 插件文件启动应用级和工程级两个容器，覆盖父子解析、
//! 运行模式、跨插件覆盖与注销，以及销毁顺序。

use di_abstractions::{Implementation, TypedComponentResolver};
use di_impl::{CollectingErrorPolicy, ComponentManager};
use infrastructure_common::{BoxError, Component, ComponentKey, ContainerState, DependencyError};
use infrastructure_composition::{
    ComponentSettings, ContainerBootstrapper, ImplementationCatalog, InfrastructureError, SettingsLoader,
    TomlPluginSource,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type Events = Arc<Mutex<Vec<String>>>;

fn record(events: &Events, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

trait Vcs: Send + Sync {
    fn kind(&self) -> &'static str;
}

struct MemoryLogger {
    events: Events,
}

impl Component for MemoryLogger {
    fn dispose_component(&self) -> Result<(), BoxError> {
        record(&self.events, "dispose logger");
        Ok(())
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        record(&self.events, format!("log {message}"));
    }
}

struct GitVcs {
    logger: Arc<dyn Logger>,
    events: Events,
}

impl Component for GitVcs {
    fn init_component(&self) -> Result<(), BoxError> {
        self.logger.log("git opened");
        Ok(())
    }

    fn dispose_component(&self) -> Result<(), BoxError> {
        record(&self.events, "dispose git");
        Ok(())
    }
}

impl Vcs for GitVcs {
    fn kind(&self) -> &'static str {
        "git"
    }
}

#[derive(Default)]
struct ReadOnlyVcs;

impl Component for ReadOnlyVcs {}

impl Vcs for ReadOnlyVcs {
    fn kind(&self) -> &'static str {
        "read-only"
    }
}

#[derive(Default)]
struct MirrorVcs;

impl Component for MirrorVcs {}

impl Vcs for MirrorVcs {
    fn kind(&self) -> &'static str {
        "mirror"
    }
}

struct Indexer {
    vcs: Arc<dyn Vcs>,
    events: Events,
}

impl Component for Indexer {
    fn dispose_component(&self) -> Result<(), BoxError> {
        record(&self.events, "dispose indexer");
        Ok(())
    }
}

#[derive(Default)]
struct InternalProbe;

impl Component for InternalProbe {}

fn catalog(events: &Events) -> Arc<ImplementationCatalog> {
    let logger_events = Arc::clone(events);
    let git_events = Arc::clone(events);
    let indexer_events = Arc::clone(events);

    Arc::new(
        ImplementationCatalog::new()
            .with_interface::<dyn Logger>("app.Logger")
            .with_interface::<dyn Vcs>("project.Vcs")
            .with_implementation(
                "app.MemoryLogger",
                Implementation::<MemoryLogger>::new(move |_| {
                    Ok(MemoryLogger {
                        events: Arc::clone(&logger_events),
                    })
                })
                .provides::<dyn Logger, _>(|it| it),
            )
            .with_implementation("app.InternalProbe", Implementation::<InternalProbe>::default_constructed())
            .with_implementation(
                "project.GitVcs",
                Implementation::<GitVcs>::new(move |resolver| {
                    Ok(GitVcs {
                        logger: resolver.resolve_typed::<dyn Logger>()?,
                        events: Arc::clone(&git_events),
                    })
                })
                .provides::<dyn Vcs, _>(|it| it),
            )
            .with_implementation(
                "project.ReadOnlyVcs",
                Implementation::<ReadOnlyVcs>::default_constructed().provides::<dyn Vcs, _>(|it| it),
            )
            .with_implementation(
                "project.MirrorVcs",
                Implementation::<MirrorVcs>::default_constructed().provides::<dyn Vcs, _>(|it| it),
            )
            .with_implementation(
                "project.Indexer",
                Implementation::<Indexer>::new(move |resolver| {
                    Ok(Indexer {
                        vcs: resolver.resolve_typed::<dyn Vcs>()?,
                        events: Arc::clone(&indexer_events),
                    })
                }),
            ),
    )
}

fn write(dir: &Path, file: &str, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}

/// 标准插件布局：application 提供日志和内部探针，project 提供版本控制和索引服务
fn plugin_layout() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let application = root.path().join("application");
    let project = root.path().join("project");

    write(
        &application,
        "10-core.toml",
        r#"
id = "app.core"

[[components]]
interface = "app.Logger"
implementation = "app.MemoryLogger"

[[components]]
implementation = "app.InternalProbe"
options = { internal = true }
"#,
    );
    write(
        &project,
        "10-vcs.toml",
        r#"
id = "project.vcs"

[[components]]
interface = "project.Vcs"
implementation = "project.GitVcs"
headless-implementation = "project.ReadOnlyVcs"
options = { workspace = true }
"#,
    );
    write(
        &project,
        "20-indexing.json",
        r#"{"id": "project.indexing", "components": [{"implementation": "project.Indexer"}]}"#,
    );
    root
}

async fn start(
    settings: &ComponentSettings,
    directory: &Path,
    catalog: &Arc<ImplementationCatalog>,
    parent: Option<&Arc<ComponentManager>>,
) -> Result<Arc<ComponentManager>, InfrastructureError> {
    let mut bootstrapper = ContainerBootstrapper::new(
        settings.clone(),
        Arc::new(TomlPluginSource::new(directory)),
        Arc::clone(catalog),
    );
    if let Some(parent) = parent {
        bootstrapper = bootstrapper.with_parent(parent);
    }
    Ok(bootstrapper.bootstrap().await?.manager)
}

#[tokio::test]
async fn test_project_container_resolves_through_application() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let settings = ComponentSettings::default();

    let application = start(&settings, &plugins.path().join("application"), &catalog, None)
        .await
        .unwrap();
    let project = start(
        &settings,
        &plugins.path().join("project"),
        &catalog,
        Some(&application),
    )
    .await
    .unwrap();

    assert_eq!(application.state(), ContainerState::ComponentsCreated);
    assert_eq!(project.state(), ContainerState::ComponentsCreated);

    let indexer = project.get_component::<Indexer>().unwrap().unwrap();
    assert_eq!(indexer.vcs.kind(), "git");

    // 父容器中的组件对子容器可见，子容器中的组件对父容器不可见
    assert!(project.has_component::<dyn Logger>());
    assert!(!application.has_component::<dyn Vcs>());
    assert!(!project.registered_keys().contains(&ComponentKey::of::<dyn Logger>()));

    let vcs_adapter = project.adapter(&ComponentKey::of::<dyn Vcs>()).unwrap();
    assert!(vcs_adapter.options().workspace);

    assert!(events.lock().unwrap().contains(&"log git opened".to_string()));
}

#[tokio::test]
async fn test_disposal_runs_child_then_parent_in_reverse_creation_order() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let settings = ComponentSettings::default();

    let application = start(&settings, &plugins.path().join("application"), &catalog, None)
        .await
        .unwrap();
    let project = start(
        &settings,
        &plugins.path().join("project"),
        &catalog,
        Some(&application),
    )
    .await
    .unwrap();
    events.lock().unwrap().clear();

    let disposed = project.dispose().unwrap();
    assert_eq!(disposed.disposed, 2);
    assert!(disposed.failures.is_empty());
    let disposed = application.dispose().unwrap();
    assert_eq!(disposed.disposed, 1);

    assert_eq!(
        *events.lock().unwrap(),
        vec!["dispose indexer", "dispose git", "dispose logger"]
    );
    assert_eq!(project.state(), ContainerState::Disposed);
    assert!(matches!(
        project.get_component::<Indexer>(),
        Err(DependencyError::ContainerAlreadyDisposed { .. })
    ));
}

#[tokio::test]
async fn test_headless_mode_from_settings_file() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();

    write(
        plugins.path(),
        "config.toml",
        r#"
[container]
name = "headless-project"

[container.runtime]
headless = true
"#,
    );
    let settings = SettingsLoader::new()
        .without_env()
        .file(plugins.path().join("config.toml"))
        .load()
        .unwrap();
    assert!(settings.container.runtime.headless);

    let application = start(&settings, &plugins.path().join("application"), &catalog, None)
        .await
        .unwrap();
    let project = start(
        &settings,
        &plugins.path().join("project"),
        &catalog,
        Some(&application),
    )
    .await
    .unwrap();

    assert_eq!(project.name(), "headless-project");
    let vcs = project.get_component::<dyn Vcs>().unwrap().unwrap();
    assert_eq!(vcs.kind(), "read-only");
    // 无界面实现不依赖日志，日志组件仍由应用级容器预创建
    assert!(!events.lock().unwrap().contains(&"log git opened".to_string()));
}

#[tokio::test]
async fn test_internal_components_follow_runtime_mode() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let application_dir = plugins.path().join("application");

    let regular = start(&ComponentSettings::default(), &application_dir, &catalog, None)
        .await
        .unwrap();
    assert!(!regular.has_component::<InternalProbe>());

    let mut settings = ComponentSettings::default();
    settings.container.runtime.internal = true;
    let internal = start(&settings, &application_dir, &catalog, None).await.unwrap();
    assert!(internal.has_component::<InternalProbe>());
    assert!(internal
        .created_components()
        .contains(&ComponentKey::of::<InternalProbe>()));
}

#[tokio::test]
async fn test_later_plugin_overrides_earlier_declaration() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let project_dir = plugins.path().join("project");
    write(
        &project_dir,
        "30-mirror.toml",
        r#"
id = "project.mirror"

[[components]]
interface = "project.Vcs"
implementation = "project.MirrorVcs"
options = { overrides = true }
"#,
    );

    let application = start(
        &ComponentSettings::default(),
        &plugins.path().join("application"),
        &catalog,
        None,
    )
    .await
    .unwrap();
    let project = start(&ComponentSettings::default(), &project_dir, &catalog, Some(&application))
        .await
        .unwrap();

    let indexer = project.get_component::<Indexer>().unwrap().unwrap();
    assert_eq!(indexer.vcs.kind(), "mirror");
    let adapter = project.adapter(&ComponentKey::of::<dyn Vcs>()).unwrap();
    assert_eq!(adapter.origin().as_str(), "project.mirror");
}

#[tokio::test]
async fn test_unregistered_dependency_leaves_dependent_invisible() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let project_dir = plugins.path().join("project");
    write(
        &project_dir,
        "30-no-vcs.toml",
        r#"
id = "project.no-vcs"

[[components]]
interface = "project.Vcs"
"#,
    );

    let application = start(
        &ComponentSettings::default(),
        &plugins.path().join("application"),
        &catalog,
        None,
    )
    .await
    .unwrap();

    let policy = Arc::new(CollectingErrorPolicy::new());
    let bootstrapped = ContainerBootstrapper::new(
        ComponentSettings::default(),
        Arc::new(TomlPluginSource::new(&project_dir)),
        Arc::clone(&catalog),
    )
    .with_parent(&application)
    .with_error_policy(policy.clone())
    .bootstrap()
    .await
    .unwrap();

    let summary = &bootstrapped.summary;
    assert_eq!(summary.registration.unregistered, 1);
    assert_eq!(summary.creation.failed, 1);
    assert!(policy.has_error_for(&ComponentKey::of::<Indexer>()));

    let project = &bootstrapped.manager;
    assert!(!project.has_component::<dyn Vcs>());
    assert!(project.get_component::<Indexer>().unwrap().is_none());
}

#[tokio::test]
async fn test_broken_plugin_file_does_not_stop_bootstrap() {
    let events = Events::default();
    let catalog = catalog(&events);
    let plugins = plugin_layout();
    let application_dir = plugins.path().join("application");
    write(&application_dir, "05-broken.toml", "id = [");
    write(
        &application_dir,
        "20-unknown.toml",
        r#"
id = "app.unknown"

[[components]]
interface = "app.Metrics"
implementation = "app.PrometheusMetrics"
"#,
    );

    let bootstrapped = ContainerBootstrapper::new(
        ComponentSettings::default(),
        Arc::new(TomlPluginSource::new(&application_dir)),
        catalog,
    )
    .bootstrap()
    .await
    .unwrap();

    assert_eq!(bootstrapped.summary.plugins, 2);
    assert_eq!(bootstrapped.summary.metadata_errors, 1);
    assert!(bootstrapped.manager.has_component::<dyn Logger>());
}

#[tokio::test]
async fn test_missing_plugin_directory_fails_bootstrap() {
    let events = Events::default();
    let result = start(
        &ComponentSettings::default(),
        Path::new("/nonexistent/plugins"),
        &catalog(&events),
        None,
    )
    .await;
    assert!(matches!(result, Err(InfrastructureError::Component { .. })));
}
