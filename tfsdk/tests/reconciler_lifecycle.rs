//! Lifecycle tests for the reconciler against an in-memory remote.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tfsdk::convert::{flatten_map, from_optional, optional};
use tfsdk::identifier::{format_segments, parse_segments};
use tfsdk::provider::{ConfigureProviderRequest, ConfigureProviderResponse};
use tfsdk::testing::ProviderTester;
use tfsdk::{
    AttributeBuilder, AttributeType, ChangeSet, Completion, Context, Dynamic, DynamicValue,
    PollResult, PollerType, Provider, ReconciledResource, Reconciler, Registry, RemoteError,
    ResourceId, Schema, SchemaBuilder, SdkError, Segment,
};

const WIDGET: &str = "test_widget";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum CreateMode {
    #[default]
    Done,
    /// Succeeds after this many polls.
    Poll(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum DeleteMode {
    #[default]
    Done,
    /// Stays visible for this many reads after the delete call.
    WaitForGone(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct WidgetProperties {
    size: Option<i64>,
    color: Option<String>,
    secret: Option<String>,
    tags: Option<HashMap<String, String>>,
    serial: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct WidgetPatch {
    size: Option<i64>,
    color: Option<String>,
    secret: Option<String>,
    tags: Option<HashMap<String, String>>,
}

#[derive(Default)]
struct RemoteState {
    widgets: HashMap<String, WidgetProperties>,
    calls: Vec<String>,
    patches: Vec<WidgetPatch>,
    create_mode: CreateMode,
    delete_mode: DeleteMode,
    fail_updates: bool,
    /// Reads of widgets that exist fail, as a transient outage would.
    fail_existing_reads: bool,
    pending_delete: Option<(String, usize)>,
}

#[derive(Clone, Default)]
struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    fn with<T>(&self, f: impl FnOnce(&mut RemoteState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    fn seed(&self, name: &str, size: i64) {
        self.with(|s| {
            s.widgets.insert(
                name.to_string(),
                WidgetProperties {
                    size: Some(size),
                    serial: Some(format!("serial-{}", name)),
                    ..Default::default()
                },
            )
        });
    }
}

struct CountdownPoller {
    remaining: AtomicUsize,
}

#[async_trait]
impl PollerType for CountdownPoller {
    async fn poll(&self, _ctx: &Context) -> Result<PollResult, RemoteError> {
        let remaining = self.remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(PollResult::succeeded());
        }
        self.remaining.store(remaining - 1, Ordering::SeqCst);
        Ok(PollResult::in_progress(Some(Duration::from_millis(1))))
    }
}

const WIDGET_SEGMENTS: &[Segment] = &[Segment::Static("widgets"), Segment::User("widgetName")];

#[derive(Debug, Clone, PartialEq)]
struct WidgetId {
    name: String,
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_segments(WIDGET_SEGMENTS, &[&self.name]))
    }
}

impl ResourceId for WidgetId {
    fn kind() -> &'static str {
        "Widget ID"
    }

    fn parse(input: &str) -> tfsdk::Result<Self> {
        let mut values = parse_segments(Self::kind(), input, WIDGET_SEGMENTS, false)?;
        Ok(WidgetId {
            name: values.remove(0),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct WidgetModel {
    name: String,
    size: i64,
    color: String,
    secret: String,
    tags: HashMap<String, String>,
    serial: String,
}

#[derive(Default)]
struct WidgetResource {
    remote: Option<FakeRemote>,
}

impl WidgetResource {
    fn remote(&self) -> Result<&FakeRemote, RemoteError> {
        self.remote
            .as_ref()
            .ok_or_else(|| RemoteError::failed(std::io::Error::other("not configured")))
    }
}

#[async_trait]
impl ReconciledResource for WidgetResource {
    type Model = WidgetModel;
    type Id = WidgetId;
    type Properties = WidgetProperties;
    type Patch = WidgetPatch;

    fn resource_type(&self) -> &'static str {
        WIDGET
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(AttributeBuilder::new("size", AttributeType::Number).optional().build())
            .attribute(AttributeBuilder::new("color", AttributeType::String).optional().build())
            .attribute(
                AttributeBuilder::new("secret", AttributeType::String)
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
                    .optional()
                    .build(),
            )
            .attribute(AttributeBuilder::new("serial", AttributeType::String).computed().build())
            .build()
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        let remote = provider_data
            .downcast_ref::<FakeRemote>()
            .ok_or_else(|| SdkError::InvalidConfiguration("unexpected provider data".to_string()))?;
        self.remote = Some(remote.clone());
        Ok(())
    }

    fn build_id(&self, model: &WidgetModel) -> tfsdk::Result<WidgetId> {
        Ok(WidgetId {
            name: model.name.clone(),
        })
    }

    fn expand(&self, model: &WidgetModel) -> tfsdk::Result<WidgetProperties> {
        Ok(WidgetProperties {
            size: optional(&model.size),
            color: optional(&model.color),
            secret: optional(&model.secret),
            tags: optional(&model.tags),
            serial: None,
        })
    }

    fn flatten(
        &self,
        id: &WidgetId,
        remote: WidgetProperties,
        prior: &WidgetModel,
    ) -> tfsdk::Result<WidgetModel> {
        Ok(WidgetModel {
            name: id.name.clone(),
            size: from_optional(remote.size),
            color: from_optional(remote.color),
            secret: prior.secret.clone(),
            tags: flatten_map(remote.tags),
            serial: from_optional(remote.serial),
        })
    }

    fn expand_patch(
        &self,
        model: &WidgetModel,
        changes: &ChangeSet,
        _existing: WidgetProperties,
    ) -> tfsdk::Result<WidgetPatch> {
        Ok(WidgetPatch {
            size: changes.contains("size").then_some(model.size),
            color: changes.contains("color").then(|| model.color.clone()),
            secret: changes.contains("secret").then(|| model.secret.clone()),
            tags: changes.contains("tags").then(|| model.tags.clone()),
        })
    }

    async fn get(&self, _ctx: &Context, id: &WidgetId) -> Result<WidgetProperties, RemoteError> {
        self.remote()?.with(|s| {
            s.calls.push(format!("get {}", id.name));
            if let Some((name, remaining)) = s.pending_delete.as_mut() {
                if *name == id.name {
                    if *remaining == 0 {
                        s.widgets.remove(&id.name);
                        s.pending_delete = None;
                    } else {
                        *remaining -= 1;
                    }
                }
            }
            if s.fail_existing_reads && s.widgets.contains_key(&id.name) {
                return Err(RemoteError::failed(std::io::Error::other("transient 503")));
            }
            s.widgets
                .get(&id.name)
                .map(|w| WidgetProperties {
                    secret: None,
                    ..w.clone()
                })
                .ok_or(RemoteError::NotFound)
        })
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &WidgetId,
        properties: WidgetProperties,
    ) -> Result<Completion, RemoteError> {
        self.remote()?.with(|s| {
            s.calls.push(format!("put {}", id.name));
            s.widgets.insert(
                id.name.clone(),
                WidgetProperties {
                    serial: Some(format!("serial-{}", id.name)),
                    ..properties
                },
            );
            Ok(match s.create_mode {
                CreateMode::Done => Completion::Done,
                CreateMode::Poll(polls) => Completion::Poll(Box::new(CountdownPoller {
                    remaining: AtomicUsize::new(polls),
                })),
            })
        })
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &WidgetId,
        patch: WidgetPatch,
    ) -> Result<Completion, RemoteError> {
        self.remote()?.with(|s| {
            s.calls.push(format!("patch {}", id.name));
            if s.fail_updates {
                return Err(RemoteError::failed(std::io::Error::other("boom")));
            }
            let widget = s.widgets.get_mut(&id.name).ok_or(RemoteError::NotFound)?;
            if let Some(size) = patch.size {
                widget.size = Some(size);
            }
            if let Some(color) = &patch.color {
                widget.color = Some(color.clone());
            }
            if let Some(tags) = &patch.tags {
                widget.tags = Some(tags.clone());
            }
            s.patches.push(patch);
            Ok(Completion::Done)
        })
    }

    async fn delete(&self, _ctx: &Context, id: &WidgetId) -> Result<Completion, RemoteError> {
        self.remote()?.with(|s| {
            s.calls.push(format!("delete {}", id.name));
            if !s.widgets.contains_key(&id.name) {
                return Err(RemoteError::NotFound);
            }
            match s.delete_mode {
                DeleteMode::Done => {
                    s.widgets.remove(&id.name);
                    Ok(Completion::Done)
                }
                DeleteMode::WaitForGone(reads) => {
                    s.pending_delete = Some((id.name.clone(), reads));
                    Ok(Completion::WaitForGone)
                }
            }
        })
    }
}

struct WidgetProvider {
    remote: FakeRemote,
}

#[async_trait]
impl Provider for WidgetProvider {
    fn type_name(&self) -> &str {
        "test"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new().build()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            provider_data: Some(Arc::new(self.remote.clone())),
            ..Default::default()
        }
    }

    fn register(&self, registry: &mut Registry) -> tfsdk::Result<()> {
        registry.register_resource(|| Box::new(Reconciler::new(WidgetResource::default())))
    }
}

async fn tester(remote: &FakeRemote) -> ProviderTester<WidgetProvider> {
    let mut tester = ProviderTester::new(WidgetProvider {
        remote: remote.clone(),
    })
    .unwrap();
    tester.configure(DynamicValue::object(Vec::<(String, Dynamic)>::new())).await.unwrap();
    tester
}

fn widget(name: &str, size: i64, color: &str) -> DynamicValue {
    DynamicValue::object([
        ("name", Dynamic::from(name)),
        ("size", Dynamic::from(size)),
        ("color", Dynamic::from(color)),
        ("secret", Dynamic::from("hunter2")),
    ])
}

#[tokio::test]
async fn create_then_read_returns_the_same_state() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;

    let created = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    assert_eq!(created.get("id"), Some(&Dynamic::from("/widgets/a")));
    assert_eq!(created.get("size"), Some(&Dynamic::Number(1.0)));
    assert_eq!(created.get("serial"), Some(&Dynamic::from("serial-a")));
    assert_eq!(created.get("secret"), Some(&Dynamic::from("hunter2")));

    let read = tester.read(WIDGET, "/widgets/a").await.unwrap().unwrap();
    assert_eq!(read, created);
    assert_eq!(tester.state("/widgets/a").unwrap(), Some(created));
}

#[tokio::test]
async fn create_polls_long_running_operations() {
    let remote = FakeRemote::default();
    remote.with(|s| s.create_mode = CreateMode::Poll(3));
    let mut tester = tester(&remote).await;

    let created = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    assert_eq!(created.get("id"), Some(&Dynamic::from("/widgets/a")));
}

#[tokio::test]
async fn create_keeps_the_id_when_reading_back_fails() {
    let remote = FakeRemote::default();
    remote.with(|s| s.fail_existing_reads = true);
    let mut tester = tester(&remote).await;

    let err = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap_err();

    assert!(matches!(err, SdkError::Diagnostics(_)), "{:?}", err);
    assert!(err.to_string().contains("transient 503"), "{}", err);
    assert!(remote.with(|s| s.widgets.contains_key("a")));
    let stored = tester.state("/widgets/a").unwrap().unwrap();
    assert_eq!(stored.get("id"), Some(&Dynamic::from("/widgets/a")));
    assert_eq!(stored.get("size"), Some(&Dynamic::Number(1.0)));
    assert!(stored.get("serial").is_none());

    remote.with(|s| s.fail_existing_reads = false);
    let read = tester.read(WIDGET, "/widgets/a").await.unwrap().unwrap();
    assert_eq!(read.get("serial"), Some(&Dynamic::from("serial-a")));
}

#[tokio::test]
async fn apply_returns_a_state_for_a_created_resource_that_cannot_be_read() {
    let remote = FakeRemote::default();
    remote.with(|s| s.fail_existing_reads = true);
    let tester = tester(&remote).await;
    let config = widget("b", 2, "blue");
    let plan = tester
        .server()
        .plan_resource_change(WIDGET, &DynamicValue::null(), &config)
        .unwrap();

    let response = tester
        .server()
        .apply_resource_change(Context::new(), WIDGET, DynamicValue::null(), plan.planned_state, config)
        .await;

    assert!(response.diagnostics.has_errors());
    assert!(!response.new_state.is_null());
    assert_eq!(response.new_state.get("id"), Some(&Dynamic::from("/widgets/b")));
    assert!(response.new_state.get("serial").is_none());
}

#[tokio::test]
async fn create_of_existing_resource_requires_import() {
    let remote = FakeRemote::default();
    remote.seed("a", 5);
    let mut tester = tester(&remote).await;

    let err = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap_err();

    assert!(err.to_string().contains("already exists"), "{}", err);
    assert!(tester.store().is_empty());
    assert!(!remote.calls().iter().any(|c| c.starts_with("put")));
    assert_eq!(remote.with(|s| s.widgets["a"].size), Some(5));
}

#[tokio::test]
async fn invalid_configuration_makes_no_remote_call() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;

    let err = tester
        .create(WIDGET, DynamicValue::object([("size", Dynamic::from(1i64))]))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Missing required argument"), "{}", err);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn read_of_deleted_resource_removes_state() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    remote.with(|s| s.widgets.remove("a"));
    let read = tester.read(WIDGET, "/widgets/a").await.unwrap();

    assert!(read.is_none());
    assert!(tester.state("/widgets/a").unwrap().is_none());
}

#[tokio::test]
async fn update_without_changes_makes_no_remote_update() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    let created = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();
    remote.clear_calls();

    let updated = tester
        .update(WIDGET, "/widgets/a", widget("a", 1, "red"))
        .await
        .unwrap();

    assert_eq!(updated, created);
    assert!(!remote.calls().iter().any(|c| c.starts_with("patch")));
}

#[tokio::test]
async fn update_patches_exactly_the_changed_fields() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    let updated = tester
        .update(WIDGET, "/widgets/a", widget("a", 1, "blue"))
        .await
        .unwrap();

    assert_eq!(updated.get("color"), Some(&Dynamic::from("blue")));
    assert_eq!(
        remote.with(|s| s.patches.clone()),
        vec![WidgetPatch {
            color: Some("blue".to_string()),
            ..Default::default()
        }]
    );
}

#[tokio::test]
async fn failed_update_keeps_prior_state() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    let created = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();
    remote.with(|s| s.fail_updates = true);

    let err = tester
        .update(WIDGET, "/widgets/a", widget("a", 2, "red"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("updating /widgets/a: boom"), "{}", err);
    assert_eq!(tester.state("/widgets/a").unwrap(), Some(created));
}

#[tokio::test]
async fn changing_a_force_new_field_is_not_an_update() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    let err = tester
        .update(WIDGET, "/widgets/a", widget("b", 1, "red"))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;
    let created = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();

    tester.delete(WIDGET, "/widgets/a").await.unwrap();
    assert!(remote.with(|s| s.widgets.is_empty()));

    let again = tester
        .server()
        .apply_resource_change(
            Context::new(),
            WIDGET,
            created,
            DynamicValue::null(),
            DynamicValue::null(),
        )
        .await;
    assert!(!again.diagnostics.has_errors(), "{}", again.diagnostics);
    assert!(again.new_state.is_null());
}

#[tokio::test]
async fn delete_waits_until_the_resource_is_gone() {
    let remote = FakeRemote::default();
    remote.with(|s| s.delete_mode = DeleteMode::WaitForGone(2));
    let mut tester = tester(&remote).await;
    tester.create(WIDGET, widget("a", 1, "red")).await.unwrap();
    remote.clear_calls();

    tester.delete(WIDGET, "/widgets/a").await.unwrap();

    let gets = remote.calls().iter().filter(|c| c.starts_with("get")).count();
    assert_eq!(gets, 3);
    assert!(remote.with(|s| s.widgets.is_empty()));
}

#[tokio::test]
async fn create_stops_polling_at_the_deadline() {
    let remote = FakeRemote::default();
    remote.with(|s| s.create_mode = CreateMode::Poll(usize::MAX));
    let mut tester = tester(&remote)
        .await
        .with_context(Context::new().with_timeout(Duration::from_millis(50)));

    let err = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap_err();

    assert!(err.to_string().contains("context deadline exceeded"), "{}", err);
    assert!(tester.store().is_empty());
}

#[tokio::test]
async fn import_reads_the_remote_resource() {
    let remote = FakeRemote::default();
    remote.seed("b", 7);
    let mut tester = tester(&remote).await;

    let imported = tester.import(WIDGET, "/widgets/b").await.unwrap();

    assert_eq!(imported.get("name"), Some(&Dynamic::from("b")));
    assert_eq!(imported.get("size"), Some(&Dynamic::Number(7.0)));
    assert!(tester.state("/widgets/b").unwrap().is_some());
}

#[tokio::test]
async fn import_rejects_malformed_ids_and_missing_resources() {
    let remote = FakeRemote::default();
    let mut tester = tester(&remote).await;

    let err = tester.import(WIDGET, "/gadgets/b").await.unwrap_err();
    assert!(err.to_string().contains("Invalid import ID"), "{}", err);

    let err = tester.import(WIDGET, "/widgets/missing").await.unwrap_err();
    assert!(err.to_string().contains("Cannot import non-existent remote object"), "{}", err);
}

#[tokio::test]
async fn unconfigured_provider_is_reported() {
    let remote = FakeRemote::default();
    let mut tester = ProviderTester::new(WidgetProvider {
        remote: remote.clone(),
    })
    .unwrap();

    let err = tester.create(WIDGET, widget("a", 1, "red")).await.unwrap_err();

    assert!(err.to_string().contains("Provider not configured"), "{}", err);
}
