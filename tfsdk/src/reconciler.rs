//! Generic reconciliation of declarative state against a remote API
//!
//! A resource implements [`ReconciledResource`]: how to build its identifier, how to
//! expand its model into remote properties and flatten them back, and the remote calls.
//! [`Reconciler`] owns the lifecycle around those capabilities:
//!
//! - Create checks the resource does not already exist, creates it, waits for any
//!   long-running operation and records the id.
//! - Read removes the resource from state when it is gone remotely, and otherwise
//!   flattens it with the prior model so write-only values carry forward.
//! - Update does nothing when no user-settable field changed, and otherwise sends a
//!   patch built from exactly the changed fields.
//! - Delete treats a resource that is already gone as deleted.
//!
//! Create and Update are followed by a Read that produces the new state.

use crate::context::Context;
use crate::error::{RemoteError, Result, SdkError};
use crate::identifier::ResourceId;
use crate::import::import_state_with_id;
use crate::metadata::{ChangeSet, ResourceMetaData};
use crate::poller::{PollResult, Poller, PollerType, DEFAULT_POLL_INTERVAL};
use crate::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, UpdateResourceRequest, UpdateResourceResponse,
};
use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostics, Dynamic, DynamicValue};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// How a remote mutation finishes.
pub enum Completion {
    /// The response already reflects the final outcome.
    Done,
    /// A long-running operation to poll until it reaches a terminal status.
    Poll(Box<dyn PollerType>),
    /// The remote accepted a delete but gives no operation to follow; re-read the
    /// resource until it is gone.
    WaitForGone,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Done => f.write_str("Done"),
            Completion::Poll(_) => f.write_str("Poll"),
            Completion::WaitForGone => f.write_str("WaitForGone"),
        }
    }
}

/// Upper bounds for each lifecycle operation, polling included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

/// The capabilities a resource provides to the [`Reconciler`].
#[async_trait]
pub trait ReconciledResource: Send + Sync + 'static {
    /// The declarative model. Field names are the external attribute names.
    type Model: Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync;
    type Id: ResourceId;
    /// Remote representation sent on create and returned by reads.
    type Properties: Send + Sync;
    /// Remote representation of a partial update.
    type Patch: Send + Sync;

    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Minimum wait between polls of a long-running operation.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Receives the provider data, e.g. an API client.
    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> Result<()>;

    fn build_id(&self, model: &Self::Model) -> Result<Self::Id>;

    /// Cross-field checks the schema cannot express. Runs before any remote call.
    fn validate_model(&self, _model: &Self::Model) -> Result<()> {
        Ok(())
    }

    fn expand(&self, model: &Self::Model) -> Result<Self::Properties>;

    /// Builds the model from remote properties. `prior` is the last known model, the
    /// source of every value the remote never returns.
    fn flatten(
        &self,
        id: &Self::Id,
        remote: Self::Properties,
        prior: &Self::Model,
    ) -> Result<Self::Model>;

    /// Builds the update payload from the current remote properties, touching only
    /// the fields in `changes`.
    fn expand_patch(
        &self,
        model: &Self::Model,
        changes: &ChangeSet,
        existing: Self::Properties,
    ) -> Result<Self::Patch>;

    async fn get(
        &self,
        ctx: &Context,
        id: &Self::Id,
    ) -> std::result::Result<Self::Properties, RemoteError>;

    async fn create_or_update(
        &self,
        ctx: &Context,
        id: &Self::Id,
        properties: Self::Properties,
    ) -> std::result::Result<Completion, RemoteError>;

    async fn update(
        &self,
        ctx: &Context,
        id: &Self::Id,
        patch: Self::Patch,
    ) -> std::result::Result<Completion, RemoteError>;

    async fn delete(
        &self,
        ctx: &Context,
        id: &Self::Id,
    ) -> std::result::Result<Completion, RemoteError>;
}

/// Runs a remote call under the context's deadline and cancellation.
async fn call<T, F>(ctx: &Context, future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, RemoteError>>,
{
    ctx.bound(future).await?.map_err(SdkError::from)
}

/// Polls a resource until reading it reports not found.
struct GonePoller<'a, R: ReconciledResource> {
    resource: &'a R,
    id: &'a R::Id,
}

#[async_trait]
impl<R: ReconciledResource> PollerType for GonePoller<'_, R> {
    async fn poll(&self, ctx: &Context) -> std::result::Result<PollResult, RemoteError> {
        match self.resource.get(ctx, self.id).await {
            Ok(_) => Ok(PollResult::in_progress(None)),
            Err(e) if e.is_not_found() => Ok(PollResult::succeeded()),
            Err(e) => Err(e),
        }
    }
}

pub struct Reconciler<R> {
    inner: R,
}

impl<R: ReconciledResource> Reconciler<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn parse_id(&self, metadata: &ResourceMetaData) -> Result<R::Id> {
        let id = metadata.id().ok_or_else(|| {
            SdkError::InvalidState(format!(
                "{} state has no id",
                self.inner.resource_type()
            ))
        })?;
        R::Id::parse(id)
    }

    async fn complete(&self, ctx: &Context, id: &R::Id, completion: Completion) -> Result<()> {
        match completion {
            Completion::Done => Ok(()),
            Completion::Poll(poller) => {
                Poller::new(poller, self.inner.poll_interval())
                    .poll_until_done(ctx)
                    .await
            }
            Completion::WaitForGone => {
                let poller = GonePoller {
                    resource: &self.inner,
                    id,
                };
                Poller::new(Box::new(poller), self.inner.poll_interval())
                    .poll_until_done(ctx)
                    .await
            }
        }
    }

    /// Creates the resource described by the planned state and records its id.
    pub async fn create(&self, ctx: &Context, metadata: &mut ResourceMetaData) -> Result<()> {
        let ctx = ctx.with_timeout(self.inner.timeouts().create);
        let model: R::Model = metadata.decode()?;
        self.inner.validate_model(&model)?;
        let id = self.inner.build_id(&model)?;

        tracing::debug!(resource_type = self.inner.resource_type(), id = %id, "checking for an existing resource");
        match call(&ctx, self.inner.get(&ctx, &id)).await {
            Ok(_) => return Err(metadata.resource_requires_import(&id)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(SdkError::operation("checking for presence of existing", &id, e)),
        }

        let properties = self.inner.expand(&model)?;

        tracing::info!(resource_type = self.inner.resource_type(), id = %id, "creating resource");
        let completion = call(&ctx, self.inner.create_or_update(&ctx, &id, properties))
            .await
            .map_err(|e| SdkError::operation("creating", &id, e))?;
        if matches!(completion, Completion::WaitForGone) {
            return Err(SdkError::operation(
                "creating",
                &id,
                SdkError::InvalidState("a create cannot complete by waiting for removal".to_string()),
            ));
        }
        self.complete(&ctx, &id, completion)
            .await
            .map_err(|e| SdkError::operation("waiting for the creation of", &id, e))?;

        metadata.set_id(id.id());
        Ok(())
    }

    /// Refreshes the state from the remote, or marks it gone.
    pub async fn read(&self, ctx: &Context, metadata: &mut ResourceMetaData) -> Result<()> {
        let ctx = ctx.with_timeout(self.inner.timeouts().read);
        let id = self.parse_id(metadata)?;
        let prior: R::Model = metadata.decode_prior()?;

        let remote = match call(&ctx, self.inner.get(&ctx, &id)).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                metadata.mark_as_gone(&id);
                return Ok(());
            }
            Err(e) => return Err(SdkError::operation("retrieving", &id, e)),
        };

        let model = self
            .inner
            .flatten(&id, remote, &prior)
            .map_err(|e| SdkError::operation("flattening", &id, e))?;
        metadata.set_id(id.id());
        metadata.encode(&model)
    }

    /// Applies the changed fields of the planned state in place.
    pub async fn update(&self, ctx: &Context, metadata: &mut ResourceMetaData) -> Result<()> {
        let ctx = ctx.with_timeout(self.inner.timeouts().update);
        let id = self.parse_id(metadata)?;

        let changes = metadata.changes(&self.inner.schema());
        if changes.is_empty() {
            tracing::debug!(resource_type = self.inner.resource_type(), id = %id, "no changes to apply");
            return Ok(());
        }

        let model: R::Model = metadata.decode()?;
        self.inner.validate_model(&model)?;

        let existing = call(&ctx, self.inner.get(&ctx, &id))
            .await
            .map_err(|e| SdkError::operation("retrieving", &id, e))?;
        let patch = self.inner.expand_patch(&model, &changes, existing)?;

        tracing::info!(
            resource_type = self.inner.resource_type(),
            id = %id,
            changed = ?changes.iter().collect::<Vec<_>>(),
            "updating resource"
        );
        let completion = call(&ctx, self.inner.update(&ctx, &id, patch))
            .await
            .map_err(|e| SdkError::operation("updating", &id, e))?;
        self.complete(&ctx, &id, completion)
            .await
            .map_err(|e| SdkError::operation("waiting for the update of", &id, e))
    }

    /// Deletes the resource. A resource that is already gone counts as deleted.
    pub async fn delete(&self, ctx: &Context, metadata: &mut ResourceMetaData) -> Result<()> {
        let ctx = ctx.with_timeout(self.inner.timeouts().delete);
        let id = self.parse_id(metadata)?;

        tracing::info!(resource_type = self.inner.resource_type(), id = %id, "deleting resource");
        let completion = match call(&ctx, self.inner.delete(&ctx, &id)).await {
            Ok(completion) => completion,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(SdkError::operation("deleting", &id, e)),
        };

        match self.complete(&ctx, &id, completion).await {
            Err(e) if !e.is_not_found() => {
                Err(SdkError::operation("waiting for the deletion of", &id, e))
            }
            _ => Ok(()),
        }
    }

    /// Runs a read on `state` and returns the refreshed state, or an error naming
    /// `operation` when the resource vanished.
    async fn read_back(&self, ctx: &Context, operation: &str, state: DynamicValue) -> Result<DynamicValue> {
        let mut metadata = ResourceMetaData::for_state(self.inner.resource_type(), state);
        self.read(ctx, &mut metadata).await?;
        let id = metadata.id().unwrap_or_default().to_string();
        if metadata.is_gone() {
            return Err(SdkError::operation(
                format!("reading after {}", operation),
                id,
                RemoteError::NotFound,
            ));
        }
        metadata
            .into_new_state()
            .ok_or_else(|| SdkError::InvalidState(format!("reading {} produced no state", id)))
    }
}

fn with_id(mut state: DynamicValue, id: &str) -> Result<DynamicValue> {
    state.set_value(&AttributePath::new("id"), Dynamic::String(id.to_string()))?;
    Ok(state)
}

#[async_trait]
impl<R: ReconciledResource> Resource for Reconciler<R> {
    fn type_name(&self) -> &str {
        self.inner.resource_type()
    }

    fn schema(&self) -> Schema {
        self.inner.schema()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = Diagnostics::new();
        match request.provider_data {
            Some(data) => {
                if let Err(e) = self.inner.configure(data.as_ref()) {
                    diagnostics.add_error(
                        format!("Failed to configure {}", self.inner.resource_type()),
                        e.to_string(),
                    );
                }
            }
            None => diagnostics.add_error(
                "Provider not configured",
                format!(
                    "{} requires the provider to be configured before use",
                    self.inner.resource_type()
                ),
            ),
        }
        ConfigureResourceResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let resource_type = self.inner.resource_type();
        let failed = |e: SdkError| CreateResourceResponse {
            new_state: DynamicValue::null(),
            diagnostics: Diagnostics::from_error(format!("Failed to create {}", resource_type), &e),
        };

        let config = if request.config.is_null() {
            &request.planned_state
        } else {
            &request.config
        };
        let diagnostics = self.inner.schema().validate(config);
        if diagnostics.has_errors() {
            return CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        }

        let mut metadata = ResourceMetaData::for_create(resource_type, request.planned_state.clone());
        if let Err(e) = Reconciler::create(self, &ctx, &mut metadata).await {
            return failed(e);
        }

        let id = metadata.id().unwrap_or_default().to_string();
        let state = match with_id(request.planned_state, &id) {
            Ok(state) => state,
            Err(e) => return failed(e),
        };
        match self.read_back(&ctx, "creation", state.clone()).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics,
            },
            // The resource exists remotely, so its id is kept for the next refresh.
            Err(e) => CreateResourceResponse {
                new_state: DynamicValue::new(state.value.known_values()),
                diagnostics: Diagnostics::from_error(format!("Failed to create {}", resource_type), &e),
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut metadata = ResourceMetaData::for_state(self.inner.resource_type(), request.current_state);
        match Reconciler::read(self, &ctx, &mut metadata).await {
            Ok(()) => ReadResourceResponse {
                new_state: metadata.into_new_state(),
                diagnostics: Diagnostics::new(),
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(metadata.prior_state().clone()),
                diagnostics: Diagnostics::from_error(
                    format!("Failed to read {}", self.inner.resource_type()),
                    &e,
                ),
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let resource_type = self.inner.resource_type();
        let prior_state = request.prior_state.clone();
        let failed = |e: SdkError| UpdateResourceResponse {
            new_state: prior_state.clone(),
            diagnostics: Diagnostics::from_error(format!("Failed to update {}", resource_type), &e),
        };

        let config = if request.config.is_null() {
            &request.planned_state
        } else {
            &request.config
        };
        let diagnostics = self.inner.schema().validate(config);
        if diagnostics.has_errors() {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let mut metadata = ResourceMetaData::new(
            resource_type,
            request.prior_state,
            request.planned_state.clone(),
        );
        if let Err(e) = Reconciler::update(self, &ctx, &mut metadata).await {
            return failed(e);
        }

        let id = metadata.id().unwrap_or_default().to_string();
        let state = match with_id(request.planned_state, &id) {
            Ok(state) => state,
            Err(e) => return failed(e),
        };
        match self.read_back(&ctx, "update", state).await {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(e) => failed(e),
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut metadata = ResourceMetaData::for_state(self.inner.resource_type(), request.prior_state);
        let mut response = DeleteResourceResponse::default();
        if let Err(e) = Reconciler::delete(self, &ctx, &mut metadata).await {
            response.diagnostics = Diagnostics::from_error(
                format!("Failed to delete {}", self.inner.resource_type()),
                &e,
            );
        }
        response
    }

    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_with_id::<R::Id>(self.inner.resource_type(), &request.id)
    }
}
