//! Test harness driving a provider the way Terraform does
//!
//! `ProviderTester` runs validate, plan and apply through a [`ProviderServer`] and keeps
//! the resulting states in an in-memory store, MessagePack encoded and keyed by id.

use crate::context::Context;
use crate::error::{Result, SdkError};
use crate::provider::Provider;
use crate::server::{ProviderServer, ServerConfig};
use crate::types::{Dynamic, DynamicValue};
use std::collections::HashMap;

/// Declarative state keyed by resource id.
#[derive(Debug, Default)]
pub struct StateStore {
    states: HashMap<String, Vec<u8>>,
}

impl StateStore {
    pub fn put(&mut self, id: &str, state: &DynamicValue) -> Result<()> {
        self.states.insert(id.to_string(), state.encode_msgpack()?);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<DynamicValue>> {
        self.states
            .get(id)
            .map(|data| DynamicValue::decode_msgpack(data))
            .transpose()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.states.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

pub struct ProviderTester<P> {
    server: ProviderServer<P>,
    store: StateStore,
    ctx: Context,
}

fn state_id(state: &DynamicValue) -> Result<String> {
    state
        .get("id")
        .and_then(Dynamic::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SdkError::InvalidState("the new state has no id".to_string()))
}

impl<P: Provider> ProviderTester<P> {
    pub fn new(provider: P) -> Result<Self> {
        Ok(Self {
            server: ProviderServer::with_config(provider, ServerConfig::new().with_log_level("debug"))?,
            store: StateStore::default(),
            ctx: Context::new(),
        })
    }

    /// Runs every operation under `ctx`, e.g. one with a short deadline.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn server(&self) -> &ProviderServer<P> {
        &self.server
    }

    pub async fn configure(&mut self, config: DynamicValue) -> Result<()> {
        self.server
            .configure(self.ctx.clone(), config)
            .await
            .into_operation_result()
    }

    /// Validates, plans and creates a resource. Returns the stored state.
    pub async fn create(&mut self, type_name: &str, config: DynamicValue) -> Result<DynamicValue> {
        self.server
            .validate_resource_config(self.ctx.clone(), type_name, config.clone())
            .await
            .into_result()?;

        let plan = self
            .server
            .plan_resource_change(type_name, &DynamicValue::null(), &config)?;
        plan.diagnostics.into_result()?;

        let response = self
            .server
            .apply_resource_change(
                self.ctx.clone(),
                type_name,
                DynamicValue::null(),
                plan.planned_state,
                config,
            )
            .await;
        // A create that failed after the remote accepted it still reports an id.
        if response.diagnostics.has_errors() {
            if let Ok(id) = state_id(&response.new_state) {
                self.store.put(&id, &response.new_state)?;
            }
            return Err(SdkError::Diagnostics(response.diagnostics));
        }

        let id = state_id(&response.new_state)?;
        self.store.put(&id, &response.new_state)?;
        Ok(response.new_state)
    }

    /// Refreshes a stored state. Returns `None`, and forgets the state, when the
    /// resource is gone.
    pub async fn read(&mut self, type_name: &str, id: &str) -> Result<Option<DynamicValue>> {
        let current = self.stored(id)?;
        let response = self
            .server
            .read_resource(self.ctx.clone(), type_name, current)
            .await;
        response.diagnostics.into_operation_result()?;

        match response.new_state {
            Some(state) => {
                self.store.put(id, &state)?;
                Ok(Some(state))
            }
            None => {
                self.store.remove(id);
                Ok(None)
            }
        }
    }

    /// Plans and applies `config` against the stored state. Changes that need the
    /// resource replaced are rejected.
    pub async fn update(
        &mut self,
        type_name: &str,
        id: &str,
        config: DynamicValue,
    ) -> Result<DynamicValue> {
        let prior = self.stored(id)?;
        self.server
            .validate_resource_config(self.ctx.clone(), type_name, config.clone())
            .await
            .into_result()?;

        let plan = self.server.plan_resource_change(type_name, &prior, &config)?;
        plan.diagnostics.into_result()?;
        if !plan.requires_replace.is_empty() {
            let paths: Vec<String> = plan.requires_replace.iter().map(ToString::to_string).collect();
            return Err(SdkError::InvalidConfiguration(format!(
                "changing {} requires replacing {}",
                paths.join(", "),
                id
            )));
        }

        let response = self
            .server
            .apply_resource_change(self.ctx.clone(), type_name, prior, plan.planned_state, config)
            .await;
        self.store.put(id, &response.new_state)?;
        response.diagnostics.into_operation_result()?;
        Ok(response.new_state)
    }

    pub async fn delete(&mut self, type_name: &str, id: &str) -> Result<()> {
        let prior = self.stored(id)?;
        let response = self
            .server
            .apply_resource_change(
                self.ctx.clone(),
                type_name,
                prior,
                DynamicValue::null(),
                DynamicValue::null(),
            )
            .await;
        response.diagnostics.into_operation_result()?;
        self.store.remove(id);
        Ok(())
    }

    /// Imports an existing resource into the store.
    pub async fn import(&mut self, type_name: &str, id: &str) -> Result<DynamicValue> {
        let response = self
            .server
            .import_resource_state(self.ctx.clone(), type_name, id)
            .await;
        response.diagnostics.into_operation_result()?;

        let imported = response
            .imported_resources
            .into_iter()
            .next()
            .ok_or_else(|| SdkError::InvalidState(format!("importing {} returned nothing", id)))?;
        let stored_id = state_id(&imported.state)?;
        self.store.put(&stored_id, &imported.state)?;
        Ok(imported.state)
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Result<DynamicValue> {
        let response = self
            .server
            .read_data_source(self.ctx.clone(), type_name, config)
            .await;
        response.diagnostics.into_operation_result()?;
        Ok(response.state)
    }

    /// The stored state of `id`, if any.
    pub fn state(&self, id: &str) -> Result<Option<DynamicValue>> {
        self.store.get(id)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn stored(&self, id: &str) -> Result<DynamicValue> {
        self.store
            .get(id)?
            .ok_or_else(|| SdkError::InvalidState(format!("no state stored for {}", id)))
    }
}
