//! Per-operation view of a resource's declarative state
//!
//! `ResourceMetaData` is what a lifecycle operation sees of the state store: the prior
//! state, the planned state, and the state it produces. It is created fresh for each call.

use crate::error::{Result, SdkError};
use crate::schema::Schema;
use crate::types::{Dynamic, DynamicValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;

/// Top-level fields whose planned value differs from the prior state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changed: BTreeSet<String>,
}

impl ChangeSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            changed: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceMetaData {
    resource_type: String,
    prior_state: DynamicValue,
    planned_state: DynamicValue,
    new_state: Option<DynamicValue>,
    id: Option<String>,
    gone: bool,
}

impl ResourceMetaData {
    pub fn new(
        resource_type: impl Into<String>,
        prior_state: DynamicValue,
        planned_state: DynamicValue,
    ) -> Self {
        let id = planned_state
            .get("id")
            .or_else(|| prior_state.get("id"))
            .and_then(Dynamic::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            resource_type: resource_type.into(),
            prior_state,
            planned_state,
            new_state: None,
            id,
            gone: false,
        }
    }

    /// Metadata for a create: no prior state.
    pub fn for_create(resource_type: impl Into<String>, planned_state: DynamicValue) -> Self {
        Self::new(resource_type, DynamicValue::null(), planned_state)
    }

    /// Metadata for a read or delete: only the prior state.
    pub fn for_state(resource_type: impl Into<String>, state: DynamicValue) -> Self {
        Self::new(resource_type, state, DynamicValue::null())
    }

    /// Metadata for a data source read: the configuration is the planned state.
    pub fn for_data_source(resource_type: impl Into<String>, config: DynamicValue) -> Self {
        Self::new(resource_type, DynamicValue::null(), config)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Decodes the planned state when there is one, the prior state otherwise.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if self.planned_state.is_null() {
            self.prior_state.to_model()
        } else {
            self.planned_state.to_model()
        }
    }

    /// Decodes the prior state.
    pub fn decode_prior<T: DeserializeOwned>(&self) -> Result<T> {
        self.prior_state.to_model()
    }

    /// Records `model` as the new state, with the current id.
    pub fn encode<T: Serialize>(&mut self, model: &T) -> Result<()> {
        let mut state = DynamicValue::from_model(model)?;
        let Dynamic::Map(entries) = &mut state.value else {
            return Err(SdkError::EncodingError(format!(
                "the model of {} must encode to an object",
                self.resource_type
            )));
        };
        let id = self.id.clone().map(Dynamic::String).unwrap_or(Dynamic::Null);
        entries.insert("id".to_string(), id);
        self.new_state = Some(state);
        Ok(())
    }

    /// Marks the resource as removed remotely; it will be dropped from state.
    pub fn mark_as_gone(&mut self, id: impl std::fmt::Display) {
        tracing::info!(resource_type = %self.resource_type, id = %id, "resource was not found, removing from state");
        self.gone = true;
        self.new_state = None;
    }

    pub fn is_gone(&self) -> bool {
        self.gone
    }

    /// The error returned when Create finds the resource already exists.
    pub fn resource_requires_import(&self, id: impl std::fmt::Display) -> SdkError {
        SdkError::RequiresImport {
            resource_type: self.resource_type.clone(),
            id: id.to_string(),
        }
    }

    pub fn has_change(&self, name: &str) -> bool {
        let prior = self.prior_state.get(name).unwrap_or(&Dynamic::Null);
        let planned = self.planned_state.get(name).unwrap_or(&Dynamic::Null);
        !planned.is_unknown() && !prior.semantically_equal(planned)
    }

    /// The set of changed user-settable fields, skipping `id`, computed-only attributes
    /// and values not yet known.
    pub fn changes(&self, schema: &Schema) -> ChangeSet {
        let read_only = schema.read_only_names();
        let names = schema
            .block
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .chain(schema.block.block_types.iter().map(|b| b.type_name.as_str()))
            .filter(|name| *name != "id" && !read_only.contains(name))
            .filter(|name| self.has_change(name));
        ChangeSet::from_names(names)
    }

    pub fn prior_state(&self) -> &DynamicValue {
        &self.prior_state
    }

    pub fn planned_state(&self) -> &DynamicValue {
        &self.planned_state
    }

    /// The state produced by the operation; `None` when nothing was encoded or the resource is gone.
    pub fn new_state(&self) -> Option<&DynamicValue> {
        self.new_state.as_ref()
    }

    pub fn into_new_state(self) -> Option<DynamicValue> {
        self.new_state
    }
}
