//! Explicit registry of the resource and data source types a provider serves
//!
//! The provider registers a factory per type once at startup; the server instantiates a
//! fresh resource from it for every call. The registry is never mutated after startup.

use crate::data_source::DataSource;
use crate::error::{Result, SdkError};
use crate::resource::Resource;
use crate::schema::Schema;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ResourceFactory = Arc<dyn Fn() -> Box<dyn Resource> + Send + Sync>;
pub type DataSourceFactory = Arc<dyn Fn() -> Box<dyn DataSource> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    resources: BTreeMap<String, ResourceFactory>,
    data_sources: BTreeMap<String, DataSourceFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource type under the name its instances report.
    pub fn register_resource<F>(&mut self, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
    {
        let type_name = factory().type_name().to_string();
        if self.resources.contains_key(&type_name) {
            return Err(SdkError::InvalidConfiguration(format!(
                "resource type {} is registered twice",
                type_name
            )));
        }
        tracing::debug!(type_name = %type_name, "registered resource");
        self.resources.insert(type_name, Arc::new(factory));
        Ok(())
    }

    pub fn register_data_source<F>(&mut self, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn DataSource> + Send + Sync + 'static,
    {
        let type_name = factory().type_name().to_string();
        if self.data_sources.contains_key(&type_name) {
            return Err(SdkError::InvalidConfiguration(format!(
                "data source type {} is registered twice",
                type_name
            )));
        }
        tracing::debug!(type_name = %type_name, "registered data source");
        self.data_sources.insert(type_name, Arc::new(factory));
        Ok(())
    }

    /// A new, unconfigured instance of the resource type.
    pub fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>> {
        self.resources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| SdkError::ResourceNotFound(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>> {
        self.data_sources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| SdkError::DataSourceNotFound(type_name.to_string()))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    pub fn resource_schemas(&self) -> BTreeMap<String, Schema> {
        self.resources
            .iter()
            .map(|(name, factory)| (name.clone(), factory().schema()))
            .collect()
    }

    pub fn data_source_schemas(&self) -> BTreeMap<String, Schema> {
        self.data_sources
            .iter()
            .map(|(name, factory)| (name.clone(), factory().schema()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::data_source::{
        ConfigureDataSourceRequest, ConfigureDataSourceResponse, ReadDataSourceRequest,
        ReadDataSourceResponse,
    };
    use crate::schema::SchemaBuilder;
    use crate::types::{Diagnostics, DynamicValue};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl DataSource for Named {
        fn type_name(&self) -> &str {
            self.0
        }

        fn schema(&self) -> Schema {
            SchemaBuilder::new().description(self.0).build()
        }

        async fn configure(
            &mut self,
            _ctx: Context,
            _request: ConfigureDataSourceRequest,
        ) -> ConfigureDataSourceResponse {
            ConfigureDataSourceResponse::default()
        }

        async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
            ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: Diagnostics::new(),
            }
        }
    }

    #[test]
    fn registers_under_the_reported_type_name() {
        let mut registry = Registry::new();
        registry
            .register_data_source(|| Box::new(Named("azurerm_b")))
            .unwrap();
        registry
            .register_data_source(|| Box::new(Named("azurerm_a")))
            .unwrap();

        let types: Vec<&str> = registry.data_source_types().collect();
        assert_eq!(types, vec!["azurerm_a", "azurerm_b"]);
        assert_eq!(registry.data_source("azurerm_a").unwrap().type_name(), "azurerm_a");
        assert_eq!(
            registry.data_source_schemas()["azurerm_b"].block.description,
            "azurerm_b"
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register_data_source(|| Box::new(Named("azurerm_a")))
            .unwrap();

        let err = registry
            .register_data_source(|| Box::new(Named("azurerm_a")))
            .unwrap_err();

        assert!(matches!(err, SdkError::InvalidConfiguration(_)));
    }

    #[test]
    fn unknown_types_are_errors() {
        let registry = Registry::new();

        assert!(matches!(
            registry.resource("azurerm_missing"),
            Err(SdkError::ResourceNotFound(_))
        ));
        assert!(matches!(
            registry.data_source("azurerm_missing"),
            Err(SdkError::DataSourceNotFound(_))
        ));
    }
}
