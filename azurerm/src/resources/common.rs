//! Attributes and helpers every ARM resource shares

use std::collections::HashMap;
use tfsdk::schema::Attribute;
use tfsdk::validator::Validator;
use tfsdk::{AttributeBuilder, AttributeType, RemoteError, SdkError};

use crate::api::ArmClient;
use crate::ids::normalize_location;
use crate::provider_data::AzureRmProviderData;
use crate::validate;

pub fn string_map() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

pub fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

pub fn id_attribute() -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description("The ID of the resource")
        .computed()
        .build()
}

pub fn name_attribute(description: &str, validator: impl Validator + 'static) -> Attribute {
    AttributeBuilder::new("name", AttributeType::String)
        .description(description)
        .required()
        .force_new()
        .validator(validator)
        .build()
}

pub fn resource_group_name_attribute() -> Attribute {
    AttributeBuilder::new("resource_group_name", AttributeType::String)
        .description("The name of the resource group the resource lives in")
        .required()
        .force_new()
        .validator(validate::resource_group_name())
        .build()
}

pub fn location_attribute() -> Attribute {
    AttributeBuilder::new("location", AttributeType::String)
        .description("The Azure region of the resource")
        .required()
        .force_new()
        .validator(tfsdk::validator::StringIsNotEmptyValidator)
        .plan_modifier(validate::NormalizedLocation)
        .build()
}

pub fn tags_attribute() -> Attribute {
    AttributeBuilder::new("tags", string_map())
        .description("Tags assigned to the resource")
        .optional()
        .build()
}

/// Computed `name` and `location` of data sources, which look resources up by name.
pub fn computed_location_attribute() -> Attribute {
    AttributeBuilder::new("location", AttributeType::String)
        .description("The Azure region of the resource")
        .computed()
        .build()
}

pub fn computed_tags_attribute() -> Attribute {
    AttributeBuilder::new("tags", string_map())
        .description("Tags assigned to the resource")
        .computed()
        .build()
}

/// Tags are always sent: an empty map clears them.
pub fn expand_tags(tags: &HashMap<String, String>) -> Option<HashMap<String, String>> {
    Some(tags.clone())
}

pub fn flatten_location(location: Option<&str>) -> String {
    location.map(normalize_location).unwrap_or_default()
}

/// The provider data a resource received in configure.
pub fn provider(data: &Option<AzureRmProviderData>) -> tfsdk::Result<&AzureRmProviderData> {
    data.as_ref().ok_or(SdkError::ProviderNotConfigured)
}

/// The ARM client for a remote call.
pub fn client(data: &Option<AzureRmProviderData>) -> Result<&ArmClient, RemoteError> {
    data.as_ref()
        .map(|d| &d.client)
        .ok_or_else(|| RemoteError::failed(SdkError::ProviderNotConfigured))
}
