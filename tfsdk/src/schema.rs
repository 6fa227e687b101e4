//! Schema types and builders for tfsdk
//!
//! This module provides the schema system for defining resource and data source
//! schemas: attribute types, mutability classes, nested blocks and validation.

use crate::plan::PlanModifier;
use crate::types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue};
use crate::validator::Validator;
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(element), Dynamic::List(items))
            | (AttributeType::Set(element), Dynamic::List(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            (AttributeType::Map(element), Dynamic::Map(entries)) => {
                entries.values().all(|entry| element.accepts(entry))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => {
                entries.iter().all(|(name, entry)| {
                    fields
                        .get(name)
                        .is_some_and(|field_type| field_type.accepts(entry))
                })
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Bool => "bool",
            AttributeType::List(_) => "list",
            AttributeType::Set(_) => "set",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
        }
    }
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value replaces the resource instead of updating it in place.
    pub force_new: bool,
    /// Planned when the configuration leaves the attribute unset.
    pub default: Option<Dynamic>,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl Attribute {
    /// Computed and not settable from configuration.
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

// Manual Debug implementation since validators/modifiers don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("default", &self.default)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .finish()
    }
}

/// NestedBlock represents a nested configuration block
///
/// A singleton block is a list block with `max_items == 1`; its value is a list holding
/// at most one object.
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: usize,
    /// Zero means unbounded.
    pub max_items: usize,
    pub force_new: bool,
}

impl NestedBlock {
    pub fn list(type_name: &str, block: Block) -> Self {
        Self {
            type_name: type_name.to_string(),
            block,
            nesting: NestingMode::List,
            min_items: 0,
            max_items: 0,
            force_new: false,
        }
    }

    pub fn single(type_name: &str, block: Block) -> Self {
        Self::list(type_name, block).max_items(1)
    }

    pub fn min_items(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn required(self) -> Self {
        self.min_items(1)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    List,
    Set,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block.block_types.iter().find(|b| b.type_name == name)
    }

    /// Attributes the user can set.
    pub fn arguments(&self) -> impl Iterator<Item = &Attribute> {
        self.block.attributes.iter().filter(|a| !a.is_read_only())
    }

    /// Attributes only the provider sets.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.block.attributes.iter().filter(|a| a.is_read_only())
    }

    /// Names of top-level attributes and blocks that are computed only.
    pub fn read_only_names(&self) -> Vec<&str> {
        self.attributes().map(|a| a.name.as_str()).collect()
    }

    /// Validates a configuration or planned value against the schema.
    /// Unknown values and computed-only attributes are skipped.
    pub fn validate(&self, config: &DynamicValue) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        validate_block(&self.block, &config.value, &AttributePath::root(), &mut diagnostics);
        diagnostics
    }
}

fn validate_block(
    block: &Block,
    value: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) {
    let empty = HashMap::new();
    let entries = match value {
        Dynamic::Map(entries) => entries,
        Dynamic::Unknown => return,
        _ => &empty,
    };

    for attribute in &block.attributes {
        if attribute.is_read_only() {
            continue;
        }

        let attribute_path = path.clone().attribute(&attribute.name);
        let value = entries.get(&attribute.name).unwrap_or(&Dynamic::Null);

        match value {
            Dynamic::Unknown => continue,
            Dynamic::Null => {
                if attribute.required {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            format!(
                                "The argument \"{}\" is required, but no definition was found.",
                                attribute_path
                            ),
                        )
                        .with_attribute(attribute_path),
                    );
                }
                continue;
            }
            _ => {}
        }

        if !attribute.r#type.accepts(value) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "{} must be a {}, got {}",
                        attribute_path,
                        attribute.r#type.name(),
                        value.type_name()
                    ),
                )
                .with_attribute(attribute_path),
            );
            continue;
        }

        for validator in &attribute.validators {
            validator.validate(value, &attribute_path, diagnostics);
        }
    }

    for nested in &block.block_types {
        let block_path = path.clone().attribute(&nested.type_name);
        let items: &[Dynamic] = match entries.get(&nested.type_name) {
            Some(Dynamic::Unknown) => continue,
            Some(Dynamic::List(items)) => items,
            _ => &[],
        };

        if items.len() < nested.min_items {
            diagnostics.push(
                Diagnostic::error(
                    format!("Insufficient {} blocks", nested.type_name),
                    format!(
                        "At least {} \"{}\" blocks are required.",
                        nested.min_items, nested.type_name
                    ),
                )
                .with_attribute(block_path.clone()),
            );
        }
        if nested.max_items > 0 && items.len() > nested.max_items {
            diagnostics.push(
                Diagnostic::error(
                    format!("Too many {} blocks", nested.type_name),
                    format!(
                        "No more than {} \"{}\" blocks are allowed",
                        nested.max_items, nested.type_name
                    ),
                )
                .with_attribute(block_path.clone()),
            );
        }

        for (idx, item) in items.iter().enumerate() {
            validate_block(
                &nested.block,
                item,
                &block_path.clone().index(idx as i64),
                diagnostics,
            );
        }
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                default: None,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Dynamic>) -> Self {
        self.attribute.default = Some(value.into());
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// BlockBuilder builds the body of a nested block
#[derive(Default)]
pub struct BlockBuilder {
    block: Block,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Block {
        self.block
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::default(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
