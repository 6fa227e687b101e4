//! Planning: defaults, computed values and replacement detection
//!
//! Terraform asks the provider to plan every change before applying it. The framework
//! plans from the schema alone: ForceNew attributes and blocks that change mark the
//! resource for replacement, computed attributes keep their prior value unless configured,
//! and unset computed attributes become unknown on create.

use crate::schema::{Block, Schema};
use crate::types::{AttributePath, Diagnostics, Dynamic, DynamicValue};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub attribute_path: AttributePath,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Diagnostics,
}

/// Adjusts the planned value of one attribute.
pub trait PlanModifier: Send + Sync {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;
}

/// Marks an attribute as requiring replacement when it changes
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = !request.state.is_null()
            && !request.plan.is_unknown()
            && !request.state.semantically_equal(&request.plan);

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Keeps the prior state value of a computed attribute the configuration leaves unset.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match (&request.plan, &request.state) {
            (Dynamic::Unknown | Dynamic::Null, state) if !state.is_null() => state.clone(),
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    pub fn new(predicate: F, description: impl Into<String>) -> Self {
        Self {
            predicate,
            description: description.into(),
        }
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let mut diagnostics = Diagnostics::new();
        let requires_replace = (self.predicate)(&request);

        if requires_replace {
            diagnostics.add_warning(
                format!(
                    "Attribute '{}' requires resource replacement",
                    request.attribute_path
                ),
                self.description.clone(),
            );
        }

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics,
        }
    }
}

/// Outcome of planning one resource change.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

/// Plans the top-level attributes and blocks of a resource.
///
/// A null `proposed` value plans a destroy. A null `prior` value plans a create, where
/// `id` and every unset computed attribute become unknown.
pub fn plan_resource_change(
    schema: &Schema,
    prior: &DynamicValue,
    proposed: &DynamicValue,
) -> PlannedChange {
    let mut diagnostics = Diagnostics::new();
    let mut requires_replace = Vec::new();

    if proposed.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::null(),
            requires_replace,
            diagnostics,
        };
    }

    let creating = prior.is_null();
    let empty = HashMap::new();
    let prior_entries = prior.value.as_map().unwrap_or(&empty);
    let mut planned = proposed.value.as_map().cloned().unwrap_or_default();

    for attribute in &schema.block.attributes {
        let path = AttributePath::new(&attribute.name);
        let state = prior_entries
            .get(&attribute.name)
            .cloned()
            .unwrap_or(Dynamic::Null);
        let mut plan = planned
            .get(&attribute.name)
            .cloned()
            .unwrap_or(Dynamic::Null);

        if plan.is_null() {
            if let Some(default) = &attribute.default {
                plan = default.clone();
            }
        }

        if attribute.computed && plan.is_null() {
            plan = if creating {
                Dynamic::Unknown
            } else {
                UseStateForUnknown
                    .modify_plan(PlanModifyRequest {
                        state: state.clone(),
                        plan: Dynamic::Unknown,
                        config: Dynamic::Null,
                        attribute_path: path.clone(),
                    })
                    .plan_value
            };
        }

        let mut modifiers: Vec<&dyn PlanModifier> =
            attribute.plan_modifiers.iter().map(|m| m.as_ref()).collect();
        if attribute.force_new {
            modifiers.push(&RequiresReplaceIfChanged);
        }

        for modifier in modifiers {
            let response = modifier.modify_plan(PlanModifyRequest {
                state: state.clone(),
                plan: plan.clone(),
                config: proposed.get(&attribute.name).cloned().unwrap_or(Dynamic::Null),
                attribute_path: path.clone(),
            });
            plan = response.plan_value;
            diagnostics.extend(response.diagnostics);
            if response.requires_replace && !creating && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
        }

        planned.insert(attribute.name.clone(), plan);
    }

    for block in &schema.block.block_types {
        let Some(plan) = planned.get(&block.type_name).cloned() else {
            continue;
        };
        let state = prior_entries.get(&block.type_name).unwrap_or(&Dynamic::Null);
        planned.insert(
            block.type_name.clone(),
            plan_block_elements(&block.block, state, &plan, creating),
        );
    }

    if !creating {
        for block in schema.block.block_types.iter().filter(|b| b.force_new) {
            let state = prior_entries.get(&block.type_name).unwrap_or(&Dynamic::Null);
            let plan = planned.get(&block.type_name).unwrap_or(&Dynamic::Null);
            if !plan.is_unknown() && !state.semantically_equal(plan) {
                requires_replace.push(AttributePath::new(&block.type_name));
            }
        }
    }

    if !planned.contains_key("id") || planned.get("id").is_some_and(Dynamic::is_null) {
        let id = prior_entries.get("id").cloned().unwrap_or(Dynamic::Unknown);
        let id = if requires_replace.is_empty() { id } else { Dynamic::Unknown };
        planned.insert("id".to_string(), id);
    }

    PlannedChange {
        planned_state: DynamicValue::new(Dynamic::Map(planned)),
        requires_replace,
        diagnostics,
    }
}

/// Plans each element of a nested block the way top-level attributes are planned: defaults
/// fill unset values, and unset computed values keep the prior element's value at the same
/// index, or become unknown when there is none.
fn plan_block_elements(block: &Block, prior: &Dynamic, planned: &Dynamic, creating: bool) -> Dynamic {
    let Some(elements) = planned.as_list() else {
        return planned.clone();
    };
    let prior_elements = if creating { None } else { prior.as_list() };

    let elements = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let Some(entries) = element.as_map() else {
                return element.clone();
            };
            let prior_entries = prior_elements
                .and_then(|p| p.get(index))
                .and_then(Dynamic::as_map);
            let mut entries = entries.clone();

            for attribute in &block.attributes {
                let mut value = entries.get(&attribute.name).cloned().unwrap_or(Dynamic::Null);
                if value.is_null() {
                    if let Some(default) = &attribute.default {
                        value = default.clone();
                    }
                }
                if attribute.computed && value.is_null() {
                    value = prior_entries
                        .and_then(|p| p.get(&attribute.name))
                        .filter(|v| !v.is_null())
                        .cloned()
                        .unwrap_or(Dynamic::Unknown);
                }
                entries.insert(attribute.name.clone(), value);
            }
            Dynamic::Map(entries)
        })
        .collect();
    Dynamic::List(elements)
}
