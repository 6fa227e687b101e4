//! Import helpers for simplifying resource import implementations

use crate::identifier::ResourceId;
use crate::resource::{ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

/// Sets the import ID as the `id` attribute of an otherwise empty state
///
/// This is enough for resources whose read rebuilds everything from the ID.
///
/// Example: ID "/subscriptions/.../connections/c1" -> state.id = "/subscriptions/.../connections/c1"
pub fn import_state_passthrough_id(type_name: &str, id: &str) -> ImportResourceStateResponse {
    let mut response = ImportResourceStateResponse::default();
    let mut state = DynamicValue::new(Dynamic::Map(HashMap::new()));
    let path = AttributePath::new("id");

    if let Err(e) = state.set_string(&path, id.to_string()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!("Could not set attribute '{}' to value '{}'", path, id),
            )
            .with_attribute(path),
        );
        return response;
    }

    response.imported_resources.push(ImportedResource {
        type_name: type_name.to_string(),
        state,
    });
    response
}

/// Like [`import_state_passthrough_id`], but rejects IDs that do not parse as `T`
/// and stores the normalised form.
pub fn import_state_with_id<T: ResourceId>(type_name: &str, id: &str) -> ImportResourceStateResponse {
    match T::parse(id) {
        Ok(parsed) => import_state_passthrough_id(type_name, &parsed.id()),
        Err(e) => {
            let mut response = ImportResourceStateResponse::default();
            response.diagnostics.add_error(
                format!("Invalid import ID for {}", type_name),
                e.to_string(),
            );
            response
        }
    }
}
