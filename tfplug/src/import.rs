//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// This is useful for resources where the import ID maps directly to a single
/// attribute in the resource state; a subsequent read fills in the rest.
///
/// Example: ID "o_1234567890" -> state.id = "o_1234567890"
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    if request.id.trim().is_empty() {
        response.diagnostics.push(
            Diagnostic::error(
                "Invalid import ID",
                "The import ID must be the identifier of an existing object",
            )
            .with_attribute(attr_path),
        );
        return;
    }

    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> ImportResourceStateRequest {
        ImportResourceStateRequest {
            type_name: "boundary_user".to_string(),
            id: id.to_string(),
        }
    }

    fn empty_response() -> ImportResourceStateResponse {
        ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        }
    }

    #[test]
    fn passthrough_sets_id() {
        let mut response = empty_response();
        import_state_passthrough_id(
            &Context::new(),
            AttributePath::new("id"),
            &request("u_1234567890"),
            &mut response,
        );

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.imported_resources.len(), 1);
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "u_1234567890"
        );
    }

    #[test]
    fn passthrough_rejects_blank_id() {
        let mut response = empty_response();
        import_state_passthrough_id(
            &Context::new(),
            AttributePath::new("id"),
            &request("  "),
            &mut response,
        );

        assert!(response.imported_resources.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
    }
}
