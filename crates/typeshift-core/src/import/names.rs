use heck::ToPascalCase;

use crate::model::HttpMethod;

/// Operation name from an `operationId`: path separators become dots.
pub fn operation_id_name(operation_id: &str) -> String {
    operation_id.replace('/', ".")
}

/// Derive a PascalCase operation name from path + HTTP method.
///
/// Examples:
/// - `GET /pets` → `PetsGet`
/// - `GET /pets/{petId}` → `PetsPetIdGet`
/// - `POST /store/order` → `StoreOrderPost`
/// - `GET /` → `Get`
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let mut name: String = path
        .split('/')
        .map(|segment| segment.trim_start_matches('{').trim_end_matches('}'))
        .filter(|segment| !segment.is_empty())
        .map(|segment| sanitize_identifier(segment).to_pascal_case())
        .collect();
    name.push_str(&method.as_str().to_pascal_case());
    name
}

/// PascalCase type name from a free-form title, `Root` when nothing is left.
pub fn type_name(title: &str) -> String {
    let name = sanitize_identifier(title).to_pascal_case();
    if name.is_empty() {
        "Root".to_string()
    } else {
        name
    }
}

/// Replace every run of non-alphanumeric characters with one underscore.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}
