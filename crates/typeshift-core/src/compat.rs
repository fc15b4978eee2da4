//! Migration of specifications saved by older versions of the model.

use log::{debug, warn};

use crate::model::{ArgumentLocation, Specification};

/// Bring a persisted specification up to the current model.
///
/// * `body` arguments are removed from every operation; the first one becomes
///   the payload unless the operation already has one.
/// * a `root` index past the end of `types` is dropped.
pub fn normalize(mut spec: Specification) -> Specification {
    for operation in &mut spec.operations {
        let (bodies, arguments): (Vec<_>, Vec<_>) = std::mem::take(&mut operation.arguments)
            .into_iter()
            .partition(|a| a.location == ArgumentLocation::Body);
        operation.arguments = arguments;

        let mut bodies = bodies.into_iter();
        if operation.payload.is_none() {
            if let Some(body) = bodies.next() {
                debug!("{}: folding body argument `{}` into payload", operation.name, body.name);
                operation.payload = Some(body.type_name);
                operation.payload_shape = None;
            }
        }
        for extra in bodies {
            warn!("{}: dropping body argument `{}`", operation.name, extra.name);
        }
    }

    if spec.root.is_some_and(|root| root >= spec.types.len()) {
        warn!("dropping root index past the end of types");
        spec.root = None;
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, HttpMethod, Operation, Shape, Type, TypeKind};

    fn argument(name: &str, location: ArgumentLocation, type_name: &str) -> Argument {
        Argument {
            name: name.to_string(),
            location,
            type_name: type_name.to_string(),
            type_shape: Some(Shape::Array),
        }
    }

    #[test]
    fn folds_first_body_argument() {
        let mut op = Operation::new("create", HttpMethod::Post, "/pets");
        op.arguments = vec![
            argument("id", ArgumentLocation::Query, "string"),
            argument("pet", ArgumentLocation::Body, "Pet"),
            argument("other", ArgumentLocation::Body, "Other"),
        ];
        let spec = normalize(Specification {
            operations: vec![op],
            ..Specification::default()
        });

        let op = &spec.operations[0];
        assert_eq!(op.payload.as_deref(), Some("Pet"));
        assert_eq!(op.payload_shape, None);
        assert_eq!(op.arguments.len(), 1);
        assert_eq!(op.arguments[0].name, "id");
    }

    #[test]
    fn existing_payload_is_kept() {
        let mut op = Operation::new("upload", HttpMethod::Put, "/file");
        op.payload = Some("application/pdf".to_string());
        op.payload_shape = Some(Shape::Mime);
        op.arguments = vec![argument("file", ArgumentLocation::Body, "string")];
        let spec = normalize(Specification {
            operations: vec![op],
            ..Specification::default()
        });

        let op = &spec.operations[0];
        assert_eq!(op.payload.as_deref(), Some("application/pdf"));
        assert_eq!(op.payload_shape, Some(Shape::Mime));
        assert!(op.arguments.is_empty());
    }

    #[test]
    fn out_of_range_root_is_cleared() {
        let spec = normalize(Specification {
            types: vec![Type::new("A", TypeKind::Struct)],
            root: Some(3),
            ..Specification::default()
        });
        assert_eq!(spec.root, None);

        let spec = normalize(Specification {
            types: vec![Type::new("A", TypeKind::Struct)],
            root: Some(0),
            ..Specification::default()
        });
        assert_eq!(spec.root, Some(0));
    }
}
