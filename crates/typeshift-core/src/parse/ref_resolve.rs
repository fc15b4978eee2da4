use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConversionError;

/// Upper bound on `$ref` chains, so `a -> b -> a` cannot loop forever.
const MAX_REF_DEPTH: usize = 32;

/// Resolves `#/...` JSON pointers against the document they appear in.
///
/// Only local references are supported; anything else is a
/// [`ConversionError::LocalReference`].
pub struct LocalPointer<'a> {
    root: &'a Value,
}

impl<'a> LocalPointer<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Look up the node a `$ref` string points at, following chained refs.
    pub fn lookup(&self, ref_path: &str) -> Result<&'a Value, ConversionError> {
        let mut current = ref_path;
        for _ in 0..MAX_REF_DEPTH {
            let pointer = current
                .strip_prefix('#')
                .filter(|p| p.starts_with('/'))
                .ok_or_else(|| ConversionError::LocalReference(current.to_string()))?;
            let target = self
                .root
                .pointer(pointer)
                .ok_or_else(|| ConversionError::UnresolvableReference(current.to_string()))?;
            match target.get("$ref").and_then(Value::as_str) {
                Some(next) => current = next,
                None => return Ok(target),
            }
        }
        Err(ConversionError::UnresolvableReference(ref_path.to_string()))
    }

    /// Follow `value` if it is a `{"$ref": ...}` node, otherwise return it as is.
    pub fn follow<'v>(&self, value: &'v Value) -> Result<&'v Value, ConversionError>
    where
        'a: 'v,
    {
        match value.get("$ref").and_then(Value::as_str) {
            Some(ref_path) => self.lookup(ref_path),
            None => Ok(value),
        }
    }

    /// Follow `value` and deserialize the target.
    pub fn resolve<T: DeserializeOwned>(
        &self,
        value: &Value,
        what: &str,
    ) -> Result<T, ConversionError> {
        let target = self.follow(value)?;
        serde_json::from_value(target.clone())
            .map_err(|e| ConversionError::InvalidArgument(format!("{what}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_pointer() {
        let doc = json!({"components": {"parameters": {"Id": {"name": "id", "in": "path"}}}});
        let pointer = LocalPointer::new(&doc);
        let param = pointer.lookup("#/components/parameters/Id").unwrap();
        assert_eq!(param["name"], "id");
    }

    #[test]
    fn follows_chained_refs() {
        let doc = json!({
            "components": {
                "responses": {
                    "Alias": {"$ref": "#/components/responses/Real"},
                    "Real": {"description": "ok"}
                }
            }
        });
        let pointer = LocalPointer::new(&doc);
        let node = json!({"$ref": "#/components/responses/Alias"});
        assert_eq!(pointer.follow(&node).unwrap()["description"], "ok");
    }

    #[test]
    fn rejects_external_refs() {
        let doc = json!({});
        let err = LocalPointer::new(&doc)
            .lookup("other.json#/definitions/Pet")
            .unwrap_err();
        assert_eq!(
            err,
            ConversionError::LocalReference("other.json#/definitions/Pet".to_string())
        );
    }

    #[test]
    fn missing_target_is_unresolvable() {
        let doc = json!({"definitions": {}});
        let err = LocalPointer::new(&doc).lookup("#/definitions/Nope").unwrap_err();
        assert!(matches!(err, ConversionError::UnresolvableReference(_)));
    }

    #[test]
    fn ref_cycles_terminate() {
        let doc = json!({"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}});
        let err = LocalPointer::new(&doc).lookup("#/a").unwrap_err();
        assert!(matches!(err, ConversionError::UnresolvableReference(_)));
    }
}
