use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operations::{Operation, Shape};
use super::schemas::{Type, TypeKind};
use super::security::Security;
use super::{GENERIC_PARAMETER, is_scalar};

/// A document hosted by the remote document service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub user: String,
    pub name: String,
}

/// One external dependency of a specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Include {
    pub alias: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Resolved external types; `None` until resolution succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<Type>>,
}

impl Include {
    pub fn from_url(alias: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The URL to resolve this include from, if the locator is complete.
    pub fn locator(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        match (&self.document, self.version.as_deref()) {
            (Some(doc), Some(version)) if !version.is_empty() => Some(format!(
                "typehub://{}:{}@{}",
                doc.user, doc.name, version
            )),
            _ => None,
        }
    }
}

/// The canonical, dialect-neutral specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    #[serde(default)]
    pub imports: Vec<Include>,

    #[serde(default)]
    pub operations: Vec<Operation>,

    #[serde(default)]
    pub types: Vec<Type>,

    /// Index into `types` of the entry type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

/// A reference that does not resolve to anything known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Where the reference was found, e.g. `Pet.owner` or `operation getPet`.
    pub location: String,
    pub reference: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: `{}`", self.location, self.reference)
    }
}

impl Specification {
    pub fn find_type(&self, name: &str) -> Option<(usize, &Type)> {
        self.types.iter().enumerate().find(|(_, t)| t.name == name)
    }

    pub fn root_type(&self) -> Option<&Type> {
        self.root.and_then(|i| self.types.get(i))
    }

    pub fn find_operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Whether `name` resolves to a scalar, the generic marker, a local type or
    /// a type of a resolved include. Includes that are not resolved yet can not
    /// be checked and are assumed to resolve.
    pub fn resolves(&self, name: &str) -> bool {
        if is_scalar(name) || name == GENERIC_PARAMETER {
            return true;
        }
        if self.find_type(name).is_some() {
            return true;
        }
        let Some((namespace, local)) = name.split_once(':') else {
            return false;
        };
        self.imports
            .iter()
            .find(|include| include.alias == namespace)
            .is_some_and(|include| match &include.types {
                Some(types) => types.iter().any(|t| t.name == local),
                None => true,
            })
    }

    /// Collect every reference that violates the resolution invariant.
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let mut out = Vec::new();
        let mut check = |location: String, reference: &str| {
            if !self.resolves(reference) {
                out.push(UnresolvedReference {
                    location,
                    reference: reference.to_string(),
                });
            }
        };

        for ty in &self.types {
            let templates: Vec<&str> = ty.template.keys().map(String::as_str).collect();
            if let Some(reference) = ty.reference.as_deref() {
                if !templates.contains(&reference) {
                    check(ty.name.clone(), reference);
                }
            }
            if let Some(parent) = ty.parent.as_deref() {
                check(format!("{} parent", ty.name), parent);
            }
            for target in ty.template.values() {
                check(format!("{} template", ty.name), target);
            }
            for child in ty.mapping.keys() {
                check(format!("{} mapping", ty.name), child);
            }
            for prop in &ty.properties {
                for reference in prop.referenced_names() {
                    if templates.contains(&reference) {
                        continue;
                    }
                    check(format!("{}.{}", ty.name, prop.name), reference);
                }
            }
        }

        for op in &self.operations {
            for arg in &op.arguments {
                check(format!("{} argument {}", op.name, arg.name), &arg.type_name);
            }
            if let Some(payload) = op.payload.as_deref() {
                if op.payload_shape != Some(Shape::Mime) {
                    check(format!("{} payload", op.name), payload);
                }
            }
            if let Some(ret) = op.return_type.as_deref() {
                if op.return_shape != Some(Shape::Mime) {
                    check(format!("{} return", op.name), ret);
                }
            }
            for throw in &op.throws {
                if throw.type_shape != Some(Shape::Mime) {
                    check(format!("{} throw {}", op.name, throw.code), &throw.type_name);
                }
            }
        }

        out
    }

    /// Rebuild the discriminator mapping of every struct from its children.
    ///
    /// A child marked `base` contributes the keys of its own children instead
    /// of its name, all the way down. Known discriminator values are kept; new
    /// children map to `""`.
    pub fn refresh_mappings(&mut self) {
        let updates: Vec<(usize, IndexMap<String, String>)> = self
            .types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TypeKind::Struct && t.discriminator.is_some())
            .map(|(i, parent)| {
                let mut mapping = IndexMap::new();
                for child in self.children_of(&parent.name) {
                    let mut seen = vec![parent.name.clone()];
                    for (key, known) in self.mapping_entries(child, &mut seen) {
                        let value = parent.mapping.get(&key).cloned().or(known);
                        mapping.insert(key, value.unwrap_or_default());
                    }
                }
                (i, mapping)
            })
            .collect();

        for (i, mapping) in updates {
            self.types[i].mapping = mapping;
        }
    }

    /// Mapping keys a child adds to its parent, with any value already known
    /// for them.
    fn mapping_entries(
        &self,
        child: &Type,
        seen: &mut Vec<String>,
    ) -> Vec<(String, Option<String>)> {
        if !child.base {
            return vec![(child.name.clone(), None)];
        }
        if seen.contains(&child.name) {
            return Vec::new();
        }
        seen.push(child.name.clone());

        let mut entries: IndexMap<String, Option<String>> = IndexMap::new();
        for grandchild in self.children_of(&child.name) {
            for (key, known) in self.mapping_entries(grandchild, seen) {
                let known = child.mapping.get(&key).cloned().or(known);
                entries.entry(key).or_insert(known);
            }
        }
        for (key, value) in &child.mapping {
            entries
                .entry(key.clone())
                .or_insert_with(|| Some(value.clone()));
        }
        entries.into_iter().collect()
    }

    fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Type> + 'a {
        self.types
            .iter()
            .filter(move |t| t.kind == TypeKind::Struct && t.parent.as_deref() == Some(parent))
    }
}
