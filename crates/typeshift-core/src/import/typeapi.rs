use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use super::converter::SchemaConverter;
use super::typeschema::{convert_document, resolve_imports};
use super::{Imported, Importer};
use crate::error::{ConversionError, ImportError};
use crate::model::{Argument, ArgumentLocation, HttpMethod, Operation, Security, Shape, Throw};
use crate::naming::NamingService;
use crate::parse::typeapi::{ArgumentEntry, BodyEntry, OperationEntry};
use crate::parse::{document_from_json, entry};
use crate::resolve::IncludeResolver;

const DEFAULT_THROW_CODE: u16 = 500;

/// Importer for TypeAPI documents: TypeSchema plus operations.
pub struct TypeApiImporter {
    resolver: Arc<dyn IncludeResolver>,
    naming: Arc<dyn NamingService>,
}

impl TypeApiImporter {
    pub fn new(resolver: Arc<dyn IncludeResolver>, naming: Arc<dyn NamingService>) -> Self {
        Self { resolver, naming }
    }
}

#[async_trait]
impl Importer for TypeApiImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let document = document_from_json(text)?;
        let mut converter = SchemaConverter::new(self.naming.as_ref());
        let imports = resolve_imports(&document, self.resolver.as_ref(), &mut converter).await;
        let mut spec = convert_document(&document, imports, &mut converter);

        spec.base_url = document.base_url.clone();
        spec.security = document
            .security
            .as_ref()
            .and_then(|raw| match entry::<Security>(raw) {
                Ok(security) => Some(security),
                Err(e) => {
                    converter.record("security", ConversionError::InvalidArgument(e.to_string()));
                    None
                }
            });

        for (name, raw) in &document.operations {
            match convert_operation(name, raw, &mut converter) {
                Ok(operation) => spec.operations.push(operation),
                Err(error) => converter.record(name.as_str(), error),
            }
        }
        converter.drain_anonymous(&mut spec.types);

        Ok(Imported {
            spec,
            diagnostics: converter.into_diagnostics(),
        })
    }
}

/// A converted argument: a regular binding or the request body.
enum Binding {
    Argument(Argument),
    Body(String, Option<Shape>),
}

fn convert_operation(
    name: &str,
    raw: &Value,
    converter: &mut SchemaConverter<'_>,
) -> Result<Operation, ConversionError> {
    let declared: OperationEntry =
        entry(raw).map_err(|e| ConversionError::InvalidArgument(format!("{name}: {e}")))?;

    let method = match declared.method.as_deref() {
        Some(method) => HttpMethod::parse(method).ok_or_else(|| {
            ConversionError::InvalidArgument(format!("{name}: unknown method `{method}`"))
        })?,
        None => HttpMethod::Get,
    };
    let mut operation = Operation::new(name, method, declared.path.as_deref().unwrap_or("/"));
    operation.description = declared.description.clone().unwrap_or_default();

    if let Some(payload) = &declared.payload {
        if let Some((type_name, shape)) = body(payload, converter)? {
            operation.payload = Some(type_name);
            operation.payload_shape = shape;
        }
    }

    for (arg_name, raw_arg) in &declared.arguments {
        match convert_argument(arg_name, raw_arg, converter) {
            Ok(Binding::Argument(argument)) => operation.arguments.push(argument),
            Ok(Binding::Body(type_name, shape)) => {
                if operation.payload.is_some() {
                    warn!("{name}: dropping body argument `{arg_name}`, payload is already set");
                } else {
                    operation.payload = Some(type_name);
                    operation.payload_shape = shape;
                }
            }
            Err(error) => converter.record(format!("{name}.{arg_name}"), error),
        }
    }

    if let Some(ret) = &declared.return_entry {
        if let Some(code) = ret.code {
            operation.http_code = code;
        }
        if let Some((type_name, shape)) = body(ret, converter)? {
            operation.return_type = Some(type_name);
            operation.return_shape = shape;
        }
    }

    for throw in declared.throws.entries() {
        let Some((type_name, shape)) = body(throw, converter)? else {
            continue;
        };
        operation.throws.push(Throw {
            code: throw.code.unwrap_or(DEFAULT_THROW_CODE),
            type_name,
            type_shape: shape,
        });
    }

    operation.stability = declared.stability;
    operation.security = declared.security.clone();
    operation.authorization = declared.authorization.unwrap_or(false);
    operation.tags = declared.tags.clone();

    Ok(operation)
}

fn convert_argument(
    name: &str,
    raw: &Value,
    converter: &mut SchemaConverter<'_>,
) -> Result<Binding, ConversionError> {
    let argument: ArgumentEntry =
        entry(raw).map_err(|e| ConversionError::InvalidArgument(format!("{name}: {e}")))?;

    let location = match argument.location.as_deref().unwrap_or("query") {
        "path" => ArgumentLocation::Path,
        "query" => ArgumentLocation::Query,
        "header" => ArgumentLocation::Header,
        "body" => ArgumentLocation::Body,
        other => {
            return Err(ConversionError::InvalidArgument(format!(
                "{name}: unsupported location `{other}`"
            )));
        }
    };

    let (type_name, shape) = match (&argument.schema, &argument.content_type) {
        (Some(schema), _) => converter.body_reference(schema)?,
        (None, Some(content_type)) => (content_type.clone(), Some(Shape::Mime)),
        (None, None) => return Err(ConversionError::MissingField(format!("{name}.schema"))),
    };

    if location == ArgumentLocation::Body {
        return Ok(Binding::Body(type_name, shape));
    }
    Ok(Binding::Argument(Argument {
        name: name.to_string(),
        location,
        type_name,
        type_shape: shape,
    }))
}

fn body(
    entry: &BodyEntry,
    converter: &mut SchemaConverter<'_>,
) -> Result<Option<(String, Option<Shape>)>, ConversionError> {
    if let Some(schema) = &entry.schema {
        return converter.body_reference(schema).map(Some);
    }
    Ok(entry
        .content_type
        .as_ref()
        .map(|content_type| (content_type.clone(), Some(Shape::Mime))))
}
