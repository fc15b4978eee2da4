use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::converter::{SchemaConverter, normalize_ref};
use super::names::{operation_id_name, route_to_name};
use super::typeschema::convert_document;
use super::{ImportOptions, Imported, Importer};
use crate::config::NamingStrategy;
use crate::error::{ConversionError, ImportError};
use crate::model::{Argument, ArgumentLocation, HttpMethod, Operation, Shape, Throw};
use crate::naming::NamingService;
use crate::parse::document::Document;
use crate::parse::entry;
use crate::parse::media_type::Body;
use crate::parse::operation::{Operation as OpenApiOperation, PathItem};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::ref_resolve::LocalPointer;
use crate::parse::request_body::RequestBody;
use crate::parse::response::{Response, StatusClass};
use crate::parse::schema::Schema;
use crate::parse::security::{SecurityRequirement, SecurityScheme};
use crate::parse::spec::OpenApiSpec;

/// Stability assigned to operations flagged `deprecated`.
const DEPRECATED_STABILITY: u8 = 0;

/// Importer for OpenAPI 3.x and Swagger 2.0 documents.
pub struct OpenApiImporter {
    naming: Arc<dyn NamingService>,
    options: ImportOptions,
}

impl OpenApiImporter {
    pub fn new(naming: Arc<dyn NamingService>, options: ImportOptions) -> Self {
        Self { naming, options }
    }

    fn operation_name(&self, method: HttpMethod, path: &str, op: &OpenApiOperation) -> String {
        let raw_name = match (self.options.naming_strategy, op.operation_id.as_deref()) {
            (NamingStrategy::UseOperationId, Some(id)) => operation_id_name(id),
            _ => route_to_name(method, path),
        };
        match self.options.aliases.get(&raw_name) {
            Some(alias) => alias.clone(),
            None => raw_name,
        }
    }
}

/// Document-wide state needed while walking `paths`.
struct PathContext<'d> {
    pointer: LocalPointer<'d>,
    swagger: bool,
    global_security: Option<&'d Vec<SecurityRequirement>>,
}

/// A converted parameter: a regular argument or a Swagger body.
enum Param {
    Argument(Argument),
    Body(String, Option<Shape>),
}

#[async_trait]
impl Importer for OpenApiImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let raw: Value = serde_json::from_str(text)?;
        let document: Document = entry(&raw)?;
        let openapi: OpenApiSpec = entry(&raw)?;

        let mut converter = SchemaConverter::new(self.naming.as_ref());
        let mut spec = convert_document(&document, Vec::new(), &mut converter);
        spec.base_url = openapi.base_url();
        spec.security = openapi.security_schemes().find_map(|(name, raw)| {
            match entry::<SecurityScheme>(raw) {
                Ok(scheme) => scheme.to_model(),
                Err(e) => {
                    debug!("skipping security scheme `{name}`: {e}");
                    None
                }
            }
        });

        let context = PathContext {
            pointer: LocalPointer::new(&raw),
            swagger: openapi.is_swagger(),
            global_security: openapi.security.as_ref(),
        };

        for (path, raw_item) in &openapi.paths {
            let item: PathItem = match entry(raw_item) {
                Ok(item) => item,
                Err(e) => {
                    converter.record(path.as_str(), ConversionError::InvalidArgument(e.to_string()));
                    continue;
                }
            };
            for (method, raw_op) in item.operations() {
                match self.convert_operation(path, method, raw_op, &item, &context, &mut converter)
                {
                    Ok(operation) => spec.operations.push(operation),
                    Err(error) => converter.record(format!("{method} {path}"), error),
                }
            }
        }

        // Inline bodies found while walking paths.
        converter.drain_anonymous(&mut spec.types);

        Ok(Imported {
            spec,
            diagnostics: converter.into_diagnostics(),
        })
    }
}

impl OpenApiImporter {
    fn convert_operation(
        &self,
        path: &str,
        method: HttpMethod,
        raw: &Value,
        item: &PathItem,
        context: &PathContext<'_>,
        converter: &mut SchemaConverter<'_>,
    ) -> Result<Operation, ConversionError> {
        let op: OpenApiOperation =
            entry(raw).map_err(|e| ConversionError::InvalidArgument(e.to_string()))?;

        let mut operation = Operation::new(self.operation_name(method, path, &op), method, path);
        operation.description = op
            .summary
            .clone()
            .or_else(|| op.description.clone())
            .unwrap_or_default();
        operation.tags = op.tags.clone();
        if op.deprecated == Some(true) {
            operation.stability = Some(DEPRECATED_STABILITY);
        }
        if let Some(requirements) = op.security.as_ref().or(context.global_security) {
            operation.authorization =
                !requirements.is_empty() && requirements.iter().all(|r| !r.is_empty());
            for scope in requirements.iter().flat_map(|r| r.values().flatten()) {
                if !operation.security.contains(scope) {
                    operation.security.push(scope.clone());
                }
            }
        }

        for raw_param in item.parameters.iter().chain(op.parameters.iter()) {
            match convert_parameter(raw_param, context, converter) {
                Ok(Param::Argument(argument)) => {
                    // Operation parameters override path-level ones.
                    operation
                        .arguments
                        .retain(|a| a.name != argument.name || a.location != argument.location);
                    operation.arguments.push(argument);
                }
                Ok(Param::Body(type_name, shape)) => {
                    operation.payload = Some(type_name);
                    operation.payload_shape = shape;
                }
                Err(error) => converter.record(
                    format!("{}.{}", operation.name, parameter_label(raw_param)),
                    error,
                ),
            }
        }

        if let Some(raw_body) = &op.request_body {
            let payload = context
                .pointer
                .resolve::<RequestBody>(raw_body, "requestBody")
                .and_then(|body| body_type(body.body(), converter));
            match payload {
                Ok(Some((type_name, shape))) => {
                    operation.payload = Some(type_name);
                    operation.payload_shape = shape;
                }
                Ok(None) => {}
                Err(error) => converter.record(format!("{}.requestBody", operation.name), error),
            }
        }

        let mut has_success = false;
        for (code, raw_response) in &op.responses {
            let class = StatusClass::of(code);
            let repeated_success = has_success && matches!(class, StatusClass::Success(_));
            if matches!(class, StatusClass::Other) || repeated_success {
                continue;
            }
            let body = context
                .pointer
                .resolve::<Response>(raw_response, "response")
                .and_then(|response| body_type(response.body(), converter));
            let body = match body {
                Ok(body) => body,
                Err(error) => {
                    converter.record(format!("{}.{code}", operation.name), error);
                    continue;
                }
            };
            match class {
                StatusClass::Success(code) => {
                    has_success = true;
                    operation.http_code = code;
                    if let Some((type_name, shape)) = body {
                        operation.return_type = Some(type_name);
                        operation.return_shape = shape;
                    }
                }
                StatusClass::Error(code) => {
                    if let Some((type_name, type_shape)) = body {
                        operation.throws.push(Throw {
                            code,
                            type_name,
                            type_shape,
                        });
                    }
                }
                StatusClass::Other => {}
            }
        }

        Ok(operation)
    }
}

fn convert_parameter(
    raw: &Value,
    context: &PathContext<'_>,
    converter: &mut SchemaConverter<'_>,
) -> Result<Param, ConversionError> {
    let parameter: Parameter = context.pointer.resolve(raw, "parameter")?;
    let location = match parameter.location {
        ParameterLocation::Path => ArgumentLocation::Path,
        ParameterLocation::Query => ArgumentLocation::Query,
        ParameterLocation::Header if !context.swagger => ArgumentLocation::Header,
        ParameterLocation::Body if context.swagger => {
            let schema = parameter
                .schema
                .as_ref()
                .ok_or_else(|| ConversionError::MissingField(format!("{}.schema", parameter.name)))?;
            let (type_name, shape) = converter.body_reference(schema)?;
            return Ok(Param::Body(type_name, shape));
        }
        other => {
            return Err(ConversionError::InvalidArgument(format!(
                "{}: unsupported location {other:?}",
                parameter.name
            )));
        }
    };

    let schema = parameter
        .effective_schema()
        .ok_or_else(|| ConversionError::MissingField(format!("{}.schema", parameter.name)))?;
    let (type_name, type_shape) = argument_type(&schema, context, converter)?;
    Ok(Param::Argument(Argument {
        name: parameter.name,
        location,
        type_name,
        type_shape,
    }))
}

/// A `$ref` to a scalar schema collapses to the scalar keyword.
fn argument_type(
    schema: &Schema,
    context: &PathContext<'_>,
    converter: &mut SchemaConverter<'_>,
) -> Result<(String, Option<Shape>), ConversionError> {
    let Some(reference) = &schema.ref_path else {
        return converter.body_reference(schema);
    };
    let target = context.pointer.lookup(reference)?;
    let scalar = entry::<Schema>(target)
        .ok()
        .and_then(|target| target.scalar_keyword());
    match scalar {
        Some(scalar) => Ok((scalar.to_string(), None)),
        None => Ok((normalize_ref(reference), None)),
    }
}

fn body_type(
    body: Option<Body<'_>>,
    converter: &mut SchemaConverter<'_>,
) -> Result<Option<(String, Option<Shape>)>, ConversionError> {
    match body {
        None => Ok(None),
        Some(Body::Mime(content_type)) => Ok(Some((content_type.to_string(), Some(Shape::Mime)))),
        Some(Body::Json(schema)) => converter.body_reference(schema).map(Some),
    }
}

fn parameter_label(raw: &Value) -> &str {
    raw.get("name")
        .or_else(|| raw.get("$ref"))
        .and_then(Value::as_str)
        .unwrap_or("parameter")
}
