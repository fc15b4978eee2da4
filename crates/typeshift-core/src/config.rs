use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::import::{Dialect, ImportOptions};
use crate::naming::MAX_HASH_LENGTH;

/// Project configuration loaded from `.typeshift.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypeshiftConfig {
    pub input: String,
    /// Dialect of `input`; guessed from the file name when absent.
    pub dialect: Option<Dialect>,
    /// Where exports are written; stdout when absent.
    pub output: Option<String>,
    pub format: OutputFormat,
    pub naming: NamingConfig,
    pub resolver: ResolverConfig,
}

impl Default for TypeshiftConfig {
    fn default() -> Self {
        Self {
            input: "typeapi.json".to_string(),
            dialect: None,
            output: None,
            format: OutputFormat::Json,
            naming: NamingConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl TypeshiftConfig {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            naming_strategy: self.naming.strategy,
            aliases: self.naming.aliases.clone(),
            hash_length: self.naming.hash_length,
            remote_format: self.resolver.remote_format,
        }
    }
}

/// Serialization of command output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Naming of operations and synthesized types.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Length of the hash in `Object_<hash>`/`Type_<hash>` names (8 to 12).
    pub hash_length: usize,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::UseOperationId,
            hash_length: MAX_HASH_LENGTH,
            aliases: IndexMap::new(),
        }
    }
}

/// How OpenAPI operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Include resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Dialect requested from the document service for `typehub://` includes.
    pub remote_format: Dialect,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_format: Dialect::TypeApi,
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".typeshift.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<TypeshiftConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: TypeshiftConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# typeshift configuration
input: typeapi.json
# dialect: openapi-yaml   # internal | typeapi | typeschema | openapi-json | openapi-yaml
                          # jsonschema-json | jsonschema-yaml | raw-json | raw-yaml
# output: typeapi.out.json
format: json              # json | yaml

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  hash_length: 12             # 8..12 characters in Object_<hash> / Type_<hash>
  aliases: {}
    # pets/list: listPets     # operation name → custom name

resolver:
  remote_format: typeapi  # dialect requested for typehub:// includes
"#
}
