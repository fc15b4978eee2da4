use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::Security;

/// A security scheme type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecuritySchemeType {
    ApiKey,
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    OpenIdConnect,
    #[serde(rename = "mutualTLS")]
    MutualTls,
    /// Swagger 2.0 basic authentication.
    Basic,
}

/// OAuth2 flows configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OAuthFlows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(rename = "clientCredentials", default, skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(rename = "authorizationCode", default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    /// The first configured flow, most specific first.
    pub fn primary(&self) -> Option<&OAuthFlow> {
        self.authorization_code
            .as_ref()
            .or(self.client_credentials.as_ref())
            .or(self.password.as_ref())
            .or(self.implicit.as_ref())
    }
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl", default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(rename = "tokenUrl", default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,

    // Swagger 2.0 keeps a single flow on the scheme itself.
    #[serde(rename = "authorizationUrl", default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,

    #[serde(rename = "tokenUrl", default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub scopes: IndexMap<String, String>,
}

impl SecurityScheme {
    /// Map onto the model's security descriptor. Schemes the model can not
    /// express (OpenID Connect, mutual TLS, unknown HTTP schemes) yield `None`.
    pub fn to_model(&self) -> Option<Security> {
        match self.scheme_type {
            SecuritySchemeType::Basic => Some(Security::HttpBasic),
            SecuritySchemeType::Http => match self.scheme.as_deref()?.to_ascii_lowercase().as_str()
            {
                "basic" => Some(Security::HttpBasic),
                "bearer" => Some(Security::HttpBearer),
                _ => None,
            },
            SecuritySchemeType::ApiKey => Some(Security::ApiKey {
                name: self.name.clone()?,
                location: self.location.clone().unwrap_or_else(|| "header".to_string()),
            }),
            SecuritySchemeType::OAuth2 => {
                let flow = self.flows.as_ref().and_then(OAuthFlows::primary);
                let (token_url, authorization_url, scopes) = match flow {
                    Some(flow) => (
                        flow.token_url.clone(),
                        flow.authorization_url.clone(),
                        flow.scopes.keys().cloned().collect(),
                    ),
                    None => (
                        self.token_url.clone(),
                        self.authorization_url.clone(),
                        self.scopes.keys().cloned().collect(),
                    ),
                };
                Some(Security::OAuth2 {
                    token_url,
                    authorization_url,
                    scopes,
                })
            }
            SecuritySchemeType::OpenIdConnect | SecuritySchemeType::MutualTls => None,
        }
    }
}

/// A security requirement: map of scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;
