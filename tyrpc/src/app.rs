//! Application definitions.
//!
//! An [`AppDefinition`] bundles the procedure map, the model arena and the
//! shared error schema. It is loaded once per generation run and read by
//! every generator.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, SchemaError};
use crate::procedures::{unflatten, ServiceNode};
use crate::schema::wire::{located, RawSchema};
use crate::schema::{Models, SchemaNode};

/// Definition format version written by this crate.
pub const SCHEMA_VERSION: &str = "0.0.4";

/// HTTP methods an RPC may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
        }
    }
}

/// Transport an RPC is served over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Http,
    Ws,
}

/// A single remote procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcDefinition {
    /// URL path the procedure is served at.
    pub path: String,

    pub method: HttpMethod,

    /// Model name of the request payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,

    /// Model name of the response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default)]
    pub transport: Transport,

    /// Whether the response is a server-sent event stream.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_event_stream: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RpcDefinition {
    /// Create an HTTP procedure with no payloads.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            params: None,
            response: None,
            transport: Transport::Http,
            is_event_stream: false,
            description: None,
        }
    }

    pub fn with_params(mut self, model: impl Into<String>) -> Self {
        self.params = Some(model.into());
        self
    }

    pub fn with_response(mut self, model: impl Into<String>) -> Self {
        self.response = Some(model.into());
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn event_stream(mut self) -> Self {
        self.is_event_stream = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Descriptive information about the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Everything a client generator needs: procedures, models and the error schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppDefinition {
    #[serde(rename = "arriSchemaVersion")]
    pub schema_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<AppInfo>,

    /// Dot-path keyed procedures (`"users.getUser"`).
    pub procedures: IndexMap<String, RpcDefinition>,

    /// Model arena.
    pub models: Models,

    /// Schema of the error payload every procedure may return.
    pub errors: SchemaNode,
}

/// Wire mirror used to attach model paths to schema errors.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAppDefinition {
    #[serde(rename = "arriSchemaVersion")]
    schema_version: String,
    #[serde(default)]
    info: Option<AppInfo>,
    #[serde(default)]
    procedures: IndexMap<String, RpcDefinition>,
    #[serde(default)]
    models: IndexMap<String, RawSchema>,
    errors: RawSchema,
}

impl RawAppDefinition {
    fn into_definition(self) -> Result<AppDefinition, SchemaError> {
        let mut models = Models::new();
        for (name, raw) in self.models {
            let path = format!("models.{name}");
            let node = raw.into_node("").map_err(|e| e.within(&path))?;
            models.insert(name, node);
        }
        let errors = self.errors.into_node("").map_err(|e| e.within("errors"))?;
        Ok(AppDefinition {
            schema_version: self.schema_version,
            info: self.info,
            procedures: self.procedures,
            models,
            errors,
        })
    }
}

impl<'de> Deserialize<'de> for AppDefinition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawAppDefinition::deserialize(deserializer)?
            .into_definition()
            .map_err(serde::de::Error::custom)
    }
}

impl AppDefinition {
    /// Create an empty definition around an error schema.
    pub fn new(errors: SchemaNode) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            info: None,
            procedures: IndexMap::new(),
            models: Models::new(),
            errors,
        }
    }

    pub fn with_procedure(mut self, key: impl Into<String>, rpc: RpcDefinition) -> Self {
        self.procedures.insert(key.into(), rpc);
        self
    }

    pub fn with_model(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.models.insert(name.into(), node);
        self
    }

    /// Parse a definition from JSON text; errors carry the document path.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let mut de = serde_json::Deserializer::from_str(text);
        let raw: RawAppDefinition = serde_path_to_error::deserialize(&mut de).map_err(located)?;
        de.end().map_err(|e| SchemaError::json("", e.to_string()))?;
        raw.into_definition()
    }

    /// Parse a definition from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SchemaError> {
        let raw: RawAppDefinition = serde_path_to_error::deserialize(value).map_err(located)?;
        raw.into_definition()
    }

    /// Serialize to pretty JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Build the nested service tree of the procedure map.
    pub fn service_tree(&self) -> Result<ServiceNode, DefinitionError> {
        Ok(unflatten(&self.procedures)?)
    }

    /// Check that the definition can drive a generator.
    ///
    /// Models and the error schema must be objects, every `ref` must resolve
    /// against the model arena, every params/response name must exist, and
    /// the procedure keys must form a tree.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                found = %self.schema_version,
                expected = SCHEMA_VERSION,
                "definition schema version differs"
            );
        }

        for (name, node) in &self.models {
            if !node.is_object() {
                return Err(DefinitionError::ModelNotObject {
                    name: name.clone(),
                    form: node.form_name().to_string(),
                });
            }
            self.check_refs(&format!("models.{name}"), node)?;
        }

        if !self.errors.is_object() {
            return Err(DefinitionError::ModelNotObject {
                name: "errors".to_string(),
                form: self.errors.form_name().to_string(),
            });
        }
        self.check_refs("errors", &self.errors)?;

        for (key, rpc) in &self.procedures {
            for (role, model) in [("params", &rpc.params), ("response", &rpc.response)] {
                if let Some(model) = model {
                    if !self.models.contains_key(model) {
                        return Err(DefinitionError::UnknownModel {
                            procedure: key.clone(),
                            role,
                            model: model.clone(),
                        });
                    }
                }
            }
        }

        self.service_tree()?;
        tracing::debug!(
            procedures = self.procedures.len(),
            models = self.models.len(),
            "definition validated"
        );
        Ok(())
    }

    fn check_refs(&self, root: &str, node: &SchemaNode) -> Result<(), SchemaError> {
        for (path, target) in node.references() {
            if !self.models.contains_key(&target) {
                let path = crate::schema::wire::join_path(root, &path);
                return Err(SchemaError::unresolved(path, target));
            }
        }
        Ok(())
    }
}

const DISALLOWED_PATH_CHARS: &str = "!@#$%^&*()+=[]{}|\\;:'\",<>./?";

/// Default HTTP path for a dot-separated procedure key.
///
/// Each segment is kebab-cased and stripped of characters that are not safe
/// in a URL path: `"users.getUser"` becomes `"/users/get-user"`.
pub fn rpc_path(procedure: &str) -> String {
    let segments: Vec<String> = procedure
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            segment
                .chars()
                .filter(|c| !DISALLOWED_PATH_CHARS.contains(*c) && !c.is_whitespace())
                .collect::<String>()
                .to_case(Case::Kebab)
        })
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "arriSchemaVersion": "0.0.4",
            "procedures": {
                "users.getUser": {
                    "path": "/users/get-user",
                    "method": "get",
                    "params": "UserParams",
                    "response": "User"
                },
                "users.watchUser": {
                    "path": "/users/watch-user",
                    "method": "get",
                    "params": "UserParams",
                    "response": "User",
                    "isEventStream": true
                }
            },
            "models": {
                "UserParams": { "properties": { "id": { "type": "string" } } },
                "User": {
                    "properties": {
                        "id": { "type": "string" },
                        "friends": { "elements": { "ref": "User" } }
                    }
                }
            },
            "errors": {
                "properties": {
                    "code": { "type": "uint16" },
                    "message": { "type": "string" }
                }
            }
        })
    }

    #[test]
    fn test_parse_and_validate() {
        let def = AppDefinition::from_json(&sample()).unwrap();
        assert_eq!(def.procedures.len(), 2);
        assert!(def.procedures["users.watchUser"].is_event_stream);
        assert_eq!(def.procedures["users.getUser"].transport, Transport::Http);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_model_errors_are_located() {
        let mut doc = sample();
        doc["models"]["User"]["properties"]["id"] = json!({ "type": "text" });
        let err = AppDefinition::from_json(&doc).unwrap_err();
        assert_eq!(err.path(), "models.User.properties.id");
    }

    #[test]
    fn test_unknown_model_rejected() {
        let mut def = AppDefinition::from_json(&sample()).unwrap();
        def.procedures.get_mut("users.getUser").unwrap().response = Some("Ghost".to_string());
        let err = def.validate().unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownModel {
                procedure: "users.getUser".to_string(),
                role: "response",
                model: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_unresolved_ref_rejected() {
        let def = AppDefinition::new(SchemaNode::object()).with_model(
            "Post",
            SchemaNode::object().property("author", SchemaNode::reference("Author")),
        );
        let err = def.validate().unwrap_err();
        assert_eq!(
            err,
            DefinitionError::Schema(SchemaError::UnresolvedRef {
                path: "models.Post.properties.author".to_string(),
                target: "Author".to_string(),
            })
        );
    }

    #[test]
    fn test_non_object_model_rejected() {
        let def = AppDefinition::new(SchemaNode::object())
            .with_model("Color", SchemaNode::enumeration(["RED"]));
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::ModelNotObject { name, .. }) if name == "Color"
        ));
    }

    #[test]
    fn test_rpc_path() {
        assert_eq!(rpc_path("users.getUser"), "/users/get-user");
        assert_eq!(rpc_path("posts.comments.listAll"), "/posts/comments/list-all");
        assert_eq!(rpc_path("say!Hello"), "/say-hello");
    }

    #[test]
    fn test_round_trip_json() {
        let def = AppDefinition::from_json(&sample()).unwrap();
        let text = def.to_json_string();
        assert_eq!(AppDefinition::from_json_str(&text).unwrap(), def);
    }
}
