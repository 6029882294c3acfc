//! Per-type property schema
//!
//! The engine never validates documents. It only needs to know which
//! property names a profile type allows, which of them are secure, and which
//! types may have a default profile.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Description of one property of a profile type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// JSON type name ("string", "number", ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

/// Schema information supplied for one layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSchema {
    /// Profile type to property name to description
    #[serde(default)]
    pub property_schema: BTreeMap<String, BTreeMap<String, PropertySchema>>,
    /// Types that may appear in `defaults`
    #[serde(default)]
    pub valid_defaults: Vec<String>,
}

impl LayerSchema {
    pub fn properties_for(&self, kind: &str) -> Option<&BTreeMap<String, PropertySchema>> {
        self.property_schema.get(kind)
    }

    /// True when `kind` declares a property called `name`.
    pub fn allows(&self, kind: &str, name: &str) -> bool {
        self.properties_for(kind)
            .is_some_and(|props| props.contains_key(name))
    }

    pub fn is_secure_property(&self, kind: &str, name: &str) -> bool {
        self.properties_for(kind)
            .and_then(|props| props.get(name))
            .is_some_and(|prop| prop.secure)
    }

    pub fn is_valid_default_type(&self, kind: &str) -> bool {
        self.valid_defaults.iter().any(|t| t == kind)
    }

    /// Derive the property map from a team-config JSON schema document.
    ///
    /// Profile rules are read from
    /// `properties.profiles.patternProperties["^\\S*$"].allOf`, each an
    /// `if`/`then` pair keyed on `type`. Anything that does not match that
    /// shape is skipped; a document without profile rules yields an empty
    /// schema.
    pub fn from_json_schema(document: &Value) -> Self {
        let mut schema = Self::default();

        let rules = document
            .pointer("/properties/profiles/patternProperties/^\\S*$/allOf")
            .and_then(Value::as_array);
        let Some(rules) = rules else {
            tracing::warn!("Schema document has no profile rules; treating every type as empty");
            return schema;
        };

        for rule in rules {
            let Some(kind) = rule
                .pointer("/if/properties/type/const")
                .and_then(Value::as_str)
            else {
                continue;
            };

            let secure_names: Vec<&str> = rule
                .pointer("/then/properties/secure/items/enum")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            let mut properties = BTreeMap::new();
            if let Some(props) = rule
                .pointer("/then/properties/properties/properties")
                .and_then(Value::as_object)
            {
                for (name, spec) in props {
                    properties.insert(
                        name.clone(),
                        PropertySchema {
                            kind: json_type_name(spec.get("type")),
                            secure: secure_names.contains(&name.as_str()),
                            default: spec.get("default").cloned(),
                            description: spec
                                .get("description")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                        },
                    );
                }
            }
            schema.property_schema.insert(kind.to_string(), properties);
        }

        if let Some(defaults) = document
            .pointer("/properties/defaults/properties")
            .and_then(Value::as_object)
        {
            schema.valid_defaults = defaults.keys().cloned().collect();
        }

        tracing::debug!(types = schema.property_schema.len(), "Derived layer schema");
        schema
    }
}

/// `"string"` stays as is; `["string", "null"]` takes the first entry.
fn json_type_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Array(names)) => names
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}
