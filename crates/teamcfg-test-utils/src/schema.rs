//! [`SchemaBuilder`] for per-type property schemas.

use teamcfg_model::{LayerSchema, PropertySchema};

/// Fluent builder for a [`LayerSchema`].
///
/// Every type mentioned through [`property`](Self::property) or
/// [`secure_property`](Self::secure_property) is also a valid default type
/// unless [`valid_defaults`](Self::valid_defaults) narrows the list.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: LayerSchema,
    explicit_defaults: Option<Vec<String>>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a string property of a profile type.
    pub fn property(self, kind: &str, name: &str) -> Self {
        self.with(kind, name, PropertySchema::new("string"))
    }

    /// Declare a secure string property of a profile type.
    pub fn secure_property(self, kind: &str, name: &str) -> Self {
        self.with(kind, name, PropertySchema::new("string").secure())
    }

    /// Declare a property with an explicit description.
    pub fn with(mut self, kind: &str, name: &str, property: PropertySchema) -> Self {
        self.schema
            .property_schema
            .entry(kind.to_string())
            .or_default()
            .insert(name.to_string(), property);
        self
    }

    /// Declare a type with no properties.
    pub fn empty_type(mut self, kind: &str) -> Self {
        self.schema.property_schema.entry(kind.to_string()).or_default();
        self
    }

    pub fn valid_defaults(mut self, kinds: &[&str]) -> Self {
        self.explicit_defaults = Some(kinds.iter().map(|kind| kind.to_string()).collect());
        self
    }

    pub fn build(self) -> LayerSchema {
        let mut schema = self.schema;
        schema.valid_defaults = self
            .explicit_defaults
            .unwrap_or_else(|| schema.property_schema.keys().cloned().collect());
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_are_valid_defaults() {
        let schema = SchemaBuilder::new()
            .property("zosmf", "host")
            .secure_property("zosmf", "password")
            .empty_type("base")
            .build();

        assert!(schema.allows("zosmf", "host"));
        assert!(schema.is_secure_property("zosmf", "password"));
        assert!(!schema.is_secure_property("zosmf", "host"));
        assert!(schema.is_valid_default_type("base"));
        assert!(schema.is_valid_default_type("zosmf"));
    }

    #[test]
    fn explicit_valid_defaults_narrow_the_list() {
        let schema = SchemaBuilder::new()
            .property("zosmf", "host")
            .valid_defaults(&["base"])
            .build();

        assert!(!schema.is_valid_default_type("zosmf"));
        assert!(schema.is_valid_default_type("base"));
    }
}
