//! Attribute types declared in a JSON or YAML schema file
//!
//! ```yaml
//! attributes:
//!   age: { type: integer }
//!   status: { type: enumeration, labels: [ACTIVE, DISABLED] }
//! ```

use crate::translate::{AttributeType, TypeResolver, TypeTag};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(rename = "type")]
    pub kind: TypeTag,
    /// Only meaningful for `enumeration`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl AttributeSpec {
    pub fn attribute_type(&self) -> AttributeType {
        match self.kind {
            TypeTag::String => AttributeType::String,
            TypeTag::Integer => AttributeType::Integer,
            TypeTag::Long => AttributeType::Long,
            TypeTag::Double => AttributeType::Double,
            TypeTag::Float => AttributeType::Float,
            TypeTag::Boolean => AttributeType::Boolean,
            TypeTag::Enumeration => AttributeType::Enumeration(self.labels.clone()),
        }
    }
}

impl Schema {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let schema: Schema = serde_json::from_str(content).context("Invalid JSON schema")?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let schema: Schema = serde_yaml_ng::from_str(content).context("Invalid YAML schema")?;
        schema.validate()?;
        Ok(schema)
    }

    /// Loads a schema file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let schema = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        schema.with_context(|| format!("Failed to load schema file: {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        for (name, spec) in &self.attributes {
            if spec.kind == TypeTag::Enumeration && spec.labels.is_empty() {
                bail!("Enumeration attribute '{}' declares no labels", name);
            }
        }
        Ok(())
    }
}

impl TypeResolver for Schema {
    fn resolve(&self, attribute: &str) -> Option<AttributeType> {
        self.attributes
            .get(attribute)
            .map(AttributeSpec::attribute_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
attributes:
  age:
    type: integer
  address.city:
    type: string
  status:
    type: enumeration
    labels: [ACTIVE, DISABLED]
"#;

    #[test]
    fn test_yaml_schema_resolves_types() {
        let schema = Schema::from_yaml_str(YAML).unwrap();
        assert_eq!(schema.resolve("age"), Some(AttributeType::Integer));
        assert_eq!(schema.resolve("address.city"), Some(AttributeType::String));
        assert_eq!(
            schema.resolve("status"),
            Some(AttributeType::Enumeration(vec![
                "ACTIVE".to_string(),
                "DISABLED".to_string()
            ]))
        );
        assert_eq!(schema.resolve("unknown"), None);
    }

    #[test]
    fn test_json_schema() {
        let schema = Schema::from_json_str(
            r#"{"attributes": {"verified": {"type": "boolean"}, "score": {"type": "double"}}}"#,
        )
        .unwrap();
        assert_eq!(schema.resolve("verified"), Some(AttributeType::Boolean));
        assert_eq!(schema.resolve("score"), Some(AttributeType::Double));
    }

    #[test]
    fn test_rejects_bad_schemas() {
        let err = Schema::from_yaml_str("attributes:\n  status:\n    type: enumeration\n").unwrap_err();
        assert!(err.to_string().contains("status"), "{}", err);
        assert!(Schema::from_yaml_str("attributes:\n  born:\n    type: date\n").is_err());
        assert!(Schema::from_json_str("{").is_err());
    }

    #[test]
    fn test_empty_schema() {
        assert_eq!(Schema::from_yaml_str("{}").unwrap(), Schema::default());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("schema.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        file.write_all(br#"{"attributes": {"age": {"type": "long"}}}"#)
            .unwrap();
        let schema = Schema::load(&json_path).unwrap();
        assert_eq!(schema.resolve("age"), Some(AttributeType::Long));

        let yaml_path = dir.path().join("schema.yaml");
        std::fs::write(&yaml_path, YAML).unwrap();
        assert!(Schema::load(&yaml_path).unwrap().resolve("status").is_some());

        let missing = dir.path().join("missing.yaml");
        let err = Schema::load(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read schema file"));
    }
}
