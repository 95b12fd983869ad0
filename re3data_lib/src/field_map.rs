//! Field maps: which paths to extract from a repository document, and how many
//! values each path is expected to produce.
//!
//! Cardinality is declared up front and the whole map is validated when it is
//! built, so a wrong assumption (say, pairing a single-valued field) fails at
//! configuration time rather than while parsing documents. Paths are compiled
//! with the XPath engine at that point too. Built-in presets are embedded
//! YAML, parsed with `serde_yml`.
//!
//! Paired fields hang off an anchor: the repeated element they describe. Each
//! member path is relative to one anchor node, so values that belong to the
//! same element always land in the same row.

use std::collections::{BTreeMap, HashSet};

use re3data_api::xml::{XPath, XmlError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the repository identifier.
pub const ID_COLUMN: &str = "id";
/// Column holding the repository display name.
pub const NAME_COLUMN: &str = "name";

/// Error types for field map construction.
#[derive(Error, Debug)]
pub enum FieldMapError {
    #[error("Invalid path for field '{field}': {source}")]
    InvalidPath {
        field: String,
        #[source]
        source: XmlError,
    },
    #[error("Field name is not a valid XML name: '{0}'")]
    InvalidFieldName(String),
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
    #[error("Field name is reserved: {0}")]
    ReservedField(String),
    #[error("Paired group references unknown field: {0}")]
    UnknownGroupMember(String),
    #[error("Paired group member '{0}' is not multi-valued")]
    SingleValuedGroupMember(String),
    #[error("Field '{0}' appears in more than one paired group")]
    FieldInMultipleGroups(String),
    #[error("Paired group needs at least two fields: {0:?}")]
    GroupTooSmall(Vec<String>),
    #[error("Failed to parse field map YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Unknown field map preset: {0}")]
    UnknownPreset(String),
}

/// How many values a field is expected to produce per document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// First value in document order, or null.
    #[default]
    Single,
    /// Every value in document order; the document explodes into one row per value.
    Multi,
}

/// One extracted column.
///
/// For a member of a [`FieldGroup`] the path is relative to the group anchor.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub path: XPath,
    pub cardinality: Cardinality,
}

/// Multi-valued fields read from the same repeated element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    /// Selects the repeated element, e.g. `//r3d:api`.
    pub anchor: XPath,
    pub members: Vec<String>,
}

/// A validated field map.
#[derive(Debug, Clone)]
pub struct FieldMap {
    id: XPath,
    name: XPath,
    fields: Vec<FieldSpec>,
    groups: Vec<FieldGroup>,
}

impl FieldMap {
    /// Starts a map with the two required first-match fields.
    pub fn builder(id_path: &str, name_path: &str) -> FieldMapBuilder {
        FieldMapBuilder {
            id: id_path.to_string(),
            name: name_path.to_string(),
            fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn id_path(&self) -> &XPath {
        &self.id
    }

    pub fn name_path(&self) -> &XPath {
        &self.name
    }

    /// Extra fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Paired groups of multi-valued fields.
    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// Output column names: `id`, `name`, then the extra fields in order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![ID_COLUMN.to_string(), NAME_COLUMN.to_string()];
        columns.extend(self.fields.iter().map(|f| f.name.clone()));
        columns
    }

    /// Parses a single field map from YAML.
    ///
    /// ```yaml
    /// id: //r3d:re3data.orgIdentifier
    /// name: //r3d:repositoryName
    /// fields:
    ///   - name: api
    ///     path: .
    ///     cardinality: multi
    ///   - name: api_type
    ///     path: "@apiType"
    ///     cardinality: multi
    /// paired:
    ///   - anchor: //r3d:api
    ///     fields: [api, api_type]
    /// ```
    pub fn from_yaml(yaml_content: &str) -> Result<Self, FieldMapError> {
        let config: FieldMapConfig = serde_yml::from_str(yaml_content)?;
        config.build()
    }

    /// Loads a built-in preset by name.
    pub fn preset(name: &str) -> Result<Self, FieldMapError> {
        let mut presets = load_presets()?;
        presets
            .remove(name)
            .ok_or_else(|| FieldMapError::UnknownPreset(name.to_string()))?
            .build()
    }

    /// Names of the built-in presets, sorted.
    pub fn preset_names() -> Result<Vec<String>, FieldMapError> {
        Ok(load_presets()?.into_keys().collect())
    }
}

/// Builder for [`FieldMap`]; validation happens in [`FieldMapBuilder::build`].
#[derive(Debug, Clone)]
pub struct FieldMapBuilder {
    id: String,
    name: String,
    fields: Vec<(String, String, Cardinality)>,
    groups: Vec<(String, Vec<String>)>,
}

impl FieldMapBuilder {
    pub fn single(self, name: &str, path: &str) -> Self {
        self.field(name, path, Cardinality::Single)
    }

    pub fn multi(self, name: &str, path: &str) -> Self {
        self.field(name, path, Cardinality::Multi)
    }

    pub fn field(mut self, name: &str, path: &str, cardinality: Cardinality) -> Self {
        self.fields
            .push((name.to_string(), path.to_string(), cardinality));
        self
    }

    /// Declares fields read from each element `anchor` selects. The member
    /// paths are evaluated relative to that element.
    pub fn paired(mut self, anchor: &str, members: &[&str]) -> Self {
        self.groups.push((
            anchor.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<FieldMap, FieldMapError> {
        let id = parse_path(ID_COLUMN, &self.id)?;
        let name = parse_path(NAME_COLUMN, &self.name)?;
        let valid_name = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$")
            .map_err(|e| FieldMapError::InvalidFieldName(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for (field_name, path, cardinality) in self.fields {
            if field_name == ID_COLUMN || field_name == NAME_COLUMN {
                return Err(FieldMapError::ReservedField(field_name));
            }
            if !valid_name.is_match(&field_name) {
                return Err(FieldMapError::InvalidFieldName(field_name));
            }
            if !seen.insert(field_name.clone()) {
                return Err(FieldMapError::DuplicateField(field_name));
            }
            let path = parse_path(&field_name, &path)?;
            fields.push(FieldSpec {
                name: field_name,
                path,
                cardinality,
            });
        }

        let mut grouped = HashSet::new();
        let mut groups = Vec::with_capacity(self.groups.len());
        for (anchor, members) in self.groups {
            if members.len() < 2 {
                return Err(FieldMapError::GroupTooSmall(members));
            }
            for member in &members {
                let field = fields
                    .iter()
                    .find(|f| &f.name == member)
                    .ok_or_else(|| FieldMapError::UnknownGroupMember(member.clone()))?;
                if field.cardinality != Cardinality::Multi {
                    return Err(FieldMapError::SingleValuedGroupMember(member.clone()));
                }
                if !grouped.insert(member.clone()) {
                    return Err(FieldMapError::FieldInMultipleGroups(member.clone()));
                }
            }
            let anchor = parse_path(&members.join("+"), &anchor)?;
            groups.push(FieldGroup { anchor, members });
        }

        Ok(FieldMap {
            id,
            name,
            fields,
            groups,
        })
    }
}

fn parse_path(field: &str, path: &str) -> Result<XPath, FieldMapError> {
    XPath::parse(path).map_err(|source| FieldMapError::InvalidPath {
        field: field.to_string(),
        source,
    })
}

/// Serialized form of a field map.
#[derive(Deserialize, Debug, Clone)]
pub struct FieldMapConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub paired: Vec<GroupConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GroupConfig {
    pub anchor: String,
    pub fields: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FieldConfig {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub cardinality: Cardinality,
}

impl FieldMapConfig {
    pub fn build(self) -> Result<FieldMap, FieldMapError> {
        let mut builder = FieldMap::builder(&self.id, &self.name);
        for field in &self.fields {
            builder = builder.field(&field.name, &field.path, field.cardinality);
        }
        for group in &self.paired {
            let members: Vec<&str> = group.fields.iter().map(String::as_str).collect();
            builder = builder.paired(&group.anchor, &members);
        }
        builder.build()
    }
}

#[derive(Deserialize, Debug)]
struct PresetFile {
    presets: BTreeMap<String, FieldMapConfig>,
}

fn load_presets() -> Result<BTreeMap<String, FieldMapConfig>, FieldMapError> {
    let yaml_content = include_str!("../../seed_data/field_maps.yml");
    let file: PresetFile = serde_yml::from_str(yaml_content)?;
    Ok(file.presets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_builder() -> FieldMapBuilder {
        FieldMap::builder("//r3d:re3data.orgIdentifier", "//r3d:repositoryName")
            .multi("api", ".")
            .multi("api_type", "@apiType")
    }

    #[test]
    fn builds_paired_map() {
        let map = api_builder()
            .paired("//r3d:api", &["api", "api_type"])
            .build()
            .unwrap();
        assert_eq!(map.columns(), vec!["id", "name", "api", "api_type"]);
        assert_eq!(map.groups().len(), 1);
        assert_eq!(map.groups()[0].anchor.as_str(), "//r3d:api");
        assert_eq!(map.groups()[0].members, vec!["api", "api_type"]);
        assert_eq!(map.field("api_type").unwrap().cardinality, Cardinality::Multi);
    }

    #[test]
    fn rejects_invalid_path() {
        let err = FieldMap::builder("//id", "//name")
            .single("url", "//url[")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidPath { ref field, .. } if field == "url"));

        let err = api_builder()
            .paired("//r3d:api[", &["api", "api_type"])
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidPath { ref field, .. } if field == "api+api_type"));
    }

    #[test]
    fn rejects_field_names_that_are_not_xml_names() {
        for bad in ["api type", "1st", "a:b", "", "<x>"] {
            let err = FieldMap::builder("//id", "//name")
                .single(bad, "//x")
                .build()
                .unwrap_err();
            assert!(
                matches!(err, FieldMapError::InvalidFieldName(ref n) if n == bad),
                "expected '{}' to be rejected",
                bad
            );
        }
        assert!(FieldMap::builder("//id", "//name")
            .single("api_type.v2-x", "//x")
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_duplicate_and_reserved_fields() {
        let err = FieldMap::builder("//id", "//name")
            .single("url", "//url")
            .single("url", "//other")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::DuplicateField(_)));

        let err = FieldMap::builder("//id", "//name")
            .single("id", "//other")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::ReservedField(_)));
    }

    #[test]
    fn rejects_bad_groups() {
        let err = api_builder()
            .paired("//r3d:api", &["api", "missing"])
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::UnknownGroupMember(ref m) if m == "missing"));

        let err = api_builder()
            .single("url", "//url")
            .paired("//r3d:api", &["api", "url"])
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::SingleValuedGroupMember(ref m) if m == "url"));

        let err = api_builder()
            .multi("extra", "//extra")
            .paired("//r3d:api", &["api", "api_type"])
            .paired("//r3d:api", &["api", "extra"])
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::FieldInMultipleGroups(_)));

        let err = api_builder().paired("//r3d:api", &["api"]).build().unwrap_err();
        assert!(matches!(err, FieldMapError::GroupTooSmall(_)));
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
id: //r3d:re3data.orgIdentifier
name: //r3d:repositoryName
fields:
  - name: type
    path: //r3d:type
    cardinality: multi
  - name: certificate
    path: //r3d:certificate
"#;
        let map = FieldMap::from_yaml(yaml).unwrap();
        assert_eq!(map.columns(), vec!["id", "name", "type", "certificate"]);
        assert_eq!(map.field("certificate").unwrap().cardinality, Cardinality::Single);
        assert!(map.groups().is_empty());
    }

    #[test]
    fn parses_yaml_groups() {
        let yaml = r#"
id: //r3d:re3data.orgIdentifier
name: //r3d:repositoryName
fields:
  - name: subject
    path: .
    cardinality: multi
  - name: scheme
    path: "@subjectScheme"
    cardinality: multi
paired:
  - anchor: //r3d:subject
    fields:
      - subject
      - scheme
"#;
        let map = FieldMap::from_yaml(yaml).unwrap();
        let group = &map.groups()[0];
        assert_eq!(group.anchor.as_str(), "//r3d:subject");
        assert_eq!(group.members, vec!["subject", "scheme"]);
    }

    #[test]
    fn rejects_unknown_cardinality() {
        let yaml = r#"
id: //id
name: //name
fields:
  - name: x
    path: //x
    cardinality: many
"#;
        assert!(matches!(
            FieldMap::from_yaml(yaml),
            Err(FieldMapError::YamlParse(_))
        ));
    }

    #[test]
    fn all_presets_build() {
        let names = FieldMap::preset_names().unwrap();
        assert!(names.contains(&"apis".to_string()));
        assert!(names.contains(&"types".to_string()));
        for name in names {
            assert!(FieldMap::preset(&name).is_ok(), "preset {} failed", name);
        }
    }

    #[test]
    fn apis_preset_pairs_endpoints_with_types() {
        let map = FieldMap::preset("apis").unwrap();
        assert_eq!(map.columns(), vec!["id", "name", "url", "api", "api_type"]);
        assert_eq!(map.groups().len(), 1);
        assert_eq!(map.groups()[0].anchor.as_str(), "//r3d:api");
    }

    #[test]
    fn unknown_preset() {
        assert!(matches!(
            FieldMap::preset("nope"),
            Err(FieldMapError::UnknownPreset(_))
        ));
    }
}
