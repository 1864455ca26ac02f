use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::standings::{Attribute, TeamRecord};

/// One field of the destination collection's schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub display_name: String,
    pub slug: String,
}

/// Destination field slug per record attribute. Attributes the schema does not
/// carry are absent and never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    slugs: HashMap<Attribute, String>,
}

impl FieldMap {
    pub fn slug(&self, attr: Attribute) -> Option<&str> {
        self.slugs.get(&attr).map(String::as_str)
    }

    pub fn unmapped(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|a| !self.slugs.contains_key(a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

pub fn build_field_map(fields: &[SchemaField]) -> FieldMap {
    let mut slugs = HashMap::new();
    for field in fields {
        let key = field
            .display_name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        if let Some(attr) = Attribute::from_key(&key) {
            slugs.insert(attr, field.slug.clone());
        }
    }
    FieldMap { slugs }
}

/// The mapped attributes of `record` as a field-data object.
pub fn field_data(record: &TeamRecord, map: &FieldMap) -> Map<String, Value> {
    let mut out = Map::new();
    for attr in Attribute::ALL {
        if let Some(slug) = map.slug(attr) {
            out.insert(slug.to_string(), Value::from(record.value(attr)));
        }
    }
    out
}
