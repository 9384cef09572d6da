//! Marshaller - populate the attribute store from typed API responses
//!
//! Response types derive `Serialize`; their JSON form is walked here and
//! turned into [`Attributes`]. Field names become snake_case attribute keys,
//! nested structs become a singleton list holding one map, and `null` fields
//! take the zero value of the schema type (or are dropped without a schema).

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value as Json;

use crate::case_convert::attribute_key;
use crate::provider::{ProviderError, ProviderResult};
use crate::resource::{Attributes, Value};
use crate::schema::{AttributeType, ResourceSchema};

/// Conversion settings for one response type
#[derive(Debug, Default, Clone)]
pub struct Marshaller<'a> {
    schema: Option<&'a ResourceSchema>,
    ignored: HashSet<String>,
}

impl<'a> Marshaller<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `schema` for zero values and to keep map-typed attributes as maps
    pub fn with_schema(mut self, schema: &'a ResourceSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Skip these fields; names are accepted in either API or attribute form
    pub fn ignore(mut self, fields: &[&str]) -> Self {
        self.ignored.extend(fields.iter().map(|f| attribute_key(f)));
        self
    }

    pub fn to_attributes<T: Serialize>(&self, value: &T) -> ProviderResult<Attributes> {
        let json = serde_json::to_value(value)
            .map_err(|e| ProviderError::new("failed to serialize response").with_cause(e))?;
        let Json::Object(fields) = json else {
            return Err(ProviderError::new("response did not serialize to an object"));
        };
        let mut attributes = object_to_attributes(fields, self.schema, &self.ignored);
        if let Some(schema) = self.schema {
            fill_missing_zero_values(&mut attributes, schema, &self.ignored);
        }
        Ok(attributes)
    }
}

/// Marshal without a schema or ignored fields
pub fn to_attributes<T: Serialize>(value: &T) -> ProviderResult<Attributes> {
    Marshaller::new().to_attributes(value)
}

/// Marshal every row of a list response into a list of attribute maps
pub fn to_attribute_rows<T: Serialize>(
    rows: &[T],
    marshaller: &Marshaller<'_>,
) -> ProviderResult<Vec<Attributes>> {
    rows.iter().map(|row| marshaller.to_attributes(row)).collect()
}

fn object_to_attributes(
    fields: serde_json::Map<String, Json>,
    schema: Option<&ResourceSchema>,
    ignored: &HashSet<String>,
) -> Attributes {
    let mut attributes = HashMap::with_capacity(fields.len());
    for (name, json) in fields {
        let key = attribute_key(&name);
        if ignored.contains(&key) {
            continue;
        }
        let attr_type = schema
            .and_then(|s| s.attributes.get(&key))
            .map(|a| &a.attr_type);
        if let Some(value) = convert(json, attr_type) {
            attributes.insert(key, value);
        }
    }
    attributes
}

/// Schema attributes absent from the response still get a zero value
fn fill_missing_zero_values(
    attributes: &mut Attributes,
    schema: &ResourceSchema,
    ignored: &HashSet<String>,
) {
    for (name, attr) in &schema.attributes {
        if !attr.computed || ignored.contains(name) {
            continue;
        }
        attributes
            .entry(name.clone())
            .or_insert_with(|| attr.attr_type.zero_value());
    }
}

fn convert(json: Json, attr_type: Option<&AttributeType>) -> Option<Value> {
    match json {
        Json::Null => attr_type.map(AttributeType::zero_value),
        Json::Bool(b) => Some(Value::Bool(b)),
        Json::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        }),
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => {
            let item_type = attr_type.and_then(element_type);
            let block = block_schema(attr_type);
            let values = items
                .into_iter()
                .filter_map(|item| match item {
                    Json::Object(fields) => Some(Value::Map(object_to_attributes(
                        fields,
                        block,
                        &HashSet::new(),
                    ))),
                    other => convert(other, item_type),
                })
                .collect();
            Some(Value::List(values))
        }
        Json::Object(fields) => match attr_type {
            // Free-form maps keep their keys untouched
            Some(AttributeType::Map(inner)) => Some(Value::Map(
                fields
                    .into_iter()
                    .filter_map(|(k, v)| convert(v, Some(inner.as_ref())).map(|v| (k, v)))
                    .collect(),
            )),
            _ => Some(Value::List(vec![Value::Map(object_to_attributes(
                fields,
                block_schema(attr_type),
                &HashSet::new(),
            ))])),
        },
    }
}

fn element_type(attr_type: &AttributeType) -> Option<&AttributeType> {
    match attr_type {
        AttributeType::List(inner) => Some(inner.as_ref()),
        AttributeType::Custom { base, .. } => element_type(base),
        _ => None,
    }
}

fn block_schema(attr_type: Option<&AttributeType>) -> Option<&ResourceSchema> {
    match attr_type {
        Some(AttributeType::Block(schema)) => Some(schema.as_ref()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, types};
    use chrono::{DateTime, TimeZone, Utc};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Vpc {
        vpc_id: String,
        vpc_name: String,
        vpc_state: String,
        subnet_count: i64,
        description: Option<String>,
        created_dt: DateTime<Utc>,
        project_id: String,
        owner: Owner,
        service_zones: Vec<ServiceZone>,
        dns_servers: Vec<String>,
        tags: HashMap<String, String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Owner {
        user_id: String,
        display_name: Option<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ServiceZone {
        service_zone_id: String,
        is_default: bool,
    }

    fn sample() -> Vpc {
        let mut tags = HashMap::new();
        tags.insert("CostCenter".to_string(), "ops".to_string());
        Vpc {
            vpc_id: "VPC-1".to_string(),
            vpc_name: "main".to_string(),
            vpc_state: "ACTIVE".to_string(),
            subnet_count: 3,
            description: None,
            created_dt: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            project_id: "PROJECT-1".to_string(),
            owner: Owner {
                user_id: "u-1".to_string(),
                display_name: None,
            },
            service_zones: vec![ServiceZone {
                service_zone_id: "ZONE-1".to_string(),
                is_default: true,
            }],
            dns_servers: vec!["10.0.0.2".to_string()],
            tags,
        }
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new("scp_vpc")
            .attribute(AttributeSchema::new("vpc_name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("tags", types::tags()))
            .attribute(AttributeSchema::new("vpc_state", AttributeType::String).computed())
            .attribute(AttributeSchema::new("region", AttributeType::String).computed())
    }

    #[test]
    fn converts_field_names_to_snake_case() {
        let attrs = to_attributes(&sample()).unwrap();
        assert_eq!(attrs["vpc_name"], Value::from("main"));
        assert_eq!(attrs["subnet_count"], Value::Int(3));
        assert!(!attrs.contains_key("vpcName"));
    }

    #[test]
    fn timestamps_become_rfc3339() {
        let attrs = to_attributes(&sample()).unwrap();
        let created = attrs["created_dt"].as_str().unwrap();
        assert_eq!(
            DateTime::parse_from_rfc3339(created).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn nested_struct_is_a_singleton_list() {
        let attrs = to_attributes(&sample()).unwrap();
        let owner = attrs["owner"].as_list().unwrap();
        assert_eq!(owner.len(), 1);
        let owner = owner[0].as_map().unwrap();
        assert_eq!(owner["user_id"], Value::from("u-1"));
        assert!(!owner.contains_key("display_name"));
    }

    #[test]
    fn slices_become_lists() {
        let attrs = to_attributes(&sample()).unwrap();
        let zones = attrs["service_zones"].as_list().unwrap();
        let zone = zones[0].as_map().unwrap();
        assert_eq!(zone["service_zone_id"], Value::from("ZONE-1"));
        assert_eq!(zone["is_default"], Value::Bool(true));
        assert_eq!(
            attrs["dns_servers"],
            Value::List(vec![Value::from("10.0.0.2")])
        );
    }

    #[test]
    fn null_without_schema_is_omitted() {
        let attrs = to_attributes(&sample()).unwrap();
        assert!(!attrs.contains_key("description"));
    }

    #[test]
    fn null_with_schema_takes_zero_value() {
        let schema = schema();
        let attrs = Marshaller::new()
            .with_schema(&schema)
            .to_attributes(&sample())
            .unwrap();
        assert_eq!(attrs["description"], Value::from(""));
        // Computed attributes absent from the response are zeroed too
        assert_eq!(attrs["region"], Value::from(""));
    }

    #[test]
    fn map_attributes_keep_their_keys() {
        let schema = schema();
        let attrs = Marshaller::new()
            .with_schema(&schema)
            .to_attributes(&sample())
            .unwrap();
        let tags = attrs["tags"].as_map().unwrap();
        assert_eq!(tags["CostCenter"], Value::from("ops"));
    }

    #[test]
    fn ignored_fields_accept_either_naming_form() {
        let attrs = Marshaller::new()
            .ignore(&["projectId", "created_dt"])
            .to_attributes(&sample())
            .unwrap();
        assert!(!attrs.contains_key("project_id"));
        assert!(!attrs.contains_key("created_dt"));
        assert!(attrs.contains_key("vpc_id"));
    }

    #[test]
    fn rejects_non_object_values() {
        assert!(to_attributes(&vec![1, 2, 3]).is_err());
    }
}
