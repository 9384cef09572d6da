//! JSON rendering of attribute stores

use std::collections::BTreeMap;

use scp_core::resource::{Attributes, Value};
use scp_core::schema::ResourceSchema;
use serde_json::{Map, Value as Json, json};

const MASK: &str = "(sensitive)";

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Int(n) => json!(n),
        Value::Float(f) => json!(f),
        Value::Bool(b) => Json::Bool(*b),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => Json::Object(sorted(map, |_| false)),
    }
}

fn sorted(map: &Attributes, masked: impl Fn(&str) -> bool) -> Map<String, Json> {
    map.iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(k, v)| {
            let json = if masked(k) {
                Json::String(MASK.to_string())
            } else {
                value_to_json(v)
            };
            (k.clone(), json)
        })
        .collect()
}

/// Attribute store with sensitive attributes masked
pub fn state_to_json(id: &str, state: &Attributes, schema: &ResourceSchema) -> Json {
    let sensitive = schema.sensitive_attributes();
    json!({
        "id": id,
        "attributes": sorted(state, |k| sensitive.contains(&k)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::schema::{AttributeSchema, AttributeType};

    #[test]
    fn sensitive_values_are_masked() {
        let schema = ResourceSchema::new("scp_test")
            .attribute(AttributeSchema::new("name", AttributeType::String))
            .attribute(AttributeSchema::new("password", AttributeType::String).sensitive());
        let mut state = Attributes::new();
        state.insert("name".to_string(), Value::from("a"));
        state.insert("password".to_string(), Value::from("hunter2"));

        let json = state_to_json("ID-1", &state, &schema);
        assert_eq!(json["id"], "ID-1");
        assert_eq!(json["attributes"]["name"], "a");
        assert_eq!(json["attributes"]["password"], MASK);
    }

    #[test]
    fn nested_values_convert() {
        let mut row = Attributes::new();
        row.insert("ttl".to_string(), Value::Int(300));
        let value = Value::List(vec![Value::Map(row)]);
        assert_eq!(value_to_json(&value), json!([{"ttl": 300}]));
    }
}
