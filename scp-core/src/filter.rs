//! Filter engine for list data sources
//!
//! Each `filter` block names an attribute and a set of accepted values. A
//! row survives when it satisfies every block; within one block any value
//! may match, either exactly or as a regular expression.

use regex::Regex;

use crate::provider::{ProviderError, ProviderResult};
use crate::resource::{Attributes, ResourceData, Value};
use crate::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub const FILTER_KEY: &str = "filter";

/// One user predicate over a row attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
    pub use_regex: bool,
}

/// Schema of the `filter` block shared by list data sources
pub fn filter_schema() -> AttributeSchema {
    let block = ResourceSchema::new(FILTER_KEY)
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("values", types::string_list()).required())
        .attribute(
            AttributeSchema::new("use_regex", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        );
    AttributeSchema::new(FILTER_KEY, AttributeType::Block(Box::new(block)))
        .with_description("Keep rows whose attribute matches one of the values")
}

impl Filter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            use_regex: false,
        }
    }

    pub fn regex(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::new(name, values)
        }
    }

    /// Read every `filter` block of a data source configuration
    pub fn from_resource_data(rd: &ResourceData) -> Vec<Filter> {
        rd.get_list(FILTER_KEY)
            .iter()
            .filter_map(Value::as_map)
            .map(|block| Filter {
                name: block
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                values: block
                    .get("values")
                    .and_then(Value::as_list)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(Value::to_primitive_string)
                    .collect(),
                use_regex: block
                    .get("use_regex")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            })
            .collect()
    }
}

enum Matcher {
    Exact(Vec<String>),
    Pattern(Vec<Regex>),
}

struct CompiledFilter<'a> {
    name: &'a str,
    matcher: Matcher,
}

impl CompiledFilter<'_> {
    fn matches(&self, row: &Attributes) -> bool {
        // Lists and maps never match
        let Some(actual) = row.get(self.name).and_then(Value::to_primitive_string) else {
            return false;
        };
        match &self.matcher {
            Matcher::Exact(values) => values.iter().any(|v| *v == actual),
            Matcher::Pattern(patterns) => patterns.iter().any(|re| re.is_match(&actual)),
        }
    }
}

fn compile(filters: &[Filter]) -> ProviderResult<Vec<CompiledFilter<'_>>> {
    filters
        .iter()
        .enumerate()
        .map(|(i, filter)| {
            let matcher = if filter.use_regex {
                let patterns = filter
                    .values
                    .iter()
                    .map(|v| {
                        Regex::new(v).map_err(|e| {
                            ProviderError::validation(
                                format!("{}.{}.values", FILTER_KEY, i),
                                format!("invalid regular expression '{}': {}", v, e),
                            )
                        })
                    })
                    .collect::<ProviderResult<Vec<_>>>()?;
                Matcher::Pattern(patterns)
            } else {
                Matcher::Exact(filter.values.clone())
            };
            Ok(CompiledFilter {
                name: &filter.name,
                matcher,
            })
        })
        .collect()
}

/// Keep the rows matching every filter, preserving their order
pub fn apply_filters(filters: &[Filter], rows: Vec<Attributes>) -> ProviderResult<Vec<Attributes>> {
    if filters.is_empty() {
        return Ok(rows);
    }
    let compiled = compile(filters)?;
    Ok(rows
        .into_iter()
        .filter(|row| compiled.iter().all(|f| f.matches(row)))
        .collect())
}
