//! Composite identifiers for child resources
//!
//! Child objects (routing rules, DNS records, load-balancer children,
//! auto-scaling policies) are addressed through their parent. The engine
//! stores a single string, so both parts are joined with [`DELIMITER`].

use std::fmt;
use std::str::FromStr;

use crate::provider::ProviderError;

pub const DELIMITER: char = ':';

/// Parent and child identifiers of a nested remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    pub parent: String,
    pub child: String,
}

impl CompositeId {
    /// Build a composite ID, rejecting parts that are empty or contain the delimiter
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Result<Self, ProviderError> {
        let parent = parent.into();
        let child = child.into();
        check_part("parent", &parent)?;
        check_part("child", &child)?;
        Ok(Self { parent, child })
    }

    /// Serialised form handed to the engine
    pub fn merge(&self) -> String {
        format!("{}{}{}", self.parent, DELIMITER, self.child)
    }

    /// Parse an engine ID of the form `parent:child`
    pub fn split(id: &str) -> Result<Self, ProviderError> {
        let mut parts = id.split(DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(parent), Some(child), None) if !parent.is_empty() && !child.is_empty() => {
                Ok(Self {
                    parent: parent.to_string(),
                    child: child.to_string(),
                })
            }
            _ => Err(ProviderError::validation(
                "id",
                format!("malformed composite id '{}', expected parent{}child", id, DELIMITER),
            )),
        }
    }
}

fn check_part(which: &str, part: &str) -> Result<(), ProviderError> {
    if part.is_empty() {
        return Err(ProviderError::validation(
            "id",
            format!("{} id of a composite id must not be empty", which),
        ));
    }
    if part.contains(DELIMITER) {
        return Err(ProviderError::validation(
            "id",
            format!("{} id '{}' must not contain '{}'", which, part, DELIMITER),
        ));
    }
    Ok(())
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.parent, DELIMITER, self.child)
    }
}

impl FromStr for CompositeId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn merge_joins_with_delimiter() {
        let id = CompositeId::new("RTB-1", "RULE-9").unwrap();
        assert_eq!(id.merge(), "RTB-1:RULE-9");
        assert_eq!(id.to_string(), "RTB-1:RULE-9");
    }

    #[test]
    fn split_rejects_malformed_ids() {
        for bad in ["", "RTB-1", ":RULE", "RTB:", "a:b:c"] {
            let err = CompositeId::split(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{bad}");
            assert_eq!(err.attribute.as_deref(), Some("id"));
        }
    }

    #[test]
    fn new_rejects_delimiter_in_parts() {
        assert!(CompositeId::new("a:b", "c").is_err());
        assert!(CompositeId::new("a", "").is_err());
    }

    #[test]
    fn parses_through_from_str() {
        let id: CompositeId = "LB-1:PROFILE-2".parse().unwrap();
        assert_eq!(id.parent, "LB-1");
        assert_eq!(id.child, "PROFILE-2");
    }

    proptest! {
        #[test]
        fn merge_then_split_round_trips(parent in "[A-Za-z0-9_-]{1,24}", child in "[A-Za-z0-9_.-]{1,24}") {
            let id = CompositeId::new(parent.clone(), child.clone()).unwrap();
            let parsed = CompositeId::split(&id.merge()).unwrap();
            prop_assert_eq!(parsed.parent, parent);
            prop_assert_eq!(parsed.child, child);
        }
    }
}
