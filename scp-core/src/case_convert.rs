//! Case conversion utilities between API field names and attribute keys
//!
//! Attribute keys use snake_case (e.g., `vpc_name`, `subnet_cidr_block`).
//! Response fields use camelCase on the wire (`vpcName`) and PascalCase in
//! type names (`VpcName`). The conversion is mechanical: every uppercase
//! letter starts a new segment, so it round-trips in both directions.

/// Convert PascalCase or camelCase to snake_case
/// e.g., "VpcName" -> "vpc_name", "vpcName" -> "vpc_name"
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Convert snake_case to PascalCase
/// e.g., "vpc_name" -> "VpcName"
pub fn to_pascal_case(s: &str) -> String {
    s.split('_').map(capitalize_first).collect()
}

/// Convert snake_case to camelCase
/// e.g., "vpc_name" -> "vpcName"
pub fn to_camel_case(s: &str) -> String {
    let mut parts = s.split('_');
    let mut result = parts.next().unwrap_or_default().to_string();
    for part in parts {
        result.push_str(&capitalize_first(part));
    }
    result
}

/// Capitalize first letter of a string
/// e.g., "enabled" -> "Enabled"
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Normalize a field name given in either form to its attribute key
pub fn attribute_key(name: &str) -> String {
    if name.contains('_') || name.chars().all(|c| !c.is_uppercase()) {
        name.to_string()
    } else {
        to_snake_case(name)
    }
}
