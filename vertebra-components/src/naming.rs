//! Wire naming: internal `snake_case` keys to dashboard `camelCase`

use serde_json::{Map, Value as JsonValue};

/// Convert an underscore-separated key to camelCase.
///
/// The first non-empty segment is lower-cased, later segments are
/// capitalized, and every empty segment (leading, trailing or doubled
/// underscore) becomes a literal `_`.
pub fn underscore_to_camel_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut first = true;

    for segment in value.split('_') {
        if segment.is_empty() {
            result.push('_');
        } else if first {
            result.push_str(&segment.to_lowercase());
            first = false;
        } else {
            let mut chars = segment.chars();
            if let Some(head) = chars.next() {
                result.extend(head.to_uppercase());
                result.push_str(&chars.as_str().to_lowercase());
            }
        }
    }

    result
}

/// Copy of `parameters` with every key camel-cased
pub fn camel_case_parameters(parameters: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    parameters
        .iter()
        .map(|(key, value)| (underscore_to_camel_case(key), value.clone()))
        .collect()
}
