//! Name to abbreviation lookup for the Australian states and territories.

use serde_json::{Map, Value};

/// Label used for a boundary feature with no usable name property.
pub const UNNAMED: &str = "Unknown";

pub const ABBREVIATIONS: [(&str, &str); 8] = [
    ("New South Wales", "NSW"),
    ("Victoria", "VIC"),
    ("Queensland", "QLD"),
    ("South Australia", "SA"),
    ("Western Australia", "WA"),
    ("Tasmania", "TAS"),
    ("Northern Territory", "NT"),
    ("Australian Capital Territory", "ACT"),
];

/// Boundary datasets disagree on the property holding the state name; the
/// first non-empty one in this order wins.
const NAME_PROPERTIES: [&str; 5] = ["STATE_NAME", "name", "STATE", "STATE_NAM", "st_name"];

pub fn abbreviation_for(name: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(full, _)| *full == name)
        .map(|(_, abbr)| *abbr)
}

pub fn name_for(code: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(_, abbr)| *abbr == code)
        .map(|(full, _)| *full)
}

pub fn feature_name(properties: Option<&Map<String, Value>>) -> Option<String> {
    let props = properties?;
    NAME_PROPERTIES.iter().find_map(|key| match props.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookups_are_inverse() {
        for (name, abbr) in ABBREVIATIONS {
            assert_eq!(abbreviation_for(name), Some(abbr));
            assert_eq!(name_for(abbr), Some(name));
        }
        assert_eq!(abbreviation_for("Jervis Bay Territory"), None);
    }

    #[test]
    fn feature_name_prefers_state_name() {
        let props = json!({ "name": "Victoria", "STATE_NAME": "Tasmania" });
        assert_eq!(
            feature_name(props.as_object()).as_deref(),
            Some("Tasmania")
        );
    }

    #[test]
    fn feature_name_skips_empty_and_non_string() {
        let props = json!({ "STATE_NAME": "", "name": 7, "STATE": "Queensland" });
        assert_eq!(
            feature_name(props.as_object()).as_deref(),
            Some("Queensland")
        );
        assert_eq!(feature_name(None), None);
    }
}
