//! Well-known keys of the per-node configuration document.

use crate::identifiers::RegionIdentifier;
use serde_json::Value;

/// Region the node belongs to (string)
pub const REGION_KEY: &str = "region";

/// Marks the node as a resource pool (boolean)
pub const POOL_KEY: &str = "pool";

/// Build a lightweight client vertex instead of a full node (boolean)
pub const CLIENT_KEY: &str = "client";

/// Resource manager settings (object)
pub const RESOURCE_REPORT_KEY: &str = "resource-report";

/// Lenient boolean: JSON `true`, or a string equal to "true" ignoring case.
/// Everything else, including a missing value, is false.
pub fn parse_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Region named by the document. Non-string scalars are used in their JSON
/// form, so `"region": 5` names region "5".
pub fn region_from(config: &Value) -> Option<RegionIdentifier> {
    match config.get(REGION_KEY)? {
        Value::Null => None,
        Value::String(name) => Some(RegionIdentifier::new(name.as_str())),
        other => Some(RegionIdentifier::new(other.to_string())),
    }
}

pub fn is_pool(config: &Value) -> bool {
    parse_bool(config.get(POOL_KEY))
}

pub fn is_client(config: &Value) -> bool {
    parse_bool(config.get(CLIENT_KEY))
}
