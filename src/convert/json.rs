// src/convert/json.rs

//! Structured-data rendition of a feature model
//!
//! ```json
//! {
//!   "constraints": { "Server": "Data Storage" },
//!   "features": {
//!     "Chat": { "mandatory": { "Connection": { ... } }, "optional": { ... } }
//!   }
//! }
//! ```
//!
//! Leaves are empty objects. Constraints other than plain implications are
//! listed under `expressions`.

use super::outline::{FeatureNode, implication, interpret};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

fn feature_value(feature: &FeatureNode) -> Value {
    let mut groups = Map::new();
    for group in &feature.groups {
        let entry = groups
            .entry(group.kind.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(members) = entry {
            for member in &group.members {
                members.insert(member.name.clone(), feature_value(member));
            }
        }
    }
    Value::Object(groups)
}

pub fn to_json(content: &str) -> Result<String> {
    let document = interpret(content);

    let mut features = Map::new();
    for root in &document.roots {
        features.insert(root.name.clone(), feature_value(root));
    }

    let mut constraints = Map::new();
    let mut expressions = Vec::new();
    for line in &document.constraints {
        match implication(line)? {
            Some((left, right)) => {
                constraints.insert(left, Value::String(right));
            }
            None => expressions.push(Value::String(line.clone())),
        }
    }

    let mut root = Map::new();
    root.insert("features".to_string(), Value::Object(features));
    root.insert("constraints".to_string(), Value::Object(constraints));
    if !expressions.is_empty() {
        root.insert("expressions".to_string(), Value::Array(expressions));
    }

    serde_json::to_string_pretty(&Value::Object(root))
        .map_err(|e| Error::ConversionError(format!("JSON serialization failed: {e}")))
}
