// src/convert/yaml.rs

//! Human-readable-config rendition of a feature model
//!
//! Groups become sequences; a leaf is a plain string and a feature with
//! children a single-key mapping. Constraints of the form `A => B` or
//! `A: B` become `constraints` entries, any other constraint line is kept
//! verbatim under `expressions`.

use super::outline::{FeatureNode, implication, interpret};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};

fn member_value(feature: &FeatureNode) -> Value {
    if feature.is_leaf() {
        return Value::String(feature.name.clone());
    }
    let mut single = Mapping::new();
    single.insert(Value::String(feature.name.clone()), groups_value(feature));
    Value::Mapping(single)
}

fn groups_value(feature: &FeatureNode) -> Value {
    let mut groups = Mapping::new();
    for group in &feature.groups {
        let entry = groups
            .entry(Value::String(group.kind.as_str().to_string()))
            .or_insert(Value::Sequence(Vec::new()));
        if let Value::Sequence(members) = entry {
            members.extend(group.members.iter().map(member_value));
        }
    }
    Value::Mapping(groups)
}

pub fn to_yaml(content: &str) -> Result<String> {
    let document = interpret(content);

    let mut features = Mapping::new();
    for root in &document.roots {
        features.insert(Value::String(root.name.clone()), groups_value(root));
    }

    let mut constraints = Mapping::new();
    let mut expressions = Vec::new();
    for line in &document.constraints {
        let pair = match implication(line)? {
            Some(pair) => Some(pair),
            None => line
                .split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string())),
        };
        match pair {
            Some((key, value)) => {
                constraints.insert(Value::String(key), Value::String(value));
            }
            None => expressions.push(Value::String(line.clone())),
        }
    }

    let mut root = Mapping::new();
    root.insert("features".into(), Value::Mapping(features));
    root.insert("constraints".into(), Value::Mapping(constraints));
    if !expressions.is_empty() {
        root.insert("expressions".into(), Value::Sequence(expressions));
    }

    serde_yaml::to_string(&Value::Mapping(root))
        .map_err(|e| Error::ConversionError(format!("YAML serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "features\n    Chat\n        mandatory\n            Connection\n                alternative\n                    Server\n                    P2P\n            Messages\n        optional\n            Emoji\nconstraints\n    Emoji => Server\n    Priority: High\n    Server | P2P\n";

    #[test]
    fn test_structure() {
        let yaml = to_yaml(MODEL).unwrap();
        let value: Value = serde_yaml::from_str(&yaml).unwrap();

        let mandatory = &value["features"]["Chat"]["mandatory"];
        assert_eq!(mandatory[0]["Connection"]["alternative"][1], "P2P");
        assert_eq!(mandatory[1], "Messages");
        assert_eq!(value["features"]["Chat"]["optional"][0], "Emoji");
        assert_eq!(value["constraints"]["Emoji"], "Server");
        assert_eq!(value["constraints"]["Priority"], "High");
        assert_eq!(value["expressions"][0], "Server | P2P");
    }

    #[test]
    fn test_bad_implication() {
        assert!(matches!(
            to_yaml("constraints\n    A => B => C\n"),
            Err(Error::ConversionError(_))
        ));
    }
}
