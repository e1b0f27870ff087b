// src/convert/glencoe.rs

//! Glencoe JSON: a flat feature table, a tree of ids and the constraints

use super::outline::{FeatureDocument, FeatureNode, interpret};
use crate::error::{Error, Result};
use crate::uvl::GroupKind;
use serde_json::{Map, Value, json};

fn tree_node(feature: &FeatureNode) -> Value {
    let children: Vec<Value> = feature
        .groups
        .iter()
        .flat_map(|g| g.members.iter().map(tree_node))
        .collect();
    if children.is_empty() {
        json!({ "id": feature.name })
    } else {
        json!({ "id": feature.name, "children": children })
    }
}

fn add_features(
    feature: &FeatureNode,
    optional: bool,
    table: &mut Map<String, Value>,
) {
    let group_type = feature.groups.iter().find_map(|g| match g.kind {
        GroupKind::Alternative => Some("xor"),
        GroupKind::Or => Some("or"),
        _ => None,
    });

    let mut entry = json!({
        "id": feature.name,
        "name": feature.name,
        "type": "FEATURE",
        "optional": optional,
        "abstract": false,
        "hidden": false,
    });
    if let (Some(kind), Value::Object(fields)) = (group_type, &mut entry) {
        fields.insert("group".to_string(), Value::String(kind.to_string()));
    }
    table.insert(feature.name.clone(), entry);

    for group in &feature.groups {
        let member_optional = group.kind != GroupKind::Mandatory;
        for member in &group.members {
            add_features(member, member_optional, table);
        }
    }
}

fn render(document: &FeatureDocument, model_name: &str) -> Value {
    let mut features = Map::new();
    for root in &document.roots {
        add_features(root, false, &mut features);
    }

    let tree = match document.roots.as_slice() {
        [single] => tree_node(single),
        roots => json!({
            "id": model_name,
            "children": roots.iter().map(tree_node).collect::<Vec<_>>(),
        }),
    };

    let constraints: Vec<Value> = document
        .constraints
        .iter()
        .enumerate()
        .map(|(i, text)| json!({ "id": format!("c{}", i + 1), "text": text }))
        .collect();

    json!({
        "id": model_name,
        "name": model_name,
        "features": features,
        "tree": tree,
        "constraints": constraints,
    })
}

pub fn to_glencoe(content: &str, model_name: &str) -> Result<String> {
    let value = render(&interpret(content), model_name);
    serde_json::to_string_pretty(&value)
        .map_err(|e| Error::ConversionError(format!("Glencoe serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_table_and_tree() {
        let model = "features\n    Chat\n        mandatory\n            Connection\n                alternative\n                    Server\n                    P2P\n        optional\n            Emoji\nconstraints\n    Emoji => Server\n";
        let value: Value = serde_json::from_str(&to_glencoe(model, "chat").unwrap()).unwrap();

        assert_eq!(value["id"], "chat");
        assert_eq!(value["tree"]["id"], "Chat");
        assert_eq!(value["tree"]["children"][0]["children"][1]["id"], "P2P");
        assert_eq!(value["features"]["Connection"]["optional"], false);
        assert_eq!(value["features"]["Connection"]["group"], "xor");
        assert_eq!(value["features"]["Emoji"]["optional"], true);
        assert!(value["features"]["Chat"].get("group").is_none());
        assert_eq!(value["constraints"][0]["text"], "Emoji => Server");
    }

    #[test]
    fn test_several_roots_share_synthetic_root() {
        let value: Value = serde_json::from_str(&to_glencoe("A\nB\n", "m").unwrap()).unwrap();
        assert_eq!(value["tree"]["id"], "m");
        assert_eq!(value["tree"]["children"].as_array().unwrap().len(), 2);
    }
}
