// src/convert/splot.rs

//! SPLOT SXFM: a tab-indented feature tree and CNF constraints wrapped in
//! `<feature_model>` markup.

use super::outline::{FeatureNode, Literal, constraint_clauses, interpret};
use crate::error::Result;
use crate::uvl::GroupKind;
use quick_xml::escape::escape;
use tracing::debug;

fn feature_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

struct TreeWriter {
    out: String,
    groups: usize,
}

impl TreeWriter {
    fn line(&mut self, depth: usize, text: &str) {
        self.out.push_str(&"\t".repeat(depth));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn feature_line(&mut self, depth: usize, marker: &str, feature: &FeatureNode) {
        let text = format!(
            "{marker} {} ({})",
            escape(feature.name.as_str()),
            feature_id(&feature.name)
        );
        self.line(depth, &text);
        self.children(depth + 1, feature);
    }

    fn children(&mut self, depth: usize, feature: &FeatureNode) {
        for group in &feature.groups {
            match group.kind {
                GroupKind::Mandatory | GroupKind::Optional => {
                    let marker = if group.kind == GroupKind::Mandatory { ":m" } else { ":o" };
                    for member in &group.members {
                        self.feature_line(depth, marker, member);
                    }
                }
                GroupKind::Alternative | GroupKind::Or => {
                    if group.members.is_empty() {
                        continue;
                    }
                    self.groups += 1;
                    let bound = if group.kind == GroupKind::Alternative { "1" } else { "*" };
                    let header = format!(":g (_g_{}) [1,{bound}]", self.groups);
                    self.line(depth, &header);
                    for member in &group.members {
                        self.feature_line(depth + 1, ":", member);
                    }
                }
            }
        }
    }
}

fn render_literal(literal: &Literal) -> String {
    let id = feature_id(&literal.name);
    if literal.negated { format!("~{id}") } else { id }
}

pub fn to_splot(content: &str, model_name: &str) -> Result<String> {
    let document = interpret(content);

    let mut tree = TreeWriter {
        out: String::new(),
        groups: 0,
    };
    for root in &document.roots {
        tree.feature_line(0, ":r", root);
    }

    let mut constraints = String::new();
    let mut count = 0;
    for text in &document.constraints {
        let Some(clauses) = constraint_clauses(text) else {
            debug!("Skipping constraint outside CNF subset: {}", text);
            continue;
        };
        for clause in clauses {
            count += 1;
            let rendered: Vec<String> = clause.iter().map(render_literal).collect();
            constraints.push_str(&format!("C{count}: {}\n", rendered.join(" or ")));
        }
    }

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
         <feature_model name=\"{}\">\n\
         <feature_tree>\n{}</feature_tree>\n\
         <constraints>\n{}</constraints>\n\
         </feature_model>\n",
        escape(model_name),
        tree.out,
        constraints
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_and_constraints() {
        let model = "features\n    Chat\n        mandatory\n            Connection\n                alternative\n                    \"Peer 2 Peer\"\n                    Server\n        optional\n            \"A&B\"\nconstraints\n    Server => \"A&B\"\n";
        let sxfm = to_splot(model, "chat").unwrap();

        let expected_tree = ":r Chat (Chat)\n\t:m Connection (Connection)\n\t\t:g (_g_1) [1,1]\n\t\t\t: Peer 2 Peer (Peer_2_Peer)\n\t\t\t: Server (Server)\n\t:o A&amp;B (A_B)\n";
        assert!(sxfm.contains(expected_tree), "{sxfm}");
        assert!(sxfm.contains("<constraints>\nC1: ~Server or A_B\n</constraints>"));
        assert!(sxfm.contains("<feature_model name=\"chat\">"));
    }

    #[test]
    fn test_or_group_bound() {
        let sxfm = to_splot("R\n    or\n        A\n        B\n", "m").unwrap();
        assert!(sxfm.contains("\t:g (_g_1) [1,*]\n\t\t: A (A)\n"));
    }
}
