// src/convert/dimacs.rs

//! DIMACS CNF encoding of the feature tree
//!
//! Variables are numbered depth first starting at 1 and named in `c`
//! comment lines. Each root is forced true. Group semantics:
//! - mandatory: child <=> parent
//! - optional: child => parent
//! - or: child => parent, parent => any child
//! - alternative: as `or`, plus at most one child
//!
//! Cross-tree constraints are added when they reduce to clauses over known
//! features; others are skipped.

use super::outline::{FeatureDocument, FeatureNode, Literal, constraint_clauses, interpret};
use crate::error::Result;
use crate::uvl::GroupKind;
use std::collections::HashMap;
use tracing::debug;

type Clause = Vec<i64>;

struct Encoding<'a> {
    names: Vec<&'a str>,
    index: HashMap<&'a str, i64>,
    clauses: Vec<Clause>,
}

impl<'a> Encoding<'a> {
    fn variable(&mut self, name: &'a str) -> i64 {
        if let Some(&var) = self.index.get(name) {
            return var;
        }
        self.names.push(name);
        let var = self.names.len() as i64;
        self.index.insert(name, var);
        var
    }

    fn encode_feature(&mut self, feature: &'a FeatureNode) -> i64 {
        let parent = self.variable(&feature.name);

        for group in &feature.groups {
            let members: Vec<i64> = group
                .members
                .iter()
                .map(|member| self.encode_feature(member))
                .collect();

            for &child in &members {
                self.clauses.push(vec![-child, parent]);
            }
            match group.kind {
                GroupKind::Mandatory => {
                    for &child in &members {
                        self.clauses.push(vec![-parent, child]);
                    }
                }
                GroupKind::Optional => {}
                GroupKind::Or | GroupKind::Alternative if members.is_empty() => {}
                GroupKind::Or | GroupKind::Alternative => {
                    let mut any = vec![-parent];
                    any.extend(&members);
                    self.clauses.push(any);

                    if group.kind == GroupKind::Alternative {
                        for (i, &a) in members.iter().enumerate() {
                            for &b in &members[i + 1..] {
                                self.clauses.push(vec![-a, -b]);
                            }
                        }
                    }
                }
            }
        }

        parent
    }

    fn literal(&self, literal: &Literal) -> Option<i64> {
        let var = *self.index.get(literal.name.as_str())?;
        Some(if literal.negated { -var } else { var })
    }

    fn add_constraint(&mut self, text: &str) {
        let Some(clauses) = constraint_clauses(text) else {
            debug!("Skipping constraint outside CNF subset: {}", text);
            return;
        };
        let encoded: Option<Vec<Clause>> = clauses
            .iter()
            .map(|clause| clause.iter().map(|l| self.literal(l)).collect::<Option<Clause>>())
            .collect();
        match encoded {
            Some(encoded) => self.clauses.extend(encoded),
            None => debug!("Skipping constraint over unknown feature: {}", text),
        }
    }
}

fn encode(document: &FeatureDocument) -> Encoding<'_> {
    let mut encoding = Encoding {
        names: Vec::new(),
        index: HashMap::new(),
        clauses: Vec::new(),
    };
    for root in &document.roots {
        let var = encoding.encode_feature(root);
        encoding.clauses.push(vec![var]);
    }
    for constraint in &document.constraints {
        encoding.add_constraint(constraint);
    }
    encoding
}

pub fn to_dimacs(content: &str, model_name: &str) -> Result<String> {
    let document = interpret(content);
    let encoding = encode(&document);

    let mut out = format!("c model {model_name}\n");
    for (i, name) in encoding.names.iter().enumerate() {
        out.push_str(&format!("c {} {}\n", i + 1, name));
    }
    out.push_str(&format!(
        "p cnf {} {}\n",
        encoding.names.len(),
        encoding.clauses.len()
    ));
    for clause in &encoding.clauses {
        for literal in clause {
            out.push_str(&format!("{literal} "));
        }
        out.push_str("0\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause_lines(cnf: &str) -> Vec<&str> {
        cnf.lines()
            .skip_while(|l| !l.starts_with("p cnf"))
            .skip(1)
            .collect()
    }

    #[test]
    fn test_alternative_group() {
        let cnf = to_dimacs(
            "features\n    Root\n        alternative\n            A\n            B\n",
            "m",
        )
        .unwrap();

        assert!(cnf.contains("c 1 Root\nc 2 A\nc 3 B\n"));
        assert!(cnf.contains("p cnf 3 5\n"));
        assert_eq!(
            clause_lines(&cnf),
            vec!["-2 1 0", "-3 1 0", "-1 2 3 0", "-2 -3 0", "1 0"]
        );
    }

    #[test]
    fn test_mandatory_and_constraints() {
        let cnf = to_dimacs(
            "features\n    Root\n        mandatory\n            A\n        optional\n            B\nconstraints\n    A => B\n    Unknown => A\n    sum(A) > 1\n",
            "m",
        )
        .unwrap();

        let clauses = clause_lines(&cnf);
        assert_eq!(clauses, vec!["-2 1 0", "-1 2 0", "-3 1 0", "1 0", "-2 3 0"]);
        assert!(cnf.contains("p cnf 3 5\n"));
    }
}
