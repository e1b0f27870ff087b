// src/convert/outline.rs

//! Indentation-based reading of UVL text for the converters
//!
//! Unlike [`crate::uvl::parser`], which only needs flat group lists, the
//! converters need nesting. Nesting follows indentation: a line is a child
//! of the closest preceding line with a smaller indent. Tabs count as four
//! columns. Nesting stops at [`MAX_DEPTH`]; deeper lines become siblings of
//! the deepest open line. Like the scanner, this never fails on malformed
//! input.

use crate::error::{Error, Result};
use crate::uvl::GroupKind;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const TAB_WIDTH: usize = 4;

/// Deepest nesting kept in the outline; every writer recurses over it
pub const MAX_DEPTH: usize = 256;

/// One non-blank line and the lines nested under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub text: String,
    pub children: Vec<OutlineNode>,
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Build the indentation tree of `content`, skipping blank lines
pub fn outline(content: &str) -> Vec<OutlineNode> {
    // (indent, node) for the current chain of open ancestors
    let mut stack: Vec<(usize, OutlineNode)> = Vec::new();
    let mut roots = Vec::new();
    let mut flattened = 0usize;

    for line in content.lines() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let indent = indent_width(line);

        while stack.last().is_some_and(|(open, _)| *open >= indent) {
            close_top(&mut stack, &mut roots);
        }
        if stack.len() >= MAX_DEPTH {
            close_top(&mut stack, &mut roots);
            flattened += 1;
        }
        stack.push((
            indent,
            OutlineNode {
                text: text.to_string(),
                children: Vec::new(),
            },
        ));
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    if flattened > 0 {
        debug!(
            "Flattened {} line(s) nested deeper than {} levels",
            flattened, MAX_DEPTH
        );
    }

    roots
}

fn close_top(stack: &mut Vec<(usize, OutlineNode)>, roots: &mut Vec<OutlineNode>) {
    if let Some((_, node)) = stack.pop() {
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Feature with the groups declared beneath it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureNode {
    pub name: String,
    pub groups: Vec<FeatureGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGroup {
    pub kind: GroupKind,
    pub members: Vec<FeatureNode>,
}

impl FeatureNode {
    pub fn is_leaf(&self) -> bool {
        self.groups.iter().all(|g| g.members.is_empty())
    }

    /// Depth-first visit of this feature and its descendants
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a FeatureNode)) {
        visit(self);
        for group in &self.groups {
            for member in &group.members {
                member.walk(visit);
            }
        }
    }
}

/// Features and constraints recovered from UVL text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureDocument {
    pub roots: Vec<FeatureNode>,
    /// Constraint lines, trimmed
    pub constraints: Vec<String>,
}

impl FeatureDocument {
    /// Every feature, depth first
    pub fn features(&self) -> Vec<&FeatureNode> {
        let mut all = Vec::new();
        for root in &self.roots {
            root.walk(&mut |node| all.push(node));
        }
        all
    }
}

/// Strip every double quote from a feature name
pub fn clean_name(text: &str) -> String {
    text.replace('"', "")
}

/// Interpret UVL text as a feature tree
///
/// Children of the `features` line are root features; a group keyword
/// under a feature opens a group; a feature line directly under another
/// feature joins that feature's most recent group and is dropped when no
/// group is open. Without a `features` line every top-level line other than
/// `constraints` is treated as a root feature.
pub fn interpret(content: &str) -> FeatureDocument {
    let nodes = outline(content);
    let mut document = FeatureDocument::default();
    let has_features_header = nodes.iter().any(|n| n.text.starts_with("features"));

    for node in &nodes {
        if node.text.starts_with("constraints") {
            collect_constraints(node, &mut document.constraints);
        } else if node.text.starts_with("features") {
            document
                .roots
                .extend(node.children.iter().filter_map(feature_from));
        } else if !has_features_header {
            document.roots.extend(feature_from(node));
        }
    }

    document
}

fn collect_constraints(node: &OutlineNode, out: &mut Vec<String>) {
    for child in &node.children {
        out.push(child.text.clone());
        collect_constraints(child, out);
    }
}

fn feature_from(node: &OutlineNode) -> Option<FeatureNode> {
    if node.text.parse::<GroupKind>().is_ok() {
        return None;
    }
    let name = clean_name(&node.text);
    if name.is_empty() {
        return None;
    }

    let mut groups: Vec<FeatureGroup> = Vec::new();
    for child in &node.children {
        if let Ok(kind) = child.text.parse::<GroupKind>() {
            groups.push(FeatureGroup {
                kind,
                members: child.children.iter().filter_map(feature_from).collect(),
            });
        } else if let (Some(group), Some(feature)) = (groups.last_mut(), feature_from(child)) {
            group.members.push(feature);
        }
    }

    Some(FeatureNode { name, groups })
}

/// Split an implication line into its two sides
///
/// Lines without `=>`, and equivalences (`<=>`), yield `None`. An
/// implication with more than two sides is rejected.
pub fn implication(line: &str) -> Result<Option<(String, String)>> {
    if line.contains("<=>") || !line.contains("=>") {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split("=>").collect();
    match parts.as_slice() {
        [left, right] => Ok(Some((clean_name(left.trim()), clean_name(right.trim())))),
        _ => Err(Error::ConversionError(format!(
            "Constraint '{line}' does not split into two sides"
        ))),
    }
}

/// One literal of a clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub name: String,
    pub negated: bool,
}

static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(!?)\s*("[^"]+"|[A-Za-z_][A-Za-z0-9_.]*)$"#).unwrap());

fn literal(text: &str) -> Option<Literal> {
    let caps = LITERAL_RE.captures(text.trim())?;
    Some(Literal {
        name: clean_name(&caps[2]),
        negated: !caps[1].is_empty(),
    })
}

fn disjunction(text: &str) -> Option<Vec<Literal>> {
    text.split('|').map(literal).collect()
}

fn negate(mut literal: Literal) -> Literal {
    literal.negated = !literal.negated;
    literal
}

/// Translate a simple constraint into CNF clauses
///
/// Supports a literal, a disjunction of literals, `A => B`, `A <=> B`, and
/// implications whose sides are a literal or a disjunction on the right /
/// a conjunction on the left. Anything else yields `None`.
pub fn constraint_clauses(text: &str) -> Option<Vec<Vec<Literal>>> {
    let text = text.trim();

    if let Some((left, right)) = text.split_once("<=>") {
        let (a, b) = (literal(left)?, literal(right)?);
        return Some(vec![
            vec![negate(a.clone()), b.clone()],
            vec![a, negate(b)],
        ]);
    }

    if let Some((left, right)) = text.split_once("=>") {
        let premises: Vec<Literal> = left
            .split('&')
            .map(literal)
            .collect::<Option<Vec<_>>>()?;
        let conclusions = disjunction(right)?;
        let mut clause: Vec<Literal> = premises.into_iter().map(negate).collect();
        clause.extend(conclusions);
        return Some(vec![clause]);
    }

    if text.contains('&') {
        return text
            .split('&')
            .map(|part| literal(part).map(|l| vec![l]))
            .collect();
    }

    disjunction(text).map(|clause| vec![clause])
}
