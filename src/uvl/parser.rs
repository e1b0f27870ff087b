// src/uvl/parser.rs

//! Line-scanning parser for UVL content.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Relation kind introduced by a group keyword line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKind {
    Mandatory,
    Optional,
    Alternative,
    Or,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Mandatory,
        GroupKind::Optional,
        GroupKind::Alternative,
        GroupKind::Or,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Mandatory => "mandatory",
            GroupKind::Optional => "optional",
            GroupKind::Alternative => "alternative",
            GroupKind::Or => "or",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = String;

    /// Only an exact keyword matches; `optional_x` or `Or` are feature names
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mandatory" => Ok(GroupKind::Mandatory),
            "optional" => Ok(GroupKind::Optional),
            "alternative" => Ok(GroupKind::Alternative),
            "or" => Ok(GroupKind::Or),
            _ => Err(format!("Not a group keyword: {s}")),
        }
    }
}

/// Feature names per relation kind
///
/// Each list holds the features declared under the most recently seen
/// keyword of that kind; a repeated keyword starts the list over.
/// All four groups always exist, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureHierarchy {
    mandatory: Vec<String>,
    optional: Vec<String>,
    alternative: Vec<String>,
    or: Vec<String>,
}

impl FeatureHierarchy {
    pub fn group(&self, kind: GroupKind) -> &[String] {
        match kind {
            GroupKind::Mandatory => &self.mandatory,
            GroupKind::Optional => &self.optional,
            GroupKind::Alternative => &self.alternative,
            GroupKind::Or => &self.or,
        }
    }

    fn group_mut(&mut self, kind: GroupKind) -> &mut Vec<String> {
        match kind {
            GroupKind::Mandatory => &mut self.mandatory,
            GroupKind::Optional => &mut self.optional,
            GroupKind::Alternative => &mut self.alternative,
            GroupKind::Or => &mut self.or,
        }
    }

    /// Number of features in the given group
    pub fn count(&self, kind: GroupKind) -> usize {
        self.group(kind).len()
    }
}

/// Result of scanning one UVL file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModel {
    /// Every feature line in order of appearance
    pub features: Vec<String>,
    pub hierarchy: FeatureHierarchy,
    /// Raw lines after the `constraints` keyword
    pub constraints: Vec<String>,
}

impl ParsedModel {
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// Scan UVL text
///
/// Lines are trimmed. Lines starting with `features` are skipped, an exact
/// group keyword switches the current group, and the first line starting
/// with `constraints` ends feature collection. Every other non-empty line is
/// a feature (double quotes removed) or, past the switch, a constraint.
/// Never fails: empty or garbage input yields empty or misclassified entries.
pub fn parse(content: &str) -> ParsedModel {
    let mut model = ParsedModel::default();
    let mut current: Option<GroupKind> = None;
    let mut in_constraints = false;

    for raw in content.lines() {
        let line = raw.trim();

        if in_constraints {
            if !line.is_empty() {
                model.constraints.push(line.to_string());
            }
            continue;
        }

        if line.starts_with("features") {
            continue;
        }
        if line.starts_with("constraints") {
            in_constraints = true;
            continue;
        }
        if let Ok(kind) = line.parse::<GroupKind>() {
            current = Some(kind);
            model.hierarchy.group_mut(kind).clear();
            continue;
        }

        let feature = line.replace('"', "");
        if feature.is_empty() {
            continue;
        }
        if let Some(kind) = current {
            model.hierarchy.group_mut(kind).push(feature.clone());
        }
        model.features.push(feature);
    }

    model
}

/// Read and scan a UVL file
///
/// Only the read can fail; see [`parse`].
pub fn parse_file(path: &Path) -> Result<ParsedModel> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;
    Ok(parse(&content))
}
