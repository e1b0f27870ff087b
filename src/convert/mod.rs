// src/convert/mod.rs

//! Alternate renditions of UVL feature models
//!
//! Conversion never touches the source file; it works on the text alone.
//! Two families exist:
//! - [`ExportFormat`]: structured-data, markup and config renditions offered
//!   for single dataset export
//! - [`InterchangeFormat`]: formats of other feature-model tools, produced
//!   for every file during bulk export
//!
//! All writers are deterministic: identical input gives identical bytes.

mod dimacs;
mod glencoe;
mod json;
pub mod outline;
mod splot;
mod xml;
mod yaml;

use crate::error::Result;
use std::fmt;
use std::str::FromStr;

pub use dimacs::to_dimacs;
pub use glencoe::to_glencoe;
pub use json::to_json;
pub use splot::to_splot;
pub use xml::to_xml;
pub use yaml::to_yaml;

/// Target of `export <dataset> --format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Xml,
    Yaml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Xml, ExportFormat::Yaml];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Yaml => "yaml",
        }
    }

    /// File extension of converted copies
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "xml" => Ok(ExportFormat::Xml),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            _ => Err(format!("Unknown export format: {s} (expected json, xml or yaml)")),
        }
    }
}

/// Formats written next to the originals by bulk export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterchangeFormat {
    Glencoe,
    Dimacs,
    Splot,
}

impl InterchangeFormat {
    pub const ALL: [InterchangeFormat; 3] = [
        InterchangeFormat::Glencoe,
        InterchangeFormat::Dimacs,
        InterchangeFormat::Splot,
    ];

    /// Archive folder holding this format's copies
    pub fn folder(&self) -> &'static str {
        match self {
            InterchangeFormat::Glencoe => "Glencoe",
            InterchangeFormat::Dimacs => "DIMACS",
            InterchangeFormat::Splot => "SPLOT",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            InterchangeFormat::Glencoe => "json",
            InterchangeFormat::Dimacs => "cnf",
            InterchangeFormat::Splot => "sxfm",
        }
    }
}

impl fmt::Display for InterchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

/// Convert UVL text into one of the export formats
pub fn convert(content: &str, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(content),
        ExportFormat::Xml => to_xml(content),
        ExportFormat::Yaml => to_yaml(content),
    }
}

/// Convert UVL text into an interchange format
///
/// `model_name` labels the model where the format has a slot for it,
/// usually the file stem.
pub fn convert_interchange(
    content: &str,
    model_name: &str,
    format: InterchangeFormat,
) -> Result<String> {
    match format {
        InterchangeFormat::Glencoe => to_glencoe(content, model_name),
        InterchangeFormat::Dimacs => to_dimacs(content, model_name),
        InterchangeFormat::Splot => to_splot(content, model_name),
    }
}
