// src/uvl/mod.rs

//! UVL feature-model files
//!
//! UVL ("Universal Variability Language") describes a feature hierarchy with
//! `mandatory`, `optional`, `alternative` and `or` groups followed by a
//! `constraints` section:
//!
//! ```text
//! features
//!     Chat
//!         mandatory
//!             Connection
//!                 alternative
//!                     "Peer 2 Peer"
//!                     Server
//!         optional
//!             Emoticons
//! constraints
//!     Emoticons => Server
//! ```
//!
//! The scanner here is deliberately permissive: it never validates the
//! grammar and never fails. Malformed input degrades into misclassified
//! entries instead of errors.

pub mod metrics;
pub mod parser;

pub use metrics::{ModelMetrics, calculate, product_count};
pub use parser::{FeatureHierarchy, GroupKind, ParsedModel, parse, parse_file};

/// File extension required for feature-model uploads
pub const UVL_EXTENSION: &str = "uvl";

/// Check whether a filename carries the `.uvl` suffix
pub fn has_uvl_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext == UVL_EXTENSION)
}

/// Replace the `.uvl` suffix of `filename` with `extension`
pub fn with_extension(filename: &str, extension: &str) -> String {
    let stem = filename
        .strip_suffix(&format!(".{UVL_EXTENSION}"))
        .unwrap_or(filename);
    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_uvl_extension() {
        assert!(has_uvl_extension("model.uvl"));
        assert!(has_uvl_extension("model (1).uvl"));
        assert!(!has_uvl_extension("model.UVL"));
        assert!(!has_uvl_extension("model.txt"));
        assert!(!has_uvl_extension(".uvl"));
        assert!(!has_uvl_extension("uvl"));
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("chat.uvl", "json"), "chat.json");
        assert_eq!(with_extension("chat (2).uvl", "yaml"), "chat (2).yaml");
    }
}
