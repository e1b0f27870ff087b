// src/uvl/metrics.rs

//! Feature and product counts derived from a scanned model.
//!
//! The product estimate is `2^optional * alternative * (2^or - 1)`:
//! every optional feature is independently in or out, the alternative group
//! contributes its raw feature count as a multiplier (1 when the group is
//! empty), and the or group contributes every non-empty subset. The
//! alternative factor conflates "choose one of N" with "N"; it is kept as
//! the counting policy the hub has always published.

use super::parser::{FeatureHierarchy, GroupKind, ParsedModel};

/// Per-file metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelMetrics {
    pub feature_count: u64,
    pub product_count: u64,
}

/// Compute metrics for one scanned model
pub fn calculate(model: &ParsedModel) -> ModelMetrics {
    ModelMetrics {
        feature_count: model.features.len() as u64,
        product_count: product_count(&model.hierarchy),
    }
}

/// Estimated number of products, saturating at `u64::MAX`
pub fn product_count(hierarchy: &FeatureHierarchy) -> u64 {
    let optional = hierarchy.count(GroupKind::Optional);
    let alternative = hierarchy.count(GroupKind::Alternative);
    let or = hierarchy.count(GroupKind::Or);

    let alternative_factor = if alternative == 0 { 1 } else { alternative as u64 };
    let or_factor = pow2(or).saturating_sub(1);

    1u64.saturating_mul(pow2(optional))
        .saturating_mul(alternative_factor)
        .saturating_mul(or_factor)
}

fn pow2(n: usize) -> u64 {
    u32::try_from(n)
        .ok()
        .and_then(|n| 1u64.checked_shl(n))
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uvl::parser::parse;

    #[test]
    fn test_optional_and_or_without_alternative() {
        let model = parse("features\nRoot\noptional\nA\nB\nC\nor\nD\nE\n");
        let metrics = calculate(&model);
        // 2^3 * 1 * (2^2 - 1)
        assert_eq!(metrics.product_count, 24);
        assert_eq!(metrics.feature_count, 6);
    }

    #[test]
    fn test_alternative_multiplies_by_raw_count() {
        let model = parse("alternative\nA\nB\nC\nor\nD\n");
        // 1 * 3 * (2^1 - 1)
        assert_eq!(product_count(&model.hierarchy), 3);
    }

    #[test]
    fn test_empty_or_group_zeroes_the_estimate() {
        let model = parse("optional\nA\nB\n");
        assert_eq!(product_count(&model.hierarchy), 0);
    }

    #[test]
    fn test_mandatory_does_not_contribute() {
        let with = parse("mandatory\nX\nY\nor\nA\n");
        let without = parse("or\nA\n");
        assert_eq!(product_count(&with.hierarchy), product_count(&without.hierarchy));
    }

    #[test]
    fn test_saturates_on_huge_groups() {
        let mut content = String::from("or\n");
        for i in 0..70 {
            content.push_str(&format!("F{i}\n"));
        }
        content.push_str("optional\n");
        for i in 0..70 {
            content.push_str(&format!("G{i}\n"));
        }
        assert_eq!(product_count(&parse(&content).hierarchy), u64::MAX);
    }
}
