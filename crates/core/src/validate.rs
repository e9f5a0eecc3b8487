//! Advisory check that generated markup only uses approved brand classes.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::brand::BrandStyleSet;
use crate::markup::attributes;

/// Outcome of checking one template. Never blocks the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Distinct class tokens used by the template.
    pub total_classes: usize,
    pub approved_count: usize,
    /// Unapproved class tokens, sorted.
    pub violations: Vec<String>,
    pub is_valid: bool,
}

/// Distinct whitespace-separated tokens of every literal `class="..."`
/// attribute. Bound forms such as `[class]` or `ngClass` are not counted.
pub fn used_classes(markup: &str) -> BTreeSet<&str> {
    attributes(markup)
        .into_iter()
        .filter(|a| a.name == "class")
        .flat_map(|a| a.value.split_whitespace())
        .collect()
}

pub fn validate(markup: &str, approved: &BrandStyleSet) -> ValidationReport {
    let used = used_classes(markup);
    let (ok, bad): (Vec<&str>, Vec<&str>) = used.iter().copied().partition(|c| approved.contains(c));

    let report = ValidationReport {
        total_classes: used.len(),
        approved_count: ok.len(),
        is_valid: bad.is_empty(),
        violations: bad.into_iter().map(str::to_string).collect(),
    };

    if report.is_valid {
        tracing::info!(classes = report.total_classes, "all classes approved");
    } else {
        tracing::warn!(
            count = report.violations.len(),
            violations = %report.violations.join(", "),
            "template uses unapproved classes"
        );
    }
    report
}
