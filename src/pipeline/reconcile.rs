//! Reconciler: compare the computed sum against the printed total.
//!
//! This is the one piece of genuine domain logic in the service: a pure,
//! deterministic function over two numbers and a tolerance, with no side
//! effects. Everything else in the pipeline is I/O plumbing around it.

use crate::output::round2;

/// Result of the mathematical check.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// `|calculated - printed|`.
    pub difference: f64,
    /// A warning when the difference exceeds the tolerance, `None` when the
    /// totals agree or the check was skipped.
    pub warning: Option<String>,
    /// True when no printed total was available to judge against.
    pub skipped: bool,
}

/// Run the tolerance check.
///
/// A `printed` total of zero or less means the model found no grand total
/// on the document; with nothing to compare against, the check is skipped
/// rather than reported as a pass or a failure.
pub fn reconcile(calculated: f64, printed: f64, tolerance: f64) -> ReconcileOutcome {
    let difference = (calculated - printed).abs();

    if printed <= 0.0 {
        return ReconcileOutcome {
            difference,
            warning: None,
            skipped: true,
        };
    }

    let warning = if difference > tolerance {
        Some(format!(
            "Mathematical Check Failed: AI Extracted Sum ({}) != Bill Total ({})",
            round2(calculated),
            round2(printed)
        ))
    } else {
        None
    };

    ReconcileOutcome {
        difference,
        warning,
        skipped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_difference_within_tolerance_passes() {
        let outcome = reconcile(1000.0, 1000.5, 1.0);
        assert!(outcome.warning.is_none());
        assert!(!outcome.skipped);
        assert!((outcome.difference - 0.5).abs() < 1e-9);
    }

    #[test]
    fn large_difference_emits_exactly_one_warning_with_both_values() {
        let outcome = reconcile(1000.0, 1050.0, 1.0);
        let warning = outcome.warning.expect("should warn");
        assert!(warning.contains("1000"), "got: {warning}");
        assert!(warning.contains("1050"), "got: {warning}");
        assert!(warning.starts_with("Mathematical Check Failed"));
    }

    #[test]
    fn zero_printed_total_skips_the_check() {
        let outcome = reconcile(999999.0, 0.0, 1.0);
        assert!(outcome.warning.is_none());
        assert!(outcome.skipped);
    }

    #[test]
    fn negative_printed_total_skips_the_check() {
        let outcome = reconcile(100.0, -50.0, 1.0);
        assert!(outcome.warning.is_none());
        assert!(outcome.skipped);
    }

    #[test]
    fn difference_exactly_at_tolerance_passes() {
        let outcome = reconcile(100.0, 101.0, 1.0);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn warning_values_are_rounded_to_two_decimals() {
        let outcome = reconcile(100.456, 150.0, 1.0);
        let warning = outcome.warning.expect("should warn");
        assert!(warning.contains("(100.46)"), "got: {warning}");
        assert!(warning.contains("(150)"), "got: {warning}");
    }

    #[test]
    fn deterministic_and_idempotent() {
        let a = reconcile(123.45, 200.0, 1.0);
        let b = reconcile(123.45, 200.0, 1.0);
        assert_eq!(a, b);
    }
}
