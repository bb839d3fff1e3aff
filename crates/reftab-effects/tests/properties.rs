// Property-based tests for mode selection and differencing.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use reftab_effects::predicate::matches_equal;
use reftab_effects::{evaluate, ComparisonSpec, DatasetParameters, RuleSpec, ScalarValue, Table, Target, Verdict};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const COLUMNS: [&str; 3] = ["OPT_ELEM", "CENWAVE", "SEGMENT"];

fn disptab_rule() -> RuleSpec {
    RuleSpec::new(
        "COSDISPTAB",
        [
            ("opt_elem", ComparisonSpec::default()),
            ("cenwave", ComparisonSpec::default()),
        ],
    )
    .unwrap()
}

fn params() -> DatasetParameters {
    [("OPT_ELEM", "G140L"), ("CENWAVE", "1280")].into_iter().collect()
}

/// A row drawn from a small vocabulary so selections are often non-empty.
fn arb_row() -> impl Strategy<Value = Vec<String>> {
    (
        prop_oneof![Just("G140L"), Just("G130M"), Just("ANY")],
        prop_oneof![Just("1280"), Just("1291"), Just("1280.0"), Just("ANY")],
        r"[A-D]",
    )
        .prop_map(|(opt_elem, cenwave, segment)| {
            vec![opt_elem.to_string(), cenwave.to_string(), segment]
        })
}

fn arb_rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(arb_row(), 0..24)
}

fn table(columns: &[&str], rows: &[Vec<String>]) -> Table {
    Table::build(
        columns.iter().map(|c| c.to_string()),
        rows.iter().map(|r| r.iter().cloned()),
    )
    .unwrap()
}

/// Free text or a number, as a dataset might request.
fn arb_requested() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"-?[0-9]{1,6}(\.[0-9]{1,2})?",
        3 => r"[A-Za-z0-9_]{1,12}",
        1 => Just("".to_string()),
    ]
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn reordering_rows_never_changes_verdict(
        (rows, shuffled) in arb_rows().prop_flat_map(|rows| {
            let shuffled = Just(rows.clone()).prop_shuffle();
            (Just(rows), shuffled)
        })
    ) {
        let old = table(&COLUMNS, &rows);
        let new = table(&COLUMNS, &shuffled);
        let result = evaluate(&disptab_rule(), &params(), &old, &new);
        prop_assert_eq!(result.verdict, Verdict::Same);
    }

    #[test]
    fn rows_outside_the_mode_are_ignored(rows in arb_rows(), extra in r"[E-H]") {
        let old = table(&COLUMNS, &rows);
        let mut changed = rows.clone();
        changed.push(vec!["G130M".to_string(), "1291".to_string(), extra]);
        let new = table(&COLUMNS, &changed);
        let result = evaluate(&disptab_rule(), &params(), &old, &new);
        prop_assert_eq!(result.verdict, Verdict::Same);
    }

    #[test]
    fn column_changes_are_always_different(old_rows in arb_rows(), new_rows in arb_rows()) {
        let old = table(&COLUMNS, &old_rows);
        let new = table(&["OPT_ELEM", "CENWAVE", "DETECTOR"], &new_rows);
        let result = evaluate(&disptab_rule(), &params(), &old, &new);
        prop_assert!(result.is_different());
        prop_assert_eq!(result.verdict, Verdict::SchemaMismatch);
    }

    #[test]
    fn missing_mode_field_is_never_same(rows in arb_rows(), keep_opt_elem in any::<bool>()) {
        let params: DatasetParameters = if keep_opt_elem {
            [("OPT_ELEM", "G140L")].into_iter().collect()
        } else {
            [("CENWAVE", "1280")].into_iter().collect()
        };
        let old = table(&COLUMNS, &rows);
        let result = evaluate(&disptab_rule(), &params, &old, &old);
        prop_assert!(result.is_different());
        let incomplete = matches!(result.verdict, Verdict::IncompleteParameters { .. });
        prop_assert!(incomplete);
    }

    #[test]
    fn wildcard_cell_matches_any_request(requested in arb_requested(), case_sensitive in any::<bool>()) {
        let wildcards = vec![ScalarValue::coerce("ANY")];
        let cell = ScalarValue::coerce("ANY");
        let target = Target::One(ScalarValue::coerce(&requested));
        prop_assert!(matches_equal(&cell, &target, &wildcards, case_sensitive));
    }

    #[test]
    fn evaluate_is_idempotent(old_rows in arb_rows(), new_rows in arb_rows()) {
        let old = table(&COLUMNS, &old_rows);
        let new = table(&COLUMNS, &new_rows);
        let first = evaluate(&disptab_rule(), &params(), &old, &new);
        let second = evaluate(&disptab_rule(), &params(), &old, &new);
        prop_assert_eq!(first, second);
    }
}
