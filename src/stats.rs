//! Column statistics used for imputation: median, mean and mode.

use std::collections::BTreeMap;

use crate::data::Value;

/// Median of the numeric cells, ignoring missing and non-numeric ones.
pub fn median(cells: &[Option<Value>]) -> Option<f64> {
    let mut values = numeric_values(cells);
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Arithmetic mean of the numeric cells, ignoring missing and non-numeric ones.
pub fn mean(cells: &[Option<Value>]) -> Option<f64> {
    let values = numeric_values(cells);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent present value. Ties resolve to the smallest value.
pub fn mode(cells: &[Option<Value>]) -> Option<Value> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for value in cells.iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    // BTreeMap iterates in ascending order, so keeping the first strict maximum
    // yields the smallest of the tied values.
    let mut best: Option<(&Value, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.clone())
}

fn numeric_values(cells: &[Option<Value>]) -> Vec<f64> {
    cells
        .iter()
        .flatten()
        .filter_map(Value::as_f64)
        .filter(|value| value.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ints(values: &[Option<i64>]) -> Vec<Option<Value>> {
        values.iter().map(|v| v.map(Value::Integer)).collect()
    }

    #[test]
    fn median_ignores_missing_cells() {
        assert_eq!(median(&ints(&[Some(10), None, Some(30)])), Some(20.0));
        assert_eq!(median(&ints(&[Some(1), None, Some(1), Some(100)])), Some(1.0));
    }

    #[test]
    fn mean_diverges_from_median_on_skewed_input() {
        assert_eq!(mean(&ints(&[Some(10), None, Some(30)])), Some(20.0));
        assert_eq!(mean(&ints(&[Some(1), None, Some(1), Some(100)])), Some(34.0));
    }

    #[test]
    fn statistics_of_empty_columns_are_undefined() {
        assert_eq!(median(&[None, None]), None);
        assert_eq!(mean(&[]), None);
        assert_eq!(mode(&[None]), None);
    }

    #[test]
    fn mode_breaks_ties_with_smallest_value() {
        let cells = vec![
            Some(Value::String("pear".into())),
            Some(Value::String("apple".into())),
            None,
            Some(Value::String("pear".into())),
            Some(Value::String("apple".into())),
        ];
        assert_eq!(mode(&cells), Some(Value::String("apple".into())));
    }

    #[test]
    fn mode_prefers_highest_count() {
        let cells = ints(&[Some(5), Some(3), Some(5), None]);
        assert_eq!(mode(&cells), Some(Value::Integer(5)));
    }

    #[test]
    fn mode_counts_equal_integers_and_floats_together() {
        let cells = vec![
            Some(Value::Integer(2)),
            Some(Value::Float(2.0)),
            Some(Value::Integer(1)),
        ];
        assert!(matches!(mode(&cells), Some(Value::Integer(2))));
    }

    proptest! {
        #[test]
        fn median_lies_between_min_and_max(values in proptest::collection::vec(-1_000i64..1_000, 1..40)) {
            let cells = values.iter().map(|v| Some(Value::Integer(*v))).collect::<Vec<_>>();
            let m = median(&cells).unwrap();
            let min = *values.iter().min().unwrap() as f64;
            let max = *values.iter().max().unwrap() as f64;
            prop_assert!(m >= min && m <= max);
        }

        #[test]
        fn mode_is_an_observed_value(values in proptest::collection::vec(0i64..5, 1..30)) {
            let cells = values.iter().map(|v| Some(Value::Integer(*v))).collect::<Vec<_>>();
            let winner = mode(&cells).unwrap();
            prop_assert!(cells.contains(&Some(winner)));
        }
    }
}
