//! Positional ranking by loss ratio and period-over-period lag deltas

use super::metrics::{round1, safe_div};
use std::cmp::Ordering;

/// A row that can be ranked by loss ratio
pub trait Ranked {
    fn loss_ratio(&self) -> Option<f64>;
    fn set_rank(&mut self, rank: u32);
}

/// Descending by loss ratio, undefined loss ratios last
fn worst_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort rows worst loss ratio first and number them 1..=N.
///
/// Ranks are positional: equal loss ratios get distinct consecutive ranks in
/// their original relative order (the sort is stable).
pub fn dense_rank<T: Ranked>(rows: &mut [T]) {
    rows.sort_by(|a, b| worst_first(a.loss_ratio(), b.loss_ratio()));
    for (i, row) in rows.iter_mut().enumerate() {
        row.set_rank(i as u32 + 1);
    }
}

/// Change in loss ratio against the previous period
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LagDelta {
    /// Relative change in percent, 1dp
    pub yoy_change: Option<f64>,
    /// Absolute change in loss-ratio points, 1dp
    pub yoy_change_abs: Option<f64>,
}

impl LagDelta {
    pub fn between(previous: Option<f64>, current: Option<f64>) -> Self {
        let (Some(previous), Some(current)) = (previous, current) else {
            return Self::default();
        };
        let diff = current - previous;
        Self {
            yoy_change: safe_div(diff, previous, "previous loss ratio")
                .ok()
                .map(|rel| round1(rel * 100.0)),
            yoy_change_abs: Some(round1(diff)),
        }
    }
}

/// Lag deltas for a series already sorted ascending by period.
///
/// The first period has no baseline and gets an empty delta.
pub fn lag_deltas(loss_ratios: &[Option<f64>]) -> Vec<LagDelta> {
    let mut deltas = Vec::with_capacity(loss_ratios.len());
    if !loss_ratios.is_empty() {
        deltas.push(LagDelta::default());
    }
    deltas.extend(
        loss_ratios
            .windows(2)
            .map(|pair| LagDelta::between(pair[0], pair[1])),
    );
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        lr: Option<f64>,
        rank: u32,
    }

    impl Ranked for Row {
        fn loss_ratio(&self) -> Option<f64> {
            self.lr
        }
        fn set_rank(&mut self, rank: u32) {
            self.rank = rank;
        }
    }

    fn row(name: &'static str, lr: Option<f64>) -> Row {
        Row { name, lr, rank: 0 }
    }

    #[test]
    fn test_rank_descending() {
        let mut rows = vec![row("a", Some(40.0)), row("b", Some(55.5)), row("c", Some(12.0))];
        dense_rank(&mut rows);

        let names: Vec<_> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        let ranks: Vec<_> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_get_distinct_ranks_in_appearance_order() {
        let mut rows = vec![
            row("first", Some(48.0)),
            row("top", Some(60.0)),
            row("second", Some(48.0)),
            row("third", Some(48.0)),
        ];
        dense_rank(&mut rows);

        let ranked: Vec<_> = rows.iter().map(|r| (r.name, r.rank)).collect();
        assert_eq!(
            ranked,
            vec![("top", 1), ("first", 2), ("second", 3), ("third", 4)]
        );
    }

    #[test]
    fn test_undefined_loss_ratio_ranks_last() {
        let mut rows = vec![row("none", None), row("low", Some(1.0)), row("high", Some(90.0))];
        dense_rank(&mut rows);
        let names: Vec<_> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["high", "low", "none"]);
        assert_eq!(rows[2].rank, 3);
    }

    #[test]
    fn test_lag_deltas() {
        let deltas = lag_deltas(&[Some(40.0), Some(44.0), Some(33.0)]);

        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0], LagDelta::default());
        assert_eq!(deltas[1].yoy_change, Some(10.0));
        assert_eq!(deltas[1].yoy_change_abs, Some(4.0));
        assert_eq!(deltas[2].yoy_change, Some(-25.0));
        assert_eq!(deltas[2].yoy_change_abs, Some(-11.0));
    }

    #[test]
    fn test_lag_abs_matches_rounded_difference() {
        let series = [Some(41.37), Some(47.92), Some(45.01), Some(52.66)];
        let deltas = lag_deltas(&series);
        for i in 1..series.len() {
            let expected = round1(series[i].unwrap() - series[i - 1].unwrap());
            assert_eq!(deltas[i].yoy_change_abs, Some(expected));
        }
    }

    #[test]
    fn test_zero_baseline_gives_null_relative_change() {
        let deltas = lag_deltas(&[Some(0.0), Some(12.5)]);
        assert_eq!(deltas[1].yoy_change, None);
        assert_eq!(deltas[1].yoy_change_abs, Some(12.5));
    }

    #[test]
    fn test_undefined_neighbour_gives_empty_delta() {
        let deltas = lag_deltas(&[Some(30.0), None, Some(35.0)]);
        assert_eq!(deltas[1], LagDelta::default());
        assert_eq!(deltas[2], LagDelta::default());
    }

    #[test]
    fn test_empty_and_single_series() {
        assert!(lag_deltas(&[]).is_empty());
        assert_eq!(lag_deltas(&[Some(10.0)]), vec![LagDelta::default()]);
    }
}
