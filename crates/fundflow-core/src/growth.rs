//! Rolling multi-year growth calculations.
//!
//! The rollup aggregators summarize per-fiscal-year rows with a rolling
//! arithmetic mean over the most recent years. Requiring a minimum sample
//! count guards against a single noisy year dominating the trend signal.

/// Minimum number of qualifying rows before a rolling figure is produced.
pub const MIN_SAMPLES: usize = 3;

/// Rolling arithmetic mean over the most recent fiscal years.
///
/// Rows without a finite value are ignored. The remaining rows are ordered
/// by fiscal year descending and at most `window` of them enter the mean.
/// Returns `None` when fewer than [`MIN_SAMPLES`] rows qualify or the mean
/// itself is not finite.
pub fn rolling_average<T>(
    rows: &[T],
    fiscal_year: impl Fn(&T) -> i32,
    value: impl Fn(&T) -> Option<f64>,
    window: usize,
) -> Option<f64> {
    let mut samples: Vec<(i32, f64)> = rows
        .iter()
        .filter_map(|row| {
            value(row)
                .filter(|v| v.is_finite())
                .map(|v| (fiscal_year(row), v))
        })
        .collect();
    if samples.len() < MIN_SAMPLES {
        return None;
    }

    samples.sort_by(|a, b| b.0.cmp(&a.0));
    samples.truncate(window);
    if samples.len() < MIN_SAMPLES {
        return None;
    }

    let mean = samples.iter().map(|(_, v)| v).sum::<f64>() / samples.len() as f64;
    mean.is_finite().then_some(mean)
}

/// Year-over-year change from `previous` to `current`.
///
/// Returns `None` when either side is absent or non-finite, or when the
/// previous value is zero.
#[must_use]
pub fn year_over_year(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let previous = previous.filter(|v| v.is_finite() && *v != 0.0)?;
    let current = current.filter(|v| v.is_finite())?;
    let change = (current - previous) / previous.abs();
    change.is_finite().then_some(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        fiscal_year: i32,
        rev: Option<f64>,
    }

    fn row(fiscal_year: i32, rev: impl Into<Option<f64>>) -> Row {
        Row {
            fiscal_year,
            rev: rev.into(),
        }
    }

    #[test]
    fn returns_none_below_minimum_samples() {
        let rows = vec![row(2023, 10.0), row(2022, 8.0)];
        assert_eq!(
            rolling_average(&rows, |r| r.fiscal_year, |r| r.rev, 5),
            None
        );
    }

    #[test]
    fn only_the_window_most_recent_years_enter_the_mean() {
        let rows = vec![
            row(2019, 100.0),
            row(2023, 4.0),
            row(2021, 2.0),
            row(2022, 3.0),
        ];
        // Window of 3 drops the 2019 outlier despite unsorted input.
        assert_eq!(
            rolling_average(&rows, |r| r.fiscal_year, |r| r.rev, 3),
            Some(3.0)
        );
    }

    #[test]
    fn non_finite_rows_do_not_qualify() {
        let rows = vec![
            row(2023, f64::NAN),
            row(2022, 2.0),
            row(2021, 4.0),
            row(2020, 6.0),
        ];
        assert_eq!(
            rolling_average(&rows, |r| r.fiscal_year, |r| r.rev, 5),
            Some(4.0)
        );

        let sparse = vec![row(2023, f64::NAN), row(2022, 2.0), row(2021, None)];
        assert_eq!(
            rolling_average(&sparse, |r| r.fiscal_year, |r| r.rev, 5),
            None
        );
    }

    #[test]
    fn year_over_year_handles_edges() {
        assert_eq!(year_over_year(Some(10.0), Some(12.0)), Some(0.2));
        assert_eq!(year_over_year(Some(-10.0), Some(-5.0)), Some(0.5));
        assert_eq!(year_over_year(Some(0.0), Some(5.0)), None);
        assert_eq!(year_over_year(None, Some(5.0)), None);
        assert_eq!(year_over_year(Some(5.0), None), None);
    }
}
