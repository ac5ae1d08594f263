use crate::schema::Transaction;
use crate::stats::{mean, std_dev};
use chrono::Datelike;

pub const FEATURE_NAMES: [&str; 8] = [
    "amount",
    "abs_amount",
    "day_of_week",
    "day_of_month",
    "month",
    "is_expense",
    "rolling_mean",
    "rolling_std",
];

/// One feature row per transaction, in input order.
///
/// Rolling statistics cover the trailing `window` rows after a stable sort by date. A window
/// holding a single value has no sample deviation; those gaps are back-filled, then
/// forward-filled, then zeroed.
pub fn build_features(transactions: &[Transaction], window: usize) -> Vec<Vec<f64>> {
    let window = window.max(1);

    let mut order: Vec<usize> = (0..transactions.len()).collect();
    order.sort_by_key(|&idx| transactions[idx].date);

    let sorted_amounts: Vec<f64> = order.iter().map(|&idx| transactions[idx].amount).collect();
    let mut rolling_mean = Vec::with_capacity(sorted_amounts.len());
    let mut rolling_std = Vec::with_capacity(sorted_amounts.len());
    for end in 0..sorted_amounts.len() {
        let start = (end + 1).saturating_sub(window);
        let slice = &sorted_amounts[start..=end];
        rolling_mean.push(mean(slice));
        rolling_std.push(std_dev(slice, 1));
    }
    let rolling_mean = fill_gaps(rolling_mean);
    let rolling_std = fill_gaps(rolling_std);

    let mut rows = vec![Vec::new(); transactions.len()];
    for (position, &idx) in order.iter().enumerate() {
        let t = &transactions[idx];
        rows[idx] = vec![
            t.amount,
            t.amount.abs(),
            t.date.weekday().num_days_from_monday() as f64,
            t.date.day() as f64,
            t.date.month() as f64,
            if t.transaction_type.is_expense() { 1.0 } else { 0.0 },
            rolling_mean[position],
            rolling_std[position],
        ];
    }
    rows
}

fn fill_gaps(values: Vec<Option<f64>>) -> Vec<f64> {
    let mut filled = values;

    let mut next = None;
    for value in filled.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }

    let mut previous = None;
    for value in filled.iter_mut() {
        match value {
            Some(v) => previous = Some(*v),
            None => *value = previous,
        }
    }

    filled.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

/// Rescales every column to zero mean and unit (population) variance.
/// Constant columns become all zeros.
pub fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Vec::new();
    };

    let mut scaled = rows.to_vec();
    for col in 0..width {
        let column: Vec<f64> = rows.iter().map(|row| row[col]).collect();
        let mu = mean(&column).unwrap_or(0.0);
        let sigma = std_dev(&column, 0).unwrap_or(0.0);
        for row in scaled.iter_mut() {
            row[col] = if sigma > 0.0 && sigma.is_finite() {
                (row[col] - mu) / sigma
            } else {
                0.0
            };
        }
    }
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: &str, day: u32, amount: f64) -> Transaction {
        Transaction::new(id, NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), amount, "Ops")
    }

    #[test]
    fn test_calendar_and_sign_features() {
        // 2024-05-06 is a Monday
        let rows = build_features(&[tx("a", 6, -20.0)], 7);
        assert_eq!(rows[0][..6], [-20.0, 20.0, 0.0, 6.0, 5.0, 0.0]);
        assert_eq!(rows[0][6], -20.0);
        assert_eq!(rows[0][7], 0.0);
    }

    #[test]
    fn test_rolling_uses_date_order_and_backfills() {
        let transactions = vec![tx("late", 3, 30.0), tx("early", 1, 10.0), tx("mid", 2, 20.0)];
        let rows = build_features(&transactions, 2);
        // input order is kept in the output
        assert_eq!(rows[0][0], 30.0);
        // early: mean of [10], std back-filled from [10, 20]
        assert_eq!(rows[1][6], 10.0);
        assert!((rows[1][7] - 50f64.sqrt()).abs() < 1e-12);
        // late: window [20, 30]
        assert_eq!(rows[0][6], 25.0);
    }

    #[test]
    fn test_fill_gaps_forward_and_zero() {
        assert_eq!(fill_gaps(vec![None, Some(2.0), None]), vec![2.0, 2.0, 2.0]);
        assert_eq!(fill_gaps(vec![None, None]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_standardize_constant_column_is_zero() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaled = standardize(&rows);
        assert_eq!(scaled[0], vec![-1.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 0.0]);
        assert!(scaled.iter().flatten().all(|v| v.is_finite()));
        assert!(standardize(&[]).is_empty());
    }
}
