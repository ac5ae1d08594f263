use crate::schema::Granularity;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%b %d, %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses the date shapes ledgers are commonly exported with. Time components are dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn quarter_of(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3 + 1
}

/// The start of the bucket `date` falls in.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => week_start(date),
        Granularity::Month => month_start(date),
    }
}

/// The start of the bucket following the one starting at `bucket`.
pub fn next_bucket(bucket: NaiveDate, granularity: Granularity) -> NaiveDate {
    let next = match granularity {
        Granularity::Day => bucket.checked_add_days(Days::new(1)),
        Granularity::Week => bucket.checked_add_days(Days::new(7)),
        Granularity::Month => bucket.checked_add_months(Months::new(1)),
    };
    next.unwrap_or(NaiveDate::MAX)
}

/// Every bucket start from `first` through `last` inclusive.
pub fn bucket_range(first: NaiveDate, last: NaiveDate, granularity: Granularity) -> Vec<NaiveDate> {
    let mut buckets = Vec::new();
    let mut current = bucket_start(first, granularity);
    let end = bucket_start(last, granularity);

    while current <= end {
        buckets.push(current);
        if current == NaiveDate::MAX {
            break;
        }
        current = next_bucket(current, granularity);
    }

    buckets
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024/03/15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("03/15/2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("15-Mar-2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("Mar 15, 2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15 13:45:00"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T13:45:00"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T13:45:00+05:30"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-03-14 is a Thursday
        assert_eq!(week_start(ymd(2024, 3, 14)), ymd(2024, 3, 11));
        assert_eq!(week_start(ymd(2024, 3, 11)), ymd(2024, 3, 11));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(week_start(ymd(2024, 3, 17)), ymd(2024, 3, 11));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(1), 1);
        assert_eq!(quarter_of(3), 1);
        assert_eq!(quarter_of(4), 2);
        assert_eq!(quarter_of(12), 4);
    }

    #[test]
    fn test_next_bucket() {
        assert_eq!(next_bucket(ymd(2023, 12, 31), Granularity::Day), ymd(2024, 1, 1));
        assert_eq!(next_bucket(ymd(2024, 2, 26), Granularity::Week), ymd(2024, 3, 4));
        assert_eq!(next_bucket(ymd(2023, 12, 1), Granularity::Month), ymd(2024, 1, 1));
    }

    #[test]
    fn test_bucket_range_is_contiguous() {
        let months = bucket_range(ymd(2023, 11, 20), ymd(2024, 2, 3), Granularity::Month);
        assert_eq!(
            months,
            vec![
                ymd(2023, 11, 1),
                ymd(2023, 12, 1),
                ymd(2024, 1, 1),
                ymd(2024, 2, 1)
            ]
        );

        let weeks = bucket_range(ymd(2024, 3, 14), ymd(2024, 3, 27), Granularity::Week);
        assert_eq!(weeks, vec![ymd(2024, 3, 11), ymd(2024, 3, 18), ymd(2024, 3, 25)]);
    }
}
