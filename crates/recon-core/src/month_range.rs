use recon_domain::{MonthKey, ParsedPeriod};

/// Lists every calendar month of `period`, start and end included.
pub fn enumerate_months(period: &ParsedPeriod) -> Vec<MonthKey> {
    months_between(period.start(), period.end())
}

/// Raw form taking zero-based months. Invalid months or a start after the end
/// produce an empty list.
pub fn enumerate_month_span(
    start_month: u32,
    start_year: i32,
    end_month: u32,
    end_year: i32,
) -> Vec<MonthKey> {
    match (
        MonthKey::new(start_month, start_year),
        MonthKey::new(end_month, end_year),
    ) {
        (Some(start), Some(end)) => months_between(start, end),
        _ => Vec::new(),
    }
}

pub fn months_between(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
    let span = start.months_until(&end);
    if span < 0 {
        return Vec::new();
    }
    let mut months = Vec::with_capacity(span as usize + 1);
    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.succ();
    }
    months
}
