use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Buckets items by calendar day. Days come out in ascending order and
/// items keep their relative order within a day.
pub fn group_by_date<T>(
    items: impl IntoIterator<Item = T>,
    date_of: impl Fn(&T) -> NaiveDate,
) -> BTreeMap<NaiveDate, Vec<T>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for item in items {
        grouped.entry(date_of(&item)).or_default().push(item);
    }
    grouped
}
