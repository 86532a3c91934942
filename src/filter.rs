use tracing::debug;

use crate::untl::UntlRecord;

/// Keep the records whose creation year equals `year`, preserving order.
/// Without a year the collection is returned unchanged.
pub fn filter_by_year(records: Vec<UntlRecord>, year: Option<i32>) -> Vec<UntlRecord> {
    let Some(year) = year else {
        return records;
    };

    records
        .into_iter()
        .filter(|record| match record.creation_date().and_then(date_year) {
            Some(found) => found == year,
            None => {
                debug!(
                    "Excluding record without a usable creation date: {}",
                    record.identifier.as_deref().unwrap_or("<unknown>")
                );
                false
            }
        })
        .collect()
}

/// Year component of a UNTL (EDTF) date: a leading run of exactly four
/// digits. `2024`, `2024-05-10` and `2024~` give 2024; `19XX`,
/// `[2024, 2025]` and `20245` give nothing.
pub fn date_year(date: &str) -> Option<i32> {
    let date = date.trim();
    let digits = date.bytes().take_while(u8::is_ascii_digit).count();
    if digits != 4 {
        return None;
    }
    date[..4].parse().ok()
}
