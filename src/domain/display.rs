use super::company::{CompanyRecord, KeyPerson};

/// Collapses a value that was concatenated with itself, e.g. `"10M10M"`.
/// Only an exact even-length repeat is touched.
pub fn dedup_repeated(value: &str) -> &str {
    let len = value.chars().count();
    if len == 0 || len % 2 != 0 {
        return value;
    }

    let Some((mid, _)) = value.char_indices().nth(len / 2) else {
        return value;
    };

    let (first, second) = value.split_at(mid);
    match first == second {
        true => first,
        false => value,
    }
}

pub fn fix_total_funding(mut record: CompanyRecord) -> CompanyRecord {
    if let Some(funding) = record.total_funding.as_deref() {
        let fixed = dedup_repeated(funding);
        if fixed.len() != funding.len() {
            record.total_funding = Some(fixed.to_string());
        }
    }

    record
}

/// Shape a stored record for presentation. Never persisted back.
pub fn for_display(record: CompanyRecord) -> CompanyRecord {
    let mut record = fix_total_funding(record);
    record.key_people = record
        .key_people
        .iter()
        .map(|person| KeyPerson::Flat(person.display()))
        .collect();

    record
}
