//! Identifier generation.
//!
//! Record ids are plain strings. They are unique by construction (time plus
//! randomness); collections never check for duplicates.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix of [`generate_id`].
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generate a record id of the form `<unix-millis>-<9 base36 chars>`.
#[must_use]
pub fn generate_id() -> String {
    id_at(Utc::now())
}

fn id_at(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{}-{suffix}", now.timestamp_millis())
}

/// Build an invoice number `INV/YYYYMMDD/NNNNNN` for the given instant.
///
/// The trailing six digits are the last six digits of the unix millisecond
/// timestamp.
#[must_use]
pub fn generate_invoice_no(now: DateTime<Utc>) -> String {
    let tail = now.timestamp_millis().rem_euclid(1_000_000);
    format!("INV/{}/{tail:06}", now.format("%Y%m%d"))
}
