// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout — everything on the attestation page except the card itself.

pub mod page;
pub mod primitives;
pub mod text;

use chrono::{Datelike, NaiveDate};
use sha2::{Digest, Sha256};
use vitalcard_core::types::DocumentRecord;

pub use page::{LayoutReport, PageLayout, Section, draw_debug_grid};

/// Reference printed in the title band when the record carries no
/// attestation number: `ATT-<year>-<first 8 hex digits of
/// SHA-256("<numero>|<issue date>")>`, uppercase. Stable for a given insured
/// number and issue date.
pub fn derive_reference(insured_number: &str, issued_on: NaiveDate) -> String {
    let digest = Sha256::digest(format!("{}|{}", insured_number.trim(), issued_on.format("%Y-%m-%d")));
    format!(
        "ATT-{}-{}",
        issued_on.year(),
        hex::encode(&digest[..4]).to_uppercase()
    )
}

/// The record's own attestation number, or the derived reference.
pub fn attestation_reference(record: &DocumentRecord, issued_on: NaiveDate) -> String {
    record
        .attestation_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_reference(&record.insured_number, issued_on))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn derived_reference_is_stable_and_well_formed() {
        let a = derive_reference("001-012-198-2", date(2026, 3, 14));
        let b = derive_reference("001-012-198-2", date(2026, 3, 14));
        assert_eq!(a, b);
        assert!(a.starts_with("ATT-2026-"));
        let hash = &a["ATT-2026-".len()..];
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        assert_ne!(a, derive_reference("001-012-198-2", date(2026, 3, 15)));
        assert_ne!(a, derive_reference("001-012-198-3", date(2026, 3, 14)));
    }

    #[test]
    fn explicit_attestation_number_wins() {
        let mut record = DocumentRecord {
            insured_number: "42".into(),
            ..DocumentRecord::default()
        };
        let issued = date(2026, 1, 2);
        assert!(attestation_reference(&record, issued).starts_with("ATT-2026-"));

        record.attestation_number = Some("  CN-778  ".into());
        assert_eq!(attestation_reference(&record, issued), "CN-778");
        record.attestation_number = Some(" ".into());
        assert!(attestation_reference(&record, issued).starts_with("ATT-"));
    }
}
