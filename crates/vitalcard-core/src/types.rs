// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the insured person's record, caller-supplied assets and
// per-call render options.

use std::path::PathBuf;

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Status printed when the record carries none.
pub const DEFAULT_STATUS: &str = "Actif";

/// Placeholder printed for empty fields.
pub const EMPTY_FIELD: &str = "—";

/// Date format used on the attestation.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// One row of the coverage-rate table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    /// Kind of benefit ("Consultation", "Hospitalisation", ...).
    #[serde(rename = "type")]
    pub benefit_type: String,
    /// Share covered by the insurer, as printed ("80%").
    #[serde(rename = "taux")]
    pub coverage_rate: String,
    /// Share left to the insured ("20% à charge").
    #[serde(rename = "ticket")]
    pub copayment: String,
}

impl CoverageEntry {
    pub fn new(
        benefit_type: impl Into<String>,
        coverage_rate: impl Into<String>,
        copayment: impl Into<String>,
    ) -> Self {
        Self {
            benefit_type: benefit_type.into(),
            coverage_rate: coverage_rate.into(),
            copayment: copayment.into(),
        }
    }
}

/// The insured person's identity and plan, as supplied by the platform.
///
/// Only structural validity is expected: every optional or empty field is
/// replaced by a documented default at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "numero")]
    pub insured_number: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenoms")]
    pub first_names: String,
    #[serde(rename = "dateNaissance")]
    pub birth_date: String,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(rename = "sexe", default)]
    pub sex: Option<String>,

    #[serde(default)]
    pub regime: String,
    #[serde(rename = "statut", default)]
    pub status: Option<String>,
    #[serde(rename = "titre", default)]
    pub title: Option<String>,
    #[serde(rename = "employeur", default)]
    pub employer: String,
    #[serde(rename = "numeroAttestation", default)]
    pub attestation_number: Option<String>,
    #[serde(rename = "dateDebut", default)]
    pub validity_start: Option<String>,
    #[serde(rename = "dateFin", default)]
    pub validity_end: Option<String>,

    #[serde(rename = "couvertures", default)]
    pub coverages: Vec<CoverageEntry>,
}

impl DocumentRecord {
    /// Status, defaulting to "Actif".
    pub fn status_or_default(&self) -> &str {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_STATUS)
    }

    /// Last name followed by first names.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name.trim(), self.first_names.trim())
            .trim()
            .to_string()
    }

    /// Validity window as printed. Missing bounds default to the issue date
    /// and one year later (inclusive, so the day before the anniversary).
    pub fn validity_window(&self, issued_on: NaiveDate) -> (String, String) {
        let start = non_empty(self.validity_start.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| issued_on.format(DATE_FORMAT).to_string());
        let end = non_empty(self.validity_end.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| default_validity_end(issued_on).format(DATE_FORMAT).to_string());
        (start, end)
    }
}

/// The last day of a one-year validity window starting on `start`.
pub fn default_validity_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(12))
        .and_then(|d| d.pred_opt())
        .unwrap_or(start)
}

/// `value` with empty/whitespace strings mapped to the placeholder dash.
pub fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Caller-supplied image references. Each may be a `data:` URI, a `file://`
/// URI, a bare filesystem path or an `http(s)://` URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSet {
    #[serde(default)]
    pub emblem: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl AssetSet {
    pub fn is_empty(&self) -> bool {
        self.emblem.is_none() && self.logo.is_none() && self.photo.is_none()
    }
}

/// Visual elements that may individually degrade to absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Emblem,
    Logo,
    Photo,
    Chip,
    Watermark,
    Template,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Emblem => "emblem",
            Self::Logo => "logo",
            Self::Photo => "photo",
            Self::Chip => "chip",
            Self::Watermark => "watermark",
            Self::Template => "template",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-call rendering options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Overlay a millimetre grid for calibration prints.
    #[serde(default)]
    pub debug_grid: bool,
    /// When set, the artifact is also written to this path.
    #[serde(default)]
    pub filename: Option<PathBuf>,
    /// Issue date; today (local time) when absent.
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
}

impl RenderOptions {
    pub fn issue_date(&self) -> NaiveDate {
        self.issued_on
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentRecord {
        DocumentRecord {
            insured_number: "001-012-198-2".into(),
            last_name: "PELLEN-LAKOUMBA".into(),
            first_names: "GUEYLORD ASTED".into(),
            birth_date: "01/12/1982".into(),
            regime: "Secteur Privé".into(),
            employer: "ORGANÉUS GABON".into(),
            coverages: vec![CoverageEntry::new("Consultation", "80%", "20% à charge")],
            ..Default::default()
        }
    }

    #[test]
    fn status_defaults_to_actif() {
        let mut record = sample();
        assert_eq!(record.status_or_default(), "Actif");
        record.status = Some("   ".into());
        assert_eq!(record.status_or_default(), "Actif");
        record.status = Some("Suspendu".into());
        assert_eq!(record.status_or_default(), "Suspendu");
    }

    #[test]
    fn validity_defaults_to_one_year() {
        let record = sample();
        let issued = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let (start, end) = record.validity_window(issued);
        assert_eq!(start, "01/03/2026");
        assert_eq!(end, "28/02/2027");
    }

    #[test]
    fn explicit_validity_is_kept() {
        let mut record = sample();
        record.validity_start = Some("01/01/2026".into());
        record.validity_end = Some("31/12/2026".into());
        let issued = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            record.validity_window(issued),
            ("01/01/2026".to_string(), "31/12/2026".to_string())
        );
    }

    #[test]
    fn deserializes_platform_json() {
        let json = r#"{
            "numero": "001-012-198-2",
            "nom": "PELLEN-LAKOUMBA",
            "prenoms": "GUEYLORD ASTED",
            "dateNaissance": "01/12/1982",
            "regime": "Secteur Privé",
            "employeur": "ORGANÉUS GABON",
            "couvertures": [{"type": "Consultation", "taux": "80%", "ticket": "20% à charge"}]
        }"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, sample());
        assert_eq!(record.full_name(), "PELLEN-LAKOUMBA GUEYLORD ASTED");
    }

    #[test]
    fn empty_fields_render_as_dash() {
        assert_eq!(display_or_dash(""), EMPTY_FIELD);
        assert_eq!(display_or_dash("  "), EMPTY_FIELD);
        assert_eq!(display_or_dash("M"), "M");
    }
}
