//! Severity label table.
//!
//! The single place where upstream vocabularies meet the canonical taxonomy.
//! Matching is exact and case-sensitive.

use crate::prediction::types::CanonicalSeverity;
use CanonicalSeverity::*;

/// Bumped whenever a spelling is added or remapped.
pub const TABLE_VERSION: u32 = 2;

const LABELS: &[(&str, CanonicalSeverity)] = &[
    // English clinical terms (`class` responses).
    ("No DR", NoDr),
    ("Mild", Mild),
    ("Moderate", Moderate),
    ("Severe", Severe),
    ("Proliferative DR", Proliferative),
    // Bilingual terms (`severity` responses).
    ("Tidak ada DR", NoDr),
    ("DR Ringan", Mild),
    ("DR Sedang", Moderate),
    ("DR Berat", Severe),
    ("DR Proliferatif", Proliferative),
    // Short localized descriptions.
    ("Tidak ada", NoDr),
    ("Ringan", Mild),
    ("Sedang", Moderate),
    ("Berat", Severe),
    ("Sangat Berat", Proliferative),
    // Legacy binary model; grade unknown, so "present" is treated as moderate.
    ("Normal", NoDr),
    ("Diabetic Retinopathy", Moderate),
];

/// Map an upstream label to its canonical severity.
pub fn lookup(label: &str) -> Option<CanonicalSeverity> {
    LABELS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, severity)| *severity)
}

/// Every spelling the table accepts.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    LABELS.iter().map(|(label, _)| *label)
}

/// Label shown to end users.
pub fn localized(severity: CanonicalSeverity) -> &'static str {
    match severity {
        NoDr => "Tidak ada DR",
        Mild => "DR Ringan",
        Moderate => "DR Sedang",
        Severe => "DR Berat",
        Proliferative => "DR Proliferatif",
    }
}

/// Fixed clinical follow-up advice for each severity.
pub fn recommendation(severity: CanonicalSeverity) -> &'static str {
    match severity {
        NoDr => "Tidak ditemukan tanda-tanda retinopati diabetik. Lakukan pemeriksaan rutin setiap tahun.",
        Mild => "Ditemukan tanda-tanda awal retinopati diabetik. Kontrol gula darah dan tekanan darah, pemeriksaan ulang dalam 9-12 bulan.",
        Moderate => "Ditemukan retinopati diabetik tingkat sedang. Konsultasi dengan dokter spesialis mata dalam 6 bulan.",
        Severe => "Ditemukan retinopati diabetik tingkat berat. Segera konsultasi dengan dokter spesialis mata dalam 1 bulan.",
        Proliferative => "Ditemukan retinopati diabetik proliferatif. Memerlukan penanganan segera oleh dokter spesialis mata.",
    }
}
