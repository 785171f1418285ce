//! Scan-string normalization and text folding.

/// Correct the known QR artifacts a handheld scanner produces when the host
/// keyboard layout mangles URL punctuation.
///
/// Returns the canonical scan key used for identity and dedup.
pub fn normalize_scan(raw: &str) -> String {
    raw.replace("httpsñ--", "https://")
        .replace("httpsÑ--", "https://")
        .replace(".mx-vcred-", ".mx/vcred/")
        .replace("_h¿", "?h=")
}

/// Fold a status string for comparison: strip Spanish diacritics, lowercase,
/// trim.
///
/// Profile pages are inconsistent about accents ("Válida" vs "Valida"), so
/// every status comparison goes through this.
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .map(strip_diacritic)
        .collect::<String>()
        .to_lowercase()
}

fn strip_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'Á' | 'À' | 'Ä' => 'a',
        'é' | 'è' | 'ë' | 'É' | 'È' | 'Ë' => 'e',
        'í' | 'ì' | 'ï' | 'Í' | 'Ì' | 'Ï' => 'i',
        'ó' | 'ò' | 'ö' | 'Ó' | 'Ò' | 'Ö' => 'o',
        'ú' | 'ù' | 'ü' | 'Ú' | 'Ù' | 'Ü' => 'u',
        'ñ' | 'Ñ' => 'n',
        other => other,
    }
}
