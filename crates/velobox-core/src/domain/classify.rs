//! Scan classification: which bearer category does a scan key belong to?

use crate::domain::entities::BearerCategory;

/// Portal path fragments that identify each category.
const STUDENT_KEYWORDS: &[&str] = &["dae"];
const STAFF_KEYWORDS: &[&str] = &["dsapp"];

/// Classify a normalized scan key into a bearer category.
///
/// Returns `None` when no keyword matches, or when keywords for more than
/// one category match (a conflicting scan is not processed).
pub fn classify(scan_key: &str) -> Option<BearerCategory> {
    // The scheme never contains a keyword; compare the rest case-insensitively.
    let haystack = scan_key
        .split_once("://")
        .map_or(scan_key, |(_, rest)| rest)
        .to_lowercase();

    let student = STUDENT_KEYWORDS.iter().any(|kw| haystack.contains(kw));
    let staff = STAFF_KEYWORDS.iter().any(|kw| haystack.contains(kw));

    match (student, staff) {
        (true, false) => Some(BearerCategory::Student),
        (false, true) => Some(BearerCategory::Staff),
        _ => None,
    }
}
