/// Normalizes a department filter value for case/whitespace-insensitive
/// equality. Returns `None` for missing or blank input (no filter).
/// Mapping free text onto canonical department labels is the classifier's
/// job, not ours; equality here is purely lexical.
pub fn normalize_department(value: Option<&str>) -> Option<String> {
    let cleaned = value?.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(
            normalize_department(Some("  Software Development ")),
            Some("software development".to_string())
        );
    }

    #[test]
    fn test_blank_means_no_filter() {
        assert_eq!(normalize_department(None), None);
        assert_eq!(normalize_department(Some("")), None);
        assert_eq!(normalize_department(Some("   ")), None);
    }
}
