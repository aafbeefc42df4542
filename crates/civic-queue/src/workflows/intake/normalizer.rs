/// Canonical form for category and status codes: invisible characters
/// stripped, lower-cased, runs of whitespace or hyphens collapsed to `_`.
pub fn normalize_code(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_code_collapses_separators_and_case() {
        assert_eq!(
            normalize_code("\u{feff}Certificat  Urbanism"),
            "certificat_urbanism"
        );
        assert_eq!(normalize_code(" in-review "), "in_review");
        assert_eq!(normalize_code("AVIZ_PRELIMINAR"), "aviz_preliminar");
        assert_eq!(normalize_code("   "), "");
    }
}
