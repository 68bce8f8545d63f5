//! Reduces raw identifiers to the form reporting queries filter on.

/// `PA15-A-15` becomes `15`. Any other dash layout keeps the last `-` segment and ids
/// without a usable segment are returned unchanged.
pub fn normalize_area_id(area_id: &str) -> String {
    let area_id = area_id.trim();
    match area_id.rsplit_once('-') {
        Some((_, suffix)) if !suffix.is_empty() => suffix.to_owned(),
        _ => area_id.to_owned(),
    }
}

/// Strips leading zeros from numeric precinct codes; other codes pass through.
pub fn normalize_precinct_code(code: &str) -> String {
    code.trim()
        .parse::<u64>()
        .map(|number| number.to_string())
        .unwrap_or_else(|_| code.to_owned())
}

#[cfg(test)]
mod tests {
    use super::{normalize_area_id, normalize_precinct_code};
    use rstest::rstest;

    #[rstest]
    #[case("PA15-A-15", "15")]
    #[case("PA-7", "7")]
    #[case("PA15-B-003", "003")]
    #[case("AREA9", "AREA9")]
    #[case("PA15-A-", "PA15-A-")]
    fn test_area_ids_reduce_to_their_last_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_area_id(input), expected);
    }

    #[rstest]
    #[case("0240", "240")]
    #[case("005", "5")]
    #[case("000", "0")]
    #[case("17", "17")]
    #[case("ABC", "ABC")]
    #[case("12A", "12A")]
    fn test_precinct_codes_lose_leading_zeros(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_precinct_code(input), expected);
    }
}
