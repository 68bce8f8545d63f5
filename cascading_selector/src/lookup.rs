use crate::normalization::normalize_precinct_code;
use crate::options::SelectorOption;
use mirror_store::PrecinctId;

/// Finds the offered precinct whose code matches `code` once both are normalized, so
/// `"240"` and `"0240"` name the same precinct. Codes repeat across areas, so only the
/// options of the selected area are searched.
pub fn precinct_by_code<'a>(
    options: &'a [SelectorOption<PrecinctId>],
    code: &str,
) -> Option<&'a SelectorOption<PrecinctId>> {
    let wanted = normalize_precinct_code(code);
    options.iter().find(|option| {
        option
            .code
            .as_deref()
            .map(normalize_precinct_code)
            .as_deref()
            == Some(wanted.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::precinct_by_code;
    use crate::options::SelectorOption;
    use mirror_store::PrecinctId;

    fn option(id: &str, code: Option<&str>) -> SelectorOption<PrecinctId> {
        SelectorOption {
            id: id.into(),
            label: format!("Precinct {id}"),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_codes_match_regardless_of_leading_zeros() {
        let options = vec![option("P-1", Some("0240")), option("P-2", Some("0005"))];

        let found = precinct_by_code(&options, "240").unwrap();
        assert_eq!(found.id.as_str(), "P-1");

        let found = precinct_by_code(&options, "05").unwrap();
        assert_eq!(found.id.as_str(), "P-2");

        assert!(precinct_by_code(&options, "999").is_none());
    }

    #[test]
    fn test_options_without_a_code_never_match() {
        let options = vec![option("P-1", None)];
        assert!(precinct_by_code(&options, "P-1").is_none());
    }
}
