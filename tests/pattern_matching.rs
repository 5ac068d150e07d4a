// Integration tests for pattern compilation through the public API
#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use signpost::core::pattern::{self, PatternError};

    fn no_constraints() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_build_then_extract_recovers_arguments() {
        // For patterns with only required placeholders, extraction is the
        // exact inverse of URL building.
        let cases = [
            ("blog/{year}/{slug}", vec![("year", "2021"), ("slug", "rust")]),
            ("product/{name}", vec![("name", "chair")]),
            ("{lang}/docs/{page}", vec![("lang", "en"), ("page", "intro")]),
        ];

        for (pattern_text, pairs) in cases {
            let args: BTreeMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            let url = pattern::build_url(pattern_text, &args).unwrap();
            let extracted = pattern::extract_parameters(pattern_text, &no_constraints(), &url)
                .unwrap()
                .unwrap_or_else(|| panic!("built URL '{url}' must match its own pattern"));

            for (key, value) in &args {
                assert_eq!(
                    extracted.get(key),
                    Some(&Some(value.clone())),
                    "pattern {pattern_text}"
                );
            }
        }
    }

    #[test]
    fn test_optional_segment_candidates() {
        let matcher = pattern::compile("product/{name?}", &no_constraints()).unwrap();

        assert!(matcher.is_match("product"));
        assert!(matcher.is_match("product/chair"));
        assert!(!matcher.is_match("product/chair/extra"));
    }

    #[test]
    fn test_build_url_missing_required_placeholder() {
        let err = pattern::build_url("product/{name}", &BTreeMap::new()).unwrap_err();
        match err {
            PatternError::MissingArguments { names } => assert_eq!(names, vec!["name"]),
            other => panic!("expected MissingArguments, got {other:?}"),
        }

        // The optional variant succeeds and drops the separator too.
        let url = pattern::build_url("product/{name?}", &BTreeMap::new()).unwrap();
        assert_eq!(url, "product");
    }

    #[test]
    fn test_matcher_caching_does_not_change_observable_behavior() {
        let candidates = ["product", "product/chair", "product/", "x/product"];

        let first = pattern::compile("product/{name?}", &no_constraints()).unwrap();
        let second = pattern::compile("product/{name?}", &no_constraints()).unwrap();

        for candidate in candidates {
            assert_eq!(first.is_match(candidate), second.is_match(candidate));
            assert_eq!(first.extract(candidate), second.extract(candidate));
        }
    }

    #[test]
    fn test_constrained_extraction() {
        let mut constraints = BTreeMap::new();
        constraints.insert("id".to_string(), "[0-9]+".to_string());

        let matcher = pattern::compile("order/{id}", &constraints).unwrap();
        assert!(matcher.extract("order/abc").is_none());

        let params = matcher.extract("order/1234").unwrap();
        assert_eq!(params.get("id"), Some(&Some("1234".to_string())));
    }
}
