use crate::domain::FilterState;
use url::form_urlencoded::byte_serialize;

/// Translates a filter selection plus ad-hoc parameters into a query string.
///
/// Filter fields left at the `"all"` sentinel are omitted. Filter-derived
/// parameters come first (year, region, category), followed by `extra` in
/// caller order. The first parameter is introduced with `?` and the rest are
/// joined with `&`; when nothing contributes the result is empty.
pub fn build_query(filters: Option<&FilterState>, extra: &[(&str, String)]) -> String {
    let filter_pairs = filters.map(FilterState::active_pairs).unwrap_or_default();

    let mut query = String::new();
    let pairs = filter_pairs
        .into_iter()
        .chain(extra.iter().map(|(key, value)| (*key, value.as_str())));

    for (key, value) in pairs {
        query.push(if query.is_empty() { '?' } else { '&' });
        query.push_str(key);
        query.push('=');
        query.extend(byte_serialize(value.as_bytes()));
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterField;

    #[test]
    fn all_sentinels_produce_empty_query() {
        assert_eq!(build_query(Some(&FilterState::default()), &[]), "");
        assert_eq!(build_query(None, &[]), "");
    }

    #[test]
    fn single_field_has_no_leading_ampersand() {
        for field in FilterField::ORDERED {
            let filters = FilterState::default().with(field, "X1");
            assert_eq!(
                build_query(Some(&filters), &[]),
                format!("?{}=X1", field.as_str())
            );
        }
    }

    #[test]
    fn fields_are_emitted_in_stable_order() {
        let filters = FilterState::default()
            .with(FilterField::Category, "energia")
            .with(FilterField::Year, "2021")
            .with(FilterField::Region, "ANDINA");

        assert_eq!(
            build_query(Some(&filters), &[]),
            "?year=2021&region=ANDINA&category=energia"
        );
    }

    #[test]
    fn extra_params_join_existing_query_with_ampersand() {
        let filters = FilterState::default().with(FilterField::Year, "2020");
        let query = build_query(Some(&filters), &[("n", "5".to_string())]);
        assert_eq!(query, "?year=2020&n=5");
    }

    #[test]
    fn extra_params_start_query_when_unfiltered() {
        let query = build_query(
            Some(&FilterState::default()),
            &[("n", "10".to_string()), ("by", "REGION".to_string())],
        );
        assert_eq!(query, "?n=10&by=REGION");
    }

    #[test]
    fn values_are_form_encoded() {
        let filters = FilterState::default().with(FilterField::Category, "4.B. Tierras de cultivo");
        assert_eq!(
            build_query(Some(&filters), &[]),
            "?category=4.B.+Tierras+de+cultivo"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let filters = FilterState::default()
            .with(FilterField::Region, "CARIBE")
            .with(FilterField::Year, "2022");
        let extra = [("by", "REGION".to_string())];
        assert_eq!(
            build_query(Some(&filters), &extra),
            build_query(Some(&filters.clone()), &extra)
        );
    }
}
