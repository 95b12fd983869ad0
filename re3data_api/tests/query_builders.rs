use re3data_api::{FilterKey, Query, RepositoryQuery};
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com/api/beta/repositories").unwrap()
}

#[test]
fn repository_query_defaults() {
    let url = RepositoryQuery::default().add_to_url(&base_url());
    assert_eq!(url.query(), None);
}

#[test]
fn repository_query_typed_filters() {
    let url = RepositoryQuery::default()
        .with_certificate("CoreTrustSeal")
        .with_content_type("Images")
        .with_repository_type("institutional")
        .with_api_type("OAI-PMH")
        .add_to_url(&base_url());
    let query = url.query().unwrap();
    assert!(query.contains("certificates%5B%5D=CoreTrustSeal"));
    assert!(query.contains("contentTypes%5B%5D=Images"));
    assert!(query.contains("types%5B%5D=institutional"));
    assert!(query.contains("apis%5B%5D=OAI-PMH"));
}

#[test]
fn repository_query_repeated_keys_keep_order() {
    let url = RepositoryQuery::default()
        .with_subject("1 Humanities and Social Sciences")
        .with_subject("2 Life Sciences")
        .add_to_url(&base_url());
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("subjects[]".to_string(), "1 Humanities and Social Sciences".to_string()),
            ("subjects[]".to_string(), "2 Life Sciences".to_string()),
        ]
    );
}

#[test]
fn repository_query_values_are_opaque() {
    let url = RepositoryQuery::default()
        .with_filter(FilterKey::Custom("versioning".to_string()), "yes & no")
        .add_to_url(&base_url());
    let (key, value) = url.query_pairs().next().unwrap();
    assert_eq!(key, "versioning");
    assert_eq!(value, "yes & no");
}

#[test]
fn repository_query_search_comes_first() {
    let url = RepositoryQuery::default()
        .with_country("DEU")
        .with_search("ocean")
        .add_to_url(&base_url());
    assert_eq!(url.query(), Some("query=ocean&countries%5B%5D=DEU"));
}
