use selfup::core::ErrorKind;
use selfup::test_utils::{MockFetcher, release_index};
use selfup::upgrade::{MAX_RELEASES, ReleaseCatalog, matching_assets};

const BASE: &str = "https://index.example.com";

fn index_url(page_size: u32) -> String {
    format!("{BASE}/repos/acme/widget/releases?per_page={page_size}")
}

fn catalog(fetcher: MockFetcher) -> ReleaseCatalog<MockFetcher> {
    ReleaseCatalog::new(fetcher).with_index_url(BASE)
}

#[tokio::test]
async fn test_newest_first_within_policy() {
    let body = release_index(&[
        ("v1.3.2", false),
        ("v2.0.0", false),
        ("v1.4.0-rc.1", true),
        ("v1.3.10", false),
        ("v1.2.0", false),
        ("v1.3.1", false),
    ]);
    let fetcher = MockFetcher::new().respond(&index_url(30), 200, body);

    let releases = catalog(fetcher).list_releases("acme/widget", "v1.3.1", false, false).await.unwrap();

    let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["v1.3.10", "v1.3.2"]);
}

#[tokio::test]
async fn test_at_most_five_releases() {
    let tags: Vec<String> = (1..=12).map(|patch| format!("0.9.{patch}")).collect();
    let entries: Vec<(&str, bool)> = tags.iter().map(|tag| (tag.as_str(), false)).collect();
    let fetcher = MockFetcher::new().respond(&index_url(30), 200, release_index(&entries));

    let releases = catalog(fetcher).list_releases("acme/widget", "0.9.0", false, false).await.unwrap();

    assert_eq!(releases.len(), MAX_RELEASES);
    assert_eq!(releases[0].version, "0.9.12");
    assert_eq!(releases[4].version, "0.9.8");
}

#[tokio::test]
async fn test_page_size_is_sent() {
    let fetcher = MockFetcher::new().respond(&index_url(100), 200, b"[]".to_vec());

    let releases = catalog(fetcher.clone())
        .with_page_size(100)
        .list_releases("acme/widget", "1.0.0", true, true)
        .await
        .unwrap();

    assert!(releases.is_empty());
    assert_eq!(fetcher.requests()[0].0, index_url(100));
}

#[tokio::test]
async fn test_unreachable_index() {
    let fetcher = MockFetcher::new().fail(&index_url(30), "dns error");

    let err =
        catalog(fetcher).list_releases("acme/widget", "1.0.0", false, false).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Fetch);
}

#[tokio::test]
async fn test_entries_missing_fields_are_rejected() {
    let body = br#"[{"tag_name": "v1.4.0", "assets": []}]"#.to_vec();
    let fetcher = MockFetcher::new().respond(&index_url(30), 200, body);

    let err =
        catalog(fetcher).list_releases("acme/widget", "1.0.0", false, false).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_asset_selection() {
    let fetcher = MockFetcher::new().respond(&index_url(30), 200, release_index(&[("v1.4.0", false)]));
    let releases = catalog(fetcher).list_releases("acme/widget", "v1.3.0", false, false).await.unwrap();

    let linux = regex::Regex::new("linux-amd64").unwrap();
    let darwin = regex::Regex::new("darwin").unwrap();
    assert_eq!(matching_assets(&linux, &releases[0]).len(), 1);
    assert!(matching_assets(&darwin, &releases[0]).is_empty());
}
