//! Integration tests for mirror page resolution with mock HTTP servers.

use alexandria_core::{HttpTimeouts, MirrorError, MirrorLayout, MirrorResolver, MirrorSlot};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver() -> MirrorResolver {
    MirrorResolver::new(HttpTimeouts::default()).expect("resolver should build")
}

async fn serve_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_secondary_slot_resolves_link_wrapping_heading() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/ads.php",
        r#"<html><body><h1>Dune</h1>
        <a href="https://cdn.test/get.php?md5=AB12&key=Z9"><h2>GET</h2></a>
        <a href="https://other.test/">other</a></body></html>"#,
    )
    .await;

    let link = resolver()
        .resolve(
            &format!("{}/ads.php", server.uri()),
            MirrorSlot::Secondary.layout(),
        )
        .await
        .expect("parent layout should resolve");
    assert_eq!(link, "https://cdn.test/get.php?md5=AB12&key=Z9");
}

#[tokio::test]
async fn test_primary_slot_resolves_link_inside_heading() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/main/AB12",
        r#"<html><body><h2><a href="/main/AB12/Dune.epub">GET</a></h2></body></html>"#,
    )
    .await;

    let link = resolver()
        .resolve(
            &format!("{}/main/AB12", server.uri()),
            MirrorSlot::Primary.layout(),
        )
        .await
        .expect("child layout should resolve");
    assert_eq!(link, "/main/AB12/Dune.epub", "links are returned verbatim");
}

#[tokio::test]
async fn test_sibling_layout_resolves_following_link() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/book",
        r#"<html><body><div><h2>Download</h2><a href="https://cdn.test/file.pdf">here</a></div></body></html>"#,
    )
    .await;

    let link = resolver()
        .resolve(&format!("{}/book", server.uri()), MirrorLayout::Sibling)
        .await
        .expect("sibling layout should resolve");
    assert_eq!(link, "https://cdn.test/file.pdf");
}

#[tokio::test]
async fn test_page_without_heading_is_layout_mismatch() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/ads.php",
        r#"<html><body><a href="https://cdn.test/get.php">GET</a></body></html>"#,
    )
    .await;

    let err = resolver()
        .resolve(&format!("{}/ads.php", server.uri()), MirrorLayout::Parent)
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::LayoutMismatch { .. }), "got {err:?}");
    assert!(!err.is_upstream_unavailable());
}

#[tokio::test]
async fn test_wrong_layout_is_layout_mismatch() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/main/AB12",
        r#"<html><body><h2><a href="/main/AB12/Dune.epub">GET</a></h2></body></html>"#,
    )
    .await;

    let err = resolver()
        .resolve(&format!("{}/main/AB12", server.uri()), MirrorLayout::Parent)
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::LayoutMismatch { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_non_success_status_is_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ads.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = resolver()
        .resolve(&format!("{}/ads.php", server.uri()), MirrorLayout::Parent)
        .await
        .unwrap_err();
    assert!(
        matches!(err, MirrorError::HttpStatus { status: 404, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unreachable_mirror_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let err = resolver()
        .resolve(&format!("{uri}/ads.php"), MirrorLayout::Parent)
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::Network { .. }), "got {err:?}");
    assert!(err.is_upstream_unavailable());
}
