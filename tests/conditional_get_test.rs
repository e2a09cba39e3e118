//! Conditional GET through the full client pipeline.
//!
//! Covers:
//! - validators sent only once a body is stored
//! - 304 delivered as 200 with the stored body
//! - overwrite on refresh
//! - keys separated by method and query

mod common;

use common::{FakeTransport, Reply};
use condnet::http::{Method, Request, RequestKey};
use condnet::{Client, FetchError};
use url::Url;

const FEED: &str = "http://example.com/feed.xml";

async fn get_text(client: &Client, request: &Request) -> Result<(u16, String), FetchError> {
    client
        .fetch(request, |resp| {
            Box::pin(async move {
                let status = resp.status().as_u16();
                let text = resp.text().await?;
                Ok::<_, FetchError>((status, text))
            })
        })
        .await
}

fn key(url: &str) -> RequestKey {
    RequestKey::from_request(Method::Get, &Url::parse(url).unwrap())
}

#[tokio::test]
async fn test_conditional_round_trip() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"abc\"").text("X"));
    transport.push(Reply::status(304));

    let first = get_text(&client, &Request::get(FEED)).await.unwrap();
    assert_eq!(first, (200, "X".to_string()));
    let seen = transport.last();
    assert!(seen.headers.get("if-none-match").is_none());
    assert!(seen.headers.get("if-modified-since").is_none());
    assert_eq!(seen.headers.get("accept-encoding").unwrap(), "gzip");

    let second = get_text(&client, &Request::get(FEED)).await.unwrap();
    assert_eq!(second, (200, "X".to_string()));
    let seen = transport.last();
    assert_eq!(seen.headers.get("if-none-match").unwrap(), "\"abc\"");
    assert_eq!(seen.headers.get("accept-encoding").unwrap(), "gzip");
}

#[tokio::test]
async fn test_last_modified_round_trip() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    let stamp = "Wed, 03 Jan 2024 08:30:00 GMT";

    transport.push(Reply::status(200).header("last-modified", stamp).text("v1"));
    transport.push(Reply::status(304));

    get_text(&client, &Request::get(FEED)).await.unwrap();
    let (status, body) = get_text(&client, &Request::get(FEED)).await.unwrap();

    assert_eq!(status, 200);
    assert_eq!(body, "v1");
    let seen = transport.last();
    assert_eq!(seen.headers.get("if-modified-since").unwrap(), stamp);
    assert!(seen.headers.get("if-none-match").is_none());
}

#[tokio::test]
async fn test_refresh_overwrites_entry() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"a\"").text("first"));
    transport.push(Reply::status(200).header("etag", "\"b\"").text("second"));
    transport.push(Reply::status(304));

    get_text(&client, &Request::get(FEED)).await.unwrap();
    get_text(&client, &Request::get(FEED)).await.unwrap();

    let entry = client.cache().get(&key(FEED)).unwrap();
    assert_eq!(entry.etag.as_deref(), Some("\"b\""));
    assert_eq!(entry.stored_body.as_deref(), Some("second"));
    assert_eq!(client.cache().len(), 1);

    let (_, body) = get_text(&client, &Request::get(FEED)).await.unwrap();
    assert_eq!(body, "second");
    assert_eq!(transport.last().headers.get("if-none-match").unwrap(), "\"b\"");
}

#[tokio::test]
async fn test_refresh_without_validators_drops_old_ones() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"a\"").text("first"));
    transport.push(Reply::status(200).text("second"));
    transport.push(Reply::status(200).text("third"));

    get_text(&client, &Request::get(FEED)).await.unwrap();
    get_text(&client, &Request::get(FEED)).await.unwrap();
    assert_eq!(transport.last().headers.get("if-none-match").unwrap(), "\"a\"");

    get_text(&client, &Request::get(FEED)).await.unwrap();
    assert!(transport.last().headers.get("if-none-match").is_none());
}

#[tokio::test]
async fn test_query_params_are_part_of_key() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"p1\"").text("page 1"));
    transport.push(Reply::status(200).text("page 2"));

    get_text(&client, &Request::get(FEED).param("page", "1"))
        .await
        .unwrap();
    get_text(&client, &Request::get(FEED).param("page", "2"))
        .await
        .unwrap();

    let seen = transport.seen();
    assert_eq!(seen[1].url, "http://example.com/feed.xml?page=2");
    assert!(seen[1].headers.get("if-none-match").is_none());
    assert!(client
        .cache()
        .contains(&key("http://example.com/feed.xml?page=1")));
}

#[tokio::test]
async fn test_fragment_and_dot_segments_share_entry() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"n\"").text("same"));
    transport.push(Reply::status(304));

    get_text(&client, &Request::get("http://EXAMPLE.com:80/a/../feed.xml#top"))
        .await
        .unwrap();
    let (status, body) = get_text(&client, &Request::get(FEED)).await.unwrap();

    assert_eq!((status, body.as_str()), (200, "same"));
    assert_eq!(transport.last().headers.get("if-none-match").unwrap(), "\"n\"");
}

#[tokio::test]
async fn test_unexpected_304_is_fatal() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(304));

    let err = get_text(&client, &Request::get(FEED)).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, FetchError::NotModifiedWithoutEntry { .. }));
}

#[tokio::test]
async fn test_error_status_does_not_touch_cache() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"ok\"").text("good"));
    transport.push(Reply::status(500).header("etag", "\"bad\"").text("oops"));

    get_text(&client, &Request::get(FEED)).await.unwrap();
    let (status, body) = get_text(&client, &Request::get(FEED)).await.unwrap();
    assert_eq!((status, body.as_str()), (500, "oops"));

    let entry = client.cache().get(&key(FEED)).unwrap();
    assert_eq!(entry.etag.as_deref(), Some("\"ok\""));
    assert_eq!(entry.stored_body.as_deref(), Some("good"));
}

#[tokio::test]
async fn test_post_has_own_key() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    transport.push(Reply::status(200).header("etag", "\"g\"").text("get"));
    transport.push(Reply::status(200).text("posted"));

    get_text(&client, &Request::get(FEED)).await.unwrap();
    get_text(&client, &Request::post(FEED).param("a", "1"))
        .await
        .unwrap();

    let seen = transport.last();
    assert_eq!(seen.method, http::Method::POST);
    assert!(seen.headers.get("if-none-match").is_none());
    assert_eq!(client.cache().len(), 2);
}
