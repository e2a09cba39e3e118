//! `fetch` / `fetch_ok` status policy and entity lifetime.

mod common;

use common::{CountingBody, FakeTransport, Reply};
use condnet::http::{Request, ResponseBody};
use condnet::{Client, FetchError, NetError};
use std::sync::atomic::{AtomicBool, Ordering};

const URL: &str = "http://example.com/resource";

#[tokio::test]
async fn test_success_statuses_reach_handler() {
    for status in [200u16, 201, 202, 203, 204] {
        let transport = FakeTransport::new();
        let client = Client::with_transport(transport.clone());
        transport.push(Reply::status(status));

        let seen = client
            .fetch_ok(&Request::get(URL), |resp| {
                Box::pin(async move { Ok::<_, FetchError>(resp.status().as_u16()) })
            })
            .await
            .unwrap();
        assert_eq!(seen, status);
    }
}

#[tokio::test]
async fn test_other_statuses_fail_without_handler() {
    for status in [301u16, 400, 404, 500] {
        let transport = FakeTransport::new();
        let client = Client::with_transport(transport.clone());
        transport.push(Reply::status(status).text("details"));

        let invoked = AtomicBool::new(false);
        let err = client
            .fetch_ok(&Request::get(URL), |_resp| {
                invoked.store(true, Ordering::SeqCst);
                Box::pin(async move { Ok::<_, FetchError>(()) })
            })
            .await
            .unwrap_err();

        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(err.status_code(), Some(status));
        match err {
            FetchError::StatusCode { body, reason, .. } => {
                assert_eq!(body, "details");
                assert!(!reason.is_empty());
            }
            other => panic!("Expected StatusCode error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_301_without_location_is_not_followed() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(301));

    let err = client
        .fetch_ok(&Request::get(URL), |_| {
            Box::pin(async move { Ok::<_, FetchError>(()) })
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(301));
    assert_eq!(transport.seen().len(), 1);
}

#[tokio::test]
async fn test_not_modified_delivered_as_ok() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(200).header("etag", "\"v\"").text("cached"));
    transport.push(Reply::status(304));

    client.get_text(URL).await.unwrap();
    let (status, body) = client
        .fetch_ok(&Request::get(URL), |resp| {
            Box::pin(async move {
                let status = resp.status().as_u16();
                let body = resp.text().await?;
                Ok::<_, FetchError>((status, body))
            })
        })
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "cached");
}

#[tokio::test]
async fn test_fetch_delivers_any_status() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(404).text("missing"));

    let (status, body) = client
        .fetch(&Request::get(URL), |resp| {
            Box::pin(async move {
                let status = resp.status().as_u16();
                let body = resp.text().await?;
                Ok::<_, FetchError>((status, body))
            })
        })
        .await
        .unwrap();
    assert_eq!(status, 404);
    assert_eq!(body, "missing");
}

#[tokio::test]
async fn test_entity_released_once_when_handler_fails() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    // A 500 bypasses the cache, so the counting body reaches the handler
    // untouched.
    let body = CountingBody::new(&["one ", "two ", "three"]);
    let frames = body.frames.clone();
    let drops = body.drops.clone();
    transport.push(Reply::status(500).entity(ResponseBody::new(body)));

    let err = client
        .fetch(&Request::get(URL), |_resp| {
            Box::pin(async move { Err::<(), _>(FetchError::handler("handler gave up")) })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Handler(_)));
    assert_eq!(err.to_string(), "Handler failed: handler gave up");
    assert_eq!(frames.load(Ordering::SeqCst), 3);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_entity_released_when_handler_ignores_it() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    let body = CountingBody::new(&["a", "b"]);
    let frames = body.frames.clone();
    let drops = body.drops.clone();
    transport.push(Reply::status(500).entity(ResponseBody::new(body)));

    client
        .fetch(&Request::get(URL), |resp| {
            Box::pin(async move { Ok::<_, FetchError>(resp.has_entity()) })
        })
        .await
        .unwrap();

    assert_eq!(frames.load(Ordering::SeqCst), 2);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_error_type_is_preserved() {
    #[derive(Debug, thiserror::Error)]
    #[error("bad feed")]
    struct FeedError;

    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(200).text("<rss"));

    let err = client
        .fetch_ok(&Request::get(URL), |_| {
            Box::pin(async move { Err::<(), _>(FetchError::handler(FeedError)) })
        })
        .await
        .unwrap_err();

    match err {
        FetchError::Handler(source) => assert!(source.downcast_ref::<FeedError>().is_some()),
        other => panic!("Expected Handler error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    let err = client.get_text(URL).await.unwrap_err();
    assert!(matches!(err, FetchError::Net(NetError::ConnectionClosed)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_invalid_url_never_reaches_transport() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());

    let err = client.get_text("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::Net(NetError::InvalidUrl)));
    assert!(transport.seen().is_empty());
}

#[tokio::test]
async fn test_post_form_sends_body() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(201).text("created"));

    let body = client
        .post_form(URL, [("title", "hello world")])
        .await
        .unwrap();
    assert_eq!(body, "created");

    let seen = transport.last();
    assert_eq!(seen.method, http::Method::POST);
    assert_eq!(seen.url, URL);
    assert_eq!(
        seen.headers.get("content-type").unwrap(),
        "application/x-www-form-urlencoded; charset=UTF-8"
    );
}

#[tokio::test]
async fn test_clones_share_cache() {
    let transport = FakeTransport::new();
    let client = Client::with_transport(transport.clone());
    transport.push(Reply::status(200).header("etag", "\"t\"").text("shared"));
    transport.push(Reply::status(304));

    client.get_text(URL).await.unwrap();

    let clone = client.clone();
    let body = clone.get_text(URL).await.unwrap();

    assert_eq!(body, "shared");
    assert_eq!(transport.last().headers.get("if-none-match").unwrap(), "\"t\"");
}
