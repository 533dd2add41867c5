//! End-to-end tests for the hub against in-process callback servers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;

use webhub_core::{
    DeliveryOutcome, DuplicatePolicy, Error, Hub, HubConfig, PublishMessage, SubscribeRequest,
};

type HmacSha256 = Hmac<Sha256>;

/// How a test subscriber answers the verification GET.
#[derive(Clone, Copy)]
enum Answer {
    Echo,
    Wrong,
}

#[derive(Clone)]
struct SubscriberState {
    answer: Answer,
    delivery_delay: Option<Duration>,
    deliveries: Arc<Mutex<Vec<(HeaderMap, Vec<u8>)>>>,
}

struct TestSubscriber {
    url: String,
    deliveries: Arc<Mutex<Vec<(HeaderMap, Vec<u8>)>>>,
}

impl TestSubscriber {
    async fn start(answer: Answer) -> Self {
        Self::start_with_delay(answer, None).await
    }

    async fn start_with_delay(answer: Answer, delivery_delay: Option<Duration>) -> Self {
        let state = SubscriberState {
            answer,
            delivery_delay,
            deliveries: Arc::default(),
        };
        let deliveries = state.deliveries.clone();

        let app = Router::new()
            .route("/callback", get(verify).post(receive))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/callback", addr),
            deliveries,
        }
    }

    fn received(&self) -> Vec<(HeaderMap, Vec<u8>)> {
        self.deliveries.lock().clone()
    }
}

async fn verify(
    State(state): State<SubscriberState>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    match state.answer {
        Answer::Echo => params.get("hub.challenge").cloned().unwrap_or_default(),
        Answer::Wrong => "definitely-not-it".to_string(),
    }
}

async fn receive(State(state): State<SubscriberState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    if let Some(delay) = state.delivery_delay {
        tokio::time::sleep(delay).await;
    }
    state.deliveries.lock().push((headers, body.to_vec()));
    StatusCode::NO_CONTENT
}

fn hub() -> Hub {
    Hub::new(HubConfig::default()).unwrap()
}

fn hmac_hex(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn unsigned_subscribe_then_publish() {
    let subscriber = TestSubscriber::start(Answer::Echo).await;
    let hub = hub();

    let subscription = hub
        .subscribe(SubscribeRequest::new("/a/topic", &subscriber.url))
        .await
        .unwrap();
    assert_eq!(subscription.topic, "/a/topic");

    let listed = hub.subscriptions("/a/topic");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].callback.as_str(), subscriber.url);
    assert_eq!(listed[0].secret, "");

    let report = hub
        .publish(PublishMessage::new("/a/topic", "hej"))
        .await
        .unwrap();
    assert_eq!(report.attempted(), 1);
    assert_eq!(report.delivered(), 1);

    let received = subscriber.received();
    assert_eq!(received.len(), 1);
    let (headers, body) = &received[0];
    assert_eq!(body.as_slice(), br#"{"message":"hej","topic":"/a/topic"}"#);
    assert!(headers.get("x-hub-signature").is_none());
}

#[tokio::test]
async fn signed_subscribe_then_publish() {
    let subscriber = TestSubscriber::start(Answer::Echo).await;
    let hub = hub();

    hub.subscribe(SubscribeRequest::new("/a/topic", &subscriber.url).with_secret("s3cr3t"))
        .await
        .unwrap();
    assert_eq!(hub.subscriptions("/a/topic")[0].secret, "s3cr3t");

    hub.publish(PublishMessage::new("/a/topic", "hej"))
        .await
        .unwrap();

    let received = subscriber.received();
    assert_eq!(received.len(), 1);
    let (headers, body) = &received[0];
    let expected_body = br#"{"message":"hej","topic":"/a/topic"}"#;
    assert_eq!(body.as_slice(), expected_body);

    let signature = headers.get("x-hub-signature").unwrap().to_str().unwrap();
    assert_eq!(signature, format!("sha256={}", hmac_hex("s3cr3t", expected_body)));
}

#[tokio::test]
async fn mismatched_echo_is_not_registered() {
    let subscriber = TestSubscriber::start(Answer::Wrong).await;
    let hub = hub();

    let err = hub
        .subscribe(SubscribeRequest::new("/a/topic", &subscriber.url))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::VerificationRejected(_)));
    assert!(hub.subscriptions("/a/topic").is_empty());
    assert_eq!(hub.registry().topic_count(), 0);
}

#[tokio::test]
async fn unreachable_callback_is_not_registered() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/callback", listener.local_addr().unwrap());
    drop(listener);

    let hub = hub();
    let err = hub
        .subscribe(SubscribeRequest::new("/a/topic", url))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CallbackUnreachable(_)));
    assert_eq!(hub.registry().subscription_count(), 0);
}

#[tokio::test]
async fn publish_reaches_every_subscriber_once() {
    const N: usize = 5;
    let hub = hub();

    let mut subscribers = Vec::new();
    for _ in 0..N {
        let subscriber = TestSubscriber::start(Answer::Echo).await;
        hub.subscribe(SubscribeRequest::new("/fan/out", &subscriber.url))
            .await
            .unwrap();
        subscribers.push(subscriber);
    }
    let bystander = TestSubscriber::start(Answer::Echo).await;
    hub.subscribe(SubscribeRequest::new("/elsewhere", &bystander.url))
        .await
        .unwrap();

    let report = hub
        .publish(PublishMessage::new("/fan/out", "update"))
        .await
        .unwrap();
    assert_eq!(report.attempted(), N);
    assert_eq!(report.delivered(), N);

    for subscriber in &subscribers {
        let received = subscriber.received();
        assert_eq!(received.len(), 1);
        let payload: serde_json::Value = serde_json::from_slice(&received[0].1).unwrap();
        assert_eq!(payload["topic"], "/fan/out");
        assert_eq!(payload["message"], "update");
    }
    assert!(bystander.received().is_empty());
}

#[tokio::test]
async fn hung_subscriber_does_not_block_others() {
    let config = HubConfig::default().with_delivery_timeout(Duration::from_millis(300));
    let hub = Hub::new(config).unwrap();

    let hung = TestSubscriber::start_with_delay(Answer::Echo, Some(Duration::from_secs(30))).await;
    let healthy = TestSubscriber::start(Answer::Echo).await;

    hub.subscribe(SubscribeRequest::new("/t", &hung.url)).await.unwrap();
    hub.subscribe(SubscribeRequest::new("/t", &healthy.url)).await.unwrap();

    let started = Instant::now();
    let report = hub.publish(PublishMessage::new("/t", "hej")).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.delivered(), 1);
    assert_eq!(healthy.received().len(), 1);

    let hung_report = report
        .deliveries
        .iter()
        .find(|d| d.callback.as_str() == hung.url)
        .unwrap();
    assert_eq!(
        hung_report.outcome,
        DeliveryOutcome::Failed {
            reason: "timed out".to_string()
        }
    );
}

#[tokio::test]
async fn many_hung_subscribers_do_not_delay_a_healthy_one() {
    const HUNG: usize = 40;
    let config = HubConfig::default().with_delivery_timeout(Duration::from_secs(3));
    let hub = Arc::new(Hub::new(config).unwrap());

    let hung = TestSubscriber::start_with_delay(Answer::Echo, Some(Duration::from_secs(60))).await;
    for i in 0..HUNG {
        let callback = format!("{}?n={}", hung.url, i);
        hub.subscribe(SubscribeRequest::new("/crowded", callback))
            .await
            .unwrap();
    }
    let healthy = TestSubscriber::start(Answer::Echo).await;
    hub.subscribe(SubscribeRequest::new("/crowded", &healthy.url))
        .await
        .unwrap();

    let started = Instant::now();
    let publishing = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move { hub.publish(PublishMessage::new("/crowded", "hej")).await })
    };

    while healthy.received().is_empty() && started.elapsed() < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let reached_after = started.elapsed();
    assert_eq!(healthy.received().len(), 1);
    assert!(
        reached_after < Duration::from_secs(1),
        "healthy subscriber reached after {:?}",
        reached_after
    );

    let report = publishing.await.unwrap().unwrap();
    assert_eq!(report.attempted(), HUNG + 1);
    assert_eq!(report.delivered(), 1);
    assert_eq!(report.failed(), HUNG);
}

#[tokio::test]
async fn deliveries_outlive_an_abandoned_publish() {
    let subscriber =
        TestSubscriber::start_with_delay(Answer::Echo, Some(Duration::from_millis(300))).await;
    let hub = hub();
    hub.subscribe(SubscribeRequest::new("/t", &subscriber.url))
        .await
        .unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        hub.publish(PublishMessage::new("/t", "hej")),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(subscriber.received().is_empty());

    let started = Instant::now();
    while subscriber.received().is_empty() && started.elapsed() < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(subscriber.received().len(), 1);
}

#[tokio::test]
async fn concurrent_subscribes_are_all_registered() {
    const CALLERS: usize = 64;
    let hub = Arc::new(hub());
    let subscriber = TestSubscriber::start(Answer::Echo).await;

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let hub = Arc::clone(&hub);
            let callback = format!("{}?caller={}", subscriber.url, i);
            tokio::spawn(async move {
                hub.subscribe(SubscribeRequest::new("/contended", callback))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = hub.subscriptions("/contended");
    assert_eq!(listed.len(), CALLERS);
    for i in 0..CALLERS {
        let needle = format!("caller={}", i);
        assert!(listed
            .iter()
            .any(|s| s.callback.query() == Some(needle.as_str())));
    }
}

#[tokio::test]
async fn duplicate_subscriptions_follow_policy() {
    let subscriber = TestSubscriber::start(Answer::Echo).await;

    let allowing = hub();
    for _ in 0..2 {
        allowing
            .subscribe(SubscribeRequest::new("/t", &subscriber.url))
            .await
            .unwrap();
    }
    assert_eq!(allowing.subscriptions("/t").len(), 2);

    let replacing =
        Hub::new(HubConfig::default().with_duplicate_policy(DuplicatePolicy::Replace)).unwrap();
    replacing
        .subscribe(SubscribeRequest::new("/t", &subscriber.url).with_secret("old"))
        .await
        .unwrap();
    replacing
        .subscribe(SubscribeRequest::new("/t", &subscriber.url).with_secret("new"))
        .await
        .unwrap();

    let listed = replacing.subscriptions("/t");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].secret, "new");
}
