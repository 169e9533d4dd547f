//! End-to-end tests for the post form state machine against a mock board API.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use serde_json::json;

use postform::api::ContentApi;
use postform::cooldown::{Clock, CooldownPolicy, CooldownTracker};
use postform::error::AppError;
use postform::models::{CooldownKey, CooldownStatus, FormState};
use postform::storage::{CooldownStore, MemoryStore};
use postform::workflow::PostForm;

const T0: i64 = 1_700_000_000_000;

/// Hand-driven clock so tests control elapsed time exactly.
struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self { now: AtomicI64::new(millis) })
    }

    fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

fn form_for(
    server: &MockServer,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    key: CooldownKey,
) -> PostForm {
    let api = ContentApi::new(server.base_url());
    let tracker = CooldownTracker::new(store, CooldownPolicy::default());
    PostForm::with_clock(api, tracker, key, clock)
}

#[tokio::test]
async fn new_thread_happy_path() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/g/threads");
            then.status(200)
                .json_body(json!({ "threadNumber": 42, "postNumber": 1 }));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::new_thread("g"));

    let posted: Arc<Mutex<Option<u64>>> = Arc::new(Mutex::new(None));
    {
        let posted = posted.clone();
        form.on_posted(move |created| {
            *posted.lock().unwrap() = created.thread_number;
        });
    }

    form.open();
    assert_eq!(form.state(), FormState::Editing);
    form.draft_mut().unwrap().content = "hello".to_string();

    let outcome = form.submit().await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.created.thread_number, Some(42));
    assert_eq!(outcome.redirect.as_deref(), Some("/g/thread/42"));
    assert_eq!(form.state(), FormState::Collapsed);
    assert_eq!(*posted.lock().unwrap(), Some(42));
    assert!(form.draft().content.is_empty());

    // Cooldown re-armed with the full new-thread window
    let status = form.status().await;
    assert!(status.limited);
    assert_eq!(status.remaining_millis, 600_000);
}

#[tokio::test]
async fn reply_posts_to_thread_endpoint_without_redirect() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/a/threads/7/posts");
            then.status(200).json_body(json!({ "postNumber": 123 }));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::reply("a", 7));

    form.open();
    form.draft_mut().unwrap().content = "bump".to_string();

    let outcome = form.submit().await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.redirect, None);
    assert_eq!(outcome.created.post_number, Some(123));

    // Replies get the 60s window
    let status = form.status().await;
    assert!(status.limited);
    assert_eq!(status.remaining_millis, 60_000);
}

#[tokio::test]
async fn reply_while_limited_is_rejected_locally() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "postNumber": 1 }));
        })
        .await;

    let key = CooldownKey::reply("a", 7);
    let store = Arc::new(MemoryStore::new());
    // Armed 10 seconds ago
    store
        .set(&key.storage_key(), &(T0 - 10_000).to_string())
        .await
        .unwrap();

    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, key);

    form.open();
    form.draft_mut().unwrap().content = "too soon".to_string();

    let err = form.submit().await.unwrap_err();
    match &err {
        AppError::RateLimited(remaining) => assert_eq!(remaining, "50s"),
        other => panic!("expected RateLimited, got {:?}", other),
    }
    assert!(err.to_string().contains("50s"));

    // No network call was made, the draft survived, and the form stayed open
    assert_eq!(mock.hits_async().await, 0);
    assert_eq!(form.state(), FormState::Editing);
    assert_eq!(form.draft().content, "too soon");
}

#[tokio::test]
async fn server_rejection_preserves_draft_and_does_not_arm() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/g/threads");
            then.status(400).json_body(json!({ "error": "Content too long" }));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::new_thread("g"));

    form.open();
    form.draft_mut().unwrap().content = "hello".to_string();

    let err = form.submit().await.unwrap_err();
    match &err {
        AppError::Rejected(message) => assert_eq!(message, "Content too long"),
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert_eq!(err.user_message(), "Content too long");

    assert_eq!(form.state(), FormState::Editing);
    assert_eq!(form.draft().content, "hello");

    // Cooldown only starts on confirmed success
    assert_eq!(form.status().await, CooldownStatus::clear());
}

#[tokio::test]
async fn transport_failure_surfaces_generic_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/g/threads");
            // No structured error body
            then.status(500).body("upstream exploded");
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::new_thread("g"));

    form.open();
    form.draft_mut().unwrap().content = "hello".to_string();

    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    assert_eq!(err.user_message(), "Failed to submit post");

    assert_eq!(form.state(), FormState::Editing);
    assert_eq!(form.draft().content, "hello");
    assert_eq!(form.status().await, CooldownStatus::clear());
}

#[tokio::test]
async fn empty_draft_is_rejected_before_any_network_call() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "postNumber": 1 }));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::reply("a", 7));

    form.open();

    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "Please enter content or select an image");

    assert_eq!(mock.hits_async().await, 0);
    assert_eq!(form.state(), FormState::Editing);
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let server = MockServer::start_async().await;
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, CooldownKey::new_thread("g"));

    // Submitting a collapsed form is an error, not a silent no-op
    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // The draft is not editable while collapsed
    assert!(form.draft_mut().is_none());

    // Cancel discards the draft
    form.open();
    form.draft_mut().unwrap().content = "discard me".to_string();
    form.cancel();
    assert_eq!(form.state(), FormState::Collapsed);
    assert!(form.draft().content.is_empty());
}

#[tokio::test]
async fn retarget_reevaluates_the_cooldown() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/a/threads");
            then.status(200).json_body(json!({ "threadNumber": 9 }));
        })
        .await;

    let reply_key = CooldownKey::reply("a", 7);
    let store = Arc::new(MemoryStore::new());
    store
        .set(&reply_key.storage_key(), &T0.to_string())
        .await
        .unwrap();

    let clock = ManualClock::at(T0);
    let mut form = form_for(&server, store, clock, reply_key);

    assert!(form.status().await.limited);

    // A different target is a different bucket
    let status = form.retarget(CooldownKey::new_thread("a")).await;
    assert!(!status.limited);

    form.open();
    form.draft_mut().unwrap().content = "fresh thread".to_string();
    let outcome = form.submit().await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.redirect.as_deref(), Some("/a/thread/9"));
}

#[tokio::test(start_paused = true)]
async fn countdown_clears_once_the_window_elapses() {
    let key = CooldownKey::reply("a", 7);
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let tracker = CooldownTracker::new(store, CooldownPolicy::default());

    tracker.arm(&key, T0).await;

    let countdown = tracker.watch(key.clone(), clock.clone()).await;
    let status = countdown.current();
    assert!(status.limited);
    assert_eq!(status.remaining_millis, 60_000);

    // Once the window has elapsed the next tick clears without any user action
    clock.advance(61_000);
    countdown.cleared().await;

    assert_eq!(tracker.status(&key, clock.now_millis()).await, CooldownStatus::clear());
}

#[tokio::test]
async fn countdown_on_a_clear_target_is_immediately_done() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0);
    let tracker = CooldownTracker::new(store, CooldownPolicy::default());

    let countdown = tracker.watch(CooldownKey::new_thread("g"), clock).await;
    assert!(!countdown.current().limited);
    countdown.cleared().await;
}
