use std::time::Duration;

use super::*;
use crate::test_support::FakeBackend;

async fn next_change(rx: &mut broadcast::Receiver<Option<Identity>>) -> Option<Identity> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("change within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn start_reads_restored_session_once() {
    let backend = FakeBackend::new();
    let alice = backend.add_account("alice");
    backend.restore_session(&alice);

    let (session, _listener) = SessionManager::start(backend.clone()).await;
    assert_eq!(session.current().await, Some(alice));
    assert_eq!(backend.calls("current_session"), 1);
}

#[tokio::test]
async fn no_session_is_none_not_an_error() {
    let backend = FakeBackend::new();
    let (session, _listener) = SessionManager::start(backend.clone()).await;
    assert_eq!(session.current().await, None);
    assert_eq!(session.require().await, Err(WorkflowError::Unauthenticated));
}

#[tokio::test]
async fn failed_initial_fetch_starts_signed_out() {
    let backend = FakeBackend::new();
    backend.fail("current_session", "network down");
    let (session, _listener) = SessionManager::start(backend.clone()).await;
    assert_eq!(session.current().await, None);
}

#[tokio::test]
async fn follows_provider_notifications() {
    let backend = FakeBackend::new();
    let bob = backend.add_account("bob");
    let (session, _listener) = SessionManager::start(backend.clone()).await;
    let mut changes = session.watch();

    backend.emit(SessionEvent::SignedIn(FakeBackend::session_for(&bob)));
    assert_eq!(next_change(&mut changes).await, Some(bob.clone()));
    assert_eq!(session.current().await, Some(bob.clone()));

    // A refresh for the same identity is not a change.
    backend.emit(SessionEvent::TokenRefreshed(FakeBackend::session_for(&bob)));
    backend.emit(SessionEvent::SignedOut);
    assert_eq!(next_change(&mut changes).await, None);
    assert_eq!(session.current().await, None);
}

#[tokio::test]
async fn sign_in_updates_identity_before_returning() {
    let backend = FakeBackend::new();
    let carol = backend.add_account("carol");
    let (session, _listener) = SessionManager::start(backend.clone()).await;

    let issued = session
        .sign_in("carol@example.com", "secret")
        .await
        .expect("sign in");
    assert_eq!(issued.user, carol);
    assert_eq!(session.current().await, Some(carol));

    let err = session
        .sign_in("carol@example.com", "wrong")
        .await
        .expect_err("bad password");
    assert_eq!(err.message, "Invalid login credentials");
}

#[tokio::test]
async fn sign_out_clears_identity() {
    let backend = FakeBackend::new();
    let dave = backend.add_account("dave");
    backend.restore_session(&dave);
    let (session, _listener) = SessionManager::start(backend.clone()).await;

    session.sign_out().await.expect("sign out");
    assert_eq!(session.current().await, None);
}

#[tokio::test]
async fn dropping_listener_stops_callbacks() {
    let backend = FakeBackend::new();
    let erin = backend.add_account("erin");
    let (session, _listener) = SessionManager::start(backend.clone()).await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let callback_listener = session.on_change(move |identity| {
        let _ = tx.send(identity);
    });

    backend.emit(SessionEvent::SignedIn(FakeBackend::session_for(&erin)));
    let seen = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("callback fired")
        .expect("sender alive");
    assert_eq!(seen, Some(erin));

    callback_listener.cancel();
    backend.emit(SessionEvent::SignedOut);
    // The callback task is gone, so its sender is dropped with it.
    let after = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("channel settles");
    assert_eq!(after, None);
}
