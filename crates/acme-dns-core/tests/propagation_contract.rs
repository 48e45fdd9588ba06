//! Contract Test: Propagation Polling
//!
//! Verifies the bounded retry-with-fixed-delay loop of the verifier.
//!
//! Constraints verified:
//! - The delay is slept before every lookup, including the first
//! - A match stops polling immediately
//! - Exhaustion is a `false`, never an error, after exactly `attempts` lookups
//! - NXDOMAIN and transient resolver faults are "not yet", not fatal
//! - Quoting on the wire is ignored when comparing
//!
//! Time is paused, so the 15 second sleeps complete instantly.

mod common;

use acme_dns_core::{PropagationPolicy, PropagationVerifier, VerificationOutcome};
use common::*;
use std::time::Duration;
use tokio::time::Instant;

fn verifier(resolver: std::sync::Arc<ScriptedResolver>, attempts: u32) -> PropagationVerifier {
    PropagationVerifier::new(
        resolver,
        PropagationPolicy::new(attempts, Duration::from_secs(15)),
    )
}

#[tokio::test(start_paused = true)]
async fn first_round_match_after_one_sleep() {
    let resolver = ScriptedResolver::new(vec![Answer::Records(vec!["abc123"])]);
    let verifier = verifier(resolver.clone(), 5);

    let started = Instant::now();
    let propagated = verifier.validate("example.com", "abc123").await;
    let elapsed = started.elapsed();

    assert!(propagated);
    assert_eq!(resolver.lookup_count(), 1);
    assert_eq!(resolver.queried(), vec!["_acme-challenge.example.com.".to_string()]);
    assert!(
        elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(30),
        "expected exactly one sleep cycle, took {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn match_stops_polling_early() {
    let resolver = ScriptedResolver::new(vec![
        Answer::NotFound,
        Answer::Records(vec!["stale-token"]),
        Answer::Records(vec!["other", "\"abc123\""]),
        Answer::Records(vec!["abc123"]),
    ]);
    let verifier = verifier(resolver.clone(), 5);

    let outcome = verifier.verify("example.com", "abc123").await;

    assert_eq!(outcome, VerificationOutcome::Propagated { attempt: 3 });
    assert_eq!(
        resolver.lookup_count(),
        3,
        "no lookups may happen after the matching round"
    );
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_false_after_exactly_attempts_rounds() {
    let resolver = ScriptedResolver::never_found();
    let verifier = verifier(resolver.clone(), 5);

    let started = Instant::now();
    let propagated = verifier.validate("example.com", "abc123").await;

    assert!(!propagated);
    assert_eq!(resolver.lookup_count(), 5);
    assert!(started.elapsed() >= Duration::from_secs(75));
}

#[tokio::test(start_paused = true)]
async fn non_matching_values_exhaust_budget() {
    let resolver = ScriptedResolver::new(vec![
        Answer::Records(vec!["nope"]),
        Answer::Records(vec!["nope"]),
        Answer::Records(vec!["nope"]),
    ]);
    let verifier = verifier(resolver.clone(), 3);

    let outcome = verifier.verify("example.com", "abc123").await;

    assert_eq!(outcome, VerificationOutcome::Exhausted { attempts: 3 });
    assert_eq!(resolver.lookup_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn resolver_faults_are_retried() {
    let resolver = ScriptedResolver::new(vec![
        Answer::Fault("SERVFAIL"),
        Answer::Fault("request timed out"),
        Answer::Records(vec!["abc123"]),
    ]);
    let verifier = verifier(resolver.clone(), 5);

    let outcome = verifier.verify("example.com", "abc123").await;

    assert_eq!(outcome, VerificationOutcome::Propagated { attempt: 3 });
}

#[tokio::test(start_paused = true)]
async fn non_transient_faults_do_not_escape() {
    let resolver = ScriptedResolver::new(vec![
        Answer::Broken("malformed response"),
        Answer::Records(vec!["abc123"]),
    ]);
    let verifier = verifier(resolver.clone(), 5);

    let outcome = verifier.verify("example.com", "abc123").await;

    assert_eq!(outcome, VerificationOutcome::Propagated { attempt: 2 });
    assert_eq!(resolver.lookup_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn ten_attempt_policy_is_honored() {
    let resolver = ScriptedResolver::never_found();
    let verifier = verifier(resolver.clone(), 10);

    assert!(!verifier.validate("example.com", "abc123").await);
    assert_eq!(resolver.lookup_count(), 10);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_before_next_lookup() {
    let resolver = ScriptedResolver::never_found();
    let verifier = verifier(resolver.clone(), 5);
    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel();

    let task = {
        let verifier = verifier.clone();
        tokio::spawn(async move {
            verifier
                .verify_with_cancel("example.com", "abc123", Some(cancel_rx))
                .await
        })
    };

    // Let two rounds complete, then cancel during the third sleep
    tokio::time::sleep(Duration::from_secs(35)).await;
    cancel_tx.send(()).unwrap();

    let outcome = task.await.unwrap();
    assert_eq!(outcome, VerificationOutcome::Cancelled { attempt: 3 });
    assert_eq!(resolver.lookup_count(), 2);
}
