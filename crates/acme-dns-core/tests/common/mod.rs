//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles: a resolver that replays a
//! script of answers and a provider that can be told to fail.

#![allow(dead_code)]

use acme_dns_core::config::{ChallengeConfig, PropagationConfig, ProviderConfig};
use acme_dns_core::error::{Error, Result};
use acme_dns_core::traits::{DnsProvider, RecordMetadata, TxtLookup, TxtResolver};
use acme_dns_core::PropagationPolicy;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted answer from the resolver
#[derive(Debug, Clone)]
pub enum Answer {
    /// TXT records returned
    Records(Vec<&'static str>),
    /// NXDOMAIN
    NotFound,
    /// SERVFAIL, timeout, ...
    Fault(&'static str),
    /// A resolver fault that is not transient
    Broken(&'static str),
}

/// A resolver that replays scripted answers in order
///
/// Once the script runs out every further lookup answers NXDOMAIN.
#[derive(Default)]
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Answer>>,
    queried: Mutex<Vec<String>>,
    lookup_count: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Answer>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            queried: Mutex::new(Vec::new()),
            lookup_count: AtomicUsize::new(0),
        })
    }

    /// A resolver that always answers NXDOMAIN
    pub fn never_found() -> Arc<Self> {
        Self::new(Vec::new())
    }

    /// Number of lookups performed
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    /// Names that were queried, in order
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TxtResolver for ScriptedResolver {
    async fn lookup_txt(&self, name: &str) -> Result<TxtLookup> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(name.to_string());

        match self.script.lock().unwrap().pop_front() {
            Some(Answer::Records(values)) => Ok(TxtLookup::Records(
                values.into_iter().map(str::to_string).collect(),
            )),
            Some(Answer::NotFound) | None => Ok(TxtLookup::NotFound),
            Some(Answer::Fault(msg)) => Err(Error::resolver(msg)),
            Some(Answer::Broken(msg)) => Err(Error::invalid_input(msg)),
        }
    }
}

/// A provider that tracks calls and fails on demand
pub struct FlakyProvider {
    create_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    fail_create: bool,
    fail_delete: bool,
    policy: Option<PropagationPolicy>,
}

impl FlakyProvider {
    pub fn new() -> Self {
        Self {
            create_calls: Arc::new(AtomicUsize::new(0)),
            delete_calls: Arc::new(AtomicUsize::new(0)),
            fail_create: false,
            fail_delete: false,
            policy: None,
        }
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn with_policy(mut self, policy: PropagationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Create a new FlakyProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            create_calls: Arc::clone(&other.create_calls),
            delete_calls: Arc::clone(&other.delete_calls),
            fail_create: other.fail_create,
            fail_delete: other.fail_delete,
            policy: other.policy,
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for FlakyProvider {
    async fn create_record(&self, _domain: &str, _token: &str) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(Error::provider("flaky", "AccessDenied"));
        }
        Ok(())
    }

    async fn delete_record(&self, _domain: &str, _token: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(Error::provider("flaky", "Throttling"));
        }
        Ok(())
    }

    async fn get_record(&self, _domain: &str) -> Result<Option<RecordMetadata>> {
        Ok(None)
    }

    fn propagation_policy(&self) -> PropagationPolicy {
        self.policy.unwrap_or_default()
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

/// Helper to create a ChallengeConfig with the default 5 × 15s policy
pub fn default_config() -> ChallengeConfig {
    ChallengeConfig::new(ProviderConfig::Memory)
}

/// Helper to create a ChallengeConfig with an explicit policy
pub fn config_with(attempts: u32, delay_secs: u64) -> ChallengeConfig {
    default_config().with_propagation(PropagationConfig {
        attempts,
        delay_secs,
    })
}
