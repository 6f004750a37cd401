use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;
use crate::metrics::{ADMISSIONS_REJECTED, SLOTS_RELEASED, STORE_ERRORS, SWEPT_KEYS, TRACKED_KEYS};

use super::identifier::{RequestMeta, identify, user_identifier};
use super::policy::{DDOS, PolicyTable, RateLimitPolicy};
use super::store::{MemoryStore, RateLimitStore};
use super::window::{self, Millis, WindowDecision};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub endpoint: String,
    pub identifier: String,
}

impl ClientKey {
    pub fn new(endpoint: &str, identifier: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseToken {
    key: String,
    timestamp: Millis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allowance {
    pub limit: u32,
    // after this request was recorded
    pub remaining: u32,
    pub reset_at: Millis,
    pub window_ms: u64,
    // only for policies that give slots back on success
    pub release_token: Option<ReleaseToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub message: String,
    pub retry_after_secs: u64,
    pub limit: u32,
    pub reset_at: Millis,
    pub window_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionResult {
    Allowed(Allowance),
    Rejected(Rejection),
}

impl AdmissionResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionResult::Allowed(_))
    }

    pub fn limit(&self) -> u32 {
        match self {
            AdmissionResult::Allowed(a) => a.limit,
            AdmissionResult::Rejected(r) => r.limit,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            AdmissionResult::Allowed(a) => a.remaining,
            AdmissionResult::Rejected(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Millis,
    pub window_ms: u64,
}

pub fn now_millis() -> Millis {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// RFC 3339 with millisecond precision, e.g. `2026-10-19T18:00:00.000Z`.
pub fn to_rfc3339(at: Millis) -> String {
    i64::try_from(at)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

// One per process, shared through `Arc`
pub struct Admission {
    policies: PolicyTable,
    store: Arc<dyn RateLimitStore>,
}

impl Admission {
    pub fn new(policies: PolicyTable) -> Self {
        Self::with_store(policies, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(policies: PolicyTable, store: Arc<dyn RateLimitStore>) -> Self {
        Self { policies, store }
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn admit(&self, endpoint: &str, meta: &RequestMeta) -> AdmissionResult {
        self.admit_at(endpoint, meta, now_millis())
    }

    pub fn admit_at(&self, endpoint: &str, meta: &RequestMeta, now: Millis) -> AdmissionResult {
        let key = ClientKey::new(endpoint, &identify(meta));
        self.admit_key(self.policies.resolve(endpoint), &key, now)
    }

    pub fn admit_user(&self, endpoint: &str, user_id: &str) -> AdmissionResult {
        self.admit_user_at(endpoint, user_id, now_millis())
    }

    pub fn admit_user_at(&self, endpoint: &str, user_id: &str, now: Millis) -> AdmissionResult {
        let key = ClientKey::new(endpoint, &user_identifier(user_id));
        self.admit_key(self.policies.resolve(endpoint), &key, now)
    }

    /// Always-on flood guard, applied independently of endpoint policies.
    pub fn ddos_guard(&self, meta: &RequestMeta) -> bool {
        self.ddos_check(meta).is_allowed()
    }

    pub fn ddos_check(&self, meta: &RequestMeta) -> AdmissionResult {
        self.ddos_check_at(meta, now_millis())
    }

    pub fn ddos_check_at(&self, meta: &RequestMeta, now: Millis) -> AdmissionResult {
        let key = ClientKey::new(DDOS, &identify(meta));
        self.admit_key(self.policies.ddos(), &key, now)
    }

    fn admit_key(&self, policy: &RateLimitPolicy, key: &ClientKey, now: Millis) -> AdmissionResult {
        let key = key.to_string();
        let mut decision: Option<WindowDecision> = None;

        if let Err(e) = self.store.update(&key, &mut |timestamps| {
            decision = Some(window::check(timestamps, policy, now));
        }) {
            return self.fail_open(policy, &key, now, &e);
        }
        let Some(decision) = decision else {
            let e = StoreError::Unavailable("update callback never ran".to_string());
            return self.fail_open(policy, &key, now, &e);
        };

        if decision.allowed {
            debug!(
                "Admitted {} ({} of {} left)",
                key,
                decision.remaining.saturating_sub(1),
                policy.max_requests
            );
            let release_token = policy.skip_successful_requests.then(|| ReleaseToken {
                key,
                timestamp: now,
            });
            AdmissionResult::Allowed(Allowance {
                limit: policy.max_requests,
                remaining: decision.remaining.saturating_sub(1),
                reset_at: decision.reset_at,
                window_ms: policy.window_ms,
                release_token,
            })
        } else {
            let retry_after_secs = decision.reset_at.saturating_sub(now).div_ceil(1000);
            warn!("Rate limit exceeded for {}, retry in {}s", key, retry_after_secs);
            ADMISSIONS_REJECTED
                .with_label_values(&[policy.endpoint.as_str()])
                .inc();
            AdmissionResult::Rejected(Rejection {
                message: policy.message.clone(),
                retry_after_secs,
                limit: policy.max_requests,
                reset_at: decision.reset_at,
                window_ms: policy.window_ms,
            })
        }
    }

    // Store faults must never take the site down: admit and move on.
    fn fail_open(&self, policy: &RateLimitPolicy, key: &str, now: Millis, e: &StoreError) -> AdmissionResult {
        warn!("Rate limiter failing open for {}: {}", key, e);
        STORE_ERRORS.inc();
        AdmissionResult::Allowed(Allowance {
            limit: policy.max_requests,
            remaining: policy.max_requests,
            reset_at: now.saturating_add(policy.window_ms),
            window_ms: policy.window_ms,
            release_token: None,
        })
    }

    // Removes one occurrence of the recorded timestamp
    pub fn release(&self, token: &ReleaseToken) -> bool {
        let mut released = false;
        let outcome = self.store.update(&token.key, &mut |timestamps| {
            if let Some(pos) = timestamps.iter().position(|&t| t == token.timestamp) {
                timestamps.remove(pos);
                released = true;
            }
        });

        match outcome {
            Ok(()) if released => {
                SLOTS_RELEASED.inc();
                debug!("Released slot for {}", token.key);
                true
            }
            Ok(()) => {
                debug!("Slot for {} already expired", token.key);
                false
            }
            Err(e) => {
                STORE_ERRORS.inc();
                warn!("Could not release slot for {}: {}", token.key, e);
                false
            }
        }
    }

    pub fn status(&self, endpoint: &str, meta: &RequestMeta) -> RateLimitStatus {
        self.status_at(endpoint, meta, now_millis())
    }

    /// Current quota without recording a request.
    pub fn status_at(&self, endpoint: &str, meta: &RequestMeta, now: Millis) -> RateLimitStatus {
        let policy = self.policies.resolve(endpoint);
        let key = ClientKey::new(endpoint, &identify(meta)).to_string();

        let mut decision: Option<WindowDecision> = None;
        if let Err(e) = self.store.update(&key, &mut |timestamps| {
            window::prune(timestamps, policy.window_ms, now);
            decision = Some(window::evaluate(timestamps, policy, now));
        }) {
            STORE_ERRORS.inc();
            warn!("Rate limit status unavailable for {}: {}", key, e);
        }

        let decision = decision.unwrap_or(WindowDecision {
            allowed: true,
            remaining: policy.max_requests,
            reset_at: now.saturating_add(policy.window_ms),
        });
        RateLimitStatus {
            limit: policy.max_requests,
            remaining: decision.remaining,
            reset_at: decision.reset_at,
            window_ms: policy.window_ms,
        }
    }

    pub fn reset(&self, endpoint: &str, identifier: &str) -> bool {
        let key = ClientKey::new(endpoint, identifier).to_string();
        match self.store.remove(&key) {
            Ok(removed) => removed,
            Err(e) => {
                STORE_ERRORS.inc();
                warn!("Could not reset {}: {}", key, e);
                false
            }
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(now_millis())
    }

    /// Prunes every key against its own policy window and drops empty keys.
    pub fn sweep_at(&self, now: Millis) -> usize {
        let policies = &self.policies;
        let removed = match self.store.retain(&mut |key, timestamps| {
            window::prune(timestamps, policies.for_key(key).window_ms, now);
        }) {
            Ok(removed) => removed,
            Err(e) => {
                STORE_ERRORS.inc();
                warn!("Rate limit sweep failed: {}", e);
                0
            }
        };

        SWEPT_KEYS.inc_by(removed as u64);
        TRACKED_KEYS.set(i64::try_from(self.store.len()).unwrap_or(i64::MAX));
        removed
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
