use super::policy::RateLimitPolicy;

// epoch ms
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: Millis,
}

pub fn prune(timestamps: &mut Vec<Millis>, window_ms: u64, now: Millis) {
    timestamps.retain(|&t| t.saturating_add(window_ms) > now);
}

pub fn evaluate(timestamps: &[Millis], policy: &RateLimitPolicy, now: Millis) -> WindowDecision {
    let count = u32::try_from(timestamps.len()).unwrap_or(u32::MAX);
    let reset_at = match timestamps.iter().min() {
        Some(&oldest) => oldest.saturating_add(policy.window_ms),
        None => now.saturating_add(policy.window_ms),
    };

    WindowDecision {
        allowed: count < policy.max_requests,
        remaining: policy.max_requests.saturating_sub(count),
        reset_at,
    }
}

// `remaining` is counted before `now` is recorded
pub fn check(timestamps: &mut Vec<Millis>, policy: &RateLimitPolicy, now: Millis) -> WindowDecision {
    prune(timestamps, policy.window_ms, now);
    let decision = evaluate(timestamps, policy, now);
    if decision.allowed {
        timestamps.push(now);
    }
    decision
}
