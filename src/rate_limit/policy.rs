use crate::error::ConfigError;
use log::debug;
use std::collections::HashMap;

pub const GENERAL: &str = "general";
pub const DDOS: &str = "ddos";
// one week
pub const MAX_WINDOW_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitPolicy {
    pub endpoint: String,
    pub window_ms: u64,
    pub max_requests: u32,
    pub message: String,
    // a request that ends in success gives its slot back
    pub skip_successful_requests: bool,
}

impl RateLimitPolicy {
    pub fn new(endpoint: &str, window_ms: u64, max_requests: u32, message: &str, skip: bool) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            window_ms,
            max_requests,
            message: message.to_string(),
            skip_successful_requests: skip,
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_ms / 1000
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 {
            return Err(ConfigError::InvalidPolicy {
                endpoint: self.endpoint.clone(),
                field: "window_ms",
            });
        }
        if self.window_ms > MAX_WINDOW_MS {
            return Err(ConfigError::WindowTooLong {
                endpoint: self.endpoint.clone(),
                window_ms: self.window_ms,
                max_ms: MAX_WINDOW_MS,
            });
        }
        if self.max_requests == 0 {
            return Err(ConfigError::InvalidPolicy {
                endpoint: self.endpoint.clone(),
                field: "max_requests",
            });
        }
        Ok(())
    }
}

fn endpoint_policies() -> Vec<RateLimitPolicy> {
    vec![
        RateLimitPolicy::new(
            "reservations",
            15 * 60 * 1000,
            5,
            "Too many reservation attempts. Please try again in 15 minutes.",
            false,
        ),
        RateLimitPolicy::new(
            "catering",
            30 * 60 * 1000,
            3,
            "Too many catering requests. Please try again in 30 minutes.",
            false,
        ),
        RateLimitPolicy::new(
            "feedback",
            60 * 60 * 1000,
            10,
            "Too many feedback submissions. Please try again in an hour.",
            true,
        ),
        RateLimitPolicy::new(
            "availability",
            5 * 60 * 1000,
            30,
            "Too many availability checks. Please slow down.",
            true,
        ),
        RateLimitPolicy::new(
            "admin",
            5 * 60 * 1000,
            50,
            "Too many admin requests. Please slow down.",
            false,
        ),
    ]
}

// `general` is the fallback for unknown names; `ddos` is never picked by name
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: HashMap<String, RateLimitPolicy>,
    general: RateLimitPolicy,
    ddos: RateLimitPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            policies: endpoint_policies()
                .into_iter()
                .map(|p| (p.endpoint.clone(), p))
                .collect(),
            general: RateLimitPolicy::new(
                GENERAL,
                15 * 60 * 1000,
                100,
                "Too many requests. Please try again later.",
                true,
            ),
            ddos: RateLimitPolicy::new(
                DDOS,
                60 * 1000,
                20,
                "Request rate exceeded. Please wait a minute before retrying.",
                false,
            ),
        }
    }
}

impl PolicyTable {
    /// Default table with `name=window_ms:max_requests` overrides applied.
    pub fn with_overrides<S: AsRef<str>>(overrides: &[S]) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for raw in overrides {
            let raw = raw.as_ref();
            let (name, window_ms, max_requests) = parse_override(raw)?;
            let policy = table
                .get_mut(name)
                .ok_or_else(|| ConfigError::UnknownPolicy(name.to_string()))?;
            policy.window_ms = window_ms;
            policy.max_requests = max_requests;
        }
        table.validate()?;
        Ok(table)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut RateLimitPolicy> {
        match name {
            GENERAL => Some(&mut self.general),
            DDOS => Some(&mut self.ddos),
            _ => self.policies.get_mut(name),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.iter().try_for_each(RateLimitPolicy::validate)
    }

    pub fn insert(&mut self, policy: RateLimitPolicy) -> Result<(), ConfigError> {
        policy.validate()?;
        match policy.endpoint.as_str() {
            GENERAL => self.general = policy,
            DDOS => self.ddos = policy,
            _ => {
                self.policies.insert(policy.endpoint.clone(), policy);
            }
        }
        Ok(())
    }

    pub fn resolve(&self, endpoint: &str) -> &RateLimitPolicy {
        if endpoint == GENERAL {
            return &self.general;
        }
        match self.policies.get(endpoint) {
            Some(policy) => policy,
            None => {
                debug!("No rate limit policy for '{}', using general", endpoint);
                &self.general
            }
        }
    }

    pub fn ddos(&self) -> &RateLimitPolicy {
        &self.ddos
    }

    pub fn for_key(&self, key: &str) -> &RateLimitPolicy {
        let endpoint = key.split(':').next().unwrap_or(GENERAL);
        if endpoint == DDOS {
            self.ddos()
        } else {
            self.resolve(endpoint)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateLimitPolicy> {
        self.policies
            .values()
            .chain([&self.general, &self.ddos])
    }
}

fn parse_override(raw: &str) -> Result<(&str, u64, u32), ConfigError> {
    let malformed = || ConfigError::MalformedOverride(raw.to_string());

    let (name, limits) = raw.split_once('=').ok_or_else(malformed)?;
    let (window, max) = limits.split_once(':').ok_or_else(malformed)?;
    let window_ms = window.trim().parse().map_err(|_| malformed())?;
    let max_requests = max.trim().parse().map_err(|_| malformed())?;

    Ok((name.trim(), window_ms, max_requests))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_limits() {
        let table = PolicyTable::default();
        let expected = [
            ("reservations", 900_000, 5, false),
            ("catering", 1_800_000, 3, false),
            ("feedback", 3_600_000, 10, true),
            ("availability", 300_000, 30, true),
            ("general", 900_000, 100, true),
            ("admin", 300_000, 50, false),
        ];
        for (name, window_ms, max, skip) in expected {
            let policy = table.resolve(name);
            assert_eq!(policy.endpoint, name);
            assert_eq!(policy.window_ms, window_ms);
            assert_eq!(policy.max_requests, max);
            assert_eq!(policy.skip_successful_requests, skip);
        }
        assert_eq!(table.ddos().window_ms, 60_000);
        assert_eq!(table.ddos().max_requests, 20);
    }

    #[test]
    fn unknown_and_ddos_fall_back_to_general() {
        let table = PolicyTable::default();
        assert_eq!(table.resolve("reservatons").endpoint, GENERAL);
        assert_eq!(table.resolve(DDOS).endpoint, GENERAL);
    }

    #[test]
    fn key_prefix_selects_policy() {
        let table = PolicyTable::default();
        assert_eq!(table.for_key("catering:1.2.3.4").endpoint, "catering");
        assert_eq!(table.for_key("ddos:1.2.3.4").endpoint, DDOS);
        assert_eq!(table.for_key("mystery:1.2.3.4").endpoint, GENERAL);
    }

    #[test]
    fn overrides_are_applied() {
        let table = PolicyTable::with_overrides(&["reservations=60000:2"]).unwrap();
        let policy = table.resolve("reservations");
        assert_eq!(policy.window_ms, 60_000);
        assert_eq!(policy.max_requests, 2);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        assert_eq!(
            PolicyTable::with_overrides(&["reservations"]).unwrap_err(),
            ConfigError::MalformedOverride("reservations".to_string())
        );
        assert_eq!(
            PolicyTable::with_overrides(&["brunch=1000:2"]).unwrap_err(),
            ConfigError::UnknownPolicy("brunch".to_string())
        );
        assert_eq!(
            PolicyTable::with_overrides(&["admin=1000:0"]).unwrap_err(),
            ConfigError::InvalidPolicy {
                endpoint: "admin".to_string(),
                field: "max_requests"
            }
        );
    }

    #[test]
    fn oversized_windows_are_rejected() {
        assert_eq!(
            PolicyTable::with_overrides(&["reservations=18446744073709551615:2"]).unwrap_err(),
            ConfigError::WindowTooLong {
                endpoint: "reservations".to_string(),
                window_ms: u64::MAX,
                max_ms: MAX_WINDOW_MS,
            }
        );
        let week = format!("catering={MAX_WINDOW_MS}:3");
        assert!(PolicyTable::with_overrides(&[week]).is_ok());

        let mut table = PolicyTable::default();
        let huge = RateLimitPolicy::new("brunch", MAX_WINDOW_MS + 1, 1, "no", false);
        assert!(matches!(table.insert(huge), Err(ConfigError::WindowTooLong { .. })));
    }
}
