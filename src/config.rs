use clap::Parser;

use crate::error::ConfigError;
use crate::rate_limit::PolicyTable;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "restaurant-gateway")]
#[command(about = "Booking, catering and feedback API with per-endpoint rate limiting")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    // Seconds between rate limit store sweeps
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub cleanup_interval: u64,

    // Policy override, repeatable
    // Example: --policy reservations=900000:5
    #[arg(long = "policy", value_name = "NAME=WINDOW_MS:MAX")]
    pub policies: Vec<String>,

    // Webhook receiving staff notifications; log only when absent
    #[arg(long)]
    pub notify_webhook: Option<String>,

    // Seats available per dinner seating
    #[arg(long, default_value_t = 40)]
    pub seats_per_slot: u32,
}

impl Args {
    pub fn policy_table(&self) -> Result<PolicyTable, ConfigError> {
        PolicyTable::with_overrides(self.policies.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let args = Args::parse_from(["restaurant-gateway"]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.cleanup_interval, 300);
        assert!(args.notify_webhook.is_none());
        assert_eq!(args.policy_table().unwrap().resolve("catering").max_requests, 3);
    }

    #[test]
    fn repeated_policy_overrides() {
        let args = Args::parse_from([
            "restaurant-gateway",
            "--policy",
            "catering=60000:1",
            "--policy",
            "feedback=1000:2",
        ]);
        let table = args.policy_table().unwrap();
        assert_eq!(table.resolve("catering").max_requests, 1);
        assert_eq!(table.resolve("feedback").window_ms, 1000);
    }

    #[test]
    fn zero_cleanup_interval_is_refused() {
        assert!(Args::try_parse_from(["restaurant-gateway", "--cleanup-interval", "0"]).is_err());
    }
}
