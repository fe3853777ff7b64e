use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub feedback: FeedbackConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,

    #[command(flatten)]
    pub server: ServerConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "APNS_FEEDBACK_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "APNS_FEEDBACK_DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "APNS_FEEDBACK_DB_MIN_CONNECTIONS", default_value_t = 0)]
    pub min_connections: u32,

    /// How long to wait for a pooled connection
    #[arg(long, env = "APNS_FEEDBACK_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct FeedbackConfig {
    /// Seconds to wait between feedback polls
    #[arg(
        long = "feedback-poll-interval-secs",
        env = "APNS_FEEDBACK_POLL_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// Timeout for establishing the TLS connection to the feedback service
    #[arg(long = "feedback-connect-timeout-secs", env = "APNS_FEEDBACK_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Timeout for a single socket read from the feedback service
    #[arg(long = "feedback-read-timeout-secs", env = "APNS_FEEDBACK_READ_TIMEOUT_SECS", default_value_t = 30)]
    pub read_timeout_secs: u64,

    /// PEM bundle of CA certificates trusted for the feedback service
    #[arg(long = "ca-bundle-path", env = "APNS_FEEDBACK_CA_BUNDLE_PATH", default_value = "/etc/ssl/certs/ca-certificates.crt")]
    pub ca_bundle_path: PathBuf,

    /// Capacity of the in-process feedback event channel
    #[arg(long = "feedback-event-capacity", env = "APNS_FEEDBACK_EVENT_CAPACITY", default_value_t = 64)]
    pub event_capacity: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; traces and metrics are only exported when set
    #[arg(long = "otlp-endpoint", env = "APNS_FEEDBACK_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long = "log-format", env = "APNS_FEEDBACK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Seconds to wait for pollers to finish after a shutdown signal
    #[arg(long, env = "APNS_FEEDBACK_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
