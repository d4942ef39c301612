//! CLI configuration

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the experiment-tracking service
    pub service_url: String,
}
