//! Submission retry policy for job dispatch

use courier_types::{deser_courier_u32, deser_courier_u64};

/// Bounded retry policy for transient submission failures
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(deserialize_with = "deser_courier_u32")]
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds
    #[serde(deserialize_with = "deser_courier_u64")]
    pub backoff_ms: u64,
    /// Gas price increase applied after a fee-too-low rejection, in basis
    /// points of the previous price
    #[serde(deserialize_with = "deser_courier_u32")]
    pub price_bump_bps: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_ms: 500,
            price_bump_bps: 1_250,
        }
    }
}

impl RetryConfig {
    /// Backoff as a duration
    pub fn backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.backoff_ms)
    }

    /// Syntactically validate the retry config
    pub fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(self.max_attempts > 0, "maxAttempts must be at least 1");
        Ok(())
    }
}
