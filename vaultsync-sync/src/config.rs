//! Sync configuration.

use serde::{Deserialize, Serialize};
use vaultsync_crypto::KdfParams;

/// Configuration for a sync session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Device name for logs.
    pub device_name: String,
    /// Total conditional-write attempts per sync before giving up with
    /// `ConflictRetryExhausted`.
    pub max_conflict_retries: u32,
    /// Backoff for network failures.
    pub retry: RetryConfig,
    /// Argon2 costs for newly created vaults. Existing vaults keep the
    /// costs recorded in their blob header.
    pub kdf: KdfParams,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            device_name: "VaultSync Device".to_string(),
            max_conflict_retries: 5,
            retry: RetryConfig::default(),
            kdf: KdfParams::default(),
        }
    }
}

/// Exponential backoff for retryable store failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 200,
            max_backoff_ms: 10_000,
            factor: 2.0,
        }
    }
}
