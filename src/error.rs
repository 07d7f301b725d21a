//! Error types. Nothing here is fatal to the page: every variant degrades one
//! cosmetic or progression feature and the rest of the hub keeps running.

/// Audio graph / playback failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// Autoplay policy refused `play()`; retried on the next user gesture.
    #[error("playback blocked: {0}")]
    PlaybackBlocked(String),

    /// The platform refused to attach a source to the analysis node
    /// (e.g. a second `MediaElementSource` for the same element).
    #[error("failed to attach analysis source: {0}")]
    GraphAttachFailure(String),

    /// No audio context could be created at all.
    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),
}

/// Durable storage read/write failures (quota, disabled storage, private mode).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("could not encode stored value: {0}")]
    Encode(String),
}

/// User-facing redeem failures. `Display` is the message shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedeemError {
    #[error("Code not found")]
    CodeNotFound,

    #[error("Code already redeemed")]
    AlreadyRedeemed,

    /// The redeemed set could not be written, so the reward was withheld.
    #[error("Could not save redemption, try again later")]
    NotSaved,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgressError {
    /// Non-positive, fractional-only or non-finite XP grant.
    #[error("invalid reward amount: {0}")]
    InvalidRewardAmount(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid hub config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeem_errors_render_as_messages() {
        assert_eq!(RedeemError::CodeNotFound.to_string(), "Code not found");
        assert_eq!(RedeemError::AlreadyRedeemed.to_string(), "Code already redeemed");
        assert!(RedeemError::NotSaved.to_string().starts_with("Could not save"));
    }

    #[test]
    fn config_error_wraps_serde() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid hub config"));
    }
}
