use lexdesk_shared::BrokerError;

/// Failures creating or installing a realtime connection.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("no async runtime is available to drive the socket")]
    NoRuntime,
    #[error("a realtime manager is already installed")]
    AlreadyInstalled,
    #[error("transport error: {0}")]
    Transport(String),
}

/// A channel could not be joined. Reported to that channel's listeners only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("subscription rejected: {0}")]
    Rejected(String),
}

impl From<BrokerError> for ChannelError {
    fn from(err: BrokerError) -> Self {
        ChannelError::Rejected(err.to_string())
    }
}
