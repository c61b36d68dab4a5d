//! Gateway error kinds.

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Every failure a façade call can yield.
///
/// `Connection` and `ConnectionClosed` are fatal to the client: the caller
/// must build a fresh [`crate::GatewayClient`] (fresh identifier counter,
/// empty cache). `Timeout` fails only the one command that hit its deadline.
/// `Application` is a server-reported rejection, returned as data rather
/// than treated as a transport fault.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request {0} timed out")]
    Timeout(String),
    #[error("connection closed with requests outstanding")]
    ConnectionClosed,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("exchange rejected request: {0}")]
    Application(String),
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Serialization(e) => GatewayError::Protocol(e.to_string()),
            other => GatewayError::Connection(other.to_string()),
        }
    }
}

impl GatewayError {
    /// True when the whole client is unusable and must be recreated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GatewayError::Connection(_) | GatewayError::ConnectionClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(GatewayError::ConnectionClosed.is_fatal());
        assert!(GatewayError::Connection("refused".into()).is_fatal());
        assert!(!GatewayError::Timeout("0000000007".into()).is_fatal());
        assert!(!GatewayError::Application("insufficient balance".into()).is_fatal());
    }
}
