// SPDX-License-Identifier: AGPL-3.0-or-later
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error from the messaging client, kept as the `source` of our own
/// variants so the diagnostic chain survives.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(#[source] BoxError),

    #[error("Error publishing message: exchange '{exchange}' not found")]
    TargetNotFound {
        exchange: String,
        #[source]
        source: BoxError,
    },

    #[error("Could not enable publisher confirmation: {0}")]
    Confirms(#[source] BoxError),

    #[error("Error publishing message: {0}")]
    Publish(#[source] BoxError),

    #[error("Could not confirm delivery of last message")]
    Unconfirmed,

    #[error("Channel closed before delivery of last message was confirmed")]
    ChannelClosed,

    #[error("Could not read password file {}: {source}", path.display())]
    PasswordFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read password from prompt: {0}")]
    Prompt(#[source] io::Error),

    #[error("Error reading input: {0}")]
    Input(#[source] io::Error),

    #[error("Error closing connection: {0}")]
    Close(#[source] BoxError),
}

impl Error {
    pub fn connection<E: Into<BoxError>>(err: E) -> Self {
        Error::Connection(err.into())
    }

    pub fn confirms<E: Into<BoxError>>(err: E) -> Self {
        Error::Confirms(err.into())
    }

    pub fn publish<E: Into<BoxError>>(err: E) -> Self {
        Error::Publish(err.into())
    }

    pub fn close<E: Into<BoxError>>(err: E) -> Self {
        Error::Close(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_mode_failure_is_not_a_connection_error() {
        let err = Error::confirms("channel closed");
        assert!(matches!(err, Error::Confirms(_)));
        assert_eq!(
            err.to_string(),
            "Could not enable publisher confirmation: channel closed"
        );
    }
}
