use std::io;

use russh_sftp::protocol::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("Key error: {0}")]
    Keys(#[from] russh::keys::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("SFTP error: {0}")]
    Sftp(russh_sftp::client::error::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("failed to connect to {host}: {source}")]
    Connection {
        host: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to start SFTP subsystem on {host}: {source}")]
    Subsession {
        host: String,
        #[source]
        source: Box<Error>,
    },

    #[error("authentication rejected for {user}@{host}")]
    Authentication { user: String, host: String },

    #[error("no such file: {path}")]
    NotFound { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("remote error on {path}: {message}")]
    Remote { path: String, message: String },

    #[error("end of directory listing")]
    EndOfSequence,

    #[error("invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Classify an SFTP client error raised while operating on `path`.
    #[must_use]
    pub fn from_sftp(err: russh_sftp::client::error::Error, path: &str) -> Self {
        let russh_sftp::client::error::Error::Status(status) = &err else {
            return Self::Sftp(err);
        };

        match status.status_code {
            StatusCode::NoSuchFile => Self::NotFound {
                path: path.to_string(),
            },
            StatusCode::PermissionDenied => Self::PermissionDenied {
                path: path.to_string(),
            },
            _ => Self::Remote {
                path: path.to_string(),
                message: status.error_message.clone(),
            },
        }
    }

    /// Classify a local I/O error raised while operating on `path`.
    #[must_use]
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_string(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_string(),
            },
            _ => Self::Io(err),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Self::Io(err) => err,
            other => io::Error::other(other),
        }
    }
}

/// Traps the first error passed to [`StickyError::set`] and ignores the rest.
///
/// Every step of a multi-step cleanup is still attempted; only the first
/// failure is reported.
#[derive(Debug, Default)]
pub struct StickyError {
    err: Option<Error>,
}

impl StickyError {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T>(&mut self, result: Result<T>) {
        if self.err.is_some() {
            return;
        }

        if let Err(e) = result {
            self.err = Some(e);
        }
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.err.is_some()
    }

    /// Returns the first error received, if any
    ///
    /// # Errors
    ///
    /// Returns the trapped error
    pub fn into_result(self) -> Result<()> {
        self.err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_keeps_first_error() {
        let mut sticky = StickyError::new();
        sticky.set(Ok(()));
        sticky.set::<()>(Err(Error::EndOfSequence));
        sticky.set::<()>(Err(Error::Config("second".into())));

        assert!(sticky.is_set());
        assert!(matches!(sticky.into_result(), Err(Error::EndOfSequence)));
    }

    #[test]
    fn sticky_without_errors_is_ok() {
        let mut sticky = StickyError::new();
        sticky.set(Ok(1));
        sticky.set(Ok("two"));

        assert!(sticky.into_result().is_ok());
    }

    #[test]
    fn io_not_found_is_classified() {
        let err = Error::from_io(io::Error::from(io::ErrorKind::NotFound), "/missing");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no such file: /missing");
    }

    #[test]
    fn io_permission_denied_is_classified() {
        let err = Error::from_io(io::Error::from(io::ErrorKind::PermissionDenied), "/secret");

        assert!(matches!(err, Error::PermissionDenied { ref path } if path == "/secret"));
    }

    fn status(status_code: StatusCode, message: &str) -> russh_sftp::client::error::Error {
        russh_sftp::client::error::Error::Status(russh_sftp::protocol::Status {
            id: 7,
            status_code,
            error_message: message.to_string(),
            language_tag: "en-US".to_string(),
        })
    }

    #[test]
    fn sftp_no_such_file_is_not_found() {
        let err = Error::from_sftp(status(StatusCode::NoSuchFile, "No such file"), "/gone");

        assert!(err.is_not_found());
        assert!(matches!(err, Error::NotFound { ref path } if path == "/gone"));
    }

    #[test]
    fn sftp_permission_denied_is_classified() {
        let err = Error::from_sftp(status(StatusCode::PermissionDenied, "denied"), "/root");

        assert!(!err.is_not_found());
        assert!(matches!(err, Error::PermissionDenied { ref path } if path == "/root"));
    }

    #[test]
    fn other_sftp_status_keeps_server_message() {
        let err = Error::from_sftp(status(StatusCode::Failure, "disk on fire"), "/var/log");

        assert!(matches!(
            err,
            Error::Remote { ref path, ref message } if path == "/var/log" && message == "disk on fire"
        ));
    }

    #[test]
    fn sftp_transport_failure_stays_sftp() {
        let err = Error::from_sftp(russh_sftp::client::error::Error::Timeout, "/slow");

        assert!(matches!(err, Error::Sftp(russh_sftp::client::error::Error::Timeout)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn into_io_unwraps_io_errors() {
        let err = Error::Io(io::Error::from(io::ErrorKind::BrokenPipe)).into_io();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
