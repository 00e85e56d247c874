use std::fmt;

use tracing::{debug, info};

use crate::{Connector, Credentials, Error, FileSession, Result, StickyError, Transport};

/// One authenticated connection plus the file sub-session layered on it.
///
/// Both halves are opened together by [`SessionPair::establish`] and closed
/// together by [`SessionPair::close`].
pub struct SessionPair<C: Connector> {
    host: String,
    transport: C::Transport,
    session: C::Session,
}

impl<C: Connector> fmt::Debug for SessionPair<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPair")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> SessionPair<C> {
    /// Dial `host` and start the file sub-session on the new connection
    ///
    /// # Errors
    ///
    /// Returns
    ///   - [`Error::Connection`] if dialing fails
    ///   - [`Error::Subsession`] if the sub-session fails to start, after
    ///     closing the connection
    pub async fn establish(connector: &C, host: &str, credentials: &Credentials) -> Result<Self> {
        debug!(host = %host, user = %credentials.user(), "dialing");

        let transport = connector
            .dial(host, credentials)
            .await
            .map_err(|e| Error::Connection {
                host: host.to_string(),
                source: Box::new(e),
            })?;

        let session = match connector.start_session(&transport).await {
            Ok(session) => session,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!(host = %host, error = %close_err, "closing orphaned connection failed");
                }

                return Err(Error::Subsession {
                    host: host.to_string(),
                    source: Box::new(e),
                });
            }
        };

        info!(host = %host, "session established");

        Ok(Self {
            host: host.to_string(),
            transport,
            session,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn session(&self) -> &C::Session {
        &self.session
    }

    #[must_use]
    pub const fn transport(&self) -> &C::Transport {
        &self.transport
    }

    /// Close the file sub-session only
    ///
    /// # Errors
    ///
    /// Returns `Err` if the sub-session fails to close
    pub async fn close_session(&self) -> Result<()> {
        self.session.close().await
    }

    /// Close the connection only
    ///
    /// # Errors
    ///
    /// Returns `Err` if the connection fails to close
    pub async fn close_transport(&self) -> Result<()> {
        self.transport.close().await
    }

    /// Close the sub-session, then the connection
    ///
    /// Both steps always run; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by either step
    pub async fn close(&self) -> Result<()> {
        let mut sticky = StickyError::new();
        sticky.set(self.close_session().await);
        sticky.set(self.close_transport().await);

        info!(host = %self.host, "session closed");

        sticky.into_result()
    }
}
