use std::{fmt, path::Path, sync::Arc, time::Duration};

use russh::{client::Config, keys::PrivateKey};

use crate::auth::HostKeyPolicy;

/// How a client proves its identity to the server
#[derive(Clone, Default)]
pub enum AuthMethod {
    #[default]
    None,
    Password(String),
    PublicKey(Arc<PrivateKey>),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Password(_) => f.write_str("Password(..)"),
            Self::PublicKey(key) => write!(f, "PublicKey({})", key.algorithm()),
        }
    }
}

/// Authentication and connection settings for one or more hosts.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sftp_http::Credentials;
///
/// let credentials = Credentials::new("deploy")
///     .private_key_file("/home/deploy/.ssh/id_ed25519")?
///     .inactivity_timeout(Duration::from_secs(300));
/// # Ok::<(), sftp_http::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Credentials {
    user: String,
    method: AuthMethod,
    host_keys: HostKeyPolicy,
    inactivity_timeout: Option<Duration>,
    keepalive_interval: Option<Duration>,
    keepalive_max: Option<usize>,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            method: AuthMethod::None,
            host_keys: HostKeyPolicy::default(),
            inactivity_timeout: None,
            keepalive_interval: None,
            keepalive_max: None,
        }
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.method = AuthMethod::Password(password.into());
        self
    }

    #[must_use]
    pub fn private_key(mut self, key: PrivateKey) -> Self {
        self.method = AuthMethod::PublicKey(Arc::new(key));
        self
    }

    /// Authenticate with a private key loaded from file
    ///
    /// # Errors
    ///
    /// Returns `Err` if the key file cannot be loaded
    pub fn private_key_file(self, path: impl AsRef<Path>) -> crate::Result<Self> {
        let key = russh::keys::load_secret_key(path, None)?;

        Ok(self.private_key(key))
    }

    #[must_use]
    pub fn host_keys(mut self, policy: HostKeyPolicy) -> Self {
        self.host_keys = policy;
        self
    }

    #[must_use]
    pub const fn inactivity_timeout(mut self, duration: Duration) -> Self {
        self.inactivity_timeout = Some(duration);
        self
    }

    #[must_use]
    pub const fn keepalive_interval(mut self, duration: Duration) -> Self {
        self.keepalive_interval = Some(duration);
        self
    }

    #[must_use]
    pub const fn keepalive_max(mut self, retries: usize) -> Self {
        self.keepalive_max = Some(retries);
        self
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub const fn method(&self) -> &AuthMethod {
        &self.method
    }

    #[must_use]
    pub const fn host_key_policy(&self) -> &HostKeyPolicy {
        &self.host_keys
    }

    #[must_use]
    pub fn client_config(&self) -> Arc<Config> {
        let mut config = Config::default();

        if let Some(timeout) = self.inactivity_timeout {
            config.inactivity_timeout = Some(timeout);
        }

        config.keepalive_interval = self.keepalive_interval;

        if let Some(max) = self.keepalive_max {
            config.keepalive_max = max;
        }

        Arc::new(config)
    }
}
