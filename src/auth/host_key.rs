use std::path::PathBuf;

use russh::keys::{PublicKey, known_hosts::known_host_keys_path};
use tracing::warn;

/// How server host keys are verified during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any host key. Only suitable for tests and trusted networks.
    AcceptAny,
    /// Require the key to be listed for the host in an OpenSSH
    /// `known_hosts` file.
    KnownHosts(PathBuf),
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();

        Self::KnownHosts(home.join(".ssh").join("known_hosts"))
    }
}

impl HostKeyPolicy {
    /// Check a server key presented by `host:port`
    ///
    /// # Errors
    ///
    /// Returns `Err` if the `known_hosts` file cannot be read, or if it
    /// lists a different key for the host
    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<bool, russh::Error> {
        let Self::KnownHosts(path) = self else {
            return Ok(true);
        };

        let known = known_host_keys_path(host, port, path)?;

        if known.iter().any(|(_, existing)| existing == key) {
            return Ok(true);
        }

        if let Some((line, _)) = known.first() {
            warn!(host = %host, port, known_hosts = %path.display(), "host key changed");

            return Err(russh::Error::KeyChanged { line: *line });
        }

        warn!(host = %host, port, known_hosts = %path.display(), "unknown host key");

        Ok(false)
    }
}
