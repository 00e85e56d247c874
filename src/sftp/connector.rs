use std::sync::Arc;

use russh::{
    Disconnect,
    client::{self, Handle},
    keys::{PrivateKeyWithHashAlg, PublicKey},
};
use russh_sftp::client::SftpSession;
use tracing::debug;

use crate::{
    AuthMethod, Connector, Credentials, Error, HostKeyPolicy, Result, Transport,
    address::split_host, sftp::SftpFiles,
};

/// Connects to real hosts over SSH and starts the `sftp` subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpConnector;

impl Connector for SftpConnector {
    type Transport = SshTransport;
    type Session = SftpFiles;

    async fn dial(&self, host: &str, credentials: &Credentials) -> Result<SshTransport> {
        let (addr, port) = split_host(host);

        let handler = ClientHandler {
            host: addr.to_string(),
            port,
            policy: credentials.host_key_policy().clone(),
        };

        let mut handle = client::connect(credentials.client_config(), (addr, port), handler).await?;

        authenticate(&mut handle, host, credentials).await?;

        debug!(host = %host, user = %credentials.user(), "authenticated");

        Ok(SshTransport { handle })
    }

    async fn start_session(&self, transport: &SshTransport) -> Result<SftpFiles> {
        let channel = transport.handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(Error::Sftp)?;

        Ok(SftpFiles::new(sftp))
    }
}

async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    host: &str,
    credentials: &Credentials,
) -> Result<()> {
    let user = credentials.user();

    let result = match credentials.method() {
        AuthMethod::None => handle.authenticate_none(user).await?,
        AuthMethod::Password(password) => handle.authenticate_password(user, password).await?,
        AuthMethod::PublicKey(key) => {
            let hash_alg = handle.best_supported_rsa_hash().await?.flatten();

            handle
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg))
                .await?
        }
    };

    if !result.success() {
        return Err(Error::Authentication {
            user: user.to_string(),
            host: host.to_string(),
        });
    }

    Ok(())
}

/// An authenticated SSH connection.
pub struct SshTransport {
    handle: Handle<ClientHandler>,
}

impl Transport for SshTransport {
    async fn close(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Ssh)
    }
}

/// Client-side handler that enforces the configured host key policy
pub struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        self.policy.verify(&self.host, self.port, server_public_key)
    }
}
