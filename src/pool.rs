use std::{
    collections::{BTreeMap, VecDeque, btree_map::Entry},
    sync::Arc,
};

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::{Connector, Credentials, Result, SessionPair};

/// Per-host cell, filled once the pair is established
type Slot<C> = Arc<OnceCell<Arc<SessionPair<C>>>>;

/// Registry of [`SessionPair`]s keyed by `"address:port"`.
///
/// Hosts are dialed lazily on first use with the default credentials, or
/// up front with [`SessionPool::dial`]. The map lock is only held to look
/// up or swap a host's slot. Dialing happens inside the slot, so concurrent
/// resolves of one host dial once while other hosts stay reachable.
pub struct SessionPool<C: Connector> {
    connector: C,
    credentials: Credentials,
    sessions: Mutex<BTreeMap<String, Slot<C>>>,
}

impl<C: Connector> SessionPool<C> {
    pub fn new(connector: C, credentials: Credentials) -> Self {
        Self {
            connector,
            credentials,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Dial `host`, replacing any existing entry for it
    ///
    /// Uses `credentials` when given, the pool defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) or
    /// [`Error::Subsession`](crate::Error::Subsession) if the pair cannot be
    /// established
    pub async fn dial(&self, host: &str, credentials: Option<&Credentials>) -> Result<()> {
        let credentials = credentials.unwrap_or(&self.credentials);
        let pair = Arc::new(SessionPair::establish(&self.connector, host, credentials).await?);

        let replaced = self
            .sessions
            .lock()
            .await
            .insert(host.to_string(), Arc::new(OnceCell::new_with(Some(pair))));

        if replaced.is_some_and(|slot| slot.initialized()) {
            warn!(host = %host, "replaced existing session without closing it");
        }

        Ok(())
    }

    /// Return the pooled pair for `host`, dialing it with the default
    /// credentials if absent
    ///
    /// # Errors
    ///
    /// Returns `Err` if a new pair has to be dialed and that fails
    pub async fn resolve(&self, host: &str) -> Result<Arc<SessionPair<C>>> {
        let slot = Arc::clone(
            self.sessions
                .lock()
                .await
                .entry(host.to_string())
                .or_default(),
        );

        let pair = slot
            .get_or_try_init(|| async {
                debug!(host = %host, "no pooled session, dialing with default credentials");

                SessionPair::establish(&self.connector, host, &self.credentials)
                    .await
                    .map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(pair))
    }

    /// Return the pooled pair for `host` without dialing
    pub async fn get(&self, host: &str) -> Option<Arc<SessionPair<C>>> {
        self.sessions
            .lock()
            .await
            .get(host)
            .and_then(|slot| slot.get().cloned())
    }

    pub async fn contains(&self, host: &str) -> bool {
        self.get(host).await.is_some()
    }

    /// Number of established pairs; dials still in flight are not counted
    pub async fn len(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Close every pooled pair in host order, sub-session first
    ///
    /// The pairs are taken out of the pool before closing, so requests to
    /// other hosts are not held up meanwhile. On the first failure the
    /// failing pair and every pair not yet visited go back into the pool.
    ///
    /// # Errors
    ///
    /// Returns the first close error encountered
    pub async fn close_all(&self) -> Result<()> {
        let mut pending: VecDeque<(String, Arc<SessionPair<C>>)> = {
            let mut sessions = self.sessions.lock().await;
            let hosts: Vec<String> = sessions.keys().cloned().collect();

            hosts
                .into_iter()
                .filter_map(|host| {
                    let pair = Arc::clone(sessions.get(&host)?.get()?);
                    sessions.remove(&host);

                    Some((host, pair))
                })
                .collect()
        };

        while let Some((host, pair)) = pending.pop_front() {
            if let Err(e) = close_pair(&pair).await {
                warn!(host = %host, error = %e, "closing session failed");

                pending.push_front((host, pair));
                self.restore(pending).await;

                return Err(e);
            }

            info!(host = %host, "session closed");
        }

        Ok(())
    }

    async fn restore(&self, pairs: VecDeque<(String, Arc<SessionPair<C>>)>) {
        let mut sessions = self.sessions.lock().await;

        for (host, pair) in pairs {
            match sessions.entry(host) {
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(OnceCell::new_with(Some(pair))));
                }
                Entry::Occupied(entry) => {
                    warn!(host = %entry.key(), "host redialed while closing, dropping unclosed session");
                }
            }
        }
    }
}

async fn close_pair<C: Connector>(pair: &SessionPair<C>) -> Result<()> {
    pair.close_session().await?;
    pair.close_transport().await
}
