//! Peer authorization on a live interface.
//!
//! Requests are forwarded to `wg` one by one. There is no deduplication and
//! no locking: concurrent changes to the same interface are ordered only by
//! `wg` itself.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation};
use crate::settings::Settings;
use crate::types::Peer;

/// Adds, removes and inspects peers through `wg`.
#[derive(Clone, Debug)]
pub struct PeerManager<E: CommandExecutor> {
    executor: E,
    settings: Arc<Settings>,
}

impl<E: CommandExecutor> PeerManager<E> {
    /// Creates a peer manager.
    #[must_use]
    pub fn new(executor: E, settings: Arc<Settings>) -> Self {
        Self { executor, settings }
    }

    fn wg(&self) -> Invocation {
        Invocation::new(&self.settings.wg_bin)
    }

    /// Authorizes `public_key` on `nic` for `allowed_ips`.
    ///
    /// Issues `wg set <nic> <public_key> allowed-ips <allowed_ips>`.
    /// Re-issuing for the same key replaces its allowed IPs.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn add_peer(
        &self,
        cancel: &CancellationToken,
        nic: &str,
        public_key: &str,
        allowed_ips: &str,
    ) -> Result<String> {
        let invocation = self
            .wg()
            .args(["set", nic, public_key, "allowed-ips", allowed_ips]);
        self.executor.execute(cancel, &invocation).await?;
        info!(interface = %nic, peer = %public_key, allowed_ips = %allowed_ips, "peer added");
        Ok(format!("Peer {public_key} successfully added"))
    }

    /// Authorizes `peer` on `nic`, including its endpoint when set.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn authorize(&self, cancel: &CancellationToken, nic: &str, peer: &Peer) -> Result<String> {
        let allowed_ips = peer.allowed_ips_arg();
        let mut invocation = self
            .wg()
            .args(["set", nic, peer.public_key.as_str(), "allowed-ips", allowed_ips.as_str()]);
        if let Some(endpoint) = &peer.endpoint {
            invocation = invocation.arg("endpoint").arg(endpoint);
        }

        self.executor.execute(cancel, &invocation).await?;
        info!(
            interface = %nic,
            peer = %peer.public_key,
            allowed_ips = %allowed_ips,
            endpoint = ?peer.endpoint,
            "peer authorized"
        );
        Ok(format!("Peer {} successfully added", peer.public_key))
    }

    /// Revokes a peer with `wg rm <public_key> allowed-ips <ip_address>`.
    ///
    /// Use [`PeerManager::revoke_peer`] for `wg`'s own
    /// `set <nic> peer <key> remove` form.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn remove_peer(
        &self,
        cancel: &CancellationToken,
        public_key: &str,
        ip_address: &str,
    ) -> Result<String> {
        let invocation = self.wg().args(["rm", public_key, "allowed-ips", ip_address]);
        self.executor.execute(cancel, &invocation).await?;
        info!(peer = %public_key, allowed_ips = %ip_address, "peer removed");
        Ok(format!("Peer {public_key} deleted"))
    }

    /// Removes `public_key` from `nic` with `wg set <nic> peer <key> remove`.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn revoke_peer(&self, cancel: &CancellationToken, nic: &str, public_key: &str) -> Result<String> {
        let invocation = self.wg().args(["set", nic, "peer", public_key, "remove"]);
        self.executor.execute(cancel, &invocation).await?;
        info!(interface = %nic, peer = %public_key, "peer revoked");
        Ok(format!("Peer {public_key} deleted"))
    }

    /// Returns the raw `wg show <nic>` dump.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn nic_info(&self, cancel: &CancellationToken, nic: &str) -> Result<Vec<u8>> {
        let invocation = self.wg().args(["show", nic]);
        self.executor.execute(cancel, &invocation).await
    }
}
