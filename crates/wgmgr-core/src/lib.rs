//! `WireGuard` interface and peer lifecycle management.
//!
//! This crate drives the external `wg` and `wg-quick` tools to provision
//! tunnel endpoints: it generates and stores keys, writes `wg-quick` config
//! documents, brings interfaces up and down, and authorizes or revokes peers.
//!
//! Every effect goes through a [`CommandExecutor`]. Use [`ProcessExecutor`] in
//! production and [`RecordingExecutor`] in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use wgmgr_core::{Interface, InterfaceManager, KeyManager, PeerManager, ProcessExecutor, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Arc::new(Settings::from_file("/etc/wgmgr/config.toml")?);
//! let cancel = CancellationToken::new();
//!
//! let keys = KeyManager::new(ProcessExecutor::new(), Arc::clone(&settings));
//! let private_key = keys.generate_private_key(&cancel, "wg0.key").await?;
//!
//! let iface = Interface::from_settings(&settings, "wg0", "10.0.0.1/24".parse()?, private_key.trim());
//! let interfaces = InterfaceManager::new(ProcessExecutor::new(), Arc::clone(&settings));
//! interfaces.gen_interface_conf(&iface).await?;
//! interfaces.up(&cancel, "wg0").await?;
//!
//! let peers = PeerManager::new(ProcessExecutor::new(), settings);
//! peers.add_peer(&cancel, "wg0", "PEER_PUBLIC_KEY", "10.0.0.2/32").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod executor;
pub mod interface;
pub mod keys;
pub mod peer;
pub mod settings;
mod store;
pub mod types;
pub mod validate;

pub use config::render_interface_config;
pub use error::{Result, WgError};
pub use executor::{CannedResponse, CommandExecutor, Invocation, ProcessExecutor, RecordingExecutor};
pub use interface::{InterfaceManager, LinkAction};
pub use keys::{GeneratedKeys, KeyManager};
pub use peer::PeerManager;
pub use settings::Settings;
pub use types::{Interface, Peer};
