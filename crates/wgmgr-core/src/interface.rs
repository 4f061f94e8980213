//! Interface lifecycle: config documents and `wg-quick` up/down.
//!
//! Lifecycle states live in the system, not in memory:
//! `Unconfigured -> Configured` by writing the document,
//! `Configured -> Up` by `wg-quick up`, and back by `wg-quick down`.
//! No state is pre-checked; whatever `wg-quick` reports is surfaced.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::render_interface_config;
use crate::error::{Result, WgError};
use crate::executor::{CommandExecutor, Invocation};
use crate::settings::Settings;
use crate::store;
use crate::types::Interface;

/// The two `wg-quick` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkAction {
    /// `wg-quick up`.
    Up,
    /// `wg-quick down`.
    Down,
}

impl LinkAction {
    /// The `wg-quick` subcommand.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkAction {
    type Err = WgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(WgError::Config(format!("unknown link action '{other}'"))),
        }
    }
}

/// Writes interface config documents and drives `wg-quick`.
#[derive(Clone, Debug)]
pub struct InterfaceManager<E: CommandExecutor> {
    executor: E,
    settings: Arc<Settings>,
}

impl<E: CommandExecutor> InterfaceManager<E> {
    /// Creates an interface manager.
    #[must_use]
    pub fn new(executor: E, settings: Arc<Settings>) -> Self {
        Self { executor, settings }
    }

    /// Renders `iface` and writes it to `<keystore>/<name>.conf`, replacing
    /// any previous document for that name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for a bad interface name or `FileIo` if the
    /// document cannot be written.
    pub async fn gen_interface_conf(&self, iface: &Interface) -> Result<String> {
        let path = self.settings.config_path(&iface.name)?;
        let document = render_interface_config(iface);

        store::write_secret_file(&path, document.as_bytes()).await?;
        info!(interface = %iface.name, path = %path.display(), "interface config written");

        Ok(format!(
            "{} configuration saved to {}",
            iface.name,
            self.settings.keystore_dir.display()
        ))
    }

    /// Runs `wg-quick <cmd> <nic>`.
    ///
    /// `cmd` is normally `up` or `down`; any other value is passed to
    /// `wg-quick` unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if `wg-quick` fails, or `Cancelled`.
    pub async fn up_down(&self, cancel: &CancellationToken, nic: &str, cmd: &str) -> Result<String> {
        let invocation = Invocation::new(&self.settings.wg_quick_bin).arg(cmd).arg(nic);
        self.executor.execute(cancel, &invocation).await?;
        info!(interface = %nic, action = %cmd, "interface state changed");
        Ok(format!("Interface {nic} is {cmd}"))
    }

    /// Runs `wg-quick` with a typed action.
    ///
    /// # Errors
    ///
    /// See [`InterfaceManager::up_down`].
    pub async fn set_link(&self, cancel: &CancellationToken, nic: &str, action: LinkAction) -> Result<String> {
        self.up_down(cancel, nic, action.as_str()).await
    }

    /// Brings `nic` up from its config document.
    ///
    /// # Errors
    ///
    /// See [`InterfaceManager::up_down`].
    pub async fn up(&self, cancel: &CancellationToken, nic: &str) -> Result<String> {
        self.set_link(cancel, nic, LinkAction::Up).await
    }

    /// Brings `nic` down.
    ///
    /// # Errors
    ///
    /// See [`InterfaceManager::up_down`].
    pub async fn down(&self, cancel: &CancellationToken, nic: &str) -> Result<String> {
        self.set_link(cancel, nic, LinkAction::Down).await
    }
}
