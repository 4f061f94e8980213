//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Settings file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/wgmgr/config.toml";

/// wgmgr: provision WireGuard interfaces and manage their peers.
#[derive(Parser, Debug)]
#[command(name = "wgmgr")]
#[command(about = "Provision WireGuard interfaces and manage their peers")]
#[command(version)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "WGMGR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the keystore directory from the settings file.
    #[arg(long, global = true)]
    pub keystore_dir: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate a private key and store it in the keystore.
    Genkey {
        /// Key file name.
        name: String,
    },

    /// Derive a public key from a stored private key.
    Pubkey {
        /// Stored private key name.
        private_name: String,
        /// Name to store the public key under.
        public_name: String,
    },

    /// Generate a private key and its public key in one step.
    Keypair {
        /// Name to store the private key under.
        private_name: String,
        /// Name to store the public key under.
        public_name: String,
    },

    /// Print stored key material.
    ShowKey {
        /// Key file name.
        name: String,
    },

    /// Write an interface config document to the keystore.
    Conf(ConfArgs),

    /// Bring an interface up with wg-quick.
    Up {
        /// Interface name.
        nic: String,
    },

    /// Bring an interface down with wg-quick.
    Down {
        /// Interface name.
        nic: String,
    },

    /// Peer management.
    Peer {
        /// Peer subcommand.
        #[command(subcommand)]
        command: PeerCommands,
    },

    /// Print the live status of an interface.
    Show {
        /// Interface name.
        nic: String,
    },

    /// Write the effective settings to a file.
    InitConfig {
        /// Where to write the file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },
}

/// Arguments for `conf`.
#[derive(Args, Debug, Clone)]
pub struct ConfArgs {
    /// Interface name (also the document's base file name).
    pub name: String,

    /// Interface address in CIDR notation, e.g. 10.0.0.1/24.
    #[arg(long)]
    pub address: String,

    /// Stored private key to embed.
    #[arg(long)]
    pub private_key: String,

    /// Listen port (defaults to the settings' udp-port).
    #[arg(long)]
    pub port: Option<u16>,

    /// Egress interface for NAT (defaults to the settings' eth).
    #[arg(long)]
    pub eth: Option<String>,

    /// Let wg-quick save runtime peer changes back to the document.
    #[arg(long)]
    pub save_config: bool,
}

/// Peer subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PeerCommands {
    /// Authorize a peer on an interface.
    Add {
        /// Interface name.
        nic: String,
        /// Peer public key.
        public_key: String,
        /// Allowed IPs (comma-separated CIDRs).
        allowed_ips: String,
        /// Peer endpoint (host:port).
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Remove a peer with `wg rm`.
    Rm {
        /// Peer public key.
        public_key: String,
        /// Allowed IPs the peer was added with.
        allowed_ips: String,
    },

    /// Remove a peer with `wg set <nic> peer <key> remove`.
    Revoke {
        /// Interface name.
        nic: String,
        /// Peer public key.
        public_key: String,
    },
}
