//! Command execution.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ipnet::IpNet;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wgmgr_core::{CommandExecutor, Interface, InterfaceManager, KeyManager, Peer, PeerManager, Settings};

use crate::cli::{Cli, Commands, ConfArgs, PeerCommands, DEFAULT_CONFIG_PATH};

/// Resolves settings: explicit `--config`, else the default file if it
/// exists, else built-in defaults; then applies flag overrides.
///
/// `init-config` never reads the default file, since that is the file it
/// writes.
///
/// # Errors
///
/// Returns an error if a settings file cannot be loaded or the result is invalid.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let reads_default = !matches!(cli.command, Commands::InitConfig { .. });
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None if reads_default && Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Settings::from_file(DEFAULT_CONFIG_PATH)?
        }
        None => Settings::default(),
    };

    if let Some(dir) = &cli.keystore_dir {
        settings = settings.with_keystore_dir(dir.clone());
    }
    settings.validate()?;

    debug!(keystore = %settings.keystore_dir.display(), "settings loaded");
    Ok(settings)
}

/// Runs one command, writing its result to `out`.
///
/// # Errors
///
/// Returns the first error from the underlying operation.
pub async fn execute<E, W>(
    command: Commands,
    settings: Arc<Settings>,
    executor: E,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<()>
where
    E: CommandExecutor + Clone,
    W: Write,
{
    let keys = KeyManager::new(executor.clone(), Arc::clone(&settings));
    let interfaces = InterfaceManager::new(executor.clone(), Arc::clone(&settings));
    let peers = PeerManager::new(executor, Arc::clone(&settings));

    match command {
        Commands::Genkey { name } => {
            let key = keys.generate_private_key(cancel, &name).await?;
            write!(out, "{key}")?;
        }
        Commands::Pubkey {
            private_name,
            public_name,
        } => {
            let key = keys
                .generate_public_key(cancel, &private_name, &public_name)
                .await?;
            write!(out, "{key}")?;
        }
        Commands::Keypair {
            private_name,
            public_name,
        } => {
            let generated = keys
                .generate_keypair(cancel, &private_name, &public_name)
                .await?;
            write!(out, "{}", generated.public_key)?;
        }
        Commands::ShowKey { name } => {
            let content = keys.get_content(cancel, &name).await?;
            write!(out, "{content}")?;
        }
        Commands::Conf(args) => {
            let message = write_conf(&keys, &interfaces, &settings, cancel, args).await?;
            writeln!(out, "{message}")?;
        }
        Commands::Up { nic } => {
            writeln!(out, "{}", interfaces.up(cancel, &nic).await?)?;
        }
        Commands::Down { nic } => {
            writeln!(out, "{}", interfaces.down(cancel, &nic).await?)?;
        }
        Commands::Peer { command } => {
            let message = run_peer(&peers, cancel, command).await?;
            writeln!(out, "{message}")?;
        }
        Commands::Show { nic } => {
            out.write_all(&peers.nic_info(cancel, &nic).await?)?;
        }
        Commands::InitConfig { output } => {
            std::fs::write(&output, settings.to_toml()?)
                .with_context(|| format!("failed to write '{}'", output.display()))?;
            writeln!(out, "settings written to {}", output.display())?;
        }
    }

    Ok(())
}

async fn write_conf<E: CommandExecutor>(
    keys: &KeyManager<E>,
    interfaces: &InterfaceManager<E>,
    settings: &Settings,
    cancel: &CancellationToken,
    args: ConfArgs,
) -> Result<String> {
    let address: IpNet = args
        .address
        .parse()
        .with_context(|| format!("invalid interface address '{}'", args.address))?;
    let private_key = keys.get_content(cancel, &args.private_key).await?;

    let mut iface = Interface::from_settings(settings, args.name, address, private_key.trim())
        .with_save_config(args.save_config);
    if let Some(port) = args.port {
        iface = iface.with_listen_port(port);
    }
    if let Some(eth) = args.eth {
        iface = iface.with_eth(eth);
    }

    Ok(interfaces.gen_interface_conf(&iface).await?)
}

async fn run_peer<E: CommandExecutor>(
    peers: &PeerManager<E>,
    cancel: &CancellationToken,
    command: PeerCommands,
) -> Result<String> {
    let message = match command {
        PeerCommands::Add {
            nic,
            public_key,
            allowed_ips,
            endpoint: None,
        } => peers.add_peer(cancel, &nic, &public_key, &allowed_ips).await?,
        PeerCommands::Add {
            nic,
            public_key,
            allowed_ips,
            endpoint: Some(endpoint),
        } => {
            let mut peer = Peer::new(public_key).with_endpoint(endpoint);
            for cidr in allowed_ips.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                let net: IpNet = cidr
                    .parse()
                    .with_context(|| format!("invalid allowed IP '{cidr}'"))?;
                peer = peer.with_allowed_ip(net);
            }
            peers.authorize(cancel, &nic, &peer).await?
        }
        PeerCommands::Rm {
            public_key,
            allowed_ips,
        } => peers.remove_peer(cancel, &public_key, &allowed_ips).await?,
        PeerCommands::Revoke { nic, public_key } => {
            peers.revoke_peer(cancel, &nic, &public_key).await?
        }
    };
    Ok(message)
}
