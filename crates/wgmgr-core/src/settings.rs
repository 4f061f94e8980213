//! Startup settings.
//!
//! Settings are loaded once (usually from a TOML file) and shared immutably,
//! as `Arc<Settings>`, with every manager. Only the `[wg]` table is read;
//! other tables in the same file are ignored.
//!
//! ```toml
//! [wg]
//! dir = "/etc/wireguard"
//! udp-port = 51820
//! eth = "eth0"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WgError};
use crate::validate::validate_name;

/// Default keystore directory.
pub const DEFAULT_KEYSTORE_DIR: &str = "/etc/wireguard";

/// Default UDP listen port.
pub const DEFAULT_UDP_PORT: u16 = 51820;

/// Default egress interface.
pub const DEFAULT_ETH: &str = "eth0";

/// Process-wide settings for the managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Directory holding key files and interface config documents.
    #[serde(rename = "dir")]
    pub keystore_dir: PathBuf,
    /// Default listen port for new interfaces.
    pub udp_port: u16,
    /// Default egress interface for NAT rules.
    pub eth: String,
    /// Path or name of the `wg` binary.
    #[serde(rename = "bin")]
    pub wg_bin: String,
    /// Path or name of the `wg-quick` binary.
    #[serde(rename = "quick-bin")]
    pub wg_quick_bin: String,
    /// Command used to read key content back.
    pub cat_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keystore_dir: PathBuf::from(DEFAULT_KEYSTORE_DIR),
            udp_port: DEFAULT_UDP_PORT,
            eth: DEFAULT_ETH.to_string(),
            wg_bin: "wg".to_string(),
            wg_quick_bin: "wg-quick".to_string(),
            cat_bin: "cat".to_string(),
        }
    }
}

/// On-disk layout: settings live under `[wg]`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    wg: Settings,
}

impl Settings {
    /// Creates default settings rooted at `keystore_dir`.
    #[must_use]
    pub fn new(keystore_dir: impl Into<PathBuf>) -> Self {
        Self {
            keystore_dir: keystore_dir.into(),
            ..Self::default()
        }
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WgError::Config(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: SettingsFile =
            toml::from_str(content).map_err(|e| WgError::Config(format!("invalid TOML: {e}")))?;
        file.wg.validate()?;
        Ok(file.wg)
    }

    /// Render these settings as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(&SettingsFile { wg: self.clone() })
            .map_err(|e| WgError::Config(format!("failed to serialize settings: {e}")))
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is empty or the port is zero.
    pub fn validate(&self) -> Result<()> {
        if self.keystore_dir.as_os_str().is_empty() {
            return Err(WgError::Config("keystore dir cannot be empty".to_string()));
        }
        if self.udp_port == 0 {
            return Err(WgError::Config("udp-port must be between 1 and 65535".to_string()));
        }
        if self.eth.is_empty() {
            return Err(WgError::Config("eth cannot be empty".to_string()));
        }
        for (key, value) in [
            ("bin", &self.wg_bin),
            ("quick-bin", &self.wg_quick_bin),
            ("cat-bin", &self.cat_bin),
        ] {
            if value.is_empty() {
                return Err(WgError::Config(format!("{key} cannot be empty")));
            }
        }
        Ok(())
    }

    /// Sets the keystore directory.
    #[must_use]
    pub fn with_keystore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.keystore_dir = dir.into();
        self
    }

    /// Sets the default listen port.
    #[must_use]
    pub fn with_udp_port(mut self, port: u16) -> Self {
        self.udp_port = port;
        self
    }

    /// Sets the default egress interface.
    #[must_use]
    pub fn with_eth(mut self, eth: impl Into<String>) -> Self {
        self.eth = eth.into();
        self
    }

    /// Sets the `wg` binary.
    #[must_use]
    pub fn with_wg_bin(mut self, bin: impl Into<String>) -> Self {
        self.wg_bin = bin.into();
        self
    }

    /// Sets the `wg-quick` binary.
    #[must_use]
    pub fn with_wg_quick_bin(mut self, bin: impl Into<String>) -> Self {
        self.wg_quick_bin = bin.into();
        self
    }

    /// Sets the content-read command.
    #[must_use]
    pub fn with_cat_bin(mut self, bin: impl Into<String>) -> Self {
        self.cat_bin = bin.into();
        self
    }

    /// Path of the key file `name` inside the keystore.
    ///
    /// # Errors
    ///
    /// Returns [`WgError::InvalidName`] if `name` is not a flat file name.
    pub fn key_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.keystore_dir.join(name))
    }

    /// Path of the config document for interface `iface`.
    ///
    /// # Errors
    ///
    /// Returns [`WgError::InvalidName`] if `iface` is not a flat file name.
    pub fn config_path(&self, iface: &str) -> Result<PathBuf> {
        validate_name(iface)?;
        Ok(self.keystore_dir.join(format!("{iface}.conf")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.keystore_dir, PathBuf::from("/etc/wireguard"));
        assert_eq!(settings.udp_port, 51820);
        assert_eq!(settings.eth, "eth0");
        assert_eq!(settings.wg_bin, "wg");
        assert_eq!(settings.wg_quick_bin, "wg-quick");
        assert_eq!(settings.cat_bin, "cat");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn from_toml_full() {
        let settings = Settings::from_toml(
            r#"
            [wg]
            dir = "/var/lib/wgmgr"
            udp-port = 51821
            eth = "ens3"
            bin = "/usr/bin/wg"
            quick-bin = "/usr/bin/wg-quick"
            cat-bin = "/bin/cat"
            "#,
        )
        .expect("valid settings");

        assert_eq!(settings.keystore_dir, PathBuf::from("/var/lib/wgmgr"));
        assert_eq!(settings.udp_port, 51821);
        assert_eq!(settings.eth, "ens3");
        assert_eq!(settings.wg_bin, "/usr/bin/wg");
        assert_eq!(settings.wg_quick_bin, "/usr/bin/wg-quick");
        assert_eq!(settings.cat_bin, "/bin/cat");
    }

    #[test]
    fn from_toml_partial_uses_defaults_and_ignores_other_tables() {
        let settings = Settings::from_toml(
            r#"
            [wg]
            eth = "wlan0"

            [grpc.domain]
            endpoint = "vpn.example.com"
            port = 5001

            [tls]
            enabled = true
            "#,
        )
        .expect("valid settings");

        assert_eq!(settings.eth, "wlan0");
        assert_eq!(settings.udp_port, DEFAULT_UDP_PORT);
    }

    #[test]
    fn from_toml_empty_document() {
        assert_eq!(Settings::from_toml("").expect("defaults"), Settings::default());
    }

    #[test]
    fn from_toml_rejects_out_of_range_port() {
        let err = Settings::from_toml("[wg]\nudp-port = 70000\n").expect_err("port too large");
        assert!(matches!(err, WgError::Config(_)));
    }

    #[test]
    fn validate_rejects_zero_port_and_empty_values() {
        assert!(Settings::default().with_udp_port(0).validate().is_err());
        assert!(Settings::default().with_eth("").validate().is_err());
        assert!(Settings::default().with_keystore_dir("").validate().is_err());
        assert!(Settings::default().with_wg_bin("").validate().is_err());
    }

    #[test]
    fn toml_roundtrip_keeps_kebab_keys() {
        let settings = Settings::new("/tmp/keys").with_udp_port(40000);
        let rendered = settings.to_toml().expect("serializes");
        assert!(rendered.contains("[wg]"));
        assert!(rendered.contains("udp-port = 40000"));
        assert!(rendered.contains("quick-bin = \"wg-quick\""));
        assert_eq!(Settings::from_toml(&rendered).expect("parses"), settings);
    }

    #[test]
    fn from_file_missing() {
        let err = Settings::from_file("/nonexistent/wgmgr.toml").expect_err("missing file");
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn paths_inside_keystore() {
        let settings = Settings::new("/etc/wireguard");
        assert_eq!(
            settings.key_path("privatekey").expect("valid"),
            PathBuf::from("/etc/wireguard/privatekey")
        );
        assert_eq!(
            settings.config_path("wg0").expect("valid"),
            PathBuf::from("/etc/wireguard/wg0.conf")
        );
        assert!(settings.key_path("../shadow").is_err());
        assert!(settings.config_path("").is_err());
    }
}
