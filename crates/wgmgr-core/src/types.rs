//! Interface and peer descriptions.
//!
//! Both are plain values built by the caller for a single operation. The
//! durable state they produce (key files, config documents, kernel interface
//! state) is not tracked here.

use std::fmt;

use ipnet::IpNet;

use crate::settings::{Settings, DEFAULT_ETH, DEFAULT_UDP_PORT};

/// A tunnel endpoint description.
#[derive(Clone, PartialEq, Eq)]
pub struct Interface {
    /// Interface name; also the config document's base file name.
    pub name: String,
    /// Address and subnet of the local tunnel endpoint.
    pub address: IpNet,
    /// UDP listen port.
    pub listen_port: u16,
    /// Whether `wg-quick` saves runtime peer changes back to the document.
    pub save_config: bool,
    /// Opaque private key text.
    pub private_key: String,
    /// Egress interface used in the NAT rules.
    pub eth: String,
}

impl Interface {
    /// Creates an interface using the built-in port and egress defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, address: IpNet, private_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address,
            listen_port: DEFAULT_UDP_PORT,
            save_config: false,
            private_key: private_key.into(),
            eth: DEFAULT_ETH.to_string(),
        }
    }

    /// Creates an interface taking port and egress defaults from `settings`.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        name: impl Into<String>,
        address: IpNet,
        private_key: impl Into<String>,
    ) -> Self {
        Self::new(name, address, private_key)
            .with_listen_port(settings.udp_port)
            .with_eth(settings.eth.clone())
    }

    /// Sets the listen port.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    /// Sets `SaveConfig`.
    #[must_use]
    pub fn with_save_config(mut self, save: bool) -> Self {
        self.save_config = save;
        self
    }

    /// Sets the egress interface.
    #[must_use]
    pub fn with_eth(mut self, eth: impl Into<String>) -> Self {
        self.eth = eth.into();
        self
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("listen_port", &self.listen_port)
            .field("save_config", &self.save_config)
            .field("private_key", &"[REDACTED]")
            .field("eth", &self.eth)
            .finish()
    }
}

/// An authorized remote endpoint, identified by its public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    /// Opaque public key text.
    pub public_key: String,
    /// Networks this peer may send from and be routed to.
    pub allowed_ips: Vec<IpNet>,
    /// Where the peer can be reached (`host:port`).
    pub endpoint: Option<String>,
}

impl Peer {
    /// Creates a peer with no allowed IPs and no endpoint.
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            allowed_ips: Vec::new(),
            endpoint: None,
        }
    }

    /// Adds an allowed network.
    #[must_use]
    pub fn with_allowed_ip(mut self, net: IpNet) -> Self {
        self.allowed_ips.push(net);
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Allowed IPs in the comma-separated form `wg` expects.
    #[must_use]
    pub fn allowed_ips_arg(&self) -> String {
        self.allowed_ips
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        s.parse().expect("valid cidr")
    }

    #[test]
    fn interface_defaults() {
        let iface = Interface::new("wg0", net("10.0.0.1/24"), "PRIVKEY");
        assert_eq!(iface.listen_port, 51820);
        assert_eq!(iface.eth, "eth0");
        assert!(!iface.save_config);
        assert_eq!(iface.address.to_string(), "10.0.0.1/24");
    }

    #[test]
    fn interface_from_settings() {
        let settings = Settings::default().with_udp_port(41000).with_eth("ens5");
        let iface = Interface::from_settings(&settings, "wg1", net("10.9.0.1/16"), "K")
            .with_save_config(true);
        assert_eq!(iface.listen_port, 41000);
        assert_eq!(iface.eth, "ens5");
        assert!(iface.save_config);
    }

    #[test]
    fn interface_debug_redacts_private_key() {
        let iface = Interface::new("wg0", net("10.0.0.1/24"), "TOPSECRET");
        let debug = format!("{iface:?}");
        assert!(!debug.contains("TOPSECRET"));
        assert!(debug.contains("wg0"));
    }

    #[test]
    fn peer_allowed_ips_arg() {
        let peer = Peer::new("PUB")
            .with_allowed_ip(net("192.168.0.2/32"))
            .with_allowed_ip(net("fd00::2/128"))
            .with_endpoint("203.0.113.7:51820");
        assert_eq!(peer.allowed_ips_arg(), "192.168.0.2/32,fd00::2/128");
        assert_eq!(peer.endpoint.as_deref(), Some("203.0.113.7:51820"));
        assert_eq!(Peer::new("PUB").allowed_ips_arg(), "");
    }
}
