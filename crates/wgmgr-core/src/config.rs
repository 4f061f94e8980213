//! `wg-quick` configuration document rendering.
//!
//! The document carries a single `[Interface]` section. `PostUp`/`PostDown`
//! install and remove a FORWARD accept rule for the tunnel interface and a
//! NAT masquerade rule on the egress interface.

use std::fmt::Write as FmtWrite;

use crate::types::Interface;

/// Renders the config document for `iface`.
///
/// Values are written verbatim; the private key is not checked.
#[must_use]
pub fn render_interface_config(iface: &Interface) -> String {
    let mut output = String::new();
    let name = &iface.name;
    let eth = &iface.eth;

    output.push_str("[Interface]\n");
    let _ = writeln!(output, "Address = {}", iface.address);
    let _ = writeln!(output, "ListenPort = {}", iface.listen_port);
    let _ = writeln!(output, "SaveConfig = {}", iface.save_config);
    let _ = writeln!(output, "PrivateKey = {}", iface.private_key);
    let _ = writeln!(
        output,
        "PostUp = iptables -A FORWARD -i {name} -j ACCEPT; iptables -t nat -A POSTROUTING -o {eth} -j MASQUERADE"
    );
    let _ = writeln!(
        output,
        "PostDown = iptables -D FORWARD -i {name} -j ACCEPT; iptables -t nat -D POSTROUTING -o {eth} -j MASQUERADE"
    );

    output
}
