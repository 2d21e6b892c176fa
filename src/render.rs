//! Rendering of the generated system config files.
//!
//! Everything here is a pure function from (mode, credentials) to the full
//! text of a config file; no I/O. The texts are fixed assets carried over
//! from the device image, with only the interface name and credentials
//! interpolated. Each file is overwritten wholesale, never merged.

use crate::store::Security;

/// dhcpcd.conf body shared by both modes. The access-point variant appends a
/// deny line so dhcpcd leaves the wireless interface alone.
const DHCPCD_BASE: &str = r#"# A sample configuration for dhcpcd.
# See dhcpcd.conf(5) for details.

# Allow users of this group to interact with dhcpcd via the control socket.
#controlgroup wheel

# Inform the DHCP server of our hostname for DDNS.
hostname

# Use the hardware address of the interface for the Client ID.
clientid
# or
# Use the same DUID + IAID as set in DHCPv6 for DHCPv4 ClientID as per RFC4361.
#duid

# Persist interface configuration when dhcpcd exits.
persistent

# Rapid commit support.
# Safe to enable by default because it requires the equivalent option set
# on the server to actually work.
option rapid_commit

# A list of options to request from the DHCP server.
option domain_name_servers, domain_name, domain_search, host_name
option classless_static_routes
# Most distributions have NTP support.
option ntp_servers
# Respect the network MTU.
# Some interface drivers reset when changing the MTU so disabled by default.
#option interface_mtu

# A ServerID is required by RFC2131.
require dhcp_server_identifier

# Generate Stable Private IPv6 Addresses instead of hardware based ones
slaac private

# A hook script is provided to lookup the hostname if not set by the DHCP
# server, but it should not be run by default.
nohook lookup-hostname"#;

/// dhcpcd.conf for client mode: plain DHCP client, no deny list.
pub fn dhcpcd_client() -> String {
    DHCPCD_BASE.to_string()
}

/// dhcpcd.conf for access-point mode: the wireless interface is denied to
/// the DHCP client so its static address survives.
pub fn dhcpcd_access_point(interface: &str) -> String {
    format!("{DHCPCD_BASE}\n\ndenyinterfaces {interface}")
}

/// interfaces(5) file for access-point mode: static 10.0.0.1/24 on the
/// wireless interface.
pub fn interfaces_access_point(interface: &str) -> String {
    format!(
        r#"# interfaces(5) file used by ifup(8) and ifdown(8)

# Please note that this file is written to be used with dhcpcd
# For static IP, consult /etc/dhcpcd.conf and 'man dhcpcd.conf'

# Include files from /etc/network/interfaces.d:
source-directory /etc/network/interfaces.d

auto lo

iface lo inet loopback
iface eth0 inet dhcp

allow-hotplug {interface}
iface {interface} inet static
        address 10.0.0.1
        netmask 255.255.255.0
        network 10.0.0.0
"#
    )
}

/// interfaces(5) file for client mode.
///
/// Picks one of three fixed stanzas:
/// - empty password: open network, managed mode, no key material
/// - WEP: legacy wireless-key stanza with ssid and key in the clear
/// - WPA (the default): wpa-ssid/wpa-psk stanza referencing the external
///   supplicant config
pub fn interfaces_client(interface: &str, ssid: &str, password: &str, security: Security) -> String {
    if password.is_empty() {
        interfaces_client_open(interface, ssid)
    } else {
        match security {
            Security::Wep => interfaces_client_wep(interface, ssid, password),
            Security::Wpa => interfaces_client_wpa(interface, ssid, password),
        }
    }
}

fn interfaces_client_wep(interface: &str, ssid: &str, key: &str) -> String {
    format!(
        r#"# interfaces(5) file used by ifup(8) and ifdown(8)

# Please note that this file is written to be used with dhcpcd
# For static IP, consult /etc/dhcpcd.conf and 'man dhcpcd.conf'

# Include files from /etc/network/interfaces.d:
source-directory /etc/network/interfaces.d
auto lo

iface lo inet loopback
iface eth0 inet dhcp

auto {interface}
allow-hotplug {interface}
iface {interface} inet dhcp
      wireless-essid {ssid}
      wireless-key {key}
"#
    )
}

fn interfaces_client_wpa(interface: &str, ssid: &str, psk: &str) -> String {
    format!(
        r#"# interfaces(5) file used by ifup(8) and ifdown(8)

# Please note that this file is written to be used with dhcpcd
# For static IP, consult /etc/dhcpcd.conf and 'man dhcpcd.conf'

# Include files from /etc/network/interfaces.d:
source-directory /etc/network/interfaces.d
auto lo

iface lo inet loopback
iface eth0 inet dhcp

auto {interface}
allow-hotplug {interface}
iface {interface} inet dhcp
      wpa-ssid "{ssid}"
      wpa-psk "{psk}"
      wpa-conf /etc/wpa_supplicant/wpa_supplicant.conf
"#
    )
}

fn interfaces_client_open(interface: &str, ssid: &str) -> String {
    format!(
        r#"# interfaces(5) file used by ifup(8) and ifdown(8)

# Please note that this file is written to be used with dhcpcd
# For static IP, consult /etc/dhcpcd.conf and 'man dhcpcd.conf'

# Include files from /etc/network/interfaces.d:
source-directory /etc/network/interfaces.d
auto lo

iface lo inet loopback
iface eth0 inet dhcp

auto {interface}
allow-hotplug {interface}
iface {interface} inet dhcp
    wireless-essid {ssid}
    wireless-mode managed
"#
    )
}
