//! Structured connection, CA, and setup records.
//!
//! These are the read-only inputs to the stroke encoder. They mirror what a
//! config frontend would produce after parsing and validating its own format;
//! strokectl only consumes them. A [`ConnFile`] aggregates everything the CLI
//! needs from one TOML document (`[setup]`, `[[connections]]`,
//! `[[authorities]]`).

use std::path::Path;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Name sentinel that asks the encoder to derive `conn_<id>` itself.
pub const AUTO_NAME: &str = "%auto";

bitflags! {
    /// Per-connection policy bitmask.
    ///
    /// The encoder derives individual boolean header fields from these bits;
    /// the mask itself never goes on the wire.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConnPolicy: u32 {
        /// Never rekey this connection; suppresses the whole rekey group.
        const DONT_REKEY   = 1 << 0;
        /// Rekey without reauthentication.
        const DONT_REAUTH  = 1 << 1;
        /// Enable MOBIKE mobility extension.
        const MOBIKE       = 1 << 2;
        /// Force UDP encapsulation even without NAT.
        const FORCE_ENCAP  = 1 << 3;
        /// Enable IPComp compression.
        const COMPRESS     = 1 << 4;
        /// This side acts as the XAuth server.
        const XAUTH_SERVER = 1 << 5;
    }
}

/// Firewall mark value/mask pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub mask: u32,
}

/// One side (local or remote) of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndRecord {
    /// Primary authentication method (e.g. "pubkey", "psk").
    pub auth: Option<String>,
    /// Secondary authentication round (e.g. "xauth").
    pub auth2: Option<String>,
    /// Primary identity.
    pub id: Option<String>,
    /// Secondary identity.
    pub id2: Option<String>,
    /// Raw key reference.
    pub rsakey: Option<String>,
    /// Primary certificate.
    pub cert: Option<String>,
    /// Secondary certificate.
    pub cert2: Option<String>,
    /// Certificate policy OID string.
    pub cert_policy: Option<String>,
    /// Primary CA reference.
    pub ca: Option<String>,
    /// Secondary CA reference.
    pub ca2: Option<String>,
    /// Group membership requirement.
    pub groups: Option<String>,
    /// Up/down hook command.
    pub updown: Option<String>,
    /// Explicit host address; the encoder falls back to "%any" when unset.
    pub host: Option<String>,
    /// Comma-separated subnet list.
    pub subnets: Option<String>,
    /// Virtual source IP (or pool specifier).
    pub sourceip: Option<String>,
    /// Netmask length for the source IP pool.
    pub sourceip_mask: u32,
    /// UDP port for IKE traffic (0 = default).
    pub ikeport: u16,
    /// Certificate-sending policy.
    pub sendcert: u32,
    /// Allow access to the host itself via the tunnel.
    pub hostaccess: bool,
    /// Whether an explicit client subnet was configured.
    pub has_client: bool,
    /// Accept any peer identity matching the wildcard.
    pub allow_any: bool,
    /// Traffic-selector transport protocol (0 = any).
    pub protocol: u32,
    /// Traffic-selector port (0 = any).
    pub port: u16,
}

/// One IPsec connection, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnRecord {
    /// Connection name, or [`AUTO_NAME`] to derive one from `id`.
    pub name: String,
    /// Numeric id, used for auto-generated names.
    pub id: u64,
    /// IKE major version (0 = accept both).
    pub ike_version: u32,
    /// EAP identity.
    pub eap_identity: Option<String>,
    /// AAA identity for EAP server certificates.
    pub aaa_identity: Option<String>,
    /// XAuth identity.
    pub xauth_identity: Option<String>,
    /// Tunnel/transport/... mode.
    pub mode: u32,
    /// Proxy mode flag.
    pub proxy_mode: bool,
    /// Policy bitmask.
    pub policy: ConnPolicy,
    /// Legacy combined auth specifier (e.g. "rsasig", "xauthpsk").
    pub authby: Option<String>,

    /// IPsec SA lifetime in seconds.
    pub ipsec_lifetime: u64,
    /// IKE SA lifetime in seconds.
    pub ike_lifetime: u64,
    /// Rekey margin in seconds.
    pub rekey_margin: u64,
    /// IPsec SA lifetime in bytes (0 = unlimited).
    pub life_bytes: u64,
    /// Rekey margin in bytes.
    pub margin_bytes: u64,
    /// IPsec SA lifetime in packets (0 = unlimited).
    pub life_packets: u64,
    /// Rekey margin in packets.
    pub margin_packets: u64,
    /// Keying retry attempts.
    pub keying_tries: u64,
    /// Rekey fuzz percentage.
    pub rekey_fuzz: u64,

    /// Install kernel policies for this connection.
    pub install_policy: bool,
    /// Use IKEv1 aggressive mode.
    pub aggressive: bool,
    /// IKE proposal string.
    pub ike_proposal: Option<String>,
    /// ESP proposal string.
    pub esp_proposal: Option<String>,
    /// Dead-peer-detection delay in seconds.
    pub dpd_delay: u32,
    /// Dead-peer-detection timeout in seconds.
    pub dpd_timeout: u32,
    /// Action on dead peer.
    pub dpd_action: u32,
    /// Action when the peer closes the CHILD_SA.
    pub close_action: u32,
    /// Inactivity timeout in seconds.
    pub inactivity: u32,
    /// Act as an IKE mediation server connection.
    pub mediation: bool,
    /// Name of the mediation connection to mediate through.
    pub mediated_by: Option<String>,
    /// Peer identity to reach through the mediation server.
    pub me_peer_id: Option<String>,
    /// Requested security-parameter-index / reqid (0 = allocate).
    pub reqid: u32,
    /// Inbound firewall mark.
    pub mark_in: Mark,
    /// Outbound firewall mark.
    pub mark_out: Mark,
    /// Traffic-flow-confidentiality padding in bytes.
    pub tfc: u32,

    /// Local endpoint.
    pub local: EndRecord,
    /// Remote endpoint.
    pub remote: EndRecord,
}

impl Default for ConnRecord {
    fn default() -> Self {
        Self {
            name: AUTO_NAME.to_string(),
            id: 0,
            ike_version: 0,
            eap_identity: None,
            aaa_identity: None,
            xauth_identity: None,
            mode: 0,
            proxy_mode: false,
            policy: ConnPolicy::default(),
            authby: None,
            ipsec_lifetime: 3600,
            ike_lifetime: 10800,
            rekey_margin: 540,
            life_bytes: 0,
            margin_bytes: 0,
            life_packets: 0,
            margin_packets: 0,
            keying_tries: 1,
            rekey_fuzz: 100,
            install_policy: true,
            aggressive: false,
            ike_proposal: None,
            esp_proposal: None,
            dpd_delay: 0,
            dpd_timeout: 0,
            dpd_action: 0,
            close_action: 0,
            inactivity: 0,
            mediation: false,
            mediated_by: None,
            me_peer_id: None,
            reqid: 0,
            mark_in: Mark::default(),
            mark_out: Mark::default(),
            tfc: 0,
            local: EndRecord::default(),
            remote: EndRecord::default(),
        }
    }
}

impl ConnRecord {
    /// A fresh record with the given name and id and default parameters.
    pub fn named(name: &str, id: u64) -> Self {
        Self {
            name: name.to_string(),
            id,
            ..Self::default()
        }
    }
}

/// One certificate authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaRecord {
    /// CA name (must be unique).
    pub name: String,
    /// CA certificate file.
    pub cacert: Option<String>,
    /// Primary CRL distribution point.
    pub crluri: Option<String>,
    /// Secondary CRL distribution point.
    pub crluri2: Option<String>,
    /// Primary OCSP responder.
    pub ocspuri: Option<String>,
    /// Secondary OCSP responder.
    pub ocspuri2: Option<String>,
    /// Base URI for hash-and-URL certificate lookup.
    pub certuribase: Option<String>,
}

/// Process-wide settings forwarded to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSettings {
    /// Cache fetched CRLs to disk.
    pub cachecrls: bool,
    /// CRL checking level (0 = ignore, 1 = check if present, 2 = strict).
    pub strictcrlpolicy: u32,
    /// Unique-IDs enforcement level.
    pub uniqueids: u32,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            cachecrls: false,
            strictcrlpolicy: 0,
            uniqueids: 1,
        }
    }
}

/// A full set of records loaded from one TOML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnFile {
    /// Global setup settings.
    pub setup: SetupSettings,
    /// Connection records.
    pub connections: Vec<ConnRecord>,
    /// Certificate-authority records.
    pub authorities: Vec<CaRecord>,
}

impl ConnFile {
    /// Load records from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let file = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            connections = file.connections.len(),
            authorities = file.authorities.len(),
            "loaded records"
        );
        Ok(file)
    }

    /// Parse records from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let file: ConnFile = toml::from_str(s)?;
        file.validate()?;
        Ok(file)
    }

    /// Validate the loaded records.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, conn) in self.connections.iter().enumerate() {
            if conn.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "connections[{i}].name must not be empty"
                )));
            }
        }
        for (i, ca) in self.authorities.iter().enumerate() {
            if ca.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "authorities[{i}].name must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Find a connection record by name.
    pub fn connection(&self, name: &str) -> Option<&ConnRecord> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Find a CA record by name.
    pub fn authority(&self, name: &str) -> Option<&CaRecord> {
        self.authorities.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conn_defaults() {
        let conn = ConnRecord::default();
        assert_eq!(conn.name, AUTO_NAME);
        assert_eq!(conn.ipsec_lifetime, 3600);
        assert_eq!(conn.ike_lifetime, 10800);
        assert_eq!(conn.keying_tries, 1);
        assert!(conn.install_policy);
        assert!(conn.policy.is_empty());
    }

    #[test]
    fn test_parse_conn_file() {
        let toml = r#"
            [setup]
            cachecrls = true
            strictcrlpolicy = 1

            [[connections]]
            name = "office"
            id = 1
            ike_version = 2
            policy = "MOBIKE"

            [connections.local]
            host = "192.0.2.1"
            cert = "office.pem"
            has_client = true

            [connections.remote]
            id = "@gw.example.org"

            [[authorities]]
            name = "root-ca"
            cacert = "root.pem"
            crluri = "http://crl.example.org/root.crl"
        "#;
        let file = ConnFile::parse(toml).unwrap();
        assert!(file.setup.cachecrls);
        assert_eq!(file.setup.strictcrlpolicy, 1);

        let conn = file.connection("office").unwrap();
        assert_eq!(conn.ike_version, 2);
        assert!(conn.policy.contains(ConnPolicy::MOBIKE));
        assert_eq!(conn.local.host.as_deref(), Some("192.0.2.1"));
        assert!(conn.local.has_client);
        assert_eq!(conn.remote.id.as_deref(), Some("@gw.example.org"));
        // Unset remote host stays None; the encoder substitutes "%any".
        assert_eq!(conn.remote.host, None);

        let ca = file.authority("root-ca").unwrap();
        assert_eq!(ca.cacert.as_deref(), Some("root.pem"));
        assert!(file.authority("other-ca").is_none());
    }

    #[test]
    fn test_parse_policy_combination() {
        let toml = r#"
            [[connections]]
            name = "nat-ed"
            policy = "MOBIKE | FORCE_ENCAP | DONT_REAUTH"
        "#;
        let file = ConnFile::parse(toml).unwrap();
        let conn = file.connection("nat-ed").unwrap();
        assert!(conn.policy.contains(ConnPolicy::FORCE_ENCAP));
        assert!(conn.policy.contains(ConnPolicy::DONT_REAUTH));
        assert!(!conn.policy.contains(ConnPolicy::DONT_REKEY));
    }

    #[test]
    fn test_validation_rejects_empty_conn_name() {
        let toml = r#"
            [[connections]]
            name = ""
        "#;
        assert!(ConnFile::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_ca_name() {
        let toml = r#"
            [[authorities]]
            cacert = "root.pem"
        "#;
        assert!(ConnFile::parse(toml).is_err());
    }
}
