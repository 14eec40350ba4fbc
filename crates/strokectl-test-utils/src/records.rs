//! Ready-made record fixtures.

use strokectl_config::records::{CaRecord, ConnRecord, EndRecord, SetupSettings};

/// A site-to-site connection with hosts and subnets on both ends.
pub fn gateway_conn(name: &str) -> ConnRecord {
    let mut conn = ConnRecord::named(name, 1);
    conn.ike_version = 2;
    conn.local = EndRecord {
        host: Some("192.0.2.1".to_string()),
        id: Some("@moon.example.org".to_string()),
        cert: Some("moonCert.pem".to_string()),
        subnets: Some("10.1.0.0/16".to_string()),
        has_client: true,
        ..EndRecord::default()
    };
    conn.remote = EndRecord {
        host: Some("198.51.100.1".to_string()),
        id: Some("@sun.example.org".to_string()),
        subnets: Some("10.2.0.0/16".to_string()),
        has_client: true,
        ..EndRecord::default()
    };
    conn
}

/// A roadwarrior connection: local gateway, any remote peer.
pub fn roadwarrior_conn(name: &str) -> ConnRecord {
    let mut conn = ConnRecord::named(name, 2);
    conn.ike_version = 2;
    conn.local = EndRecord {
        host: Some("192.0.2.1".to_string()),
        cert: Some("moonCert.pem".to_string()),
        subnets: Some("10.1.0.0/16".to_string()),
        has_client: true,
        ..EndRecord::default()
    };
    conn.remote = EndRecord {
        allow_any: true,
        ..EndRecord::default()
    };
    conn
}

/// A CA record with CRL and OCSP endpoints.
pub fn root_ca(name: &str) -> CaRecord {
    CaRecord {
        name: name.to_string(),
        cacert: Some("root.pem".to_string()),
        crluri: Some("http://crl.example.org/root.crl".to_string()),
        ocspuri: Some("http://ocsp.example.org".to_string()),
        ..CaRecord::default()
    }
}

/// Settings with CRL caching enabled.
pub fn caching_setup() -> SetupSettings {
    SetupSettings {
        cachecrls: true,
        ..SetupSettings::default()
    }
}
