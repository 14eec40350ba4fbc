//! Command builders: records in, sealed stroke messages out.
//!
//! Each builder is a single linear pass. Strings go through the message's
//! pool first, then the header struct (carrying the returned refs and the
//! copied scalars) is sealed into the header region, and the message is
//! ready for the transport. An overflowing string fails the whole build.

use std::borrow::Cow;

use strokectl_config::records::{
    AUTO_NAME, CaRecord, ConnPolicy, ConnRecord, EndRecord, SetupSettings,
};

use crate::proto::headers::{self, Dpd, Mark, Rekey};
use crate::proto::{MsgError, MsgKind, StrokeMsg};
use crate::transport::{StrokeTransport, TransportError};

/// Address literal the daemon treats as "any peer".
const WILDCARD_ADDR: &str = "%any";

/// A command failed either while encoding or in flight.
#[derive(Debug, thiserror::Error)]
pub enum StrokeError {
    #[error("failed to encode stroke message: {0}")]
    Encode(#[from] MsgError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The name the daemon will know the connection by: `conn_<id>` for the
/// "%auto" sentinel, the record's own name otherwise.
fn display_name(conn: &ConnRecord) -> Cow<'_, str> {
    if conn.name == AUTO_NAME {
        Cow::Owned(format!("conn_{}", conn.id))
    } else {
        Cow::Borrowed(conn.name.as_str())
    }
}

/// Which end receives the secondary XAuth round for a legacy specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XauthEnd {
    Me,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LegacyAuth {
    method: &'static str,
    xauth: Option<XauthEnd>,
}

/// Translate an old-style combined auth specifier into split per-end
/// methods. Returns `None` for unrecognized specifiers; the daemon rejects
/// connections without any auth method, not the client.
fn legacy_auth(authby: &str, xauth_server: bool) -> Option<LegacyAuth> {
    let xauth_client = || {
        // The server end authenticates the client via XAuth, so the extra
        // round belongs to the opposite end.
        Some(if xauth_server {
            XauthEnd::Other
        } else {
            XauthEnd::Me
        })
    };
    match authby {
        "rsa" | "rsasig" | "ecdsa" | "ecdsasig" | "pubkey" => Some(LegacyAuth {
            method: "pubkey",
            xauth: None,
        }),
        "secret" | "psk" => Some(LegacyAuth {
            method: "psk",
            xauth: None,
        }),
        "xauthrsasig" => Some(LegacyAuth {
            method: "pubkey",
            xauth: xauth_client(),
        }),
        "xauthpsk" => Some(LegacyAuth {
            method: "psk",
            xauth: xauth_client(),
        }),
        _ => None,
    }
}

/// Populate one endpoint descriptor. Both ends of a connection go through
/// this single routine so their layouts cannot drift apart.
fn encode_end(msg: &mut StrokeMsg, end: &EndRecord) -> Result<headers::End, MsgError> {
    Ok(headers::End {
        auth: msg.push_string(end.auth.as_deref())?,
        auth2: msg.push_string(end.auth2.as_deref())?,
        id: msg.push_string(end.id.as_deref())?,
        id2: msg.push_string(end.id2.as_deref())?,
        rsakey: msg.push_string(end.rsakey.as_deref())?,
        cert: msg.push_string(end.cert.as_deref())?,
        cert2: msg.push_string(end.cert2.as_deref())?,
        cert_policy: msg.push_string(end.cert_policy.as_deref())?,
        ca: msg.push_string(end.ca.as_deref())?,
        ca2: msg.push_string(end.ca2.as_deref())?,
        groups: msg.push_string(end.groups.as_deref())?,
        updown: msg.push_string(end.updown.as_deref())?,
        address: Some(msg.push_str(end.host.as_deref().unwrap_or(WILDCARD_ADDR))?),
        ikeport: end.ikeport,
        subnets: msg.push_string(end.subnets.as_deref())?,
        sourceip: msg.push_string(end.sourceip.as_deref())?,
        sourceip_mask: end.sourceip_mask,
        sendcert: end.sendcert,
        hostaccess: end.hostaccess,
        tohost: !end.has_client,
        allow_any: end.allow_any,
        protocol: end.protocol,
        port: end.port,
    })
}

/// Build an add-connection message from a record and the global settings.
pub fn build_add_conn(setup: &SetupSettings, conn: &ConnRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::AddConn);

    let mut hdr = headers::AddConn {
        version: conn.ike_version,
        name: Some(msg.push_str(&display_name(conn))?),
        eap_identity: msg.push_string(conn.eap_identity.as_deref())?,
        aaa_identity: msg.push_string(conn.aaa_identity.as_deref())?,
        xauth_identity: msg.push_string(conn.xauth_identity.as_deref())?,
        mode: conn.mode,
        proxy_mode: conn.proxy_mode,
        mobike: conn.policy.contains(ConnPolicy::MOBIKE),
        force_encap: conn.policy.contains(ConnPolicy::FORCE_ENCAP),
        ipcomp: conn.policy.contains(ConnPolicy::COMPRESS),
        install_policy: conn.install_policy,
        aggressive: conn.aggressive,
        crl_policy: setup.strictcrlpolicy,
        unique: setup.uniqueids,
        ike: msg.push_string(conn.ike_proposal.as_deref())?,
        esp: msg.push_string(conn.esp_proposal.as_deref())?,
        dpd: Dpd {
            delay: conn.dpd_delay,
            timeout: conn.dpd_timeout,
            action: conn.dpd_action,
        },
        close_action: conn.close_action,
        inactivity: conn.inactivity,
        mediation: conn.mediation,
        mediated_by: msg.push_string(conn.mediated_by.as_deref())?,
        peer_id: msg.push_string(conn.me_peer_id.as_deref())?,
        reqid: conn.reqid,
        mark_in: Mark {
            value: conn.mark_in.value,
            mask: conn.mark_in.mask,
        },
        mark_out: Mark {
            value: conn.mark_out.value,
            mask: conn.mark_out.mask,
        },
        tfc: conn.tfc,
        ..headers::AddConn::default()
    };

    if !conn.policy.contains(ConnPolicy::DONT_REKEY) {
        hdr.rekey = Rekey {
            reauth: !conn.policy.contains(ConnPolicy::DONT_REAUTH),
            ipsec_lifetime: conn.ipsec_lifetime,
            ike_lifetime: conn.ike_lifetime,
            margin: conn.rekey_margin,
            life_bytes: conn.life_bytes,
            margin_bytes: conn.margin_bytes,
            life_packets: conn.life_packets,
            margin_packets: conn.margin_packets,
            tries: conn.keying_tries,
            fuzz: conn.rekey_fuzz,
        };
    }

    hdr.me = encode_end(&mut msg, &conn.local)?;
    hdr.other = encode_end(&mut msg, &conn.remote)?;

    // Neither end carried an explicit auth method: fall back to the legacy
    // combined specifier, split into per-end methods.
    if hdr.me.auth.is_none() && hdr.other.auth.is_none() {
        if let Some(authby) = conn.authby.as_deref() {
            if let Some(legacy) = legacy_auth(authby, conn.policy.contains(ConnPolicy::XAUTH_SERVER))
            {
                hdr.me.auth = Some(msg.push_str(legacy.method)?);
                hdr.other.auth = Some(msg.push_str(legacy.method)?);
                match legacy.xauth {
                    Some(XauthEnd::Me) => hdr.me.auth2 = Some(msg.push_str("xauth")?),
                    Some(XauthEnd::Other) => hdr.other.auth2 = Some(msg.push_str("xauth")?),
                    None => {}
                }
            }
        }
    }

    hdr.seal(&mut msg)?;
    Ok(msg)
}

/// Build a delete-connection message.
pub fn build_del_conn(conn: &ConnRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::DelConn);
    let name = Some(msg.push_str(&display_name(conn))?);
    headers::DelConn { name }.seal(&mut msg)?;
    Ok(msg)
}

/// Build a route-connection message.
pub fn build_route_conn(conn: &ConnRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::Route);
    let name = Some(msg.push_str(&display_name(conn))?);
    headers::Route { name }.seal(&mut msg)?;
    Ok(msg)
}

/// Build an initiate-connection message.
pub fn build_initiate_conn(conn: &ConnRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::Initiate);
    let name = Some(msg.push_str(&display_name(conn))?);
    headers::Initiate { name }.seal(&mut msg)?;
    Ok(msg)
}

/// Build an add-CA message.
pub fn build_add_ca(ca: &CaRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::AddCa);
    let hdr = headers::AddCa {
        name: Some(msg.push_str(&ca.name)?),
        cacert: msg.push_string(ca.cacert.as_deref())?,
        crluri: msg.push_string(ca.crluri.as_deref())?,
        crluri2: msg.push_string(ca.crluri2.as_deref())?,
        ocspuri: msg.push_string(ca.ocspuri.as_deref())?,
        ocspuri2: msg.push_string(ca.ocspuri2.as_deref())?,
        certuribase: msg.push_string(ca.certuribase.as_deref())?,
    };
    hdr.seal(&mut msg)?;
    Ok(msg)
}

/// Build a delete-CA message.
pub fn build_del_ca(ca: &CaRecord) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::DelCa);
    let name = Some(msg.push_str(&ca.name)?);
    headers::DelCa { name }.seal(&mut msg)?;
    Ok(msg)
}

/// Build a set-global-config message.
pub fn build_global_config(setup: &SetupSettings) -> Result<StrokeMsg, MsgError> {
    let mut msg = StrokeMsg::new(MsgKind::Config);
    headers::GlobalConfig {
        cachecrl: setup.cachecrls,
    }
    .seal(&mut msg)?;
    Ok(msg)
}

// ── Send wrappers ───────────────────────────────────────────────────────

/// Encode and send an add-connection command.
pub async fn add_conn(
    transport: &StrokeTransport,
    setup: &SetupSettings,
    conn: &ConnRecord,
) -> Result<(), StrokeError> {
    let mut msg = build_add_conn(setup, conn)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Encode and send a delete-connection command.
pub async fn del_conn(transport: &StrokeTransport, conn: &ConnRecord) -> Result<(), StrokeError> {
    let mut msg = build_del_conn(conn)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Encode and send a route-connection command.
pub async fn route_conn(transport: &StrokeTransport, conn: &ConnRecord) -> Result<(), StrokeError> {
    let mut msg = build_route_conn(conn)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Encode and send an initiate-connection command.
pub async fn initiate_conn(
    transport: &StrokeTransport,
    conn: &ConnRecord,
) -> Result<(), StrokeError> {
    let mut msg = build_initiate_conn(conn)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Encode and send an add-CA command.
pub async fn add_ca(transport: &StrokeTransport, ca: &CaRecord) -> Result<(), StrokeError> {
    let mut msg = build_add_ca(ca)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Encode and send a delete-CA command.
pub async fn del_ca(transport: &StrokeTransport, ca: &CaRecord) -> Result<(), StrokeError> {
    let mut msg = build_del_ca(ca)?;
    transport.send(&mut msg).await?;
    Ok(())
}

/// Push the global settings to the daemon. Only CRL caching is forwarded;
/// when it is off there is nothing to say and no message is sent.
pub async fn configure(
    transport: &StrokeTransport,
    setup: &SetupSettings,
) -> Result<(), StrokeError> {
    if !setup.cachecrls {
        return Ok(());
    }
    let mut msg = build_global_config(setup)?;
    transport.send(&mut msg).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strokectl_config::records::Mark as RecordMark;

    fn decode(msg: &StrokeMsg) -> headers::AddConn {
        headers::AddConn::read(msg).unwrap()
    }

    fn auth_strings(
        msg: &StrokeMsg,
        hdr: &headers::AddConn,
    ) -> (Option<String>, Option<String>, Option<String>, Option<String>) {
        let s = |r| msg.get_opt_str(r).unwrap().map(str::to_string);
        (
            s(hdr.me.auth),
            s(hdr.me.auth2),
            s(hdr.other.auth),
            s(hdr.other.auth2),
        )
    }

    #[test]
    fn test_auto_name_derivation() {
        let conn = ConnRecord::named(AUTO_NAME, 42);
        let msg = build_del_conn(&conn).unwrap();
        let hdr = headers::DelConn::read(&msg).unwrap();
        assert_eq!(msg.get_opt_str(hdr.name).unwrap(), Some("conn_42"));
    }

    #[test]
    fn test_explicit_name_used_verbatim() {
        let conn = ConnRecord::named("office", 42);
        let msg = build_initiate_conn(&conn).unwrap();
        let hdr = headers::Initiate::read(&msg).unwrap();
        assert_eq!(msg.get_opt_str(hdr.name).unwrap(), Some("office"));
    }

    #[test]
    fn test_missing_host_becomes_wildcard() {
        let mut conn = ConnRecord::named("rw", 1);
        conn.local.host = Some("192.0.2.1".to_string());
        // remote.host stays unset
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        assert_eq!(msg.get_opt_str(hdr.me.address).unwrap(), Some("192.0.2.1"));
        assert_eq!(msg.get_opt_str(hdr.other.address).unwrap(), Some("%any"));
    }

    #[test]
    fn test_tohost_is_negated_has_client() {
        let mut conn = ConnRecord::named("office", 1);
        conn.local.has_client = true;
        conn.remote.has_client = false;
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        assert!(!hdr.me.tohost);
        assert!(hdr.other.tohost);
    }

    #[test]
    fn test_rekey_group_copied_when_rekeying() {
        let mut conn = ConnRecord::named("office", 1);
        conn.ipsec_lifetime = 1200;
        conn.life_bytes = 1 << 30;
        conn.keying_tries = 3;
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        assert!(hdr.rekey.reauth);
        assert_eq!(hdr.rekey.ipsec_lifetime, 1200);
        assert_eq!(hdr.rekey.ike_lifetime, conn.ike_lifetime);
        assert_eq!(hdr.rekey.life_bytes, 1 << 30);
        assert_eq!(hdr.rekey.tries, 3);
        assert_eq!(hdr.rekey.fuzz, 100);
    }

    #[test]
    fn test_dont_rekey_suppresses_the_whole_group() {
        let mut conn = ConnRecord::named("office", 1);
        conn.policy = ConnPolicy::DONT_REKEY;
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        assert_eq!(decode(&msg).rekey, Rekey::default());
    }

    #[test]
    fn test_reauth_is_negated_dont_reauth() {
        let mut conn = ConnRecord::named("office", 1);
        conn.policy = ConnPolicy::DONT_REAUTH;
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        assert!(!decode(&msg).rekey.reauth);
        assert_eq!(decode(&msg).rekey.ipsec_lifetime, conn.ipsec_lifetime);
    }

    #[test]
    fn test_policy_flag_derivation() {
        let mut conn = ConnRecord::named("office", 1);
        conn.policy = ConnPolicy::MOBIKE | ConnPolicy::COMPRESS;
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        assert!(hdr.mobike);
        assert!(hdr.ipcomp);
        assert!(!hdr.force_encap);
    }

    #[test]
    fn test_setup_settings_land_in_the_header() {
        let setup = SetupSettings {
            cachecrls: false,
            strictcrlpolicy: 2,
            uniqueids: 0,
        };
        let conn = ConnRecord::named("office", 1);
        let msg = build_add_conn(&setup, &conn).unwrap();
        let hdr = decode(&msg);
        assert_eq!(hdr.crl_policy, 2);
        assert_eq!(hdr.unique, 0);
    }

    #[test]
    fn test_endpoint_round_trip_field_for_field() {
        let mut conn = ConnRecord::named("office", 7);
        conn.local = EndRecord {
            auth: Some("pubkey".into()),
            id: Some("@moon.example.org".into()),
            id2: Some("moon@example.org".into()),
            rsakey: Some("moonKey".into()),
            cert: Some("moonCert.pem".into()),
            cert_policy: Some("1.3.6.1.5.5.7.3.17".into()),
            ca: Some("root-ca".into()),
            groups: Some("research".into()),
            updown: Some("/usr/local/libexec/updown".into()),
            host: Some("192.0.2.1".into()),
            subnets: Some("10.1.0.0/16,10.2.0.0/16".into()),
            sourceip: Some("10.3.0.1".into()),
            sourceip_mask: 24,
            ikeport: 4500,
            sendcert: 2,
            hostaccess: true,
            has_client: true,
            allow_any: false,
            protocol: 6,
            port: 443,
            ..EndRecord::default()
        };
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);

        let me = &hdr.me;
        let s = |r| msg.get_opt_str(r).unwrap();
        assert_eq!(s(me.auth), conn.local.auth.as_deref());
        assert_eq!(s(me.id), conn.local.id.as_deref());
        assert_eq!(s(me.id2), conn.local.id2.as_deref());
        assert_eq!(s(me.rsakey), conn.local.rsakey.as_deref());
        assert_eq!(s(me.cert), conn.local.cert.as_deref());
        assert_eq!(s(me.cert2), None);
        assert_eq!(s(me.cert_policy), conn.local.cert_policy.as_deref());
        assert_eq!(s(me.ca), conn.local.ca.as_deref());
        assert_eq!(s(me.ca2), None);
        assert_eq!(s(me.groups), conn.local.groups.as_deref());
        assert_eq!(s(me.updown), conn.local.updown.as_deref());
        assert_eq!(s(me.address), conn.local.host.as_deref());
        assert_eq!(s(me.subnets), conn.local.subnets.as_deref());
        assert_eq!(s(me.sourceip), conn.local.sourceip.as_deref());
        assert_eq!(me.sourceip_mask, 24);
        assert_eq!(me.ikeport, 4500);
        assert_eq!(me.sendcert, 2);
        assert!(me.hostaccess);
        assert!(!me.tohost);
        assert!(!me.allow_any);
        assert_eq!(me.protocol, 6);
        assert_eq!(me.port, 443);
    }

    #[test]
    fn test_scalars_copied_into_header() {
        let mut conn = ConnRecord::named("office", 7);
        conn.ike_version = 2;
        conn.mode = 1;
        conn.dpd_delay = 30;
        conn.dpd_timeout = 150;
        conn.dpd_action = 2;
        conn.close_action = 1;
        conn.inactivity = 300;
        conn.reqid = 99;
        conn.mark_in = RecordMark {
            value: 0x20,
            mask: 0xffff_ffff,
        };
        conn.tfc = 1300;
        conn.ike_proposal = Some("aes256-sha256-modp2048".into());
        conn.esp_proposal = Some("aes128gcm16".into());
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        assert_eq!(hdr.version, 2);
        assert_eq!(hdr.mode, 1);
        assert_eq!(hdr.dpd, Dpd { delay: 30, timeout: 150, action: 2 });
        assert_eq!(hdr.close_action, 1);
        assert_eq!(hdr.inactivity, 300);
        assert_eq!(hdr.reqid, 99);
        assert_eq!(hdr.mark_in, Mark { value: 0x20, mask: 0xffff_ffff });
        assert_eq!(hdr.tfc, 1300);
        assert_eq!(
            msg.get_opt_str(hdr.ike).unwrap(),
            Some("aes256-sha256-modp2048")
        );
        assert_eq!(msg.get_opt_str(hdr.esp).unwrap(), Some("aes128gcm16"));
    }

    // ── Legacy combined-auth translation ───────────────────────────────

    fn legacy_case(authby: &str, server: bool) -> (StrokeMsg, headers::AddConn) {
        let mut conn = ConnRecord::named("legacy", 1);
        conn.authby = Some(authby.to_string());
        if server {
            conn.policy |= ConnPolicy::XAUTH_SERVER;
        }
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        (msg, hdr)
    }

    #[test]
    fn test_legacy_pubkey_family() {
        for authby in ["rsa", "rsasig", "ecdsa", "ecdsasig", "pubkey"] {
            let (msg, hdr) = legacy_case(authby, false);
            let (me, me2, other, other2) = auth_strings(&msg, &hdr);
            assert_eq!(me.as_deref(), Some("pubkey"), "authby={authby}");
            assert_eq!(other.as_deref(), Some("pubkey"));
            assert_eq!(me2, None);
            assert_eq!(other2, None);
        }
    }

    #[test]
    fn test_legacy_psk_family() {
        for authby in ["secret", "psk"] {
            let (msg, hdr) = legacy_case(authby, false);
            let (me, _, other, _) = auth_strings(&msg, &hdr);
            assert_eq!(me.as_deref(), Some("psk"), "authby={authby}");
            assert_eq!(other.as_deref(), Some("psk"));
        }
    }

    #[test]
    fn test_legacy_xauthrsasig_client_side() {
        let (msg, hdr) = legacy_case("xauthrsasig", false);
        let (me, me2, other, other2) = auth_strings(&msg, &hdr);
        assert_eq!(me.as_deref(), Some("pubkey"));
        assert_eq!(other.as_deref(), Some("pubkey"));
        assert_eq!(me2.as_deref(), Some("xauth"));
        assert_eq!(other2, None);
    }

    #[test]
    fn test_legacy_xauthpsk_server_side() {
        let (msg, hdr) = legacy_case("xauthpsk", true);
        let (me, me2, other, other2) = auth_strings(&msg, &hdr);
        assert_eq!(me.as_deref(), Some("psk"));
        assert_eq!(other.as_deref(), Some("psk"));
        assert_eq!(me2, None);
        assert_eq!(other2.as_deref(), Some("xauth"));
    }

    #[test]
    fn test_legacy_unknown_specifier_leaves_auth_absent() {
        let (_, hdr) = legacy_case("kerberos", false);
        assert_eq!(hdr.me.auth, None);
        assert_eq!(hdr.other.auth, None);
    }

    #[test]
    fn test_explicit_end_auth_suppresses_legacy() {
        let mut conn = ConnRecord::named("mixed", 1);
        conn.authby = Some("psk".to_string());
        conn.local.auth = Some("pubkey".to_string());
        let msg = build_add_conn(&SetupSettings::default(), &conn).unwrap();
        let hdr = decode(&msg);
        let (me, _, other, _) = auth_strings(&msg, &hdr);
        assert_eq!(me.as_deref(), Some("pubkey"));
        // The legacy fallback requires *both* ends to be unset.
        assert_eq!(other, None);
    }

    #[test]
    fn test_legacy_mapping_is_pure() {
        assert_eq!(
            legacy_auth("xauthpsk", true),
            Some(LegacyAuth {
                method: "psk",
                xauth: Some(XauthEnd::Other),
            })
        );
        assert_eq!(
            legacy_auth("xauthpsk", false),
            Some(LegacyAuth {
                method: "psk",
                xauth: Some(XauthEnd::Me),
            })
        );
        assert_eq!(legacy_auth("never", false), None);
    }

    // ── Other commands ─────────────────────────────────────────────────

    #[test]
    fn test_add_ca_message() {
        let ca = CaRecord {
            name: "root-ca".into(),
            cacert: Some("root.pem".into()),
            crluri: Some("http://crl.example.org/root.crl".into()),
            ..CaRecord::default()
        };
        let msg = build_add_ca(&ca).unwrap();
        let hdr = headers::AddCa::read(&msg).unwrap();
        assert_eq!(msg.get_opt_str(hdr.name).unwrap(), Some("root-ca"));
        assert_eq!(msg.get_opt_str(hdr.cacert).unwrap(), Some("root.pem"));
        assert_eq!(hdr.ocspuri, None);
    }

    #[test]
    fn test_global_config_message() {
        let setup = SetupSettings {
            cachecrls: true,
            ..SetupSettings::default()
        };
        let msg = build_global_config(&setup).unwrap();
        assert!(headers::GlobalConfig::read(&msg).unwrap().cachecrl);
    }

    #[test]
    fn test_oversized_record_fails_the_whole_build() {
        let mut conn = ConnRecord::named("huge", 1);
        conn.local.subnets = Some("10.0.0.0/8,".repeat(500));
        let err = build_add_conn(&SetupSettings::default(), &conn).unwrap_err();
        assert!(matches!(err, MsgError::Capacity { .. }));
    }
}
