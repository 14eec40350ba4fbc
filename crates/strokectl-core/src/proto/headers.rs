//! Typed command headers.
//!
//! One struct per command, each with a `seal` method that lays the fields
//! down in the header region and a symmetric `read` that recovers them.
//! Field order is the wire layout; both methods must stay in lockstep.

use super::msg::{MsgError, StringRef, StrokeMsg};

/// Command-kind tag, the second field of the common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MsgKind {
    Initiate = 0,
    Route = 1,
    AddConn = 2,
    DelConn = 3,
    AddCa = 4,
    DelCa = 5,
    Config = 6,
}

impl MsgKind {
    pub(crate) fn from_wire(v: u32) -> Result<Self, MsgError> {
        match v {
            0 => Ok(Self::Initiate),
            1 => Ok(Self::Route),
            2 => Ok(Self::AddConn),
            3 => Ok(Self::DelConn),
            4 => Ok(Self::AddCa),
            5 => Ok(Self::DelCa),
            6 => Ok(Self::Config),
            other => Err(MsgError::UnknownKind(other)),
        }
    }
}

fn expect_kind(msg: &StrokeMsg, expected: MsgKind) -> Result<(), MsgError> {
    if msg.kind() != expected {
        return Err(MsgError::WrongKind {
            expected,
            got: msg.kind(),
        });
    }
    Ok(())
}

/// One endpoint descriptor (the "me" or "other" side of a connection).
///
/// The two instances in an [`AddConn`] are structurally identical; both are
/// populated by the same encoder routine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct End {
    pub auth: Option<StringRef>,
    pub auth2: Option<StringRef>,
    pub id: Option<StringRef>,
    pub id2: Option<StringRef>,
    pub rsakey: Option<StringRef>,
    pub cert: Option<StringRef>,
    pub cert2: Option<StringRef>,
    pub cert_policy: Option<StringRef>,
    pub ca: Option<StringRef>,
    pub ca2: Option<StringRef>,
    pub groups: Option<StringRef>,
    pub updown: Option<StringRef>,
    pub address: Option<StringRef>,
    pub ikeport: u16,
    pub subnets: Option<StringRef>,
    pub sourceip: Option<StringRef>,
    pub sourceip_mask: u32,
    pub sendcert: u32,
    pub hostaccess: bool,
    /// Traffic-selector direction flag: true when the end has no explicit
    /// client subnet, so traffic terminates at the host itself.
    pub tohost: bool,
    pub allow_any: bool,
    pub protocol: u32,
    pub port: u16,
}

impl End {
    fn encode(&self, w: &mut super::msg::HeaderWriter<'_>) -> Result<(), MsgError> {
        w.put_ref(self.auth)?;
        w.put_ref(self.auth2)?;
        w.put_ref(self.id)?;
        w.put_ref(self.id2)?;
        w.put_ref(self.rsakey)?;
        w.put_ref(self.cert)?;
        w.put_ref(self.cert2)?;
        w.put_ref(self.cert_policy)?;
        w.put_ref(self.ca)?;
        w.put_ref(self.ca2)?;
        w.put_ref(self.groups)?;
        w.put_ref(self.updown)?;
        w.put_ref(self.address)?;
        w.put_u16(self.ikeport)?;
        w.put_ref(self.subnets)?;
        w.put_ref(self.sourceip)?;
        w.put_u32(self.sourceip_mask)?;
        w.put_u32(self.sendcert)?;
        w.put_bool(self.hostaccess)?;
        w.put_bool(self.tohost)?;
        w.put_bool(self.allow_any)?;
        w.put_u32(self.protocol)?;
        w.put_u16(self.port)
    }

    fn decode(r: &mut super::msg::HeaderReader<'_>) -> Result<Self, MsgError> {
        Ok(Self {
            auth: r.get_ref()?,
            auth2: r.get_ref()?,
            id: r.get_ref()?,
            id2: r.get_ref()?,
            rsakey: r.get_ref()?,
            cert: r.get_ref()?,
            cert2: r.get_ref()?,
            cert_policy: r.get_ref()?,
            ca: r.get_ref()?,
            ca2: r.get_ref()?,
            groups: r.get_ref()?,
            updown: r.get_ref()?,
            address: r.get_ref()?,
            ikeport: r.get_u16()?,
            subnets: r.get_ref()?,
            sourceip: r.get_ref()?,
            sourceip_mask: r.get_u32()?,
            sendcert: r.get_u32()?,
            hostaccess: r.get_bool()?,
            tohost: r.get_bool()?,
            allow_any: r.get_bool()?,
            protocol: r.get_u32()?,
            port: r.get_u16()?,
        })
    }
}

/// Rekeying parameters. All zero when the connection never rekeys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rekey {
    pub reauth: bool,
    pub ipsec_lifetime: u64,
    pub ike_lifetime: u64,
    pub margin: u64,
    pub life_bytes: u64,
    pub margin_bytes: u64,
    pub life_packets: u64,
    pub margin_packets: u64,
    pub tries: u64,
    pub fuzz: u64,
}

/// Dead-peer-detection parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dpd {
    pub delay: u32,
    pub timeout: u32,
    pub action: u32,
}

/// Firewall mark value/mask pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mark {
    pub value: u32,
    pub mask: u32,
}

/// Header for the add-connection command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddConn {
    pub version: u32,
    pub name: Option<StringRef>,
    pub eap_identity: Option<StringRef>,
    pub aaa_identity: Option<StringRef>,
    pub xauth_identity: Option<StringRef>,
    pub mode: u32,
    pub proxy_mode: bool,
    pub rekey: Rekey,
    pub mobike: bool,
    pub force_encap: bool,
    pub ipcomp: bool,
    pub install_policy: bool,
    pub aggressive: bool,
    pub crl_policy: u32,
    pub unique: u32,
    pub ike: Option<StringRef>,
    pub esp: Option<StringRef>,
    pub dpd: Dpd,
    pub close_action: u32,
    pub inactivity: u32,
    pub mediation: bool,
    pub mediated_by: Option<StringRef>,
    pub peer_id: Option<StringRef>,
    pub reqid: u32,
    pub mark_in: Mark,
    pub mark_out: Mark,
    pub tfc: u32,
    pub me: End,
    pub other: End,
}

impl AddConn {
    pub fn seal(&self, msg: &mut StrokeMsg) -> Result<(), MsgError> {
        expect_kind(msg, MsgKind::AddConn)?;
        let mut w = msg.header_writer();
        w.put_u32(self.version)?;
        w.put_ref(self.name)?;
        w.put_ref(self.eap_identity)?;
        w.put_ref(self.aaa_identity)?;
        w.put_ref(self.xauth_identity)?;
        w.put_u32(self.mode)?;
        w.put_bool(self.proxy_mode)?;
        w.put_bool(self.rekey.reauth)?;
        w.put_u64(self.rekey.ipsec_lifetime)?;
        w.put_u64(self.rekey.ike_lifetime)?;
        w.put_u64(self.rekey.margin)?;
        w.put_u64(self.rekey.life_bytes)?;
        w.put_u64(self.rekey.margin_bytes)?;
        w.put_u64(self.rekey.life_packets)?;
        w.put_u64(self.rekey.margin_packets)?;
        w.put_u64(self.rekey.tries)?;
        w.put_u64(self.rekey.fuzz)?;
        w.put_bool(self.mobike)?;
        w.put_bool(self.force_encap)?;
        w.put_bool(self.ipcomp)?;
        w.put_bool(self.install_policy)?;
        w.put_bool(self.aggressive)?;
        w.put_u32(self.crl_policy)?;
        w.put_u32(self.unique)?;
        w.put_ref(self.ike)?;
        w.put_ref(self.esp)?;
        w.put_u32(self.dpd.delay)?;
        w.put_u32(self.dpd.timeout)?;
        w.put_u32(self.dpd.action)?;
        w.put_u32(self.close_action)?;
        w.put_u32(self.inactivity)?;
        w.put_bool(self.mediation)?;
        w.put_ref(self.mediated_by)?;
        w.put_ref(self.peer_id)?;
        w.put_u32(self.reqid)?;
        w.put_u32(self.mark_in.value)?;
        w.put_u32(self.mark_in.mask)?;
        w.put_u32(self.mark_out.value)?;
        w.put_u32(self.mark_out.mask)?;
        w.put_u32(self.tfc)?;
        self.me.encode(&mut w)?;
        self.other.encode(&mut w)
    }

    pub fn read(msg: &StrokeMsg) -> Result<Self, MsgError> {
        expect_kind(msg, MsgKind::AddConn)?;
        let mut r = msg.header_reader();
        Ok(Self {
            version: r.get_u32()?,
            name: r.get_ref()?,
            eap_identity: r.get_ref()?,
            aaa_identity: r.get_ref()?,
            xauth_identity: r.get_ref()?,
            mode: r.get_u32()?,
            proxy_mode: r.get_bool()?,
            rekey: Rekey {
                reauth: r.get_bool()?,
                ipsec_lifetime: r.get_u64()?,
                ike_lifetime: r.get_u64()?,
                margin: r.get_u64()?,
                life_bytes: r.get_u64()?,
                margin_bytes: r.get_u64()?,
                life_packets: r.get_u64()?,
                margin_packets: r.get_u64()?,
                tries: r.get_u64()?,
                fuzz: r.get_u64()?,
            },
            mobike: r.get_bool()?,
            force_encap: r.get_bool()?,
            ipcomp: r.get_bool()?,
            install_policy: r.get_bool()?,
            aggressive: r.get_bool()?,
            crl_policy: r.get_u32()?,
            unique: r.get_u32()?,
            ike: r.get_ref()?,
            esp: r.get_ref()?,
            dpd: Dpd {
                delay: r.get_u32()?,
                timeout: r.get_u32()?,
                action: r.get_u32()?,
            },
            close_action: r.get_u32()?,
            inactivity: r.get_u32()?,
            mediation: r.get_bool()?,
            mediated_by: r.get_ref()?,
            peer_id: r.get_ref()?,
            reqid: r.get_u32()?,
            mark_in: Mark {
                value: r.get_u32()?,
                mask: r.get_u32()?,
            },
            mark_out: Mark {
                value: r.get_u32()?,
                mask: r.get_u32()?,
            },
            tfc: r.get_u32()?,
            me: End::decode(&mut r)?,
            other: End::decode(&mut r)?,
        })
    }
}

macro_rules! name_only_header {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            pub name: Option<StringRef>,
        }

        impl $name {
            pub fn seal(&self, msg: &mut StrokeMsg) -> Result<(), MsgError> {
                expect_kind(msg, $kind)?;
                msg.header_writer().put_ref(self.name)
            }

            pub fn read(msg: &StrokeMsg) -> Result<Self, MsgError> {
                expect_kind(msg, $kind)?;
                Ok(Self {
                    name: msg.header_reader().get_ref()?,
                })
            }
        }
    };
}

name_only_header!(
    /// Header for the delete-connection command.
    DelConn,
    MsgKind::DelConn
);
name_only_header!(
    /// Header for the route-connection command.
    Route,
    MsgKind::Route
);
name_only_header!(
    /// Header for the initiate-connection command.
    Initiate,
    MsgKind::Initiate
);
name_only_header!(
    /// Header for the delete-CA command.
    DelCa,
    MsgKind::DelCa
);

/// Header for the add-CA command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddCa {
    pub name: Option<StringRef>,
    pub cacert: Option<StringRef>,
    pub crluri: Option<StringRef>,
    pub crluri2: Option<StringRef>,
    pub ocspuri: Option<StringRef>,
    pub ocspuri2: Option<StringRef>,
    pub certuribase: Option<StringRef>,
}

impl AddCa {
    pub fn seal(&self, msg: &mut StrokeMsg) -> Result<(), MsgError> {
        expect_kind(msg, MsgKind::AddCa)?;
        let mut w = msg.header_writer();
        w.put_ref(self.name)?;
        w.put_ref(self.cacert)?;
        w.put_ref(self.crluri)?;
        w.put_ref(self.crluri2)?;
        w.put_ref(self.ocspuri)?;
        w.put_ref(self.ocspuri2)?;
        w.put_ref(self.certuribase)
    }

    pub fn read(msg: &StrokeMsg) -> Result<Self, MsgError> {
        expect_kind(msg, MsgKind::AddCa)?;
        let mut r = msg.header_reader();
        Ok(Self {
            name: r.get_ref()?,
            cacert: r.get_ref()?,
            crluri: r.get_ref()?,
            crluri2: r.get_ref()?,
            ocspuri: r.get_ref()?,
            ocspuri2: r.get_ref()?,
            certuribase: r.get_ref()?,
        })
    }
}

/// Header for the set-global-config command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub cachecrl: bool,
}

impl GlobalConfig {
    pub fn seal(&self, msg: &mut StrokeMsg) -> Result<(), MsgError> {
        expect_kind(msg, MsgKind::Config)?;
        msg.header_writer().put_bool(self.cachecrl)
    }

    pub fn read(msg: &StrokeMsg) -> Result<Self, MsgError> {
        expect_kind(msg, MsgKind::Config)?;
        Ok(Self {
            cachecrl: msg.header_reader().get_bool()?,
        })
    }
}
