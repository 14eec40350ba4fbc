//! The stroke message buffer and its string pool.

use super::headers::MsgKind;

/// Total capacity of a stroke message in bytes. Messages are never resized;
/// a record whose strings exceed the pool fails to encode.
pub const MSG_CAPACITY: usize = 4096;

/// Where the string pool starts. The command header region between the
/// common header and this offset is the same size for every command, so
/// string offsets are comparable across kinds.
pub const DATA_OFFSET: usize = 640;

/// Where the command header region starts (after length, kind, verbosity).
const PAYLOAD_OFFSET: usize = 12;

const LEN_OFFSET: usize = 0;
const KIND_OFFSET: usize = 4;
const VERBOSITY_OFFSET: usize = 8;

/// Errors from message construction and inspection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsgError {
    #[error("message full: {needed} bytes needed, {remaining} remaining")]
    Capacity { needed: usize, remaining: usize },

    #[error("string contains an embedded NUL byte")]
    NulInString,

    #[error("string offset {0} outside the message data region")]
    BadOffset(usize),

    #[error("string at offset {0} has no terminator")]
    Unterminated(usize),

    #[error("string at offset {0} is not valid UTF-8")]
    Utf8(usize),

    #[error("command header exceeds the header region")]
    HeaderOverflow,

    #[error("unknown message kind {0}")]
    UnknownKind(u32),

    #[error("expected a {expected:?} message, got {got:?}")]
    WrongKind { expected: MsgKind, got: MsgKind },

    #[error("message truncated: {len} bytes")]
    Truncated { len: usize },

    #[error("length field says {header} bytes but {actual} were received")]
    LengthMismatch { header: usize, actual: usize },
}

/// Offset of a string inside a message, measured from the buffer start.
///
/// This is an opaque integer, not an address: it only becomes a string again
/// when rebased against some copy of the buffer via [`StrokeMsg::get_str`].
/// Absent fields are represented as `Option::None` and encode as a zero slot
/// (offset 0 is inside the common header, so no string can live there).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRef(u32);

impl StringRef {
    pub(crate) fn new(offset: usize) -> Self {
        Self(offset as u32)
    }

    /// The byte offset from the start of the message.
    pub fn offset(&self) -> usize {
        self.0 as usize
    }
}

/// A single stroke request: fixed-capacity buffer, monotonically growing
/// string pool, `used length ≤ capacity` at all times.
pub struct StrokeMsg {
    bytes: Box<[u8; MSG_CAPACITY]>,
    len: usize,
    kind: MsgKind,
}

impl StrokeMsg {
    /// A fresh zeroed message for the given command. The pool starts at
    /// [`DATA_OFFSET`]; verbosity starts at `-1` (silent daemon output).
    pub fn new(kind: MsgKind) -> Self {
        let mut msg = Self {
            bytes: Box::new([0u8; MSG_CAPACITY]),
            len: DATA_OFFSET,
            kind,
        };
        msg.bytes[KIND_OFFSET..KIND_OFFSET + 4].copy_from_slice(&(kind as u32).to_le_bytes());
        msg.set_verbosity(-1);
        msg.write_len_field();
        msg
    }

    /// Rebuild a message from received wire bytes, validating the framing.
    /// This is the receiver-side rebase: all string refs decoded out of the
    /// result resolve against this copy of the buffer.
    pub fn from_wire(wire: &[u8]) -> Result<Self, MsgError> {
        if wire.len() < DATA_OFFSET || wire.len() > MSG_CAPACITY {
            return Err(MsgError::Truncated { len: wire.len() });
        }
        let mut len_field = [0u8; 4];
        len_field.copy_from_slice(&wire[LEN_OFFSET..LEN_OFFSET + 4]);
        let header_len = u32::from_le_bytes(len_field) as usize;
        if header_len != wire.len() {
            return Err(MsgError::LengthMismatch {
                header: header_len,
                actual: wire.len(),
            });
        }
        let mut kind_field = [0u8; 4];
        kind_field.copy_from_slice(&wire[KIND_OFFSET..KIND_OFFSET + 4]);
        let kind = MsgKind::from_wire(u32::from_le_bytes(kind_field))?;

        let mut bytes = Box::new([0u8; MSG_CAPACITY]);
        bytes[..wire.len()].copy_from_slice(wire);
        Ok(Self {
            bytes,
            len: wire.len(),
            kind,
        })
    }

    /// The command this message carries.
    pub fn kind(&self) -> MsgKind {
        self.kind
    }

    /// Bytes used so far (common header + command header + pool).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Pool bytes still available.
    pub fn remaining(&self) -> usize {
        MSG_CAPACITY - self.len
    }

    /// Stamp the verbosity override for this request.
    pub fn set_verbosity(&mut self, verbosity: i32) {
        self.bytes[VERBOSITY_OFFSET..VERBOSITY_OFFSET + 4]
            .copy_from_slice(&verbosity.to_le_bytes());
    }

    /// The verbosity override currently stamped into the header.
    pub fn verbosity(&self) -> i32 {
        let mut field = [0u8; 4];
        field.copy_from_slice(&self.bytes[VERBOSITY_OFFSET..VERBOSITY_OFFSET + 4]);
        i32::from_le_bytes(field)
    }

    /// Append a string plus NUL terminator to the pool and return its ref.
    ///
    /// On overflow the message is left exactly as it was and the whole
    /// encode fails; fields are never silently dropped.
    pub fn push_str(&mut self, value: &str) -> Result<StringRef, MsgError> {
        if value.as_bytes().contains(&0) {
            return Err(MsgError::NulInString);
        }
        let needed = value.len() + 1;
        if needed > self.remaining() {
            return Err(MsgError::Capacity {
                needed,
                remaining: self.remaining(),
            });
        }
        let start = self.len;
        self.bytes[start..start + value.len()].copy_from_slice(value.as_bytes());
        self.bytes[start + value.len()] = 0;
        self.len += needed;
        self.write_len_field();
        Ok(StringRef::new(start))
    }

    /// [`push_str`](Self::push_str) for optional fields: `None` in, `None`
    /// out, no state change.
    pub fn push_string(&mut self, value: Option<&str>) -> Result<Option<StringRef>, MsgError> {
        value.map(|s| self.push_str(s)).transpose()
    }

    /// Resolve a ref back into a string by scanning to its terminator.
    pub fn get_str(&self, r: StringRef) -> Result<&str, MsgError> {
        let start = r.offset();
        if start < DATA_OFFSET || start >= self.len {
            return Err(MsgError::BadOffset(start));
        }
        let tail = &self.bytes[start..self.len];
        let nul = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(MsgError::Unterminated(start))?;
        std::str::from_utf8(&tail[..nul]).map_err(|_| MsgError::Utf8(start))
    }

    /// Resolve an optional ref.
    pub fn get_opt_str(&self, r: Option<StringRef>) -> Result<Option<&str>, MsgError> {
        r.map(|r| self.get_str(r)).transpose()
    }

    /// The bytes the transport writes: everything up to the used length.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// A bounds-checked writer over the command header region.
    pub fn header_writer(&mut self) -> HeaderWriter<'_> {
        HeaderWriter {
            buf: &mut self.bytes[PAYLOAD_OFFSET..DATA_OFFSET],
            pos: 0,
        }
    }

    /// A reader over the command header region.
    pub fn header_reader(&self) -> HeaderReader<'_> {
        HeaderReader {
            buf: &self.bytes[PAYLOAD_OFFSET..DATA_OFFSET],
            pos: 0,
        }
    }

    fn write_len_field(&mut self) {
        self.bytes[LEN_OFFSET..LEN_OFFSET + 4].copy_from_slice(&(self.len as u32).to_le_bytes());
    }
}

impl std::fmt::Debug for StrokeMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeMsg")
            .field("kind", &self.kind)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Little-endian field writer confined to the command header region.
pub struct HeaderWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl HeaderWriter<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), MsgError> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(MsgError::HeaderOverflow);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), MsgError> {
        self.put(&v.to_le_bytes())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<(), MsgError> {
        self.put(&v.to_le_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> Result<(), MsgError> {
        self.put(&v.to_le_bytes())
    }

    pub fn put_bool(&mut self, v: bool) -> Result<(), MsgError> {
        self.put_u32(v as u32)
    }

    /// A string slot: the ref's offset, or 0 for an absent field.
    pub fn put_ref(&mut self, r: Option<StringRef>) -> Result<(), MsgError> {
        self.put_u64(r.map(|r| r.offset() as u64).unwrap_or(0))
    }
}

/// Little-endian field reader over the command header region.
pub struct HeaderReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl HeaderReader<'_> {
    fn get<const N: usize>(&mut self) -> Result<[u8; N], MsgError> {
        let end = self.pos + N;
        if end > self.buf.len() {
            return Err(MsgError::HeaderOverflow);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    pub fn get_u16(&mut self) -> Result<u16, MsgError> {
        Ok(u16::from_le_bytes(self.get()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, MsgError> {
        Ok(u32::from_le_bytes(self.get()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, MsgError> {
        Ok(u64::from_le_bytes(self.get()?))
    }

    pub fn get_bool(&mut self) -> Result<bool, MsgError> {
        Ok(self.get_u32()? != 0)
    }

    /// A string slot; 0 decodes as absent, anything else must land inside
    /// the data region.
    pub fn get_ref(&mut self) -> Result<Option<StringRef>, MsgError> {
        let raw = self.get_u64()? as usize;
        match raw {
            0 => Ok(None),
            off if off < DATA_OFFSET || off >= MSG_CAPACITY => Err(MsgError::BadOffset(off)),
            off => Ok(Some(StringRef::new(off))),
        }
    }
}
