//! PCF wire codec
//!
//! Administrative requests and replies are a fixed header (MQCFH) followed by
//! a sequence of self-describing parameters. Every parameter starts with the
//! same three integers: its structure type, its total structure length and
//! the parameter code saying which field it carries. The structure length is
//! what lets a reader step over parameters it does not care about.
//!
//! Decoding never reads past the end of the supplied buffer; a structure that
//! claims more bytes than remain is reported as [`CodecError::Truncated`].

use super::constants::*;
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::debug;

/// Deepest group nesting accepted on decode
pub const MAX_GROUP_DEPTH: usize = 8;

/// Codec failures. All of them are local to one message.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("truncated structure: need {need} bytes at offset {offset}, buffer has {have}")]
    Truncated {
        offset: usize,
        need: usize,
        have: usize,
    },
    #[error("unsupported parameter type {kind} at offset {offset}")]
    UnknownType { kind: i32, offset: usize },
    #[error("invalid structure length {length} for parameter type {kind}")]
    BadLength { kind: i32, length: i32 },
    #[error("groups nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
    #[error("header is not a PCF header (type {kind}, length {length})")]
    BadHeader { kind: i32, length: i32 },
}

/// Byte order of the integers in a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Little-endian integers, used by the distributed platforms
    #[default]
    Little,
    /// Big-endian integers, used by z/OS and the big-endian UNIX systems
    Big,
}

impl Encoding {
    /// Integer encoding value carried in a message descriptor
    pub fn to_mq(self) -> i32 {
        match self {
            Encoding::Little => 0x222,
            Encoding::Big => 0x111,
        }
    }

    /// Map a message descriptor encoding back to a byte order.
    /// Only the integer nibble is significant.
    pub fn from_mq(value: i32) -> Self {
        if value & 0x0f == 0x02 {
            Encoding::Little
        } else {
            Encoding::Big
        }
    }

    fn read_i32(self, b: &[u8]) -> i32 {
        let raw = [b[0], b[1], b[2], b[3]];
        match self {
            Encoding::Little => i32::from_le_bytes(raw),
            Encoding::Big => i32::from_be_bytes(raw),
        }
    }

    fn read_i64(self, b: &[u8]) -> i64 {
        let raw = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        match self {
            Encoding::Little => i64::from_le_bytes(raw),
            Encoding::Big => i64::from_be_bytes(raw),
        }
    }

    fn put_i32(self, buf: &mut BytesMut, v: i32) {
        match self {
            Encoding::Little => buf.put_i32_le(v),
            Encoding::Big => buf.put_i32(v),
        }
    }

    fn put_i64(self, buf: &mut BytesMut, v: i64) {
        match self {
            Encoding::Little => buf.put_i64_le(v),
            Encoding::Big => buf.put_i64(v),
        }
    }
}

/// The MQCFH header that starts every command, response and publication
#[derive(Debug, Clone, PartialEq)]
pub struct PcfHeader {
    pub kind: i32,
    pub version: i32,
    pub command: i32,
    pub msg_seq_number: i32,
    pub control: i32,
    pub comp_code: i32,
    pub reason: i32,
    pub parameter_count: i32,
}

impl PcfHeader {
    pub fn command(command: i32) -> Self {
        Self {
            kind: MQCFT_COMMAND,
            version: MQCFH_VERSION_1,
            command,
            msg_seq_number: 1,
            control: MQCFC_LAST,
            comp_code: MQCC_OK,
            reason: MQRC_NONE,
            parameter_count: 0,
        }
    }

    /// True when this is the final message of a reply sequence
    pub fn is_last(&self) -> bool {
        self.control == MQCFC_LAST
    }

    pub fn encode(&self, enc: Encoding, buf: &mut BytesMut) {
        for v in [
            self.kind,
            MQCFH_STRUC_LENGTH as i32,
            self.version,
            self.command,
            self.msg_seq_number,
            self.control,
            self.comp_code,
            self.reason,
            self.parameter_count,
        ] {
            enc.put_i32(buf, v);
        }
    }

    pub fn decode(buf: &[u8], enc: Encoding) -> Result<Self, CodecError> {
        ensure(buf, 0, MQCFH_STRUC_LENGTH)?;
        let f = |i: usize| enc.read_i32(&buf[i * 4..]);
        let length = f(1);
        if length as usize != MQCFH_STRUC_LENGTH {
            return Err(CodecError::BadHeader {
                kind: f(0),
                length,
            });
        }
        Ok(Self {
            kind: f(0),
            version: f(2),
            command: f(3),
            msg_seq_number: f(4),
            control: f(5),
            comp_code: f(6),
            reason: f(7),
            parameter_count: f(8),
        })
    }
}

/// Decoded value of one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum PcfValue {
    Int(i64),
    IntList(Vec<i64>),
    Str(String),
    StrList(Vec<String>),
    Bytes(Vec<u8>),
    Group(Vec<PcfParameter>),
    IntFilter { operator: i32, value: i64 },
    StrFilter { operator: i32, value: String },
}

/// One self-describing parameter: wire type tag, field code and value
#[derive(Debug, Clone, PartialEq)]
pub struct PcfParameter {
    pub kind: i32,
    pub code: i32,
    pub value: PcfValue,
}

impl PcfParameter {
    pub fn int(code: i32, value: i32) -> Self {
        Self {
            kind: MQCFT_INTEGER,
            code,
            value: PcfValue::Int(value as i64),
        }
    }

    pub fn int64(code: i32, value: i64) -> Self {
        Self {
            kind: MQCFT_INTEGER64,
            code,
            value: PcfValue::Int(value),
        }
    }

    pub fn int_list(code: i32, values: &[i32]) -> Self {
        Self {
            kind: MQCFT_INTEGER_LIST,
            code,
            value: PcfValue::IntList(values.iter().map(|v| *v as i64).collect()),
        }
    }

    pub fn int64_list(code: i32, values: &[i64]) -> Self {
        Self {
            kind: MQCFT_INTEGER64_LIST,
            code,
            value: PcfValue::IntList(values.to_vec()),
        }
    }

    pub fn string(code: i32, value: &str) -> Self {
        Self {
            kind: MQCFT_STRING,
            code,
            value: PcfValue::Str(value.to_string()),
        }
    }

    pub fn string_list(code: i32, values: &[&str]) -> Self {
        Self {
            kind: MQCFT_STRING_LIST,
            code,
            value: PcfValue::StrList(values.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn bytes(code: i32, value: &[u8]) -> Self {
        Self {
            kind: MQCFT_BYTE_STRING,
            code,
            value: PcfValue::Bytes(value.to_vec()),
        }
    }

    pub fn group(code: i32, children: Vec<PcfParameter>) -> Self {
        Self {
            kind: MQCFT_GROUP,
            code,
            value: PcfValue::Group(children),
        }
    }

    /// Integer, 64-bit integer and their list forms
    pub fn is_integer_family(&self) -> bool {
        matches!(
            self.kind,
            MQCFT_INTEGER | MQCFT_INTEGER64 | MQCFT_INTEGER_LIST | MQCFT_INTEGER64_LIST
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.value {
            PcfValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PcfValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Element of an integer list, or the scalar itself for index 0
    pub fn int_at(&self, index: usize) -> Option<i64> {
        match &self.value {
            PcfValue::IntList(v) => v.get(index).copied(),
            PcfValue::Int(v) if index == 0 => Some(*v),
            _ => None,
        }
    }

    /// Serialize this parameter on its own
    pub fn encode(&self, enc: Encoding) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(enc, &mut buf);
        buf.freeze()
    }

    pub fn encode_into(&self, enc: Encoding, buf: &mut BytesMut) {
        match &self.value {
            PcfValue::Int(v) if self.kind == MQCFT_INTEGER64 => {
                enc.put_i32(buf, MQCFT_INTEGER64);
                enc.put_i32(buf, MQCFIN64_STRUC_LENGTH as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, 0);
                enc.put_i64(buf, *v);
            }
            PcfValue::Int(v) => {
                enc.put_i32(buf, MQCFT_INTEGER);
                enc.put_i32(buf, MQCFIN_STRUC_LENGTH as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, *v as i32);
            }
            PcfValue::IntList(values) if self.kind == MQCFT_INTEGER64_LIST => {
                enc.put_i32(buf, MQCFT_INTEGER64_LIST);
                enc.put_i32(buf, (MQCFIL64_STRUC_LENGTH_FIXED + 8 * values.len()) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, values.len() as i32);
                for v in values {
                    enc.put_i64(buf, *v);
                }
            }
            PcfValue::IntList(values) => {
                enc.put_i32(buf, MQCFT_INTEGER_LIST);
                enc.put_i32(buf, (MQCFIL_STRUC_LENGTH_FIXED + 4 * values.len()) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, values.len() as i32);
                for v in values {
                    enc.put_i32(buf, *v as i32);
                }
            }
            PcfValue::Str(s) => {
                let padded = pad4(s.len());
                enc.put_i32(buf, MQCFT_STRING);
                enc.put_i32(buf, (MQCFST_STRUC_LENGTH_FIXED + padded) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, 0);
                enc.put_i32(buf, s.len() as i32);
                put_padded(buf, s.as_bytes(), padded, b' ');
            }
            PcfValue::StrList(values) => {
                let width = values.iter().map(|s| s.len()).max().unwrap_or(0);
                let body = pad4(width * values.len());
                enc.put_i32(buf, MQCFT_STRING_LIST);
                enc.put_i32(buf, (MQCFSL_STRUC_LENGTH_FIXED + body) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, 0);
                enc.put_i32(buf, values.len() as i32);
                enc.put_i32(buf, width as i32);
                let mut written = 0;
                for s in values {
                    put_padded(buf, s.as_bytes(), width, b' ');
                    written += width;
                }
                buf.put_bytes(b' ', body - written);
            }
            PcfValue::Bytes(b) => {
                let padded = pad4(b.len());
                enc.put_i32(buf, MQCFT_BYTE_STRING);
                enc.put_i32(buf, (MQCFBS_STRUC_LENGTH_FIXED + padded) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, b.len() as i32);
                put_padded(buf, b, padded, 0);
            }
            PcfValue::Group(children) => {
                enc.put_i32(buf, MQCFT_GROUP);
                enc.put_i32(buf, MQCFGR_STRUC_LENGTH as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, children.len() as i32);
                for child in children {
                    child.encode_into(enc, buf);
                }
            }
            PcfValue::IntFilter { operator, value } => {
                enc.put_i32(buf, MQCFT_INTEGER_FILTER);
                enc.put_i32(buf, MQCFIF_STRUC_LENGTH as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, *operator);
                enc.put_i32(buf, *value as i32);
            }
            PcfValue::StrFilter { operator, value } => {
                let padded = pad4(value.len());
                enc.put_i32(buf, MQCFT_STRING_FILTER);
                enc.put_i32(buf, (MQCFSF_STRUC_LENGTH_FIXED + padded) as i32);
                enc.put_i32(buf, self.code);
                enc.put_i32(buf, *operator);
                enc.put_i32(buf, 0);
                enc.put_i32(buf, value.len() as i32);
                put_padded(buf, value.as_bytes(), padded, b' ');
            }
        }
    }
}

/// Build a standalone encoded parameter from its parts
pub fn encode_parameter(kind: i32, code: i32, value: PcfValue, enc: Encoding) -> Bytes {
    PcfParameter { kind, code, value }.encode(enc)
}

/// Decode the parameter starting at `offset`.
///
/// Returns the parameter and the number of bytes it occupied, including the
/// children of a group.
pub fn decode_next(
    buf: &[u8],
    offset: usize,
    enc: Encoding,
) -> Result<(PcfParameter, usize), CodecError> {
    decode_at_depth(buf, offset, enc, 0)
}

fn decode_at_depth(
    buf: &[u8],
    offset: usize,
    enc: Encoding,
    depth: usize,
) -> Result<(PcfParameter, usize), CodecError> {
    ensure(buf, offset, 12)?;
    let at = |rel: usize| enc.read_i32(&buf[offset + rel..]);
    let kind = at(0);
    let length = at(4);
    let code = at(8);

    if length < 12 {
        return Err(CodecError::BadLength { kind, length });
    }
    let len = length as usize;
    ensure(buf, offset, len)?;

    let value = match kind {
        MQCFT_INTEGER => {
            check_len(kind, length, len >= MQCFIN_STRUC_LENGTH)?;
            PcfValue::Int(at(12) as i64)
        }
        MQCFT_INTEGER64 => {
            check_len(kind, length, len >= MQCFIN64_STRUC_LENGTH)?;
            PcfValue::Int(enc.read_i64(&buf[offset + 16..]))
        }
        MQCFT_INTEGER_LIST => {
            check_len(kind, length, len >= MQCFIL_STRUC_LENGTH_FIXED)?;
            let count = non_negative(kind, at(12))?;
            check_len(kind, length, MQCFIL_STRUC_LENGTH_FIXED + 4 * count <= len)?;
            (0..count)
                .map(|i| at(16 + 4 * i) as i64)
                .collect::<Vec<_>>()
                .into()
        }
        MQCFT_INTEGER64_LIST => {
            check_len(kind, length, len >= MQCFIL64_STRUC_LENGTH_FIXED)?;
            let count = non_negative(kind, at(12))?;
            check_len(kind, length, MQCFIL64_STRUC_LENGTH_FIXED + 8 * count <= len)?;
            (0..count)
                .map(|i| enc.read_i64(&buf[offset + 16 + 8 * i..]))
                .collect::<Vec<_>>()
                .into()
        }
        MQCFT_STRING => {
            check_len(kind, length, len >= MQCFST_STRUC_LENGTH_FIXED)?;
            let slen = non_negative(kind, at(16))?;
            check_len(kind, length, MQCFST_STRUC_LENGTH_FIXED + slen <= len)?;
            let start = offset + MQCFST_STRUC_LENGTH_FIXED;
            PcfValue::Str(text(&buf[start..start + slen], code))
        }
        MQCFT_STRING_LIST => {
            check_len(kind, length, len >= MQCFSL_STRUC_LENGTH_FIXED)?;
            let count = non_negative(kind, at(16))?;
            let width = non_negative(kind, at(20))?;
            check_len(kind, length, MQCFSL_STRUC_LENGTH_FIXED + count * width <= len)?;
            let start = offset + MQCFSL_STRUC_LENGTH_FIXED;
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                let s = start + i * width;
                out.push(text(&buf[s..s + width], code));
            }
            PcfValue::StrList(out)
        }
        MQCFT_BYTE_STRING => {
            check_len(kind, length, len >= MQCFBS_STRUC_LENGTH_FIXED)?;
            let blen = non_negative(kind, at(12))?;
            check_len(kind, length, MQCFBS_STRUC_LENGTH_FIXED + blen <= len)?;
            let start = offset + MQCFBS_STRUC_LENGTH_FIXED;
            PcfValue::Bytes(buf[start..start + blen].to_vec())
        }
        MQCFT_INTEGER_FILTER => {
            check_len(kind, length, len >= MQCFIF_STRUC_LENGTH)?;
            PcfValue::IntFilter {
                operator: at(12),
                value: at(16) as i64,
            }
        }
        MQCFT_STRING_FILTER => {
            check_len(kind, length, len >= MQCFSF_STRUC_LENGTH_FIXED)?;
            let slen = non_negative(kind, at(20))?;
            check_len(kind, length, MQCFSF_STRUC_LENGTH_FIXED + slen <= len)?;
            let start = offset + MQCFSF_STRUC_LENGTH_FIXED;
            PcfValue::StrFilter {
                operator: at(12),
                value: text(&buf[start..start + slen], code),
            }
        }
        MQCFT_GROUP => {
            check_len(kind, length, len == MQCFGR_STRUC_LENGTH)?;
            if depth >= MAX_GROUP_DEPTH {
                return Err(CodecError::TooDeep {
                    limit: MAX_GROUP_DEPTH,
                    offset,
                });
            }
            let count = non_negative(kind, at(12))?;
            let mut children = Vec::with_capacity(count);
            let mut consumed = len;
            for _ in 0..count {
                let (child, used) = decode_at_depth(buf, offset + consumed, enc, depth + 1)?;
                children.push(child);
                consumed += used;
            }
            return Ok((
                PcfParameter {
                    kind,
                    code,
                    value: PcfValue::Group(children),
                },
                consumed,
            ));
        }
        other => {
            return Err(CodecError::UnknownType {
                kind: other,
                offset,
            })
        }
    };

    Ok((PcfParameter { kind, code, value }, len))
}

impl From<Vec<i64>> for PcfValue {
    fn from(v: Vec<i64>) -> Self {
        PcfValue::IntList(v)
    }
}

/// A complete decoded message: header plus its top-level parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PcfMessage {
    pub header: PcfHeader,
    pub parameters: Vec<PcfParameter>,
}

impl PcfMessage {
    /// Decode a whole message body. The cursor stops exactly at the end of
    /// the buffer or after `parameter_count` parameters, whichever is first.
    pub fn decode(buf: &[u8], enc: Encoding) -> Result<Self, CodecError> {
        let header = PcfHeader::decode(buf, enc)?;
        let mut offset = MQCFH_STRUC_LENGTH;
        let mut parameters = Vec::with_capacity(header.parameter_count.max(0) as usize);
        while offset < buf.len() && parameters.len() < header.parameter_count.max(0) as usize {
            let (p, used) = decode_next(buf, offset, enc)?;
            parameters.push(p);
            offset += used;
        }
        Ok(Self { header, parameters })
    }

    pub fn encode(&self, enc: Encoding) -> Bytes {
        let mut buf = BytesMut::with_capacity(MQCFH_STRUC_LENGTH + 64 * self.parameters.len());
        let mut header = self.header.clone();
        header.parameter_count = self.parameters.len() as i32;
        header.encode(enc, &mut buf);
        for p in &self.parameters {
            p.encode_into(enc, &mut buf);
        }
        buf.freeze()
    }

    pub fn find(&self, code: i32) -> Option<&PcfParameter> {
        self.parameters.iter().find(|p| p.code == code)
    }

    pub fn find_str(&self, code: i32) -> Option<&str> {
        self.find(code).and_then(|p| p.as_str())
    }

    pub fn find_int(&self, code: i32) -> Option<i64> {
        self.find(code).and_then(|p| p.as_int())
    }
}

/// Builder for an administrative request
#[derive(Debug, Clone)]
pub struct PcfCommand {
    message: PcfMessage,
}

impl PcfCommand {
    pub fn new(command: i32) -> Self {
        Self {
            message: PcfMessage {
                header: PcfHeader::command(command),
                parameters: Vec::new(),
            },
        }
    }

    pub fn string(mut self, code: i32, value: &str) -> Self {
        self.message.parameters.push(PcfParameter::string(code, value));
        self
    }

    pub fn int(mut self, code: i32, value: i32) -> Self {
        self.message.parameters.push(PcfParameter::int(code, value));
        self
    }

    pub fn int_list(mut self, code: i32, values: &[i32]) -> Self {
        self.message
            .parameters
            .push(PcfParameter::int_list(code, values));
        self
    }

    pub fn bytes(mut self, code: i32, value: &[u8]) -> Self {
        self.message.parameters.push(PcfParameter::bytes(code, value));
        self
    }

    /// Request the extended reply format used by z/OS command servers
    pub fn extended(mut self) -> Self {
        self.message.header.kind = MQCFT_COMMAND_XR;
        self.message.header.version = MQCFH_VERSION_3;
        self
    }

    pub fn command_code(&self) -> i32 {
        self.message.header.command
    }

    pub fn parameters(&self) -> &[PcfParameter] {
        &self.message.parameters
    }

    pub fn encode(&self, enc: Encoding) -> Bytes {
        self.message.encode(enc)
    }
}

fn ensure(buf: &[u8], offset: usize, need: usize) -> Result<(), CodecError> {
    if offset > buf.len() || buf.len() - offset < need {
        return Err(CodecError::Truncated {
            offset,
            need,
            have: buf.len(),
        });
    }
    Ok(())
}

fn check_len(kind: i32, length: i32, ok: bool) -> Result<(), CodecError> {
    if ok {
        Ok(())
    } else {
        Err(CodecError::BadLength { kind, length })
    }
}

fn non_negative(kind: i32, v: i32) -> Result<usize, CodecError> {
    usize::try_from(v).map_err(|_| CodecError::BadLength { kind, length: v })
}

/// Text of a string parameter. Bytes that are not UTF-8 are read as
/// ISO-8859-1, the usual character set of a distributed queue manager.
fn text(raw: &[u8], code: i32) -> String {
    let s = match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!(code, "String parameter is not UTF-8, reading it as ISO-8859-1");
            raw.iter().map(|&b| char::from(b)).collect()
        }
    };
    s.trim_end_matches([' ', '\0']).to_string()
}

fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

fn put_padded(buf: &mut BytesMut, data: &[u8], width: usize, fill: u8) {
    buf.put_slice(data);
    buf.put_bytes(fill, width - data.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_parameter_layout() {
        let bytes = PcfParameter::int(MQIA_CURRENT_Q_DEPTH, 42).encode(Encoding::Little);
        assert_eq!(bytes.len(), MQCFIN_STRUC_LENGTH);
        assert_eq!(&bytes[0..4], &3i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &16i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &MQIA_CURRENT_Q_DEPTH.to_le_bytes());
        assert_eq!(&bytes[12..16], &42i32.to_le_bytes());
    }

    #[test]
    fn test_string_is_padded_and_trimmed() {
        let bytes = PcfParameter::string(MQCA_Q_NAME, "APP.Q").encode(Encoding::Big);
        assert_eq!(bytes.len(), MQCFST_STRUC_LENGTH_FIXED + 8);

        let (p, used) = decode_next(&bytes, 0, Encoding::Big).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(p.as_str(), Some("APP.Q"));
    }

    #[test]
    fn test_broker_style_blank_padded_string() {
        // Brokers return names padded to the full field width
        let padded = format!("{:<48}", "SYSTEM.DEF.SVRCONN");
        let bytes = PcfParameter::string(MQCACH_CHANNEL_NAME, &padded).encode(Encoding::Little);
        let (p, _) = decode_next(&bytes, 0, Encoding::Little).unwrap();
        assert_eq!(p.as_str(), Some("SYSTEM.DEF.SVRCONN"));
    }

    #[test]
    fn test_group_consumes_children() {
        let group = PcfParameter::group(
            MQGACF_MONITOR_ELEMENT,
            vec![
                PcfParameter::int(MQIAMO_MONITOR_ELEMENT, 3),
                PcfParameter::string(MQCAMO_MONITOR_DESC, "Interval total MQPUT count"),
            ],
        );
        let bytes = group.encode(Encoding::Little);
        let (decoded, used) = decode_next(&bytes, 0, Encoding::Little).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, group);
    }

    #[test]
    fn test_truncated_buffer_is_rejected() {
        let bytes = PcfParameter::int_list(MQIACF_Q_TIME_INDICATOR, &[1, 2]).encode(Encoding::Little);
        let err = decode_next(&bytes[..bytes.len() - 2], 0, Encoding::Little).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn test_latin1_string_does_not_fail_the_message() {
        let mut desc = b"Caf".to_vec();
        desc.push(0xE9);
        desc.extend_from_slice(b" orders");
        let param = PcfParameter {
            kind: MQCFT_STRING,
            code: MQCA_Q_DESC,
            value: PcfValue::Str(String::new()),
        };
        let mut raw = param.encode(Encoding::Little).to_vec();
        // Rewrite the string body by hand with the ISO-8859-1 bytes
        let padded = pad4(desc.len());
        raw.truncate(MQCFST_STRUC_LENGTH_FIXED);
        raw[4..8].copy_from_slice(&((MQCFST_STRUC_LENGTH_FIXED + padded) as i32).to_le_bytes());
        raw[16..20].copy_from_slice(&(desc.len() as i32).to_le_bytes());
        raw.extend_from_slice(&desc);
        raw.resize(MQCFST_STRUC_LENGTH_FIXED + padded, b' ');

        let (decoded, used) = decode_next(&raw, 0, Encoding::Little).unwrap();
        assert_eq!(used, raw.len());
        assert_eq!(decoded.as_str(), Some("Caf\u{e9} orders"));
    }

    #[test]
    fn test_deeply_nested_groups_are_rejected() {
        let mut raw = Vec::new();
        for _ in 0..1000 {
            for v in [MQCFT_GROUP, MQCFGR_STRUC_LENGTH as i32, MQGACF_MONITOR_CLASS, 1] {
                raw.extend_from_slice(&v.to_le_bytes());
            }
        }
        let err = decode_next(&raw, 0, Encoding::Little).unwrap_err();
        assert!(matches!(err, CodecError::TooDeep { limit: MAX_GROUP_DEPTH, .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut raw = PcfParameter::int(1, 1).encode(Encoding::Little).to_vec();
        raw[0..4].copy_from_slice(&99i32.to_le_bytes());
        let err = decode_next(&raw, 0, Encoding::Little).unwrap_err();
        assert_eq!(err, CodecError::UnknownType { kind: 99, offset: 0 });
    }

    #[test]
    fn test_message_decode_stops_at_parameter_count() {
        let cmd = PcfCommand::new(MQCMD_INQUIRE_Q_STATUS)
            .string(MQCA_Q_NAME, "APP.*")
            .int(MQIACF_Q_STATUS_TYPE, MQIACF_Q_STATUS)
            .int_list(MQIACF_Q_STATUS_ATTRS, &[MQIACF_ALL]);
        let bytes = cmd.encode(Encoding::Little);
        let msg = PcfMessage::decode(&bytes, Encoding::Little).unwrap();

        assert_eq!(msg.header.command, MQCMD_INQUIRE_Q_STATUS);
        assert_eq!(msg.header.parameter_count, 3);
        assert!(msg.header.is_last());
        assert_eq!(msg.find_str(MQCA_Q_NAME), Some("APP.*"));
        assert_eq!(msg.find_int(MQIACF_Q_STATUS_TYPE), Some(MQIACF_Q_STATUS as i64));
    }

    #[test]
    fn test_int64_list_index_access() {
        let p = PcfParameter::int64_list(MQIACH_NETWORK_TIME_INDICATOR, &[7, 42]);
        let bytes = p.encode(Encoding::Little);
        let (decoded, _) = decode_next(&bytes, 0, Encoding::Little).unwrap();
        assert_eq!(decoded.int_at(0), Some(7));
        assert_eq!(decoded.int_at(1), Some(42));
        assert_eq!(decoded.int_at(2), None);
    }

    #[test]
    fn test_encoding_from_descriptor() {
        assert_eq!(Encoding::from_mq(Encoding::Little.to_mq()), Encoding::Little);
        assert_eq!(Encoding::from_mq(Encoding::Big.to_mq()), Encoding::Big);
        assert_eq!(Encoding::from_mq(546), Encoding::Little);
        assert_eq!(Encoding::from_mq(273), Encoding::Big);
    }
}
