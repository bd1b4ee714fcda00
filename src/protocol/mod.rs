//! PCF administrative protocol
//!
//! Wire codec for command and response messages, the protocol constants the
//! collector relies on, and the resource-statistics topic tree.

pub mod constants;
pub mod pcf;
pub mod topics;

pub use pcf::{
    decode_next, encode_parameter, CodecError, Encoding, PcfCommand, PcfHeader, PcfMessage,
    PcfParameter, PcfValue,
};
pub use topics::{validate_object_name, ValidationError};
