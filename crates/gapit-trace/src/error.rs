use std::fmt;
use std::io;

use thiserror::Error;

/// Which observation list a memory query ran against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObservationSide {
    Read,
    Write,
}

impl fmt::Display for ObservationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Fatal errors raised while turning dump output into call records.
///
/// The producer is trusted, so none of these are recoverable: once the reader yields one, the
/// stream is finished.
#[derive(Debug, Error)]
pub enum TraceReadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed dump output at line {line_number} ({reason}): {line:?}")]
    MalformedInput {
        line_number: usize,
        line: String,
        reason: &'static str,
    },

    #[error("failed to start dump command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("dump command `{program}` exited with {status}")]
    DumpFailed { program: String, status: String },
}

/// A query against a call record, an extra or a call stream found nothing to return.
///
/// These are soft failures. The `Display` output carries enough context (call index and name,
/// address, length) to be used directly as a test failure message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("could not find parameter {name} on call [{call_index}] {call_name}")]
    MissingParameter {
        call_index: u64,
        call_name: String,
        name: String,
    },

    #[error("could not find extra {name} on call [{call_index}] {call_name}")]
    MissingExtra {
        call_index: u64,
        call_name: String,
        name: String,
    },

    #[error(
        "could not find a {side} observation on call [{call_index}] {call_name} starting at 0x{address:x} containing {length} bytes"
    )]
    MissingObservationRange {
        call_index: u64,
        call_name: String,
        side: ObservationSide,
        address: u64,
        length: u64,
    },

    #[error("call [{call_index}] {call_name} has no return value")]
    MissingReturnValue { call_index: u64, call_name: String },

    #[error(
        "value {value:?} of {name} on call [{call_index}] {call_name} is not a valid {expected}"
    )]
    InvalidValue {
        call_index: u64,
        call_name: String,
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("could not find call #{nth} of type {name}{}", found_suffix(.found))]
    MissingCall {
        name: String,
        nth: usize,
        found: Option<String>,
    },
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(found) => format!(" (next call was {found})"),
        None => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("malformed struct layout at entry {position}: {reason}")]
    MalformedLayout {
        position: usize,
        reason: &'static str,
    },

    #[error("field index {index} out of range (layout has {len} fields)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unsupported architecture profile: {field}={value}")]
    UnsupportedProfile { field: &'static str, value: i64 },

    #[error("alignment must be non-zero")]
    ZeroAlignment,

    #[error("struct offset overflows a 64-bit address")]
    OffsetOverflow,
}

/// Errors from decoding a structure out of a call's observations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("struct has no field named {0}")]
    UnknownField(String),

    #[error("field {0} is not an array")]
    NotAnArray(String),

    #[error("address 0x{base:x} + 0x{offset:x} overflows a 64-bit address")]
    AddressOverflow { base: u64, offset: u128 },
}

/// Errors from walking a call stream by name.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error(transparent)]
    Read(#[from] TraceReadError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
