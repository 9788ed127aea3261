//! Parser for the text produced by `gapit dump -observations`, plus the struct-layout rules
//! needed to pull typed values out of the memory each call observed.
//!
//! A dump is a banner line followed by one block per call: a header line, an optional line of
//! read/write ranges, labeled extras, and one line of bytes per observed range. [`TraceReader`]
//! turns any [`std::io::BufRead`] into a stream of [`CallRecord`]s; [`parse_trace_file`] does
//! the same for a trace on disk by running `gapit` as a child process.

#![forbid(unsafe_code)]

mod arch;
mod call;
pub mod constants;
mod cursor;
mod dump;
mod error;
mod grammar;
mod layout;
mod reader;
mod view;

pub use arch::{ArchitectureProfile, ARCHITECTURE_CALL};
pub use call::{Attribute, CallRecord, Extra, MemoryObservation, ParamFormat, ParamValue};
pub use cursor::CallCursor;
pub use dump::{parse_trace_file, DumpCommand, DumpProcess, DEFAULT_PROGRAM, PROGRAM_ENV};
pub use error::{
    CursorError, DecodeError, LayoutError, LookupError, ObservationSide, TraceReadError,
};
pub use layout::{align_up, compute_layout, FieldKind, FieldSlot, LayoutEntry, StructOffsets};
pub use reader::TraceReader;
pub use view::{little_endian_to_u64, StructLayout, StructView};

#[cfg(test)]
mod proptests;
