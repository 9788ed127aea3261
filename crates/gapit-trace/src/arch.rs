use crate::call::CallRecord;
use crate::error::{DecodeError, LayoutError, LookupError};

/// Name of the pseudo-call the capture tool emits to describe the traced process.
pub const ARCHITECTURE_CALL: &str = "architecture";

/// Pointer width and ABI alignment rules of the traced process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArchitectureProfile {
    pointer_size: u32,
    int_size: u32,
    u64_alignment: u32,
}

impl ArchitectureProfile {
    pub const X86: Self = Self::preset(4, 4);
    pub const X86_64: Self = Self::preset(8, 8);
    /// 32-bit ARM (AAPCS) aligns 8-byte scalars to 8 even though pointers are 4 bytes.
    pub const ARMV7A: Self = Self::preset(4, 8);
    pub const ARM64: Self = Self::preset(8, 8);

    const fn preset(pointer_size: u32, u64_alignment: u32) -> Self {
        Self {
            pointer_size,
            int_size: 4,
            u64_alignment,
        }
    }

    pub fn new(pointer_size: u32, u64_alignment: u32) -> Result<Self, LayoutError> {
        if !matches!(pointer_size, 4 | 8) {
            return Err(LayoutError::UnsupportedProfile {
                field: "pointer_size",
                value: pointer_size.into(),
            });
        }
        if !matches!(u64_alignment, 4 | 8) {
            return Err(LayoutError::UnsupportedProfile {
                field: "u64_alignment",
                value: u64_alignment.into(),
            });
        }
        Ok(Self::preset(pointer_size, u64_alignment))
    }

    /// Builds the profile from the capture's `architecture` call.
    ///
    /// Reads `PointerSize`, the optional `IntegerSize` (defaults to 4) and the `U64Alignment`
    /// key of the `FieldAlignments` extra, all decimal.
    pub fn from_call(call: &CallRecord) -> Result<Self, DecodeError> {
        let pointer_size = call.get_as_int("PointerSize")?;
        let int_size = match call.get_as_int("IntegerSize") {
            Ok(v) => v,
            Err(LookupError::MissingParameter { .. }) => 4,
            Err(err) => return Err(err.into()),
        };
        let u64_alignment = call
            .get_extra("FieldAlignments")?
            .get_as_int("U64Alignment")?;

        if int_size != 4 {
            return Err(LayoutError::UnsupportedProfile {
                field: "int_size",
                value: int_size,
            }
            .into());
        }
        let pointer_size = narrow("pointer_size", pointer_size)?;
        let u64_alignment = narrow("u64_alignment", u64_alignment)?;
        Ok(Self::new(pointer_size, u64_alignment)?)
    }

    pub fn pointer_size(&self) -> u32 {
        self.pointer_size
    }

    pub fn int_size(&self) -> u32 {
        self.int_size
    }

    pub fn u64_alignment(&self) -> u32 {
        self.u64_alignment
    }
}

fn narrow(field: &'static str, value: i64) -> Result<u32, LayoutError> {
    u32::try_from(value).map_err(|_| LayoutError::UnsupportedProfile { field, value })
}
