//! Reading layout-described structures out of a call's observations.

use crate::arch::ArchitectureProfile;
use crate::call::CallRecord;
use crate::error::{DecodeError, LayoutError, ObservationSide};
use crate::layout::{compute_layout, FieldKind, FieldSlot, LayoutEntry, StructOffsets};

/// Assembles little-endian bytes into an integer. Only the first eight bytes are used.
pub fn little_endian_to_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// A layout with a name per field.
///
/// ```
/// use gapit_trace::{FieldKind, StructLayout};
///
/// let write_descriptor_set = StructLayout::new()
///     .field("sType", FieldKind::U32)
///     .field("pNext", FieldKind::Pointer)
///     .field("dstSet", FieldKind::Handle)
///     .array("padding", 2, FieldKind::U32);
/// assert_eq!(write_descriptor_set.index_of("dstSet"), Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructLayout {
    names: Vec<String>,
    entries: Vec<LayoutEntry>,
}

impl StructLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.names.push(name.into());
        self.entries.push(LayoutEntry::Field(kind));
        self
    }

    pub fn array(mut self, name: impl Into<String>, count: u32, kind: FieldKind) -> Self {
        self.names.push(name.into());
        self.entries.extend([
            LayoutEntry::Array,
            LayoutEntry::Count(count),
            LayoutEntry::Field(kind),
        ]);
        self
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn offsets(&self, profile: &ArchitectureProfile) -> Result<StructOffsets, LayoutError> {
        compute_layout(profile, &self.entries)
    }
}

/// A structure at `base` inside one side of a call's observations.
#[derive(Clone, Debug)]
pub struct StructView<'a> {
    call: &'a CallRecord,
    side: ObservationSide,
    base: u64,
    layout: &'a StructLayout,
    profile: ArchitectureProfile,
    offsets: StructOffsets,
}

impl<'a> StructView<'a> {
    pub fn new(
        call: &'a CallRecord,
        side: ObservationSide,
        base: u64,
        layout: &'a StructLayout,
        profile: &ArchitectureProfile,
    ) -> Result<Self, DecodeError> {
        let offsets = layout.offsets(profile)?;
        Ok(Self {
            call,
            side,
            base,
            layout,
            profile: *profile,
            offsets,
        })
    }

    /// Same layout, `index` structs further along (for arrays of structs).
    pub fn at_index(&self, index: u64) -> Result<Self, DecodeError> {
        let base = index
            .checked_mul(self.offsets.stride())
            .and_then(|distance| self.base.checked_add(distance))
            .ok_or(DecodeError::AddressOverflow {
                base: self.base,
                offset: u128::from(index) * u128::from(self.offsets.stride()),
            })?;
        Ok(Self {
            base,
            ..self.clone()
        })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn offsets(&self) -> &StructOffsets {
        &self.offsets
    }

    fn slot(&self, name: &str) -> Result<&FieldSlot, DecodeError> {
        let index = self
            .layout
            .index_of(name)
            .ok_or_else(|| DecodeError::UnknownField(name.to_string()))?;
        Ok(self.offsets.slot(index)?)
    }

    fn address_of(&self, slot: &FieldSlot) -> Result<u64, DecodeError> {
        self.base
            .checked_add(slot.offset)
            .ok_or(DecodeError::AddressOverflow {
                base: self.base,
                offset: slot.offset.into(),
            })
    }

    /// Raw bytes of a field (every element for arrays).
    pub fn bytes_field(&self, name: &str) -> Result<&'a [u8], DecodeError> {
        let slot = self.slot(name)?;
        let address = self.address_of(slot)?;
        Ok(self
            .call
            .memory(self.side, address, slot.byte_len(&self.profile))?)
    }

    /// A scalar field as an unsigned integer; the first element of an array field.
    pub fn u64_field(&self, name: &str) -> Result<u64, DecodeError> {
        let slot = self.slot(name)?;
        let size = slot.kind.size(&self.profile);
        let bytes = self.call.memory(self.side, self.address_of(slot)?, size)?;
        Ok(little_endian_to_u64(bytes))
    }

    pub fn f32_field(&self, name: &str) -> Result<f32, DecodeError> {
        let value = self.u64_field(name)?;
        Ok(f32::from_bits(value as u32))
    }

    pub fn array_field(&self, name: &str) -> Result<Vec<u64>, DecodeError> {
        let slot = self.slot(name)?;
        if slot.count.is_none() {
            return Err(DecodeError::NotAnArray(name.to_string()));
        }
        let size = usize::try_from(slot.kind.size(&self.profile)).unwrap_or(8);
        let bytes = self.bytes_field(name)?;
        Ok(bytes.chunks_exact(size).map(little_endian_to_u64).collect())
    }
}
