//! Per-architecture field offsets for C structures captured in a trace.
//!
//! A layout is a flat sequence of [`LayoutEntry`] values. Scalars are written as
//! [`LayoutEntry::Field`]; a fixed-size array is written as three consecutive entries:
//! [`LayoutEntry::Array`], [`LayoutEntry::Count`] and the element's [`LayoutEntry::Field`].
//! Only one level of array nesting is supported, and array elements must be scalars.

use crate::arch::ArchitectureProfile;
use crate::error::LayoutError;

/// Scalar field kinds understood by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    U32,
    /// `size_t`: pointer sized and pointer aligned.
    SizeT,
    Pointer,
    /// Non-dispatchable 64-bit handle.
    Handle,
    U64,
    /// `VkDeviceSize`.
    DeviceSize,
    /// `VkBool32`.
    Bool32,
    F32,
    Char,
}

impl FieldKind {
    pub fn size(self, profile: &ArchitectureProfile) -> u64 {
        match self {
            Self::U32 | Self::Bool32 | Self::F32 => 4,
            Self::SizeT | Self::Pointer => profile.pointer_size().into(),
            Self::Handle | Self::U64 | Self::DeviceSize => 8,
            Self::Char => 1,
        }
    }

    pub fn alignment(self, profile: &ArchitectureProfile) -> u64 {
        match self {
            Self::U32 | Self::Bool32 | Self::F32 => 4,
            Self::SizeT | Self::Pointer => profile.pointer_size().into(),
            // The one place the ABI split shows up: 8-byte scalars are 4-aligned on x86 but
            // 8-aligned on armv7a.
            Self::Handle | Self::U64 | Self::DeviceSize => profile.u64_alignment().into(),
            Self::Char => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutEntry {
    Field(FieldKind),
    /// Marks the start of a fixed-size array; must be followed by `Count` and `Field`.
    Array,
    Count(u32),
}

/// Rounds `n` up to the next multiple of `alignment`.
pub fn align_up(n: u64, alignment: u64) -> Result<u64, LayoutError> {
    if alignment == 0 {
        return Err(LayoutError::ZeroAlignment);
    }
    let rem = n % alignment;
    if rem == 0 {
        return Ok(n);
    }
    n.checked_add(alignment - rem)
        .ok_or(LayoutError::OffsetOverflow)
}

/// One laid-out field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSlot {
    pub offset: u64,
    pub kind: FieldKind,
    /// Element count for array fields, `None` for scalars.
    pub count: Option<u32>,
}

impl FieldSlot {
    /// Bytes reserved by this field (all elements for arrays).
    pub fn byte_len(&self, profile: &ArchitectureProfile) -> u64 {
        self.kind.size(profile) * u64::from(self.count.unwrap_or(1))
    }
}

/// Offsets of every non-marker field of a layout, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructOffsets {
    slots: Vec<FieldSlot>,
    end: u64,
    stride: u64,
}

impl StructOffsets {
    pub fn offset_of(&self, index: usize) -> Result<u64, LayoutError> {
        self.slot(index).map(|slot| slot.offset)
    }

    pub fn slot(&self, index: usize) -> Result<&FieldSlot, LayoutError> {
        self.slots.get(index).ok_or(LayoutError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots.iter().map(|slot| slot.offset)
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    /// First byte past the last field, without tail padding.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Distance between consecutive elements of an array of this struct.
    pub fn stride(&self) -> u64 {
        self.stride
    }
}

enum State {
    Element,
    ArrayCount,
    ArrayMember(u32),
}

/// Lays out `entries` for `profile`.
pub fn compute_layout(
    profile: &ArchitectureProfile,
    entries: &[LayoutEntry],
) -> Result<StructOffsets, LayoutError> {
    let mut slots = Vec::with_capacity(entries.len());
    let mut offset = 0u64;
    let mut max_alignment = 1u64;
    let mut state = State::Element;

    for (position, entry) in entries.iter().enumerate() {
        state = match (state, *entry) {
            (State::Element, LayoutEntry::Array) => State::ArrayCount,
            (State::Element, LayoutEntry::Field(kind)) => {
                let alignment = kind.alignment(profile);
                offset = align_up(offset, alignment)?;
                slots.push(FieldSlot {
                    offset,
                    kind,
                    count: None,
                });
                offset = offset
                    .checked_add(kind.size(profile))
                    .ok_or(LayoutError::OffsetOverflow)?;
                max_alignment = max_alignment.max(alignment);
                State::Element
            }
            (State::Element, LayoutEntry::Count(_)) => {
                return Err(LayoutError::MalformedLayout {
                    position,
                    reason: "array count outside of an array marker",
                });
            }
            (State::ArrayCount, LayoutEntry::Count(count)) => State::ArrayMember(count),
            (State::ArrayCount, _) => {
                return Err(LayoutError::MalformedLayout {
                    position,
                    reason: "array marker must be followed by an element count",
                });
            }
            (State::ArrayMember(count), LayoutEntry::Field(kind)) => {
                let alignment = kind.alignment(profile);
                offset = align_up(offset, alignment)?;
                slots.push(FieldSlot {
                    offset,
                    kind,
                    count: Some(count),
                });
                offset = kind
                    .size(profile)
                    .checked_mul(u64::from(count))
                    .and_then(|len| offset.checked_add(len))
                    .ok_or(LayoutError::OffsetOverflow)?;
                max_alignment = max_alignment.max(alignment);
                State::Element
            }
            (State::ArrayMember(_), _) => {
                return Err(LayoutError::MalformedLayout {
                    position,
                    reason: "array element must be a scalar field kind",
                });
            }
        };
    }

    if !matches!(state, State::Element) {
        return Err(LayoutError::MalformedLayout {
            position: entries.len(),
            reason: "layout ends inside an array marker",
        });
    }

    let stride = align_up(offset, max_alignment)?;
    Ok(StructOffsets {
        slots,
        end: offset,
        stride,
    })
}
