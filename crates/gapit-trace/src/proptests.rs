use crate::{align_up, compute_layout, ArchitectureProfile, FieldKind, LayoutEntry, TraceReader};
use proptest::prelude::*;

const MAX_FIELDS: usize = 24;
const MAX_ARRAY_LEN: u32 = 16;

fn profile_strategy() -> impl Strategy<Value = ArchitectureProfile> {
    prop_oneof![
        Just(ArchitectureProfile::X86),
        Just(ArchitectureProfile::X86_64),
        Just(ArchitectureProfile::ARMV7A),
        Just(ArchitectureProfile::ARM64),
    ]
}

fn kind_strategy() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::U32),
        Just(FieldKind::SizeT),
        Just(FieldKind::Pointer),
        Just(FieldKind::Handle),
        Just(FieldKind::U64),
        Just(FieldKind::DeviceSize),
        Just(FieldKind::Bool32),
        Just(FieldKind::F32),
        Just(FieldKind::Char),
    ]
}

/// A logical field: a scalar, or an array of `n` scalars.
fn member_strategy() -> impl Strategy<Value = (FieldKind, Option<u32>)> {
    (
        kind_strategy(),
        prop::option::of(0u32..=MAX_ARRAY_LEN),
    )
}

fn flatten(members: &[(FieldKind, Option<u32>)]) -> Vec<LayoutEntry> {
    let mut entries = Vec::new();
    for &(kind, count) in members {
        if let Some(count) = count {
            entries.push(LayoutEntry::Array);
            entries.push(LayoutEntry::Count(count));
        }
        entries.push(LayoutEntry::Field(kind));
    }
    entries
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn layouts_are_aligned_ordered_and_non_overlapping(
        profile in profile_strategy(),
        members in prop::collection::vec(member_strategy(), 0..MAX_FIELDS),
    ) {
        let entries = flatten(&members);
        let offsets = compute_layout(&profile, &entries).unwrap();
        prop_assert_eq!(offsets.len(), members.len());

        let mut previous_end = 0u64;
        for (slot, &(kind, count)) in offsets.slots().iter().zip(&members) {
            prop_assert_eq!(slot.kind, kind);
            prop_assert_eq!(slot.count, count);
            prop_assert_eq!(slot.offset % kind.alignment(&profile), 0);
            prop_assert!(slot.offset >= previous_end);
            // No more padding than the alignment requires.
            prop_assert_eq!(Ok(slot.offset), align_up(previous_end, kind.alignment(&profile)));
            previous_end = slot.offset + slot.byte_len(&profile);
        }
        prop_assert_eq!(offsets.end(), previous_end);
        prop_assert!(offsets.stride() >= offsets.end());

        // Same input, same answer.
        prop_assert_eq!(compute_layout(&profile, &entries).unwrap(), offsets);
    }

    #[test]
    fn wide_profiles_never_shrink_offsets(
        members in prop::collection::vec(member_strategy(), 0..MAX_FIELDS),
    ) {
        let entries = flatten(&members);
        let x86 = compute_layout(&ArchitectureProfile::X86, &entries).unwrap();
        let armv7a = compute_layout(&ArchitectureProfile::ARMV7A, &entries).unwrap();
        let x86_64 = compute_layout(&ArchitectureProfile::X86_64, &entries).unwrap();
        let arm64 = compute_layout(&ArchitectureProfile::ARM64, &entries).unwrap();

        for (a, b) in x86.offsets().zip(armv7a.offsets()) {
            prop_assert!(a <= b);
        }
        for (a, b) in armv7a.offsets().zip(x86_64.offsets()) {
            prop_assert!(a <= b);
        }
        // Both 64-bit ABIs share the same rules.
        prop_assert_eq!(x86_64, arm64);
    }

    #[test]
    fn align_up_is_the_smallest_aligned_bound(n in 0u64..1 << 40, shift in 0u32..6) {
        let alignment = 1u64 << shift;
        let aligned = align_up(n, alignment).unwrap();
        prop_assert_eq!(aligned % alignment, 0);
        prop_assert!(aligned >= n);
        prop_assert!(aligned - n < alignment);
    }

    #[test]
    fn reader_never_panics_on_arbitrary_text(
        lines in prop::collection::vec("[ -~]{0,48}", 0..12),
    ) {
        let text = lines.join("\n");
        let reader = TraceReader::new(text.as_bytes());
        // Stops at the first error.
        let mut results = reader.collect::<Vec<_>>();
        if let Some(pos) = results.iter().position(Result::is_err) {
            prop_assert_eq!(pos + 1, results.len());
            results.pop();
        }
    }
}
