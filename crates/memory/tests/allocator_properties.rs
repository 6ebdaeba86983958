//! Property-based tests for allocators and byte strings using proptest
//!
//! These tests verify invariants that should hold for any sequence of
//! requests: blocks never overlap, content survives growth, views respect
//! bounds.

use std::collections::HashSet;

use buddy_memory::prelude::{
    Allocator, ByteBuilder, ByteString, PoolAllocator, PoolConfig, TempAllocator, heap,
};
use proptest::prelude::*;

fn sizes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..200, 1..40)
}

fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..20)
}

fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.0 + b.1 && b.0 < a.0 + a.1
}

// ===== ALLOCATOR PROPERTIES =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn temp_blocks_are_disjoint_and_aligned(sizes in sizes()) {
        let temp = TempAllocator::with_capacity(16 * 1024).expect("Failed to create allocator");
        let mut blocks: Vec<(usize, usize)> = Vec::new();

        for size in sizes {
            let ptr = temp.allocate(size).expect("fits in 16 KiB");
            let addr = ptr.as_ptr() as usize;
            prop_assert_eq!(addr % 8, 0);
            for &other in &blocks {
                prop_assert!(!overlaps((addr, size.max(1)), other));
            }
            blocks.push((addr, size.max(1)));
        }
    }

    #[test]
    fn pool_blocks_keep_their_content(sizes in sizes()) {
        let pool = PoolAllocator::with_config(heap(), PoolConfig::debug().with_initial_capacity(64))
            .expect("Failed to create pool");

        let strings: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| ByteString::copy_from(&pool, &vec![i as u8; size]))
            .collect();

        for (i, (s, &size)) in strings.iter().zip(&sizes).enumerate() {
            prop_assert_eq!(s.len(), size);
            prop_assert!(s.as_bytes().expect("allocated").iter().all(|&b| b == i as u8));
        }
    }

    #[test]
    fn mark_restore_returns_to_same_usage(before in sizes(), after in sizes()) {
        let mut temp = TempAllocator::with_capacity(32 * 1024).expect("Failed to create allocator");
        for size in before {
            temp.allocate(size).expect("fits");
        }

        let mark = temp.mark();
        let used = temp.used();
        for size in after {
            temp.allocate(size).expect("fits");
        }

        temp.restore(mark);
        prop_assert_eq!(temp.used(), used);
    }

    #[test]
    fn signatures_are_unique(count in 2usize..32) {
        let temps: Vec<_> = (0..count)
            .map(|_| TempAllocator::with_capacity(64).expect("Failed to create allocator"))
            .collect();
        let signatures: HashSet<_> = temps.iter().map(|t| t.signature().raw()).collect();
        prop_assert_eq!(signatures.len(), count);
    }
}

// ===== STRING PROPERTIES =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn builder_equals_concatenation(parts in chunks(), initial in 0usize..32) {
        let mut builder = ByteBuilder::with_capacity(heap(), initial);
        for part in &parts {
            builder.append(part).expect("heap never runs out here");
        }

        let expected: Vec<u8> = parts.concat();
        let s = builder.finish();
        prop_assert_eq!(s.as_bytes(), Some(expected.as_slice()));
    }

    #[test]
    fn builder_capacity_is_power_of_two_multiple(parts in chunks()) {
        let mut builder = ByteBuilder::with_capacity(heap(), 8);
        for part in &parts {
            builder.append(part).expect("append");
            prop_assert!(builder.capacity() >= builder.len());
            prop_assert!((builder.capacity() / 8).is_power_of_two());
        }
    }

    #[test]
    fn views_respect_bounds(bytes in prop::collection::vec(any::<u8>(), 0..64), start in 0usize..80, end in 0usize..80) {
        let s = ByteString::copy_from(heap(), &bytes);
        let view = s.view(start, end);

        if start <= end && end <= bytes.len() {
            prop_assert_eq!(view.as_bytes(), Some(&bytes[start..end]));
        } else {
            prop_assert!(view.is_err());
            prop_assert_eq!(view.len(), 0);
        }
    }

    #[test]
    fn replace_removes_every_occurrence(
        bytes in prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c']), 0..64),
    ) {
        let s = ByteString::borrowed(&bytes);
        let replaced = s.replace(heap(), &ByteString::borrowed(b"ab"), &ByteString::borrowed(b"x"));
        let occurrences = count_pattern(&bytes, b"ab");

        prop_assert_eq!(replaced.count(b'x'), occurrences);
        prop_assert_eq!(replaced.len(), bytes.len() - occurrences);
    }
}

fn count_pattern(haystack: &[u8], needle: &[u8]) -> usize {
    let mut count = 0;
    let mut at = 0;
    while at + needle.len() <= haystack.len() {
        if &haystack[at..at + needle.len()] == needle {
            count += 1;
            at += needle.len();
        } else {
            at += 1;
        }
    }
    count
}
