//! Pool allocator integration tests: chunk growth, in-place extension and
//! interaction with builders

use buddy_memory::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn debug_pool(initial: usize) -> PoolAllocator<'static> {
    PoolAllocator::with_config(heap(), PoolConfig::debug().with_initial_capacity(initial))
        .expect("Failed to create pool")
}

#[test]
fn test_builder_growth_takes_one_new_chunk() {
    let pool = debug_pool(64);

    let s = {
        let mut builder = ByteBuilder::new(&pool);
        // The default 64-byte buffer fills the first chunk exactly
        assert_eq!(pool.growth_count(), 0);

        builder.append(&[1; 40]).expect("append");
        assert_eq!(pool.growth_count(), 0);

        builder.append(&[2; 40]).expect("append");
        builder.finish()
    };

    assert_eq!(pool.growth_count(), 1);
    assert_eq!(pool.chunk_count(), 2);
    assert_eq!(pool.capacity(), 128);
    assert_eq!(pool.available(), 0);

    let bytes = s.as_bytes().expect("not an error");
    assert_eq!(bytes.len(), 80);
    assert_eq!(&bytes[..40], &[1; 40][..]);
    assert_eq!(&bytes[40..], &[2; 40][..]);
}

#[test]
fn test_memory_usage_spans_all_chunks() {
    let pool = debug_pool(64);
    pool.allocate(40).expect("Allocation failed");
    pool.allocate(40).expect("Allocation failed");
    assert_eq!(pool.chunk_count(), 2);

    let usage = pool.memory_usage();
    assert_eq!(usage.used, pool.used());
    assert_eq!(usage.total, Some(pool.footprint()));
    assert_eq!(usage.available, Some(pool.footprint() - pool.used()));
    assert_eq!(pool.total_capacity(), 64 + 128);
}

#[rstest]
#[case(64, 2, 1000, 1024)]
#[case(64, 4, 1000, 1024)]
#[case(100, 3, 500, 900)]
#[case(4096, 2, 10, 4096)]
fn test_chunk_capacity_after_large_request(
    #[case] initial: usize,
    #[case] factor: usize,
    #[case] request: usize,
    #[case] expected: usize,
) {
    let pool = PoolAllocator::with_config(
        heap(),
        PoolConfig::production()
            .with_initial_capacity(initial)
            .with_growth_factor(factor),
    )
    .expect("Failed to create pool");

    pool.allocate(request).expect("Allocation failed");
    assert_eq!(pool.capacity(), expected);
}

#[test]
fn test_growth_limit_is_reported() {
    let pool = PoolAllocator::with_config(
        heap(),
        PoolConfig::debug()
            .with_initial_capacity(64)
            .with_max_capacity(256),
    )
    .expect("Failed to create pool");

    pool.allocate(200).expect("256-byte chunk is allowed");
    let err = pool.allocate(300).expect_err("512-byte chunk is over the limit");

    assert_eq!(err.code(), "MEM:POOL:LIMIT");
    assert_eq!(pool.statistics().failed_allocations, 1);
}

#[test]
fn test_blocks_survive_growth() {
    let pool = debug_pool(64);
    let mut blocks = Vec::new();

    for i in 0..32u8 {
        let s = ByteString::copy_from(&pool, &[i; 24]);
        blocks.push(s);
    }

    assert!(pool.growth_count() > 0);
    for (i, s) in blocks.iter().enumerate() {
        assert_eq!(s.as_bytes(), Some(&[i as u8; 24][..]));
    }
}

#[test]
fn test_tail_free_lets_next_allocation_reuse_space() {
    let pool = debug_pool(256);
    let a = pool.allocate(40).expect("Allocation failed");
    let used = pool.used();

    let b = pool.allocate(40).expect("Allocation failed");
    unsafe { pool.deallocate(b) }.expect("Deallocation failed");
    assert_eq!(pool.used(), used);

    let c = pool.allocate(40).expect("Allocation failed");
    assert_eq!(b, c);

    // `a` is not the tail; freeing it is accounted but reclaims nothing
    unsafe { pool.deallocate(a) }.expect("Deallocation failed");
    assert_eq!(pool.statistics().deallocation_count, 2);
    assert!(pool.used() > used);
}

#[test]
fn test_reset_keeps_first_chunk() {
    let mut pool = debug_pool(64);
    for _ in 0..10 {
        pool.allocate(50).expect("Allocation failed");
    }
    let growths = pool.growth_count();
    assert!(pool.chunk_count() > 1);

    pool.reset();
    assert_eq!(pool.chunk_count(), 1);
    assert_eq!(pool.capacity(), 64);
    assert_eq!(pool.used(), 0);
    assert_eq!(pool.growth_count(), growths);
}

#[test]
fn test_pool_backed_by_arena() {
    let arena = Arena::new(heap(), 4096).expect("Failed to create arena");
    let pool = PoolAllocator::new(&arena, 128).expect("Failed to create pool");

    let s = ByteString::copy_from(&pool, &[7u8; 300]);
    assert_eq!(s.len(), 300);
    assert_eq!(pool.growth_count(), 1);
    // Both chunks came out of the arena
    let used = arena.used();
    assert!(used >= 16 + 128 + 16 + 512);

    // The arena keeps the chunks until its own reset
    drop(s);
    drop(pool);
    assert_eq!(arena.used(), used);
    assert_eq!(arena.statistics().deallocation_count, 0);
}

#[test]
fn test_config_macro_builds_valid_pool() {
    let config = buddy_memory::pool_config! {
        initial_capacity: 256,
        growth_factor: 3,
    };
    let pool = PoolAllocator::with_config(heap(), config).expect("Failed to create pool");
    assert_eq!(pool.config().growth_factor, 3);
}

#[rstest]
#[case::zero_capacity(PoolConfig::default().with_initial_capacity(0))]
#[case::factor_one(PoolConfig::default().with_growth_factor(1))]
#[case::limit_below_initial(PoolConfig::default().with_initial_capacity(512).with_max_capacity(256))]
fn test_invalid_configs_are_rejected(#[case] config: PoolConfig) {
    let err = PoolAllocator::with_config(heap(), config).expect_err("invalid config");
    assert_eq!(err.code(), "MEM:CONFIG:INVALID");
}
