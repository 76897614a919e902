use ahash::AHasher;
use cuckoo_table::{
    CuckooTable, CuckooTableBuilder, DEFAULT_CAPACITY, Error, NOT_FOUND,
};
use rand::rngs::StdRng;
use test_log::test;

// Helper function to create test data
fn test_items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("test_item_{i}")).collect()
}

#[test]
fn test_new_table() {
    let table = CuckooTable::new(1000);
    assert_eq!(table.len(), 0);
    assert!(table.is_empty());
    assert_eq!(table.capacity(), 1024); // Rounded up to power of 2
    assert_eq!(table.slot_count(), 4096);
    assert_eq!(table.load_factor(), 0.0);
}

#[test]
fn test_capacity_rounding() {
    assert_eq!(CuckooTable::new(5).capacity(), 8);
    assert_eq!(CuckooTable::new(16).capacity(), 16);
    assert_eq!(CuckooTable::new(0).capacity(), 1);
    assert_eq!(CuckooTable::new(1).capacity(), 1);
    assert_eq!(CuckooTable::new(17).capacity(), 32);
}

#[test]
fn test_default_table() {
    let table = CuckooTable::default();
    assert_eq!(table.capacity(), DEFAULT_CAPACITY);
    assert_eq!(table.bucket_size(), 4);
    assert_eq!(table.fingerprint_len(), 1);
    assert_eq!(table.max_kicks(), 500);
    assert!(table.is_empty());
}

#[test]
fn test_builder_custom_config() {
    let table = CuckooTable::builder()
        .capacity(2048)
        .fingerprint_len(2)
        .bucket_size(2)
        .max_kicks(100)
        .seed(5)
        .build()
        .unwrap();

    assert_eq!(table.len(), 0);
    assert_eq!(table.capacity(), 2048);
    assert_eq!(table.slot_count(), 4096);
    assert_eq!(table.fingerprint_len(), 2);
    assert_eq!(table.bucket_size(), 2);
    assert_eq!(table.max_kicks(), 100);
}

#[test]
fn test_builder_validation_invalid_fingerprint_len() {
    for len in [0, 9, 16] {
        let result = CuckooTable::builder().fingerprint_len(len).build();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("fingerprint_len must be between 1 and 8")
        );
    }
}

#[test]
fn test_builder_validation_zero_bucket_size() {
    let result = CuckooTable::builder().bucket_size(0).build();

    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("bucket_size must be greater than zero")
    );
}

#[test]
fn test_builder_zero_capacity_rounds_up() {
    let table = CuckooTable::builder().capacity(0).build().unwrap();
    assert_eq!(table.capacity(), 1);
}

#[test]
fn test_empty_table_operations() {
    let mut table = CuckooTable::new(1024);

    assert!(!table.contains("nonexistent"));
    assert_eq!(table.get("nonexistent"), None);
    assert_eq!(table.get("nonexistent").unwrap_or(NOT_FOUND), 0.0);
    assert_eq!(table.count("nonexistent"), 0);
    assert!(!table.remove("nonexistent"));
    assert_eq!(table.len(), 0);
    assert!(table.is_empty());
}

#[test]
fn test_basic_insert_get() {
    let mut table = CuckooTable::new(1024);
    let key = "test_item";

    assert!(!table.contains(key));
    assert!(table.insert(key, 42.5).is_ok());
    assert!(table.contains(key));
    assert_eq!(table.get(key), Some(42.5));
    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
}

#[test]
fn test_two_keys_in_small_table() {
    let mut table = CuckooTable::with_seed(16, 1);
    assert!(table.insert("wwt", 100.0).is_ok());
    assert!(table.insert("ksdjkf", 239.0).is_ok());

    let same_fingerprint = table.fingerprint("wwt") == table.fingerprint("ksdjkf");
    let (a, b) = table.candidate_buckets("wwt");
    let (c, d) = table.candidate_buckets("ksdjkf");
    let same_buckets = (a.min(b), a.max(b)) == (c.min(d), c.max(d));

    if same_fingerprint && same_buckets {
        // Indistinguishable keys: both lookups see the same entries
        let value = table.get("wwt").unwrap();
        assert!(value == 100.0 || value == 239.0);
        assert_eq!(table.get("ksdjkf"), Some(value));
    } else {
        assert_eq!(table.get("wwt"), Some(100.0));
        assert_eq!(table.get("ksdjkf"), Some(239.0));
    }
}

#[test]
fn test_get_is_idempotent() {
    let mut table = CuckooTable::new(64);
    for (i, item) in test_items(50).iter().enumerate() {
        assert!(table.insert(item, i as f64).is_ok());
    }
    for item in &test_items(100) {
        let first = table.get(item);
        assert_eq!(table.get(item), first);
        assert_eq!(table.contains(item), first.is_some());
    }
}

#[test]
fn test_insert_duplicate_keys() {
    let mut table = CuckooTable::new(1024);
    let key = "duplicate_item";

    // Insert same key multiple times
    assert!(table.insert(key, 1.0).is_ok());
    assert!(table.insert(key, 2.0).is_ok());
    assert!(table.insert(key, 3.0).is_ok());

    assert!(table.contains(key));
    assert_eq!(table.count(key), 3);
    assert_eq!(table.len(), 3);
}

#[test]
fn test_insert_unique() {
    let mut table = CuckooTable::new(1024);
    let key = "unique_item";

    // First insertion should succeed
    assert_eq!(table.insert_unique(key, 1.0), Ok(true));
    assert_eq!(table.count(key), 1);

    // Second insertion should return false and leave the first value alone
    assert_eq!(table.insert_unique(key, 2.0), Ok(false));
    assert_eq!(table.count(key), 1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(key), Some(1.0));
}

#[test]
fn test_insert_unique_rejects_colliding_key() {
    let mut table = CuckooTable::builder()
        .capacity(1)
        .bucket_size(4)
        .build()
        .unwrap();
    assert_eq!(table.insert_unique("first", 1.0), Ok(true));

    // With a single bucket, any key sharing the fingerprint is reported present
    let colliding = (0..)
        .map(|i| format!("other_{i}"))
        .find(|key| table.fingerprint(key) == table.fingerprint("first"))
        .unwrap();
    assert_eq!(table.insert_unique(&colliding, 2.0), Ok(false));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_remove_existing_key() {
    let mut table = CuckooTable::new(1024);
    let key = "removable_item";

    // Insert and then remove
    assert!(table.insert(key, 7.0).is_ok());
    assert!(table.contains(key));
    assert!(table.remove(key));
    assert!(!table.contains(key));
    assert_eq!(table.get(key), None);
    assert_eq!(table.len(), 0);

    // Trying to remove again should return false
    assert!(!table.remove(key));
}

#[test]
fn test_remove_duplicate_keys() {
    let mut table = CuckooTable::new(1024);
    let key = "dup_removable";

    // Insert multiple copies
    assert!(table.insert(key, 1.0).is_ok());
    assert!(table.insert(key, 2.0).is_ok());
    assert!(table.insert(key, 3.0).is_ok());
    assert_eq!(table.count(key), 3);

    // Remove one at a time
    assert!(table.remove(key));
    assert_eq!(table.count(key), 2);
    assert!(table.remove(key));
    assert_eq!(table.count(key), 1);
    assert!(table.remove(key));
    assert_eq!(table.count(key), 0);
    assert!(!table.contains(key));
    assert!(table.is_empty());
}

#[test]
fn test_remove_leaves_other_keys() {
    // 8-byte fingerprints make collisions between these keys practically impossible
    let mut table = CuckooTable::builder()
        .capacity(256)
        .fingerprint_len(8)
        .seed(11)
        .build()
        .unwrap();
    let items = test_items(200);
    for (i, item) in items.iter().enumerate() {
        assert!(table.insert(item, i as f64).is_ok());
    }
    for item in items.iter().step_by(2) {
        assert!(table.remove(item));
        assert!(!table.contains(item));
    }
    assert_eq!(table.len(), 100);
    for (i, item) in items.iter().enumerate().skip(1).step_by(2) {
        assert_eq!(table.get(item), Some(i as f64));
    }
}

#[test]
fn test_clear() {
    let mut table = CuckooTable::new(1024);
    let items = test_items(100);

    // Insert many keys
    for item in &items {
        assert!(table.insert(item, 1.0).is_ok());
    }
    assert_eq!(table.len(), 100);

    // Clear all keys
    table.clear();
    assert_eq!(table.len(), 0);
    assert!(table.is_empty());

    // Verify all keys are gone
    for item in &items {
        assert!(!table.contains(item));
    }
}

#[test]
fn test_different_key_types() {
    let mut table = CuckooTable::builder()
        .capacity(1024)
        .fingerprint_len(4)
        .build()
        .unwrap();

    // Test with different types that implement Hash
    assert!(table.insert(&42i32, 1.0).is_ok());
    assert!(table.insert("string", 2.0).is_ok());
    assert!(table.insert(&vec![1, 2, 3], 3.0).is_ok());
    assert!(table.insert(&(1, 2, 3), 4.0).is_ok());

    assert_eq!(table.get(&42i32), Some(1.0));
    assert_eq!(table.get("string"), Some(2.0));
    assert_eq!(table.get(&vec![1, 2, 3]), Some(3.0));
    assert_eq!(table.get(&(1, 2, 3)), Some(4.0));

    assert_eq!(table.len(), 4);
}

#[test]
fn test_str_and_string_keys_agree() {
    let mut table = CuckooTable::new(64);
    assert!(table.insert("shared", 9.0).is_ok());
    assert_eq!(table.get(&"shared".to_string()), Some(9.0));
}

#[test]
fn test_false_positives() {
    let mut table = CuckooTable::builder()
        .capacity(256)
        .fingerprint_len(1) // Smaller fingerprint = higher false positive rate
        .seed(3)
        .build()
        .unwrap();

    // Insert known keys
    for item in 0..500i32 {
        assert!(table.insert(&item, 1.0).is_ok());
    }

    // Test with unknown keys
    let false_positives = (1000..2000i32).filter(|item| table.contains(item)).count();

    // Should have some false positives but not too many
    assert!(false_positives > 0);
    assert!(false_positives < 100); // Less than 10% false positive rate
}

#[test]
fn test_longer_fingerprints_reduce_false_positives() {
    let mut rates = Vec::new();
    for len in [1, 2] {
        let mut table = CuckooTable::builder()
            .capacity(256)
            .fingerprint_len(len)
            .seed(9)
            .build()
            .unwrap();
        for item in 0..500i32 {
            assert!(table.insert(&item, 1.0).is_ok());
        }
        let probes = 100_000..110_000i32;
        let false_positives = probes.filter(|item| table.contains(item)).count();
        rates.push(false_positives as f64 / 10_000.0);
    }

    // Bound for a full table: 2 buckets * 4 slots / 255 possible bytes
    assert!(rates[0] < 8.0 / 255.0, "1-byte rate {}", rates[0]);
    assert!(rates[1] < rates[0]);
    assert!(rates[1] < 0.001, "2-byte rate {}", rates[1]);
}

#[test]
fn test_no_false_negatives() {
    let mut table = CuckooTable::with_seed(256, 17);
    let items = test_items(1024);

    // Insert keys and filter out the ones that failed to insert
    let inserted_items = items
        .into_iter()
        .filter(|item| table.insert(item, 1.0).is_ok())
        .collect::<Vec<_>>();

    // All inserted keys should be found (no false negatives)
    for item in inserted_items {
        assert!(table.contains(&item), "False negative for key: {item}");
    }
}

#[test]
fn test_full_table_insertion() {
    let mut table = CuckooTable::builder()
        .capacity(4) // Very small capacity
        .max_kicks(0) // No relocation
        .build()
        .unwrap();

    let mut successful_inserts = 0;

    // Try to insert many keys
    for i in 0..100 {
        match table.insert(&i, i as f64) {
            Ok(()) => successful_inserts += 1,
            Err(error) => {
                assert_eq!(error, Error::NotEnoughSpace);
                break; // Table is full
            }
        }
    }

    // Should fill up and then start failing
    assert!(successful_inserts <= table.slot_count());
    assert!(successful_inserts > 0);
    assert_eq!(table.len(), successful_inserts);
}

#[test]
fn test_error_message() {
    assert_eq!(
        Error::NotEnoughSpace.to_string(),
        "Not enough space to store this item."
    );
}

#[test]
fn test_bucket_sizes() {
    let sizes = [1, 2, 4, 8];

    for &size in &sizes {
        let mut table = CuckooTable::builder()
            .capacity(1024)
            .bucket_size(size)
            .seed(size as u64)
            .build()
            .unwrap();

        // Should be able to insert keys regardless of bucket size
        for i in 0..100 {
            assert!(table.insert(&i, 1.0).is_ok());
        }

        // Should be able to find all keys
        for i in 0..100 {
            assert!(table.contains(&i));
        }

        assert_eq!(table.len(), 100);
        assert_eq!(table.slot_count(), 1024 * size);
    }
}

#[test]
fn test_custom_hasher() {
    // Test that we can use different hashers
    let mut table = CuckooTableBuilder::<AHasher, StdRng>::default()
        .capacity(1024)
        .seed(1)
        .build()
        .unwrap();

    let items = test_items(100);
    for item in &items {
        assert!(table.insert(item, 1.0).is_ok());
    }

    for item in &items {
        assert!(table.contains(item));
    }

    assert_eq!(table.len(), 100);
}
