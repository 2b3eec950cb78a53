//! Storage integration tests
//!
//! Exercises the storage components together:
//! - Record codec byte layout and round-trips
//! - Heap page predicates, persistence to slabs and reload
//! - B-tree index under ordered, shuffled and random workloads
//! - Index files through the IndexFileStore in a temporary directory

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tempfile::tempdir;

use strata_common::{PAGE_SIZE, PageId, StorageConfig, StrataError, TypeId, TypedValue};
use strata_storage::{
    BTreeIndex, ColumnIndex, CompareOp, Condition, HeapPage, IndexFileStore, LeafCell, Projection,
    Record,
};

const SCENARIO_KEYS: [i32; 15] = [2, 7, 9, 3, 5, 1, 18, 11, 12, 13, 14, 15, 16, 17, 19];

// =============================================================================
// Helpers
// =============================================================================

fn person(row_id: u32, name: &str, age: i8, score: f32) -> LeafCell {
    let record = Record::new(vec![
        TypedValue::Int(row_id as i32),
        TypedValue::Text(name.to_string()),
        TypedValue::TinyInt(age),
        TypedValue::Float(score),
        TypedValue::Null,
    ])
    .unwrap();
    LeafCell::new(row_id, record)
}

fn people_page() -> HeapPage {
    let mut page = HeapPage::new(PageId::new(1), PageId::NONE);
    let rows = [
        (1, "ada", 36, 9.5),
        (2, "brian", 17, 4.0),
        (3, "cleo", 52, 7.25),
        (4, "dov", 17, 6.0),
        (5, "eve", 29, 8.0),
    ];
    for (row_id, name, age, score) in rows {
        page.insert(row_id, person(row_id, name, age, score)).unwrap();
    }
    page
}

fn store_in(dir: &std::path::Path, order: usize) -> IndexFileStore {
    IndexFileStore::new(StorageConfig {
        data_dir: dir.to_path_buf(),
        index_order: order,
        fsync_enabled: false,
        ..Default::default()
    })
    .unwrap()
}

// =============================================================================
// Record codec
// =============================================================================

#[test]
fn test_record_reference_bytes() {
    let record = Record::new(vec![
        TypedValue::Null,
        TypedValue::Int(9),
        TypedValue::Text("hello".into()),
    ])
    .unwrap();

    let mut expected = vec![0x03, 0x00, 0x03, 0x10, 0x00, 0x00, 0x00, 0x09];
    expected.extend_from_slice(b"hello");
    assert_eq!(record.to_bytes().unwrap(), expected);
    assert_eq!(record.to_string(), "['NULL', '9', 'hello']");
}

#[test]
fn test_record_roundtrip_all_widths() {
    let mut rng = rand::rng();
    for columns in 1..=255usize {
        let values: Vec<TypedValue> = (0..columns)
            .map(|i| match rng.random_range(0..6) {
                0 => TypedValue::Null,
                1 => TypedValue::Int(rng.random()),
                2 => TypedValue::Double(i as f64 * 0.5),
                3 => TypedValue::Text("t".repeat(i % 20)),
                4 => TypedValue::Date(rng.random_range(0..4_000_000_000_000i64)),
                _ => TypedValue::Year(rng.random_range(-100..100i8)),
            })
            .collect();
        let record = Record::new(values).unwrap();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes.len(), record.size_on_disk());
        assert_eq!(Record::from_bytes(&bytes).unwrap(), record);
    }
}

#[test]
fn test_record_from_parsed_literals() {
    let types = ["INT", "TEXT", "FLOAT", "YEAR"].map(|t| TypeId::from_name(t).unwrap());
    let literals = ["99", "'AWESOME'", "22.3", "24"];
    let values = types
        .iter()
        .zip(literals)
        .map(|(t, lit)| TypedValue::parse(*t, lit))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let record = Record::new(values).unwrap();
    assert_eq!(record.to_string_list(), vec!["99", "AWESOME", "22.3", "24"]);
    assert_eq!(
        Record::from_bytes(&record.to_bytes().unwrap()).unwrap(),
        record
    );
}

// =============================================================================
// Heap page
// =============================================================================

#[test]
fn test_page_select_matches_exactly() {
    let page = people_page();
    let condition = Condition::new(2, "=".parse().unwrap(), TypedValue::TinyInt(17));
    let projection = Projection::from_names(&["name"], &["id", "name", "age", "score", "note"])
        .unwrap();

    let names: Vec<_> = page
        .select(&projection, Some(&condition))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        names,
        vec![vec![TypedValue::from("brian")], vec![TypedValue::from("dov")]]
    );
}

#[test]
fn test_page_update_touches_only_matching_rows() {
    let mut page = people_page();
    let before: BTreeMap<u32, Vec<u8>> = page
        .iter()
        .map(|cell| (cell.row_id(), cell.to_bytes().unwrap()))
        .collect();

    let condition = Condition::new(3, CompareOp::Gt, TypedValue::Double(7.0));
    let touched = page
        .update(4, TypedValue::Text("honors".into()), Some(&condition))
        .unwrap();
    assert_eq!(touched, 3);

    for cell in page.iter() {
        let matched = [1, 3, 5].contains(&cell.row_id());
        if matched {
            assert_eq!(cell.get(4).unwrap(), &TypedValue::from("honors"));
        } else {
            assert_eq!(cell.to_bytes().unwrap(), before[&cell.row_id()]);
        }
    }
}

#[test]
fn test_page_delete_then_persist() {
    let mut page = people_page();
    let before: BTreeMap<u32, Vec<u8>> = page
        .iter()
        .map(|cell| (cell.row_id(), cell.to_bytes().unwrap()))
        .collect();

    let condition = Condition::new(2, CompareOp::Gt, TypedValue::TinyInt(30));
    assert_eq!(page.delete(Some(&condition)).unwrap(), 2);
    assert_eq!(page.row_ids().collect::<Vec<_>>(), vec![2, 4, 5]);
    for cell in page.iter() {
        assert_eq!(cell.to_bytes().unwrap(), before[&cell.row_id()]);
    }

    let condition = Condition::new(1, CompareOp::Ne, TypedValue::from("eve"));
    assert_eq!(page.delete(Some(&condition)).unwrap(), 2);
    assert_eq!(page.row_ids().collect::<Vec<_>>(), vec![5]);
    assert_eq!(page.get(5).unwrap().to_bytes().unwrap(), before[&5]);

    let slab = page.to_slab().unwrap();
    assert_eq!(slab.len(), PAGE_SIZE);
    let reloaded = HeapPage::from_bytes(&slab).unwrap();
    assert_eq!(reloaded, page);
}

#[test]
fn test_page_size_from_config() {
    let config = StorageConfig {
        page_size: 1024,
        ..Default::default()
    };
    let mut page = HeapPage::from_config(PageId::new(4), PageId::NONE, &config).unwrap();
    page.insert(1, person(1, "ada", 36, 9.5)).unwrap();

    let slab = page.to_slab().unwrap();
    assert_eq!(slab.len(), 1024);
    assert_eq!(HeapPage::from_bytes(&slab).unwrap(), page);
}

#[test]
fn test_page_fill_until_full() {
    let mut page = HeapPage::new(PageId::new(3), PageId::new(2));
    let mut row_id = 0;
    loop {
        let cell = person(row_id, "somebody with a long name", 40, 1.0);
        if !page.can_fit(&cell) {
            break;
        }
        page.insert(row_id, cell).unwrap();
        row_id += 1;
    }
    assert!(row_id > 1);

    let reloaded = HeapPage::from_bytes(&page.to_slab().unwrap()).unwrap();
    assert_eq!(reloaded.cell_count(), row_id as usize);
    assert_eq!(reloaded.parent_id(), PageId::new(2));
}

// =============================================================================
// B-tree index
// =============================================================================

#[test]
fn test_btree_scenario() {
    let mut tree: ColumnIndex = BTreeIndex::new(5).unwrap();
    for (row_id, key) in SCENARIO_KEYS.iter().enumerate() {
        tree.insert(TypedValue::Int(*key), row_id as u32);
    }
    tree.check_invariants().unwrap();

    assert_eq!(tree.search(&TypedValue::Int(11)), Some(&7));
    assert_eq!(tree.remove(&TypedValue::Int(17)).unwrap(), 13);
    assert_eq!(tree.search(&TypedValue::Int(17)), None);

    let mut expected: Vec<i32> = SCENARIO_KEYS.iter().copied().filter(|k| *k != 17).collect();
    expected.sort();
    let keys: Vec<TypedValue> = tree.keys().cloned().collect();
    assert_eq!(
        keys,
        expected.into_iter().map(TypedValue::Int).collect::<Vec<_>>()
    );
}

#[test]
fn test_btree_shuffled_inserts_iterate_sorted() {
    let mut rng = rand::rng();
    let sorted: Vec<u32> = (0..500).collect();
    for order in [3, 5, 16] {
        for _ in 0..5 {
            let mut keys = sorted.clone();
            keys.shuffle(&mut rng);
            let tree = BTreeIndex::from_entries(order, keys.iter().map(|&k| (k, k))).unwrap();
            tree.check_invariants().unwrap();
            assert_eq!(tree.keys().copied().collect::<Vec<_>>(), sorted);
        }
    }
}

#[test]
fn test_btree_random_insert_remove() {
    let mut rng = rand::rng();
    let mut tree = BTreeIndex::<u32, u32>::new(4).unwrap();
    let mut model = BTreeMap::new();

    for step in 0..5_000u32 {
        let key = rng.random_range(0..1_000);
        if rng.random_bool(0.55) {
            assert_eq!(tree.insert(key, step), model.insert(key, step));
        } else {
            match model.remove(&key) {
                Some(row_id) => assert_eq!(tree.remove(&key).unwrap(), row_id),
                None => assert!(tree.remove(&key).unwrap_err().is_not_found()),
            }
        }
        assert_eq!(tree.len(), model.len());
    }
    tree.check_invariants().unwrap();
    assert!(tree.iter().map(|(k, v)| (*k, *v)).eq(model.into_iter()));
}

// =============================================================================
// Index files
// =============================================================================

#[test]
fn test_index_file_scenario() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path(), 5);

    for (row_id, key) in SCENARIO_KEYS.iter().enumerate() {
        store
            .index_insert("people", "age", TypedValue::Int(*key), row_id as u32)
            .unwrap();
    }
    assert_eq!(
        store.index_search("people", "age", &TypedValue::Int(11)).unwrap(),
        Some(7)
    );
    assert_eq!(
        store.index_remove("people", "age", &TypedValue::Int(17)).unwrap(),
        13
    );
    assert_eq!(
        store.index_search("people", "age", &TypedValue::Int(17)).unwrap(),
        None
    );

    let tree = store.load("people", "age").unwrap().unwrap();
    tree.check_invariants().unwrap();
    assert_eq!(tree.len(), SCENARIO_KEYS.len() - 1);
}

#[test]
fn test_index_file_survives_reopen() {
    let dir = tempdir().unwrap();
    let names = ["kiwi", "apple", "fig", "pear", "lime", "date", "plum"];
    {
        let store = store_in(dir.path(), 3);
        store
            .initialize(
                "fruit",
                "name",
                names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (TypedValue::from(*n), i as u32)),
            )
            .unwrap();
    }

    let reopened = store_in(dir.path(), 7);
    let tree = reopened.load("fruit", "name").unwrap().unwrap();
    assert_eq!(tree.order(), 3);
    assert_eq!(
        reopened
            .index_search("fruit", "name", &TypedValue::from("pear"))
            .unwrap(),
        Some(3)
    );
    let keys: Vec<String> = tree.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["apple", "date", "fig", "kiwi", "lime", "pear", "plum"]);
}

#[test]
fn test_index_missing_file_semantics() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path(), 5);

    assert_eq!(
        store.index_search("ghost", "id", &TypedValue::Int(1)).unwrap(),
        None
    );
    assert!(matches!(
        store.index_remove("ghost", "id", &TypedValue::Int(1)),
        Err(StrataError::NotFound(_))
    ));
    assert!(!store.exists("ghost", "id"));
}
