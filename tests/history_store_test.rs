// ==========================================
// 历史存储集成测试
// ==========================================
// 测试目标: SQLite 落盘与重载、展示顺序不变量、清空保留置顶、upsert 语义
// ==========================================


use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use test_helpers::{content, create_test_db, T0};
use worthit3d::clock::ManualClock;
use worthit3d::db::{ensure_schema, open_sqlite_connection};
use worthit3d::domain::HistoryEntry;
use worthit3d::logging;
use worthit3d::repository::{HistoryStore, KvStore, MemoryKvStore, SqliteKvStore, HISTORY_STORAGE_KEY};

fn open_sqlite_kv(db_path: &str) -> Arc<SqliteKvStore> {
    let conn = open_sqlite_connection(db_path).expect("Failed to open db");
    ensure_schema(&conn).expect("Failed to init schema");
    Arc::new(SqliteKvStore::new(Arc::new(Mutex::new(conn))))
}

fn assert_display_order(entries: &[HistoryEntry]) {
    for pair in entries.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.is_pinned() >= b.is_pinned(), "置顶记录必须在前");
        if a.is_pinned() == b.is_pinned() {
            assert!(a.timestamp >= b.timestamp, "同组内必须按时间降序");
        }
    }
}

#[test]
fn test_sqlite_history_survives_reopen() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let clock = Arc::new(ManualClock::new(T0));

    let (first, second) = {
        let mut store = HistoryStore::load(open_sqlite_kv(&db_path), clock.clone());
        let first = store.add(content(100.0, "支架"));
        clock.advance(1_000);
        let second = store.add(content(200.0, "齿轮"));
        store.toggle_pin(&first).unwrap();
        assert!(store.last_persist_error().is_none());
        (first, second)
    };

    // 重新打开同一数据库文件
    let store = HistoryStore::load(open_sqlite_kv(&db_path), clock.clone());
    assert_eq!(store.len(), 2);
    let ids: Vec<&str> = store.list().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
    assert!(store.get(&first).unwrap().is_pinned());
    assert_eq!(store.get(&second).unwrap().model_name.as_deref(), Some("齿轮"));
}

#[test]
fn test_whole_blob_written_under_history_key() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = HistoryStore::load(kv.clone(), Arc::new(ManualClock::new(T0)));
    let id = store.add(content(50.0, "外壳"));

    let blob = kv.get(HISTORY_STORAGE_KEY).unwrap().expect("history blob");
    let persisted: Vec<HistoryEntry> = serde_json::from_str(&blob).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, id);
    assert!(blob.contains("\"state\""));
    assert!(blob.contains("\"result\""));
}

#[test]
fn test_clear_all_keeps_only_pinned_entries() {
    let clock = Arc::new(ManualClock::new(T0));
    let mut store = HistoryStore::load(Arc::new(MemoryKvStore::new()), clock.clone());

    let mut pinned = Vec::new();
    for i in 0..6 {
        clock.advance(10);
        let id = store.add(content(10.0 * (i + 1) as f64, "批量"));
        if i % 3 == 0 {
            store.toggle_pin(&id).unwrap();
            pinned.push(id);
        }
    }

    let removed = store.clear_all();
    assert_eq!(removed, 4);
    assert_eq!(store.len(), 2);
    assert!(store.list().iter().all(|e| e.is_pinned()));
    for id in &pinned {
        assert!(store.contains(id));
    }

    // 再次清空不会删除置顶记录
    assert_eq!(store.clear_all(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_upsert_updates_in_place_and_keeps_pin() {
    let clock = Arc::new(ManualClock::new(T0));
    let mut store = HistoryStore::load(Arc::new(MemoryKvStore::new()), clock.clone());

    let id = store.upsert(None, content(100.0, "初稿"));
    store.toggle_pin(&id).unwrap();
    clock.advance(5_000);

    let same = store.upsert(Some(&id), content(120.0, "修订"));
    assert_eq!(same, id);
    assert_eq!(store.len(), 1);

    let entry = store.get(&id).unwrap();
    assert_eq!(entry.timestamp, T0 + 5_000);
    assert_eq!(entry.parameters.weight, 120.0);
    assert_eq!(entry.model_name.as_deref(), Some("修订"));
    assert!(entry.is_pinned());
}

#[test]
fn test_upsert_with_unknown_id_creates_entry_with_that_id() {
    let mut store = HistoryStore::load(Arc::new(MemoryKvStore::new()), Arc::new(ManualClock::new(T0)));
    let id = store.upsert(Some("calc-restored"), content(80.0, "恢复"));

    assert_eq!(id, "calc-restored");
    assert!(store.contains("calc-restored"));
    assert!(!store.get(&id).unwrap().is_pinned());
}

#[test]
fn test_missing_id_operations() {
    let mut store = HistoryStore::load(Arc::new(MemoryKvStore::new()), Arc::new(ManualClock::new(T0)));
    store.add(content(10.0, "a"));

    assert!(!store.delete("calc-missing"));
    assert!(store.toggle_pin("calc-missing").is_err());
    assert!(store.update("calc-missing", content(1.0, "b")).is_err());
    assert_eq!(store.len(), 1);
}

/// 随机操作序列
#[derive(Debug, Clone)]
enum Op {
    Add(f64),
    Update(usize, f64),
    TogglePin(usize),
    Delete(usize),
    Advance(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1.0f64..500.0).prop_map(Op::Add),
        (0usize..16, 1.0f64..500.0).prop_map(|(i, w)| Op::Update(i, w)),
        (0usize..16).prop_map(Op::TogglePin),
        (0usize..16).prop_map(Op::Delete),
        (0i64..3).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn prop_list_is_always_in_display_order(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let clock = Arc::new(ManualClock::new(T0));
        let mut store = HistoryStore::load(Arc::new(MemoryKvStore::new()), clock.clone());

        for op in ops {
            let ids: Vec<String> = store.list().iter().map(|e| e.id.clone()).collect();
            match op {
                Op::Add(w) => {
                    store.add(content(w, "p"));
                }
                Op::Update(i, w) if !ids.is_empty() => {
                    store.update(&ids[i % ids.len()], content(w, "u")).unwrap();
                }
                Op::TogglePin(i) if !ids.is_empty() => {
                    store.toggle_pin(&ids[i % ids.len()]).unwrap();
                }
                Op::Delete(i) if !ids.is_empty() => {
                    prop_assert!(store.delete(&ids[i % ids.len()]));
                }
                Op::Advance(ms) => clock.advance(ms),
                _ => {}
            }
            assert_display_order(store.list());
        }

        // id 唯一
        let mut ids: Vec<&str> = store.list().iter().map(|e| e.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), before);
    }
}
