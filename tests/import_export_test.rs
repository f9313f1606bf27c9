// ==========================================
// 导入导出集成测试
// ==========================================
// 测试目标: JSON 保真往返、CSV 有损往返、结构校验、三种合并策略、导入单飞
// ==========================================


use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::{create_memory_app, entry, write_file, T0};
use worthit3d::clock::ManualClock;
use worthit3d::domain::{CustomExpense, HistoryEntry, MergeStrategy, ParameterSet, Severity};
use worthit3d::engine::evaluate;
use worthit3d::exporter::{self, to_csv, to_json};
use worthit3d::importer::{
    ConflictHandler, CsvParser, FileParser, HistoryImporter, ImportError, JsonParser,
};
use worthit3d::logging;

// ==========================================
// 序列化往返
// ==========================================

/// 两位小数的金额（JSON 解析可精确还原）
fn cents() -> impl Strategy<Value = f64> {
    (0u32..1_000_000).prop_map(|c| c as f64 / 100.0)
}

fn entry_strategy() -> impl Strategy<Value = HistoryEntry> {
    (
        "[a-z0-9]{4,12}",
        0i64..4_102_444_800_000,
        prop::collection::vec(cents(), 6),
        prop::option::of("[a-zA-Z0-9 ,\"]{0,16}"),
        prop::option::of(any::<bool>()),
        prop::collection::vec(cents(), 0..3),
        any::<bool>(),
    )
        .prop_map(|(id, timestamp, nums, note, pinned, expenses, fee)| {
            let parameters = ParameterSet {
                weight: nums[0],
                spool_price: nums[1],
                spool_weight: nums[2],
                print_time: nums[3],
                hourly_rate: nums[4],
                consumables: nums[5],
                failure_rate: 1.1,
                markup: 1.5,
                custom_expenses: expenses
                    .into_iter()
                    .enumerate()
                    .map(|(i, amount)| CustomExpense {
                        id: format!("exp-{}", i),
                        name: format!("费用 {}", i),
                        amount,
                    })
                    .collect(),
                include_marketplace_fee: fee,
                ..ParameterSet::default()
            };
            HistoryEntry {
                id: format!("calc-{}", id),
                timestamp,
                breakdown: evaluate(&parameters),
                parameters,
                note,
                model_name: Some("Benchy".to_string()),
                model_link: None,
                pinned,
            }
        })
}

fn unique_entries() -> impl Strategy<Value = Vec<HistoryEntry>> {
    prop::collection::vec(entry_strategy(), 0..8).prop_map(|entries| {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_json_export_round_trips_exactly(entries in unique_entries()) {
        let bytes = to_json(&entries).unwrap();
        let parsed = JsonParser.parse(&bytes).unwrap();
        prop_assert_eq!(parsed, entries);
    }

    #[test]
    fn prop_csv_round_trip_drops_only_custom_expense_items(entries in unique_entries()) {
        let clock = Arc::new(ManualClock::new(T0));
        let bytes = to_csv(&entries).unwrap();
        let parsed = CsvParser::new(clock).parse(&bytes).unwrap();

        prop_assert_eq!(parsed.len(), entries.len());
        for (original, restored) in entries.iter().zip(parsed.iter()) {
            prop_assert_eq!(&restored.id, &original.id);
            prop_assert_eq!(restored.timestamp, original.timestamp);
            prop_assert!(restored.parameters.custom_expenses.is_empty());
            prop_assert_eq!(restored.is_pinned(), original.is_pinned());

            let mut expected = original.parameters.clone();
            expected.custom_expenses.clear();
            prop_assert_eq!(&restored.parameters, &expected);
            // 明细保留自定义费用合计
            prop_assert_eq!(&restored.breakdown, &original.breakdown);
        }
    }
}

#[test]
fn test_csv_export_layout() {
    let mut e = entry("calc-1", T0, Some(true), 100.0);
    e.note = Some("含逗号, 和 \"引号\"\n换行".to_string());
    let bytes = to_csv(&[e]).unwrap();

    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("ID,Date,Model Name,Model Link,Note,Pinned,Weight(g)"));
    assert!(text.contains("\"含逗号, 和 \"\"引号\"\"\n换行\""));
    assert!(text.contains("2023-11-14T22:13:20.000Z"));
    assert!(text.contains(",Yes,"));
}

#[test]
fn test_csv_without_custom_expense_column_imports() {
    let csv = "ID,Date,Weight(g),Spool Price,Spool Weight,Final Price,Profit\n\
               calc-a,2024-03-01,100,800,1000,120,40\n\
               ,,,,,,\n";
    let parsed = CsvParser::new(Arc::new(ManualClock::new(T0)))
        .parse(csv.as_bytes())
        .unwrap();

    assert_eq!(parsed.len(), 1);
    let e = &parsed[0];
    assert_eq!(e.id, "calc-a");
    assert!(e.parameters.custom_expenses.is_empty());
    assert_eq!(e.breakdown.custom_expenses_cost, 0.0);
    assert_eq!(e.parameters.failure_rate, 1.0);
    assert_eq!(e.parameters.markup, 1.0);
    assert_eq!(e.breakdown.final_price, 120.0);
}

// ==========================================
// 导入流程
// ==========================================

#[tokio::test]
async fn test_missing_profit_fails_whole_import_naming_item() {
    logging::init_test();
    let (app, _clock, notifier) = create_memory_app();
    let existing = vec![entry("calc-old", T0 - 10, None, 10.0)];
    app.history.lock().unwrap().replace_all(existing.clone());

    let incoming = vec![
        entry("calc-1", T0, None, 100.0),
        entry("calc-2", T0, None, 200.0),
        entry("calc-3", T0, None, 300.0),
    ];
    let mut doc: serde_json::Value = serde_json::from_slice(&to_json(&incoming).unwrap()).unwrap();
    doc[1]["result"]
        .as_object_mut()
        .unwrap()
        .remove("profit");

    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.json", &serde_json::to_vec(&doc).unwrap());

    let err = app.importer.prepare_import(&path).await.unwrap_err();
    match &err {
        ImportError::SchemaValidation { item, field, .. } => {
            assert_eq!(*item, 2);
            assert_eq!(field, "result.profit");
        }
        other => panic!("Expected SchemaValidation, got {:?}", other),
    }
    assert!(err.to_string().contains('2'));

    // 历史不变，也没有待确认导入
    assert_eq!(app.history_snapshot().unwrap(), existing);
    assert!(app.importer.pending_preview().is_none());
    assert_eq!(notifier.count(Severity::Danger), 1);
}

#[tokio::test]
async fn test_non_array_json_rejected() {
    let (app, _clock, _notifier) = create_memory_app();
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "object.json", b"{\"id\": \"calc-1\"}");

    let err = app.importer.prepare_import(&path).await.unwrap_err();
    assert!(matches!(err, ImportError::NotAnArray));
}

#[tokio::test]
async fn test_unsupported_extension_rejected_before_read() {
    let (app, _clock, _notifier) = create_memory_app();
    // 文件不存在：若先读取会得到 FileReadError
    let path = std::path::Path::new("/nonexistent/history.xlsx");

    let err = app.importer.prepare_import(path).await.unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

fn seed_existing(app: &worthit3d::app::AppState) -> Vec<HistoryEntry> {
    let existing = vec![
        entry("calc-a", T0, Some(true), 10.0),
        entry("calc-b", T0 + 1, None, 20.0),
    ];
    app.history.lock().unwrap().replace_all(existing.clone());
    existing
}

fn incoming_batch() -> Vec<HistoryEntry> {
    vec![
        entry("calc-b", T0 + 50, Some(true), 999.0),
        entry("calc-c", T0 + 60, None, 30.0),
        // 批内重复：保留首次出现
        entry("calc-c", T0 + 70, None, 31.0),
    ]
}

#[tokio::test]
async fn test_skip_strategy_keeps_existing_content() {
    let (app, _clock, notifier) = create_memory_app();
    let existing = seed_existing(&app);
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "batch.json", &to_json(&incoming_batch()).unwrap());

    let preview = app.importer.prepare_import(&path).await.unwrap();
    assert_eq!(preview.total, 2);
    assert_eq!(preview.duplicates, 1);
    assert_eq!(preview.new_entries, 1);
    assert!(preview.has_duplicates());

    let summary = app.importer.commit_import(MergeStrategy::Skip).await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.total_after, 3);

    let history = app.history_snapshot().unwrap();
    let b = history.iter().find(|e| e.id == "calc-b").unwrap();
    assert_eq!(b, &existing[1]);
    let c = history.iter().find(|e| e.id == "calc-c").unwrap();
    assert_eq!(c.parameters.weight, 30.0);
    assert_eq!(notifier.last().unwrap().severity, Severity::Success);
}

#[tokio::test]
async fn test_update_strategy_overwrites_content_keeps_pin() {
    let (app, _clock, _notifier) = create_memory_app();
    seed_existing(&app);
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "batch.json", &to_json(&incoming_batch()).unwrap());

    let summary = app
        .importer
        .import_file(&path, MergeStrategy::Update)
        .await
        .unwrap();
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.total_after, 3);

    let history = app.history_snapshot().unwrap();
    let b = history.iter().find(|e| e.id == "calc-b").unwrap();
    assert_eq!(b.parameters.weight, 999.0);
    assert_eq!(b.timestamp, T0 + 50);
    // 保留现有记录的置顶状态（未置顶）
    assert!(!b.is_pinned());
    assert_eq!(history[0].id, "calc-a");
}

#[tokio::test]
async fn test_replace_strategy_drops_existing_including_pinned() {
    let (app, _clock, _notifier) = create_memory_app();
    seed_existing(&app);
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "batch.json", &to_json(&incoming_batch()).unwrap());

    app.importer
        .import_file(&path, MergeStrategy::Replace)
        .await
        .unwrap();

    let ids: Vec<String> = app
        .history_snapshot()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["calc-b".to_string(), "calc-c".to_string()]);
}

#[tokio::test]
async fn test_concurrent_prepare_is_single_flight() {
    let (app, _clock, notifier) = create_memory_app();
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "batch.json", &to_json(&incoming_batch()).unwrap());

    let (first, second) = tokio::join!(
        app.importer.prepare_import(&path),
        app.importer.prepare_import(&path)
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ImportError::ImportInProgress)));
    assert_eq!(notifier.count(Severity::Warning), 1);
    assert!(!app.importer.is_importing());
}

#[tokio::test]
async fn test_later_prepare_overwrites_pending_import() {
    let (app, _clock, _notifier) = create_memory_app();
    let dir = TempDir::new().unwrap();
    let first = write_file(&dir, "first.json", &to_json(&incoming_batch()).unwrap());
    let second = write_file(
        &dir,
        "second.json",
        &to_json(&[entry("calc-z", T0, None, 5.0)]).unwrap(),
    );

    app.importer.prepare_import(&first).await.unwrap();
    app.importer.prepare_import(&second).await.unwrap();
    assert_eq!(app.importer.pending_preview().unwrap().source, second);

    app.importer.commit_import(MergeStrategy::Skip).await.unwrap();
    let ids: Vec<String> = app
        .history_snapshot()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["calc-z".to_string()]);

    // 提交后不再有待确认导入
    assert!(matches!(
        app.importer.commit_import(MergeStrategy::Skip).await,
        Err(ImportError::NoPendingImport)
    ));
}

#[tokio::test]
async fn test_cancel_discards_pending_import() {
    let (app, _clock, _notifier) = create_memory_app();
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "batch.json", &to_json(&incoming_batch()).unwrap());

    app.importer.prepare_import(&path).await.unwrap();
    assert!(app.importer.cancel_import());
    assert!(!app.importer.cancel_import());
    assert!(app.history_snapshot().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_then_import_into_fresh_app() {
    let (source, clock, _notifier) = create_memory_app();
    {
        let mut history = source.history.lock().unwrap();
        history.replace_all(vec![
            entry("calc-1", T0, Some(true), 100.0),
            entry("calc-2", T0 + 5, None, 200.0),
        ]);
    }
    clock.advance(1_000);

    let dir = TempDir::new().unwrap();
    let path = source
        .export_history(worthit3d::domain::ExportFormat::Json, Some(dir.path()))
        .unwrap();
    assert!(test_helpers::exists(&path));
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(exporter::EXPORT_FILE_PREFIX));

    let (target, _clock, _notifier) = create_memory_app();
    target
        .importer
        .import_file(&path, MergeStrategy::Replace)
        .await
        .unwrap();
    assert_eq!(
        target.history_snapshot().unwrap(),
        source.history_snapshot().unwrap()
    );
}

// ==========================================
// 合并策略性质
// ==========================================

proptest! {
    #[test]
    fn prop_reconcile_strategies(
        existing in unique_entries(),
        incoming in unique_entries(),
    ) {
        let handler = ConflictHandler;
        let existing_ids: HashSet<&str> = existing.iter().map(|e| e.id.as_str()).collect();
        let new_count = incoming.iter().filter(|e| !existing_ids.contains(e.id.as_str())).count();

        // skip: |S| + 新 id 数，且现有内容不变
        let skipped = handler.reconcile(&existing, incoming.clone(), MergeStrategy::Skip);
        prop_assert_eq!(skipped.len(), existing.len() + new_count);
        for e in &existing {
            prop_assert!(skipped.contains(e));
        }

        // update: 内容取导入，置顶取现有
        let updated = handler.reconcile(&existing, incoming.clone(), MergeStrategy::Update);
        prop_assert_eq!(updated.len(), existing.len() + new_count);
        for c in &incoming {
            let merged = updated.iter().find(|e| e.id == c.id).unwrap();
            prop_assert_eq!(&merged.parameters, &c.parameters);
            prop_assert_eq!(&merged.breakdown, &c.breakdown);
            prop_assert_eq!(&merged.note, &c.note);
            if let Some(s) = existing.iter().find(|e| e.id == c.id) {
                prop_assert_eq!(merged.pinned, s.pinned);
            }
        }

        // replace: 结果与导入集合完全一致
        let replaced = handler.reconcile(&existing, incoming.clone(), MergeStrategy::Replace);
        prop_assert_eq!(replaced.len(), incoming.len());
        for c in &incoming {
            prop_assert!(replaced.contains(c));
        }
    }
}
