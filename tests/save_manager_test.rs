// ==========================================
// 保存管理与自动保存集成测试
// ==========================================
// 测试目标: 防抖收敛、首次渲染跳过、手动保存抑制一次自动保存、编辑模式原地更新、草稿恢复
// ==========================================


use std::sync::Arc;
use std::time::Duration;
use test_helpers::{create_memory_app, create_test_app, create_test_db, params_with_weight, T0};
use worthit3d::clock::ManualClock;
use worthit3d::domain::{FormState, Severity};
use worthit3d::logging;

fn form(weight: f64, model_name: &str) -> FormState {
    FormState {
        parameters: params_with_weight(weight),
        model_name: model_name.to_string(),
        ..FormState::default()
    }
}

/// 超过默认自动保存延迟
async fn wait_past_delay() {
    tokio::time::sleep(Duration::from_millis(2_100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_initial_render_does_not_auto_save() {
    logging::init_test();
    let (app, _clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_initial_render();
    assert!(controller.is_pending());
    wait_past_delay().await;

    assert!(!controller.is_pending());
    assert!(app.history_snapshot().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_changes_converge_on_single_entry() {
    let (app, clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();
    controller.on_initial_render();

    for (i, weight) in [10.0, 20.0, 30.0].into_iter().enumerate() {
        controller.on_content_changed(form(weight, &format!("草稿 {}", i)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        clock.advance(500);
    }
    // 静默期未结束
    assert!(app.history_snapshot().unwrap().is_empty());

    wait_past_delay().await;
    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].parameters.weight, 30.0);
    assert_eq!(history[0].model_name.as_deref(), Some("草稿 2"));

    let auto_id = {
        let manager = app.save_manager.lock().unwrap();
        assert!(!manager.has_unsaved_changes());
        assert_eq!(manager.last_save_time(), Some(T0 + 1_500));
        manager.auto_save_id().map(str::to_string)
    };
    assert_eq!(auto_id.as_deref(), Some(history[0].id.as_str()));

    // 再次修改：更新同一条记录
    controller.on_content_changed(form(40.0, "草稿 3"));
    wait_past_delay().await;
    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, auto_id.unwrap());
    assert_eq!(history[0].parameters.weight, 40.0);
}

#[tokio::test(start_paused = true)]
async fn test_manual_save_suppresses_next_auto_save() {
    let (app, clock, notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_content_changed(form(10.0, "支架"));
    let id = app.save_manager.lock().unwrap().save().unwrap();
    assert_eq!(notifier.last().unwrap().severity, Severity::Success);

    clock.advance(3_000);
    wait_past_delay().await;
    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    // 被跳过的自动保存不会刷新时间戳
    assert_eq!(history[0].timestamp, T0);

    // 之后的修改正常自动保存到同一条记录
    controller.on_content_changed(form(20.0, "支架 v2"));
    wait_past_delay().await;
    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].parameters.weight, 20.0);
    assert_eq!(history[0].timestamp, T0 + 3_000);
}

#[tokio::test(start_paused = true)]
async fn test_edit_after_fired_auto_save_and_manual_save_persists() {
    let (app, _clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_content_changed(form(10.0, "齿轮"));
    wait_past_delay().await;
    let id = app.history_snapshot().unwrap()[0].id.clone();

    // 此时没有待触发的自动保存
    assert!(!controller.is_pending());
    assert_eq!(app.save_manager.lock().unwrap().save(), Some(id.clone()));

    controller.on_content_changed(form(99.0, "齿轮"));
    wait_past_delay().await;

    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].parameters.weight, 99.0);
}

#[tokio::test(start_paused = true)]
async fn test_edit_mode_auto_save_updates_in_place() {
    let (app, clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    let id = {
        let mut manager = app.save_manager.lock().unwrap();
        manager.set_form(form(50.0, "外壳"));
        let id = manager.save_and_new().unwrap();
        assert!(!manager.form().has_user_content());
        manager.load_entry(&id).unwrap();
        assert!(manager.is_editing());
        assert_eq!(manager.form().model_name, "外壳");
        id
    };

    clock.advance(1_000);
    let mut edited = app.save_manager.lock().unwrap().form().clone();
    edited.note = "加厚 2mm".to_string();
    controller.on_content_changed(edited);
    wait_past_delay().await;

    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].note.as_deref(), Some("加厚 2mm"));
    assert_eq!(history[0].timestamp, T0 + 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_empty_form_is_never_saved() {
    let (app, _clock, notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_content_changed(FormState::default());
    wait_past_delay().await;
    assert!(app.history_snapshot().unwrap().is_empty());

    // 手动保存空表单：警告且不修改状态
    assert!(app.save_manager.lock().unwrap().save().is_none());
    let last = notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert!(app.history_snapshot().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_pending_auto_save() {
    let (app, _clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_content_changed(form(10.0, "取消"));
    assert!(controller.cancel_pending());
    assert!(!controller.cancel_pending());

    wait_past_delay().await;
    assert!(app.history_snapshot().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deleting_auto_saved_entry_starts_new_one() {
    let (app, _clock, _notifier) = create_memory_app();
    let controller = app.auto_save_controller();

    controller.on_content_changed(form(10.0, "a"));
    wait_past_delay().await;
    let first = app.history_snapshot().unwrap()[0].id.clone();

    assert!(app.delete_entry(&first).unwrap());
    assert!(app.save_manager.lock().unwrap().auto_save_id().is_none());

    controller.on_content_changed(form(11.0, "a"));
    wait_past_delay().await;
    let history = app.history_snapshot().unwrap();
    assert_eq!(history.len(), 1);
    assert_ne!(history[0].id, first);
}

#[test]
fn test_draft_restored_after_restart() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let clock = Arc::new(ManualClock::new(T0));

    let id = {
        let (app, _notifier) = create_test_app(&db_path, clock.clone()).unwrap();
        let mut manager = app.save_manager.lock().unwrap();
        manager.set_form(form(75.0, "齿轮"));
        let id = manager.save().unwrap();
        manager.load_entry(&id).unwrap();
        id
    };

    let (app, _notifier) = create_test_app(&db_path, clock.clone()).unwrap();
    let manager = app.save_manager.lock().unwrap();
    assert_eq!(manager.editing_id(), Some(id.as_str()));
    assert_eq!(manager.form().model_name, "齿轮");
    assert_eq!(manager.form().parameters.weight, 75.0);
    assert_eq!(app.history_snapshot().unwrap().len(), 1);
}

#[test]
fn test_stale_editing_id_dropped_on_restore() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let clock = Arc::new(ManualClock::new(T0));

    let id = {
        let (app, _notifier) = create_test_app(&db_path, clock.clone()).unwrap();
        let id = {
            let mut manager = app.save_manager.lock().unwrap();
            manager.set_form(form(75.0, "齿轮"));
            let id = manager.save().unwrap();
            manager.load_entry(&id).unwrap();
            id
        };
        // 直接删除底层记录，不通知会话
        app.history.lock().unwrap().delete(&id);
        id
    };

    let (app, _notifier) = create_test_app(&db_path, clock).unwrap();
    let manager = app.save_manager.lock().unwrap();
    assert!(manager.editing_id().is_none());
    assert!(app.history_snapshot().unwrap().iter().all(|e| e.id != id));
}
