// ==========================================
// 3D 打印成本计算器 - 命令行入口
// ==========================================
// 职责: 解析命令 → 装配 AppState → 调用核心 → 输出结果
// 输出: 结果写 stdout，日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

mod cli;

use cli::{Cli, Commands, ConfigCommands, DraftCommands};
use worthit3d::app::{get_default_db_path, AppState};
use worthit3d::clock::SystemClock;
use worthit3d::config::config_keys;
use worthit3d::domain::{Breakdown, FormState, HistoryEntry, ParameterSet};
use worthit3d::importer::HistoryImporter;
use worthit3d::logging::{self, LogFormat};
use worthit3d::notification::TracingNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_with_format(format, if args.verbose { "info" } else { "warn" });

    tracing::info!("{} v{}", worthit3d::APP_NAME, worthit3d::VERSION);

    // calc 不需要持久化，使用内存数据库
    let app = match (&args.command, &args.db) {
        (Commands::Calc { .. }, _) => {
            AppState::in_memory(Arc::new(SystemClock), Arc::new(TracingNotifier))
        }
        (_, Some(p)) => AppState::new(p.to_string_lossy().to_string()),
        (_, None) => AppState::new(get_default_db_path()),
    }
    .map_err(anyhow::Error::msg)?;

    run(&app, args.command).await
}

async fn run(app: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Calc { params } => {
            let breakdown = app.engine.evaluate(&read_parameters(&params)?);
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
        Commands::List { json } => list(app, json)?,
        Commands::Export { format, out } => {
            let path = app
                .export_history(format, out.as_deref())
                .map_err(anyhow::Error::msg)?;
            println!("{}", path.display());
        }
        Commands::Import {
            file,
            strategy,
            dry_run,
        } => {
            let preview = app.importer.prepare_import(&file).await?;
            println!(
                "{}: {} 条记录（{} 条与现有记录重复，{} 条新记录）",
                preview.source.display(),
                preview.total,
                preview.duplicates,
                preview.new_entries
            );
            if dry_run {
                app.importer.cancel_import();
                return Ok(());
            }
            let summary = app.importer.commit_import(strategy).await?;
            println!(
                "策略 {}: 导入 {} 条，跳过 {} 条，合并后共 {} 条",
                summary.strategy, summary.imported, summary.skipped, summary.total_after
            );
        }
        Commands::Clear => {
            let removed = app.clear_history().map_err(anyhow::Error::msg)?;
            println!("已删除 {} 条记录", removed);
        }
        Commands::Pin { id } => {
            let pinned = app.toggle_pin(&id).map_err(anyhow::Error::msg)?;
            println!("{} {}", id, if pinned { "已置顶" } else { "已取消置顶" });
        }
        Commands::Delete { id } => {
            if !app.delete_entry(&id).map_err(anyhow::Error::msg)? {
                bail!("记录不存在: {}", id);
            }
            println!("已删除 {}", id);
        }
        Commands::Draft { action } => draft(app, action).await?,
        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                let config = app
                    .config_manager
                    .load_app_config()
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigCommands::Set { key, value } => {
                let known = [
                    config_keys::AUTO_SAVE_DELAY_MS,
                    config_keys::CURRENCY_SYMBOL,
                    config_keys::EXPORT_DIR,
                ];
                if !known.contains(&key.as_str()) {
                    bail!("未知配置项: {}（可选: {}）", key, known.join(", "));
                }
                app.config_manager
                    .set_config_value(&key, &value)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("{} = {}", key, value);
            }
        },
    }

    Ok(())
}

/// 读取参数文件，缺失字段取默认值
fn read_parameters(path: &Path) -> Result<ParameterSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取参数文件: {}", path.display()))?;
    let overrides: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("参数文件不是有效 JSON: {}", path.display()))?;

    let mut merged = serde_json::to_value(ParameterSet::default())?;
    match (merged.as_object_mut(), overrides.as_object()) {
        (Some(base), Some(fields)) => {
            for (k, v) in fields {
                base.insert(k.clone(), v.clone());
            }
        }
        _ => bail!("参数文件必须是 JSON 对象"),
    }

    Ok(serde_json::from_value(merged)?)
}

fn lock_err<T>(e: PoisonError<T>) -> anyhow::Error {
    anyhow::anyhow!("锁获取失败: {}", e)
}

fn currency(app: &AppState) -> String {
    app.config_manager
        .get_currency_symbol()
        .unwrap_or_else(|_| worthit3d::config::defaults::CURRENCY_SYMBOL.to_string())
}

fn list(app: &AppState, json: bool) -> Result<()> {
    let entries = app.history_snapshot().map_err(anyhow::Error::msg)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let symbol = currency(app);
    for entry in &entries {
        print_entry(entry, &symbol);
    }
    if entries.is_empty() {
        println!("（暂无计算历史）");
    }
    Ok(())
}

fn print_entry(entry: &HistoryEntry, symbol: &str) {
    println!(
        "{} {}  {}  {}  售价 {:.2}{}  利润 {:.2}{}",
        if entry.is_pinned() { "★" } else { " " },
        entry.id,
        worthit3d::exporter::format_timestamp(entry.timestamp),
        entry.model_name.as_deref().unwrap_or("-"),
        entry.breakdown.final_price,
        symbol,
        entry.breakdown.profit,
        symbol,
    );
}

fn print_breakdown(b: &Breakdown, symbol: &str) {
    let rows = [
        ("材料", b.material_cost),
        ("电费", b.electricity_cost),
        ("折旧", b.depreciation_cost),
        ("喷嘴", b.nozzle_wear_cost),
        ("热床", b.bed_wear_cost),
        ("人工", b.labor_cost),
        ("耗材", b.consumables_cost),
        ("其他", b.custom_expenses_cost),
        ("小计", b.subtotal),
        ("总成本", b.total_cost),
        ("售价", b.final_price),
        ("利润", b.profit),
    ];
    for (label, value) in rows {
        println!("  {:<6} {:>10.2}{}", label, value, symbol);
    }
    if b.marketplace_price > 0.0 {
        println!("  {:<6} {:>10.2}{}", "平台售价", b.marketplace_price, symbol);
        println!("  {:<6} {:>10.2}{}", "平台利润", b.marketplace_profit, symbol);
    }
}

async fn draft(app: &AppState, action: DraftCommands) -> Result<()> {
    let symbol = currency(app);

    match action {
        DraftCommands::Show => {
            let manager = app.save_manager.lock().map_err(lock_err)?;
            let form = manager.form();
            match manager.editing_id() {
                Some(id) => println!("编辑中: {}", id),
                None => println!("新计算{}", if form.has_user_content() { "" } else { "（空白）" }),
            }
            if !form.model_name.is_empty() {
                println!("模型: {}", form.model_name);
            }
            if !form.note.is_empty() {
                println!("备注: {}", form.note);
            }
            print_breakdown(&manager.breakdown(), &symbol);
        }
        DraftCommands::Set {
            params,
            model_name,
            model_link,
            note,
        } => {
            let parameters = read_parameters(&params)?;
            let current = {
                let manager = app.save_manager.lock().map_err(lock_err)?;
                manager.form().clone()
            };
            let form = FormState {
                parameters,
                model_name: model_name.unwrap_or(current.model_name),
                model_link: model_link.unwrap_or(current.model_link),
                note: note.unwrap_or(current.note),
            };

            let controller = app.auto_save_controller();
            controller.on_content_changed(form);
            // 等待防抖触发自动保存
            while controller.is_pending() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }

            let manager = app.save_manager.lock().map_err(lock_err)?;
            match manager.editing_id().or(manager.auto_save_id()) {
                Some(id) => println!("已自动保存: {}", id),
                None => println!("草稿已更新"),
            }
            print_breakdown(&manager.breakdown(), &symbol);
        }
        DraftCommands::Save { new } => {
            let mut manager = app.save_manager.lock().map_err(lock_err)?;
            let saved = if new {
                manager.save_and_new()
            } else {
                manager.save()
            };
            match saved {
                Some(id) => println!("已保存: {}", id),
                None => bail!("草稿为空，未保存"),
            }
        }
        DraftCommands::Edit { id } => {
            let mut manager = app.save_manager.lock().map_err(lock_err)?;
            manager.load_entry(&id)?;
            println!("编辑中: {}", id);
        }
        DraftCommands::Clear => {
            let mut manager = app.save_manager.lock().map_err(lock_err)?;
            manager.clear_form();
            println!("草稿已清空");
        }
    }

    Ok(())
}
