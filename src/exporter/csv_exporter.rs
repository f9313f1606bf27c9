// ==========================================
// 3D 打印成本计算器 - CSV 导出
// ==========================================
// 格式: UTF-8 BOM + 标准列头 + 每条记录一行
// 引号: 含逗号 / 双引号 / 换行的字段加引号，内部双引号转义为 ""
// 有损: 自定义费用只保留合计列
// ==========================================

use crate::domain::calculation::HistoryEntry;
use crate::domain::csv_columns::HEADERS;
use crate::exporter::error::{ExportError, ExportResult};
use crate::importer::file_parser::UTF8_BOM;
use chrono::{DateTime, SecondsFormat};
use csv::{QuoteStyle, WriterBuilder};

pub fn to_csv(entries: &[HistoryEntry]) -> ExportResult<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(UTF8_BOM.to_vec());

    wtr.write_record(HEADERS)?;
    for entry in entries {
        wtr.write_record(to_row(entry))?;
    }

    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// 时间戳 → RFC 3339（UTC，毫秒精度）；超出范围时原样输出毫秒数
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

// 列顺序与 HEADERS 一致
fn to_row(entry: &HistoryEntry) -> Vec<String> {
    let p = &entry.parameters;
    let b = &entry.breakdown;

    let mut row = vec![
        entry.id.clone(),
        format_timestamp(entry.timestamp),
        entry.model_name.clone().unwrap_or_default(),
        entry.model_link.clone().unwrap_or_default(),
        entry.note.clone().unwrap_or_default(),
        yes_no(entry.is_pinned()),
    ];

    row.extend(
        [
            p.weight,
            p.spool_price,
            p.spool_weight,
            p.print_time,
            p.prep_time,
            p.post_time,
            p.power_consumption,
            p.electricity_tariff,
            p.printer_price,
            p.lifespan,
            p.nozzle_price,
            p.nozzle_lifespan,
            p.bed_price,
            p.bed_lifespan,
            p.hourly_rate,
            p.failure_rate,
            p.markup,
            p.consumables,
        ]
        .iter()
        .map(f64::to_string),
    );

    row.push(yes_no(p.include_marketplace_fee));

    row.extend(
        [
            b.material_cost,
            b.electricity_cost,
            b.depreciation_cost,
            b.nozzle_wear_cost,
            b.bed_wear_cost,
            b.labor_cost,
            b.consumables_cost,
            b.custom_expenses_cost,
            b.subtotal,
            b.total_cost,
            b.final_price,
            b.profit,
            b.marketplace_price,
            b.marketplace_profit,
        ]
        .iter()
        .map(f64::to_string),
    );

    row
}
