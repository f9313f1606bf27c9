// ==========================================
// 3D 打印成本计算器 - 导出层
// ==========================================
// 职责: 历史记录 → JSON / CSV 文件
// 文件名: worthit3d-history-YYYY-MM-DD.{json,csv}
// ==========================================

pub mod csv_exporter;
pub mod error;
pub mod json_exporter;

pub use csv_exporter::{format_timestamp, to_csv};
pub use error::{ExportError, ExportResult};
pub use json_exporter::to_json;

use crate::domain::calculation::HistoryEntry;
use crate::domain::types::ExportFormat;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::info;

/// 导出文件名前缀
pub const EXPORT_FILE_PREFIX: &str = "worthit3d-history";

/// 按格式序列化
pub fn serialize(format: ExportFormat, entries: &[HistoryEntry]) -> ExportResult<Vec<u8>> {
    match format {
        ExportFormat::Json => to_json(entries),
        ExportFormat::Csv => to_csv(entries),
    }
}

pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        EXPORT_FILE_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// 写出导出文件（以本地日期命名），返回文件路径
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    entries: &[HistoryEntry],
) -> ExportResult<PathBuf> {
    write_export_dated(dir, format, entries, Local::now().date_naive())
}

pub fn write_export_dated(
    dir: &Path,
    format: ExportFormat,
    entries: &[HistoryEntry],
    date: NaiveDate,
) -> ExportResult<PathBuf> {
    let bytes = serialize(format, entries)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(format, date));
    std::fs::write(&path, &bytes)?;

    info!(
        path = %path.display(),
        format = %format,
        count = entries.len(),
        bytes = bytes.len(),
        "历史记录导出完成"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Csv, date),
            "worthit3d-history-2025-01-20.csv"
        );
        assert_eq!(
            export_file_name(ExportFormat::Json, date),
            "worthit3d-history-2025-01-20.json"
        );
    }

    #[test]
    fn test_write_export_creates_file() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let target = dir.path().join("exports");

        let path = write_export_dated(&target, ExportFormat::Json, &[], date).unwrap();
        assert_eq!(path, target.join("worthit3d-history-2025-01-20.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
