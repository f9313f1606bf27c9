// ==========================================
// 3D 打印成本计算器 - JSON 导出
// ==========================================
// 格式: 与 JSON 导入结构一致的数组（美化输出，无损）
// ==========================================

use crate::domain::calculation::HistoryEntry;
use crate::exporter::error::ExportResult;

pub fn to_json(entries: &[HistoryEntry]) -> ExportResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(entries)?)
}
