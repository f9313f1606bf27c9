// ==========================================
// 3D 打印成本计算器 - 文件解析器实现
// ==========================================
// 支持: JSON (.json) / CSV (.csv)
// JSON: 完整保真（含自定义费用、平台价格）
// CSV: 有损（自定义费用明细不保留）
// ==========================================

use crate::clock::Clock;
use crate::domain::calculation::HistoryEntry;
use crate::domain::types::ExportFormat;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::history_importer_trait::FileParser;
use crate::importer::schema_validator::SchemaValidator;
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// UTF-8 BOM（导出 CSV 带 BOM，导入时去除）
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn strip_bom(content: &[u8]) -> &[u8] {
    content.strip_prefix(UTF8_BOM).unwrap_or(content)
}

// ==========================================
// JSON Parser 实现
// ==========================================
pub struct JsonParser;

impl FileParser for JsonParser {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn parse(&self, content: &[u8]) -> ImportResult<Vec<HistoryEntry>> {
        let doc: serde_json::Value = serde_json::from_slice(strip_bom(content))?;
        SchemaValidator.validate_document(&doc)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    mapper: FieldMapper,
}

impl CsvParser {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            mapper: FieldMapper::new(clock),
        }
    }

    /// 解析为原始行（列名 → 值）
    pub fn parse_to_raw_records(
        &self,
        content: &[u8],
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::Headers)
            .from_reader(strip_bom(content));

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.trim().is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

impl FileParser for CsvParser {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn parse(&self, content: &[u8]) -> ImportResult<Vec<HistoryEntry>> {
        let rows = self.parse_to_raw_records(content)?;
        Ok(rows.iter().map(|row| self.mapper.map_to_entry(row)).collect())
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    json: JsonParser,
    csv: CsvParser,
}

impl UniversalFileParser {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            json: JsonParser,
            csv: CsvParser::new(clock),
        }
    }

    /// 按扩展名选择解析器（读取内容之前调用）
    pub fn parser_for(&self, path: &Path) -> ImportResult<&dyn FileParser> {
        match ExportFormat::from_path(path).map_err(ImportError::UnsupportedFormat)? {
            ExportFormat::Json => Ok(&self.json),
            ExportFormat::Csv => Ok(&self.csv),
        }
    }

    pub fn parse(&self, path: &Path, content: &[u8]) -> ImportResult<Vec<HistoryEntry>> {
        self.parser_for(path)?.parse(content)
    }
}
