// ==========================================
// 3D 打印成本计算器 - 导入层
// ==========================================
// 职责: 外部文件 → 历史记录，按合并策略并入现有历史
// 支持: JSON（无损）, CSV（有损，不含自定义费用明细）
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod history_importer_impl;
pub mod history_importer_trait;
pub mod schema_validator;

// 重导出核心类型
pub use conflict_handler::{ConflictHandler, DuplicateSummary};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, JsonParser, UniversalFileParser, UTF8_BOM};
pub use history_importer_impl::HistoryImporterImpl;
pub use schema_validator::SchemaValidator;

// 重导出 Trait 接口
pub use history_importer_trait::{FileParser, HistoryImporter, ImportPreview, ImportSummary};
