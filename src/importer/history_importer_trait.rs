// ==========================================
// 3D 打印成本计算器 - 历史导入 Trait
// ==========================================
// 职责: 定义历史导入接口（不包含实现）
// 流程: 读取 → 解析/校验 → 重复检测（预览）→ 用户选择策略 → 合并落库
// ==========================================

use crate::domain::calculation::HistoryEntry;
use crate::domain::types::{ExportFormat, MergeStrategy};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ==========================================
// ImportPreview - 导入预览（待确认）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub source: PathBuf,
    pub format: ExportFormat,
    pub total: usize,       // 文件内记录数（批内去重后）
    pub duplicates: usize,  // 与现有历史 id 重复的数量
    pub new_entries: usize, // 新记录数量
}

impl ImportPreview {
    pub fn has_duplicates(&self) -> bool {
        self.duplicates > 0
    }
}

// ==========================================
// ImportSummary - 导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub strategy: MergeStrategy,
    pub imported: usize,     // 实际写入（新增 + 覆盖）的记录数
    pub skipped: usize,      // 因 skip 策略跳过的重复记录数
    pub total_after: usize,  // 合并后历史总数
}

// ==========================================
// HistoryImporter Trait
// ==========================================
// 实现者: HistoryImporterImpl
#[async_trait]
pub trait HistoryImporter: Send + Sync {
    /// 读取并解析文件，返回预览（不修改历史）
    ///
    /// 同一时刻只允许一个导入在进行；新的预览覆盖旧的待确认导入
    async fn prepare_import(&self, file_path: &Path) -> ImportResult<ImportPreview>;

    /// 按策略提交待确认的导入
    async fn commit_import(&self, strategy: MergeStrategy) -> ImportResult<ImportSummary>;

    /// 放弃待确认的导入
    fn cancel_import(&self) -> bool;

    /// 当前待确认导入的预览
    fn pending_preview(&self) -> Option<ImportPreview>;

    /// 一步导入: 预览 + 提交
    async fn import_file(
        &self,
        file_path: &Path,
        strategy: MergeStrategy,
    ) -> ImportResult<ImportSummary> {
        self.prepare_import(file_path).await?;
        self.commit_import(strategy).await
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件内容 → 历史记录列表
// 实现者: JsonParser, CsvParser
pub trait FileParser: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn parse(&self, content: &[u8]) -> ImportResult<Vec<HistoryEntry>>;
}
