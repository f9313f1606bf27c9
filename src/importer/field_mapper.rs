// ==========================================
// 3D 打印成本计算器 - 字段映射器
// ==========================================
// 职责: CSV 行（列名 → 值）→ HistoryEntry
// 规则: 数值安全解析（failure_rate / markup 回退到 1.0，其余回退到 0）
// 规则: CSV 不携带自定义费用，映射结果恒为空列表
// ==========================================

use crate::clock::Clock;
use crate::domain::calculation::{Breakdown, HistoryEntry, ParameterSet};
use crate::domain::csv_columns as col;
use crate::importer::data_cleaner::DataCleaner;
use crate::repository::history_repo::generate_entry_id;
use std::collections::HashMap;
use std::sync::Arc;

/// 失败余量 / 加价 的中性值（乘数语义）
const NEUTRAL_MULTIPLIER: f64 = 1.0;

pub struct FieldMapper {
    cleaner: DataCleaner,
    clock: Arc<dyn Clock>,
}

impl FieldMapper {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cleaner: DataCleaner,
            clock,
        }
    }

    /// 将 CSV 行映射为历史记录
    pub fn map_to_entry(&self, row: &HashMap<String, String>) -> HistoryEntry {
        let now = self.clock.now_millis();

        let parameters = ParameterSet {
            weight: self.number(row, col::WEIGHT),
            spool_price: self.number(row, col::SPOOL_PRICE),
            spool_weight: self.number(row, col::SPOOL_WEIGHT),
            print_time: self.number(row, col::PRINT_TIME),
            prep_time: self.number(row, col::PREP_TIME),
            post_time: self.number(row, col::POST_TIME),
            power_consumption: self.number(row, col::POWER),
            electricity_tariff: self.number(row, col::TARIFF),
            printer_price: self.number(row, col::PRINTER_PRICE),
            lifespan: self.number(row, col::LIFESPAN),
            nozzle_price: self.number(row, col::NOZZLE_PRICE),
            nozzle_lifespan: self.number(row, col::NOZZLE_LIFE),
            bed_price: self.number(row, col::BED_PRICE),
            bed_lifespan: self.number(row, col::BED_LIFE),
            hourly_rate: self.number(row, col::HOURLY_RATE),
            failure_rate: self
                .cleaner
                .parse_number(self.get(row, col::FAILURE_RATE), NEUTRAL_MULTIPLIER),
            markup: self
                .cleaner
                .parse_number(self.get(row, col::MARKUP), NEUTRAL_MULTIPLIER),
            consumables: self.number(row, col::CONSUMABLES),
            custom_expenses: Vec::new(),
            include_marketplace_fee: self
                .cleaner
                .parse_bool(self.get(row, col::INCLUDE_MARKETPLACE_FEE)),
        };

        let breakdown = Breakdown {
            material_cost: self.number(row, col::MATERIAL_COST),
            electricity_cost: self.number(row, col::ELECTRICITY_COST),
            depreciation_cost: self.number(row, col::DEPRECIATION),
            nozzle_wear_cost: self.number(row, col::NOZZLE_WEAR),
            bed_wear_cost: self.number(row, col::BED_WEAR),
            labor_cost: self.number(row, col::LABOR_COST),
            consumables_cost: self.number(row, col::CONSUMABLES_COST),
            custom_expenses_cost: self.number(row, col::CUSTOM_EXPENSES),
            subtotal: self.number(row, col::SUBTOTAL),
            total_cost: self.number(row, col::TOTAL_COST),
            final_price: self.number(row, col::FINAL_PRICE),
            profit: self.number(row, col::PROFIT),
            marketplace_price: self.number(row, col::MARKETPLACE_PRICE),
            marketplace_profit: self.number(row, col::MARKETPLACE_PROFIT),
        };

        HistoryEntry {
            id: self
                .cleaner
                .normalize_null(self.get(row, col::ID))
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| generate_entry_id(now)),
            timestamp: self
                .cleaner
                .parse_timestamp(self.get(row, col::DATE))
                .unwrap_or(now),
            parameters,
            breakdown,
            note: self.cleaner.normalize_null(self.get(row, col::NOTE)),
            model_name: self.cleaner.normalize_null(self.get(row, col::MODEL_NAME)),
            model_link: self.cleaner.normalize_null(self.get(row, col::MODEL_LINK)),
            pinned: Some(self.cleaner.parse_bool(self.get(row, col::PINNED))),
        }
    }

    /// 读取列值，支持列名别名
    fn get<'a>(&self, row: &'a HashMap<String, String>, column: &str) -> Option<&'a str> {
        if let Some(v) = row.get(column) {
            return Some(v.as_str());
        }
        col::aliases(column)
            .iter()
            .find_map(|alias| row.get(*alias))
            .map(String::as_str)
    }

    fn number(&self, row: &HashMap<String, String>, column: &str) -> f64 {
        self.cleaner.parse_number(self.get(row, column), 0.0)
    }
}
