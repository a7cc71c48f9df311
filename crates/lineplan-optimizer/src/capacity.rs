//! 產能規劃：Big-M 推導與產能統計

use lineplan_core::{MasterTables, PlanError, ResultTable};
use rust_decimal::Decimal;

use crate::model::to_f64;

/// Big-M 參考值
///
/// 開線連結約束 `total ≤ M·y` 中的 M 必須不小於任一產能格的產能，
/// 否則會錯誤地限制產量。實際使用值由產能表推導，不直接使用此常數。
pub const BIG_M: f64 = 10_000_000.0;

/// 產能規劃器
pub struct CapacityPlanner<'a> {
    tables: &'a MasterTables,
}

impl<'a> CapacityPlanner<'a> {
    pub fn new(tables: &'a MasterTables) -> Self {
        Self { tables }
    }

    /// 最大單格產能
    pub fn max_cell(&self) -> f64 {
        to_f64(self.tables.capacity.max_cell())
    }

    /// 實際使用的 Big-M
    ///
    /// 未設定時取最大單格產能（至少 1）；設定值小於最大單格產能時為配置錯誤。
    pub fn effective_big_m(&self, configured: Option<f64>) -> lineplan_core::Result<f64> {
        let max_cell = self.max_cell();
        match configured {
            Some(big_m) if !big_m.is_finite() || big_m < max_cell => Err(PlanError::Config(
                format!("Big-M ({}) 小於最大單格產能 ({})", big_m, max_cell),
            )),
            Some(big_m) => Ok(big_m),
            None => {
                let derived = max_cell.max(1.0);
                if derived > BIG_M {
                    tracing::warn!("最大單格產能 {} 超過 Big-M 參考值 {}", derived, BIG_M);
                }
                Ok(derived)
            }
        }
    }

    /// 總產能
    pub fn total_capacity(&self) -> Decimal {
        self.tables.capacity.iter().map(|(_, capacity)| capacity).sum()
    }

    /// 產能利用率（0.0 ~ 1.0）
    pub fn utilization(&self, results: &ResultTable) -> f64 {
        let total = self.total_capacity();
        if total <= Decimal::ZERO {
            return 0.0;
        }
        to_f64(results.total()) / to_f64(total)
    }
}
