//! 主檔表集合
//!
//! 每次配產執行持有自己的一份表，不與其他執行共享可變狀態。

use serde::{Deserialize, Serialize};

use crate::capacity::CapacityTable;
use crate::eligibility::EligibilityTable;
use crate::quota::{BlockPortion, GroupQuotaTable};
use crate::{PlanError, Result};

/// 主檔表：適用性、產能、區塊配額、區塊佔比
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterTables {
    pub eligibility: EligibilityTable,
    pub capacity: CapacityTable,
    pub quotas: GroupQuotaTable,
    pub portions: Vec<BlockPortion>,
}

impl MasterTables {
    pub fn new(eligibility: EligibilityTable, capacity: CapacityTable) -> Self {
        Self {
            eligibility,
            capacity,
            quotas: GroupQuotaTable::new(),
            portions: Vec::new(),
        }
    }

    /// 建構器模式：設置群組配額
    pub fn with_quotas(mut self, quotas: GroupQuotaTable) -> Self {
        self.quotas = quotas;
        self
    }

    /// 建構器模式：設置區塊佔比
    pub fn with_portions(mut self, portions: Vec<BlockPortion>) -> Self {
        self.portions = portions;
        self
    }

    /// 檢查配置一致性（不一致時立即失敗）
    ///
    /// - 產能表中的每條產線必須在適用性表中
    /// - 區塊佔比必須引用已知區塊且上下限有效
    /// - 區塊配額必須引用已知區塊
    pub fn validate(&self) -> Result<()> {
        for line in self.capacity.lines() {
            if !self.eligibility.contains(&line) {
                return Err(PlanError::UnknownLine(line));
            }
        }

        let blocks = self.eligibility.blocks();
        for portion in &self.portions {
            portion.validate()?;
            if !blocks.contains(&portion.block) {
                return Err(PlanError::Config(format!(
                    "區塊佔比引用未知區塊: {}",
                    portion.block
                )));
            }
        }

        for (group, slot, _) in self.quotas.iter() {
            if !blocks.contains(group) {
                return Err(PlanError::Config(format!(
                    "區塊配額引用未知區塊: {} 時段 {}",
                    group, slot
                )));
            }
        }

        Ok(())
    }
}
