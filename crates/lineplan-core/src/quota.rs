//! 區塊配額模型

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{PlanError, Result};

/// 群組在單一時段的配額
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuota {
    /// 最大開線數
    pub max_active_lines: Option<u32>,

    /// 最大總產量
    pub max_quantity: Option<Decimal>,
}

/// 配額列類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaKind {
    /// 最大開線數
    MaxActiveLines,
    /// 最大產量
    MaxQuantity,
}

/// 主檔中的配額列（標籤形如 `max-active-lines-for-block-L`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaRow {
    pub label: String,
    pub slot: u32,
    pub value: Decimal,
}

const ACTIVE_LINE_PREFIXES: [&str; 2] = ["max-active-lines-for-block-", "max_lines_"];
const QUANTITY_PREFIXES: [&str; 2] = ["max-quantity-for-block-", "max_qty_"];

impl QuotaRow {
    pub fn new(label: impl Into<String>, slot: u32, value: Decimal) -> Self {
        Self {
            label: label.into(),
            slot,
            value,
        }
    }

    /// 解析標籤為（配額類型, 區塊），無法辨識時返回 None
    pub fn parse_label(label: &str) -> Option<(QuotaKind, String)> {
        let lower = label.trim().to_ascii_lowercase();
        let trimmed = label.trim();
        let strip = |prefixes: &[&str]| {
            prefixes.iter().find_map(|prefix| {
                lower
                    .starts_with(prefix)
                    .then(|| trimmed[prefix.len()..].to_string())
                    .filter(|block| !block.is_empty())
            })
        };

        if let Some(block) = strip(&ACTIVE_LINE_PREFIXES[..]) {
            return Some((QuotaKind::MaxActiveLines, block));
        }
        strip(&QUANTITY_PREFIXES[..]).map(|block| (QuotaKind::MaxQuantity, block))
    }
}

/// 配額表（序列化用的單列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupQuotaEntry {
    pub group: String,
    pub slot: u32,
    pub quota: GroupQuota,
}

/// 群組配額表：（群組, 時段）→ 配額
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GroupQuotaEntry>", into = "Vec<GroupQuotaEntry>")]
pub struct GroupQuotaTable {
    quotas: BTreeMap<(String, u32), GroupQuota>,
}

impl GroupQuotaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從主檔配額列建立（一次性正規化）
    pub fn from_rows(rows: &[QuotaRow]) -> Result<Self> {
        let mut table = Self::new();
        for row in rows {
            let (kind, block) = QuotaRow::parse_label(&row.label)
                .ok_or_else(|| PlanError::Config(format!("無法辨識的配額列: {}", row.label)))?;
            if row.value < Decimal::ZERO {
                return Err(PlanError::Config(format!(
                    "配額不可為負: {} 時段 {} = {}",
                    row.label, row.slot, row.value
                )));
            }
            match kind {
                QuotaKind::MaxActiveLines => {
                    let lines = row
                        .value
                        .trunc()
                        .to_u32()
                        .filter(|_| row.value.fract().is_zero())
                        .ok_or_else(|| {
                            PlanError::Config(format!(
                                "開線數必須為整數: {} 時段 {} = {}",
                                row.label, row.slot, row.value
                            ))
                        })?;
                    table.set_max_active_lines(block, row.slot, lines);
                }
                QuotaKind::MaxQuantity => table.set_max_quantity(block, row.slot, row.value),
            }
        }
        Ok(table)
    }

    pub fn set_max_active_lines(&mut self, group: impl Into<String>, slot: u32, lines: u32) {
        self.quotas
            .entry((group.into(), slot))
            .or_default()
            .max_active_lines = Some(lines);
    }

    pub fn set_max_quantity(&mut self, group: impl Into<String>, slot: u32, quantity: Decimal) {
        self.quotas
            .entry((group.into(), slot))
            .or_default()
            .max_quantity = Some(quantity);
    }

    /// 建構器模式：設置配額
    pub fn with_quota(mut self, group: impl Into<String>, slot: u32, quota: GroupQuota) -> Self {
        self.quotas.insert((group.into(), slot), quota);
        self
    }

    pub fn get(&self, group: &str, slot: u32) -> Option<&GroupQuota> {
        self.quotas.get(&(group.to_string(), slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32, &GroupQuota)> {
        self.quotas
            .iter()
            .map(|((group, slot), quota)| (group.as_str(), *slot, quota))
    }

    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }
}

impl From<Vec<GroupQuotaEntry>> for GroupQuotaTable {
    fn from(entries: Vec<GroupQuotaEntry>) -> Self {
        Self {
            quotas: entries
                .into_iter()
                .map(|e| ((e.group, e.slot), e.quota))
                .collect(),
        }
    }
}

impl From<GroupQuotaTable> for Vec<GroupQuotaEntry> {
    fn from(table: GroupQuotaTable) -> Self {
        table
            .quotas
            .into_iter()
            .map(|((group, slot), quota)| GroupQuotaEntry { group, slot, quota })
            .collect()
    }
}

/// 區塊產量佔比上下限（佔總產量的比例）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockPortion {
    pub block: String,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

impl BlockPortion {
    pub fn new(block: impl Into<String>, lower_limit: f64, upper_limit: f64) -> Self {
        Self {
            block: block.into(),
            lower_limit,
            upper_limit,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.lower_limit)
            || !in_range(self.upper_limit)
            || self.lower_limit > self.upper_limit
        {
            return Err(PlanError::Config(format!(
                "區塊 {} 佔比上下限無效: [{}, {}]",
                self.block, self.lower_limit, self.upper_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("max-active-lines-for-block-L", Some((QuotaKind::MaxActiveLines, "L")))]
    #[case("Max_qty_LB", Some((QuotaKind::MaxQuantity, "LB")))]
    #[case("MAX-QUANTITY-FOR-BLOCK-m2", Some((QuotaKind::MaxQuantity, "m2")))]
    #[case("max_lines_", None)]
    #[case("capacity", None)]
    fn test_parse_label(#[case] label: &str, #[case] expected: Option<(QuotaKind, &str)>) {
        let parsed = QuotaRow::parse_label(label);
        assert_eq!(
            parsed.as_ref().map(|(k, b)| (*k, b.as_str())),
            expected
        );
    }

    #[test]
    fn test_from_rows_merges_kinds() {
        let rows = vec![
            QuotaRow::new("max-active-lines-for-block-L", 1, Decimal::from(2)),
            QuotaRow::new("max-quantity-for-block-L", 1, Decimal::from(10)),
            QuotaRow::new("max-quantity-for-block-L", 2, Decimal::from(4)),
        ];
        let table = GroupQuotaTable::from_rows(&rows).unwrap();

        let q1 = table.get("L", 1).unwrap();
        assert_eq!(q1.max_active_lines, Some(2));
        assert_eq!(q1.max_quantity, Some(Decimal::from(10)));

        let q2 = table.get("L", 2).unwrap();
        assert_eq!(q2.max_active_lines, None);
        assert_eq!(q2.max_quantity, Some(Decimal::from(4)));
        assert!(table.get("M", 1).is_none());
    }

    #[test]
    fn test_from_rows_rejects_bad_rows() {
        let unknown = vec![QuotaRow::new("mystery", 1, Decimal::ONE)];
        assert!(GroupQuotaTable::from_rows(&unknown).is_err());

        let fractional = vec![QuotaRow::new(
            "max-active-lines-for-block-L",
            1,
            Decimal::new(15, 1),
        )];
        assert!(GroupQuotaTable::from_rows(&fractional).is_err());
    }

    #[test]
    fn test_block_portion_validate() {
        assert!(BlockPortion::new("L", 0.5, 1.0).validate().is_ok());
        assert!(BlockPortion::new("L", 0.6, 0.5).validate().is_err());
        assert!(BlockPortion::new("L", -0.1, 0.5).validate().is_err());
    }
}
