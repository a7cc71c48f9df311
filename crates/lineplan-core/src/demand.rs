//! 需求模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CodeLayout;
use crate::{PlanError, Result};

/// 需求品項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandItem {
    /// 料號
    pub code: String,

    /// 出貨目的地
    pub destination: String,

    /// 需求（生產）數量
    pub required_quantity: Decimal,

    /// 出貨數量
    pub ship_quantity: Decimal,

    /// 交期
    pub due_date: Option<NaiveDate>,

    /// 專案前綴（由料號推導）
    pub project: String,

    /// 區塊（由料號推導）
    pub block: String,

    /// 顏色/規格變體（由料號推導）
    pub variant: String,
}

impl DemandItem {
    /// 依料號版面創建需求品項
    ///
    /// 料號長度不足以擷取專案或區塊時返回錯誤。
    pub fn new(
        code: impl Into<String>,
        destination: impl Into<String>,
        required_quantity: Decimal,
        layout: &CodeLayout,
    ) -> Result<Self> {
        let code = code.into();
        let project = layout
            .project_of(&code)
            .ok_or_else(|| PlanError::DataIntegrity(format!("料號無法解析專案: {}", code)))?
            .to_string();
        let block = layout
            .block_of(&code)
            .ok_or_else(|| PlanError::DataIntegrity(format!("料號無法解析區塊: {}", code)))?
            .to_string();
        let variant = layout.variant_of(&code).unwrap_or_default().to_string();

        Ok(Self {
            code,
            destination: destination.into(),
            required_quantity,
            ship_quantity: required_quantity,
            due_date: None,
            project,
            block,
            variant,
        })
    }

    /// 建構器模式：設置出貨數量
    pub fn with_ship_quantity(mut self, quantity: Decimal) -> Self {
        self.ship_quantity = quantity;
        self
    }

    /// 建構器模式：設置交期
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// 需求表（料號唯一）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemandTable {
    items: BTreeMap<String, DemandItem>,
}

impl DemandTable {
    /// 創建需求表，料號重複時返回錯誤
    pub fn new(items: Vec<DemandItem>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for item in items {
            let code = item.code.clone();
            if map.insert(code.clone(), item).is_some() {
                return Err(PlanError::DataIntegrity(format!("需求料號重複: {}", code)));
            }
        }
        Ok(Self { items: map })
    }

    pub fn get(&self, code: &str) -> Option<&DemandItem> {
        self.items.get(code)
    }

    /// 依料號排序的品項
    pub fn iter(&self) -> impl Iterator<Item = &DemandItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 總需求量
    pub fn total_required(&self) -> Decimal {
        self.items.values().map(|item| item.required_quantity).sum()
    }
}
