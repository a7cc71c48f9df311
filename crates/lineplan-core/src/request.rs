//! 預排（固定）需求與配產請求模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 數量設定：明確數量或「全部剩餘需求」
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantitySpec {
    /// 明確數量
    Units(Decimal),
    /// 群組比對到的全部需求
    All,
}

impl QuantitySpec {
    /// 解析動態表的數量欄位（`ALL` 不分大小寫）
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        raw.parse::<Decimal>().ok().map(Self::Units)
    }
}

/// 單筆固定需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEntry {
    /// 群組碼（可含 `*` 單字元萬用字元）
    pub group: String,

    /// 指定產線（空表示依專案適用性決定）
    pub lines: Vec<String>,

    /// 指定時段（空表示所有時段）
    pub slots: Vec<u32>,

    /// 數量
    pub quantity: QuantitySpec,
}

impl FixedEntry {
    pub fn new(group: impl Into<String>, quantity: QuantitySpec) -> Self {
        Self {
            group: group.into(),
            lines: Vec::new(),
            slots: Vec::new(),
            quantity,
        }
    }

    /// 建構器模式：指定產線
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// 建構器模式：指定時段
    pub fn with_slots(mut self, slots: Vec<u32>) -> Self {
        self.slots = slots;
        self
    }
}

/// 週期班次計畫中的一個品項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringItem {
    pub item: String,
    /// 第幾次出現（從 1 開始）
    pub occurrence: u32,
    pub quantity: QuantitySpec,
}

/// 依週期班次展開的固定需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEntry {
    /// 指定產線（空表示依專案適用性決定）
    pub lines: Vec<String>,

    /// 班次位移（例如白班 1、夜班 2）
    pub shift_offset: u32,

    /// 品項列表
    pub items: Vec<RecurringItem>,
}

/// 動態表原始資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawEntry {
    Fixed(FixedEntry),
    Recurring(RecurringEntry),
}

/// 配產請求（建立後不可變）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// 請求ID（依建立順序遞增）
    pub id: usize,

    /// 群組碼
    pub group: String,

    /// 候選產線（順序即配產順序）
    pub candidate_lines: Vec<String>,

    /// 候選時段（順序即配產順序）
    pub candidate_slots: Vec<u32>,

    /// 需求數量
    pub quantity: Decimal,
}

/// 被剔除的原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropReason {
    /// 週期班次序號無效
    InvalidOccurrence(u32),
    /// `ALL` 無比對到任何需求
    UnresolvableQuantity,
    /// 數量不為正
    NonPositiveQuantity(Decimal),
    /// 群組碼無法解析專案前綴
    UnresolvableProject,
    /// 產線不在適用性表
    UnknownLine(String),
    /// 產線不可生產該專案
    IneligibleLine { line: String, project: String },
    /// 專案沒有任何可用產線
    NoEligibleLines(String),
    /// 沒有任何時段
    NoSlots,
    /// 理論產能不足
    InsufficientCapacity { required: Decimal, available: Decimal },
}

/// 被剔除的記錄（供資料品質稽核）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    /// 原始動態表中的列序
    pub source_index: usize,

    /// 群組碼
    pub group: String,

    /// 剔除原因
    pub reason: DropReason,
}
