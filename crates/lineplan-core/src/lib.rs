//! # Lineplan Core
//!
//! 產線/時段配產的核心資料模型與類型定義

pub mod allocation;
pub mod calendar;
pub mod capacity;
pub mod config;
pub mod demand;
pub mod eligibility;
pub mod quota;
pub mod request;
pub mod tables;

// Re-export 主要類型
pub use allocation::{
    Allocation, AllocationSolution, CellRef, FailureReason, FailureRecord, FixedCommitment,
    ProductionRecord, ResultTable,
};
pub use calendar::SlotCalendar;
pub use capacity::{CapacityCell, CapacityTable, CellKey};
pub use config::{CodeField, CodeLayout, EngineConfig};
pub use demand::{DemandItem, DemandTable};
pub use eligibility::{EligibilityTable, LineProfile};
pub use quota::{BlockPortion, GroupQuota, GroupQuotaTable, QuotaKind, QuotaRow};
pub use request::{
    AllocationRequest, DropReason, DroppedRecord, FixedEntry, QuantitySpec, RawEntry,
    RecurringEntry, RecurringItem,
};
pub use tables::MasterTables;

/// 配產引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("產線未定義於適用性表: {0}")]
    UnknownLine(String),

    #[error("配置錯誤: {0}")]
    Config(String),

    #[error("資料完整性錯誤: {0}")]
    DataIntegrity(String),

    #[error("求解器錯誤: {0}")]
    Solver(String),

    #[error("配置解析錯誤: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
