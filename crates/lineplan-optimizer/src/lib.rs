//! # Lineplan Optimizer
//!
//! 全域整數規劃最佳化（產能、約束、求解排程）

pub mod capacity;
pub mod constraint;
pub mod model;
pub mod scheduling;

// Re-export 主要類型
pub use capacity::{CapacityPlanner, BIG_M};
pub use model::{DemandTarget, OptimizationProblem, OptimizationScope};
pub use scheduling::{ProgressSink, Scheduler, TracingProgress};

use lineplan_core::{FixedCommitment, ResultTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 可行解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub run_id: Uuid,

    /// 生產記錄
    pub results: ResultTable,

    pub total_demand: Decimal,
    pub total_produced: Decimal,

    /// 求解耗時（毫秒）
    pub elapsed_ms: u128,
}

impl OptimizationResult {
    /// 未滿足需求量
    pub fn shortfall(&self) -> Decimal {
        (self.total_demand - self.total_produced).max(Decimal::ZERO)
    }
}

/// 不可行報告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibleReport {
    pub run_id: Uuid,
    pub reason: String,

    /// 無候選產能格的預排承諾
    pub unreachable: Vec<FixedCommitment>,
}

/// 最佳化結果分類
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizationOutcome {
    /// 總產量達到總需求
    Solved(OptimizationResult),

    /// 可行但產量低於需求
    UnderTarget(OptimizationResult),

    /// 無可行解
    Infeasible(InfeasibleReport),

    /// 逾時，返回未修改的基準結果
    NoImprovement(ResultTable),
}

impl OptimizationOutcome {
    /// 可行解（Solved 或 UnderTarget）
    pub fn result(&self) -> Option<&OptimizationResult> {
        match self {
            Self::Solved(result) | Self::UnderTarget(result) => Some(result),
            _ => None,
        }
    }

    /// 可交給結果組裝的生產記錄
    pub fn results(&self) -> Option<&ResultTable> {
        match self {
            Self::Solved(result) | Self::UnderTarget(result) => Some(&result.results),
            Self::NoImprovement(baseline) => Some(baseline),
            Self::Infeasible(_) => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.result().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Solved(_) => "solved",
            Self::UnderTarget(_) => "under_target",
            Self::Infeasible(_) => "infeasible",
            Self::NoImprovement(_) => "no_improvement",
        }
    }
}
