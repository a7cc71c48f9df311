//! # Lineplan
//!
//! 產線/時段配產引擎：由動態表建立配產請求，以貪婪拆分或全域整數規劃配產，
//! 最後將生產記錄組裝回需求資料。
//!
//! ```no_run
//! use lineplan::{build_requests, run_greedy_allocation, EngineConfig};
//! # fn demo(
//! #     entries: &[lineplan::RawEntry],
//! #     demand: &lineplan::DemandTable,
//! #     tables: &lineplan::MasterTables,
//! # ) -> lineplan::Result<()> {
//! let config = EngineConfig::default();
//! let built = build_requests(entries, demand, tables, &config);
//! let outcome = run_greedy_allocation(&built.requests, tables)?;
//! println!("滿足 {} 筆", outcome.satisfied.len());
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use lineplan_calc::{
    AllocationAttempt, AllocationLedger, AssembledRow, GreedyAllocator, GreedyOutcome,
    GroupPattern, RequestBuildOutput, RequestBuilder, RequestFailure, ResultAssembler,
};
pub use lineplan_core::*;
pub use lineplan_optimizer::{
    CapacityPlanner, InfeasibleReport, OptimizationOutcome, OptimizationProblem,
    OptimizationResult, OptimizationScope, ProgressSink, Scheduler, TracingProgress, BIG_M,
};
pub use rust_decimal::Decimal;

/// 將動態表記錄正規化為配產請求
///
/// 無法處理的記錄會列在 `dropped`，不影響其他記錄。
pub fn build_requests(
    entries: &[RawEntry],
    demand: &DemandTable,
    tables: &MasterTables,
    config: &EngineConfig,
) -> RequestBuildOutput {
    RequestBuilder::new(demand, tables, &config.code_layout).build(entries)
}

/// 依請求順序執行貪婪拆分配產
pub fn run_greedy_allocation(
    requests: &[AllocationRequest],
    tables: &MasterTables,
) -> Result<GreedyOutcome> {
    GreedyAllocator::run(requests, tables)
}

/// 在配置的時間預算內執行全域最佳化
///
/// 逾時返回 `NoImprovement(baseline)`。
pub fn run_optimization(
    problem: OptimizationProblem,
    baseline: ResultTable,
    config: &EngineConfig,
    sink: &mut dyn ProgressSink,
) -> Result<OptimizationOutcome> {
    config.validate()?;
    Scheduler::new(config).run(problem, baseline, sink)
}

/// 將生產記錄組裝回需求資料
pub fn assemble_results(
    results: &ResultTable,
    demand: &DemandTable,
    config: &EngineConfig,
) -> Result<Vec<AssembledRow>> {
    ResultAssembler::assemble(results, demand, &config.calendar)
}
