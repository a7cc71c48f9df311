//! 求解排程
//!
//! 求解在背景執行緒進行，主執行緒依時間預算等待並定期回報進度。
//! 逾時不取消求解，直接放棄其結果並返回基準結果。

use lineplan_core::{EngineConfig, PlanError, ResultTable};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::capacity::CapacityPlanner;
use crate::model::OptimizationProblem;
use crate::OptimizationOutcome;

/// 進度回報介面
pub trait ProgressSink {
    /// 定期回報（剩餘百分比, 剩餘秒數），依經過時間與時間預算估算
    fn progress(&mut self, percent_remaining: u32, seconds_remaining: u64);

    /// 求解結束
    fn finished(&mut self, outcome: &OptimizationOutcome);
}

/// 以 tracing 輸出進度
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn progress(&mut self, percent_remaining: u32, seconds_remaining: u64) {
        tracing::info!(
            "求解中：剩餘 {}%（約 {} 秒）",
            percent_remaining,
            seconds_remaining
        );
    }

    fn finished(&mut self, outcome: &OptimizationOutcome) {
        tracing::info!("求解結束：{}", outcome.label());
    }
}

/// 依經過時間估算剩餘進度
pub fn estimate_remaining(elapsed: Duration, budget: Duration) -> (u32, u64) {
    if budget.is_zero() || elapsed >= budget {
        return (0, 0);
    }
    let remaining = budget - elapsed;
    let percent = (remaining.as_secs_f64() / budget.as_secs_f64() * 100.0).floor() as u32;
    (percent.min(100), remaining.as_secs())
}

/// 求解排程器
#[derive(Debug, Clone)]
pub struct Scheduler {
    time_budget: Option<Duration>,
    progress_interval: Duration,
    big_m: Option<f64>,
}

impl Scheduler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            time_budget: config.time_budget_secs.map(Duration::from_secs),
            progress_interval: Duration::from_millis(config.progress_interval_ms.max(1)),
            big_m: config.big_m,
        }
    }

    /// 在時間預算內求解
    ///
    /// 逾時返回 `NoImprovement`，內含未經修改的基準結果。
    /// 未設時間預算時等待求解完成。
    pub fn run(
        &self,
        problem: OptimizationProblem,
        baseline: ResultTable,
        sink: &mut dyn ProgressSink,
    ) -> lineplan_core::Result<OptimizationOutcome> {
        problem.tables.validate()?;
        let big_m = CapacityPlanner::new(&problem.tables).effective_big_m(self.big_m)?;

        tracing::info!(
            "開始最佳化：品項 {} 個，預排承諾 {} 筆，時間預算 {:?}",
            problem.targets.len(),
            problem.commitments.len(),
            self.time_budget
        );

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("lineplan-solver".to_string())
            .spawn(move || {
                // 逾時後接收端已關閉，送出失敗可忽略
                let _ = tx.send(problem.solve(big_m));
            })
            .map_err(|e| PlanError::Solver(format!("無法啟動求解執行緒: {}", e)))?;

        let start_time = Instant::now();
        let outcome = loop {
            let elapsed = start_time.elapsed();
            let wait = match self.time_budget {
                Some(budget) if elapsed >= budget => {
                    tracing::warn!("求解逾時 {:?}，返回基準結果", budget);
                    break OptimizationOutcome::NoImprovement(baseline);
                }
                Some(budget) => self.progress_interval.min(budget - elapsed),
                None => self.progress_interval,
            };

            match rx.recv_timeout(wait) {
                Ok(result) => break result?,
                Err(RecvTimeoutError::Timeout) => {
                    let (percent, seconds) = match self.time_budget {
                        Some(budget) => estimate_remaining(start_time.elapsed(), budget),
                        // 無預算時無從估算剩餘時間
                        None => (100, 0),
                    };
                    sink.progress(percent, seconds);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PlanError::Solver("求解執行緒異常結束".to_string()));
                }
            }
        };

        sink.finished(&outcome);
        Ok(outcome)
    }
}
