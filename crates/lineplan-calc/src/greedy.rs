//! 貪婪拆分配產
//!
//! 依請求給定的候選產線、候選時段順序逐格配產，單次掃描、先到先配。
//! 先處理的請求可能擠壓後續請求，這是結果可重現的前提，不做回頭重排。

use lineplan_core::{
    Allocation, AllocationRequest, AllocationSolution, CapacityTable, EligibilityTable,
    FailureReason, FailureRecord, FixedCommitment, GroupQuotaTable, MasterTables,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// 配產帳本：單次執行的剩餘產能與群組使用量
///
/// 每次執行持有自己的產能副本，不影響原始表。
#[derive(Debug, Clone)]
pub struct AllocationLedger<'a> {
    remaining: CapacityTable,
    active_lines: BTreeMap<(String, u32), BTreeSet<String>>,
    used_quantity: BTreeMap<(String, u32), Decimal>,
    quotas: &'a GroupQuotaTable,
    eligibility: &'a EligibilityTable,
}

impl<'a> AllocationLedger<'a> {
    pub fn new(tables: &'a MasterTables) -> Self {
        Self {
            remaining: tables.capacity.clone(),
            active_lines: BTreeMap::new(),
            used_quantity: BTreeMap::new(),
            quotas: &tables.quotas,
            eligibility: &tables.eligibility,
        }
    }

    /// 剩餘產能
    pub fn remaining(&self, line: &str, slot: u32) -> Decimal {
        self.remaining.get(line, slot)
    }

    /// 群組在時段的開線數
    pub fn used_lines(&self, group: &str, slot: u32) -> usize {
        self.active_lines
            .get(&(group.to_string(), slot))
            .map(BTreeSet::len)
            .unwrap_or(0)
    }

    /// 群組在時段的已配產量
    pub fn used_quantity(&self, group: &str, slot: u32) -> Decimal {
        self.used_quantity
            .get(&(group.to_string(), slot))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn is_active(&self, group: &str, slot: u32, line: &str) -> bool {
        self.active_lines
            .get(&(group.to_string(), slot))
            .is_some_and(|lines| lines.contains(line))
    }

    /// 記錄既有使用量（不扣產能），用於延續先前的配產結果
    pub fn record_usage(&mut self, group: &str, slot: u32, line: &str, quantity: Decimal) {
        self.active_lines
            .entry((group.to_string(), slot))
            .or_default()
            .insert(line.to_string());
        *self
            .used_quantity
            .entry((group.to_string(), slot))
            .or_insert(Decimal::ZERO) += quantity;
    }

    fn commit(&mut self, group: &str, slot: u32, line: &str, quantity: Decimal) {
        self.remaining.consume(line, slot, quantity);
        self.record_usage(group, slot, line, quantity);
    }
}

/// 單一請求的配產結果
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationAttempt {
    pub allocations: Vec<Allocation>,
    pub failures: Vec<FailureRecord>,
    pub allocated: Decimal,
    pub success: bool,
}

/// 請求失敗記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub request_id: usize,
    pub record: FailureRecord,
}

/// 貪婪配產執行結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedyOutcome {
    /// 執行ID
    pub run_id: Uuid,

    /// 配產解
    pub solution: AllocationSolution,

    /// 失敗記錄（依請求順序）
    pub failures: Vec<RequestFailure>,

    /// 完全滿足的請求
    pub satisfied: Vec<usize>,

    /// 部分或完全失敗的請求
    pub failed: Vec<usize>,
}

impl GreedyOutcome {
    /// 請求的失敗記錄
    pub fn failures_for(&self, request_id: usize) -> Vec<&FailureRecord> {
        self.failures
            .iter()
            .filter(|f| f.request_id == request_id)
            .map(|f| &f.record)
            .collect()
    }

    /// 轉為最佳化的預排承諾
    pub fn commitments(&self, requests: &[AllocationRequest]) -> Vec<FixedCommitment> {
        requests
            .iter()
            .flat_map(|request| {
                self.solution
                    .allocations(request.id)
                    .iter()
                    .map(move |a| FixedCommitment {
                        group: request.group.clone(),
                        line: a.line.clone(),
                        slot: a.slot,
                        quantity: a.quantity,
                    })
            })
            .collect()
    }
}

/// 貪婪拆分配產器
pub struct GreedyAllocator;

impl GreedyAllocator {
    /// 對單一請求配產
    ///
    /// 產能用盡、開線數已滿、可配量為 0 時跳過該格；群組產量已達上限時終止該請求。
    /// 數量為 0 的請求不佔用任何格子，直接視為滿足。
    /// 產線不在適用性表時返回配置錯誤。
    pub fn allocate(
        request: &AllocationRequest,
        ledger: &mut AllocationLedger<'_>,
    ) -> lineplan_core::Result<AllocationAttempt> {
        if request.quantity <= Decimal::ZERO {
            for line in &request.candidate_lines {
                ledger.eligibility.block_of(line)?;
            }
            return Ok(AllocationAttempt {
                allocations: Vec::new(),
                failures: Vec::new(),
                allocated: Decimal::ZERO,
                success: true,
            });
        }

        let mut remaining = request.quantity;
        let mut allocations = Vec::new();
        let mut failures = Vec::new();

        for line in &request.candidate_lines {
            let group = ledger.eligibility.block_of(line)?.to_string();

            for &slot in &request.candidate_slots {
                let capacity = ledger.remaining(line, slot);
                if capacity <= Decimal::ZERO {
                    failures.push(FailureRecord::at(
                        line,
                        slot,
                        FailureReason::CapacityExhausted,
                        Some(Decimal::ZERO),
                        remaining,
                    ));
                    continue;
                }

                let quota = ledger.quotas.get(&group, slot).copied().unwrap_or_default();

                if let Some(max_lines) = quota.max_active_lines {
                    if !ledger.is_active(&group, slot, line)
                        && ledger.used_lines(&group, slot) >= max_lines as usize
                    {
                        failures.push(FailureRecord::at(
                            line,
                            slot,
                            FailureReason::LineQuotaExceeded,
                            None,
                            remaining,
                        ));
                        continue;
                    }
                }

                let headroom = quota
                    .max_quantity
                    .map(|max| max - ledger.used_quantity(&group, slot));
                if let Some(headroom) = headroom {
                    if headroom <= Decimal::ZERO {
                        failures.push(FailureRecord::at(
                            line,
                            slot,
                            FailureReason::QuantityQuotaExceeded,
                            Some(Decimal::ZERO),
                            remaining,
                        ));
                        tracing::debug!(
                            "請求 {} 群組 {} 時段 {} 產量已達上限，終止",
                            request.id,
                            group,
                            slot
                        );
                        return Ok(AllocationAttempt {
                            allocated: request.quantity - remaining,
                            allocations,
                            failures,
                            success: false,
                        });
                    }
                }

                let mut allocatable = remaining.min(capacity);
                if let Some(headroom) = headroom {
                    allocatable = allocatable.min(headroom);
                }
                if allocatable <= Decimal::ZERO {
                    failures.push(FailureRecord::at(
                        line,
                        slot,
                        FailureReason::ZeroAllocatable,
                        Some(capacity),
                        remaining,
                    ));
                    continue;
                }

                ledger.commit(&group, slot, line, allocatable);
                allocations.push(Allocation {
                    line: line.clone(),
                    slot,
                    quantity: allocatable,
                });
                remaining -= allocatable;

                if remaining <= Decimal::ZERO {
                    return Ok(AllocationAttempt {
                        allocated: request.quantity,
                        allocations,
                        failures: Vec::new(),
                        success: true,
                    });
                }
            }
        }

        failures.push(FailureRecord::unmet(remaining));
        Ok(AllocationAttempt {
            allocated: request.quantity - remaining,
            allocations,
            failures,
            success: false,
        })
    }

    /// 依輸入順序對所有請求配產
    ///
    /// 單一請求失敗不影響其他請求。
    pub fn run(
        requests: &[AllocationRequest],
        tables: &MasterTables,
    ) -> lineplan_core::Result<GreedyOutcome> {
        tables.validate()?;

        let run_id = Uuid::new_v4();
        tracing::info!("開始貪婪配產 [{}]：請求 {} 筆", run_id, requests.len());
        let start_time = std::time::Instant::now();

        let mut ledger = AllocationLedger::new(tables);
        let mut outcome = GreedyOutcome {
            run_id,
            solution: AllocationSolution::new(),
            failures: Vec::new(),
            satisfied: Vec::new(),
            failed: Vec::new(),
        };

        for request in requests {
            let attempt = Self::allocate(request, &mut ledger)?;

            for allocation in attempt.allocations {
                outcome.solution.push(request.id, allocation);
            }

            if attempt.success {
                outcome.satisfied.push(request.id);
            } else {
                tracing::debug!(
                    "請求 {} ({}) 未完全滿足：{} / {}",
                    request.id,
                    request.group,
                    attempt.allocated,
                    request.quantity
                );
                outcome.failed.push(request.id);
                outcome
                    .failures
                    .extend(attempt.failures.into_iter().map(|record| RequestFailure {
                        request_id: request.id,
                        record,
                    }));
            }
        }

        tracing::info!(
            "貪婪配產完成，耗時 {:?}：滿足 {} 筆，未滿足 {} 筆",
            start_time.elapsed(),
            outcome.satisfied.len(),
            outcome.failed.len()
        );

        Ok(outcome)
    }
}
