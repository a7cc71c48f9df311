//! 配產請求建立
//!
//! 將動態表的固定/預排需求正規化為配產請求。無法處理的記錄會被剔除並記錄原因，
//! 不會中斷整批建立。

use lineplan_core::{
    AllocationRequest, CodeLayout, DemandTable, DropReason, DroppedRecord, FixedEntry,
    MasterTables, QuantitySpec, RawEntry, RecurringEntry,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pattern::GroupPattern;

/// 單步處理結果：成功或剔除記錄
pub type Step<T> = std::result::Result<T, DroppedRecord>;

/// 展開後、尚未解析數量的記錄
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub source_index: usize,
    pub group: String,
    pub lines: Vec<String>,
    pub slots: Vec<u32>,
    pub quantity: QuantitySpec,
}

/// 數量已解析的記錄
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub source_index: usize,
    pub group: String,
    pub lines: Vec<String>,
    pub slots: Vec<u32>,
    pub quantity: Decimal,
}

/// 請求建立結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBuildOutput {
    /// 配產請求（依動態表順序）
    pub requests: Vec<AllocationRequest>,

    /// 被剔除的記錄
    pub dropped: Vec<DroppedRecord>,
}

/// 配產請求建立器
pub struct RequestBuilder<'a> {
    demand: &'a DemandTable,
    tables: &'a MasterTables,
    layout: &'a CodeLayout,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(demand: &'a DemandTable, tables: &'a MasterTables, layout: &'a CodeLayout) -> Self {
        Self {
            demand,
            tables,
            layout,
        }
    }

    /// 建立配產請求
    pub fn build(&self, entries: &[RawEntry]) -> RequestBuildOutput {
        tracing::info!("開始建立配產請求：動態表 {} 筆", entries.len());

        let expanded: Vec<Step<PendingRecord>> = entries
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| Self::expand(index, entry))
            .collect();

        // 各記錄互相獨立，並行正規化後依原順序收集
        let normalized: Vec<Step<ResolvedRecord>> = expanded
            .into_par_iter()
            .map(|step| step.and_then(|record| self.normalize(record)))
            .collect();

        let mut output = RequestBuildOutput::default();
        for step in normalized {
            match step {
                Ok(record) => {
                    let id = output.requests.len();
                    output.requests.push(AllocationRequest {
                        id,
                        group: record.group,
                        candidate_lines: record.lines,
                        candidate_slots: record.slots,
                        quantity: record.quantity,
                    });
                }
                Err(dropped) => {
                    tracing::debug!(
                        "剔除記錄: 列 {} 群組 {} 原因 {:?}",
                        dropped.source_index,
                        dropped.group,
                        dropped.reason
                    );
                    output.dropped.push(dropped);
                }
            }
        }

        if !output.dropped.is_empty() {
            tracing::warn!("共剔除 {} 筆記錄", output.dropped.len());
        }
        tracing::info!("配產請求建立完成：{} 筆", output.requests.len());

        output
    }

    /// 展開動態表記錄
    ///
    /// 週期班次記錄每個品項展開為一筆，時段 = 2 × (次數 − 1) + 班次位移。
    pub fn expand(source_index: usize, entry: &RawEntry) -> Vec<Step<PendingRecord>> {
        match entry {
            RawEntry::Fixed(fixed) => vec![Ok(Self::pending_from_fixed(source_index, fixed))],
            RawEntry::Recurring(recurring) => Self::expand_recurring(source_index, recurring),
        }
    }

    fn pending_from_fixed(source_index: usize, entry: &FixedEntry) -> PendingRecord {
        PendingRecord {
            source_index,
            group: entry.group.trim().to_string(),
            lines: dedup_in_order(entry.lines.iter().map(|l| l.trim().to_string())),
            slots: dedup_in_order(entry.slots.iter().copied()),
            quantity: entry.quantity,
        }
    }

    fn expand_recurring(source_index: usize, entry: &RecurringEntry) -> Vec<Step<PendingRecord>> {
        let lines = dedup_in_order(entry.lines.iter().map(|l| l.trim().to_string()));

        entry
            .items
            .iter()
            .map(|item| -> Step<PendingRecord> {
                let slot = item
                    .occurrence
                    .checked_sub(1)
                    .and_then(|o| o.checked_mul(2))
                    .and_then(|o| o.checked_add(entry.shift_offset))
                    .ok_or_else(|| DroppedRecord {
                        source_index,
                        group: item.item.clone(),
                        reason: DropReason::InvalidOccurrence(item.occurrence),
                    })?;

                Ok(PendingRecord {
                    source_index,
                    group: item.item.trim().to_string(),
                    lines: lines.clone(),
                    slots: vec![slot],
                    quantity: item.quantity,
                })
            })
            .collect()
    }

    /// 解析、檢查產線、檢查產能與時段
    fn normalize(&self, record: PendingRecord) -> Step<ResolvedRecord> {
        let record = self.resolve_quantity(record)?;
        let record = self.validate_lines(record)?;
        self.validate_capacity_and_time(record)
    }

    /// 解析數量：`ALL` 取群組比對到的需求總和
    ///
    /// 比對不到任何需求時剔除，不以 0 代替。
    pub fn resolve_quantity(&self, record: PendingRecord) -> Step<ResolvedRecord> {
        let quantity = match record.quantity {
            QuantitySpec::Units(quantity) => quantity,
            QuantitySpec::All => {
                let pattern = GroupPattern::new(&record.group);
                let matched: Vec<Decimal> = self
                    .demand
                    .iter()
                    .filter(|item| pattern.matches(&item.code))
                    .map(|item| item.required_quantity)
                    .collect();

                if matched.is_empty() {
                    return Err(dropped(
                        &record.group,
                        record.source_index,
                        DropReason::UnresolvableQuantity,
                    ));
                }
                matched.into_iter().sum()
            }
        };

        if quantity <= Decimal::ZERO {
            return Err(dropped(
                &record.group,
                record.source_index,
                DropReason::NonPositiveQuantity(quantity),
            ));
        }

        Ok(ResolvedRecord {
            source_index: record.source_index,
            group: record.group,
            lines: record.lines,
            slots: record.slots,
            quantity,
        })
    }

    /// 檢查產線
    ///
    /// 未指定產線時取所有可生產該專案的產線；指定的產線任一不可用即剔除。
    pub fn validate_lines(&self, mut record: ResolvedRecord) -> Step<ResolvedRecord> {
        let project = match self.layout.project_of(&record.group) {
            Some(project) => project.to_string(),
            None => {
                return Err(dropped(
                    &record.group,
                    record.source_index,
                    DropReason::UnresolvableProject,
                ))
            }
        };

        if record.lines.is_empty() {
            let lines = self.eligible_lines(&project);
            if lines.is_empty() {
                return Err(dropped(
                    &record.group,
                    record.source_index,
                    DropReason::NoEligibleLines(project),
                ));
            }
            record.lines = lines;
            return Ok(record);
        }

        for line in &record.lines {
            let profile = match self.tables.eligibility.profile(line) {
                Ok(profile) => profile,
                Err(_) => {
                    return Err(dropped(
                        &record.group,
                        record.source_index,
                        DropReason::UnknownLine(line.clone()),
                    ))
                }
            };
            if !project_allowed(&profile.projects, &project) {
                return Err(dropped(
                    &record.group,
                    record.source_index,
                    DropReason::IneligibleLine {
                        line: line.clone(),
                        project,
                    },
                ));
            }
        }

        Ok(record)
    }

    /// 檢查產能與時段
    ///
    /// 候選產線 × 候選時段的產能總和不足時剔除。此檢查為必要條件，
    /// 通過不代表一定配得進去。
    pub fn validate_capacity_and_time(&self, mut record: ResolvedRecord) -> Step<ResolvedRecord> {
        if record.slots.is_empty() {
            record.slots = self.tables.capacity.slots();
        }
        if record.slots.is_empty() {
            return Err(dropped(&record.group, record.source_index, DropReason::NoSlots));
        }

        let available = self.tables.capacity.total_over(&record.lines, &record.slots);
        if record.quantity > available {
            return Err(dropped(
                &record.group,
                record.source_index,
                DropReason::InsufficientCapacity {
                    required: record.quantity,
                    available,
                },
            ));
        }

        Ok(record)
    }

    fn eligible_lines(&self, project: &str) -> Vec<String> {
        self.tables
            .eligibility
            .iter()
            .filter(|(_, profile)| project_allowed(&profile.projects, project))
            .map(|(line, _)| line.clone())
            .collect()
    }
}

/// 專案前綴可含萬用字元，需與適用專案等長比對
fn project_allowed(projects: &std::collections::BTreeSet<String>, project: &str) -> bool {
    if !project.contains('*') {
        return projects.contains(project);
    }
    let pattern = GroupPattern::new(project);
    projects
        .iter()
        .any(|p| p.chars().count() == project.chars().count() && pattern.matches(p))
}

fn dropped(group: &str, source_index: usize, reason: DropReason) -> DroppedRecord {
    DroppedRecord {
        source_index,
        group: group.to_string(),
        reason,
    }
}

fn dedup_in_order<T, I>(values: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut out: Vec<T> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
