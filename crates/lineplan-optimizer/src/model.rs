//! 最佳化問題模型
//!
//! 變數 x[品項, 產線, 時段] 僅在品項專案可於產線生產時建立；
//! y[產線, 時段] 為開線二元變數。目標為最大化總產量。

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use lineplan_calc::GroupPattern;
use lineplan_core::{
    CellKey, DemandTable, FixedCommitment, MasterTables, ProductionRecord, ResultTable,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constraint;
use crate::{InfeasibleReport, OptimizationOutcome, OptimizationResult};

/// 最佳化範圍
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationScope {
    /// 完整最佳化（含區塊佔比）
    #[default]
    Full,
    /// 預排階段（不含區塊佔比）
    PreAssignment,
}

/// 品項需求目標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandTarget {
    pub item: String,
    pub project: String,
    pub quantity: Decimal,
}

/// 候選產能格（品項可在該格生產）
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCell {
    pub item: usize,
    pub line: String,
    pub slot: u32,

    /// 變數上界：min(產能, 需求)
    pub upper_bound: f64,
}

/// 已建立的模型變數
pub(crate) struct CellVariable {
    pub item: usize,
    pub line: String,
    pub slot: u32,
    pub var: Variable,
}

pub(crate) struct ModelVariables {
    pub cells: Vec<CellVariable>,
    pub active: BTreeMap<CellKey, Variable>,
}

/// 最佳化問題（持有自己的主檔副本，可移至求解執行緒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationProblem {
    pub targets: Vec<DemandTarget>,
    pub tables: MasterTables,
    pub commitments: Vec<FixedCommitment>,
    pub scope: OptimizationScope,
}

impl OptimizationProblem {
    /// 由需求表與主檔建立問題，主檔不一致時立即失敗
    pub fn from_tables(
        demand: &DemandTable,
        tables: &MasterTables,
        scope: OptimizationScope,
    ) -> lineplan_core::Result<Self> {
        tables.validate()?;

        let targets = demand
            .iter()
            .filter(|item| item.required_quantity > Decimal::ZERO)
            .map(|item| DemandTarget {
                item: item.code.clone(),
                project: item.project.clone(),
                quantity: item.required_quantity,
            })
            .collect();

        Ok(Self {
            targets,
            tables: tables.clone(),
            commitments: Vec::new(),
            scope,
        })
    }

    /// 建構器模式：設置預排承諾
    pub fn with_commitments(mut self, commitments: Vec<FixedCommitment>) -> Self {
        self.commitments = commitments;
        self
    }

    /// 總需求量
    pub fn total_demand(&self) -> Decimal {
        self.targets.iter().map(|t| t.quantity).sum()
    }

    /// 列出所有候選產能格（依品項、產能格順序）
    pub fn candidate_cells(&self) -> lineplan_core::Result<Vec<CandidateCell>> {
        let mut cells = Vec::new();
        for (index, target) in self.targets.iter().enumerate() {
            let demand = to_f64(target.quantity);
            for (key, capacity) in self.tables.capacity.iter() {
                if !self.tables.eligibility.is_eligible(&key.line, &target.project)? {
                    continue;
                }
                cells.push(CandidateCell {
                    item: index,
                    line: key.line.clone(),
                    slot: key.slot,
                    upper_bound: to_f64(capacity).min(demand),
                });
            }
        }
        Ok(cells)
    }

    /// 沒有任何候選格可滿足的預排承諾
    pub fn unreachable_commitments(&self) -> lineplan_core::Result<Vec<FixedCommitment>> {
        let cells = self.candidate_cells()?;
        Ok(self
            .commitments
            .iter()
            .filter(|c| c.quantity > Decimal::ZERO)
            .filter(|c| {
                let pattern = GroupPattern::new(&c.group);
                !cells.iter().any(|cell| {
                    cell.line == c.line
                        && cell.slot == c.slot
                        && cell.upper_bound > 0.0
                        && pattern.matches(&self.targets[cell.item].item)
                })
            })
            .cloned()
            .collect())
    }

    /// 建立模型並執行單次求解
    pub fn solve(&self, big_m: f64) -> lineplan_core::Result<OptimizationOutcome> {
        let run_id = Uuid::new_v4();
        let start_time = std::time::Instant::now();

        let unreachable = self.unreachable_commitments()?;
        if !unreachable.is_empty() {
            tracing::warn!("[{}] {} 筆預排承諾無可用產能格", run_id, unreachable.len());
            return Ok(OptimizationOutcome::Infeasible(InfeasibleReport {
                run_id,
                reason: "預排承諾無可用產能格".to_string(),
                unreachable,
            }));
        }

        let candidates = self.candidate_cells()?;
        let mut vars = ProblemVariables::new();
        let model_vars = build_variables(&mut vars, candidates);

        tracing::info!(
            "[{}] 建立模型：變數 {} 個，開線變數 {} 個",
            run_id,
            model_vars.cells.len(),
            model_vars.active.len()
        );

        let mut objective = Expression::with_capacity(model_vars.cells.len());
        for cell in &model_vars.cells {
            objective.add_mul(1.0, cell.var);
        }

        let mut problem = vars.maximise(objective).using(default_solver);

        let mut constraints = Vec::new();
        constraints.extend(constraint::demand_ceiling(&model_vars, &self.targets));
        constraints.extend(constraint::capacity(&model_vars, &self.tables.capacity));
        if self.scope == OptimizationScope::Full {
            constraints.extend(constraint::block_portions(&model_vars, &self.tables)?);
        }
        constraints.extend(constraint::active_line_linkage(&model_vars, big_m));
        constraints.extend(constraint::group_quotas(&model_vars, &self.tables)?);
        constraints.extend(constraint::commitments(
            &model_vars,
            &self.targets,
            &self.commitments,
        ));

        for c in constraints {
            problem = problem.with(c);
        }

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                tracing::warn!("[{}] 模型不可行", run_id);
                return Ok(OptimizationOutcome::Infeasible(InfeasibleReport {
                    run_id,
                    reason: "求解器回報無可行解".to_string(),
                    unreachable: Vec::new(),
                }));
            }
            Err(e) => return Err(lineplan_core::PlanError::Solver(e.to_string())),
        };

        let records = model_vars
            .cells
            .iter()
            .filter_map(|cell| {
                let quantity = Decimal::from_f64(solution.value(cell.var).round())?;
                (quantity > Decimal::ZERO).then(|| ProductionRecord {
                    item: self.targets[cell.item].item.clone(),
                    line: cell.line.clone(),
                    slot: cell.slot,
                    quantity,
                })
            })
            .collect();

        let results = ResultTable::new(records);
        let result = OptimizationResult {
            run_id,
            total_demand: self.total_demand(),
            total_produced: results.total(),
            results,
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        tracing::info!(
            "[{}] 求解完成，耗時 {}ms：產量 {} / 需求 {}",
            run_id,
            result.elapsed_ms,
            result.total_produced,
            result.total_demand
        );

        if result.total_produced >= result.total_demand {
            Ok(OptimizationOutcome::Solved(result))
        } else {
            Ok(OptimizationOutcome::UnderTarget(result))
        }
    }
}

fn build_variables(vars: &mut ProblemVariables, candidates: Vec<CandidateCell>) -> ModelVariables {
    let mut cells = Vec::with_capacity(candidates.len());
    let mut active = BTreeMap::new();

    for candidate in candidates {
        let var = vars.add(
            variable()
                .integer()
                .min(0.0)
                .max(candidate.upper_bound.max(0.0)),
        );
        active
            .entry(CellKey::new(candidate.line.clone(), candidate.slot))
            .or_insert_with(|| vars.add(variable().binary()));
        cells.push(CellVariable {
            item: candidate.item,
            line: candidate.line,
            slot: candidate.slot,
            var,
        });
    }

    ModelVariables { cells, active }
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineplan_core::{CapacityTable, CodeLayout, DemandItem, EligibilityTable};

    fn demand(items: &[(&str, i64)]) -> DemandTable {
        let layout = CodeLayout::default();
        DemandTable::new(
            items
                .iter()
                .map(|(code, qty)| DemandItem::new(*code, "TPE", Decimal::from(*qty), &layout).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_variables_only_for_eligible_cells() {
        let tables = MasterTables::new(
            EligibilityTable::new()
                .with_line("L1", "L", ["LA12"])
                .with_line("B1", "B", ["LB07"]),
            CapacityTable::new()
                .with_cell("L1", 1, Decimal::from(5))
                .with_cell("B1", 1, Decimal::from(9)),
        );
        let problem = OptimizationProblem::from_tables(
            &demand(&[("LA12-RED", 3), ("LB07-BLU", 20)]),
            &tables,
            OptimizationScope::Full,
        )
        .unwrap();

        let cells = problem.candidate_cells().unwrap();

        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].line.as_str(), cells[0].upper_bound), ("L1", 3.0));
        assert_eq!((cells[1].line.as_str(), cells[1].upper_bound), ("B1", 9.0));
        assert_eq!(problem.total_demand(), Decimal::from(23));
    }

    #[test]
    fn test_unreachable_commitment_detected() {
        let tables = MasterTables::new(
            EligibilityTable::new().with_line("L1", "L", ["LA12"]),
            CapacityTable::new().with_cell("L1", 1, Decimal::from(5)),
        );
        let problem = OptimizationProblem::from_tables(
            &demand(&[("LA12-RED", 3)]),
            &tables,
            OptimizationScope::PreAssignment,
        )
        .unwrap()
        .with_commitments(vec![
            FixedCommitment {
                group: "LA*2".to_string(),
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::from(2),
            },
            FixedCommitment {
                group: "LB07".to_string(),
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::from(1),
            },
        ]);

        let unreachable = problem.unreachable_commitments().unwrap();

        assert_eq!(unreachable.len(), 1);
        assert_eq!(unreachable[0].group, "LB07");
    }
}
