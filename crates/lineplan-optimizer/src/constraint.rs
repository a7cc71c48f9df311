//! 約束建立
//!
//! 每個函數只負責一類約束，回傳的約束由呼叫者加入模型。

use good_lp::{Constraint, Expression};
use lineplan_calc::GroupPattern;
use lineplan_core::{CapacityTable, CellKey, FixedCommitment, MasterTables};
use std::collections::BTreeMap;

use crate::model::{to_f64, DemandTarget, ModelVariables};

/// 需求上限：Σ x[品項, *, *] ≤ 需求
pub(crate) fn demand_ceiling(vars: &ModelVariables, targets: &[DemandTarget]) -> Vec<Constraint> {
    let mut per_item: BTreeMap<usize, Expression> = BTreeMap::new();
    for cell in &vars.cells {
        per_item.entry(cell.item).or_default().add_mul(1.0, cell.var);
    }

    per_item
        .into_iter()
        .map(|(item, expr)| expr.leq(to_f64(targets[item].quantity)))
        .collect()
}

/// 產能：Σ x[*, 產線, 時段] ≤ 產能
pub(crate) fn capacity(vars: &ModelVariables, capacity: &CapacityTable) -> Vec<Constraint> {
    cell_totals(vars)
        .into_iter()
        .map(|(key, expr)| expr.leq(to_f64(capacity.get(&key.line, key.slot))))
        .collect()
}

/// 區塊佔比：下限 × 總產量 ≤ 區塊產量 ≤ 上限 × 總產量
pub(crate) fn block_portions(
    vars: &ModelVariables,
    tables: &MasterTables,
) -> lineplan_core::Result<Vec<Constraint>> {
    let mut constraints = Vec::with_capacity(tables.portions.len() * 2);

    for portion in &tables.portions {
        let mut lower = Expression::default();
        let mut upper = Expression::default();
        for cell in &vars.cells {
            let in_block = if tables.eligibility.block_of(&cell.line)? == portion.block {
                1.0
            } else {
                0.0
            };
            lower.add_mul(in_block - portion.lower_limit, cell.var);
            upper.add_mul(in_block - portion.upper_limit, cell.var);
        }
        constraints.push(lower.geq(0.0));
        constraints.push(upper.leq(0.0));
    }

    Ok(constraints)
}

/// 開線連結：total ≤ M·y 且 total ≥ y
pub(crate) fn active_line_linkage(vars: &ModelVariables, big_m: f64) -> Vec<Constraint> {
    let mut constraints = Vec::with_capacity(vars.active.len() * 2);

    for (key, total) in cell_totals(vars) {
        let Some(&active) = vars.active.get(&key) else {
            continue;
        };

        let mut upper = total.clone();
        upper.add_mul(-big_m, active);
        constraints.push(upper.leq(0.0));

        let mut lower = total;
        lower.add_mul(-1.0, active);
        constraints.push(lower.geq(0.0));
    }

    constraints
}

/// 區塊配額：每 (區塊, 時段) 的開線數與產量上限
pub(crate) fn group_quotas(
    vars: &ModelVariables,
    tables: &MasterTables,
) -> lineplan_core::Result<Vec<Constraint>> {
    let mut constraints = Vec::new();

    for (block, slot, quota) in tables.quotas.iter() {
        if let Some(max_lines) = quota.max_active_lines {
            let mut lines = Expression::default();
            for (key, active) in &vars.active {
                if key.slot == slot && tables.eligibility.block_of(&key.line)? == block {
                    lines.add_mul(1.0, *active);
                }
            }
            constraints.push(lines.leq(f64::from(max_lines)));
        }

        if let Some(max_quantity) = quota.max_quantity {
            let mut quantity = Expression::default();
            for cell in &vars.cells {
                if cell.slot == slot && tables.eligibility.block_of(&cell.line)? == block {
                    quantity.add_mul(1.0, cell.var);
                }
            }
            constraints.push(quantity.leq(to_f64(max_quantity)));
        }
    }

    Ok(constraints)
}

/// 預排承諾：Σ x[符合群組的品項, 產線, 時段] ≥ 承諾數量
///
/// 無候選變數的承諾須先以 `unreachable_commitments` 排除。
pub(crate) fn commitments(
    vars: &ModelVariables,
    targets: &[DemandTarget],
    commitments: &[FixedCommitment],
) -> Vec<Constraint> {
    commitments
        .iter()
        .filter_map(|commitment| {
            let pattern = GroupPattern::new(&commitment.group);
            let mut expr = Expression::default();
            let mut matched = false;
            for cell in &vars.cells {
                if cell.line == commitment.line
                    && cell.slot == commitment.slot
                    && pattern.matches(&targets[cell.item].item)
                {
                    expr.add_mul(1.0, cell.var);
                    matched = true;
                }
            }
            matched.then(|| expr.geq(to_f64(commitment.quantity)))
        })
        .collect()
}

fn cell_totals(vars: &ModelVariables) -> BTreeMap<CellKey, Expression> {
    let mut totals: BTreeMap<CellKey, Expression> = BTreeMap::new();
    for cell in &vars.cells {
        totals
            .entry(CellKey::new(cell.line.clone(), cell.slot))
            .or_default()
            .add_mul(1.0, cell.var);
    }
    totals
}
