//! 產線配產示例

use anyhow::Context;
use chrono::NaiveDate;
use lineplan::*;

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("=== 產線配產示例 ===\n");

    let config = EngineConfig::from_json_str(
        r#"{
            "time_budget_secs": 10,
            "calendar": {
                "plan_start": "2025-11-03",
                "shifts_per_day": 2,
                "working_days": [true, true, true, true, true, false, false],
                "holidays": []
            }
        }"#,
    )
    .context("載入配置失敗")?;

    // 主檔
    let mut capacity = CapacityTable::new();
    for slot in 1..=4 {
        capacity.set("L1", slot, Decimal::from(120));
        capacity.set("L2", slot, Decimal::from(80));
        capacity.set("B1", slot, Decimal::from(60));
    }
    let quotas = GroupQuotaTable::from_rows(&[
        QuotaRow::new("max-active-lines-for-block-L", 1, Decimal::from(1)),
        QuotaRow::new("max-quantity-for-block-B", 2, Decimal::from(40)),
    ])?;
    let tables = MasterTables::new(
        EligibilityTable::new()
            .with_line("L1", "L", ["LA12", "LA72"])
            .with_line("L2", "L", ["LA12"])
            .with_line("B1", "B", ["LB07"]),
        capacity,
    )
    .with_quotas(quotas)
    .with_portions(vec![BlockPortion::new("B", 0.1, 0.6)]);

    // 需求
    let due = NaiveDate::from_ymd_opt(2025, 11, 7).context("無效日期")?;
    let demand = DemandTable::new(vec![
        DemandItem::new("LA12-RED", "TPE", Decimal::from(300), &config.code_layout)?
            .with_due_date(due),
        DemandItem::new("LA12-BLU", "KHH", Decimal::from(150), &config.code_layout)?
            .with_due_date(due),
        DemandItem::new("LA72-WHT", "TPE", Decimal::from(90), &config.code_layout)?,
        DemandItem::new("LB07-GRN", "TXG", Decimal::from(200), &config.code_layout)?
            .with_due_date(due),
    ])?;

    // 動態表
    let entries = vec![
        RawEntry::Fixed(
            FixedEntry::new("LA*2", QuantitySpec::Units(Decimal::from(100)))
                .with_lines(["L1"])
                .with_slots(vec![1, 2]),
        ),
        RawEntry::Fixed(FixedEntry::new("LB07", QuantitySpec::All)),
        RawEntry::Recurring(RecurringEntry {
            lines: vec!["L2".to_string()],
            shift_offset: 2,
            items: vec![
                RecurringItem {
                    item: "LA12-BLU".to_string(),
                    occurrence: 1,
                    quantity: QuantitySpec::Units(Decimal::from(50)),
                },
                RecurringItem {
                    item: "LA12-RED".to_string(),
                    occurrence: 2,
                    quantity: QuantitySpec::All,
                },
            ],
        }),
    ];

    let built = build_requests(&entries, &demand, &tables, &config);
    println!("配產請求 {} 筆，剔除 {} 筆", built.requests.len(), built.dropped.len());
    for dropped in &built.dropped {
        println!("  - 剔除 列 {} {}: {:?}", dropped.source_index, dropped.group, dropped.reason);
    }

    let greedy = run_greedy_allocation(&built.requests, &tables)?;
    println!("\n貪婪配產:");
    for request in &built.requests {
        println!(
            "  - #{} {}: {} / {}",
            request.id,
            request.group,
            greedy.solution.allocated(request.id),
            request.quantity
        );
    }
    for failure in &greedy.failures {
        println!(
            "  ! #{} {:?} 未滿足 {}",
            failure.request_id, failure.record.reason, failure.record.excess
        );
    }

    let problem = OptimizationProblem::from_tables(&demand, &tables, OptimizationScope::Full)?
        .with_commitments(greedy.commitments(&built.requests));
    let mut sink = TracingProgress;
    let outcome = run_optimization(problem, ResultTable::default(), &config, &mut sink)?;
    println!("\n最佳化結果: {}", outcome.label());

    if let Some(results) = outcome.results() {
        let rows = assemble_results(results, &demand, &config)?;
        for row in rows {
            println!(
                "  - {} → {} @ {} 時段 {}: {} (交期差 {:?} 天)",
                row.item, row.destination, row.line, row.slot, row.quantity, row.lead_time_days
            );
        }
    }

    Ok(())
}
