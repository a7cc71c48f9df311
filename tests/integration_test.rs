//! 集成測試

use chrono::NaiveDate;
use lineplan::*;
use rstest::rstest;

fn layout() -> CodeLayout {
    CodeLayout::default()
}

fn demand(items: &[(&str, i64)]) -> DemandTable {
    let layout = layout();
    DemandTable::new(
        items
            .iter()
            .map(|(code, qty)| {
                DemandItem::new(*code, "TPE", Decimal::from(*qty), &layout)
                    .unwrap()
                    .with_ship_quantity(Decimal::from(*qty))
                    .with_due_date(NaiveDate::from_ymd_opt(2025, 10, 10).unwrap())
            })
            .collect(),
    )
    .unwrap()
}

fn plant() -> MasterTables {
    let mut capacity = CapacityTable::new();
    for slot in [1, 2] {
        capacity.set("L1", slot, Decimal::from(10));
        capacity.set("L2", slot, Decimal::from(10));
        capacity.set("B1", slot, Decimal::from(8));
    }

    MasterTables::new(
        EligibilityTable::new()
            .with_line("L1", "L", ["LA12"])
            .with_line("L2", "L", ["LA12"])
            .with_line("B1", "B", ["LB07"]),
        capacity,
    )
}

fn config() -> EngineConfig {
    // 2025-10-06 是週一
    EngineConfig::new()
        .with_time_budget_secs(60)
        .with_calendar(SlotCalendar::new(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()))
}

#[test]
fn test_end_to_end_greedy_then_optimization() {
    logging::init_test();

    let demand = demand(&[("LA12-RED", 20), ("LA12-BLU", 17), ("LB07-GRN", 12)]);
    let tables = plant();
    let config = config();

    let entries = vec![
        RawEntry::Fixed(
            FixedEntry::new("LA12", QuantitySpec::Units(Decimal::from(15)))
                .with_lines(["L1"])
                .with_slots(vec![1, 2]),
        ),
        RawEntry::Fixed(FixedEntry::new("LB07", QuantitySpec::All)),
        RawEntry::Recurring(RecurringEntry {
            lines: vec!["L2".to_string()],
            shift_offset: 1,
            items: vec![RecurringItem {
                item: "LA12-BLU".to_string(),
                occurrence: 1,
                quantity: QuantitySpec::Units(Decimal::from(5)),
            }],
        }),
        RawEntry::Fixed(FixedEntry::new("ZZ99", QuantitySpec::All)),
    ];

    // 1. 建立請求
    let built = build_requests(&entries, &demand, &tables, &config);
    assert_eq!(built.requests.len(), 3);
    assert_eq!(built.dropped.len(), 1);
    assert_eq!(built.dropped[0].source_index, 3);
    assert_eq!(built.dropped[0].reason, DropReason::UnresolvableQuantity);
    assert_eq!(built.requests[1].candidate_lines, vec!["B1".to_string()]);
    assert_eq!(built.requests[2].candidate_slots, vec![1]);

    // 2. 貪婪配產
    let greedy = run_greedy_allocation(&built.requests, &tables).unwrap();
    assert_eq!(greedy.satisfied, vec![0, 1, 2]);
    assert!(greedy.failures.is_empty());
    assert_eq!(greedy.solution.allocated_at("L1", 1), Decimal::from(10));
    assert_eq!(greedy.solution.allocated_at("L1", 2), Decimal::from(5));
    assert_eq!(greedy.solution.allocated_at("B1", 2), Decimal::from(4));

    // 3. 以貪婪結果為預排承諾進行最佳化
    let problem = OptimizationProblem::from_tables(&demand, &tables, OptimizationScope::PreAssignment)
        .unwrap()
        .with_commitments(greedy.commitments(&built.requests));
    let mut sink = TracingProgress;
    let outcome =
        run_optimization(problem, ResultTable::default(), &config, &mut sink).unwrap();

    let OptimizationOutcome::Solved(result) = &outcome else {
        panic!("expected solved, got {}", outcome.label());
    };
    assert_eq!(result.total_produced, Decimal::from(49));
    for (key, capacity) in tables.capacity.iter() {
        assert!(result.results.produced_at(&key.line, key.slot) <= capacity);
    }
    assert!(result.results.produced_at("L2", 1) >= Decimal::from(5));

    // 4. 組裝結果
    let rows = assemble_results(&result.results, &demand, &config).unwrap();
    let total: Decimal = rows.iter().map(|r| r.quantity).sum();
    assert_eq!(total, Decimal::from(49));
    for row in &rows {
        assert_eq!(row.destination, "TPE");
        // 每日兩班，時段 1、2 都落在第一個工作日
        assert_eq!(row.slot_date, NaiveDate::from_ymd_opt(2025, 10, 6));
        assert_eq!(row.lead_time_days, Some(4));
    }
}

#[test]
fn test_all_quantity_resolves_matching_demand() {
    let demand = demand(&[("LA12-RED", 20), ("LA12-BLU", 17), ("LB07-GRN", 12)]);
    let tables = plant();

    let built = build_requests(
        &[RawEntry::Fixed(FixedEntry::new("LA12", QuantitySpec::All))],
        &demand,
        &tables,
        &config(),
    );

    assert!(built.dropped.is_empty());
    assert_eq!(built.requests[0].quantity, Decimal::from(37));
    assert_eq!(
        built.requests[0].candidate_lines,
        vec!["L1".to_string(), "L2".to_string()]
    );
}

#[test]
fn test_first_come_first_served_on_shared_cell() {
    let tables = MasterTables::new(
        EligibilityTable::new().with_line("L1", "L", ["LA12"]),
        CapacityTable::new().with_cell("L1", 1, Decimal::from(5)),
    );
    let requests = vec![
        AllocationRequest {
            id: 0,
            group: "LA12".to_string(),
            candidate_lines: vec!["L1".to_string()],
            candidate_slots: vec![1],
            quantity: Decimal::from(3),
        },
        AllocationRequest {
            id: 1,
            group: "LA12".to_string(),
            candidate_lines: vec!["L1".to_string()],
            candidate_slots: vec![1],
            quantity: Decimal::from(4),
        },
    ];

    let outcome = run_greedy_allocation(&requests, &tables).unwrap();

    assert_eq!(outcome.solution.allocated(0), Decimal::from(3));
    assert_eq!(outcome.solution.allocated(1), Decimal::from(2));
    let failures = outcome.failures_for(1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].reason, FailureReason::UnmetExcess);
    assert_eq!(failures[0].excess, Decimal::from(2));
}

#[test]
fn test_labelled_quota_rows_stop_request() {
    let quotas = GroupQuotaTable::from_rows(&[
        QuotaRow::new("max-quantity-for-block-L", 1, Decimal::from(10)),
        QuotaRow::new("max-active-lines-for-block-L", 1, Decimal::from(2)),
    ])
    .unwrap();
    let tables = plant().with_quotas(quotas);
    let requests = vec![
        AllocationRequest {
            id: 0,
            group: "LA12".to_string(),
            candidate_lines: vec!["L1".to_string()],
            candidate_slots: vec![1],
            quantity: Decimal::from(10),
        },
        AllocationRequest {
            id: 1,
            group: "LA12".to_string(),
            candidate_lines: vec!["L2".to_string()],
            candidate_slots: vec![1, 2],
            quantity: Decimal::from(3),
        },
    ];

    let outcome = run_greedy_allocation(&requests, &tables).unwrap();

    assert_eq!(outcome.satisfied, vec![0]);
    let failures = outcome.failures_for(1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].reason, FailureReason::QuantityQuotaExceeded);
    assert!(outcome.solution.allocations(1).is_empty());
}

#[test]
fn test_optimization_under_target_when_capacity_short() {
    let demand = demand(&[("LA12-RED", 6)]);
    let tables = MasterTables::new(
        EligibilityTable::new().with_line("L1", "L", ["LA12"]),
        CapacityTable::new().with_cell("L1", 1, Decimal::from(5)),
    );
    let problem =
        OptimizationProblem::from_tables(&demand, &tables, OptimizationScope::Full).unwrap();
    let mut sink = TracingProgress;

    let outcome = run_optimization(problem, ResultTable::default(), &config(), &mut sink).unwrap();

    let OptimizationOutcome::UnderTarget(result) = outcome else {
        panic!("expected under target");
    };
    assert_eq!(result.total_produced, Decimal::from(5));
}

#[rstest]
#[case(r#"{"time_budget_secs": 5, "big_m": 1000.0}"#, true)]
#[case(r#"{"big_m": -1.0}"#, false)]
#[case(r#"{"calendar": {"plan_start": "2025-10-06", "shifts_per_day": 0, "working_days": [true, true, true, true, true, false, false], "holidays": []}}"#, false)]
#[case(r#"{"time_budget_secs": null}"#, true)]
#[case(r#"{"time_budget_secs": "soon"}"#, false)]
fn test_config_from_json(#[case] json: &str, #[case] valid: bool) {
    assert_eq!(EngineConfig::from_json_str(json).is_ok(), valid);
}

#[test]
fn test_unknown_capacity_line_fails_fast() {
    let tables = MasterTables::new(
        EligibilityTable::new().with_line("L1", "L", ["LA12"]),
        CapacityTable::new().with_cell("X9", 1, Decimal::from(5)),
    );

    let err = run_greedy_allocation(&[], &tables).unwrap_err();
    assert!(matches!(err, PlanError::UnknownLine(line) if line == "X9"));

    let err = OptimizationProblem::from_tables(&demand(&[]), &tables, OptimizationScope::Full)
        .unwrap_err();
    assert!(matches!(err, PlanError::UnknownLine(_)));
}

#[test]
fn test_quota_for_unknown_block_fails_fast() {
    let quotas = GroupQuotaTable::from_rows(&[QuotaRow::new(
        "max-quantity-for-block-Lx",
        1,
        Decimal::from(3),
    )])
    .unwrap();
    let tables = plant().with_quotas(quotas);

    let err = run_greedy_allocation(&[], &tables).unwrap_err();
    assert!(matches!(err, PlanError::Config(_)));

    let err = OptimizationProblem::from_tables(&demand(&[]), &tables, OptimizationScope::Full)
        .unwrap_err();
    assert!(matches!(err, PlanError::Config(_)));
}
