use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vehicle_rollup_core::rollup::aggregate::{self, Dimension};
use vehicle_rollup_core::rollup::metrics;
use vehicle_rollup_core::rollup::record::ConfigurationRecord;
use vehicle_rollup_core::rollup::segment::SegmentFilter;
use vehicle_rollup_core::scenarios::sensitivity::{
    self, SensitivityField, SensitivityRequest, SensitivitySweep,
};
use vehicle_rollup_core::types::Market;
use vehicle_rollup_core::RollupError;

/// Volumes are multiples of 4 so 0.25-step multipliers scale them exactly.
fn record_set(seed: u64) -> Vec<ConfigurationRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let markets = [Market::EU, Market::CN, Market::US];
    (0..120)
        .map(|i| ConfigurationRecord {
            market: markets[i % 3].clone(),
            powertrain: if i % 2 == 0 { "BEV".into() } else { "ICE".into() },
            year: 2021 + (i % 4) as i32,
            volume: 4 * rng.gen_range(1..5_000),
            msrp: Decimal::new(rng.gen_range(3_000_000..9_000_000), 2),
            option_price: Decimal::new(rng.gen_range(0..800_000), 2),
            option_cost: Decimal::new(rng.gen_range(0..500_000), 2),
            powertrain_cost: Decimal::new(rng.gen_range(500_000..1_500_000), 2),
            base_cost: Decimal::new(rng.gen_range(1_000_000..3_000_000), 2),
        })
        .collect()
}

fn request(field: SensitivityField, multiplier: Decimal) -> SensitivityRequest {
    SensitivityRequest { field, multiplier }
}

#[test]
fn test_unit_multiplier_is_neutral() {
    let records = record_set(1);
    let baseline = metrics::roll_up(&records).unwrap();
    for field in [SensitivityField::OptionCost, SensitivityField::Volume] {
        let sim = sensitivity::simulate(&records, &request(field, dec!(1.0))).unwrap();
        assert_eq!(sim.records.len(), baseline.len());
        for (base, simulated) in baseline.iter().zip(&sim.records) {
            assert_eq!(base.metrics, simulated.metrics);
        }
        assert_eq!(sim.totals, aggregate::summarize(&baseline).unwrap());
    }
}

#[test]
fn test_volume_multiplier_scales_money_and_keeps_margin() {
    let records = record_set(2);
    let baseline = metrics::roll_up(&records).unwrap();
    for m in [dec!(0.5), dec!(0.75), dec!(1.25), dec!(2.0)] {
        let sim = sensitivity::simulate(&records, &request(SensitivityField::Volume, m)).unwrap();
        for (base, simulated) in baseline.iter().zip(&sim.records) {
            assert_eq!(simulated.metrics.revenue, base.metrics.revenue * m);
            assert_eq!(simulated.metrics.total_cost, base.metrics.total_cost * m);
            assert_eq!(simulated.metrics.profit, base.metrics.profit * m);
            let (a, b) = (
                base.metrics.profit_margin.unwrap(),
                simulated.metrics.profit_margin.unwrap(),
            );
            assert!((a - b).abs() < dec!(0.000000001), "margin moved: {a} vs {b}");
        }
        let base_totals = aggregate::summarize(&baseline).unwrap();
        assert_eq!(sim.totals.sum_profit, base_totals.sum_profit * m);
    }
}

#[test]
fn test_option_cost_multiplier_only_moves_cost() {
    let records = record_set(3);
    let baseline = metrics::roll_up(&records).unwrap();
    let sim =
        sensitivity::simulate(&records, &request(SensitivityField::OptionCost, dec!(1.5))).unwrap();
    for ((orig, base), simulated) in records.iter().zip(&baseline).zip(&sim.records) {
        assert_eq!(simulated.metrics.revenue, base.metrics.revenue);
        let extra = orig.option_cost * dec!(0.5) * Decimal::from(orig.volume);
        assert_eq!(base.metrics.total_cost + extra, simulated.metrics.total_cost);
    }
}

#[test]
fn test_simulation_does_not_mutate_source() {
    let records = record_set(4);
    let snapshot = records.clone();
    let _ = sensitivity::run_sensitivity(
        &records,
        &request(SensitivityField::Volume, dec!(1.8)),
        &[Dimension::Year],
    )
    .unwrap();
    assert_eq!(records, snapshot);
}

#[test]
fn test_zero_multiplier_rejected() {
    let err = sensitivity::simulate(&record_set(5), &request(SensitivityField::OptionCost, dec!(0)))
        .unwrap_err();
    match err {
        RollupError::InvalidInput { field, .. } => assert_eq!(field, "multiplier"),
        other => panic!("Expected InvalidInput for multiplier, got {other:?}"),
    }
}

#[test]
fn test_filter_and_simulate_pipelines_are_independent() {
    let records = record_set(6);
    let eu = SegmentFilter::all_of(&records).with_markets(["EU"]);

    let filtered_first = metrics::roll_up(&eu.apply(&records)).unwrap();
    let sim = sensitivity::simulate(&records, &request(SensitivityField::Volume, dec!(1.5))).unwrap();
    let filtered_again = metrics::roll_up(&eu.apply(&records)).unwrap();
    assert_eq!(filtered_first, filtered_again);

    // Filtering the simulated set equals simulating the filtered set
    let sim_then_filter = eu.apply(&sim.records);
    let filter_then_sim =
        sensitivity::simulate(&eu.apply(&records), &request(SensitivityField::Volume, dec!(1.5)))
            .unwrap();
    assert_eq!(sim_then_filter, filter_then_sim.records);
}

#[test]
fn test_grouped_sensitivity_rows_match_simulated_records() {
    let records = record_set(7);
    let out = sensitivity::run_sensitivity(
        &records,
        &request(SensitivityField::OptionCost, dec!(0.8)),
        &[Dimension::Market],
    )
    .unwrap();
    let r = &out.result;
    assert_eq!(r.groups.len(), 3);
    let grouped_profit: Decimal = r.groups.iter().map(|g| g.sum_profit).sum();
    assert_eq!(grouped_profit, r.simulated.sum_profit);
    // Cheaper options raise profit
    assert!(r.profit_change > Decimal::ZERO);
    assert!(r.profit_change_pct.unwrap() > Decimal::ZERO);
}

#[test]
fn test_sweep_passes_through_baseline() {
    let records = record_set(8);
    let sweep = SensitivitySweep {
        field: SensitivityField::OptionCost,
        min: dec!(0.5),
        max: dec!(2.0),
        step: dec!(0.25),
    };
    let out = sensitivity::sweep_sensitivity(&records, &sweep).unwrap();
    let points = &out.result.points;
    assert_eq!(points.first().unwrap().multiplier, dec!(0.5));
    assert_eq!(points.last().unwrap().multiplier, dec!(2.0));
    let unit = points.iter().find(|p| p.multiplier == Decimal::ONE).unwrap();
    assert_eq!(unit.totals.sum_profit, out.result.baseline.sum_profit);
    // Profit falls as option cost rises
    for pair in points.windows(2) {
        assert!(pair[0].totals.sum_profit >= pair[1].totals.sum_profit);
    }
}
