use dslab_vm_forecast::core::availability_policies::arma_fixed::{ArmaFixed, CHANNEL_WEIGHTS};
use dslab_vm_forecast::core::availability_policies::batch_table::BatchTable;
use dslab_vm_forecast::core::availability_policies::current::CurrentAvailability;
use dslab_vm_forecast::core::availability_policies::foar_dual_channel::FoarDualChannel;
use dslab_vm_forecast::core::availability_policies::gratis_ar2::GratisAr2;
use dslab_vm_forecast::core::availability_policy::{
    available_from_forecast, busy_pes, policy_resolver, AvailabilityPolicy, EstimatorInput, PolicyKind,
};
use dslab_vm_forecast::core::bucket::BucketWidths;
use dslab_vm_forecast::core::decimal::Decimal;
use dslab_vm_forecast::core::estimator::AvailabilityEstimator;
use dslab_vm_forecast::core::history::{Channel, VmHistory};
use dslab_vm_forecast::core::predictor::{ArCoefficients, ArPredictor};
use dslab_vm_forecast::core::product_usage::ProductUsageTable;

fn estimator_input<'a>(
    time: f64,
    total_pes: u32,
    idle_pes: u32,
    history: &'a VmHistory,
    product_usage: &'a ProductUsageTable,
) -> EstimatorInput<'a> {
    EstimatorInput {
        time,
        total_pes,
        idle_pes,
        widths: history.widths(),
        history,
        product_usage,
    }
}

// Coarse utilization 0.1, 0.1, 0.2, 0.8 in SLOTs 0..3 with SLOT equal to fine bucket.
fn rising_history() -> VmHistory {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    for (i, value) in [0.1, 0.1, 0.2, 0.8].iter().enumerate() {
        history.record_utilization(i as f64 * 300., *value);
    }
    history
}

#[test]
fn test_busy_pes() {
    assert_eq!(busy_pes(&"0.7".parse().unwrap(), 10), 7);
    assert_eq!(busy_pes(&"0.71".parse().unwrap(), 10), 8);
    assert_eq!(busy_pes(&"1.3".parse().unwrap(), 10), 10);
    assert_eq!(busy_pes(&"-0.3".parse().unwrap(), 10), 0);
    assert_eq!(available_from_forecast(&Decimal::one(), 10), 0);
    assert_eq!(available_from_forecast(&"0.05".parse().unwrap(), 10), 9);
}

#[test]
// Batch window covers key..=key+k while current availability covers only the current SLOT.
fn test_batch_table_window() {
    let history = VmHistory::new(BucketWidths::new(300., 3));
    let table = ProductUsageTable::from_entries(vec![(10, 0.4), (11, 0.6), (12, 0.3)]).unwrap();
    let input = estimator_input(3000., 10, 10, &history, &table);
    assert_eq!(BatchTable::new().available_pes(&input), 4);
    assert_eq!(CurrentAvailability::new().available_pes(&input), 4);

    let table = ProductUsageTable::from_entries(vec![(10, 0.4), (11, 0.6), (13, 0.9)]).unwrap();
    let input = estimator_input(3000., 10, 10, &history, &table);
    assert_eq!(BatchTable::new().available_pes(&input), 1);
    assert_eq!(CurrentAvailability::estimate(&input), 4);
}

#[test]
// Reserved PEs are computed exactly, 0.7 of 10 PEs is 7 PEs.
fn test_current_availability() {
    let history = VmHistory::new(BucketWidths::default());
    let table = ProductUsageTable::from_entries(vec![(2, 0.7)]).unwrap();
    assert_eq!(CurrentAvailability::estimate(&estimator_input(600., 10, 10, &history, &table)), 3);
    assert_eq!(CurrentAvailability::estimate(&estimator_input(600., 10, 2, &history, &table)), 0);
    assert_eq!(CurrentAvailability::estimate(&estimator_input(900., 10, 6, &history, &table)), 6);
    // idle PEs above VM size are capped
    assert_eq!(CurrentAvailability::estimate(&estimator_input(900., 10, 12, &history, &table)), 10);
}

#[test]
fn test_gratis_forecast() {
    let history = rising_history();
    let table = ProductUsageTable::new();
    let mut gratis = GratisAr2::new();
    let input = estimator_input(900., 10, 10, &history, &table);
    assert_eq!(gratis.forecast(&input), Some("0.7953370691".parse().unwrap()));
    assert_eq!(gratis.available_pes(&input), 2);
    assert_eq!(gratis.predictor().fits(), 2);
}

#[test]
// Without three SLOTs of history the current availability is used.
fn test_gratis_fallback() {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    history.record_utilization(0., 0.9);
    history.record_utilization(300., 0.9);
    let table = ProductUsageTable::from_entries(vec![(1, 0.3)]).unwrap();
    let mut gratis = GratisAr2::new();
    let input = estimator_input(300., 10, 8, &history, &table);
    assert_eq!(gratis.forecast(&input), None);
    assert_eq!(gratis.available_pes(&input), 5);
    assert_eq!(gratis.predictor().fits(), 0);

    // coefficients passed in are kept while there is not enough history
    let coefficients = ArCoefficients {
        phi1: "0.5".parse().unwrap(),
        phi2: "0.1".parse().unwrap(),
    };
    let mut gratis = GratisAr2::with_predictor(ArPredictor::with_coefficients(coefficients.clone()));
    assert_eq!(gratis.available_pes(&input), 5);
    assert_eq!(gratis.predictor().coefficients(), &coefficients);
}

#[test]
// Forecast can only tighten the current availability.
fn test_gratis_is_conservative() {
    let mut history_zero = VmHistory::new(BucketWidths::new(300., 1));
    for i in 0..4 {
        history_zero.record_utilization(i as f64 * 300., 0.);
    }
    let table = ProductUsageTable::from_entries(vec![(3, 0.5)]).unwrap();
    let mut gratis = GratisAr2::new();
    assert_eq!(gratis.available_pes(&estimator_input(900., 10, 10, &history_zero, &table)), 5);

    let rising = rising_history();
    assert_eq!(gratis.available_pes(&estimator_input(900., 10, 10, &rising, &table)), 2);
    assert_eq!(gratis.available_pes(&estimator_input(900., 10, 1, &rising, &table)), 0);
}

#[test]
fn test_arma_on_utilization() {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    history.record_utilization(0., 0.5);
    history.record_utilization(300., 0.4);
    let table = ProductUsageTable::from_entries(vec![(0, 0.3)]).unwrap();
    let mut arma = ArmaFixed::default();

    // first SLOT uses current availability
    assert_eq!(arma.available_pes(&estimator_input(0., 10, 10, &history, &table)), 7);
    // 0.667 * 0.4 + 0.318 * 0.5 = 0.4258, the result is not capped by idle PEs
    assert_eq!(arma.available_pes(&estimator_input(300., 10, 10, &history, &table)), 5);
    assert_eq!(arma.available_pes(&estimator_input(300., 10, 2, &history, &table)), 5);
}

#[test]
fn test_arma_on_channel() {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    for (i, value) in [0.1, 0.1, 0.3, 0.2].iter().enumerate() {
        history.record_channel(Channel::Total, i as f64 * 300., *value);
    }
    let table = ProductUsageTable::new();
    let mut arma = ArmaFixed::new(CHANNEL_WEIGHTS, Some(Channel::Total));
    assert_eq!(arma.channel(), Some(Channel::Total));

    assert_eq!(arma.available_pes(&estimator_input(0., 10, 9, &history, &table)), 9);
    assert_eq!(arma.available_pes(&estimator_input(600., 10, 9, &history, &table)), 9);
    // 0.2 + 0.3 = 0.5
    assert_eq!(arma.available_pes(&estimator_input(900., 10, 10, &history, &table)), 5);
    assert_eq!(arma.available_pes(&estimator_input(900., 10, 4, &history, &table)), 4);
}

#[test]
// Channel policies return idle PEs while key < 3k and forecast from key = 3k.
fn test_channel_warm_up() {
    let mut history = VmHistory::new(BucketWidths::new(300., 2));
    for (i, value) in [0.1, 0.05, 0.1, 0.2, 0.1, 0.8, 0.3].iter().enumerate() {
        history.record_channel(Channel::Total, i as f64 * 300., *value);
    }
    let table = ProductUsageTable::new();
    let mut foar = FoarDualChannel::new(Channel::Total);
    let mut arma = ArmaFixed::new(CHANNEL_WEIGHTS, Some(Channel::Total));

    // key = 5
    assert_eq!(foar.forecast(&estimator_input(1500., 10, 7, &history, &table)), None);
    assert_eq!(foar.available_pes(&estimator_input(1500., 10, 7, &history, &table)), 7);
    assert_eq!(arma.available_pes(&estimator_input(1500., 10, 7, &history, &table)), 7);
    assert_eq!(foar.predictor().fits(), 0);

    // key = 6, ARMA forecast is 0.8 + 0.2 = 1.0
    assert_eq!(foar.available_pes(&estimator_input(1800., 10, 7, &history, &table)), 2);
    assert_eq!(arma.available_pes(&estimator_input(1800., 10, 7, &history, &table)), 0);
    assert_eq!(foar.predictor().fits(), 1);
}

#[test]
// Windows spanning past the last bucket are cut instead of overflowing.
fn test_huge_slot_ratio() {
    let history = VmHistory::new(BucketWidths::new(300., u64::MAX));
    let table = ProductUsageTable::from_entries(vec![(1, 0.4), (u64::MAX, 0.9)]).unwrap();
    let input = estimator_input(300., 10, 10, &history, &table);
    assert_eq!(BatchTable::new().available_pes(&input), 1);
    assert_eq!(CurrentAvailability::estimate(&input), 1);
    assert_eq!(FoarDualChannel::new(Channel::Product).available_pes(&input), 10);
    assert_eq!(ArmaFixed::new(CHANNEL_WEIGHTS, Some(Channel::Product)).available_pes(&input), 10);
    assert_eq!(history.channel(Channel::Product).leading_max(u64::MAX - 1, 10), 0.);
}

#[test]
// Channel windows step one SLOT back: windows at 6, 4, 2 give 0.8, 0.2, 0.1.
fn test_foar_total_channel() {
    let mut history = VmHistory::new(BucketWidths::new(300., 2));
    for (i, value) in [0.1, 0.05, 0.1, 0.2, 0.1, 0.8, 0.3].iter().enumerate() {
        history.record_channel(Channel::Total, i as f64 * 300., *value);
    }
    let table = ProductUsageTable::new();
    let mut foar = FoarDualChannel::new(Channel::Total);

    let series = FoarDualChannel::slot_series(&history, Channel::Total, 6);
    let expected: Vec<Decimal> = ["0.1", "0.1", "0.2", "0.8"].iter().map(|s| s.parse().unwrap()).collect();
    assert_eq!(series, expected);

    assert_eq!(foar.forecast(&estimator_input(1800., 10, 10, &history, &table)), Some("0.7953370691".parse().unwrap()));
    assert_eq!(foar.available_pes(&estimator_input(1800., 10, 10, &history, &table)), 2);
    assert_eq!(foar.available_pes(&estimator_input(1800., 10, 1, &history, &table)), 1);

    // less than three SLOTs
    assert_eq!(foar.available_pes(&estimator_input(900., 10, 7, &history, &table)), 7);
}

#[test]
fn test_foar_product_channel() {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    for (i, value) in [0.1, 0.1, 0.2, 0.8].iter().enumerate() {
        history.record_channel(Channel::Product, i as f64 * 300., *value);
    }
    let table = ProductUsageTable::new();
    let mut foar = FoarDualChannel::new(Channel::Product);
    assert_eq!(foar.available_pes(&estimator_input(900., 10, 10, &history, &table)), 2);

    // own busy PEs were never recorded, so the total channel forecasts no load
    let mut foar_total = FoarDualChannel::new(Channel::Total);
    assert_eq!(foar_total.available_pes(&estimator_input(900., 10, 6, &history, &table)), 6);
}

#[test]
// Saturated forecast leaves no PEs.
fn test_saturated_forecast() {
    let mut history = VmHistory::new(BucketWidths::new(300., 1));
    for i in 0..4 {
        history.record_utilization(i as f64 * 300., 1.);
    }
    let table = ProductUsageTable::new();
    assert_eq!(GratisAr2::new().available_pes(&estimator_input(900., 10, 10, &history, &table)), 0);
    assert_eq!(ArmaFixed::new([1., 1.], None).available_pes(&estimator_input(900., 10, 10, &history, &table)), 0);
}

#[test]
// Every policy instance owns its model, so calling one policy doesn't refit another.
fn test_estimator_state_is_separate() {
    let history = rising_history();
    let table = ProductUsageTable::new();
    let mut estimator = AvailabilityEstimator::new(PolicyKind::GratisAr2, ArmaFixed::default());
    let input = estimator_input(900., 10, 10, &history, &table);

    assert_eq!(estimator.estimate_selected(&input), 2);
    assert_eq!(estimator.estimate(PolicyKind::Current, &input), 10);
    assert_eq!(estimator.gratis().predictor().fits(), 1);
    assert_eq!(estimator.foar(Channel::Total).predictor().fits(), 0);

    estimator.estimate(PolicyKind::FoarDualChannel(Channel::Product), &input);
    assert_eq!(estimator.foar(Channel::Product).predictor().fits(), 1);
    assert_eq!(estimator.foar(Channel::Total).predictor().fits(), 0);
    assert_eq!(estimator.gratis().predictor().fits(), 1);

    estimator.set_selected(PolicyKind::BatchTable);
    assert_eq!(estimator.selected(), PolicyKind::BatchTable);
    assert_eq!(estimator.estimate_selected(&input), 10);
    assert_eq!(estimator.gratis().predictor().fits(), 1);
}

#[test]
fn test_policy_resolver() {
    assert_eq!(policy_resolver("Current").unwrap(), PolicyKind::Current);
    assert_eq!(policy_resolver("GratisAR2").unwrap(), PolicyKind::GratisAr2);
    assert_eq!(policy_resolver("Batch").unwrap(), PolicyKind::BatchTable);
    assert_eq!(policy_resolver("ARMA").unwrap(), PolicyKind::ArmaFixed);
    assert_eq!(
        policy_resolver("FoarDualChannel").unwrap(),
        PolicyKind::FoarDualChannel(Channel::Total)
    );
    assert_eq!(
        policy_resolver("FOAR[channel=product]").unwrap(),
        PolicyKind::FoarDualChannel(Channel::Product)
    );
    assert!(policy_resolver("FOAR[channel=memory]").is_err());
    assert!(policy_resolver("Random").is_err());
    assert!(policy_resolver("Current[window=3]").is_err());
    assert!(policy_resolver("FOAR[channel=total").is_err());

    for kind in [
        PolicyKind::Current,
        PolicyKind::GratisAr2,
        PolicyKind::BatchTable,
        PolicyKind::ArmaFixed,
        PolicyKind::FoarDualChannel(Channel::Product),
    ] {
        assert_eq!(policy_resolver(&kind.to_string()).unwrap(), kind);
    }
}
