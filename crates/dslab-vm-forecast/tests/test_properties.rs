use std::rc::Rc;

use rand::prelude::*;
use rand_pcg::Pcg64;

use dslab_vm_forecast::core::availability_policies::arma_fixed::{CHANNEL_WEIGHTS, UTILIZATION_WEIGHTS};
use dslab_vm_forecast::core::config::ForecastConfig;
use dslab_vm_forecast::core::history::Channel;
use dslab_vm_forecast::core::product_usage::ProductUsageTable;
use dslab_vm_forecast::core::scheduler::StaticPeScheduler;
use dslab_vm_forecast::core::vm::VirtualMachine;

const VM_COUNT: u64 = 300;
const TICKS: u32 = 25;

fn random_config(rng: &mut Pcg64) -> ForecastConfig {
    let slot_ratio = rng.gen_range(1..=4);
    let arma_channel = match rng.gen_range(0..3) {
        0 => None,
        1 => Some(Channel::Total),
        _ => Some(Channel::Product),
    };
    ForecastConfig {
        slot_width: 300. * slot_ratio as f64,
        arma_weights: if arma_channel.is_some() {
            CHANNEL_WEIGHTS
        } else {
            UTILIZATION_WEIGHTS
        },
        arma_channel,
        ..ForecastConfig::default()
    }
}

fn random_table(rng: &mut Pcg64, buckets: u64) -> ProductUsageTable {
    let mut entries = Vec::new();
    for bucket in 0..buckets {
        if rng.gen_bool(0.3) {
            entries.push((bucket, rng.gen_range(0..=100) as f64 / 100.));
        }
    }
    ProductUsageTable::from_entries(entries).unwrap()
}

#[test]
// Random VMs driven by random schedulers: every policy stays within [0, total PEs],
// forecasting policies never exceed the current availability or idle PEs.
fn test_availability_bounds() {
    let mut rng = Pcg64::seed_from_u64(42);
    for vm_id in 0..VM_COUNT {
        let config = random_config(&mut rng);
        let arma_capped = config.arma_channel.is_some();
        let total = rng.gen_range(1..=32);
        let table = random_table(&mut rng, 60);
        let mut vm = VirtualMachine::new(vm_id as u32, total, table, Rc::new(config)).unwrap();

        let mut time = 0.;
        for _ in 0..TICKS {
            time += rng.gen_range(0.0..600.0);
            let busy = rng.gen_range(0..=total);
            let product = rng.gen_range(0..=total - busy);
            let idle = total - busy - product;
            let scheduler = StaticPeScheduler::new(idle, busy).with_product(product);
            vm.update_processing(time, &scheduler);

            let mut view = vm.resources(&scheduler);
            let current = view.available_pes(time);
            let gratis = view.available_pes_gratis(time);
            let batch = view.available_pes_batch(time);
            let arma = view.available_pes_arma(time);
            let foar_total = view.available_pes_foar(time, Channel::Total);
            let foar_product = view.available_pes_foar(time, Channel::Product);
            let selected = view.forecast_available_pes(time);

            for available in [current, gratis, batch, arma, foar_total, foar_product, selected] {
                assert!(available <= total, "vm {} at {}: {} > {}", vm_id, time, available, total);
            }
            assert!(gratis <= current, "vm {} at {}: gratis {} > current {}", vm_id, time, gratis, current);
            assert!(current <= idle);
            assert!(batch <= idle);
            assert!(foar_total <= idle);
            assert!(foar_product <= idle);
            if arma_capped {
                assert!(arma <= idle);
            }
        }
    }
}
