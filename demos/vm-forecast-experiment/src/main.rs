use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use clap::Parser;
use log::{error, info};
use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::Serialize;

use dslab_vm_forecast::core::availability_policy::PolicyKind;
use dslab_vm_forecast::core::config::ForecastConfig;
use dslab_vm_forecast::core::error::ForecastError;
use dslab_vm_forecast::core::history::Channel;
use dslab_vm_forecast::core::scheduler::PeScheduler;
use dslab_vm_forecast::core::vm::VirtualMachine;
use dslab_vm_forecast::extensions::trace_scheduler::{PeUsageRecord, TraceScheduler};

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to forecast config
    #[clap(short, long)]
    config: String,

    /// Path to PE usage trace (random trace is generated if not set)
    #[clap(short, long)]
    trace: Option<String>,

    /// Number of VM PEs
    #[clap(short, long, default_value_t = 16)]
    pes: u32,

    /// VM ID used to select rows of product usage table
    #[clap(long, default_value_t = 1)]
    vm_id: u32,

    /// Number of steps in random trace
    #[clap(long, default_value_t = 96)]
    steps: u32,

    /// Seed of random trace
    #[clap(long, default_value_t = 123)]
    seed: u64,

    /// Path to CSV file for the recorded history
    #[clap(short, long)]
    output: Option<String>,
}

const POLICIES: [PolicyKind; 6] = [
    PolicyKind::Current,
    PolicyKind::GratisAr2,
    PolicyKind::BatchTable,
    PolicyKind::ArmaFixed,
    PolicyKind::FoarDualChannel(Channel::Total),
    PolicyKind::FoarDualChannel(Channel::Product),
];

#[derive(Serialize)]
struct HistoryRow {
    bucket: u64,
    utilization: f64,
    total: f64,
    product: f64,
}

/// Counts how often a policy offered more PEs than were actually idle at the next step.
#[derive(Default, Clone)]
struct PolicyStats {
    offered: u64,
    overcommits: u32,
}

fn random_trace(pes: u32, steps: u32, step: f64, seed: u64) -> TraceScheduler {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut busy: i64 = (pes / 4) as i64;
    let mut records = Vec::with_capacity(steps as usize);
    for i in 0..steps {
        busy = (busy + rng.gen_range(-2..=2)).clamp(0, pes as i64);
        let busy = busy as u32;
        let product = rng.gen_range(0..=(pes - busy).min(pes / 4));
        records.push(PeUsageRecord {
            time: i as f64 * step,
            idle_pes: pes - busy - product,
            busy_pes: busy,
            product_pes: product,
        });
    }
    TraceScheduler::new(pes, records)
}

/// Resolves product usage path relative to the config file.
fn resolve_paths(mut config: ForecastConfig, config_path: &str) -> ForecastConfig {
    if let Some(path) = &config.product_usage {
        if Path::new(path).is_relative() {
            if let Some(dir) = Path::new(config_path).parent() {
                config.product_usage = Some(dir.join(path).display().to_string());
            }
        }
    }
    config
}

fn save_history(vm: &VirtualMachine, path: &str) -> Result<(), ForecastError> {
    let mut writer = csv::Writer::from_path(path)?;
    let history = vm.history();
    for (bucket, utilization) in history.fine().iter() {
        writer.serialize(HistoryRow {
            bucket,
            utilization,
            total: history.channel(Channel::Total).value_at(bucket),
            product: history.channel(Channel::Product).value_at(bucket),
        })?;
    }
    writer.flush().map_err(|source| ForecastError::Io {
        path: path.to_string(),
        source,
    })?;
    info!("Saved {} history buckets to {}", history.fine().len(), path);
    Ok(())
}

fn run(args: &Args) -> Result<(), ForecastError> {
    let config = resolve_paths(ForecastConfig::from_file(&args.config)?, &args.config);
    let fine_width = config.fine_bucket_width;
    let mut vm = VirtualMachine::from_config(args.vm_id, args.pes, Rc::new(config))?;
    info!(
        "VM #{} with {} PEs, default policy {}",
        vm.id,
        vm.total_pes(),
        vm.estimator().selected()
    );

    let trace = match &args.trace {
        Some(path) => TraceScheduler::load(path, args.pes)?,
        None => random_trace(args.pes, args.steps, fine_width, args.seed),
    };
    let times: Vec<f64> = trace.times().collect();

    let mut stats = vec![PolicyStats::default(); POLICIES.len()];
    for (i, &time) in times.iter().enumerate() {
        vm.update_processing(time, &trace);
        let next_idle = times.get(i + 1).map(|next| trace.idle_pes(*next));

        let mut view = vm.resources(&trace);
        let mut line = format!("time = {:>7}, idle = {:>3}", time, trace.idle_pes(time));
        for (policy, stat) in POLICIES.iter().zip(stats.iter_mut()) {
            let available = view.estimate(*policy, time);
            stat.offered += available as u64;
            if next_idle.map_or(false, |idle| available > idle) {
                stat.overcommits += 1;
            }
            line += &format!(", {} = {:>3}", policy, available);
        }
        info!("{}", line);
    }

    for (policy, stat) in POLICIES.iter().zip(stats.iter()) {
        info!(
            "{}: average offered PEs = {:.2}, overcommits = {} of {} steps",
            policy,
            stat.offered as f64 / times.len().max(1) as f64,
            stat.overcommits,
            times.len().saturating_sub(1)
        );
    }

    if let Some(path) = &args.output {
        save_history(&vm, path)?;
    }
    Ok(())
}

fn main() {
    init_logger();

    let args = Args::parse();
    let experiment_start = Instant::now();

    if let Err(e) = run(&args) {
        error!("Experiment failed: {}", e);
        std::process::exit(1);
    }

    println!("Experiment process time {:.2?}", experiment_start.elapsed());
}
