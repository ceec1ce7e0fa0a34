//! Interface of the scheduler running tasks inside a VM.

/// Information about PE usage provided by the scheduler of a VM.
///
/// The scheduler itself is owned by the simulation, the forecasting code only reads from it.
pub trait PeScheduler {
    /// Number of PEs not used by any task at the moment.
    fn idle_pes(&self, time: f64) -> u32;

    /// Number of PEs used by the tasks of the VM.
    fn busy_pes(&self, time: f64) -> u32;

    /// Number of PEs used by the co-located product workload.
    fn product_pes(&self, _time: f64) -> u32 {
        0
    }
}

/// Scheduler with fixed PE usage, mostly useful in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticPeScheduler {
    pub idle: u32,
    pub busy: u32,
    pub product: u32,
}

impl StaticPeScheduler {
    pub fn new(idle: u32, busy: u32) -> Self {
        Self { idle, busy, product: 0 }
    }

    pub fn with_product(mut self, product: u32) -> Self {
        self.product = product;
        self
    }
}

impl PeScheduler for StaticPeScheduler {
    fn idle_pes(&self, _time: f64) -> u32 {
        self.idle
    }

    fn busy_pes(&self, _time: f64) -> u32 {
        self.busy
    }

    fn product_pes(&self, _time: f64) -> u32 {
        self.product
    }
}
