//! Interface between VM availability policies and the allocation layer.

use crate::core::availability_policy::PolicyKind;
use crate::core::history::Channel;
use crate::core::scheduler::PeScheduler;
use crate::core::vm::VirtualMachine;

/// Exposes availability policies of a VM, each called explicitly by the allocator.
///
/// The view reads idle PEs from the VM scheduler and never changes its state. The only state changed
/// by the calls is the model state of the forecasting policies owned by the VM.
pub struct VmResourceView<'a> {
    vm: &'a mut VirtualMachine,
    scheduler: &'a dyn PeScheduler,
}

impl<'a> VmResourceView<'a> {
    pub fn new(vm: &'a mut VirtualMachine, scheduler: &'a dyn PeScheduler) -> Self {
        Self { vm, scheduler }
    }

    /// Estimates available PEs at `time` with the specified policy.
    pub fn estimate(&mut self, kind: PolicyKind, time: f64) -> u32 {
        let idle = self.scheduler.idle_pes(time);
        self.vm.estimate(Some(kind), time, idle)
    }

    /// Idle PEs minus the product usage expected within the current SLOT.
    pub fn available_pes(&mut self, time: f64) -> u32 {
        self.estimate(PolicyKind::Current, time)
    }

    /// Availability based on AR(2) forecast of the VM utilization.
    pub fn available_pes_gratis(&mut self, time: f64) -> u32 {
        self.estimate(PolicyKind::GratisAr2, time)
    }

    /// Availability based on the product usage table only.
    pub fn available_pes_batch(&mut self, time: f64) -> u32 {
        self.estimate(PolicyKind::BatchTable, time)
    }

    /// Availability based on the fixed-coefficient forecast.
    pub fn available_pes_arma(&mut self, time: f64) -> u32 {
        self.estimate(PolicyKind::ArmaFixed, time)
    }

    /// Availability based on AR(2) forecast of the specified channel.
    pub fn available_pes_foar(&mut self, time: f64, channel: Channel) -> u32 {
        self.estimate(PolicyKind::FoarDualChannel(channel), time)
    }

    /// Availability computed by the policy selected in config.
    pub fn forecast_available_pes(&mut self, time: f64) -> u32 {
        let idle = self.scheduler.idle_pes(time);
        self.vm.estimate(None, time, idle)
    }
}
