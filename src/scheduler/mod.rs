//! Periodic bytecode scheduler and the fault reporter.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;

use crate::program::{patterns, InstallError, Program, MODE_PER_LED, MODE_PER_TICK};
use crate::strip::StripState;
use crate::vm::{Context, Fault};

/// The single program/context pair.
///
/// The surrounding mutex is held by the scheduler for the whole of a tick's
/// passes and by the upload path for installs, so execution and installation
/// are mutually exclusive and an upload is never half-visible.
pub struct Machine {
    pub program: Program,
    pub ctx: Context,
    /// Formatted description of the most recent fault. Kept for the logs;
    /// there is no network retrieval path in this version.
    pub last_fault: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    Faulted,
}

impl Machine {
    /// A machine with the built-in boot program installed.
    pub fn new() -> Self {
        let mut machine = Self {
            program: Program::empty(),
            ctx: Context::new(),
            last_fault: None,
        };
        machine
            .install(&patterns::default_program(), false)
            .expect("built-in boot program installs");
        machine
    }

    /// Validate and adopt a new program, then reset the per-program runtime
    /// state. The RNG state survives; the tick counter and period do not.
    pub fn install(&mut self, payload: &[u8], check_crc: bool) -> Result<(), InstallError> {
        self.program.install(payload, check_crc)?;
        self.ctx.reset_for_program();
        Ok(())
    }

    /// Run one tick's worth of passes against a cleared buffer. Any fault
    /// swaps in the indicator pattern and abandons the rest of the tick.
    pub fn run_tick(&mut self, strip: &mut StripState) -> TickOutcome {
        strip.clear();

        match self.program.mode() {
            MODE_PER_LED => {
                for led in 0..strip.led_count() {
                    self.ctx.current_led = led;
                    if let Err(fault) = self.ctx.run_pass(&self.program, strip) {
                        self.report_fault(fault);
                        return TickOutcome::Faulted;
                    }
                }
            }
            MODE_PER_TICK => {
                self.ctx.current_led = 0;
                if let Err(fault) = self.ctx.run_pass(&self.program, strip) {
                    self.report_fault(fault);
                    return TickOutcome::Faulted;
                }
            }
            // Unknown mode byte: no passes this tick.
            _ => {}
        }

        TickOutcome::Completed
    }

    /// The error reporter: record the fault, then substitute the built-in
    /// indicator so the failure shows on the strip without any network
    /// round-trip. The replaced program is not restored afterwards; only a
    /// fresh upload moves past the indicator.
    fn report_fault(&mut self, fault: Fault) {
        error!("bytecode fault: {}", fault);
        self.last_fault = Some(fault.to_string());
        self.install(&patterns::fault_pattern(), false)
            .expect("built-in fault pattern installs");
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick loop: IDLE -> RUNNING -> IDLE, forever. `wake` cuts the idle sleep
/// short so a fresh upload takes effect without waiting out the period.
pub async fn run(
    machine: Arc<Mutex<Machine>>,
    strip: Arc<Mutex<StripState>>,
    frame_ready: Arc<Notify>,
    wake: Arc<Notify>,
) {
    info!("bytecode scheduler running");

    loop {
        let period_ms = {
            let mut machine = machine.lock().await;
            let mut strip = strip.lock().await;

            match machine.run_tick(&mut strip) {
                TickOutcome::Completed => {
                    machine.ctx.ticks += 1;
                    Some(machine.ctx.period_ms)
                }
                TickOutcome::Faulted => None,
            }
        };

        frame_ready.notify_one();

        // A faulted tick reschedules immediately; the indicator pattern
        // starts rendering on the next pass.
        let Some(period_ms) = period_ms else { continue };

        tokio::select! {
            _ = sleep(Duration::from_millis(u64::from(period_ms.max(1)))) => {}
            _ = wake.notified() => {}
        }
    }
}
