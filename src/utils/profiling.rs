use std::time::{Duration, Instant};

/// Per-step timing data gathered by the world stepper.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfile {
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solve_time: Duration,
    pub solve_toi_time: Duration,
    pub total_step_time: Duration,

    pub body_count: usize,
    pub contact_count: usize,
    pub island_count: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_step_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        log::debug!("--- Step Profile ---");
        log::debug!(
            "Bodies: {}, Contacts: {}, Islands: {}",
            self.body_count,
            self.contact_count,
            self.island_count
        );
        log::debug!(
            "Total Step: {:.2} ms",
            self.total_step_time.as_secs_f32() * 1000.0
        );
        log::debug!(
            "  Broad Phase:  {:.2} ms ({:.1}%)",
            self.broad_phase_time.as_secs_f32() * 1000.0,
            (self.broad_phase_time.as_micros() as f32 / total_us) * 100.0
        );
        log::debug!(
            "  Narrow Phase: {:.2} ms ({:.1}%)",
            self.narrow_phase_time.as_secs_f32() * 1000.0,
            (self.narrow_phase_time.as_micros() as f32 / total_us) * 100.0
        );
        log::debug!(
            "  Solve:        {:.2} ms ({:.1}%)",
            self.solve_time.as_secs_f32() * 1000.0,
            (self.solve_time.as_micros() as f32 / total_us) * 100.0
        );
        log::debug!(
            "  Solve TOI:    {:.2} ms ({:.1}%)",
            self.solve_toi_time.as_secs_f32() * 1000.0,
            (self.solve_toi_time.as_micros() as f32 / total_us) * 100.0
        );
    }
}

/// Accumulates a duration into the referenced slot when dropped.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for PhaseTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
