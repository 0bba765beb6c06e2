//! indicatif progress reporting for range operations

use indicatif::{ProgressBar, ProgressStyle};
use rnand_core::flash::RangeProgress;
use rnand_core::protocol::Direction;
use std::ops::ControlFlow;

/// Progress bar counting bytes, advanced once per page or block
pub struct BarProgress {
    bar: Option<ProgressBar>,
    unit_bytes: u64,
}

impl BarProgress {
    /// `unit_bytes` is the size of one unit: page size, or block size for erase
    pub fn new(unit_bytes: u32) -> Self {
        Self {
            bar: None,
            unit_bytes: unit_bytes as u64,
        }
    }
}

impl RangeProgress for BarProgress {
    fn start(&mut self, direction: Direction, total_units: u32) {
        let phase = match direction {
            Direction::Read => "Reading",
            Direction::Program => "Writing",
            Direction::Erase => "Erasing",
        };
        let pb = ProgressBar::new(total_units as u64 * self.unit_bytes);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn advance(&mut self, completed: u32) -> ControlFlow<()> {
        if let Some(pb) = &self.bar {
            pb.set_position(completed as u64 * self.unit_bytes);
        }
        ControlFlow::Continue(())
    }

    fn finish(&mut self, _completed: u32) {
        if let Some(pb) = self.bar.take() {
            pb.finish();
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        // A failed range never reaches finish()
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
    }
}
