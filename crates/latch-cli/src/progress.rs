use std::sync::Mutex;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use latch_core::bench::{PipelineStage, ProgressReporter, RunPhase};

/// Spinner driven by pipeline callbacks. There is no steady tick, so nothing
/// draws while the timed invocations run.
pub struct SpinnerReporter {
    bar: ProgressBar,
    current: Mutex<Option<(PipelineStage, Option<usize>)>>,
}

impl SpinnerReporter {
    pub fn new(hidden: bool) -> Result<Self> {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        Ok(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn show(&self, stage: PipelineStage, total: Option<usize>, done: usize) {
        match total {
            Some(total) => self.bar.set_message(format!("{stage} ({done}/{total})")),
            None => self.bar.set_message(stage.to_string()),
        }
        self.bar.tick();
    }
}

impl ProgressReporter for SpinnerReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        if let Ok(mut current) = self.current.lock() {
            *current = Some((stage, total_items));
        }
        self.show(stage, total_items, 0);
    }

    fn advance(&self, items_done: usize) {
        let current = self.current.lock().ok().and_then(|c| *c);
        if let Some((stage, total)) = current {
            self.show(stage, total, items_done);
        }
    }

    fn phase_changed(&self, phase: RunPhase) {
        if phase == RunPhase::Measuring {
            self.show(PipelineStage::Measuring, None, 0);
        }
    }
}
