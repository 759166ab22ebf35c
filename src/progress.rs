//! Per-phase spinners for a reconciliation run.
//!
//! Each pipeline phase (load, reconcile, persist) gets its own spinner.
//! Log lines written through [`LogWriter`] suspend the running spinner so
//! the two never share a terminal line. In log-only mode spinners are
//! hidden and phase completions are logged instead.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Spinner of the phase currently running, if any.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration as `1.2s` or `3.4m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Reconcile,
    Persist,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Load => "Loading inputs",
            Phase::Reconcile => "Reconciling catalog",
            Phase::Persist => "Writing catalog",
        }
    }
}

fn set_active(bar: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE.lock() {
        *active = bar;
    }
}

fn active() -> Option<ProgressBar> {
    ACTIVE.lock().ok().and_then(|active| active.clone())
}

/// Spinner for one phase. Dropping it without `finish` abandons the line,
/// which is what happens when a load error ends the run early.
pub struct PhaseSpinner {
    phase: Phase,
    bar: ProgressBar,
    started: Instant,
}

impl PhaseSpinner {
    pub fn start(phase: Phase) -> Self {
        let bar = ProgressBar::new_spinner();
        if is_log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            if let Ok(style) = ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        bar.set_message(phase.label());
        set_active(Some(bar.clone()));
        Self {
            phase,
            bar,
            started: Instant::now(),
        }
    }

    /// Finish the phase with a short summary such as "312 rows".
    pub fn finish(self, summary: &str) {
        let elapsed = format_duration(self.started.elapsed());
        if is_log_only() {
            info!(phase = self.phase.label(), elapsed = %elapsed, "{}", summary);
        }
        self.bar
            .finish_with_message(format!("{}: {} ({})", self.phase.label(), summary, elapsed));
    }
}

impl Drop for PhaseSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
        set_active(None);
    }
}

/// Stderr writer for the log subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

pub fn log_writer() -> LogWriter {
    LogWriter
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active() {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match active() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
