//! Process-wide progress reporting.
//!
//! Reporting is off by default. A [`ReportGuard`] turns it on (or off) for a
//! scope and restores the previous setting on drop. Engines check
//! [`enabled`] at their report points and emit through `tracing`, so a
//! subscriber decides where the lines go.

use parking_lot::RwLock;

static ENABLED: RwLock<bool> = RwLock::new(false);

/// True iff progress reporting is currently enabled.
pub fn enabled() -> bool {
    *ENABLED.read()
}

/// RAII toggle for progress reporting.
///
/// ```
/// use fpsemi::report::ReportGuard;
/// let _rg = ReportGuard::new(false);
/// ```
#[derive(Debug)]
pub struct ReportGuard {
    previous: bool,
}

impl ReportGuard {
    /// Enable or disable reporting until the guard is dropped.
    pub fn new(enable: bool) -> Self {
        let mut state = ENABLED.write();
        let previous = *state;
        *state = enable;
        Self { previous }
    }
}

impl Default for ReportGuard {
    /// Enables reporting, matching the original's bare `ReportGuard()`.
    fn default() -> Self {
        Self::new(true)
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        *ENABLED.write() = self.previous;
    }
}

/// Install a `tracing` subscriber writing to stderr, filtered by
/// `RUST_LOG` (default `info`). Safe to call more than once.
#[cfg(feature = "subscriber")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}
