//! Structured logging for development runs.

use crate::develop::DevelopmentStats;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Calling this more than once
/// is harmless; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

/// Logs the counters of a finished development pass.
pub fn log_development(label: &str, stats: &DevelopmentStats) {
    if stats.out_of_bounds_jumps > 0 || stats.forced_ends > 0 {
        tracing::warn!(
            label = label,
            out_of_bounds_jumps = stats.out_of_bounds_jumps,
            forced_ends = stats.forced_ends,
            "Development ended cells early"
        );
    }
    tracing::info!(
        label = label,
        ticks = stats.ticks,
        divisions = stats.divisions,
        jumps = stats.jumps,
        finalized = stats.finalized,
        peak_active = stats.peak_active,
        "Development finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_log_development_does_not_panic() {
        let stats = DevelopmentStats {
            ticks: 3,
            out_of_bounds_jumps: 1,
            ..Default::default()
        };
        log_development("test", &stats);
    }
}
