//! Logging configuration for the verification engine
//!
//! Thin wrappers over `log` + `env_logger`. Level conventions:
//!
//! - `error!` - internal faults that should always be shown
//! - `warn!`  - suspicious but recoverable conditions
//! - `info!`  - per-build progress (driver lifecycle)
//! - `debug!` - per-unit decisions (gating, dedup, verifier dispatch)
//! - `trace!` - per-node detail inside the tree walks
//!
//! Set `RUST_LOG` to control output at runtime, e.g.
//! `RUST_LOG=verifier::driver=debug corocheck check unit.json`.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with sensible defaults (Warn level).
///
/// Only initializes once; subsequent calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from the `RUST_LOG` environment variable,
/// falling back to Warn when unset.
pub fn init_from_env() {
    INIT.call_once(|| {
        Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}
