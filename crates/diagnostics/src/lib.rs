//! Structured logging for the TinyRepo workspace.
//!
//! Every crate in the workspace logs through the macros exported here
//! rather than talking to an emitter directly.
//!
//! Controlled by the TINYREPO_LOG environment variable:
//! - off (default) - silent
//! - info - repository operations, batch commits
//! - debug - dispatch decisions, cache activity, chunk shapes
//! - warn / error - problems only

use std::sync::Once;

// Re-exported so the macros can expand inside dependent crates.
pub use emit;

static INIT: Once = Once::new();

/// Initialize logging from the TINYREPO_LOG environment variable.
///
/// Call once at startup; repeated calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let level = match std::env::var("TINYREPO_LOG").as_deref() {
            Ok("off") | Err(_) => return,
            Ok("debug") => emit::Level::Debug,
            Ok("info") => emit::Level::Info,
            Ok("warn") => emit::Level::Warn,
            Ok("error") => emit::Level::Error,
            Ok(other) => {
                eprintln!("unknown TINYREPO_LOG value '{}', using 'info'", other);
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The emitter runtime must outlive all callers.
        std::mem::forget(rt);
    });
}

/// Log normal operations a user may want to follow (queries, bulk writes).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log internal detail useful when debugging (cache hits, dispatch routes,
/// chunk counts).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems worth noting (fallbacks, suspicious input).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that prevent an operation from completing.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn macros_compile() {
        log_info!("info message");
        log_debug!("debug message with {value}", value: 7);
        log_warn!("warn message");
        log_error!("error message");
    }
}
