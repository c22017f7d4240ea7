//! Verbosity-gated logging for the timeline algorithms.
//!
//! Logging compiles down to a single integer comparison when disabled (verbosity=0).
//! Levels:
//! - 0: SILENT (nothing)
//! - 1: CHANGES (task placements, equipment reservations, completion shifts)
//! - 2: CHECKS (conflict checks, slot searches, priority ordering)
//! - 3: DEBUG (per-interval ledger internals)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: placed tasks, ledger reservations, shifted tasks.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!("[coursetime] {}", format_args!($($arg)*));
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: equipment conflicts found, slot search results, recipe ordering.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!("[coursetime] {}", format_args!($($arg)*));
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!("[coursetime] {}", format_args!($($arg)*));
        }
    };
}
