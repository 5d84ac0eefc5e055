pub mod config;
pub mod core;
pub mod markdown;
pub mod sync;

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether debug logging is active, shared between the logger filter and the config.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}

/// Route `log` records to the systemd user journal
/// (`journalctl --user -t <identifier> -f`).
///
/// This crate logs at info, or debug when [`debug_logging`] is on; everything
/// else at warn. Returns `false` when the journal is unavailable.
pub fn init_journal_logging(identifier: &str) -> bool {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("horizons") || metadata.target().starts_with("ref_check") {
                let max = if debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier(identifier.to_string()),
        Err(_) => return false,
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_err() {
        return false;
    }
    // Global max must be Debug so debug logs can pass through when toggled
    log::set_max_level(log::LevelFilter::Debug);
    true
}
