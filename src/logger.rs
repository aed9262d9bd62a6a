//! Console Logger
//!
//! A `log` backend that writes records through a [`Console`], typically the
//! same strategy object handed to [`console::install`](crate::drivers::console::install).
//!
//! A record emitted while another record is being written (from the console
//! path itself, or from a second core) is dropped rather than written.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

use log::{LevelFilter, Log, Metadata, Record};

use crate::drivers::console::Console;

/// Logger writing one line per record.
pub struct ConsoleLogger<'a, C: Console> {
    console: C,
    target_filters: &'a [(&'a str, LevelFilter)],
    max_level: LevelFilter,
    writing: AtomicBool,
}

impl<'a, C: Console> ConsoleLogger<'a, C> {
    pub const fn new(console: C, target_filters: &'a [(&'a str, LevelFilter)], max_level: LevelFilter) -> Self {
        Self {
            console,
            target_filters,
            max_level,
            writing: AtomicBool::new(false),
        }
    }

    /// Get the console records are written to.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Most verbose level any filter allows.
    fn ceiling(&self) -> LevelFilter {
        self.target_filters
            .iter()
            .map(|(_, level)| *level)
            .fold(self.max_level, core::cmp::max)
    }
}

impl<C: Console + Send> Log for ConsoleLogger<'_, C> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let limit = self
            .target_filters
            .iter()
            .find(|(name, _)| target_matches(metadata.target(), name))
            .map(|(_, level)| *level)
            .unwrap_or(self.max_level);
        metadata.level() <= limit
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.writing.swap(true, Ordering::Acquire) {
            return;
        }
        let mut writer = LineWriter { console: &self.console };
        let _ = writeln!(writer, "[{}] {}: {}", record.level(), record.target(), record.args());
        self.writing.store(false, Ordering::Release);
    }

    fn flush(&self) {}
}

/// A filter for `name` covers the `name` module and its submodules.
fn target_matches(target: &str, name: &str) -> bool {
    match target.strip_prefix(name) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Adapts a console to `fmt::Write`.
struct LineWriter<'c, C: Console> {
    console: &'c C,
}

impl<C: Console> Write for LineWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.put_str(s);
        Ok(())
    }
}

/// Register a logger as the global `log` backend.
pub fn init<C: Console + Send + 'static>(logger: &'static ConsoleLogger<'static, C>) -> Result<(), log::SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.ceiling());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::sync::Mutex;

    use crate::drivers::console::{DroppedBytes, PortConsole};
    use crate::serial::config::PortConfig;
    use crate::serial::pins::{PinName, UartSlot};
    use crate::serial::port::{UartOps, UartPort};
    use crate::serial::registry::PortRegistry;
    use crate::testing::FakeFactory;

    #[derive(Default)]
    struct Sink(Mutex<Vec<u8>>);

    impl Console for Sink {
        fn put_char(&self, ch: u8) -> u8 {
            self.0.lock().unwrap().push(ch);
            ch
        }

        fn get_char(&self) -> u8 {
            0
        }
    }

    fn emit(logger: &ConsoleLogger<'_, Sink>, level: Level, target: &str, msg: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{}", msg))
                .build(),
        );
    }

    #[test]
    fn test_record_format() {
        let logger = ConsoleLogger::new(Sink::default(), &[], LevelFilter::Info);
        emit(&logger, Level::Info, "serial", "slot 0 up");
        let out = logger.console.0.lock().unwrap().clone();
        assert_eq!(out, b"[INFO] serial: slot 0 up\n".to_vec());
    }

    #[test]
    fn test_level_and_target_filters() {
        const FILTERS: &[(&str, LevelFilter)] = &[("panther_serial::serial", LevelFilter::Debug)];
        let logger = ConsoleLogger::new(Sink::default(), FILTERS, LevelFilter::Warn);

        emit(&logger, Level::Info, "board", "dropped");
        emit(&logger, Level::Debug, "panther_serial::serial::port", "kept");
        assert!(!logger.enabled(&Metadata::builder().level(Level::Trace).target("panther_serial::serial").build()));
        assert_eq!(logger.ceiling(), LevelFilter::Debug);

        let out = logger.console.0.lock().unwrap().clone();
        assert_eq!(out, b"[DEBUG] panther_serial::serial::port: kept\n".to_vec());
    }

    #[test]
    fn test_filter_matches_module_boundaries() {
        const FILTERS: &[(&str, LevelFilter)] = &[("panther_serial::serial", LevelFilter::Trace)];
        let logger = ConsoleLogger::new(Sink::default(), FILTERS, LevelFilter::Error);
        let at = |target: &str| logger.enabled(&Metadata::builder().level(Level::Trace).target(target).build());

        assert!(at("panther_serial::serial"));
        assert!(at("panther_serial::serial::termios"));
        assert!(!at("panther_serial::serialx"));
        assert!(!at("panther_serial"));
    }

    /// Console over a port that also logs whenever the port is stuck.
    struct Relogging {
        inner: PortConsole<'static, 'static, FakeFactory>,
    }

    impl Console for Relogging {
        fn put_char(&self, ch: u8) -> u8 {
            if self.inner.dropped() != DroppedBytes::default() {
                log::warn!(target: "stuck_tx", "console dropped output");
            }
            self.inner.put_char(ch)
        }

        fn get_char(&self) -> u8 {
            self.inner.get_char()
        }
    }

    // The only test that installs the global logger
    #[test]
    fn test_stuck_console_does_not_recurse() {
        const FILTERS: &[(&str, LevelFilter)] = &[("stuck_tx", LevelFilter::Warn)];
        let registry: &'static PortRegistry<FakeFactory> = Box::leak(Box::new(PortRegistry::new(FakeFactory::new())));
        let port: &'static UartPort<'static, FakeFactory> = Box::leak(Box::new(
            UartPort::new(PortConfig::new(PinName::PA_7, PinName::PA_8, 19), registry).unwrap(),
        ));
        port.setup().unwrap();
        let logger: &'static ConsoleLogger<'static, Relogging> = Box::leak(Box::new(ConsoleLogger::new(
            Relogging {
                inner: PortConsole::new(port).with_tx_polls(2),
            },
            FILTERS,
            LevelFilter::Off,
        )));
        init(logger).unwrap();

        registry.factory().set_writable(UartSlot::LOG_UART, false);
        log::warn!(target: "stuck_tx", "x");
        let dropped = logger.console().inner.dropped();
        assert_eq!(dropped.timed_out, "[WARN] stuck_tx: x\r\n".len());
        assert!(registry.factory().record(UartSlot::LOG_UART).written.is_empty());

        registry.factory().set_writable(UartSlot::LOG_UART, true);
        log::warn!(target: "stuck_tx", "y");
        let written = registry.factory().record(UartSlot::LOG_UART).written.clone();
        assert_eq!(written, b"[WARN] stuck_tx: y\r\n".to_vec());
    }
}
