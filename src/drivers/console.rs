//! Serial Console
//!
//! Provides character output for kernel messages and debug input.
//!
//! Two strategies exist for the console, and exactly one is selected during
//! startup with [`install`]:
//! - [`ConsoleBridge`]: raw polling through the log UART primitive, usable
//!   before the serial core is running
//! - [`PortConsole`]: drives a configured [`UartPort`] directly
//!
//! Once installed the choice is fixed for the lifetime of the system.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Once;

use crate::serial::error::{Result, SerialError};
use crate::serial::hal::HardwareFactory;
use crate::serial::port::{UartOps, UartPort};

/// Raw polling console primitive provided by the boot firmware.
#[cfg_attr(test, mockall::automock)]
pub trait RawConsole {
    /// Write one byte, waiting for the transmitter.
    fn put_raw(&self, ch: u8);
    /// Read one byte, waiting for input.
    fn get_raw(&self) -> u8;
}

/// A console strategy.
pub trait Console: Sync {
    /// Output one character, returning it.
    fn put_char(&self, ch: u8) -> u8;

    /// Read one character.
    fn get_char(&self) -> u8;

    /// Output a string.
    fn put_str(&self, s: &str) {
        for byte in s.bytes() {
            self.put_char(byte);
        }
    }
}

/// Polling console over the raw primitive.
pub struct ConsoleBridge<R: RawConsole> {
    raw: R,
}

impl<R: RawConsole> ConsoleBridge<R> {
    pub const fn new(raw: R) -> Self {
        Self { raw }
    }

    /// Output one character, adding CR before LF.
    pub fn put_char(&self, ch: u8) -> u8 {
        if ch == b'\n' {
            self.raw.put_raw(b'\r');
        }
        self.raw.put_raw(ch);
        ch
    }

    /// Read one character.
    pub fn get_char(&self) -> u8 {
        self.raw.get_raw()
    }
}

impl<R: RawConsole + Sync> Console for ConsoleBridge<R> {
    fn put_char(&self, ch: u8) -> u8 {
        ConsoleBridge::put_char(self, ch)
    }

    fn get_char(&self) -> u8 {
        ConsoleBridge::get_char(self)
    }
}

/// Console that writes straight to a configured port.
///
/// Bytes that cannot be sent within `tx_polls` readiness checks are dropped,
/// as are bytes written while the port is not set up. Both are counted, never
/// logged, since the logger may be writing through this console.
pub struct PortConsole<'p, 'r, F: HardwareFactory> {
    port: &'p UartPort<'r, F>,
    tx_polls: usize,
    timed_out: AtomicUsize,
    port_down: AtomicUsize,
}

/// Bytes a [`PortConsole`] could not deliver.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DroppedBytes {
    /// Transmitter stayed busy for the whole poll budget.
    pub timed_out: usize,
    /// Port had no live hardware.
    pub port_down: usize,
}

impl<'p, 'r, F: HardwareFactory> PortConsole<'p, 'r, F> {
    /// Default readiness budget per byte.
    pub const DEFAULT_TX_POLLS: usize = 100_000;

    pub const fn new(port: &'p UartPort<'r, F>) -> Self {
        Self {
            port,
            tx_polls: Self::DEFAULT_TX_POLLS,
            timed_out: AtomicUsize::new(0),
            port_down: AtomicUsize::new(0),
        }
    }

    pub const fn with_tx_polls(mut self, tx_polls: usize) -> Self {
        self.tx_polls = tx_polls;
        self
    }

    /// Bytes dropped so far.
    pub fn dropped(&self) -> DroppedBytes {
        DroppedBytes {
            timed_out: self.timed_out.load(Ordering::Relaxed),
            port_down: self.port_down.load(Ordering::Relaxed),
        }
    }

    fn emit(&self, ch: u8) {
        let sent = self
            .port
            .wait_tx_ready(self.tx_polls)
            .and_then(|()| self.port.send(ch));
        match sent {
            Ok(()) => {}
            Err(SerialError::SlotEmpty) => {
                self.port_down.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.timed_out.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl<F: HardwareFactory + Sync> Console for PortConsole<'_, '_, F> {
    fn put_char(&self, ch: u8) -> u8 {
        if ch == b'\n' {
            self.emit(b'\r');
        }
        self.emit(ch);
        ch
    }

    /// Blocks until a byte arrives.
    fn get_char(&self) -> u8 {
        loop {
            if self.port.rxavailable() {
                if let Ok((ch, _)) = self.port.receive() {
                    return ch;
                }
            }
            core::hint::spin_loop();
        }
    }
}

/// The console strategy selected at startup
static CONSOLE: Once<&'static dyn Console> = Once::new();

/// Select the console strategy.
///
/// Fails if a console was already selected.
pub fn install(console: &'static dyn Console) -> Result<()> {
    let mut installed = false;
    CONSOLE.call_once(|| {
        installed = true;
        console
    });
    if installed {
        Ok(())
    } else {
        Err(SerialError::ConsoleAlreadyInstalled)
    }
}

/// Get the selected console, if any.
pub fn console() -> Option<&'static dyn Console> {
    CONSOLE.get().copied()
}

/// Output one character on the console.
///
/// Characters are discarded until a console is installed.
pub fn putc(ch: u8) -> u8 {
    if let Some(console) = console() {
        console.put_char(ch);
    }
    ch
}

/// Read one character from the console.
pub fn getc() -> Option<u8> {
    console().map(|console| console.get_char())
}

/// `fmt::Write` adapter over the selected console
pub struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(console) = console() {
            console.put_str(s);
        }
        Ok(())
    }
}

/// Print macro for kernel output
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($crate::drivers::console::ConsoleWriter, $($arg)*);
    }};
}

/// Println macro for kernel output
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}
