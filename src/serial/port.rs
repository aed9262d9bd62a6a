//! UART Port Controller
//!
//! Implements the per-port lifecycle the serial core drives through
//! [`UartOps`], plus the interrupt demultiplexer handed to the hardware.
//!
//! # Port Lifecycle
//! ```text
//!                setup              attach
//! Unconfigured ───────▶ Detached ───────▶ Attached
//!      ▲                 │   ▲                │
//!      └─────────────────┘   └────────────────┘
//!           shutdown              detach
//! ```
//! The port cycles indefinitely across open/close. `setup` and `shutdown`
//! are only legal while detached, so no interrupt callback exists for the
//! slot while its hardware handle is created or freed.
//!
//! # Interrupt Context
//! `receive`, `send`, `rxavailable`, `txready`, `txempty`, `rxint` and
//! `txint` may run from the pump callbacks. They touch only the registry
//! entry of the port's slot and never the port's lifecycle lock.
//!
//! Task-context holders of a slot lock run with interrupts masked through
//! the hardware factory. `receive` and the readiness queries additionally
//! use a non-spinning lock attempt: a contended slot reads as "nothing
//! available" / "not ready", and `receive` fails with `SlotBusy`.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use super::config::PortConfig;
use super::error::{Result, SerialError};
use super::hal::{HardwareFactory, IrqEvent, UartHardware};
use super::pins::{self, UartSlot};
use super::registry::PortRegistry;
use super::termios::{self, Termios};

/// Buffer pump entry points of the serial core.
///
/// Called from interrupt context when the hardware reports work.
pub trait SerialPump: Sync {
    /// Drain received bytes from the port into the receive buffer.
    fn recv_chars(&self);
    /// Refill the port from the transmit buffer.
    fn xmit_chars(&self);
}

/// The single interrupt callback installed on an attached port.
///
/// Routes each hardware event to exactly one pump entry point.
#[derive(Clone, Copy)]
pub struct IrqDemux {
    pump: &'static dyn SerialPump,
}

impl IrqDemux {
    /// Create a demultiplexer for a pump.
    pub const fn new(pump: &'static dyn SerialPump) -> Self {
        Self { pump }
    }

    /// Route one hardware event.
    #[inline]
    pub fn dispatch(&self, event: IrqEvent) {
        match event {
            IrqEvent::Rx => self.pump.recv_chars(),
            IrqEvent::Tx => self.pump.xmit_chars(),
        }
    }
}

impl core::fmt::Debug for IrqDemux {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "IrqDemux({:p})", self.pump as *const dyn SerialPump as *const ())
    }
}

/// Observable lifecycle phase of a port.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortPhase {
    Unconfigured,
    Detached,
    Attached,
}

#[derive(Clone, Copy, Debug)]
enum PortState {
    Unconfigured,
    Detached,
    Attached(IrqDemux),
}

impl PortState {
    const fn phase(&self) -> PortPhase {
        match self {
            Self::Unconfigured => PortPhase::Unconfigured,
            Self::Detached => PortPhase::Detached,
            Self::Attached(_) => PortPhase::Attached,
        }
    }

    fn expect(&self, expected: PortPhase) -> Result<()> {
        let found = self.phase();
        if found == expected {
            Ok(())
        } else {
            log::warn!("serial: rejected transition, port is {:?}, needs {:?}", found, expected);
            Err(SerialError::InvalidState { expected, found })
        }
    }
}

struct PortInner {
    config: PortConfig,
    state: PortState,
}

/// Device operation contract consumed by the serial core.
pub trait UartOps {
    /// Bring up the hardware with the current configuration.
    fn setup(&self) -> Result<()>;
    /// Free the hardware.
    fn shutdown(&self) -> Result<()>;
    /// Start routing interrupts to `pump`.
    fn attach(&self, pump: &'static dyn SerialPump) -> Result<()>;
    /// Stop routing interrupts.
    fn detach(&self) -> Result<()>;
    /// Terminal attribute requests.
    fn ioctl(&self, cmd: u32, arg: Option<&mut Termios>) -> Result<()>;
    /// Pop one byte and its raw status word.
    fn receive(&self) -> Result<(u8, u32)>;
    /// Gate receive interrupts.
    fn rxint(&self, enable: bool) -> Result<()>;
    /// True if a received byte is pending.
    fn rxavailable(&self) -> bool;
    /// Push one byte.
    fn send(&self, byte: u8) -> Result<()>;
    /// Gate transmit interrupts.
    fn txint(&self, enable: bool) -> Result<()>;
    /// True if the transmitter can take a byte right now.
    fn txready(&self) -> bool;
    /// True if the transmitter has drained.
    fn txempty(&self) -> bool;
}

/// One serial port bound to a physical UART.
pub struct UartPort<'r, F: HardwareFactory> {
    slot: UartSlot,
    is_console: AtomicBool,
    rx_int: AtomicBool,
    tx_int: AtomicBool,
    inner: Mutex<PortInner>,
    registry: &'r PortRegistry<F>,
}

impl<'r, F: HardwareFactory> UartPort<'r, F> {
    /// Create an unconfigured port.
    ///
    /// The slot is resolved from the Tx pin here, so a pin that is not wired
    /// to any UART is reported at startup.
    pub fn new(config: PortConfig, registry: &'r PortRegistry<F>) -> Result<Self> {
        let slot = pins::resolve(config.tx)?;
        Ok(Self {
            slot,
            is_console: AtomicBool::new(false),
            rx_int: AtomicBool::new(false),
            tx_int: AtomicBool::new(false),
            inner: Mutex::new(PortInner {
                config,
                state: PortState::Unconfigured,
            }),
            registry,
        })
    }

    /// Physical UART this port drives.
    #[inline]
    pub fn slot(&self) -> UartSlot {
        self.slot
    }

    /// Snapshot of the configuration.
    pub fn config(&self) -> PortConfig {
        self.inner.lock().config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> PortPhase {
        self.inner.lock().state.phase()
    }

    pub fn is_console(&self) -> bool {
        self.is_console.load(Ordering::Relaxed)
    }

    pub fn set_console(&self, console: bool) {
        self.is_console.store(console, Ordering::Relaxed);
    }

    /// Current (rx, tx) interrupt enable state.
    pub fn interrupts_enabled(&self) -> (bool, bool) {
        (
            self.rx_int.load(Ordering::Acquire),
            self.tx_int.load(Ordering::Acquire),
        )
    }

    /// Edit the stored configuration.
    ///
    /// The hardware is not touched; call [`Self::reconfigure`] to apply.
    pub fn update_config(&self, f: impl FnOnce(&mut PortConfig)) {
        f(&mut self.inner.lock().config);
    }

    /// Apply the stored configuration with a full stop/restart cycle.
    ///
    /// A configured port is shut down first. An attached port is detached
    /// before the cycle and re-attached to the same pump afterwards, with
    /// its rx/tx interrupt enables restored.
    ///
    /// If the restart fails the port is left Unconfigured with interrupts
    /// off and no callback installed. The caller must `setup` and `attach`
    /// it again.
    pub fn reconfigure(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let (rx_on, tx_on) = self.interrupts_enabled();

        let reattach = match inner.state {
            PortState::Attached(demux) => {
                self.detach_locked(&mut inner)?;
                Some(demux)
            }
            _ => None,
        };
        if let PortState::Detached = inner.state {
            self.shutdown_locked(&mut inner)?;
        }
        if let Err(err) = self.setup_locked(&mut inner) {
            log::error!(
                "serial: slot {} restart failed ({}), port left unconfigured{}",
                self.slot.index(),
                err,
                if reattach.is_some() { " and detached" } else { "" }
            );
            return Err(err);
        }

        if let Some(demux) = reattach {
            self.attach_locked(&mut inner, demux)?;
            self.set_rx_int(rx_on)?;
            self.set_tx_int(tx_on)?;
        }
        Ok(())
    }

    /// Poll the transmitter until it can take a byte.
    ///
    /// Gives up with [`SerialError::Timeout`] after `max_polls` checks, so a
    /// stuck peripheral cannot hang the caller. Fails at once with
    /// [`SerialError::SlotEmpty`] if the port is not set up. Nothing is
    /// logged here; the console path calls this and must not feed back into
    /// the logger.
    pub fn wait_tx_ready(&self, max_polls: usize) -> Result<()> {
        for _ in 0..max_polls {
            match self.try_hw(|hw| hw.is_writable()) {
                Ok(true) => return Ok(()),
                Err(SerialError::SlotEmpty) => return Err(SerialError::SlotEmpty),
                Ok(false) | Err(_) => core::hint::spin_loop(),
            }
        }
        Err(SerialError::Timeout)
    }

    fn with_hw<R>(&self, f: impl FnOnce(&mut F::Handle) -> R) -> Result<R> {
        self.registry.with_handle(self.slot, f)
    }

    fn try_hw<R>(&self, f: impl FnOnce(&mut F::Handle) -> R) -> Result<R> {
        self.registry.try_with_handle(self.slot, f)
    }

    fn setup_locked(&self, inner: &mut PortInner) -> Result<()> {
        inner.state.expect(PortPhase::Unconfigured)?;
        let cfg = inner.config;

        self.registry.acquire(self.slot)?;
        self.with_hw(|hw| {
            hw.initialize(cfg.tx, cfg.rx, cfg.fifo_settings());
            hw.configure(cfg.baud, cfg.frame_format());
            hw.set_flow_control(cfg.flow_control, cfg.tx, cfg.rx);
            hw.enable();
        })?;

        inner.state = PortState::Detached;
        log::debug!(
            "serial: slot {} up, {} baud {}{:?}{:?} irq {}",
            self.slot.index(),
            cfg.baud,
            cfg.word_len.bits(),
            cfg.parity,
            cfg.stop_bits,
            cfg.irq
        );
        Ok(())
    }

    fn shutdown_locked(&self, inner: &mut PortInner) -> Result<()> {
        inner.state.expect(PortPhase::Detached)?;

        let mut hw = self.registry.release(self.slot)?;
        hw.free();

        self.rx_int.store(false, Ordering::Release);
        self.tx_int.store(false, Ordering::Release);
        inner.state = PortState::Unconfigured;
        log::debug!("serial: slot {} down", self.slot.index());
        Ok(())
    }

    fn attach_locked(&self, inner: &mut PortInner, demux: IrqDemux) -> Result<()> {
        inner.state.expect(PortPhase::Detached)?;

        // Mask at the source before swapping the callback
        self.with_hw(|hw| {
            hw.set_interrupt_enable(IrqEvent::Rx, false);
            hw.set_interrupt_enable(IrqEvent::Tx, false);
            hw.set_interrupt_callback(Some(demux));
        })?;

        self.rx_int.store(false, Ordering::Release);
        self.tx_int.store(false, Ordering::Release);
        inner.state = PortState::Attached(demux);
        log::debug!("serial: slot {} attached", self.slot.index());
        Ok(())
    }

    fn detach_locked(&self, inner: &mut PortInner) -> Result<()> {
        inner.state.expect(PortPhase::Attached)?;

        self.with_hw(|hw| {
            hw.set_interrupt_enable(IrqEvent::Rx, false);
            hw.set_interrupt_enable(IrqEvent::Tx, false);
            hw.set_interrupt_callback(None);
        })?;

        self.rx_int.store(false, Ordering::Release);
        self.tx_int.store(false, Ordering::Release);
        inner.state = PortState::Detached;
        log::debug!("serial: slot {} detached", self.slot.index());
        Ok(())
    }

    fn set_rx_int(&self, enable: bool) -> Result<()> {
        self.with_hw(|hw| hw.set_interrupt_enable(IrqEvent::Rx, enable))?;
        self.rx_int.store(enable, Ordering::Release);
        Ok(())
    }

    fn set_tx_int(&self, enable: bool) -> Result<()> {
        self.with_hw(|hw| {
            hw.set_interrupt_enable(IrqEvent::Tx, enable);
            // Tx only: the rx path has no direct register write
            if enable {
                hw.arm_tx_empty_interrupt();
            }
        })?;
        self.tx_int.store(enable, Ordering::Release);
        Ok(())
    }
}

impl<F: HardwareFactory> UartOps for UartPort<'_, F> {
    fn setup(&self) -> Result<()> {
        self.setup_locked(&mut self.inner.lock())
    }

    fn shutdown(&self) -> Result<()> {
        self.shutdown_locked(&mut self.inner.lock())
    }

    fn attach(&self, pump: &'static dyn SerialPump) -> Result<()> {
        self.attach_locked(&mut self.inner.lock(), IrqDemux::new(pump))
    }

    fn detach(&self) -> Result<()> {
        self.detach_locked(&mut self.inner.lock())
    }

    fn ioctl(&self, cmd: u32, arg: Option<&mut Termios>) -> Result<()> {
        termios::ioctl(self, cmd, arg)
    }

    fn receive(&self) -> Result<(u8, u32)> {
        let raw = self.try_hw(|hw| hw.read_byte())?;
        Ok(((raw & 0xff) as u8, raw))
    }

    fn rxint(&self, enable: bool) -> Result<()> {
        self.set_rx_int(enable)
    }

    fn rxavailable(&self) -> bool {
        self.try_hw(|hw| hw.is_readable()).unwrap_or(false)
    }

    fn send(&self, byte: u8) -> Result<()> {
        self.with_hw(|hw| hw.write_byte(byte))
    }

    fn txint(&self, enable: bool) -> Result<()> {
        self.set_tx_int(enable)
    }

    fn txready(&self) -> bool {
        self.try_hw(|hw| hw.is_writable()).unwrap_or(false)
    }

    fn txempty(&self) -> bool {
        self.try_hw(|hw| hw.is_tx_empty()).unwrap_or(false)
    }
}
