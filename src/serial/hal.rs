//! Hardware Capability Contract
//!
//! The vendor UART driver is opaque to this crate. It is consumed through
//! [`UartHardware`], one handle per physical slot, produced on demand by a
//! [`HardwareFactory`].
//!
//! # Interrupt Delivery
//! The vendor layer owns the interrupt vector. When a port is attached it is
//! handed a single [`IrqDemux`] and must call [`IrqDemux::dispatch`] with
//! the event that fired. It must not call a callback after it has been
//! cleared with `set_interrupt_callback(None)`.
//!
//! Every blocking access to a handle runs inside
//! [`HardwareFactory::without_interrupts`], so on a single core an interrupt
//! can never observe a slot lock held by the code it preempted.

use super::config::{FifoSettings, FlowControl, FrameFormat};
use super::pins::{PinName, UartSlot};
use super::port::IrqDemux;

/// Interrupt source, also used to select a direction when gating interrupts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IrqEvent {
    /// Receive data available or receive timeout.
    Rx,
    /// Transmit holding register empty.
    Tx,
}

/// Low-level operations on one physical UART.
pub trait UartHardware: Send {
    /// Claim the peripheral and route it to the given pins.
    fn initialize(&mut self, tx: PinName, rx: PinName, fifo: FifoSettings);

    /// Program baud rate and character framing.
    fn configure(&mut self, baud: u32, frame: FrameFormat);

    /// Program hardware flow control.
    fn set_flow_control(&mut self, mode: FlowControl, tx: PinName, rx: PinName);

    /// Start the peripheral.
    fn enable(&mut self);

    /// Stop the peripheral and release its resources.
    fn free(&mut self);

    /// Pop one word from the rx FIFO.
    ///
    /// The low 8 bits hold the data, the remaining bits carry line status.
    fn read_byte(&mut self) -> u32;

    /// Push one byte into the tx FIFO.
    fn write_byte(&mut self, byte: u8);

    /// True if the rx FIFO holds at least one byte.
    fn is_readable(&self) -> bool;

    /// True if the tx FIFO can accept a byte.
    fn is_writable(&self) -> bool;

    /// True if the transmitter has drained.
    ///
    /// Hardware without a separate drain indicator reports writability.
    fn is_tx_empty(&self) -> bool {
        self.is_writable()
    }

    /// Install or clear the interrupt callback.
    fn set_interrupt_callback(&mut self, callback: Option<IrqDemux>);

    /// Gate interrupt generation for one direction.
    fn set_interrupt_enable(&mut self, direction: IrqEvent, enable: bool);

    /// Set the transmit-holding-empty enable bit in the interrupt enable
    /// register directly.
    ///
    /// Only the tx path calls this, right after enabling tx interrupts. The
    /// rx path has no equivalent. Whether `set_interrupt_enable` alone is
    /// sufficient on this peripheral is unknown, so the two paths are kept
    /// distinct rather than merged.
    fn arm_tx_empty_interrupt(&mut self);
}

/// Source of hardware handles and the platform's interrupt masking.
pub trait HardwareFactory {
    type Handle: UartHardware;

    /// Produce a fresh, uninitialized handle for a slot.
    fn allocate(&self, slot: UartSlot) -> Self::Handle;

    /// Run `f` with interrupts masked on the current core.
    ///
    /// Must restore the previous mask state on return and must nest.
    fn without_interrupts<R>(&self, f: impl FnOnce() -> R) -> R;
}
