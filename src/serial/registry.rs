//! UART Port Registry
//!
//! The registry records which physical UARTs currently have a live hardware
//! handle. It is created once at startup and every port holds a reference.
//!
//! # Design
//! - One entry per physical slot, each behind its own spinlock
//! - Entries are filled only by `setup` and emptied only by `shutdown`
//! - Blocking accessors hold a slot lock only with interrupts masked
//! - [`PortRegistry::try_with_handle`] never spins; interrupt-path queries
//!   use it and report a contended slot as busy

use spin::Mutex;

use super::error::{Result, SerialError};
use super::hal::HardwareFactory;
use super::pins::{UartSlot, UART_SLOTS};

/// Table of live hardware handles, indexed by slot.
pub struct PortRegistry<F: HardwareFactory> {
    factory: F,
    slots: [Mutex<Option<F::Handle>>; UART_SLOTS],
}

impl<F: HardwareFactory> PortRegistry<F> {
    /// Create an empty registry.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            slots: core::array::from_fn(|_| Mutex::new(None)),
        }
    }

    /// Get the hardware factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Check whether a slot has a live handle.
    pub fn is_occupied(&self, slot: UartSlot) -> bool {
        self.slots[slot.index()].lock().is_some()
    }

    /// Allocate a handle for a slot.
    ///
    /// Fails if the slot is already occupied.
    pub fn acquire(&self, slot: UartSlot) -> Result<()> {
        self.factory.without_interrupts(|| {
            let mut entry = self.slots[slot.index()].lock();
            if entry.is_some() {
                return Err(SerialError::SlotOccupied);
            }
            *entry = Some(self.factory.allocate(slot));
            Ok(())
        })
    }

    /// Remove the handle from a slot.
    ///
    /// Returns the removed handle, or error if the slot is empty.
    pub fn release(&self, slot: UartSlot) -> Result<F::Handle> {
        self.factory
            .without_interrupts(|| self.slots[slot.index()].lock().take())
            .ok_or(SerialError::SlotEmpty)
    }

    /// Run `f` on the live handle of a slot, with interrupts masked.
    pub fn with_handle<R>(&self, slot: UartSlot, f: impl FnOnce(&mut F::Handle) -> R) -> Result<R> {
        self.factory.without_interrupts(|| {
            let mut entry = self.slots[slot.index()].lock();
            match entry.as_mut() {
                Some(handle) => Ok(f(handle)),
                None => Err(SerialError::SlotEmpty),
            }
        })
    }

    /// Run `f` on the live handle of a slot if its lock is free.
    ///
    /// Returns [`SerialError::SlotBusy`] instead of spinning when another
    /// context holds the slot.
    pub fn try_with_handle<R>(&self, slot: UartSlot, f: impl FnOnce(&mut F::Handle) -> R) -> Result<R> {
        let mut entry = self.slots[slot.index()].try_lock().ok_or(SerialError::SlotBusy)?;
        match entry.as_mut() {
            Some(handle) => Ok(f(handle)),
            None => Err(SerialError::SlotEmpty),
        }
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFactory;

    #[test]
    fn test_acquire_release_cycle() {
        let registry = PortRegistry::new(FakeFactory::new());
        for _ in 0..3 {
            assert!(registry.acquire(UartSlot::UART0).is_ok());
            assert!(registry.is_occupied(UartSlot::UART0));
            assert!(registry.release(UartSlot::UART0).is_ok());
            assert!(!registry.is_occupied(UartSlot::UART0));
        }
        assert_eq!(registry.factory().allocations(), 3);
    }

    #[test]
    fn test_double_acquire_fails() {
        let registry = PortRegistry::new(FakeFactory::new());
        registry.acquire(UartSlot::LUART).unwrap();
        assert_eq!(registry.acquire(UartSlot::LUART), Err(SerialError::SlotOccupied));
        // Other slots are independent
        assert!(registry.acquire(UartSlot::LOG_UART).is_ok());
        assert_eq!(registry.occupied_count(), 2);
    }

    #[test]
    fn test_try_with_handle_reports_contention() {
        let registry = PortRegistry::new(FakeFactory::new());
        assert_eq!(
            registry.try_with_handle(UartSlot::UART0, |_| ()),
            Err(SerialError::SlotEmpty)
        );
        registry.acquire(UartSlot::UART0).unwrap();

        let nested = registry
            .with_handle(UartSlot::UART0, |_| registry.try_with_handle(UartSlot::UART0, |_| ()))
            .unwrap();
        assert_eq!(nested, Err(SerialError::SlotBusy));
        assert_eq!(registry.try_with_handle(UartSlot::UART0, |_| 7), Ok(7));
        // Blocking accessors ran masked
        assert!(registry.factory().masked_sections() >= 2);
    }

    #[test]
    fn test_release_empty_fails() {
        let registry = PortRegistry::new(FakeFactory::new());
        assert!(matches!(registry.release(UartSlot::UART0), Err(SerialError::SlotEmpty)));
        assert_eq!(
            registry.with_handle(UartSlot::UART0, |_| ()),
            Err(SerialError::SlotEmpty)
        );
    }
}
