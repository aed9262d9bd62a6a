//! Test doubles for the hardware contract and the serial core pumps.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::serial::config::{FifoSettings, FlowControl, FrameFormat};
use crate::serial::hal::{HardwareFactory, IrqEvent, UartHardware};
use crate::serial::pins::{PinName, UartSlot, UART_SLOTS};
use crate::serial::port::{IrqDemux, SerialPump};

/// Hook run once, after the lock is dropped, the next time a handle is freed.
pub type FreeHook = Box<dyn FnMut() + Send>;

/// Everything the driver did to one slot, across all handles allocated for it.
pub struct HwRecord {
    pub initialized: usize,
    pub enabled: usize,
    pub freed: usize,
    pub pins: Option<(PinName, PinName)>,
    pub fifo: Option<FifoSettings>,
    pub configured: Vec<(u32, FrameFormat)>,
    pub flow: Option<FlowControl>,
    pub written: Vec<u8>,
    pub rx_fifo: VecDeque<u32>,
    pub writable: bool,
    pub callback: Option<IrqDemux>,
    pub callback_installs: usize,
    pub rx_irq: bool,
    pub tx_irq: bool,
    pub tx_armed: usize,
    pub on_free: Option<FreeHook>,
}

impl Default for HwRecord {
    fn default() -> Self {
        Self {
            initialized: 0,
            enabled: 0,
            freed: 0,
            pins: None,
            fifo: None,
            configured: Vec::new(),
            flow: None,
            written: Vec::new(),
            rx_fifo: VecDeque::new(),
            writable: true,
            callback: None,
            callback_installs: 0,
            rx_irq: false,
            tx_irq: false,
            tx_armed: 0,
            on_free: None,
        }
    }
}

/// Hardware handle backed by a shared [`HwRecord`].
pub struct FakeUart {
    record: Arc<Mutex<HwRecord>>,
}

impl FakeUart {
    fn record(&self) -> MutexGuard<'_, HwRecord> {
        self.record.lock().unwrap()
    }
}

impl UartHardware for FakeUart {
    fn initialize(&mut self, tx: PinName, rx: PinName, fifo: FifoSettings) {
        let mut hw = self.record();
        hw.initialized += 1;
        hw.pins = Some((tx, rx));
        hw.fifo = Some(fifo);
    }

    fn configure(&mut self, baud: u32, frame: FrameFormat) {
        self.record().configured.push((baud, frame));
    }

    fn set_flow_control(&mut self, mode: FlowControl, _tx: PinName, _rx: PinName) {
        self.record().flow = Some(mode);
    }

    fn enable(&mut self) {
        self.record().enabled += 1;
    }

    fn free(&mut self) {
        let hook = {
            let mut hw = self.record();
            hw.freed += 1;
            hw.callback = None;
            hw.rx_irq = false;
            hw.tx_irq = false;
            hw.on_free.take()
        };
        if let Some(mut hook) = hook {
            hook();
        }
    }

    fn read_byte(&mut self) -> u32 {
        self.record().rx_fifo.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, byte: u8) {
        self.record().written.push(byte);
    }

    fn is_readable(&self) -> bool {
        !self.record().rx_fifo.is_empty()
    }

    fn is_writable(&self) -> bool {
        self.record().writable
    }

    fn set_interrupt_callback(&mut self, callback: Option<IrqDemux>) {
        let mut hw = self.record();
        if callback.is_some() {
            hw.callback_installs += 1;
        }
        hw.callback = callback;
    }

    fn set_interrupt_enable(&mut self, direction: IrqEvent, enable: bool) {
        let mut hw = self.record();
        match direction {
            IrqEvent::Rx => hw.rx_irq = enable,
            IrqEvent::Tx => hw.tx_irq = enable,
        }
    }

    fn arm_tx_empty_interrupt(&mut self) {
        self.record().tx_armed += 1;
    }
}

/// Factory handing out [`FakeUart`]s that share one record per slot.
pub struct FakeFactory {
    records: [Arc<Mutex<HwRecord>>; UART_SLOTS],
    allocations: AtomicUsize,
    masked: AtomicUsize,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            records: core::array::from_fn(|_| Arc::new(Mutex::new(HwRecord::default()))),
            allocations: AtomicUsize::new(0),
            masked: AtomicUsize::new(0),
        }
    }

    /// Number of masked sections entered so far.
    pub fn masked_sections(&self) -> usize {
        self.masked.load(Ordering::SeqCst)
    }

    /// Number of handles allocated so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn record(&self, slot: UartSlot) -> MutexGuard<'_, HwRecord> {
        self.records[slot.index()].lock().unwrap()
    }

    /// Raise an interrupt on a slot, as the vendor layer would.
    pub fn fire(&self, slot: UartSlot, event: IrqEvent) {
        let callback = self.record(slot).callback;
        if let Some(demux) = callback {
            demux.dispatch(event);
        }
    }

    /// Queue a word in the rx FIFO of a slot.
    pub fn push_rx(&self, slot: UartSlot, word: u32) {
        self.record(slot).rx_fifo.push_back(word);
    }

    pub fn set_writable(&self, slot: UartSlot, writable: bool) {
        self.record(slot).writable = writable;
    }
}

impl HardwareFactory for FakeFactory {
    type Handle = FakeUart;

    fn allocate(&self, slot: UartSlot) -> FakeUart {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        FakeUart {
            record: Arc::clone(&self.records[slot.index()]),
        }
    }

    fn without_interrupts<R>(&self, f: impl FnOnce() -> R) -> R {
        self.masked.fetch_add(1, Ordering::SeqCst);
        f()
    }
}

/// Pump that counts how often each entry point ran.
#[derive(Default)]
pub struct CountingPump {
    rx: AtomicUsize,
    tx: AtomicUsize,
}

impl CountingPump {
    /// Allocate a pump that lives for the rest of the test binary.
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    /// (recv_chars, xmit_chars) call counts.
    pub fn counts(&self) -> (usize, usize) {
        (self.rx.load(Ordering::SeqCst), self.tx.load(Ordering::SeqCst))
    }
}

impl SerialPump for CountingPump {
    fn recv_chars(&self) {
        self.rx.fetch_add(1, Ordering::SeqCst);
    }

    fn xmit_chars(&self) {
        self.tx.fetch_add(1, Ordering::SeqCst);
    }
}
