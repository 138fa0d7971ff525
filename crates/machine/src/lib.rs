//! Composes the CPU, the RedBus, and the two bus-attached peripherals (console,
//! floppy drive) into the EForthPC machine: a cold-boot-initialized whole that a
//! shell can tick, feed keypresses, and mount floppies into, without reaching into
//! the CPU or bus directly.

pub mod console;
pub mod error;
pub mod floppy;

use std::cell::RefCell;
use std::rc::Rc;

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::{log, Bus, Device};
use redpc_cpu::cpu::{Cpu, DEFAULT_BANKS};

pub use console::{Console, CursorMode, Snapshot};
pub use error::MachineError;
pub use floppy::{Floppy, FloppyDrive};

/// Wraps a shared, interior-mutable device so it can be registered into the
/// [`Bus`] (which owns `Box<dyn Device>`) while the machine keeps its own handle
/// for direct access, the way `SmsSystem` shares its VDP/PSG between the system
/// and its memory bus via `Rc<RefCell<_>>`.
struct Shared<T>(Rc<RefCell<T>>);

impl<T: Device> Device for Shared<T> {
    fn address(&self) -> u8 {
        self.0.borrow().address()
    }

    fn read(&mut self, offset: u8) -> u8 {
        self.0.borrow_mut().read(offset)
    }

    fn write(&mut self, offset: u8, value: u8) {
        self.0.borrow_mut().write(offset, value)
    }
}

pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    console: Rc<RefCell<Console>>,
    floppy: Rc<RefCell<FloppyDrive>>,
}

impl Machine {
    pub fn new() -> Self {
        Self::with_memory_banks(DEFAULT_BANKS)
    }

    pub fn with_memory_banks(memory_banks: usize) -> Self {
        let console = Rc::new(RefCell::new(Console::new()));
        let floppy = Rc::new(RefCell::new(FloppyDrive::new()));

        let mut bus = Bus::new();
        bus.register(Box::new(Shared(Rc::clone(&console))));
        bus.register(Box::new(Shared(Rc::clone(&floppy))));

        Self {
            cpu: Cpu::new(memory_banks),
            bus,
            console,
            floppy,
        }
    }

    /// Copies a boot image into memory at the fixed boot offset. Call before
    /// `warm_boot`; a missing boot ROM is not fatal here, per spec.md §7 — the
    /// loader (out of scope) decides whether to call this at all.
    pub fn load_boot_image(&mut self, image: &[u8]) {
        self.cpu.load_boot_image(image);
    }

    /// Mounts a floppy image, rejecting one too large for the drive's 2048-sector
    /// addressing. Image bytes are assumed already read from disk by the (out of
    /// scope) loader.
    pub fn insert_floppy(&mut self, name: impl Into<String>, image: Vec<u8>) -> Result<(), MachineError> {
        if image.len() > error::MAX_FLOPPY_IMAGE_BYTES {
            return Err(MachineError::FloppyImageTooLarge { actual: image.len() });
        }
        self.floppy.borrow_mut().set_disk(Floppy::new(name, image));
        log!(LogCategory::Device, LogLevel::Info, "floppy mounted");
        Ok(())
    }

    pub fn eject_floppy(&mut self) {
        self.floppy.borrow_mut().eject();
    }

    pub fn push_key(&mut self, code: u8) {
        self.console.borrow_mut().push_key(code);
    }

    pub fn console_snapshot(&self) -> Snapshot {
        self.console.borrow().snapshot(self.cpu.ticks)
    }

    /// Plain-text rendering of the console screen, standing in for the out-of-scope
    /// glyph rasterizer when there's no windowing shell to hand a snapshot to.
    pub fn console_debug_dump(&self) -> String {
        self.console.borrow().debug_dump()
    }

    pub fn warm_boot(&mut self) {
        self.cpu.warm_boot();
    }

    pub fn cold_boot(&mut self) {
        self.cpu.cold_boot();
    }

    pub fn run_tick(&mut self) {
        self.cpu.run_tick(&mut self.bus);
    }

    pub fn is_running(&self) -> bool {
        self.cpu.is_running
    }

    pub fn ticks(&self) -> u64 {
        self.cpu.ticks
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_boot_seeds_device_ids_and_stays_halted() {
        let machine = Machine::new();
        assert_eq!(machine.cpu().memory_banks(), DEFAULT_BANKS);
        assert!(!machine.is_running());
    }

    #[test]
    fn redbus_write_routes_to_the_console_device() {
        let mut machine = Machine::new();
        let program = redbus_map_program(1, 0x8000, &[(0x10, b'A')]);
        machine.load_boot_image(&program);
        machine.warm_boot();
        machine.run_tick();

        let snapshot = machine.console_snapshot();
        assert_eq!(snapshot.screen[0], b'A');
    }

    #[test]
    fn push_key_reaches_the_same_console_the_bus_routes_to() {
        let mut machine = Machine::new();
        machine.push_key(b'x');
        assert_eq!(machine.console.borrow().read(0x06), b'x');
    }

    #[test]
    fn insert_floppy_rejects_an_oversized_image() {
        let mut machine = Machine::new();
        let huge = vec![0u8; error::MAX_FLOPPY_IMAGE_BYTES + 1];
        let result = machine.insert_floppy("TOO BIG", huge);
        assert!(result.is_err());
    }

    #[test]
    fn insert_floppy_then_eject_fails_subsequent_commands() {
        let mut machine = Machine::new();
        machine.insert_floppy("DISK", vec![0; 256]).unwrap();
        machine.eject_floppy();
        assert!(machine.floppy.borrow().is_ejected());
    }

    /// Builds a boot-image program that selects `device_id`, maps the RedBus window
    /// at `window`, enables it, writes each `(offset, value)` pair via an absolute
    /// store, then parks on `WAI`.
    fn redbus_map_program(device_id: u8, window: u16, writes: &[(u8, u8)]) -> Vec<u8> {
        // Cold boot leaves the CPU in emulation mode (M/X pinned 8-bit); the window
        // value needs a 16-bit A, so XCE into native mode and REP #$20 first.
        let mut p = vec![0xfb]; // XCE: enter native mode
        p.extend_from_slice(&[0xc2, 0x20]); // REP #$20: clear M, 16-bit A
        p.extend_from_slice(&[0xa9, device_id, 0x00]); // LDA #device (16-bit immediate)
        p.extend_from_slice(&[0xef, 0x00]); // select device
        p.extend_from_slice(&[0xa9, window as u8, (window >> 8) as u8]); // LDA #window
        p.extend_from_slice(&[0xef, 0x01]); // set redbus window
        p.extend_from_slice(&[0xef, 0x02]); // enable redbus
        p.extend_from_slice(&[0xe2, 0x20]); // SEP #$20: back to 8-bit A for byte writes
        for &(offset, value) in writes {
            let addr = window.wrapping_add(offset as u16);
            p.extend_from_slice(&[0xa9, value]); // LDA #value
            p.extend_from_slice(&[0x8d, addr as u8, (addr >> 8) as u8]); // STA addr (abs)
        }
        p.push(0xcb); // WAI
        p
    }
}
