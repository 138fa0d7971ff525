//! The 65EL02-class CPU core: registers, flags, embedded MMU, main memory, and the
//! cooperative tick driver that runs it against a [`redpc_core::Bus`].

mod arith;
mod decode;
mod flags_ops;
mod memory;
mod mmu_ops;
mod stack;

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::{log, Bus};

use crate::flags;
use crate::mmu::Mmu;
use crate::registers::Registers;

/// Total addressable memory: a full 16-bit address space.
pub const MEMORY_SIZE: usize = 0x10000;
/// Size of one memory bank, for the `memory_banks` limit check.
pub const BANK_SIZE: usize = 8192;
/// The bank count the reference machine boots with.
pub const DEFAULT_BANKS: usize = 8;

const COLD_SP: u16 = 512;
const COLD_PC: u16 = 1024;
const COLD_R: u16 = 768;
const DEFAULT_POR_ADDRESS: u16 = 8192;

const DISK_DEVICE_ID: u8 = 2;
const CONSOLE_DEVICE_ID: u8 = 1;

const DEFAULT_CYCLES_PER_TICK: u32 = 1000;
const MAX_CYCLES_PER_TICK_BACKLOG: i64 = 100;

pub struct Cpu {
    pub regs: Registers,
    pub flags: u16,
    pub mmu: Mmu,
    memory: Box<[u8; MEMORY_SIZE]>,
    memory_banks: usize,
    pub por_address: u16,
    pub brk_address: u16,
    pub cycles_per_tick: u32,
    remaining_cycles: i64,
    /// Free-running scheduler tick counter, incremented on every `run_tick` call
    /// regardless of `is_running`. The console's cursor-blink phase is derived from it.
    pub ticks: u64,
    pub is_running: bool,
    /// Set when the CPU could not resolve a RedBus access mid-tick; cleared every tick.
    pub rb_timeout: bool,
    /// Set when a `WAI` ended the tick early; the CPU stays running for future ticks.
    pub wai_timeout: bool,
    /// The `(device id, window)` a RedBus access last resolved to this tick, if any.
    /// Used to detect a device id or window change mid-tick, which signals a timeout
    /// rather than silently rerouting an access already in flight.
    rb_resolved: Option<(u8, u16)>,
}

impl Cpu {
    pub fn new(memory_banks: usize) -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            flags: 0,
            mmu: Mmu::default(),
            memory: Box::new([0; MEMORY_SIZE]),
            memory_banks,
            por_address: DEFAULT_POR_ADDRESS,
            brk_address: DEFAULT_POR_ADDRESS,
            cycles_per_tick: DEFAULT_CYCLES_PER_TICK,
            remaining_cycles: 0,
            ticks: 0,
            is_running: false,
            rb_timeout: false,
            wai_timeout: false,
            rb_resolved: None,
        };
        cpu.cold_boot();
        cpu
    }

    /// Resets registers, flags and the disk/console bootstrap bytes. Does not start
    /// the CPU: `is_running` is left `false`, matching a machine sitting at power-on
    /// before the boot loader hands off.
    pub fn cold_boot(&mut self) {
        self.regs = Registers {
            sp: COLD_SP,
            pc: COLD_PC,
            r: COLD_R,
            ..Registers::default()
        };
        self.flags = flags::EMULATION | flags::MEMORY_M | flags::INDEX_X;
        self.mmu = Mmu::default();
        self.is_running = false;
        self.rb_timeout = false;
        self.wai_timeout = false;
        self.rb_resolved = None;
        self.memory[0] = DISK_DEVICE_ID;
        self.memory[1] = CONSOLE_DEVICE_ID;
        log!(LogCategory::Cpu, LogLevel::Info, "cold boot");
    }

    /// Starts (or restarts) execution. If the CPU was already running, `SP`/`R`/`PC`
    /// are reloaded from `por_address` as if the machine had just reset.
    pub fn warm_boot(&mut self) {
        if self.is_running {
            self.regs.sp = COLD_SP;
            self.regs.r = COLD_R;
            self.regs.pc = self.por_address;
        }
        self.is_running = true;
        log!(LogCategory::Cpu, LogLevel::Info, "warm boot, pc={:#06x}", self.regs.pc);
    }

    pub fn halt(&mut self) {
        self.is_running = false;
        log!(LogCategory::Cpu, LogLevel::Warn, "halted at pc={:#06x}", self.regs.pc);
    }

    /// Copies `image` into memory starting at the boot offset (`0x0400`), truncating
    /// silently if it overruns the 256-byte boot window.
    pub fn load_boot_image(&mut self, image: &[u8]) {
        let base = COLD_PC as usize;
        let window = &mut self.memory[base..base + 256];
        let len = image.len().min(window.len());
        window[..len].copy_from_slice(&image[..len]);
    }

    /// Runs one scheduler tick: accumulates a cycle budget and executes instructions
    /// until it's exhausted, the CPU stops running, `WAI` parks it, or a RedBus access
    /// can't be resolved.
    pub fn run_tick(&mut self, bus: &mut Bus) {
        self.ticks = self.ticks.wrapping_add(1);
        if !self.is_running {
            return;
        }

        self.rb_timeout = false;
        self.wai_timeout = false;
        self.rb_resolved = None;

        self.remaining_cycles += self.cycles_per_tick as i64;
        let cap = MAX_CYCLES_PER_TICK_BACKLOG * self.cycles_per_tick as i64;
        if self.remaining_cycles > cap {
            self.remaining_cycles = cap;
        }

        while self.is_running && !self.wai_timeout && !self.rb_timeout && self.remaining_cycles > 0 {
            self.remaining_cycles -= 1;
            self.step(bus);
        }
    }

    pub fn memory_banks(&self) -> usize {
        self.memory_banks
    }
}
