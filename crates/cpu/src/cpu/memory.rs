//! Main memory, RedBus-routed access, and operand/addressing-mode fetches.
//!
//! Every helper here either consumes operand bytes from `PC` (the `fetch_*`/`addr_*`
//! family) or reads/writes a given address (`read_memory`/`write_memory` and friends).
//! All of it funnels through [`Cpu::read_memory`] / [`Cpu::write_memory`], which is the
//! only place that knows about RedBus windows.

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::{log, Bus};

use super::{Cpu, BANK_SIZE};
use crate::flags;

impl Cpu {
    pub(super) fn read_only_memory(&self, address: u16) -> u8 {
        if address as usize / BANK_SIZE + 1 > self.memory_banks {
            return 0xff;
        }
        self.memory[address as usize]
    }

    pub(super) fn write_only_memory(&mut self, address: u16, value: u8) {
        if address as usize / BANK_SIZE + 1 > self.memory_banks {
            return;
        }
        self.memory[address as usize] = value;
    }

    fn redbus_window_contains(&self, address: u16) -> bool {
        self.mmu.redbus_enabled
            && address >= self.mmu.redbus_window
            && (address as u32) < self.mmu.redbus_window as u32 + 256
    }

    /// Reads one byte, routing through RedBus when `address` falls in the active
    /// window. An unresolvable device sets `rb_timeout` and reads back as zero.
    pub(super) fn read_memory(&mut self, bus: &mut Bus, address: u16) -> u8 {
        if self.redbus_window_contains(address) {
            let offset = (address - self.mmu.redbus_window) as u8;
            let device_id = self.mmu.redbus_device_id;
            match bus.find_mut(device_id) {
                Some(device) => {
                    let value = device.read(offset);
                    self.rb_resolved = Some((device_id, self.mmu.redbus_window));
                    log!(LogCategory::Bus, LogLevel::Trace, "redbus read {device_id:#04x}+{offset:#04x} = {value:#04x}");
                    return value;
                }
                None => {
                    log!(LogCategory::Bus, LogLevel::Warn, "redbus device {device_id:#04x} not found on read");
                    self.rb_timeout = true;
                    return 0;
                }
            }
        }

        self.read_only_memory(address)
    }

    /// Writes one byte. A RedBus-windowed write that resolves a device writes to both
    /// the device and main memory; one that fails to resolve sets `rb_timeout` and
    /// skips the main-memory write entirely.
    pub(super) fn write_memory(&mut self, bus: &mut Bus, address: u16, value: u8) {
        if self.redbus_window_contains(address) {
            let offset = (address - self.mmu.redbus_window) as u8;
            let device_id = self.mmu.redbus_device_id;
            match bus.find_mut(device_id) {
                Some(device) => {
                    device.write(offset, value);
                    self.rb_resolved = Some((device_id, self.mmu.redbus_window));
                    log!(LogCategory::Bus, LogLevel::Trace, "redbus write {device_id:#04x}+{offset:#04x} = {value:#04x}");
                }
                None => {
                    log!(LogCategory::Bus, LogLevel::Warn, "redbus device {device_id:#04x} not found on write");
                    self.rb_timeout = true;
                    return;
                }
            }
        }

        self.write_only_memory(address, value);
    }

    /// Reads another external device's window into the CPU's own memory, as seen from
    /// the peer side of the external window (sub-opcodes `0x03`/`0x04`).
    pub fn peer_read(&self, offset: u8) -> u8 {
        if !self.mmu.external_window_enabled {
            return 0;
        }
        self.read_only_memory(self.mmu.external_window.wrapping_add(offset as u16))
    }

    pub fn peer_write(&mut self, offset: u8, value: u8) {
        if !self.mmu.external_window_enabled {
            return;
        }
        let address = self.mmu.external_window.wrapping_add(offset as u16);
        self.write_only_memory(address, value);
    }

    /// Fetches the operand byte at `PC`, advancing it by one.
    pub(super) fn fetch_byte(&mut self, bus: &mut Bus) -> u8 {
        let pc = self.regs.pc;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.read_memory(bus, pc)
    }

    /// `readM()`: one operand byte, plus a second if the accumulator is 16-bit.
    pub(super) fn fetch_m(&mut self, bus: &mut Bus) -> u16 {
        let mut value = self.fetch_byte(bus) as u16;
        if !self.get_flag(flags::MEMORY_M) {
            value |= (self.fetch_byte(bus) as u16) << 8;
        }
        value
    }

    /// `readX()`: one operand byte, plus a second if the index registers are 16-bit.
    pub(super) fn fetch_x(&mut self, bus: &mut Bus) -> u16 {
        let mut value = self.fetch_byte(bus) as u16;
        if !self.get_flag(flags::INDEX_X) {
            value |= (self.fetch_byte(bus) as u16) << 8;
        }
        value
    }

    /// `readM(address)`: an M-width value read from `address`.
    pub(super) fn read_m_at(&mut self, bus: &mut Bus, address: u16) -> u16 {
        let mut value = self.read_memory(bus, address) as u16;
        if !self.get_flag(flags::MEMORY_M) {
            value |= (self.read_memory(bus, address.wrapping_add(1)) as u16) << 8;
        }
        value
    }

    /// `writeM(address, value)`: writes an M-width value at `address`.
    pub(super) fn write_m(&mut self, bus: &mut Bus, address: u16, value: u16) {
        self.write_memory(bus, address, (value & 0xff) as u8);
        if !self.get_flag(flags::MEMORY_M) {
            self.write_memory(bus, address.wrapping_add(1), (value >> 8) as u8);
        }
    }

    /// `readW()`: a little-endian word operand at `PC`.
    pub(super) fn fetch_w(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        lo | (hi << 8)
    }

    /// `readW(address)`: a little-endian word read from `address`.
    pub(super) fn read_w_at(&mut self, bus: &mut Bus, address: u16) -> u16 {
        let lo = self.read_memory(bus, address) as u16;
        let hi = self.read_memory(bus, address.wrapping_add(1)) as u16;
        lo | (hi << 8)
    }

    /// `readBXW`: zero page, X, indirect — `readW((byte + X) & 0xff)`.
    pub(super) fn addr_zp_x_indirect(&mut self, bus: &mut Bus) -> u16 {
        let zp = (self.fetch_byte(bus) as u16).wrapping_add(self.regs.x) & 0xff;
        self.read_w_at(bus, zp)
    }

    /// `readBS`: stack-relative — `byte + SP`.
    pub(super) fn addr_sp(&mut self, bus: &mut Bus) -> u16 {
        (self.fetch_byte(bus) as u16).wrapping_add(self.regs.sp)
    }

    /// `readBR`: R-relative — `byte + R`.
    pub(super) fn addr_r(&mut self, bus: &mut Bus) -> u16 {
        (self.fetch_byte(bus) as u16).wrapping_add(self.regs.r)
    }

    /// `readBSWY`: stack-relative indirect, Y — `readW(byte + SP) + Y`.
    pub(super) fn addr_sp_indirect_y(&mut self, bus: &mut Bus) -> u16 {
        let base = (self.fetch_byte(bus) as u16).wrapping_add(self.regs.sp);
        self.read_w_at(bus, base).wrapping_add(self.regs.y)
    }

    /// `readBRWY`: R-relative indirect, Y — `readW(byte + R) + Y`.
    pub(super) fn addr_r_indirect_y(&mut self, bus: &mut Bus) -> u16 {
        let base = (self.fetch_byte(bus) as u16).wrapping_add(self.regs.r);
        self.read_w_at(bus, base).wrapping_add(self.regs.y)
    }

    /// `readWX`: absolute, X — a word operand plus `X`.
    pub(super) fn addr_abs_x(&mut self, bus: &mut Bus) -> u16 {
        self.fetch_w(bus).wrapping_add(self.regs.x)
    }

    /// `readWY`: absolute, Y — a word operand plus `Y`.
    pub(super) fn addr_abs_y(&mut self, bus: &mut Bus) -> u16 {
        self.fetch_w(bus).wrapping_add(self.regs.y)
    }

    /// `readWXW`: absolute, X, indirect — `readW(readWX())`.
    pub(super) fn addr_abs_x_indirect(&mut self, bus: &mut Bus) -> u16 {
        let base = self.addr_abs_x(bus);
        self.read_w_at(bus, base)
    }

    /// `readBW`: zero page indirect — `readW(byte)`.
    pub(super) fn addr_zp_indirect(&mut self, bus: &mut Bus) -> u16 {
        let zp = self.fetch_byte(bus) as u16;
        self.read_w_at(bus, zp)
    }

    /// `readBWY`: zero page indirect, Y — `readW(byte) + Y`.
    pub(super) fn addr_zp_indirect_y(&mut self, bus: &mut Bus) -> u16 {
        let zp = self.fetch_byte(bus) as u16;
        self.read_w_at(bus, zp).wrapping_add(self.regs.y)
    }

    /// `readBX`: zero page, X — `byte + X`, masked to a byte if indices are 8-bit.
    pub(super) fn addr_zp_x(&mut self, bus: &mut Bus) -> u16 {
        let mut i = (self.fetch_byte(bus) as u16).wrapping_add(self.regs.x);
        if self.get_flag(flags::INDEX_X) {
            i &= 0xff;
        }
        i
    }
}
