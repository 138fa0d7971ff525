//! The `0xEF` sub-opcode table that programs the embedded MMU.

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::log;

use super::Cpu;

impl Cpu {
    /// Dispatches one MMU sub-opcode. An unrecognized sub-opcode halts the CPU, the
    /// same as an unknown top-level opcode.
    pub(super) fn process_mmu(&mut self, sub_opcode: u8) {
        log!(LogCategory::Mmu, LogLevel::Debug, "mmu sub-opcode {sub_opcode:#04x}");

        match sub_opcode {
            0x00 => {
                let new_id = (self.regs.a & 0xff) as u8;
                if new_id != self.mmu.redbus_device_id {
                    if self.rb_resolved.is_some() {
                        self.rb_timeout = true;
                    }
                    self.mmu.redbus_device_id = new_id;
                }
            }
            0x01 => {
                let new_window = self.regs.a;
                if new_window != self.mmu.redbus_window {
                    if self.rb_resolved.is_some() {
                        self.rb_timeout = true;
                    }
                    self.mmu.redbus_window = new_window;
                }
            }
            0x02 => self.mmu.redbus_enabled = true,
            0x03 => self.mmu.external_window = self.regs.a,
            0x04 => self.mmu.external_window_enabled = true,
            0x06 => self.por_address = self.regs.a,
            0x82 => self.mmu.redbus_enabled = false,
            0x84 => self.mmu.external_window_enabled = false,
            _ => {
                log!(LogCategory::Mmu, LogLevel::Error, "unknown mmu sub-opcode {sub_opcode:#04x}, halting");
                self.is_running = false;
            }
        }
    }
}
