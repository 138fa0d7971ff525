//! The opcode dispatch table. One [`Cpu::step`] call fetches and executes a single
//! instruction; [`super::Cpu::run_tick`] is what loops this against a cycle budget.

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::{log, Bus};

use super::Cpu;
use crate::flags;

impl Cpu {
    pub(super) fn step(&mut self, bus: &mut Bus) {
        let pc = self.regs.pc;
        let opcode = self.fetch_byte(bus);
        log!(LogCategory::Cpu, LogLevel::Trace, "{pc:#06x}: opcode {opcode:#04x}");

        match opcode {
            0x01 => {
                let addr = self.addr_zp_x_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x02 => {
                self.regs.pc = self.read_w_at(bus, self.regs.i);
                self.regs.i = self.regs.i.wrapping_add(2);
            }
            0x03 => {
                let addr = self.addr_sp(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x04 => {
                let addr = self.fetch_byte(bus) as u16;
                let v = self.read_m_at(bus, addr);
                self.i_tsb(v);
            }
            0x05 => {
                let addr = self.fetch_byte(bus) as u16;
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x06 => {
                let addr = self.fetch_byte(bus) as u16;
                self.i_asl(bus, addr);
            }
            0x07 => {
                let addr = self.addr_r(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x09 => {
                let v = self.fetch_m(bus);
                self.i_or(v);
            }
            0x0c => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_tsb(v);
            }
            0x0d => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x0e => {
                let addr = self.fetch_w(bus);
                self.i_asl(bus, addr);
            }
            0x10 => {
                let taken = !self.get_flag(flags::SIGN);
                self.i_brc(bus, taken);
            }
            0x11 => {
                let addr = self.addr_zp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x12 => {
                let addr = self.addr_zp_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x13 => {
                let addr = self.addr_sp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x14 => {
                let addr = self.fetch_byte(bus) as u16;
                let v = self.read_m_at(bus, addr);
                self.i_trb(v);
            }
            0x15 => {
                let addr = self.addr_zp_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x16 => {
                let addr = self.addr_zp_x(bus);
                self.i_asl(bus, addr);
            }
            0x17 => {
                let addr = self.addr_r_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x18 => self.set_flag(flags::CARRY, false),
            0x19 => {
                let addr = self.addr_abs_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x1a => {
                let mask = if self.get_flag(flags::MEMORY_M) { 0xff } else { 0xffff };
                self.regs.a = self.regs.a.wrapping_add(1) & mask;
                let a = self.regs.a;
                self.update_nz_value(a);
            }
            0x1c => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_trb(v);
            }
            0x1d => {
                let addr = self.addr_abs_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_or(v);
            }
            0x1e => {
                let addr = self.addr_abs_x(bus);
                self.i_asl(bus, addr);
            }
            0x22 => {
                let i = self.regs.i;
                self.push2r(bus, i);
                self.regs.i = self.regs.pc.wrapping_add(2);
                self.regs.pc = self.read_w_at(bus, self.regs.pc);
            }
            0x2a => {
                let mask = if self.get_flag(flags::MEMORY_M) { 0xff } else { 0xffff };
                let sign_bit = if self.get_flag(flags::MEMORY_M) { 0x80 } else { 0x8000 };
                let n = (self.regs.a << 1 | self.get_flag(flags::CARRY) as u16) & mask;
                self.set_flag(flags::CARRY, n & sign_bit != 0);
                self.regs.a = n;
                self.update_nz();
            }
            0x2b => {
                self.regs.i = self.pop2r(bus);
                let i = self.regs.i;
                self.update_nzx(i);
            }
            0x30 => {
                let taken = self.get_flag(flags::SIGN);
                self.i_brc(bus, taken);
            }
            0x38 => self.set_flag(flags::CARRY, true),
            0x3a => {
                let mask = if self.get_flag(flags::MEMORY_M) { 0xff } else { 0xffff };
                self.regs.a = self.regs.a.wrapping_sub(1) & mask;
                let a = self.regs.a;
                self.update_nz_value(a);
            }
            0x41 => {
                let addr = self.addr_zp_x_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x42 => {
                if self.get_flag(flags::MEMORY_M) {
                    let i = self.regs.i;
                    self.regs.a = self.read_memory(bus, i) as u16;
                    self.regs.i = self.regs.i.wrapping_add(1);
                } else {
                    let i = self.regs.i;
                    self.regs.a = self.read_w_at(bus, i);
                    self.regs.i = self.regs.i.wrapping_add(2);
                }
            }
            0x43 => {
                let addr = self.addr_sp(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x45 => {
                let addr = self.fetch_byte(bus) as u16;
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x47 => {
                let addr = self.addr_r(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x48 => {
                let a = self.regs.a;
                self.push_m(bus, a);
            }
            0x49 => {
                let v = self.fetch_m(bus);
                self.i_eor(v);
            }
            0x4b => {
                let a = self.regs.a;
                self.push_mr(bus, a);
            }
            0x4c => self.regs.pc = self.fetch_w(bus),
            0x4d => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x50 => {
                let taken = !self.get_flag(flags::OVERFLOW);
                self.i_brc(bus, taken);
            }
            0x51 => {
                let addr = self.addr_zp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x52 => {
                let addr = self.addr_zp_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x53 => {
                let addr = self.addr_sp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x55 => {
                let addr = self.addr_zp_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x57 => {
                let addr = self.addr_r_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x59 => {
                let addr = self.addr_abs_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x5a => {
                let y = self.regs.y;
                self.push_x(bus, y);
            }
            0x5c => {
                self.regs.i = self.regs.x;
                let x = self.regs.x;
                self.update_nzx(x);
            }
            0x5d => {
                let addr = self.addr_abs_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_eor(v);
            }
            0x5f => {
                let addr = self.addr_zp_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_div(v);
            }
            0x61 => {
                let addr = self.addr_zp_x_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x63 => {
                let addr = self.addr_sp(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x64 => {
                let addr = self.fetch_byte(bus) as u16;
                self.write_m(bus, addr, 0);
            }
            0x65 => {
                let addr = self.fetch_byte(bus) as u16;
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x67 => {
                let addr = self.addr_r(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x68 => {
                self.regs.a = self.pop_m(bus);
                self.update_nz();
            }
            0x69 => {
                let v = self.fetch_m(bus);
                self.i_adc(v);
            }
            0x6a => {
                let sign_bit = if self.get_flag(flags::MEMORY_M) { 0x80 } else { 0x8000 };
                let n = (self.regs.a >> 1) | if self.get_flag(flags::CARRY) { sign_bit } else { 0 };
                self.set_flag(flags::CARRY, self.regs.a & 1 != 0);
                self.regs.a = n;
                self.update_nz();
            }
            0x6b => {
                self.regs.a = self.pop_mr(bus);
                let a = self.regs.a;
                self.update_nz_value(a);
            }
            0x6d => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x70 => {
                let taken = self.get_flag(flags::OVERFLOW);
                self.i_brc(bus, taken);
            }
            0x71 => {
                let addr = self.addr_zp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x72 => {
                let addr = self.addr_zp_indirect(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x73 => {
                let addr = self.addr_sp_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x75 => {
                let addr = self.addr_zp_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x77 => {
                let addr = self.addr_r_indirect_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x79 => {
                let addr = self.addr_abs_y(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x7a => {
                self.regs.y = self.pop_x(bus);
                let y = self.regs.y;
                self.update_nzx(y);
            }
            0x7d => {
                let addr = self.addr_abs_x(bus);
                let v = self.read_m_at(bus, addr);
                self.i_adc(v);
            }
            0x80 => self.i_brc(bus, true),
            0x81 => {
                let addr = self.addr_zp_x_indirect(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x83 => {
                let addr = self.addr_sp(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x85 => {
                let addr = self.fetch_byte(bus) as u16;
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x87 => {
                let addr = self.addr_r(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x88 => {
                let mask = if self.get_flag(flags::INDEX_X) { 0xff } else { 0xffff };
                self.regs.y = self.regs.y.wrapping_sub(1) & mask;
                let y = self.regs.y;
                self.update_nz_value(y);
            }
            0x8b => {
                if self.get_flag(flags::INDEX_X) {
                    self.regs.sp = (self.regs.r & 0xff00) | (self.regs.x & 0xff);
                } else {
                    self.regs.r = self.regs.x;
                }
                let r = self.regs.r;
                self.update_nzx(r);
            }
            0x8d => {
                let addr = self.fetch_w(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x8f => {
                self.regs.d = 0;
                self.regs.b = 0;
            }
            0x90 => {
                let taken = !self.get_flag(flags::CARRY);
                self.i_brc(bus, taken);
            }
            0x91 => {
                let addr = self.addr_zp_indirect_y(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x92 => {
                let addr = self.addr_zp_indirect(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x93 => {
                let addr = self.addr_sp_indirect_y(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x95 => {
                let addr = self.addr_zp_x(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x97 => {
                let addr = self.addr_r_indirect_y(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x99 => {
                let addr = self.addr_abs_y(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0x9d => {
                let addr = self.addr_abs_x(bus);
                let a = self.regs.a;
                self.write_m(bus, addr, a);
            }
            0xa0 => {
                self.regs.y = self.fetch_x(bus);
                let y = self.regs.y;
                self.update_nz_value(y);
            }
            0xa1 => {
                let addr = self.addr_zp_x_indirect(bus);
                self.regs.a = self.read_m_at(bus, addr);
                self.update_nz();
            }
            0xa2 => {
                self.regs.x = self.fetch_x(bus);
                let x = self.regs.x;
                self.update_nz_value(x);
            }
            0xa3 => {
                let addr = self.addr_sp(bus);
                self.regs.a = self.read_m_at(bus, addr);
                self.update_nz();
            }
            0xa5 => {
                let addr = self.fetch_byte(bus) as u16;
                self.regs.a = self.read_m_at(bus, addr);
                self.update_nz();
            }
            0xa9 => {
                self.regs.a = self.fetch_m(bus);
                self.update_nz();
            }
            0xaa => {
                self.regs.x = self.regs.a;
                if self.get_flag(flags::INDEX_X) {
                    self.regs.x &= 0xff;
                }
                let x = self.regs.x;
                self.update_nzx(x);
            }
            0xad => {
                let addr = self.fetch_w(bus);
                self.regs.a = self.read_m_at(bus, addr);
                self.update_nz();
            }
            0xb0 => {
                let taken = self.get_flag(flags::CARRY);
                self.i_brc(bus, taken);
            }
            0xb5 => {
                let addr = self.addr_zp_x(bus);
                self.regs.a = self.read_m_at(bus, addr);
                self.update_nz();
            }
            0xba => {
                self.regs.x = self.regs.sp;
                if self.get_flag(flags::INDEX_X) {
                    self.regs.x &= 0xff;
                }
                let x = self.regs.x;
                self.update_nzx(x);
            }
            0xc2 => {
                let mask = self.fetch_byte(bus);
                self.reset_flags(mask);
            }
            0xc3 => {
                let addr = self.addr_sp(bus);
                let v = self.read_m_at(bus, addr);
                self.i_cmp(self.regs.a, v);
            }
            0xcb => {
                log!(LogCategory::Cpu, LogLevel::Debug, "WAI");
                self.wai_timeout = true;
            }
            0xcd => {
                let addr = self.fetch_w(bus);
                let v = self.read_m_at(bus, addr);
                self.i_cmp(self.regs.a, v);
            }
            0xcf => self.regs.d = self.pop_m(bus),
            0xd0 => {
                let taken = !self.get_flag(flags::ZERO);
                self.i_brc(bus, taken);
            }
            0xda => {
                let x = self.regs.x;
                self.push_x(bus, x);
            }
            0xdc => {
                self.regs.x = self.regs.i;
                if self.get_flag(flags::INDEX_X) {
                    self.regs.x &= 0xff;
                }
                let x = self.regs.x;
                self.update_nzx(x);
            }
            0xdf => {
                let d = self.regs.d;
                self.push_m(bus, d);
            }
            0xe2 => {
                let mask = self.fetch_byte(bus);
                self.set_flags(mask);
            }
            0xe3 => {
                let addr = self.addr_sp(bus);
                let v = self.read_m_at(bus, addr);
                self.i_sbc(v);
            }
            0xe6 => {
                let addr = self.fetch_byte(bus) as u16;
                self.i_inc(bus, addr);
            }
            0xef => {
                let sub_opcode = self.fetch_byte(bus);
                self.process_mmu(sub_opcode);
            }
            0xf0 => {
                let taken = self.get_flag(flags::ZERO);
                self.i_brc(bus, taken);
            }
            0xf4 => {
                let v = self.fetch_w(bus);
                self.push2(bus, v);
            }
            0xfa => {
                self.regs.x = self.pop_x(bus);
                let x = self.regs.x;
                self.update_nzx(x);
            }
            0xfb => self.xce(),
            _ => {
                log!(LogCategory::Cpu, LogLevel::Error, "unknown opcode {opcode:#04x} at {:#06x}, halting", pc);
                self.is_running = false;
            }
        }
    }

    /// `XCE`: swap `Carry` and `Emulation`. Only native-to-emulation transitions force
    /// 8-bit widths and mask the index registers and accumulator; emulation-to-native
    /// leaves `M`/`X` exactly as they were.
    fn xce(&mut self) {
        if self.get_flag(flags::EMULATION) == self.get_flag(flags::CARRY) {
            return;
        }

        if self.get_flag(flags::EMULATION) {
            self.set_flag(flags::EMULATION, false);
            self.set_flag(flags::CARRY, true);
        } else {
            self.set_flag(flags::EMULATION, true);
            self.set_flag(flags::CARRY, false);
            if !self.get_flag(flags::MEMORY_M) {
                self.regs.b = (self.regs.a >> 8) as u8;
            }
            self.set_flag(flags::MEMORY_M, true);
            self.set_flag(flags::INDEX_X, true);
            self.regs.a &= 0xff;
            self.regs.y &= 0xff;
            self.regs.x &= 0xff;
        }
    }
}
