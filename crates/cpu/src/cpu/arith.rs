//! `ADC`/`SBC`/`DIV` and the other instruction bodies shared by more than one opcode.

use redpc_core::Bus;

use super::Cpu;
use crate::flags;

impl Cpu {
    /// `ADC`. Decimal-mode addition is unimplemented upstream and panics here too; the
    /// binary 8-bit path, left as a stub in the reference image, is filled in properly.
    pub(super) fn i_adc(&mut self, value: u16) {
        if self.get_flag(flags::MEMORY_M) {
            if self.get_flag(flags::DECIMAL) {
                panic!("decimal-mode ADC is not implemented");
            }
            let a = self.regs.a & 0xff;
            let v = value & 0xff;
            let carry_in = self.get_flag(flags::CARRY) as u16;
            let sum = a + v + carry_in;
            self.set_flag(flags::CARRY, sum > 0xff);
            let result = sum & 0xff;
            self.set_flag(flags::OVERFLOW, (result ^ a) & (result ^ v) & 0x80 != 0);
            self.regs.a = (self.regs.a & 0xff00) | result;
        } else {
            let a = self.regs.a as u32;
            let v = value as u32;
            let carry_in = self.get_flag(flags::CARRY) as u32;
            let sum = a + v + carry_in;
            self.set_flag(flags::CARRY, sum > 0xffff);
            let result = (sum & 0xffff) as u16;
            self.set_flag(flags::OVERFLOW, (result ^ self.regs.a) & (result ^ value) & 0x8000 != 0);
            self.regs.a = result;
        }

        self.update_nz();
    }

    /// `SBC`. The reference image's carry handling is dead code (its two branches are
    /// identical, so the computed adjustment is always zero regardless of `Carry`).
    /// This implements the textbook borrow-aware subtraction instead.
    pub(super) fn i_sbc(&mut self, value: u16) {
        if self.get_flag(flags::MEMORY_M) {
            if self.get_flag(flags::DECIMAL) {
                panic!("decimal-mode SBC is not implemented");
            }
            let a = (self.regs.a & 0xff) as i32;
            let v = (value & 0xff) as i32;
            let borrow_in = 1 - self.get_flag(flags::CARRY) as i32;
            let result = a - v - borrow_in;
            self.set_flag(flags::CARRY, result >= 0);
            let result = (result & 0xff) as u16;
            let neg_v = (!(value & 0xff)).wrapping_add(1) & 0xff;
            self.set_flag(flags::OVERFLOW, (result ^ (a as u16)) & (result ^ neg_v) & 0x80 != 0);
            self.regs.a = (self.regs.a & 0xff00) | result;
        } else {
            let a = self.regs.a as i32;
            let v = value as i32;
            let borrow_in = 1 - self.get_flag(flags::CARRY) as i32;
            let result = a - v - borrow_in;
            self.set_flag(flags::CARRY, result >= 0);
            let result = (result & 0xffff) as u16;
            let neg_v = (!value).wrapping_add(1);
            self.set_flag(flags::OVERFLOW, (result ^ self.regs.a) & (result ^ neg_v) & 0x8000 != 0);
            self.regs.a = result;
        }

        self.update_nz();
    }

    /// `DIV`: signed `D:A / value -> A`, remainder `-> D`. Division by zero clears `A`
    /// and `D` and the V/Z/N flags, regardless of width or carry. The 8-bit-accumulator
    /// and carry-set variants are unimplemented upstream; both panic here too.
    pub(super) fn i_div(&mut self, value: u16) {
        if value == 0 {
            self.regs.a = 0;
            self.regs.d = 0;
            self.set_flag(flags::OVERFLOW, false);
            self.set_flag(flags::ZERO, false);
            self.set_flag(flags::SIGN, false);
            return;
        }

        if self.get_flag(flags::MEMORY_M) {
            panic!("8-bit DIV is not implemented");
        }
        if self.get_flag(flags::CARRY) {
            panic!("carry-mode DIV is not implemented");
        }

        let dividend = (((self.regs.d as u32) << 16) | self.regs.a as u32) as i32 as i64;
        let divisor = value as i64;
        let remainder = dividend % divisor;
        let quotient = dividend / divisor;

        self.regs.d = (remainder & 0xffff) as u16;
        self.regs.a = (quotient & 0xffff) as u16;
        self.set_flag(flags::OVERFLOW, quotient > 0xffff);
        self.set_flag(flags::ZERO, self.regs.a == 0);
        self.set_flag(flags::SIGN, quotient < 0);
    }

    /// `ASL value`: `value` is an address, not data — shifts the M-width word stored
    /// there left by one, through `Carry`.
    pub(super) fn i_asl(&mut self, bus: &mut Bus, address: u16) {
        let i = self.read_m_at(bus, address);
        let sign_bit = if self.get_flag(flags::MEMORY_M) { 0x80 } else { 0x8000 };
        self.set_flag(flags::CARRY, i & sign_bit != 0);
        let mask = if self.get_flag(flags::MEMORY_M) { 0xff } else { 0xffff };
        let i = (i << 1) & mask;
        self.update_nz_value(i);
        self.write_m(bus, address, i);
    }

    /// `Bcc`: always consumes the signed branch-offset operand, takes it only if
    /// `condition` holds.
    pub(super) fn i_brc(&mut self, bus: &mut Bus, condition: bool) {
        let offset = self.fetch_byte(bus) as i8;
        if condition {
            self.regs.pc = self.regs.pc.wrapping_add(offset as i16 as u16);
        }
    }

    /// `TRB`: clears in `A` the bits set in `value`, and sets `Zero` when they overlap
    /// (the overlap test, not an all-clear test — this instruction never writes `value`
    /// back to memory despite taking a memory-width operand).
    pub(super) fn i_trb(&mut self, value: u16) {
        self.set_flag(flags::ZERO, value & self.regs.a != 0);
        self.regs.a &= value ^ 0xffff;
    }

    /// `TSB`: sets in `A` the bits set in `value`; see [`Self::i_trb`] for the `Zero`
    /// semantics and the memory-operand quirk.
    pub(super) fn i_tsb(&mut self, value: u16) {
        self.set_flag(flags::ZERO, value & self.regs.a != 0);
        self.regs.a |= value;
    }

    pub(super) fn i_cmp(&mut self, x: u16, y: u16) {
        self.set_flag(flags::CARRY, x >= y);
        self.set_flag(flags::ZERO, x == y);
        let result = x.wrapping_sub(y);
        let sign_bit = if self.get_flag(flags::MEMORY_M) { 0x80 } else { 0x8000 };
        self.set_flag(flags::SIGN, result & sign_bit != 0);
    }

    pub(super) fn i_inc(&mut self, bus: &mut Bus, address: u16) {
        let mask = if self.get_flag(flags::MEMORY_M) { 0xff } else { 0xffff };
        let i = (self.read_m_at(bus, address).wrapping_add(1)) & mask;
        self.write_m(bus, address, i);
        self.update_nz_value(i);
    }

    pub(super) fn i_eor(&mut self, value: u16) {
        self.regs.a ^= value;
        self.update_nz();
    }

    pub(super) fn i_or(&mut self, value: u16) {
        self.regs.a |= value;
        self.update_nz();
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Cpu, DEFAULT_BANKS};
    use crate::flags;
    use redpc_core::Bus;

    fn native16(cpu: &mut Cpu) {
        cpu.set_flag(flags::EMULATION, false);
        cpu.set_flag(flags::MEMORY_M, false);
    }

    #[test]
    fn adc_16bit_sets_carry_and_overflow() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        native16(&mut cpu);
        cpu.regs.a = 0x7fff;
        cpu.i_adc(1);
        assert_eq!(cpu.regs.a, 0x8000);
        assert!(!cpu.get_flag(flags::CARRY));
        assert!(cpu.get_flag(flags::OVERFLOW));
    }

    #[test]
    fn sbc_16bit_without_carry_borrows_one() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        native16(&mut cpu);
        cpu.set_flag(flags::CARRY, false);
        cpu.regs.a = 5;
        cpu.i_sbc(3);
        assert_eq!(cpu.regs.a, 1);
        assert!(cpu.get_flag(flags::CARRY));
    }

    #[test]
    fn sbc_16bit_with_carry_borrows_nothing() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        native16(&mut cpu);
        cpu.set_flag(flags::CARRY, true);
        cpu.regs.a = 5;
        cpu.i_sbc(3);
        assert_eq!(cpu.regs.a, 2);
    }

    #[test]
    fn div_by_zero_clears_a_and_d() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        native16(&mut cpu);
        cpu.regs.a = 10;
        cpu.regs.d = 0;
        cpu.i_div(0);
        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.d, 0);
    }

    #[test]
    fn div_computes_quotient_and_remainder() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        native16(&mut cpu);
        cpu.regs.a = 17;
        cpu.regs.d = 0;
        cpu.i_div(5);
        assert_eq!(cpu.regs.a, 3);
        assert_eq!(cpu.regs.d, 2);
    }

    #[test]
    #[should_panic(expected = "decimal-mode ADC")]
    fn adc_8bit_decimal_panics() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        cpu.set_flag(flags::DECIMAL, true);
        cpu.i_adc(1);
    }

    #[test]
    fn trb_sets_zero_on_bit_overlap_not_all_clear() {
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        cpu.regs.a = 0b1100;
        cpu.i_trb(0b0100);
        assert!(cpu.get_flag(flags::ZERO));
        assert_eq!(cpu.regs.a, 0b1000);
    }

    #[test]
    fn asl_shifts_memory_operand() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new(DEFAULT_BANKS);
        cpu.write_only_memory(0x10, 0x81);
        cpu.i_asl(&mut bus, 0x10);
        assert_eq!(cpu.read_only_memory(0x10), 0x02);
        assert!(cpu.get_flag(flags::CARRY));
    }
}
