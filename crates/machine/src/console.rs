//! The 80x50 text console: a row-windowed framebuffer, cursor registers, and a
//! 16-entry keyboard ring buffer, all exposed over a 256-byte RedBus window.

use redpc_core::logging::{LogCategory, LogLevel};
use redpc_core::{log, Device};

pub const DEVICE_ID: u8 = 1;

pub const COLUMNS: usize = 80;
pub const ROWS: usize = 50;
pub const SCREEN_SIZE: usize = COLUMNS * ROWS;

const KB_BUFFER_LEN: usize = 16;
const ROW_WINDOW_BASE: u8 = 0x10;
const ROW_WINDOW_END: u8 = ROW_WINDOW_BASE + COLUMNS as u8 - 1;

/// Cursor rendering mode, as read by the external rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Off,
    Solid,
    Blink,
}

impl CursorMode {
    fn from_byte(value: u8) -> Self {
        match value {
            1 => CursorMode::Solid,
            2 => CursorMode::Blink,
            _ => CursorMode::Off,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            CursorMode::Off => 0,
            CursorMode::Solid => 1,
            CursorMode::Blink => 2,
        }
    }
}

/// Stored-but-unexecuted blit parameters. Spec leaves blit execution unspecified;
/// this struct exists purely so the registers round-trip on read.
#[derive(Debug, Default, Clone, Copy)]
struct BlitRegisters {
    mode: u8,
    xs: u8,
    ys: u8,
    xd: u8,
    yd: u8,
    w: u8,
    h: u8,
}

/// A read-only, owned view of console state sufficient for an external renderer to
/// draw the 80x50 glyph grid and cursor, per spec.md §6. Owned rather than borrowed
/// so a rendering thread can hold one across a frame without contending with the
/// next tick, per spec.md §5's "reads console state via a snapshot" guidance.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub screen: Box<[u8; SCREEN_SIZE]>,
    pub cursor_x: u8,
    pub cursor_y: u8,
    pub cursor_mode: CursorMode,
    pub ticks: u64,
}

pub struct Console {
    screen: [u8; SCREEN_SIZE],
    memory_row: u8,
    cursor_x: u8,
    cursor_y: u8,
    cursor_mode: CursorMode,
    kb_buffer: [u8; KB_BUFFER_LEN],
    kb_start: u8,
    kb_position: u8,
    blit: BlitRegisters,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            screen: [b' '; SCREEN_SIZE],
            memory_row: 0,
            cursor_x: 0,
            cursor_y: 0,
            cursor_mode: CursorMode::Off,
            kb_buffer: [0; KB_BUFFER_LEN],
            kb_start: 0,
            kb_position: 0,
            blit: BlitRegisters::default(),
        }
    }
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ticks` is the machine's tick counter, owned by the CPU's tick driver, not by
    /// this device; the cursor's blink phase in mode 2 is `(ticks >> 2) & 1`.
    pub fn snapshot(&self, ticks: u64) -> Snapshot {
        Snapshot {
            screen: Box::new(self.screen),
            cursor_x: self.cursor_x,
            cursor_y: self.cursor_y,
            cursor_mode: self.cursor_mode,
            ticks,
        }
    }

    /// A plain-text rendering of the screen, one line per row, for CLI/test
    /// introspection — the only "rendering" this crate does on its own.
    pub fn debug_dump(&self) -> String {
        let mut out = String::with_capacity(SCREEN_SIZE + ROWS);
        for row in 0..ROWS {
            let start = row * COLUMNS;
            let line = &self.screen[start..start + COLUMNS];
            out.push_str(&String::from_utf8_lossy(line));
            out.push('\n');
        }
        out
    }

    /// Enqueues a keypress if the ring isn't full. `code` is expected to already
    /// be the normalized byte the shell would send (ASCII 1..=127, `\n` as `0x0D`);
    /// this device does not validate the range, matching the reference.
    pub fn push_key(&mut self, code: u8) {
        let next = (self.kb_position.wrapping_add(1)) & 0x0f;
        if next != self.kb_start {
            self.kb_buffer[self.kb_position as usize] = code;
            self.kb_position = next;
        } else {
            log!(LogCategory::Device, LogLevel::Warn, "console keyboard ring is full, dropping key {code:#04x}");
        }
    }

    fn row_offset(&self, column: u8) -> usize {
        self.memory_row as usize * COLUMNS + (column - ROW_WINDOW_BASE) as usize
    }
}

impl Device for Console {
    fn address(&self) -> u8 {
        DEVICE_ID
    }

    fn read(&mut self, offset: u8) -> u8 {
        match offset {
            0x00 => self.memory_row,
            0x01 => self.cursor_x,
            0x02 => self.cursor_y,
            0x03 => self.cursor_mode.to_byte(),
            0x04 => self.kb_start,
            0x05 => self.kb_position,
            0x06 => self.kb_buffer[self.kb_start as usize],
            0x07 => self.blit.mode,
            0x08 => self.blit.xs,
            0x09 => self.blit.ys,
            0x0a => self.blit.xd,
            0x0b => self.blit.yd,
            0x0c => self.blit.w,
            0x0d => self.blit.h,
            ROW_WINDOW_BASE..=ROW_WINDOW_END => self.screen[self.row_offset(offset)],
            _ => 0,
        }
    }

    fn write(&mut self, offset: u8, value: u8) {
        match offset {
            0x00 => self.memory_row = value.min(ROWS as u8 - 1),
            0x01 => self.cursor_x = value,
            0x02 => self.cursor_y = value,
            0x03 => self.cursor_mode = CursorMode::from_byte(value),
            0x04 => self.kb_start = value & 0x0f,
            0x05 => self.kb_position = value & 0x0f,
            0x06 => self.kb_buffer[self.kb_start as usize] = value,
            0x07 => self.blit.mode = value,
            0x08 => self.blit.xs = value,
            0x09 => self.blit.ys = value,
            0x0a => self.blit.xd = value,
            0x0b => self.blit.yd = value,
            0x0c => self.blit.w = value,
            0x0d => self.blit.h = value,
            ROW_WINDOW_BASE..=ROW_WINDOW_END => {
                let offset = self.row_offset(offset);
                self.screen[offset] = value;
            }
            _ => {}
        }
    }
}
