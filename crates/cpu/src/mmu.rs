//! MMU state programmed through the `0xEF` sub-opcode table.

/// The RedBus routing configuration the CPU consults on every memory access.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mmu {
    /// The RedBus device id currently selected (sub-opcode `0x00`).
    pub redbus_device_id: u8,
    /// Base address of the main RedBus window (sub-opcode `0x01`).
    pub redbus_window: u16,
    /// Whether the main RedBus window is active (sub-opcode `0x02`/`0x82`).
    pub redbus_enabled: bool,
    /// Base address of the external (peer) window (sub-opcode `0x03`).
    pub external_window: u16,
    /// Whether the external window is active (sub-opcode `0x04`/`0x84`).
    pub external_window_enabled: bool,
}
