//! RedBus: the single-master, 8-bit-addressed device bus.
//!
//! A [`Bus`] is a flat registry of [`Device`] trait objects keyed by id. The CPU's MMU
//! looks devices up by id when it routes a windowed memory access through the bus; the
//! bus itself has no notion of "current window" or timing, it only does the lookup.

/// A bus-attached peripheral addressed over a 256-byte window.
pub trait Device {
    /// This device's 8-bit id on the bus.
    fn address(&self) -> u8;

    /// Read a byte at `offset` within this device's window.
    fn read(&mut self, offset: u8) -> u8;

    /// Write a byte at `offset` within this device's window.
    fn write(&mut self, offset: u8, value: u8);
}

/// Registry of addressable devices keyed by 8-bit id.
///
/// The bus owns its devices outright. Lookup is linear, which is fine for the handful
/// of peripherals this bus ever hosts.
#[derive(Default)]
pub struct Bus {
    devices: Vec<Box<dyn Device>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Register a device. Panics if a device with the same id is already registered;
    /// duplicate ids are a programming error, not a runtime condition to recover from.
    pub fn register(&mut self, device: Box<dyn Device>) {
        let id = device.address();
        assert!(
            self.find(id).is_none(),
            "RedBus device id {id} is already registered"
        );
        self.devices.push(device);
    }

    pub fn find(&self, id: u8) -> Option<&dyn Device> {
        self.devices
            .iter()
            .find(|d| d.address() == id)
            .map(|d| d.as_ref())
    }

    pub fn find_mut(&mut self, id: u8) -> Option<&mut (dyn Device + 'static)> {
        self.devices
            .iter_mut()
            .find(|d| d.address() == id)
            .map(|d| d.as_mut())
    }
}
