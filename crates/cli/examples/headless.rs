//! Boots a machine from an in-memory program instead of a file, for quick manual
//! smoke-testing without assembling a real floppy image first.

use redpc_machine::Machine;

fn main() {
    // XCE into native mode, widen A to 16 bits, select the console device (id 1),
    // map its RedBus window at 0x8000 and enable it, then write "HI" to the first
    // two cells of row 0 before parking on WAI.
    let program: Vec<u8> = vec![
        0xfb, // XCE
        0xc2, 0x20, // REP #$20
        0xa9, 0x01, 0x00, // LDA #1
        0xef, 0x00, // select device 1
        0xa9, 0x00, 0x80, // LDA #$8000
        0xef, 0x01, // set redbus window
        0xef, 0x02, // enable redbus
        0xe2, 0x20, // SEP #$20
        0xa9, b'H', // LDA #'H'
        0x8d, 0x10, 0x80, // STA $8010
        0xa9, b'I', // LDA #'I'
        0x8d, 0x11, 0x80, // STA $8011
        0xcb, // WAI
    ];

    let mut machine = Machine::new();
    machine.load_boot_image(&program);
    machine.warm_boot();

    for _ in 0..10 {
        if !machine.is_running() {
            break;
        }
        machine.run_tick();
    }

    print!("{}", machine.console_debug_dump());
}
