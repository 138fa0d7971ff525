//! A minimal binary that boots an [`redpc_machine::Machine`] from a floppy image and
//! runs it for a bounded number of ticks, printing the console's plain-text dump at
//! the end. Stands in for the out-of-scope windowing shell just far enough to prove
//! the core runs end-to-end against a real file; it does not rasterize glyphs, take
//! real keyboard input, or pace itself to wall-clock tick rate.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use redpc_core::error::RedpcError;
use redpc_core::logging::{LogConfig, LogLevel};
use redpc_machine::Machine;

#[derive(Parser)]
#[command(about = "Runs an EForthPC floppy image headlessly and dumps the console")]
struct Args {
    /// Floppy image to mount as drive 0.
    disk_image: Option<PathBuf>,

    /// Boot ROM image to seed at the boot offset before warm-booting.
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Scheduler ticks to run before dumping the console and exiting.
    #[arg(long, default_value_t = 200)]
    ticks: u32,

    /// Global trace verbosity: off, error, warn, info, debug, trace.
    #[arg(long, default_value = "off")]
    log_level: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let Some(disk_image) = args.disk_image else {
        eprintln!("error: {}", RedpcError::MissingDiskImage);
        eprintln!("usage: redpc-cli <disk-image> [--boot-rom <path>] [--ticks <n>]");
        return ExitCode::from(1);
    };

    if let Some(level) = LogLevel::from_str(&args.log_level) {
        LogConfig::global().set_global_level(level);
    }

    match run(&disk_image, args.boot_rom.as_deref(), args.ticks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(disk_image: &std::path::Path, boot_rom: Option<&std::path::Path>, ticks: u32) -> Result<()> {
    let image = std::fs::read(disk_image).map_err(|source| RedpcError::UnreadableFloppyImage {
        path: disk_image.display().to_string(),
        source,
    })?;

    let mut machine = Machine::new();

    if let Some(boot_rom) = boot_rom {
        let rom = std::fs::read(boot_rom).map_err(|source| RedpcError::UnreadableFloppyImage {
            path: boot_rom.display().to_string(),
            source,
        })?;
        machine.load_boot_image(&rom);
    }

    let name = disk_image.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    machine.insert_floppy(name, image)?;

    machine.warm_boot();
    for _ in 0..ticks {
        if !machine.is_running() {
            break;
        }
        machine.run_tick();
    }

    print!("{}", machine.console_debug_dump());
    Ok(())
}
