//! `avr-power` command-line front end.
//!
//! - `devices` lists the table, `show` prints one device's layout
//! - `apply` runs enable/disable/prescaler operations against a simulated
//!   part and prints the resulting registers and store sequence
//! - `profile` does the same from a YAML profile
//! - `header` renders the C macros, `identify` resolves a signature,
//!   `diff` compares two state files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use avr_power_core::devices::{self, Device};
use avr_power_core::profile::Profile;
use avr_power_core::savestate::{self, PowerState};
use avr_power_core::{header, report, ClockDiv, Peripheral, PowerController, SimulatedMcu};

#[derive(Parser, Debug)]
#[command(author, version, about = "AVR power reduction and clock prescaler tool", long_about = None)]
struct Cli {
    /// Log every register operation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List known devices
    Devices {
        /// Only devices whose family name contains this text
        #[arg(long)]
        family: Option<String>,
    },
    /// Show a device's power-reduction table and prescaler
    Show { device: String },
    /// Apply operations to a simulated device and print the result
    Apply(ApplyArgs),
    /// Apply a YAML power profile to a simulated device
    Profile {
        path: PathBuf,
        /// Write the resulting state next to the profile (`<name>.state`)
        #[arg(long)]
        save: bool,
    },
    /// Render the device's macros as a C header
    Header {
        device: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve a signature such as `1E950F`
    Identify { signature: String },
    /// Compare two state files
    Diff { old: PathBuf, new: PathBuf },
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    device: String,

    /// Peripherals to stop (comma separated or repeated)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<Peripheral>,

    /// Peripherals to start (comma separated or repeated)
    #[arg(long, value_delimiter = ',')]
    enable: Vec<Peripheral>,

    /// `power_all_disable()` before the lists are applied
    #[arg(long)]
    disable_all: bool,

    /// Clock division factor
    #[arg(long)]
    clock_div: Option<u16>,

    /// Start with the CKDIV8 fuse programmed
    #[arg(long)]
    ckdiv8: bool,

    /// Restore this state file first
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the resulting state
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the report.
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Devices { family } => list_devices(family.as_deref()),
        Commands::Show { device } => show(&device),
        Commands::Apply(args) => apply(args),
        Commands::Profile { path, save } => run_profile(path, save),
        Commands::Header { device, output } => render(&device, output),
        Commands::Identify { signature } => identify(&signature),
        Commands::Diff { old, new } => diff(&old, &new),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn signature_text(device: &Device) -> String {
    device
        .signature
        .map(|s| format!("{:02X}{:02X}{:02X}", s[0], s[1], s[2]))
        .unwrap_or_else(|| "------".into())
}

fn list_devices(family: Option<&str>) -> Result<()> {
    let filter = family.map(str::to_ascii_lowercase);
    for d in devices::devices() {
        if let Some(f) = &filter {
            if !d.family.name.to_ascii_lowercase().contains(f.as_str()) {
                continue;
            }
        }
        println!("{:<16} {}  {}", d.name, signature_text(d), d.family.name);
    }
    Ok(())
}

fn show(name: &str) -> Result<()> {
    let device = devices::lookup(name)?;
    println!("{} ({})  signature {}", device.name, device.family.name, signature_text(device));
    for reg in device.family.registers {
        println!("  {:<10} 0x{:02X}", reg.name, reg.addr);
    }
    println!();
    for gate in device.family.gates {
        println!(
            "  {:<12} {}.{}  {}",
            gate.peripheral.name(),
            gate.register.name,
            gate.bit,
            gate.peripheral.description()
        );
    }
    match device.family.clock {
        Some(p) => {
            let divs: Vec<String> = ClockDiv::ALL
                .iter()
                .filter(|d| p.supports(**d))
                .map(|d| format!("{:?}", d))
                .collect();
            println!("\n  prescaler {} (0x{:02X}): {}", p.register().name, p.register().addr, divs.join(" "));
        }
        None => println!("\n  no clock prescaler"),
    }
    Ok(())
}

fn print_result(pc: &mut PowerController<SimulatedMcu>) {
    let device = pc.device();
    let writes = pc.bus_mut().take_journal();
    println!("stores:");
    for (addr, value) in &writes {
        println!("  0x{:04X} <- 0x{:02X}", addr, value);
    }
    println!("registers:");
    print!("{}", report::dump_power_regs(device, pc.bus_mut()));
    println!("peripherals:");
    print!("{}", report::dump_status(pc));
    let mcu = pc.bus();
    println!("cycles: {}  rejected protected stores: {}", mcu.cycles(), mcu.rejected_writes());
}

fn apply(args: ApplyArgs) -> Result<()> {
    let device = devices::lookup(&args.device)?;
    let mut mcu = SimulatedMcu::new(device);
    if args.ckdiv8 {
        mcu = mcu.with_ckdiv8();
    }
    if let Some(path) = &args.load {
        let state = savestate::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        state.restore(device, &mut mcu)?;
        mcu.take_journal();
    }

    let mut pc = PowerController::new(device, mcu);
    if args.disable_all {
        pc.disable_all();
    }
    for p in &args.disable {
        pc.disable(*p)?;
    }
    for p in &args.enable {
        pc.enable(*p)?;
    }
    if let Some(div) = args.clock_div {
        pc.set_clock_divisor(div)?;
    }

    if let Some(path) = &args.save {
        let state = PowerState::capture(device, pc.bus_mut());
        savestate::save_to_file(&state, path)
            .with_context(|| format!("saving {}", path.display()))?;
        info!("state saved to {}", path.display());
    }
    print_result(&mut pc);
    Ok(())
}

fn run_profile(path: PathBuf, save: bool) -> Result<()> {
    let profile = Profile::load(&path).with_context(|| format!("reading {}", path.display()))?;
    let device = profile.resolve_device()?;
    let mut pc = profile.apply(SimulatedMcu::new(device))?;
    if save {
        let out = savestate::state_path(&path.to_string_lossy());
        let state = PowerState::capture(device, pc.bus_mut());
        savestate::save_to_file(&state, Path::new(&out))?;
        info!("state saved to {}", out);
    }
    print_result(&mut pc);
    Ok(())
}

fn render(name: &str, output: Option<PathBuf>) -> Result<()> {
    let device = devices::lookup(name)?;
    let text = header::render_header(device);
    match output {
        Some(path) => {
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            info!("header written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn identify(signature: &str) -> Result<()> {
    let Some(sig) = devices::parse_signature(signature) else {
        bail!("`{}` is not a three-byte signature", signature);
    };
    match devices::by_signature(sig) {
        Some(d) => println!("{} ({})", d.name, d.family.name),
        None => bail!("no known device with signature {}", signature),
    }
    Ok(())
}

fn diff(old: &Path, new: &Path) -> Result<()> {
    let a = savestate::load_from_file(old).with_context(|| format!("loading {}", old.display()))?;
    let b = savestate::load_from_file(new).with_context(|| format!("loading {}", new.display()))?;
    print!("{}", report::dump_diff(&a, &b));
    Ok(())
}
