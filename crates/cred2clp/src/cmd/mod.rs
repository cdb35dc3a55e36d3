use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use cred2clp_session::{lookup, lookup_name, RegisterDescriptor};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod camera;
pub mod description;
pub mod probe;
pub mod read;
pub mod registers;
pub mod version;
pub mod watch;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the register map.
    Registers(RegistersArgs),
    /// Open a session on a serial port and print the device identity.
    Probe(PortArgs),
    /// Read one or more registers.
    Read(ReadArgs),
    /// Write one register.
    Write(WriteArgs),
    /// Read registers repeatedly until interrupted.
    Watch(WatchArgs),
    /// Print or save the GenApi register description.
    Description(DescriptionArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Registers(args) => registers::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Description(args) => description::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial port the camera is attached to (e.g. /dev/ttyUSB0, COM3).
    pub port: String,
    /// Line speed to switch to after the probe, in bits per second.
    #[arg(long, default_value = "9600")]
    pub baud: u32,
    /// Per-command reply timeout (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct RegistersArgs {
    /// Only list registers whose name contains this text (case-insensitive).
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Registers by feature name or hex address.
    #[arg(required = true)]
    pub registers: Vec<String>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Register by feature name or hex address.
    pub register: String,
    /// Value to write (number, enumeration word, on/off or text).
    pub value: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Registers by feature name or hex address.
    #[arg(required = true)]
    pub registers: Vec<String>,
    /// Delay between polls (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Stop after N polls.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DescriptionArgs {
    /// Write the document to FILE instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Find a register by GenApi feature name or by `0x` hex address.
pub fn resolve_register(text: &str) -> CliResult<&'static RegisterDescriptor> {
    if let Some(reg) = lookup_name(text) {
        return Ok(reg);
    }
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| CliError::new(USAGE, format!("unknown register: {text}")))?;
    let address = u64::from_str_radix(hex, 16)
        .map_err(|_| CliError::new(USAGE, format!("invalid register address: {text}")))?;
    lookup(address).ok_or_else(|| CliError::new(USAGE, format!("no register at {text}")))
}

pub fn resolve_registers(names: &[String]) -> CliResult<Vec<&'static RegisterDescriptor>> {
    names.iter().map(|name| resolve_register(name)).collect()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_resolve_by_name_or_address() {
        assert_eq!(resolve_register("ExposureTime").unwrap().address, 0x1010);
        assert_eq!(resolve_register("exposuretime").unwrap().address, 0x1010);
        assert_eq!(
            resolve_register("0x1000").unwrap().name,
            "AcquisitionFrameRate"
        );
        assert_eq!(resolve_register("0X3180").unwrap().name, "LicenseList");
    }

    #[test]
    fn unknown_registers_are_usage_errors() {
        assert_eq!(resolve_register("Gain").unwrap_err().code, USAGE);
        assert_eq!(resolve_register("0x0004").unwrap_err().code, USAGE);
        assert_eq!(resolve_register("0xZZ").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
