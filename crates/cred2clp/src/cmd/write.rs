use cred2clp_session::RegisterValue;
use serde::Serialize;

use crate::cmd::camera::Camera;
use crate::cmd::{resolve_register, WriteArgs};
use crate::exit::{engine_error, CliResult, SUCCESS};
use crate::output::{format_address, print_json, OutputFormat};

#[derive(Serialize)]
struct WriteOutput {
    register: &'static str,
    address: String,
    value: RegisterValue,
    written: bool,
}

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let reg = resolve_register(&args.register)?;
    let value = RegisterValue::parse(reg, &args.value)
        .map_err(|err| engine_error("invalid value", err))?;

    let mut camera = Camera::open(&args.port)?;
    camera.write(reg, &value)?;

    let out = WriteOutput {
        register: reg.name,
        address: format_address(reg.address),
        value,
        written: true,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} ({}) <- {}", out.register, out.address, out.value);
        }
        OutputFormat::Raw => {}
    }
    Ok(SUCCESS)
}
