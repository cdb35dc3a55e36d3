use cred2clp_description::xml_id_for;
use serde::Serialize;

use crate::cmd::camera::Camera;
use crate::cmd::PortArgs;
use crate::exit::{engine_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ProbeOutput {
    port: String,
    device_id: String,
    xml_id: String,
    baud_rate: u32,
    supported_baud_rates: Vec<u32>,
}

pub fn run(args: PortArgs, format: OutputFormat) -> CliResult<i32> {
    let mut camera = Camera::open(&args)?;

    let baud_rate = camera
        .engine()
        .baud_rate(camera.handle())
        .map_err(|err| engine_error("baud rate query failed", err))?;
    let supported = camera.supported_baud_rates()?;

    let out = ProbeOutput {
        port: args.port,
        device_id: camera.device_id().to_string(),
        xml_id: xml_id_for(camera.device_id()),
        baud_rate: baud_rate.bits_per_second(),
        supported_baud_rates: supported.iter().map(|rate| rate.bits_per_second()).collect(),
    };

    print_probe(&out, format);
    Ok(SUCCESS)
}

fn print_probe(out: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Device:");
            println!("  Port:       {}", out.port);
            println!("  Device ID:  {}", out.device_id);
            println!("  XML ID:     {}", out.xml_id);
            println!("  Baud rate:  {}", out.baud_rate);
            let rates = out
                .supported_baud_rates
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("  Supported:  {rates}");
        }
        OutputFormat::Raw => println!("{}", out.device_id),
    }
}
