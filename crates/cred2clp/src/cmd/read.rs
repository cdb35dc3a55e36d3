use crate::cmd::camera::Camera;
use crate::cmd::{resolve_registers, ReadArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_values, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    // Resolve names before touching the port so typos fail fast.
    let registers = resolve_registers(&args.registers)?;
    let mut camera = Camera::open(&args.port)?;
    let values = camera.read_all(&registers)?;
    print_values(&values, format);
    Ok(SUCCESS)
}
