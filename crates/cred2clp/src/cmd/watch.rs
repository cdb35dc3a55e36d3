use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cmd::camera::Camera;
use crate::cmd::{parse_duration, resolve_registers, WatchArgs};
use crate::exit::{CliError, CliResult, SUCCESS};
use crate::output::{print_values, OutputFormat};

/// Longest single sleep between checks of the interrupt flag.
const POLL_SLICE: Duration = Duration::from_millis(50);

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let registers = resolve_registers(&args.registers)?;
    let interval = parse_duration(&args.interval)?;
    let mut camera = Camera::open(&args.port)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut polls = 0usize;
    while running.load(Ordering::SeqCst) {
        let values = camera.read_all(&registers)?;
        print_values(&values, format);
        polls = polls.saturating_add(1);

        if let Some(count) = args.count {
            if polls >= count {
                break;
            }
        }
        sleep_while_running(interval, &running);
    }

    Ok(SUCCESS)
}

fn sleep_while_running(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(POLL_SLICE));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
