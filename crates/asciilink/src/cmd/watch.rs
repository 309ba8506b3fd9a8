use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cmd::{open_instrument, parse_duration, read_target, WatchArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_reading, OutputFormat};

const POLL_SLICE: Duration = Duration::from_millis(50);

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let instrument = open_instrument(&args.serial, &args.catalog)?;
    let named = args.catalog.catalog.is_some();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let value = read_target(&instrument, &args.target, named)?;
        print_reading(&args.target, &value, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
        sleep_while_running(interval, &running);
    }

    debug!(readings = printed, "watch interrupted");
    Ok(SUCCESS)
}

/// Sleep for `interval`, waking early once the flag clears.
fn sleep_while_running(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(POLL_SLICE));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_returns_immediately_when_stopped() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        sleep_while_running(Duration::from_secs(5), &running);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_waits_for_interval() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        sleep_while_running(Duration::from_millis(120), &running);
        assert!(start.elapsed() >= Duration::from_millis(120));
    }
}
