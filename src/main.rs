use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dcdcusb::{codec, Command, DcdcDevice, DcdcError, DCDC_USB};
use log::warn;

fn print_usage() {
    println!("DCDC-USB Tool - read and control the DCDC-USB converter\n");
    println!("USAGE:");
    println!("    sudo dcdcusb [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --status                    Print all values reported by the device");
    println!("    --monitor [SECONDS]         Print input voltage as CSV every SECONDS");
    println!("                                (default 1, runs until interrupted)");
    println!("    --samples <N>               Stop --monitor after N samples\n");
    println!("    --set-voltage <VOLTS>       Set the output voltage");
    println!("                                WARNING: not thoroughly tested, check");
    println!("                                the load can take the new voltage\n");
    println!("    --command <NAME> <VALUE>    Send a raw command with a value byte");
    println!("                                Names: aux-win, power-switch, output,");
    println!("                                write-vout, read-vout, inc-vout, dec-vout,");
    println!("                                load-defaults, script-start, script-stop, sleep\n");
    println!("    --debug                     Log every USB step (or set RUST_LOG)");
    println!("    --help, -h                  Show this help message\n");
    println!("EXAMPLES:");
    println!("    sudo dcdcusb --status");
    println!("    sudo dcdcusb --set-voltage 12 --status");
    println!("    sudo dcdcusb --monitor 0.5 > vin.csv");
    println!("    sudo dcdcusb --command output 1");
    println!("\nSUPPORTED DEVICES:");
    println!("    DCDC-USB:");
    println!("      04d8:d003");
}

const MIN_MONITOR_INTERVAL: Duration = Duration::from_micros(1);
const MAX_MONITOR_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// What the user asked for, validated before the device is touched.
#[derive(Default)]
struct Options {
    debug: bool,
    status: bool,
    monitor: Option<Duration>,
    samples: Option<u64>,
    set_voltage: Option<f64>,
    command: Option<(Command, u8)>,
}

fn value_of<'a>(args: &'a [String], i: usize, arg: &str) -> Result<&'a str, DcdcError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| DcdcError::MissingArgumentValue(arg.to_string()))
}

fn parse_args(args: &[String]) -> Result<Options, DcdcError> {
    let mut opts = Options::default();
    let mut i = 1;

    while i < args.len() {
        let arg = args[i].as_str();

        match arg {
            "--debug" => opts.debug = true,
            "--status" => opts.status = true,
            "--monitor" => {
                let mut interval = Duration::from_secs(1);
                if let Some(next) = args.get(i + 1).filter(|a| !a.starts_with("--")) {
                    interval = next
                        .parse::<f64>()
                        .ok()
                        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                        .filter(|d| *d >= MIN_MONITOR_INTERVAL && *d <= MAX_MONITOR_INTERVAL)
                        .ok_or_else(|| DcdcError::InvalidArgument {
                            arg: "--monitor",
                            value: next.clone(),
                            valid: "a number of seconds from 0.000001 to 86400",
                        })?;
                    i += 1;
                }
                opts.monitor = Some(interval);
            }
            "--samples" => {
                let value = value_of(args, i, arg)?;
                let n = value.parse::<u64>().ok().filter(|&n| n > 0).ok_or_else(|| {
                    DcdcError::InvalidArgument {
                        arg: "--samples",
                        value: value.to_string(),
                        valid: "a positive integer",
                    }
                })?;
                opts.samples = Some(n);
                i += 1;
            }
            "--set-voltage" => {
                let value = value_of(args, i, arg)?;
                let volts = codec::parse_voltage(value)?;
                // Reject the divider's singularity before opening the device.
                codec::encode_voltage(&DCDC_USB, volts)?;
                opts.set_voltage = Some(volts);
                i += 1;
            }
            "--command" => {
                let name = value_of(args, i, arg)?;
                let value = value_of(args, i + 1, arg)?;
                let command = Command::from_str(name).ok_or_else(|| DcdcError::InvalidArgument {
                    arg: "--command",
                    value: name.to_string(),
                    valid: "aux-win, power-switch, output, write-vout, read-vout, inc-vout, \
                            dec-vout, load-defaults, script-start, script-stop, sleep",
                })?;
                let value = value.parse::<u8>().map_err(|_| DcdcError::InvalidArgument {
                    arg: "--command",
                    value: value.to_string(),
                    valid: "0-255",
                })?;
                opts.command = Some((command, value));
                i += 2;
            }
            _ => {
                return Err(DcdcError::InvalidArgument {
                    arg: "option",
                    value: arg.to_string(),
                    valid: "see --help",
                });
            }
        }

        i += 1;
    }

    Ok(opts)
}

fn micros_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Sample the input voltage on interval boundaries of the wall clock.
///
/// A sample that fails to arrive is skipped; a frame of the wrong type ends
/// the run.
fn monitor(device: &DcdcDevice, interval: Duration, samples: Option<u64>) -> Result<(), DcdcError> {
    let interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX).max(1);
    let mut taken = 0;

    println!("microseconds,voltage in");

    while samples.is_none_or(|n| taken < n) {
        let wait = interval_us - micros_since_epoch() % interval_us;
        std::thread::sleep(Duration::from_micros(wait));

        let stamp = micros_since_epoch();
        match device.read_input_voltage() {
            Ok(vin) => println!("{},{:.6}", stamp, vin),
            Err(e @ DcdcError::UnexpectedPacketType { .. }) => return Err(e),
            Err(e) => warn!("skipping sample: {}", e),
        }
        taken += 1;
    }

    Ok(())
}

/// Everything the user asked for, in order, against an opened session.
fn run_actions(device: &DcdcDevice, opts: &Options) -> Result<(), DcdcError> {
    if let Some(volts) = opts.set_voltage {
        println!("Setting voltage to {} volts.", volts);
        let code = device.set_output_voltage(volts)?;
        println!("Potentiometer code {} sent.", code);
    }

    if let Some((command, value)) = opts.command {
        println!("Sending {} with value {}", command, value);
        device.send_command(command, value)?;
    }

    if opts.status {
        let telemetry = device.poll_telemetry()?;
        print!("{}", telemetry);
    }

    if let Some(interval) = opts.monitor {
        eprintln!("Monitoring voltage every {} seconds.", interval.as_secs_f64());
        monitor(device, interval, opts.samples)?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage();
        return Ok(());
    }

    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err("Invalid argument".into());
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if opts.debug { "debug" } else { "warn" }),
    )
    .init();

    let device = match DcdcDevice::open(opts.debug) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err("Unable to open device".into());
        }
    };

    if let Err(e) = device.run(|device| run_actions(device, &opts)) {
        eprintln!("Error: {}", e);
        return Err("Device operation failed".into());
    }

    Ok(())
}
