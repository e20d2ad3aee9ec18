use std::sync::atomic::AtomicBool;
use std::time::Duration;

use biometrics_probe::{Generator, Probe, Record};

fn main() -> biometrics_probe::ProbeResult<()> {
    let probe = Probe::append("biometrics.out")?;
    probe.emit(&Record::HeartRate { heart_rate: 72 })?;
    let stop = AtomicBool::new(false);
    probe.run_heartbeat(
        Duration::from_millis(300),
        Generator::new(rand::thread_rng()),
        &stop,
        Some(5),
    )?;
    probe.emit(&Record::Steps { steps: 100 })?;
    println!("{} records written", probe.written()?);
    Ok(())
}
