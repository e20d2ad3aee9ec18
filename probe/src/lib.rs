//! # Biometrics probe
//!
//! The producing half of the biometrics live feed. A `Probe` appends one
//! JSON-encoded [`Record`] per line to a shared file; the `biometrics consume`
//! command tails that file and charts it.
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! fn main() -> biometrics_probe::ProbeResult<()> {
//!     let probe = biometrics_probe::Probe::append("data/biometrics_live.json")?;
//!
//!     // one record of our own
//!     probe.emit(&biometrics_probe::Record::HeartRate { heart_rate: 72 })?;
//!
//!     // then ten random ones, one per second
//!     let generator = biometrics_probe::Generator::new(rand::thread_rng());
//!     let stop = AtomicBool::new(false);
//!     probe.run_heartbeat(Duration::from_secs(1), generator, &stop, Some(10))?;
//!     Ok(())
//! }
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{io, sync, thread, time};

use rand::Rng;
use thiserror::Error;

mod generate;
mod record;

pub use generate::Generator;
pub use record::{Record, RecordKind};

/// Longest uninterrupted sleep of the heartbeat loop, so a stop request is
/// noticed quickly even with long intervals.
const SLEEP_SLICE: time::Duration = time::Duration::from_millis(100);

/// Probe error enumeration.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Unknown record type {0:?}")]
    UnknownKind(String),
    #[error("At least one record type is required")]
    NoKinds,
    #[error("Heartbeat interval must be positive")]
    ZeroInterval,
    #[error("Heartbeat schedule overflows at record {0}")]
    IntervalTooLong(u64),
    #[error("Io error opening {path}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Io error writing records")]
    Io(#[from] io::Error),
    #[error("Could not encode record")]
    Encode(#[from] serde_json::Error),
    #[error("Poisoned probe")]
    PoisonedProbe,
}

/// Probe generic Result helper.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Appends records to a shared sink, one JSON object per line.
///
/// Cloning is cheap and every clone writes to the same sink, so a heartbeat
/// thread and the caller can both emit records.
#[derive(Clone)]
pub struct Probe(sync::Arc<sync::Mutex<ProbeData>>);

struct ProbeData {
    written: u64,
    writer: io::BufWriter<Box<dyn io::Write + Send>>,
}

impl ProbeData {
    fn write_line(&mut self, record: &Record) -> ProbeResult<u64> {
        let line = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(self.written)
    }
}

impl Probe {
    /// Creates a probe logging records to a Write implementation (usually a
    /// file opened for append).
    pub fn new<W: Write + Send + 'static>(write: W) -> Probe {
        let data = ProbeData {
            written: 0,
            writer: io::BufWriter::new(Box::new(write) as _),
        };
        Probe(sync::Arc::new(sync::Mutex::new(data)))
    }

    /// Opens `path` for append, creating the file and its parent directory
    /// when missing. Existing content is left untouched.
    pub fn append<P: AsRef<Path>>(path: P) -> ProbeResult<Probe> {
        let path = path.as_ref();
        let open_err = |source| ProbeError::Open {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        Ok(Probe::new(file))
    }

    /// Append one record and flush. Returns how many records this probe has
    /// written so far.
    pub fn emit(&self, record: &Record) -> ProbeResult<u64> {
        self.0
            .lock()
            .map_err(|_| ProbeError::PoisonedProbe)?
            .write_line(record)
    }

    /// Number of records written so far.
    pub fn written(&self) -> ProbeResult<u64> {
        Ok(self.0.lock().map_err(|_| ProbeError::PoisonedProbe)?.written)
    }

    /// Emit a generated record at every `interval` until `stop` is raised or
    /// `limit` records have been emitted by this loop.
    ///
    /// Record n is due at `origin + n * interval`, so slow writes do not make
    /// the schedule drift. The first record is emitted immediately.
    pub fn run_heartbeat<R: Rng>(
        &self,
        interval: time::Duration,
        mut generator: Generator<R>,
        stop: &AtomicBool,
        limit: Option<u64>,
    ) -> ProbeResult<u64> {
        if interval.is_zero() {
            return Err(ProbeError::ZeroInterval);
        }
        let origin = time::Instant::now();
        let mut emitted = 0u64;
        for step in 0u64.. {
            if limit.map_or(false, |l| emitted >= l) {
                break;
            }
            let wanted = u32::try_from(step)
                .ok()
                .and_then(|s| interval.checked_mul(s))
                .and_then(|offset| origin.checked_add(offset))
                .ok_or(ProbeError::IntervalTooLong(step))?;
            if !sleep_until(wanted, stop) {
                break;
            }
            let record = generator.next_record();
            tracing::info!(kind = %record.kind(), ?record, "emitting record");
            self.emit(&record)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Spawn a thread running [`Probe::run_heartbeat`].
    pub fn spawn_heartbeat<R: Rng + Send + 'static>(
        &self,
        interval: time::Duration,
        generator: Generator<R>,
        stop: Arc<AtomicBool>,
        limit: Option<u64>,
    ) -> ProbeResult<thread::JoinHandle<ProbeResult<u64>>> {
        if interval.is_zero() {
            return Err(ProbeError::ZeroInterval);
        }
        let probe = self.clone();
        Ok(thread::spawn(move || {
            probe.run_heartbeat(interval, generator, &stop, limit)
        }))
    }
}

/// Sleep until `wanted`, in slices. Returns false if `stop` was raised.
fn sleep_until(wanted: time::Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = time::Instant::now();
        if wanted <= now {
            return true;
        }
        thread::sleep((wanted - now).min(SLEEP_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Read;

    #[test]
    fn emit_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("live.json");
        let probe = Probe::append(&path).unwrap();
        assert_eq!(probe.emit(&Record::HeartRate { heart_rate: 72 }).unwrap(), 1);
        assert_eq!(probe.emit(&Record::Steps { steps: 10 }).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(content.ends_with('\n'));
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "heart_rate");
        assert_eq!(first["heart_rate"], 72);
    }

    #[test]
    fn append_keeps_existing_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"type\":\"steps\",\"steps\":1}}").unwrap();
        let probe = Probe::append(file.path()).unwrap();
        probe.emit(&Record::Steps { steps: 2 }).unwrap();

        let mut content = String::new();
        std::fs::File::open(file.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn heartbeat_honors_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");
        let probe = Probe::append(&path).unwrap();
        let stop = AtomicBool::new(false);
        let generator = Generator::new(StdRng::seed_from_u64(3));
        let n = probe
            .run_heartbeat(time::Duration::from_millis(5), generator, &stop, Some(4))
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(probe.written().unwrap(), 4);
        let content = std::fs::read_to_string(&path).unwrap();
        for line in content.lines() {
            let _: Record = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn heartbeat_stops_on_flag() {
        let probe = Probe::new(io::sink());
        let stop = Arc::new(AtomicBool::new(false));
        let generator = Generator::new(StdRng::seed_from_u64(3));
        let handle = probe
            .spawn_heartbeat(time::Duration::from_secs(3600), generator, stop.clone(), None)
            .unwrap();
        // first record is immediate, the second is an hour away
        while probe.written().unwrap() == 0 {
            thread::sleep(time::Duration::from_millis(5));
        }
        stop.store(true, Ordering::Relaxed);
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn huge_interval_is_an_error() {
        let probe = Probe::new(io::sink());
        let stop = AtomicBool::new(false);
        let generator = Generator::new(StdRng::seed_from_u64(3));
        let got = probe.run_heartbeat(time::Duration::from_secs(u64::MAX), generator, &stop, Some(2));
        assert!(matches!(got, Err(ProbeError::IntervalTooLong(1))));
        assert_eq!(probe.written().unwrap(), 1);
    }

    #[test]
    fn zero_interval_rejected() {
        let probe = Probe::new(io::sink());
        let stop = AtomicBool::new(false);
        let generator = Generator::new(StdRng::seed_from_u64(3));
        assert!(matches!(
            probe.run_heartbeat(time::Duration::ZERO, generator, &stop, None),
            Err(ProbeError::ZeroInterval)
        ));
    }
}
