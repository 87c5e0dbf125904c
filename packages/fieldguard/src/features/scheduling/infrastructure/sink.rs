//! Worker-owned report sinks
//!
//! Each worker writes its reports to its own sink, so no output lock is
//! shared across workers. Reports are separated by a blank line, matching
//! the format downstream tooling splits on.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

pub trait ReportSink: Send {
    fn write_report(&mut self, text: &str) -> io::Result<()>;
}

/// Hands one sink to each worker at startup.
pub trait SinkFactory: Sync {
    fn create(&self, worker: usize) -> io::Result<Box<dyn ReportSink>>;
}

/// `worker-<i>.txt` files under one output directory
pub struct DirSinks {
    dir: PathBuf,
}

impl DirSinks {
    pub fn new(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

struct FileSink {
    writer: BufWriter<File>,
}

impl ReportSink for FileSink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl SinkFactory for DirSinks {
    fn create(&self, worker: usize) -> io::Result<Box<dyn ReportSink>> {
        let path = self.dir.join(format!("worker-{worker}.txt"));
        let writer = BufWriter::new(File::create(path)?);
        Ok(Box::new(FileSink { writer }))
    }
}

/// Interleaved stdout; used when no output directory is configured
pub struct StdoutSinks;

struct StdoutSink;

impl ReportSink for StdoutSink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")
    }
}

impl SinkFactory for StdoutSinks {
    fn create(&self, _worker: usize) -> io::Result<Box<dyn ReportSink>> {
        Ok(Box::new(StdoutSink))
    }
}

/// Collects reports in memory; test use only
#[derive(Default)]
pub struct MemorySinks {
    reports: Arc<Mutex<Vec<String>>>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }
}

struct MemorySink {
    reports: Arc<Mutex<Vec<String>>>,
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        self.reports.lock().push(text.to_string());
        Ok(())
    }
}

impl SinkFactory for MemorySinks {
    fn create(&self, _worker: usize) -> io::Result<Box<dyn ReportSink>> {
        Ok(Box::new(MemorySink {
            reports: Arc::clone(&self.reports),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_sinks_write_per_worker_files() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = DirSinks::new(dir.path()).unwrap();
        let mut a = sinks.create(0).unwrap();
        let mut b = sinks.create(1).unwrap();
        a.write_report("first").unwrap();
        b.write_report("second").unwrap();

        let read = |i: usize| {
            std::fs::read_to_string(dir.path().join(format!("worker-{i}.txt"))).unwrap()
        };
        assert_eq!(read(0), "first\n");
        assert_eq!(read(1), "second\n");
    }

    #[test]
    fn test_memory_sinks_collect_across_workers() {
        let sinks = MemorySinks::new();
        sinks.create(0).unwrap().write_report("a").unwrap();
        sinks.create(1).unwrap().write_report("b").unwrap();
        let mut reports = sinks.reports();
        reports.sort();
        assert_eq!(reports, vec!["a", "b"]);
    }
}
