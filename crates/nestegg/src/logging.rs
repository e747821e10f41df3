use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Size-triggered trimming of the append-mode log file
#[derive(Debug, Clone, Copy)]
struct Rotation {
    /// Files longer than this are trimmed on startup
    max_len: u64,
    /// Upper bound on the bytes carried over
    keep: u64,
}

/// Trim past 5 MB down to the most recent 1 MB
const ROTATION: Rotation = Rotation {
    max_len: 5 * 1024 * 1024,
    keep: 1024 * 1024,
};

impl Rotation {
    /// Whole lines from the last `keep` bytes of `file`
    fn recent_lines(&self, file: &mut File, len: u64) -> io::Result<Vec<u8>> {
        file.seek(SeekFrom::Start(len.saturating_sub(self.keep)))?;
        let mut tail = Vec::new();
        file.take(self.keep).read_to_end(&mut tail)?;
        // a partial first line is dropped; no newline at all keeps nothing
        let first = tail.iter().position(|&b| b == b'\n').map_or(tail.len(), |i| i + 1);
        tail.drain(..first);
        Ok(tail)
    }

    fn apply(&self, path: &Path) -> io::Result<()> {
        let len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if len <= self.max_len {
            return Ok(());
        }

        let tail = self.recent_lines(&mut File::open(path)?, len)?;
        let mut file = File::create(path)?;
        writeln!(file, "--- nestegg: log trimmed to its last {} bytes ---", self.keep)?;
        file.write_all(&tail)
    }
}

/// Hands out writers that share one append-mode log file
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

struct SharedFileHandle {
    file: Arc<Mutex<File>>,
}

impl Write for SharedFileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileHandle {
            file: Arc::clone(&self.file),
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let default_filter = format!("nestegg={level},nestegg_core=warn");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialise the global subscriber.
///
/// Without `log_file`, events go to stderr so stdout stays clean for the
/// JSON result. With it, they are appended to that file, which is trimmed to
/// its last 1 MB once it grows past 5 MB. `RUST_LOG` overrides `level`.
pub fn init_logging(log_file: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let filter = env_filter(level);

    match log_file {
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr).with_target(true))
                .init();
        }
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            if let Err(e) = ROTATION.apply(path) {
                eprintln!("Warning: failed to rotate log file: {e}");
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = SharedFileWriter {
                file: Arc::new(Mutex::new(file)),
            };

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(false),
                )
                .init();

            tracing::info!(log_path = %path.display(), "nestegg logging initialized");
        }
    }
    Ok(())
}
