//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to `<log_dir>/<app_name>.log`,
//! rotating the file when it grows past a size limit, and keeps the most
//! recent lines in a circular buffer for in-app display.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriter;

/// Rotate once the active file exceeds this many bytes
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 3;
/// Lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static RECENT: OnceLock<Arc<Mutex<VecDeque<String>>>> = OnceLock::new();

/// Logger options
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub buffer_lines: usize,
    pub level: LevelFilter,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            level: LevelFilter::INFO,
        }
    }
}

/// Parse a level name ("trace", "debug", ...). Unknown names map to INFO.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// Local timestamps via chrono
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Size-rotated log file plus the shared line buffer
struct RollingFile {
    path: PathBuf,
    file: Option<File>,
    written: u64,
    max_file_bytes: u64,
    max_files: usize,
    recent: Arc<Mutex<VecDeque<String>>>,
    buffer_lines: usize,
    partial: String,
}

impl RollingFile {
    fn open(
        path: PathBuf,
        options: &LoggerOptions,
        recent: Arc<Mutex<VecDeque<String>>>,
    ) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file: Some(file),
            written,
            max_file_bytes: options.max_file_bytes,
            max_files: options.max_files,
            recent,
            buffer_lines: options.buffer_lines,
            partial: String::new(),
        })
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        // Close before renaming
        self.file = None;
        if self.max_files == 0 {
            fs::remove_file(&self.path).or_else(ignore_missing)?;
        } else {
            let oldest = self.rotated_path(self.max_files);
            fs::remove_file(&oldest).or_else(ignore_missing)?;
            for n in (1..self.max_files).rev() {
                let from = self.rotated_path(n);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.rotated_path(1))?;
        }
        self.file = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        let Ok(mut recent) = self.recent.lock() else {
            return;
        };
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            recent.push_back(line.trim_end().to_string());
            while recent.len() > self.buffer_lines {
                recent.pop_front();
            }
        }
    }
}

fn ignore_missing(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(e)
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_file_bytes {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file closed"))?;
        file.write_all(buf)?;
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Cloneable handle handed to tracing-subscriber
#[derive(Clone)]
struct SharedWriter(Arc<Mutex<RollingFile>>);

struct WriterGuard(Arc<Mutex<RollingFile>>);

impl Write for WriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        inner.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = WriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        WriterGuard(self.0.clone())
    }
}

fn log_file_path(log_dir: &Path, app_name: &str) -> PathBuf {
    log_dir.join(format!("{}.log", app_name))
}

/// Initialize the global logger with default options
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, LoggerOptions::default())
}

/// Initialize the global logger.
///
/// Fails if the directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logger_with(log_dir: PathBuf, app_name: &str, options: LoggerOptions) -> Result<(), String> {
    fs::create_dir_all(&log_dir)
        .map_err(|e| format!("Failed to create log dir {}: {}", log_dir.display(), e))?;

    let recent = RECENT
        .get_or_init(|| Arc::new(Mutex::new(VecDeque::new())))
        .clone();
    let file = RollingFile::open(log_file_path(&log_dir, app_name), &options, recent)
        .map_err(|e| format!("Failed to open log file: {}", e))?;

    tracing_subscriber::fmt()
        .with_writer(SharedWriter(Arc::new(Mutex::new(file))))
        .with_timer(LocalTime)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(options.level)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    log::info!("{} logger started in {}", app_name, log_dir.display());
    Ok(())
}

/// Most recent formatted lines, oldest first
pub fn recent_lines() -> Vec<String> {
    RECENT
        .get()
        .and_then(|r| r.lock().ok().map(|lines| lines.iter().cloned().collect()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max_file_bytes: u64, max_files: usize, buffer_lines: usize) -> LoggerOptions {
        LoggerOptions {
            max_file_bytes,
            max_files,
            buffer_lines,
            level: LevelFilter::INFO,
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level("warning"), LevelFilter::WARN);
        assert_eq!(parse_level("nonsense"), LevelFilter::INFO);
    }

    #[test]
    fn test_rotation_keeps_bounded_files() {
        let dir = tempfile::tempdir().unwrap();
        let recent = Arc::new(Mutex::new(VecDeque::new()));
        let path = dir.path().join("app.log");
        let mut file = RollingFile::open(path.clone(), &options(16, 2, 10), recent).unwrap();

        for i in 0..5 {
            file.write_all(format!("line number {}\n", i).as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert!(path.exists());
        assert!(dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.2").exists());
        assert!(!dir.path().join("app.log.3").exists());
        let active = fs::read_to_string(&path).unwrap();
        assert_eq!(active, "line number 4\n");
    }

    #[test]
    fn test_recent_buffer_is_circular() {
        let dir = tempfile::tempdir().unwrap();
        let recent = Arc::new(Mutex::new(VecDeque::new()));
        let mut file =
            RollingFile::open(dir.path().join("app.log"), &options(1 << 20, 1, 2), recent.clone()).unwrap();

        file.write_all(b"first\nsec").unwrap();
        file.write_all(b"ond\nthird\n").unwrap();

        let lines: Vec<String> = recent.lock().unwrap().iter().cloned().collect();
        assert_eq!(lines, vec!["second".to_string(), "third".to_string()]);
    }
}
