use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes every record to the log file and mirrors records at or above
/// `console_level` to stderr.
struct FileLogger {
    file: Mutex<std::fs::File>,
    console_level: Level,
}

impl FileLogger {
    fn new(file_path: PathBuf, console_level: Level) -> io::Result<Self> {
        // Create parent directories if they don't exist
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(file_path)?;

        Ok(FileLogger {
            file: Mutex::new(file),
            console_level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "[{}] [{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
            let _ = file.flush();
        }

        if record.level() <= self.console_level {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Get the platform-specific log file path
fn get_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_local_dir()
        .ok_or("Could not determine local data directory")?;

    let audit_dir = data_dir.join("UnityDocAudit");
    let log_file_path = audit_dir.join("unity_doc_audit.log");

    Ok(log_file_path)
}

/// Initialize the logger to write to a single file in local app data, overwriting previous logs.
///
/// `verbose` also mirrors debug records to the console.
pub fn init_logger(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_file_path = get_log_file_path()?;
    let console_level = if verbose { Level::Debug } else { Level::Info };
    let logger = FileLogger::new(log_file_path, console_level)?;

    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(LevelFilter::Debug))?;

    Ok(())
}
