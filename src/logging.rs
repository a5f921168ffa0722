use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Prints every record at or above `level` to stdout as `LEVEL - message`.
pub struct KororiLogger {
    level: LevelFilter,
}

impl KororiLogger {
    pub fn new(level: LevelFilter) -> KororiLogger {
        KororiLogger { level }
    }

    pub fn format(record: &Record) -> String {
        format!("{} - {}", record.level(), record.args())
    }
}

impl log::Log for KororiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Error => eprintln!("{}", KororiLogger::format(record)),
                _ => println!("{}", KororiLogger::format(record)),
            }
        }
    }

    fn flush(&self) {
    }
}

/// Installs the logger. Fails if a logger was already set for this process.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(KororiLogger::new(level)))?;
    log::set_max_level(level);
    Ok(())
}
