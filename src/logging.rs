use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;

/// 日誌檔存放的目錄
const LOG_DIR: &str = "log";
/// 累積到這個長度就寫入檔案
const FLUSH_THRESHOLD: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 非同步的檔案日誌
///
/// 呼叫端只負責把訊息丟進 channel，實際的寫檔由背景線程處理。
/// 檔名為 `log/<YYYY-MM-DD>_<name>.log`，跨日時自動換檔。
pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        let log_name = log_name.to_string();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || write_loop(&log_name, rx));

        Logger { writer: tx }
    }

    pub fn info(&self, log: impl Into<String>) {
        self.send(log::Level::Info, log.into());
    }

    pub fn warn(&self, log: impl Into<String>) {
        self.send(log::Level::Warn, log.into());
    }

    pub fn error(&self, log: impl Into<String>) {
        self.send(log::Level::Error, log.into());
    }

    pub fn debug(&self, log: impl Into<String>) {
        self.send(log::Level::Debug, log.into());
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

/// 目前開啟中的日誌檔，`day` 用來判斷是否需要換檔
struct Sink {
    day: String,
    writer: BufWriter<File>,
}

fn write_loop(log_name: &str, rx: Receiver<LogMessage>) {
    let mut sink: Option<Sink> = None;
    let mut line = String::with_capacity(FLUSH_THRESHOLD);

    for received in &rx {
        let day = received.created_at.format("%Y-%m-%d").to_string();
        if sink.as_ref().map_or(true, |s| s.day != day) {
            flush(&mut line, &mut sink);
            sink = open_log_file(log_name, &day).map(|writer| Sink { day, writer });
        }

        if writeln!(
            &mut line,
            "{} {} {}",
            received.created_at.format("%F %X%.6f"),
            received.level,
            received.msg
        )
        .is_err()
        {
            continue;
        }

        if rx.is_empty() || line.len() >= FLUSH_THRESHOLD {
            flush(&mut line, &mut sink);
        }
    }

    flush(&mut line, &mut sink);
}

fn flush(line: &mut String, sink: &mut Option<Sink>) {
    if line.is_empty() {
        return;
    }

    match sink {
        Some(s) => {
            if let Err(why) = s
                .writer
                .write_all(line.as_bytes())
                .and_then(|_| s.writer.flush())
            {
                error_console(format!("Failed to write to log file. because:{:#?}", why));
                print!("{}", line);
            }
        }
        // 開檔失敗時至少還能在 console 看到
        None => print!("{}", line),
    }

    line.clear();
}

fn open_log_file(log_name: &str, day: &str) -> Option<BufWriter<File>> {
    let path = log_path(log_name, day)?;
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(BufWriter::new(file)),
        Err(why) => {
            error_console(format!("Failed to open log file {:?} because {:?}", path, why));
            None
        }
    }
}

fn log_path(name: &str, day: &str) -> Option<PathBuf> {
    let path = Path::new(LOG_DIR);

    if !path.exists() {
        fs::create_dir_all(path).ok()?;
    }

    let mut log_path = PathBuf::from(path);
    log_path.push(format!("{}_{}.log", day, name));

    Some(log_path)
}

pub fn info_file_async(log: impl Into<String>) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: impl Into<String>) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: impl Into<String>) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: impl Into<String>) {
    LOGGER.debug(log);
}

pub fn info_console(log: impl Into<String>) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log.into()
    );
}

pub fn error_console(log: impl Into<String>) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log.into()
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_named_logger_writes_daily_file() {
        let logger = Logger::new("logging_test");
        let marker = format!("marker-{}", Local::now().timestamp_nanos_opt().unwrap_or_default());
        logger.warn(marker.clone());

        let path = log_path("logging_test", &Local::now().format("%Y-%m-%d").to_string())
            .expect("log dir");
        let mut content = String::new();
        for _ in 0..50 {
            thread::sleep(Duration::from_millis(20));
            content = fs::read_to_string(&path).unwrap_or_default();
            if content.contains(&marker) {
                break;
            }
        }

        assert!(content.contains(&marker));
        assert!(content.contains("WARN"));
    }

    #[test]
    fn test_flush_without_sink_clears_buffer() {
        let mut line = String::from("orphan line\n");
        let mut sink = None;
        flush(&mut line, &mut sink);
        assert!(line.is_empty());
    }
}
