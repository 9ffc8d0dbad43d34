use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use domain::guard::entity::TrafficEvent;
use ports::secondary::event_sink::GuardEventSink;
use tracing::{info, warn};

/// Event sink appending `[YYYY-MM-DD HH:MM:SS] <reason>: A.B.C.D` lines to
/// the firewall log file, mirrored to structured logging.
pub struct FileEventSink {
    file: Mutex<Option<File>>,
}

impl FileEventSink {
    /// Open `path` for appending. A file that cannot be opened downgrades
    /// the sink to tracing-only.
    pub fn open(path: &Path) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);
        if let Err(ref err) = file {
            warn!(path = %path.display(), %err, "could not open event log file");
        }
        Self {
            file: Mutex::new(file.ok()),
        }
    }

    /// Sink without a backing file.
    pub fn tracing_only() -> Self {
        Self {
            file: Mutex::new(None),
        }
    }
}

impl GuardEventSink for FileEventSink {
    fn record(&self, event: TrafficEvent, addr: u32) {
        let ip = Ipv4Addr::from(addr);
        info!(event = event.label(), addr = %ip, "firewall event");

        let mut guard = self.file.lock().unwrap();
        if let Some(file) = guard.as_mut() {
            let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            // A full disk should not take the firewall down with it.
            let _ = writeln!(file, "[{stamp}] {}: {ip}", event.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("udpguard-{}-{name}.log", std::process::id()))
    }

    #[test]
    fn writes_formatted_lines() {
        let path = temp_log("format");
        let _ = std::fs::remove_file(&path);

        let sink = FileEventSink::open(&path);
        sink.record(TrafficEvent::Flood, 0x0102_0304);
        sink.record(TrafficEvent::Unban, 0x0102_0304);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] Flood: 1.2.3.4"), "got: {}", lines[0]);
        assert!(lines[1].ends_with("] Unban: 1.2.3.4"), "got: {}", lines[1]);
        // `[YYYY-MM-DD HH:MM:SS] ` prefix is 22 characters.
        assert!(lines[0].starts_with('['));
        assert_eq!(lines[0].find(']'), Some(20));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn appends_across_instances() {
        let path = temp_log("append");
        let _ = std::fs::remove_file(&path);

        FileEventSink::open(&path).record(TrafficEvent::FirstPacket, 0x0102_0304);
        FileEventSink::open(&path).record(TrafficEvent::Reappearance, 0x0102_0304);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn tracing_only_sink_does_not_panic() {
        let sink = FileEventSink::tracing_only();
        sink.record(TrafficEvent::Query, 0x7F00_0001);
    }
}
