//! Journald logger implementation for the `log` interface

use bytes::BufMut;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::os::unix::net::UnixDatagram;

const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";

#[derive(Debug)]
pub struct JournaldLogger {
    sock: UnixDatagram,
    level_filter: LevelFilter,
    identifier: &'static str,
}

/// Initializes `log` logger with [JournaldLogger], tagging every entry with `identifier`
pub fn init(level_filter: LevelFilter, identifier: &'static str) -> anyhow::Result<()> {
    let sock = UnixDatagram::unbound()?;
    sock.connect(JOURNALD_SOCKET)?;

    log::set_boxed_logger(Box::new(JournaldLogger {
        sock,
        level_filter,
        identifier,
    }))?;
    log::set_max_level(level_filter);
    Ok(())
}

impl JournaldLogger {
    /// Builds a journal entry in the native protocol format. The message is sent in the binary
    /// form (length prefixed) so that it may contain newlines.
    fn entry(&self, record: &Record) -> Vec<u8> {
        let msg = format!("{}", record.args()).into_bytes();

        let mut buf = format!(
            "PRIORITY={}\nSYSLOG_IDENTIFIER={}\nCODE_MODULE={}\nMESSAGE\n",
            level_to_priority(record.level()),
            self.identifier,
            record.target()
        )
        .into_bytes();

        buf.reserve(msg.len() + 8 + 1);
        buf.put_u64_le(msg.len() as u64);
        buf.extend(msg);
        buf.extend(b"\n");
        buf
    }
}

/// [Log] Interface implementation
impl Log for JournaldLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // If sending the data to the socket fails, report this to stderr
            if let Err(err) = self.sock.send(&self.entry(record)) {
                eprintln!("Sending log to systemd failed: {err}");
            }
        }
    }

    fn flush(&self) {}
}

/// Convert [log::Level] into corresponding journald log level
fn level_to_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 5,
        Level::Debug => 6,
        Level::Trace => 7,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entry_format() {
        let (sock, _other) = UnixDatagram::pair().unwrap();
        let logger = JournaldLogger {
            sock,
            level_filter: LevelFilter::Info,
            identifier: "mesh-ctl",
        };

        let entry = logger.entry(
            &Record::builder()
                .args(format_args!("two\nlines"))
                .level(Level::Warn)
                .target("shared::transport")
                .build(),
        );

        let mut expected =
            b"PRIORITY=4\nSYSLOG_IDENTIFIER=mesh-ctl\nCODE_MODULE=shared::transport\nMESSAGE\n"
                .to_vec();
        expected.extend(9u64.to_le_bytes());
        expected.extend(b"two\nlines\n");
        assert_eq!(expected, entry);

        assert!(logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }
}
