//! Logging initialization. Stdout is reserved for results, so logs never go there.
//!
//! - `verbose`: logs go to stderr.
//! - otherwise, with a log file configured (`LOG_FILE`): logs are appended there, ANSI stripped.
//! - otherwise logs are dropped.
//!
//! `RUST_LOG` sets the filter; default `info` (or `memoproxy=debug,info` when verbose).

use std::io::Write;
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::log_format::SpanPathText;

pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if verbose { "memoproxy=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if verbose {
        let layer = tracing_subscriber::fmt::layer()
            .event_format(SpanPathText::new())
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).try_init()?;
    } else if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let writer = std::sync::Mutex::new(StripAnsiWriter::new(file));
        let layer = tracing_subscriber::fmt::layer()
            .event_format(SpanPathText::new())
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).try_init()?;
        tracing::info!(path = %path.display(), "memoproxy logging to file");
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).try_init()?;
    }
    Ok(())
}

/// Drops ANSI CSI sequences (`ESC [ ... final`) so file logs stay plain text.
struct StripAnsiWriter<W> {
    inner: W,
    in_escape: bool,
    saw_bracket: bool,
}

impl<W: Write> StripAnsiWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            in_escape: false,
            saw_bracket: false,
        }
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut plain = Vec::with_capacity(buf.len());
        for &b in buf {
            if !self.in_escape {
                if b == 0x1b {
                    self.in_escape = true;
                    self.saw_bracket = false;
                } else {
                    plain.push(b);
                }
            } else if !self.saw_bracket {
                if b == b'[' {
                    self.saw_bracket = true;
                } else {
                    // lone ESC: keep both bytes
                    self.in_escape = false;
                    plain.extend_from_slice(&[0x1b, b]);
                }
            } else if (0x40..=0x7e).contains(&b) {
                self.in_escape = false;
            }
        }
        self.inner.write_all(&plain)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
