//! Built-in handler implementations and their construction from config.

use super::error::{HandlerError, LoggingError};
use super::event::Event;
use super::format::{Formatter, TextFormatter};
use super::handler::{Handler, Subscription};
use super::level::Level;
use crate::config::{HandlerConfig, HandlerKind, LoggingConfig};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

fn pick_formatter<'a>(event: &'a Event, own: &'a Arc<dyn Formatter>) -> &'a Arc<dyn Formatter> {
    event.formatter().unwrap_or(own)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Writes one formatted line per event to stdout or stderr.
pub struct StreamHandler {
    name: String,
    stream: Stream,
    formatter: Arc<dyn Formatter>,
}

impl StreamHandler {
    pub fn new(stream: Stream, formatter: Arc<dyn Formatter>) -> Self {
        let name = match stream {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        };
        Self {
            name: name.to_string(),
            stream,
            formatter,
        }
    }

    pub fn stderr() -> Self {
        Self::new(Stream::Stderr, Arc::new(TextFormatter::default()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Handler for StreamHandler {
    fn write(&self, event: &Event) -> Result<(), HandlerError> {
        let line = pick_formatter(event, &self.formatter).format(event);
        match self.stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{}", line)?,
            Stream::Stderr => writeln!(io::stderr().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Appends formatted lines to a file.
pub struct FileHandler {
    name: String,
    file: Mutex<File>,
    formatter: Arc<dyn Formatter>,
}

impl FileHandler {
    pub fn open(path: impl AsRef<Path>, formatter: Arc<dyn Formatter>) -> Result<Self, LoggingError> {
        let path = path.as_ref();
        let open_error = |source| LoggingError::OpenFile {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;

        Ok(Self {
            name: format!("file:{}", path.display()),
            file: Mutex::new(file),
            formatter,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Handler for FileHandler {
    fn write(&self, event: &Event) -> Result<(), HandlerError> {
        let line = pick_formatter(event, &self.formatter).format(event);
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Re-emits events through `tracing`, so they share the process subscriber.
///
/// Custom levels are emitted at INFO with a `custom_level` field.
pub struct TracingHandler {
    name: String,
}

impl TracingHandler {
    pub fn new() -> Self {
        Self {
            name: "tracing".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for TracingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for TracingHandler {
    fn write(&self, event: &Event) -> Result<(), HandlerError> {
        let message = match event.formatter() {
            Some(formatter) => formatter.format(event),
            None => event.message().to_string(),
        };
        let site = event.call_site();
        let attrs = event.attrs();

        match event.level() {
            Level::Debug => {
                tracing::debug!(target: "logroute::events", file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
            Level::Info => {
                tracing::info!(target: "logroute::events", file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
            Level::Warn => {
                tracing::warn!(target: "logroute::events", file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
            Level::Error => {
                tracing::error!(target: "logroute::events", file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
            Level::Fatal => {
                tracing::error!(target: "logroute::events", fatal = true, file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
            Level::Custom(name) => {
                tracing::info!(target: "logroute::events", custom_level = %name, file = site.file, line = site.line, attrs = ?attrs, "{}", message)
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builds one subscription per configured handler, in configuration order.
pub fn build_subscriptions(config: &LoggingConfig) -> Result<Vec<Subscription>, LoggingError> {
    config
        .handlers
        .iter()
        .enumerate()
        .map(|(index, handler)| build_subscription(index, handler))
        .collect()
}

fn build_subscription(index: usize, config: &HandlerConfig) -> Result<Subscription, LoggingError> {
    let name = config
        .name
        .clone()
        .unwrap_or_else(|| format!("{}#{}", config.kind.as_str(), index));

    if config.levels.is_empty() {
        return Err(LoggingError::InvalidHandler {
            name,
            reason: "no levels subscribed".to_string(),
        });
    }

    let formatter: Arc<dyn Formatter> = match &config.template {
        Some(template) => Arc::new(TextFormatter::new(template)),
        None => Arc::new(TextFormatter::default()),
    };

    let handler: Arc<dyn Handler> = match config.kind {
        HandlerKind::Stderr => Arc::new(StreamHandler::new(Stream::Stderr, formatter).with_name(name)),
        HandlerKind::Stdout => Arc::new(StreamHandler::new(Stream::Stdout, formatter).with_name(name)),
        HandlerKind::File => {
            let path = config.path.as_ref().ok_or_else(|| LoggingError::InvalidHandler {
                name: name.clone(),
                reason: "file handler requires a path".to_string(),
            })?;
            Arc::new(FileHandler::open(path, formatter)?.with_name(name))
        }
        HandlerKind::Tracing => Arc::new(TracingHandler::new().with_name(name)),
    };

    Ok(Subscription::new(handler, config.levels.iter().cloned()))
}
