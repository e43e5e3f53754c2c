//! Event routing core with early buffering.
//!
//! Events logged before configuration is loaded are buffered per level.
//! Once a handler registry is installed ([`LoggingCore::initialize`] or
//! [`LoggingCore::flush`]) the buffer is replayed in arrival order and every
//! later event goes straight to the handlers subscribed to its level, on the
//! caller's thread.
//!
//! ## Layout
//!
//! - [`level`]: `Level` tagged value (standard levels plus custom tags)
//! - [`event`]: immutable `Event`, `CallSite`, `Attributes`
//! - [`handler`] / [`handlers`]: the `Handler` contract and built-in sinks
//! - [`registry`] / [`buffer`]: routing table and pre-ready queues
//! - [`core`]: the `LoggingCore` state machine
//! - [`facade`] / [`scoped`]: `Logger` handles and request-scoped logging

pub mod buffer;
pub mod core;
pub mod error;
pub mod event;
pub mod facade;
pub mod format;
pub mod handler;
pub mod handlers;
pub mod level;
pub mod registry;
pub mod scoped;

pub use self::core::LoggingCore;
pub use error::{HandlerError, LoggingError};
pub use event::{Attributes, CallSite, Event};
pub use facade::{global, Logger};
pub use format::{Formatter, TextFormatter};
pub use handler::{Handler, Subscription};
pub use handlers::{build_subscriptions, FileHandler, Stream, StreamHandler, TracingHandler};
pub use level::Level;
pub use registry::HandlerRegistry;
pub use scoped::ScopedLogger;
