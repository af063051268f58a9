//! Rendering of panic payloads caught from connection tasks.

use std::{any::Any, fmt};

/// Panic payload that renders as the panic message when displayed.
///
/// `panic!` payloads are either `&'static str` or `String`; anything else
/// (from `std::panic::panic_any`) is shown through its `Debug` form.
///
/// ```
/// use framerelay::panic::format_panic;
///
/// assert_eq!(format_panic(Box::new("sink failed")).to_string(), "sink failed");
/// assert!(format_panic(Box::new(7_u8)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl PanicMessage {
    /// The panic message, when the payload is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }
}

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(msg) => f.write_str(msg),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// Wrap a caught panic payload for logging.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }
