//! Skeem: a small Scheme-family interpreter.
//!
//! Source text is read one parenthesized form at a time, evaluated against a
//! lexically scoped chain of frames, and all compound data lives in a
//! mark-sweep collected heap owned by the [`Interpreter`].

pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod heap;
pub mod primitives;
pub mod printer;
pub mod reader;
pub mod symbol;
pub mod value;

pub use config::Config;
pub use error::{SkeemError, SkeemResult};
pub use eval::Interpreter;
pub use reader::{ReadStatus, Reader};
pub use value::Value;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=skeem=debug` for collector cycles and error recovery or
/// `RUST_LOG=skeem=trace` for every procedure call.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
