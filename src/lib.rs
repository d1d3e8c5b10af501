//! # SW16 Setup Core Library
//!
//! Validates network-attached HLK-SW16 relay boards before they are
//! registered as configured devices:
//! - Timed connection handshake (open, probe, read frame, close)
//! - Closed probe outcome taxonomy and operator-facing error codes
//! - Two-step setup flow (form submission and import) with duplicate detection
//! - File-backed entry store for configured devices
//! - TOML configuration and CLI exit codes
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use sw16_setup::{ConnectionProber, SetupConfig, SetupFlow, Sw16Codec, UserInput, UserStep};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let prober = ConnectionProber::new(Sw16Codec::new());
//!     let registry: HashSet<String> = HashSet::new();
//!     let mut flow = SetupFlow::new(prober, registry, SetupConfig::default());
//!
//!     let input = UserInput::new("10.0.0.5").port(8080);
//!     match flow.start_with_user_input(Some(input)).await? {
//!         UserStep::CreateEntry(entry) => println!("configured {}", entry.title),
//!         UserStep::ShowForm(form) => println!("errors: {:?}", form.errors),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::{AppConfig, ConfigError, LoggingConfig, SetupConfig};
pub use crate::core::classify::{classify, ErrorCode};
pub use crate::core::flow::{
    AbortReason, EntryDescriptor, FlowError, FlowState, FormResult, ImportStep, SchemaDescriptor,
    SetupFlow, SetupRequest, UserInput, UserStep,
};
pub use crate::core::probe::{ConnectionProber, Probe, ProbeOutcome};
pub use crate::core::protocol::{FrameCodec, Sw16Codec};
pub use crate::core::registry::{DeviceRegistry, EntryStore, StoreError, StoredEntry};
pub use crate::core::transport::ConnectionTarget;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
