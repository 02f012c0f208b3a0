//! `infotic` - Field evidence capture with a local ledger
//!
//! This library provides the pieces behind the `infotic` field form: the
//! append-only evidence ledger, the key-value stores it persists to, and the
//! capture, session and dashboard flows built on top of them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod evidence;
pub mod geo;
pub mod ledger;
pub mod logging;
pub mod photo;
pub mod session;
pub mod storage;

pub use capture::{CaptureDraft, CaptureWorkflow};
pub use config::Config;
pub use dashboard::DashboardView;
pub use error::{Error, Result};
pub use evidence::{EvidenceKind, EvidenceRecord, Location};
pub use geo::{FixedGeolocator, Geolocator};
pub use ledger::Ledger;
pub use logging::init_logging;
pub use session::{Session, VersionCheck};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
