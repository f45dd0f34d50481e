// Net Connection - Library Root
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Net Connection
//!
//! Query and control network connectivity through a ConnMan-style daemon.
//!
//! A [`ConnectionContext`] hands out [`ConnectionHandle`]s, validates them on
//! every call, multiplexes per-handle change callbacks onto one daemon
//! subscription per event kind, and manages profile handles and the
//! profile iterator.
//!
//! ```no_run
//! use net_connection::{ClientConfig, ConnectionContext, IteratorKind};
//!
//! # fn main() -> net_connection::Result<()> {
//! let ctx = ConnectionContext::from_config(&ClientConfig::load())?;
//! let handle = ctx.create()?;
//!
//! ctx.set_type_changed_cb(handle, |kind| println!("now on {}", kind.display_name()))?;
//!
//! let profiles = ctx.get_profile_iterator(handle, IteratorKind::Registered)?;
//! while ctx.iterator_has_next(&profiles) {
//!     let profile = ctx.iterator_next(&profiles)?;
//!     println!("{}", ctx.profile_name(&profile)?);
//! }
//! ctx.destroy_profile_iterator(profiles)?;
//!
//! ctx.destroy(handle)?;
//! # Ok(())
//! # }
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod daemon;
pub mod models;
pub mod registry;
pub mod storage;

pub use daemon::{ConnmanDaemon, Daemon};
pub use models::*;
pub use registry::{
    AsProfileKey, ChangeEvent, ConnectionContext, ConnectionHandle, OwnedProfile, ProfileIterator,
    ProfileKey, RequestKind, SnapshotProfile,
};
pub use storage::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
