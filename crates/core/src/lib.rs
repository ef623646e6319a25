// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! srcdsup-core: domain types for the demo upload daemon
//!
//! This crate provides:
//! - Validated configuration (rules, remotes, intervals)
//! - File matching with newest-first ordering
//! - Sidecar metadata parsing
//! - Shared token store and refresh signalling

pub mod config;
pub mod delivery;
pub mod matcher;
pub mod metadata;
pub mod remote;
pub mod rule;
pub mod token;

pub use config::{Config, ConfigError};
pub use delivery::{CleanupPolicy, DeliveryOutcome, FileResult};
pub use matcher::{order_for_dispatch, MatchError, MatchedFile, RuleMatcher};
pub use metadata::{sidecar_path, MetadataError, PlayerStats, SidecarMetadata};
pub use remote::{
    BackendKind, Compression, Credentials, Encoding, Endpoint, RemoteDestination,
};
pub use rule::UploadRule;
pub use token::{refresh_channel, RefreshSignal, RefreshTrigger, TokenStore};
