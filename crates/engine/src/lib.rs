// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! srcdsup dispatch engine: scan cycles, fan-out, cleanup, token refresh

mod cleanup;
mod error;
mod orchestrator;
mod registry;
mod tokens;

#[cfg(test)]
mod test_helpers;

pub use error::DispatchError;
pub use orchestrator::{CycleReport, Orchestrator, Phase, RuleReport};
pub use registry::{HandlerRegistry, RemoteRegistry};
pub use tokens::{RefreshReport, TokenManager};
