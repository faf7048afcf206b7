// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire constants and codec configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire constants shared by every procedure
//! - **Level 2 (Per codec)**: [`CodecConfig`], fixed at `initialize()`
//!
//! # Example
//!
//! ```ignore
//! use objgraph::config::CodecConfig;
//!
//! let config = CodecConfig::default()
//!     .preserve_references(true)
//!     .max_depth(512);
//! ```

use crate::graph::{DefaultEligibility, EligibilityPolicy};
use crate::plugins::CapabilityPlugin;
use std::fmt;
use std::sync::Arc;

// =======================================================================
// Wire constants
// =======================================================================

/// Tag (and length/reference marker) meaning "null".
pub const NULL_TAG: u64 = 0;

/// Reference marker announcing a new instance payload.
pub const REF_NEW: u64 = 1;

/// Reference markers `>= REF_BACK_BASE` are back-references to
/// table index `marker - REF_BACK_BASE`.
pub const REF_BACK_BASE: u64 = 2;

/// Largest assignable type tag (tags are 16-bit).
pub const MAX_TYPE_TAG: usize = u16::MAX as usize;

/// Date/time ticks per second (100 ns resolution).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Nanoseconds per tick.
pub const NANOS_PER_TICK: i64 = 100;

/// Default nesting limit for aggregates and references within one call.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bound on elements reserved up front from a declared length.
///
/// Declared lengths come from the stream; larger collections grow as
/// elements are actually decoded. Sequences whose first `PREALLOC_LIMIT`
/// elements consumed no bytes may not declare more than that.
pub const PREALLOC_LIMIT: usize = 4096;

// =======================================================================
// Environment overrides
// =======================================================================

pub const ENV_PRESERVE_REFS: &str = "OBJGRAPH_PRESERVE_REFS";
pub const ENV_RUN_HOOKS: &str = "OBJGRAPH_RUN_HOOKS";
pub const ENV_MAX_DEPTH: &str = "OBJGRAPH_MAX_DEPTH";

/// Codec configuration, consumed by `ObjectCodec::initialize`.
#[derive(Clone)]
pub struct CodecConfig {
    preserve_references: bool,
    run_hooks: bool,
    max_depth: usize,
    plugins: Vec<Arc<dyn CapabilityPlugin>>,
    eligibility: Arc<dyn EligibilityPolicy>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            preserve_references: false,
            run_hooks: false,
            max_depth: DEFAULT_MAX_DEPTH,
            plugins: Vec::new(),
            eligibility: Arc::new(DefaultEligibility),
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration overlaid with `OBJGRAPH_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = env_flag(ENV_PRESERVE_REFS) {
            config.preserve_references = value;
        }
        if let Some(value) = env_flag(ENV_RUN_HOOKS) {
            config.run_hooks = value;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => log::warn!("[config] ignoring {}={:?}", ENV_MAX_DEPTH, raw),
            }
        }
        config
    }

    /// Track shared instances so identity and cycles survive a round-trip.
    #[must_use]
    pub fn preserve_references(mut self, enabled: bool) -> Self {
        self.preserve_references = enabled;
        self
    }

    /// Invoke `on_deserialized` hooks after aggregates are decoded.
    #[must_use]
    pub fn run_hooks(mut self, enabled: bool) -> Self {
        self.run_hooks = enabled;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Register a user plugin. User plugins are consulted before the
    /// built-in ones, in registration order.
    #[must_use]
    pub fn plugin<P: CapabilityPlugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    #[must_use]
    pub fn plugin_arc(mut self, plugin: Arc<dyn CapabilityPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub fn eligibility<E: EligibilityPolicy + 'static>(mut self, policy: E) -> Self {
        self.eligibility = Arc::new(policy);
        self
    }

    pub fn preserves_references(&self) -> bool {
        self.preserve_references
    }

    pub fn runs_hooks(&self) -> bool {
        self.run_hooks
    }

    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    pub fn plugins(&self) -> &[Arc<dyn CapabilityPlugin>] {
        &self.plugins
    }

    pub fn eligibility_policy(&self) -> &dyn EligibilityPolicy {
        self.eligibility.as_ref()
    }
}

impl fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("CodecConfig")
            .field("preserve_references", &self.preserve_references)
            .field("run_hooks", &self.run_hooks)
            .field("max_depth", &self.max_depth)
            .field("plugins", &names)
            .finish_non_exhaustive()
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match parse_flag(&raw) {
        Some(value) => Some(value),
        None => {
            log::warn!("[config] ignoring {}={:?}", key, raw);
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
