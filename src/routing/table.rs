//! The route table.
//!
//! # Responsibilities
//! - Hold pattern → entry mappings and the host flag
//! - Apply registration and deregistration, including the implicit
//!   redirect bookkeeping for subtree patterns
//! - Answer host-aware longest-match queries
//!
//! # Invariant
//! For every explicit subtree pattern `P/` without an explicit entry at
//! `P`, an implicit entry at `P` redirects permanently to `P/` (host
//! stripped). Every mutation below leaves this true.
//!
//! The table does no locking of its own; [`DynamicMux`](super::DynamicMux)
//! wraps it in a `RwLock`.

use std::collections::HashMap;
use std::sync::Arc;

use super::canonical::encode_path;
use super::error::RouteError;
use super::handler::{Redirect, SharedHandler};
use super::matcher::{is_host_qualified, is_subtree, longest_match, pattern_path};

/// A single registered route.
#[derive(Clone)]
pub(crate) enum RouteEntry {
    /// Installed directly by a registration call.
    Explicit { handler: SharedHandler },
    /// Synthesized redirect from a subtree's trimmed form to the subtree.
    ImplicitRedirect {
        /// The subtree pattern that owns this entry.
        owner: String,
        handler: SharedHandler,
    },
}

impl RouteEntry {
    fn implicit_for(owner: &str) -> Self {
        RouteEntry::ImplicitRedirect {
            owner: owner.to_string(),
            handler: Arc::new(Redirect::permanent(encode_path(pattern_path(owner)))),
        }
    }

    pub(crate) fn is_explicit(&self) -> bool {
        matches!(self, RouteEntry::Explicit { .. })
    }

    pub(crate) fn handler(&self) -> &SharedHandler {
        match self {
            RouteEntry::Explicit { handler } => handler,
            RouteEntry::ImplicitRedirect { handler, .. } => handler,
        }
    }
}

/// Result of a successful table lookup.
pub(crate) struct TableMatch {
    pub handler: SharedHandler,
    /// Pattern reported to callers. Implicit entries report their owner.
    pub pattern: String,
    pub explicit: bool,
}

#[derive(Default)]
pub(crate) struct RouteTable {
    entries: HashMap<String, RouteEntry>,
    /// Set once any host-qualified pattern is registered. Never cleared.
    hosts: bool,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn is_explicit(&self, pattern: &str) -> bool {
        self.entries.get(pattern).is_some_and(RouteEntry::is_explicit)
    }

    pub(crate) fn has_hosts(&self) -> bool {
        self.hosts
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn insert(&mut self, pattern: &str, handler: Option<SharedHandler>) -> Result<(), RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::InvalidPattern);
        }
        let handler = handler.ok_or(RouteError::NilHandler)?;
        if self.is_explicit(pattern) {
            return Err(RouteError::DuplicateRegistration(pattern.to_string()));
        }

        self.entries.insert(pattern.to_string(), RouteEntry::Explicit { handler });

        if is_host_qualified(pattern) {
            self.hosts = true;
        }

        if let Some(trimmed) = trimmed_subtree(pattern) {
            // An existing entry at the trimmed key is either explicit or
            // already the implicit redirect for this same pattern.
            if !self.entries.contains_key(trimmed) {
                self.entries.insert(trimmed.to_string(), RouteEntry::implicit_for(pattern));
            }
        }

        Ok(())
    }

    pub(crate) fn remove(&mut self, pattern: &str) -> Result<(), RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::InvalidPattern);
        }
        if !self.is_explicit(pattern) {
            return Err(RouteError::UnknownPattern(pattern.to_string()));
        }

        self.entries.remove(pattern);

        if let Some(trimmed) = trimmed_subtree(pattern) {
            if self.entries.get(trimmed).is_some_and(|e| !e.is_explicit()) {
                self.entries.remove(trimmed);
            }
        }

        // The trimmed form of a live subtree was just freed; the subtree
        // needs its redirect back.
        let subtree = format!("{}/", pattern);
        if self.is_explicit(&subtree) {
            self.entries.insert(pattern.to_string(), RouteEntry::implicit_for(&subtree));
        }

        Ok(())
    }

    /// Remove the explicit entry for `pattern` and install a fresh one
    /// with `handler`, as a single step. Fails without touching the table.
    pub(crate) fn replace(&mut self, pattern: &str, handler: Option<SharedHandler>) -> Result<(), RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::InvalidPattern);
        }
        let handler = handler.ok_or(RouteError::NilHandler)?;
        self.remove(pattern)?;
        self.insert(pattern, Some(handler))
    }

    pub(crate) fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self.entries.keys().cloned().collect();
        patterns.sort();
        patterns
    }

    /// Host-specific patterns take precedence over generic ones.
    pub(crate) fn find(&self, host: &str, path: &str) -> Option<TableMatch> {
        let mut found = None;
        if self.hosts {
            let qualified = format!("{}{}", host, path);
            found = longest_match(&self.entries, &qualified);
        }
        if found.is_none() {
            found = longest_match(&self.entries, path);
        }

        found.map(|(pattern, entry)| TableMatch {
            handler: entry.handler().clone(),
            pattern: match entry {
                RouteEntry::Explicit { .. } => pattern.to_string(),
                RouteEntry::ImplicitRedirect { owner, .. } => owner.clone(),
            },
            explicit: entry.is_explicit(),
        })
    }
}

/// For a subtree pattern `P/`, return `P` (if non-empty).
fn trimmed_subtree(pattern: &str) -> Option<&str> {
    if !is_subtree(pattern) {
        return None;
    }
    let trimmed = &pattern[..pattern.len() - 1];
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
