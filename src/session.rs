//! Session State
//!
//! The tube selection a client believes its connection has: one used tube
//! (where `put` goes) and an ordered set of watched tubes (where `reserve`
//! looks).
//!
//! ## Lifecycle
//! - Starts at the server's defaults: using and watching `default`.
//! - Changes only when a `use` / `watch` / `ignore` command succeeds.
//! - A new connection starts at the server defaults again, so before it
//!   carries any caller traffic the connection runtime replays
//!   [`SessionState::replay_plan`] onto it.

use crate::protocol::{Request, Status, DEFAULT_TUBE};

/// A change to the session, applied when its command succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Use(String),
    Watch(String),
    Ignore(String),
}

impl SessionChange {
    /// Status the command must resolve with for the change to apply
    pub fn success_status(&self) -> Status {
        match self {
            SessionChange::Use(_) => Status::Using,
            SessionChange::Watch(_) | SessionChange::Ignore(_) => Status::Watching,
        }
    }
}

/// Tube selection of one logical connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    used: String,
    watched: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            used: DEFAULT_TUBE.to_string(),
            watched: vec![DEFAULT_TUBE.to_string()],
        }
    }

    /// Tube that `put` targets
    pub fn used(&self) -> &str {
        &self.used
    }

    /// Watched tubes, in the order they were first watched
    pub fn watched(&self) -> &[String] {
        &self.watched
    }

    pub fn is_watching(&self, tube: &str) -> bool {
        self.watched.iter().any(|t| t == tube)
    }

    /// Record a successful `use` / `watch` / `ignore`
    pub fn apply(&mut self, change: &SessionChange) {
        match change {
            SessionChange::Use(tube) => {
                self.used = tube.clone();
            }
            SessionChange::Watch(tube) => {
                if !self.is_watching(tube) {
                    self.watched.push(tube.clone());
                }
            }
            SessionChange::Ignore(tube) => {
                self.watched.retain(|t| t != tube);
            }
        }
    }

    /// Commands that bring a fresh connection to this state, in order
    ///
    /// `ignore default` comes last: the server refuses to drop the only
    /// watched tube.
    pub fn replay_plan(&self) -> Vec<(Request, Status)> {
        let mut plan = Vec::new();

        if self.used != DEFAULT_TUBE {
            plan.push((Request::use_tube(&self.used), Status::Using));
        }

        for tube in self.watched.iter().filter(|t| *t != DEFAULT_TUBE) {
            plan.push((Request::watch(tube), Status::Watching));
        }

        if !self.is_watching(DEFAULT_TUBE) {
            plan.push((Request::ignore(DEFAULT_TUBE), Status::Watching));
        }

        plan
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
