use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;

use crate::clock::time_label;

/// Number of entries a [`DiagnosticLog`] keeps by default.
pub const DEFAULT_LOG_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Success,
}

/// One line in a diagnostic panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug)]
struct LogRing {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

/// Append-only ring of the most recent diagnostic messages.
///
/// Cloning yields another handle onto the same ring. Entries are purely
/// informational; nothing reads them back to make decisions. Every push is
/// mirrored to `tracing` under the log's `scope`.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    scope: &'static str,
    ring: Rc<RefCell<LogRing>>,
}

impl DiagnosticLog {
    pub fn new(scope: &'static str) -> Self {
        Self::with_capacity(scope, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(scope: &'static str, capacity: usize) -> Self {
        Self {
            scope,
            ring: Rc::new(RefCell::new(LogRing {
                capacity: capacity.max(1),
                entries: VecDeque::with_capacity(capacity.max(1)),
            })),
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn push(&self, severity: Severity, message: impl Into<String>) {
        self.push_at(time_label(), severity, message);
    }

    pub fn push_at(&self, timestamp: impl Into<String>, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!(scope = self.scope, "{message}"),
            Severity::Info | Severity::Success => tracing::info!(scope = self.scope, "{message}"),
        }

        let mut ring = self.ring.borrow_mut();
        if ring.entries.len() == ring.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(LogEntry {
            timestamp: timestamp.into(),
            severity,
            message,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    /// Snapshot, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.ring.borrow().entries.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<LogEntry> {
        self.ring.borrow().entries.back().cloned()
    }

    pub fn messages(&self) -> Vec<String> {
        self.ring
            .borrow()
            .entries
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ring.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.ring.borrow_mut().entries.clear();
    }
}
