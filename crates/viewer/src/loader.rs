use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Shared};
use runtime::DiagnosticLog;

use crate::error::DependencyLoadError;

/// A script the engine needs on the page before it can be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub url: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Injects one script into the page and resolves once it has executed.
pub trait ScriptLoader {
    fn inject(&self, dependency: &Dependency) -> LocalBoxFuture<'static, Result<(), DependencyLoadError>>;
}

type SharedLoad = Shared<LocalBoxFuture<'static, Result<(), DependencyLoadError>>>;

enum Slot {
    Loading { attempt: u64, load: SharedLoad },
    Ready,
}

/// Load-once gate in front of a [`ScriptLoader`].
///
/// Each dependency is injected at most once per loader lifetime. Callers that
/// arrive while an injection is in flight join the same shared future rather
/// than injecting again. A failed injection releases its slot so the next
/// caller retries.
pub struct DependencyLoader<L> {
    loader: L,
    log: DiagnosticLog,
    slots: RefCell<HashMap<String, Slot>>,
    attempts: Cell<u64>,
}

impl<L: ScriptLoader> DependencyLoader<L> {
    pub fn new(loader: L, log: DiagnosticLog) -> Self {
        Self {
            loader,
            log,
            slots: RefCell::new(HashMap::new()),
            attempts: Cell::new(0),
        }
    }

    pub fn is_ready(&self, name: &str) -> bool {
        matches!(self.slots.borrow().get(name), Some(Slot::Ready))
    }

    pub fn is_loading(&self, name: &str) -> bool {
        matches!(self.slots.borrow().get(name), Some(Slot::Loading { .. }))
    }

    pub async fn ensure(&self, dependency: &Dependency) -> Result<(), DependencyLoadError> {
        let (attempt, load) = match self.claim(dependency) {
            Some(pending) => pending,
            None => return Ok(()),
        };

        let result = load.await;

        let mut slots = self.slots.borrow_mut();
        let owner = matches!(
            slots.get(&dependency.name),
            Some(Slot::Loading { attempt: current, .. }) if *current == attempt
        );
        if owner {
            match &result {
                Ok(()) => {
                    slots.insert(dependency.name.clone(), Slot::Ready);
                    self.log.success(format!("{} loaded", dependency.name));
                }
                Err(err) => {
                    slots.remove(&dependency.name);
                    self.log.error(format!("{err}"));
                }
            }
        }
        result
    }

    /// Ensures every dependency in order, stopping at the first failure.
    pub async fn ensure_all(&self, dependencies: &[Dependency]) -> Result<(), DependencyLoadError> {
        for dependency in dependencies {
            self.ensure(dependency).await?;
        }
        Ok(())
    }

    /// Returns the in-flight load to await, starting one if needed, or `None`
    /// when the dependency is already present.
    fn claim(&self, dependency: &Dependency) -> Option<(u64, SharedLoad)> {
        let mut slots = self.slots.borrow_mut();
        match slots.get(&dependency.name) {
            Some(Slot::Ready) => None,
            Some(Slot::Loading { attempt, load }) => Some((*attempt, load.clone())),
            None => {
                let attempt = self.attempts.get() + 1;
                self.attempts.set(attempt);
                self.log.info(format!("Loading {}...", dependency.name));
                let load = self.loader.inject(dependency).shared();
                slots.insert(
                    dependency.name.clone(),
                    Slot::Loading {
                        attempt,
                        load: load.clone(),
                    },
                );
                Some((attempt, load))
            }
        }
    }
}
