//! Recording fakes for the engine, script loader and HTTP client.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use tokio::sync::oneshot;

use crate::engine::{
    AtomInfo, AtomSelector, EngineFactory, EngineOptions, HoverHandler, LabelStyle, ModelFormat,
    MoleculeEngine, SpinAxis, StyleSpec,
};
use crate::error::{ClientError, DependencyLoadError, EngineError};
use crate::loader::{Dependency, ScriptLoader};
use crate::selection::StructureClient;

/// Per-key queue of one-shot gates; an ungated call settles immediately.
struct Gates<T> {
    pending: RefCell<HashMap<String, VecDeque<oneshot::Receiver<T>>>>,
}

impl<T> Default for Gates<T> {
    fn default() -> Self {
        Self {
            pending: RefCell::new(HashMap::new()),
        }
    }
}

impl<T> Gates<T> {
    fn open(&self, key: &str) -> oneshot::Sender<T> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    fn take(&self, key: &str) -> Option<oneshot::Receiver<T>> {
        self.pending
            .borrow_mut()
            .get_mut(key)
            .and_then(|q| q.pop_front())
    }
}

#[derive(Clone, Default)]
pub struct FakeLoader {
    injections: Rc<RefCell<Vec<String>>>,
    gates: Rc<Gates<Result<(), String>>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next injection of `name` waits for this sender.
    pub fn gate(&self, name: &str) -> oneshot::Sender<Result<(), String>> {
        self.gates.open(name)
    }

    pub fn injections(&self) -> Vec<String> {
        self.injections.borrow().clone()
    }
}

impl ScriptLoader for FakeLoader {
    fn inject(&self, dependency: &Dependency) -> LocalBoxFuture<'static, Result<(), DependencyLoadError>> {
        self.injections.borrow_mut().push(dependency.name.clone());
        let gate = self.gates.take(&dependency.name);
        let name = dependency.name.clone();
        async move {
            let outcome = match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err("gate dropped".to_string())),
                None => Ok(()),
            };
            outcome.map_err(|message| DependencyLoadError::new(name, message))
        }
        .boxed_local()
    }
}

/// A small structure file whose header names `id` in upper case.
pub fn structure_text(id: &str) -> String {
    format!(
        "HEADER    TEST STRUCTURE                          01-JAN-00   {}\n\
         ATOM      1  N   MET A   1      27.340  24.430   2.614  1.00  9.67           N\n\
         TER       2      MET A   1",
        id.to_ascii_uppercase()
    )
}

#[derive(Clone, Default)]
pub struct FakeClient {
    origin: Rc<RefCell<String>>,
    requests: Rc<RefCell<Vec<String>>>,
    gates: Rc<Gates<Result<String, String>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self, id: &str) -> oneshot::Sender<Result<String, String>> {
        self.gates.open(id)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Prefixes later requests; shared with every clone.
    pub fn set_origin(&self, origin: &str) {
        *self.origin.borrow_mut() = origin.to_string();
    }
}

impl StructureClient for FakeClient {
    fn fetch(&self, id: &str) -> LocalBoxFuture<'static, Result<String, ClientError>> {
        let url = format!("{}{id}", self.origin.borrow());
        self.requests.borrow_mut().push(url);
        let gate = self.gates.take(id);
        let fallback = structure_text(id);
        async move {
            let outcome = match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err("gate dropped".to_string())),
                None => Ok(fallback),
            };
            outcome.map_err(ClientError::new)
        }
        .boxed_local()
    }
}

/// Shared call log across every engine a factory has produced.
#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    pub journal: Journal,
    created: Rc<Cell<usize>>,
    live: Rc<Cell<usize>>,
    fail_create: Rc<Cell<bool>>,
    fail_op: Rc<Cell<Option<&'static str>>>,
    fail_clear: Rc<Cell<bool>>,
    hover: Rc<RefCell<Option<HoverHandler>>>,
    last_options: Rc<RefCell<Option<EngineOptions>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Engines created and not yet cleared.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.set(fail);
    }

    pub fn fail_on(&self, op: Option<&'static str>) {
        self.fail_op.set(op);
    }

    pub fn fail_clear(&self, fail: bool) {
        self.fail_clear.set(fail);
    }

    pub fn hover_handler(&self) -> Option<HoverHandler> {
        self.hover.borrow().clone()
    }

    pub fn last_options(&self) -> Option<EngineOptions> {
        self.last_options.borrow().clone()
    }
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;

    fn create(&self, options: &EngineOptions) -> Result<FakeEngine, EngineError> {
        if self.fail_create.get() {
            return Err(EngineError::new("create", "no surface"));
        }
        let serial = self.created.get() + 1;
        self.created.set(serial);
        if self.live.get() > 0 {
            self.journal.push(format!("overlap#{serial}"));
        }
        self.live.set(self.live.get() + 1);
        *self.last_options.borrow_mut() = Some(options.clone());
        self.journal.push(format!("create#{serial}"));
        Ok(FakeEngine {
            serial,
            factory: self.clone(),
            cleared: Cell::new(false),
        })
    }
}

pub struct FakeEngine {
    serial: usize,
    factory: FakeFactory,
    cleared: Cell<bool>,
}

impl FakeEngine {
    fn call(&self, op: &'static str, detail: Option<String>) -> Result<(), EngineError> {
        if self.cleared.get() {
            self.factory
                .journal
                .push(format!("use-after-clear#{}:{op}", self.serial));
            return Err(EngineError::new(op, "engine already cleared"));
        }
        if self.factory.fail_op.get() == Some(op) {
            return Err(EngineError::new(op, "boom"));
        }
        let entry = match detail {
            Some(detail) => format!("{op}#{}:{detail}", self.serial),
            None => format!("{op}#{}", self.serial),
        };
        self.factory.journal.push(entry);
        Ok(())
    }
}

fn style_name(style: &StyleSpec) -> &'static str {
    match (&style.cartoon, &style.stick) {
        (Some(_), None) => "cartoon",
        (None, Some(_)) => "stick",
        _ => "mixed",
    }
}

impl MoleculeEngine for FakeEngine {
    fn add_model(&self, text: &str, format: ModelFormat) -> Result<(), EngineError> {
        self.call("add_model", Some(format!("{}:{}", format.as_str(), text.len())))
    }

    fn set_style(&self, _selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError> {
        self.call("set_style", Some(style_name(style).to_string()))
    }

    fn add_style(&self, _selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError> {
        self.call("add_style", Some(style_name(style).to_string()))
    }

    fn zoom_to(&self) -> Result<(), EngineError> {
        self.call("zoom_to", None)
    }

    fn render(&self) -> Result<(), EngineError> {
        self.call("render", None)
    }

    fn spin(&self, axis: Option<SpinAxis>, _speed: f64) -> Result<(), EngineError> {
        let detail = axis.map_or("off", SpinAxis::as_str);
        self.call("spin", Some(detail.to_string()))
    }

    fn set_hoverable(&self, _selector: &AtomSelector, handler: HoverHandler) -> Result<(), EngineError> {
        self.call("set_hoverable", None)?;
        *self.factory.hover.borrow_mut() = Some(handler);
        Ok(())
    }

    fn add_label(&self, text: &str, _at: &AtomInfo, _style: &LabelStyle) -> Result<(), EngineError> {
        self.call("add_label", Some(text.replace('\n', "|")))
    }

    fn remove_all_labels(&self) -> Result<(), EngineError> {
        self.call("remove_all_labels", None)
    }

    fn resize(&self) -> Result<(), EngineError> {
        self.call("resize", None)
    }

    fn clear(&self) -> Result<(), EngineError> {
        self.call("clear", None)?;
        self.cleared.set(true);
        self.factory.live.set(self.factory.live.get().saturating_sub(1));
        if self.factory.fail_clear.get() {
            return Err(EngineError::new("clear", "detached surface"));
        }
        Ok(())
    }
}
