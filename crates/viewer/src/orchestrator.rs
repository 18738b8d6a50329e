use std::cell::RefCell;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use runtime::DiagnosticLog;
use structure::{StructureRecord, display_structure_id};

use crate::config::ViewerConfig;
use crate::engine::{
    AtomSelector, EngineFactory, HoverEvent, HoverHandler, LabelStyle, ModelFormat, MoleculeEngine,
};
use crate::error::{DependencyLoadError, EngineError, ViewerError};
use crate::loader::{DependencyLoader, ScriptLoader};

/// Where a viewer is in its build sequence.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    LoadingDependencies,
    BuildingScene,
    Styling,
    Ready,
    /// The last attempt failed; the next structure starts over.
    Error,
    Unmounted,
}

/// How a build sequence that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Rendered { id: String },
    /// A newer structure arrived while this one was waiting.
    Superseded,
    Unmounted,
}

/// The one live engine instance bound to the mount.
pub struct ViewerSession<E> {
    engine: Rc<E>,
    current_id: Option<String>,
}

impl<E> ViewerSession<E> {
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }
}

struct ViewerState<E> {
    phase: Phase,
    session: Option<ViewerSession<E>>,
    /// Bumped on every new structure and on unmount; a build only commits
    /// while its generation is still the latest.
    generation: u64,
    mounted: bool,
    spinning: bool,
    display_id: Option<String>,
}

struct ViewerInner<F: EngineFactory, L> {
    factory: F,
    dependencies: Rc<DependencyLoader<L>>,
    config: ViewerConfig,
    log: DiagnosticLog,
    state: RefCell<ViewerState<F::Engine>>,
}

/// Drives the rendering engine for a single mount point.
///
/// Each call to [`Viewer::show`] starts a build sequence: load the script
/// dependencies (once per loader), throw away the previous engine, construct a
/// fresh one, load the model, apply the fixed styles and hook up hover labels.
/// Sequences may overlap; whichever was started last is the only one allowed
/// to touch the engine, so stale sequences settle as
/// [`BuildOutcome::Superseded`]. After [`Viewer::unmount`] every sequence
/// settles as [`BuildOutcome::Unmounted`] without creating an engine.
pub struct Viewer<F: EngineFactory, L> {
    inner: Rc<ViewerInner<F, L>>,
}

impl<F: EngineFactory, L> Clone for Viewer<F, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<F, L> Viewer<F, L>
where
    F: EngineFactory + 'static,
    L: ScriptLoader + 'static,
{
    pub fn new(factory: F, loader: L, config: ViewerConfig, log: DiagnosticLog) -> Self {
        let dependencies = Rc::new(DependencyLoader::new(loader, log.clone()));
        Self::with_dependencies(factory, dependencies, config, log)
    }

    /// Like [`Viewer::new`], but scripts are loaded through a gate that
    /// outlives this viewer, so a later mount does not inject them again.
    pub fn with_dependencies(
        factory: F,
        dependencies: Rc<DependencyLoader<L>>,
        config: ViewerConfig,
        log: DiagnosticLog,
    ) -> Self {
        Self {
            inner: Rc::new(ViewerInner {
                factory,
                dependencies,
                config,
                log,
                state: RefCell::new(ViewerState {
                    phase: Phase::Idle,
                    session: None,
                    generation: 0,
                    mounted: true,
                    spinning: false,
                    display_id: None,
                }),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    /// Identifier shown next to the viewer, from the latest structure.
    pub fn display_id(&self) -> Option<String> {
        self.inner.state.borrow().display_id.clone()
    }

    /// Identifier of the structure the live engine is showing.
    pub fn session_id(&self) -> Option<String> {
        let state = self.inner.state.borrow();
        state
            .session
            .as_ref()
            .and_then(|s| s.current_id().map(str::to_string))
    }

    pub fn has_session(&self) -> bool {
        self.inner.state.borrow().session.is_some()
    }

    pub fn is_spinning(&self) -> bool {
        self.inner.state.borrow().spinning
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.state.borrow().mounted
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.inner.log
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.inner.config
    }

    pub fn dependencies(&self) -> &DependencyLoader<L> {
        &self.inner.dependencies
    }

    /// Starts a build sequence for `record`.
    ///
    /// The sequence is registered as the latest immediately; the returned
    /// future performs the work and must be polled (spawned) to make progress.
    pub fn show(
        &self,
        record: Rc<StructureRecord>,
    ) -> LocalBoxFuture<'static, Result<BuildOutcome, ViewerError>> {
        let inner = Rc::clone(&self.inner);
        let generation = inner.begin(&record);
        async move {
            let Some(generation) = generation else {
                return Ok(BuildOutcome::Unmounted);
            };
            if let Err(err) = inner
                .dependencies
                .ensure_all(&inner.config.dependencies)
                .await
            {
                return inner.fail_dependencies(generation, err);
            }
            inner.build(generation, &record)
        }
        .boxed_local()
    }

    /// Toggles continuous rotation. Returns whether the scene is now spinning.
    pub fn toggle_spin(&self) -> bool {
        let (engine, spinning) = {
            let mut state = self.inner.state.borrow_mut();
            let Some(engine) = state.session.as_ref().map(|s| Rc::clone(&s.engine)) else {
                return false;
            };
            state.spinning = !state.spinning;
            (engine, state.spinning)
        };

        let cfg = &self.inner.config;
        let axis = spinning.then_some(cfg.spin_axis);
        match engine.spin(axis, cfg.spin_speed) {
            Ok(()) if spinning => self.inner.log.info("Started rotation"),
            Ok(()) => self.inner.log.info("Stopped rotation"),
            Err(err) => {
                self.inner.state.borrow_mut().spinning = !spinning;
                self.inner.log.error(format!("Rotation error: {err}"));
                return !spinning;
            }
        }
        spinning
    }

    /// Re-fits the live engine to its surface and redraws.
    pub fn resize(&self) {
        let Some(engine) = self.inner.live_engine() else {
            return;
        };
        if let Err(err) = engine.resize().and_then(|()| engine.render()) {
            self.inner.log.error(format!("Resize error: {err}"));
        }
    }

    /// Disposes the live engine and stops all in-flight and future builds.
    pub fn unmount(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            state.generation += 1;
            state.phase = Phase::Unmounted;
            state.spinning = false;
        }
        self.inner.dispose_session();
    }
}

impl<F, L> ViewerInner<F, L>
where
    F: EngineFactory + 'static,
    L: ScriptLoader + 'static,
{
    fn begin(&self, record: &StructureRecord) -> Option<u64> {
        let id = display_structure_id(&record.raw_text);
        let generation = {
            let mut state = self.state.borrow_mut();
            if !state.mounted {
                return None;
            }
            state.generation += 1;
            state.phase = Phase::LoadingDependencies;
            state.display_id = Some(id.clone());
            state.generation
        };
        self.log.info(format!("Starting visualization for protein {id}"));
        Some(generation)
    }

    /// `Some` when `generation` may no longer touch the engine.
    fn stale(&self, generation: u64) -> Option<BuildOutcome> {
        let state = self.state.borrow();
        if !state.mounted {
            Some(BuildOutcome::Unmounted)
        } else if state.generation != generation {
            Some(BuildOutcome::Superseded)
        } else {
            None
        }
    }

    fn set_phase(&self, phase: Phase) {
        self.state.borrow_mut().phase = phase;
    }

    fn live_engine(&self) -> Option<Rc<F::Engine>> {
        let state = self.state.borrow();
        state.session.as_ref().map(|s| Rc::clone(&s.engine))
    }

    fn fail_dependencies(
        &self,
        generation: u64,
        err: DependencyLoadError,
    ) -> Result<BuildOutcome, ViewerError> {
        if let Some(outcome) = self.stale(generation) {
            return Ok(outcome);
        }
        self.set_phase(Phase::Error);
        self.log.error(format!("Visualization error: {err}"));
        Err(ViewerError::DependencyLoad(err))
    }

    fn fail_render(&self, err: EngineError) -> Result<BuildOutcome, ViewerError> {
        self.set_phase(Phase::Error);
        self.log.error(format!("Visualization error: {err}"));
        Err(ViewerError::Render(err))
    }

    fn build(&self, generation: u64, record: &StructureRecord) -> Result<BuildOutcome, ViewerError> {
        if let Some(outcome) = self.stale(generation) {
            tracing::debug!(?outcome, "dropping stale build");
            return Ok(outcome);
        }

        self.set_phase(Phase::BuildingScene);
        self.dispose_session();

        self.log.info("Creating viewer instance");
        let engine = match self.factory.create(&self.config.engine) {
            Ok(engine) => Rc::new(engine),
            Err(err) => return self.fail_render(err),
        };

        let id = display_structure_id(&record.raw_text);
        if let Err(err) = self.populate(&engine, &id, &record.raw_text) {
            dispose_engine(&*engine, &self.log);
            return self.fail_render(err);
        }

        {
            let mut state = self.state.borrow_mut();
            state.session = Some(ViewerSession {
                engine,
                current_id: Some(id.clone()),
            });
            state.spinning = false;
            state.phase = Phase::Ready;
        }
        self.log.success(format!("Protein {id} rendered with colors"));
        Ok(BuildOutcome::Rendered { id })
    }

    fn populate(&self, engine: &Rc<F::Engine>, id: &str, text: &str) -> Result<(), EngineError> {
        self.log.info(format!("Adding protein model {id}"));
        engine.add_model(text, ModelFormat::Pdb)?;

        self.set_phase(Phase::Styling);
        self.log.info("Applying visualization styles");
        let all = AtomSelector::all();
        engine.set_style(&all, &self.config.base_style)?;
        engine.add_style(&all, &self.config.overlay_style)?;
        engine.zoom_to()?;
        engine.render()?;

        engine.set_hoverable(&all, hover_handler(engine, self.config.label.clone()))
    }

    fn dispose_session(&self) {
        let session = self.state.borrow_mut().session.take();
        if let Some(session) = session {
            self.log.info("Clearing previous viewer");
            dispose_engine(&*session.engine, &self.log);
        }
    }
}

/// Best-effort teardown; a failing `clear` is logged and otherwise ignored.
fn dispose_engine<E: MoleculeEngine>(engine: &E, log: &DiagnosticLog) {
    if let Err(err) = engine.clear() {
        log.error(format!("Cleanup error: {err}"));
    }
}

/// Labels the hovered atom and clears labels on leave.
///
/// Holds the engine weakly so a disposed session is never touched again.
fn hover_handler<E: MoleculeEngine + 'static>(engine: &Rc<E>, label: LabelStyle) -> HoverHandler {
    let engine = Rc::downgrade(engine);
    Rc::new(move |event| {
        let Some(engine) = engine.upgrade() else {
            return;
        };
        let result = match &event {
            HoverEvent::Enter(atom) => engine.add_label(&atom.label_text(), atom, &label),
            HoverEvent::Leave => engine.remove_all_labels(),
        };
        if let Err(err) = result.and_then(|()| engine.render()) {
            tracing::warn!("hover update failed: {err}");
        }
    })
}
