use console_error_panic_hook::set_once;
use runtime::{DiagnosticLog, StoreProvider, SubscriptionId};
use std::cell::RefCell;
use std::rc::Rc;
use viewer::{DependencyLoader, SelectionController, Viewer, ViewerConfig, bind_viewer};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, EventTarget};

mod api;
mod engine;
mod scripts;

use api::ProxyClient;
use engine::MolFactory;
use scripts::DomScriptLoader;

type WebViewer = Viewer<MolFactory, DomScriptLoader>;

/// A DOM listener removed again when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

struct Mounted {
    viewer: WebViewer,
    binding: SubscriptionId,
    _listeners: Vec<Listener>,
}

struct Page {
    provider: StoreProvider,
    client: ProxyClient,
    controller: SelectionController<ProxyClient>,
    selection_log: DiagnosticLog,
    viewer_log: DiagnosticLog,
    /// Shared by every mount so scripts are injected once per page.
    scripts: Rc<DependencyLoader<DomScriptLoader>>,
    mounted: Option<Mounted>,
}

impl Page {
    fn new() -> Self {
        let provider = StoreProvider::new();
        let selection_log = DiagnosticLog::new("selection");
        let client = ProxyClient::default();
        let controller =
            SelectionController::new(client.clone(), provider.store(), selection_log.clone());
        let viewer_log = DiagnosticLog::new("viewer");
        Self {
            provider,
            client,
            controller,
            selection_log,
            scripts: Rc::new(DependencyLoader::new(DomScriptLoader, viewer_log.clone())),
            viewer_log,
            mounted: None,
        }
    }
}

thread_local! {
    static PAGE: RefCell<Page> = RefCell::new(Page::new());
}

fn console_log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        console_log(&format!("serialization error: {err}"));
        "[]".to_string()
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Points structure requests at a proxy on another origin.
///
/// Requests already in flight keep their place in the selection order.
#[wasm_bindgen]
pub fn set_api_base(base: &str) {
    PAGE.with(|page| page.borrow().client.set_base(base));
}

/// Attaches a viewer to the element with `element_id`.
///
/// Double-click toggles rotation; window resizes are forwarded to the engine.
/// Mounting again replaces the previous viewer.
#[wasm_bindgen]
pub fn mount(element_id: &str) -> Result<(), JsValue> {
    unmount();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = document
        .get_element_by_id(element_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id {element_id}")))?;

    let (store, scripts, log) = PAGE.with(|page| {
        let page = page.borrow();
        (page.provider.store(), Rc::clone(&page.scripts), page.viewer_log.clone())
    });
    let viewer = Viewer::with_dependencies(
        MolFactory::new(container.clone()),
        scripts,
        ViewerConfig::default(),
        log,
    );

    let spin = viewer.clone();
    let resize = viewer.clone();
    let listeners = vec![
        Listener::attach(container.into(), "dblclick", move |_| {
            spin.toggle_spin();
        })?,
        Listener::attach(window.into(), "resize", move |_| resize.resize())?,
    ];

    let binding = bind_viewer(&store, &viewer, |build| spawn_local(build));

    PAGE.with(|page| {
        page.borrow_mut().mounted = Some(Mounted {
            viewer,
            binding,
            _listeners: listeners,
        });
    });
    Ok(())
}

/// Tears the viewer down. Builds still in flight finish without effect.
#[wasm_bindgen]
pub fn unmount() {
    let mounted = PAGE.with(|page| {
        let mut page = page.borrow_mut();
        let mounted = page.mounted.take()?;
        page.provider.store().unsubscribe(mounted.binding);
        Some(mounted)
    });
    if let Some(mounted) = mounted {
        mounted.viewer.unmount();
    }
}

/// Starts loading `id`; the viewer rebuilds once the structure arrives.
#[wasm_bindgen]
pub fn select_protein(id: String) {
    let controller = PAGE.with(|page| page.borrow().controller.clone());
    let selection = controller.select(&id);
    spawn_local(async move {
        let outcome = selection.await;
        console_log(&format!("selection settled: {outcome:?}"));
    });
}

#[wasm_bindgen]
pub fn is_loading() -> bool {
    PAGE.with(|page| page.borrow().provider.store().loading())
}

/// Identifier of the last structure requested from the catalog or search box.
#[wasm_bindgen]
pub fn selected_protein() -> Option<String> {
    PAGE.with(|page| page.borrow().controller.selected())
}

#[wasm_bindgen]
pub fn selected_description() -> Option<String> {
    PAGE.with(|page| page.borrow().controller.selected_description().map(str::to_string))
}

/// Identifier shown next to the viewer for the structure on screen.
#[wasm_bindgen]
pub fn current_protein() -> Option<String> {
    PAGE.with(|page| {
        page.borrow()
            .mounted
            .as_ref()
            .and_then(|m| m.viewer.display_id())
    })
}

#[wasm_bindgen]
pub fn viewer_phase() -> String {
    PAGE.with(|page| match &page.borrow().mounted {
        Some(m) => format!("{:?}", m.viewer.phase()),
        None => "Unmounted".to_string(),
    })
}

#[wasm_bindgen]
pub fn is_spinning() -> bool {
    PAGE.with(|page| {
        page.borrow()
            .mounted
            .as_ref()
            .is_some_and(|m| m.viewer.is_spinning())
    })
}

/// Toggles rotation without a double-click.
#[wasm_bindgen]
pub fn toggle_spin() -> bool {
    let viewer = PAGE.with(|page| page.borrow().mounted.as_ref().map(|m| m.viewer.clone()));
    viewer.is_some_and(|v| v.toggle_spin())
}

/// Viewer diagnostics as a JSON array of `{timestamp, severity, message}`.
#[wasm_bindgen]
pub fn viewer_logs() -> String {
    PAGE.with(|page| to_json(&page.borrow().viewer_log.entries()))
}

#[wasm_bindgen]
pub fn selection_logs() -> String {
    PAGE.with(|page| to_json(&page.borrow().selection_log.entries()))
}

#[wasm_bindgen]
pub fn clear_logs() {
    PAGE.with(|page| {
        let page = page.borrow();
        page.viewer_log.clear();
        page.selection_log.clear();
    });
}

#[wasm_bindgen]
pub fn popular_proteins() -> String {
    to_json(&structure::POPULAR_PROTEINS)
}
