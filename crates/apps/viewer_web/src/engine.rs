//! `MoleculeEngine` over the 3Dmol.js `GLViewer`.

use std::cell::{Cell, RefCell};

use js_sys::{Function, Reflect};
use serde::Serialize;
use serde_json::json;
use viewer::{
    AtomInfo, AtomSelector, EngineError, EngineFactory, EngineOptions, HoverEvent, HoverHandler,
    LabelStyle, ModelFormat, MoleculeEngine, SpinAxis, StyleSpec,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Global installed by the 3Dmol script.
const ENGINE_GLOBAL: &str = "$3Dmol";

#[wasm_bindgen]
extern "C" {
    pub type GlViewer;

    #[wasm_bindgen(method, catch, js_name = addModel)]
    fn add_model(this: &GlViewer, data: &str, format: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setStyle)]
    fn set_style(this: &GlViewer, selector: &JsValue, style: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addStyle)]
    fn add_style(this: &GlViewer, selector: &JsValue, style: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = zoomTo)]
    fn zoom_to(this: &GlViewer) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn render(this: &GlViewer) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn spin(this: &GlViewer, axis: &JsValue, speed: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setHoverable)]
    fn set_hoverable(
        this: &GlViewer,
        selector: &JsValue,
        hoverable: bool,
        on_hover: &Function,
        on_unhover: &Function,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLabel)]
    fn add_label(this: &GlViewer, text: &str, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeAllLabels)]
    fn remove_all_labels(this: &GlViewer) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn resize(this: &GlViewer) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn clear(this: &GlViewer) -> Result<(), JsValue>;
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn thrown(operation: &'static str) -> impl Fn(JsValue) -> EngineError {
    move |value| EngineError::new(operation, js_message(&value))
}

fn to_js<T: Serialize>(operation: &'static str, value: &T) -> Result<JsValue, EngineError> {
    let text = serde_json::to_string(value).map_err(|e| EngineError::new(operation, e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(thrown(operation))
}

fn atom_from_js(atom: &JsValue) -> Option<AtomInfo> {
    let field = |name: &str| Reflect::get(atom, &JsValue::from_str(name)).ok();
    let number = |name: &str| field(name).and_then(|v| v.as_f64());
    Some(AtomInfo {
        resn: field("resn")?.as_string().unwrap_or_default(),
        resi: number("resi")? as i64,
        chain: field("chain")?.as_string().unwrap_or_default(),
        position: [number("x")?, number("y")?, number("z")?],
    })
}

type HoverClosure = Closure<dyn FnMut(JsValue)>;

/// One `GLViewer` bound to a container element.
///
/// Hover closures are owned here so they live exactly as long as the viewer.
pub struct MolEngine {
    inner: GlViewer,
    container: Element,
    hover: RefCell<Option<(HoverClosure, HoverClosure)>>,
    cleared: Cell<bool>,
}

impl MolEngine {
    fn live(&self, operation: &'static str) -> Result<&GlViewer, EngineError> {
        if self.cleared.get() {
            return Err(EngineError::new(operation, "viewer already cleared"));
        }
        Ok(&self.inner)
    }
}

impl MoleculeEngine for MolEngine {
    fn add_model(&self, text: &str, format: ModelFormat) -> Result<(), EngineError> {
        self.live("add_model")?
            .add_model(text, format.as_str())
            .map(|_| ())
            .map_err(thrown("add_model"))
    }

    fn set_style(&self, selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError> {
        let sel = to_js("set_style", selector)?;
        let style = to_js("set_style", style)?;
        self.live("set_style")?
            .set_style(&sel, &style)
            .map_err(thrown("set_style"))
    }

    fn add_style(&self, selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError> {
        let sel = to_js("add_style", selector)?;
        let style = to_js("add_style", style)?;
        self.live("add_style")?
            .add_style(&sel, &style)
            .map_err(thrown("add_style"))
    }

    fn zoom_to(&self) -> Result<(), EngineError> {
        self.live("zoom_to")?.zoom_to().map_err(thrown("zoom_to"))
    }

    fn render(&self) -> Result<(), EngineError> {
        self.live("render")?.render().map_err(thrown("render"))
    }

    fn spin(&self, axis: Option<SpinAxis>, speed: f64) -> Result<(), EngineError> {
        // 3Dmol stops rotating when given `false` instead of an axis.
        let axis = match axis {
            Some(axis) => JsValue::from_str(axis.as_str()),
            None => JsValue::FALSE,
        };
        self.live("spin")?.spin(&axis, speed).map_err(thrown("spin"))
    }

    fn set_hoverable(&self, selector: &AtomSelector, handler: HoverHandler) -> Result<(), EngineError> {
        let sel = to_js("set_hoverable", selector)?;

        let enter = handler.clone();
        let on_hover = Closure::wrap(Box::new(move |atom: JsValue| {
            if let Some(atom) = atom_from_js(&atom) {
                enter(HoverEvent::Enter(atom));
            }
        }) as Box<dyn FnMut(JsValue)>);
        let on_unhover = Closure::wrap(Box::new(move |_atom: JsValue| {
            handler(HoverEvent::Leave);
        }) as Box<dyn FnMut(JsValue)>);

        self.live("set_hoverable")?
            .set_hoverable(
                &sel,
                true,
                on_hover.as_ref().unchecked_ref(),
                on_unhover.as_ref().unchecked_ref(),
            )
            .map_err(thrown("set_hoverable"))?;
        self.hover.replace(Some((on_hover, on_unhover)));
        Ok(())
    }

    fn add_label(&self, text: &str, at: &AtomInfo, style: &LabelStyle) -> Result<(), EngineError> {
        let mut options = serde_json::to_value(style).map_err(|e| EngineError::new("add_label", e.to_string()))?;
        let [x, y, z] = at.position;
        options["position"] = json!({ "x": x, "y": y, "z": z });
        let options = to_js("add_label", &options)?;
        self.live("add_label")?
            .add_label(text, &options)
            .map(|_| ())
            .map_err(thrown("add_label"))
    }

    fn remove_all_labels(&self) -> Result<(), EngineError> {
        self.live("remove_all_labels")?
            .remove_all_labels()
            .map_err(thrown("remove_all_labels"))
    }

    fn resize(&self) -> Result<(), EngineError> {
        self.live("resize")?.resize().map_err(thrown("resize"))
    }

    /// Clears the scene and detaches the canvas, leaving the container empty.
    fn clear(&self) -> Result<(), EngineError> {
        let result = self.live("clear")?.clear().map_err(thrown("clear"));
        self.cleared.set(true);
        release_surface(&self.container);
        self.hover.replace(None);
        result
    }
}

/// Drops every child of `container`, taking any canvas and its GL context
/// with it.
fn release_surface(container: &Element) {
    container.set_inner_html("");
}

/// Creates viewers inside one container element.
pub struct MolFactory {
    container: Element,
}

impl MolFactory {
    pub fn new(container: Element) -> Self {
        Self { container }
    }
}

impl EngineFactory for MolFactory {
    type Engine = MolEngine;

    fn create(&self, options: &EngineOptions) -> Result<MolEngine, EngineError> {
        let global = Reflect::get(&js_sys::global(), &JsValue::from_str(ENGINE_GLOBAL))
            .map_err(thrown("create"))?;
        if global.is_undefined() || global.is_null() {
            return Err(EngineError::new("create", "3Dmol is not loaded"));
        }
        let create: Function = Reflect::get(&global, &JsValue::from_str("createViewer"))
            .map_err(thrown("create"))?
            .dyn_into()
            .map_err(|_| EngineError::new("create", "createViewer is not a function"))?;

        let options = to_js("create", options)?;
        // createViewer appends its own canvas; start from an empty surface.
        release_surface(&self.container);
        let viewer = create
            .call2(&global, &self.container, &options)
            .map_err(thrown("create"))?;
        if viewer.is_undefined() || viewer.is_null() {
            return Err(EngineError::new("create", "createViewer returned nothing"));
        }

        Ok(MolEngine {
            inner: viewer.unchecked_into(),
            container: self.container.clone(),
            hover: RefCell::new(None),
            cleared: Cell::new(false),
        })
    }
}
