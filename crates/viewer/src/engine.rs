//! Typed contract over the third-party molecular rendering engine.
//!
//! The engine is a black box with a dynamic API; this trait names the handful
//! of calls the viewer makes so the orchestration logic can run against a fake.
//! Methods take `&self` because the real engine is a shared handle whose state
//! lives on the other side of the binding.

use std::rc::Rc;

use serde::Serialize;

use crate::error::EngineError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModelFormat {
    Pdb,
}

impl ModelFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFormat::Pdb => "pdb",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpinAxis {
    X,
    Y,
    Z,
}

impl SpinAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            SpinAxis::X => "x",
            SpinAxis::Y => "y",
            SpinAxis::Z => "z",
        }
    }
}

/// Atom selector; the empty selector matches every atom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AtomSelector {}

impl AtomSelector {
    pub fn all() -> Self {
        Self {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartoonStyle {
    pub color: String,
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickStyle {
    pub radius: f64,
    pub colorscheme: String,
}

/// Representation settings in the engine's own JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cartoon: Option<CartoonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stick: Option<StickStyle>,
}

impl StyleSpec {
    pub fn cartoon(color: impl Into<String>, thickness: f64) -> Self {
        Self {
            cartoon: Some(CartoonStyle {
                color: color.into(),
                thickness,
            }),
            stick: None,
        }
    }

    pub fn stick(radius: f64, colorscheme: impl Into<String>) -> Self {
        Self {
            cartoon: None,
            stick: Some(StickStyle {
                radius,
                colorscheme: colorscheme.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    pub background_color: String,
    pub font_color: String,
    pub font_size: u32,
    pub border_radius: u32,
    pub padding: u32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            background_color: "rgba(0,0,0,0.8)".to_string(),
            font_color: "white".to_string(),
            font_size: 12,
            border_radius: 10,
            padding: 5,
        }
    }
}

/// Options passed when a fresh engine instance is constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub background_color: String,
    pub antialias: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            background_color: "white".to_string(),
            antialias: true,
        }
    }
}

/// The atom under the pointer, as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomInfo {
    pub resn: String,
    pub resi: i64,
    pub chain: String,
    pub position: [f64; 3],
}

impl AtomInfo {
    pub fn label_text(&self) -> String {
        format!("{} {}\nChain {}", self.resn, self.resi, self.chain)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoverEvent {
    Enter(AtomInfo),
    Leave,
}

pub type HoverHandler = Rc<dyn Fn(HoverEvent)>;

pub trait MoleculeEngine {
    fn add_model(&self, text: &str, format: ModelFormat) -> Result<(), EngineError>;

    /// Replaces every representation on the selected atoms.
    fn set_style(&self, selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError>;

    /// Layers a representation on top of the existing ones.
    fn add_style(&self, selector: &AtomSelector, style: &StyleSpec) -> Result<(), EngineError>;

    fn zoom_to(&self) -> Result<(), EngineError>;

    fn render(&self) -> Result<(), EngineError>;

    /// `None` stops any rotation in progress.
    fn spin(&self, axis: Option<SpinAxis>, speed: f64) -> Result<(), EngineError>;

    fn set_hoverable(&self, selector: &AtomSelector, handler: HoverHandler) -> Result<(), EngineError>;

    fn add_label(&self, text: &str, at: &AtomInfo, style: &LabelStyle) -> Result<(), EngineError>;

    fn remove_all_labels(&self) -> Result<(), EngineError>;

    /// Re-reads the size of the surface the engine is bound to.
    fn resize(&self) -> Result<(), EngineError>;

    /// Tears the instance down. The handle must not be used afterwards.
    fn clear(&self) -> Result<(), EngineError>;
}

/// Constructs engine instances bound to one fixed surface.
pub trait EngineFactory {
    type Engine: MoleculeEngine + 'static;

    fn create(&self, options: &EngineOptions) -> Result<Self::Engine, EngineError>;
}
