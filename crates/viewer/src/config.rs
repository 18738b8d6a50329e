use crate::engine::{EngineOptions, LabelStyle, SpinAxis, StyleSpec};
use crate::loader::Dependency;

pub const JQUERY_URL: &str = "https://code.jquery.com/jquery-3.6.0.min.js";
pub const MOL3D_URL: &str = "https://3Dmol.org/build/3Dmol-min.js";

/// Fixed presentation and dependency settings for a viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub engine: EngineOptions,
    /// Loaded in order; later entries may rely on earlier ones.
    pub dependencies: Vec<Dependency>,
    /// Applied with `set_style`, replacing whatever the model loaded with.
    pub base_style: StyleSpec,
    /// Applied with `add_style` on top of `base_style`.
    pub overlay_style: StyleSpec,
    pub label: LabelStyle,
    pub spin_axis: SpinAxis,
    pub spin_speed: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            dependencies: vec![
                Dependency::new("jQuery", JQUERY_URL),
                Dependency::new("3DMol", MOL3D_URL),
            ],
            base_style: StyleSpec::cartoon("spectrum", 0.8),
            overlay_style: StyleSpec::stick(0.2, "chainHetatm"),
            label: LabelStyle::default(),
            spin_axis: SpinAxis::Y,
            spin_speed: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loads_jquery_before_engine() {
        let cfg = ViewerConfig::default();
        let names: Vec<_> = cfg.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["jQuery", "3DMol"]);
        assert!(cfg.engine.antialias);
        assert_eq!(cfg.spin_axis, SpinAxis::Y);
    }
}
