//! Choropleth view state and its event-driven transitions.
//!
//! [`update`] is pure: given the current state, an event and the immutable
//! dataset it returns the next state plus what needs redrawing.

use crate::regions;
use crate::scale::ColorDomain;
use crate::types::Dataset;
use serde::Serialize;

pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 8.0;
pub const ZOOM_IN_FACTOR: f64 = 1.25;
pub const ZOOM_OUT_FACTOR: f64 = 0.8;

pub const DEFAULT_WIDTH: f64 = 960.0;
pub const DEFAULT_HEIGHT: f64 = 500.0;

pub const HOVER_PLACEHOLDER: &str = "Hover over states";

/// Drawing area: container size minus a uniform margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Layout {
    /// Unknown or zero container sizes fall back to 960x500. A container
    /// smaller than its margins leaves an empty drawing area.
    pub fn from_container(width: Option<f64>, height: Option<f64>, margin: f64) -> Self {
        let usable = |v: Option<f64>, default: f64| match v {
            Some(v) if v > 0.0 && v.is_finite() => v,
            _ => default,
        };
        Self {
            width: (usable(width, DEFAULT_WIDTH) - 2.0 * margin).max(0.0),
            height: (usable(height, DEFAULT_HEIGHT) - 2.0 * margin).max(0.0),
            margin,
        }
    }

    pub fn outer_width(&self) -> f64 {
        self.width + 2.0 * self.margin
    }

    pub fn outer_height(&self) -> f64 {
        self.height + 2.0 * self.margin
    }

    /// SVG transform scaling the drawing by `k` about its centre.
    pub fn zoom_transform(&self, k: f64) -> String {
        format!(
            "translate({},{}) translate({},{}) scale({}) translate({},{})",
            self.margin,
            self.margin,
            self.width / 2.0,
            self.height / 2.0,
            k,
            -self.width / 2.0,
            -self.height / 2.0
        )
    }

    /// Inverse of [`Layout::zoom_transform`]: canvas pixels to chart space.
    pub fn to_chart_space(&self, x: f64, y: f64, k: f64) -> (f64, f64) {
        let cx = self.width / 2.0;
        let cy = self.height / 2.0;
        (
            (x - self.margin - cx) / k + cx,
            (y - self.margin - cy) / k + cy,
        )
    }
}

/// Distinct years offered by the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSelector {
    years: Vec<i32>,
}

impl YearSelector {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            years: dataset.years(),
        }
    }

    pub fn options(&self) -> &[i32] {
        &self.years
    }

    /// Most recent year.
    pub fn default_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn offers(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }
}

/// The region under the pointer, with the value its position maps to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hover {
    pub index: usize,
    pub name: Option<String>,
    pub code: Option<String>,
    pub value: f64,
}

impl Hover {
    pub fn text(&self) -> String {
        format!(
            "{} ({}): {:.2} per 10,000",
            self.name.as_deref().unwrap_or(regions::UNNAMED),
            self.code.as_deref().unwrap_or("?"),
            self.value
        )
    }
}

/// Identity and horizontal screen span of a hovered region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverTarget {
    pub index: usize,
    pub name: Option<String>,
    pub code: Option<String>,
    pub span: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub year: Option<i32>,
    pub focused: Option<String>,
    pub zoom: f64,
    pub domain: ColorDomain,
    pub hover: Option<Hover>,
    pub layout: Layout,
}

impl ViewState {
    /// Initial view on the most recent year.
    pub fn initial(dataset: &Dataset, layout: Layout) -> Self {
        let year = YearSelector::from_dataset(dataset).default_year();
        Self {
            year,
            focused: None,
            zoom: ZOOM_MIN,
            domain: domain_for(dataset, year),
            hover: None,
            layout,
        }
    }

    pub fn hover_text(&self) -> String {
        self.hover
            .as_ref()
            .map(Hover::text)
            .unwrap_or_else(|| HOVER_PLACEHOLDER.to_string())
    }
}

pub fn domain_for(dataset: &Dataset, year: Option<i32>) -> ColorDomain {
    let year_rates: Vec<f64> = match year {
        Some(y) => dataset.rows_for_year(y).filter_map(|m| m.rate).collect(),
        None => Vec::new(),
    };
    ColorDomain::compute(year_rates, dataset.all_rates())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    SelectYear { year: i32 },
    Hover { target: HoverTarget, pointer_x: f64 },
    MouseOut,
    Click { code: Option<String> },
    ZoomIn,
    ZoomOut,
    Resize { width: Option<f64>, height: Option<f64> },
}

/// What an event invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Redraw {
    None,
    /// Only the zoom transform changed.
    Transform,
    /// Fills, strokes, opacities, hover text or indicator changed.
    Styles,
    /// Shapes, legend and projection must be rebuilt.
    Full,
}

pub fn update(state: ViewState, event: &MapEvent, dataset: &Dataset) -> (ViewState, Redraw) {
    match event {
        MapEvent::SelectYear { year } => {
            if !YearSelector::from_dataset(dataset).offers(*year) {
                return (state, Redraw::None);
            }
            let next = ViewState {
                year: Some(*year),
                focused: None,
                hover: None,
                domain: domain_for(dataset, Some(*year)),
                ..state
            };
            (next, Redraw::Full)
        }
        MapEvent::Hover { target, pointer_x } => {
            let (x0, x1) = target.span;
            let t = ((pointer_x - x0) / (x1 - x0).max(1e-6)).clamp(0.0, 1.0);
            let hover = Hover {
                index: target.index,
                name: target.name.clone(),
                code: target.code.clone(),
                value: state.domain.lerp(t),
            };
            (
                ViewState {
                    hover: Some(hover),
                    ..state
                },
                Redraw::Styles,
            )
        }
        MapEvent::MouseOut => (ViewState { hover: None, ..state }, Redraw::Styles),
        MapEvent::Click { code } => {
            let focused = if code.is_some() && state.focused == *code {
                None
            } else {
                code.clone()
            };
            (ViewState { focused, ..state }, Redraw::Styles)
        }
        MapEvent::ZoomIn => {
            let zoom = (state.zoom * ZOOM_IN_FACTOR).min(ZOOM_MAX);
            (ViewState { zoom, ..state }, Redraw::Transform)
        }
        MapEvent::ZoomOut => {
            let zoom = (state.zoom * ZOOM_OUT_FACTOR).max(ZOOM_MIN);
            (ViewState { zoom, ..state }, Redraw::Transform)
        }
        MapEvent::Resize { width, height } => {
            let layout = Layout::from_container(*width, *height, state.layout.margin);
            let next = ViewState {
                layout,
                focused: None,
                hover: None,
                zoom: ZOOM_MIN,
                ..state
            };
            (next, Redraw::Full)
        }
    }
}

/// Display name for a code, falling back to the code itself.
pub fn region_label(code: &str) -> String {
    match regions::name_for(code) {
        Some(name) => format!("{} ({})", name, code),
        None => code.to_string(),
    }
}
