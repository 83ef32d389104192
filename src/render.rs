//! SVG scene assembly for the choropleth.

use crate::hit::HitIndex;
use crate::projection::{Cartographer, Mercator};
use crate::regions;
use crate::scale::{darker, to_hex, ColorScale, SequentialBlues, NEUTRAL_FILL};
use crate::types::{Dataset, Region};
use crate::view::ViewState;
use palette::Srgb;
use std::collections::HashMap;
use std::fmt::Write;

const LEGEND_WIDTH: f64 = 120.0;
const LEGEND_HEIGHT: f64 = 6.0;
const GRADIENT_ID: &str = "rate-grad";

const STROKE: &str = "#888";
const STROKE_WIDTH: f64 = 0.5;
const FOCUS_STROKE: &str = "#000";
const FOCUS_STROKE_WIDTH: f64 = 1.2;
const HOVER_STROKE: &str = "#444";
const HOVER_STROKE_WIDTH: f64 = 0.8;
const DIMMED_OPACITY: f64 = 0.25;
const FOCUS_DARKEN: f64 = 0.7;
const HOVER_DARKEN: f64 = 0.35;

/// Projection and hit index for one layout. Rebuilt on full redraws.
pub struct Chart {
    pub projection: Mercator,
    pub hits: HitIndex,
}

impl Chart {
    pub fn fit(dataset: &Dataset, state: &ViewState) -> Self {
        let projection = Mercator::fit_size(
            state.layout.width,
            state.layout.height,
            dataset.regions.iter().map(|r| &r.geometry),
        );
        let hits = HitIndex::build(&dataset.regions, &projection);
        Self { projection, hits }
    }

    pub fn render(&self, dataset: &Dataset, state: &ViewState) -> String {
        let scale = SequentialBlues::new(state.domain);
        render_svg(dataset, state, &self.projection, &scale)
    }
}

/// Rate per region code for the selected year; later rows win.
pub fn values_for_year(dataset: &Dataset, year: Option<i32>) -> HashMap<&str, Option<f64>> {
    let Some(year) = year else {
        return HashMap::new();
    };
    dataset
        .rows_for_year(year)
        .map(|m| (m.jurisdiction.as_str(), m.rate))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStyle {
    pub fill: Srgb<u8>,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub opacity: f64,
}

pub fn region_style(
    index: usize,
    region: &Region,
    value: Option<f64>,
    state: &ViewState,
    scale: &dyn ColorScale,
) -> RegionStyle {
    let base = value.map(|v| scale.color(v)).unwrap_or(NEUTRAL_FILL);
    let is_focused = state.focused.is_some() && region.code == state.focused.as_deref();

    let mut style = match &state.focused {
        None => RegionStyle {
            fill: base,
            stroke: STROKE,
            stroke_width: STROKE_WIDTH,
            opacity: 1.0,
        },
        Some(_) if is_focused => RegionStyle {
            fill: darker(base, FOCUS_DARKEN),
            stroke: FOCUS_STROKE,
            stroke_width: FOCUS_STROKE_WIDTH,
            opacity: 1.0,
        },
        Some(_) => RegionStyle {
            fill: base,
            stroke: STROKE,
            stroke_width: STROKE_WIDTH,
            opacity: DIMMED_OPACITY,
        },
    };

    if state.hover.as_ref().is_some_and(|h| h.index == index) {
        style.fill = darker(base, HOVER_DARKEN);
        style.opacity = 1.0;
        if is_focused {
            style.stroke = FOCUS_STROKE;
            style.stroke_width = FOCUS_STROKE_WIDTH;
        } else {
            style.stroke = HOVER_STROKE;
            style.stroke_width = HOVER_STROKE_WIDTH;
        }
    }

    style
}

pub fn tooltip(region: &Region, value: Option<f64>) -> String {
    let value = match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    };
    format!(
        "{} ({}): {} [Per 10,000]",
        region.name.as_deref().unwrap_or(regions::UNNAMED),
        region.code.unwrap_or("?"),
        value
    )
}

pub fn render_svg(
    dataset: &Dataset,
    state: &ViewState,
    cartographer: &dyn Cartographer,
    scale: &dyn ColorScale,
) -> String {
    let layout = state.layout;
    let domain = scale.domain();
    let values = values_for_year(dataset, state.year);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" preserveAspectRatio="none">"#,
        layout.outer_width(),
        layout.outer_height()
    );

    let _ = write!(
        svg,
        r#"<defs><linearGradient id="{id}" x1="0%" y1="0%" x2="100%" y2="0%"><stop offset="0%" stop-color="{lo}"/><stop offset="100%" stop-color="{hi}"/></linearGradient></defs>"#,
        id = GRADIENT_ID,
        lo = to_hex(scale.color(domain.min)),
        hi = to_hex(scale.color(domain.max)),
    );

    let _ = write!(svg, r#"<g transform="{}">"#, layout.zoom_transform(state.zoom));

    // legend
    let _ = write!(
        svg,
        r#"<g class="legend" transform="translate({},{})">"#,
        layout.width - LEGEND_WIDTH - 5.0,
        layout.height - 15.0
    );
    let _ = write!(
        svg,
        r##"<rect width="{w}" height="{h}" fill="url(#{id})" stroke="#ccc"/><line class="legend-axis" x1="0" x2="{w}" y1="{h}" y2="{h}" stroke="#000"/>"##,
        w = LEGEND_WIDTH,
        h = LEGEND_HEIGHT,
        id = GRADIENT_ID,
    );
    let (indicator_x, indicator_opacity) = match &state.hover {
        Some(hover) => (domain.to_axis(hover.value, LEGEND_WIDTH), 1),
        None => (0.0, 0),
    };
    let _ = write!(
        svg,
        r##"<line class="legend-indicator" x1="{x}" x2="{x}" y1="-2" y2="{y2}" stroke="#000" stroke-width="1" opacity="{o}"/></g>"##,
        x = indicator_x,
        y2 = LEGEND_HEIGHT + 2.0,
        o = indicator_opacity,
    );

    let _ = write!(
        svg,
        r##"<text class="hover-info" x="{}" y="{}" text-anchor="end" style="font-size:9px;fill:#666">{}</text>"##,
        layout.width - 5.0,
        layout.height - 5.0,
        escape_xml(&state.hover_text())
    );

    for (index, region) in dataset.regions.iter().enumerate() {
        let value = region.code.and_then(|c| values.get(c).copied().flatten());
        let style = region_style(index, region, value, state, scale);
        let _ = write!(
            svg,
            r#"<path class="state" data-index="{}" data-code="{}" d="{}" fill="{}" stroke="{}" stroke-width="{}" opacity="{}" style="cursor:pointer"><title>{}</title></path>"#,
            index,
            region.code.unwrap_or(""),
            cartographer.path_for(&region.geometry),
            to_hex(style.fill),
            style.stroke,
            style.stroke_width,
            style.opacity,
            escape_xml(&tooltip(region, value))
        );
    }

    svg.push_str("</g></svg>");
    svg
}

/// Inline block shown instead of the chart when loading fails.
pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class="chart-error" style="color:#d62728;margin-top:8px">{}</div>"#,
        escape_xml(message)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{luminance, ColorDomain};
    use crate::types::Measurement;
    use crate::view::{Hover, Layout};
    use geo::{polygon, MultiPolygon};

    fn region(name: &str, code: Option<&'static str>, lon: f64) -> Region {
        Region {
            name: Some(name.to_string()),
            code,
            geometry: MultiPolygon::new(vec![polygon![
                (x: lon, y: -35.0),
                (x: lon + 4.0, y: -35.0),
                (x: lon + 4.0, y: -31.0),
                (x: lon, y: -31.0),
                (x: lon, y: -35.0),
            ]]),
        }
    }

    fn dataset() -> Dataset {
        let row = |j: &str, rate| Measurement {
            year: 2020,
            jurisdiction: j.to_string(),
            fines: None,
            total_licences: None,
            rate,
        };
        Dataset::new(
            vec![row("NSW", Some(120.0)), row("VIC", Some(80.0)), row("QLD", None)],
            vec![
                region("New South Wales", Some("NSW"), 146.0),
                region("Victoria", Some("VIC"), 141.0),
                region("Queensland", Some("QLD"), 150.0),
                region("Jervis Bay", None, 154.0),
            ],
        )
    }

    fn state() -> ViewState {
        ViewState::initial(&dataset(), Layout::from_container(Some(400.0), Some(300.0), 5.0))
    }

    fn scale() -> SequentialBlues {
        SequentialBlues::new(ColorDomain { min: 80.0, max: 120.0 })
    }

    #[test]
    fn missing_values_get_neutral_fill() {
        let ds = dataset();
        let s = state();
        let style = region_style(2, &ds.regions[2], None, &s, &scale());
        assert_eq!(style.fill, NEUTRAL_FILL);
        assert_eq!(style.opacity, 1.0);
        assert_eq!(tooltip(&ds.regions[2], None), "Queensland (QLD): N/A [Per 10,000]");
        assert_eq!(tooltip(&ds.regions[3], Some(3.0)), "Jervis Bay (?): 3.00 [Per 10,000]");
    }

    #[test]
    fn unnamed_region_tooltip() {
        let unnamed = Region {
            name: None,
            ..region("", None, 154.0)
        };
        assert_eq!(tooltip(&unnamed, None), "Unknown (?): N/A [Per 10,000]");
    }

    #[test]
    fn focus_dims_others_and_darkens_focused() {
        let ds = dataset();
        let mut s = state();
        s.focused = Some("NSW".into());
        let focused = region_style(0, &ds.regions[0], Some(120.0), &s, &scale());
        let other = region_style(1, &ds.regions[1], Some(80.0), &s, &scale());

        assert_eq!(focused.opacity, 1.0);
        assert_eq!(focused.stroke, FOCUS_STROKE);
        assert!(focused.stroke_width > other.stroke_width);
        assert!(luminance(focused.fill) < luminance(scale().color(120.0)));
        assert_eq!(other.opacity, DIMMED_OPACITY);
        assert_eq!(other.fill, scale().color(80.0));
    }

    #[test]
    fn hover_darkens_and_restores_opacity() {
        let ds = dataset();
        let mut s = state();
        s.focused = Some("NSW".into());
        s.hover = Some(Hover {
            index: 1,
            name: Some("Victoria".into()),
            code: Some("VIC".into()),
            value: 90.0,
        });
        let hovered = region_style(1, &ds.regions[1], Some(80.0), &s, &scale());
        assert_eq!(hovered.opacity, 1.0);
        assert_eq!(hovered.stroke, HOVER_STROKE);
        assert!(luminance(hovered.fill) < luminance(scale().color(80.0)));
    }

    #[test]
    fn svg_contains_scene_elements() {
        let ds = dataset();
        let s = state();
        let chart = Chart::fit(&ds, &s);
        let svg = chart.render(&ds, &s);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(r#"<path class="state""#).count(), 4);
        assert!(svg.contains(r#"id="rate-grad""#));
        assert!(svg.contains(r##"stop-color="#f7fbff""##));
        assert!(svg.contains(r##"stop-color="#08306b""##));
        assert!(svg.contains(r#"class="legend-indicator""#));
        assert!(svg.contains(r#"opacity="0"/></g>"#));
        assert!(svg.contains(">Hover over states</text>"));
        assert!(svg.contains("translate(5,5) translate(195,145) scale(1)"));
    }

    #[test]
    fn indicator_tracks_hover_value() {
        let ds = dataset();
        let mut s = state();
        s.hover = Some(Hover {
            index: 0,
            name: Some("New South Wales".into()),
            code: Some("NSW".into()),
            value: 100.0,
        });
        let svg = Chart::fit(&ds, &s).render(&ds, &s);
        assert!(svg.contains(r#"class="legend-indicator" x1="60" x2="60""#));
        assert!(svg.contains("New South Wales (NSW): 100.00 per 10,000"));
    }

    #[test]
    fn error_block_is_escaped() {
        let html = render_error("bad <data> & worse");
        assert!(html.contains("bad &lt;data&gt; &amp; worse"));
        assert!(html.contains("#d62728"));
    }
}
