use crate::config::{AppConfig, DocsConfig};
use crate::data;
use crate::debounce::{Debouncer, RESIZE_DEBOUNCE};
use crate::docs::{DocsEvent, DocsSession};
use crate::render::{render_error, Chart};
use crate::types::Dataset;
use crate::view::{self, region_label, HoverTarget, Layout, MapEvent, Redraw, ViewState, YearSelector};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Pointer-level input as sent by the page. Coordinates are canvas pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    SelectYear { year: i32 },
    PointerMove { x: f64, y: f64 },
    PointerLeave,
    Click { x: f64, y: f64 },
    ZoomIn,
    ZoomOut,
    Resize { width: Option<f64>, height: Option<f64> },
}

/// The loaded dataset with its current view and drawing.
pub struct MapSession {
    dataset: Arc<Dataset>,
    years: YearSelector,
    state: ViewState,
    chart: Chart,
    svg: String,
}

impl MapSession {
    pub fn new(dataset: Dataset, layout: Layout) -> Self {
        let years = YearSelector::from_dataset(&dataset);
        let state = ViewState::initial(&dataset, layout);
        let chart = Chart::fit(&dataset, &state);
        let svg = chart.render(&dataset, &state);
        Self {
            dataset: Arc::new(dataset),
            years,
            state,
            chart,
            svg,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn years(&self) -> &[i32] {
        self.years.options()
    }

    pub fn apply(&mut self, event: &MapEvent) -> Redraw {
        let (next, redraw) = view::update(self.state.clone(), event, &self.dataset);
        self.state = next;
        match redraw {
            Redraw::None => {}
            Redraw::Full => {
                self.chart = Chart::fit(&self.dataset, &self.state);
                self.svg = self.chart.render(&self.dataset, &self.state);
            }
            Redraw::Styles | Redraw::Transform => {
                self.svg = self.chart.render(&self.dataset, &self.state);
            }
        }
        redraw
    }

    /// Translates pointer input into a view event by hit testing the
    /// current drawing. `None` means nothing to do.
    pub fn resolve(&self, event: &PointerEvent) -> Option<MapEvent> {
        match *event {
            PointerEvent::SelectYear { year } => Some(MapEvent::SelectYear { year }),
            PointerEvent::PointerMove { x, y } => {
                let (cx, cy) = self.state.layout.to_chart_space(x, y, self.state.zoom);
                match self.hit(cx, cy) {
                    Some(target) => Some(MapEvent::Hover {
                        target,
                        pointer_x: cx,
                    }),
                    None if self.state.hover.is_some() => Some(MapEvent::MouseOut),
                    None => None,
                }
            }
            PointerEvent::PointerLeave => Some(MapEvent::MouseOut),
            PointerEvent::Click { x, y } => {
                let (cx, cy) = self.state.layout.to_chart_space(x, y, self.state.zoom);
                self.hit(cx, cy)
                    .map(|target| MapEvent::Click { code: target.code })
            }
            PointerEvent::ZoomIn => Some(MapEvent::ZoomIn),
            PointerEvent::ZoomOut => Some(MapEvent::ZoomOut),
            PointerEvent::Resize { width, height } => Some(MapEvent::Resize { width, height }),
        }
    }

    fn hit(&self, x: f64, y: f64) -> Option<HoverTarget> {
        let index = self.chart.hits.locate(x, y)?;
        let region = self.dataset.regions.get(index)?;
        let bounds = self.chart.hits.bounds(index)?;
        Some(HoverTarget {
            index,
            name: region.name.clone(),
            code: region.code.map(String::from),
            span: (bounds.min().x, bounds.max().x),
        })
    }
}

pub enum MapStatus {
    Ready(MapSession),
    Failed(String),
}

impl MapStatus {
    pub fn from_load(result: Result<Dataset>, layout: Layout) -> Self {
        match result {
            Ok(dataset) => MapStatus::Ready(MapSession::new(dataset, layout)),
            Err(err) => {
                error!(error = %format!("{:#}", err), "choropleth data failed to load");
                MapStatus::Failed(data::load_error_message(&err))
            }
        }
    }
}

pub struct AppState {
    pub map: Mutex<MapStatus>,
    pub docs: Mutex<DocsSession>,
    resize: Mutex<Debouncer>,
}

impl AppState {
    pub fn new(map: MapStatus, docs: &DocsConfig) -> Arc<Self> {
        Arc::new(Self {
            map: Mutex::new(map),
            docs: Mutex::new(DocsSession::new(docs.panels.clone(), docs.scroll_threshold)),
            resize: Mutex::new(Debouncer::new(RESIZE_DEBOUNCE)),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub redraw: Redraw,
    pub year: Option<i32>,
    pub focused: Option<String>,
    pub zoom: f64,
    pub hover_text: String,
    pub svg: Option<String>,
}

impl FrameResponse {
    fn new(session: &MapSession, redraw: Redraw) -> Self {
        let state = session.state();
        Self {
            redraw,
            year: state.year,
            focused: state.focused.clone(),
            zoom: state.zoom,
            hover_text: state.hover_text(),
            svg: (redraw != Redraw::None).then(|| session.svg().to_string()),
        }
    }
}

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/years", get(years_handler))
        .route("/map.svg", get(map_svg_handler))
        .route("/api/map/events", post(map_event_handler))
        .route("/api/docs/events", post(docs_event_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: &AppConfig, map: MapStatus) -> Result<()> {
    let state = AppState::new(map, &config.docs);
    let app = router(state, &config.server.static_dir);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn unavailable(message: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": message })),
    )
        .into_response()
}

async fn years_handler(State(state): State<Arc<AppState>>) -> Response {
    match &*state.map.lock().await {
        MapStatus::Ready(session) => Json(json!({
            "years": session.years(),
            "selected": session.state().year,
        }))
        .into_response(),
        MapStatus::Failed(message) => unavailable(message),
    }
}

async fn map_svg_handler(State(state): State<Arc<AppState>>) -> Response {
    match &*state.map.lock().await {
        MapStatus::Ready(session) => (
            [(header::CONTENT_TYPE, "image/svg+xml")],
            session.svg().to_string(),
        )
            .into_response(),
        MapStatus::Failed(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            render_error(message),
        )
            .into_response(),
    }
}

async fn map_event_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PointerEvent>,
) -> Response {
    if let PointerEvent::Resize { width, height } = event {
        if let MapStatus::Failed(message) = &*state.map.lock().await {
            return unavailable(message);
        }
        let target = state.clone();
        state.resize.lock().await.call(async move {
            if let MapStatus::Ready(session) = &mut *target.map.lock().await {
                session.apply(&MapEvent::Resize { width, height });
                info!(
                    width = session.state().layout.width,
                    height = session.state().layout.height,
                    "redrew map after resize"
                );
            }
        });
        return (StatusCode::ACCEPTED, Json(json!({ "scheduled": true }))).into_response();
    }

    let mut map = state.map.lock().await;
    let session = match &mut *map {
        MapStatus::Ready(session) => session,
        MapStatus::Failed(message) => return unavailable(message),
    };

    let redraw = match session.resolve(&event) {
        Some(map_event) => {
            if let MapEvent::Click { code: Some(code) } = &map_event {
                info!(region = %region_label(code), "region clicked");
            }
            session.apply(&map_event)
        }
        None => Redraw::None,
    };
    Json(FrameResponse::new(session, redraw)).into_response()
}

async fn docs_event_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<DocsEvent>,
) -> Response {
    let frame = state.docs.lock().await.handle(&event);
    Json(frame).into_response()
}
