//! Documentation page controller: fragment-driven tabs and the
//! scroll-to-top button.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PANEL: &str = "overview";
pub const SCROLL_TOP_THRESHOLD: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocsEvent {
    LinkClicked { href: String },
    HashChanged { hash: Option<String> },
    Scrolled { y: f64 },
    ScrollTopClicked,
}

/// Side effects the page must carry out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocsEffect {
    PreventDefault,
    PushHistory { fragment: String },
    ScrollTo { top: f64, smooth: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabLink {
    pub href: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabView {
    pub active: String,
    pub links: Vec<TabLink>,
}

/// Exactly one panel is active at a time.
#[derive(Debug, Clone)]
pub struct TabController {
    panels: Vec<String>,
    active: String,
}

impl TabController {
    pub fn new(panels: Vec<String>, hash: Option<&str>) -> Self {
        let mut controller = Self {
            panels,
            active: DEFAULT_PANEL.to_string(),
        };
        controller.activate(&id_from_fragment(hash));
        controller
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    /// Unknown ids fall back to the overview panel.
    pub fn activate(&mut self, id: &str) {
        self.active = if self.panels.iter().any(|p| p == id) {
            id.to_string()
        } else {
            DEFAULT_PANEL.to_string()
        };
    }

    /// Links outside the navigation are left to the browser.
    pub fn on_link_click(&mut self, href: &str) -> Vec<DocsEffect> {
        let id = href.replace('#', "");
        if !self.panels.iter().any(|p| *p == id) {
            return Vec::new();
        }
        self.activate(&id);
        vec![
            DocsEffect::PreventDefault,
            DocsEffect::PushHistory {
                fragment: format!("#{}", id),
            },
        ]
    }

    pub fn on_hash_change(&mut self, hash: Option<&str>) {
        self.activate(&id_from_fragment(hash));
    }

    pub fn view(&self) -> TabView {
        TabView {
            active: self.active.clone(),
            links: self
                .panels
                .iter()
                .map(|p| TabLink {
                    href: format!("#{}", p),
                    selected: *p == self.active,
                })
                .collect(),
        }
    }
}

pub fn id_from_fragment(hash: Option<&str>) -> String {
    match hash.and_then(|h| h.strip_prefix('#')) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => DEFAULT_PANEL.to_string(),
    }
}

/// Floating button shown once the page is scrolled past `threshold`.
#[derive(Debug, Clone)]
pub struct ScrollTopControl {
    threshold: f64,
    visible: bool,
}

impl ScrollTopControl {
    pub fn new(threshold: f64, initial_y: f64) -> Self {
        let mut control = Self {
            threshold,
            visible: false,
        };
        control.on_scroll(initial_y);
        control
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Passive: never blocks scrolling. Returns whether visibility changed.
    pub fn on_scroll(&mut self, y: f64) -> bool {
        let visible = y > self.threshold;
        let changed = visible != self.visible;
        self.visible = visible;
        changed
    }

    pub fn on_click(&self) -> DocsEffect {
        DocsEffect::ScrollTo {
            top: 0.0,
            smooth: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocsFrame {
    pub effects: Vec<DocsEffect>,
    pub view: TabView,
    pub scroll_top_visible: bool,
}

#[derive(Debug, Clone)]
pub struct DocsSession {
    pub tabs: TabController,
    pub scroll: ScrollTopControl,
}

impl DocsSession {
    pub fn new(panels: Vec<String>, threshold: f64) -> Self {
        Self {
            tabs: TabController::new(panels, None),
            scroll: ScrollTopControl::new(threshold, 0.0),
        }
    }

    pub fn handle(&mut self, event: &DocsEvent) -> DocsFrame {
        let effects = match event {
            DocsEvent::LinkClicked { href } => self.tabs.on_link_click(href),
            DocsEvent::HashChanged { hash } => {
                self.tabs.on_hash_change(hash.as_deref());
                Vec::new()
            }
            DocsEvent::Scrolled { y } => {
                self.scroll.on_scroll(*y);
                Vec::new()
            }
            DocsEvent::ScrollTopClicked => vec![self.scroll.on_click()],
        };
        DocsFrame {
            effects,
            view: self.tabs.view(),
            scroll_top_visible: self.scroll.visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panels() -> Vec<String> {
        ["overview", "usage", "data"].map(String::from).to_vec()
    }

    #[test]
    fn fragment_selects_panel() {
        let tabs = TabController::new(panels(), Some("#usage"));
        assert_eq!(tabs.active(), "usage");
        let view = tabs.view();
        let selected: Vec<_> = view.links.iter().filter(|l| l.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].href, "#usage");
    }

    #[test]
    fn absent_or_unknown_fragment_shows_overview() {
        assert_eq!(TabController::new(panels(), None).active(), "overview");
        assert_eq!(TabController::new(panels(), Some("")).active(), "overview");
        assert_eq!(TabController::new(panels(), Some("#")).active(), "overview");
        assert_eq!(TabController::new(panels(), Some("#nope")).active(), "overview");
    }

    #[test]
    fn link_click_pushes_history() {
        let mut tabs = TabController::new(panels(), None);
        let effects = tabs.on_link_click("#data");
        assert_eq!(
            effects,
            vec![
                DocsEffect::PreventDefault,
                DocsEffect::PushHistory {
                    fragment: "#data".into()
                }
            ]
        );
        assert_eq!(tabs.active(), "data");

        assert!(tabs.on_link_click("https://example.com/").is_empty());
        assert_eq!(tabs.active(), "data");
    }

    #[test]
    fn back_navigation_reactivates() {
        let mut tabs = TabController::new(panels(), Some("#data"));
        tabs.on_hash_change(Some("#usage"));
        assert_eq!(tabs.active(), "usage");
        tabs.on_hash_change(None);
        assert_eq!(tabs.active(), "overview");
    }

    #[test]
    fn scroll_button_threshold() {
        let mut control = ScrollTopControl::new(SCROLL_TOP_THRESHOLD, 0.0);
        assert!(!control.visible());
        assert!(!control.on_scroll(300.0));
        assert!(control.on_scroll(301.0));
        assert!(control.visible());
        assert!(!control.on_scroll(900.0));
        assert!(control.on_scroll(10.0));
        assert!(!control.visible());

        assert!(ScrollTopControl::new(SCROLL_TOP_THRESHOLD, 450.0).visible());
    }

    #[test]
    fn scroll_button_click_scrolls_smoothly() {
        let mut session = DocsSession::new(panels(), SCROLL_TOP_THRESHOLD);
        let frame = session.handle(&DocsEvent::Scrolled { y: 1000.0 });
        assert!(frame.scroll_top_visible);
        assert!(frame.effects.is_empty());

        let frame = session.handle(&DocsEvent::ScrollTopClicked);
        assert_eq!(
            frame.effects,
            vec![DocsEffect::ScrollTo {
                top: 0.0,
                smooth: true
            }]
        );
    }
}
