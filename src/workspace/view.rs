// Diagram view selection and pan/zoom transform

use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 0.05;
pub const MAX_SCALE: f64 = 8.0;
/// Exponent step of one zoom-in / zoom-out click
pub const ZOOM_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Diagram,
    Code,
    Patterns,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Diagram => "diagram",
            View::Code => "code",
            View::Patterns => "patterns",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "diagram" => Ok(View::Diagram),
            "code" => Ok(View::Code),
            "patterns" => Ok(View::Patterns),
            _ => Err(format!(
                "Unknown view: '{}'. Expected one of: diagram, code, patterns",
                s
            )),
        }
    }
}

/// What the main area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// An analysis is in flight
    Loading,
    /// No artifact yet ("No architecture yet")
    Empty,
    Content(View),
}

impl Panel {
    pub fn resolve(submitting: bool, has_artifact: bool, view: View) -> Self {
        if submitting {
            Panel::Loading
        } else if !has_artifact {
            Panel::Empty
        } else {
            Panel::Content(view)
        }
    }

    /// Whether the diagram surface is on screen
    pub fn shows_surface(&self) -> bool {
        matches!(self, Panel::Content(View::Diagram))
    }
}

/// Pan/zoom transform of the diagram canvas. Offsets are relative to the
/// view centre, so zooming scales them with the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanZoom {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for PanZoom {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl PanZoom {
    /// Drag by a pointer delta. Panning is unbounded, but offsets stay finite.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let (x, y) = (self.offset_x + dx, self.offset_y + dy);
        if !(x.is_finite() && y.is_finite()) {
            log::debug!("Ignoring non-finite pan ({}, {})", dx, dy);
            return;
        }
        self.offset_x = x;
        self.offset_y = y;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-ZOOM_STEP);
    }

    /// Multiply the scale by `e^step` around the view centre
    pub fn zoom_by(&mut self, step: f64) {
        if !step.is_finite() {
            log::debug!("Ignoring non-finite zoom step {}", step);
            return;
        }
        let next = (self.scale * step.exp()).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = next / self.scale;
        self.offset_x *= ratio;
        self.offset_y *= ratio;
        self.scale = next;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Active view plus canvas transform
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiagramViewState {
    view: View,
    transform: PanZoom,
}

impl DiagramViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn transform(&self) -> PanZoom {
        self.transform
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn transform_mut(&mut self) -> &mut PanZoom {
        &mut self.transform
    }

    /// A new artifact always starts at identity on the diagram view
    pub fn on_artifact_accepted(&mut self) {
        self.transform.reset();
        self.view = View::Diagram;
    }
}
