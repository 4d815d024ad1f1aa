use serde::Serialize;

use super::geometry::{Point, Rect};
use super::routing::EdgeSide;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// Whether collision checking may resolve other connectors recursively.
///
/// Collision checks always look at other connectors through
/// `SkipNestedResolve`, which yields their first-pass path, so resolving one
/// connector never recurses into resolving another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    FullResolve,
    SkipNestedResolve,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollisionCount {
    pub nodes: usize,
    pub connectors: usize,
}

impl CollisionCount {
    pub fn total(&self) -> usize {
        self.nodes + self.connectors
    }

    pub fn is_clear(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    pub position: Point,
    pub rect: Rect,
    /// Arc-length fraction of the path the label center was taken from.
    pub fraction: f32,
    pub score: f32,
    pub text: TextBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorLayout {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub source_side: Option<EdgeSide>,
    pub destination_side: Option<EdgeSide>,
    /// Empty when the connector cannot be rendered.
    pub points: Vec<Point>,
    pub label: Option<LabelLayout>,
    pub collisions: CollisionCount,
}

impl ConnectorLayout {
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneLayout {
    pub connectors: Vec<ConnectorLayout>,
    /// Bounds of nodes, paths and labels as `(min_x, min_y, max_x, max_y)`.
    pub bounds: Option<(f32, f32, f32, f32)>,
}

impl SceneLayout {
    pub fn connector(&self, id: &str) -> Option<&ConnectorLayout> {
        self.connectors.iter().find(|connector| connector.id == id)
    }
}
