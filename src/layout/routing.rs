use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::{LayoutConfig, RoutingConfig};
use crate::ir::{Connector, Node};

use super::geometry::{
    Point, Rect, Segment, crossings_with_existing, distance, path_segments,
    polyline_intersects_rect,
};
use super::types::{CollisionCount, ResolutionMode};

// ── Edge side selection ──────────────────────────────────────────────
/// Tie-break order when the center ray leaves exactly through a corner.
const EDGE_PRIORITY: [EdgeSide; 4] = [EdgeSide::Right, EdgeSide::Left, EdgeSide::Bottom, EdgeSide::Top];
/// Tolerance for ray/side intersection tests.
const RAY_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EdgeSide {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeSide::Left => "left",
            EdgeSide::Right => "right",
            EdgeSide::Top => "top",
            EdgeSide::Bottom => "bottom",
        }
    }

    /// Sign of the outward normal along the axis the side faces.
    fn outward_sign(self) -> f32 {
        match self {
            EdgeSide::Right | EdgeSide::Bottom => 1.0,
            EdgeSide::Left | EdgeSide::Top => -1.0,
        }
    }

    fn transposed(self) -> EdgeSide {
        match self {
            EdgeSide::Left => EdgeSide::Top,
            EdgeSide::Right => EdgeSide::Bottom,
            EdgeSide::Top => EdgeSide::Left,
            EdgeSide::Bottom => EdgeSide::Right,
        }
    }
}

/// Left and right sides are vertical lines; connectors leave them horizontally.
pub fn side_is_vertical(side: EdgeSide) -> bool {
    matches!(side, EdgeSide::Left | EdgeSide::Right)
}

/// The side of `from` through which the ray from its center toward `to`'s
/// center exits.
pub fn select_edge(from: &Node, to: &Node) -> EdgeSide {
    let (cx, cy) = from.center();
    let (tx, ty) = to.center();
    let (dx, dy) = (tx - cx, ty - cy);
    let half_w = from.width / 2.0;
    let half_h = from.height / 2.0;

    let mut best: Option<(EdgeSide, f32)> = None;
    for side in EDGE_PRIORITY {
        let Some(t) = ray_side_intersection(dx, dy, half_w, half_h, side) else {
            continue;
        };
        if best.is_none_or(|(_, best_t)| t < best_t - RAY_EPS) {
            best = Some((side, t));
        }
    }
    best.map(|(side, _)| side).unwrap_or(EDGE_PRIORITY[0])
}

/// Ray parameter at which `(dx, dy)` from the rectangle's center meets the
/// supporting line of `side`, if the hit lies within the side's extent.
fn ray_side_intersection(dx: f32, dy: f32, half_w: f32, half_h: f32, side: EdgeSide) -> Option<f32> {
    let (t, along, extent) = match side {
        EdgeSide::Right if dx > RAY_EPS => {
            let t = half_w / dx;
            (t, dy * t, half_h)
        }
        EdgeSide::Left if dx < -RAY_EPS => {
            let t = -half_w / dx;
            (t, dy * t, half_h)
        }
        EdgeSide::Bottom if dy > RAY_EPS => {
            let t = half_h / dy;
            (t, dx * t, half_w)
        }
        EdgeSide::Top if dy < -RAY_EPS => {
            let t = -half_h / dy;
            (t, dx * t, half_w)
        }
        _ => return None,
    };
    (along.abs() <= extent + RAY_EPS).then_some(t)
}

// ── Connection point allocation ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EdgeAttachment<'a> {
    pub connector_id: &'a str,
    /// Coordinate of the other endpoint's center along the side's axis.
    pub other_pos: f32,
    pub node_is_destination: bool,
}

pub struct RouteContext<'a> {
    pub nodes: &'a BTreeMap<String, Node>,
    pub connectors: &'a [Connector],
    pub config: &'a LayoutConfig,
    /// Precomputed first-pass paths keyed by connector id.
    pub first_pass: Option<&'a HashMap<String, Vec<Point>>>,
}

impl<'a> RouteContext<'a> {
    pub fn new(
        nodes: &'a BTreeMap<String, Node>,
        connectors: &'a [Connector],
        config: &'a LayoutConfig,
    ) -> Self {
        Self {
            nodes,
            connectors,
            config,
            first_pass: None,
        }
    }
}

/// Every connector touching `node` on `side`, in allocation order.
pub fn edge_attachments<'a>(
    node: &Node,
    side: EdgeSide,
    connector: &'a Connector,
    ctx: &RouteContext<'a>,
) -> Vec<EdgeAttachment<'a>> {
    let axis = |point: Point| if side_is_vertical(side) { point.1 } else { point.0 };
    let listed = ctx.connectors.iter().any(|other| other.id == connector.id);
    let extra = (!listed).then_some(connector);

    let mut attachments = Vec::new();
    for candidate in ctx.connectors.iter().chain(extra) {
        let Some((source, destination)) = candidate.endpoints(ctx.nodes) else {
            continue;
        };
        if source.id == node.id && select_edge(source, destination) == side {
            attachments.push(EdgeAttachment {
                connector_id: candidate.id.as_str(),
                other_pos: axis(destination.center()),
                node_is_destination: false,
            });
        } else if destination.id == node.id && select_edge(destination, source) == side {
            attachments.push(EdgeAttachment {
                connector_id: candidate.id.as_str(),
                other_pos: axis(source.center()),
                node_is_destination: true,
            });
        }
    }
    sort_attachments(&mut attachments, ctx.config.routing.sort_tolerance);
    attachments
}

/// Orders attachments by the other endpoint's position. Positions within
/// `tolerance` of a cluster's first entry tie; inside a tie incoming
/// connectors come before outgoing ones.
fn sort_attachments(attachments: &mut [EdgeAttachment<'_>], tolerance: f32) {
    attachments.sort_by(|a, b| {
        a.other_pos
            .total_cmp(&b.other_pos)
            .then_with(|| a.connector_id.cmp(b.connector_id))
    });
    let mut clusters = Vec::with_capacity(attachments.len());
    let mut cluster = 0usize;
    let mut cluster_start = attachments.first().map(|a| a.other_pos).unwrap_or(0.0);
    for attachment in attachments.iter() {
        if attachment.other_pos - cluster_start > tolerance {
            cluster += 1;
            cluster_start = attachment.other_pos;
        }
        clusters.push(cluster);
    }
    let mut keyed: Vec<(usize, EdgeAttachment<'_>)> =
        clusters.into_iter().zip(attachments.iter().cloned()).collect();
    keyed.sort_by(|(ca, a), (cb, b)| {
        ca.cmp(cb)
            .then_with(|| b.node_is_destination.cmp(&a.node_is_destination))
            .then_with(|| a.other_pos.total_cmp(&b.other_pos))
            .then_with(|| a.connector_id.cmp(b.connector_id))
    });
    for (slot, (_, attachment)) in attachments.iter_mut().zip(keyed) {
        *slot = attachment;
    }
}

/// Fraction along `side` for the `index`-th of `count` attachments.
pub fn spread_fraction(index: usize, count: usize, side: EdgeSide, config: &RoutingConfig) -> f32 {
    let start = config.edge_spread_start;
    let end = config.edge_spread_end;
    let fraction = if count <= 1 {
        (start + end) / 2.0
    } else {
        start + (end - start) * index as f32 / (count - 1) as f32
    };
    match side {
        EdgeSide::Top | EdgeSide::Left => fraction,
        EdgeSide::Bottom | EdgeSide::Right => 1.0 - fraction,
    }
}

pub fn point_on_side(node: &Node, side: EdgeSide, fraction: f32) -> Point {
    match side {
        EdgeSide::Top => (node.x + node.width * fraction, node.y),
        EdgeSide::Bottom => (node.x + node.width * fraction, node.y + node.height),
        EdgeSide::Left => (node.x, node.y + node.height * fraction),
        EdgeSide::Right => (node.x + node.width, node.y + node.height * fraction),
    }
}

/// Boundary point on `side` of `node` for `connector`, spread among its siblings.
pub fn allocate_connection_point(
    node: &Node,
    side: EdgeSide,
    connector: &Connector,
    ctx: &RouteContext<'_>,
) -> Point {
    let attachments = edge_attachments(node, side, connector, ctx);
    let index = attachments
        .iter()
        .position(|attachment| attachment.connector_id == connector.id)
        .unwrap_or(0);
    let count = attachments.len().max(1);
    point_on_side(node, side, spread_fraction(index, count, side, &ctx.config.routing))
}

// ── Path building ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEnds {
    pub source: Point,
    pub source_side: EdgeSide,
    pub destination: Point,
    pub destination_side: EdgeSide,
}

impl PathEnds {
    fn transposed(&self) -> PathEnds {
        PathEnds {
            source: transpose(self.source),
            source_side: self.source_side.transposed(),
            destination: transpose(self.destination),
            destination_side: self.destination_side.transposed(),
        }
    }
}

fn transpose(point: Point) -> Point {
    (point.1, point.0)
}

/// Distance a connector must travel away from its source before turning.
pub fn min_travel(source: Point, destination: Point, config: &RoutingConfig) -> f32 {
    let dist = distance(source, destination);
    let scaled = if dist.is_finite() { dist * config.min_travel_ratio } else { 0.0 };
    scaled.max(config.min_travel_floor)
}

/// Four-point orthogonal path: travel out of the source side, turn once to
/// line up with the destination, then run straight into it.
pub fn build_orthogonal_path(ends: &PathEnds, travel: f32) -> Vec<Point> {
    let (sx, sy) = ends.source;
    let (dx, dy) = ends.destination;
    let sign = ends.source_side.outward_sign();
    if side_is_vertical(ends.source_side) {
        let corner1 = (sx + sign * travel, sy);
        let corner2 = (corner1.0, dy);
        vec![ends.source, corner1, corner2, ends.destination]
    } else {
        let corner1 = (sx, sy + sign * travel);
        let corner2 = (dx, corner1.1);
        vec![ends.source, corner1, corner2, ends.destination]
    }
}

/// Detour through `lane`, a coordinate on the axis perpendicular to the
/// source's exit direction. The first leg still travels `travel` units.
pub fn build_detour_path(ends: &PathEnds, travel: f32, lane: f32) -> Vec<Point> {
    if !side_is_vertical(ends.source_side) {
        return build_detour_path(&ends.transposed(), travel, lane)
            .into_iter()
            .map(transpose)
            .collect();
    }
    let (sx, sy) = ends.source;
    let (dx, dy) = ends.destination;
    let exit = (sx + ends.source_side.outward_sign() * travel, sy);
    let mut points = vec![ends.source, exit, (exit.0, lane)];
    if side_is_vertical(ends.destination_side) {
        let stub = (dx + ends.destination_side.outward_sign() * travel, dy);
        points.push((stub.0, lane));
        points.push(stub);
    } else {
        points.push((dx, lane));
    }
    points.push(ends.destination);
    points
}

// ── Collision resolution ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteCandidate {
    /// Plain four-point path with the travel scaled by the given factor.
    Direct { travel_scale: f32 },
    /// Detour `step` base travels beyond the endpoints, on the low (`far == false`)
    /// or high coordinate side.
    Lane { step: usize, far: bool },
}

/// 1×; then for each step k: (k+1)× direct, near lane k, far lane k.
pub fn retry_schedule(steps: usize) -> Vec<RouteCandidate> {
    let mut schedule = vec![RouteCandidate::Direct { travel_scale: 1.0 }];
    for step in 1..=steps {
        schedule.push(RouteCandidate::Direct {
            travel_scale: (step + 1) as f32,
        });
        schedule.push(RouteCandidate::Lane { step, far: false });
        schedule.push(RouteCandidate::Lane { step, far: true });
    }
    schedule
}

impl RouteCandidate {
    pub fn build(&self, ends: &PathEnds, base_travel: f32) -> Vec<Point> {
        match *self {
            RouteCandidate::Direct { travel_scale } => {
                build_orthogonal_path(ends, base_travel * travel_scale)
            }
            RouteCandidate::Lane { step, far } => {
                let perpendicular = |point: Point| {
                    if side_is_vertical(ends.source_side) { point.1 } else { point.0 }
                };
                let s = perpendicular(ends.source);
                let d = perpendicular(ends.destination);
                let offset = base_travel * step as f32;
                let lane = if far { s.max(d) + offset } else { s.min(d) - offset };
                build_detour_path(ends, base_travel, lane)
            }
        }
    }
}

/// Inset applied to the connector's own boxes so the connection points on
/// their borders never register as a hit.
const ENDPOINT_INSET: f32 = 1.0;

#[derive(Debug, Clone, Default)]
pub struct RouteObstacles {
    pub nodes: Vec<Rect>,
    /// Interiors of the connector's own source and destination boxes.
    pub endpoints: Vec<Rect>,
    pub segments: Vec<Segment>,
}

impl RouteObstacles {
    /// Node rectangles other than the connector's own endpoints, the inset
    /// interiors of those endpoints, plus the given connector paths.
    pub fn for_connector<'p>(
        connector: &Connector,
        nodes: &BTreeMap<String, Node>,
        other_paths: impl IntoIterator<Item = &'p [Point]>,
    ) -> Self {
        let is_endpoint =
            |node: &Node| node.id == connector.source || node.id == connector.destination;
        let endpoints = nodes
            .values()
            .filter(|node| is_endpoint(node))
            .filter_map(|node| endpoint_interior(&Rect::from_node(node)))
            .collect();
        let nodes = nodes
            .values()
            .filter(|node| !is_endpoint(node))
            .map(Rect::from_node)
            .collect();
        let segments = other_paths.into_iter().flat_map(path_segments).collect();
        Self {
            nodes,
            endpoints,
            segments,
        }
    }
}

/// `rect` shrunk by [`ENDPOINT_INSET`], or `None` when nothing is left.
pub fn endpoint_interior(rect: &Rect) -> Option<Rect> {
    (rect.width > ENDPOINT_INSET * 2.0 && rect.height > ENDPOINT_INSET * 2.0)
        .then(|| rect.inflate(-ENDPOINT_INSET))
}

/// Node hits include passes through the interior of the connector's own
/// boxes; running along their borders does not count.
pub fn count_collisions(points: &[Point], obstacles: &RouteObstacles) -> CollisionCount {
    CollisionCount {
        nodes: obstacles
            .nodes
            .iter()
            .chain(&obstacles.endpoints)
            .filter(|rect| polyline_intersects_rect(points, rect))
            .count(),
        connectors: crossings_with_existing(points, &obstacles.segments),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub points: Vec<Point>,
    pub collisions: CollisionCount,
    /// Index into the retry schedule of the chosen candidate.
    pub attempt: usize,
}

/// Walks the retry schedule and returns the first collision-free path, or
/// the candidate with the fewest collisions.
pub fn resolve_collisions(
    ends: &PathEnds,
    base_travel: f32,
    obstacles: &RouteObstacles,
    steps: usize,
) -> ResolvedPath {
    let mut best: Option<ResolvedPath> = None;
    for (attempt, candidate) in retry_schedule(steps).into_iter().enumerate() {
        let points = candidate.build(ends, base_travel);
        let collisions = count_collisions(&points, obstacles);
        let resolved = ResolvedPath {
            points,
            collisions,
            attempt,
        };
        if collisions.is_clear() {
            return resolved;
        }
        let better = best.as_ref().is_none_or(|current| {
            (collisions.total(), collisions.nodes)
                < (current.collisions.total(), current.collisions.nodes)
        });
        if better {
            best = Some(resolved);
        }
    }
    let best = best.unwrap_or_else(|| ResolvedPath {
        points: build_orthogonal_path(ends, base_travel),
        collisions: CollisionCount::default(),
        attempt: 0,
    });
    tracing::debug!(
        attempt = best.attempt,
        nodes = best.collisions.nodes,
        connectors = best.collisions.connectors,
        "no collision-free route, keeping least-bad candidate"
    );
    best
}

// ── Per-connector routing ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedConnector {
    pub source_side: EdgeSide,
    pub destination_side: EdgeSide,
    pub points: Vec<Point>,
    /// Not evaluated for `SkipNestedResolve` routes.
    pub collisions: CollisionCount,
}

/// Edge selection, allocation, path building and, for `FullResolve`,
/// collision resolution against the first-pass paths of every other
/// connector. `None` when an endpoint is missing or the connector loops.
pub fn route_connector(
    connector: &Connector,
    ctx: &RouteContext<'_>,
    mode: ResolutionMode,
) -> Option<RoutedConnector> {
    let (source, destination) = connector.endpoints(ctx.nodes)?;
    let source_side = select_edge(source, destination);
    let destination_side = select_edge(destination, source);
    let ends = PathEnds {
        source: allocate_connection_point(source, source_side, connector, ctx),
        source_side,
        destination: allocate_connection_point(destination, destination_side, connector, ctx),
        destination_side,
    };
    let routing = &ctx.config.routing;
    let base_travel = min_travel(ends.source, ends.destination, routing);

    let (points, collisions) = match mode {
        ResolutionMode::SkipNestedResolve => {
            (build_orthogonal_path(&ends, base_travel), CollisionCount::default())
        }
        ResolutionMode::FullResolve => {
            let computed: Vec<Vec<Point>>;
            let other_paths: Vec<&[Point]> = match ctx.first_pass {
                Some(first_pass) => ctx
                    .connectors
                    .iter()
                    .filter(|other| other.id != connector.id)
                    .filter_map(|other| first_pass.get(&other.id).map(Vec::as_slice))
                    .collect(),
                None => {
                    computed = ctx
                        .connectors
                        .iter()
                        .filter(|other| other.id != connector.id)
                        .filter_map(|other| {
                            route_connector(other, ctx, ResolutionMode::SkipNestedResolve)
                        })
                        .map(|routed| routed.points)
                        .collect();
                    computed.iter().map(Vec::as_slice).collect()
                }
            };
            let obstacles = RouteObstacles::for_connector(connector, ctx.nodes, other_paths);
            let resolved =
                resolve_collisions(&ends, base_travel, &obstacles, routing.collision_retry_steps);
            (resolved.points, resolved.collisions)
        }
    };

    Some(RoutedConnector {
        source_side,
        destination_side,
        points,
        collisions,
    })
}

/// First-pass (unresolved) paths for every renderable connector.
pub fn first_pass_paths(ctx: &RouteContext<'_>) -> HashMap<String, Vec<Point>> {
    ctx.connectors
        .iter()
        .filter_map(|connector| {
            route_connector(connector, ctx, ResolutionMode::SkipNestedResolve)
                .map(|routed| (connector.id.clone(), routed.points))
        })
        .collect()
}
