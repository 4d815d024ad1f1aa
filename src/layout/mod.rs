pub mod geometry;
pub mod label_placement;
pub mod routing;
pub(crate) mod text;
pub(crate) mod types;
pub use types::*;

use geometry::{Point, Rect};
use label_placement::{LabelObstacles, place_label};
use routing::{RouteContext, first_pass_paths, route_connector};
use text::measure_label;

use crate::config::LayoutConfig;
use crate::ir::{Connector, Node, Scene};
use crate::theme::Theme;
use std::collections::BTreeMap;

/// Route one connector against a snapshot of the whole diagram.
///
/// Never fails: a connector whose endpoints are missing (or identical) comes
/// back with an empty path and no label, which callers treat as "do not draw".
/// Other connectors are seen through their first-pass paths. The label only
/// avoids nodes and those paths; use [`compute_connector_path_with_labels`]
/// to also keep it clear of labels the caller has already placed.
pub fn compute_connector_path(
    connector: &Connector,
    nodes: &BTreeMap<String, Node>,
    connectors: &[Connector],
    theme: &Theme,
    config: &LayoutConfig,
) -> ConnectorLayout {
    compute_connector_path_with_labels(connector, nodes, connectors, &[], theme, config)
}

/// [`compute_connector_path`] whose label also avoids `placed_labels`.
pub fn compute_connector_path_with_labels(
    connector: &Connector,
    nodes: &BTreeMap<String, Node>,
    connectors: &[Connector],
    placed_labels: &[Rect],
    theme: &Theme,
    config: &LayoutConfig,
) -> ConnectorLayout {
    let ctx = RouteContext::new(nodes, connectors, config);
    let Some(routed) = route_connector(connector, &ctx, ResolutionMode::FullResolve) else {
        return unrenderable(connector);
    };
    let others: Vec<Vec<Point>> = connectors
        .iter()
        .filter(|other| other.id != connector.id)
        .filter_map(|other| route_connector(other, &ctx, ResolutionMode::SkipNestedResolve))
        .map(|other| other.points)
        .collect();
    let obstacles = LabelObstacles {
        nodes: nodes.values().map(Rect::from_node).collect(),
        paths: others.iter().map(Vec::as_slice).collect(),
        labels: placed_labels.to_vec(),
    };
    let label = layout_label(connector, &routed.points, &obstacles, theme, config);
    ConnectorLayout {
        id: connector.id.clone(),
        source: connector.source.clone(),
        destination: connector.destination.clone(),
        source_side: Some(routed.source_side),
        destination_side: Some(routed.destination_side),
        points: routed.points,
        label,
        collisions: routed.collisions,
    }
}

/// Route every connector of `scene`, then place labels in connector order so
/// later labels avoid earlier ones.
pub fn compute_scene_layout(scene: &Scene, theme: &Theme, config: &LayoutConfig) -> SceneLayout {
    let base = RouteContext::new(&scene.nodes, &scene.connectors, config);
    let first_pass = first_pass_paths(&base);
    let ctx = RouteContext {
        first_pass: Some(&first_pass),
        ..base
    };

    let mut connectors: Vec<ConnectorLayout> = scene
        .connectors
        .iter()
        .map(|connector| match route_connector(connector, &ctx, ResolutionMode::FullResolve) {
            Some(routed) => ConnectorLayout {
                id: connector.id.clone(),
                source: connector.source.clone(),
                destination: connector.destination.clone(),
                source_side: Some(routed.source_side),
                destination_side: Some(routed.destination_side),
                points: routed.points,
                label: None,
                collisions: routed.collisions,
            },
            None => unrenderable(connector),
        })
        .collect();

    let node_rects: Vec<Rect> = scene.nodes.values().map(Rect::from_node).collect();
    let mut placed: Vec<Rect> = Vec::new();
    for idx in 0..connectors.len() {
        if !connectors[idx].is_renderable() {
            continue;
        }
        let obstacles = LabelObstacles {
            nodes: node_rects.clone(),
            paths: connectors
                .iter()
                .enumerate()
                .filter(|(other, layout)| *other != idx && layout.is_renderable())
                .map(|(_, layout)| layout.points.as_slice())
                .collect(),
            labels: placed.clone(),
        };
        let label = layout_label(
            &scene.connectors[idx],
            &connectors[idx].points,
            &obstacles,
            theme,
            config,
        );
        if let Some(label) = &label
            && !label.text.lines.is_empty()
        {
            placed.push(label.rect);
        }
        connectors[idx].label = label;
    }

    let bounds = layout_bounds(scene, &connectors);
    SceneLayout { connectors, bounds }
}

fn layout_label(
    connector: &Connector,
    points: &[Point],
    obstacles: &LabelObstacles<'_>,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<LabelLayout> {
    let text = measure_label(&connector.label, theme, config);
    let size = if text.lines.is_empty() {
        (0.0, 0.0)
    } else {
        (
            text.width + config.labels.padding_x * 2.0,
            text.height + config.labels.padding_y * 2.0,
        )
    };
    let candidate = place_label(points, size, obstacles, &config.labels)?;
    Some(LabelLayout {
        position: candidate.position,
        rect: candidate.rect,
        fraction: candidate.fraction,
        score: candidate.score,
        text,
    })
}

fn unrenderable(connector: &Connector) -> ConnectorLayout {
    if connector.is_self_loop() {
        tracing::warn!(connector = %connector.id, "self-loop connectors are not routed");
    } else {
        tracing::warn!(
            connector = %connector.id,
            source = %connector.source,
            destination = %connector.destination,
            "connector references a missing node"
        );
    }
    ConnectorLayout {
        id: connector.id.clone(),
        source: connector.source.clone(),
        destination: connector.destination.clone(),
        source_side: None,
        destination_side: None,
        points: Vec::new(),
        label: None,
        collisions: CollisionCount::default(),
    }
}

fn layout_bounds(scene: &Scene, connectors: &[ConnectorLayout]) -> Option<(f32, f32, f32, f32)> {
    let mut bounds = scene.bounds();
    let mut include = |x: f32, y: f32| {
        bounds = Some(match bounds {
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
            None => (x, y, x, y),
        });
    };
    for connector in connectors {
        for &(x, y) in &connector.points {
            include(x, y);
        }
        if let Some(label) = &connector.label {
            include(label.rect.x, label.rect.y);
            include(label.rect.right(), label.rect.bottom());
        }
    }
    bounds
}

/// Id of the connector whose path or label lies under `point`, preferring labels.
pub fn hit_test(layout: &SceneLayout, point: Point, tolerance: f32) -> Option<&str> {
    let label_hit = layout.connectors.iter().rev().find(|connector| {
        connector
            .label
            .as_ref()
            .is_some_and(|label| !label.text.lines.is_empty() && label.rect.contains(point))
    });
    let path_hit = || {
        layout
            .connectors
            .iter()
            .rev()
            .filter(|connector| {
                connector.is_renderable()
                    && geometry::hit_test_path(point, &connector.points, tolerance)
            })
            .map(|connector| {
                (
                    connector,
                    geometry::point_polyline_distance(point, &connector.points),
                )
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(connector, _)| connector)
    };
    label_hit
        .or_else(path_hit)
        .map(|connector| connector.id.as_str())
}
