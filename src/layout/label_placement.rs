// Label placement for connector labels: slide the label along the middle
// band of its path and keep the spot that overlaps the fewest obstacles.

use crate::config::LabelConfig;

use super::geometry::{Point, Rect, point_at_fraction, polyline_intersects_rect};

const FRACTION_EPS: f32 = 1e-4;

/// Everything a label should stay clear of.
#[derive(Debug, Clone, Default)]
pub struct LabelObstacles<'a> {
    pub nodes: Vec<Rect>,
    pub paths: Vec<&'a [Point]>,
    pub labels: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCandidate {
    pub fraction: f32,
    pub position: Point,
    pub rect: Rect,
    pub score: f32,
}

/// Arc-length fractions to try: the midpoint, then alternating below and
/// above it in `fraction_step` increments, clamped to the configured band.
pub fn candidate_fractions(config: &LabelConfig) -> Vec<f32> {
    let min = config.min_fraction.min(config.max_fraction);
    let max = config.max_fraction.max(config.min_fraction);
    let step = if config.fraction_step > FRACTION_EPS {
        config.fraction_step
    } else {
        0.05
    };
    let mut fractions = vec![0.5f32.clamp(min, max)];
    let mut push_unique = |fraction: f32| {
        let fraction = fraction.clamp(min, max);
        if fractions
            .iter()
            .all(|existing| (existing - fraction).abs() > FRACTION_EPS)
        {
            fractions.push(fraction);
        }
    };
    let mut k = 1;
    loop {
        let offset = step * k as f32;
        let below = 0.5 - offset;
        let above = 0.5 + offset;
        let below_in = below >= min - FRACTION_EPS;
        let above_in = above <= max + FRACTION_EPS;
        if !below_in && !above_in {
            break;
        }
        if below_in {
            push_unique(below);
        }
        if above_in {
            push_unique(above);
        }
        k += 1;
    }
    fractions
}

pub fn score_label_rect(rect: &Rect, obstacles: &LabelObstacles<'_>, config: &LabelConfig) -> f32 {
    let node_hits = obstacles.nodes.iter().filter(|node| node.overlaps(rect)).count();
    let path_hits = obstacles
        .paths
        .iter()
        .filter(|path| polyline_intersects_rect(path, rect))
        .count();
    let label_hits = obstacles.labels.iter().filter(|label| label.overlaps(rect)).count();
    node_hits as f32 * config.node_penalty + (path_hits + label_hits) as f32 * config.edge_penalty
}

/// Scores candidates in search order, stopping at the first collision-free one.
pub fn evaluate_label_candidates(
    points: &[Point],
    size: (f32, f32),
    obstacles: &LabelObstacles<'_>,
    config: &LabelConfig,
) -> Vec<LabelCandidate> {
    let mut evaluated = Vec::new();
    if points.len() < 2 {
        return evaluated;
    }
    for fraction in candidate_fractions(config) {
        let Some(position) = point_at_fraction(points, fraction) else {
            continue;
        };
        let rect = Rect::centered(position, size.0, size.1);
        let score = score_label_rect(&rect, obstacles, config);
        tracing::trace!(fraction, score, "label candidate");
        evaluated.push(LabelCandidate {
            fraction,
            position,
            rect,
            score,
        });
        if score <= 0.0 {
            break;
        }
    }
    evaluated
}

/// Best label spot on `points` for a label of `size` (already padded).
/// Returns `None` only for paths with fewer than two points.
pub fn place_label(
    points: &[Point],
    size: (f32, f32),
    obstacles: &LabelObstacles<'_>,
    config: &LabelConfig,
) -> Option<LabelCandidate> {
    evaluate_label_candidates(points, size, obstacles, config)
        .into_iter()
        .reduce(|best, candidate| if candidate.score < best.score { candidate } else { best })
}
