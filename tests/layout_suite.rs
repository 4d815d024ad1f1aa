use std::path::Path;

use arrow_router::layout::geometry::{Rect, segment_intersects_rect};
use arrow_router::{
    Config, LayoutConfig, Scene, SceneLayout, Theme, compute_scene_layout, hit_test, parse_scene,
    render_svg,
};

fn fast_config() -> LayoutConfig {
    LayoutConfig {
        fast_text_metrics: true,
        ..LayoutConfig::default()
    }
}

fn load_fixture(name: &str) -> Scene {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_scene(&input).expect("parse failed")
}

fn layout_fixture(name: &str) -> (Scene, SceneLayout) {
    let scene = load_fixture(name);
    let layout = compute_scene_layout(&scene, &Theme::modern(), &fast_config());
    (scene, layout)
}

fn is_orthogonal(points: &[(f32, f32)]) -> bool {
    points
        .windows(2)
        .all(|seg| (seg[0].0 - seg[1].0).abs() < 1e-3 || (seg[0].1 - seg[1].1).abs() < 1e-3)
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = ["basic.json5", "fan_out.json5", "blocked.json5", "board.json5"];
    let config = Config {
        layout: fast_config(),
        ..Config::default()
    };
    for name in candidates {
        let scene = load_fixture(name);
        let layout = compute_scene_layout(&scene, &config.theme, &config.layout);
        let svg = render_svg(&scene, &layout, &config.theme, &config.layout, &config.render);
        assert!(svg.contains("<svg"), "{name}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{name}: missing </svg tag");
        for connector in layout.connectors.iter().filter(|c| c.is_renderable()) {
            assert!(
                is_orthogonal(&connector.points),
                "{name}: connector {} is not orthogonal: {:?}",
                connector.id,
                connector.points
            );
        }
    }
}

#[test]
fn side_by_side_nodes_use_facing_edges() {
    let (scene, layout) = layout_fixture("basic.json5");
    let request = layout.connector("request").unwrap();
    let client = &scene.nodes["client"];
    let server = &scene.nodes["server"];
    assert_eq!(request.points.len(), 4);
    assert_eq!(request.points[0], (client.x + client.width, client.y + client.height / 2.0));
    assert_eq!(request.points[3], (server.x, server.y + server.height / 2.0));
    let label = request.label.as_ref().unwrap();
    assert_eq!(label.fraction, 0.5);
    assert_eq!(label.score, 0.0);
}

#[test]
fn fan_out_spreads_connection_points_along_the_edge() {
    let (scene, layout) = layout_fixture("fan_out.json5");
    let hub = &scene.nodes["hub"];
    let mut ys: Vec<f32> = layout
        .connectors
        .iter()
        .map(|connector| {
            let start = connector.points[0];
            assert_eq!(start.0, hub.x + hub.width, "{} leaves the right edge", connector.id);
            start.1
        })
        .collect();
    ys.sort_by(f32::total_cmp);
    ys.dedup();
    assert_eq!(ys.len(), 3, "connection points must be distinct");
    for y in ys {
        let fraction = (y - hub.y) / hub.height;
        assert!((0.1 - 1e-4..=0.9 + 1e-4).contains(&fraction), "fraction {fraction}");
    }
}

#[test]
fn blocked_route_detours_around_wall() {
    let (scene, layout) = layout_fixture("blocked.json5");
    let around = layout.connector("around").unwrap();
    let wall = Rect::from_node(&scene.nodes["wall"]);
    assert!(around.points.len() > 4);
    assert!(
        around
            .points
            .windows(2)
            .all(|seg| !segment_intersects_rect(seg[0], seg[1], &wall))
    );
    assert!(around.collisions.is_clear());
    let label = around.label.as_ref().unwrap();
    assert!((0.3..=0.7).contains(&label.fraction));
}

#[test]
fn board_aliases_and_dangling_arrows() {
    let (scene, layout) = layout_fixture("board.json5");
    assert_eq!(scene.nodes["todo"].label, "To do");
    let archived = layout.connector("archived").unwrap();
    assert!(archived.points.is_empty());
    assert!(archived.label.is_none());

    let start = layout.connector("start").unwrap();
    assert_eq!(start.source_side.map(|s| s.as_str()), Some("bottom"));
    assert_eq!(start.destination_side.map(|s| s.as_str()), Some("top"));

    let finish = layout.connector("finish").unwrap();
    let label = finish.label.as_ref().unwrap();
    assert_eq!(hit_test(&layout, label.rect.center(), 15.0), Some("finish"));
}

#[test]
fn layout_is_deterministic_across_runs() {
    for name in ["basic.json5", "fan_out.json5", "blocked.json5", "board.json5"] {
        let (_, first) = layout_fixture(name);
        let (_, second) = layout_fixture(name);
        assert_eq!(first, second, "{name} changed between runs");
    }
}
