use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::Scene;
use crate::layout::text::measure_label;
use crate::layout::{SceneLayout, TextBlock};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(
    scene: &Scene,
    layout: &SceneLayout,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let margin = render.margin.max(0.0);
    let (min_x, min_y, max_x, max_y) = layout.bounds.unwrap_or((0.0, 0.0, 0.0, 0.0));
    let width = (max_x - min_x + margin * 2.0).max(200.0);
    let height = (max_y - min_y + margin * 2.0).max(200.0);
    let offset_x = margin - min_x;
    let offset_y = margin - min_y;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");
    svg.push_str(&format!(
        "<g transform=\"translate({offset_x:.2} {offset_y:.2})\">"
    ));

    for node in scene.nodes.values() {
        svg.push_str(&format!(
            "<rect data-node=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            escape_xml(&node.id),
            node.x,
            node.y,
            node.width,
            node.height,
            theme.node_fill,
            theme.node_border
        ));
        let label = measure_label(&node.label, theme, config);
        let (center_x, center_y) = node.center();
        svg.push_str(&text_block_svg(
            center_x,
            center_y,
            &label,
            theme,
            config,
            &theme.node_text_color,
        ));
    }

    for connector in layout.connectors.iter().filter(|c| c.is_renderable()) {
        svg.push_str(&format!(
            "<path data-connector=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\"/>",
            escape_xml(&connector.id),
            points_to_path(&connector.points),
            theme.line_color
        ));
    }

    // Labels go last so they sit above every path.
    for connector in &layout.connectors {
        let Some(label) = connector.label.as_ref() else {
            continue;
        };
        if label.text.lines.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
            label.rect.x,
            label.rect.y,
            label.rect.width,
            label.rect.height,
            theme.label_background,
            theme.label_border
        ));
        svg.push_str(&text_block_svg(
            label.position.0,
            label.position.1,
            &label.text,
            theme,
            config,
            &theme.label_text_color,
        ));
    }

    svg.push_str("</g></svg>");
    svg
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, point) in points.iter().enumerate() {
        let command = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{command} {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn text_block_svg(
    x: f32,
    y: f32,
    block: &TextBlock,
    theme: &Theme,
    config: &LayoutConfig,
    fill: &str,
) -> String {
    if block.lines.is_empty() {
        return String::new();
    }
    let line_height = theme.font_size * config.label_line_height;
    // Baseline of the first line, keeping the block vertically centered.
    let start_y = y - block.height / 2.0 + (line_height + theme.font_size) / 2.0 - theme.font_size * 0.15;
    let mut text = format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        theme.font_size,
        fill
    );
    for (idx, line) in block.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        text.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, svg)?,
        None => print!("{svg}"),
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("failed to allocate a {}x{} pixmap", size.width(), size.height()))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Connector, Node};
    use crate::layout::compute_scene_layout;

    fn render(scene: &Scene) -> String {
        let theme = Theme::modern();
        let config = LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        };
        let layout = compute_scene_layout(scene, &theme, &config);
        render_svg(scene, &layout, &theme, &config, &RenderConfig::default())
    }

    #[test]
    fn render_svg_draws_nodes_paths_and_labels() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", 0.0, 0.0, 120.0, 60.0).with_label("Alpha"));
        scene.add_node(Node::new("b", 400.0, 0.0, 120.0, 60.0).with_label("Beta"));
        scene.add_connector(Connector::new("ab", "a", "b").with_label("a < b"));
        let svg = render(&scene);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("data-connector=\"ab\""));
        assert!(svg.contains("marker-end=\"url(#arrow)\""));
        assert!(svg.contains("Alpha"));
        assert!(svg.contains("a &lt; b"));
    }

    #[test]
    fn unrenderable_connectors_are_skipped() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", 0.0, 0.0, 120.0, 60.0));
        scene.add_connector(Connector::new("lost", "a", "missing").with_label("never shown"));
        let svg = render(&scene);
        assert!(!svg.contains("data-connector=\"lost\""));
        assert!(!svg.contains("never shown"));
    }

    #[test]
    fn path_data_uses_move_then_lines() {
        assert_eq!(
            points_to_path(&[(0.0, 0.0), (10.0, 0.0), (10.0, 5.5)]),
            "M 0.00 0.00 L 10.00 0.00 L 10.00 5.50"
        );
        assert_eq!(points_to_path(&[]), "");
    }
}
