#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LabelConfig, LayoutConfig, RenderConfig, RoutingConfig, load_config};
pub use ir::{Connector, Node, Scene};
pub use layout::{
    ConnectorLayout, ResolutionMode, SceneLayout, compute_connector_path,
    compute_connector_path_with_labels, compute_scene_layout, hit_test,
};
pub use parser::{SceneError, parse_scene};
pub use render::render_svg;
pub use theme::Theme;

/// Parse, route and render a scene document in one call.
pub fn render_scene(input: &str, config: &Config) -> anyhow::Result<String> {
    let scene = parse_scene(input)?;
    let layout = compute_scene_layout(&scene, &config.theme, &config.layout);
    Ok(render_svg(&scene, &layout, &config.theme, &config.layout, &config.render))
}
