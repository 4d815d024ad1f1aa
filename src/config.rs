use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Fraction of the endpoint distance a connector must travel before turning.
    pub min_travel_ratio: f32,
    /// Lower bound for the travel distance.
    pub min_travel_floor: f32,
    /// Connection points are spread over `[edge_spread_start, edge_spread_end]` of an edge.
    pub edge_spread_start: f32,
    pub edge_spread_end: f32,
    /// Other-endpoint coordinates closer than this sort as a tie.
    pub sort_tolerance: f32,
    /// Number of growth steps in the collision retry schedule.
    pub collision_retry_steps: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_travel_ratio: 0.2,
            min_travel_floor: 40.0,
            edge_spread_start: 0.1,
            edge_spread_end: 0.9,
            sort_tolerance: 5.0,
            collision_retry_steps: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub min_fraction: f32,
    pub max_fraction: f32,
    pub fraction_step: f32,
    pub node_penalty: f32,
    pub edge_penalty: f32,
    pub padding_x: f32,
    pub padding_y: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            min_fraction: 0.3,
            max_fraction: 0.7,
            fraction_step: 0.05,
            node_penalty: 100.0,
            edge_penalty: 10.0,
            padding_x: 6.0,
            padding_y: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
    /// Skip font lookups and size labels from per-character estimates.
    pub fast_text_metrics: bool,
    /// Canvas distance within which a pointer hits a connector.
    pub hit_tolerance: f32,
    pub routing: RoutingConfig,
    pub labels: LabelConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            label_line_height: 1.2,
            max_label_width_chars: 24,
            fast_text_metrics: false,
            hit_tolerance: 15.0,
            routing: RoutingConfig::default(),
            labels: LabelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            margin: 40.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_border: Option<String>,
    node_text_color: Option<String>,
    line_color: Option<String>,
    label_background: Option<String>,
    label_text_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    min_travel_ratio: Option<f32>,
    min_travel_floor: Option<f32>,
    edge_spread_start: Option<f32>,
    edge_spread_end: Option<f32>,
    sort_tolerance: Option<f32>,
    collision_retry_steps: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelConfigFile {
    min_fraction: Option<f32>,
    max_fraction: Option<f32>,
    fraction_step: Option<f32>,
    node_penalty: Option<f32>,
    edge_penalty: Option<f32>,
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    line_height: Option<f32>,
    max_width_chars: Option<usize>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    margin: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    routing: Option<RoutingConfigFile>,
    labels: Option<LabelConfigFile>,
    render: Option<RenderConfigFile>,
    hit_tolerance: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Apply a JSON5 config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme name, keeping default"),
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_border {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.label_background {
            config.theme.label_background = v;
        }
        if let Some(v) = vars.label_text_color {
            config.theme.label_text_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
    }

    if let Some(routing) = parsed.routing {
        let target = &mut config.layout.routing;
        if let Some(v) = routing.min_travel_ratio {
            target.min_travel_ratio = v.max(0.0);
        }
        if let Some(v) = routing.min_travel_floor {
            target.min_travel_floor = v.max(0.0);
        }
        if let Some(v) = routing.edge_spread_start {
            target.edge_spread_start = v.clamp(0.0, 1.0);
        }
        if let Some(v) = routing.edge_spread_end {
            target.edge_spread_end = v.clamp(0.0, 1.0);
        }
        if target.edge_spread_start > target.edge_spread_end {
            std::mem::swap(&mut target.edge_spread_start, &mut target.edge_spread_end);
        }
        if let Some(v) = routing.sort_tolerance {
            target.sort_tolerance = v.max(0.0);
        }
        if let Some(v) = routing.collision_retry_steps {
            target.collision_retry_steps = v;
        }
    }

    if let Some(labels) = parsed.labels {
        let target = &mut config.layout.labels;
        if let Some(v) = labels.min_fraction {
            target.min_fraction = v.clamp(0.0, 1.0);
        }
        if let Some(v) = labels.max_fraction {
            target.max_fraction = v.clamp(0.0, 1.0);
        }
        if target.min_fraction > target.max_fraction {
            std::mem::swap(&mut target.min_fraction, &mut target.max_fraction);
        }
        if let Some(v) = labels.fraction_step
            && v > 0.0
        {
            target.fraction_step = v;
        }
        if let Some(v) = labels.node_penalty {
            target.node_penalty = v;
        }
        if let Some(v) = labels.edge_penalty {
            target.edge_penalty = v;
        }
        if let Some(v) = labels.padding_x {
            target.padding_x = v.max(0.0);
        }
        if let Some(v) = labels.padding_y {
            target.padding_y = v.max(0.0);
        }
        if let Some(v) = labels.line_height {
            config.layout.label_line_height = v;
        }
        if let Some(v) = labels.max_width_chars {
            config.layout.max_label_width_chars = v;
        }
        if let Some(v) = labels.fast_text_metrics {
            config.layout.fast_text_metrics = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.margin {
            config.render.margin = v.max(0.0);
        }
    }

    if let Some(v) = parsed.hit_tolerance {
        config.layout.hit_tolerance = v.max(0.0);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = LayoutConfig::default();
        assert_eq!(config.routing.min_travel_ratio, 0.2);
        assert_eq!(config.routing.min_travel_floor, 40.0);
        assert_eq!(config.routing.sort_tolerance, 5.0);
        assert_eq!(config.labels.min_fraction, 0.3);
        assert_eq!(config.labels.max_fraction, 0.7);
        assert_eq!(config.labels.node_penalty, 100.0);
        assert_eq!(config.labels.edge_penalty, 10.0);
        assert_eq!(config.hit_tolerance, 15.0);
    }

    #[test]
    fn parse_config_applies_overrides() {
        let config = parse_config(
            r##"{
                // comments are allowed
                theme: "classic",
                themeVariables: { lineColor: "#ff0000" },
                routing: { minTravelFloor: 24, collisionRetrySteps: 5 },
                labels: { fastTextMetrics: true, minFraction: 0.8, maxFraction: 0.2 },
                hitTolerance: 8,
            }"##,
        )
        .expect("config should parse");
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.layout.routing.min_travel_floor, 24.0);
        assert_eq!(config.layout.routing.collision_retry_steps, 5);
        assert!(config.layout.fast_text_metrics);
        assert_eq!(config.layout.labels.min_fraction, 0.2);
        assert_eq!(config.layout.labels.max_fraction, 0.8);
        assert_eq!(config.layout.hit_tolerance, 8.0);
    }

    #[test]
    fn parse_config_rejects_malformed_input() {
        assert!(parse_config("{ routing: ").is_err());
    }

    #[test]
    fn load_config_without_path_uses_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.layout.routing.collision_retry_steps, 3);
    }
}
