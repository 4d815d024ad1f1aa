use arrow_router::layout::geometry::Viewport;
use arrow_router::layout_dump::LayoutDump;
use arrow_router::{Config, SceneLayout, Theme, compute_scene_layout, hit_test, parse_scene};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitOptions {
    #[serde(default)]
    pan_x: f32,
    #[serde(default)]
    pan_y: f32,
    zoom: Option<f32>,
    /// Screen pixels.
    tolerance: Option<f32>,
    #[serde(flatten)]
    route: RouteOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HitResult {
    connector: Option<String>,
    canvas_point: [f32; 2],
}

fn build_config(options: RouteOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("classic") {
        config.theme = Theme::classic();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    // No system fonts in the browser; default to estimated widths.
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    config
}

fn parse_options<T: Default + for<'de> Deserialize<'de>>(raw: Option<String>) -> Result<T, String> {
    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(T::default()),
    }
}

fn route(scene_json: &str, config: &Config) -> Result<(arrow_router::Scene, SceneLayout), String> {
    let scene = parse_scene(scene_json).map_err(|error| error.to_string())?;
    let layout = compute_scene_layout(&scene, &config.theme, &config.layout);
    Ok((scene, layout))
}

pub fn route_scene(scene_json: &str, options_json: Option<String>) -> Result<String, String> {
    let config = build_config(parse_options(options_json)?);
    let (scene, layout) = route(scene_json, &config)?;
    LayoutDump::from_layout(&layout, &scene)
        .to_json()
        .map_err(|error| error.to_string())
}

pub fn hit_test_scene(
    scene_json: &str,
    screen_x: f32,
    screen_y: f32,
    options_json: Option<String>,
) -> Result<String, String> {
    let options: HitOptions = parse_options(options_json)?;
    let viewport = Viewport {
        pan: (options.pan_x, options.pan_y),
        zoom: options.zoom.unwrap_or(1.0),
    };
    let config = build_config(options.route);
    let tolerance = viewport.canvas_tolerance(options.tolerance.unwrap_or(config.layout.hit_tolerance));
    let (_, layout) = route(scene_json, &config)?;
    let canvas_point = viewport.to_canvas((screen_x, screen_y));
    let result = HitResult {
        connector: hit_test(&layout, canvas_point, tolerance).map(str::to_string),
        canvas_point: [canvas_point.0, canvas_point.1],
    };
    serde_json::to_string(&result).map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn route_scene_json(scene_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    route_scene(scene_json, options_json).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn hit_test_json(
    scene_json: &str,
    screen_x: f32,
    screen_y: f32,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    hit_test_scene(scene_json, screen_x, screen_y, options_json)
        .map_err(|error| JsValue::from_str(&error))
}
