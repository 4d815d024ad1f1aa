use crate::ir::Scene;
use crate::layout::SceneLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub bounds: Option<[f32; 4]>,
    pub nodes: Vec<NodeDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDump {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub source_side: Option<String>,
    pub destination_side: Option<String>,
    pub points: Vec<[f32; 2]>,
    pub label: Option<LabelDump>,
    pub node_collisions: usize,
    pub connector_collisions: usize,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub position: [f32; 2],
    /// `[x, y, width, height]`
    #[serde(rename = "box")]
    pub rect: [f32; 4],
    pub fraction: f32,
    pub score: f32,
    pub lines: Vec<String>,
}

impl LayoutDump {
    pub fn from_layout(layout: &SceneLayout, scene: &Scene) -> Self {
        let nodes = scene
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let connectors = layout
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                id: connector.id.clone(),
                source: connector.source.clone(),
                destination: connector.destination.clone(),
                source_side: connector.source_side.map(|side| side.as_str().to_string()),
                destination_side: connector
                    .destination_side
                    .map(|side| side.as_str().to_string()),
                points: connector.points.iter().map(|(x, y)| [*x, *y]).collect(),
                label: connector.label.as_ref().map(|label| LabelDump {
                    position: [label.position.0, label.position.1],
                    rect: [label.rect.x, label.rect.y, label.rect.width, label.rect.height],
                    fraction: label.fraction,
                    score: label.score,
                    lines: label.text.lines.clone(),
                }),
                node_collisions: connector.collisions.nodes,
                connector_collisions: connector.collisions.connectors,
            })
            .collect();

        LayoutDump {
            bounds: layout.bounds.map(|(x0, y0, x1, y1)| [x0, y0, x1, y1]),
            nodes,
            connectors,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, layout: &SceneLayout, scene: &Scene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, scene);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
