use crate::ir::{Connector, Node, Scene};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene document: {0}")]
    Syntax(#[from] json5::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("duplicate connector id `{0}`")]
    DuplicateConnector(String),
    #[error("node `{id}` has non-positive size {width}x{height}")]
    InvalidSize { id: String, width: f32, height: f32 },
    #[error("node `{0}` has a non-finite position")]
    InvalidPosition(String),
    #[error("connector `{0}` starts and ends on the same node")]
    SelfLoop(String),
}

#[derive(Debug, Deserialize)]
struct SceneDocument {
    #[serde(default, alias = "sides")]
    nodes: Vec<Node>,
    #[serde(default, alias = "arrows")]
    connectors: Vec<Connector>,
}

/// Parse a JSON5 scene document.
///
/// Connectors that point at unknown nodes are kept: the engine renders them
/// as empty paths, so they are only reported through `tracing`.
pub fn parse_scene(input: &str) -> Result<Scene, SceneError> {
    let document: SceneDocument = json5::from_str(input)?;
    let mut scene = Scene::new();

    for node in document.nodes {
        if !(node.x.is_finite() && node.y.is_finite()) {
            return Err(SceneError::InvalidPosition(node.id));
        }
        if !(node.width > 0.0 && node.height > 0.0) {
            return Err(SceneError::InvalidSize {
                id: node.id,
                width: node.width,
                height: node.height,
            });
        }
        if scene.nodes.contains_key(&node.id) {
            return Err(SceneError::DuplicateNode(node.id));
        }
        scene.add_node(node);
    }

    let mut seen = HashSet::new();
    for connector in document.connectors {
        if !seen.insert(connector.id.clone()) {
            return Err(SceneError::DuplicateConnector(connector.id));
        }
        if connector.is_self_loop() {
            return Err(SceneError::SelfLoop(connector.id));
        }
        for endpoint in [&connector.source, &connector.destination] {
            if !scene.nodes.contains_key(endpoint) {
                tracing::warn!(
                    connector = %connector.id,
                    node = %endpoint,
                    "connector references an unknown node"
                );
            }
        }
        scene.add_connector(connector);
    }

    tracing::debug!(
        nodes = scene.nodes.len(),
        connectors = scene.connectors.len(),
        "parsed scene"
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_and_connectors() {
        let scene = parse_scene(
            r#"{
                // two boxes and an arrow
                nodes: [
                    { id: "a", x: 0, y: 0, width: 100, height: 60, label: "Start" },
                    { id: "b", x: 300, y: 0, width: 100, height: 60 },
                ],
                connectors: [{ id: "ab", source: "a", destination: "b", label: "next" }],
            }"#,
        )
        .unwrap();
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.nodes["a"].label, "Start");
        assert_eq!(scene.connectors[0].label, "next");
    }

    #[test]
    fn accepts_board_aliases() {
        let scene = parse_scene(
            r#"{
                sides: [
                    { id: "a", x: 0, y: 0, width: 10, height: 10, title: "A" },
                    { id: "b", x: 50, y: 0, width: 10, height: 10 },
                ],
                arrows: [{ id: "e", sourceId: "a", destinationId: "b" }],
            }"#,
        )
        .unwrap();
        assert_eq!(scene.nodes["a"].label, "A");
        assert_eq!(scene.connectors[0].source, "a");
        assert_eq!(scene.connectors[0].destination, "b");
    }

    #[test]
    fn dangling_connector_is_kept() {
        let scene = parse_scene(
            r#"{ nodes: [{ id: "a", x: 0, y: 0, width: 10, height: 10 }],
                 connectors: [{ id: "e", from: "a", to: "gone" }] }"#,
        )
        .unwrap();
        assert_eq!(scene.connectors.len(), 1);
    }

    #[test]
    fn rejects_invalid_documents() {
        let duplicate = r#"{ nodes: [
            { id: "a", x: 0, y: 0, width: 10, height: 10 },
            { id: "a", x: 5, y: 0, width: 10, height: 10 },
        ] }"#;
        assert!(matches!(parse_scene(duplicate), Err(SceneError::DuplicateNode(id)) if id == "a"));

        let zero = r#"{ nodes: [{ id: "a", x: 0, y: 0, width: 0, height: 10 }] }"#;
        assert!(matches!(parse_scene(zero), Err(SceneError::InvalidSize { .. })));

        let self_loop = r#"{ nodes: [{ id: "a", x: 0, y: 0, width: 10, height: 10 }],
            connectors: [{ id: "e", source: "a", destination: "a" }] }"#;
        assert!(matches!(parse_scene(self_loop), Err(SceneError::SelfLoop(id)) if id == "e"));

        let twice = r#"{ connectors: [
            { id: "e", source: "a", destination: "b" },
            { id: "e", source: "b", destination: "a" },
        ] }"#;
        assert!(matches!(parse_scene(twice), Err(SceneError::DuplicateConnector(_))));

        assert!(matches!(parse_scene("{ nodes: ["), Err(SceneError::Syntax(_))));
    }
}
