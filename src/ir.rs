use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A rectangle on the canvas that connectors attach to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, alias = "title")]
    pub label: String,
}

impl Node {
    pub fn new(id: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A directed, labeled link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    #[serde(alias = "sourceId", alias = "from")]
    pub source: String,
    #[serde(alias = "destinationId", alias = "to")]
    pub destination: String,
    #[serde(default)]
    pub label: String,
}

impl Connector {
    pub fn new(id: &str, source: &str, destination: &str) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.destination
    }

    /// Resolve both endpoints, or `None` when the connector cannot be drawn.
    pub fn endpoints<'a>(&self, nodes: &'a BTreeMap<String, Node>) -> Option<(&'a Node, &'a Node)> {
        if self.is_self_loop() {
            return None;
        }
        let source = nodes.get(&self.source)?;
        let destination = nodes.get(&self.destination)?;
        Some((source, destination))
    }
}

/// Immutable snapshot of everything the engine routes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub nodes: BTreeMap<String, Node>,
    pub connectors: Vec<Connector>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_connector(&mut self, connector: Connector) {
        self.connectors.push(connector);
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|connector| connector.id == id)
    }

    /// Bounding box of all nodes as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let mut iter = self.nodes.values();
        let first = iter.next()?;
        let mut bounds = (first.x, first.y, first.x + first.width, first.y + first.height);
        for node in iter {
            bounds.0 = bounds.0.min(node.x);
            bounds.1 = bounds.1.min(node.y);
            bounds.2 = bounds.2.max(node.x + node.width);
            bounds.3 = bounds.3.max(node.y + node.height);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_reject_missing_and_self_loops() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", 0.0, 0.0, 10.0, 10.0));
        scene.add_node(Node::new("b", 50.0, 0.0, 10.0, 10.0));
        assert!(Connector::new("e1", "a", "b").endpoints(&scene.nodes).is_some());
        assert!(Connector::new("e2", "a", "zzz").endpoints(&scene.nodes).is_none());
        assert!(Connector::new("e3", "a", "a").endpoints(&scene.nodes).is_none());
    }

    #[test]
    fn bounds_cover_all_nodes() {
        let mut scene = Scene::new();
        assert_eq!(scene.bounds(), None);
        scene.add_node(Node::new("a", -10.0, 5.0, 20.0, 10.0));
        scene.add_node(Node::new("b", 40.0, -20.0, 10.0, 10.0));
        assert_eq!(scene.bounds(), Some((-10.0, -20.0, 50.0, 15.0)));
    }
}
