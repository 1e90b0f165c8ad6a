//! Host-supplied configuration: node type registry, connection compatibility
//! table, edge colours, zoom limits and layout spacing.
//!
//! Everything has a default so a host only needs to override what differs.
//! `CanvasConfig::from_json` parses and validates in one step.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::*;
use crate::error::ConfigError;
use crate::models::{ConnectorDirection, NodeKind, Position};

lazy_static! {
    static ref DEFAULT_CONFIG: CanvasConfig = CanvasConfig::default();
}

/// Relative placement of a connector inside its node's bounding box:
/// `(rel.x * width + offset.x, rel.y * height + offset.y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(default)]
    pub rel: Position,
    #[serde(default)]
    pub offset: Position,
}

impl Anchor {
    pub const fn rel(x: f64, y: f64) -> Self {
        Self {
            rel: Position::new(x, y),
            offset: Position::new(0.0, 0.0),
        }
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Position::new(x, y);
        self
    }

    pub fn resolve(&self, width: f64, height: f64) -> Position {
        Position::new(
            self.rel.x * width + self.offset.x,
            self.rel.y * height + self.offset.y,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub direction: ConnectorDirection,
    pub anchor: Anchor,
}

impl ConnectorSpec {
    fn input(anchor: Anchor) -> Self {
        Self { direction: ConnectorDirection::Input, anchor }
    }

    fn output(anchor: Anchor) -> Self {
        Self { direction: ConnectorDirection::Output, anchor }
    }
}

/// Fixed size and connector table of one node type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub connectors: BTreeMap<String, ConnectorSpec>,
}

impl NodeLayout {
    fn new(width: f64, height: f64, connectors: Vec<(&str, ConnectorSpec)>) -> Self {
        Self {
            width,
            height,
            connectors: connectors
                .into_iter()
                .map(|(id, spec)| (id.to_string(), spec))
                .collect(),
        }
    }

    /// Offset of `connector_id` relative to the node's top-left corner.
    pub fn connector_offset(&self, connector_id: &str) -> Option<Position> {
        self.connectors
            .get(connector_id)
            .map(|spec| spec.anchor.resolve(self.width, self.height))
    }
}

/// Per node type layout table consumed by the geometry resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeRegistry {
    layouts: BTreeMap<NodeKind, NodeLayout>,
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        let mut layouts = BTreeMap::new();
        layouts.insert(
            NodeKind::Agent,
            NodeLayout::new(
                AGENT_NODE_WIDTH,
                AGENT_NODE_HEIGHT,
                vec![
                    (CONNECTOR_INPUT_TRIGGER, ConnectorSpec::input(Anchor::rel(0.0, 0.5))),
                    (CONNECTOR_OUTPUT_MAIN, ConnectorSpec::output(Anchor::rel(1.0, 0.5))),
                    (
                        CONNECTOR_CHAT_MODEL,
                        ConnectorSpec::output(Anchor::rel(1.0 / 6.0, 1.0).with_offset(0.0, AUX_CONNECTOR_OFFSET)),
                    ),
                    (
                        CONNECTOR_MEMORY,
                        ConnectorSpec::output(Anchor::rel(0.5, 1.0).with_offset(0.0, AUX_CONNECTOR_OFFSET)),
                    ),
                    (
                        CONNECTOR_TOOL,
                        ConnectorSpec::output(Anchor::rel(5.0 / 6.0, 1.0).with_offset(0.0, AUX_CONNECTOR_OFFSET)),
                    ),
                ],
            ),
        );
        for kind in [NodeKind::ChatModel, NodeKind::ToolDisplay] {
            layouts.insert(
                kind,
                NodeLayout::new(
                    COMPANION_NODE_WIDTH,
                    COMPANION_NODE_HEIGHT,
                    vec![(CONNECTOR_INPUT, ConnectorSpec::input(Anchor::rel(0.5, 0.0)))],
                ),
            );
        }
        for kind in [NodeKind::ChatTrigger, NodeKind::MessagingTrigger] {
            layouts.insert(
                kind,
                NodeLayout::new(
                    TRIGGER_NODE_WIDTH,
                    TRIGGER_NODE_HEIGHT,
                    vec![(CONNECTOR_OUTPUT, ConnectorSpec::output(Anchor::rel(1.0, 0.5)))],
                ),
            );
        }
        Self { layouts }
    }
}

impl NodeTypeRegistry {
    /// A registry with no node types; hosts fill it with `insert`.
    pub fn empty() -> Self {
        Self { layouts: BTreeMap::new() }
    }

    pub fn get(&self, kind: NodeKind) -> Option<&NodeLayout> {
        self.layouts.get(&kind)
    }

    pub fn connector(&self, kind: NodeKind, connector_id: &str) -> Option<&ConnectorSpec> {
        self.get(kind).and_then(|layout| layout.connectors.get(connector_id))
    }

    pub fn insert(&mut self, kind: NodeKind, layout: NodeLayout) {
        self.layouts.insert(kind, layout);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKind, &NodeLayout)> {
        self.layouts.iter()
    }
}

/// One allowed `(from type, from connector) -> (to type, to connector)` pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub from_kind: NodeKind,
    pub from_connector: String,
    pub to_kind: NodeKind,
    pub to_connector: String,
}

impl Pairing {
    pub fn new(from_kind: NodeKind, from_connector: &str, to_kind: NodeKind, to_connector: &str) -> Self {
        Self {
            from_kind,
            from_connector: from_connector.to_string(),
            to_kind,
            to_connector: to_connector.to_string(),
        }
    }
}

/// Declarative set of valid connection pairings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityTable {
    pairings: Vec<Pairing>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self {
            pairings: vec![
                Pairing::new(NodeKind::ChatTrigger, CONNECTOR_OUTPUT, NodeKind::Agent, CONNECTOR_INPUT_TRIGGER),
                Pairing::new(NodeKind::MessagingTrigger, CONNECTOR_OUTPUT, NodeKind::Agent, CONNECTOR_INPUT_TRIGGER),
                Pairing::new(NodeKind::Agent, CONNECTOR_OUTPUT_MAIN, NodeKind::Agent, CONNECTOR_INPUT_TRIGGER),
                Pairing::new(NodeKind::Agent, CONNECTOR_CHAT_MODEL, NodeKind::ChatModel, CONNECTOR_INPUT),
                Pairing::new(NodeKind::Agent, CONNECTOR_TOOL, NodeKind::ToolDisplay, CONNECTOR_INPUT),
            ],
        }
    }
}

impl CompatibilityTable {
    pub fn allows(&self, from_kind: NodeKind, from_connector: &str, to_kind: NodeKind, to_connector: &str) -> bool {
        self.pairings.iter().any(|p| {
            p.from_kind == from_kind
                && p.to_kind == to_kind
                && p.from_connector == from_connector
                && p.to_connector == to_connector
        })
    }

    pub fn add(&mut self, pairing: Pairing) {
        if !self.pairings.contains(&pairing) {
            self.pairings.push(pairing);
        }
    }

    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub from_connector: String,
    pub to_kind: NodeKind,
    pub color: String,
}

/// Colour lookup keyed by `(from connector, destination node type)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyleTable {
    #[serde(default)]
    pub styles: Vec<EdgeStyle>,
    #[serde(default = "default_edge_color")]
    pub default_color: String,
}

fn default_edge_color() -> String {
    CONNECTION_LINE_COLOR.to_string()
}

impl Default for EdgeStyleTable {
    fn default() -> Self {
        let style = |from: &str, to_kind: NodeKind, color: &str| EdgeStyle {
            from_connector: from.to_string(),
            to_kind,
            color: color.to_string(),
        };
        Self {
            styles: vec![
                style(CONNECTOR_OUTPUT, NodeKind::Agent, EDGE_COLOR_TRIGGER),
                style(CONNECTOR_OUTPUT_MAIN, NodeKind::Agent, EDGE_COLOR_AGENT_CHAIN),
                style(CONNECTOR_CHAT_MODEL, NodeKind::ChatModel, EDGE_COLOR_MODEL),
                style(CONNECTOR_TOOL, NodeKind::ToolDisplay, EDGE_COLOR_TOOL),
            ],
            default_color: default_edge_color(),
        }
    }
}

impl EdgeStyleTable {
    pub fn color_for(&self, from_connector: &str, to_kind: NodeKind) -> &str {
        self.styles
            .iter()
            .find(|s| s.from_connector == from_connector && s.to_kind == to_kind)
            .map(|s| s.color.as_str())
            .unwrap_or(&self.default_color)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
            step: ZOOM_STEP,
            initial: DEFAULT_ZOOM,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub cell_width: f64,
    pub cell_height: f64,
    pub origin: Position,
    /// Vertical gap between an owner's bottom edge and its companions.
    pub companion_gap: f64,
    /// Horizontal gap between sibling companions on the same slot.
    pub companion_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_width: GRID_CELL_WIDTH,
            cell_height: GRID_CELL_HEIGHT,
            origin: Position::new(GRID_ORIGIN_X, GRID_ORIGIN_Y),
            companion_gap: COMPANION_GAP,
            companion_spacing: COMPANION_SPACING,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub registry: NodeTypeRegistry,
    pub compatibility: CompatibilityTable,
    pub edge_styles: EdgeStyleTable,
    pub zoom: ZoomConfig,
    pub layout: LayoutConfig,
    /// Connector hit radius for geometric hit-testing, canvas units.
    pub connector_hit_radius: f64,
    /// Maximum pointer travel (screen px) for a press to count as a click.
    pub click_threshold: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            registry: NodeTypeRegistry::default(),
            compatibility: CompatibilityTable::default(),
            edge_styles: EdgeStyleTable::default(),
            zoom: ZoomConfig::default(),
            layout: LayoutConfig::default(),
            connector_hit_radius: CONNECTOR_HIT_RADIUS,
            click_threshold: CLICK_THRESHOLD,
        }
    }
}

impl CanvasConfig {
    /// Shared default configuration.
    pub fn defaults() -> &'static CanvasConfig {
        &DEFAULT_CONFIG
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let z = &self.zoom;
        if !(z.min > 0.0 && z.min <= z.initial && z.initial <= z.max && z.step > 0.0) {
            return Err(ConfigError::InvalidZoomRange {
                min: z.min,
                initial: z.initial,
                max: z.max,
            });
        }

        for (kind, layout) in self.registry.iter() {
            if layout.width <= 0.0 || layout.height <= 0.0 {
                return Err(ConfigError::InvalidDimension {
                    kind: kind.as_str().to_string(),
                    width: layout.width,
                    height: layout.height,
                });
            }
        }

        for pairing in self.compatibility.pairings() {
            let from = self.lookup_connector(pairing.from_kind, &pairing.from_connector)?;
            let to = self.lookup_connector(pairing.to_kind, &pairing.to_connector)?;
            if from.direction != ConnectorDirection::Output || to.direction != ConnectorDirection::Input {
                return Err(ConfigError::DirectionMismatch {
                    from: format!("{}.{}", pairing.from_kind.as_str(), pairing.from_connector),
                    to: format!("{}.{}", pairing.to_kind.as_str(), pairing.to_connector),
                });
            }
        }
        Ok(())
    }

    fn lookup_connector(&self, kind: NodeKind, connector_id: &str) -> Result<&ConnectorSpec, ConfigError> {
        let layout = self
            .registry
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownNodeKind(kind.as_str().to_string()))?;
        layout
            .connectors
            .get(connector_id)
            .ok_or_else(|| ConfigError::UnknownConnector {
                kind: kind.as_str().to_string(),
                connector_id: connector_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CanvasConfig::defaults().validate().unwrap();
    }

    #[test]
    fn agent_aux_connectors_sit_below_the_card() {
        let registry = NodeTypeRegistry::default();
        let agent = registry.get(NodeKind::Agent).unwrap();
        let y = AGENT_NODE_HEIGHT + AUX_CONNECTOR_OFFSET;
        assert_eq!(agent.connector_offset(CONNECTOR_CHAT_MODEL), Some(Position::new(AGENT_NODE_WIDTH / 6.0, y)));
        assert_eq!(agent.connector_offset(CONNECTOR_MEMORY), Some(Position::new(AGENT_NODE_WIDTH / 2.0, y)));
        assert_eq!(agent.connector_offset(CONNECTOR_TOOL), Some(Position::new(5.0 * AGENT_NODE_WIDTH / 6.0, y)));
        assert_eq!(agent.connector_offset("nope"), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CanvasConfig::from_json(r#"{"zoom": {"min": 0.25, "max": 4.0}}"#).unwrap();
        assert_eq!(config.zoom.min, 0.25);
        assert_eq!(config.zoom.step, ZOOM_STEP);
        assert!(config.registry.get(NodeKind::Agent).is_some());
    }

    #[test]
    fn pairing_must_reference_known_connectors() {
        let raw = r#"{"compatibility": [
            {"fromKind": "CHAT_TRIGGER", "fromConnector": "output", "toKind": "AGENT", "toConnector": "bogus"}
        ]}"#;
        assert!(matches!(
            CanvasConfig::from_json(raw),
            Err(ConfigError::UnknownConnector { .. })
        ));
    }

    #[test]
    fn pairing_must_run_output_to_input() {
        let mut config = CanvasConfig::default();
        config.compatibility.add(Pairing::new(
            NodeKind::Agent,
            CONNECTOR_INPUT_TRIGGER,
            NodeKind::Agent,
            CONNECTOR_INPUT_TRIGGER,
        ));
        assert!(matches!(config.validate(), Err(ConfigError::DirectionMismatch { .. })));
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let raw = r#"{"zoom": {"min": 2.0, "max": 1.0, "initial": 1.5}}"#;
        assert!(matches!(
            CanvasConfig::from_json(raw),
            Err(ConfigError::InvalidZoomRange { .. })
        ));
    }

    #[test]
    fn edge_colour_lookup_falls_back() {
        let styles = EdgeStyleTable::default();
        assert_eq!(styles.color_for(CONNECTOR_OUTPUT, NodeKind::Agent), EDGE_COLOR_TRIGGER);
        assert_eq!(styles.color_for(CONNECTOR_MEMORY, NodeKind::Agent), CONNECTION_LINE_COLOR);
    }
}
