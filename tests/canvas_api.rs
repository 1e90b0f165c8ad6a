//! Drives the engine the way a host does: config and snapshot in as JSON,
//! pointer messages in, callbacks and scenes out.
//!
//! Run with: cargo test --test canvas_api

use agent_canvas::canvas::geometry::connector_position;
use agent_canvas::session::SessionKind;
use agent_canvas::{
    dispatch, render, update, CanvasCallbacks, CanvasConfig, CanvasEvent, CanvasState, Connection, HitTarget, Message,
    Position, RejectionReason, WorkflowSnapshot,
};

const SNAPSHOT: &str = r#"{
    "nodes": [
        {"id": "trigger", "name": "When chat message received", "position": {"x": 0.0, "y": 0.0},
         "data": {"type": "CHAT_TRIGGER"}},
        {"id": "agent", "name": "Support agent", "position": {"x": 300.0, "y": 0.0},
         "data": {"type": "AGENT", "systemPrompt": "Be kind."}},
        {"id": "second", "name": "Other trigger", "position": {"x": 0.0, "y": 200.0},
         "data": {"type": "CHAT_TRIGGER"}}
    ],
    "connections": []
}"#;

#[derive(Default)]
struct Host {
    log: Vec<&'static str>,
    created: Vec<Connection>,
    rejected: Vec<RejectionReason>,
    sessions_open: i32,
}

impl CanvasCallbacks for Host {
    fn on_event(&mut self, event: &CanvasEvent) {
        self.log.push(event.name());
    }

    fn on_connection_created(&mut self, connection: &Connection) {
        self.created.push(connection.clone());
    }

    fn on_connection_creation_rejected(
        &mut self,
        reason: RejectionReason,
        _from: &agent_canvas::ConnectorRef,
        _to: &agent_canvas::ConnectorRef,
    ) {
        self.rejected.push(reason);
    }

    fn on_session_started(&mut self, _kind: SessionKind) {
        self.sessions_open += 1;
    }

    fn on_session_ended(&mut self, _kind: SessionKind) {
        self.sessions_open -= 1;
    }
}

struct Harness {
    state: CanvasState,
    host: Host,
}

impl Harness {
    fn new(config: &str) -> Self {
        let mut state = CanvasState::new(CanvasConfig::from_json(config).expect("valid config"));
        let snapshot = WorkflowSnapshot::from_json(SNAPSHOT).expect("valid snapshot");
        assert!(state.load_snapshot(snapshot).is_empty());
        Self {
            state,
            host: Host::default(),
        }
    }

    fn send(&mut self, msg: Message) -> bool {
        let mut events = Vec::new();
        let redraw = update(&mut self.state, &msg, &mut events);
        dispatch(&events, &mut self.host);
        redraw
    }

    fn screen_of(&self, node_id: &str, connector_id: &str) -> Position {
        let node = self.state.node(node_id).expect("node exists");
        let canvas = connector_position(&self.state.config.registry, node, connector_id).expect("connector exists");
        self.state.viewport.to_screen(canvas)
    }

    /// Hit-test geometrically, as a host without DOM markers would.
    fn hit(&self, screen: Position) -> HitTarget {
        HitTarget::from_geometry(
            &self.state.config.registry,
            &self.state.nodes,
            self.state.to_canvas(screen),
            self.state.config.connector_hit_radius,
        )
    }

    fn draw(&mut self, from: (&str, &str), to: (&str, &str)) {
        let start = self.screen_of(from.0, from.1);
        let end = self.screen_of(to.0, to.1);
        let press = self.hit(start);
        self.send(Message::PointerDown { target: press, screen: start });
        self.send(Message::PointerMove { screen: end });
        let release = self.hit(end);
        self.send(Message::PointerUp { target: release, screen: end });
    }
}

#[test]
fn host_wires_a_trigger_to_an_agent() {
    let mut h = Harness::new("{}");
    h.draw(("trigger", "output"), ("agent", "input-trigger"));
    h.draw(("second", "output"), ("agent", "input-trigger"));

    assert_eq!(h.host.created.len(), 1);
    assert_eq!(h.host.created[0].from_node_id, "trigger");
    assert_eq!(h.host.rejected, vec![RejectionReason::InputAlreadyConnected]);
    assert_eq!(h.host.sessions_open, 0);
    assert_eq!(
        h.host.log,
        vec![
            "sessionStarted",
            "connectionCreated",
            "sessionEnded",
            "sessionStarted",
            "connectionCreationRejected",
            "sessionEnded",
        ]
    );

    let scene = render(&h.state);
    assert_eq!(scene.edges.len(), 1);
    let agent = scene.nodes.iter().find(|n| n.id == "agent").unwrap();
    assert!(agent.reachable);
    assert!(agent.connectors.iter().any(|c| c.connector_id == "input-trigger" && c.connected));
}

#[test]
fn scene_follows_the_viewport() {
    let mut h = Harness::new(r#"{"zoom": {"min": 0.25, "max": 4.0, "step": 0.5, "initial": 1.0}}"#);
    assert!(h.send(Message::ZoomIn));
    assert_eq!(h.state.viewport.zoom, 1.5);

    h.send(Message::PointerDown {
        target: HitTarget::empty(),
        screen: Position::new(600.0, 600.0),
    });
    h.send(Message::PointerMove {
        screen: Position::new(630.0, 600.0),
    });
    h.send(Message::PointerUp {
        target: HitTarget::empty(),
        screen: Position::new(630.0, 600.0),
    });

    let scene = render(&h.state);
    assert_eq!(scene.zoom, 1.5);
    let agent = scene.nodes.iter().find(|n| n.id == "agent").unwrap();
    assert!((agent.x - (300.0 + 20.0) * 1.5).abs() < 1e-9);
    assert!((agent.width - 256.0 * 1.5).abs() < 1e-9);
}

#[test]
fn deleting_the_agent_clears_the_scene_edges() {
    let mut h = Harness::new("{}");
    h.draw(("trigger", "output"), ("agent", "input-trigger"));
    assert!(h.send(Message::DeleteNode {
        node_id: "agent".into(),
    }));

    let scene = render(&h.state);
    assert!(scene.edges.is_empty());
    assert!(scene.nodes.iter().all(|n| n.id != "agent"));
    let trigger = scene.nodes.iter().find(|n| n.id == "trigger").unwrap();
    assert!(trigger.connectors.iter().all(|c| !c.connected));
    assert!(h.host.log.ends_with(&["connectionDeleted", "nodeDeleted"]));
}

#[test]
fn bad_config_is_refused() {
    assert!(CanvasConfig::from_json(r#"{"zoom": {"min": 0.0}}"#).is_err());
    assert!(CanvasConfig::from_json("not json").is_err());
}
