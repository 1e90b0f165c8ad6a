use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::constants::*;
use crate::models::{Connection, ConnectorDirection, ConnectorRef, NodeData, WorkflowSnapshot};
use crate::node_builder::{NodeBuilder, NodeSpec};
use crate::state::CanvasState;

/// Back-references mirror the connection list exactly, inputs carry at most
/// one inbound edge and nothing loops onto itself.
fn assert_consistent(state: &CanvasState) {
    let mut inbound: BTreeSet<ConnectorRef> = BTreeSet::new();
    for conn in state.connections() {
        assert_ne!(conn.from_node_id, conn.to_node_id, "self-loop {}", conn.id);
        let from = state.node(&conn.from_node_id).expect("dangling source");
        let to = state.node(&conn.to_node_id).expect("dangling target");
        assert!(from.connected_to(&conn.from_connector_id).contains(&conn.to_ref()));
        assert!(to.connected_to(&conn.to_connector_id).contains(&conn.from_ref()));
        assert!(inbound.insert(conn.to_ref()), "second inbound on {:?}", conn.to_ref());
    }

    let refs: usize = state
        .nodes
        .iter()
        .flat_map(|n| n.connectors.values())
        .map(|c| c.connected_to.len())
        .sum();
    assert_eq!(refs, 2 * state.connections().len());

    for node in &state.nodes {
        let layout = state.config.registry.get(node.kind()).unwrap();
        for (id, spec) in &layout.connectors {
            let connector = node.connectors.get(id).expect("registry connector missing");
            assert_eq!(connector.direction, spec.direction);
            if spec.direction == ConnectorDirection::Input {
                assert!(connector.connected_to.len() <= 1);
            }
        }
    }
}

fn connect(state: &mut CanvasState, from: (&str, &str), to: (&str, &str)) -> Result<Connection, crate::RejectionReason> {
    state.graph.try_create_connection(
        &mut state.nodes,
        &state.config,
        &ConnectorRef::new(from.0, from.1),
        &ConnectorRef::new(to.0, to.1),
    )
}

fn agent_spec() -> NodeSpec {
    NodeSpec::new(NodeBuilder::agent().build().data)
}

#[test]
fn deleting_a_connection_clears_both_ends() {
    let mut state = CanvasState::default();
    state.load_snapshot(WorkflowSnapshot {
        nodes: vec![
            NodeBuilder::chat_trigger().id("t").at(0.0, 0.0).build(),
            NodeBuilder::agent().id("a").at(300.0, 0.0).build(),
        ],
        connections: vec![],
    });
    let conn = connect(&mut state, ("t", CONNECTOR_OUTPUT), ("a", CONNECTOR_INPUT_TRIGGER)).unwrap();
    assert_consistent(&state);

    assert_eq!(state.delete_connection(&conn.id), Some(conn.clone()));
    assert!(state.node("t").unwrap().connected_to(CONNECTOR_OUTPUT).is_empty());
    assert!(state.node("a").unwrap().connected_to(CONNECTOR_INPUT_TRIGGER).is_empty());
    assert_eq!(state.delete_connection(&conn.id), None);
    assert_consistent(&state);
}

#[test]
fn deleting_a_node_takes_its_edges_and_companions() {
    let mut state = CanvasState::default();
    let upstream = state.add_node(agent_spec().at(0.0, 0.0)).unwrap().nodes[0].id.clone();
    let middle = state.add_node(agent_spec().at(400.0, 0.0)).unwrap().nodes[0].id.clone();
    let downstream = state.add_node(agent_spec().at(800.0, 0.0)).unwrap().nodes[0].id.clone();
    connect(&mut state, (&upstream, CONNECTOR_OUTPUT_MAIN), (&middle, CONNECTOR_INPUT_TRIGGER)).unwrap();
    connect(&mut state, (&middle, CONNECTOR_OUTPUT_MAIN), (&downstream, CONNECTOR_INPUT_TRIGGER)).unwrap();
    assert_eq!(state.connections().len(), 5);

    let removed = state.delete_node(&middle).unwrap();
    assert_eq!(removed.node_ids.len(), 2);
    assert_eq!(removed.connections.len(), 3);
    assert_eq!(state.nodes.len(), 4);
    assert!(state.connections().iter().all(|c| !c.touches(&middle)));
    assert!(state.node(&upstream).unwrap().connected_to(CONNECTOR_OUTPUT_MAIN).is_empty());
    assert!(state.node(&downstream).unwrap().connected_to(CONNECTOR_INPUT_TRIGGER).is_empty());
    assert_consistent(&state);
}

#[test]
fn deleting_a_companion_clears_the_owner_reference() {
    let mut state = CanvasState::default();
    let added = state.add_node(agent_spec().at(0.0, 0.0)).unwrap();
    let (agent_id, model_id) = (added.nodes[0].id.clone(), added.nodes[1].id.clone());

    state.delete_node(&model_id).unwrap();
    match &state.node(&agent_id).unwrap().data {
        NodeData::Agent { model_node_id, .. } => assert_eq!(*model_node_id, None),
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(state.node(&agent_id).unwrap().connected_to(CONNECTOR_CHAT_MODEL).is_empty());
    assert!(state.delete_node(&model_id).is_err());
}

#[test]
fn snapshot_load_drops_what_cannot_stand() {
    let edge = |id: &str, from: &str, from_conn: &str, to: &str, to_conn: &str| Connection {
        id: id.into(),
        from_node_id: from.into(),
        from_connector_id: from_conn.into(),
        to_node_id: to.into(),
        to_connector_id: to_conn.into(),
    };
    let mut state = CanvasState::default();
    let dropped = state.load_snapshot(WorkflowSnapshot {
        nodes: vec![
            NodeBuilder::chat_trigger().id("t1").at(0.0, 0.0).build(),
            NodeBuilder::chat_trigger().id("t2").at(0.0, 200.0).build(),
            NodeBuilder::agent().id("a").at(300.0, 0.0).build(),
            NodeBuilder::agent().id("a").name("duplicate").at(600.0, 0.0).build(),
        ],
        connections: vec![
            edge("c1", "t1", CONNECTOR_OUTPUT, "a", CONNECTOR_INPUT_TRIGGER),
            edge("c2", "t2", CONNECTOR_OUTPUT, "a", CONNECTOR_INPUT_TRIGGER),
            edge("c3", "a", CONNECTOR_OUTPUT_MAIN, "a", CONNECTOR_INPUT_TRIGGER),
            edge("c4", "ghost", CONNECTOR_OUTPUT, "a", CONNECTOR_INPUT_TRIGGER),
            edge("c1", "t2", CONNECTOR_OUTPUT, "a", CONNECTOR_INPUT_TRIGGER),
        ],
    });

    assert_eq!(state.nodes.len(), 3);
    assert_eq!(state.node("a").unwrap().name, DEFAULT_AGENT_NAME);
    assert_eq!(state.connections().len(), 1);
    assert_eq!(state.connections()[0].id, "c1");
    assert_eq!(dropped.len(), 4);
    assert_consistent(&state);

    let round_trip = WorkflowSnapshot::from_json(&state.snapshot().to_json().unwrap()).unwrap();
    let mut reloaded = CanvasState::default();
    assert!(reloaded.load_snapshot(round_trip).is_empty());
    assert_eq!(reloaded.snapshot(), state.snapshot());
}

#[test]
fn reachability_follows_edges_and_companions() {
    let mut state = CanvasState::default();
    let trigger = state
        .add_node(NodeSpec::new(NodeBuilder::chat_trigger().build().data).at(0.0, 0.0))
        .unwrap()
        .nodes[0]
        .id
        .clone();
    let wired = state.add_node(agent_spec().at(300.0, 0.0)).unwrap();
    let orphan = state.add_node(agent_spec().at(700.0, 0.0)).unwrap();
    connect(&mut state, (&trigger, CONNECTOR_OUTPUT), (&wired.nodes[0].id, CONNECTOR_INPUT_TRIGGER)).unwrap();

    let reachable = state.graph.reachable_from_triggers(&state.nodes);
    assert!(reachable.contains(&trigger));
    assert!(reachable.contains(&wired.nodes[0].id));
    assert!(reachable.contains(&wired.nodes[1].id));
    assert!(!reachable.contains(&orphan.nodes[0].id));
    assert!(!reachable.contains(&orphan.nodes[1].id));
}

#[derive(Debug, Clone)]
enum Edit {
    AddAgent,
    AddTrigger,
    AddTool(usize),
    Connect { from: usize, from_conn: usize, to: usize, to_conn: usize },
    DeleteNode(usize),
    DeleteConnection(usize),
}

const CONNECTOR_IDS: [&str; 7] = [
    CONNECTOR_INPUT_TRIGGER,
    CONNECTOR_OUTPUT_MAIN,
    CONNECTOR_CHAT_MODEL,
    CONNECTOR_MEMORY,
    CONNECTOR_TOOL,
    CONNECTOR_INPUT,
    CONNECTOR_OUTPUT,
];

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        Just(Edit::AddAgent),
        Just(Edit::AddTrigger),
        (0usize..16).prop_map(Edit::AddTool),
        (0usize..16, 0usize..7, 0usize..16, 0usize..7).prop_map(|(from, from_conn, to, to_conn)| Edit::Connect {
            from,
            from_conn,
            to,
            to_conn
        }),
        (0usize..16).prop_map(Edit::DeleteNode),
        (0usize..16).prop_map(Edit::DeleteConnection),
    ]
}

fn pick<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

proptest! {
    #[test]
    fn random_edits_keep_the_graph_consistent(edits in prop::collection::vec(edit_strategy(), 1..40)) {
        let mut state = CanvasState::default();
        for edit in edits {
            match edit {
                Edit::AddAgent => {
                    state.add_node(agent_spec()).unwrap();
                }
                Edit::AddTrigger => {
                    state.add_node(NodeSpec::new(NodeBuilder::chat_trigger().build().data)).unwrap();
                }
                Edit::AddTool(i) => {
                    let agents: Vec<String> = state
                        .nodes
                        .iter()
                        .filter(|n| matches!(n.data, NodeData::Agent { .. }))
                        .map(|n| n.id.clone())
                        .collect();
                    if let Some(owner) = pick(&agents, i) {
                        let spec = NodeSpec::new(NodeBuilder::tool(owner, "search").build().data);
                        state.add_node(spec).unwrap();
                    }
                }
                Edit::Connect { from, from_conn, to, to_conn } => {
                    let ids: Vec<String> = state.nodes.iter().map(|n| n.id.clone()).collect();
                    if let (Some(from), Some(to)) = (pick(&ids, from), pick(&ids, to)) {
                        let before = state.connections().len();
                        match connect(&mut state, (from, CONNECTOR_IDS[from_conn]), (to, CONNECTOR_IDS[to_conn])) {
                            Ok(_) => prop_assert_eq!(state.connections().len(), before + 1),
                            Err(_) => prop_assert_eq!(state.connections().len(), before),
                        }
                    }
                }
                Edit::DeleteNode(i) => {
                    let ids: Vec<String> = state.nodes.iter().map(|n| n.id.clone()).collect();
                    if let Some(id) = pick(&ids, i) {
                        state.delete_node(id).unwrap();
                        prop_assert!(state.node(id).is_none());
                    }
                }
                Edit::DeleteConnection(i) => {
                    let ids: Vec<String> = state.connections().iter().map(|c| c.id.clone()).collect();
                    if let Some(id) = pick(&ids, i) {
                        prop_assert!(state.delete_connection(id).is_some());
                    }
                }
            }
            assert_consistent(&state);
        }
    }
}
