//! Browser glue: DOM marker extraction, session-scoped document listeners and
//! the `CanvasHandle` exported to JavaScript hosts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, PointerEvent, WheelEvent};

use crate::callbacks::{dispatch, CanvasCallbacks};
use crate::canvas::hit::{HitTarget, Marker};
use crate::canvas::renderer;
use crate::config::CanvasConfig;
use crate::constants::{ATTR_CONNECTOR_ID, ATTR_INTERACTIVE, ATTR_NODE_ID};
use crate::messages::{CanvasEvent, Message};
use crate::models::{Position, WorkflowSnapshot};
use crate::node_builder::NodeSpec;
use crate::reducers::canvas::update;
use crate::state::CanvasState;
use crate::{debug_log, warn_log};

/// Handler name called with a fresh scene after every state change.
const RENDER_HANDLER: &str = "render";
/// Handler name receiving every event.
const ANY_HANDLER: &str = "*";

impl HitTarget {
    /// Markers of `element` and all its ancestors, deepest first.
    pub fn from_element(element: &Element) -> Self {
        let mut target = HitTarget::empty();
        let mut current = Some(element.clone());
        while let Some(el) = current {
            target.push(marker_of(&el));
            current = el.parent_element();
        }
        target
    }
}

fn marker_of(el: &Element) -> Marker {
    let is_control = matches!(
        el.tag_name().as_str(),
        "BUTTON" | "INPUT" | "SELECT" | "TEXTAREA"
    );
    Marker {
        node_id: el.get_attribute(ATTR_NODE_ID),
        connector_id: el.get_attribute(ATTR_CONNECTOR_ID),
        interactive: is_control || el.has_attribute(ATTR_INTERACTIVE),
    }
}

fn screen_point(event: &PointerEvent) -> Position {
    Position::new(event.client_x() as f64, event.client_y() as f64)
}

fn event_target(event: &PointerEvent) -> HitTarget {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .map(|el| HitTarget::from_element(&el))
        .unwrap_or_default()
}

type PointerClosure = Closure<dyn FnMut(PointerEvent)>;

/// `pointermove` / `pointerup` / `pointercancel` on the document for the
/// lifetime of one session.  Dropping the guard removes them.
pub struct DocumentListeners {
    document: Document,
    on_move: PointerClosure,
    on_up: PointerClosure,
    on_cancel: PointerClosure,
}

impl DocumentListeners {
    pub fn attach(
        document: &Document,
        on_move: PointerClosure,
        on_up: PointerClosure,
        on_cancel: PointerClosure,
    ) -> Result<Self, JsValue> {
        let listeners = Self {
            document: document.clone(),
            on_move,
            on_up,
            on_cancel,
        };
        for (name, closure) in listeners.bindings() {
            listeners
                .document
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        }
        Ok(listeners)
    }

    fn bindings(&self) -> [(&'static str, &PointerClosure); 3] {
        [
            ("pointermove", &self.on_move),
            ("pointerup", &self.on_up),
            ("pointercancel", &self.on_cancel),
        ]
    }

    /// Unregister from the document.  Safe to call more than once.
    pub fn detach(&self) {
        for (name, closure) in self.bindings() {
            let _ = self
                .document
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for DocumentListeners {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Named JS handlers registered through `CanvasHandle::on`.
#[derive(Clone, Default)]
struct JsCallbacks {
    handlers: HashMap<String, js_sys::Function>,
}

impl JsCallbacks {
    fn call(&self, name: &str, payload: &JsValue) {
        if let Some(handler) = self.handlers.get(name) {
            if let Err(err) = handler.call1(&JsValue::NULL, payload) {
                warn_log!("Canvas handler '{}' threw: {:?}", name, err);
            }
        }
    }
}

impl CanvasCallbacks for JsCallbacks {
    fn on_event(&mut self, event: &CanvasEvent) {
        match serde_wasm_bindgen::to_value(event) {
            Ok(payload) => {
                self.call(event.name(), &payload);
                self.call(ANY_HANDLER, &payload);
            }
            Err(err) => warn_log!("Failed to serialize {}: {}", event.name(), err),
        }
    }
}

struct Inner {
    state: CanvasState,
    /// Element whose top-left corner is the canvas origin on screen.
    root: Option<Element>,
    listeners: Option<DocumentListeners>,
    /// Detached listeners waiting to be dropped outside their own invocation.
    retired: Vec<DocumentListeners>,
}

struct Shared {
    inner: RefCell<Inner>,
    callbacks: RefCell<JsCallbacks>,
}

fn apply(shared: &Rc<Shared>, msg: Message) -> Result<bool, JsValue> {
    let mut events = Vec::new();
    let (redraw, scene) = {
        let mut inner = shared.inner.borrow_mut();
        let redraw = update(&mut inner.state, &msg, &mut events);
        sync_listeners(shared, &mut inner, &events)?;
        let scene = if redraw {
            Some(serde_wasm_bindgen::to_value(&renderer::render(&inner.state))?)
        } else {
            None
        };
        (redraw, scene)
    };

    // Handlers may call back into the handle, so nothing stays borrowed.
    let mut callbacks = shared.callbacks.borrow().clone();
    dispatch(&events, &mut callbacks);
    if let Some(scene) = scene {
        callbacks.call(RENDER_HANDLER, &scene);
    }
    Ok(redraw)
}

fn sync_listeners(shared: &Rc<Shared>, inner: &mut Inner, events: &[CanvasEvent]) -> Result<(), JsValue> {
    for event in events {
        match event {
            CanvasEvent::SessionStarted { .. } if inner.listeners.is_none() => {
                inner.listeners = Some(attach_listeners(Rc::downgrade(shared))?);
            }
            CanvasEvent::SessionEnded { .. } => {
                if let Some(listeners) = inner.listeners.take() {
                    listeners.detach();
                    inner.retired.push(listeners);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn attach_listeners(weak: Weak<Shared>) -> Result<DocumentListeners, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let pointer_handler = |make: fn(&PointerEvent) -> Message| {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |event: PointerEvent| {
            if let Some(shared) = weak.upgrade() {
                if let Err(err) = apply(&shared, make(&event)) {
                    warn_log!("Canvas pointer handler failed: {:?}", err);
                }
            }
        }) as Box<dyn FnMut(PointerEvent)>)
    };

    DocumentListeners::attach(
        &document,
        pointer_handler(|event| Message::PointerMove {
            screen: screen_point(event),
        }),
        pointer_handler(|event| Message::PointerUp {
            target: event_target(event),
            screen: screen_point(event),
        }),
        pointer_handler(|_| Message::CancelSession),
    )
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Canvas engine instance owned by a JavaScript host.
#[wasm_bindgen]
pub struct CanvasHandle {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl CanvasHandle {
    /// `config_json` overrides any part of the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CanvasHandle, JsValue> {
        let config = match config_json {
            Some(raw) => CanvasConfig::from_json(&raw).map_err(to_js)?,
            None => CanvasConfig::default(),
        };
        Ok(CanvasHandle {
            shared: Rc::new(Shared {
                inner: RefCell::new(Inner {
                    state: CanvasState::new(config),
                    root: None,
                    listeners: None,
                    retired: Vec::new(),
                }),
                callbacks: RefCell::new(JsCallbacks::default()),
            }),
        })
    }

    /// Element the canvas is drawn into; its bounding box origin is used to
    /// map pointer coordinates.
    pub fn mount(&self, root: Element) {
        self.shared.inner.borrow_mut().root = Some(root);
    }

    /// Register `handler` for an event name (`nodeMoved`, `render`, `*`, ...).
    pub fn on(&self, event_name: &str, handler: js_sys::Function) {
        self.shared
            .callbacks
            .borrow_mut()
            .handlers
            .insert(event_name.to_string(), handler);
    }

    pub fn off(&self, event_name: &str) {
        self.shared.callbacks.borrow_mut().handlers.remove(event_name);
    }

    pub fn load(&self, snapshot_json: &str) -> Result<(), JsValue> {
        let snapshot = WorkflowSnapshot::from_json(snapshot_json).map_err(to_js)?;
        apply(&self.shared, Message::LoadSnapshot(snapshot)).map(|_| ())
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.shared.inner.borrow().state.snapshot().to_json().map_err(to_js)
    }

    pub fn scene(&self) -> Result<JsValue, JsValue> {
        let inner = self.shared.inner.borrow();
        Ok(serde_wasm_bindgen::to_value(&renderer::render(&inner.state))?)
    }

    pub fn zoom_in(&self) -> Result<bool, JsValue> {
        apply(&self.shared, Message::ZoomIn)
    }

    pub fn zoom_out(&self) -> Result<bool, JsValue> {
        apply(&self.shared, Message::ZoomOut)
    }

    pub fn auto_layout(&self, container_width: f64) -> Result<bool, JsValue> {
        apply(&self.shared, Message::AutoLayout { container_width })
    }

    /// `spec` is a `{ data, name?, position? }` object.
    pub fn add_node(&self, spec: JsValue) -> Result<bool, JsValue> {
        let spec: NodeSpec = serde_wasm_bindgen::from_value(spec)?;
        apply(&self.shared, Message::AddNode { spec })
    }

    pub fn delete_node(&self, node_id: &str) -> Result<bool, JsValue> {
        apply(&self.shared, Message::DeleteNode { node_id: node_id.to_string() })
    }

    pub fn delete_connection(&self, connection_id: &str) -> Result<bool, JsValue> {
        apply(
            &self.shared,
            Message::DeleteConnection {
                connection_id: connection_id.to_string(),
            },
        )
    }

    pub fn request_add_node_on_connection(&self, connection_id: &str) -> Result<bool, JsValue> {
        apply(
            &self.shared,
            Message::RequestAddNodeOnConnection {
                connection_id: connection_id.to_string(),
            },
        )
    }

    pub fn set_node_disabled(&self, node_id: &str, disabled: bool) -> Result<bool, JsValue> {
        apply(
            &self.shared,
            Message::SetNodeDisabled {
                node_id: node_id.to_string(),
                disabled,
            },
        )
    }

    pub fn set_node_processing(&self, node_id: &str, processing: bool) -> Result<bool, JsValue> {
        apply(
            &self.shared,
            Message::SetNodeProcessing {
                node_id: node_id.to_string(),
                processing,
            },
        )
    }

    pub fn cancel(&self) -> Result<bool, JsValue> {
        apply(&self.shared, Message::CancelSession)
    }

    /// Wire to the canvas element's `pointerdown`.  Starts a drag, edge draw
    /// or pan depending on what was pressed, and listens on the document
    /// until the session ends.
    pub fn pointer_down(&self, event: PointerEvent) -> Result<(), JsValue> {
        self.refresh_origin();
        let msg = Message::PointerDown {
            target: event_target(&event),
            screen: screen_point(&event),
        };
        let started = apply(&self.shared, msg)?;
        if started {
            event.prevent_default();
        }
        Ok(())
    }

    /// Wire to the canvas element's `pointermove` for hover feedback.
    pub fn pointer_hover(&self, event: PointerEvent) -> Result<(), JsValue> {
        if self.shared.inner.borrow().state.session.is_active() {
            // The document listener already handles it.
            return Ok(());
        }
        self.refresh_origin();
        apply(&self.shared, Message::PointerMove { screen: screen_point(&event) }).map(|_| ())
    }

    /// Wire to the canvas element's `wheel` (registered non-passive).
    pub fn wheel(&self, event: WheelEvent) -> Result<(), JsValue> {
        self.refresh_origin();
        let screen = Position::new(event.client_x() as f64, event.client_y() as f64);
        if apply(&self.shared, Message::Wheel { delta_y: event.delta_y(), screen })? {
            event.prevent_default();
        }
        Ok(())
    }
}

impl CanvasHandle {
    /// Drop retired listeners and re-read the root's screen offset.
    fn refresh_origin(&self) {
        let mut inner = self.shared.inner.borrow_mut();
        inner.retired.clear();
        let Some(rect) = inner.root.as_ref().map(Element::get_bounding_client_rect) else {
            return;
        };
        let origin = Position::new(rect.left(), rect.top());
        if inner.state.viewport.origin != origin {
            debug_log!("Canvas origin moved to ({}, {})", origin.x, origin.y);
            inner.state.viewport.origin = origin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::hit::PressTarget;
    use crate::models::ConnectorRef;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    #[wasm_bindgen_test]
    fn markers_are_read_deepest_first() {
        let doc = document();
        let node = doc.create_element("div").unwrap();
        node.set_attribute(ATTR_NODE_ID, "a1").unwrap();
        let dot = doc.create_element("span").unwrap();
        dot.set_attribute(ATTR_NODE_ID, "a1").unwrap();
        dot.set_attribute(ATTR_CONNECTOR_ID, "output-main").unwrap();
        node.append_child(&dot).unwrap();

        let target = HitTarget::from_element(&dot);
        assert_eq!(target.markers().len(), 2);
        assert_eq!(target.drop_connector(), Some(ConnectorRef::new("a1", "output-main")));
        assert_eq!(HitTarget::from_element(&node).classify_press(), PressTarget::Node("a1".into()));
    }

    #[wasm_bindgen_test]
    fn buttons_inside_nodes_are_interactive() {
        let doc = document();
        let node = doc.create_element("div").unwrap();
        node.set_attribute(ATTR_NODE_ID, "a1").unwrap();
        let button = doc.create_element("button").unwrap();
        node.append_child(&button).unwrap();
        assert_eq!(HitTarget::from_element(&button).classify_press(), PressTarget::Interactive);
    }

    #[wasm_bindgen_test]
    fn handle_round_trips_snapshot() {
        let handle = CanvasHandle::new(None).unwrap();
        handle
            .load(r#"{"nodes": [{"id": "t", "name": "T", "position": {"x": 0, "y": 0}, "data": {"type": "CHAT_TRIGGER"}}]}"#)
            .unwrap();
        let json = handle.snapshot_json().unwrap();
        let snapshot = WorkflowSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.nodes[0].connectors.contains_key("output"));
    }

    #[wasm_bindgen_test]
    fn dropping_listeners_is_idempotent() {
        let noop = || Closure::wrap(Box::new(|_event: PointerEvent| {}) as Box<dyn FnMut(PointerEvent)>);
        let listeners = DocumentListeners::attach(&document(), noop(), noop(), noop()).unwrap();
        listeners.detach();
        drop(listeners);
    }
}
