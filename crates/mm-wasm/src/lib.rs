//! WASM bridge for Mind Architect: exposes the mind-map editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the study app's
//! mind-map page. Every call that can change the picture returns whether
//! the host should redraw; richer answers come back as JSON strings.

mod render2d;
mod storage;

use mm_core::id::NodeId;
use mm_core::model::Diagram;
use mm_core::outline::{emit_outline, parse_outline};
use mm_core::snapshot;
use mm_core::store::{self, UserData};
use mm_editor::shortcuts::{ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use mm_editor::{Editor, EventOutcome, InputEvent};
use mm_render::{SvgOptions, Theme, render_svg};
use render2d::Highlight;
use serde::Serialize;
use serde_json::json;
use storage::LocalStorage;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Holds the editor and the canvas size. All interaction from the page's
/// JS goes through this struct.
#[wasm_bindgen]
pub struct MindMapCanvas {
    editor: Editor,
    width: f64,
    height: f64,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeBox<'a> {
    id: &'a str,
    text: &'a str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryItem<'a> {
    id: &'a str,
    title: &'a str,
    timestamp: u64,
}

#[wasm_bindgen]
impl MindMapCanvas {
    /// Create a new canvas controller with the given dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();

        let mut editor = Editor::default();
        editor.engine.set_screen_size(width as f32, height as f32);
        Self {
            editor,
            width,
            height,
            dark_mode: false,
        }
    }

    /// Replace the diagram with a JSON snapshot.
    /// Returns `false` and keeps the current diagram if it is malformed.
    pub fn load_json(&mut self, json: &str) -> bool {
        match snapshot::from_json(json) {
            Ok(diagram) => {
                self.editor.load(diagram);
                true
            }
            Err(e) => {
                log::warn!("load_json: {e}");
                false
            }
        }
    }

    /// The current diagram as a JSON snapshot.
    pub fn to_json(&self) -> String {
        self.editor.engine.to_json().unwrap_or_default()
    }

    /// Replace the diagram with an indented outline. Returns `false` on a
    /// parse error.
    pub fn load_outline(&mut self, text: &str) -> bool {
        match parse_outline(text) {
            Ok(map) => {
                self.editor.load(Diagram::new(map, Default::default()));
                true
            }
            Err(e) => {
                log::warn!("load_outline: {e}");
                false
            }
        }
    }

    pub fn to_outline(&self) -> String {
        emit_outline(&self.editor.engine.diagram.map)
    }

    /// Start over with a fresh "Central Topic" diagram.
    pub fn reset(&mut self) {
        self.editor.load(Diagram::default());
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Render the diagram to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let engine = &self.editor.engine;
        render2d::render_diagram(
            ctx,
            &engine.diagram.map,
            engine.layout(),
            &engine.view(),
            self.width,
            self.height,
            Highlight {
                selected: engine.selected(),
                editing: engine.editing(),
            },
            &self.theme(),
        );
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.editor
            .engine
            .set_screen_size(width as f32, height as f32);
    }

    /// Standalone SVG of the current view window.
    pub fn export_svg(&self) -> String {
        let engine = &self.editor.engine;
        let options = SvgOptions {
            view: Some(engine.view()),
            selected: None,
            theme: self.theme(),
            size: Some((self.width as f32, self.height as f32)),
        };
        render_svg(&engine.diagram.map, engine.layout(), &options)
    }

    /// Every laid-out node with its label, plus the connectors, as JSON:
    /// `{"nodes":[{id,text,x,y,width,height}], "connectors":[...]}`.
    pub fn get_layout_json(&self) -> String {
        let engine = &self.editor.engine;
        let nodes: Vec<NodeBox<'_>> = engine
            .layout()
            .nodes()
            .map(|n| NodeBox {
                id: n.id.as_str(),
                text: engine
                    .diagram
                    .map
                    .get_by_id(n.id)
                    .map_or("", |m| m.text.as_str()),
                x: n.x,
                y: n.y,
                width: n.width,
                height: n.height,
            })
            .collect();
        json!({ "nodes": nodes, "connectors": engine.layout().connectors() }).to_string()
    }

    /// Screen-space box of a node, for placing the label input over it.
    /// Returns `""` for an unknown id.
    pub fn get_node_bounds(&self, node_id: &str) -> String {
        let engine = &self.editor.engine;
        let Some(node) = NodeId::lookup(node_id).and_then(|id| engine.layout().get(id)) else {
            return String::new();
        };
        let view = engine.view();
        let (w, h) = engine.screen_size();
        let (left, top) = view.diagram_to_screen(node.left(), node.top(), w, h);
        let (right, bottom) = view.diagram_to_screen(node.right(), node.bottom(), w, h);
        json!({ "x": left, "y": top, "width": right - left, "height": bottom - top }).to_string()
    }

    /// The view window as JSON `{x, y, width, height}`.
    pub fn get_view_box(&self) -> String {
        serde_json::to_string(&self.editor.engine.view()).unwrap_or_default()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Handle pointer down event. Returns true if a redraw is needed.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.editor
            .handle_event(&InputEvent::PointerDown { x, y })
            .changed
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.editor
            .handle_event(&InputEvent::PointerMove { x, y })
            .changed
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.editor
            .handle_event(&InputEvent::PointerUp { x, y })
            .changed
    }

    pub fn handle_double_click(&mut self, x: f32, y: f32) -> bool {
        self.editor
            .handle_event(&InputEvent::DoubleClick { x, y })
            .changed
    }

    pub fn handle_wheel(&mut self, delta_y: f32) -> bool {
        self.editor
            .handle_event(&InputEvent::Wheel { delta_y })
            .changed
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "saveRequested":bool, "selected":id|null, "editing":id|null}`
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let outcome = self.editor.handle_event(&InputEvent::Key {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
        });
        self.outcome_json(outcome)
    }

    // ─── Structural operations ───────────────────────────────────────────

    /// Add a child under the selection and start editing it.
    /// Returns the new node's id, or `""` when nothing is selected.
    pub fn add_child(&mut self) -> String {
        self.editor
            .add_child()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Delete the selected node and its subtree.
    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selected()
    }

    pub fn rename(&mut self, node_id: &str, text: &str) -> bool {
        NodeId::lookup(node_id).is_some_and(|id| self.editor.rename(id, text))
    }

    /// Commit the label input and leave edit mode.
    pub fn commit_edit(&mut self, text: &str) -> bool {
        self.editor.commit_edit(text)
    }

    /// Leave edit mode without changing the label.
    pub fn cancel_edit(&mut self) -> bool {
        self.editor.engine.finish_edit().is_some()
    }

    pub fn select_by_id(&mut self, node_id: &str) -> bool {
        NodeId::lookup(node_id).is_some_and(|id| self.editor.engine.select(id))
    }

    /// Get the selected node's id, or `""`.
    pub fn get_selected_id(&self) -> String {
        id_or_empty(self.editor.engine.selected())
    }

    /// Get the id of the node being edited, or `""`.
    pub fn get_editing_id(&self) -> String {
        id_or_empty(self.editor.engine.editing())
    }

    pub fn undo(&mut self) -> bool {
        self.editor.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo().is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Toolbar "zoom in" button.
    pub fn zoom_in(&mut self) {
        self.editor.engine.zoom(ZOOM_IN_FACTOR);
    }

    /// Toolbar "zoom out" button.
    pub fn zoom_out(&mut self) {
        self.editor.engine.zoom(ZOOM_OUT_FACTOR);
    }

    pub fn zoom_to_fit(&mut self) {
        self.editor.engine.zoom_to_fit();
    }

    // ─── Persistence (localStorage) ──────────────────────────────────────

    /// Save the diagram as a snapshot under `key`.
    pub fn save_snapshot(&self, key: &str) -> bool {
        let result = LocalStorage::open().and_then(|mut s| self.editor.save(&mut s, key));
        report("save_snapshot", result).is_some()
    }

    /// Load the snapshot under `key`, or the default diagram when nothing
    /// (or nothing readable) is saved there.
    pub fn load_snapshot(&mut self, key: &str) -> bool {
        let result = LocalStorage::open().and_then(|s| store::load_or_default(&s, key));
        match report("load_snapshot", result) {
            Some(diagram) => {
                self.editor.load(diagram);
                true
            }
            None => false,
        }
    }

    /// Save the diagram into the user's mind-map history. Returns JSON
    /// `{"ok":true,"id":"mindmap-…"}` or `{"ok":false,"error":"…"}`.
    pub fn save_to_history(&self, username: &str) -> String {
        let timestamp = js_sys::Date::now() as u64;
        let result = LocalStorage::open()
            .and_then(|mut s| self.editor.save_to_history(&mut s, username, timestamp));
        match result {
            Ok(id) => json!({ "ok": true, "id": id }).to_string(),
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// The user's saved mind maps as JSON `[{id, title, timestamp}]`,
    /// newest first.
    pub fn list_history(&self, username: &str) -> String {
        let result = LocalStorage::open().and_then(|s| UserData::load(&s, username));
        let Some(data) = report("list_history", result) else {
            return "[]".to_string();
        };
        let items: Vec<HistoryItem<'_>> = data
            .mind_maps
            .iter()
            .map(|m| HistoryItem {
                id: &m.id,
                title: &m.title,
                timestamp: m.timestamp,
            })
            .collect();
        serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
    }

    /// Open a saved mind map; later saves overwrite that entry.
    pub fn open_from_history(&mut self, username: &str, id: &str) -> bool {
        let result = LocalStorage::open().and_then(|mut s| {
            let mut data = UserData::load(&s, username)?;
            let Some(entry) = data.mind_map(id) else {
                return Ok(None);
            };
            let diagram = entry.diagram()?;
            data.active_item_id = Some(id.to_string());
            data.save(&mut s, username)?;
            Ok(Some(diagram))
        });
        match report("open_from_history", result).flatten() {
            Some(diagram) => {
                self.editor.load(diagram);
                true
            }
            None => false,
        }
    }

    /// Start a new mind map; the next save creates a new history entry.
    pub fn new_in_history(&mut self, username: &str) -> bool {
        let result = LocalStorage::open().and_then(|mut s| {
            let mut data = UserData::load(&s, username)?;
            data.active_item_id = None;
            data.save(&mut s, username)
        });
        self.editor.load(Diagram::default());
        report("new_in_history", result).is_some()
    }

    pub fn delete_from_history(&mut self, username: &str, id: &str) -> bool {
        let result = LocalStorage::open().and_then(|mut s| {
            let mut data = UserData::load(&s, username)?;
            let removed = data.delete_mind_map(id);
            if removed {
                data.save(&mut s, username)?;
            }
            Ok(removed)
        });
        report("delete_from_history", result).unwrap_or(false)
    }
}

impl MindMapCanvas {
    fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::dark()
        } else {
            Theme::light()
        }
    }

    fn outcome_json(&self, outcome: EventOutcome) -> String {
        let engine = &self.editor.engine;
        json!({
            "changed": outcome.changed,
            "saveRequested": outcome.save_requested,
            "selected": engine.selected().map(|id| id.as_str().to_string()),
            "editing": engine.editing().map(|id| id.as_str().to_string()),
        })
        .to_string()
    }
}

fn id_or_empty(id: Option<NodeId>) -> String {
    id.map(|id| id.as_str().to_string()).unwrap_or_default()
}

fn report<T>(op: &str, result: mm_core::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{op}: {e}");
            web_sys::console::warn_1(&format!("{op}: {e}").into());
            None
        }
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Mind map WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate a snapshot. Returns JSON: `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match snapshot::from_json(json) {
        Ok(_) => json!({ "ok": true }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

/// Convert an indented outline to a snapshot.
/// Returns JSON `{"ok":true,"snapshot":{...}}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn outline_to_json(text: &str) -> String {
    let diagram = match parse_outline(text) {
        Ok(map) => Diagram::new(map, Default::default()),
        Err(e) => return json!({ "ok": false, "error": e }).to_string(),
    };
    match serde_json::to_value(snapshot::Snapshot::of(&diagram)) {
        Ok(value) => json!({ "ok": true, "snapshot": value }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const POLITY: &str = include_str!("../tests/fixtures/polity.json");

    fn canvas() -> MindMapCanvas {
        let mut canvas = MindMapCanvas::new(600.0, 600.0);
        assert!(canvas.load_json(POLITY));
        canvas
    }

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).expect("valid JSON")
    }

    #[test]
    fn malformed_load_keeps_diagram() {
        let mut canvas = canvas();
        let before = canvas.to_json();
        assert!(!canvas.load_json("{\"viewBox\":{}}"));
        assert_eq!(canvas.to_json(), before);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut canvas = canvas();
        let before = canvas.to_json();
        assert!(!canvas.select_by_id("host-typo-1"));
        assert!(!canvas.rename("host-typo-2", "Renamed"));
        assert_eq!(canvas.get_node_bounds("host-typo-3"), "");
        assert_eq!(canvas.to_json(), before);
        for id in ["host-typo-1", "host-typo-2", "host-typo-3"] {
            assert_eq!(NodeId::lookup(id), None);
        }
    }

    #[test]
    fn key_outcome_reports_edit_state() {
        let mut canvas = canvas();
        canvas.select_by_id("executive");
        let out = parse(&canvas.handle_key("Tab", false, false, false, false));
        assert_eq!(out["changed"], true);
        assert_eq!(out["saveRequested"], false);
        let editing = out["editing"].as_str().expect("editing a new node");
        assert_eq!(out["selected"].as_str(), Some(editing));

        assert!(canvas.commit_edit("President"));
        assert_eq!(canvas.get_editing_id(), "");
        let out = parse(&canvas.handle_key("s", true, false, false, false));
        assert_eq!(out["saveRequested"], true);
    }

    #[test]
    fn layout_json_lists_every_node() {
        let canvas = canvas();
        let layout = parse(&canvas.get_layout_json());
        let nodes = layout["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 7);
        assert_eq!(nodes[0]["id"], "root");
        assert_eq!(nodes[0]["text"], "Indian Polity");
        assert_eq!(layout["connectors"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn node_bounds_in_screen_space() {
        let canvas = canvas();
        // Default window {-300,-300,600,600} on a 600×600 canvas is 1:1.
        let b = parse(&canvas.get_node_bounds("root"));
        assert_eq!(b["x"], 220.0);
        assert_eq!(b["y"], 275.0);
        assert_eq!(b["width"], 160.0);
        assert_eq!(b["height"], 50.0);
        assert_eq!(canvas.get_node_bounds("nope"), "");
    }

    #[test]
    fn delete_and_undo_through_bridge() {
        let mut canvas = canvas();
        assert!(canvas.select_by_id("judiciary"));
        assert!(canvas.delete_selected());
        assert_eq!(canvas.get_selected_id(), "root");
        assert!(canvas.can_undo());
        assert!(canvas.undo());
        assert!(canvas.get_layout_json().contains("supreme_court"));
    }

    #[test]
    fn export_svg_uses_view_window() {
        let canvas = canvas();
        let svg = canvas.export_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"-300 -300 600 600\""));
        assert!(svg.contains("Indian Polity"));
    }

    #[test]
    fn standalone_validate() {
        assert_eq!(parse(&validate(POLITY))["ok"], true);
        assert_eq!(parse(&validate("not json"))["ok"], false);
    }

    #[test]
    fn outline_conversion() {
        let out = parse(&outline_to_json("Economy\n  - GDP\n  - Inflation\n"));
        assert_eq!(out["ok"], true);
        assert_eq!(out["snapshot"]["root"]["text"], "Economy");
        assert_eq!(out["snapshot"]["root"]["children"].as_array().unwrap().len(), 2);
    }
}
