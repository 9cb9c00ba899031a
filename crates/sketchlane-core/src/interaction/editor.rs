//! The editor facade: routes input events through the interaction state
//! machine and owns everything a single local viewer needs.

use std::collections::HashSet;

use kurbo::{Point, Rect, Size, Vec2};

use super::draw::DraftState;
use super::erase::EraseState;
use super::input::{ClickTracker, Key, Modifiers, MouseButton, WheelEvent};
use super::laser::{LaserSweeper, expired_lasers};
use super::select::{BoxSelect, PICK_TOLERANCE, is_selectable, pick};
use super::text_edit::{TextEditOutcome, TextEditSession};
use super::tools::Tool;
use super::transform::{ConnectorEditState, DragState, ResizeState, RotateState};
use super::{InteractionState, Selection};
use crate::connector::edit::{self as connector_edit, ConnectorHandle};
use crate::elements::{Element, ElementId, TextProps};
use crate::geometry::handles::FrameHit;
use crate::geometry::{CursorKind, SelectionFrame, TextMetrics, hit_test, rotated_bounds};
use crate::host::{HostHooks, SelectionListener, ViewportCommand, ViewportSetter};
use crate::options::CanvasOptions;
use crate::presence::{PeerChange, PeerPresence, PresenceManager};
use crate::store::{Document, ElementPatch, ElementSink, Outbox, StoreOp};
use crate::viewport::Viewport;

/// Padding around content for [`Editor::fit_to_content`], in screen pixels.
pub const FIT_PADDING: f64 = 40.0;

/// Arrow-key nudge distances in world units.
pub const NUDGE_STEP: f64 = 1.0;
pub const NUDGE_STEP_LARGE: f64 = 10.0;

const DEFAULT_VIEWPORT_SIZE: Size = Size::new(800.0, 600.0);

/// One local viewer of a canvas.
///
/// Local mutations are applied to the editor's [`Document`] immediately and
/// recorded for the shared store; fetch them with [`Editor::take_store_ops`].
/// Ops arriving from the shared store go through [`Editor::apply_remote`].
pub struct Editor {
    doc: Document,
    outbox: Outbox,
    viewport: Viewport,
    viewport_size: Size,
    options: CanvasOptions,
    state: InteractionState,
    selection: Selection,
    presence: PresenceManager,
    metrics: TextMetrics,
    clicks: ClickTracker,
    hooks: HostHooks,
    laser_sweep: LaserSweeper,
    /// Last world position seen from the pointer.
    last_world: Point,
}

impl Editor {
    pub fn new(options: CanvasOptions, presence: PresenceManager) -> Self {
        Self {
            doc: Document::new(),
            outbox: Outbox::default(),
            viewport: Viewport::default(),
            viewport_size: DEFAULT_VIEWPORT_SIZE,
            options,
            state: InteractionState::Idle,
            selection: Selection::default(),
            presence,
            metrics: TextMetrics::default(),
            clicks: ClickTracker::default(),
            hooks: HostHooks::default(),
            laser_sweep: LaserSweeper::default(),
            last_world: Point::ZERO,
        }
    }

    /// An editor without peers.
    pub fn offline(options: CanvasOptions) -> Self {
        Self::new(options, PresenceManager::offline())
    }

    /// Start from an existing document (e.g. loaded by the host).
    pub fn with_document(mut self, doc: Document) -> Self {
        self.doc = doc;
        self
    }

    /// Use a custom text measurer, typically backed by the host's fonts.
    pub fn with_text_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    // --- accessors ---

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn selection(&self) -> &[ElementId] {
        self.selection.ids()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn options(&self) -> &CanvasOptions {
        &self.options
    }

    pub fn tool(&self) -> Tool {
        self.options.tool
    }

    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    /// Peer cursors to draw, honoring the show-remote-cursors option.
    pub fn remote_cursors(&self, now_ms: u64) -> Vec<(&PeerPresence, Point, f64)> {
        if !self.options.show_remote_cursors {
            return Vec::new();
        }
        self.presence.peers().visible_cursors(now_ms)
    }

    pub fn presence_mut(&mut self) -> &mut PresenceManager {
        &mut self.presence
    }

    /// The uncommitted element to draw on top of the document, if any.
    pub fn draft_element(&self) -> Option<&Element> {
        match &self.state {
            InteractionState::Drawing(draft) => Some(&draft.element),
            InteractionState::EditingText(session) => Some(session.draft()),
            _ => None,
        }
    }

    /// Id of the text element being edited. The host hides the stored copy
    /// and draws [`Editor::draft_element`] instead.
    pub fn editing_text_id(&self) -> Option<&str> {
        match &self.state {
            InteractionState::EditingText(session) => Some(session.id()),
            _ => None,
        }
    }

    /// Elements the eraser will delete on release.
    pub fn erase_marked(&self) -> &[ElementId] {
        match &self.state {
            InteractionState::Erasing(erase) => erase.marked(),
            _ => &[],
        }
    }

    pub fn erase_path(&self) -> &[Point] {
        match &self.state {
            InteractionState::Erasing(erase) => erase.path(),
            _ => &[],
        }
    }

    pub fn box_select_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::BoxSelecting(b) => Some(b.rect()),
            _ => None,
        }
    }

    fn selected_elements(&self) -> Vec<Element> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.doc.get(id).cloned())
            .collect()
    }

    /// Frame around the current selection.
    pub fn selection_frame(&self) -> Option<SelectionFrame> {
        let elements = self.selected_elements();
        let refs: Vec<&Element> = elements.iter().collect();
        SelectionFrame::for_elements(&refs)
    }

    fn single_selected_connector(&self) -> Option<Element> {
        match self.selected_elements().as_slice() {
            [single] if single.is_connector() => Some(single.clone()),
            _ => None,
        }
    }

    /// Connector handles when exactly one connector is selected.
    pub fn connector_handles(&self) -> Vec<ConnectorHandle> {
        self.single_selected_connector()
            .map(|c| connector_edit::handles(&c, self.viewport.zoom()))
            .unwrap_or_default()
    }

    /// Whether a remote peer currently holds `id` in its selection.
    pub fn is_locked(&self, id: &str) -> bool {
        self.presence.is_locked(id)
    }

    fn can_rotate_selection(&self) -> bool {
        match self.selected_elements().as_slice() {
            [single] => {
                !single.is_laser() && !(single.is_point_based() && single.points.len() < 3)
            }
            _ => false,
        }
    }

    // --- host hooks ---

    /// Hand the host a setter it can use to move the viewport from outside
    /// the event loop. Requests apply on the next [`Editor::tick`].
    pub fn on_set_viewport(&mut self, register: impl FnOnce(ViewportSetter)) {
        register(self.hooks.setter.clone());
    }

    pub fn viewport_setter(&self) -> ViewportSetter {
        self.hooks.setter.clone()
    }

    pub fn on_selection_change(&mut self, listener: impl FnMut(&[Element]) + 'static) {
        let listener: SelectionListener = Box::new(listener);
        self.hooks.add_selection_listener(listener);
    }

    // --- store plumbing ---

    /// Ops produced locally since the last call, in order.
    pub fn take_store_ops(&mut self) -> Vec<StoreOp> {
        self.outbox.take()
    }

    /// Apply an op from the shared store.
    pub fn apply_remote(&mut self, op: StoreOp) {
        let deleted = match &op {
            StoreOp::Delete { id } => Some(id.clone()),
            _ => None,
        };
        if !self.doc.apply(&op) {
            log::debug!("Remote op for {} did not apply", op.id());
        }
        if let Some(id) = deleted {
            if self.selection.contains(&id) {
                self.selection.remove(&id);
                self.selection_changed();
            }
        }
    }

    fn add(&mut self, element: Element) {
        log::debug!("Adding {} {}", element.type_name(), element.id);
        self.doc.insert(element.clone());
        self.outbox.add_element(element);
    }

    /// Store `updated` and record what changed relative to `original`.
    fn commit_update(&mut self, original: &Element, updated: Element) {
        let patch = ElementPatch::diff(original, &updated);
        let id = updated.id.clone();
        if !self.doc.replace(updated) {
            log::warn!("Skipping update for deleted element {id}");
            return;
        }
        if let Some(patch) = patch {
            self.outbox.update_element(&id, patch);
        }
    }

    fn delete(&mut self, id: &str) {
        if self.doc.remove(id).is_some() {
            self.outbox.delete_element(id);
        }
        self.selection.remove(id);
    }

    fn locked(&self) -> HashSet<ElementId> {
        self.presence.locked_ids()
    }

    // --- selection ---

    fn selection_changed(&mut self) {
        let ids = self.selection.ids().to_vec();
        let elements = self.selected_elements();
        if self.hooks.selection_changed(&ids, &elements) {
            self.presence.publish_selection(&ids);
        }
    }

    /// Replace the selection. Unknown, locked and laser ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let locked = self.locked();
        let ids: Vec<ElementId> = ids
            .into_iter()
            .filter(|id| is_selectable(&self.doc, id, &locked))
            .collect();
        self.selection.set(ids);
        self.selection_changed();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    pub fn select_all(&mut self) {
        let ids = self.doc.ordered_ids();
        self.set_selection(ids);
    }

    pub fn delete_selection(&mut self) {
        if self.options.read_only {
            return;
        }
        let ids = self.selection.ids().to_vec();
        for id in &ids {
            self.delete(id);
        }
        self.selection_changed();
    }

    fn apply_z_order(&mut self, changes: Vec<(ElementId, i64)>) {
        if self.options.read_only {
            return;
        }
        for (id, z) in changes {
            let Some(original) = self.doc.get(&id).cloned() else {
                continue;
            };
            let mut updated = original.clone();
            updated.z_index = Some(z);
            self.commit_update(&original, updated);
        }
    }

    pub fn bring_to_front(&mut self) {
        let changes = self.doc.bring_to_front(self.selection.ids());
        self.apply_z_order(changes);
    }

    pub fn send_to_back(&mut self) {
        let changes = self.doc.send_to_back(self.selection.ids());
        self.apply_z_order(changes);
    }

    pub fn bring_forward(&mut self) {
        let changes = self.doc.step(self.selection.ids(), true);
        self.apply_z_order(changes);
    }

    pub fn send_backward(&mut self) {
        let changes = self.doc.step(self.selection.ids(), false);
        self.apply_z_order(changes);
    }

    fn nudge(&mut self, delta: Vec2) {
        for original in self.selected_elements() {
            let mut moved = original.clone();
            moved.translate(delta);
            self.commit_update(&original, moved);
        }
    }

    // --- configuration ---

    pub fn set_tool(&mut self, tool: Tool) {
        if self.options.tool == tool {
            return;
        }
        self.commit_text_edit();
        self.finish_interaction(self.last_world, Modifiers::NONE);
        log::debug!("Tool changed to {}", tool.display_name());
        self.options.tool = tool;
    }

    pub fn set_options(&mut self, options: CanvasOptions) {
        if options.read_only && !self.options.read_only {
            self.cancel();
        }
        if options.tool != self.options.tool {
            self.set_tool(options.tool);
        }
        self.options = options;
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    // --- viewport ---

    fn viewport_changed(&mut self) {
        self.presence
            .publish_viewport(self.viewport.pan, self.viewport.zoom());
    }

    pub fn wheel(&mut self, event: &WheelEvent) {
        self.viewport.apply_wheel(event);
        self.viewport_changed();
    }

    /// Frame every element. Does nothing on an empty canvas.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.doc.bounds() {
            self.viewport
                .fit_to_bounds(bounds, self.viewport_size, FIT_PADDING);
            self.viewport_changed();
        }
    }

    /// Center an element in view at the current zoom.
    pub fn focus_element(&mut self, id: &str) -> bool {
        let Some(element) = self.doc.get(id) else {
            log::warn!("Cannot focus unknown element {id}");
            return false;
        };
        let center = rotated_bounds(element).center();
        let zoom = self.viewport.zoom();
        self.viewport.center_on(center, self.viewport_size, zoom);
        self.viewport_changed();
        true
    }

    fn apply_viewport_commands(&mut self) {
        for command in self.hooks.setter.drain() {
            match command {
                ViewportCommand::Set { pan, zoom } => {
                    self.viewport.set(pan, zoom);
                    self.viewport_changed();
                }
                ViewportCommand::FocusElement(id) => {
                    self.focus_element(&id);
                }
            }
        }
    }

    // --- time ---

    /// Run once per render or scheduling tick. Applies queued viewport
    /// requests, sweeps expired laser traces when due and flushes presence.
    /// Returns how many presence publishes went out.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        self.apply_viewport_commands();
        if self.laser_sweep.due(now_ms) {
            self.sweep_lasers(now_ms);
        }
        self.presence.flush()
    }

    /// Delete laser traces past their lifetime. Returns how many went.
    pub fn sweep_lasers(&mut self, now_ms: u64) -> usize {
        let expired = expired_lasers(&self.doc, now_ms);
        for id in &expired {
            self.delete(id);
        }
        if !expired.is_empty() {
            log::debug!("Swept {} laser trace(s)", expired.len());
        }
        expired.len()
    }

    /// Fold inbound presence into the peer list. Elements a peer just
    /// selected leave the local selection.
    pub fn poll_presence(&mut self, now_ms: u64) -> Vec<PeerChange> {
        let changes = self.presence.poll(now_ms);
        if !changes.is_empty() {
            let locked = self.locked();
            let before = self.selection.len();
            self.selection.retain(|id| !locked.contains(id));
            if self.selection.len() != before {
                self.selection_changed();
            }
        }
        changes
    }

    // --- pointer input ---

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers, now_ms: u64) {
        let world = self.viewport.screen_to_world(screen);
        self.last_world = world;

        if button == MouseButton::Middle {
            self.commit_text_edit();
            self.finish_interaction(world, modifiers);
            self.state = InteractionState::Panning { last_screen: screen };
            return;
        }
        if button != MouseButton::Left {
            return;
        }
        let double_click = self.clicks.press(screen, now_ms);

        // Clicking elsewhere while editing text ends the edit.
        if let InteractionState::EditingText(session) = &self.state {
            let tolerance = PICK_TOLERANCE / self.viewport.zoom();
            if hit_test(session.draft(), world, tolerance) {
                return;
            }
            self.commit_text_edit();
        }
        // A press without a matching release (e.g. lost outside the window)
        // finishes the previous interaction first.
        self.finish_interaction(world, modifiers);

        let tool = self.options.tool;
        if self.options.read_only && !tool.allowed_read_only() {
            return;
        }

        match tool {
            Tool::Pan => self.state = InteractionState::Panning { last_screen: screen },
            Tool::Select => self.select_down(world, modifiers, double_click),
            Tool::Text => self.text_down(world),
            Tool::Erase => {
                let mut erase = EraseState::new(world, self.options.eraser_radius());
                erase.extend(&self.doc, world, &self.locked());
                self.state = InteractionState::Erasing(erase);
            }
            _ => {
                if let Some(draft) = DraftState::begin(tool, world, &self.options, now_ms) {
                    self.presence.publish_draft(Some(&draft.element));
                    self.state = InteractionState::Drawing(draft);
                }
            }
        }
        log::debug!("Pointer down -> {}", self.state.name());
    }

    fn select_down(&mut self, world: Point, modifiers: Modifiers, double_click: bool) {
        let zoom = self.viewport.zoom();
        let locked = self.locked();
        let hit = pick(&self.doc, world, PICK_TOLERANCE / zoom, &locked);

        if double_click {
            // Double-click on the rotate handle resets rotation.
            if let Some(frame) = self.selection_frame() {
                if self.can_rotate_selection() && frame.hit_rotate(world, zoom) {
                    for original in self.selected_elements() {
                        let mut reset = original.clone();
                        reset.rotation = 0.0;
                        self.commit_update(&original, reset);
                    }
                    return;
                }
            }
            if let Some(element) = hit.as_ref().and_then(|id| self.doc.get(id)).cloned() {
                if element.is_text() {
                    if let Some(session) = TextEditSession::existing(&element) {
                        self.begin_text_edit(session);
                        return;
                    }
                }
                if let Some(updated) = connector_edit::insert_vertex(&element, world) {
                    self.commit_update(&element, updated);
                    self.set_selection([element.id.clone()]);
                    return;
                }
            }
        }

        // Handles of the current selection. Connector handles win over the
        // frame, and a connector's frame edges coincide with its stroke.
        let connector = self.single_selected_connector();
        if let Some(connector) = &connector {
            if let Some(kind) = connector_edit::hit_handle(connector, world, zoom) {
                self.state = InteractionState::ConnectorEditing(ConnectorEditState::new(
                    kind,
                    world,
                    connector.clone(),
                ));
                return;
            }
        }
        if let Some(frame) = self.selection_frame() {
            let allow_rotate = self.can_rotate_selection();
            let frame_hit = if connector.is_some() {
                frame.hit_handles(world, zoom, allow_rotate)
            } else {
                frame.hit(world, zoom, allow_rotate)
            };
            match frame_hit {
                Some(FrameHit::Rotate) => {
                    let originals = self.selected_elements();
                    self.state = InteractionState::Rotating(RotateState::new(
                        frame.center(),
                        world,
                        originals,
                    ));
                    return;
                }
                Some(FrameHit::Resize(handle)) => {
                    let originals = self.selected_elements();
                    self.state = InteractionState::Resizing(ResizeState::new(
                        handle, world, frame, originals,
                    ));
                    return;
                }
                None => {}
            }
        }

        // Shift-click toggles membership.
        if modifiers.shift {
            if let Some(id) = &hit {
                self.selection.toggle(id);
                self.selection_changed();
                return;
            }
        }

        let inside_frame = self.selection_frame().is_some_and(|f| f.contains(world));
        let on_selected = hit.as_ref().is_some_and(|id| self.selection.contains(id));
        if inside_frame || on_selected {
            self.begin_drag(world);
            return;
        }

        if let Some(id) = hit {
            self.set_selection([id]);
            self.begin_drag(world);
            return;
        }

        let base = if modifiers.shift {
            self.selection.ids().to_vec()
        } else {
            self.clear_selection();
            Vec::new()
        };
        self.state = InteractionState::BoxSelecting(BoxSelect::new(world, base));
    }

    fn begin_drag(&mut self, world: Point) {
        let originals = self.selected_elements();
        if !originals.is_empty() {
            self.state = InteractionState::Dragging(DragState::new(world, originals));
        }
    }

    fn text_down(&mut self, world: Point) {
        let locked = self.locked();
        let tolerance = PICK_TOLERANCE / self.viewport.zoom();
        let existing = pick(&self.doc, world, tolerance, &locked)
            .and_then(|id| self.doc.get(&id))
            .and_then(TextEditSession::existing);
        let session = existing.unwrap_or_else(|| {
            let mut template = TextProps::new(world, "");
            template.font_family = self.options.font_family.clone();
            template.font_size = self.options.font_size;
            template.line_height = self.options.line_height;
            template.letter_spacing = self.options.letter_spacing;
            template.text_align = self.options.text_align;
            template.height = template.line_px();
            TextEditSession::new_text(world, template, self.options.element_style())
        });
        self.begin_text_edit(session);
    }

    fn begin_text_edit(&mut self, session: TextEditSession) {
        if !session.is_new() {
            self.set_selection([session.id().to_string()]);
        }
        self.presence.publish_draft(Some(session.draft()));
        self.state = InteractionState::EditingText(session);
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        let world = self.viewport.screen_to_world(screen);
        self.last_world = world;
        self.presence.publish_cursor(Some(world));

        let mut state = std::mem::take(&mut self.state);
        match &mut state {
            InteractionState::Drawing(draft) => {
                draft.update(world, modifiers.shift);
                self.presence.publish_draft(Some(&draft.element));
            }
            InteractionState::Dragging(drag) => {
                for el in drag.apply(world) {
                    self.doc.replace(el);
                }
            }
            InteractionState::Resizing(resize) => {
                let keep_aspect = modifiers.shift;
                for el in resize.apply(world, keep_aspect, &mut self.metrics) {
                    self.doc.replace(el);
                }
            }
            InteractionState::Rotating(rotate) => {
                for el in rotate.apply(world, modifiers.shift) {
                    self.doc.replace(el);
                }
            }
            InteractionState::ConnectorEditing(edit) => {
                self.doc.replace(edit.apply(world));
            }
            InteractionState::BoxSelecting(b) => {
                b.current = world;
                let ids = b.selection(&self.doc, &self.locked());
                self.selection.set(ids);
                self.selection_changed();
            }
            InteractionState::Erasing(erase) => {
                erase.extend(&self.doc, world, &self.locked());
            }
            InteractionState::Panning { last_screen } => {
                self.viewport.pan_by(screen - *last_screen);
                *last_screen = screen;
                self.viewport_changed();
            }
            InteractionState::Idle | InteractionState::EditingText(_) => {}
        }
        self.state = state;
    }

    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) {
        let world = self.viewport.screen_to_world(screen);
        self.last_world = world;
        self.finish_interaction(world, modifiers);
    }

    /// The pointer left the canvas. Peers stop seeing the cursor.
    pub fn pointer_leave(&mut self) {
        self.presence.publish_cursor(None);
    }

    /// Commit whatever the pointer was doing. Text editing survives.
    fn finish_interaction(&mut self, world: Point, modifiers: Modifiers) {
        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::Idle => {}
            InteractionState::Drawing(mut draft) => {
                draft.update(world, modifiers.shift);
                self.presence.publish_draft(None);
                if let Some(element) = draft.commit() {
                    self.add(element);
                }
            }
            InteractionState::Dragging(drag) => {
                let moved = drag.apply(world);
                self.commit_all(&drag.originals, moved);
            }
            InteractionState::Resizing(resize) => {
                let resized = resize.apply(world, modifiers.shift, &mut self.metrics);
                self.commit_all(&resize.originals, resized);
            }
            InteractionState::Rotating(rotate) => {
                let rotated = rotate.apply(world, modifiers.shift);
                self.commit_all(&rotate.originals, rotated);
            }
            InteractionState::ConnectorEditing(edit) => {
                let finished = edit.finish(world);
                self.commit_update(&edit.original, finished);
            }
            InteractionState::BoxSelecting(mut b) => {
                b.current = world;
                let ids = b.selection(&self.doc, &self.locked());
                self.selection.set(ids);
                self.selection_changed();
            }
            InteractionState::Erasing(mut erase) => {
                let locked = self.locked();
                erase.extend(&self.doc, world, &locked);
                let doomed = erase.finish(&self.doc, &locked);
                for id in &doomed {
                    self.delete(id);
                }
                if !doomed.is_empty() {
                    log::debug!("Erased {} element(s)", doomed.len());
                    self.selection_changed();
                }
            }
            InteractionState::Panning { .. } => {}
            InteractionState::EditingText(session) => {
                self.state = InteractionState::EditingText(session);
            }
        }
    }

    fn commit_all(&mut self, originals: &[Element], updated: Vec<Element>) {
        for (original, el) in originals.iter().zip(updated) {
            self.commit_update(original, el);
        }
    }

    /// Abandon the current interaction without touching the shared store.
    pub fn cancel(&mut self) {
        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::Drawing(_) | InteractionState::EditingText(_) => {
                self.presence.publish_draft(None);
            }
            InteractionState::Dragging(DragState { originals, .. })
            | InteractionState::Resizing(ResizeState { originals, .. })
            | InteractionState::Rotating(RotateState { originals, .. }) => {
                for original in originals {
                    self.doc.replace(original);
                }
            }
            InteractionState::ConnectorEditing(edit) => {
                self.doc.replace(edit.original);
            }
            InteractionState::BoxSelecting(b) => {
                self.selection.set(b.base);
                self.selection_changed();
            }
            InteractionState::Erasing(_)
            | InteractionState::Panning { .. }
            | InteractionState::Idle => {}
        }
    }

    // --- text ---

    /// Finish the current text edit, if any.
    pub fn commit_text_edit(&mut self) {
        if !matches!(self.state, InteractionState::EditingText(_)) {
            return;
        }
        let InteractionState::EditingText(session) = std::mem::take(&mut self.state) else {
            return;
        };
        self.presence.publish_draft(None);
        match session.finish() {
            TextEditOutcome::Add(element) => self.add(element),
            TextEditOutcome::Update { original, updated } => self.commit_update(&original, updated),
            TextEditOutcome::Delete(id) => {
                self.delete(&id);
                self.selection_changed();
            }
            TextEditOutcome::Discard | TextEditOutcome::Unchanged => {}
        }
    }

    /// Typed text. Returns whether it was consumed by a text edit.
    pub fn text_input(&mut self, text: &str) -> bool {
        let InteractionState::EditingText(session) = &mut self.state else {
            return false;
        };
        session.insert(text, &mut self.metrics);
        self.presence.publish_draft(Some(session.draft()));
        true
    }

    fn text_key(&mut self, key: &Key, modifiers: Modifiers) -> bool {
        if *key == Key::Escape {
            self.cancel();
            return true;
        }
        let InteractionState::EditingText(session) = &mut self.state else {
            return false;
        };
        match key {
            Key::Enter => session.newline(&mut self.metrics),
            Key::Backspace => session.backspace(&mut self.metrics),
            Key::Delete => session.delete_forward(&mut self.metrics),
            Key::ArrowLeft => session.move_left(),
            Key::ArrowRight => session.move_right(),
            Key::Character(c) if !modifiers.command() => {
                let mut buf = [0u8; 4];
                session.insert(c.encode_utf8(&mut buf), &mut self.metrics);
            }
            _ => return false,
        }
        self.presence.publish_draft(Some(session.draft()));
        true
    }

    // --- keyboard ---

    /// Returns whether the key was handled.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if matches!(self.state, InteractionState::EditingText(_)) {
            return self.text_key(&key, modifiers);
        }
        match key {
            Key::Escape => {
                if self.state.is_idle() {
                    self.clear_selection();
                } else {
                    self.cancel();
                }
                true
            }
            Key::Delete | Key::Backspace if self.state.is_idle() => {
                self.delete_selection();
                true
            }
            Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight
                if self.state.is_idle() && !self.options.read_only =>
            {
                let step = if modifiers.shift {
                    NUDGE_STEP_LARGE
                } else {
                    NUDGE_STEP
                };
                let delta = match key {
                    Key::ArrowUp => Vec2::new(0.0, -step),
                    Key::ArrowDown => Vec2::new(0.0, step),
                    Key::ArrowLeft => Vec2::new(-step, 0.0),
                    _ => Vec2::new(step, 0.0),
                };
                self.nudge(delta);
                true
            }
            Key::Character('a' | 'A') if modifiers.command() => {
                self.select_all();
                true
            }
            _ => false,
        }
    }

    // --- cursor ---

    /// Cursor to show at a screen position.
    pub fn cursor_at(&self, screen: Point) -> CursorKind {
        match &self.state {
            InteractionState::Panning { .. } => return CursorKind::Grabbing,
            InteractionState::Dragging(_) => return CursorKind::Move,
            InteractionState::Rotating(_) => return CursorKind::Rotate,
            InteractionState::Resizing(r) => return r.frame.cursor_for(r.handle),
            InteractionState::EditingText(_) => return CursorKind::Text,
            _ => {}
        }
        let tool = self.options.tool;
        if self.options.read_only && !tool.allowed_read_only() {
            return CursorKind::NotAllowed;
        }
        if tool != Tool::Select {
            return tool.cursor();
        }

        let world = self.viewport.screen_to_world(screen);
        let zoom = self.viewport.zoom();
        let connector = self.single_selected_connector();
        if let Some(connector) = &connector {
            if connector_edit::hit_handle(connector, world, zoom).is_some() {
                return CursorKind::Pointer;
            }
        }
        if let Some(frame) = self.selection_frame() {
            let allow_rotate = self.can_rotate_selection();
            let frame_hit = if connector.is_some() {
                frame.hit_handles(world, zoom, allow_rotate)
            } else {
                frame.hit(world, zoom, allow_rotate)
            };
            match frame_hit {
                Some(FrameHit::Rotate) => return CursorKind::Rotate,
                Some(FrameHit::Resize(handle)) => return frame.cursor_for(handle),
                None if frame.contains(world) => return CursorKind::Move,
                None => {}
            }
        }
        if pick(&self.doc, world, PICK_TOLERANCE / zoom, &self.locked()).is_some() {
            CursorKind::Move
        } else {
            CursorKind::Default
        }
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("elements", &self.doc.len())
            .field("state", &self.state.name())
            .field("selection", &self.selection.len())
            .field("tool", &self.options.tool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ConnectorProps, ElementStyle, SerializableColor};
    use crate::geometry::ResizeHandle;
    use crate::interaction::laser::laser_lifetime_ms;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(tool: Tool) -> Editor {
        let options = CanvasOptions {
            tool,
            ..Default::default()
        };
        Editor::offline(options)
    }

    fn drag(ed: &mut Editor, from: Point, to: Point, modifiers: Modifiers, now: u64) {
        ed.pointer_down(from, MouseButton::Left, modifiers, now);
        ed.pointer_move(from.midpoint(to), modifiers);
        ed.pointer_move(to, modifiers);
        ed.pointer_up(to, modifiers);
    }

    fn filled_rect(rect: Rect) -> Element {
        let mut el = Element::rectangle(rect, ElementStyle::default());
        el.box_props_mut().unwrap().fill_color = Some(SerializableColor::white());
        el
    }

    fn seeded(tool: Tool, elements: Vec<Element>) -> Editor {
        let mut doc = Document::new();
        for el in elements {
            doc.insert(el);
        }
        editor(tool).with_document(doc)
    }

    #[test]
    fn test_draw_rectangle_emits_add() {
        let mut ed = editor(Tool::Rectangle);
        drag(&mut ed, Point::ZERO, Point::new(100.0, 50.0), Modifiers::NONE, 0);
        let ops = ed.take_store_ops();
        assert_eq!(ops.len(), 1);
        let StoreOp::Add { element } = &ops[0] else {
            panic!("expected add");
        };
        let b = element.box_props().unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 100.0, 50.0));
        assert!(ed.state().is_idle());
        assert!(ed.draft_element().is_none());
    }

    #[test]
    fn test_click_selects_and_drag_moves() {
        let rect = filled_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let id = rect.id.clone();
        let mut ed = seeded(Tool::Select, vec![rect]);
        drag(&mut ed, Point::new(50.0, 50.0), Point::new(70.0, 60.0), Modifiers::NONE, 0);
        assert_eq!(ed.selection(), &[id.clone()]);
        let b = ed.document().get(&id).unwrap().box_props().unwrap().clone();
        assert_eq!((b.x, b.y), (20.0, 10.0));
        let ops = ed.take_store_ops();
        assert!(matches!(&ops[..], [StoreOp::Update { .. }]));
    }

    #[test]
    fn test_escape_restores_drag_originals() {
        let rect = filled_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let id = rect.id.clone();
        let mut ed = seeded(Tool::Select, vec![rect]);
        ed.pointer_down(Point::new(50.0, 50.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_move(Point::new(90.0, 90.0), Modifiers::NONE);
        assert_eq!(ed.document().get(&id).unwrap().box_props().unwrap().x, 40.0);
        assert!(ed.key_down(Key::Escape, Modifiers::NONE));
        assert_eq!(ed.document().get(&id).unwrap().box_props().unwrap().x, 0.0);
        ed.pointer_up(Point::new(90.0, 90.0), Modifiers::NONE);
        assert!(ed.take_store_ops().is_empty());
    }

    #[test]
    fn test_shift_click_toggles() {
        let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = filled_rect(Rect::new(100.0, 0.0, 150.0, 50.0));
        let (aid, bid) = (a.id.clone(), b.id.clone());
        let mut ed = seeded(Tool::Select, vec![a, b]);
        ed.pointer_down(Point::new(25.0, 25.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_up(Point::new(25.0, 25.0), Modifiers::NONE);
        ed.pointer_down(Point::new(125.0, 25.0), MouseButton::Left, Modifiers::SHIFT, 1000);
        ed.pointer_up(Point::new(125.0, 25.0), Modifiers::SHIFT);
        assert_eq!(ed.selection(), &[aid.clone(), bid.clone()]);
        ed.pointer_down(Point::new(125.0, 25.0), MouseButton::Left, Modifiers::SHIFT, 2000);
        ed.pointer_up(Point::new(125.0, 25.0), Modifiers::SHIFT);
        assert_eq!(ed.selection(), &[aid]);
        assert!(ed.take_store_ops().is_empty());
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        let mut ed = seeded(Tool::Select, vec![a.clone()]);
        ed.set_selection([a.id.clone()]);
        ed.pointer_down(Point::new(300.0, 300.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_up(Point::new(301.0, 301.0), Modifiers::NONE);
        assert!(ed.selection().is_empty());
    }

    #[test]
    fn test_text_tool_types_and_commits() {
        let mut ed = editor(Tool::Text);
        ed.pointer_down(Point::new(10.0, 10.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_up(Point::new(10.0, 10.0), Modifiers::NONE);
        assert!(ed.text_input("Hi"));
        assert!(ed.key_down(Key::Character('!'), Modifiers::NONE));
        assert_eq!(ed.draft_element().and_then(|e| e.text_props()).map(|t| t.text.as_str()), Some("Hi!"));
        assert!(ed.document().is_empty());
        // Clicking elsewhere finishes the edit.
        ed.pointer_down(Point::new(500.0, 500.0), MouseButton::Left, Modifiers::NONE, 1000);
        let ops = ed.take_store_ops();
        assert!(matches!(&ops[..], [StoreOp::Add { .. }]));
        assert_eq!(ed.document().len(), 1);
    }

    #[test]
    fn test_escape_discards_new_text() {
        let mut ed = editor(Tool::Text);
        ed.pointer_down(Point::new(10.0, 10.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.text_input("draft");
        assert!(ed.key_down(Key::Escape, Modifiers::NONE));
        assert!(ed.state().is_idle());
        assert!(ed.document().is_empty());
        assert!(ed.take_store_ops().is_empty());
    }

    #[test]
    fn test_clearing_text_deletes_it() {
        let mut props = TextProps::new(Point::ZERO, "ab");
        TextMetrics::default().relayout(&mut props);
        let text = Element::text(props, ElementStyle::default());
        let id = text.id.clone();
        let mut ed = seeded(Tool::Select, vec![text]);
        ed.pointer_down(Point::new(5.0, 5.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_up(Point::new(5.0, 5.0), Modifiers::NONE);
        ed.pointer_down(Point::new(5.0, 5.0), MouseButton::Left, Modifiers::NONE, 100);
        assert_eq!(ed.editing_text_id(), Some(id.as_str()));
        ed.key_down(Key::Backspace, Modifiers::NONE);
        ed.key_down(Key::Backspace, Modifiers::NONE);
        ed.commit_text_edit();
        assert!(!ed.document().contains(&id));
        assert_eq!(ed.take_store_ops(), vec![StoreOp::Delete { id }]);
    }

    #[test]
    fn test_read_only_allows_only_panning() {
        let options = CanvasOptions {
            tool: Tool::Rectangle,
            read_only: true,
            ..Default::default()
        };
        let mut ed = Editor::offline(options);
        drag(&mut ed, Point::ZERO, Point::new(100.0, 100.0), Modifiers::NONE, 0);
        assert!(ed.document().is_empty());

        ed.pointer_down(Point::new(10.0, 10.0), MouseButton::Middle, Modifiers::NONE, 100);
        ed.pointer_move(Point::new(30.0, 15.0), Modifiers::NONE);
        ed.pointer_up(Point::new(30.0, 15.0), Modifiers::NONE);
        assert_eq!(ed.viewport().pan, Vec2::new(20.0, 5.0));
    }

    #[test]
    fn test_delete_and_nudge() {
        let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = filled_rect(Rect::new(100.0, 0.0, 150.0, 50.0));
        let (aid, bid) = (a.id.clone(), b.id.clone());
        let mut ed = seeded(Tool::Select, vec![a, b]);
        ed.key_down(Key::Character('a'), Modifiers { ctrl: true, ..Modifiers::NONE });
        assert_eq!(ed.selection().len(), 2);
        ed.key_down(Key::ArrowRight, Modifiers::SHIFT);
        assert_eq!(ed.document().get(&aid).unwrap().box_props().unwrap().x, 10.0);
        ed.set_selection([bid.clone()]);
        ed.key_down(Key::Delete, Modifiers::NONE);
        assert!(!ed.document().contains(&bid));
        assert!(ed.selection().is_empty());
    }

    #[test]
    fn test_z_order_updates() {
        let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = filled_rect(Rect::new(10.0, 10.0, 40.0, 40.0));
        let aid = a.id.clone();
        let mut ed = seeded(Tool::Select, vec![a, b]);
        ed.set_selection([aid.clone()]);
        ed.bring_to_front();
        assert_eq!(ed.document().ordered_ids().last(), Some(&aid));
        let ops = ed.take_store_ops();
        assert!(matches!(&ops[..], [StoreOp::Update { patch, .. }] if patch.z_index.is_some()));
    }

    #[test]
    fn test_remote_delete_prunes_selection() {
        let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        let id = a.id.clone();
        let mut ed = seeded(Tool::Select, vec![a]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ed.on_selection_change(move |els| sink.borrow_mut().push(els.len()));
        ed.set_selection([id.clone()]);
        ed.apply_remote(StoreOp::Delete { id });
        assert!(ed.selection().is_empty());
        assert_eq!(*seen.borrow(), vec![1, 0]);
        assert!(ed.take_store_ops().is_empty());
    }

    #[test]
    fn test_laser_is_swept_on_tick() {
        let mut ed = editor(Tool::Laser);
        drag(&mut ed, Point::ZERO, Point::new(50.0, 0.0), Modifiers::NONE, 0);
        assert_eq!(ed.document().len(), 1);
        ed.tick(100);
        assert_eq!(ed.document().len(), 1);
        ed.tick(laser_lifetime_ms() + 2000);
        assert!(ed.document().is_empty());
    }

    #[test]
    fn test_viewport_setter_applies_on_tick() {
        let rect = filled_rect(Rect::new(1000.0, 1000.0, 1100.0, 1100.0));
        let id = rect.id.clone();
        let mut ed = seeded(Tool::Select, vec![rect]);
        let mut setter = None;
        ed.on_set_viewport(|s| setter = Some(s));
        let setter = setter.unwrap();
        setter.set(Vec2::new(5.0, 5.0), 9.0);
        ed.tick(0);
        assert_eq!(ed.viewport().zoom(), crate::viewport::MAX_ZOOM);
        setter.focus_element(id);
        ed.tick(10);
        let center = ed.viewport().world_to_screen(Point::new(1050.0, 1050.0));
        assert!((center.x - 400.0).abs() < 1e-6 && (center.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_double_click_connector_inserts_vertex() {
        let line = Element::line(
            vec![Point::ZERO, Point::new(100.0, 0.0)],
            ConnectorProps::default(),
            ElementStyle::default(),
        );
        let id = line.id.clone();
        let mut ed = seeded(Tool::Select, vec![line]);
        ed.pointer_down(Point::new(30.0, 1.0), MouseButton::Left, Modifiers::NONE, 0);
        ed.pointer_up(Point::new(30.0, 1.0), Modifiers::NONE);
        ed.pointer_down(Point::new(30.0, 1.0), MouseButton::Left, Modifiers::NONE, 100);
        ed.pointer_up(Point::new(30.0, 1.0), Modifiers::NONE);
        assert_eq!(ed.document().get(&id).unwrap().points.len(), 3);
    }

    #[test]
    fn test_single_connector_rotates_and_mirrors() {
        let points = vec![Point::ZERO, Point::new(50.0, 80.0), Point::new(100.0, 0.0)];
        let arrow = Element::arrow(points, ConnectorProps::default(), ElementStyle::default());
        let id = arrow.id.clone();

        let mut ed = seeded(Tool::Select, vec![arrow.clone()]);
        ed.set_selection([id.clone()]);
        let frame = ed.selection_frame().unwrap();
        let grip = frame.rotate_handle_position(1.0);
        let center = frame.center();
        ed.pointer_down(grip, MouseButton::Left, Modifiers::NONE, 0);
        assert_eq!(ed.state().name(), "rotating");
        let quarter = center + Vec2::new(center.y - grip.y, 0.0);
        ed.pointer_move(quarter, Modifiers::NONE);
        ed.pointer_up(quarter, Modifiers::NONE);
        assert!((ed.document().get(&id).unwrap().rotation - 90.0).abs() < 1e-6);
        assert_eq!(ed.selection(), &[id.clone()]);

        // Dragging the south-east handle past the west edge flips the arrow.
        let mut ed = seeded(Tool::Select, vec![arrow]);
        ed.set_selection([id.clone()]);
        let grip = ed.selection_frame().unwrap().handle_position(ResizeHandle::SouthEast);
        ed.pointer_down(grip, MouseButton::Left, Modifiers::NONE, 0);
        assert_eq!(ed.state().name(), "resizing");
        let past = grip - Vec2::new(250.0, 0.0);
        ed.pointer_move(past, Modifiers::NONE);
        ed.pointer_up(past, Modifiers::NONE);
        let flipped = ed.document().get(&id).unwrap();
        assert!(flipped.points[2].x < flipped.points[0].x);
        assert!(matches!(&ed.take_store_ops()[..], [StoreOp::Update { .. }]));
    }

    #[test]
    fn test_two_point_connector_has_no_rotate_handle() {
        let line = Element::line(
            vec![Point::ZERO, Point::new(100.0, 60.0)],
            ConnectorProps::default(),
            ElementStyle::default(),
        );
        let id = line.id.clone();
        let mut ed = seeded(Tool::Select, vec![line]);
        ed.set_selection([id]);
        let grip = ed.selection_frame().unwrap().rotate_handle_position(1.0);
        ed.pointer_down(grip, MouseButton::Left, Modifiers::NONE, 0);
        assert_ne!(ed.state().name(), "rotating");
    }
}
