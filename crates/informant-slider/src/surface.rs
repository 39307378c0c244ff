//! The slider widget's side: four slots, one registry target, progress
//! layout and press feedback.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use informant_core::animation::AnimatedValue;
use informant_core::{Canvas, Color, Error, HostTree, NodeId, PropsDelta, Rect, Size, UiHandle};
use parking_lot::{Mutex, ReentrantMutex};

use crate::config::SliderConfig;
use crate::drawable::{
    Drawable, DrawableState, FillPainter, MAX_LEVEL, SystemPainter, ThumbPainter, TrackPainter,
};
use crate::layout::ProgressLayout;
use crate::policy::{PolicyContext, SlotKind};
use crate::registry::{InformantTarget, Registry, TargetKey};
use crate::slot::{SlotController, SlotState};

/// Called after a slot's displayed drawable changed.
pub type RepaintHook = Arc<dyn Fn(SlotKind) + Send + Sync>;

struct SurfaceState {
    slots: [SlotController; 4],
    config: SliderConfig,
    layout: ProgressLayout,
    press: AnimatedValue,
    /// Origins this surface currently holds registry entries for.
    registered: BTreeSet<NodeId>,
    torn_down: bool,
}

impl SurfaceState {
    fn slot(&self, kind: SlotKind) -> &SlotController {
        &self.slots[kind.index()]
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut SlotController {
        &mut self.slots[kind.index()]
    }

    fn policy_context(&self) -> PolicyContext {
        PolicyContext {
            widget: self.layout.bounds,
            press_scale: self.press.get(),
            inverted: self.config.inverted,
            bar_height: self.config.track_height,
            max_side: self.config.max_raster_side,
        }
    }

    /// Rails fill the widget; the handle is centred on its progress point.
    fn place_drawables(&self) {
        let widget = self.layout.bounds;
        for kind in [SlotKind::Background, SlotKind::MaxTrack, SlotKind::MinTrack] {
            self.slot(kind).current().set_bounds(widget);
        }
        let handle = self.slot(SlotKind::Handle).current();
        let side = match handle.raster_size() {
            Some((w, _)) => w as f32,
            None => self.config.thumb_size * self.press.get(),
        };
        handle.set_bounds(self.layout.handle_rect(Size::new(side, side)));
    }

    fn bound_origins(&self) -> BTreeSet<NodeId> {
        self.slots.iter().filter_map(|s| s.held_origin()).collect()
    }
}

/// Registry target standing in for a surface; holds it weakly so the
/// registry never keeps a torn-down widget alive.
struct SurfaceTarget(Weak<SliderSurface>);

impl InformantTarget for SurfaceTarget {
    fn on_props_received(&self, _tree: &dyn HostTree, id: NodeId, origin: NodeId, delta: &PropsDelta) {
        if let Some(surface) = self.0.upgrade() {
            surface.route(origin, |slot, ctx| slot.apply_props(id, delta, ctx));
        }
    }

    fn on_child_added(&self, tree: &dyn HostTree, origin: NodeId, parent: NodeId, child: NodeId) {
        if let Some(surface) = self.0.upgrade() {
            surface.route(origin, |slot, ctx| slot.child_added(tree, parent, child, ctx));
        }
    }

    fn on_child_removed(&self, _tree: &dyn HostTree, origin: NodeId, parent: NodeId, child: NodeId) {
        if let Some(surface) = self.0.upgrade() {
            surface.route(origin, |slot, ctx| slot.child_removed(parent, child, ctx));
        }
    }

    fn on_invalidated(&self, tree: &dyn HostTree, id: NodeId, origin: NodeId) {
        if let Some(surface) = self.0.upgrade() {
            surface.route(origin, |slot, ctx| slot.invalidate(tree, id, ctx));
        }
    }
}

/// A slider whose handle, fill, rail and backdrop can each be replaced by
/// the live render of a view subtree.
///
/// `SliderSurface` is shared (`Arc`) between the widget and the registry.
/// State lives behind a reentrant lock; the repaint hook always runs with
/// the state released, so it may call back into the surface.
pub struct SliderSurface {
    registry: Arc<Registry>,
    ui: UiHandle,
    target: TargetKey,
    inner: ReentrantMutex<RefCell<SurfaceState>>,
    repaint: Mutex<Option<RepaintHook>>,
}

impl SliderSurface {
    /// Creates the surface with the config's system drawables and registers
    /// it with `registry`.
    pub fn new(registry: Arc<Registry>, config: SliderConfig) -> Arc<Self> {
        let painters: [Arc<dyn SystemPainter>; 4] = [
            Arc::new(ThumbPainter {
                color: config.thumb_color,
            }),
            Arc::new(TrackPainter {
                color: config.progress_color,
                height: config.track_height,
                follows_level: true,
            }),
            Arc::new(TrackPainter {
                color: config.track_color,
                height: config.track_height,
                follows_level: false,
            }),
            Arc::new(FillPainter {
                color: config.background_color,
            }),
        ];
        Self::with_painters(registry, config, painters)
    }

    /// Like [`SliderSurface::new`] with custom system drawables, indexed by
    /// [`SlotKind::index`].
    pub fn with_painters(
        registry: Arc<Registry>,
        config: SliderConfig,
        painters: [Arc<dyn SystemPainter>; 4],
    ) -> Arc<Self> {
        let slots = SlotKind::ALL.map(|kind| {
            let original = Drawable::system(painters[kind.index()].clone());
            SlotController::new(kind, original)
        });
        let layout = ProgressLayout {
            inverted: config.inverted,
            ..ProgressLayout::default()
        };
        let press = AnimatedValue::new(1.0, config.press_spec());
        let ui = registry.ui().clone();
        Arc::new_cyclic(|weak| {
            let target = registry.register_target(Arc::new(SurfaceTarget(weak.clone())));
            SliderSurface {
                registry: registry.clone(),
                ui,
                target,
                inner: ReentrantMutex::new(RefCell::new(SurfaceState {
                    slots,
                    config,
                    layout,
                    press,
                    registered: BTreeSet::new(),
                    torn_down: false,
                })),
                repaint: Mutex::new(None),
            }
        })
    }

    pub fn target_key(&self) -> TargetKey {
        self.target
    }

    pub fn set_repaint_hook(&self, hook: impl Fn(SlotKind) + Send + Sync + 'static) {
        *self.repaint.lock() = Some(Arc::new(hook));
    }

    fn repaint(&self, kind: SlotKind) {
        let hook = self.repaint.lock().clone();
        if let Some(hook) = hook {
            hook(kind);
        }
    }

    /// Repaints `kind` while its slot is still `Rendering`, then settles it.
    /// Invalidations the hook triggers for the slot's own source are dropped.
    fn after_render(&self, kind: SlotKind) {
        self.repaint(kind);
        let guard = self.inner.lock();
        guard.borrow_mut().slot_mut(kind).finish_render();
    }

    /// Binds `kind` to the subtree rooted at `id`, or back to its system
    /// drawable for `None`.
    ///
    /// Binding resolves on the UI context; the slot keeps showing what it
    /// showed until the next pump. Only the latest request for a slot ever
    /// takes effect.
    pub fn bind_slot(self: &Arc<Self>, kind: SlotKind, id: Option<NodeId>) {
        let guard = self.inner.lock();
        if guard.borrow().torn_down {
            log::warn!("bind_slot({kind:?}) on a torn-down slider");
            return;
        }
        let Some(id) = id else {
            let changed = guard.borrow_mut().slot_mut(kind).unbind();
            if changed {
                guard.borrow().place_drawables();
            }
            drop(guard);
            self.release_unbound();
            if changed {
                self.repaint(kind);
            }
            return;
        };
        let generation = guard.borrow_mut().slot_mut(kind).request_bind(id);
        drop(guard);
        log::debug!("{kind:?} slot: binding {id} (generation {generation})");

        let weak = Arc::downgrade(self);
        self.ui.post(move |tree| {
            if let Some(surface) = weak.upgrade() {
                surface.resolve(tree, kind, id, generation);
            }
        });
    }

    fn resolve(&self, tree: &dyn HostTree, kind: SlotKind, id: NodeId, generation: u64) {
        let guard = self.inner.lock();
        let result = {
            let mut state = guard.borrow_mut();
            let ctx = state.policy_context();
            let result = state.slot_mut(kind).resolve(tree, id, generation, &ctx);
            state.place_drawables();
            result
        };
        drop(guard);
        match result {
            Ok(()) => {
                self.sync_registrations(tree);
                self.after_render(kind);
            }
            Err(Error::Stale(_)) => {
                log::debug!("{kind:?} slot: discarding stale resolution of {id}");
            }
            Err(e @ Error::Raster { .. }) => {
                log::warn!("{kind:?} slot: cannot mirror {id}: {e}");
                self.sync_registrations(tree);
                self.repaint(kind);
            }
            Err(e) => {
                log::warn!("{kind:?} slot: cannot bind {id}: {e}");
                self.sync_registrations(tree);
            }
        }
    }

    /// Registers newly bound origins and drops entries for origins no slot
    /// shows anymore.
    fn sync_registrations(&self, tree: &dyn HostTree) {
        let added = {
            let guard = self.inner.lock();
            let mut state = guard.borrow_mut();
            let wanted = state.bound_origins();
            let added: Vec<NodeId> = wanted.difference(&state.registered).copied().collect();
            state.registered.extend(added.iter().copied());
            added
        };
        self.release_unbound();
        for origin in added {
            if let Err(e) = self.registry.add_with(tree, self.target, origin, true) {
                log::warn!("cannot register {origin}: {e}");
            }
        }
    }

    fn release_unbound(&self) {
        let removed = {
            let guard = self.inner.lock();
            let mut state = guard.borrow_mut();
            let wanted = state.bound_origins();
            let removed: Vec<NodeId> = state.registered.difference(&wanted).copied().collect();
            for origin in &removed {
                state.registered.remove(origin);
            }
            removed
        };
        for origin in removed {
            let n = self.registry.remove_origin(self.target, origin);
            log::debug!("released {origin} ({n} entries)");
        }
    }

    /// Runs `f` on every slot bound to `origin`, then repaints the ones that
    /// changed.
    fn route(
        &self,
        origin: NodeId,
        mut f: impl FnMut(&mut SlotController, &PolicyContext) -> informant_core::Result<bool>,
    ) {
        let guard = self.inner.lock();
        let changed: Vec<SlotKind> = {
            let mut state = guard.borrow_mut();
            let ctx = state.policy_context();
            let mut changed = Vec::new();
            for slot in state.slots.iter_mut() {
                if slot.bound_id() != Some(origin) {
                    continue;
                }
                match f(slot, &ctx) {
                    Ok(true) => changed.push(slot.kind()),
                    Ok(false) => {}
                    Err(e) => log::debug!("{:?} slot: ignoring event under {origin}: {e}", slot.kind()),
                }
            }
            if !changed.is_empty() {
                state.place_drawables();
            }
            changed
        };
        drop(guard);
        if changed.is_empty() {
            return;
        }
        // a slot that fell back to default stops holding its origin
        self.release_unbound();
        for kind in changed {
            self.after_render(kind);
        }
    }

    pub fn set_tint_color(&self, kind: SlotKind, tint: Option<Color>) {
        {
            let guard = self.inner.lock();
            guard.borrow_mut().slot_mut(kind).set_tint(tint);
        }
        self.repaint(kind);
    }

    /// Props delivered for a node this surface tracks; same routing as the
    /// registry applies.
    pub fn props_changed(&self, tree: &dyn HostTree, id: NodeId, delta: &PropsDelta) {
        self.registry.props_changed(tree, id, delta);
    }

    pub fn current_drawable(&self, kind: SlotKind) -> Drawable {
        let guard = self.inner.lock();
        let drawable = guard.borrow().slot(kind).current().clone();
        drawable
    }

    pub fn slot_state(&self, kind: SlotKind) -> SlotState {
        let guard = self.inner.lock();
        let state = guard.borrow().slot(kind).state();
        state
    }

    /// Mirror dump for `kind`, if it is bound.
    pub fn describe_slot(&self, kind: SlotKind) -> Option<String> {
        let guard = self.inner.lock();
        let text = guard.borrow().slot(kind).mirror().map(|m| m.describe());
        text
    }

    /// Releases every raster and registry entry this surface owns. Pending
    /// binds are abandoned.
    pub fn teardown(&self) {
        let dropped = self.registry.remove_target(self.target);
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        for slot in state.slots.iter_mut() {
            slot.teardown();
        }
        state.registered.clear();
        state.torn_down = true;
        log::debug!("slider torn down, {dropped} registry entries released");
    }

    /// New content rect for the widget. Bound rails re-render from their
    /// mirrors at the new size.
    pub fn set_bounds(&self, bounds: Rect) {
        self.update_widget(|state| {
            state.layout.bounds = bounds;
            vec![SlotKind::MinTrack, SlotKind::MaxTrack, SlotKind::Background]
        });
    }

    /// Progress level in `[0, MAX_LEVEL]`, shared by every slot's drawable.
    pub fn set_level(&self, level: u32) {
        let level = level.min(MAX_LEVEL);
        {
            let guard = self.inner.lock();
            let mut state = guard.borrow_mut();
            state.layout.level = level;
            for slot in state.slots.iter() {
                slot.current().set_level(level);
                slot.original().set_level(level);
            }
            state.place_drawables();
        }
        for kind in SlotKind::ALL {
            self.repaint(kind);
        }
    }

    pub fn level(&self) -> u32 {
        let guard = self.inner.lock();
        let level = guard.borrow().layout.level;
        level
    }

    pub fn set_inverted(&self, inverted: bool) {
        self.update_widget(|state| {
            state.config.inverted = inverted;
            state.layout.inverted = inverted;
            vec![SlotKind::Handle]
        });
    }

    pub fn layout(&self) -> ProgressLayout {
        let guard = self.inner.lock();
        let layout = guard.borrow().layout;
        layout
    }

    /// Handle press feedback: scale up towards the configured press scale.
    pub fn press(&self) {
        self.set_pressed(true);
    }

    pub fn release(&self) {
        self.set_pressed(false);
    }

    fn set_pressed(&self, pressed: bool) {
        {
            let guard = self.inner.lock();
            let mut state = guard.borrow_mut();
            let target = if pressed { state.config.press_scale } else { 1.0 };
            state.press.set_target(target);
            for slot in state.slots.iter() {
                let d = slot.current();
                let mut flags = d.state();
                flags.set(DrawableState::PRESSED, pressed);
                d.set_state(flags);
            }
        }
        self.repaint(SlotKind::Handle);
    }

    /// Handle scale right now.
    pub fn press_scale(&self) -> f32 {
        let guard = self.inner.lock();
        let scale = guard.borrow().press.get();
        scale
    }

    /// Advances the press animation and re-renders the handle when its scale
    /// moved. Returns `true` while the animation is still running.
    pub fn tick(&self) -> bool {
        let mut running = false;
        self.update_widget(|state| {
            let before = state.press.get();
            running = state.press.update();
            if (state.press.get() - before).abs() > f32::EPSILON {
                vec![SlotKind::Handle]
            } else {
                Vec::new()
            }
        });
        running
    }

    /// Applies a widget-side change, re-renders the returned slots from their
    /// mirrors and repaints them.
    fn update_widget(&self, change: impl FnOnce(&mut SurfaceState) -> Vec<SlotKind>) {
        let guard = self.inner.lock();
        let (touched, rendered) = {
            let mut state = guard.borrow_mut();
            let touched = change(&mut state);
            let ctx = state.policy_context();
            let mut rendered = Vec::new();
            for kind in &touched {
                if state.slot_mut(*kind).relayout(&ctx) {
                    rendered.push(*kind);
                }
            }
            state.place_drawables();
            (touched, rendered)
        };
        drop(guard);
        if !rendered.is_empty() {
            self.release_unbound();
        }
        for kind in touched {
            if rendered.contains(&kind) {
                self.after_render(kind);
            } else {
                self.repaint(kind);
            }
        }
    }

    /// Paints every slot, back to front. The max rail is squeezed into the
    /// part of the track right of the progress point.
    pub fn draw(&self, canvas: &mut Canvas<'_>) {
        let guard = self.inner.lock();
        let state = guard.borrow();
        for kind in SlotKind::PAINT_ORDER {
            let drawable = state.slot(kind).current();
            if kind == SlotKind::MaxTrack {
                let placement = state.layout.max_rail();
                let c = state.layout.bounds.center();
                canvas.save();
                canvas.translate(placement.translate_x, 0.0);
                canvas.scale_about(placement.scale_x, 1.0, c.x, c.y);
                drawable.draw(canvas);
                canvas.restore();
            } else {
                drawable.draw(canvas);
            }
        }
    }
}

impl Drop for SliderSurface {
    fn drop(&mut self) {
        self.registry.remove_target(self.target);
    }
}

impl std::fmt::Debug for SliderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.lock();
        let state = guard.borrow();
        f.debug_struct("SliderSurface")
            .field("slots", &state.slots)
            .field("layout", &state.layout)
            .finish()
    }
}
