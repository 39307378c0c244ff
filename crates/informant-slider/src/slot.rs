//! One slot of the widget: shows either its system drawable or a live render
//! of a bound subtree.
//!
//! ```text
//! Default --request_bind--> Pending --resolve--> Bound --render--> Rendering
//!    ^                         |                   ^                  |
//!    +------ unbind -----------+                   +-- finish_render -+
//! ```
//!
//! A pending resolution carries the generation it was requested under; a
//! resolution for an older generation is stale and changes nothing.

use informant_core::{Color, Error, HostTree, NodeId, PropsDelta, Result, TransformProps};

use crate::drawable::Drawable;
use crate::mirror::MirrorTree;
use crate::policy::{self, PolicyContext, SlotKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Default,
    Pending {
        id: NodeId,
        generation: u64,
        /// Binding to fall back to if `id` fails to resolve.
        previous: Option<NodeId>,
    },
    Bound(NodeId),
    Rendering(NodeId),
}

pub struct SlotController {
    kind: SlotKind,
    original: Drawable,
    current: Drawable,
    state: SlotState,
    generation: u64,
    mirror: Option<MirrorTree>,
    opacity: f32,
    tint: Option<Color>,
    transform: TransformProps,
}

impl SlotController {
    pub fn new(kind: SlotKind, original: Drawable) -> Self {
        Self {
            kind,
            current: original.clone(),
            original,
            state: SlotState::Default,
            generation: 0,
            mirror: None,
            opacity: 1.0,
            tint: None,
            transform: TransformProps::default(),
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drawable to paint right now.
    pub fn current(&self) -> &Drawable {
        &self.current
    }

    pub fn original(&self) -> &Drawable {
        &self.original
    }

    pub fn mirror(&self) -> Option<&MirrorTree> {
        self.mirror.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Source whose render is (or is about to be) displayed.
    pub fn bound_id(&self) -> Option<NodeId> {
        match self.state {
            SlotState::Bound(id) | SlotState::Rendering(id) => Some(id),
            _ => None,
        }
    }

    /// Origin the slot still depends on for events: the bound source, or
    /// while a rebind is pending, the source it falls back to if that rebind
    /// fails.
    pub fn held_origin(&self) -> Option<NodeId> {
        match self.state {
            SlotState::Pending {
                previous: Some(p), ..
            } if self.mirror.is_some() => Some(p),
            _ => self.bound_id(),
        }
    }

    /// Starts binding to `id` and returns the generation the resolution
    /// must present.
    pub fn request_bind(&mut self, id: NodeId) -> u64 {
        let previous = match self.state {
            SlotState::Pending { previous, .. } => previous,
            SlotState::Bound(b) | SlotState::Rendering(b) => Some(b),
            SlotState::Default => None,
        };
        self.generation += 1;
        self.state = SlotState::Pending {
            id,
            generation: self.generation,
            previous,
        };
        self.generation
    }

    /// Back to the system drawable. Returns whether the displayed drawable
    /// changed.
    pub fn unbind(&mut self) -> bool {
        self.generation += 1;
        self.reset_to_default()
    }

    fn reset_to_default(&mut self) -> bool {
        let changed = !self.current.ptr_eq(&self.original);
        if changed {
            self.original.copy_discrete_from(&self.current);
            self.current = self.original.clone();
        }
        self.original.set_tint(self.tint);
        self.mirror = None;
        self.opacity = 1.0;
        self.transform = TransformProps::default();
        self.state = SlotState::Default;
        changed
    }

    /// Completes a pending bind on the UI thread: builds the mirror and runs
    /// the first render pass.
    ///
    /// Fails with [`Error::Stale`] if the slot was rebound since
    /// `generation`, leaving it untouched. A source that does not resolve
    /// restores the previous binding; a source that cannot be rasterized
    /// drops the slot back to its default drawable.
    pub fn resolve(&mut self, tree: &dyn HostTree, id: NodeId, generation: u64, ctx: &PolicyContext) -> Result<()> {
        let previous = match self.state {
            SlotState::Pending {
                id: want,
                generation: g,
                previous,
            } if want == id && g == generation => previous,
            _ => return Err(Error::Stale(id)),
        };
        if !tree.contains(id) {
            self.restore_binding(previous);
            return Err(Error::Resolution(id));
        }
        let mirror = match MirrorTree::build(tree, id) {
            Ok(m) => m,
            Err(e @ Error::Raster { .. }) => {
                self.reset_to_default();
                return Err(e);
            }
            Err(e) => {
                self.restore_binding(previous);
                return Err(e);
            }
        };
        self.mirror = Some(mirror);
        self.opacity = tree.opacity(id).clamp(0.0, 1.0);
        self.transform = TransformProps::default();
        self.state = SlotState::Bound(id);
        self.render(ctx);
        Ok(())
    }

    fn restore_binding(&mut self, previous: Option<NodeId>) {
        self.state = match previous {
            Some(p) if self.mirror.is_some() => SlotState::Bound(p),
            _ => SlotState::Default,
        };
    }

    /// One render pass. On success the fresh drawable is installed and the
    /// slot stays in `Rendering` until [`SlotController::finish_render`].
    /// Returns whether the displayed drawable changed.
    pub fn render(&mut self, ctx: &PolicyContext) -> bool {
        let SlotState::Bound(id) = self.state else {
            return false;
        };
        let Some(mirror) = self.mirror.as_mut() else {
            return false;
        };
        match policy::render(self.kind, mirror, ctx) {
            Ok(Some(raster)) => {
                let next = Drawable::rendered(raster, self.kind.wipes());
                next.copy_discrete_from(&self.current);
                next.set_bounds(self.current.bounds());
                next.set_opacity(self.opacity);
                next.set_transform(self.transform);
                next.set_tint(self.tint);
                self.current = next;
                self.state = SlotState::Rendering(id);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("{:?} slot: cannot render {id}: {e}", self.kind);
                self.reset_to_default()
            }
        }
    }

    pub fn finish_render(&mut self) {
        if let SlotState::Rendering(id) = self.state {
            self.state = SlotState::Bound(id);
        }
    }

    fn accepting(&self, what: &str) -> bool {
        match self.state {
            SlotState::Bound(_) => true,
            SlotState::Rendering(id) => {
                log::debug!("{:?} slot: {what} for {id} dropped mid-render", self.kind);
                false
            }
            _ => false,
        }
    }

    /// Applies a structural or appearance edit to the mirror, then renders.
    /// A raster failure while re-snapshotting drops back to default.
    fn edit_mirror(&mut self, ctx: &PolicyContext, edit: impl FnOnce(&mut MirrorTree) -> Result<()>) -> Result<bool> {
        let Some(mirror) = self.mirror.as_mut() else {
            return Ok(false);
        };
        match edit(mirror) {
            Ok(()) => Ok(self.render(ctx)),
            Err(e @ Error::Raster { .. }) => {
                log::warn!("{:?} slot: {e}", self.kind);
                Ok(self.reset_to_default())
            }
            Err(e) => Err(e),
        }
    }

    /// `id` (the root or a mirrored descendant) repainted.
    pub fn invalidate(&mut self, tree: &dyn HostTree, id: NodeId, ctx: &PolicyContext) -> Result<bool> {
        if !self.accepting("invalidation") {
            return Ok(false);
        }
        self.edit_mirror(ctx, |m| m.invalidate(tree, id))
    }

    pub fn child_added(&mut self, tree: &dyn HostTree, parent: NodeId, child: NodeId, ctx: &PolicyContext) -> Result<bool> {
        if !self.accepting("insertion") {
            return Ok(false);
        }
        self.edit_mirror(ctx, |m| m.add_view(tree, parent, child))
    }

    pub fn child_removed(&mut self, parent: NodeId, child: NodeId, ctx: &PolicyContext) -> Result<bool> {
        if !self.accepting("removal") {
            return Ok(false);
        }
        self.edit_mirror(ctx, |m| m.remove_view(parent, child))
    }

    /// Props for the bound root go to the displayed drawable; props for a
    /// descendant go to its mirror node and trigger a render pass.
    pub fn apply_props(&mut self, id: NodeId, delta: &PropsDelta, ctx: &PolicyContext) -> Result<bool> {
        if !self.accepting("props") {
            return Ok(false);
        }
        let Some(root) = self.bound_id() else {
            return Ok(false);
        };
        if id != root {
            return self.edit_mirror(ctx, |m| m.apply_props(id, delta));
        }
        // a deferred render still shows the system drawable; keep the values
        // for the install
        let rendered = self.current.is_rendered();
        if let Some(o) = delta.opacity {
            self.opacity = o.clamp(0.0, 1.0);
            if rendered {
                self.current.set_opacity(self.opacity);
            }
        }
        if let Some(ops) = &delta.transform {
            self.transform = TransformProps::from_ops(ops);
            if rendered {
                self.current.set_transform(self.transform);
            }
        }
        if let Some(tint) = delta.tint_color {
            self.set_tint(tint);
        }
        Ok(true)
    }

    /// Re-renders from the existing mirror after a widget-side change (size,
    /// press scale, direction). Nothing is re-snapshotted.
    pub fn relayout(&mut self, ctx: &PolicyContext) -> bool {
        if !self.accepting("relayout") {
            return false;
        }
        self.render(ctx)
    }

    pub fn set_tint(&mut self, tint: Option<Color>) {
        self.tint = tint;
        self.current.set_tint(tint);
    }

    pub fn tint(&self) -> Option<Color> {
        self.tint
    }

    /// Releases the mirror and any rendered raster.
    pub fn teardown(&mut self) {
        self.unbind();
    }
}

impl std::fmt::Debug for SlotController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotController")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("current", &self.current)
            .finish()
    }
}
