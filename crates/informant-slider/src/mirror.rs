//! Offscreen mirror of a live subtree.
//!
//! Every source node gets one [`MirrorNode`] holding a raster of its *bare*
//! appearance (children excluded; they paint from their own nodes) and its
//! rect relative to the mirrored root. Layout is one per-axis scale from the
//! reference size captured at snapshot time, so resizing the mirror never
//! re-rasterizes anything.

use std::collections::HashMap;
use std::fmt::Write as _;

use informant_core::{
    Canvas, Error, HostTree, NodeId, Paint, PropsDelta, Raster, Rect, Result, Size,
    TransformProps, Vec2,
};
use slotmap::SlotMap;

slotmap::new_key_type! {
    pub struct MirrorKey;
}

#[derive(Debug)]
pub struct MirrorNode {
    pub id: NodeId,
    parent: Option<MirrorKey>,
    /// Rect in the mirrored root's space at the last snapshot.
    relative: Rect,
    /// Rect after the last layout pass.
    rect: Rect,
    /// `None` when the source had a degenerate size.
    base: Option<Raster>,
    /// Paint order.
    children: Vec<MirrorKey>,
    alpha: f32,
    transform: TransformProps,
}

impl MirrorNode {
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn relative(&self) -> Rect {
        self.relative
    }

    pub fn base(&self) -> Option<&Raster> {
        self.base.as_ref()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[derive(Debug)]
pub struct MirrorTree {
    root: MirrorKey,
    root_id: NodeId,
    nodes: SlotMap<MirrorKey, MirrorNode>,
    index: HashMap<NodeId, MirrorKey>,
    reference: Size,
    bounds: Rect,
    scale: Vec2,
}

impl MirrorTree {
    /// Snapshots `root` and its whole subtree, laid out at the root's own size.
    pub fn build(tree: &dyn HostTree, root: NodeId) -> Result<Self> {
        let frame = tree.frame(root).ok_or(Error::Resolution(root))?;
        let mut mirror = MirrorTree {
            root: MirrorKey::default(),
            root_id: root,
            nodes: SlotMap::with_key(),
            index: HashMap::new(),
            reference: frame.size(),
            bounds: Rect::from_size(frame.w, frame.h),
            scale: Vec2 { x: 1.0, y: 1.0 },
        };
        mirror.root = mirror.build_node(tree, root, None)?;
        mirror.layout(mirror.bounds);
        log::debug!("mirrored {root}: {} node(s)", mirror.len());
        Ok(mirror)
    }

    fn build_node(&mut self, tree: &dyn HostTree, id: NodeId, parent: Option<MirrorKey>) -> Result<MirrorKey> {
        let relative = tree.rect_in(self.root_id, id).ok_or(Error::Resolution(id))?;
        let base = snapshot(tree, id, relative)?;
        let key = self.nodes.insert(MirrorNode {
            id,
            parent,
            relative,
            rect: relative,
            base,
            children: Vec::new(),
            alpha: if parent.is_some() { tree.opacity(id) } else { 1.0 },
            transform: TransformProps::default(),
        });
        self.index.insert(id, key);
        for child in tree.drawing_order(id) {
            match self.build_node(tree, child, Some(key)) {
                Ok(ck) => {
                    if let Some(node) = self.nodes.get_mut(key) {
                        node.children.push(ck);
                    }
                }
                Err(e) => {
                    self.discard(key);
                    return Err(e);
                }
            }
        }
        Ok(key)
    }

    /// Removes `key` and its subtree from the arena and the index.
    fn discard(&mut self, key: MirrorKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                if self.index.get(&node.id) == Some(&k) {
                    self.index.remove(&node.id);
                }
                stack.extend(node.children);
            }
        }
    }

    /// Mirrors a view newly attached under `parent`. Only the new subtree is
    /// built.
    pub fn add_view(&mut self, tree: &dyn HostTree, parent: NodeId, view: NodeId) -> Result<()> {
        let pk = *self.index.get(&parent).ok_or(Error::Untracked(parent))?;
        if let Some(&old) = self.index.get(&view) {
            self.detach(old);
        }
        let key = self.build_node(tree, view, Some(pk))?;
        if let Some(node) = self.nodes.get_mut(pk) {
            node.children.push(key);
        }
        self.sort_children(pk, &tree.drawing_order(parent));
        self.layout(self.bounds);
        Ok(())
    }

    /// Drops the mirror of `view`, which must currently sit under `parent`.
    pub fn remove_view(&mut self, parent: NodeId, view: NodeId) -> Result<()> {
        let key = *self.index.get(&view).ok_or(Error::Untracked(view))?;
        let mirrored_parent = self
            .nodes
            .get(key)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map(|n| n.id);
        if mirrored_parent != Some(parent) {
            return Err(Error::Untracked(view));
        }
        self.detach(key);
        self.layout(self.bounds);
        Ok(())
    }

    fn detach(&mut self, key: MirrorKey) {
        if let Some(pk) = self.nodes.get(key).and_then(|n| n.parent) {
            if let Some(parent) = self.nodes.get_mut(pk) {
                parent.children.retain(|c| *c != key);
            }
        }
        self.discard(key);
    }

    fn sort_children(&mut self, key: MirrorKey, order: &[NodeId]) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let mut kids = std::mem::take(&mut node.children);
        kids.sort_by_key(|k| {
            let id = self.nodes.get(*k).map(|n| n.id);
            order
                .iter()
                .position(|o| Some(*o) == id)
                .unwrap_or(usize::MAX)
        });
        if let Some(node) = self.nodes.get_mut(key) {
            node.children = kids;
        }
    }

    /// Re-snapshots `id`'s own appearance, re-reads the offsets of its
    /// descendants and relayouts. Nothing else is re-rasterized.
    pub fn invalidate(&mut self, tree: &dyn HostTree, id: NodeId) -> Result<()> {
        let key = *self.index.get(&id).ok_or(Error::Untracked(id))?;
        let relative = tree.rect_in(self.root_id, id).ok_or(Error::Resolution(id))?;
        let base = snapshot(tree, id, relative)?;
        let is_root = key == self.root;
        if is_root {
            self.reference = relative.size();
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.relative = relative;
            node.base = base;
            if !is_root {
                node.alpha = tree.opacity(id);
            }
        }
        self.refresh_offsets(tree, key);
        self.sort_children(key, &tree.drawing_order(id));
        self.layout(self.bounds);
        Ok(())
    }

    /// Re-reads the root-relative rect of every mirrored descendant of `key`
    /// from the live tree. Their rasters are kept.
    fn refresh_offsets(&mut self, tree: &dyn HostTree, key: MirrorKey) {
        let mut stack: Vec<MirrorKey> = self
            .nodes
            .get(key)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        while let Some(k) = stack.pop() {
            let Some(node) = self.nodes.get_mut(k) else {
                continue;
            };
            match tree.rect_in(self.root_id, node.id) {
                Some(relative) => node.relative = relative,
                None => log::debug!("{} left the mirrored subtree; keeping its last offset", node.id),
            }
            stack.extend(node.children.iter().copied());
        }
    }

    /// Places the mirror at `bounds`, scaling each axis independently
    /// against the reference size.
    pub fn layout(&mut self, bounds: Rect) {
        let sx = if self.reference.width > 0.0 {
            bounds.w / self.reference.width
        } else {
            0.0
        };
        let sy = if self.reference.height > 0.0 {
            bounds.h / self.reference.height
        } else {
            0.0
        };
        self.bounds = bounds;
        self.scale = Vec2 { x: sx, y: sy };
        for node in self.nodes.values_mut() {
            node.rect = node.relative.scale(sx, sy).offset(bounds.x, bounds.y);
        }
    }

    /// Per-node props: opacity and transform of a mirrored descendant.
    pub fn apply_props(&mut self, id: NodeId, delta: &PropsDelta) -> Result<()> {
        let key = *self.index.get(&id).ok_or(Error::Untracked(id))?;
        let Some(node) = self.nodes.get_mut(key) else {
            return Err(Error::Untracked(id));
        };
        if let Some(o) = delta.opacity {
            node.alpha = o.clamp(0.0, 1.0);
        }
        if let Some(ops) = &delta.transform {
            node.transform = TransformProps::from_ops(ops);
        }
        Ok(())
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>) {
        self.draw_node(self.root, canvas);
    }

    fn draw_node(&self, key: MirrorKey, canvas: &mut Canvas<'_>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        canvas.save();
        canvas.multiply_alpha(node.alpha);
        if !node.transform.is_identity() {
            canvas.concat(&node.transform.to_transform(node.rect));
        }
        if let Some(base) = &node.base {
            let dst = Rect::new(
                node.rect.x,
                node.rect.y,
                base.width() as f32 * self.scale.x,
                base.height() as f32 * self.scale.y,
            );
            canvas.draw_raster(base, dst, &Paint::default());
        }
        for child in &node.children {
            self.draw_node(*child, canvas);
        }
        canvas.restore();
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn reference(&self) -> Size {
        self.reference
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&MirrorNode> {
        self.index.get(&id).and_then(|k| self.nodes.get(*k))
    }

    pub fn rect_of(&self, id: NodeId) -> Option<Rect> {
        self.node(id).map(|n| n.rect)
    }

    /// Child identities of `id` in paint order.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|k| self.nodes.get(*k).map(|c| c.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Indented dump, one node per line, in paint order.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_node(self.root, 0, &mut out);
        out.truncate(out.trim_end().len());
        out
    }

    fn describe_node(&self, key: MirrorKey, depth: usize, out: &mut String) {
        let Some(n) = self.nodes.get(key) else {
            return;
        };
        let r = n.rect;
        let _ = write!(out, "{:indent$}{} [{},{} {}x{}]", "", n.id, r.x, r.y, r.w, r.h, indent = depth * 2);
        match &n.base {
            Some(b) => {
                let _ = write!(out, " base {}x{}", b.width(), b.height());
            }
            None => out.push_str(" bare"),
        }
        if n.alpha < 1.0 {
            let _ = write!(out, " alpha {}", n.alpha);
        }
        out.push('\n');
        for child in &n.children {
            self.describe_node(*child, depth + 1, out);
        }
    }
}

/// Rasterizes `id`'s bare appearance at its own size. Degenerate sizes
/// produce no raster rather than an error.
fn snapshot(tree: &dyn HostTree, id: NodeId, rect: Rect) -> Result<Option<Raster>> {
    if rect.is_empty() {
        return Ok(None);
    }
    let mut raster = Raster::for_rect(rect)?;
    {
        let mut canvas = Canvas::new(&mut raster);
        tree.draw_bare(id, &mut canvas);
    }
    Ok(Some(raster))
}
