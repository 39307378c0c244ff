use std::collections::HashMap;
use std::fmt;

use crate::{Canvas, Color, Error, Rect, Result};

/// Stable handle for a host tree node, independent of its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read access to the live UI tree the mirrors are built from.
///
/// Implementations are only ever called on the UI-owning thread.
pub trait HostTree {
    fn contains(&self, id: NodeId) -> bool;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Children in index order. Empty for leaves and unknown ids.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    /// Children in paint order (z-index remap applied).
    fn drawing_order(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
    }

    /// Rect relative to the parent.
    fn frame(&self, id: NodeId) -> Option<Rect>;

    fn opacity(&self, _id: NodeId) -> f32 {
        1.0
    }

    /// Paints only the node's own background and foreground into `canvas`,
    /// in local coordinates (`0,0` is the node's top-left). Children are not
    /// painted.
    fn draw_bare(&self, id: NodeId, canvas: &mut Canvas<'_>);

    /// `id`'s rect in `ancestor`'s coordinate space. `None` if `id` is not a
    /// descendant of (or equal to) `ancestor`.
    fn rect_in(&self, ancestor: NodeId, id: NodeId) -> Option<Rect> {
        let frame = self.frame(id)?;
        if id == ancestor {
            return Some(Rect::from_size(frame.w, frame.h));
        }
        let mut rect = frame;
        let mut cur = self.parent(id)?;
        while cur != ancestor {
            let f = self.frame(cur)?;
            rect = rect.offset(f.x, f.y);
            cur = self.parent(cur)?;
        }
        Some(rect)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewStyle {
    pub background: Option<Color>,
    pub corner_radius: f32,
    pub border: Option<Border>,
}

impl ViewStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            background: Some(color),
            ..Default::default()
        }
    }
    pub fn radius(mut self, r: f32) -> Self {
        self.corner_radius = r;
        self
    }
    pub fn border(mut self, width: f32, color: Color) -> Self {
        self.border = Some(Border { width, color });
        self
    }
}

#[derive(Clone, Debug)]
pub struct View {
    pub id: NodeId,
    pub frame: Rect,
    pub style: ViewStyle,
    pub opacity: f32,
    pub z_index: f32,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl View {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// In-memory reference host: plain boxes with background, border and
/// z-index. Edits do not notify anyone; embedders forward them to the
/// registry.
#[derive(Default)]
pub struct ViewTree {
    views: HashMap<NodeId, View>,
    next_id: u64,
}

impl ViewTree {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a view and, if `parent` is given, appends it there.
    pub fn add(&mut self, parent: Option<NodeId>, frame: Rect, style: ViewStyle) -> Result<NodeId> {
        if let Some(p) = parent {
            if !self.views.contains_key(&p) {
                return Err(Error::Resolution(p));
            }
        }
        let id = NodeId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.views.insert(
            id,
            View {
                id,
                frame,
                style,
                opacity: 1.0,
                z_index: 0.0,
                visible: true,
                parent: None,
                children: Vec::new(),
            },
        );
        if let Some(p) = parent {
            self.insert_child(p, id, None)?;
        }
        Ok(id)
    }

    pub fn view(&self, id: NodeId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn view_mut(&mut self, id: NodeId) -> Result<&mut View> {
        self.views.get_mut(&id).ok_or(Error::Resolution(id))
    }

    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<()> {
        if !self.views.contains_key(&child) {
            return Err(Error::Resolution(child));
        }
        if let Some(old) = self.views.get(&child).and_then(|v| v.parent) {
            self.remove_child(old, child)?;
        }
        let p = self.views.get_mut(&parent).ok_or(Error::Resolution(parent))?;
        let at = index.unwrap_or(p.children.len()).min(p.children.len());
        p.children.insert(at, child);
        self.view_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detaches `child` (and its subtree) from `parent`; the views stay alive.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let p = self.views.get_mut(&parent).ok_or(Error::Resolution(parent))?;
        let Some(pos) = p.children.iter().position(|c| *c == child) else {
            return Err(Error::Untracked(child));
        };
        p.children.remove(pos);
        self.view_mut(child)?.parent = None;
        Ok(())
    }

    /// Destroys `id` and its whole subtree.
    pub fn drop_view(&mut self, id: NodeId) {
        if let Some(parent) = self.views.get(&id).and_then(|v| v.parent) {
            let _ = self.remove_child(parent, id);
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(v) = self.views.remove(&cur) {
                stack.extend(v.children);
            }
        }
    }

    pub fn set_frame(&mut self, id: NodeId, frame: Rect) -> Result<()> {
        self.view_mut(id)?.frame = frame;
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: ViewStyle) -> Result<()> {
        self.view_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> Result<()> {
        self.view_mut(id)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_z_index(&mut self, id: NodeId, z: f32) -> Result<()> {
        self.view_mut(id)?.z_index = z;
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.view_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Paints `id` and its visible descendants, `id`'s top-left at the
    /// canvas origin.
    pub fn draw(&self, id: NodeId, canvas: &mut Canvas<'_>) {
        self.draw_bare(id, canvas);
        for child in self.drawing_order(id) {
            let Some(v) = self.views.get(&child) else {
                continue;
            };
            if !v.visible {
                continue;
            }
            canvas.save();
            canvas.translate(v.frame.x, v.frame.y);
            canvas.multiply_alpha(v.opacity);
            self.draw(child, canvas);
            canvas.restore();
        }
    }
}

impl HostTree for ViewTree {
    fn contains(&self, id: NodeId) -> bool {
        self.views.contains_key(&id)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.views.get(&id).and_then(|v| v.parent)
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.views
            .get(&id)
            .map(|v| v.children.clone())
            .unwrap_or_default()
    }

    fn drawing_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut kids = self.children(id);
        // stable: equal z keeps index order
        kids.sort_by(|a, b| {
            let za = self.views.get(a).map_or(0.0, |v| v.z_index);
            let zb = self.views.get(b).map_or(0.0, |v| v.z_index);
            za.total_cmp(&zb)
        });
        kids
    }

    fn frame(&self, id: NodeId) -> Option<Rect> {
        self.views.get(&id).map(|v| v.frame)
    }

    fn opacity(&self, id: NodeId) -> f32 {
        self.views.get(&id).map_or(1.0, |v| v.opacity)
    }

    fn draw_bare(&self, id: NodeId, canvas: &mut Canvas<'_>) {
        let Some(v) = self.views.get(&id) else {
            return;
        };
        if !v.visible {
            return;
        }
        let local = Rect::from_size(v.frame.w, v.frame.h);
        if let Some(bg) = v.style.background {
            canvas.fill_round_rect(local, v.style.corner_radius, bg);
        }
        if let Some(b) = v.style.border {
            canvas.stroke_round_rect(local, v.style.corner_radius, b.width, b.color);
        }
    }
}
