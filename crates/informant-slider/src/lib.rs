//! Slider slots rendered from live view subtrees.
//!
//! A [`SliderSurface`] has four slots ([`SlotKind`]): handle, fill, rail and
//! background. Each shows the widget's own drawable until it is bound to a
//! node of the host tree; from then on it shows a [`MirrorTree`] render of
//! that node's subtree, kept current by host events the [`Registry`] routes
//! back to the slot.
//!
//! ```rust
//! use informant_core::*;
//! use informant_slider::*;
//!
//! let ui = UiContext::new();
//! let mut tree = ViewTree::new();
//! let thumb = tree
//!     .add(None, Rect::from_size(24.0, 24.0), ViewStyle::filled(Color::WHITE))
//!     .unwrap();
//!
//! let registry = Registry::new(ui.handle());
//! let slider = SliderSurface::new(registry.clone(), SliderConfig::default());
//! slider.set_bounds(Rect::from_size(200.0, 40.0));
//! slider.bind_slot(SlotKind::Handle, Some(thumb));
//! ui.pump(&tree).unwrap();
//!
//! assert!(slider.current_drawable(SlotKind::Handle).is_rendered());
//! assert_eq!(registry.origin_of(thumb), Some(thumb));
//! ```

pub mod config;
pub mod drawable;
pub mod layout;
pub mod mirror;
pub mod policy;
pub mod registry;
pub mod slot;
pub mod surface;

pub use config::SliderConfig;
pub use drawable::{Drawable, DrawableState, MAX_LEVEL, SystemPainter};
pub use layout::{ProgressLayout, RailPlacement};
pub use mirror::{MirrorNode, MirrorTree};
pub use policy::{PolicyContext, SlotKind};
pub use registry::{Entry, InformantTarget, Registry, TargetKey};
pub use slot::{SlotController, SlotState};
pub use surface::{RepaintHook, SliderSurface};
