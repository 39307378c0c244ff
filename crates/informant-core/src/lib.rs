//! # Host tree, rasters and the UI thread
//!
//! `informant-core` holds everything the slot engines need to talk about a
//! live UI tree without knowing which toolkit owns it:
//!
//! - [`HostTree`]: read access to node identity, geometry and "bare"
//!   painting (a node's own appearance, children excluded). [`ViewTree`] is
//!   the in-memory reference host.
//! - [`Raster`] / [`Canvas`]: deterministic software rasterization with a
//!   save/restore stack of transform, clip and alpha.
//! - [`PropsDelta`] / [`TransformProps`]: prop updates as hosts deliver them
//!   (`opacity`, an ordered `transform` list, `tint_color`).
//! - [`UiContext`]: the single UI-owning execution context; other threads
//!   post work through a [`UiHandle`].
//!
//! ```rust
//! use informant_core::*;
//!
//! let mut tree = ViewTree::new();
//! let root = tree
//!     .add(None, Rect::from_size(4.0, 4.0), ViewStyle::filled(Color::WHITE))
//!     .unwrap();
//!
//! let mut raster = Raster::new(4, 4).unwrap();
//! let mut canvas = Canvas::new(&mut raster);
//! tree.draw_bare(root, &mut canvas);
//! assert_eq!(raster.pixel(0, 0), Some(Color::WHITE));
//! ```

pub mod animation;
pub mod color;
pub mod error;
pub mod geometry;
pub mod prelude;
pub mod props;
pub mod raster;
pub mod runtime;
pub mod tests;
pub mod view;

pub use color::*;
pub use error::*;
pub use geometry::*;
pub use props::*;
pub use raster::*;
pub use runtime::*;
pub use view::*;
