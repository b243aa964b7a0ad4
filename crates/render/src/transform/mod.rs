//! HTML post-processing stages run after the renderer.
//!
//! - `anchor` - heading ids and permalinks
//! - `toc` - table of contents injection

pub mod anchor;
pub mod toc;

pub use anchor::{AnchorOptions, Placement, decorate};
pub use toc::{ListType, MarkerScanner, TocEntry, TocOptions, build_toc, inject, inject_block};
