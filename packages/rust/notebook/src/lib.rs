//! Notebook cell transformation for nbimport.
//!
//! Given a fetched notebook, a sequence of setup cells, and the notebook's
//! source URL, produces the playground-ready cell sequence:
//!
//! 1. setup cells are placed ahead of the original cells,
//! 2. every line is rewritten (literal patches, `%URL%`, GitHub raw links),
//! 3. code cells are reset to "never executed" with no outputs.

pub mod rewrite;
pub mod transform;

pub use rewrite::{apply_patches, canonicalize_links, substitute_placeholder};
pub use transform::{Transformer, transform};
