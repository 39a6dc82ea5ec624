//! # Element Storage
//!
//! ID allocation and the bucketed concurrent table every element kind is
//! stored in.

mod id;
mod table;

pub use id::{ElementId, IdRegistry};
pub use table::{Store, DEFAULT_BUCKET_COUNT};
