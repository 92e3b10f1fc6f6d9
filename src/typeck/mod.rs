mod analyze;
mod context;
pub mod hir;
mod stdlib;
pub mod ty;

pub use analyze::analyze;
pub use context::{Context, Overrides, ScopeId};
pub use stdlib::prelude;
