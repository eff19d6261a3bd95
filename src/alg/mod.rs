//! Graph algorithms that do not depend on an architecture.

pub mod cycles;

pub use cycles::CycleFinder;
