//! # Dependency Graph Model
//!
//! The element types every other module works with: `Node`, `Dependency`,
//! `DependencyType` and the `Value`/`PropertyMap` property bag.
//!
//! `Node` and `Dependency` are handles onto the graph arena in
//! [`crate::storage`]; everything else here is plain data.

pub mod node;
pub mod dependency;
pub mod dependency_type;
pub mod value;
pub mod property_map;
pub mod keys;

pub use node::{Node, NodeId};
pub use dependency::{Dependency, DepId};
pub use dependency_type::DependencyType;
pub use value::Value;
pub use property_map::{PropertyMap, NAME_KEY};
