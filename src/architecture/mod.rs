//! # Architecture
//!
//! A tree of components, each declaring which names form its API and Impl
//! surface and which surfaces of other components it may use. The tree is
//! independent of any graph; [`ArchitectureViewCreator`] maps a graph onto
//! it.

pub mod class_set;
pub mod component;
pub mod factory;
pub mod mapper;
pub mod view;

pub use class_set::ClassSet;
pub use component::{Architecture, Component, ComponentId};
pub use factory::PackageArchitectureFactory;
pub use mapper::{ArchitectureNodeCreator, ComponentNameTagger, DependencyMapper};
pub use view::{ArchitectureHeightTagger, ArchitectureView, ArchitectureViewCreator, BaseRelationTagger};
