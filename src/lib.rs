//! # depgraph: dependency graphs and architecture conformance
//!
//! A typed, property-bearing dependency graph with non-destructive filtered
//! views, plus an architecture model that maps fine-grained dependencies onto
//! a component tree and checks every aggregated dependency against the
//! component usage rules.
//!
//! ## Design Principles
//!
//! 1. **One arena**: nodes and edges live in a single store; `Node` and
//!    `Dependency` are cheap handles onto it
//! 2. **Views, not copies**: `filter_nodes` / `filter_edges` mask the arena,
//!    `base_graph()` always leads back to the mutable root
//! 3. **Violations are data**: checkers return results, `Error` is reserved
//!    for broken input and broken invariants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use depgraph::{DependencyGraph, DependencyType, PackageArchitectureFactory, Analyzer};
//!
//! # fn example() -> depgraph::Result<()> {
//! let graph = DependencyGraph::new();
//! let a = graph.get_or_create_node_by_name("com.acme.web.Controller")?;
//! let b = graph.get_or_create_node_by_name("com.acme.db.Repository")?;
//! graph.add_dependency(&a, &b, DependencyType::ReadOnly)?;
//!
//! let architecture = PackageArchitectureFactory::new(&graph).create_architecture(0)?;
//! let report = Analyzer::new(&architecture).run(&graph)?;
//! for message in report.violation_messages() {
//!     println!("{message}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Step | Type | Produces |
//! |------|------|----------|
//! | Map | `ArchitectureViewCreator` | component nodes, aggregated edges, view |
//! | Check | `DependencyChecker` | uncovered dependencies, used rules |
//! | Check | `AllComponentsImplementedChecker` | empty components |
//! | Check | `AllExplicitRulesUsedChecker` | unused rules |
//! | Inspect | `CycleFinder` | strongly connected components |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod matcher;
pub mod architecture;
pub mod checker;
pub mod alg;
pub mod exchange;
pub mod config;
pub mod analysis;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Node, NodeId, Dependency, DepId, DependencyType, Value, PropertyMap,
};

// ============================================================================
// Re-exports: Graph and views
// ============================================================================

pub use storage::{DependencyGraph, NodeFilter, EdgeFilter};
pub use matcher::{NameMatcher, PatternSet};

// ============================================================================
// Re-exports: Architecture and checks
// ============================================================================

pub use architecture::{
    Architecture, ArchitectureView, ArchitectureViewCreator, ClassSet, Component, ComponentId,
    PackageArchitectureFactory,
};
pub use checker::{
    AllComponentsImplementedChecker, AllExplicitRulesUsedChecker, Checker, DependencyChecker,
};
pub use alg::cycles::CycleFinder;
pub use config::AnalysisConfig;
pub use analysis::{AnalysisReport, Analyzer};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Graph is unmodifiable: {0}")]
    Unmodifiable(String),

    #[error("The name of an element can not be changed")]
    ImmutableName,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown dependency type: {0}")]
    UnknownDependencyType(String),

    #[error("Inconsistent architecture graph: {0}")]
    Inconsistency(String),

    #[error("Invalid graph document: {0}")]
    InvalidGraph(String),

    #[error("Malformed graph document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
