//! Well-known property keys written and read by the mapper and checkers.
//!
//! Keys ending in `_SUFFIX` are appended to an architecture name, e.g.
//! `Package-parent`.

/// `type` of synthesized architecture nodes.
pub const TYPE: &str = "type";
pub const TYPE_ARCHITECTURE: &str = "architecture";
/// Name of the architecture an architecture node belongs to.
pub const ARCHITECTURE: &str = "architecture";

/// Rule names declared on a component node.
pub const USES_API: &str = "uses-api";
pub const USES_IMPL: &str = "uses-impl";
/// Rule names that justified at least one dependency.
pub const USED_RULES: &str = "used-rules";

/// Architectures a node could not be mapped into.
pub const UNMAPPED: &str = "architecture-unmapped";

pub const UNMAPPED_SUFFIX: &str = "-unmapped";
pub const IGNORED_SUFFIX: &str = "-ignored";
pub const PARENT_SUFFIX: &str = "-parent";
pub const PARENT_API_SUFFIX: &str = "-api";
pub const PARENT_IMPL_SUFFIX: &str = "-impl";
pub const IS_IMPL_SUFFIX: &str = "-is-impl";
pub const HEIGHT_SUFFIX: &str = "-height";

/// API and Impl names referenced through an aggregated dependency.
pub const USES_TARGET_API: &str = "uses-target-API";
pub const USES_TARGET_IMPL: &str = "uses-target-Impl";

pub const BASE_REL_COUNT: &str = "baseRelCount";
pub const BASE_REL_COUNT_SOURCES: &str = "baseRelCountSources";
pub const BASE_REL_COUNT_TARGETS: &str = "baseRelCountTargets";

pub const IN_CYCLE: &str = "IN_CYCLE";
pub const CYCLE: &str = "CYCLE";

/// `{architecture}{suffix}`
pub fn arch_key(architecture: &str, suffix: &str) -> String {
    format!("{architecture}{suffix}")
}
