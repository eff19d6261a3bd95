//! Architecture derived from the package structure of node names.
//!
//! Every proper name prefix becomes a component, nested by prefix:
//!
//! ```text
//! com.example.api.A          Package
//! com.example.impl.a.B  ──▶   └── com
//!                                  └── com.example
//!                                       ├── com.example.api
//!                                       └── com.example.impl
//!                                            └── com.example.impl.a
//! ```
//!
//! Each component gets one API set named after itself that covers its whole
//! subtree (`prefix.**`).

use tracing::debug;

use super::{Architecture, ComponentId};
use crate::config::{AnalysisConfig, DEFAULT_ARCHITECTURE_NAME};
use crate::matcher::NameMatcher;
use crate::model::keys;
use crate::storage::DependencyGraph;
use crate::Result;

pub struct PackageArchitectureFactory<'g> {
    graph: &'g DependencyGraph,
    name: String,
    matcher: NameMatcher,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl<'g> PackageArchitectureFactory<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            name: DEFAULT_ARCHITECTURE_NAME.to_owned(),
            matcher: NameMatcher::default(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn from_config(graph: &'g DependencyGraph, config: &AnalysisConfig) -> Self {
        Self::new(graph)
            .with_name(config.architecture_name.clone())
            .with_matcher(config.matcher())
            .with_filters(config.includes.clone(), config.excludes.clone())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_matcher(mut self, matcher: NameMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Include and exclude patterns copied onto the created architecture.
    pub fn with_filters(mut self, includes: Vec<String>, excludes: Vec<String>) -> Self {
        self.includes = includes;
        self.excludes = excludes;
        self
    }

    /// Build the architecture. `max_depth` limits the number of name
    /// segments in a component name; 0 means unbounded. A bounded
    /// architecture is named `"{name}-{max_depth}"`.
    pub fn create_architecture(&self, max_depth: usize) -> Result<Architecture> {
        let arch_name = if max_depth > 0 {
            format!("{}-{}", self.name, max_depth)
        } else {
            self.name.clone()
        };
        let mut architecture = Architecture::with_matcher(arch_name, self.matcher.clone());
        for pattern in &self.includes {
            architecture.add_include(pattern.as_str());
        }
        for pattern in &self.excludes {
            architecture.add_exclude(pattern.as_str());
        }

        let mut names: Vec<String> = self
            .graph
            .all_nodes()
            .into_iter()
            .filter(|n| n.property_str(keys::TYPE).as_deref() != Some(keys::TYPE_ARCHITECTURE))
            .filter(|n| architecture.is_included(n.name()))
            .map(|n| n.name().to_owned())
            .collect();
        names.sort();

        let mut top_level = Vec::new();
        for name in &names {
            match self.component_name(name, max_depth) {
                Some(component) => {
                    self.ensure_component(&mut architecture, &component, max_depth)?;
                }
                None => top_level.push(name),
            }
        }
        for name in top_level {
            if architecture.component_id(name).is_none() {
                self.create_component(&mut architecture, ComponentId::ROOT, name)?;
            }
        }

        debug!(
            "Created architecture {} with {} components",
            architecture.name(),
            architecture.all_components().len()
        );
        Ok(architecture)
    }

    /// The package part of `name`, cut to at most `max_depth` segments.
    ///
    /// `com.example.api.A` gives `com.example.api`; a name without separator
    /// has no component name.
    pub fn component_name(&self, name: &str, max_depth: usize) -> Option<String> {
        let separator = self.matcher.separator();
        let mut parts: Vec<&str> = if max_depth > 0 {
            name.splitn(max_depth + 1, separator).collect()
        } else {
            name.split(separator).collect()
        };
        if max_depth == 0 {
            while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
                parts.pop();
            }
        }
        if parts.len() <= 1 {
            return None;
        }
        let end = if max_depth == 0 {
            parts.len() - 1
        } else {
            max_depth.min(parts.len() - 1)
        };
        Some(parts[..end].join(separator))
    }

    /// Create `name` and any missing ancestors, top-down.
    fn ensure_component(&self, architecture: &mut Architecture, name: &str, max_depth: usize) -> Result<ComponentId> {
        let mut missing = Vec::new();
        let mut current = name.to_owned();
        let mut parent = ComponentId::ROOT;
        loop {
            if let Some(id) = architecture.component_id(&current) {
                parent = id;
                break;
            }
            let next = self.component_name(&current, max_depth);
            missing.push(current);
            match next {
                Some(prefix) => current = prefix,
                None => break,
            }
        }
        while let Some(component) = missing.pop() {
            parent = self.create_component(architecture, parent, &component)?;
        }
        Ok(parent)
    }

    fn create_component(&self, architecture: &mut Architecture, parent: ComponentId, name: &str) -> Result<ComponentId> {
        let id = architecture.add_component(parent, name)?;
        let api = architecture.class_set(name, [format!("{}{}*", name, self.matcher.separator())]);
        architecture.component_mut(id).add_api(api);
        Ok(id)
    }
}
