//! Component tree and the Architecture that owns it.
//!
//! Components live in an arena inside [`Architecture`]; index 0 is the root,
//! which carries the architecture's name. Children always reference an
//! existing parent, so the tree can only grow downwards.

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;

use super::ClassSet;
use crate::matcher::{NameMatcher, PatternSet};
use crate::{Error, Result};

/// Index of a component in its architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    pub const ROOT: ComponentId = ComponentId(0);

    pub fn index(self) -> usize { self.0 }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Component
// ============================================================================

/// A named unit of the architecture.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
    api: BTreeMap<String, ClassSet>,
    implementation: BTreeMap<String, ClassSet>,
    uses: BTreeMap<String, ClassSet>,
    uses_impl: BTreeMap<String, ClassSet>,
}

impl Component {
    fn new(name: String, parent: Option<ComponentId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            api: BTreeMap::new(),
            implementation: BTreeMap::new(),
            uses: BTreeMap::new(),
            uses_impl: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn parent(&self) -> Option<ComponentId> { self.parent }
    pub fn children(&self) -> &[ComponentId] { &self.children }

    /// Public surface, by set name.
    pub fn api(&self) -> &BTreeMap<String, ClassSet> { &self.api }
    /// Implementation surface, by set name.
    pub fn implementation(&self) -> &BTreeMap<String, ClassSet> { &self.implementation }
    /// API sets of other components this one may reference, by rule name.
    pub fn uses(&self) -> &BTreeMap<String, ClassSet> { &self.uses }
    /// Impl sets of other components this one may reference, by rule name.
    pub fn uses_impl(&self) -> &BTreeMap<String, ClassSet> { &self.uses_impl }

    pub fn add_api(&mut self, set: ClassSet) -> &mut Self {
        self.api.insert(set.name().to_owned(), set);
        self
    }

    pub fn add_impl(&mut self, set: ClassSet) -> &mut Self {
        self.implementation.insert(set.name().to_owned(), set);
        self
    }

    pub fn add_uses(&mut self, set: ClassSet) -> &mut Self {
        self.uses.insert(set.name().to_owned(), set);
        self
    }

    pub fn add_uses_impl(&mut self, set: ClassSet) -> &mut Self {
        self.uses_impl.insert(set.name().to_owned(), set);
        self
    }

    /// Name of the first API set containing `name`.
    pub fn api_name_for(&self, name: &str) -> Option<&str> {
        first_match(&self.api, name)
    }

    /// Name of the first Impl set containing `name`.
    pub fn impl_name_for(&self, name: &str) -> Option<&str> {
        first_match(&self.implementation, name)
    }

    /// True if `name` belongs to this component's API or Impl surface.
    pub fn owns(&self, name: &str) -> bool {
        self.api_name_for(name).is_some() || self.impl_name_for(name).is_some()
    }
}

fn first_match<'a>(sets: &'a BTreeMap<String, ClassSet>, name: &str) -> Option<&'a str> {
    sets.values().find(|set| set.contains(name)).map(ClassSet::name)
}

// ============================================================================
// Architecture
// ============================================================================

/// A component tree plus the matching conventions for its patterns.
#[derive(Debug, Clone)]
pub struct Architecture {
    matcher: NameMatcher,
    components: Vec<Component>,
    by_name: HashMap<String, ComponentId>,
    /// Non-root components, longest name first, then alphabetical.
    by_specificity: Vec<ComponentId>,
    includes: Vec<String>,
    excludes: Vec<String>,
    included: PatternSet,
    excluded: PatternSet,
}

impl Architecture {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_matcher(name, NameMatcher::default())
    }

    pub fn with_matcher(name: impl Into<String>, matcher: NameMatcher) -> Self {
        let name = name.into();
        let mut by_name = HashMap::new();
        by_name.insert(name.clone(), ComponentId::ROOT);
        let empty = matcher.compile::<String>(&[]);
        Self {
            included: empty.clone(),
            excluded: empty,
            matcher,
            components: vec![Component::new(name, None)],
            by_name,
            by_specificity: Vec::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str { &self.components[0].name }
    pub fn matcher(&self) -> &NameMatcher { &self.matcher }
    pub fn separator(&self) -> &str { self.matcher.separator() }

    pub fn root(&self) -> &Component { &self.components[0] }

    /// A ClassSet using this architecture's separator.
    pub fn class_set(&self, name: impl Into<String>, patterns: impl IntoIterator<Item = impl Into<String>>) -> ClassSet {
        ClassSet::with_matcher(name, patterns, self.matcher.clone())
    }

    /// Add a child of `parent`. Component names are unique.
    pub fn add_component(&mut self, parent: ComponentId, name: impl Into<String>) -> Result<ComponentId> {
        let name = name.into();
        if parent.0 >= self.components.len() {
            return Err(Error::NotFound(format!("parent component #{parent}")));
        }
        if self.by_name.contains_key(&name) {
            return Err(Error::InvalidArgument(format!("duplicate component {name}")));
        }
        let id = ComponentId(self.components.len());
        self.components.push(Component::new(name.clone(), Some(parent)));
        self.components[parent.0].children.push(id);
        self.by_name.insert(name, id);

        let pos = self
            .by_specificity
            .binary_search_by(|&other| specificity(&self.components[other.0].name, &self.components[id.0].name))
            .unwrap_or_else(|pos| pos);
        self.by_specificity.insert(pos, id);
        Ok(id)
    }

    pub fn component(&self, id: ComponentId) -> &Component { &self.components[id.0] }

    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component { &mut self.components[id.0] }

    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.component_id(name).map(|id| self.component(id))
    }

    /// Every component except the root, most specific first.
    pub fn all_components(&self) -> Vec<&Component> {
        self.by_specificity.iter().map(|&id| self.component(id)).collect()
    }

    /// Ids of all components including the root, in depth-first order.
    pub fn depth_first(&self) -> Vec<ComponentId> {
        let mut order = Vec::with_capacity(self.components.len());
        let mut stack = vec![ComponentId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.components[id.0].children.iter().rev().copied());
        }
        order
    }

    /// `id` followed by its parent, grandparent, ..., up to the root.
    pub fn ancestors(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.components[current.0].parent {
            if chain.len() > self.components.len() {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The component owning the node called `name`.
    ///
    /// For a component name this is its parent component. Otherwise it is
    /// the most specific component whose API or Impl sets contain `name`.
    pub fn parent_component(&self, name: &str) -> Option<ComponentId> {
        if let Some(id) = self.component_id(name) {
            return self.component(id).parent;
        }
        self.by_specificity
            .iter()
            .copied()
            .chain(std::iter::once(ComponentId::ROOT))
            .find(|&id| self.component(id).owns(name))
    }

    pub fn parent_component_name(&self, name: &str) -> Option<&str> {
        self.parent_component(name).map(|id| self.component(id).name())
    }

    // ========================================================================
    // Include / exclude
    // ========================================================================

    pub fn add_include(&mut self, pattern: impl Into<String>) {
        self.includes.push(self.matcher.normalize(&pattern.into()));
        self.included = self.matcher.compile(&self.includes);
    }

    pub fn add_exclude(&mut self, pattern: impl Into<String>) {
        self.excludes.push(self.matcher.normalize(&pattern.into()));
        self.excluded = self.matcher.compile(&self.excludes);
    }

    /// False for names the architecture explicitly leaves out.
    pub fn is_included(&self, name: &str) -> bool {
        (self.includes.is_empty() || self.included.is_match(name)) && !self.excluded.is_match(name)
    }
}

fn specificity(a: &str, b: &str) -> std::cmp::Ordering {
    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
}
