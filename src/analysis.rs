//! Ordered analysis pipeline.
//!
//! ```text
//! graph ──▶ ArchitectureViewCreator ──▶ view
//!                                        ├──▶ DependencyChecker (marks used rules)
//!                                        ├──▶ AllComponentsImplementedChecker
//!                                        ├──▶ AllExplicitRulesUsedChecker
//!                                        └──▶ CycleFinder (CONTAINS edges hidden)
//! ```

use tracing::{info, warn};

use crate::alg::CycleFinder;
use crate::architecture::{Architecture, ArchitectureView, ArchitectureViewCreator};
use crate::checker::{
    AllComponentsImplementedChecker, AllExplicitRulesUsedChecker, Checker, DependencyChecker,
};
use crate::config::AnalysisConfig;
use crate::model::DependencyType;
use crate::storage::filter::{DependencyTypeIn, Not};
use crate::storage::DependencyGraph;
use crate::Result;

pub struct Analyzer<'a> {
    architecture: &'a Architecture,
    tag: Option<String>,
}

impl<'a> Analyzer<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture, tag: None }
    }

    pub fn from_config(architecture: &'a Architecture, config: &AnalysisConfig) -> Self {
        Self { architecture, tag: config.view_tag.clone() }
    }

    /// Property the architecture view is filtered on.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Map `graph` onto the architecture and run every check.
    ///
    /// Mutates the base graph: component nodes, aggregated edges and the
    /// tagging properties are added to it.
    pub fn run(&self, graph: &DependencyGraph) -> Result<AnalysisReport> {
        let arch = self.architecture;
        let mut creator = ArchitectureViewCreator::new(arch);
        if let Some(tag) = &self.tag {
            creator = creator.with_tag(tag.as_str());
        }
        let view = creator.create_view(graph)?;

        let dependencies = DependencyChecker::check(view.graph(), arch)?;
        let completeness = AllComponentsImplementedChecker::check(view.graph(), arch);
        let rules = AllExplicitRulesUsedChecker::check(view.graph(), arch);

        let cycles = CycleFinder::new(&view.graph().filter_edges(Not(DependencyTypeIn(vec![
            DependencyType::Contains,
        ]))));
        cycles.mark_cycles()?;

        let report = AnalysisReport { view, dependencies, completeness, rules, cycles };
        if report.is_ok() {
            info!("Architecture {} conforms", arch.name());
        } else {
            for message in report.violation_messages() {
                warn!("{}", message);
            }
        }
        Ok(report)
    }
}

/// Results of one [`Analyzer::run`].
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    view: ArchitectureView,
    dependencies: DependencyChecker,
    completeness: AllComponentsImplementedChecker,
    rules: AllExplicitRulesUsedChecker,
    cycles: CycleFinder,
}

impl AnalysisReport {
    pub fn view(&self) -> &ArchitectureView { &self.view }
    pub fn dependencies(&self) -> &DependencyChecker { &self.dependencies }
    pub fn completeness(&self) -> &AllComponentsImplementedChecker { &self.completeness }
    pub fn rules(&self) -> &AllExplicitRulesUsedChecker { &self.rules }
    pub fn cycles(&self) -> &CycleFinder { &self.cycles }

    fn checkers(&self) -> [&dyn Checker; 4] {
        [&self.view, &self.dependencies, &self.completeness, &self.rules]
    }

    /// True when no checker found anything. Cycles are reported but do not
    /// fail the analysis.
    pub fn is_ok(&self) -> bool {
        self.checkers().iter().all(|c| c.is_ok())
    }

    /// One summary line per failing checker, in pipeline order.
    pub fn violation_messages(&self) -> Vec<String> {
        self.checkers().iter().filter_map(|c| c.violation_message()).collect()
    }
}
