//! Processor run planning.
//!
//! A chain is planned once from a selection of processor names. Roots are
//! visited in `(priority, name)` order and each processor's dependencies are
//! placed before it, so the plan is deterministic and every dependency edge
//! is honoured even when priorities disagree with it.

use std::time::Instant;

use tracing::{debug, info, info_span};

use super::{ProcessorRegistry, ReportProcessor, default_registry};
use crate::config::ProcessingContext;
use crate::error::{ChainError, Result};
use crate::frame::ReportFrame;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// An ordered list of processors ready to run.
pub struct ProcessorChain<'a> {
    processors: Vec<&'a dyn ReportProcessor>,
}

impl ProcessorChain<'static> {
    /// Every enabled processor of the default registry.
    pub fn default_chain() -> std::result::Result<Self, ChainError> {
        ProcessorChain::enabled(default_registry())
    }

    /// An explicit selection from the default registry; disabled processors
    /// may be named.
    pub fn with_processors<S: AsRef<str>>(names: &[S]) -> std::result::Result<Self, ChainError> {
        ProcessorChain::plan(default_registry(), names)
    }
}

impl<'a> ProcessorChain<'a> {
    /// Every enabled processor of `registry`.
    pub fn enabled(registry: &'a ProcessorRegistry) -> std::result::Result<Self, ChainError> {
        let names: Vec<&str> = registry
            .iter()
            .filter(|processor| processor.is_enabled())
            .map(ReportProcessor::name)
            .collect();
        ProcessorChain::plan(registry, &names)
    }

    /// Plans `names` and their transitive dependencies.
    ///
    /// # Errors
    ///
    /// [`ChainError::UnknownProcessor`] for a name not in the registry,
    /// [`ChainError::UnknownDependency`] for a dependency not in the
    /// registry, and [`ChainError::Cycle`] when dependencies loop.
    pub fn plan<S: AsRef<str>>(
        registry: &'a ProcessorRegistry,
        names: &[S],
    ) -> std::result::Result<Self, ChainError> {
        let mut roots = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let processor = registry
                .get(name)
                .ok_or_else(|| ChainError::UnknownProcessor {
                    name: name.to_string(),
                })?;
            roots.push(processor);
        }
        roots.sort_by_key(|processor| (processor.priority(), processor.name()));
        roots.dedup_by_key(|processor| processor.name());

        let mut planner = Planner {
            registry,
            marks: Vec::new(),
            stack: Vec::new(),
            order: Vec::new(),
        };
        for root in roots {
            planner.visit(root)?;
        }
        debug!(
            order = ?planner.order.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "planned processor chain"
        );
        Ok(Self {
            processors: planner.order,
        })
    }

    pub fn processors(&self) -> &[&'a dyn ReportProcessor] {
        &self.processors
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs every processor in order, feeding each the previous output.
    pub fn run(&self, report: &ReportFrame, context: &ProcessingContext) -> Result<ReportFrame> {
        let mut current = report.clone();
        for processor in &self.processors {
            let span = info_span!("processor", name = processor.name());
            let _guard = span.enter();
            let start = Instant::now();
            current = processor.process(&current, context)?;
            debug!(
                rows = current.height(),
                columns = current.width(),
                duration_ms = start.elapsed().as_millis(),
                "processor finished"
            );
        }
        info!(
            processors = self.processors.len(),
            rows = current.height(),
            "processor chain complete"
        );
        Ok(current)
    }
}

struct Planner<'a> {
    registry: &'a ProcessorRegistry,
    marks: Vec<(&'static str, Mark)>,
    stack: Vec<&'static str>,
    order: Vec<&'a dyn ReportProcessor>,
}

impl<'a> Planner<'a> {
    fn mark(&self, name: &str) -> Mark {
        self.marks
            .iter()
            .find(|(existing, _)| *existing == name)
            .map_or(Mark::Unvisited, |(_, mark)| *mark)
    }

    fn set_mark(&mut self, name: &'static str, mark: Mark) {
        match self.marks.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = mark,
            None => self.marks.push((name, mark)),
        }
    }

    fn visit(&mut self, processor: &'a dyn ReportProcessor) -> std::result::Result<(), ChainError> {
        let name = processor.name();
        match self.mark(name) {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = self
                    .stack
                    .iter()
                    .position(|entry| *entry == name)
                    .unwrap_or(0);
                let mut path: Vec<String> =
                    self.stack[start..].iter().map(ToString::to_string).collect();
                path.push(name.to_string());
                return Err(ChainError::Cycle { path });
            }
            Mark::Unvisited => {}
        }

        self.set_mark(name, Mark::InProgress);
        self.stack.push(name);
        let mut dependencies = Vec::with_capacity(processor.dependencies().len());
        for dependency in processor.dependencies() {
            let resolved =
                self.registry
                    .get(dependency)
                    .ok_or_else(|| ChainError::UnknownDependency {
                        name: (*dependency).to_string(),
                        required_by: name.to_string(),
                    })?;
            dependencies.push(resolved);
        }
        dependencies.sort_by_key(|p| (p.priority(), p.name()));
        for dependency in dependencies {
            self.visit(dependency)?;
        }
        self.stack.pop();
        self.set_mark(name, Mark::Done);
        self.order.push(processor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        name: &'static str,
        priority: i32,
        dependencies: &'static [&'static str],
    }

    impl ReportProcessor for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.dependencies
        }

        fn process(&self, report: &ReportFrame, _: &ProcessingContext) -> Result<ReportFrame> {
            Ok(report.clone())
        }
    }

    fn registry(stubs: Vec<Stub>) -> ProcessorRegistry {
        let mut registry = ProcessorRegistry::new();
        for stub in stubs {
            registry.register(Box::new(stub));
        }
        registry
    }

    fn stub(name: &'static str, priority: i32, dependencies: &'static [&'static str]) -> Stub {
        Stub {
            name,
            priority,
            dependencies,
        }
    }

    #[test]
    fn dependencies_run_first_even_with_higher_priority() {
        let registry = registry(vec![
            stub("Late", 50, &[]),
            stub("Early", 1, &["Late"]),
            stub("Middle", 10, &[]),
        ]);
        let chain = ProcessorChain::enabled(&registry).unwrap();
        assert_eq!(chain.names(), vec!["Late", "Early", "Middle"]);
    }

    #[test]
    fn ties_are_broken_by_name() {
        let registry = registry(vec![stub("B", 5, &[]), stub("A", 5, &[]), stub("C", 1, &[])]);
        let chain = ProcessorChain::enabled(&registry).unwrap();
        assert_eq!(chain.names(), vec!["C", "A", "B"]);
    }

    #[test]
    fn disabled_processors_need_explicit_selection() {
        let registry = registry(vec![stub("Off", -1, &[]), stub("On", 0, &[])]);
        assert_eq!(ProcessorChain::enabled(&registry).unwrap().names(), vec!["On"]);
        let chain = ProcessorChain::plan(&registry, &["Off", "On"]).unwrap();
        assert_eq!(chain.names(), vec!["Off", "On"]);
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let registry = registry(vec![stub("A", 0, &["B"]), stub("B", 0, &["A"])]);
        let err = ProcessorChain::enabled(&registry).err().unwrap();
        assert_eq!(
            err,
            ChainError::Cycle {
                path: vec!["A".into(), "B".into(), "A".into()]
            }
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = registry(vec![stub("A", 0, &["Ghost"])]);
        assert_eq!(
            ProcessorChain::plan(&registry, &["Nope"]).err().unwrap(),
            ChainError::UnknownProcessor {
                name: "Nope".into()
            }
        );
        assert_eq!(
            ProcessorChain::plan(&registry, &["A"]).err().unwrap(),
            ChainError::UnknownDependency {
                name: "Ghost".into(),
                required_by: "A".into()
            }
        );
    }

    #[test]
    fn default_chain_orders_builtins() {
        let chain = ProcessorChain::default_chain().unwrap();
        let names = chain.names();
        assert!(!names.contains(&"Identity"));
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position("DateTime") < position("LocalDateTime"));
        assert!(position("OptionsStruct") < position("ItemStruct"));
        assert!(position("DateTime") < position("ActivityStruct"));
        assert!(position("DropLegacyUserId") < position("ColumnCast"));
        assert_eq!(names.len(), 12);
    }
}
