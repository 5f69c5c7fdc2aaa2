//! The fixed, ordered set of generators invoked for every run.

use std::sync::Arc;

use super::{ErrorsReport, OverviewReport, ReportGenerator};

/// Registry of report generators
///
/// Read-only after construction and shared by every finalize job.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn ReportGenerator>>,
}

impl GeneratorRegistry {
    /// Create a registry from an explicit generator list, preserving its order
    pub fn new(generators: Vec<Arc<dyn ReportGenerator>>) -> Self {
        Self { generators }
    }

    /// Registry holding the built-in generators
    pub fn with_builtin() -> Self {
        Self::new(vec![Arc::new(ErrorsReport), Arc::new(OverviewReport)])
    }

    /// Every registered generator, in registration order
    pub fn list_generators(&self) -> &[Arc<dyn ReportGenerator>] {
        &self.generators
    }

    /// Names of the registered generators, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Number of registered generators
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether no generator is registered
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}
