//! Per-ticker call plan.
//!
//! The plan lists every backend service once, together with the services
//! that must settle before it may start. Validation guarantees the plan is
//! complete, acyclic, and orders every service after the services whose
//! payload its request is built from.

use scan_core::error::PlanError;
use scan_core::types::ServiceKind;
use std::collections::HashSet;

/// One node of the call plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStep {
    pub service: ServiceKind,
    pub depends_on: Vec<ServiceKind>,
}

impl CallStep {
    pub fn new(service: ServiceKind, depends_on: &[ServiceKind]) -> Self {
        Self {
            service,
            depends_on: depends_on.to_vec(),
        }
    }

    /// Whether every dependency is in `settled`.
    pub fn is_ready(&self, settled: &HashSet<ServiceKind>) -> bool {
        self.depends_on.iter().all(|d| settled.contains(d))
    }
}

/// Validated dependency list for one ticker's service calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPlan {
    steps: Vec<CallStep>,
}

impl Default for CallPlan {
    /// Market data and technical analysis run concurrently; options analysis
    /// waits for both.
    fn default() -> Self {
        Self {
            steps: ServiceKind::ALL
                .iter()
                .map(|kind| CallStep::new(*kind, kind.data_dependencies()))
                .collect(),
        }
    }
}

impl CallPlan {
    /// Validate and build a plan.
    pub fn new(steps: Vec<CallStep>) -> Result<Self, PlanError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.service) {
                return Err(PlanError::DuplicateStep(step.service));
            }
            if step.depends_on.contains(&step.service) {
                return Err(PlanError::SelfDependency { step: step.service });
            }
            for required in step.service.data_dependencies() {
                if !step.depends_on.contains(required) {
                    return Err(PlanError::MissingDataDependency {
                        step: step.service,
                        dependency: *required,
                    });
                }
            }
        }
        if let Some(missing) = ServiceKind::ALL.iter().find(|k| !seen.contains(*k)) {
            return Err(PlanError::MissingStep(*missing));
        }

        let plan = Self { steps };
        plan.check_acyclic()?;
        Ok(plan)
    }

    pub fn steps(&self) -> &[CallStep] {
        &self.steps
    }

    /// Execution order in which every step follows its dependencies.
    pub fn topological_order(&self) -> Vec<ServiceKind> {
        let mut settled = HashSet::new();
        let mut order = Vec::with_capacity(self.steps.len());
        while order.len() < self.steps.len() {
            let ready: Vec<ServiceKind> = self
                .steps
                .iter()
                .filter(|s| !settled.contains(&s.service) && s.is_ready(&settled))
                .map(|s| s.service)
                .collect();
            if ready.is_empty() {
                break;
            }
            settled.extend(ready.iter().copied());
            order.extend(ready);
        }
        order
    }

    fn check_acyclic(&self) -> Result<(), PlanError> {
        let order = self.topological_order();
        if order.len() == self.steps.len() {
            return Ok(());
        }
        let stuck = self
            .steps
            .iter()
            .map(|s| s.service)
            .filter(|k| !order.contains(k))
            .collect();
        Err(PlanError::Cycle(stuck))
    }
}
