//! The rule-matching engine.
//!
//! Rules are `(spec, action)` pairs kept in registration order. For each
//! node the engine remembers which rules have already been scheduled
//! against it, so every rule runs at most once per node. Work is driven by
//! events:
//!
//! - a node is registered, or gains a component, projection or state:
//!   every rule not yet scheduled for that node is evaluated against it;
//! - a rule is registered: it is evaluated against every existing node in
//!   registration order.
//!
//! Each match is appended to a FIFO queue of obligations and marked as
//! scheduled. The outermost registry call then drains the queue; calls made
//! from inside a running action only enqueue, so at most one action runs at
//! a time and work discovered during a pass runs after everything already
//! queued.
//!
//! Advancing a node advances its parent first. When a rule is running
//! against that parent, the parent's advance is deferred until the rule
//! returns and then runs before the next queued obligation.
//!
//! If an action fails the pass is aborted: the queue is cleared, the error
//! propagates to the outermost caller, and the dropped obligations stay
//! marked as scheduled so they are never retried.

use crate::action::ModelAction;
use crate::node::ModelNode;
use crate::registry::ModelRegistry;
use crate::spec::ModelSpec;
use arbor_model::state::ModelState;
use arbor_model::{ModelError, NodeId, Result};
use core::fmt;
use hashbrown::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Identifies a rule; ids follow registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(usize);

impl RuleId {
    /// Returns the registration index of the rule.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule_{}", self.0)
    }
}

/// A registered rule.
#[derive(Debug)]
pub struct Rule {
    id: RuleId,
    spec: ModelSpec,
    action: ModelAction,
}

impl Rule {
    /// Returns the rule's id.
    #[must_use]
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Returns the spec selecting the nodes the rule applies to.
    #[must_use]
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Returns the action run against each matching node.
    #[must_use]
    pub fn action(&self) -> &ModelAction {
        &self.action
    }
}

/// A rule that still has to run against a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Obligation {
    pub(crate) rule: RuleId,
    pub(crate) node: NodeId,
}

/// Rule storage plus the bookkeeping of which rules ran where.
#[derive(Debug, Default)]
pub(crate) struct Configurer {
    rules: Vec<Arc<Rule>>,
    scheduled: Vec<HashSet<RuleId>>,
    queue: VecDeque<Obligation>,
    draining: bool,
    executing: Option<Obligation>,
    deferred: Vec<(NodeId, ModelState)>,
}

impl Configurer {
    pub(crate) fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Stores a rule, adding a `has` requirement for each declared input.
    pub(crate) fn add_rule(&mut self, spec: ModelSpec, action: ModelAction) -> RuleId {
        let spec = action
            .inputs()
            .iter()
            .fold(spec, |spec, input| spec.and(ModelSpec::Has(*input)));
        let id = RuleId(self.rules.len());
        self.rules.push(Arc::new(Rule { id, spec, action }));
        id
    }

    /// Starts tracking a freshly registered node.
    pub(crate) fn track_node(&mut self, node: NodeId) {
        debug_assert_eq!(node.index(), self.scheduled.len());
        self.scheduled.push(HashSet::new());
    }

    /// Enqueues every unscheduled rule matching `node`, in rule order.
    pub(crate) fn schedule_node(&mut self, node: &ModelNode) {
        let Some(scheduled) = self.scheduled.get_mut(node.id().index()) else {
            return;
        };
        for rule in &self.rules {
            if !scheduled.contains(&rule.id) && rule.spec.is_satisfied_by(node) {
                scheduled.insert(rule.id);
                trace!(rule = %rule.action.name(), node = %node, "rule scheduled");
                self.queue.push_back(Obligation {
                    rule: rule.id,
                    node: node.id(),
                });
            }
        }
    }

    /// Enqueues `rule` against every matching node, in node order.
    pub(crate) fn schedule_rule(&mut self, rule: RuleId, nodes: &[ModelNode]) {
        let Some(rule) = self.rules.get(rule.index()) else {
            return;
        };
        for node in nodes {
            let scheduled = &mut self.scheduled[node.id().index()];
            if !scheduled.contains(&rule.id) && rule.spec.is_satisfied_by(node) {
                scheduled.insert(rule.id);
                trace!(rule = %rule.action.name(), node = %node, "rule scheduled");
                self.queue.push_back(Obligation {
                    rule: rule.id,
                    node: node.id(),
                });
            }
        }
    }

    /// Returns `true` once `rule` has been scheduled against `node`, whether
    /// or not it has run yet.
    pub(crate) fn is_scheduled(&self, rule: RuleId, node: NodeId) -> bool {
        self.scheduled
            .get(node.index())
            .is_some_and(|scheduled| scheduled.contains(&rule))
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Records a state advance to apply once the running rule returns.
    pub(crate) fn defer_transition(&mut self, node: NodeId, target: ModelState) {
        self.deferred.push((node, target));
    }

    pub(crate) fn executing(&self) -> Option<(NodeId, &Rule)> {
        let obligation = self.executing?;
        let rule = self.rules.get(obligation.rule.index())?;
        Some((obligation.node, rule))
    }
}

impl ModelRegistry {
    /// Runs queued obligations until the queue is empty.
    ///
    /// Only the outermost call drains; nested calls return immediately and
    /// leave their obligations to the running pass.
    pub(crate) fn drain(&mut self) -> Result<()> {
        if self.configurer.draining {
            return Ok(());
        }
        self.configurer.draining = true;
        let result = self.run_pass();
        self.configurer.draining = false;
        self.configurer.executing = None;
        if result.is_err() {
            let dropped = self.configurer.queue.len();
            self.configurer.queue.clear();
            self.configurer.deferred.clear();
            if dropped > 0 {
                debug!(dropped, "dropped queued rules after a failed pass");
            }
        }
        result
    }

    fn run_pass(&mut self) -> Result<()> {
        let limit = self.config.get_max_pass_len();
        let mut fired = 0usize;
        while let Some(obligation) = self.configurer.queue.pop_front() {
            if let Some(limit) = limit
                && fired >= limit
            {
                return Err(ModelError::illegal_state(
                    self.display(obligation.node),
                    format!("a single pass exceeded {limit} rule executions"),
                ));
            }
            fired += 1;

            let rule = Arc::clone(&self.configurer.rules[obligation.rule.index()]);
            debug!(
                rule = %rule.action.name(),
                node = %self.display(obligation.node),
                "executing rule"
            );
            self.configurer.executing = Some(obligation);
            let outcome = rule.action.execute(self, obligation.node);
            self.configurer.executing = None;

            if let Err(err) = outcome {
                warn!(
                    rule = %rule.action.name(),
                    node = %self.display(obligation.node),
                    error = %err,
                    "rule failed, aborting pass"
                );
                return Err(err);
            }
            for (node, target) in core::mem::take(&mut self.configurer.deferred) {
                self.transition(node, target)?;
            }
        }
        Ok(())
    }
}
