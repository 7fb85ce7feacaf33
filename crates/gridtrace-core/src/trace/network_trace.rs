use std::rc::Rc;

use super::operators::NetworkStateOperators;
use super::step::{NetworkTraceStep, Path};
use crate::error::{Result, TraceError};
use crate::network::Network;
use crate::traversal::{
    BasicTraversal, BranchRecursiveTraversal, Hooks, KeyTracker, QueueType, Successors, Tracker,
    Traversal,
};

/// Computes the value carried by the step along `next_path`
pub type ComputeData<D> = Rc<dyn Fn(&NetworkTraceStep<D>, &Path, &Network) -> D>;

/// What a network trace counts as already visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visitation {
    /// Each terminal once per phase set
    Terminal,
    /// Each terminal once per phase set and side it was reached from
    TerminalPerSide,
    /// Each equipment entered once, however many of its terminals are
    /// reached. Terminals without equipment are never visited.
    Equipment,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VisitKey {
    Terminal(String),
    Equipment(String),
}

fn tracker<D: 'static>(visitation: Visitation) -> Box<dyn Tracker<NetworkTraceStep<D>>> {
    match visitation {
        Visitation::Terminal => Box::new(KeyTracker::new(|step: &NetworkTraceStep<D>| {
            Some((step.path.to_terminal.clone(), step.path.phases))
        })),
        Visitation::TerminalPerSide => Box::new(KeyTracker::new(|step: &NetworkTraceStep<D>| {
            Some((
                step.path.to_terminal.clone(),
                step.path.phases,
                step.path.traced_externally,
            ))
        })),
        Visitation::Equipment => Box::new(KeyTracker::new(|step: &NetworkTraceStep<D>| {
            let path = &step.path;
            if path.enters_equipment() {
                path.to_equipment.clone().map(VisitKey::Equipment)
            } else {
                Some(VisitKey::Terminal(path.to_terminal.clone()))
            }
        })),
    }
}

enum Inner<D> {
    Basic(BasicTraversal<NetworkTraceStep<D>, Network>),
    Branching(BranchRecursiveTraversal<NetworkTraceStep<D>, Network>),
}

/// A traversal of [`NetworkTraceStep`]s through one state of the network.
///
/// Basic traces queue every next path. Branching traces queue a lone next
/// path and branch when a step has several, so values carried in the step
/// data stay with the branch that computed them.
pub struct NetworkTrace<D> {
    operators: &'static dyn NetworkStateOperators,
    inner: Inner<D>,
}

impl<D: 'static> NetworkTrace<D> {
    pub fn basic(
        operators: &'static dyn NetworkStateOperators,
        queue_type: QueueType<NetworkTraceStep<D>>,
        visitation: Visitation,
        compute_data: impl Fn(&NetworkTraceStep<D>, &Path, &Network) -> D + 'static,
    ) -> Self {
        let compute_data: ComputeData<D> = Rc::new(compute_data);
        let traversal = BasicTraversal::new(
            queue_type,
            tracker(visitation),
            move |step: &NetworkTraceStep<D>,
                  network: &Network,
                  next: &mut Successors<NetworkTraceStep<D>>| {
                for path in operators.next_paths(network, &step.path) {
                    let data = compute_data(step, &path, network);
                    next.queue(step.next(path, data));
                }
            },
        );
        Self {
            operators,
            inner: Inner::Basic(traversal),
        }
    }

    /// `branch_queue_type` orders pending branches by their first step.
    pub fn branching(
        operators: &'static dyn NetworkStateOperators,
        queue_type: QueueType<NetworkTraceStep<D>>,
        branch_queue_type: QueueType<NetworkTraceStep<D>>,
        visitation: Visitation,
        compute_data: impl Fn(&NetworkTraceStep<D>, &Path, &Network) -> D + 'static,
    ) -> Self {
        let compute_data: ComputeData<D> = Rc::new(compute_data);
        let traversal = BranchRecursiveTraversal::new(
            queue_type,
            branch_queue_type,
            tracker(visitation),
            move |step: &NetworkTraceStep<D>,
                  network: &Network,
                  next: &mut Successors<NetworkTraceStep<D>>| {
                let paths = operators.next_paths(network, &step.path);
                let branch = paths.len() > 1;
                for path in paths {
                    let data = compute_data(step, &path, network);
                    let item = step.next(path, data);
                    if branch {
                        next.branch(item);
                    } else {
                        next.queue(item);
                    }
                }
            },
        );
        Self {
            operators,
            inner: Inner::Branching(traversal),
        }
    }

    pub fn operators(&self) -> &'static dyn NetworkStateOperators {
        self.operators
    }

    /// Called with the first step of every branch. Basic traces never branch.
    pub fn on_branch_start(
        &mut self,
        callback: impl Fn(&NetworkTraceStep<D>, &mut Network) + 'static,
    ) -> &mut Self {
        if let Inner::Branching(traversal) = &mut self.inner {
            traversal.on_branch_start(callback);
        }
        self
    }

    /// Seed the trace at a terminal; the first step crosses its node.
    pub fn add_start_terminal(&mut self, network: &Network, terminal: &str, data: D) -> Result<()> {
        let path = start_path(network, terminal)?;
        self.add_start_item(NetworkTraceStep::start(path, data));
        Ok(())
    }

    /// Seed the trace at every terminal of an equipment
    pub fn add_start_equipment(&mut self, network: &Network, equipment: &str, data: D) -> Result<()>
    where
        D: Clone,
    {
        let eq = network
            .equipment(equipment)
            .ok_or_else(|| TraceError::not_found("equipment", equipment))?;
        for terminal in &eq.terminals {
            self.add_start_terminal(network, terminal, data.clone())?;
        }
        Ok(())
    }

    pub fn run_from_terminal(
        &mut self,
        network: &mut Network,
        terminal: &str,
        data: D,
        can_stop_on_start: bool,
    ) -> Result<()> {
        self.add_start_terminal(network, terminal, data)?;
        self.run_queued(can_stop_on_start, network)
    }
}

/// The start path of a terminal, carrying all of its phases
pub(crate) fn start_path(network: &Network, terminal: &str) -> Result<Path> {
    let t = network
        .terminal(terminal)
        .ok_or_else(|| TraceError::not_found("terminal", terminal))?;
    Ok(Path::start(&t.mrid, t.equipment.as_deref(), t.phases))
}

impl<D: 'static> Traversal<NetworkTraceStep<D>, Network> for NetworkTrace<D> {
    fn hooks_mut(&mut self) -> &mut Hooks<NetworkTraceStep<D>, Network> {
        match &mut self.inner {
            Inner::Basic(traversal) => traversal.hooks_mut(),
            Inner::Branching(traversal) => traversal.hooks_mut(),
        }
    }

    fn add_start_item(&mut self, item: NetworkTraceStep<D>) {
        match &mut self.inner {
            Inner::Basic(traversal) => traversal.add_start_item(item),
            Inner::Branching(traversal) => traversal.add_start_item(item),
        }
    }

    fn run_queued(&mut self, can_stop_on_start: bool, network: &mut Network) -> Result<()> {
        tracing::trace!(state = %self.operators.state(), "running network trace");
        match &mut self.inner {
            Inner::Basic(traversal) => traversal.run_queued(can_stop_on_start, network),
            Inner::Branching(traversal) => traversal.run_queued(can_stop_on_start, network),
        }
    }

    fn reset(&mut self) {
        match &mut self.inner {
            Inner::Basic(traversal) => traversal.reset(),
            Inner::Branching(traversal) => traversal.reset(),
        }
    }

    fn has_visited(&self, item: &NetworkTraceStep<D>) -> bool {
        match &self.inner {
            Inner::Basic(traversal) => traversal.has_visited(item),
            Inner::Branching(traversal) => traversal.has_visited(item),
        }
    }
}
