//! Generic traversal engine
//!
//! A traversal pops items from a [`TraversalQueue`], skips items its
//! [`Tracker`] has already seen, evaluates every stop condition, runs every
//! step action, and (unless stopping) asks a successor callback for the next
//! items. Successors must pass every queue condition to be queued.
//!
//! Two flavours exist:
//! - [`BasicTraversal`]: one queue, one tracker.
//! - [`BranchRecursiveTraversal`]: successors may be *branched*, spawning a
//!   child run with its own queue and tracker that still honours everything
//!   its ancestors visited.
//!
//! Callbacks receive a mutable context `C` (the network, for network traces)
//! but never the traversal itself, so a traversal cannot be re-entered while
//! it runs.

pub mod basic;
pub mod branch;
pub mod queue;
pub mod tracker;

use std::rc::Rc;

use crate::error::Result;

pub use basic::BasicTraversal;
pub use branch::BranchRecursiveTraversal;
pub use queue::{QueueType, TraversalQueue, WeightedQueue};
pub use tracker::{BasicTracker, KeyTracker, Tracker, TrackerChain};

/// Returns true when the traversal should not continue past the item
pub type StopCondition<T, C> = Rc<dyn Fn(&T, &C) -> bool>;

/// Returns true when `next` may be queued after `current`
pub type QueueCondition<T, C> = Rc<dyn Fn(&T, &T, &C) -> bool>;

/// Invoked for every visited item with its `is_stopping` flag
pub type StepAction<T, C> = Rc<dyn Fn(&T, &mut C, bool)>;

/// Produces the successors of an item
pub type QueueNext<T, C> = Rc<dyn Fn(&T, &C, &mut Successors<T>)>;

/// Invoked with the start item before a branch runs
pub type BranchStart<T, C> = Rc<dyn Fn(&T, &mut C)>;

/// Successors requested by a [`QueueNext`] callback.
///
/// Basic traversals treat branch requests as ordinary queueing.
pub struct Successors<T> {
    queued: Vec<T>,
    branched: Vec<T>,
}

impl<T> Default for Successors<T> {
    fn default() -> Self {
        Self {
            queued: Vec::new(),
            branched: Vec::new(),
        }
    }
}

impl<T> Successors<T> {
    /// Continue with the item on the current queue
    pub fn queue(&mut self, item: T) {
        self.queued.push(item);
    }

    /// Explore the item in a separate branch
    pub fn branch(&mut self, item: T) {
        self.branched.push(item);
    }
}

/// Stop conditions, queue conditions and step actions of a traversal
pub struct Hooks<T, C> {
    stop_conditions: Vec<StopCondition<T, C>>,
    queue_conditions: Vec<QueueCondition<T, C>>,
    step_actions: Vec<StepAction<T, C>>,
}

impl<T, C> Default for Hooks<T, C> {
    fn default() -> Self {
        Self {
            stop_conditions: Vec::new(),
            queue_conditions: Vec::new(),
            step_actions: Vec::new(),
        }
    }
}

impl<T, C> Clone for Hooks<T, C> {
    fn clone(&self) -> Self {
        Self {
            stop_conditions: self.stop_conditions.clone(),
            queue_conditions: self.queue_conditions.clone(),
            step_actions: self.step_actions.clone(),
        }
    }
}

impl<T, C> Hooks<T, C> {
    /// Evaluates every stop condition, even after one has matched.
    fn matches_any_stop_condition(&self, item: &T, ctx: &C) -> bool {
        let mut matched = false;
        for condition in &self.stop_conditions {
            matched |= condition(item, ctx);
        }
        matched
    }

    fn can_queue(&self, next: &T, current: &T, ctx: &C) -> bool {
        self.queue_conditions
            .iter()
            .all(|condition| condition(next, current, ctx))
    }

    fn apply_step_actions(&self, item: &T, ctx: &mut C, is_stopping: bool) {
        for action in &self.step_actions {
            action(item, &mut *ctx, is_stopping);
        }
    }
}

/// Common interface of [`BasicTraversal`] and [`BranchRecursiveTraversal`]
pub trait Traversal<T: 'static, C: 'static> {
    fn hooks_mut(&mut self) -> &mut Hooks<T, C>;

    /// Queue a seed item for the next run
    fn add_start_item(&mut self, item: T);

    /// Run over every queued seed.
    ///
    /// The first item processed may only stop the traversal when
    /// `can_stop_on_start` is true. Fails with
    /// [`crate::error::TraceError::TraversalAlreadyRun`] unless the traversal
    /// is fresh or has been reset.
    fn run_queued(&mut self, can_stop_on_start: bool, ctx: &mut C) -> Result<()>;

    /// Clear queues and trackers so the traversal can run again
    fn reset(&mut self);

    fn has_visited(&self, item: &T) -> bool;

    fn run(&mut self, start: T, can_stop_on_start: bool, ctx: &mut C) -> Result<()> {
        self.add_start_item(start);
        self.run_queued(can_stop_on_start, ctx)
    }

    fn add_stop_condition(&mut self, condition: impl Fn(&T, &C) -> bool + 'static) -> &mut Self
    where
        Self: Sized,
    {
        self.hooks_mut().stop_conditions.push(Rc::new(condition));
        self
    }

    fn add_queue_condition(&mut self, condition: impl Fn(&T, &T, &C) -> bool + 'static) -> &mut Self
    where
        Self: Sized,
    {
        self.hooks_mut().queue_conditions.push(Rc::new(condition));
        self
    }

    fn add_step_action(&mut self, action: impl Fn(&T, &mut C, bool) + 'static) -> &mut Self
    where
        Self: Sized,
    {
        self.hooks_mut().step_actions.push(Rc::new(action));
        self
    }
}

/// Processes a queue until it is empty.
///
/// Branch requests are pushed into `branches` when given, otherwise they are
/// queued like any other successor. Returns the number of items processed.
fn drain_queue<T, C>(
    queue: &mut TraversalQueue<T>,
    mut visit: impl FnMut(&T) -> bool,
    hooks: &Hooks<T, C>,
    queue_next: &QueueNext<T, C>,
    can_stop_on_start: bool,
    ctx: &mut C,
    mut branches: Option<&mut Vec<T>>,
) -> usize {
    let mut can_stop = can_stop_on_start;
    let mut processed = 0;
    let mut successors = Successors::default();

    while let Some(current) = queue.next() {
        if !visit(&current) {
            continue;
        }
        processed += 1;

        let is_stopping = hooks.matches_any_stop_condition(&current, ctx) && can_stop;
        can_stop = true;
        hooks.apply_step_actions(&current, ctx, is_stopping);
        if is_stopping {
            continue;
        }

        queue_next(&current, ctx, &mut successors);

        for next in successors.queued.drain(..) {
            if hooks.can_queue(&next, &current, ctx) {
                queue.add(next);
            }
        }
        for next in successors.branched.drain(..) {
            if hooks.can_queue(&next, &current, ctx) {
                match branches.as_deref_mut() {
                    Some(pending) => pending.push(next),
                    None => {
                        queue.add(next);
                    }
                }
            }
        }
    }

    processed
}
