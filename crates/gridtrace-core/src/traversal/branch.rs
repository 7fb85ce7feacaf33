use std::rc::Rc;

use super::{
    drain_queue, BranchStart, Hooks, QueueNext, QueueType, Successors, Tracker, TrackerChain,
    Traversal, TraversalQueue,
};
use crate::error::{Result, TraceError};

/// A pending branch: where it starts and the tracker chain it extends.
struct Branch<T> {
    start: T,
    tracker: Rc<TrackerChain<T>>,
}

fn branch_start<T>(branch: &Branch<T>) -> &T {
    &branch.start
}

/// A traversal whose successors may be explored in separate branches.
///
/// Each branch gets a fresh queue and a fresh local tracker chained to the
/// trackers of all its ancestors, so anything an ancestor visited is never
/// re-explored while sibling branches are explored independently of each
/// other. Branches inherit the stop conditions, queue conditions, step actions
/// and callbacks of the traversal.
///
/// Branches run once the main queue is empty, in branch-queue order. A branch
/// runs to completion (including its own branches) before the next sibling
/// starts. Pending branch queues live on an explicit stack, so deep branching
/// does not grow the call stack.
pub struct BranchRecursiveTraversal<T, C> {
    queue_type: QueueType<T>,
    branch_queue_type: QueueType<Branch<T>>,
    queue: TraversalQueue<T>,
    branch_queue: TraversalQueue<Branch<T>>,
    tracker: Rc<TrackerChain<T>>,
    queue_next: QueueNext<T, C>,
    on_branch_start: Option<BranchStart<T, C>>,
    hooks: Hooks<T, C>,
    has_run: bool,
}

impl<T: 'static, C: 'static> BranchRecursiveTraversal<T, C> {
    /// `branch_queue_type` orders pending branches by their start item.
    pub fn new(
        queue_type: QueueType<T>,
        branch_queue_type: QueueType<T>,
        tracker: Box<dyn Tracker<T>>,
        queue_next: impl Fn(&T, &C, &mut Successors<T>) + 'static,
    ) -> Self {
        let branch_queue_type = branch_queue_type.project(branch_start::<T>);
        Self {
            queue: TraversalQueue::new(&queue_type),
            branch_queue: TraversalQueue::new(&branch_queue_type),
            queue_type,
            branch_queue_type,
            tracker: TrackerChain::root(tracker),
            queue_next: Rc::new(queue_next),
            on_branch_start: None,
            hooks: Hooks::default(),
            has_run: false,
        }
    }

    pub fn on_branch_start(&mut self, callback: impl Fn(&T, &mut C) + 'static) -> &mut Self {
        self.on_branch_start = Some(Rc::new(callback));
        self
    }

    fn queue_branches(
        &self,
        queue: &mut TraversalQueue<Branch<T>>,
        parent: &Rc<TrackerChain<T>>,
        starts: Vec<T>,
    ) {
        for start in starts {
            queue.add(Branch {
                start,
                tracker: parent.child(),
            });
        }
    }
}

impl<T: 'static, C: 'static> Traversal<T, C> for BranchRecursiveTraversal<T, C> {
    fn hooks_mut(&mut self) -> &mut Hooks<T, C> {
        &mut self.hooks
    }

    fn add_start_item(&mut self, item: T) {
        self.queue.add(item);
    }

    fn run_queued(&mut self, can_stop_on_start: bool, ctx: &mut C) -> Result<()> {
        if self.has_run {
            return Err(TraceError::TraversalAlreadyRun);
        }
        self.has_run = true;

        let mut spawned = Vec::new();
        let tracker = Rc::clone(&self.tracker);
        let mut processed = drain_queue(
            &mut self.queue,
            |item| tracker.visit(item),
            &self.hooks,
            &self.queue_next,
            can_stop_on_start,
            ctx,
            Some(&mut spawned),
        );

        let mut root_branches = std::mem::replace(
            &mut self.branch_queue,
            TraversalQueue::new(&self.branch_queue_type),
        );
        self.queue_branches(&mut root_branches, &tracker, spawned);

        let mut branches_run = 0;
        let mut max_depth = 0;
        let mut pending = vec![root_branches];
        while let Some(branch_queue) = pending.last_mut() {
            let Some(Branch { start, tracker }) = branch_queue.next() else {
                pending.pop();
                continue;
            };

            if let Some(callback) = &self.on_branch_start {
                callback(&start, &mut *ctx);
            }

            let mut queue = TraversalQueue::new(&self.queue_type);
            queue.add(start);
            let mut spawned = Vec::new();
            processed += drain_queue(
                &mut queue,
                |item| tracker.visit(item),
                &self.hooks,
                &self.queue_next,
                true,
                ctx,
                Some(&mut spawned),
            );
            branches_run += 1;

            if !spawned.is_empty() {
                let mut children = TraversalQueue::new(&self.branch_queue_type);
                self.queue_branches(&mut children, &tracker, spawned);
                pending.push(children);
                max_depth = max_depth.max(pending.len());
            }
        }

        tracing::trace!(
            processed,
            branches_run,
            max_depth,
            "branch recursive traversal complete"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.branch_queue.clear();
        self.tracker.clear();
        self.has_run = false;
    }

    fn has_visited(&self, item: &T) -> bool {
        self.tracker.has_visited(item)
    }
}
