use std::rc::Rc;

use super::{
    drain_queue, Hooks, QueueNext, QueueType, Successors, Tracker, Traversal, TraversalQueue,
};
use crate::error::{Result, TraceError};

/// A single-queue traversal
pub struct BasicTraversal<T, C> {
    queue: TraversalQueue<T>,
    tracker: Box<dyn Tracker<T>>,
    queue_next: QueueNext<T, C>,
    hooks: Hooks<T, C>,
    has_run: bool,
}

impl<T: 'static, C: 'static> BasicTraversal<T, C> {
    pub fn new(
        queue_type: QueueType<T>,
        tracker: Box<dyn Tracker<T>>,
        queue_next: impl Fn(&T, &C, &mut Successors<T>) + 'static,
    ) -> Self {
        Self {
            queue: TraversalQueue::new(&queue_type),
            tracker,
            queue_next: Rc::new(queue_next),
            hooks: Hooks::default(),
            has_run: false,
        }
    }
}

impl<T: 'static, C: 'static> Traversal<T, C> for BasicTraversal<T, C> {
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

        let tracker = &mut self.tracker;
        let processed = drain_queue(
            &mut self.queue,
            |item| tracker.visit(item),
            &self.hooks,
            &self.queue_next,
            can_stop_on_start,
            ctx,
            None,
        );

        tracing::trace!(processed, "basic traversal complete");
        Ok(())
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.tracker.clear();
        self.has_run = false;
    }

    fn has_visited(&self, item: &T) -> bool {
        self.tracker.has_visited(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::BasicTracker;
    use std::collections::BTreeMap;

    /// Adjacency list context; visited items are recorded in the context.
    #[derive(Default)]
    struct Graph {
        edges: BTreeMap<u32, Vec<u32>>,
        visited: Vec<u32>,
    }

    impl Graph {
        fn new(edges: &[(u32, u32)]) -> Self {
            let mut graph = Graph::default();
            for (from, to) in edges {
                graph.edges.entry(*from).or_default().push(*to);
            }
            graph
        }
    }

    fn traversal(queue_type: QueueType<u32>) -> BasicTraversal<u32, Graph> {
        let mut traversal = BasicTraversal::new(
            queue_type,
            Box::new(BasicTracker::<u32>::default()),
            |item: &u32, graph: &Graph, next: &mut Successors<u32>| {
                for to in graph.edges.get(item).into_iter().flatten() {
                    next.queue(*to);
                }
            },
        );
        traversal.add_step_action(|item, graph: &mut Graph, _| graph.visited.push(*item));
        traversal
    }

    fn tree() -> Graph {
        // 1 -> 2 -> 4
        //   -> 3 -> 5
        Graph::new(&[(1, 2), (1, 3), (2, 4), (3, 5)])
    }

    #[test]
    fn test_breadth_first_order() {
        let mut graph = tree();
        traversal(QueueType::BreadthFirst)
            .run(1, true, &mut graph)
            .unwrap();
        assert_eq!(graph.visited, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_depth_first_order() {
        let mut graph = tree();
        traversal(QueueType::DepthFirst)
            .run(1, true, &mut graph)
            .unwrap();
        assert_eq!(graph.visited, vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn test_weighted_order() {
        let mut graph = tree();
        traversal(QueueType::weighted(|item: &u32| *item as i32))
            .run(1, true, &mut graph)
            .unwrap();
        assert_eq!(graph.visited, vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn test_cycle_visits_each_item_once() {
        let mut graph = Graph::new(&[(1, 2), (2, 3), (3, 1)]);
        traversal(QueueType::BreadthFirst)
            .run(1, true, &mut graph)
            .unwrap();
        assert_eq!(graph.visited, vec![1, 2, 3]);
    }

    #[test]
    fn test_stop_condition_prevents_expansion_but_not_actions() {
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.add_stop_condition(|item, _| *item == 2);
        t.add_step_action(|item, graph: &mut Graph, is_stopping| {
            if is_stopping {
                graph.visited.push(100 + *item);
            }
        });
        t.run(1, true, &mut graph).unwrap();
        assert_eq!(graph.visited, vec![1, 2, 102, 3, 5]);
    }

    #[test]
    fn test_every_stop_condition_sees_every_item() {
        use std::cell::RefCell;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.add_stop_condition(|_, _| true);
        let record = Rc::clone(&seen);
        t.add_stop_condition(move |item, _| {
            record.borrow_mut().push(*item);
            false
        });
        t.run(1, false, &mut graph).unwrap();

        // The start item cannot stop, its children both stop.
        assert_eq!(graph.visited, vec![1, 2, 3]);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_can_stop_on_start_item() {
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.add_stop_condition(|item, _| *item == 1);
        t.run(1, true, &mut graph).unwrap();
        assert_eq!(graph.visited, vec![1]);
    }

    #[test]
    fn test_queue_condition_filters_successors() {
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.add_queue_condition(|next, _current, _| *next != 3);
        t.run(1, true, &mut graph).unwrap();
        assert_eq!(graph.visited, vec![1, 2, 4]);
    }

    #[test]
    fn test_multiple_start_items() {
        let mut graph = Graph::new(&[(1, 2), (10, 11)]);
        let mut t = traversal(QueueType::BreadthFirst);
        t.add_start_item(1);
        t.add_start_item(10);
        t.run_queued(true, &mut graph).unwrap();
        assert_eq!(graph.visited, vec![1, 10, 2, 11]);
    }

    #[test]
    fn test_run_twice_without_reset_fails() {
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.run(1, true, &mut graph).unwrap();
        let err = t.run(1, true, &mut graph).unwrap_err();
        assert!(matches!(err, TraceError::TraversalAlreadyRun));
    }

    #[test]
    fn test_reset_allows_reuse() {
        let mut graph = tree();
        let mut t = traversal(QueueType::BreadthFirst);
        t.run(1, true, &mut graph).unwrap();
        assert!(t.has_visited(&4));

        t.reset();
        assert!(!t.has_visited(&4));
        graph.visited.clear();
        t.run(3, true, &mut graph).unwrap();
        assert_eq!(graph.visited, vec![3, 5]);
    }
}
