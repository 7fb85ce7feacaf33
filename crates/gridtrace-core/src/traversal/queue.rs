//! Frontier ordering strategies

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Weight function for [`QueueType::Weighted`]; higher weights come out first.
pub type Weight<T> = Rc<dyn Fn(&T) -> i32>;

/// How a traversal orders its frontier
pub enum QueueType<T> {
    BreadthFirst,
    DepthFirst,
    Weighted(Weight<T>),
}

impl<T> Clone for QueueType<T> {
    fn clone(&self) -> Self {
        match self {
            QueueType::BreadthFirst => QueueType::BreadthFirst,
            QueueType::DepthFirst => QueueType::DepthFirst,
            QueueType::Weighted(weight) => QueueType::Weighted(Rc::clone(weight)),
        }
    }
}

impl<T> fmt::Debug for QueueType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueType::BreadthFirst => f.write_str("BreadthFirst"),
            QueueType::DepthFirst => f.write_str("DepthFirst"),
            QueueType::Weighted(_) => f.write_str("Weighted"),
        }
    }
}

impl<T: 'static> QueueType<T> {
    pub fn weighted(weight: impl Fn(&T) -> i32 + 'static) -> Self {
        QueueType::Weighted(Rc::new(weight))
    }

    /// The same strategy for a queue of values that each carry a `T`.
    pub fn project<U: 'static>(&self, project: fn(&U) -> &T) -> QueueType<U> {
        match self {
            QueueType::BreadthFirst => QueueType::BreadthFirst,
            QueueType::DepthFirst => QueueType::DepthFirst,
            QueueType::Weighted(weight) => {
                let weight = Rc::clone(weight);
                QueueType::Weighted(Rc::new(move |item: &U| weight(project(item))))
            }
        }
    }
}

/// Buckets items by weight and pops FIFO from the heaviest non-empty bucket.
pub struct WeightedQueue<T> {
    weight: Weight<T>,
    buckets: BTreeMap<i32, VecDeque<T>>,
    len: usize,
}

impl<T> WeightedQueue<T> {
    pub fn new(weight: Weight<T>) -> Self {
        Self {
            weight,
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// Queues the item; a negative weight is rejected and returns false.
    pub fn add(&mut self, item: T) -> bool {
        let weight = (self.weight)(&item);
        if weight < 0 {
            tracing::debug!(weight, "rejected item with negative weight");
            return false;
        }
        self.buckets.entry(weight).or_default().push_back(item);
        self.len += 1;
        true
    }

    pub fn next(&mut self) -> Option<T> {
        let mut bucket = self.buckets.last_entry()?;
        let item = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        if item.is_some() {
            self.len -= 1;
        }
        item
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}

enum Inner<T> {
    BreadthFirst(VecDeque<T>),
    DepthFirst(Vec<T>),
    Weighted(WeightedQueue<T>),
}

/// The pending items of one traversal
pub struct TraversalQueue<T> {
    inner: Inner<T>,
}

impl<T> TraversalQueue<T> {
    pub fn new(queue_type: &QueueType<T>) -> Self {
        let inner = match queue_type {
            QueueType::BreadthFirst => Inner::BreadthFirst(VecDeque::new()),
            QueueType::DepthFirst => Inner::DepthFirst(Vec::new()),
            QueueType::Weighted(weight) => Inner::Weighted(WeightedQueue::new(Rc::clone(weight))),
        };
        Self { inner }
    }

    pub fn add(&mut self, item: T) -> bool {
        match &mut self.inner {
            Inner::BreadthFirst(queue) => {
                queue.push_back(item);
                true
            }
            Inner::DepthFirst(stack) => {
                stack.push(item);
                true
            }
            Inner::Weighted(queue) => queue.add(item),
        }
    }

    pub fn next(&mut self) -> Option<T> {
        match &mut self.inner {
            Inner::BreadthFirst(queue) => queue.pop_front(),
            Inner::DepthFirst(stack) => stack.pop(),
            Inner::Weighted(queue) => queue.next(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::BreadthFirst(queue) => queue.len(),
            Inner::DepthFirst(stack) => stack.len(),
            Inner::Weighted(queue) => queue.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            Inner::BreadthFirst(queue) => queue.clear(),
            Inner::DepthFirst(stack) => stack.clear(),
            Inner::Weighted(queue) => queue.clear(),
        }
    }
}
