//! Visited-item tracking for traversals

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;

/// Records which items a traversal has already visited.
pub trait Tracker<T> {
    fn has_visited(&self, item: &T) -> bool;

    /// Marks the item visited, returning false if it already was.
    fn visit(&mut self, item: &T) -> bool;

    fn clear(&mut self);

    /// An empty tracker of the same kind.
    fn fresh(&self) -> Box<dyn Tracker<T>>;
}

/// Tracks items by their own identity
#[derive(Debug, Clone)]
pub struct BasicTracker<T> {
    visited: HashSet<T>,
}

impl<T> Default for BasicTracker<T> {
    fn default() -> Self {
        Self {
            visited: HashSet::new(),
        }
    }
}

impl<T: Hash + Eq + Clone + 'static> Tracker<T> for BasicTracker<T> {
    fn has_visited(&self, item: &T) -> bool {
        self.visited.contains(item)
    }

    fn visit(&mut self, item: &T) -> bool {
        if self.visited.contains(item) {
            return false;
        }
        self.visited.insert(item.clone())
    }

    fn clear(&mut self) {
        self.visited.clear();
    }

    fn fresh(&self) -> Box<dyn Tracker<T>> {
        Box::new(BasicTracker::<T>::default())
    }
}

/// Tracks items by a derived key.
///
/// Items whose key is `None` count as already visited, so they are never
/// processed.
pub struct KeyTracker<T, K> {
    key: Rc<dyn Fn(&T) -> Option<K>>,
    visited: HashSet<K>,
}

impl<T, K> KeyTracker<T, K> {
    pub fn new(key: impl Fn(&T) -> Option<K> + 'static) -> Self {
        Self {
            key: Rc::new(key),
            visited: HashSet::new(),
        }
    }
}

impl<T: 'static, K: Hash + Eq + 'static> Tracker<T> for KeyTracker<T, K> {
    fn has_visited(&self, item: &T) -> bool {
        match (self.key)(item) {
            Some(key) => self.visited.contains(&key),
            None => true,
        }
    }

    fn visit(&mut self, item: &T) -> bool {
        match (self.key)(item) {
            Some(key) => self.visited.insert(key),
            None => false,
        }
    }

    fn clear(&mut self) {
        self.visited.clear();
    }

    fn fresh(&self) -> Box<dyn Tracker<T>> {
        Box::new(KeyTracker {
            key: Rc::clone(&self.key),
            visited: HashSet::new(),
        })
    }
}

/// A tracker linked to the trackers of every ancestor branch.
///
/// Ancestors are shared by reference, so items they visit after a branch was
/// spawned are still seen by the branch.
pub struct TrackerChain<T> {
    parent: Option<Rc<TrackerChain<T>>>,
    local: RefCell<Box<dyn Tracker<T>>>,
}

impl<T> TrackerChain<T> {
    pub fn root(tracker: Box<dyn Tracker<T>>) -> Rc<Self> {
        Rc::new(Self {
            parent: None,
            local: RefCell::new(tracker),
        })
    }

    /// A child chain with an empty local tracker
    pub fn child(self: &Rc<Self>) -> Rc<Self> {
        let local = self.local.borrow().fresh();
        Rc::new(Self {
            parent: Some(Rc::clone(self)),
            local: RefCell::new(local),
        })
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut ancestor = self.parent.as_ref();
        while let Some(chain) = ancestor {
            depth += 1;
            ancestor = chain.parent.as_ref();
        }
        depth
    }

    fn visited_by_ancestor(&self, item: &T) -> bool {
        let mut ancestor = self.parent.as_ref();
        while let Some(chain) = ancestor {
            if chain.local.borrow().has_visited(item) {
                return true;
            }
            ancestor = chain.parent.as_ref();
        }
        false
    }

    pub fn has_visited(&self, item: &T) -> bool {
        self.visited_by_ancestor(item) || self.local.borrow().has_visited(item)
    }

    pub fn visit(&self, item: &T) -> bool {
        if self.visited_by_ancestor(item) {
            return false;
        }
        self.local.borrow_mut().visit(item)
    }

    /// Clears the local tracker only; ancestors are left untouched.
    pub fn clear(&self) {
        self.local.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tracker_visits_once() {
        let mut tracker = BasicTracker::<i32>::default();
        assert!(!tracker.has_visited(&1));
        assert!(tracker.visit(&1));
        assert!(!tracker.visit(&1));
        assert!(tracker.has_visited(&1));
        tracker.clear();
        assert!(!tracker.has_visited(&1));
    }

    #[test]
    fn test_key_tracker_uses_derived_key() {
        let mut tracker = KeyTracker::new(|item: &(u32, u32)| Some(item.0));
        assert!(tracker.visit(&(1, 10)));
        assert!(!tracker.visit(&(1, 20)));
        assert!(tracker.visit(&(2, 10)));
    }

    #[test]
    fn test_key_tracker_missing_key_is_visited() {
        let mut tracker = KeyTracker::new(|item: &Option<u32>| *item);
        assert!(tracker.has_visited(&None));
        assert!(!tracker.visit(&None));
    }

    #[test]
    fn test_chain_consults_ancestors() {
        let root = TrackerChain::root(Box::new(BasicTracker::<u32>::default()));
        assert!(root.visit(&1));

        let child = root.child();
        let sibling = root.child();
        assert_eq!(child.depth(), 1);
        assert!(child.has_visited(&1));
        assert!(!child.visit(&1));

        assert!(child.visit(&2));
        assert!(!child.visit(&2));
        assert!(sibling.visit(&2), "siblings keep independent trackers");

        // Visits made by the parent after spawning are still seen.
        assert!(root.visit(&3));
        assert!(!child.visit(&3));
    }

    #[test]
    fn test_chain_clear_is_local() {
        let root = TrackerChain::root(Box::new(BasicTracker::<u32>::default()));
        root.visit(&1);
        let child = root.child();
        child.visit(&2);
        child.clear();
        assert!(!child.has_visited(&2));
        assert!(child.has_visited(&1));
    }
}
