//! Arena-Backed Recency List
//!
//! A doubly-linked list whose nodes live in a [`Slab`]. Links are slab
//! indices instead of pointers, so nodes can be moved, reused and removed in
//! O(1) without any `unsafe`.
//!
//! ```text
//!   front (LRU)                                   back (MRU)
//!   ┌───────┐  next  ┌───────┐  next  ┌───────┐
//!   │ idx 3 │ ─────> │ idx 0 │ ─────> │ idx 7 │
//!   │       │ <───── │       │ <───── │       │
//!   └───────┘  prev  └───────┘  prev  └───────┘
//! ```
//!
//! The front is always the next eviction candidate and the back is the most
//! recently touched node.

use slab::Slab;

/// A single node of the recency list.
#[derive(Debug)]
pub struct Node<T> {
    pub key: String,
    pub value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked list of `(key, value)` pairs ordered by recency.
#[derive(Debug)]
pub struct RecencyList<T> {
    nodes: Slab<Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of nodes in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the least recently used node.
    #[inline]
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    /// Index of the most recently used node.
    #[inline]
    pub fn back(&self) -> Option<usize> {
        self.tail
    }

    pub fn get(&self, idx: usize) -> Option<&Node<T>> {
        self.nodes.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(idx)
    }

    /// Index of the node following `idx`, towards the back.
    pub fn next(&self, idx: usize) -> Option<usize> {
        self.nodes.get(idx).and_then(|node| node.next)
    }

    /// Appends a new node at the back and returns its index.
    pub fn push_back(&mut self, key: String, value: T) -> usize {
        let idx = self.nodes.insert(Node {
            key,
            value,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);

        idx
    }

    /// Moves an existing node to the back. Unknown indices are ignored.
    pub fn move_to_back(&mut self, idx: usize) {
        if !self.nodes.contains(idx) || self.tail == Some(idx) {
            return;
        }

        self.unlink(idx);

        let node = &mut self.nodes[idx];
        node.prev = self.tail;
        node.next = None;

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    /// Removes a node and returns its key and value.
    pub fn remove(&mut self, idx: usize) -> Option<(String, T)> {
        if !self.nodes.contains(idx) {
            return None;
        }

        self.unlink(idx);
        let node = self.nodes.remove(idx);
        Some((node.key, node.value))
    }

    /// Iterates node indices from front (LRU) to back (MRU).
    pub fn indices(&self) -> Indices<'_, T> {
        Indices {
            list: self,
            cursor: self.head,
        }
    }

    /// Detaches a node from its neighbours, leaving it in the slab.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = &self.nodes[idx];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }
}

/// Front-to-back iterator over node indices.
pub struct Indices<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
}

impl<T> Iterator for Indices<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.cursor?;
        self.cursor = self.list.next(idx);
        Some(idx)
    }
}
