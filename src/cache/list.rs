//! Order List Module
//!
//! Index-based doubly linked list shared by the LRU and FIFO policies.

// == Handle ==
/// Stable position of a node inside an [`OrderList`].
pub type Handle = usize;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
}

// == Order List ==
/// Doubly linked list backed by a slab of nodes.
///
/// - Front = oldest (next eviction victim)
/// - Back = newest
///
/// Handles stay valid until the node is removed; freed slots are reused.
#[derive(Debug)]
pub struct OrderList<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
}

impl<T> Default for OrderList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Push Back ==
    /// Appends a value at the newest end and returns its handle.
    pub fn push_back(&mut self, value: T) -> Handle {
        let node = Node {
            value,
            prev: self.tail,
            next: None,
        };

        let handle = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
        handle
    }

    // == Remove ==
    /// Unlinks the node at `handle` and returns its value.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let node = self.nodes.get_mut(handle)?.take()?;

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        self.free.push(handle);
        self.len -= 1;
        Some(node.value)
    }

    // == Move To Back ==
    /// Marks the node as newest. The handle stays the same.
    pub fn move_to_back(&mut self, handle: Handle) {
        if self.tail == Some(handle) {
            return;
        }
        let Some(Some(node)) = self.nodes.get(handle) else {
            return;
        };
        let (prev, next) = (node.prev, node.next);

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.node_mut(n).prev = prev;
        }

        let old_tail = self.tail;
        {
            let node = self.node_mut(handle);
            node.prev = old_tail;
            node.next = None;
        }
        if let Some(t) = old_tail {
            self.node_mut(t).next = Some(handle);
        }
        self.tail = Some(handle);
    }

    // == Front ==
    /// Handle of the oldest node, the next eviction victim.
    pub fn front(&self) -> Option<Handle> {
        self.head
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.nodes.get(handle)?.as_ref().map(|n| &n.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.nodes.get_mut(handle)?.as_mut().map(|n| &mut n.value)
    }

    /// Handles from oldest to newest.
    pub fn handles(&self) -> Vec<Handle> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            out.push(handle);
            cursor = self.nodes[handle].as_ref().and_then(|n| n.next);
        }
        out
    }

    fn node_mut(&mut self, handle: Handle) -> &mut Node<T> {
        self.nodes[handle]
            .as_mut()
            .expect("linked handle points at a live node")
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn values(list: &OrderList<&'static str>) -> Vec<&'static str> {
        list.handles()
            .into_iter()
            .map(|h| *list.get(h).unwrap())
            .collect()
    }

    #[test]
    fn test_list_new() {
        let list: OrderList<u32> = OrderList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.front().is_none());
    }

    #[test]
    fn test_push_back_keeps_insertion_order() {
        let mut list = OrderList::new();
        list.push_back("a");
        list.push_back("b");
        list.push_back("c");

        assert_eq!(values(&list), vec!["a", "b", "c"]);
        assert_eq!(list.front().and_then(|h| list.get(h)), Some(&"a"));
    }

    #[test]
    fn test_move_to_back() {
        let mut list = OrderList::new();
        let a = list.push_back("a");
        list.push_back("b");
        let c = list.push_back("c");

        list.move_to_back(a);
        assert_eq!(values(&list), vec!["b", "c", "a"]);

        // Already newest: no change
        list.move_to_back(a);
        assert_eq!(values(&list), vec!["b", "c", "a"]);

        list.move_to_back(c);
        assert_eq!(values(&list), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut list = OrderList::new();
        let a = list.push_back("a");
        let b = list.push_back("b");
        let c = list.push_back("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(values(&list), vec!["a", "c"]);

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.remove(c), Some("c"));
        assert!(list.is_empty());

        // Double removal is a no-op
        assert_eq!(list.remove(c), None);
    }

    #[test]
    fn test_front_removal_and_slot_reuse() {
        let mut list = OrderList::new();
        list.push_back("a");
        list.push_back("b");

        let front = list.front().unwrap();
        assert_eq!(list.remove(front), Some("a"));
        let d = list.push_back("d");

        // Freed slot is reused
        assert_eq!(d, 0);
        assert_eq!(values(&list), vec!["b", "d"]);

        while let Some(front) = list.front() {
            list.remove(front);
        }
        assert!(list.is_empty());
    }
}
