/// Sentinel marking a node as not resident in the heap.
pub const INVALID_SLOT: usize = usize::MAX;

#[derive(Clone, Copy, Debug)]
struct HeapEntry {
    node: usize,
    f: i32,
    h: i32,
}

impl HeapEntry {
    /// Primary key total cost, tie-break on heuristic cost so nodes closer
    /// to the goal are popped first. This reduces fan-out near the goal.
    fn key(&self) -> (i32, i32) {
        (self.f, self.h)
    }
}

/// Binary min-heap over node indices keyed by `(f, h)` ascending, with
/// decrease-key support. Membership is O(1) through a per-node slot
/// back-reference; a node may reside in at most one heap at a time.
#[derive(Clone, Debug, Default)]
pub struct OpenHeap {
    entries: Vec<HeapEntry>,
    slots: Vec<usize>,
}

impl OpenHeap {
    pub fn new(node_count: usize) -> OpenHeap {
        OpenHeap {
            entries: Vec::new(),
            slots: vec![INVALID_SLOT; node_count],
        }
    }

    /// Empties the heap and resizes the slot table for `node_count` nodes,
    /// reusing allocations where possible.
    pub fn reset(&mut self, node_count: usize) {
        self.entries.clear();
        self.slots.clear();
        self.slots.resize(node_count, INVALID_SLOT);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.slots[node] != INVALID_SLOT
    }

    /// Inserts `node` with the given costs. The node must not already be
    /// resident; use [update](Self::update) after a cost decrease instead.
    pub fn push(&mut self, node: usize, f: i32, h: i32) {
        debug_assert!(!self.contains(node));
        let slot = self.entries.len();
        self.entries.push(HeapEntry { node, f, h });
        self.slots[node] = slot;
        self.sift_up(slot);
    }

    /// Pops the minimum-cost node, if any.
    pub fn pop(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let top = self.entries[0].node;
        self.slots[top] = INVALID_SLOT;
        let last = self.entries.pop().unwrap();
        if !self.entries.is_empty() {
            self.entries[0] = last;
            self.slots[last.node] = 0;
            self.sift_down(0);
        }
        Some(top)
    }

    /// Re-sifts a resident node after its costs decreased.
    pub fn update(&mut self, node: usize, f: i32, h: i32) {
        let slot = self.slots[node];
        debug_assert!(slot != INVALID_SLOT);
        debug_assert!((f, h) <= self.entries[slot].key());
        self.entries[slot].f = f;
        self.entries[slot].h = h;
        self.sift_up(slot);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].key() >= self.entries[parent].key() {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = 2 * slot + 2;
            let mut smallest = slot;
            if left < self.entries.len() && self.entries[left].key() < self.entries[smallest].key()
            {
                smallest = left;
            }
            if right < self.entries.len()
                && self.entries[right].key() < self.entries[smallest].key()
            {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].node] = a;
        self.slots[self.entries[b].node] = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn drain(heap: &mut OpenHeap) -> Vec<usize> {
        let mut order = Vec::new();
        while let Some(n) = heap.pop() {
            order.push(n);
        }
        order
    }

    #[test]
    fn pops_in_cost_order() {
        let mut heap = OpenHeap::new(4);
        heap.push(0, 30, 5);
        heap.push(1, 10, 5);
        heap.push(2, 20, 5);
        heap.push(3, 10, 2);
        // Equal f resolved by smaller h.
        assert_eq!(drain(&mut heap), vec![3, 1, 2, 0]);
    }

    #[test]
    fn decrease_key_resifts_in_place() {
        let mut heap = OpenHeap::new(3);
        heap.push(0, 50, 10);
        heap.push(1, 40, 10);
        heap.push(2, 30, 10);
        heap.update(0, 10, 1);
        assert_eq!(heap.pop(), Some(0));
        assert!(!heap.contains(0));
        assert!(heap.contains(1));
    }

    #[test]
    fn membership_tracks_push_and_pop() {
        let mut heap = OpenHeap::new(2);
        assert!(!heap.contains(0));
        heap.push(0, 1, 1);
        assert!(heap.contains(0));
        heap.pop();
        assert!(heap.is_empty());
        assert!(!heap.contains(0));
    }

    /// Random add/update sequences must always drain in non-decreasing
    /// `(f, h)` order.
    #[test]
    fn fuzz_heap_invariant() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let n = 64;
            let mut heap = OpenHeap::new(n);
            let mut keys = vec![(0, 0); n];
            for node in 0..n {
                let f = rng.gen_range(0..1000);
                let h = rng.gen_range(0..100);
                keys[node] = (f, h);
                heap.push(node, f, h);
            }
            for _ in 0..n / 2 {
                let node = rng.gen_range(0..n);
                if heap.contains(node) {
                    let (f, h) = keys[node];
                    let new = (f - rng.gen_range(0..=f.min(50)), h);
                    if new <= (f, h) {
                        keys[node] = new;
                        heap.update(node, new.0, new.1);
                    }
                }
            }
            let order = drain(&mut heap);
            assert_eq!(order.len(), n);
            for pair in order.windows(2) {
                assert!(keys[pair[0]] <= keys[pair[1]]);
            }
        }
    }
}
