//! Quadtree spatial index
//!
//! Rebuilt from scratch every step. Nodes live in an arena and refer to each
//! other by index; items are plain `Copy` handles (body slots) stored next to
//! their bounding boxes, so the tree never owns or borrows the bodies.
//!
//! Items go into the first quadrant whose boundary touches their box, so a
//! box may overhang its quadrant. Each node keeps a loose extent covering
//! every box stored below it, and queries prune on that extent rather than
//! the boundary, so overhanging items are never missed.

use super::rect::Rect;
use crate::consts::{MAX_DEPTH, MIN_NODE_SIZE};
use crate::error::{PhysicsError, Result};

/// Index of a node in the arena
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node<T> {
    boundary: Rect,
    /// Union of every item box in this subtree
    extent: Option<Rect>,
    items: Vec<(Rect, T)>,
    /// NW, NE, SW, SE once divided
    children: Option<[NodeId; 4]>,
    depth: u32,
}

impl<T> Node<T> {
    fn new(boundary: Rect, depth: u32) -> Self {
        Self {
            boundary,
            extent: None,
            items: Vec::new(),
            children: None,
            depth,
        }
    }

    fn grow_extent(&mut self, bounds: &Rect) {
        self.extent = Some(match self.extent {
            Some(extent) => extent.union(bounds),
            None => *bounds,
        });
    }
}

/// Read-only view of one node, for debug drawing and inspection
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a, T> {
    pub boundary: Rect,
    pub depth: u32,
    pub divided: bool,
    pub items: &'a [(Rect, T)],
}

/// Region quadtree over axis-aligned boxes
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    nodes: Vec<Node<T>>,
    capacity: usize,
    len: usize,
}

impl<T: Copy> QuadTree<T> {
    /// Empty tree covering `boundary`; `capacity` must be at least 1
    pub fn new(boundary: Rect, capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(PhysicsError::invalid(
                "quadtree capacity must be at least 1",
            ));
        }
        Ok(Self {
            nodes: vec![Node::new(boundary, 0)],
            capacity,
            len: 0,
        })
    }

    /// Drop every node and item, keeping the allocation
    pub fn reset(&mut self, boundary: Rect) {
        self.nodes.clear();
        self.nodes.push(Node::new(boundary, 0));
        self.len = 0;
    }

    pub fn boundary(&self) -> Rect {
        self.nodes[ROOT].boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node level in the tree
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Insert an item; false if its box misses the root boundary
    pub fn insert(&mut self, bounds: Rect, item: T) -> bool {
        let inserted = self.insert_at(ROOT, bounds, item);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    fn insert_at(&mut self, node: NodeId, bounds: Rect, item: T) -> bool {
        if !self.nodes[node].boundary.intersects(&bounds) {
            return false;
        }

        let children = match self.nodes[node].children {
            Some(children) => children,
            None => {
                if self.nodes[node].items.len() < self.capacity || !self.can_subdivide(node) {
                    if self.nodes[node].items.len() >= self.capacity {
                        log::debug!(
                            "quadtree node at depth {} kept {} items past capacity",
                            self.nodes[node].depth,
                            self.nodes[node].items.len() + 1
                        );
                    }
                    let n = &mut self.nodes[node];
                    n.items.push((bounds, item));
                    n.grow_extent(&bounds);
                    return true;
                }
                self.subdivide(node)
            }
        };

        for child in children {
            if self.insert_at(child, bounds, item) {
                self.nodes[node].grow_extent(&bounds);
                return true;
            }
        }
        false
    }

    fn can_subdivide(&self, node: NodeId) -> bool {
        let n = &self.nodes[node];
        n.depth < MAX_DEPTH
            && n.boundary.w * 0.5 >= MIN_NODE_SIZE
            && n.boundary.h * 0.5 >= MIN_NODE_SIZE
    }

    /// Split into four quadrants and push every held item down
    fn subdivide(&mut self, node: NodeId) -> [NodeId; 4] {
        let depth = self.nodes[node].depth + 1;
        let quadrants = self.nodes[node].boundary.quadrants();
        let first = self.nodes.len();
        self.nodes
            .extend(quadrants.into_iter().map(|q| Node::new(q, depth)));
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].children = Some(children);

        let held = std::mem::take(&mut self.nodes[node].items);
        for (bounds, item) in held {
            // Every held box touches the parent, so some quadrant accepts it
            let placed = children
                .iter()
                .any(|&child| self.insert_at(child, bounds, item));
            debug_assert!(placed, "quadtree lost an item while subdividing: {bounds:?}");
        }
        children
    }

    /// Every item whose box intersects `range`
    pub fn query(&self, range: &Rect) -> Vec<T> {
        let mut found = Vec::new();
        self.query_into(range, &mut found);
        found
    }

    /// Like [`query`](Self::query), appending into `found`
    pub fn query_into(&self, range: &Rect, found: &mut Vec<T>) {
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.extent {
                Some(extent) if extent.intersects(range) => {}
                _ => continue,
            }
            found.extend(
                node.items
                    .iter()
                    .filter(|(bounds, _)| bounds.intersects(range))
                    .map(|&(_, item)| item),
            );
            if let Some(children) = node.children {
                // Reversed so NW is searched first
                stack.extend(children.iter().rev());
            }
        }
    }

    /// All nodes, parents before children
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_, T>> + '_ {
        self.nodes.iter().map(|n| NodeView {
            boundary: n.boundary,
            depth: n.depth,
            divided: n.children.is_some(),
            items: &n.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn boxed(x: f32, y: f32, size: f32) -> Rect {
        Rect::new(x, y, size, size)
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(QuadTree::<u32>::new(world(), 0).is_err());
    }

    #[test]
    fn test_insert_outside_boundary_fails() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        assert!(!tree.insert(boxed(900.0, 10.0, 5.0), 1u32));
        assert!(tree.insert(boxed(-4.0, -4.0, 5.0), 2u32));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_overflow_subdivides_and_empties_parent() {
        let mut tree = QuadTree::new(world(), 2).unwrap();
        tree.insert(boxed(10.0, 10.0, 4.0), 1u32);
        tree.insert(boxed(700.0, 10.0, 4.0), 2u32);
        assert_eq!(tree.node_count(), 1);

        tree.insert(boxed(10.0, 500.0, 4.0), 3u32);
        let nodes: Vec<_> = tree.nodes().collect();
        assert_eq!(nodes.len(), 5);
        assert!(nodes[0].divided);
        assert!(nodes[0].items.is_empty());
        // NW, NE, SW, SE
        assert_eq!(nodes[1].items.iter().map(|i| i.1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(nodes[2].items.iter().map(|i| i.1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(nodes[3].items.iter().map(|i| i.1).collect::<Vec<_>>(), vec![3]);
        assert!(nodes[4].items.is_empty());
    }

    #[test]
    fn test_divided_node_never_takes_items_back() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        tree.insert(boxed(10.0, 10.0, 4.0), 1u32);
        tree.insert(boxed(700.0, 500.0, 4.0), 2u32);
        tree.insert(boxed(700.0, 10.0, 4.0), 3u32);
        let root = tree.nodes().next().unwrap();
        assert!(root.divided);
        assert!(root.items.is_empty());
    }

    #[test]
    fn test_overhanging_item_is_found() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        tree.insert(boxed(100.0, 100.0, 4.0), 1u32);
        // Straddles the vertical midline, lands in NW but reaches into NE
        tree.insert(boxed(390.0, 100.0, 30.0), 2u32);
        let found = tree.query(&boxed(415.0, 110.0, 2.0));
        assert_eq!(found, vec![2]);
    }

    #[test]
    fn test_coincident_points_stop_at_depth_guard() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        for i in 0..200u32 {
            assert!(tree.insert(boxed(123.0, 321.0, 0.0), i));
        }
        assert!(tree.depth() <= MAX_DEPTH);
        assert_eq!(tree.query(&boxed(120.0, 320.0, 5.0)).len(), 200);
    }

    #[test]
    fn test_reset_empties_tree() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        tree.insert(boxed(10.0, 10.0, 4.0), 1u32);
        tree.insert(boxed(700.0, 500.0, 4.0), 2u32);
        tree.reset(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.query(&world()).is_empty());
        assert_eq!(tree.boundary(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_query_order_starts_north_west() {
        let mut tree = QuadTree::new(world(), 1).unwrap();
        tree.insert(boxed(700.0, 500.0, 4.0), 4u32);
        tree.insert(boxed(10.0, 10.0, 4.0), 1u32);
        let found = tree.query(&world());
        assert_eq!(found, vec![1, 4]);
    }

    fn arb_box() -> impl Strategy<Value = Rect> {
        (-50.0f32..850.0, -50.0f32..650.0, 0.0f32..60.0, 0.0f32..60.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_query_matches_brute_force(
            boxes in prop::collection::vec(arb_box(), 0..120),
            capacity in 1usize..6,
            range in arb_box(),
        ) {
            let mut tree = QuadTree::new(world(), capacity).unwrap();
            let mut stored = Vec::new();
            for (i, b) in boxes.iter().enumerate() {
                if tree.insert(*b, i) {
                    stored.push(i);
                }
            }
            prop_assert_eq!(tree.len(), stored.len());

            let mut found = tree.query(&range);
            found.sort_unstable();
            let expected: Vec<usize> = stored
                .into_iter()
                .filter(|&i| boxes[i].intersects(&range))
                .collect();
            prop_assert_eq!(found, expected);
        }

        #[test]
        fn prop_leaves_respect_capacity_and_items_stored_once(
            boxes in prop::collection::vec(arb_box(), 0..120),
            capacity in 1usize..6,
        ) {
            let mut tree = QuadTree::new(world(), capacity).unwrap();
            let mut stored = 0;
            for (i, b) in boxes.iter().enumerate() {
                if tree.insert(*b, i) {
                    stored += 1;
                }
            }

            let mut seen = vec![0usize; boxes.len()];
            for node in tree.nodes() {
                if node.divided {
                    prop_assert!(node.items.is_empty());
                } else if node.depth < MAX_DEPTH
                    && node.boundary.w * 0.5 >= MIN_NODE_SIZE
                    && node.boundary.h * 0.5 >= MIN_NODE_SIZE
                {
                    prop_assert!(node.items.len() <= capacity);
                }
                for &(_, i) in node.items {
                    seen[i] += 1;
                }
            }
            prop_assert_eq!(seen.iter().sum::<usize>(), stored);
            prop_assert!(seen.iter().all(|&count| count <= 1));
        }
    }
}
