//! Broad-phase spatial index: a dynamic AABB tree over fat proxies plus
//! the pair manager that turns proxy motion into candidate contact pairs.

use glam::Vec2;

use crate::{
    collision::queries::{Aabb, RayCastInput},
    config::{AABB_EXTENSION, AABB_MULTIPLIER},
};

pub const NULL_NODE: i32 = -1;

#[derive(Debug, Clone, Copy)]
struct TreeNode<D: Copy> {
    /// Fat AABB for leaves; union of children for internal nodes.
    aabb: Aabb,
    data: Option<D>,
    /// Parent for live nodes, next free slot for pooled ones.
    parent_or_next: i32,
    child1: i32,
    child2: i32,
    /// -1 = free, 0 = leaf, otherwise 1 + max(child heights).
    height: i32,
    moved: bool,
}

impl<D: Copy> TreeNode<D> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// Memory-pooled binary tree of fat AABBs keyed by stable integer proxy
/// ids. Insertion picks siblings by a surface-area heuristic and keeps the
/// tree balanced with single rotations.
pub struct DynamicTree<D: Copy> {
    nodes: Vec<TreeNode<D>>,
    root: i32,
    free_list: i32,
    node_count: usize,
}

impl<D: Copy> Default for DynamicTree<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Copy> DynamicTree<D> {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
            node_count: 0,
        };
        tree.grow_pool(16);
        tree
    }

    fn grow_pool(&mut self, new_capacity: usize) {
        let old_capacity = self.nodes.len();
        debug_assert!(new_capacity > old_capacity);
        self.nodes.resize(
            new_capacity,
            TreeNode {
                aabb: Aabb::empty(),
                data: None,
                parent_or_next: NULL_NODE,
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: -1,
                moved: false,
            },
        );
        // Chain the new slots onto the free list.
        for i in old_capacity..new_capacity - 1 {
            self.nodes[i].parent_or_next = (i + 1) as i32;
            self.nodes[i].height = -1;
        }
        self.nodes[new_capacity - 1].parent_or_next = self.free_list;
        self.nodes[new_capacity - 1].height = -1;
        self.free_list = old_capacity as i32;
    }

    fn allocate_node(&mut self) -> i32 {
        if self.free_list == NULL_NODE {
            // Pool exhausted; double it.
            let capacity = self.nodes.len();
            self.grow_pool(capacity * 2);
        }

        let node_id = self.free_list;
        let node = &mut self.nodes[node_id as usize];
        self.free_list = node.parent_or_next;
        node.parent_or_next = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = 0;
        node.data = None;
        node.moved = false;
        self.node_count += 1;
        node_id
    }

    fn free_node(&mut self, node_id: i32) {
        debug_assert!(0 <= node_id && (node_id as usize) < self.nodes.len());
        debug_assert!(self.node_count > 0);
        let node = &mut self.nodes[node_id as usize];
        node.parent_or_next = self.free_list;
        node.height = -1;
        node.data = None;
        self.free_list = node_id;
        self.node_count -= 1;
    }

    /// Creates a proxy for the tight `aabb`; the stored AABB is fattened by
    /// [`AABB_EXTENSION`] on each side.
    pub fn create_proxy(&mut self, aabb: Aabb, data: D) -> i32 {
        let proxy_id = self.allocate_node();

        let node = &mut self.nodes[proxy_id as usize];
        node.aabb = aabb.expanded(AABB_EXTENSION);
        node.data = Some(data);
        node.height = 0;
        node.moved = true;

        self.insert_leaf(proxy_id);
        proxy_id
    }

    pub fn destroy_proxy(&mut self, proxy_id: i32) {
        debug_assert!(self.nodes[proxy_id as usize].is_leaf());
        self.remove_leaf(proxy_id);
        self.free_node(proxy_id);
    }

    /// Moves a proxy to a new tight AABB. Returns false when the stored fat
    /// AABB still covers it (and is not excessively large), in which case
    /// no re-insertion happens.
    pub fn move_proxy(&mut self, proxy_id: i32, aabb: Aabb, displacement: Vec2) -> bool {
        debug_assert!(self.nodes[proxy_id as usize].is_leaf());

        let mut fat_aabb = aabb.expanded(AABB_EXTENSION);

        // Predict motion: extend along the displacement only.
        let d = AABB_MULTIPLIER * displacement;
        if d.x < 0.0 {
            fat_aabb.min.x += d.x;
        } else {
            fat_aabb.max.x += d.x;
        }
        if d.y < 0.0 {
            fat_aabb.min.y += d.y;
        } else {
            fat_aabb.max.y += d.y;
        }

        let tree_aabb = self.nodes[proxy_id as usize].aabb;
        if tree_aabb.contains(&aabb) {
            // Still covered; re-insert only if the stored AABB has grown
            // far beyond the predicted one (a fast object gone slow).
            let huge_aabb = fat_aabb.expanded(4.0 * AABB_EXTENSION);
            if huge_aabb.contains(&tree_aabb) {
                return false;
            }
        }

        self.remove_leaf(proxy_id);
        self.nodes[proxy_id as usize].aabb = fat_aabb;
        self.insert_leaf(proxy_id);
        self.nodes[proxy_id as usize].moved = true;
        true
    }

    pub fn data(&self, proxy_id: i32) -> D {
        self.nodes[proxy_id as usize]
            .data
            .expect("proxy id does not refer to a live leaf")
    }

    pub fn fat_aabb(&self, proxy_id: i32) -> Aabb {
        self.nodes[proxy_id as usize].aabb
    }

    pub fn was_moved(&self, proxy_id: i32) -> bool {
        self.nodes[proxy_id as usize].moved
    }

    pub fn clear_moved(&mut self, proxy_id: i32) {
        self.nodes[proxy_id as usize].moved = false;
    }

    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent_or_next = NULL_NODE;
            return;
        }

        // Find the best sibling by SAH descent: at each node compare the
        // cost of pairing here against the refined cost of each subtree.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;

            let area = self.nodes[index as usize].aabb.perimeter();
            let combined_area = Aabb::combine(self.nodes[index as usize].aabb, leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the leaf.
            let cost = 2.0 * combined_area;
            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let child_cost = |tree: &Self, child: i32| {
                let child_aabb = tree.nodes[child as usize].aabb;
                let combined = Aabb::combine(leaf_aabb, child_aabb);
                if tree.nodes[child as usize].is_leaf() {
                    combined.perimeter() + inheritance_cost
                } else {
                    (combined.perimeter() - child_aabb.perimeter()) + inheritance_cost
                }
            };

            let cost1 = child_cost(self, child1);
            let cost2 = child_cost(self, child2);

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        // Create a new parent over sibling and leaf.
        let old_parent = self.nodes[sibling as usize].parent_or_next;
        let new_parent = self.allocate_node();
        {
            let sibling_aabb = self.nodes[sibling as usize].aabb;
            let sibling_height = self.nodes[sibling as usize].height;
            let node = &mut self.nodes[new_parent as usize];
            node.parent_or_next = old_parent;
            node.aabb = Aabb::combine(leaf_aabb, sibling_aabb);
            node.height = sibling_height + 1;
        }

        if old_parent != NULL_NODE {
            let parent = &mut self.nodes[old_parent as usize];
            if parent.child1 == sibling {
                parent.child1 = new_parent;
            } else {
                parent.child2 = new_parent;
            }
        } else {
            self.root = new_parent;
        }

        self.nodes[new_parent as usize].child1 = sibling;
        self.nodes[new_parent as usize].child2 = leaf;
        self.nodes[sibling as usize].parent_or_next = new_parent;
        self.nodes[leaf as usize].parent_or_next = new_parent;

        // Walk back up refreshing heights and AABBs, balancing as we go.
        let mut index = self.nodes[leaf as usize].parent_or_next;
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            debug_assert!(child1 != NULL_NODE && child2 != NULL_NODE);

            self.nodes[index as usize].height = 1 + self.nodes[child1 as usize]
                .height
                .max(self.nodes[child2 as usize].height);
            self.nodes[index as usize].aabb = Aabb::combine(
                self.nodes[child1 as usize].aabb,
                self.nodes[child2 as usize].aabb,
            );

            index = self.nodes[index as usize].parent_or_next;
        }
    }

    fn remove_leaf(&mut self, leaf: i32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent_or_next;
        let grand_parent = self.nodes[parent as usize].parent_or_next;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grand_parent != NULL_NODE {
            // Splice the sibling into the grandparent.
            if self.nodes[grand_parent as usize].child1 == parent {
                self.nodes[grand_parent as usize].child1 = sibling;
            } else {
                self.nodes[grand_parent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent_or_next = grand_parent;
            self.free_node(parent);

            let mut index = grand_parent;
            while index != NULL_NODE {
                index = self.balance(index);

                let child1 = self.nodes[index as usize].child1;
                let child2 = self.nodes[index as usize].child2;

                self.nodes[index as usize].aabb = Aabb::combine(
                    self.nodes[child1 as usize].aabb,
                    self.nodes[child2 as usize].aabb,
                );
                self.nodes[index as usize].height = 1 + self.nodes[child1 as usize]
                    .height
                    .max(self.nodes[child2 as usize].height);

                index = self.nodes[index as usize].parent_or_next;
            }
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent_or_next = NULL_NODE;
            self.free_node(parent);
        }
    }

    /// Single left or right rotation when subtree A's children differ in
    /// height by more than 1. Returns the new subtree root.
    fn balance(&mut self, i_a: i32) -> i32 {
        debug_assert!(i_a != NULL_NODE);

        if self.nodes[i_a as usize].is_leaf() || self.nodes[i_a as usize].height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a as usize].child1;
        let i_c = self.nodes[i_a as usize].child2;

        let balance = self.nodes[i_c as usize].height - self.nodes[i_b as usize].height;

        // Rotate C up.
        if balance > 1 {
            let i_f = self.nodes[i_c as usize].child1;
            let i_g = self.nodes[i_c as usize].child2;

            self.nodes[i_c as usize].child1 = i_a;
            self.nodes[i_c as usize].parent_or_next = self.nodes[i_a as usize].parent_or_next;
            self.nodes[i_a as usize].parent_or_next = i_c;

            let c_parent = self.nodes[i_c as usize].parent_or_next;
            if c_parent != NULL_NODE {
                if self.nodes[c_parent as usize].child1 == i_a {
                    self.nodes[c_parent as usize].child1 = i_c;
                } else {
                    debug_assert!(self.nodes[c_parent as usize].child2 == i_a);
                    self.nodes[c_parent as usize].child2 = i_c;
                }
            } else {
                self.root = i_c;
            }

            // The taller grandchild stays with C.
            if self.nodes[i_f as usize].height > self.nodes[i_g as usize].height {
                self.nodes[i_c as usize].child2 = i_f;
                self.nodes[i_a as usize].child2 = i_g;
                self.nodes[i_g as usize].parent_or_next = i_a;
                self.nodes[i_a as usize].aabb =
                    Aabb::combine(self.nodes[i_b as usize].aabb, self.nodes[i_g as usize].aabb);
                self.nodes[i_c as usize].aabb =
                    Aabb::combine(self.nodes[i_a as usize].aabb, self.nodes[i_f as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_b as usize]
                    .height
                    .max(self.nodes[i_g as usize].height);
                self.nodes[i_c as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_f as usize].height);
            } else {
                self.nodes[i_c as usize].child2 = i_g;
                self.nodes[i_a as usize].child2 = i_f;
                self.nodes[i_f as usize].parent_or_next = i_a;
                self.nodes[i_a as usize].aabb =
                    Aabb::combine(self.nodes[i_b as usize].aabb, self.nodes[i_f as usize].aabb);
                self.nodes[i_c as usize].aabb =
                    Aabb::combine(self.nodes[i_a as usize].aabb, self.nodes[i_g as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_b as usize]
                    .height
                    .max(self.nodes[i_f as usize].height);
                self.nodes[i_c as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_g as usize].height);
            }

            return i_c;
        }

        // Rotate B up.
        if balance < -1 {
            let i_d = self.nodes[i_b as usize].child1;
            let i_e = self.nodes[i_b as usize].child2;

            self.nodes[i_b as usize].child1 = i_a;
            self.nodes[i_b as usize].parent_or_next = self.nodes[i_a as usize].parent_or_next;
            self.nodes[i_a as usize].parent_or_next = i_b;

            let b_parent = self.nodes[i_b as usize].parent_or_next;
            if b_parent != NULL_NODE {
                if self.nodes[b_parent as usize].child1 == i_a {
                    self.nodes[b_parent as usize].child1 = i_b;
                } else {
                    debug_assert!(self.nodes[b_parent as usize].child2 == i_a);
                    self.nodes[b_parent as usize].child2 = i_b;
                }
            } else {
                self.root = i_b;
            }

            if self.nodes[i_d as usize].height > self.nodes[i_e as usize].height {
                self.nodes[i_b as usize].child2 = i_d;
                self.nodes[i_a as usize].child1 = i_e;
                self.nodes[i_e as usize].parent_or_next = i_a;
                self.nodes[i_a as usize].aabb =
                    Aabb::combine(self.nodes[i_c as usize].aabb, self.nodes[i_e as usize].aabb);
                self.nodes[i_b as usize].aabb =
                    Aabb::combine(self.nodes[i_a as usize].aabb, self.nodes[i_d as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_c as usize]
                    .height
                    .max(self.nodes[i_e as usize].height);
                self.nodes[i_b as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_d as usize].height);
            } else {
                self.nodes[i_b as usize].child2 = i_e;
                self.nodes[i_a as usize].child1 = i_d;
                self.nodes[i_d as usize].parent_or_next = i_a;
                self.nodes[i_a as usize].aabb =
                    Aabb::combine(self.nodes[i_c as usize].aabb, self.nodes[i_d as usize].aabb);
                self.nodes[i_b as usize].aabb =
                    Aabb::combine(self.nodes[i_a as usize].aabb, self.nodes[i_e as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_c as usize]
                    .height
                    .max(self.nodes[i_d as usize].height);
                self.nodes[i_b as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_e as usize].height);
            }

            return i_b;
        }

        i_a
    }

    /// Reports each leaf overlapping `aabb`; the visitor returns false to
    /// stop the traversal.
    pub fn query<F>(&self, aabb: &Aabb, mut visitor: F)
    where
        F: FnMut(i32) -> bool,
    {
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }

            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }

            if node.is_leaf() {
                if !visitor(node_id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Segment cast pruned by a separating-axis test against each internal
    /// node. The visitor returns the new clipping fraction: 0 stops the
    /// cast, a positive value clips it, a negative value ignores the leaf.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut visitor: F)
    where
        F: FnMut(&RayCastInput, i32) -> f32,
    {
        let p1 = input.p1;
        let p2 = input.p2;
        let r = (p2 - p1).normalize_or_zero();
        debug_assert!(r.length_squared() > 0.0);

        // v is perpendicular to the segment.
        let v = Vec2::new(-r.y, r.x);
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;

        let mut segment_aabb = {
            let t = p1 + max_fraction * (p2 - p1);
            Aabb::new(p1.min(t), p1.max(t))
        };

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }

            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(&segment_aabb) {
                continue;
            }

            // Separating axis: |dot(v, p1 − c)| > dot(|v|, h).
            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1,
                    p2,
                    max_fraction,
                };
                let value = visitor(&sub_input, node_id);
                if value == 0.0 {
                    // The client has terminated the ray cast.
                    return;
                }
                if value > 0.0 {
                    max_fraction = value;
                    let t = p1 + max_fraction * (p2 - p1);
                    segment_aabb = Aabb::new(p1.min(t), p1.max(t));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Walks the free list; used by the structural invariants check.
    pub fn free_list_len(&self) -> usize {
        let mut count = 0;
        let mut index = self.free_list;
        while index != NULL_NODE {
            debug_assert!(self.nodes[index as usize].height == -1);
            count += 1;
            index = self.nodes[index as usize].parent_or_next;
        }
        count
    }

    /// Verifies the structural invariants of the whole tree. Intended for
    /// tests; cost is O(n²) in the subtree heights.
    pub fn validate(&self) -> bool {
        self.validate_structure(self.root)
            && self.validate_metrics(self.root)
            && self.free_list_len() + self.node_count == self.nodes.len()
    }

    fn validate_structure(&self, index: i32) -> bool {
        if index == NULL_NODE {
            return true;
        }
        let node = &self.nodes[index as usize];
        if node.height == -1 {
            // Free node reachable from the root.
            return false;
        }
        if node.is_leaf() {
            return node.child2 == NULL_NODE && node.height == 0 && node.data.is_some();
        }

        let child1 = node.child1;
        let child2 = node.child2;
        self.nodes[child1 as usize].parent_or_next == index
            && self.nodes[child2 as usize].parent_or_next == index
            && node.data.is_none()
            && self.validate_structure(child1)
            && self.validate_structure(child2)
    }

    fn validate_metrics(&self, index: i32) -> bool {
        if index == NULL_NODE {
            return true;
        }
        let node = &self.nodes[index as usize];
        if node.is_leaf() {
            return true;
        }

        let child1 = node.child1;
        let child2 = node.child2;

        let height1 = self.nodes[child1 as usize].height;
        let height2 = self.nodes[child2 as usize].height;
        if node.height != 1 + height1.max(height2) {
            return false;
        }

        let combined = Aabb::combine(
            self.nodes[child1 as usize].aabb,
            self.nodes[child2 as usize].aabb,
        );
        node.aabb.contains(&combined)
            && combined.contains(&node.aabb)
            && self.validate_metrics(child1)
            && self.validate_metrics(child2)
    }
}

/// Broad phase driver: owns the tree, tracks moved proxies, and emits each
/// new overlapping pair exactly once per step.
pub struct BroadPhase<D: Copy> {
    tree: DynamicTree<D>,
    moved: Vec<i32>,
    pairs: Vec<(i32, i32)>,
}

impl<D: Copy> Default for BroadPhase<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Copy> BroadPhase<D> {
    pub fn new() -> Self {
        Self {
            tree: DynamicTree::new(),
            moved: Vec::new(),
            pairs: Vec::new(),
        }
    }

    pub fn create_proxy(&mut self, aabb: Aabb, data: D) -> i32 {
        let proxy_id = self.tree.create_proxy(aabb, data);
        self.moved.push(proxy_id);
        proxy_id
    }

    pub fn destroy_proxy(&mut self, proxy_id: i32) {
        self.moved.retain(|&id| id != proxy_id);
        self.tree.destroy_proxy(proxy_id);
    }

    pub fn move_proxy(&mut self, proxy_id: i32, aabb: Aabb, displacement: Vec2) {
        if self.tree.move_proxy(proxy_id, aabb, displacement) {
            self.moved.push(proxy_id);
        }
    }

    /// Re-queues a proxy for pair generation without moving it (used after
    /// filter changes).
    pub fn touch_proxy(&mut self, proxy_id: i32) {
        self.moved.push(proxy_id);
    }

    pub fn data(&self, proxy_id: i32) -> D {
        self.tree.data(proxy_id)
    }

    pub fn fat_aabb(&self, proxy_id: i32) -> Aabb {
        self.tree.fat_aabb(proxy_id)
    }

    pub fn test_overlap(&self, proxy_a: i32, proxy_b: i32) -> bool {
        self.tree
            .fat_aabb(proxy_a)
            .overlaps(&self.tree.fat_aabb(proxy_b))
    }

    pub fn proxy_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn tree(&self) -> &DynamicTree<D> {
        &self.tree
    }

    /// Queries the tree for every proxy that moved since the last call and
    /// hands each unordered overlapping pair to the callback exactly once.
    pub fn update_pairs<F>(&mut self, mut callback: F)
    where
        F: FnMut(D, D),
    {
        self.pairs.clear();

        for i in 0..self.moved.len() {
            let query_id = self.moved[i];
            if query_id == NULL_NODE {
                continue;
            }

            let fat_aabb = self.tree.fat_aabb(query_id);
            let tree = &self.tree;
            let pairs = &mut self.pairs;
            tree.query(&fat_aabb, |proxy_id| {
                if proxy_id == query_id {
                    return true;
                }
                // Both proxies moved: let the smaller id generate the pair.
                if tree.was_moved(proxy_id) && proxy_id > query_id {
                    return true;
                }
                let (a, b) = if proxy_id < query_id {
                    (proxy_id, query_id)
                } else {
                    (query_id, proxy_id)
                };
                pairs.push((a, b));
                true
            });
        }

        for &id in &self.moved {
            if id != NULL_NODE {
                self.tree.clear_moved(id);
            }
        }
        self.moved.clear();

        self.pairs.sort_unstable();
        self.pairs.dedup();

        for &(a, b) in &self.pairs {
            callback(self.tree.data(a), self.tree.data(b));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_aabb(center: Vec2) -> Aabb {
        Aabb::new(center - Vec2::splat(0.5), center + Vec2::splat(0.5))
    }

    #[test]
    fn tree_stays_valid_under_churn() {
        let mut tree: DynamicTree<usize> = DynamicTree::new();
        let mut ids = Vec::new();

        for i in 0..64 {
            let x = (i % 8) as f32 * 1.5;
            let y = (i / 8) as f32 * 1.5;
            ids.push(tree.create_proxy(unit_aabb(Vec2::new(x, y)), i));
            assert!(tree.validate());
        }

        // Move every other proxy far away.
        for (i, &id) in ids.iter().enumerate().filter(|(i, _)| i % 2 == 0) {
            let target = Vec2::new(100.0 + i as f32, -50.0);
            tree.move_proxy(id, unit_aabb(target), Vec2::new(5.0, -5.0));
            assert!(tree.validate());
        }

        for &id in ids.iter().rev() {
            tree.destroy_proxy(id);
            assert!(tree.validate());
        }
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn move_within_fat_aabb_skips_reinsertion() {
        let mut tree: DynamicTree<usize> = DynamicTree::new();
        let id = tree.create_proxy(unit_aabb(Vec2::ZERO), 0);
        tree.clear_moved(id);

        // A nudge well inside the fattened bounds must not reinsert.
        let nudged = unit_aabb(Vec2::new(0.04, 0.0));
        assert!(!tree.move_proxy(id, nudged, Vec2::new(0.04, 0.0)));
        assert!(!tree.was_moved(id));

        let far = unit_aabb(Vec2::new(3.0, 0.0));
        assert!(tree.move_proxy(id, far, Vec2::new(3.0, 0.0)));
        assert!(tree.was_moved(id));
    }

    #[test]
    fn query_finds_exactly_the_overlapping_leaves() {
        let mut tree: DynamicTree<usize> = DynamicTree::new();
        for i in 0..10 {
            tree.create_proxy(unit_aabb(Vec2::new(i as f32 * 2.0, 0.0)), i);
        }

        let mut found = Vec::new();
        tree.query(&Aabb::new(Vec2::new(-0.6, -0.6), Vec2::new(2.6, 0.6)), |id| {
            found.push(tree.data(id));
            true
        });
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn pairs_are_emitted_once_per_step() {
        let mut broadphase: BroadPhase<usize> = BroadPhase::new();
        broadphase.create_proxy(unit_aabb(Vec2::ZERO), 0);
        broadphase.create_proxy(unit_aabb(Vec2::new(0.25, 0.0)), 1);
        broadphase.create_proxy(unit_aabb(Vec2::new(50.0, 0.0)), 2);

        let mut pairs = Vec::new();
        broadphase.update_pairs(|a, b| pairs.push((a.min(b), a.max(b))));
        assert_eq!(pairs, vec![(0, 1)]);

        // Nothing moved: no pairs on the next step.
        pairs.clear();
        broadphase.update_pairs(|a, b| pairs.push((a, b)));
        assert!(pairs.is_empty());
    }

    #[test]
    fn ray_cast_clips_to_nearest_leaf() {
        let mut tree: DynamicTree<usize> = DynamicTree::new();
        let near = tree.create_proxy(unit_aabb(Vec2::new(2.0, 0.0)), 10);
        let far = tree.create_proxy(unit_aabb(Vec2::new(6.0, 0.0)), 20);

        let input = RayCastInput {
            p1: Vec2::new(-2.0, 0.0),
            p2: Vec2::new(10.0, 0.0),
            max_fraction: 1.0,
        };

        let mut hits = Vec::new();
        tree.ray_cast(&input, |sub_input, id| {
            hits.push(tree.data(id));
            // Clip to this leaf's entry point to mimic closest-hit search.
            let aabb = tree.fat_aabb(id);
            match aabb.ray_cast(sub_input) {
                Some(out) => out.fraction,
                None => -1.0,
            }
        });

        assert!(hits.contains(&10));
        let _ = (near, far);
    }
}
