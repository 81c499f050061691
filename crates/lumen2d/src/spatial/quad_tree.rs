//! Quad tree spatial partitioning structure
//!
//! Divides 2D space into hierarchical quadrants for fast bounding-area
//! intersection queries. The render pass rebuilds one of these per frame
//! from the current renderable set; nothing here persists across frames.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;
use crate::spatial::BoundingArea;

/// Configuration for quad tree behavior
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Maximum items per node before subdivision
    pub max_items_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

/// Single node in the quad tree hierarchy
#[derive(Debug)]
struct QuadTreeNode<K> {
    /// World-space bounds of this node
    bounds: BoundingArea,

    /// Items stored at this node: leaves hold everything that landed
    /// here, branches hold items straddling a quadrant boundary
    items: Vec<(K, BoundingArea)>,

    /// Child quadrants, None if this is a leaf
    children: Option<Box<[QuadTreeNode<K>; 4]>>,

    /// Depth in the tree (0 = root)
    depth: u32,
}

impl<K: Copy + PartialEq> QuadTreeNode<K> {
    fn new(bounds: BoundingArea, depth: u32) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
            depth,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Split into four quadrants and push down fully contained items.
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let extents = self.bounds.extents();
        let quarter = extents * 0.5;
        let depth = self.depth + 1;

        let quadrant = |x_sign: f32, y_sign: f32| {
            let child_center = Vec2::new(
                center.x + quarter.x * x_sign,
                center.y + quarter.y * y_sign,
            );
            QuadTreeNode::new(
                BoundingArea::from_center_size(child_center, extents),
                depth,
            )
        };

        let mut children = Box::new([
            quadrant(-1.0, -1.0),
            quadrant(1.0, -1.0),
            quadrant(-1.0, 1.0),
            quadrant(1.0, 1.0),
        ]);

        // Items fully inside a quadrant move down; straddlers stay here.
        let items = std::mem::take(&mut self.items);
        for (key, bounds) in items {
            match children.iter_mut().find(|c| c.bounds.contains(&bounds)) {
                Some(child) => child.items.push((key, bounds)),
                None => self.items.push((key, bounds)),
            }
        }

        self.children = Some(children);
    }

    fn insert(&mut self, key: K, bounds: BoundingArea, config: &QuadTreeConfig) {
        if self.is_leaf() {
            let should_subdivide = self.items.len() >= config.max_items_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size
                && self.bounds.extents().y > config.min_node_size;

            if !should_subdivide {
                self.items.push((key, bounds));
                return;
            }
            self.subdivide();
        }

        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&bounds)) {
                child.insert(key, bounds, config);
                return;
            }
        }

        // Straddles a boundary or exceeds this node; keep it here so the
        // query stays conservative.
        self.items.push((key, bounds));
    }

    fn query(&self, area: &BoundingArea, results: &mut Vec<K>) {
        for (key, bounds) in &self.items {
            if bounds.intersects(area) {
                results.push(*key);
            }
        }

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.intersects(area) {
                    child.query(area, results);
                }
            }
        }
    }
}

/// Rebuildable quad tree over keyed bounding areas.
///
/// Items outside the root bounds are retained at the root node rather
/// than dropped; culling must remain conservative even when the world
/// outgrows the configured bounds.
#[derive(Debug)]
pub struct QuadTree<K> {
    root: QuadTreeNode<K>,
    config: QuadTreeConfig,
    len: usize,
}

impl<K: Copy + PartialEq> QuadTree<K> {
    /// Create a new quad tree covering the given world bounds
    pub fn new(world_bounds: BoundingArea, config: QuadTreeConfig) -> Self {
        Self {
            root: QuadTreeNode::new(world_bounds, 0),
            config,
            len: 0,
        }
    }

    /// Insert an item keyed by its bounding area
    pub fn insert(&mut self, key: K, bounds: BoundingArea) {
        self.root.insert(key, bounds, &self.config);
        self.len += 1;
    }

    /// Collect every item whose bounding area intersects the query area
    pub fn query(&self, area: &BoundingArea) -> Vec<K> {
        let mut results = Vec::new();
        self.root.query(area, &mut results);
        results
    }

    /// Total number of items in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove all items, keeping the world bounds
    pub fn clear(&mut self) {
        self.root = QuadTreeNode::new(self.root.bounds, 0);
        self.len = 0;
    }
}
