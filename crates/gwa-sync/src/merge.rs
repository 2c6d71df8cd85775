//! Coincident node lookup for the write pass.

use std::collections::HashMap;

use gwa_model::{Handle, Node, Vec3};

type Cell = (i64, i64, i64);

/// Spatial index over the node collection of a write operation.
///
/// Positions are bucketed into cubic cells one tolerance wide, so a lookup
/// only inspects the 27 cells around the query point. When several nodes lie within
/// tolerance the earliest inserted one wins.
#[derive(Debug, Clone)]
pub struct NodeIndex {
    tolerance: f64,
    cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
    /// Handles of explicit nodes folded into an earlier coincident node.
    aliases: HashMap<Handle, Handle>,
    /// Application ids of folded nodes, with the index of the survivor.
    folded_ids: HashMap<String, usize>,
    /// Whether the node at each index has been given its handle.
    assigned: Vec<bool>,
}

impl NodeIndex {
    /// Indexes `nodes`, folding every node that is coincident with an earlier
    /// one into it. Folded nodes are removed from the collection.
    pub fn build(nodes: &mut Vec<Node>, tolerance: f64) -> Self {
        let mut index = Self {
            tolerance,
            cell_size: tolerance.max(1e-9),
            cells: HashMap::new(),
            aliases: HashMap::new(),
            folded_ids: HashMap::new(),
            assigned: Vec::new(),
        };

        let mut kept: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes.drain(..) {
            match index.find(&kept, &node.position) {
                Some(survivor) => {
                    let target = &mut kept[survivor];
                    if !target.header.handle.is_set() {
                        target.header.handle = node.header.handle;
                    } else if node.header.handle.is_set() && node.header.handle != target.header.handle {
                        index.aliases.insert(node.header.handle, target.header.handle);
                    }
                    if let Some(id) = &node.header.application_id
                        && target.header.application_id.as_deref() != Some(id.as_str())
                    {
                        index.folded_ids.insert(id.clone(), survivor);
                    }
                    log::debug!(
                        "folding node {} into coincident node {}",
                        node.header.handle,
                        target.header.handle
                    );
                    target.merge(&node);
                }
                None => {
                    index.insert(kept.len(), &node.position);
                    kept.push(node);
                }
            }
        }
        *nodes = kept;
        index
    }

    fn cell(&self, position: &Vec3) -> Cell {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }

    /// Index of the earliest node within tolerance of `position`.
    pub fn find(&self, nodes: &[Node], position: &Vec3) -> Option<usize> {
        let (cx, cy, cz) = self.cell(position);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        if best.is_some_and(|b| b <= i) {
                            continue;
                        }
                        if nodes[i].distance_to(position) <= self.tolerance {
                            best = Some(i);
                        }
                    }
                }
            }
        }
        best
    }

    pub fn insert(&mut self, index: usize, position: &Vec3) {
        let cell = self.cell(position);
        self.cells.entry(cell).or_default().push(index);
        if self.assigned.len() <= index {
            self.assigned.resize(index + 1, false);
        }
    }

    /// Survivor handle for a handle that may have been folded.
    pub fn canonical(&self, handle: Handle) -> Handle {
        self.aliases.get(&handle).copied().unwrap_or(handle)
    }

    pub fn folded_id(&self, application_id: &str) -> Option<usize> {
        self.folded_ids.get(application_id).copied()
    }

    pub fn is_assigned(&self, index: usize) -> bool {
        self.assigned.get(index).copied().unwrap_or(false)
    }

    pub fn mark_assigned(&mut self, index: usize) {
        if self.assigned.len() <= index {
            self.assigned.resize(index + 1, false);
        }
        self.assigned[index] = true;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_explicit_nodes_fold_into_the_first() {
        let mut first = Node::new(1, 0.0, 0.0, 0.0);
        first.restraint.x = true;
        first.mass = 1.0;
        let mut second = Node::new(2, 0.0005, 0.0, 0.0);
        second.restraint.y = true;
        second.mass = 2.0;
        let mut nodes = vec![first, Node::new(3, 5.0, 0.0, 0.0), second];

        let index = NodeIndex::build(&mut nodes, 1e-3);
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].restraint.x && nodes[0].restraint.y);
        assert_eq!(nodes[0].mass, 3.0);
        assert_eq!(index.canonical(Handle(2)), Handle(1));
        assert_eq!(index.canonical(Handle(3)), Handle(3));
    }

    #[test]
    fn first_inserted_match_wins() {
        // Both nodes lie within tolerance of the query point; the nearer one was
        // inserted second.
        let mut nodes = vec![Node::new(1, 0.0, 0.0, 0.0), Node::new(2, 1.5, 0.0, 0.0)];
        let index = NodeIndex::build(&mut nodes, 1.0);
        assert_eq!(nodes.len(), 2);
        assert_eq!(index.find(&nodes, &Vec3::new(0.9, 0.0, 0.0)), Some(0));
        assert_eq!(index.find(&nodes, &Vec3::new(2.4, 0.0, 0.0)), Some(1));
        assert_eq!(index.find(&nodes, &Vec3::new(4.0, 0.0, 0.0)), None);
    }

    #[test]
    fn nodes_across_cell_boundaries_are_found() {
        let mut nodes = vec![Node::new(1, 0.0099, 0.0, 0.0)];
        let index = NodeIndex::build(&mut nodes, 0.01);
        assert_eq!(index.find(&nodes, &Vec3::new(0.0101, 0.0, 0.0)), Some(0));
    }
}
