//! A small directed acyclic graph over node indices.
//!
//! Parent and child lists are kept sorted so that every traversal, and therefore every
//! learned structure, is deterministic.

use super::NetworkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
}

impl Dag {
    /// A graph with `n_nodes` nodes and no edges.
    pub fn empty(n_nodes: usize) -> Self {
        Self {
            parents: vec![Vec::new(); n_nodes],
            children: vec![Vec::new(); n_nodes],
        }
    }

    /// Builds a graph from an edge list, rejecting self-loops, duplicates and cycles.
    pub fn from_edges(n_nodes: usize, edges: &[(usize, usize)]) -> Result<Self, NetworkError> {
        let mut dag = Self::empty(n_nodes);
        for &(from, to) in edges {
            dag.add_edge(from, to)?;
        }
        Ok(dag)
    }

    pub fn n_nodes(&self) -> usize {
        self.parents.len()
    }

    pub fn parents(&self, node: usize) -> &[usize] {
        &self.parents[node]
    }

    pub fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.children[from].binary_search(&to).is_ok()
    }

    /// All edges, ordered by source then target.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.children
            .iter()
            .enumerate()
            .flat_map(|(from, kids)| kids.iter().map(move |&to| (from, to)))
            .collect()
    }

    pub fn n_edges(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<(), NetworkError> {
        let n = self.n_nodes();
        if from >= n || to >= n {
            return Err(NetworkError::NodeOutOfRange {
                node: from.max(to),
                n_nodes: n,
            });
        }
        if from == to || self.has_edge(from, to) || self.has_path(to, from) {
            return Err(NetworkError::InvalidEdge { from, to });
        }
        insert_sorted(&mut self.children[from], to);
        insert_sorted(&mut self.parents[to], from);
        Ok(())
    }

    pub fn remove_edge(&mut self, from: usize, to: usize) {
        if let Ok(pos) = self.children[from].binary_search(&to) {
            self.children[from].remove(pos);
        }
        if let Ok(pos) = self.parents[to].binary_search(&from) {
            self.parents[to].remove(pos);
        }
    }

    /// Whether a directed path `from ~> to` exists (a node reaches itself).
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        self.reaches(from, to, None)
    }

    /// Whether `to` is reachable from `from` without using the direct edge `from -> to`.
    pub fn has_indirect_path(&self, from: usize, to: usize) -> bool {
        self.reaches(from, to, Some((from, to)))
    }

    fn reaches(&self, from: usize, to: usize, skip: Option<(usize, usize)>) -> bool {
        let mut seen = vec![false; self.n_nodes()];
        let mut stack = vec![from];
        seen[from] = true;
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            for &next in &self.children[node] {
                if skip == Some((node, next)) || seen[next] {
                    continue;
                }
                seen[next] = true;
                stack.push(next);
            }
        }
        false
    }

    /// Marks every node in `roots` and all of their ancestors.
    pub fn ancestral_set(&self, roots: &[usize]) -> Vec<bool> {
        let mut marked = vec![false; self.n_nodes()];
        let mut stack: Vec<usize> = roots.to_vec();
        while let Some(node) = stack.pop() {
            if marked[node] {
                continue;
            }
            marked[node] = true;
            stack.extend(self.parents[node].iter().copied().filter(|&p| !marked[p]));
        }
        marked
    }
}

fn insert_sorted(list: &mut Vec<usize>, value: usize) {
    if let Err(pos) = list.binary_search(&value) {
        list.insert(pos, value);
    }
}
