//! Deterministic max-flow over real-valued capacities.
//!
//! Dinic's algorithm: breadth-first level assignment followed by blocking
//! flow with per-node scan pointers. Adjacency lists keep insertion order
//! and the searches scan them in that order, so a fixed edge-insertion
//! order yields a fixed flow assignment. Residual capacities below the
//! crate tolerance count as exhausted, which keeps the augmentation loop
//! from chasing round-off slivers.

use std::collections::VecDeque;

use crate::TOLERANCE;

#[derive(Debug, Clone)]
struct Arc {
    to: usize,
    capacity: f64,
    flow: f64,
    rev: usize,
}

/// Identifies a forward edge so callers can read its flow after solving.
#[derive(Debug, Clone, Copy)]
pub struct EdgeHandle {
    node: usize,
    index: usize,
}

#[derive(Debug, Clone)]
pub struct FlowNetwork {
    adjacency: Vec<Vec<Arc>>,
}

impl FlowNetwork {
    pub fn new(node_count: usize) -> Self {
        FlowNetwork {
            adjacency: vec![Vec::new(); node_count],
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Add a directed edge and its zero-capacity reverse twin.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) -> EdgeHandle {
        let forward_index = self.adjacency[from].len();
        // A self-loop places both twins in the same list, one slot apart.
        let reverse_index = if from == to {
            forward_index + 1
        } else {
            self.adjacency[to].len()
        };

        self.adjacency[from].push(Arc {
            to,
            capacity,
            flow: 0.0,
            rev: reverse_index,
        });
        self.adjacency[to].push(Arc {
            to: from,
            capacity: 0.0,
            flow: 0.0,
            rev: forward_index,
        });

        EdgeHandle {
            node: from,
            index: forward_index,
        }
    }

    /// Flow currently routed through the edge.
    pub fn flow(&self, handle: EdgeHandle) -> f64 {
        self.adjacency[handle.node][handle.index].flow
    }

    /// Remaining capacity on the edge.
    pub fn residual(&self, handle: EdgeHandle) -> f64 {
        let arc = &self.adjacency[handle.node][handle.index];
        arc.capacity - arc.flow
    }

    pub fn max_flow(&mut self, source: usize, sink: usize) -> f64 {
        let n = self.node_count();
        let mut total = 0.0;
        let mut level = vec![-1i64; n];

        while self.assign_levels(source, sink, &mut level) {
            let mut scan = vec![0usize; n];
            loop {
                let pushed = self.blocking_flow(source, sink, &level, f64::INFINITY, &mut scan);
                if pushed <= TOLERANCE {
                    break;
                }
                total += pushed;
            }
        }
        total
    }

    /// Nodes reachable from `source` through positive residual capacity.
    pub fn residual_reachable(&self, source: usize) -> Vec<bool> {
        let mut reachable = vec![false; self.node_count()];
        reachable[source] = true;
        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for arc in &self.adjacency[u] {
                if arc.capacity - arc.flow > TOLERANCE && !reachable[arc.to] {
                    reachable[arc.to] = true;
                    queue.push_back(arc.to);
                }
            }
        }
        reachable
    }

    fn assign_levels(&self, source: usize, sink: usize, level: &mut [i64]) -> bool {
        level.fill(-1);
        level[source] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for arc in &self.adjacency[u] {
                if arc.capacity - arc.flow > TOLERANCE && level[arc.to] == -1 {
                    level[arc.to] = level[u] + 1;
                    queue.push_back(arc.to);
                }
            }
        }
        level[sink] != -1
    }

    fn blocking_flow(
        &mut self,
        u: usize,
        sink: usize,
        level: &[i64],
        limit: f64,
        scan: &mut [usize],
    ) -> f64 {
        if u == sink {
            return limit;
        }
        while scan[u] < self.adjacency[u].len() {
            let i = scan[u];
            let (residual, to, rev) = {
                let arc = &self.adjacency[u][i];
                (arc.capacity - arc.flow, arc.to, arc.rev)
            };

            if residual > TOLERANCE && level[to] == level[u] + 1 {
                let pushed = self.blocking_flow(to, sink, level, limit.min(residual), scan);
                if pushed > TOLERANCE {
                    self.adjacency[u][i].flow += pushed;
                    self.adjacency[to][rev].flow -= pushed;
                    return pushed;
                }
            }
            scan[u] += 1;
        }
        0.0
    }
}
