//! Belt-network feasibility via bounded-flow reduction to max-flow.
//!
//! The input is a directed graph with per-edge flow bounds `[lo, hi]`,
//! optional per-node throughput caps, and signed per-node supplies. The
//! engine reduces it to a plain max-flow instance in four stages: eliminate
//! the lower bounds (each edge keeps `hi - lo` of capacity and its `lo`
//! moves into a per-node imbalance), split capacitated transshipment nodes
//! into an entry/exit pair joined by an internal edge, attach a super-source
//! and super-sink sized by each node's requirement, then run max-flow. The
//! routing is feasible exactly when the whole demand gets through; otherwise
//! the saturated frontier of the residual graph is the certificate.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::maxflow::{EdgeHandle, FlowNetwork};
use crate::models::{BeltsInput, BeltsOutput, EdgeEndpoints, EdgeFlow};
use crate::{clamp_small_negative, TOLERANCE};

/// Solve the bounded-flow routing problem.
pub fn solve_belts(input: &BeltsInput) -> SolverResult<BeltsOutput> {
    validate(input)?;
    let reduction = Reduction::build(input);
    Ok(reduction.solve())
}

/// Entry/exit ports of a node in the transformed graph. Both are the same
/// index for unsplit nodes.
#[derive(Debug, Clone, Copy)]
struct Ports {
    entry: usize,
    exit: usize,
}

impl Ports {
    fn split(&self) -> bool {
        self.entry != self.exit
    }
}

/// One arc of the transformed graph, aggregating parallel input edges.
struct ArcGroup {
    tail: usize,
    head: usize,
    capacity: f64,
    handle: EdgeHandle,
}

struct Reduction<'a> {
    input: &'a BeltsInput,
    ports: Vec<Ports>,
    source: usize,
    sink: usize,
    graph: FlowNetwork,
    /// Internal capacity edge per split node.
    internal: Vec<Option<EdgeHandle>>,
    /// Aggregated arcs in first-occurrence order.
    groups: Vec<ArcGroup>,
    /// Group index per input edge.
    edge_group: Vec<usize>,
    total_demand: f64,
}

impl<'a> Reduction<'a> {
    fn build(input: &'a BeltsInput) -> Self {
        let node_position: HashMap<&str, usize> = input
            .nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id.as_str(), position))
            .collect();

        // Capacitated transshipment nodes split in two; sources and sinks
        // keep a single port, so a cap on them is inert.
        let mut next_index = 0usize;
        let ports: Vec<Ports> = input
            .nodes
            .iter()
            .map(|node| {
                let split = node.cap.is_some() && node.supply.abs() <= TOLERANCE;
                let entry = next_index;
                let exit = if split { next_index + 1 } else { next_index };
                next_index = exit + 1;
                Ports { entry, exit }
            })
            .collect();
        let source = next_index;
        let sink = next_index + 1;
        let mut graph = FlowNetwork::new(next_index + 2);

        let mut internal = vec![None; input.nodes.len()];
        for (position, node) in input.nodes.iter().enumerate() {
            if ports[position].split() {
                let cap = node.cap.unwrap_or(f64::INFINITY);
                internal[position] =
                    Some(graph.add_edge(ports[position].entry, ports[position].exit, cap));
            }
        }

        // Aggregate parallel edges into one transformed arc per port pair,
        // with reduced capacity hi - lo.
        let mut group_of_pair: HashMap<(usize, usize), usize> = HashMap::new();
        let mut groups: Vec<(usize, usize, f64)> = Vec::new();
        let mut edge_group = Vec::with_capacity(input.edges.len());
        for edge in &input.edges {
            let tail = ports[node_position[edge.from.as_str()]].exit;
            let head = ports[node_position[edge.to.as_str()]].entry;
            let group_index = *group_of_pair.entry((tail, head)).or_insert_with(|| {
                groups.push((tail, head, 0.0));
                groups.len() - 1
            });
            groups[group_index].2 += edge.hi - edge.lo;
            edge_group.push(group_index);
        }
        let groups: Vec<ArcGroup> = groups
            .into_iter()
            .map(|(tail, head, capacity)| ArcGroup {
                tail,
                head,
                capacity,
                handle: graph.add_edge(tail, head, capacity),
            })
            .collect();

        // Requirement(v) = imbalance forced by the lower bounds plus the
        // signed supply.
        let mut requirement: Vec<f64> = input.nodes.iter().map(|node| node.supply).collect();
        for edge in &input.edges {
            requirement[node_position[edge.to.as_str()]] += edge.lo;
            requirement[node_position[edge.from.as_str()]] -= edge.lo;
        }

        let mut total_demand = 0.0;
        for (position, value) in requirement.iter().enumerate() {
            if *value > TOLERANCE {
                graph.add_edge(source, ports[position].entry, *value);
                total_demand += *value;
            } else if *value < -TOLERANCE {
                graph.add_edge(ports[position].exit, sink, -*value);
            }
        }

        Reduction {
            input,
            ports,
            source,
            sink,
            graph,
            internal,
            groups,
            edge_group,
            total_demand,
        }
    }

    fn solve(mut self) -> BeltsOutput {
        let achieved = self.graph.max_flow(self.source, self.sink);
        debug!(
            nodes = self.input.nodes.len(),
            edges = self.input.edges.len(),
            transformed_nodes = self.graph.node_count(),
            demand = self.total_demand,
            achieved,
            "belt network solved"
        );

        if achieved >= self.total_demand - TOLERANCE {
            BeltsOutput::Ok {
                flows: self.reconstruct_flows(),
            }
        } else {
            self.certificate(achieved)
        }
    }

    /// Recover per-edge flows: add each edge's `lo` back, and split an
    /// aggregated arc's flow over its parallel members greedily in input
    /// order, filling each edge's headroom before moving on.
    fn reconstruct_flows(&self) -> Vec<EdgeFlow> {
        let mut remaining: Vec<f64> = self
            .groups
            .iter()
            .map(|group| self.graph.flow(group.handle).max(0.0))
            .collect();

        self.input
            .edges
            .iter()
            .zip(&self.edge_group)
            .map(|(edge, group_index)| {
                let headroom = edge.hi - edge.lo;
                let share = remaining[*group_index].min(headroom);
                remaining[*group_index] -= share;
                EdgeFlow {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    flow: clamp_small_negative(edge.lo + share),
                }
            })
            .collect()
    }

    fn certificate(&self, achieved: f64) -> BeltsOutput {
        let reachable = self.graph.residual_reachable(self.source);

        let cut_reachable = self
            .input
            .nodes
            .iter()
            .zip(&self.ports)
            .filter(|(_, ports)| reachable[ports.entry] || reachable[ports.exit])
            .map(|(node, _)| node.id.clone())
            .collect();

        let tight_nodes = self
            .input
            .nodes
            .iter()
            .enumerate()
            .filter(|(position, _)| {
                let ports = self.ports[*position];
                match self.internal[*position] {
                    Some(handle) => {
                        reachable[ports.entry]
                            && !reachable[ports.exit]
                            && self.graph.residual(handle) <= TOLERANCE
                    }
                    None => false,
                }
            })
            .map(|(_, node)| node.id.clone())
            .collect();

        let tight_edges = self
            .input
            .edges
            .iter()
            .zip(&self.edge_group)
            .filter(|(_, group_index)| {
                let group = &self.groups[**group_index];
                reachable[group.tail]
                    && !reachable[group.head]
                    && self.graph.residual(group.handle) <= TOLERANCE
            })
            .map(|(edge, _)| EdgeEndpoints {
                from: edge.from.clone(),
                to: edge.to.clone(),
            })
            .collect();

        BeltsOutput::Infeasible {
            cut_reachable,
            tight_nodes,
            tight_edges,
            deficit: clamp_small_negative(self.total_demand - achieved),
        }
    }
}

fn validate(input: &BeltsInput) -> SolverResult<()> {
    let invalid = |message: String| Err(SolverError::InvalidInput(message));

    let mut seen = std::collections::BTreeSet::new();
    for node in &input.nodes {
        if !seen.insert(node.id.as_str()) {
            return invalid(format!("duplicate node id {:?}", node.id));
        }
        if !node.supply.is_finite() {
            return invalid(format!("node {:?} has non-finite supply", node.id));
        }
        if let Some(cap) = node.cap {
            if !cap.is_finite() || cap < 0.0 {
                return invalid(format!("node {:?} has invalid cap {}", node.id, cap));
            }
        }
    }

    for edge in &input.edges {
        for endpoint in [&edge.from, &edge.to] {
            if !seen.contains(endpoint.as_str()) {
                return invalid(format!(
                    "edge {} -> {} references unknown node {:?}",
                    edge.from, edge.to, endpoint
                ));
            }
        }
        if !edge.lo.is_finite() || edge.lo < 0.0 {
            return invalid(format!(
                "edge {} -> {} has invalid lower bound {}",
                edge.from, edge.to, edge.lo
            ));
        }
        if !edge.hi.is_finite() || edge.hi < edge.lo {
            return invalid(format!(
                "edge {} -> {} has upper bound {} below lower bound {}",
                edge.from, edge.to, edge.hi, edge.lo
            ));
        }
    }

    Ok(())
}
