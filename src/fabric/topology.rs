use log::info;
use serde::Serialize;

use crate::fabric::downstream::assign_downstream;
use crate::fabric::error::FabricError;
use crate::fabric::links::{build_ext_links, build_links, build_routers, ExtLink, Link, Router};
use crate::fabric::node::{build_nodes, Node};
use crate::fabric::params::TopologyParams;
use crate::fabric::policy::{annotate_policies, CachesConfig};
use crate::fabric::types::{NodeKind, NUM_VIRTUAL_NETWORKS};

/// The assembled fabric: ordered nodes, their routers, and the link graph,
/// ready to hand whole to the execution backend. Immutable once built;
/// reconfiguration means rebuilding from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub params: TopologyParams,
    pub nodes: Vec<Node>,
    pub routers: Vec<Router>,
    pub ext_links: Vec<ExtLink>,
    pub links: Vec<Link>,
    pub num_virtual_networks: usize,
    pub num_sequencers: usize,
}

/// Build the whole hierarchy in order: registry, downstream assignment,
/// router/link graph, policy annotation, then whole-graph validation.
/// Fails fast with a descriptive error rather than returning a partially
/// wired graph: a malformed topology handed to a backend shows up as
/// protocol deadlock or silent coherence loss, not as a clean error.
pub fn assemble(params: &TopologyParams, caches: &CachesConfig) -> Result<Topology, FabricError> {
    params.validate()?;

    let mut nodes = build_nodes(params)?;
    assign_downstream(&mut nodes, params)?;
    annotate_policies(&mut nodes, caches);

    let routers = build_routers(&nodes);
    let ext_links = build_ext_links(&nodes);
    let links = build_links(params);

    let topology = Topology {
        params: *params,
        nodes,
        routers,
        ext_links,
        links,
        num_virtual_networks: NUM_VIRTUAL_NETWORKS,
        num_sequencers: params.num_sequencers(),
    };
    topology.validate()?;

    info!(
        "assembled coherence fabric: {} nodes ({} cores in {} clusters), {} links, {} mem channels, {} dma ports",
        topology.nodes.len(),
        params.num_cores,
        params.num_clusters(),
        topology.links.len(),
        params.num_mem_channels,
        params.num_dma_ports
    );
    Ok(topology)
}

impl Topology {
    /// Whole-graph validation. Any failure here is a builder bug: the
    /// construction paths above cannot legitimately produce one.
    pub fn validate(&self) -> Result<(), FabricError> {
        self.check_node_indices()?;
        self.check_routers()?;
        self.check_downstream()?;
        self.check_links()?;
        self.check_reachability()?;

        if self.num_virtual_networks != NUM_VIRTUAL_NETWORKS {
            return Err(FabricError::invariant(format!(
                "expected {NUM_VIRTUAL_NETWORKS} virtual networks, found {}",
                self.num_virtual_networks
            )));
        }
        if self.num_sequencers != self.params.num_sequencers() {
            return Err(FabricError::invariant(format!(
                "sequencer count {} does not match parameters",
                self.num_sequencers
            )));
        }
        Ok(())
    }

    fn check_node_indices(&self) -> Result<(), FabricError> {
        if self.nodes.len() != self.params.total_nodes() {
            return Err(FabricError::invariant(format!(
                "expected {} nodes, found {}",
                self.params.total_nodes(),
                self.nodes.len()
            )));
        }
        for (position, node) in self.nodes.iter().enumerate() {
            if node.index != position {
                return Err(FabricError::invariant(format!(
                    "node {} sits at position {position}",
                    node.index
                )));
            }
        }
        Ok(())
    }

    fn check_routers(&self) -> Result<(), FabricError> {
        if self.routers.len() != self.nodes.len() || self.ext_links.len() != self.nodes.len() {
            return Err(FabricError::invariant(
                "routers and ext links must be 1:1 with nodes",
            ));
        }
        for node in &self.nodes {
            if self.routers[node.index].id != node.index {
                return Err(FabricError::invariant(format!(
                    "router id mismatch at node {}",
                    node.index
                )));
            }
            let ext = &self.ext_links[node.index];
            if ext.node != node.index || ext.router != node.index {
                return Err(FabricError::invariant(format!(
                    "ext link mismatch at node {}",
                    node.index
                )));
            }
        }
        Ok(())
    }

    fn check_downstream(&self) -> Result<(), FabricError> {
        let params = &self.params;
        let l3 = params.l3_index();
        for node in &self.nodes {
            let down = node.downstream.as_slice();
            match node.kind {
                NodeKind::PrivateL1D | NodeKind::PrivateL1I => {
                    let cluster = node.cluster_id.ok_or_else(|| {
                        FabricError::invariant(format!("{} has no cluster", node.label))
                    })?;
                    if down != [params.l2_index(cluster)] {
                        return Err(FabricError::invariant(format!(
                            "{} must forward to its cluster L2, found {down:?}",
                            node.label
                        )));
                    }
                }
                NodeKind::SharedL2 => {
                    if down != [l3] {
                        return Err(FabricError::invariant(format!(
                            "{} must forward to the L3, found {down:?}",
                            node.label
                        )));
                    }
                }
                NodeKind::SharedL3 => {
                    let expected: Vec<_> =
                        (0..params.num_mem_channels).map(|m| params.mem_index(m)).collect();
                    if down != expected.as_slice() {
                        return Err(FabricError::invariant(format!(
                            "l3cache must fan out to all memory channels in order, found {down:?}"
                        )));
                    }
                }
                NodeKind::MemoryController => {
                    if !down.is_empty() {
                        return Err(FabricError::invariant(format!(
                            "{} is terminal but forwards to {down:?}",
                            node.label
                        )));
                    }
                }
                NodeKind::DmaRequestor => {
                    if down != [l3] {
                        return Err(FabricError::invariant(format!(
                            "{} must forward to the L3, found {down:?}",
                            node.label
                        )));
                    }
                }
            }
            // The hierarchy level must strictly increase along every
            // downstream edge; this is what keeps the miss graph acyclic.
            for &target in down {
                let target = self.nodes.get(target).ok_or_else(|| {
                    FabricError::invariant(format!(
                        "{} forwards to nonexistent node {target}",
                        node.label
                    ))
                })?;
                if target.kind.hierarchy_level() <= node.kind.hierarchy_level() {
                    return Err(FabricError::invariant(format!(
                        "{} forwards sideways or upward to {}",
                        node.label, target.label
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_links(&self) -> Result<(), FabricError> {
        if self.links.len() != self.params.total_links() {
            return Err(FabricError::invariant(format!(
                "expected {} links, found {}",
                self.params.total_links(),
                self.links.len()
            )));
        }
        for (position, link) in self.links.iter().enumerate() {
            if link.id != position + 1 {
                return Err(FabricError::invariant(format!(
                    "link ids must be contiguous from 1, found {} at position {position}",
                    link.id
                )));
            }
            if link.src >= self.nodes.len() || link.dst >= self.nodes.len() {
                return Err(FabricError::invariant(format!(
                    "link {} connects nonexistent routers {}->{}",
                    link.id, link.src, link.dst
                )));
            }
            if link.src == link.dst {
                return Err(FabricError::invariant(format!(
                    "link {} is a self-loop on router {}",
                    link.id, link.src
                )));
            }
        }
        Ok(())
    }

    /// Every requester must reach a memory controller by following
    /// downstream pointers; with levels strictly descending the walk is
    /// bounded by the hierarchy depth.
    fn check_reachability(&self) -> Result<(), FabricError> {
        for node in self.nodes.iter().filter(|n| n.kind.is_requester()) {
            let mut frontier = vec![node.index];
            let mut reached_memory = false;
            while let Some(current) = frontier.pop() {
                let current = &self.nodes[current];
                if current.kind.is_terminal() {
                    reached_memory = true;
                    break;
                }
                frontier.extend(current.downstream.iter().copied());
            }
            if !reached_memory {
                return Err(FabricError::invariant(format!(
                    "{} cannot reach a memory controller",
                    node.label
                )));
            }
        }
        Ok(())
    }
}
