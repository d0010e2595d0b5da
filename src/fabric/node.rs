use serde::Serialize;
use smallvec::SmallVec;

use crate::fabric::error::FabricError;
use crate::fabric::params::TopologyParams;
use crate::fabric::policy::NodePolicy;
use crate::fabric::types::{ClusterId, NodeId, NodeKind};

/// A coherence-capable entity in the fabric. Indices are assigned at
/// registration and never reused; all later wiring addresses nodes by
/// index arithmetic, so registration order is part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub index: NodeId,
    pub kind: NodeKind,
    /// Which L2 cluster this node belongs to. Only meaningful for private
    /// L1s and L2 slices.
    pub cluster_id: Option<ClusterId>,
    pub label: String,
    /// Nodes this one forwards misses/evictions to, in priority order.
    /// Empty for terminal nodes.
    pub downstream: SmallVec<[NodeId; 2]>,
    pub policy: NodePolicy,
}

impl Node {
    fn new(index: NodeId, kind: NodeKind, cluster_id: Option<ClusterId>, label: String) -> Self {
        Self {
            index,
            kind,
            cluster_id,
            label,
            downstream: SmallVec::new(),
            policy: NodePolicy::default(),
        }
    }
}

/// Enumerate every coherence node in fixed index order: split L1 pair per
/// core (dcache first), one L2 slice per cluster, the single L3, one
/// memory controller per channel, then any DMA requestors.
pub fn build_nodes(params: &TopologyParams) -> Result<Vec<Node>, FabricError> {
    params.validate()?;

    let mut nodes = Vec::with_capacity(params.total_nodes());

    for core in 0..params.num_cores {
        let cluster = params.cluster_of_core(core);
        nodes.push(Node::new(
            params.dcache_index(core),
            NodeKind::PrivateL1D,
            Some(cluster),
            format!("core_clusters[{core}].dcache"),
        ));
        nodes.push(Node::new(
            params.icache_index(core),
            NodeKind::PrivateL1I,
            Some(cluster),
            format!("core_clusters[{core}].icache"),
        ));
    }

    for cluster in 0..params.num_clusters() {
        nodes.push(Node::new(
            params.l2_index(cluster),
            NodeKind::SharedL2,
            Some(cluster),
            format!("l2caches[{cluster}]"),
        ));
    }

    nodes.push(Node::new(
        params.l3_index(),
        NodeKind::SharedL3,
        None,
        "l3cache".to_string(),
    ));

    for channel in 0..params.num_mem_channels {
        nodes.push(Node::new(
            params.mem_index(channel),
            NodeKind::MemoryController,
            None,
            format!("mem_ctrls[{channel}]"),
        ));
    }

    for port in 0..params.num_dma_ports {
        nodes.push(Node::new(
            params.dma_index(port),
            NodeKind::DmaRequestor,
            None,
            format!("dma_requestors[{port}]"),
        ));
    }

    debug_assert_eq!(nodes.len(), params.total_nodes());
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_params() -> TopologyParams {
        TopologyParams {
            num_cores: 2,
            cores_per_cluster: 1,
            num_mem_channels: 1,
            num_dma_ports: 0,
        }
    }

    #[test]
    fn registry_emits_kinds_in_index_order() {
        let nodes = build_nodes(&example_params()).unwrap();
        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::PrivateL1D,
                NodeKind::PrivateL1I,
                NodeKind::PrivateL1D,
                NodeKind::PrivateL1I,
                NodeKind::SharedL2,
                NodeKind::SharedL2,
                NodeKind::SharedL3,
                NodeKind::MemoryController,
            ]
        );
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let params = TopologyParams {
            num_cores: 8,
            cores_per_cluster: 4,
            num_mem_channels: 2,
            num_dma_ports: 2,
        };
        let nodes = build_nodes(&params).unwrap();
        assert_eq!(nodes.len(), params.total_nodes());
        for (position, node) in nodes.iter().enumerate() {
            assert_eq!(node.index, position);
        }
    }

    #[test]
    fn cluster_ids_follow_core_grouping() {
        let params = TopologyParams {
            num_cores: 4,
            cores_per_cluster: 2,
            num_mem_channels: 1,
            num_dma_ports: 0,
        };
        let nodes = build_nodes(&params).unwrap();
        assert_eq!(nodes[0].cluster_id, Some(0)); // core 0 dcache
        assert_eq!(nodes[3].cluster_id, Some(0)); // core 1 icache
        assert_eq!(nodes[4].cluster_id, Some(1)); // core 2 dcache
        assert_eq!(nodes[params.l2_index(0)].cluster_id, Some(0));
        assert_eq!(nodes[params.l2_index(1)].cluster_id, Some(1));
        assert_eq!(nodes[params.l3_index()].cluster_id, None);
    }

    #[test]
    fn dma_requestors_sit_after_memory_controllers() {
        let params = TopologyParams {
            num_dma_ports: 2,
            ..example_params()
        };
        let nodes = build_nodes(&params).unwrap();
        assert_eq!(nodes[params.dma_index(0)].kind, NodeKind::DmaRequestor);
        assert_eq!(nodes[params.dma_index(1)].kind, NodeKind::DmaRequestor);
        assert_eq!(nodes[params.dma_index(0)].label, "dma_requestors[0]");
    }

    #[test]
    fn no_node_is_built_for_invalid_parameters() {
        let params = TopologyParams {
            num_cores: 4,
            cores_per_cluster: 3,
            ..TopologyParams::default()
        };
        assert!(matches!(
            build_nodes(&params),
            Err(FabricError::Configuration(_))
        ));
    }

    #[test]
    fn labels_follow_the_stats_naming_scheme() {
        let nodes = build_nodes(&example_params()).unwrap();
        assert_eq!(nodes[0].label, "core_clusters[0].dcache");
        assert_eq!(nodes[1].label, "core_clusters[0].icache");
        assert_eq!(nodes[4].label, "l2caches[0]");
        assert_eq!(nodes[6].label, "l3cache");
        assert_eq!(nodes[7].label, "mem_ctrls[0]");
    }
}
