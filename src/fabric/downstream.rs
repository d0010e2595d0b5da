use log::debug;

use crate::fabric::error::FabricError;
use crate::fabric::node::Node;
use crate::fabric::params::TopologyParams;
use crate::fabric::types::{NodeId, NodeKind};

/// Assign every node its downstream destinations, producing the strict
/// ownership tree for misses and evictions: each private L1 owns exactly
/// one path through its cluster's L2 slice, each L2 slice feeds the L3,
/// and only the L3 fans out (to the memory controllers, in channel order).
/// DMA requestors bypass the cache levels and go straight to the L3.
///
/// Each node's downstream set is written exactly once; memory controllers
/// stay terminal.
pub fn assign_downstream(nodes: &mut [Node], params: &TopologyParams) -> Result<(), FabricError> {
    let l3 = params.l3_index();
    expect_kind(nodes, l3, NodeKind::SharedL3)?;

    for core in 0..params.num_cores {
        let cluster = params.cluster_of_core(core);
        let l2 = params.l2_index(cluster);
        expect_cluster_l2(nodes, l2, cluster)?;
        set_downstream(&mut nodes[params.dcache_index(core)], &[l2]);
        set_downstream(&mut nodes[params.icache_index(core)], &[l2]);
    }

    for cluster in 0..params.num_clusters() {
        set_downstream(&mut nodes[params.l2_index(cluster)], &[l3]);
    }

    let mem_channels: Vec<NodeId> = (0..params.num_mem_channels)
        .map(|channel| params.mem_index(channel))
        .collect();
    for &mem in &mem_channels {
        expect_kind(nodes, mem, NodeKind::MemoryController)?;
    }
    set_downstream(&mut nodes[l3], &mem_channels);

    for port in 0..params.num_dma_ports {
        set_downstream(&mut nodes[params.dma_index(port)], &[l3]);
    }

    debug!(
        "downstream assignment: {} requesters -> {} clusters -> l3 -> {} channels",
        2 * params.num_cores,
        params.num_clusters(),
        params.num_mem_channels
    );
    Ok(())
}

fn set_downstream(node: &mut Node, targets: &[NodeId]) {
    debug_assert!(
        node.downstream.is_empty(),
        "downstream for {} assigned twice",
        node.label
    );
    node.downstream.extend(targets.iter().copied());
}

fn expect_kind(nodes: &[Node], index: NodeId, kind: NodeKind) -> Result<(), FabricError> {
    match nodes.get(index) {
        Some(node) if node.kind == kind => Ok(()),
        Some(node) => Err(FabricError::config(format!(
            "expected {kind:?} at index {index}, found {:?} ({})",
            node.kind, node.label
        ))),
        None => Err(FabricError::config(format!(
            "expected {kind:?} at index {index}, but only {} nodes exist",
            nodes.len()
        ))),
    }
}

fn expect_cluster_l2(nodes: &[Node], index: NodeId, cluster: usize) -> Result<(), FabricError> {
    expect_kind(nodes, index, NodeKind::SharedL2)?;
    if nodes[index].cluster_id != Some(cluster) {
        return Err(FabricError::config(format!(
            "L2 slice at index {index} belongs to cluster {:?}, expected {cluster}",
            nodes[index].cluster_id
        )));
    }
    Ok(())
}
