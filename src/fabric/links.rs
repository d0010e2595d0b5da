/*
Router and link construction.

One router per node, router id = node index. Every node attaches to its
router through an external link, and routers are joined by unidirectional
internal links in a fixed emission order:

    1. per core (increasing index): dcache->L2, icache->L2, L2->dcache,
       L2->icache
    2. per cluster: L2->L3, L3->L2
    3. per memory channel: L3->MC, MC->L3
    4. per DMA port: DMA->L3, L3->DMA

Internal link ids count up from 1 in exactly this order. The execution
backend addresses links positionally, so the sequence is part of the wire
contract: the same parameters must always reproduce the same ids.
*/

use serde::Serialize;

use crate::fabric::node::Node;
use crate::fabric::params::TopologyParams;
use crate::fabric::types::{LinkId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Router {
    pub id: NodeId,
}

/// Attachment of a node to its router. Ext link ids mirror node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtLink {
    pub id: LinkId,
    pub node: NodeId,
    pub router: NodeId,
}

/// Directed router-to-router edge. All four virtual networks share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub id: LinkId,
    pub src: NodeId,
    pub dst: NodeId,
}

pub fn build_routers(nodes: &[Node]) -> Vec<Router> {
    nodes.iter().map(|node| Router { id: node.index }).collect()
}

pub fn build_ext_links(nodes: &[Node]) -> Vec<ExtLink> {
    nodes
        .iter()
        .map(|node| ExtLink {
            id: node.index,
            node: node.index,
            router: node.index,
        })
        .collect()
}

/// Emit the internal link set. Pure index arithmetic over the parameters;
/// the node list is not consulted, which is what makes the id assignment
/// reproducible for a given parameter set.
pub fn build_links(params: &TopologyParams) -> Vec<Link> {
    let mut links = Vec::with_capacity(params.total_links());
    let mut link_count: LinkId = 0;
    let mut emit = |src: NodeId, dst: NodeId| {
        link_count += 1;
        links.push(Link {
            id: link_count,
            src,
            dst,
        });
    };

    let l3 = params.l3_index();

    for core in 0..params.num_cores {
        let l2 = params.l2_index(params.cluster_of_core(core));
        emit(params.dcache_index(core), l2);
        emit(params.icache_index(core), l2);
        emit(l2, params.dcache_index(core));
        emit(l2, params.icache_index(core));
    }

    for cluster in 0..params.num_clusters() {
        let l2 = params.l2_index(cluster);
        emit(l2, l3);
        emit(l3, l2);
    }

    for channel in 0..params.num_mem_channels {
        let mem = params.mem_index(channel);
        emit(l3, mem);
        emit(mem, l3);
    }

    for port in 0..params.num_dma_ports {
        let dma = params.dma_index(port);
        emit(dma, l3);
        emit(l3, dma);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::node::build_nodes;

    fn example_params() -> TopologyParams {
        TopologyParams {
            num_cores: 2,
            cores_per_cluster: 1,
            num_mem_channels: 1,
            num_dma_ports: 0,
        }
    }

    #[test]
    fn worked_example_emits_exact_link_sequence() {
        let links = build_links(&example_params());
        let expected: Vec<(LinkId, NodeId, NodeId)> = vec![
            // core 0 <-> its L2 slice (index 4)
            (1, 0, 4),
            (2, 1, 4),
            (3, 4, 0),
            (4, 4, 1),
            // core 1 <-> its L2 slice (index 5)
            (5, 2, 5),
            (6, 3, 5),
            (7, 5, 2),
            (8, 5, 3),
            // L2 slices <-> L3 (index 6)
            (9, 4, 6),
            (10, 6, 4),
            (11, 5, 6),
            (12, 6, 5),
            // L3 <-> memory controller (index 7)
            (13, 6, 7),
            (14, 7, 6),
        ];
        let actual: Vec<(LinkId, NodeId, NodeId)> =
            links.iter().map(|l| (l.id, l.src, l.dst)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn dma_links_append_after_memory_links() {
        let params = TopologyParams {
            num_dma_ports: 1,
            ..example_params()
        };
        let links = build_links(&params);
        assert_eq!(links.len(), 16);
        // DMA requestor sits at index 8: DMA->L3 first, then L3->DMA.
        assert_eq!((links[14].id, links[14].src, links[14].dst), (15, 8, 6));
        assert_eq!((links[15].id, links[15].src, links[15].dst), (16, 6, 8));
    }

    #[test]
    fn every_memory_channel_gets_its_link_pair() {
        let params = TopologyParams {
            num_mem_channels: 2,
            ..example_params()
        };
        let links = build_links(&params);
        assert_eq!(links.len(), 16);
        let l3 = params.l3_index();
        assert_eq!((links[12].src, links[12].dst), (l3, params.mem_index(0)));
        assert_eq!((links[13].src, links[13].dst), (params.mem_index(0), l3));
        assert_eq!((links[14].src, links[14].dst), (l3, params.mem_index(1)));
        assert_eq!((links[15].src, links[15].dst), (params.mem_index(1), l3));
    }

    #[test]
    fn link_ids_are_contiguous_from_one() {
        let params = TopologyParams {
            num_cores: 8,
            cores_per_cluster: 2,
            num_mem_channels: 2,
            num_dma_ports: 1,
        };
        let links = build_links(&params);
        assert_eq!(links.len(), params.total_links());
        for (position, link) in links.iter().enumerate() {
            assert_eq!(link.id, position + 1);
        }
    }

    #[test]
    fn routers_and_ext_links_mirror_node_indices() {
        let nodes = build_nodes(&example_params()).unwrap();
        let routers = build_routers(&nodes);
        let ext_links = build_ext_links(&nodes);
        assert_eq!(routers.len(), nodes.len());
        assert_eq!(ext_links.len(), nodes.len());
        for node in &nodes {
            assert_eq!(routers[node.index].id, node.index);
            assert_eq!(ext_links[node.index].node, node.index);
            assert_eq!(ext_links[node.index].router, node.index);
        }
    }
}
