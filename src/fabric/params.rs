/*
Structural parameters of the fabric, and the index arithmetic derived from
them.

Node indices are the wire contract toward the execution backend: routers,
links, and the stats tooling all address nodes by these integers rather than
by handle. Keeping the arithmetic in one place means the registry, the link
builder, and the validators can never disagree about where a node lives.

Index layout, in registration order:
    dcache(c)  = 2*c
    icache(c)  = 2*c + 1
    l2(g)      = 2*num_cores + g
    l3         = 2*num_cores + num_clusters
    mem(m)     = l3 + 1 + m
    dma(p)     = l3 + 1 + num_mem_channels + p
*/

use serde::{Deserialize, Serialize};

use crate::fabric::error::FabricError;
use crate::fabric::types::{ClusterId, NodeId};
use crate::sim::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyParams {
    pub num_cores: usize,
    pub cores_per_cluster: usize,
    pub num_mem_channels: usize,
    pub num_dma_ports: usize,
}

impl Config for TopologyParams {}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            num_cores: 4,
            cores_per_cluster: 1,
            num_mem_channels: 1,
            num_dma_ports: 0,
        }
    }
}

impl TopologyParams {
    /// Reject parameter sets that cannot produce a well-formed hierarchy.
    /// Runs before any node is built.
    pub fn validate(&self) -> Result<(), FabricError> {
        if self.num_cores == 0 {
            return Err(FabricError::config("num_cores must be at least 1"));
        }
        if self.cores_per_cluster == 0 {
            return Err(FabricError::config("cores_per_cluster must be at least 1"));
        }
        if self.num_cores % self.cores_per_cluster != 0 {
            return Err(FabricError::config(format!(
                "cores_per_cluster ({}) must evenly divide num_cores ({})",
                self.cores_per_cluster, self.num_cores
            )));
        }
        if self.num_mem_channels == 0 {
            return Err(FabricError::config("num_mem_channels must be at least 1"));
        }
        Ok(())
    }

    pub fn num_clusters(&self) -> usize {
        self.num_cores / self.cores_per_cluster
    }

    pub fn cluster_of_core(&self, core: usize) -> ClusterId {
        core / self.cores_per_cluster
    }

    pub fn dcache_index(&self, core: usize) -> NodeId {
        2 * core
    }

    pub fn icache_index(&self, core: usize) -> NodeId {
        2 * core + 1
    }

    pub fn l2_index(&self, cluster: ClusterId) -> NodeId {
        2 * self.num_cores + cluster
    }

    pub fn l3_index(&self) -> NodeId {
        2 * self.num_cores + self.num_clusters()
    }

    pub fn mem_index(&self, channel: usize) -> NodeId {
        self.l3_index() + 1 + channel
    }

    pub fn dma_index(&self, port: usize) -> NodeId {
        self.l3_index() + 1 + self.num_mem_channels + port
    }

    pub fn total_nodes(&self) -> usize {
        2 * self.num_cores + self.num_clusters() + 1 + self.num_mem_channels + self.num_dma_ports
    }

    /// Internal (router-to-router) link count: four per core, two per
    /// cluster, two per memory channel, two per DMA port.
    pub fn total_links(&self) -> usize {
        4 * self.num_cores
            + 2 * self.num_clusters()
            + 2 * self.num_mem_channels
            + 2 * self.num_dma_ports
    }

    /// The backend allocates one sequencer per private cache plus one per
    /// DMA requestor, and sizes its port array from this.
    pub fn num_sequencers(&self) -> usize {
        2 * self.num_cores + self.num_dma_ports
    }
}
