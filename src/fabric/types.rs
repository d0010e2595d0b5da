use serde::Serialize;

pub type NodeId = usize;
pub type LinkId = usize;
pub type ClusterId = usize;

/// Message classes sharing the physical link topology. Every link carries
/// all four; the backend multiplexes them as virtual networks 0..=3.
pub const NUM_VIRTUAL_NETWORKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualNetwork {
    Request,
    Snoop,
    Response,
    Data,
}

impl VirtualNetwork {
    pub const ALL: [VirtualNetwork; NUM_VIRTUAL_NETWORKS] = [
        VirtualNetwork::Request,
        VirtualNetwork::Snoop,
        VirtualNetwork::Response,
        VirtualNetwork::Data,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    PrivateL1D,
    PrivateL1I,
    SharedL2,
    SharedL3,
    MemoryController,
    DmaRequestor,
}

impl NodeKind {
    /// Nodes that hold cache lines and need a cache organization.
    pub fn has_cache(&self) -> bool {
        !matches!(self, NodeKind::MemoryController | NodeKind::DmaRequestor)
    }

    /// Home-level nodes resolve ownership for the addresses they cover and
    /// maintain inclusion over their children.
    pub fn is_home_level(&self) -> bool {
        matches!(self, NodeKind::SharedL2 | NodeKind::SharedL3)
    }

    /// Requesters originate transactions (cores through their L1s, DMA).
    pub fn is_requester(&self) -> bool {
        matches!(
            self,
            NodeKind::PrivateL1D | NodeKind::PrivateL1I | NodeKind::DmaRequestor
        )
    }

    /// Terminal nodes never forward misses further down.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::MemoryController)
    }

    /// Position in the cache hierarchy, increasing toward memory. The
    /// downstream relation must strictly increase this level, which is what
    /// keeps the miss/eviction graph acyclic.
    pub fn hierarchy_level(&self) -> u8 {
        match self {
            NodeKind::PrivateL1D | NodeKind::PrivateL1I | NodeKind::DmaRequestor => 0,
            NodeKind::SharedL2 => 1,
            NodeKind::SharedL3 => 2,
            NodeKind::MemoryController => 3,
        }
    }
}
