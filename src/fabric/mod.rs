pub mod downstream;
pub mod error;
pub mod links;
pub mod node;
pub mod params;
pub mod policy;
pub mod report;
pub mod topology;
pub mod types;

pub use downstream::assign_downstream;
pub use error::FabricError;
pub use links::{build_ext_links, build_links, build_routers, ExtLink, Link, Router};
pub use node::{build_nodes, Node};
pub use params::TopologyParams;
pub use policy::{annotate_policies, CacheGeometry, CachesConfig, HomeNodeOpts, NodePolicy};
pub use report::stats_layout;
pub use topology::{assemble, Topology};
pub use types::{
    ClusterId, LinkId, NodeId, NodeKind, VirtualNetwork, NUM_VIRTUAL_NETWORKS,
};
