/*
Per-kind coherence behavior templates.

Every node carries a fixed template of CHI behavior flags selected by its
kind. These are protocol-correctness parameters, not tuning knobs: the
allocation/deallocation/back-invalidation flags decide whether the emulated
protocol maintains inclusion at all, so the templates are reproduced exactly
per kind. Cache geometry and the home-node optimization switches come from
the [caches] config section and are passed through uninterpreted.
*/

use serde::{Deserialize, Serialize};

use crate::fabric::node::Node;
use crate::fabric::types::NodeKind;
use crate::sim::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    pub size_bytes: u64,
    pub assoc: u32,
    pub line_bytes: u32,
}

/// Coherence behavior parameters attached to a single node. Handed to the
/// execution backend unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodePolicy {
    /// Cache organization; absent for non-caching nodes (memory
    /// controllers, DMA requestors).
    pub cache: Option<CacheGeometry>,

    // Whether a line is allocated locally on each access type.
    pub alloc_on_seq_acc: bool,
    pub alloc_on_seq_line_write: bool,
    pub alloc_on_readshared: bool,
    pub alloc_on_readunique: bool,
    pub alloc_on_readonce: bool,
    pub alloc_on_writeback: bool,
    pub alloc_on_atomic: bool,

    // Whether the node evicts on relinquishing unique/shared ownership.
    pub dealloc_on_unique: bool,
    pub dealloc_on_shared: bool,

    // Inclusion enforcement: a child's eviction/downgrade back-invalidates
    // the line here instead of the home node evicting on its own.
    pub dealloc_backinv_unique: bool,
    pub dealloc_backinv_shared: bool,

    /// L1 requesters notify downstream on eviction; home levels do not.
    pub send_evictions: bool,

    // Outstanding-transaction buffer sizing. The DVM counts must stay at
    // least 1 even when the node never receives DVM traffic.
    pub num_tbes: u32,
    pub num_repl_tbes: u32,
    pub num_snoop_tbes: u32,
    pub num_dvm_tbes: u32,
    pub num_dvm_snoop_tbes: u32,
    pub unify_repl_tbes: bool,

    // Home-node role and three-hop protocol optimizations.
    pub is_hn: bool,
    pub enable_dmt: bool,
    pub enable_dct: bool,
    pub allow_sd: bool,

    // Timing parameters in cycles. Carried through to the backend; they
    // affect reported performance, never topology correctness.
    pub read_hit_latency: u32,
    pub read_miss_latency: u32,
    pub atomic_op_latency: u32,
    pub write_fe_latency: u32,
    pub write_be_latency: u32,
    pub fill_latency: u32,
    pub snp_latency: u32,
    pub snp_inv_latency: u32,
}

impl Default for NodePolicy {
    /// Inert placeholder used between registration and annotation. Keeps
    /// the DVM minimums so a default policy is never protocol-invalid.
    fn default() -> Self {
        Self {
            cache: None,
            alloc_on_seq_acc: false,
            alloc_on_seq_line_write: false,
            alloc_on_readshared: false,
            alloc_on_readunique: false,
            alloc_on_readonce: false,
            alloc_on_writeback: false,
            alloc_on_atomic: false,
            dealloc_on_unique: false,
            dealloc_on_shared: false,
            dealloc_backinv_unique: false,
            dealloc_backinv_shared: false,
            send_evictions: false,
            num_tbes: 1,
            num_repl_tbes: 1,
            num_snoop_tbes: 1,
            num_dvm_tbes: 1,
            num_dvm_snoop_tbes: 1,
            unify_repl_tbes: false,
            is_hn: false,
            enable_dmt: false,
            enable_dct: false,
            allow_sd: false,
            read_hit_latency: 0,
            read_miss_latency: 0,
            atomic_op_latency: 0,
            write_fe_latency: 0,
            write_be_latency: 0,
            fill_latency: 0,
            snp_latency: 0,
            snp_inv_latency: 0,
        }
    }
}

/// Per-level home-node optimization switches, overridable from the config
/// file. `is_hn` itself is structural and stays fixed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HomeNodeOpts {
    pub enable_dmt: bool,
    pub enable_dct: bool,
    pub allow_sd: bool,
}

impl Default for HomeNodeOpts {
    fn default() -> Self {
        Self {
            enable_dmt: false,
            enable_dct: false,
            allow_sd: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CachesConfig {
    pub cache_line_bytes: u32,
    pub l1_size: u64,
    pub l1_assoc: u32,
    pub l2_size: u64,
    pub l2_assoc: u32,
    pub l3_size: u64,
    pub l3_assoc: u32,
    pub l2_home: HomeNodeOpts,
    pub l3_home: HomeNodeOpts,
}

impl Config for CachesConfig {}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            cache_line_bytes: 64,
            l1_size: 16 << 10,  // 16 KiB
            l1_assoc: 8,
            l2_size: 1 << 20,   // 1 MiB
            l2_assoc: 16,
            l3_size: 16 << 20,  // 16 MiB
            l3_assoc: 32,
            l2_home: HomeNodeOpts::default(),
            l3_home: HomeNodeOpts::default(),
        }
    }
}

impl NodePolicy {
    /// The fixed behavior template for a node kind, with geometry and
    /// home-node switches filled in from the config.
    pub fn template_for(kind: NodeKind, cfg: &CachesConfig) -> NodePolicy {
        match kind {
            NodeKind::PrivateL1D | NodeKind::PrivateL1I => Self::private_l1(cfg),
            NodeKind::SharedL2 => Self::shared_l2(cfg),
            NodeKind::SharedL3 => Self::shared_l3(cfg),
            NodeKind::MemoryController => Self::memory_controller(),
            NodeKind::DmaRequestor => Self::dma_requestor(),
        }
    }

    /// MOESI requester at the core. Exclusive for unique lines, evicts
    /// noisily so the home level can track inclusion.
    fn private_l1(cfg: &CachesConfig) -> NodePolicy {
        NodePolicy {
            cache: Some(CacheGeometry {
                size_bytes: cfg.l1_size,
                assoc: cfg.l1_assoc,
                line_bytes: cfg.cache_line_bytes,
            }),
            alloc_on_seq_acc: true,
            alloc_on_seq_line_write: false,
            alloc_on_readshared: true,
            alloc_on_readunique: true,
            alloc_on_readonce: true,
            alloc_on_writeback: true,
            alloc_on_atomic: true,
            dealloc_on_unique: false,
            dealloc_on_shared: false,
            dealloc_backinv_unique: true,
            dealloc_backinv_shared: true,
            send_evictions: true,
            num_tbes: 16,
            num_repl_tbes: 16,
            num_snoop_tbes: 4,
            num_dvm_tbes: 16,
            num_dvm_snoop_tbes: 4,
            unify_repl_tbes: false,
            is_hn: false,
            enable_dmt: false,
            enable_dct: false,
            allow_sd: true,
            read_hit_latency: 1,
            read_miss_latency: 2,
            atomic_op_latency: 1,
            write_fe_latency: 1,
            write_be_latency: 1,
            fill_latency: 1,
            snp_latency: 1,
            snp_inv_latency: 1,
        }
    }

    /// Home-level slice shared by a cluster. Mostly inclusive for shared
    /// lines, exclusive for unique.
    fn shared_l2(cfg: &CachesConfig) -> NodePolicy {
        NodePolicy {
            cache: Some(CacheGeometry {
                size_bytes: cfg.l2_size,
                assoc: cfg.l2_assoc,
                line_bytes: cfg.cache_line_bytes,
            }),
            alloc_on_seq_acc: true,
            alloc_on_seq_line_write: true,
            alloc_on_readshared: true,
            alloc_on_readunique: true,
            alloc_on_readonce: true,
            alloc_on_writeback: true,
            alloc_on_atomic: true,
            // No dealloc on ownership changes: evicting and reallocating on
            // the same request races with concurrent requests to the line.
            dealloc_on_unique: false,
            dealloc_on_shared: false,
            // Inclusion is maintained by child evictions/downgrades.
            dealloc_backinv_unique: true,
            dealloc_backinv_shared: true,
            send_evictions: false,
            num_tbes: 32,
            num_repl_tbes: 32,
            num_snoop_tbes: 1,
            num_dvm_tbes: 1,
            num_dvm_snoop_tbes: 1,
            unify_repl_tbes: false,
            is_hn: false,
            enable_dmt: cfg.l2_home.enable_dmt,
            enable_dct: cfg.l2_home.enable_dct,
            allow_sd: cfg.l2_home.allow_sd,
            read_hit_latency: 12,
            read_miss_latency: 14,
            atomic_op_latency: 12,
            write_fe_latency: 12,
            write_be_latency: 12,
            fill_latency: 12,
            snp_latency: 12,
            snp_inv_latency: 12,
        }
    }

    /// The single home node proper. Same inclusion discipline as the L2
    /// slices, with a deeper transaction buffer pool.
    fn shared_l3(cfg: &CachesConfig) -> NodePolicy {
        NodePolicy {
            cache: Some(CacheGeometry {
                size_bytes: cfg.l3_size,
                assoc: cfg.l3_assoc,
                line_bytes: cfg.cache_line_bytes,
            }),
            is_hn: true,
            enable_dmt: cfg.l3_home.enable_dmt,
            enable_dct: cfg.l3_home.enable_dct,
            allow_sd: cfg.l3_home.allow_sd,
            num_tbes: 64,
            num_repl_tbes: 64,
            read_hit_latency: 20,
            read_miss_latency: 24,
            atomic_op_latency: 20,
            write_fe_latency: 20,
            write_be_latency: 20,
            fill_latency: 20,
            snp_latency: 16,
            snp_inv_latency: 16,
            ..Self::shared_l2(cfg)
        }
    }

    /// Terminal node fronting one memory channel. Holds no lines; the TBE
    /// pool bounds outstanding memory transactions.
    fn memory_controller() -> NodePolicy {
        NodePolicy {
            num_tbes: 32,
            ..NodePolicy::default()
        }
    }

    /// Non-caching requester for DMA traffic.
    fn dma_requestor() -> NodePolicy {
        NodePolicy {
            num_tbes: 16,
            ..NodePolicy::default()
        }
    }
}

/// Attach the per-kind template to every node. Runs after downstream and
/// link assignment; the last mutation a node sees before assembly.
pub fn annotate_policies(nodes: &mut [Node], cfg: &CachesConfig) {
    for node in nodes {
        node.policy = NodePolicy::template_for(node.kind, cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_l2_template_keeps_inclusion_discipline() {
        let cfg = CachesConfig::default();
        let policy = NodePolicy::template_for(NodeKind::SharedL2, &cfg);

        assert!(policy.alloc_on_seq_acc);
        assert!(policy.alloc_on_seq_line_write);
        assert!(policy.alloc_on_readshared);
        assert!(policy.alloc_on_readunique);
        assert!(policy.alloc_on_readonce);
        assert!(policy.alloc_on_writeback);
        assert!(policy.alloc_on_atomic);

        assert!(!policy.dealloc_on_unique);
        assert!(!policy.dealloc_on_shared);
        assert!(policy.dealloc_backinv_unique);
        assert!(policy.dealloc_backinv_shared);

        assert_eq!(policy.num_tbes, 32);
        assert_eq!(policy.num_repl_tbes, 32);
        assert_eq!(policy.num_snoop_tbes, 1);
        assert_eq!(policy.read_hit_latency, 12);
        assert_eq!(policy.read_miss_latency, 14);

        assert!(!policy.is_hn);
        assert!(!policy.enable_dmt);
        assert!(policy.allow_sd);
    }

    #[test]
    fn only_the_l3_is_the_home_node_proper() {
        let cfg = CachesConfig::default();
        for kind in [
            NodeKind::PrivateL1D,
            NodeKind::PrivateL1I,
            NodeKind::SharedL2,
            NodeKind::MemoryController,
            NodeKind::DmaRequestor,
        ] {
            assert!(!NodePolicy::template_for(kind, &cfg).is_hn, "{kind:?}");
        }
        assert!(NodePolicy::template_for(NodeKind::SharedL3, &cfg).is_hn);
    }

    #[test]
    fn dvm_buffers_never_drop_below_one() {
        let cfg = CachesConfig::default();
        for kind in [
            NodeKind::PrivateL1D,
            NodeKind::PrivateL1I,
            NodeKind::SharedL2,
            NodeKind::SharedL3,
            NodeKind::MemoryController,
            NodeKind::DmaRequestor,
        ] {
            let policy = NodePolicy::template_for(kind, &cfg);
            assert!(policy.num_dvm_tbes >= 1, "{kind:?}");
            assert!(policy.num_dvm_snoop_tbes >= 1, "{kind:?}");
        }
    }

    #[test]
    fn only_private_caches_send_evictions() {
        let cfg = CachesConfig::default();
        assert!(NodePolicy::template_for(NodeKind::PrivateL1D, &cfg).send_evictions);
        assert!(NodePolicy::template_for(NodeKind::PrivateL1I, &cfg).send_evictions);
        assert!(!NodePolicy::template_for(NodeKind::SharedL2, &cfg).send_evictions);
        assert!(!NodePolicy::template_for(NodeKind::SharedL3, &cfg).send_evictions);
    }

    #[test]
    fn geometry_passes_through_uninterpreted() {
        let cfg = CachesConfig {
            l1_size: 32 << 10,
            l1_assoc: 4,
            cache_line_bytes: 128,
            ..CachesConfig::default()
        };
        let l1 = NodePolicy::template_for(NodeKind::PrivateL1I, &cfg);
        let geo = l1.cache.expect("private caches carry a geometry");
        assert_eq!(geo.size_bytes, 32 << 10);
        assert_eq!(geo.assoc, 4);
        assert_eq!(geo.line_bytes, 128);

        let mc = NodePolicy::template_for(NodeKind::MemoryController, &cfg);
        assert!(mc.cache.is_none());
        let dma = NodePolicy::template_for(NodeKind::DmaRequestor, &cfg);
        assert!(dma.cache.is_none());
    }

    #[test]
    fn home_node_switches_are_overridable() {
        let cfg = CachesConfig {
            l3_home: HomeNodeOpts {
                enable_dmt: true,
                enable_dct: true,
                allow_sd: false,
            },
            ..CachesConfig::default()
        };
        let l3 = NodePolicy::template_for(NodeKind::SharedL3, &cfg);
        assert!(l3.enable_dmt);
        assert!(l3.enable_dct);
        assert!(!l3.allow_sd);

        // The L2 switches stay at their own defaults.
        let l2 = NodePolicy::template_for(NodeKind::SharedL2, &cfg);
        assert!(!l2.enable_dmt);
        assert!(l2.allow_sd);
    }
}
