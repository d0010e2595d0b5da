use serde_json::{json, Value};

use crate::fabric::topology::Topology;

/// Naming map for the statistics boundary. The execution backend emits its
/// counters keyed by node name; external tooling locates nodes by position
/// using this scheme: `l3cache`, `core_clusters[i].{dcache,icache}`, and
/// each private cache's single downstream entry aliased as `l2_cache`.
pub fn stats_layout(topology: &Topology) -> Value {
    let params = &topology.params;

    let core_clusters: Vec<Value> = (0..params.num_cores)
        .map(|core| {
            let dcache = &topology.nodes[params.dcache_index(core)];
            // The shared L2 is not named directly in reports; stats tooling
            // reaches it through the private cache's downstream alias.
            let l2_cache = dcache.downstream[0];
            json!({
                "dcache": dcache.index,
                "icache": params.icache_index(core),
                "l2_cache": l2_cache,
            })
        })
        .collect();

    json!({
        "l3cache": params.l3_index(),
        "core_clusters": core_clusters,
        "mem_ctrls": (0..params.num_mem_channels)
            .map(|m| params.mem_index(m))
            .collect::<Vec<_>>(),
        "dma_requestors": (0..params.num_dma_ports)
            .map(|p| params.dma_index(p))
            .collect::<Vec<_>>(),
    })
}
