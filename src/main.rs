use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use log::info;
use toml::Table;

use coheron::fabric::{assemble, stats_layout, CachesConfig, TopologyParams};
use coheron::sim::config::{Config, EmitMode, SimConfig};

#[derive(Parser)]
#[command(version, about)]
struct CoheronArgs {
    #[arg(help = "Path to config.toml; built-in defaults are used if omitted")]
    config_path: Option<PathBuf>,
    #[arg(long, help = "Override total number of cores")]
    num_cores: Option<usize>,
    #[arg(long, help = "Override number of cores sharing an L2 cluster")]
    cores_per_cluster: Option<usize>,
    #[arg(long, help = "Override number of memory channels")]
    mem_channels: Option<usize>,
    #[arg(long, help = "Override number of DMA ports")]
    dma_ports: Option<usize>,
    #[arg(long, help = "What to emit: topology or stats_layout")]
    emit: Option<String>,
    #[arg(long, help = "Write the emitted JSON to this path instead of stdout")]
    output: Option<PathBuf>,
}

pub fn main() -> Result<()> {
    env_logger::init();

    let argv = CoheronArgs::parse();

    let (sim_config, mut params, caches) = match &argv.config_path {
        Some(path) => {
            let raw = fs::read_to_string(path).unwrap_or_else(|err| {
                eprintln!("failed to read config file: {}", err);
                std::process::exit(1);
            });
            let config_table: Table = toml::from_str(&raw).expect("cannot parse config toml");
            (
                SimConfig::from_section(config_table.get("sim")),
                TopologyParams::from_section(config_table.get("fabric")),
                CachesConfig::from_section(config_table.get("caches")),
            )
        }
        None => (
            SimConfig::default(),
            TopologyParams::default(),
            CachesConfig::default(),
        ),
    };

    // override toml configs with argv
    params.num_cores = argv.num_cores.unwrap_or(params.num_cores);
    params.cores_per_cluster = argv.cores_per_cluster.unwrap_or(params.cores_per_cluster);
    params.num_mem_channels = argv.mem_channels.unwrap_or(params.num_mem_channels);
    params.num_dma_ports = argv.dma_ports.unwrap_or(params.num_dma_ports);

    let emit = match &argv.emit {
        Some(raw) => EmitMode::from_str(raw).map_err(anyhow::Error::msg)?,
        None => sim_config.emit,
    };

    let topology = assemble(&params, &caches)?;

    let value = match emit {
        EmitMode::Topology => serde_json::to_value(&topology)?,
        EmitMode::StatsLayout => stats_layout(&topology),
    };
    let rendered = serde_json::to_string_pretty(&value)?;

    let output = argv.output.unwrap_or(sim_config.output);
    if output.as_os_str().is_empty() {
        println!("{rendered}");
    } else {
        fs::write(&output, rendered)?;
        info!("wrote {emit:?} for {} nodes to {}", topology.nodes.len(), output.display());
    }

    Ok(())
}
