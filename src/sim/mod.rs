pub mod config;

pub use config::{Config, EmitMode, SimConfig};
