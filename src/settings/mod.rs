//! Layered settings: a TOML file chosen by build profile or `--settings`, then
//! `STRONGBOX_*` environment overrides. See `bin/settings_demo.rs`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
