use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "strongbox", about = "Wallet management API")]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long)]
    pub settings: Option<String>,
}
