use clap::Parser;

#[derive(Parser)]
#[command(name = "webcrawl", about = "Bounded parallel web crawler with an HTTP control surface")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Override the bind host from the config file
    #[arg(long)]
    pub host: Option<String>,

    /// Override the bind port from the config file
    #[arg(long)]
    pub port: Option<u16>,
}
