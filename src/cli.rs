use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "medcycle", version, about = "Surplus medicine marketplace backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// SQLite database file, created on first start.
        #[arg(long, default_value = "marketplace.db")]
        db: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_match_the_original_bind() {
        let cli = Cli::parse_from(["medcycle", "serve"]);
        let Commands::Serve { host, port, db } = cli.command;
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 5000);
        assert_eq!(db, PathBuf::from("marketplace.db"));
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::parse_from(["medcycle", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        let Commands::Serve { host, port, .. } = cli.command;
        assert_eq!(host, "0.0.0.0");
        assert_eq!(port, 8080);
    }
}
