use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ircscrub", version, about = "Sanitizing relay for IRC")]
pub struct Cli {
    /// Upstream server as host:port (overrides config file setting)
    pub upstream: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Listen address (overrides config file setting)
    #[arg(long)]
    pub listen: Option<String>,

    /// Connect to the upstream without TLS
    #[arg(long)]
    pub plaintext_upstream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_is_positional() {
        let cli = Cli::parse_from(["ircscrub", "irc.example.net:6697"]);
        assert_eq!(cli.upstream.as_deref(), Some("irc.example.net:6697"));
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(!cli.plaintext_upstream);
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "ircscrub",
            "--config",
            "/etc/ircscrub.yaml",
            "--listen",
            "127.0.0.1:7000",
            "--plaintext-upstream",
        ]);
        assert!(cli.upstream.is_none());
        assert_eq!(cli.listen.as_deref(), Some("127.0.0.1:7000"));
        assert!(cli.plaintext_upstream);
    }
}
