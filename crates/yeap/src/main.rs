// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Yeap - realtime order desk for store operators.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod watch;

use clap::{Parser, Subcommand};
use yeap_config::YeapConfig;

/// Yeap - realtime order desk for store operators.
#[derive(Parser, Debug)]
#[command(name = "yeap", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Join a store and follow its orders and chats until interrupted.
    Watch {
        /// Store to join. Overrides `store.id` from the config file.
        #[arg(long)]
        store: Option<String>,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match yeap_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            yeap_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Watch { store }) => {
            if let Err(e) = watch::run_watch(config, store).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match render_config(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("error: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("yeap: use --help for available commands");
        }
    }
}

/// Renders the config as TOML with the API token masked.
fn render_config(config: &YeapConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.server.api_token.is_some() {
        shown.server.api_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = yeap_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.dashboard.log_level, "info");
        assert_eq!(config.orders.countdown_secs, 30);
    }

    #[test]
    fn rendered_config_masks_token() {
        let config = yeap_config::load_and_validate_str(
            r#"
[server]
api_token = "very-secret"
"#,
        )
        .unwrap();
        let text = render_config(&config).unwrap();
        assert!(!text.contains("very-secret"));
        assert!(text.contains("[redacted]"));
        assert!(text.contains("countdown_secs = 30"));
    }

    #[test]
    fn cli_parses_watch_with_store() {
        let cli = Cli::try_parse_from(["yeap", "watch", "--store", "S9"]).unwrap();
        match cli.command {
            Some(Commands::Watch { store }) => assert_eq!(store.as_deref(), Some("S9")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
