mod cli;

use anyhow::Result;
use clap::Parser;

use aula_core::config::Config;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults based on --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "aula=trace,aula_server=trace,aula_db=debug,aula_core=debug,tower_http=debug".to_string()
        } else {
            "aula=debug,aula_server=debug,aula_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Starting aula server");

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(aula_server::start(config))?;
            Ok(())
        }
        Commands::Validate { config } => {
            let path = config.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::HashPassword { password } => {
            let hash = aula_server::middleware::auth::hash_password(&password)?;
            println!("{hash}");
            Ok(())
        }
        Commands::GenerateSecret => {
            println!("{}", aula_server::signer::generate_secret());
            Ok(())
        }
        Commands::Version => {
            println!("aula {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {p:?}");
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            println!("Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Auth enabled: {}", config.auth.enabled);
            println!("  Session TTL: {}s", config.media.session_ttl_secs);
            println!("  Media storage: {}", config.media.storage_dir.display());
            for warning in config.validate() {
                println!("  warning: {warning}");
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
