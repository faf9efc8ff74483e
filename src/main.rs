use clap::{Parser, Subcommand};
use fred_mcp::Result;
use fred_mcp::commands::{list_tools, serve_mcp};
use fred_mcp::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "fred-mcp")]
#[command(about = "An MCP server exposing FRED economic data as tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the FRED connection and server settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start MCP server on stdio
    Serve,
    /// List the tools the server exposes
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout is the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Serve => {
            serve_mcp().await?;
        }
        Commands::Tools => {
            list_tools()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["fred-mcp", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Serve));
        }
    }

    #[test]
    fn tools_command() {
        let cli = Cli::try_parse_from(["fred-mcp", "tools"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Tools));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["fred-mcp", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn config_defaults_to_interactive() {
        let cli = Cli::try_parse_from(["fred-mcp", "config"]);

        if let Ok(Cli {
            command: Commands::Config { show },
        }) = cli
        {
            assert!(!show);
        } else {
            panic!("config should parse");
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["fred-mcp", "add", "https://example.com"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["fred-mcp", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
