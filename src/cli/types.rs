//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::init::InitArgs;
use crate::cli::commands::player::PlayerArgs;

#[derive(Parser, Debug)]
#[command(name = "karma-sync")]
#[command(about = "karma-sync - player karma records cached from the upstream account API", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database under .karma/
    Init(InitArgs),

    /// Player lookups
    Player(PlayerArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::player::PlayerCommands;

    #[test]
    fn test_parse_player_karma() {
        let cli = Cli::parse_from(["karma-sync", "player", "karma", "1", "2", "3", "--full", "--json"]);
        assert!(cli.json);
        match cli.command {
            Commands::Player(PlayerArgs { command: PlayerCommands::Karma { ids, full } }) => {
                assert_eq!(ids, vec![1, 2, 3]);
                assert!(full);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_negative_id_is_rejected() {
        assert!(Cli::try_parse_from(["karma-sync", "player", "get", "-5"]).is_err());
    }

    #[test]
    fn test_init_force() {
        let cli = Cli::parse_from(["karma-sync", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(InitArgs { force: true, .. })));
    }
}
