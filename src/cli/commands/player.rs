//! Player CLI commands.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::{AccountFullKarma, AccountId, AccountKarma, AccountListing, Config, PlayerRecord};
use crate::infrastructure::setup::AppContext;

#[derive(Args, Debug)]
pub struct PlayerArgs {
    #[command(subcommand)]
    pub command: PlayerCommands,
}

#[derive(Subcommand, Debug)]
pub enum PlayerCommands {
    /// Show a player, refreshing it from upstream when stale
    Get {
        /// Account id
        id: AccountId,
    },
    /// Show stored karma for several players (never contacts upstream)
    Karma {
        /// Account ids
        #[arg(required = true)]
        ids: Vec<AccountId>,
        /// Include performance, teamplay and courtesy ratings
        #[arg(long)]
        full: bool,
    },
    /// Search upstream accounts by nickname
    Search {
        /// Nickname prefix, at least three characters
        query: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct PlayerOutput {
    pub id: AccountId,
    pub username: String,
    pub hidden: bool,
    pub account_created_at: Option<DateTime<Utc>>,
    pub last_battle_at: Option<DateTime<Utc>>,
    pub karma: i32,
    pub performance: i32,
    pub teamplay: i32,
    pub courtesy: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<&PlayerRecord> for PlayerOutput {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            hidden: record.hidden,
            account_created_at: record.account_created_at,
            last_battle_at: record.last_battle_at,
            karma: record.site_karma,
            performance: record.performance_rating,
            teamplay: record.teamplay_rating,
            courtesy: record.courtesy_rating,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PlayerLookupOutput {
    pub requested: AccountId,
    pub player: Option<PlayerOutput>,
}

fn format_optional_time(t: Option<DateTime<Utc>>) -> String {
    t.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
}

impl CommandOutput for PlayerLookupOutput {
    fn to_human(&self) -> String {
        let Some(player) = &self.player else {
            return format!("Player {} not available.", self.requested);
        };

        let mut lines = vec![
            format!("Player: {}", player.username),
            format!("ID: {}", player.id),
        ];
        if player.hidden {
            lines.push("Profile: hidden".to_string());
        }
        lines.push(format!("Karma: {}", player.karma));
        lines.push(format!(
            "Ratings: performance {}, teamplay {}, courtesy {}",
            player.performance, player.teamplay, player.courtesy
        ));
        lines.push(format!("Account created: {}", format_optional_time(player.account_created_at)));
        lines.push(format!("Last battle: {}", format_optional_time(player.last_battle_at)));
        lines.push(format!("Synced: {}", player.updated_at.format("%Y-%m-%d %H:%M:%S UTC")));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct KarmaListOutput {
    pub players: Vec<AccountKarma>,
    pub total: usize,
}

impl CommandOutput for KarmaListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "karma"]);
        for p in &self.players {
            table.add_row(vec![Cell::new(p.id), Cell::new(p.site_karma)]);
        }
        render_list("player", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct FullKarmaListOutput {
    pub players: Vec<AccountFullKarma>,
    pub total: usize,
}

impl CommandOutput for FullKarmaListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "karma", "performance", "teamplay", "courtesy"]);
        for p in &self.players {
            table.add_row(vec![
                Cell::new(p.id),
                Cell::new(p.site_karma),
                Cell::new(p.performance),
                Cell::new(p.teamplay),
                Cell::new(p.courtesy),
            ]);
        }
        render_list("player", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub players: Vec<AccountListing>,
    pub total: usize,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "nickname"]);
        for p in &self.players {
            table.add_row(vec![Cell::new(p.id), Cell::new(&p.username)]);
        }
        render_list("match", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PlayerArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    match args.command {
        PlayerCommands::Get { id } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let record = ctx.sync.get_player_until_cancelled(id, &cancel).await;
            watcher.abort();

            let out = PlayerLookupOutput {
                requested: id,
                player: record.as_ref().map(PlayerOutput::from),
            };
            output(&out, json_mode);
        }
        PlayerCommands::Karma { ids, full } => {
            if full {
                let players = ctx.directory.get_players_full_karma(&ids).await?;
                let out = FullKarmaListOutput { total: players.len(), players };
                output(&out, json_mode);
            } else {
                let players = ctx.directory.get_players_karma(&ids).await?;
                let out = KarmaListOutput { total: players.len(), players };
                output(&out, json_mode);
            }
        }
        PlayerCommands::Search { query } => {
            let players = ctx.directory.list_players(&query).await.unwrap_or_default();
            let out = SearchOutput { total: players.len(), query, players };
            output(&out, json_mode);
        }
    }

    Ok(())
}
