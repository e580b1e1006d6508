//! Command-line surface.
//!
//! `statdash` with no subcommand opens the dashboard. The other subcommands
//! run a single exchange against the backend and print the result, which is
//! handy for scripting and for checking a backend without a terminal UI.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use statdash_client::{DashboardApi, HttpDashboardClient};
use statdash_protocol::{FilterCriteria, FilterField, CHAT_FAILURE_TEXT};

use crate::chat_widget::ChatWidget;
use crate::config::DashboardConfig;
use crate::console;
use crate::filter_panel::FilterPanel;
use crate::logging::{init_logging, LogTarget};

#[derive(Parser, Debug)]
#[command(name = "statdash")]
#[command(version)]
#[command(about = "Filter survey microdata and chat with the statdash backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a config file (default: <config dir>/statdash/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = "STATDASH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Log filter directive, e.g. `debug` or `statdash_client=trace`
    #[arg(long, env = "STATDASH_LOG", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Console,
    /// Run one filter query and print the result table
    Filter(FilterArgs),
    /// Send one chat message and print the reply
    Chat {
        /// Message text; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Check that the backend is reachable
    Ping,
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    #[arg(long)]
    pub state_name: Option<String>,
    #[arg(long)]
    pub district_name: Option<String>,
    /// Rural or Urban
    #[arg(long)]
    pub sector: Option<String>,
    #[arg(long)]
    pub religion: Option<String>,
    /// SC, ST, OBC or General
    #[arg(long)]
    pub social_group: Option<String>,
    /// 1-2, 3-4, 5-6 or 7+
    #[arg(long)]
    pub household_size: Option<String>,
    #[arg(long)]
    pub panel: Option<String>,
    /// Q1 to Q4
    #[arg(long)]
    pub quarter: Option<String>,
    #[arg(long)]
    pub visit: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        let values = [
            (FilterField::StateName, &self.state_name),
            (FilterField::DistrictName, &self.district_name),
            (FilterField::Sector, &self.sector),
            (FilterField::Religion, &self.religion),
            (FilterField::SocialGroup, &self.social_group),
            (FilterField::HouseholdSize, &self.household_size),
            (FilterField::Panel, &self.panel),
            (FilterField::Quarter, &self.quarter),
            (FilterField::Visit, &self.visit),
        ];
        for (field, value) in values {
            if let Some(value) = value {
                criteria.set(field, value.as_str());
            }
        }
        criteria
    }
}

/// Config file values with flag and environment overrides applied.
pub fn load_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.base_url.clone(), cli.log_level.clone());
    Ok(config)
}

/// Dispatch a parsed command line. Returns the process exit code.
pub async fn run(cli: Cli, config: DashboardConfig) -> anyhow::Result<i32> {
    let command = cli.command.unwrap_or(Command::Console);

    if let Command::Console = command {
        let target = match config.log_file() {
            Some(path) => LogTarget::File(path),
            None => LogTarget::Stderr,
        };
        init_logging(&config.logging.level, target)?;
        console::run_console(&config).await?;
        return Ok(0);
    }

    init_logging(&config.logging.level, LogTarget::Stderr)?;
    let client = HttpDashboardClient::new(&config.backend.base_url, config.request_timeout())?;
    let api: Arc<dyn DashboardApi> = Arc::new(client);
    let mut out = std::io::stdout().lock();

    match command {
        Command::Filter(args) => run_filter(api.as_ref(), &args.criteria(), &mut out).await,
        Command::Chat { message } => {
            run_chat(api.as_ref(), &config.chat.user_id, &message.join(" "), &mut out).await
        }
        Command::Ping => run_ping(api.as_ref(), &mut out).await,
        Command::Console => Ok(0),
    }
}

/// Submit `criteria` and print the table, or the error line on failure.
pub async fn run_filter(
    api: &dyn DashboardApi,
    criteria: &FilterCriteria,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    let mut panel = FilterPanel::new();
    for (field, value) in criteria.iter() {
        panel.set_field(field, value);
    }
    panel.submit(api).await;

    if let Some(error) = panel.error() {
        writeln!(out, "Error: {}", error)?;
        return Ok(1);
    }

    match panel.table() {
        Some(table) => {
            writeln!(out, "{}", table.to_plain_text())?;
            writeln!(out)?;
            writeln!(out, "Results ({} records)", panel.count())?;
        }
        None => writeln!(out, "No records matched.")?,
    }
    Ok(0)
}

/// Send one message and print the reply, or the fallback text on failure.
pub async fn run_chat(
    api: &dyn DashboardApi,
    user_id: &str,
    message: &str,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    let mut chat = ChatWidget::new(user_id, None);
    let Some(pending) = chat.begin_send(message) else {
        writeln!(out, "Nothing to send: message is empty")?;
        return Ok(2);
    };

    match pending.exchange(api).await {
        Ok(reply) => {
            writeln!(out, "{}", reply.response)?;
            Ok(0)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Chat request failed");
            writeln!(out, "{}", CHAT_FAILURE_TEXT)?;
            Ok(1)
        }
    }
}

pub async fn run_ping(api: &dyn DashboardApi, out: &mut impl Write) -> anyhow::Result<i32> {
    match api.welcome().await {
        Ok(welcome) => {
            writeln!(out, "Backend reachable: {}", welcome.message)?;
            Ok(0)
        }
        Err(e) => {
            writeln!(out, "Backend unreachable: {}", e)?;
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_console() {
        let cli = Cli::try_parse_from(["statdash"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn filter_flags_map_to_criteria() {
        let cli = Cli::try_parse_from([
            "statdash",
            "filter",
            "--state-name",
            "Kerala",
            "--visit",
            "Visit 2",
        ])
        .unwrap();
        let Some(Command::Filter(args)) = cli.command else {
            panic!("expected filter subcommand");
        };
        let criteria = args.criteria();
        assert_eq!(
            criteria.query_pairs(),
            vec![("state_name", "Kerala"), ("visit", "Visit 2")]
        );
    }

    #[test]
    fn empty_flag_value_is_not_sent() {
        let args = FilterArgs {
            sector: Some(String::new()),
            ..FilterArgs::default()
        };
        assert!(args.criteria().is_empty());
    }

    #[test]
    fn chat_words_are_collected() {
        let cli = Cli::try_parse_from(["statdash", "chat", "how", "many", "households"]).unwrap();
        let Some(Command::Chat { message }) = cli.command else {
            panic!("expected chat subcommand");
        };
        assert_eq!(message.join(" "), "how many households");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["statdash", "ping", "--base-url", "http://10.0.0.5:8000"])
            .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.5:8000"));
    }
}
