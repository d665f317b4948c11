mod api;
mod app;
mod config;
mod loader;
mod metrics;
mod theme;
mod ui;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::{json, Value};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::types::UserId;
use api::ApiClient;
use app::{App, Popup};
use config::AppConfig;
use metrics::{check_user_id, ActivityHistory, DayActivity, Metric};

#[derive(Parser, Debug)]
#[command(name = "synthdash")]
#[command(author = "Sean Fournier")]
#[command(version)]
#[command(about = "A terminal dashboard for the synthetic social network simulation")]
struct Args {
    /// Base URL of the simulation API (overrides config.toml)
    #[arg(long, env = "SYNTHDASH_API_URL")]
    base_url: Option<String>,

    /// Print the total user count as JSON
    #[arg(short, long)]
    status: bool,

    /// Reset the simulation to day 0
    #[arg(long)]
    reset: bool,

    /// Simulate DAYS days (default 1), printing each day's report as JSON
    #[arg(long, value_name = "DAYS", num_args = 0..=1, default_missing_value = "1")]
    step: Option<u32>,

    /// Print a user's profile, friends and recommendations as JSON
    #[arg(short, long, value_name = "ID")]
    profile: Option<UserId>,

    /// Like --profile, for a user picked by the backend
    #[arg(long)]
    random: bool,

    /// Check that the backend is alive
    #[arg(long)]
    ping: bool,

    /// Send the [database] section of config.toml to the backend
    #[arg(long)]
    connect_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so JSON output and the TUI own stdout)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AppConfig::load()
        .unwrap_or_default()
        .with_base_url(args.base_url.clone());
    let client = ApiClient::new(&config)?;

    // Handle CLI-only commands
    if let Some(output) = run_command(&args, &client, &config).await? {
        println!("{}", output);
        return Ok(());
    }

    // Run TUI
    run_tui(client, config).await
}

/// Run a one-shot command if one was requested, returning what to print
async fn run_command(args: &Args, client: &ApiClient, config: &AppConfig) -> Result<Option<String>> {
    if args.ping {
        let status = client.ping().await?;
        return Ok(Some(serde_json::to_string(&status)?));
    }

    if args.connect_db {
        let status = client.set_db_connection(&config.database).await?;
        return Ok(Some(serde_json::to_string(&status)?));
    }

    if args.reset {
        client.refresh_db().await?;
        let total = client.total_count().await?;
        return Ok(Some(json!({ "reset": true, "total_users": total }).to_string()));
    }

    if let Some(days) = args.step {
        let lines = step_days(client, days).await?;
        return Ok(Some(lines.join("\n")));
    }

    if args.status {
        let total = client.total_count().await?;
        return Ok(Some(json!({ "total_users": total }).to_string()));
    }

    if let Some(id) = args.profile {
        let total = client.total_count().await?;
        let id = check_user_id(id, total).map_err(anyhow::Error::msg)?;
        return Ok(Some(serde_json::to_string_pretty(&user_report(client, id).await)?));
    }

    if args.random {
        let id = client.random_user_id().await?;
        return Ok(Some(serde_json::to_string_pretty(&user_report(client, id).await)?));
    }

    Ok(None)
}

/// Simulate `days` days; one JSON line per day plus a summary line
async fn step_days(client: &ApiClient, days: u32) -> Result<Vec<String>> {
    let mut history = ActivityHistory::default();
    let mut lines = Vec::new();

    for day in 1..=days {
        let report = client.simulate_day().await?;
        history.push(DayActivity::from(&report));
        let mut line = serde_json::to_value(report)?;
        line["day"] = json!(day);
        lines.push(line.to_string());
    }

    lines.push(
        json!({
            "days": history.len(),
            "new_users": history.total(Metric::NewUsers),
            "new_friendships": history.total(Metric::NewFriendships),
            "interactions": history.total(Metric::Interactions),
        })
        .to_string(),
    );
    Ok(lines)
}

/// Profile, friends and both recommendation lists, fetched concurrently
async fn user_report(client: &ApiClient, id: UserId) -> Value {
    let (profile, friends, fof, strangers) = tokio::join!(
        client.user_profile(id),
        client.friends_with_profiles(id),
        client.fof_with_profiles(id),
        client.strangers_with_profiles(id),
    );

    fn section<T: serde::Serialize>(result: Result<T, api::ApiError>) -> Value {
        match result {
            Ok(value) => serde_json::to_value(value).unwrap_or(Value::Null),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    json!({
        "user_id": id,
        "profile": section(profile),
        "friends": section(friends),
        "friends_of_friends": section(fof),
        "suggested": section(strangers),
    })
}

async fn run_tui(client: ApiClient, config: AppConfig) -> Result<()> {
    ui::init_theme(&config.theme);

    // Create app state before taking over the terminal
    let mut app = App::new(client, config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                tracing::warn!("Action failed: {}", e);
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        // Apply finished loads, expire status
        let _ = app.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["synthdash"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_step_defaults_to_one_day() {
        assert_eq!(args(&["--step"]).step, Some(1));
        assert_eq!(args(&["--step", "7"]).step, Some(7));
        assert_eq!(args(&[]).step, None);
    }

    #[tokio::test]
    async fn test_step_prints_each_day_and_summary() {
        let backend = FakeBackend::start().await;
        let client = backend.client();

        let lines = step_days(&client, 3).await.unwrap();
        assert_eq!(lines.len(), 4);

        let first: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["day"], 1);
        assert_eq!(first["new_users"], 10);

        let summary: Value = serde_json::from_str(&lines[3]).unwrap();
        assert_eq!(summary["days"], 3);
        assert_eq!(summary["new_users"], 30);
        assert_eq!(summary["interactions"], 420);
    }

    #[tokio::test]
    async fn test_profile_command_validates_before_fetching() {
        let backend = FakeBackend::start().await;
        let client = backend.client();
        let config = backend.config();

        let err = run_command(&args(&["--profile", "9999"]), &client, &config)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User ID must be between 1 and 500");
        assert_eq!(backend.hits("/get_user_profile"), 0);
    }

    #[tokio::test]
    async fn test_user_report_isolates_failures() {
        let backend = FakeBackend::start().await;
        backend.fail_fof();
        let client = backend.client();

        let report = user_report(&client, 317).await;
        assert_eq!(report["profile"]["first_name"], "A.");
        assert_eq!(report["friends"].as_array().unwrap().len(), 2);
        assert!(report["friends_of_friends"]["error"].is_string());
        assert_eq!(report["suggested"][0]["user_id"], 99);
    }

    #[tokio::test]
    async fn test_no_command_falls_through_to_tui() {
        let backend = FakeBackend::start().await;
        let out = run_command(&args(&[]), &backend.client(), &backend.config())
            .await
            .unwrap();
        assert!(out.is_none());
    }
}
