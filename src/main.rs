use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkly_client::{
    app::AnalyticsView, charts::ChartSeries, models::CreateUrlInput, view::ListingState, App,
    ClientConfig,
};

#[derive(Parser)]
#[command(name = "linkly")]
#[command(about = "Manage your Linkly short links", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "LINKLY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List links, newest first
    List {
        /// Only links whose URL or short code contains this text
        #[arg(long, default_value = "")]
        search: String,

        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Shorten a URL
    Create {
        url: String,

        /// Custom short code instead of a generated one
        #[arg(long)]
        alias: Option<String>,

        /// Expiry (RFC3339), e.g. 2025-01-01T00:00:00Z
        #[arg(long)]
        expires: Option<DateTime<Utc>>,
    },

    /// Delete a link by id
    Delete { id: String },

    /// Show analytics for a link by id
    Analytics { id: String },
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent — env vars may already be set)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkly_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;
    tracing::debug!("API URL: {}", config.api_url);

    let app = App::new(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            app.login(&email, &password)
                .await
                .with_context(|| session_error(&app, "login failed"))?;
            let session = app.session.snapshot();
            match session.user {
                Some(user) => println!("Logged in as {}", user.email),
                None => println!("Logged in"),
            }
        }
        Commands::Logout => {
            app.logout();
            println!("Logged out");
        }
        Commands::Whoami => {
            app.session
                .load_user()
                .await
                .with_context(|| session_error(&app, "not logged in"))?;
            if let Some(user) = app.session.snapshot().user {
                match user.name {
                    Some(name) => println!("{name} <{}>", user.email),
                    None => println!("{}", user.email),
                }
            }
        }
        Commands::List { search, page } => {
            app.start()
                .await
                .with_context(|| session_error(&app, "failed to load links"))?;

            let mut listing = ListingState::new(app.config.page_size);
            listing.set_search(search);
            listing.go_to(page);
            for line in app.listing_lines(&listing) {
                println!("{line}");
            }
        }
        Commands::Create {
            url,
            alias,
            expires,
        } => {
            signed_in(&app).await?;
            let created = app
                .create(CreateUrlInput::new(url, alias, expires))
                .await
                .with_context(|| links_error(&app, "could not create link"))?;
            println!("{}", app.short_link(&created.short_code));
        }
        Commands::Delete { id } => {
            signed_in(&app).await?;
            app.delete(&id)
                .await
                .with_context(|| links_error(&app, "could not delete link"))?;
            println!("Deleted {id}");
        }
        Commands::Analytics { id } => {
            signed_in(&app).await?;
            let Some(AnalyticsView { snapshot, charts }) = app
                .open_analytics(&id)
                .await
                .with_context(|| links_error(&app, "could not load analytics"))?
            else {
                return Ok(());
            };

            let url = &snapshot.url;
            println!("Original URL: {}", url.original_url);
            println!("Short URL:    {}", app.short_link(&url.short_code));
            println!("Created:      {}", url.created_at);
            match url.expires_at {
                Some(at) => println!("Expires:      {at}"),
                None => println!("Expires:      Never"),
            }
            println!("Total clicks: {}", url.clicks);

            if charts.has_clicks {
                print_series(&charts.clicks_over_time);
                print_series(&charts.devices);
                print_series(&charts.browsers);
            } else {
                println!("No click data available yet.");
            }
        }
    }

    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Resolve the stored session before a command that needs one.
async fn signed_in(app: &App) -> anyhow::Result<()> {
    app.session
        .load_user()
        .await
        .with_context(|| session_error(app, "not logged in"))?;
    Ok(())
}

fn session_error(app: &App, fallback: &str) -> String {
    app.session
        .snapshot()
        .error
        .unwrap_or_else(|| fallback.to_owned())
}

fn links_error(app: &App, fallback: &str) -> String {
    app.links
        .snapshot()
        .error
        .unwrap_or_else(|| fallback.to_owned())
}

fn print_series(series: &ChartSeries) {
    println!();
    println!("{}", series.label);
    for (label, value) in series.labels.iter().zip(&series.data) {
        println!("  {label:<20} {value}");
    }
}
