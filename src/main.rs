use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

mod aggregation;
mod browse;
mod config;
mod feed;
mod init;
mod telemetry;
mod users;
mod util;

use config::Config;

#[derive(Parser)]
#[command(name = "gator", about = "RSS feed aggregator CLI")]
struct Cli {
    /// Postgres DSN; falls back to DATABASE_URL, then db_url in ~/.gatorconfig.json
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Init,
    /// Create a user and log in as them
    Register(users::RegisterCmd),
    /// Switch the current user
    Login(users::LoginCmd),
    /// List users
    Users,
    /// Delete all users and everything they own
    Reset(users::ResetCmd),
    /// Add a feed owned by the current user and follow it
    #[command(name = "addfeed")]
    AddFeed(feed::AddFeedCmd),
    /// List all feeds
    Feeds,
    /// Follow an existing feed by URL
    Follow(feed::FollowCmd),
    /// List feeds the current user follows
    Following,
    /// Stop following a feed
    Unfollow(feed::UnfollowCmd),
    /// Show the newest posts from followed feeds
    Browse(browse::BrowseCmd),
    /// Poll feeds forever, one feed per interval
    Agg(aggregation::AggCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and GATOR_LOG_FORMAT
    telemetry::config::init_tracing();

    let mut cfg = Config::load().context("error reading config")?;
    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .or_else(|| cfg.db_url.clone())
        .context("Please provide --dsn, set DATABASE_URL, or add db_url to ~/.gatorconfig.json")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .context("error opening db")?;

    match cli.command {
        Commands::Init => init::run(&pool).await?,
        Commands::Register(args) => users::register(&pool, &mut cfg, args).await?,
        Commands::Login(args) => users::login(&pool, &mut cfg, args).await?,
        Commands::Users => users::list(&pool, &cfg).await?,
        Commands::Reset(args) => users::reset(&pool, args).await?,
        Commands::AddFeed(args) => feed::add_feed(&pool, &cfg, args).await?,
        Commands::Feeds => feed::list(&pool).await?,
        Commands::Follow(args) => feed::follow(&pool, &cfg, args).await?,
        Commands::Following => feed::following(&pool, &cfg).await?,
        Commands::Unfollow(args) => feed::unfollow(&pool, &cfg, args).await?,
        Commands::Browse(args) => browse::run(&pool, &cfg, args).await?,
        Commands::Agg(args) => aggregation::run(&pool, args).await?,
    }

    Ok(())
}
