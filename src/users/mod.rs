use anyhow::{bail, Context, Result};
use clap::Args;
use sqlx::PgPool;

use crate::config::Config;
use crate::telemetry::{self};
use crate::telemetry::ops::user::Phase as UserPhase;

mod db;
pub mod types;

use types::User;

/// gator register <name>
#[derive(Args)]
pub struct RegisterCmd {
    pub name: String,
}

/// gator login <name>
#[derive(Args)]
pub struct LoginCmd {
    pub name: String,
}

/// gator reset (plan-only by default; use --apply to delete)
#[derive(Args)]
pub struct ResetCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

pub async fn register(pool: &PgPool, cfg: &mut Config, args: RegisterCmd) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span_kv([("name", args.name.clone())]).entered();
    let _s = log.span(&UserPhase::Register).entered();

    let name = args.name.trim();
    if name.is_empty() { bail!("user name must not be empty"); }
    if db::get_user(pool, name).await?.is_some() {
        bail!("user {name:?} already exists");
    }
    let user = db::create_user(pool, name).await?;
    cfg.set_user(&user.name).context("couldn't set current user")?;

    log.info(format!("👤 User {} was successfully registered", user.name));
    if telemetry::config::json_mode() {
        log.result(&user)?;
    }
    Ok(())
}

pub async fn login(pool: &PgPool, cfg: &mut Config, args: LoginCmd) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span_kv([("name", args.name.clone())]).entered();
    let _s = log.span(&UserPhase::Login).entered();

    let Some(user) = db::get_user(pool, &args.name).await? else {
        bail!("user {:?} does not exist, please register first", args.name);
    };
    cfg.set_user(&user.name).context("couldn't set current user")?;

    log.info(format!("🔑 Logged in as {}", user.name));
    if telemetry::config::json_mode() {
        log.result(&user)?;
    }
    Ok(())
}

pub async fn list(pool: &PgPool, cfg: &Config) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span().entered();
    let _s = log.span(&UserPhase::List).entered();

    let current = cfg.current_user_name.as_deref();
    let users = db::list_users(pool).await?;
    let entries: Vec<types::UserEntry> = users
        .into_iter()
        .map(|u| types::UserEntry { current: Some(u.name.as_str()) == current, name: u.name })
        .collect();

    if telemetry::config::json_mode() {
        log.result(&types::UserList { users: entries })?;
    } else {
        for u in &entries {
            if u.current { println!("* {} (current)", u.name); } else { println!("* {}", u.name); }
        }
    }
    Ok(())
}

pub async fn reset(pool: &PgPool, args: ResetCmd) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span_kv([("apply", args.apply.to_string())]).entered();

    if !args.apply {
        let _s = log.span(&UserPhase::Plan).entered();
        let users = db::count_users(pool).await?;
        log.info(format!("📝 Reset plan — delete {users} user(s) with their feeds, follows and posts"));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&types::ResetPlan { action: "delete_all_users", users })?;
        }
        return Ok(());
    }

    let _s = log.span(&UserPhase::Reset).entered();
    let deleted_users = db::delete_all_users(pool).await.context("error deleting users")?;
    log.info(format!("🗑️ Deleted {deleted_users} user(s)"));
    if telemetry::config::json_mode() {
        log.result(&types::ResetResult { deleted_users })?;
    }
    Ok(())
}

/// Resolve the logged-in user from the config file.
pub async fn current_user(pool: &PgPool, cfg: &Config) -> Result<User> {
    let name = cfg.current_user()?;
    db::get_user(pool, name)
        .await
        .context("error getting current user info")?
        .with_context(|| format!("current user {name:?} does not exist; run `gator register {name}`"))
}
