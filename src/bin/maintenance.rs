use std::env;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jobboard::{
    auth::password,
    config::AppConfig,
    db,
    jobs::expire_stale_jobs,
    models::{Category, NewCategory, NewUser, Site, User, ROLE_ADMIN, ROLE_USER},
    schema::{categories, sites, users},
    site,
};

const USAGE: &str = "Usage: maintenance <command>

Commands:
  create-site <domain> <name> [admin_email]
  create-category <site_id> <name>
  create-user <username> <password> [user|admin]
  expire-jobs";

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["create-site", domain, name] => create_site(domain, name, None),
        ["create-site", domain, name, admin_email] => create_site(domain, name, Some(admin_email)),
        ["create-category", site_id, name] => {
            let site_id = site_id.parse().context("site_id must be an integer")?;
            create_category(site_id, name)
        }
        ["create-user", username, password] => create_user(username, password, ROLE_USER),
        ["create-user", username, password, role] => create_user(username, password, role),
        ["expire-jobs"] => expire_jobs(),
        [cmd, ..] => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        [] => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn connect() -> Result<PgConnection> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        "loaded configuration"
    );
    let mut conn = PgConnection::establish(&config.database_url)
        .context("failed to connect to database")?;
    db::run_migrations(&mut conn)?;
    Ok(conn)
}

fn create_site(domain: &str, name: &str, admin_email: Option<&str>) -> Result<()> {
    let mut conn = connect()?;
    let site = site::create_site(&mut conn, domain, name, admin_email)
        .context("failed to create site")?;
    println!("Created site {} ({})", site.id, site.domain);
    Ok(())
}

fn create_category(site_id: i32, name: &str) -> Result<()> {
    let mut conn = connect()?;
    let site: Site = sites::table
        .find(site_id)
        .first(&mut conn)
        .with_context(|| format!("site {site_id} not found"))?;

    let category: Category = diesel::insert_into(categories::table)
        .values(&NewCategory {
            name: name.trim().to_string(),
            site_id: site.id,
        })
        .get_result(&mut conn)
        .context("failed to create category")?;
    println!(
        "Created category {} ({}) on {}",
        category.id, category.name, site.domain
    );
    Ok(())
}

fn create_user(username: &str, raw_password: &str, role: &str) -> Result<()> {
    if role != ROLE_USER && role != ROLE_ADMIN {
        bail!("role must be {ROLE_USER} or {ROLE_ADMIN}");
    }

    let mut conn = connect()?;
    let user: User = diesel::insert_into(users::table)
        .values(&NewUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password::hash_password(raw_password)?,
            role: role.to_string(),
        })
        .get_result(&mut conn)
        .context("failed to create user")?;
    println!("Created {} {} ({})", user.role, user.username, user.id);
    Ok(())
}

fn expire_jobs() -> Result<()> {
    let mut conn = connect()?;
    let now = Utc::now().naive_utc();

    let all_sites: Vec<Site> = sites::table
        .order(sites::id.asc())
        .load(&mut conn)
        .context("failed to load sites")?;

    let mut total = 0;
    for current in &all_sites {
        let expire_after = site::expire_after(&mut conn, current.id)?;
        let expired = expire_stale_jobs(&mut conn, current.id, now, expire_after)
            .with_context(|| format!("failed to expire jobs for site {}", current.id))?;
        tracing::info!(
            site_id = current.id,
            expired,
            expire_after_days = expire_after.num_days(),
            "expired stale jobs"
        );
        if expired > 0 {
            match site::site_config(&mut conn, current.id)?.and_then(|config| config.admin_email) {
                Some(admin_email) => {
                    println!("{}: expired {expired} jobs, notify {admin_email}", current.domain)
                }
                None => println!("{}: expired {expired} jobs", current.domain),
            }
        }
        total += expired;
    }

    println!("Expired {total} jobs across {} sites.", all_sites.len());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
