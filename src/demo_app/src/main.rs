mod lease;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use record_core::{Error, QueryOption, RepoConfig, Repository, condition};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lease::Lease;

const TABLE_ENV: &str = "DEMO_TABLE";
const CONFIG_ENV: &str = "DEMO_REPO_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let repo = Repository::<Lease>::with_config(config)?;

    //
    // ─── OFFLINE ─────────────────────────────────────────────────────────────────
    //
    let mut lease = Lease::new("lease-1", "blue", "worker-7");
    lease.local_note = Some("not stored".into());
    let item = repo.marshal(&lease)?;
    let json: serde_json::Value = serde_dynamo::from_item(item.clone())?;
    println!("{:#?}", repo.schema());
    println!("{}", serde_json::to_string_pretty(&json)?);
    let insert = condition::insert(&repo, &item)?;
    println!("insert condition: {:?}", insert.expression);

    let Ok(table) = std::env::var(TABLE_ENV) else {
        info!("{TABLE_ENV} not set, skipping table operations");
        return Ok(());
    };

    //
    // ─── LIVE ────────────────────────────────────────────────────────────────────
    //
    let region_provider =
        RegionProviderChain::default_provider().or_else(Region::new("ap-southeast-1"));
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let repo = repo.with_table_name(table).with_sdk_config(&shared_config);

    repo.create_table().await?;
    let report = repo.report().await?;
    info!(status = ?report.table.and_then(|t| t.table_status), "table ready");

    // ── CREATE ─────────────────────────────────────
    repo.put_item_with(&lease, condition::insert).await?;
    match repo.put_item_with(&lease, condition::insert).await {
        Err(Error::Store(err)) => warn!(%err, "second insert rejected"),
        other => other?,
    }

    // ── READ ───────────────────────────────────────
    let mut loaded = Lease {
        lease_id: lease.lease_id.clone(),
        ..Lease::default()
    };
    repo.get_item(&mut loaded).await?;
    info!(
        holder = %loaded.holder,
        version = loaded.version,
        note = ?loaded.local_note,
        "loaded"
    );

    // ── UPDATE ─────────────────────────────────────
    loaded.holder = "worker-9".into();
    loaded.version += 1;
    repo.put_item_with(&loaded, condition::is_next_version).await?;

    let expired = Lease {
        expire_on: epoch_seconds(SystemTime::now() + Duration::from_secs(60))?,
        ..Lease::new("lease-2", "blue", "worker-3")
    };
    repo.put_item_with(&expired, condition::insert_or_replace_expired)
        .await?;

    // ── QUERY ──────────────────────────────────────
    let mut found = Vec::new();
    repo.query_by_hash_key(&loaded, &[QueryOption::Limit(10)], |lease| {
        found.push(lease);
        Ok::<_, Error>(())
    })
    .await?;
    info!(count = found.len(), "queried");

    let mut scanned = 0usize;
    repo.scan(&[], |_| {
        scanned += 1;
        Ok::<_, Error>(())
    })
    .await?;
    info!(scanned, "scanned");

    // ── DELETE ─────────────────────────────────────
    repo.delete_item(&loaded).await?;
    repo.delete_item(&expired).await?;
    repo.delete_table().await?;
    Ok(())
}

fn load_config() -> anyhow::Result<RepoConfig> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok(RepoConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn epoch_seconds(at: SystemTime) -> anyhow::Result<u64> {
    Ok(at.duration_since(UNIX_EPOCH)?.as_secs())
}
