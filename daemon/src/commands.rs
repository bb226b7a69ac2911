//! Subcommand handlers.
//!
//! Handlers take resolved inputs (approval gate, a password source) and an
//! output sink so they run the same from `main` and from tests.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context as _};
use ratings_protocol::{
    check_eligibility, create_service, load_services, reconcile_aggregate, AdminPolicy,
    Eligibility, IgnoreReason, RatingWidget, ServiceView, SubmitOutcome,
};
use ratings_store::{NewService, ServiceStore, StoreError};
use ratings_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, LmdbStore};
use ratings_types::{ServiceId, WalletAddress};
use ratings_wallet_core::{load_keystore, ApprovalGate, AutoApprove, LocalWallet};

use crate::config::RatingsConfig;

const LMDB_MAX_DBS: u32 = 8;

const NO_WALLET: &str = "No wallet connected; run `ratings wallet new` to rate services";

/// Open the LMDB environment under `<data_dir>/lmdb`.
pub fn open_env(config: &RatingsConfig) -> anyhow::Result<LmdbEnvironment> {
    let path = config.data_dir.join("lmdb");
    check_data_dir(&path).map_err(anyhow::Error::msg)?;
    LmdbEnvironment::open(&path, LMDB_MAX_DBS, config.lmdb_map_size)
        .with_context(|| format!("failed to open store at {}", path.display()))
}

/// The wallet address recorded in the keystore, without unlocking it.
pub fn keystore_address(path: &Path) -> Option<WalletAddress> {
    if !path.exists() {
        return None;
    }
    match load_keystore(path) {
        Ok(keystore) => Some(keystore.address),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable keystore");
            None
        }
    }
}

/// Whether a keystore exists to vote with. Without one, explains how to
/// create it and returns `false`.
pub fn wallet_present(config: &RatingsConfig, out: &mut dyn Write) -> anyhow::Result<bool> {
    if config.keystore_path().exists() {
        return Ok(true);
    }
    writeln!(out, "{NO_WALLET}")?;
    Ok(false)
}

fn service_line(view: &ServiceView) -> String {
    let service = &view.service;
    let votes = match service.rating_count {
        1 => "1 vote".to_string(),
        n => format!("{n} votes"),
    };
    format!(
        "#{} {} {:>3} ({votes})  {}  {}",
        service.id,
        view.stars.render(),
        view.average_label(),
        service.name,
        service.url
    )
}

pub fn list_services(env: &LmdbEnvironment, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let views = load_services(&env.store())?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &views)?;
        writeln!(out)?;
        return Ok(());
    }
    if views.is_empty() {
        writeln!(out, "No services yet.")?;
        return Ok(());
    }
    for view in &views {
        writeln!(out, "{}", service_line(view))?;
        if let Some(description) = &view.service.description {
            writeln!(out, "      {description}")?;
        }
    }
    Ok(())
}

pub fn add_service(
    env: &LmdbEnvironment,
    policy: &AdminPolicy,
    requester: Option<&WalletAddress>,
    request: &NewService,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let service = create_service(&env.store(), request, requester, policy)?;
    writeln!(out, "Added service #{} {}", service.id, service.name)?;
    Ok(())
}

pub fn reconcile(env: &LmdbEnvironment, id: ServiceId, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = env.store();
    let before = require_service(&store, id)?.aggregate();
    let after = reconcile_aggregate(&store, id)?;
    if before == after {
        writeln!(
            out,
            "Service #{id} is consistent: {} votes, sum {}",
            after.rating_count, after.rating_sum
        )?;
    } else {
        writeln!(
            out,
            "Service #{id} repaired: {} votes, sum {} (was {} votes, sum {})",
            after.rating_count, after.rating_sum, before.rating_count, before.rating_sum
        )?;
    }
    Ok(())
}

/// Print an integrity report. Returns whether the store is healthy.
pub fn audit(env: &LmdbEnvironment, out: &mut dyn Write) -> anyhow::Result<bool> {
    let report = check_integrity(env)?;
    writeln!(
        out,
        "Checked {} databases, {} entries",
        report.databases_checked, report.total_entries
    )?;
    for drift in &report.drifted {
        writeln!(
            out,
            "  service #{}: stored {} votes / sum {}, reviews say {} votes / sum {}",
            drift.service_id,
            drift.stored.rating_count,
            drift.stored.rating_sum,
            drift.actual.rating_count,
            drift.actual.rating_sum
        )?;
    }
    if report.orphaned_reviews > 0 {
        writeln!(out, "  {} reviews reference missing services", report.orphaned_reviews)?;
    }
    for error in &report.errors {
        writeln!(out, "  error: {error}")?;
    }
    let healthy = report.is_healthy();
    if healthy {
        writeln!(out, "Store is healthy.")?;
    } else if !report.drifted.is_empty() {
        writeln!(out, "Run `ratings services reconcile <id>` to repair drifted aggregates.")?;
    }
    Ok(healthy)
}

pub fn wallet_new(
    config: &RatingsConfig,
    password: &str,
    force: bool,
    out: &mut dyn Write,
) -> anyhow::Result<WalletAddress> {
    let path = config.keystore_path();
    if path.exists() && !force {
        bail!(
            "a wallet already exists at {}; pass --force to replace it",
            path.display()
        );
    }
    let wallet = LocalWallet::create(Arc::new(AutoApprove));
    wallet.save_keystore(&path, password)?;
    writeln!(out, "Created wallet {}", wallet.address())?;
    writeln!(out, "Keystore: {}", path.display())?;
    Ok(wallet.address().clone())
}

pub fn wallet_show(config: &RatingsConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let path = config.keystore_path();
    match keystore_address(&path) {
        Some(address) => writeln!(out, "{address}")?,
        None => bail!(
            "no wallet at {}; run `ratings wallet new` first",
            path.display()
        ),
    }
    Ok(())
}

pub fn check(
    env: &LmdbEnvironment,
    config: &RatingsConfig,
    id: ServiceId,
    out: &mut dyn Write,
) -> anyhow::Result<Eligibility> {
    let store = env.store();
    require_service(&store, id)?;
    let voter = keystore_address(&config.keystore_path());
    let eligibility = check_eligibility(&store, id, voter.as_ref())?;
    match (&voter, eligibility) {
        (Some(voter), Eligibility::AlreadyVoted(rating)) => {
            writeln!(out, "{voter} already voted {rating}★ on service #{id}")?
        }
        (Some(voter), _) => writeln!(out, "{voter} can rate service #{id}")?,
        (None, _) => writeln!(out, "{NO_WALLET}")?,
    }
    Ok(eligibility)
}

pub async fn rate(
    env: &LmdbEnvironment,
    config: &RatingsConfig,
    id: ServiceId,
    stars: u8,
    password: impl FnOnce() -> anyhow::Result<String>,
    approval: Arc<dyn ApprovalGate>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    // No identity: stop before prompting or reading the store.
    if !wallet_present(config, out)? {
        return Ok(());
    }
    let store = Arc::new(env.store());
    let service = require_service(&store, id)?;

    let password = password()?;
    let wallet = Arc::new(
        LocalWallet::from_keystore(&config.keystore_path(), &password, approval)
            .context("failed to unlock wallet")?,
    );
    wallet.connect();

    let refreshed: Arc<Mutex<Option<Vec<ServiceView>>>> = Arc::new(Mutex::new(None));
    let refresh = {
        let store = Arc::clone(&store);
        let refreshed = Arc::clone(&refreshed);
        move || match load_services(&*store) {
            Ok(views) => {
                *refreshed.lock().unwrap_or_else(PoisonError::into_inner) = Some(views);
            }
            Err(e) => tracing::warn!(error = %e, "service list refresh failed"),
        }
    };
    let widget = RatingWidget::new(
        id,
        store,
        wallet,
        Arc::new(refresh),
        config.aggregate_policy,
    );
    widget.load()?;

    match widget.submit(stars).await {
        Ok(SubmitOutcome::Recorded(review)) => {
            writeln!(out, "You rated {} {}★", service.name, review.rating)?;
            let views = refreshed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(view) = views
                .into_iter()
                .flatten()
                .find(|view| view.service.id == id)
            {
                writeln!(out, "{}", service_line(&view))?;
            }
        }
        Ok(SubmitOutcome::AlreadyVoted(rating))
        | Ok(SubmitOutcome::Ignored(IgnoreReason::AlreadyVoted(rating))) => {
            writeln!(out, "You already voted {rating}★ on {}; votes are final", service.name)?;
        }
        Ok(SubmitOutcome::Ignored(IgnoreReason::InFlight)) => {
            writeln!(out, "A rating for {} is already in progress", service.name)?;
        }
        Err(e) if e.is_user_cancellation() => {
            writeln!(out, "Signature declined; nothing was recorded")?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn require_service(store: &LmdbStore, id: ServiceId) -> anyhow::Result<ratings_store::Service> {
    match store.get_service(id) {
        Ok(service) => Ok(service),
        Err(StoreError::NotFound(_)) => bail!("service #{id} does not exist"),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ratings_store::ReviewStore;

    struct Decline;

    #[async_trait]
    impl ApprovalGate for Decline {
        async fn approve(&self, _message: &str) -> bool {
            false
        }
    }

    fn setup() -> (tempfile::TempDir, RatingsConfig, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let config = RatingsConfig {
            data_dir: dir.path().to_path_buf(),
            lmdb_map_size: 16 * 1024 * 1024,
            ..RatingsConfig::default()
        };
        let env = open_env(&config).unwrap();
        (dir, config, env)
    }

    fn pw(password: &'static str) -> impl FnOnce() -> anyhow::Result<String> {
        move || Ok(password.to_string())
    }

    fn output(f: impl FnOnce(&mut dyn Write) -> anyhow::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn add(env: &LmdbEnvironment, name: &str) -> ServiceId {
        let mut sink = Vec::new();
        add_service(
            env,
            &AdminPolicy::Open,
            None,
            &NewService {
                name: name.into(),
                url: format!("https://{}.example", name.to_lowercase()),
                description: Some("Forecast data".into()),
            },
            &mut sink,
        )
        .unwrap();
        env.store().list_services().unwrap().last().unwrap().id
    }

    #[test]
    fn empty_listing() {
        let (_dir, _config, env) = setup();
        assert_eq!(output(|out| list_services(&env, false, out)), "No services yet.\n");
        assert_eq!(output(|out| list_services(&env, true, out)).trim(), "[]");
    }

    #[test]
    fn listing_shows_glyphs_and_description() {
        let (_dir, _config, env) = setup();
        add(&env, "Weather");
        let text = output(|out| list_services(&env, false, out));
        assert!(text.contains("☆☆☆☆☆"));
        assert!(text.contains("—"));
        assert!(text.contains("(0 votes)"));
        assert!(text.contains("https://weather.example"));
        assert!(text.contains("Forecast data"));
    }

    #[test]
    fn allow_list_blocks_anonymous_add() {
        let (_dir, _config, env) = setup();
        let policy = AdminPolicy::AllowList(vec![WalletAddress::from_bytes(&[1; 20])]);
        let result = add_service(
            &env,
            &policy,
            None,
            &NewService {
                name: "X".into(),
                url: "https://x.example".into(),
                description: None,
            },
            &mut Vec::new(),
        );
        assert!(result.is_err());
        assert_eq!(env.store().service_count().unwrap(), 0);
    }

    #[test]
    fn check_without_wallet() {
        let (_dir, config, env) = setup();
        let id = add(&env, "Weather");
        let mut buf = Vec::new();
        let eligibility = check(&env, &config, id, &mut buf).unwrap();
        assert_eq!(eligibility, Eligibility::Disconnected);
        assert!(String::from_utf8(buf).unwrap().contains("No wallet"));
    }

    #[test]
    fn check_unknown_service_fails() {
        let (_dir, config, env) = setup();
        assert!(check(&env, &config, ServiceId::new(99), &mut Vec::new()).is_err());
    }

    #[test]
    fn wallet_new_refuses_to_overwrite() {
        let (_dir, config, _env) = setup();
        let address = wallet_new(&config, "pw", false, &mut Vec::new()).unwrap();
        assert!(wallet_new(&config, "pw", false, &mut Vec::new()).is_err());
        let shown = output(|out| wallet_show(&config, out));
        assert_eq!(shown.trim(), address.as_str());
    }

    #[tokio::test]
    async fn rate_then_rate_again() {
        let (_dir, config, env) = setup();
        let id = add(&env, "Weather");
        wallet_new(&config, "pw", false, &mut Vec::new()).unwrap();

        let mut buf = Vec::new();
        rate(&env, &config, id, 4, pw("pw"), Arc::new(AutoApprove), &mut buf)
            .await
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("You rated Weather 4★"));
        assert!(text.contains("★★★★☆ 4.0 (1 vote)"));

        let mut buf = Vec::new();
        rate(&env, &config, id, 1, pw("pw"), Arc::new(AutoApprove), &mut buf)
            .await
            .unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("already voted 4★"));

        let checked = check(&env, &config, id, &mut Vec::new()).unwrap();
        assert_eq!(checked, Eligibility::AlreadyVoted(ratings_types::Rating::new(4).unwrap()));
        assert!(audit(&env, &mut Vec::new()).unwrap());
    }

    #[tokio::test]
    async fn rate_without_wallet_is_blocked() {
        let (_dir, config, env) = setup();
        let mut buf = Vec::new();
        // Unknown service: reaching the store would fail the call.
        rate(
            &env,
            &config,
            ServiceId::new(99),
            4,
            || -> anyhow::Result<String> { panic!("no password prompt without a wallet") },
            Arc::new(AutoApprove),
            &mut buf,
        )
        .await
        .unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No wallet connected"));
        assert_eq!(env.store().review_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn declined_signature_records_nothing() {
        let (_dir, config, env) = setup();
        let id = add(&env, "Weather");
        wallet_new(&config, "pw", false, &mut Vec::new()).unwrap();

        let mut buf = Vec::new();
        rate(&env, &config, id, 5, pw("pw"), Arc::new(Decline), &mut buf)
            .await
            .unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("nothing was recorded"));
        assert_eq!(
            env.store().get_service(id).unwrap().rating_count,
            0
        );
    }

    #[tokio::test]
    async fn wrong_password_is_an_error() {
        let (_dir, config, env) = setup();
        let id = add(&env, "Weather");
        wallet_new(&config, "pw", false, &mut Vec::new()).unwrap();
        let result = rate(&env, &config, id, 5, pw("nope"), Arc::new(AutoApprove), &mut Vec::new()).await;
        assert!(result.is_err());
    }

    #[test]
    fn reconcile_reports_consistent_service() {
        let (_dir, _config, env) = setup();
        let id = add(&env, "Weather");
        let text = output(|out| reconcile(&env, id, out));
        assert!(text.contains("is consistent"));
        assert!(reconcile(&env, ServiceId::new(42), &mut Vec::new()).is_err());
    }
}
