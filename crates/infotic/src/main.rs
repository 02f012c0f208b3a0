//! `infotic` - CLI for field evidence capture
//!
//! This binary walks an inspector through the capture form from the command
//! line and keeps the evidence in a local ledger.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use infotic::cli::{
    CaptureCommand, ClearCommand, Cli, Command, ConfigCommand, DashboardCommand, LoginCommand,
    OutputFormat,
};
use infotic::session::VERSION;
use infotic::{
    init_logging, CaptureDraft, CaptureWorkflow, Config, DashboardView, EvidenceKind,
    FixedGeolocator, Geolocator, KeyValueStore, Ledger, Session, SqliteStore, VersionCheck,
};

type Store = Arc<SqliteStore>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    if let Command::Config(config_cmd) = cli.command {
        return handle_config(&config, config_cmd);
    }

    let store: Store = Arc::new(
        SqliteStore::open(config.database_path(), config.quota())
            .context("failed to open local storage")?,
    );
    let session = Session::new(Arc::clone(&store));
    let ledger = Ledger::with_key(Arc::clone(&store), &config.storage.ledger_key);

    announce_update(&session, cli.quiet);

    match cli.command {
        Command::Login(cmd) => handle_login(&config, &session, cmd).await,
        Command::Capture(cmd) => handle_capture(&config, &ledger, cmd).await,
        Command::Dashboard(cmd) => handle_dashboard(&ledger, &cmd),
        Command::Clear(cmd) => {
            handle_clear(&ledger, &cmd);
            Ok(())
        }
        Command::Status(cmd) => handle_status(&store, &session, &ledger, cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn announce_update(session: &Session<Store>, quiet: bool) {
    match session.check_version(VERSION) {
        Ok(VersionCheck::Updated { .. }) if !quiet => eprintln!("Updated to v{VERSION}"),
        Ok(_) => {}
        Err(e) => tracing::warn!("Version check failed: {e}"),
    }
}

async fn handle_login(
    config: &Config,
    session: &Session<Store>,
    cmd: LoginCommand,
) -> anyhow::Result<()> {
    let inspector = cmd
        .inspector
        .unwrap_or_else(|| config.session.default_inspector.clone());

    println!("Verifying...");
    let name = session.login(&inspector, config.login_delay()).await?;
    println!("Logged in as {name}");
    Ok(())
}

async fn handle_capture(
    config: &Config,
    ledger: &Ledger<Store>,
    cmd: CaptureCommand,
) -> anyhow::Result<()> {
    let mut draft = CaptureDraft::new(cmd.node_id, EvidenceKind::from(cmd.kind));

    if let Some(path) = &cmd.photo {
        draft
            .attach_photo_file(path)
            .with_context(|| format!("failed to attach photo {}", path.display()))?;
        println!("Photo captured");
    }

    let geolocator = match (cmd.lat, cmd.lon) {
        (Some(lat), Some(lon)) => Some(FixedGeolocator::new(lat, lon)?),
        _ => None,
    };

    println!("Detecting location...");
    draft
        .locate(
            geolocator.as_ref().map(|g| g as &dyn Geolocator),
            config.geolocation_timeout(),
        )
        .await;
    if geolocator.is_none() {
        println!("Geolocation not supported");
    } else {
        println!("{}", draft.location);
    }

    draft.validate()?;

    println!("Uploading evidence...");
    let workflow = CaptureWorkflow::new(ledger, config.submit_delay());
    match workflow.submit(draft).await {
        Ok(record) => {
            println!("Evidence {} saved for node {}", record.id, record.node_id);
            Ok(())
        }
        Err(infotic::Error::SaveFailed) => {
            bail!("Error saving evidence. Is storage full?")
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_dashboard(ledger: &Ledger<Store>, cmd: &DashboardCommand) -> anyhow::Result<()> {
    let view = DashboardView::build(&ledger.get_all());

    match cmd.format {
        OutputFormat::Plain => print!("{}", view.render_plain()),
        OutputFormat::Table => print!("{}", view.render_table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
    }
    Ok(())
}

fn handle_clear(ledger: &Ledger<Store>, cmd: &ClearCommand) {
    let count = ledger.len();

    if !cmd.yes {
        println!("This will delete {count} stored evidence record(s).");
        println!("Use --yes to confirm.");
        return;
    }

    ledger.clear();
    println!("Cleared {count} evidence record(s).");
}

fn handle_status(
    store: &Store,
    session: &Session<Store>,
    ledger: &Ledger<Store>,
    json: bool,
) -> anyhow::Result<()> {
    let inspector = session.current_inspector()?;
    let records = ledger.len();
    let used_bytes = store.used_bytes()?;
    let keys = store.keys()?;

    if json {
        let status = serde_json::json!({
            "version": VERSION,
            "inspector": inspector,
            "database_path": store.path(),
            "ledger_key": ledger.key(),
            "records": records,
            "keys": keys,
            "used_bytes": used_bytes,
            "quota_bytes": store.quota(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("infotic status");
        println!("--------------");
        println!("Version:    v{VERSION}");
        println!(
            "Inspector:  {}",
            inspector.as_deref().unwrap_or("not logged in")
        );
        println!("Database:   {}", store.path().display());
        println!("Records:    {records}");
        println!("Keys:       {}", keys.join(", "));
        match store.quota() {
            Some(quota) => println!("Storage:    {used_bytes} / {quota} bytes"),
            None => println!("Storage:    {used_bytes} bytes (no quota)"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Ledger key:         {}", config.storage.ledger_key);
                println!("  Quota (bytes):      {}", config.storage.quota_bytes);
                println!();
                println!("[Capture]");
                println!("  Submit delay (ms):  {}", config.capture.submit_delay_ms);
                println!(
                    "  Geo timeout (ms):   {}",
                    config.capture.geolocation_timeout_ms
                );
                println!();
                println!("[Session]");
                println!("  Login delay (ms):   {}", config.session.login_delay_ms);
                println!("  Default inspector:  {}", config.session.default_inspector);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
