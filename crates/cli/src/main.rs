use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veriflow_core::{
    load_config, validate_config, AdmissionController, Config, FsDocumentGenerator,
    HttpTransport, IdentitySynthesizer, MemoryLedger, Program, ResultPoller, SessionLedger,
    SysinfoProbe, VerificationClient, VerificationSession,
};
use veriflow_core::document::DocumentGenerator;
use veriflow_core::protocol::url::parse_verification_id;

/// Cost of one verification attempt, in ledger points
const ATTEMPT_COST: i64 = 1;

/// Points available to the local account per invocation
const LOCAL_BALANCE: i64 = 1;

#[derive(Parser)]
#[command(name = "veriflow", version, about = "Discount verification driver")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "VERIFLOW_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full verification for a pasted verification link
    Verify {
        /// Program key, e.g. k12_teacher
        #[arg(long)]
        program: String,

        /// Verification link containing the verification id
        url: String,

        /// Submit under a specific organization from the program's directory
        /// instead of a random one
        #[arg(long)]
        organization_id: Option<i64>,

        /// After submission, wait up to this long for the reward code
        #[arg(long)]
        wait_secs: Option<u64>,
    },

    /// Look up the reward code for an existing verification
    Code {
        verification_id: String,

        /// Keep polling up to this long instead of a single query
        #[arg(long)]
        wait_secs: Option<u64>,
    },

    /// Show the computed admission limits per program
    Limits,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;
    veriflow_core::metrics::init_metrics().context("Failed to register metrics")?;

    match cli.command {
        Command::Verify {
            program,
            url,
            organization_id,
            wait_secs,
        } => verify(&config, &program, &url, organization_id, wait_secs).await,
        Command::Code {
            verification_id,
            wait_secs,
        } => code(&config, &verification_id, wait_secs).await,
        Command::Limits => limits(&config),
    }
}

async fn verify(
    config: &Config,
    program_key: &str,
    url: &str,
    organization_id: Option<i64>,
    wait_secs: Option<u64>,
) -> Result<()> {
    let Some(program) = Program::from_key(program_key) else {
        let known: Vec<&str> = Program::ALL.iter().map(Program::key).collect();
        bail!(
            "Unknown program '{}', expected one of: {}",
            program_key,
            known.join(", ")
        );
    };

    // Validate the link before touching the network or the ledger.
    let Some(verification_id) = parse_verification_id(url) else {
        bail!("invalid verification link: no verification id found");
    };

    let ledger = MemoryLedger::new(LOCAL_BALANCE);
    let account = "local";
    if !ledger.debit(account, ATTEMPT_COST).await {
        bail!("Insufficient balance for a verification attempt");
    }

    let controller = Arc::new(AdmissionController::new(
        Arc::new(SysinfoProbe::new()),
        config.admission.clone(),
    ));
    let retune_handle = controller.spawn_retune_loop();

    let slot = controller.acquire(program.key()).await;
    info!(program = %program, verification_id = %verification_id, "Admitted, starting verification");

    let transport = Arc::new(HttpTransport::new(
        config.service.timeout_secs,
        config.service.upload_timeout_secs,
    ));
    let client = Arc::new(VerificationClient::new(transport, &config.service));

    let descriptor = program.descriptor();
    let identity = match organization_id {
        Some(id) => {
            let Some(organization) = descriptor.organization(id) else {
                let known: Vec<String> = descriptor
                    .organizations
                    .iter()
                    .map(|o| format!("{} ({})", o.id, o.name))
                    .collect();
                bail!(
                    "Organization {} is not in the {} directory, expected one of: {}",
                    id,
                    program,
                    known.join(", ")
                );
            };
            IdentitySynthesizer::new().generate_with(&descriptor, organization)
        }
        None => IdentitySynthesizer::new().generate(&descriptor),
    };
    let generator = FsDocumentGenerator::new(config.documents.template_dir.clone());

    let mut session = VerificationSession::new(verification_id.clone(), program);
    let outcome = match generator.generate(&descriptor, &identity).await {
        Ok(documents) => client.execute(&mut session, &identity, &documents).await,
        Err(e) => {
            // No submission happened; settle as a failed run.
            veriflow_core::VerificationOutcome::failure(&verification_id, e.to_string())
        }
    };
    drop(slot);

    ledger.record_outcome(account, program.key(), &outcome).await;
    if !outcome.success {
        // The attempt consumed nothing remotely; refund the point once.
        ledger.credit(account, ATTEMPT_COST).await;
        controller.stop();
        let _ = retune_handle.await;
        bail!("Verification failed: {}", outcome.message);
    }

    println!("Documents submitted for {verification_id}");
    if let Some(redirect) = &outcome.redirect_url {
        println!("Redirect: {redirect}");
    }

    if let Some(wait) = wait_secs {
        let poller = ResultPoller::new(
            Arc::clone(&client),
            Duration::from_secs(config.poller.interval_secs),
        );
        match poller
            .poll_for_code(&verification_id, Some(Duration::from_secs(wait)))
            .await
        {
            Some(reward_code) => println!("Reward code: {reward_code}"),
            None => println!(
                "No code yet; retry later with: veriflow code {verification_id}"
            ),
        }
    }

    controller.stop();
    let _ = retune_handle.await;
    Ok(())
}

async fn code(config: &Config, verification_id: &str, wait_secs: Option<u64>) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(
        config.service.timeout_secs,
        config.service.upload_timeout_secs,
    ));
    let client = Arc::new(VerificationClient::new(transport, &config.service));

    match wait_secs {
        Some(wait) => {
            let poller = ResultPoller::new(
                client,
                Duration::from_secs(config.poller.interval_secs),
            );
            match poller
                .poll_for_code(verification_id, Some(Duration::from_secs(wait)))
                .await
            {
                Some(reward_code) => println!("Reward code: {reward_code}"),
                None => bail!("No reward code within {wait}s"),
            }
        }
        None => {
            let status = client
                .fetch_status(verification_id)
                .await
                .context("Status query failed")?;
            println!("Current step: {}", status.current_step);
            match status.reward_code {
                Some(reward_code) => println!("Reward code: {reward_code}"),
                None => println!("No reward code yet"),
            }
        }
    }
    Ok(())
}

fn limits(config: &Config) -> Result<()> {
    let controller = AdmissionController::new(
        Arc::new(SysinfoProbe::new()),
        config.admission.clone(),
    );
    let mut limits: Vec<(String, u32)> = controller.limits().into_iter().collect();
    limits.sort();
    for (program, limit) in limits {
        println!("{program}: {limit}");
    }
    Ok(())
}
