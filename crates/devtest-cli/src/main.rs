//! DevTest build steps from the command line.
//!
//! The `devtest` command runs DevTest tests and suites against a Registry,
//! publishes the downloaded reports, and manages virtual services.
//!
//! ## Commands
//!
//! - `run-test` / `run-suite`: submit, wait for the end, fetch and count reports
//! - `publish`: aggregate every report under `<work-dir>/report`
//! - `deploy-vs`, `start-vs`, `stop-vs`, `undeploy-vs`, `create-vs`: virtual services
//! - `check`: verify the Registry is reachable with the given credentials
//!
//! The exit code follows the build outcome: 0 success, 2 unstable, 1 failure.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use devtest_client::{
    cancellation, init_tracing, split_names, BuildOutcome, CreateServiceRequest, DevTestClient,
    PollConfig, RegistryConfig, RunKind, RunRequest, TestRunStep, UndeployOutcome,
    VirtualServices,
};
use devtest_report::{Report, ReportParser};
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "devtest")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run DevTest tests and manage virtual services", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    registry: RegistryArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Registry connection flags, each backed by a `DEVTEST_*` variable.
#[derive(Args, Debug)]
struct RegistryArgs {
    /// Registry host
    #[arg(long, env = "DEVTEST_HOST", global = true, default_value = "")]
    host: String,

    /// Registry REST port
    #[arg(long, env = "DEVTEST_PORT", global = true, default_value_t = devtest_client::config::DEFAULT_PORT)]
    port: u16,

    /// Use https (`1`, `yes`, `on` and `true` enable it from the environment)
    #[arg(long, env = "DEVTEST_SECURED", global = true, value_parser = BoolishValueParser::new())]
    secured: bool,

    /// Basic-auth user
    #[arg(long, env = "DEVTEST_USERNAME", global = true)]
    username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "DEVTEST_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Accept any server certificate
    #[arg(long, env = "DEVTEST_TRUST_ANY_CERT", global = true, value_parser = BoolishValueParser::new())]
    trust_any_certificate: bool,

    /// HTTP timeout in seconds
    #[arg(long, env = "DEVTEST_TIMEOUT_SECS", global = true, default_value_t = devtest_client::config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl RegistryArgs {
    fn to_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(&self.host, self.port)
            .with_secured(self.secured)
            .with_trust_any_certificate(self.trust_any_certificate)
            .with_timeout_secs(self.timeout_secs);
        config.username = self.username.clone().filter(|u| !u.trim().is_empty());
        config.password = self.password.clone();
        config
    }

    fn client(&self) -> Result<DevTestClient> {
        DevTestClient::new(self.to_config()).context("Failed to set up DevTest Registry client")
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Test (.tst) or suite (.ste) document to run
    artifact: PathBuf,

    /// Staging document name
    #[arg(long)]
    staging_doc: Option<String>,

    /// Staging document file to upload
    #[arg(long)]
    staging_doc_file: Option<PathBuf>,

    /// Config name
    #[arg(long)]
    config: Option<String>,

    /// Config file to upload
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Coordinator server name
    #[arg(long)]
    coordinator: Option<String>,

    /// Directory receiving `report/<run id>`
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Milliseconds between status checks
    #[arg(long, default_value_t = 1900)]
    poll_interval_ms: u64,

    /// Give up after this many status checks (default: never)
    #[arg(long)]
    max_polls: Option<u32>,

    /// Print the step summary as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn request(&self, kind: RunKind) -> RunRequest {
        RunRequest {
            kind,
            artifact: self.artifact.clone(),
            staging_doc: self.staging_doc.clone(),
            staging_doc_file: self.staging_doc_file.clone(),
            config: self.config.clone(),
            config_file: self.config_file.clone(),
            coordinator_server_name: self.coordinator.clone(),
        }
    }

    fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_polls,
        }
    }
}

#[derive(Args, Debug)]
struct CreateVsArgs {
    /// Virtual Service Environment name
    #[arg(long)]
    vse: String,

    /// Service config JSON
    #[arg(long, conflicts_with = "config_file", required_unless_present = "config_file")]
    config: Option<String>,

    /// File holding the service config JSON
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Deploy after creating
    #[arg(long)]
    deploy: bool,

    /// Undeploy a service with the same name first
    #[arg(long)]
    undeploy: bool,

    #[arg(long)]
    input_file1: Option<PathBuf>,

    #[arg(long)]
    input_file2: Option<PathBuf>,

    #[arg(long)]
    active_config: Option<PathBuf>,

    #[arg(long)]
    data_file: Option<PathBuf>,

    #[arg(long)]
    swagger_url: Option<String>,

    #[arg(long)]
    raml_url: Option<String>,

    #[arg(long)]
    wadl_url: Option<String>,
}

impl CreateVsArgs {
    fn request(&self) -> Result<CreateServiceRequest> {
        let config = match (&self.config, &self.config_file) {
            (Some(config), _) => config.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?,
            (None, None) => String::new(),
        };
        Ok(CreateServiceRequest {
            vse: self.vse.clone(),
            config,
            deploy: self.deploy,
            undeploy_first: self.undeploy,
            input_file1: self.input_file1.clone(),
            input_file2: self.input_file2.clone(),
            active_config: self.active_config.clone(),
            data_file: self.data_file.clone(),
            swagger_url: self.swagger_url.clone(),
            raml_url: self.raml_url.clone(),
            wadl_url: self.wadl_url.clone(),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a test case and wait for it to end
    RunTest(RunArgs),

    /// Run a test suite and wait for it to end
    RunSuite(RunArgs),

    /// Aggregate downloaded reports
    Publish {
        /// Directory holding `report/`
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,

        /// Build identifier attached to the report
        #[arg(long)]
        run: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deploy MAR files to a VSE
    DeployVs {
        #[arg(long)]
        vse: String,

        /// MAR paths or URIs (comma or newline separated)
        #[arg(required = true)]
        mar: Vec<String>,
    },

    /// Start virtual services
    StartVs {
        #[arg(long)]
        vse: String,

        /// Service names (comma or newline separated)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Stop virtual services
    StopVs {
        #[arg(long)]
        vse: String,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Undeploy virtual services
    UndeployVs {
        #[arg(long)]
        vse: String,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Create (and optionally deploy) a virtual service
    CreateVs(CreateVsArgs),

    /// Check the Registry connection
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.log_json, level);

    match run(cli).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(BuildOutcome::Failure.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<BuildOutcome> {
    match cli.command {
        Commands::RunTest(args) => cmd_run(&cli.registry, RunKind::Test, &args).await,
        Commands::RunSuite(args) => cmd_run(&cli.registry, RunKind::Suite, &args).await,
        Commands::Publish {
            work_dir,
            run,
            json,
        } => cmd_publish(&work_dir, run.as_deref(), json),
        Commands::DeployVs { vse, mar } => {
            let client = cli.registry.client()?;
            let mar = flatten_names(&mar);
            VirtualServices::new(&client)
                .deploy_mar(&vse, &mar)
                .await
                .context("Failed to deploy MAR files")?;
            println!("Deployed {} MAR file(s) to {}", mar.len(), vse);
            Ok(BuildOutcome::Success)
        }
        Commands::StartVs { vse, names } => {
            let client = cli.registry.client()?;
            let names = flatten_names(&names);
            VirtualServices::new(&client)
                .start(&vse, &names)
                .await
                .context("Failed to start virtual services")?;
            println!("Started {} on {}", names.join(", "), vse);
            Ok(BuildOutcome::Success)
        }
        Commands::StopVs { vse, names } => {
            let client = cli.registry.client()?;
            let names = flatten_names(&names);
            VirtualServices::new(&client)
                .stop(&vse, &names)
                .await
                .context("Failed to stop virtual services")?;
            println!("Stopped {} on {}", names.join(", "), vse);
            Ok(BuildOutcome::Success)
        }
        Commands::UndeployVs { vse, names } => {
            let client = cli.registry.client()?;
            let names = flatten_names(&names);
            let outcomes = VirtualServices::new(&client)
                .undeploy(&vse, &names)
                .await
                .context("Failed to undeploy virtual services")?;
            for outcome in outcomes {
                match outcome {
                    UndeployOutcome::Undeployed(name) => println!("Undeployed {name} from {vse}"),
                    UndeployOutcome::NotFound(name) => println!("{name} is not deployed on {vse}"),
                }
            }
            Ok(BuildOutcome::Success)
        }
        Commands::CreateVs(args) => {
            let client = cli.registry.client()?;
            let request = args.request()?;
            let body = VirtualServices::new(&client)
                .create_and_deploy(&request)
                .await
                .context("Failed to create virtual service")?;
            println!("{body}");
            Ok(BuildOutcome::Success)
        }
        Commands::Check => {
            let client = cli.registry.client()?;
            client
                .check_connection()
                .await
                .context("DevTest Registry connection check failed")?;
            println!("Connected to {}", client.endpoints().base_url());
            Ok(BuildOutcome::Success)
        }
    }
}

async fn cmd_run(registry: &RegistryArgs, kind: RunKind, args: &RunArgs) -> Result<BuildOutcome> {
    let client = registry.client()?;

    let (handle, token) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, abandoning run");
            handle.cancel();
        }
    });

    let step = TestRunStep::new(client, &args.work_dir)
        .with_poll_config(args.poll_config())
        .with_cancellation(token);
    let summary = step
        .run(&args.request(kind))
        .await
        .with_context(|| format!("DevTest {kind} run of {} failed", args.artifact.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Run:     {}", summary.run_id);
        println!("Status:  {}", summary.status);
        println!("Outcome: {}", summary.outcome);
        println!(
            "Tests:   {} total, {} passed, {} failed",
            summary.total, summary.passed, summary.failed
        );
        println!("Reports: {}", summary.report_dir.display());
    }
    Ok(summary.outcome)
}

fn cmd_publish(work_dir: &Path, run: Option<&str>, json: bool) -> Result<BuildOutcome> {
    let root = work_dir.join(devtest_client::step::REPORT_DIR);
    if !root.is_dir() {
        anyhow::bail!("No DevTest reports found under {}", root.display());
    }

    let parsed = ReportParser::parse(&root);
    if !parsed.is_clean() {
        warn!(issues = parsed.issues.len(), "some report documents were incomplete");
    }
    let mut report = parsed.into_value();
    if let Some(run) = run {
        report.set_run(run);
    }
    info!(
        suites = report.suites().len(),
        cases = report.case_count(),
        "DevTest reports aggregated"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(BuildOutcome::Success)
}

/// Human-readable report summary.
fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    if let Some(run) = report.run() {
        out.push_str(&format!("Build:   {run}\n"));
    }
    out.push_str(&format!(
        "Suites:  {}, standalone cases: {}\n",
        report.suites().len(),
        report.stand_alone_cases().len()
    ));
    out.push_str(&format!(
        "Tests:   {} total, {} passed, {} failed\n",
        report.total_count(),
        report.success_count(),
        report.fail_count()
    ));

    let failed = report.failed_tests();
    if !failed.is_empty() {
        out.push_str("Failed:\n");
        for case in failed {
            let suite = match case.suite_name() {
                "" => String::new(),
                name => format!("[{name}] "),
            };
            out.push_str(&format!(
                "  {suite}{} ({}): {}\n",
                case.name().unwrap_or("<unnamed>"),
                case.id().unwrap_or("-"),
                case.state()
            ));
        }
    }
    out
}

/// Expand every argument on commas and newlines.
fn flatten_names(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| split_names(v)).collect()
}
