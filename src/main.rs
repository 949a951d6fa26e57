use std::path::Path;
use std::sync::Arc;

/// Reset SIGPIPE to default behavior so piping (e.g. `tether graph | dot`) exits cleanly
/// instead of panicking on broken pipe.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use tether::catalog::{Catalog, EnvName};
use tether::config::parser::{self, load_config, log_filter, resolve_environment, resolve_strategy};
use tether::config::types::{Environment, Overrides, TetherConfig};
use tether::config::validator;
use tether::dag::validation::{print_validation_errors, validate_dependency_coverage};
use tether::dag::visualizer::to_dot;
use tether::executor::{Executor, RetryPolicy};
use tether::output::{self, StackOutputs};
use tether::planner::diff::compute_changes;
use tether::planner::{reconcile, AdoptionStrategy, PlanSummary, ReconciledPlan};
use tether::provider::{Lookups, ProvisioningEngine};
use tether::stack::build_stack;
use tether::state::{Snapshot, SqliteEngine};

/// tether - adoption-aware provisioning for a single-tier EC2 stack
#[derive(Parser)]
#[command(name = "tether", version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = parser::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Working directory for the local engine database
    #[arg(short, long, default_value = ".tether")]
    working_dir: String,

    /// Maximum parallelism for resource operations (overrides settings.parallelism)
    #[arg(short, long)]
    parallelism: Option<usize>,

    #[command(flatten)]
    env: EnvArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Environment selection and per-run overrides.
#[derive(Args)]
struct EnvArgs {
    /// Target environment (dev, stg, prod)
    #[arg(short, long, env = "TETHER_ENV", default_value = "dev", global = true)]
    env: String,

    /// Region to deploy into
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// Account id
    #[arg(long, env = "CDK_DEFAULT_ACCOUNT", global = true)]
    account: Option<String>,

    /// CPU architecture (ARM64 or X86_64)
    #[arg(long, env = "CPU_TYPE", global = true)]
    cpu_type: Option<String>,

    /// Instance size class (LARGE, XLARGE, XLARGE2, XLARGE4)
    #[arg(long, env = "INSTANCE_SIZE", global = true)]
    instance_size: Option<String>,

    /// Log level for this environment (INFO, WARN, ...)
    #[arg(long, env = "LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Public key authorized for the ec2-user account
    #[arg(long, env = "SSH_PUB_KEY", global = true)]
    ssh_pub_key: Option<String>,

    /// Adoption strategy (create or adopt)
    #[arg(long, global = true)]
    strategy: Option<String>,
}

impl EnvArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            account: self.account.clone(),
            cpu_type: self.cpu_type.clone(),
            instance_size: self.instance_size.clone(),
            log_level: self.log_level.clone(),
            ssh_pub_key: self.ssh_pub_key.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show what would be created, adopted or changed
    Plan {
        /// Only show resources whose address contains one of these
        #[arg(short, long)]
        target: Vec<String>,
    },
    /// Create and adopt resources
    Apply {
        /// Skip interactive approval
        #[arg(long)]
        auto_approve: bool,
    },
    /// Show the stack outputs
    Output {
        /// Print outputs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the dependency graph in DOT format
    Graph,
    /// Inspect the environment catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Validate configuration, catalog and stack wiring
    Validate,
    /// Inspect or seed the local engine
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// List all environments
    List,
    /// Show the physical ids bound for one environment
    Show {
        /// Environment name
        name: String,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List all objects known to the local engine
    List,
    /// Seed the local engine from a JSON snapshot
    Load {
        /// Snapshot file
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let overrides = cli.env.overrides();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let level = resolve_environment(&config, &cli.env.env, &overrides)
            .map(|env| env.log_level)
            .unwrap_or_else(|_| "INFO".to_string());
        EnvFilter::new(log_filter(&level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session {
        cli: &cli,
        config,
        overrides,
    };

    match cli.command {
        Commands::Plan { ref target } => cmd_plan(&session, target).await,
        Commands::Apply { auto_approve } => cmd_apply(&session, auto_approve).await,
        Commands::Output { json } => cmd_output(&session, json).await,
        Commands::Graph => cmd_graph(&session),
        Commands::Catalog { ref command } => cmd_catalog(&session, command),
        Commands::Validate => cmd_validate(&session),
        Commands::State { ref command } => cmd_state(&session, command),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Everything a command needs from the command line and config file.
struct Session<'a> {
    cli: &'a Cli,
    config: TetherConfig,
    overrides: Overrides,
}

impl Session<'_> {
    fn environment(&self) -> Result<Environment> {
        let env = resolve_environment(&self.config, &self.cli.env.env, &self.overrides)?;
        validator::validate_environment(&env)?;
        Ok(env)
    }

    fn strategy(&self) -> Result<AdoptionStrategy> {
        resolve_strategy(&self.config, &self.overrides)
    }

    /// The configured catalog file, or the built-in catalog.
    fn catalog(&self) -> Result<Catalog> {
        match &self.config.project.catalog {
            Some(path) => Catalog::load(Path::new(path))
                .with_context(|| format!("Failed to load catalog {}", path)),
            None => Ok(Catalog::builtin().clone()),
        }
    }

    fn parallelism(&self) -> usize {
        self.cli
            .parallelism
            .unwrap_or(self.config.project.settings.parallelism)
    }

    /// Open the engine database and register the configured lookups.
    fn open_engine(&self, region: &str) -> Result<SqliteEngine> {
        let db_path = format!("{}/tether.db", self.cli.working_dir);
        let engine = SqliteEngine::open(&db_path, region)?;

        let lookups = &self.config.project.engine;
        if !lookups.zones.is_empty() {
            engine.register_zones(region, &lookups.zones)?;
        }
        for (arch, ami) in &lookups.amis {
            engine.register_image(arch, ami)?;
        }
        Ok(engine)
    }
}

/// Resolve lookups, build the stack, reconcile it against the catalog and
/// compare with what the engine reports.
async fn plan_stack(
    session: &Session<'_>,
    env: &Environment,
    engine: &dyn ProvisioningEngine,
) -> Result<(ReconciledPlan, PlanSummary)> {
    let catalog = session.catalog()?;
    let mapping = catalog.lookup(env.name.as_str())?;
    let strategy = session.strategy()?;

    let lookups = Lookups::resolve(engine, &env.region, env.cpu_arch, mapping.ami_override())
        .await
        .context("Failed to resolve zone and image lookups")?;
    let plan = build_stack(env, &lookups)?;
    let reconciled = reconcile(strategy, &plan, mapping)?;

    tracing::info!(
        stack = %env.stack_name(),
        strategy = %strategy,
        adopt = reconciled.adopt_count(),
        create = reconciled.create_count(),
        "Reconciled stack"
    );

    let summary = compute_changes(&reconciled, engine).await?;
    Ok((reconciled, summary))
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn cmd_plan(session: &Session<'_>, targets: &[String]) -> Result<()> {
    let env = session.environment()?;
    let engine = session.open_engine(&env.region)?;

    let (_, summary) = plan_stack(session, &env, &engine).await?;
    output::formatter::print_plan(&summary, targets);
    Ok(())
}

async fn cmd_apply(session: &Session<'_>, auto_approve: bool) -> Result<()> {
    let env = session.environment()?;
    let engine = Arc::new(session.open_engine(&env.region)?);

    let (reconciled, summary) = plan_stack(session, &env, engine.as_ref()).await?;
    output::formatter::print_plan(&summary, &[]);

    if summary.is_converged() {
        println!("\n{}", "No changes. Infrastructure is up-to-date.".green());
        return Ok(());
    }

    if !auto_approve {
        println!(
            "\nDo you want to perform these actions? Only '{}' will be accepted.",
            "yes".bold()
        );
        print!("  Enter a value: ");
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "yes" {
            println!("\n{}", "Apply cancelled.".yellow());
            return Ok(());
        }
    }

    let run_id = engine.start_run(
        env.stack_name(),
        &reconciled.strategy.to_string(),
        summary.changes.len(),
    )?;

    let settings = &session.config.project.settings;
    let executor = Executor::new(
        session.parallelism(),
        RetryPolicy::new(settings.max_retries, settings.retry_delay_ms),
    );
    let shared: Arc<dyn ProvisioningEngine> = engine.clone();
    let result = executor.apply(&reconciled, &summary, shared).await?;

    let status = if result.is_success() {
        "succeeded"
    } else {
        "failed"
    };
    let succeeded = result.added + result.imported + result.changed + result.replaced;
    engine.complete_run(&run_id, status, succeeded, result.failed)?;

    output::formatter::print_apply_summary(&result);

    if !result.is_success() {
        bail!(
            "Apply finished with {} failed and {} skipped resource(s)",
            result.failed,
            result.skipped
        );
    }

    let outputs = StackOutputs::collect(engine.as_ref(), env.stack_name()).await?;
    output::formatter::print_outputs(&outputs);
    Ok(())
}

async fn cmd_output(session: &Session<'_>, json: bool) -> Result<()> {
    let env = session.environment()?;
    let engine = session.open_engine(&env.region)?;

    let outputs = StackOutputs::collect(&engine, env.stack_name()).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        output::formatter::print_outputs(&outputs);
    }
    Ok(())
}

/// Structural graph with create/adopt labels. No engine is queried.
fn cmd_graph(session: &Session<'_>) -> Result<()> {
    let env = session.environment()?;
    let catalog = session.catalog()?;
    let mapping = catalog.lookup(env.name.as_str())?;

    let plan = build_stack(&env, &Lookups::placeholder(&env.region))?;
    let reconciled = reconcile(session.strategy()?, &plan, mapping)?;

    let dot = to_dot(&plan, |address| {
        reconciled
            .disposition(address)
            .map(|disposition| disposition.label().to_string())
    });
    println!("{}", dot);
    Ok(())
}

fn cmd_catalog(session: &Session<'_>, command: &CatalogCommands) -> Result<()> {
    let catalog = session.catalog()?;

    match command {
        CatalogCommands::List => output::formatter::print_catalog(&catalog),
        CatalogCommands::Show { name } => {
            let env: EnvName = name.parse()?;
            let mapping = catalog.lookup(env.as_str())?;
            output::formatter::print_mapping(env, mapping);
        }
    }
    Ok(())
}

fn cmd_validate(session: &Session<'_>) -> Result<()> {
    validator::validate(&session.config)?;

    let catalog = session.catalog()?;
    catalog.validate()?;
    println!(
        "  {} Catalog: {} environment(s)",
        "→".blue(),
        catalog.entries().count()
    );

    let env = session.environment()?;
    let strategy = session.strategy()?;
    println!(
        "  {} Environment: {} ({}, {}, {})",
        "→".blue(),
        env.name.as_str(),
        env.stack_name(),
        env.region,
        env.instance_type()
    );

    let mapping = catalog.lookup(env.name.as_str())?;
    let plan = build_stack(&env, &Lookups::placeholder(&env.region))?;
    let errors = validate_dependency_coverage(&plan);
    if !errors.is_empty() {
        print_validation_errors(&errors);
        bail!("Stack has {} undeclared dependency(ies)", errors.len());
    }
    let reconciled = reconcile(strategy, &plan, mapping)?;
    println!(
        "  {} {} resource(s): {} to adopt, {} to create (strategy: {})",
        "→".blue(),
        plan.len(),
        reconciled.adopt_count(),
        reconciled.create_count(),
        strategy
    );

    output::formatter::print_success("Configuration is valid.");
    Ok(())
}

fn cmd_state(session: &Session<'_>, command: &StateCommands) -> Result<()> {
    let env = session.environment()?;
    let engine = session.open_engine(&env.region)?;

    match command {
        StateCommands::List => {
            let resources = engine.list_resources()?;
            output::formatter::print_resource_list(&resources);
        }
        StateCommands::Load { path } => {
            let snapshot = Snapshot::load(Path::new(path))?;
            let count = engine.load_snapshot(&snapshot)?;
            output::formatter::print_success(&format!(
                "Loaded {} object(s) from {}.",
                count, path
            ));
        }
    }
    Ok(())
}
