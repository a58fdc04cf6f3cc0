use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::command::Composer;
use crate::config::{self, Config};
use crate::distro::{self, DistroDetector, OsRelease};
use crate::exec::{DryRun, Executor, System};
use crate::manager::{Action, Catalog};
use crate::select::{self, Flags};
use crate::store::StoreFile;
use crate::sync;

#[derive(Parser, Debug)]
#[command(name = "pakt", version, about = "Track packages installed through native package managers and sync them to a fresh machine.")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Use flatpak instead of the system package manager
    #[arg(short = 'f', long, global = true, default_value_t = false)]
    flatpak: bool,
    /// Use nix (nix-env) instead of the system package manager
    #[arg(short = 'n', long, global = true, default_value_t = false)]
    nix: bool,
    /// Run through the system package manager and then flatpak
    #[arg(short = 'a', long, global = true, default_value_t = false)]
    update_all: bool,
    /// Print commands instead of running them; the tracking store is left alone
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,
    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a package and start tracking it
    Install(PkgArg),
    /// Remove a package and stop tracking it
    Remove(PkgArg),
    /// Update one package, or everything when no name is given
    Update(OptPkgArg),
    /// Install every tracked package through its package manager
    Sync,
    /// Show tracked packages
    List,
    /// Check environment (config location, distro, package managers on PATH)
    Doctor,
}

#[derive(Args, Debug, Clone)]
pub struct PkgArg {
    /// Package name
    name: String,
}

#[derive(Args, Debug, Clone)]
pub struct OptPkgArg {
    /// Package name
    name: Option<String>,
}

struct Env {
    config: Config,
    store: StoreFile,
    composer: Composer,
    executor: Box<dyn Executor>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let dir = config::config_dir()?;
    let config = config::load_config(&dir);
    let composer = Composer::new(Catalog::builtin(), config.escalation.clone());
    let executor: Box<dyn Executor> = if cli.dry_run { Box::new(DryRun) } else { Box::new(System) };
    let mut env = Env { store: StoreFile::new(config::store_path(&dir)), config, composer, executor };

    match &cli.command {
        Commands::Install(arg) => package_action(&cli, &mut env, Action::Install, Some(&arg.name)),
        Commands::Remove(arg) => package_action(&cli, &mut env, Action::Remove, Some(&arg.name)),
        Commands::Update(arg) => package_action(&cli, &mut env, Action::Update, arg.name.as_deref()),
        Commands::Sync => sync_cmd(&mut env),
        Commands::List => list(&env),
        Commands::Doctor => doctor(&env, &dir),
    }
}

fn package_action(cli: &Cli, env: &mut Env, action: Action, name: Option<&str>) -> Result<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(anyhow!("package name must not be empty"));
    }
    let detector = OsRelease::default();
    let cx = select::Context {
        flags: Flags { flatpak: cli.flatpak, nix: cli.nix, update_all: cli.update_all },
        default_manager: env.config.default_manager.as_deref(),
        detector: &detector,
        catalog: *env.composer.catalog(),
    };
    let managers = select::select(&cx).context("selecting a package manager")?;

    let packages: Vec<String> = name.map(|n| vec![n.to_string()]).unwrap_or_default();
    let composed = env.composer.compose_for(action, &managers, &packages)?;
    log::debug!("{} via [{}]: {}", action, managers.join(", "), composed.chain.render());
    env.executor.run(&composed.chain).with_context(|| format!("{action} failed"))?;

    if cli.dry_run {
        return Ok(());
    }
    let Some(name) = name else { return Ok(()) };
    let tracked = match action {
        Action::Install => env.store.update(|s| composed.targets.iter().fold(false, |changed, m| s.add(m, name) | changed)),
        Action::Remove => env.store.update(|s| composed.targets.iter().fold(false, |changed, m| s.remove(m, name) | changed)),
        Action::Update => return Ok(()),
    };
    match tracked {
        Ok(true) => log::info!("tracking updated: {} {} [{}]", action, name, composed.targets.join(", ")),
        Ok(false) => log::debug!("tracking store already up to date for {}", name),
        Err(e) => log::warn!("{} succeeded but the tracking store was not updated: {}", action, e),
    }
    Ok(())
}

fn sync_cmd(env: &mut Env) -> Result<()> {
    let store = env.store.load().with_context(|| format!("loading {}", env.store.path().display()))?;
    if store.is_empty() {
        println!("Nothing to sync: no packages tracked in {}", env.store.path().display());
        return Ok(());
    }
    let report = sync::sync(&store, &env.composer, env.executor.as_mut());
    if !report.is_success() {
        let failed: Vec<String> = report.failed.iter().map(|f| format!("{} ({})", f.manager, f.error)).collect();
        return Err(anyhow!("sync failed for: {}", failed.join("; ")));
    }
    Ok(())
}

fn list(env: &Env) -> Result<()> {
    let store = env.store.load().with_context(|| format!("loading {}", env.store.path().display()))?;
    if store.is_empty() {
        println!("No packages tracked yet");
        return Ok(());
    }
    let mut managers: Vec<_> = store.package_managers.iter().collect();
    managers.sort_by_key(|(id, _)| env.composer.catalog().rank(id));
    println!("MANAGER\tPACKAGES");
    for (manager, packages) in managers {
        println!("{}\t{}", manager, packages.join(" "));
    }
    Ok(())
}

fn doctor(env: &Env, dir: &std::path::Path) -> Result<()> {
    println!("pakt doctor:");
    println!("- config dir: {}", dir.display());

    let path = env.store.path();
    if !path.exists() {
        println!("- tracking store: {} (not created yet)", path.display());
    } else {
        match env.store.load() {
            Ok(s) => {
                let count: usize = s.package_managers.values().map(Vec::len).sum();
                println!("- tracking store: {} ({} packages, {} managers)", path.display(), count, s.package_managers.len());
            }
            Err(e) => println!("- tracking store: BROKEN ({e})"),
        }
    }

    match OsRelease::default().detect() {
        Ok(id) => {
            let m = distro::manager_for_distro(&id).unwrap_or("none");
            println!("- distro: {} (system manager: {})", if id.is_empty() { "unknown" } else { id.as_str() }, m);
        }
        Err(e) => println!("- distro: detection failed ({e})"),
    }
    if let Some(m) = &env.config.default_manager {
        let known = env.composer.catalog().lookup(m).is_some();
        println!("- default_manager from config: {}{}", m, if known { "" } else { " (NOT a supported manager)" });
    }

    for spec in env.composer.catalog().specs() {
        match which::which(spec.program) {
            Ok(p) => println!("- {}: found at {}", spec.id, p.display()),
            Err(_) => println!("- {}: {} not found", spec.id, spec.program),
        }
    }
    let esc = env.composer.escalation();
    println!("- escalation ({}): {}", esc, yes_no(which::which(esc).is_ok()));
    Ok(())
}

fn yes_no(b: bool) -> &'static str { if b { "found" } else { "NOT FOUND" } }

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel { Trace, Debug, Info, Warn, Error }

fn init_logger(level: Option<LogLevel>) {
    let filter = match level.unwrap_or(LogLevel::Info) {
        LogLevel::Trace => log::LevelFilter::Trace,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter);
    let _ = builder.try_init();
}
