use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use picbak::config::{get_config_path, load_config_from};
use picbak::{
    backup_paths, collect_plan, dump_config, install_interrupt_handler, load_config,
    BackupContext, BackupOptions, BackupPlan, Config, InteractiveProvider, PathProvider,
    PicbakError, ProgressConfig, StaticProvider,
};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(error) => {
            eprintln!("Error: {error}");

            // Show suggestions if available
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\nSuggestions:");
                for suggestion in suggestions {
                    eprintln!("  - {suggestion}");
                }
            }

            process::exit(error.exit_code());
        }
    }
}

fn build_cli() -> Command {
    Command::new("picbak")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Back up pictures and videos into a mirrored directory tree")
        .long_about(
            "picbak walks one or more source directories and copies every picture and\n\
             video it finds into a destination directory, keeping each file's path\n\
             relative to its source root.\n\
             Example: picbak -d /mnt/backup ~/Pictures ~/Videos\n\
             Without --destination or --from-config the paths are read interactively.",
        )
        .arg(
            Arg::new("sources")
                .help("Source directories to back up")
                .num_args(1..)
                .value_name("SOURCE")
                .value_parser(value_parser!(PathBuf))
                .requires("destination"),
        )
        .arg(
            Arg::new("destination")
                .short('d')
                .long("destination")
                .help("Directory that receives the copies")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .requires("sources"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Read settings from this file instead of the default location")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("from-config")
                .long("from-config")
                .help("Take destination and sources from the config file")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["destination", "sources"]),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Show what would be copied without doing it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every file as it is copied")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["verbose", "progress"]),
        )
        .arg(
            Arg::new("ignore-case")
                .long("ignore-case")
                .help("Match file extensions regardless of case")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Force the progress bar on")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-progress"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Never draw the progress bar")
                .action(ArgAction::SetTrue)
                .conflicts_with("progress"),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .help("Display current configuration settings and exit")
                .action(ArgAction::SetTrue),
        )
}

fn run() -> Result<i32, PicbakError> {
    let matches = build_cli().get_matches();

    init_logging(matches.get_flag("verbose"), matches.get_flag("quiet"));

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => load_config_from(path)?,
        None => load_config().unwrap_or_else(|e| {
            warn!("Could not load config, using defaults: {e}");
            picbak::default_config()
        }),
    };
    if matches.get_flag("ignore-case") {
        config.case_insensitive_extensions = true;
    }

    // Handle dump-config flag early
    if matches.get_flag("dump-config") {
        let config_path = match matches.get_one::<PathBuf>("config") {
            Some(path) => path.clone(),
            None => get_config_path()?,
        };
        dump_config(&config, &config_path)?;
        return Ok(0);
    }

    let mut provider = select_provider(&matches, &config)?;
    let plan = match collect_plan(provider.as_mut())? {
        Some(plan) => plan,
        None => return Ok(0),
    };

    let context = BackupContext::new();
    install_interrupt_handler(context.clone())?;

    let options = BackupOptions {
        filter: config.extension_filter(),
        dry_run: matches.get_flag("dry-run"),
        progress: progress_config(&matches, &config),
        context,
    };

    run_backup(&plan, &options)
}

/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn default_log_level(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Command line paths win, then `--from-config`, then interactive prompts.
fn select_provider(
    matches: &ArgMatches,
    config: &Config,
) -> Result<Box<dyn PathProvider>, PicbakError> {
    if let Some(destination) = matches.get_one::<PathBuf>("destination") {
        let sources = matches
            .get_many::<PathBuf>("sources")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        return Ok(Box::new(StaticProvider::new(destination.clone(), sources)));
    }

    if matches.get_flag("from-config") {
        let (destination, sources) = config.static_paths().ok_or_else(|| {
            PicbakError::config(
                "--from-config needs both destination and sources in the config file",
            )
        })?;
        return Ok(Box::new(StaticProvider::new(destination, sources)));
    }

    Ok(Box::new(InteractiveProvider::new(
        io::stdin().lock(),
        io::stdout(),
    )))
}

fn progress_config(matches: &ArgMatches, config: &Config) -> ProgressConfig {
    let mut progress = ProgressConfig::auto_detect();
    if matches.get_flag("quiet") || matches.get_flag("no-progress") {
        progress.enabled = false;
    } else if matches.get_flag("progress") {
        progress.enabled = true;
    } else if !config.progress_bar {
        progress.enabled = false;
    }
    progress
}

fn run_backup(plan: &BackupPlan, options: &BackupOptions) -> Result<i32, PicbakError> {
    let result = backup_paths(&plan.sources, &plan.destination, options)?;

    info!("{}", result.summary());
    debug!("Duration: {:.2}s", result.duration.as_secs_f64());
    for failure in &result.failures {
        debug!("Failed: {failure}");
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> ArgMatches {
        build_cli()
            .try_get_matches_from(args.iter().copied())
            .unwrap()
    }

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_static_paths_from_command_line() {
        let matches = parse(&["picbak", "-d", "/mnt/backup", "/home/me/Pictures", "/home/me/Videos"]);
        let mut provider = select_provider(&matches, &Config::default()).unwrap();

        assert_eq!(provider.destination().unwrap(), PathBuf::from("/mnt/backup"));
        assert_eq!(
            provider.sources().unwrap(),
            vec![
                PathBuf::from("/home/me/Pictures"),
                PathBuf::from("/home/me/Videos")
            ]
        );
    }

    #[test]
    fn test_destination_and_sources_require_each_other() {
        assert!(build_cli()
            .try_get_matches_from(["picbak", "-d", "/mnt/backup"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["picbak", "/home/me/Pictures"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["picbak", "--from-config", "-d", "/a", "/b"])
            .is_err());
    }

    #[test]
    fn test_from_config_needs_paths() {
        let matches = parse(&["picbak", "--from-config"]);
        let err = select_provider(&matches, &Config::default())
            .err()
            .unwrap();
        assert!(matches!(err, PicbakError::Config { .. }));
        assert_eq!(err.exit_code(), 2);

        let config = Config {
            destination: Some(PathBuf::from("/mnt/backup")),
            sources: vec![PathBuf::from("/home/me/Pictures")],
            ..Config::default()
        };
        let mut provider = select_provider(&matches, &config).unwrap();
        assert_eq!(provider.destination().unwrap(), PathBuf::from("/mnt/backup"));
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(false, false), "info");
        assert_eq!(default_log_level(true, false), "debug");
        assert_eq!(default_log_level(false, true), "warn");
    }

    #[test]
    fn test_progress_flags_override_config() {
        let config = Config {
            progress_bar: false,
            ..Config::default()
        };
        assert!(!progress_config(&parse(&["picbak"]), &config).enabled);
        assert!(progress_config(&parse(&["picbak", "--progress"]), &config).enabled);
        assert!(!progress_config(&parse(&["picbak", "--no-progress"]), &Config::default()).enabled);
        assert!(!progress_config(&parse(&["picbak", "-q"]), &Config::default()).enabled);
    }

    #[test]
    fn test_run_backup() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(src.join("2022")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("2022").join("party.mp4"), vec![1u8; 300]).unwrap();

        let plan = BackupPlan {
            destination: dst.clone(),
            sources: vec![src],
        };
        assert_eq!(run_backup(&plan, &BackupOptions::default()).unwrap(), 0);
        assert_eq!(fs::read(dst.join("2022").join("party.mp4")).unwrap().len(), 300);
    }

    #[test]
    fn test_run_backup_dry_run() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.jpg"), "jpeg").unwrap();

        let plan = BackupPlan {
            destination: dst.clone(),
            sources: vec![src],
        };
        let options = BackupOptions {
            dry_run: true,
            ..BackupOptions::default()
        };
        assert_eq!(run_backup(&plan, &options).unwrap(), 0);
        assert!(!dst.join("a.jpg").exists());
    }

    #[test]
    fn test_run_backup_nothing_to_do() {
        let dir = tempdir().unwrap();
        let plan = BackupPlan {
            destination: dir.path().to_path_buf(),
            sources: vec![],
        };
        let err = run_backup(&plan, &BackupOptions::default()).unwrap_err();
        assert!(matches!(err, PicbakError::NothingToBackUp));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_destination_fails_before_estimation() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.jpg"), "jpeg").unwrap();
        let missing = dir.path().join("missing");

        let src_arg = src.to_string_lossy().into_owned();
        let dst_arg = missing.to_string_lossy().into_owned();
        let matches = parse(&["picbak", "-d", &dst_arg, &src_arg]);
        let mut provider = select_provider(&matches, &Config::default()).unwrap();

        let err = collect_plan(provider.as_mut()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.exit_code(), 2);
        assert!(!missing.exists());
    }
}
