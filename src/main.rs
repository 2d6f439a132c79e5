//! condatest CLI Entry Point
//!
//! Runs the scenario suite against a conda installation.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in scenarios
//! condatest
//!
//! # Run scenarios from a file and keep the environments afterwards
//! condatest scenarios.yaml --remove-env false
//!
//! # Use a specific binary and write a JSON report
//! condatest --conda /opt/conda/bin/conda --report target/condatest.json
//!
//! # Print the scenarios that would run
//! condatest scenarios.yaml --list
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use condatest::config::{parse_bool, HarnessConfig};
use condatest::environment::SystemCli;
use condatest::harness::{
    load_scenarios, scenarios_to_yaml, validate_scenarios, Outcome, Scenario, ScenarioRunner,
    SuiteReport,
};
use condatest::{APP_NAME, VERSION};

/// What the binary should do once arguments are parsed.
#[derive(Debug, PartialEq)]
enum Action {
    Run,
    List,
    Help,
    Version,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("conda Environment Test Harness");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: condatest [OPTIONS] [SCENARIO_FILE]");
    println!();
    println!("Arguments:");
    println!("  [SCENARIO_FILE]        YAML scenario file (default: built-in suite)");
    println!();
    println!("Options:");
    println!("  --remove-env BOOL      Remove environments after each scenario (default: true)");
    println!("  --conda PATH           conda binary to drive (default: $CONDA_EXE or PATH)");
    println!("  --root-prefix PATH     Export MAMBA_ROOT_PREFIX to the tool");
    println!("  --default-packages     Install .condarc default packages on create");
    println!("  --report PATH          Write a JSON report of the run");
    println!("  --list                 Print the scenarios and exit");
    println!("  --verbose              Enable debug logging");
    println!("  --help                 Show this help message");
    println!("  --version              Show version information");
    println!();
    println!("Examples:");
    println!("  condatest");
    println!("  condatest scenarios.yaml --remove-env false");
    println!("  condatest --conda /opt/conda/bin/conda --report run.json");
}

/// Fetches the value following an option.
fn option_value<'a>(args: &'a [String], i: &mut usize, option: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", option))
}

/// Parses command-line arguments on top of a base configuration.
fn parse_arguments(args: &[String], mut config: HarnessConfig) -> Result<(HarnessConfig, Action), String> {
    let mut action = Action::Run;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => action = Action::Help,
            "--version" | "-V" => action = Action::Version,
            "--list" => action = Action::List,
            "--verbose" | "-v" => config.verbose = true,
            "--default-packages" => config.install_default_packages = true,
            "--remove-env" => {
                let value = option_value(args, &mut i, "--remove-env")?;
                config.remove_env = parse_bool(value)
                    .ok_or_else(|| format!("Invalid --remove-env value: {}", value))?;
            }
            "--conda" => {
                config.conda_path = Some(PathBuf::from(option_value(args, &mut i, "--conda")?));
            }
            "--root-prefix" => {
                config.root_prefix = Some(PathBuf::from(option_value(args, &mut i, "--root-prefix")?));
            }
            "--report" => {
                config.report_path = Some(PathBuf::from(option_value(args, &mut i, "--report")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.scenario_file.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.scenario_file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok((config, action))
}

/// Loads scenarios from the configured file, or the built-in suite.
fn resolve_scenarios(config: &HarnessConfig) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    match config.scenario_file {
        Some(ref path) => load_scenarios(path),
        None => {
            let scenarios = Scenario::defaults();
            validate_scenarios(&scenarios)?;
            info!("Using built-in scenarios");
            Ok(scenarios)
        }
    }
}

/// Prints the per-scenario results with colored status.
fn print_results(report: &SuiteReport) {
    println!();
    for scenario in &report.scenarios {
        let status = match scenario.outcome {
            Outcome::Passed => "PASS".green().bold(),
            Outcome::Failed(_) => "FAIL".red().bold(),
        };
        println!(
            "{} {} [{}] ({} ms)",
            status,
            scenario.name,
            scenario.packages.join(", "),
            scenario.duration_ms
        );
        if let Outcome::Failed(ref reason) = scenario.outcome {
            println!("     {}", reason.dimmed());
        }
    }

    let totals = format!("{} passed, {} failed", report.passed(), report.failed());
    println!();
    if report.all_passed() {
        println!("{} in {:.2?}", totals.green(), report.total_duration());
    } else {
        println!("{} in {:.2?}", totals.red(), report.total_duration());
    }
}

/// Main application entry point. Returns whether every scenario passed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // `main` prints the error itself
    let (config, action) = parse_arguments(&args, HarnessConfig::from_env()?).map_err(|e| {
        print_usage();
        e
    })?;

    match action {
        Action::Help => {
            print_usage();
            return Ok(true);
        }
        Action::Version => {
            println!("{} {}", APP_NAME, VERSION);
            return Ok(true);
        }
        Action::List | Action::Run => {}
    }

    setup_logging(config.verbose);

    let scenarios = resolve_scenarios(&config).map_err(|e| {
        error!("Failed to load scenarios: {}", e);
        e
    })?;

    if action == Action::List {
        print!("{}", scenarios_to_yaml(&scenarios)?);
        return Ok(true);
    }

    print_banner();
    info!("conda binary: {}", config.conda_binary().display());
    if !config.remove_env {
        info!("Environments will be kept after the run");
    }

    let cli = SystemCli::from_config(&config);
    let runner = ScenarioRunner::new(&cli, &config);
    let report = runner.run_all(&scenarios);

    print_results(&report);

    if let Some(ref path) = config.report_path {
        report.save(path)?;
    }

    Ok(report.all_passed())
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        std::iter::once("condatest")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn base() -> HarnessConfig {
        HarnessConfig::with_conda("conda")
    }

    #[test]
    fn test_parse_defaults() {
        let (config, action) = parse_arguments(&argv(&[]), base()).unwrap();
        assert_eq!(action, Action::Run);
        assert!(config.remove_env);
        assert!(config.scenario_file.is_none());
    }

    #[test]
    fn test_parse_remove_env_false() {
        let (config, _) = parse_arguments(&argv(&["--remove-env", "False"]), base()).unwrap();
        assert!(!config.remove_env);
    }

    #[test]
    fn test_parse_remove_env_invalid() {
        let result = parse_arguments(&argv(&["--remove-env", "sometimes"]), base());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_value() {
        let result = parse_arguments(&argv(&["--conda"]), base());
        assert_eq!(result.unwrap_err(), "--conda requires a value");
    }

    #[test]
    fn test_parse_all_options() {
        let (config, action) = parse_arguments(
            &argv(&[
                "suite.yaml",
                "--conda",
                "/opt/conda/bin/conda",
                "--root-prefix",
                "/tmp/root",
                "--report",
                "run.json",
                "--default-packages",
                "--list",
                "-v",
            ]),
            base(),
        )
        .unwrap();

        assert_eq!(action, Action::List);
        assert_eq!(config.scenario_file, Some(PathBuf::from("suite.yaml")));
        assert_eq!(config.conda_path, Some(PathBuf::from("/opt/conda/bin/conda")));
        assert_eq!(config.root_prefix, Some(PathBuf::from("/tmp/root")));
        assert_eq!(config.report_path, Some(PathBuf::from("run.json")));
        assert!(config.install_default_packages);
        assert!(config.verbose);
    }

    #[test]
    fn test_parse_error_is_unprefixed() {
        let err = parse_arguments(&argv(&["--bogus"]), base()).unwrap_err();
        assert_eq!(err, "Unknown option: --bogus");
    }

    #[test]
    fn test_parse_rejects_unknown_and_extra() {
        assert!(parse_arguments(&argv(&["--bogus"]), base()).is_err());
        assert!(parse_arguments(&argv(&["a.yaml", "b.yaml"]), base()).is_err());
    }

    #[test]
    fn test_resolve_builtin_scenarios() {
        let scenarios = resolve_scenarios(&base()).unwrap();
        assert_eq!(scenarios, Scenario::defaults());
    }
}
