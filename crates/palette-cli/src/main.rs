// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use palette_app::{LookupStrategy, Navigator};
use runtime::SourceRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `palette --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let strategy = options
        .strategy_override
        .unwrap_or_else(|| config.strategy());
    let tasks = config.task_items();
    let source = runtime::build_source(strategy, &config, &tasks).with_context(|| {
        format!(
            "invalid [backend] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    let delay = runtime::lookup_delay(strategy, &config)?;
    if options.check_only {
        return Ok(());
    }

    let log_path = config.log_path()?;
    logging::init_file_logging(&log_path, &config.log_level())?;
    info!(
        strategy = strategy.as_str(),
        tasks = tasks.len(),
        config = %options.config_path.display(),
        "starting palette"
    );

    let mut navigator = Navigator::with_tasks(tasks);
    let mut runtime = SourceRuntime::new(source, delay);
    palette_tui::run_app(&mut navigator, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    strategy_override: Option<LookupStrategy>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        strategy_override: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--strategy" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--strategy requires canned or remote"))?;
                let strategy = LookupStrategy::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown strategy {:?}; expected canned or remote",
                        value.as_ref()
                    )
                })?;
                options.strategy_override = Some(strategy);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("palette");
    println!("  --config <path>             Use a specific config path");
    println!("  --strategy <canned|remote>  Override [lookup].strategy");
    println!("  --print-config-path         Print resolved config path");
    println!("  --print-example-config      Print a config template");
    println!("  --check                     Validate config and the lookup backend setup");
    println!("  --help                      Show this help");
}
