use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use sortsplit::cli::{Cli, Command, StatsArgs};
use sortsplit::core::{
    count_label_tree, count_split_tree, create_subset, render_bars, run_pipeline, sort_images,
    split_dataset, ExtensionFilter,
};
use sortsplit::logging::setup_logging;
use sortsplit::PartitionConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_dir.as_deref(), cli.verbose).context("failed to set up logging")?;

    info!("Starting sortsplit");
    let mut config = load_config(&cli)?;

    match &cli.command {
        Command::Sort(args) => {
            args.apply(&mut config);
            let report = sort_images(&config).context("sorting images failed")?;
            print_report(cli.json, &report)?;
        }
        Command::Split(args) => {
            args.apply(&mut config);
            let mut rng = seeded_rng(&config);
            let report = split_dataset(&config, &mut rng).context("splitting dataset failed")?;
            print_report(cli.json, &report)?;
        }
        Command::Subset(args) => {
            args.apply(&mut config);
            let mut rng = seeded_rng(&config);
            let report = create_subset(&config, &mut rng).context("creating subset failed")?;
            print_report(cli.json, &report)?;
        }
        Command::Stats(args) => print_stats(&config, args, cli.json)?,
        Command::Run(args) => {
            args.apply(&mut config);
            let mut rng = seeded_rng(&config);
            let report = run_pipeline(&config, &mut rng).context("pipeline failed")?;
            print_report(cli.json, &report)?;
        }
    }

    info!("Done!");
    Ok(())
}

/// Defaults, then the config file, then the global `--seed`
fn load_config(cli: &Cli) -> Result<PartitionConfig> {
    let mut config = match &cli.config {
        Some(path) => PartitionConfig::load_file(path)?,
        None => PartitionConfig::discover(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn seeded_rng(config: &PartitionConfig) -> StdRng {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);
    StdRng::seed_from_u64(seed)
}

fn print_report<T: Serialize>(json: bool, report: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

fn print_stats(config: &PartitionConfig, args: &StatsArgs, json: bool) -> Result<()> {
    let filter = ExtensionFilter::new(&config.allowed_extensions);

    if let Some(tree) = &args.tree {
        let counts = count_label_tree(tree, &filter)?;
        if json {
            return print_report(true, &counts);
        }
        if counts.is_empty() {
            warn!("No images found in subdirectories of {:?}", tree);
            return Ok(());
        }
        let rows: Vec<(String, usize)> = counts.iter().map(|c| (c.label.clone(), c.count)).collect();
        println!("Label Distribution Summary:");
        for c in &counts {
            println!("{}: {} images", c.label, c.count);
        }
        println!();
        print!("{}", render_bars(&rows, args.width));
    }

    if let Some(sorted) = &args.split_tree {
        let dist = count_split_tree(sorted, config.training_name(), config.testing_name(), &filter)?;
        if json {
            return print_report(true, &dist);
        }
        println!("{:<20} {:>10} {:>10}", "Class", "Training", "Testing");
        for c in &dist.classes {
            println!("{:<20} {:>10} {:>10}", c.label, c.training, c.testing);
        }
        println!(
            "{:<20} {:>10} {:>10}  ({:.1}% training)",
            "Total",
            dist.total_training,
            dist.total_testing,
            dist.training_percentage()
        );
    }

    Ok(())
}
