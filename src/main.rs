use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use snapblocks::config::EditorConfig;
use snapblocks::scene::{Scene, StepReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a block-editor drag script and print the resulting program", long_about = None)]
struct Cli {
    /// Scene file (JSON) with palette, placed blocks, links and script
    #[arg(value_name = "SCENE_FILE")]
    scene_file: Utf8PathBuf,

    /// Editor configuration (JSON); defaults are used when omitted
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<Utf8PathBuf>,

    /// Print the final graph state as JSON instead of step reports
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let scene = Scene::load(&cli.scene_file)?;
    let mut run = scene
        .build(config)
        .with_context(|| format!("Failed to build scene {}", cli.scene_file))?;
    let reports = run.replay(&scene.script)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&run.snapshot())?;
        println!("{}", json);
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        match report {
            StepReport::PickedUp { block, copy, detached_from } => {
                print!("{:>3}: picked up {}", i + 1, block);
                if let Some(copy) = copy {
                    print!(" (left copy {})", copy);
                }
                if let Some(parent) = detached_from {
                    print!(" (detached from {})", parent);
                }
                println!();
            }
            StepReport::Moved { .. } => {}
            StepReport::Placed { block, snapped_to, root, .. } => match snapped_to {
                Some(target) => println!("{:>3}: placed {} onto {} (tree {})", i + 1, block, target, root),
                None => println!("{:>3}: placed {}", i + 1, block),
            },
            StepReport::Deleted { blocks } => println!("{:>3}: deleted {}", i + 1, blocks.join(", ")),
            StepReport::Ignored => println!("{:>3}: ignored", i + 1),
        }
    }
    for program in run.programs() {
        println!("\n// {}", program.root);
        print!("{}", program.code);
    }
    Ok(())
}
