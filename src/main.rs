//! Layer Stack CLI
//!
//! Usage:
//!   layer-stack [OPTIONS] --action <ACTION> <SCENE>
//!
//! Options:
//!   -a, --action <ACTION>         Action to apply
//!   -s, --select <IDS>            Override the scene's selection (comma separated)
//!   -e, --editing-group <GROUP>   Group being edited
//!   -c, --config <FILE>           Engine configuration (TOML format)
//!       --check                   Validate the resulting order
//!       --sequential-ids <PREFIX> Deterministic ids for new layers and groups
//!   -v, --verbose                 Log applied edits
//!   -h, --help                    Print help

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use layer_stack::{
    apply, format_summary, validate_order, Action, Alignment, Axis, EngineConfig, IdGenerator,
    RandomIds, Scene, SequentialIds,
};

#[derive(Parser)]
#[command(name = "layer-stack")]
#[command(about = "Apply a structural edit to a layered canvas scene")]
struct Cli {
    /// Scene file (TOML format)
    scene: PathBuf,

    /// Action to apply
    #[arg(short, long, value_enum)]
    action: CliAction,

    /// Layer ids to select instead of the scene's selection
    #[arg(short, long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Group currently being edited
    #[arg(short, long)]
    editing_group: Option<String>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the resulting order and fail on violations
    #[arg(long)]
    check: bool,

    /// Generate `PREFIX-N` ids instead of random ones
    #[arg(long, value_name = "PREFIX")]
    sequential_ids: Option<String>,

    /// Log applied edits (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliAction {
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
    Duplicate,
    Group,
    Ungroup,
    AlignLeft,
    AlignRight,
    AlignTop,
    AlignBottom,
    AlignHorizontalCenter,
    AlignVerticalCenter,
    DistributeHorizontal,
    DistributeVertical,
}

impl From<CliAction> for Action {
    fn from(action: CliAction) -> Self {
        match action {
            CliAction::BringForward => Action::BringForward,
            CliAction::SendBackward => Action::SendBackward,
            CliAction::BringToFront => Action::BringToFront,
            CliAction::SendToBack => Action::SendToBack,
            CliAction::Duplicate => Action::Duplicate,
            CliAction::Group => Action::Group,
            CliAction::Ungroup => Action::Ungroup,
            CliAction::AlignLeft => Action::Align(Alignment::left()),
            CliAction::AlignRight => Action::Align(Alignment::right()),
            CliAction::AlignTop => Action::Align(Alignment::top()),
            CliAction::AlignBottom => Action::Align(Alignment::bottom()),
            CliAction::AlignHorizontalCenter => Action::Align(Alignment::horizontal_center()),
            CliAction::AlignVerticalCenter => Action::Align(Alignment::vertical_center()),
            CliAction::DistributeHorizontal => Action::Distribute(Axis::X),
            CliAction::DistributeVertical => Action::Distribute(Axis::Y),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if cli.check {
        config = config.with_check_invariants(true);
    }

    // Load scene
    let scene = match Scene::from_file(&cli.scene) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading scene '{}': {}", cli.scene.display(), e);
            std::process::exit(1);
        }
    };

    let selection = match &cli.select {
        Some(ids) => scene.select(ids.as_slice(), cli.editing_group.as_deref()),
        None => match &cli.editing_group {
            Some(group) => {
                let ids: Vec<&str> = scene
                    .selection
                    .selected_layer_ids
                    .iter()
                    .map(|id| id.as_str())
                    .collect();
                scene.select(ids.as_slice(), Some(group.as_str()))
            }
            None => Ok(scene.selection.clone()),
        },
    };
    let selection = match selection {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut ids: Box<dyn IdGenerator> = match &cli.sequential_ids {
        Some(prefix) => Box::new(SequentialIds::new(prefix.as_str())),
        None => Box::new(RandomIds),
    };

    let outcome = apply(
        &scene.layers,
        &selection,
        cli.action.into(),
        &config,
        ids.as_mut(),
    );

    println!("{}", format_summary(&outcome.layers, &outcome.selection));
    if !outcome.commit {
        println!("(no change)");
    }

    if cli.check {
        if let Err(violations) = validate_order(&outcome.layers) {
            for violation in violations {
                eprintln!("Invariant violated: {}", violation);
            }
            std::process::exit(1);
        }
    }
}
