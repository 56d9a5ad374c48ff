//! Command-line entry point: loads the Akyno grammar (or another
//! `grammar.json`) and reports what it defines.
use akyno::{Language, SymbolTable};
use anyhow::Context;
use facet::Facet;
use std::path::Path;
use std::process::ExitCode;

#[derive(Facet)]
struct Args {
    /// Load this `grammar.json` instead of the bundled artifact.
    #[facet(named, short = 'g', default)]
    grammar: Option<String>,

    /// Print the generated `node-types.json`.
    #[facet(named, default)]
    types: bool,

    /// Print the symbol and field tables.
    #[facet(named, default)]
    symbols: bool,

    /// Only report failures.
    #[facet(named, short = 'q', default)]
    quiet: bool,
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args: Args = facet_args::from_std_args()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("invalid arguments")?;

    let language = match &args.grammar {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {path}"))?;
            Language::from_json(&display_name(path), &json)?
        }
        None => akyno::language()?,
    };

    if args.types {
        let json = akyno::node_types::to_json(language.node_types())
            .context("cannot encode node types")?;
        println!("{json}");
    }
    if args.symbols {
        print_symbols(language.symbols());
    }
    if !args.quiet && !args.types && !args.symbols {
        println!(
            "Loaded {} grammar: {} node kinds, {} fields, start rule '{}'",
            language.display_name(),
            language.node_kind_count(),
            language.field_count(),
            language.node_kind_for_id(language.start_symbol()).unwrap_or_default(),
        );
    }
    Ok(())
}

/// Names an external artifact after its grammar directory
/// (`tree-sitter-json/src/grammar.json` becomes `json`), or else its file stem.
fn display_name(path: &str) -> String {
    let path = Path::new(path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("custom");
    if stem == "grammar" {
        if let Some(dir) = path
            .parent()
            .filter(|dir| dir.ends_with("src"))
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
        {
            return dir.trim_start_matches("tree-sitter-").to_string();
        }
    }
    stem.to_string()
}

fn print_symbols(symbols: &SymbolTable) {
    for (id, info) in symbols.iter() {
        let mut flags = Vec::new();
        if info.named {
            flags.push("named");
        }
        if !info.visible {
            flags.push("hidden");
        }
        if info.supertype {
            flags.push("supertype");
        }
        println!("{id:>5}  {:?}  {}  [{}]", info.kind, info.name, flags.join(", "));
    }
    for (id, name) in symbols.fields() {
        println!("field {id:>3}  {name}");
    }
}
