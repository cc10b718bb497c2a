use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML config file; the environment (and .env) is used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the foods matching a name
    Search {
        name: String,
        /// Maximum number of candidates to show
        #[arg(short, long)]
        max: Option<usize>,
    },
    /// Add ingredients and print the nutrition table
    Recipe {
        /// "<name>:<quantity>:<measure>", e.g. "banana:2:unit"
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
    },
}

/// One `--ingredient` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientSpec {
    pub name: String,
    pub quantity: Option<f64>,
    pub measure: String,
}

/// Parses `name[:quantity[:measure]]`. Quantity defaults to none (0),
/// measure to gram. Names may themselves contain colons only if both
/// trailing fields are given.
pub fn parse_ingredient_spec(raw: &str) -> Result<IngredientSpec> {
    let mut parts = raw.rsplitn(3, ':').collect::<Vec<_>>();
    parts.reverse();
    let (name, quantity, measure) = match parts.as_slice() {
        [name] => (*name, None, "gram"),
        [name, quantity] => (*name, Some(*quantity), "gram"),
        [name, quantity, measure] => (*name, Some(*quantity), *measure),
        _ => return Err(anyhow!("empty ingredient specification")),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("ingredient name missing in '{}'", raw));
    }
    let quantity = match quantity.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => Some(
            q.parse::<f64>()
                .with_context(|| format!("invalid quantity '{}' in '{}'", q, raw))?,
        ),
        None => None,
    };

    Ok(IngredientSpec {
        name: name.to_string(),
        quantity,
        measure: measure.trim().to_string(),
    })
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
