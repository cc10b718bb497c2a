use anyhow::{Context, Result};
use recipe_mixer::cli::{parse_args, parse_ingredient_spec, Command};
use recipe_mixer::config::FoodDataConfig;
use recipe_mixer::food_catalog::{CandidateSource, FoodCatalogClient};
use recipe_mixer::recipe_session::RecipeSession;
use tracing_subscriber::EnvFilter;

async fn run_search(client: &FoodCatalogClient, name: &str, max: Option<usize>) -> Result<()> {
    let candidates = match max {
        Some(max) => client.search_limited(name, max).await,
        None => client.search(name).await,
    }
    .with_context(|| format!("Search for '{}' failed", name))?;

    if candidates.is_empty() {
        println!("No food found for '{}'", name);
        return Ok(());
    }
    for candidate in candidates {
        let source = match candidate.source {
            CandidateSource::Parsed => "parsed",
            CandidateSource::Hint => "hint",
        };
        println!("{}\t{}\t{}", candidate.food_id, candidate.label, source);
    }
    Ok(())
}

async fn run_recipe(
    client: &FoodCatalogClient,
    config: &FoodDataConfig,
    raw_ingredients: &[String],
) -> Result<()> {
    let mut session = RecipeSession::new(client, config.allow_duplicate_ingredients);

    for raw in raw_ingredients {
        let spec = parse_ingredient_spec(raw)?;
        let candidates = session
            .search(&spec.name)
            .await
            .with_context(|| format!("Search for '{}' failed", spec.name))?;

        let Some(chosen) = candidates.first().cloned() else {
            println!("{}: {}", spec.name, session.candidate_placeholder());
            continue;
        };
        println!("{} -> {} ({})", spec.name, chosen.label, chosen.food_id);

        session
            .add_ingredient(&chosen.food_id, spec.quantity, &spec.measure)
            .await
            .with_context(|| format!("Could not add '{}'", spec.name))?;
    }

    println!();
    match session.placeholder() {
        Some(placeholder) => println!("{}", placeholder),
        None => print!("{}", session.table()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli_args = parse_args();
    let config = match &cli_args.config {
        Some(path) => FoodDataConfig::from_file(path)?,
        None => FoodDataConfig::from_env().context("Failed to load food-data credentials")?,
    };
    tracing::debug!(?config, "configuration loaded");

    let client = FoodCatalogClient::new(&config);
    match &cli_args.command {
        Command::Search { name, max } => run_search(&client, name, *max).await,
        Command::Recipe { ingredients } => run_recipe(&client, &config, ingredients).await,
    }
}
