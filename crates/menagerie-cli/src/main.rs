//! Menagerie demo CLI.
//!
//! Seeds the sample shelter data and runs the owner query two ways: owners
//! only, then the full graph. Registered filters apply unless
//! `--ignore-filters` is passed; in filtered mode the unfiltered graph is
//! printed alongside for comparison.

mod display;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use menagerie_core::model::{self, decode_owners};
use menagerie_core::query::{GraphQuery, QueryExecutor};
use menagerie_core::seed::{sample_filters, seed_sample_data};
use menagerie_core::storage::{StorageConfig, StorageEngine};

/// Menagerie demo CLI
#[derive(Parser, Debug)]
#[command(name = "menagerie")]
#[command(version, about = "Per-type query filter demo")]
struct Args {
    /// Database directory. Uses a throwaway in-memory database when omitted.
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Suppress all registered filters for this run.
    #[arg(long)]
    ignore_filters: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("menagerie=info".parse().expect("valid directive")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn with_mode(query: GraphQuery, ignore_filters: bool) -> GraphQuery {
    if ignore_filters {
        query.ignore_filters()
    } else {
        query
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.path {
        Some(path) => {
            info!(path = %path.display(), "opening database");
            StorageConfig::new(path)
        }
        None => {
            info!("using a temporary database");
            StorageConfig::temporary()
        }
    };
    let storage = StorageEngine::open(config)?;
    seed_sample_data(&storage)?;

    let schema = model::animal_schema();
    let registry = sample_filters(&schema)?;
    let executor = QueryExecutor::new(&storage, &schema, &registry);

    let full_query = || {
        GraphQuery::new(model::OWNER)
            .include("pets")
            .include("pets.favorite_toy")
            .include("pets.tolerates")
            .include("pets.friends_with")
    };

    if args.ignore_filters {
        println!("All owners:");
    } else {
        println!("Owners with at least one surviving pet:");
    }
    let roots = with_mode(GraphQuery::new(model::OWNER), args.ignore_filters);
    let owners = decode_owners(&executor.execute(&roots)?)?;
    print!("{}", display::render_owner_names(&owners));

    println!("\nGraph:");
    let graph = with_mode(full_query(), args.ignore_filters);
    let owners = decode_owners(&executor.execute(&graph)?)?;
    print!("{}", display::render_owners(&owners));

    if !args.ignore_filters {
        println!("\nUnfiltered graph:");
        let owners = decode_owners(&executor.execute(&full_query().ignore_filters())?)?;
        print!("{}", display::render_owners(&owners));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie_core::registry::FilterMode;

    #[test]
    fn test_ignore_filters_flag_routes_into_the_query_mode() {
        let args = Args::try_parse_from(["menagerie", "--ignore-filters"]).unwrap();
        assert!(args.ignore_filters);
        let query = with_mode(GraphQuery::new(model::OWNER), args.ignore_filters);
        assert_eq!(query.mode, FilterMode::IgnoreFilters);
    }

    #[test]
    fn test_filters_apply_by_default() {
        let args = Args::try_parse_from(["menagerie"]).unwrap();
        assert!(!args.ignore_filters);
        let query = with_mode(full_query_for_test(), args.ignore_filters);
        assert_eq!(query.mode, FilterMode::ApplyFilters);
    }

    fn full_query_for_test() -> GraphQuery {
        GraphQuery::new(model::OWNER).include("pets")
    }
}
