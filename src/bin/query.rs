use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use macpicker::{
    config,
    entities::{Catalog, ProductRecord},
    query::{DEFAULT_SUGGESTION_LIMIT, FilterSpec, Tag, TagLogic, query, suggest},
};

/// Filter the refurbished Mac catalog.
#[derive(Parser, Debug)]
#[command(name = "macpicker-query", version)]
struct Args {
    /// Catalog file; defaults to MACPICKER_CATALOG_PATH or data/macs.json
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long)]
    price_min: Option<f64>,

    #[arg(long)]
    price_max: Option<f64>,

    /// Minimum unified memory in GB
    #[arg(long)]
    ram_min: Option<u32>,

    /// Minimum storage in GB
    #[arg(long)]
    ssd_min: Option<u32>,

    /// Free-text search over title, model id, chip, color and details
    #[arg(short = 'q', long = "query", default_value = "")]
    query: String,

    /// `category:text`, e.g. `芯片:M3 Pro` or `memory:16GB`; repeatable
    #[arg(long = "tag")]
    tags: Vec<Tag>,

    /// How multiple tags combine: AND or OR
    #[arg(long, default_value = "AND")]
    logic: TagLogic,

    /// Chip series, e.g. M2
    #[arg(long)]
    chip: Option<String>,

    /// Screen size in inches
    #[arg(long)]
    screen: Option<f64>,

    /// Only machines with 10 Gigabit Ethernet
    #[arg(long = "10gbe")]
    ten_gbe: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print tag suggestions for a partial query and exit
    #[arg(long, value_name = "PARTIAL")]
    suggest: Option<String>,

    #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
    limit: usize,
}

impl Args {
    fn filter(&self) -> FilterSpec {
        FilterSpec {
            price_min: self.price_min,
            price_max: self.price_max,
            ram_min: self.ram_min,
            ssd_min: self.ssd_min,
            query: self.query.clone(),
            tags: self.tags.clone(),
            tag_logic: self.logic,
            chip_series: self.chip.clone(),
            screen_in: self.screen,
            require_10gbe: self.ten_gbe,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let path = match &args.catalog {
        Some(path) => path.clone(),
        None => config::catalog_path_from_env(),
    };
    let catalog = Catalog::load(&path)
        .with_context(|| format!("failed to load catalog from {}", path.display()))?;
    debug!(items = catalog.len(), last_updated = %catalog.last_updated, "catalog loaded");

    if let Some(partial) = &args.suggest {
        let suggestions = suggest(&catalog.items, partial, args.limit);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        } else {
            for s in suggestions {
                println!("{}", Tag::from(s));
            }
        }
        return Ok(());
    }

    let spec = args.filter();
    let hits = query(&catalog, &spec);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("no matches");
    } else {
        for record in &hits {
            println!("{}", table_row(record));
        }
        println!("{} of {} items", hits.len(), catalog.len());
    }
    Ok(())
}

fn table_row(record: &ProductRecord) -> String {
    let gb = |v: Option<u32>| v.map(|v| format!("{v}GB")).unwrap_or_else(|| "-".to_string());
    format!(
        "¥{:>10.2}  {:<28}  {:>6} / {:<7}  {:<6}  {}",
        record.price_num,
        record.display_title,
        gb(record.specs.ram),
        gb(record.specs.ssd_gb),
        record.color.as_deref().unwrap_or("-"),
        record.link
    )
}
