//! rimeflow CLI - Aggregate rime tables into chart models
//!
//! # Main Commands
//!
//! ```bash
//! rimeflow serve                   # Start HTTP server (port 3000)
//! rimeflow aggregate input.csv     # Build graph + distribution models
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! rimeflow parse input.csv         # Just decode the table to JSON rows
//! ```

use clap::{Parser, Subcommand};
use rimeflow::{
    aggregate, parse_table_file, FieldConfig, JsonRenderer, Renderer, SourceRegistry,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rimeflow")]
#[command(about = "Aggregate rime-category tables into flow and distribution charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a table file and output its rows as JSON
    Parse {
        /// Input table file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate a table into the flow graph and distribution models
    Aggregate {
        /// Input table file
        input: PathBuf,

        /// Column holding the edge-source category
        #[arg(long, default_value = "上古韵部")]
        source_field: String,

        /// Column holding the edge-target category
        #[arg(long, default_value = "中古韵部")]
        target_field: String,

        /// Column supplying edge provenance labels
        #[arg(long, default_value = "韵字")]
        label_field: String,

        /// Column read when the label column is absent
        #[arg(long, default_value = "代表字")]
        label_fallback: String,

        /// Column the distribution counts over
        #[arg(long, default_value = "上古韵部")]
        distribution_field: String,

        /// Suffix appended to source-side node labels
        #[arg(long, default_value = "(上古)")]
        source_suffix: String,

        /// Suffix appended to target-side node labels
        #[arg(long, default_value = "(中古)")]
        target_suffix: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Directory holding the registered table files
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Directory holding the static frontend
        #[arg(long, default_value = "www")]
        static_dir: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Aggregate {
            input,
            source_field,
            target_field,
            label_field,
            label_fallback,
            distribution_field,
            source_suffix,
            target_suffix,
            output,
        } => {
            let config = FieldConfig {
                source_field,
                target_field,
                label_field,
                label_fallback,
                distribution_field,
                source_suffix,
                target_suffix,
            };
            cmd_aggregate(&input, &config, output.as_deref())
        }

        Commands::Serve {
            port,
            data_dir,
            static_dir,
        } => cmd_serve(port, &data_dir, &static_dir).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Decoding table: {}", input.display());

    let table = parse_table_file(input)?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(table.delimiter));
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Decoded {} rows", table.records.len());

    let json = serde_json::to_string_pretty(&table.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_aggregate(
    input: &Path,
    config: &FieldConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    eprintln!("📄 Aggregating: {}", input.display());
    let table = parse_table_file(input)?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!("   Rows: {}", table.records.len());
    eprintln!(
        "   Flow: {} → {} (labels from {})",
        config.source_field, config.target_field, config.label_field
    );

    let models = aggregate(&table.records, config);

    eprintln!(
        "⚙️  Built {} nodes, {} edges (total weight {})",
        models.graph.nodes.len(),
        models.graph.edges.len(),
        models.graph.total_weight()
    );
    let skipped = table.records.len() as u64 - models.graph.total_weight();
    if skipped > 0 {
        eprintln!("   ⚠️  {} rows skipped (missing endpoint fields)", skipped);
    }
    eprintln!(
        "📊 Distribution over '{}': {} categories, {} rows counted",
        config.distribution_field,
        models.distribution.entries.len(),
        models.distribution.total_count()
    );

    match output {
        Some(p) => {
            let file = fs::File::create(p)?;
            let mut renderer = JsonRenderer::new(file);
            renderer.render_graph(&models.graph);
            renderer.render_distribution(&models.distribution);
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            let mut renderer = JsonRenderer::new(std::io::stdout());
            renderer.render_graph(&models.graph);
            renderer.render_distribution(&models.distribution);
        }
    }

    eprintln!("✨ Done!");
    Ok(())
}

async fn cmd_serve(
    port: u16,
    data_dir: &str,
    static_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = SourceRegistry::with_data_dir(data_dir);
    rimeflow::server::start_server(port, registry, FieldConfig::default(), static_dir).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
