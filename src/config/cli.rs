use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "recommender")]
#[command(about = "Recommend restaurants by review sentiment")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "recommender.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search, rank and save the best restaurant
    Recommend(RecommendArgs),
    /// Show saved recommendations
    History,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RecommendArgs {
    /// Food type, e.g. pizza or sushi
    #[arg(short, long, required_unless_present = "place_id")]
    pub food: Option<String>,

    /// Location; defaults to the configured location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Look up a single place by id instead of searching
    #[arg(long, conflicts_with = "food")]
    pub place_id: Option<String>,

    /// Number of top picks to show
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not write to the history table
    #[arg(long)]
    pub no_history: bool,
}
