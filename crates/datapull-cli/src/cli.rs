use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "datapull")]
#[command(about = "DataPull - Google Maps lead generation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Redis URL, defaults to one built from REDIS_HOST and REDIS_PORT
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how a query is split and which business type it resolves to
    Parse {
        /// Free-text query, e.g. "bakeries in chicago"
        query: String,
    },

    /// Run a lead search in this process and print the leads as JSON
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value_t = 20)]
        max_leads: u32,

        /// Extra fields, comma separated
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Visit websites for emails and social links
        #[arg(long)]
        enrich: bool,
    },

    /// Queue a lead job for the workers
    Submit {
        #[arg(long)]
        query: String,

        #[arg(long)]
        user_id: String,

        #[arg(long, default_value_t = 1000)]
        max_leads: u32,

        /// Extra fields, comma separated
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        #[arg(long)]
        enrich: bool,
    },

    /// Show a queued job's status
    Status {
        task_id: String,
    },

    /// Upsert leads from a JSON file into the database
    Import {
        file: PathBuf,
    },

    /// Create the database tables
    InitDb,
}
