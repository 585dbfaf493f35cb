//! Volleyball Match Prediction CLI
//!
//! Player rating pipeline plus trained match-outcome prediction.

use clap::{Parser, Subcommand};
use volley::{Config, Result};

#[derive(Parser)]
#[command(name = "volley")]
#[command(about = "Volleyball player ratings and match outcome prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the per-category player stat exports into one table
    Merge,
    /// Compute player ratings and write the rankings table
    Rate,
    /// Train the win and set-score models with grouped cross-validation
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Predict the outcome of a matchup
    Predict {
        /// Home side team name
        team_a: String,
        /// Away side team name
        team_b: String,
    },
    /// Fit a diagnostic model on per-match team stat differentials
    AnalyzeStats,
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Merge => commands::merge(&config),
        Commands::Rate => commands::rate(&config),
        Commands::Train { epochs } => commands::train(&config, epochs),
        Commands::Predict { team_a, team_b } => commands::predict(&config, &team_a, &team_b),
        Commands::AnalyzeStats => commands::analyze_stats(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use volley::data::merge::{merge_tables, write_merged_csv};
    use volley::data::tables::{load_all_category_tables, load_matches, PipelineData};
    use volley::features::matchup::MatchupContext;
    use volley::predict::inference::format_prediction;
    use volley::predict::Predictor;
    use volley::rating::engine::report_best;
    use volley::rating::{rate_players, write_rankings_csv};
    use volley::training::{analyze_match_stats, train_models};

    type Backend = NdArray<f32>;
    type TrainBackend = Autodiff<Backend>;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.dataset_dir)?;
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!(
            "Created {} and {} directories",
            config.data.dataset_dir, config.data.model_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Place the six category stat exports in {}",
            config.data.dataset_dir
        );
        println!("  3. Run 'volley rate' to build the player rankings");
        println!("  4. Run 'volley train' to fit the outcome models");
        println!("  5. Run 'volley predict \"Team A\" \"Team B\"'");

        Ok(())
    }

    pub fn merge(config: &Config) -> Result<()> {
        let tables = load_all_category_tables(&config.data.dataset_dir)?;
        let players = merge_tables(&tables);
        write_merged_csv(&config.data.merged_file, &players)?;
        println!(
            "Merged {} players into {}",
            players.len(),
            config.data.merged_file
        );
        Ok(())
    }

    pub fn rate(config: &Config) -> Result<()> {
        let tables = load_all_category_tables(&config.data.dataset_dir)?;
        let players = merge_tables(&tables);
        let ratings = rate_players(&players);
        report_best(&ratings);
        write_rankings_csv(&config.data.rankings_file, &ratings)?;
        println!(
            "Wrote ratings for {} players to {}",
            ratings.len(),
            config.data.rankings_file
        );
        Ok(())
    }

    pub fn train(config: &Config, epochs: Option<usize>) -> Result<()> {
        let mut config = config.clone();
        if let Some(epochs) = epochs {
            config.training.epochs = epochs;
        }

        let data = PipelineData::load(&config)?;
        let matches = load_matches(&config.data.match_file)?;
        let ctx = MatchupContext::new(&data.ratings, &data.season, config.rating.top_n);

        let device = Default::default();
        train_models::<TrainBackend>(&device, &config, &ctx, &matches)
    }

    pub fn predict(config: &Config, team_a: &str, team_b: &str) -> Result<()> {
        let data = PipelineData::load(config)?;
        let ctx = MatchupContext::new(&data.ratings, &data.season, config.rating.top_n);

        let device = Default::default();
        let predictor = Predictor::<Backend>::load(config, device)?;
        let prediction = predictor.predict(&ctx, team_a, team_b)?;

        println!("{}", format_prediction(team_a, team_b, &prediction));
        Ok(())
    }

    pub fn analyze_stats(config: &Config) -> Result<()> {
        let matches = load_matches(&config.data.match_file)?;
        let device = Default::default();
        analyze_match_stats::<TrainBackend>(&device, config, &matches)
    }
}
