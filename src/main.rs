use clap::Parser;
use restaurant_recommender::app::{build_engine, read_history, report};
use restaurant_recommender::config::cli::{Command, RecommendArgs};
use restaurant_recommender::domain::model::SearchQuery;
use restaurant_recommender::utils::error::ErrorSeverity;
use restaurant_recommender::utils::{logger, validation::Validate};
use restaurant_recommender::{AppConfig, CliConfig, RecommenderError, SearchRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting restaurant recommender");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match AppConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, config).await {
        tracing::error!(
            "❌ Recommender failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: AppConfig) -> Result<(), RecommenderError> {
    match &cli.command {
        Command::Recommend(args) => {
            // 驗證配置
            config.validate()?;
            let engine = build_engine(&config)?;

            let request = search_request(args, &config)?;
            let result = engine.recommend(&request).await;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_recommendation(&result));
            }
        }
        Command::History => {
            let entries = read_history(&config).await?;
            print!("{}", report::render_history(&entries));
        }
    }

    Ok(())
}

fn search_request(
    args: &RecommendArgs,
    config: &AppConfig,
) -> Result<SearchRequest, RecommenderError> {
    let query = match (&args.place_id, &args.food) {
        (Some(place_id), _) => SearchQuery::by_place(place_id.clone()),
        (None, Some(food)) if !food.trim().is_empty() => {
            let location = args
                .location
                .clone()
                .unwrap_or_else(|| config.defaults.location.clone());
            SearchQuery::by_food(food.trim(), location)
        }
        _ => {
            return Err(RecommenderError::ValidationError {
                message: "Please enter a food type".to_string(),
            })
        }
    };

    let mut request =
        SearchRequest::new(query).with_top_n(args.top.unwrap_or(config.aggregate.top_n));
    if args.no_history {
        request = request.without_history();
    }
    Ok(request)
}
