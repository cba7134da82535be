use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use travel_advisor::api::AppState;
use travel_advisor::cities::GeoNamesClient;
use travel_advisor::country::RestCountriesClient;
use travel_advisor::scheduler::Scheduler;
use travel_advisor::weather::OpenWeatherClient;
use travel_advisor::{
    AdvisorConfig, AdvisoryService, AdvisoryStore, FjallStore, MemoryStore, RefreshOrchestrator,
    SyncPipeline, TravelAdvisory, advisory_engine, telemetry, web,
};

#[derive(Parser)]
#[command(
    name = "travel-advisor",
    version,
    about = "City travel advisories from live weather and country data"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the periodic refresh
    Serve,
    /// Refresh one city, one country, or everything stored
    Refresh(Target),
    /// Print stored advisories
    Show(Target),
    /// Delete a city or every advisory of a country
    Delete(Target),
}

#[derive(Args)]
struct Target {
    #[arg(long, conflicts_with = "country")]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AdvisorConfig::load_from_path(cli.config)?;
    telemetry::init(&config.logging, cli.verbose)?;

    let service = build_service(&config)?;

    match cli.command {
        Command::Serve => serve(&config, service).await,
        Command::Refresh(target) => refresh(&service, target).await,
        Command::Show(target) => show(&service, target).await,
        Command::Delete(target) => delete(&service, target).await,
    }
}

fn open_store(config: &AdvisorConfig) -> Result<Arc<dyn AdvisoryStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        _ => {
            let store = FjallStore::open(&config.store.location).with_context(|| {
                format!("Failed to open advisory store at {}", config.store.location)
            })?;
            Ok(Arc::new(store))
        }
    }
}

fn build_service(config: &AdvisorConfig) -> Result<Arc<AdvisoryService>> {
    let store = open_store(config)?;
    let weather = Arc::new(OpenWeatherClient::new(&config.weather)?);
    let countries = Arc::new(RestCountriesClient::new(&config.country)?);
    let cities = Arc::new(GeoNamesClient::new(&config.cities)?);

    let pipeline = Arc::new(SyncPipeline::new(
        store.clone(),
        weather,
        countries.clone(),
        config.sync_settings(),
    ));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        pipeline,
        store.clone(),
        countries,
        cities,
        config.refresh_settings(),
    ));

    Ok(Arc::new(AdvisoryService::new(store, orchestrator)))
}

async fn serve(config: &AdvisorConfig, service: Arc<AdvisoryService>) -> Result<()> {
    let scheduler = if config.scheduler.enabled {
        Some(Scheduler::new(service.orchestrator(), &config.scheduler)?.spawn())
    } else {
        info!("Scheduler disabled");
        None
    };

    let state = AppState {
        service,
        bearer_token: config.server.bearer_token.as_deref().map(Arc::from),
        multi_city_audit: config.server.multi_city_audit,
    };
    let served = web::run(&config.server, state).await;

    if let Some(scheduler) = scheduler {
        scheduler.abort();
    }
    served
}

async fn refresh(service: &AdvisoryService, target: Target) -> Result<()> {
    let synced = service
        .refresh(target.city.as_deref(), target.country.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?
        .into_synced();

    for item in &synced {
        println!("{:<8} {}", item.audit, item.advisory.city);
    }
    println!("Refreshed {} advisories", synced.len());
    Ok(())
}

async fn show(service: &AdvisoryService, target: Target) -> Result<()> {
    let advisories = service
        .fetch(target.city.as_deref(), target.country.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if advisories.is_empty() {
        println!("No advisories stored");
    }
    for advisory in &advisories {
        println!("{}", format_advisory(advisory));
    }
    Ok(())
}

fn format_advisory(advisory: &TravelAdvisory) -> String {
    let weather = &advisory.weather;
    [
        format!("{} ({})", advisory.city, advisory.country.name),
        format!(
            "  {}, {}, humidity {}%, {}",
            weather.description,
            weather.format_temperature(),
            weather.humidity,
            weather.format_wind()
        ),
        format!("  {}", weather.format_daylight()),
        format!("  {}", advisory_engine::build(weather)),
        format!("  synced {}", advisory.synced_at.to_rfc3339()),
    ]
    .join("\n")
}

async fn delete(service: &AdvisoryService, target: Target) -> Result<()> {
    match (target.city, target.country) {
        (Some(city), _) => {
            service
                .delete_city(&city)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Deleted city: {city}");
        }
        (None, Some(country)) => {
            let removed = service
                .delete_country(&country)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Deleted {removed} advisories for {}", country.trim());
        }
        (None, None) => bail!("delete needs --city or --country"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use travel_advisor::{CountrySnapshot, WeatherSnapshot};

    use super::*;

    #[test]
    fn test_format_advisory_mentions_feels_like_once() {
        let now = Utc::now();
        let advisory = TravelAdvisory {
            key: "oslo".to_string(),
            city: "Oslo".to_string(),
            weather: WeatherSnapshot {
                description: "light snow".to_string(),
                temperature: -4.0,
                feels_like: -9.5,
                humidity: 80,
                wind_speed: 6.0,
                sunrise: "09:10 AM".to_string(),
                sunset: "03:20 PM".to_string(),
            },
            country: CountrySnapshot {
                name: "Norway".to_string(),
                currency: Some("NOK".to_string()),
                capital: Some("Oslo".to_string()),
                timezones: vec!["UTC+01:00".to_string()],
                languages: BTreeMap::new(),
                flag_url: String::new(),
                population: 5_400_000,
                region: "Europe".to_string(),
            },
            synced_at: now,
            created_at: now,
        };

        let text = format_advisory(&advisory);

        assert!(text.starts_with("Oslo (Norway)\n"));
        assert_eq!(text.matches("feels like").count(), 1);
        assert!(text.contains("-4.0°C (feels like -9.5°C), humidity 80%"));
        assert_eq!(text.lines().count(), 5);
    }
}
