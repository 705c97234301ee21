use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use crate::config::Config;
use crate::services::{
    build_deep_link, normalize, normalize_strict, rank, recommended, ComparisonService,
    FetchOutcome, HttpPriceSource,
};
use crate::tui::{self, theme::Theme};
use crate::types::{
    LatLng, Place, Provider, ProviderFilter, RawPriceMatrix, RideOption, Route, SortKey,
    SortOrder,
};

/// Compare ride prices across Uber, Ola and Rapido
#[derive(Parser)]
#[command(name = "ridecompare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Price aggregation endpoint (overrides config and RIDECOMPARE_ENDPOINT)
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and compare prices for a route
    Compare {
        #[command(flatten)]
        route: RouteArgs,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Normalize and rank a saved price matrix (JSON file)
    Rank {
        file: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the booking deep link for a provider
    Link {
        provider: Provider,
        #[command(flatten)]
        route: RouteArgs,
    },

    /// Launch interactive TUI
    Tui {
        #[command(flatten)]
        route: RouteArgs,
        /// Reject quotes whose price cannot be parsed
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args, Debug)]
struct RouteArgs {
    /// Pickup coordinates
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    from: LatLng,
    /// Drop coordinates
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    to: LatLng,
    /// Pickup display name
    #[arg(long)]
    from_name: Option<String>,
    /// Drop display name
    #[arg(long)]
    to_name: Option<String>,
}

impl RouteArgs {
    fn route(&self) -> Route {
        let place = |name: &Option<String>, location: LatLng| {
            let address = name.clone().unwrap_or_else(|| location.to_string());
            Place::new(address, location)
        };
        Route::new(
            place(&self.from_name, self.from),
            place(&self.to_name, self.to),
        )
    }
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Sort key: price or eta
    #[arg(long, default_value = "price")]
    sort: SortKey,
    /// Sort direction: asc or desc
    #[arg(long, default_value = "asc")]
    order: SortOrder,
    /// Provider filter: all, uber, ola or rapido
    #[arg(long, default_value = "all")]
    provider: ProviderFilter,
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Reject quotes whose price cannot be parsed
    #[arg(long)]
    strict: bool,
}

/// JSON output of `compare` and `rank`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    fetched_at: Option<DateTime<Utc>>,
    sort: String,
    order: String,
    provider: String,
    recommended: Vec<RideOption>,
    options: Vec<RideOption>,
}

impl Report {
    fn new(options: &[RideOption], view: &ViewArgs, fetched_at: Option<DateTime<Utc>>) -> Self {
        Self {
            fetched_at,
            sort: view.sort.to_string(),
            order: view.order.to_string(),
            provider: view.provider.to_string(),
            recommended: recommended(options),
            options: rank(options, view.sort, view.order, view.provider),
        }
    }

    fn render(&self, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string_pretty(self)?);
        }

        let mut out = String::new();
        if let Some(fetched_at) = self.fetched_at {
            let local = fetched_at.with_timezone(&Local);
            writeln!(out, "Prices as of {}", local.format("%Y-%m-%d %H:%M:%S"))?;
            writeln!(out)?;
        }
        writeln!(out, "Recommended (cheapest per ride type)")?;
        write_table(&mut out, &self.recommended)?;
        writeln!(out)?;
        writeln!(
            out,
            "All rides (sort: {} {}, provider: {})",
            self.sort, self.order, self.provider
        )?;
        write_table(&mut out, &self.options)?;
        Ok(out)
    }
}

fn write_table(out: &mut String, options: &[RideOption]) -> std::fmt::Result {
    if options.is_empty() {
        return writeln!(out, "  No rides available");
    }
    writeln!(
        out,
        "  {:<10}{:<24}{:>12}{:>10}",
        "Provider", "Ride", "Fare", "ETA"
    )?;
    for option in options {
        writeln!(
            out,
            "  {:<10}{:<24}{:>12}{:>10}",
            option.provider.name(),
            option.ride_type,
            option.display_price,
            option.display_eta
        )?;
    }
    Ok(())
}

/// Normalize and rank a saved matrix file
fn rank_file(path: &Path, view: &ViewArgs) -> anyhow::Result<String> {
    let mut bytes =
        fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let matrix = RawPriceMatrix::from_json_slice(&mut bytes)
        .with_context(|| format!("invalid price matrix in {}", path.display()))?;
    let options = if view.strict {
        normalize_strict(&matrix)?
    } else {
        normalize(&matrix)
    };
    Report::new(&options, view, None).render(view.json)
}

fn build_service(config: &Config, strict: bool) -> anyhow::Result<ComparisonService> {
    let source = HttpPriceSource::from_config(config)?;
    info!("using price endpoint {}", source.endpoint());
    Ok(ComparisonService::new(Arc::new(source), config.customer_id.clone()).with_strict(strict))
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Compare { route, view } => {
                let config = Config::load()?.with_endpoint(self.endpoint)?;
                let service = build_service(&config, view.strict)?;
                let runtime = tokio::runtime::Runtime::new()?;

                match runtime.block_on(service.compare(&route.route()))? {
                    FetchOutcome::Fresh(comparison) => {
                        let report =
                            Report::new(&comparison.options, &view, Some(comparison.fetched_at));
                        println!("{}", report.render(view.json)?);
                        Ok(())
                    }
                    FetchOutcome::Stale { token } => bail!("request {} was superseded", token),
                }
            }
            Commands::Rank { file, view } => {
                println!("{}", rank_file(&file, &view)?);
                Ok(())
            }
            Commands::Link { provider, route } => {
                println!("{}", build_deep_link(provider, &route.route())?);
                Ok(())
            }
            Commands::Tui { route, strict } => {
                let config = Config::load()?.with_endpoint(self.endpoint)?;
                let service = build_service(&config, strict)?;
                let runtime = tokio::runtime::Runtime::new()?;
                // Detect before raw mode
                let theme = Theme::detect();

                if let Some(link) = tui::run(Arc::new(service), route.route(), theme, &runtime)? {
                    println!("{}", link);
                }
                Ok(())
            }
        }
    }
}
