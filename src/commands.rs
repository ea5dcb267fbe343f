//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the lookup and normalizer against
//! the JustWatch client. Each handler takes CLI args, the loaded config and
//! Output, and returns ExitCode.

use serde::Serialize;
use std::fmt::Write as _;

use crate::api::{JustWatchClient, JustWatchError};
use crate::catalog::{self, ServiceTable};
use crate::cli::{ExitCode, InfoCmd, OffersCmd, Output, RegionsCmd, SearchCmd};
use crate::config::Config;
use crate::lookup;
use crate::models::{offer_label, NormalizedOfferTable, TitleRecord};
use crate::normalize;

/// Client for the configured endpoint
pub fn client(config: &Config) -> JustWatchClient {
    JustWatchClient::with_options(config.api_url(), config.timeout())
}

/// Exit code for an upstream failure
pub fn exit_code_for(err: &JustWatchError) -> ExitCode {
    match err {
        JustWatchError::NotFound(_) => ExitCode::NotFound,
        JustWatchError::InvalidCountry(_) | JustWatchError::NoCountries => ExitCode::InvalidArgs,
        JustWatchError::Http(_) | JustWatchError::RequestFailed(_) => ExitCode::NetworkError,
        JustWatchError::InvalidResponse(_) => ExitCode::Error,
    }
}

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, config: &Config, output: &Output) -> ExitCode {
    let country = cmd.country.as_deref().unwrap_or(config.country());
    let language = cmd.language.as_deref().unwrap_or(config.language());
    let client = client(config);

    output.info(format!("Searching for: {}", cmd.query));

    match lookup::search_titles(&client, &cmd.query, country, language).await {
        Ok(mut results) => {
            results.truncate(cmd.limit);
            if let Err(e) = output.print(&results, |r| format_search_results(r)) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Search failed: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Offers Command
// =============================================================================

pub async fn offers_cmd(cmd: OffersCmd, config: &Config, output: &Output) -> ExitCode {
    let client = client(config);
    let services = ServiceTable::default();

    output.info(format!("Fetching offers for: {}", cmd.title_id));

    let mut table =
        match normalize::get_offers_with(&client, &cmd.title_id, &config.regions(), &services)
            .await
        {
            Ok(table) => table,
            Err(e) => {
                return output.error(format!("Offers lookup failed: {}", e), exit_code_for(&e))
            }
        };

    if !cmd.regions.is_empty() {
        table.retain_regions(&cmd.regions);
    }
    if table.is_empty() {
        return output.error(
            format!("No offers found for {}", cmd.title_id),
            ExitCode::NoOffers,
        );
    }

    if let Err(e) = output.print(&table, |t| format_offer_table(t, &services)) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Info Command
// =============================================================================

pub async fn info_cmd(cmd: InfoCmd, config: &Config, output: &Output) -> ExitCode {
    let country = lookup::normalize_country(cmd.country.as_deref().unwrap_or(config.country()));
    let language =
        lookup::normalize_language(cmd.language.as_deref().unwrap_or(config.language()));
    let client = client(config);

    output.info(format!("Getting info for: {}", cmd.title_id));

    match client
        .details(&cmd.title_id, &country, &language, false)
        .await
    {
        Ok(Some(record)) => {
            if let Err(e) = output.print(&record, |r| format_title(r)) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Ok(None) => output.error(
            format!("Title not found: {}", cmd.title_id),
            ExitCode::NotFound,
        ),
        Err(e) => output.error(format!("Info failed: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Regions Command
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RegionInfo {
    pub code: &'static str,
    pub name: &'static str,
}

pub fn regions_cmd(_cmd: RegionsCmd, output: &Output) -> ExitCode {
    let regions: Vec<RegionInfo> = catalog::COUNTRIES
        .iter()
        .map(|&(code, name)| RegionInfo { code, name })
        .collect();

    let render = |regions: &Vec<RegionInfo>| {
        regions
            .iter()
            .map(|r| format!("{}  {}\n", r.code, r.name))
            .collect::<String>()
    };
    if let Err(e) = output.print(regions, render) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Human Output
// =============================================================================

/// One line per candidate: id, title, year, runtime, genres
pub fn format_search_results(results: &[TitleRecord]) -> String {
    if results.is_empty() {
        return "No results found\n".to_string();
    }

    let id_width = results.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for record in results {
        let year = record
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let runtime = record.format_runtime().unwrap_or_default();
        let genres = genre_list(record);
        let _ = writeln!(
            out,
            "{:<id_width$}  {} ({})  {}  {}",
            record.id, record.title, year, runtime, genres
        );
    }
    out
}

/// Multi-line details for one title
pub fn format_title(record: &TitleRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record);
    let _ = writeln!(out, "Type:     {}", record.object_type);
    if !record.release_date.is_empty() {
        let _ = writeln!(out, "Released: {}", record.release_date);
    }
    if let Some(runtime) = record.format_runtime() {
        let _ = writeln!(out, "Runtime:  {}", runtime);
    }
    if !record.genre_codes.is_empty() {
        let _ = writeln!(out, "Genres:   {}", genre_list(record));
    }
    if let Some(score) = record.scoring.as_ref().and_then(|s| s.imdb_score) {
        let _ = writeln!(out, "IMDb:     {:.1}", score);
    }
    if let Some(url) = &record.url {
        let _ = writeln!(out, "Page:     {}", url);
    }
    if !record.short_description.is_empty() {
        let _ = writeln!(out, "\n{}", record.short_description);
    }
    out
}

/// Region × service grid, regions sorted by country name, services in
/// display order
pub fn format_offer_table(table: &NormalizedOfferTable, services: &ServiceTable) -> String {
    let columns: Vec<&str> = services.display_names().collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|service| {
            table
                .iter()
                .map(|(region, _)| offer_label(table.entry(region, service)).chars().count())
                .chain(std::iter::once(service.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:<22}", "Region");
    for (service, width) in columns.iter().zip(&widths) {
        let _ = write!(out, "  {:<width$}", service, width = *width);
    }
    out.push('\n');

    for region in table.regions_by_name() {
        let name = catalog::country_name(region).unwrap_or(region);
        let _ = write!(out, "{:<22}", format!("{} ({})", truncate(name, 16), region));
        for (service, width) in columns.iter().zip(&widths) {
            let label = offer_label(table.entry(region, service));
            let _ = write!(out, "  {:<width$}", label, width = *width);
        }
        out.push('\n');
    }
    out
}

fn genre_list(record: &TitleRecord) -> String {
    record
        .genre_codes
        .iter()
        .map(|code| catalog::genre_name(code))
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
