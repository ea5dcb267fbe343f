//! Offer normalization
//!
//! Turns raw per-region offer lists into a [`NormalizedOfferTable`]: one
//! entry per included service in every region that has any offer, with the
//! duplicated service alias folded into its canonical service.
//!
//! Steps, per region:
//! 1. regions with no raw offers are dropped
//! 2. offers are reduced to one entry per service name (first url, first
//!    non-null price)
//! 3. the region is re-keyed to exactly the included services plus the alias,
//!    the alias is merged into its canonical service and removed, and keys are
//!    renamed to display names

use std::collections::BTreeMap;

use crate::api::{JustWatchError, OfferSource};
use crate::catalog::{self, ServiceTable};
use crate::models::{NormalizedOfferTable, OfferEntry, RawOffer, RegionOffers};

/// Language offers are requested in
pub const OFFERS_LANGUAGE: &str = "en";

/// Fetch offers for a title in every recognized region and normalize them
pub async fn get_offers<S>(
    source: &S,
    title_id: &str,
) -> Result<NormalizedOfferTable, JustWatchError>
where
    S: OfferSource + ?Sized,
{
    get_offers_with(
        source,
        title_id,
        &catalog::all_countries(),
        &ServiceTable::default(),
    )
    .await
}

/// Fetch offers for a title in the given regions and normalize them against
/// `services`
pub async fn get_offers_with<S>(
    source: &S,
    title_id: &str,
    regions: &[String],
    services: &ServiceTable,
) -> Result<NormalizedOfferTable, JustWatchError>
where
    S: OfferSource + ?Sized,
{
    // All offers, not only the best one: reduction and alias merging need
    // every tier a service lists.
    let raw = source
        .offers_for_countries(title_id, regions, OFFERS_LANGUAGE, false)
        .await?;
    Ok(normalize_offers(raw, services))
}

/// Pure normalization of a region → raw offers mapping
pub fn normalize_offers(
    raw: BTreeMap<String, Vec<RawOffer>>,
    services: &ServiceTable,
) -> NormalizedOfferTable {
    let total = raw.len();
    let mut table = NormalizedOfferTable::new();

    for (region, offers) in raw {
        if offers.is_empty() {
            continue;
        }
        let reduced = reduce_region(&offers)
            .into_iter()
            .map(|(name, entry)| (name, Some(entry)))
            .collect();
        table.insert(region, canonicalize_region(reduced, services));
    }

    tracing::debug!(
        regions = table.len(),
        dropped = total - table.len(),
        "offers normalized"
    );
    table
}

/// One entry per service name: url from the first offer, price from the
/// first offer that has one
pub fn reduce_region(offers: &[RawOffer]) -> BTreeMap<String, OfferEntry> {
    let mut services: BTreeMap<String, OfferEntry> = BTreeMap::new();

    for offer in offers {
        let entry = services
            .entry(offer.service_name.clone())
            .or_insert_with(|| OfferEntry {
                url: Some(offer.url.clone()).filter(|u| !u.is_empty()),
                price: None,
            });
        if entry.price.is_none() {
            entry.price = offer.price.clone();
        }
    }

    services
}

/// Re-key a region to the included services, merge the alias into its
/// canonical service and rename keys to display names
pub fn canonicalize_region(mut region: RegionOffers, services: &ServiceTable) -> RegionOffers {
    let mut keyed: BTreeMap<&str, Option<OfferEntry>> = services
        .all_keys()
        .map(|key| (key, region.remove(key).flatten()))
        .collect();

    let alias = keyed.remove(services.alias()).flatten();
    let canonical = keyed.remove(services.canonical()).flatten();
    keyed.insert(services.canonical(), merge_alias(canonical, alias));

    services
        .included()
        .iter()
        .map(|s| (s.display.clone(), keyed.remove(s.key.as_str()).flatten()))
        .collect()
}

/// Canonicalize every region of an existing table
pub fn canonicalize_table(
    table: NormalizedOfferTable,
    services: &ServiceTable,
) -> NormalizedOfferTable {
    table
        .into_inner()
        .into_iter()
        .map(|(region, offers)| (region, canonicalize_region(offers, services)))
        .collect::<BTreeMap<_, _>>()
        .into()
}

/// Fold the alias entry into the canonical one.
///
/// An existing canonical entry wins; the alias only fills a missing price. A
/// canonical entry with a price is kept even when the alias is cheaper.
pub fn merge_alias(
    canonical: Option<OfferEntry>,
    alias: Option<OfferEntry>,
) -> Option<OfferEntry> {
    match (canonical, alias) {
        (None, alias) => alias,
        (Some(mut entry), Some(alias)) if entry.price.is_none() => {
            entry.price = alias.price;
            Some(entry)
        }
        (canonical, _) => canonical,
    }
}
