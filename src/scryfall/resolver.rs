use std::collections::HashSet;
use tracing::{info, warn};

use super::models::{CardRecord, PrintingInfo, ScryfallCard};
use super::strategy::{unquote, CardQuery, CardSource};
use crate::error::{ScanError, ScanResult};
use crate::normalize::clean_card_name;

/// Turns names and free text into card records.
pub struct CardResolver<S> {
    source: S,
}

impl<S: CardSource> CardResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves one card by name, attaching images of its other printings.
    pub fn resolve_one(&self, name: &str) -> ScanResult<CardRecord> {
        let raw = name.trim();
        let cleaned = clean_card_name(unquote(raw).unwrap_or(raw));
        info!("Searching for: '{}'", cleaned);

        let (_, cards) = CardQuery::single(raw, &cleaned).resolve(&self.source)?;
        let mut record = CardRecord::from(&cards[0]);
        record.alternate_images = self.alternate_images(&record);
        Ok(record)
    }

    /// Best-effort: a failed lookup just means no alternates.
    fn alternate_images(&self, record: &CardRecord) -> Vec<String> {
        let cards = match CardQuery::all_printings(&record.name).resolve(&self.source) {
            Ok((_, cards)) => cards,
            Err(e) => {
                warn!("No alternate printings for '{}': {}", record.name, e);
                return Vec::new();
            }
        };

        let mut seen: HashSet<String> = record.image_url.iter().cloned().collect();
        cards
            .iter()
            .filter_map(ScryfallCard::display_image)
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Searches free text and returns up to `limit` distinct cards, newest
    /// printing first. An exhausted cascade yields an empty list; only a
    /// database that failed every strategy is an error.
    pub fn resolve_many(&self, text: &str, limit: usize) -> ScanResult<Vec<CardRecord>> {
        let mut cards = match CardQuery::search(text).resolve(&self.source) {
            Ok((_, cards)) => cards,
            Err(ScanError::NoMatch { .. }) => {
                info!("Search '{}' matched nothing", text);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        // Stable, so upstream order breaks ties; undated cards go last
        cards.sort_by(|a, b| b.released_at.cmp(&a.released_at));

        let mut seen = HashSet::new();
        let records: Vec<CardRecord> = cards
            .iter()
            .filter(|card| seen.insert(card.name.clone()))
            .take(limit)
            .map(CardRecord::from)
            .collect();

        info!("Search '{}' returned {} card(s)", text, records.len());
        Ok(records)
    }

    /// Set, rarity and price of the printing of `name` in `set_code`.
    pub fn resolve_at_printing(&self, name: &str, set_code: &str) -> ScanResult<PrintingInfo> {
        let (_, cards) = CardQuery::printing(name, set_code).resolve(&self.source)?;
        let wanted = set_code.trim();

        let printing = cards
            .iter()
            .find(|card| {
                card.set
                    .as_deref()
                    .is_some_and(|set| set.eq_ignore_ascii_case(wanted))
            })
            .unwrap_or(&cards[0]);
        Ok(PrintingInfo::from(printing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scryfall::strategy::{NamedMatch, SearchRequest};
    use crate::scryfall::testing::{card, FakeSource};

    fn bolt_source() -> FakeSource {
        let mut bolt = card("Lightning Bolt", "lea", Some("1993-08-05"));
        bolt.image_uris = Some(crate::scryfall::models::ImageUris {
            normal: Some("lea.jpg".to_string()),
            large: None,
        });
        FakeSource::default()
            .with_named(NamedMatch::Exact, "Lightning Bolt", bolt.clone())
            .with_search(
                SearchRequest::new("!\"Lightning Bolt\"").prints(),
                vec![
                    card("Lightning Bolt", "m11", Some("2010-07-16")).with_image("m11.jpg"),
                    bolt.clone(),
                    card("Lightning Bolt", "2xm", Some("2020-08-07")).with_image("2xm.jpg"),
                ],
            )
    }

    #[test]
    fn test_resolve_one_after_cleanup() {
        let resolver = CardResolver::new(bolt_source());

        let record = resolver.resolve_one("Lightning Bolt Instant").unwrap();
        assert_eq!(record.name, "Lightning Bolt");
        assert_eq!(record.set_code, "LEA");
        assert_eq!(record.alternate_images, vec!["m11.jpg", "2xm.jpg"]);
        assert_eq!(resolver.source().calls()[0], "exact:Lightning Bolt");
    }

    #[test]
    fn test_alternates_are_best_effort() {
        let source = bolt_source().failing_on("search:!\"Lightning Bolt\"");
        let resolver = CardResolver::new(source);

        let record = resolver.resolve_one("Lightning Bolt").unwrap();
        assert_eq!(record.name, "Lightning Bolt");
        assert!(record.alternate_images.is_empty());
    }

    #[test]
    fn test_quoted_name_never_goes_fuzzy() {
        let source = FakeSource::default().with_named(
            NamedMatch::Fuzzy,
            "Lightning Bolt",
            card("Lightning Bolt", "lea", None),
        );
        let resolver = CardResolver::new(source);

        let err = resolver.resolve_one("\"Lightning Bolt\"").unwrap_err();
        assert!(matches!(err, ScanError::NoMatch { .. }));
        assert_eq!(resolver.source().calls(), vec!["exact:Lightning Bolt"]);
    }

    #[test]
    fn test_raw_text_is_tried_after_cleaned() {
        let source = FakeSource::default().with_named(
            NamedMatch::Exact,
            "Highland Giant",
            card("Highland Giant", "ptk", None),
        );
        let resolver = CardResolver::new(source);

        let record = resolver.resolve_one("Highland Giant").unwrap();
        assert_eq!(record.name, "Highland Giant");
        assert_eq!(
            &resolver.source().calls()[..3],
            &["exact:Giant", "fuzzy:Giant", "exact:Highland Giant"]
        );
    }

    #[test]
    fn test_resolve_one_offline() {
        let resolver = CardResolver::new(FakeSource::default().offline());
        let err = resolver.resolve_one("Shock").unwrap_err();
        assert!(matches!(err, ScanError::UpstreamUnavailable { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolve_many_caps_dedupes_and_orders() {
        let cards: Vec<ScryfallCard> = (0..12)
            .map(|i| card(&format!("Bolt {}", i), "tst", Some(format!("2010-01-{:02}", i + 1).as_str())))
            .chain(std::iter::once(card("Bolt 11", "old", Some("2001-01-01"))))
            .collect();
        let source = FakeSource::default()
            .with_search(SearchRequest::new("name:\"Bolt\""), cards);
        let resolver = CardResolver::new(source);

        let records = resolver.resolve_many("Bolt", 5).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bolt 11", "Bolt 10", "Bolt 9", "Bolt 8", "Bolt 7"]);
        assert_eq!(records[0].set_code, "TST");
    }

    #[test]
    fn test_resolve_many_falls_through_to_later_strategies() {
        let source = FakeSource::default()
            .failing_on("search:name:\"Bolt\"")
            .with_search(
                SearchRequest::new("\"Bolt\""),
                vec![card("Lightning Bolt", "lea", None), card("Lightning Bolt", "m10", None)],
            );
        let resolver = CardResolver::new(source);

        let records = resolver.resolve_many("Bolt", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            resolver.source().calls(),
            vec![
                "search:name:\"Bolt\"",
                "search:name:Bolt",
                "search:!\"Bolt\"",
                "search:\"Bolt\"",
            ]
        );
    }

    #[test]
    fn test_resolve_many_permissive_retry() {
        let source = FakeSource::default().with_search(
            SearchRequest::new("Bolt").prints().permissive(),
            vec![card("Bolt Bend", "war", None)],
        );
        let resolver = CardResolver::new(source);

        let records = resolver.resolve_many("Bolt", 3).unwrap();
        assert_eq!(records[0].name, "Bolt Bend");
        assert_eq!(resolver.source().calls().len(), 6);
    }

    #[test]
    fn test_resolve_many_quoted_is_exact_only() {
        let resolver = CardResolver::new(FakeSource::default());
        let records = resolver.resolve_many("\"Lightning Bolt\"", 5).unwrap();
        assert!(records.is_empty());
        assert_eq!(resolver.source().calls(), vec!["search:!\"Lightning Bolt\""]);
    }

    #[test]
    fn test_resolve_many_offline_is_an_error() {
        let resolver = CardResolver::new(FakeSource::default().offline());
        let err = resolver.resolve_many("Bolt", 5).unwrap_err();
        assert!(matches!(err, ScanError::UpstreamUnavailable { failures: 6, .. }));
    }

    #[test]
    fn test_resolve_at_printing() {
        let mut lea = card("Lightning Bolt", "lea", Some("1993-08-05"));
        lea.rarity = Some("common".to_string());
        lea.prices = Some(crate::scryfall::models::Prices {
            usd: Some("450.00".to_string()),
            usd_foil: None,
        });
        let source = FakeSource::default().with_search(
            SearchRequest::new("!\"Lightning Bolt\" set:lea").prints(),
            vec![lea],
        );
        let resolver = CardResolver::new(source);

        let info = resolver.resolve_at_printing("Lightning Bolt", "lea").unwrap();
        assert_eq!(info.set_code, "LEA");
        assert_eq!(info.rarity.as_deref(), Some("common"));
        assert_eq!(info.price.as_deref(), Some("450.00"));

        let missing = resolver.resolve_at_printing("Lightning Bolt", "zzz");
        assert!(matches!(missing, Err(ScanError::NoMatch { .. })));
    }

    #[test]
    fn test_resolve_at_printing_prefers_set_match() {
        let source = FakeSource::default().with_search(
            SearchRequest::new("!\"Shock\" set:m19").prints(),
            vec![card("Shock", "pm19", None), card("Shock", "M19", None)],
        );
        let resolver = CardResolver::new(source);

        let info = resolver.resolve_at_printing("Shock", "M19").unwrap();
        assert_eq!(info.set_code, "M19");
    }
}
