//! Ordered query strategies and the driver that tries them.
//!
//! Strategies run from the most precise to the most permissive; the first
//! one that yields at least one card ends the cascade. Errors from a
//! strategy are logged and treated as "nothing found here".

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::models::ScryfallCard;
use crate::error::{ScanError, ScanResult};

/// Match semantics of the single-card `named` endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NamedMatch {
    Exact,
    Fuzzy,
}

impl NamedMatch {
    pub fn param(self) -> &'static str {
        match self {
            NamedMatch::Exact => "exact",
            NamedMatch::Fuzzy => "fuzzy",
        }
    }
}

/// Scryfall `unique` mode of a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Uniqueness {
    Cards,
    Prints,
}

impl Uniqueness {
    pub fn param(self) -> &'static str {
        match self {
            Uniqueness::Cards => "cards",
            Uniqueness::Prints => "prints",
        }
    }
}

/// A full-text search against the `cards/search` endpoint, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub unique: Uniqueness,
    /// Also match tokens, variations and other extras
    pub permissive: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            unique: Uniqueness::Cards,
            permissive: false,
        }
    }

    pub fn prints(mut self) -> Self {
        self.unique = Uniqueness::Prints;
        self
    }

    pub fn permissive(mut self) -> Self {
        self.permissive = true;
        self
    }
}

/// Read access to the card database.
pub trait CardSource {
    /// Single-card lookup. `Ok(None)` when the database has no match.
    fn named(&self, mode: NamedMatch, name: &str) -> Result<Option<ScryfallCard>>;

    /// Full-text search. An empty list when nothing matches.
    fn search(&self, request: &SearchRequest) -> Result<Vec<ScryfallCard>>;
}

/// One step of a cascade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum QueryStrategy {
    Named { mode: NamedMatch, name: String },
    Search(SearchRequest),
}

impl QueryStrategy {
    fn run<S: CardSource + ?Sized>(&self, source: &S) -> Result<Vec<ScryfallCard>> {
        match self {
            QueryStrategy::Named { mode, name } => {
                Ok(source.named(*mode, name)?.into_iter().collect())
            }
            QueryStrategy::Search(request) => source.search(request),
        }
    }
}

/// Strips one pair of surrounding double quotes.
pub fn unquote(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let inner = inner.trim();
    if inner.is_empty() { None } else { Some(inner) }
}

/// Search syntax for an exact card name.
fn exact_name_query(name: &str) -> String {
    format!("!\"{}\"", name.replace('"', ""))
}

/// An ordered list of strategies for one lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardQuery {
    /// What the caller asked for; used in error messages
    pub subject: String,
    pub strategies: Vec<QueryStrategy>,
}

impl CardQuery {
    /// Single-card cascade: exact then fuzzy on the cleaned name, then the
    /// same on the raw text when cleaning changed it. A quoted name asks
    /// for the exact strategy only.
    pub fn single(raw: &str, cleaned: &str) -> Self {
        let raw = raw.trim();
        if let Some(exact) = unquote(raw) {
            return Self {
                subject: raw.to_string(),
                strategies: vec![QueryStrategy::Named {
                    mode: NamedMatch::Exact,
                    name: exact.to_string(),
                }],
            };
        }

        let mut strategies = Vec::new();
        let mut names = vec![cleaned];
        if cleaned != raw {
            names.push(raw);
        }
        for name in names.into_iter().filter(|n| !n.is_empty()) {
            for mode in [NamedMatch::Exact, NamedMatch::Fuzzy] {
                strategies.push(QueryStrategy::Named {
                    mode,
                    name: name.to_string(),
                });
            }
        }

        Self {
            subject: raw.to_string(),
            strategies,
        }
    }

    /// Multi-result cascade for free text. Quoted text only runs an exact
    /// name search.
    pub fn search(text: &str) -> Self {
        let text = text.trim();
        if let Some(exact) = unquote(text) {
            return Self {
                subject: text.to_string(),
                strategies: vec![QueryStrategy::Search(SearchRequest::new(exact_name_query(
                    exact,
                )))],
            };
        }

        let bare = text.replace('"', "");
        let strategies = vec![
            SearchRequest::new(format!("name:\"{}\"", bare)),
            SearchRequest::new(format!("name:{}", bare)),
            SearchRequest::new(exact_name_query(&bare)),
            SearchRequest::new(format!("\"{}\"", bare)),
            SearchRequest::new(bare.clone()),
            SearchRequest::new(bare.clone()).prints().permissive(),
        ]
        .into_iter()
        .map(QueryStrategy::Search)
        .collect();

        Self {
            subject: text.to_string(),
            strategies,
        }
    }

    /// Every printing of one exact name in one set.
    pub fn printing(name: &str, set_code: &str) -> Self {
        let name = unquote(name.trim()).unwrap_or(name.trim());
        Self {
            subject: format!("{} [{}]", name, set_code),
            strategies: vec![QueryStrategy::Search(
                SearchRequest::new(format!(
                    "{} set:{}",
                    exact_name_query(name),
                    set_code.trim().to_lowercase()
                ))
                .prints(),
            )],
        }
    }

    /// Every printing of one exact name.
    pub fn all_printings(name: &str) -> Self {
        Self {
            subject: name.to_string(),
            strategies: vec![QueryStrategy::Search(
                SearchRequest::new(exact_name_query(name)).prints(),
            )],
        }
    }

    /// Runs strategies in order and returns the first non-empty result
    /// together with the index of the strategy that produced it.
    ///
    /// Fails with `UpstreamUnavailable` when every strategy errored, and
    /// with `NoMatch` otherwise.
    pub fn resolve<S: CardSource + ?Sized>(
        &self,
        source: &S,
    ) -> ScanResult<(usize, Vec<ScryfallCard>)> {
        let mut failures = 0;

        for (index, strategy) in self.strategies.iter().enumerate() {
            debug!("Trying strategy {}: {:?}", index + 1, strategy);
            match strategy.run(source) {
                Ok(cards) if !cards.is_empty() => {
                    info!(
                        "Strategy {} matched {} card(s) for '{}'",
                        index + 1,
                        cards.len(),
                        self.subject
                    );
                    return Ok((index, cards));
                }
                Ok(_) => debug!("Strategy {} found nothing", index + 1),
                Err(e) => {
                    warn!("Strategy {} failed for '{}': {:#}", index + 1, self.subject, e);
                    failures += 1;
                }
            }
        }

        if failures > 0 && failures == self.strategies.len() {
            Err(ScanError::UpstreamUnavailable {
                query: self.subject.clone(),
                failures,
            })
        } else {
            Err(ScanError::NoMatch {
                query: self.subject.clone(),
            })
        }
    }
}
