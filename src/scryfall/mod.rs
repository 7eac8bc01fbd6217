//! Card lookup against the Scryfall database.
//!
//! This module provides:
//! - Serde models for Scryfall card objects and the records built from them
//! - Ordered query strategies with a single cascade driver
//! - A blocking HTTP client implementing [`CardSource`]
//! - [`CardResolver`], the single/multi/printing lookups

pub mod client;
pub mod models;
pub mod resolver;
pub mod strategy;

pub use client::ScryfallClient;
pub use models::{CardRecord, PrintingInfo, ScryfallCard};
pub use resolver::CardResolver;
pub use strategy::{CardQuery, CardSource, NamedMatch, QueryStrategy, SearchRequest};
