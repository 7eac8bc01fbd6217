//! Scryfall card objects and the records handed back to callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUris {
    pub normal: Option<String>,
    pub large: Option<String>,
}

impl ImageUris {
    fn display(&self) -> Option<&str> {
        self.normal.as_deref().or(self.large.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardFace {
    pub oracle_text: Option<String>,
    pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prices {
    pub usd: Option<String>,
    pub usd_foil: Option<String>,
}

/// One printing as returned by Scryfall. Only the fields used here are
/// modeled; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScryfallCard {
    pub name: String,
    pub set_name: Option<String>,
    /// Lowercase set code
    pub set: Option<String>,
    pub rarity: Option<String>,
    #[serde(default)]
    pub color_identity: Vec<String>,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uris: Option<ImageUris>,
    pub card_faces: Option<Vec<CardFace>>,
    pub prices: Option<Prices>,
    #[serde(default)]
    pub legalities: BTreeMap<String, String>,
    pub artist: Option<String>,
    pub collector_number: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub tcgplayer_id: Option<u64>,
    pub released_at: Option<NaiveDate>,
}

/// Paginated list wrapper of the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CardList {
    #[serde(default)]
    pub data: Vec<ScryfallCard>,
    #[serde(default)]
    pub has_more: bool,
    pub next_page: Option<String>,
}

impl ScryfallCard {
    /// Single-faced `normal`/`large` image, else the first face's.
    pub fn display_image(&self) -> Option<String> {
        if let Some(uris) = &self.image_uris {
            return uris.display().map(str::to_string);
        }
        self.card_faces
            .as_ref()
            .and_then(|faces| faces.first())
            .and_then(|face| face.image_uris.as_ref())
            .and_then(|uris| uris.display())
            .map(str::to_string)
    }

    /// First available of usd, usd_foil.
    pub fn display_price(&self) -> Option<String> {
        let prices = self.prices.as_ref()?;
        prices.usd.clone().or_else(|| prices.usd_foil.clone())
    }

    fn full_oracle_text(&self) -> Option<String> {
        if self.oracle_text.is_some() {
            return self.oracle_text.clone();
        }
        let faces: Vec<&str> = self
            .card_faces
            .iter()
            .flatten()
            .filter_map(|f| f.oracle_text.as_deref())
            .collect();
        if faces.is_empty() {
            None
        } else {
            Some(faces.join("\n//\n"))
        }
    }
}

/// Canonical attributes of one printing, as handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    pub name: String,
    pub set_name: Option<String>,
    /// Uppercase set code
    pub set_code: String,
    pub rarity: Option<String>,
    pub color_identity: Vec<String>,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub image_url: Option<String>,
    /// First available of usd, usd_foil
    pub price: Option<String>,
    pub price_usd: Option<String>,
    pub price_usd_foil: Option<String>,
    pub tcgplayer_id: Option<u64>,
    pub legalities: BTreeMap<String, String>,
    pub artist: Option<String>,
    pub collector_number: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub released_at: Option<NaiveDate>,
    /// Images of other printings; filled by single-card resolution only
    pub alternate_images: Vec<String>,
}

impl From<&ScryfallCard> for CardRecord {
    fn from(card: &ScryfallCard) -> Self {
        let prices = card.prices.clone().unwrap_or_default();
        Self {
            name: card.name.clone(),
            set_name: card.set_name.clone(),
            set_code: card.set.as_deref().unwrap_or_default().to_uppercase(),
            rarity: card.rarity.clone(),
            color_identity: card.color_identity.clone(),
            mana_cost: card.mana_cost.clone(),
            type_line: card.type_line.clone(),
            oracle_text: card.full_oracle_text(),
            image_url: card.display_image(),
            price: card.display_price(),
            price_usd: prices.usd,
            price_usd_foil: prices.usd_foil,
            tcgplayer_id: card.tcgplayer_id,
            legalities: card.legalities.clone(),
            artist: card.artist.clone(),
            collector_number: card.collector_number.clone(),
            power: card.power.clone(),
            toughness: card.toughness.clone(),
            released_at: card.released_at,
            alternate_images: Vec::new(),
        }
    }
}

/// Set, rarity and price of one specific printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintingInfo {
    pub set_name: Option<String>,
    pub set_code: String,
    pub rarity: Option<String>,
    pub price: Option<String>,
    pub tcgplayer_id: Option<u64>,
}

impl From<&ScryfallCard> for PrintingInfo {
    fn from(card: &ScryfallCard) -> Self {
        Self {
            set_name: card.set_name.clone(),
            set_code: card.set.as_deref().unwrap_or_default().to_uppercase(),
            rarity: card.rarity.clone(),
            price: card.display_price(),
            tcgplayer_id: card.tcgplayer_id,
        }
    }
}
