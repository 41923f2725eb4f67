//! Merge, translate and derive: two raw upstream payloads → one [`CatalogEntity`].
//!
//! Everything here is pure except price synthesis, which draws from the
//! caller-supplied RNG. It does **not**:
//! - fetch data (see `pokeapi.rs`)
//! - write to the store

use std::fmt;

use rand::Rng;

use crate::translate::{capitalize_first, translate_category, UNKNOWN_CATEGORY_LABEL};
use crate::upstream::{FlavorText, PrimaryDetail, SecondaryDetail, Sprites};
use crate::CatalogEntity;

pub const DEFAULT_PRICE_MIN: i64 = 1_000;
pub const DEFAULT_PRICE_MAX: i64 = 1_000_000;
pub const DEFAULT_LANGUAGE: &str = "es";
pub const DESCRIPTION_PLACEHOLDER: &str = "Descripción no disponible.";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizerError {
    InvalidPriceRange { min: i64, max: i64 },
}

impl fmt::Display for NormalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizerError::InvalidPriceRange { min, max } => {
                write!(f, "price range must satisfy 0 < min <= max, got [{min}, {max}]")
            }
        }
    }
}

impl std::error::Error for NormalizerError {}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Inclusive integer price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    min: i64,
    max: i64,
}

impl PriceRange {
    pub fn new(min: i64, max: i64) -> Result<Self, NormalizerError> {
        if min <= 0 || min > max {
            return Err(NormalizerError::InvalidPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, v: i64) -> bool {
        (self.min..=self.max).contains(&v)
    }

    pub fn clamp(&self, v: i64) -> i64 {
        v.clamp(self.min, self.max)
    }

    /// Uniform draw over `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_PRICE_MIN,
            max: DEFAULT_PRICE_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Language tag matched against localized text entries (e.g. `"es"`).
    pub language: String,
    pub price_range: PriceRange,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            price_range: PriceRange::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize one entity using the thread-local RNG for price synthesis.
pub fn normalize(
    primary: &PrimaryDetail,
    secondary: &SecondaryDetail,
    opts: &NormalizeOptions,
) -> CatalogEntity {
    normalize_with_rng(primary, secondary, opts, &mut rand::thread_rng())
}

pub fn normalize_with_rng<R: Rng + ?Sized>(
    primary: &PrimaryDetail,
    secondary: &SecondaryDetail,
    opts: &NormalizeOptions,
    rng: &mut R,
) -> CatalogEntity {
    let price = match primary.price {
        Some(p) => opts.price_range.clamp(p),
        None => opts.price_range.sample(rng),
    };

    CatalogEntity {
        upstream_id: primary.id,
        key: primary.name.trim().to_ascii_lowercase(),
        name: capitalize_first(primary.name.trim()),
        categories: translate_categories(primary),
        image_url: select_image(&primary.sprites),
        price,
        description: select_description(&secondary.flavor_text_entries, &opts.language),
    }
}

/// Translated labels in upstream slot order; never empty.
pub fn translate_categories(primary: &PrimaryDetail) -> Vec<String> {
    let mut slots: Vec<_> = primary.types.iter().collect();
    slots.sort_by_key(|t| t.slot);

    let labels: Vec<String> = slots
        .into_iter()
        .map(|t| translate_category(&t.kind.name))
        .filter(|l| !l.is_empty())
        .collect();

    if labels.is_empty() {
        vec![UNKNOWN_CATEGORY_LABEL.to_string()]
    } else {
        labels
    }
}

/// High-resolution artwork, else the default sprite, else nothing.
pub fn select_image(sprites: &Sprites) -> Option<String> {
    let artwork = sprites
        .other
        .as_ref()
        .and_then(|o| o.official_artwork.as_ref())
        .and_then(|a| a.front_default.as_ref());

    artwork
        .filter(|u| !u.trim().is_empty())
        .or_else(|| {
            sprites
                .front_default
                .as_ref()
                .filter(|u| !u.trim().is_empty())
        })
        .cloned()
}

/// First entry in `language`, whitespace-collapsed; placeholder when none match.
pub fn select_description(entries: &[FlavorText], language: &str) -> String {
    entries
        .iter()
        .find(|e| e.language.name.eq_ignore_ascii_case(language))
        .map(|e| collapse_whitespace(&e.flavor_text))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string())
}

// Upstream flavor text carries hard line breaks and form feeds.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::upstream::{Artwork, NamedResource, OtherSprites, TypeSlot};

    fn named(name: &str) -> NamedResource {
        NamedResource {
            name: name.to_string(),
            url: String::new(),
        }
    }

    fn primary(name: &str, types: &[(u8, &str)]) -> PrimaryDetail {
        PrimaryDetail {
            id: 25,
            name: name.to_string(),
            types: types
                .iter()
                .map(|(slot, code)| TypeSlot {
                    slot: *slot,
                    kind: named(code),
                })
                .collect(),
            sprites: Sprites {
                front_default: Some("https://img/25.png".to_string()),
                other: None,
            },
            price: None,
        }
    }

    fn flavor(text: &str, lang: &str) -> FlavorText {
        FlavorText {
            flavor_text: text.to_string(),
            language: named(lang),
            version: None,
        }
    }

    #[test]
    fn normalize_happy_path() {
        let p = primary("pikachu", &[(1, "electric")]);
        let s = SecondaryDetail {
            flavor_text_entries: vec![
                flavor("When several of\nthese POKéMON gather", "en"),
                flavor("Cuando se enfadan,\ndescargan\u{c}electricidad.", "es"),
            ],
        };
        let mut rng = StdRng::seed_from_u64(7);
        let e = normalize_with_rng(&p, &s, &NormalizeOptions::default(), &mut rng);

        assert_eq!(e.upstream_id, 25);
        assert_eq!(e.key, "pikachu");
        assert_eq!(e.name, "Pikachu");
        assert_eq!(e.categories, vec!["Eléctrico".to_string()]);
        assert_eq!(e.image_url.as_deref(), Some("https://img/25.png"));
        assert_eq!(e.description, "Cuando se enfadan, descargan electricidad.");
        assert!(PriceRange::default().contains(e.price));
    }

    #[test]
    fn categories_follow_slot_order_and_fall_back() {
        let p = primary("charizard", &[(2, "flying"), (1, "fire")]);
        assert_eq!(translate_categories(&p), vec!["Fuego", "Volador"]);

        let p = primary("oddity", &[(1, "shadow")]);
        assert_eq!(translate_categories(&p), vec!["Shadow"]);

        let p = primary("nothing", &[]);
        assert_eq!(translate_categories(&p), vec![UNKNOWN_CATEGORY_LABEL]);
    }

    #[test]
    fn image_prefers_artwork_then_sprite_then_none() {
        let mut sprites = Sprites {
            front_default: Some("https://img/1.png".to_string()),
            other: Some(OtherSprites {
                official_artwork: Some(Artwork {
                    front_default: Some("https://art/1.png".to_string()),
                }),
            }),
        };
        assert_eq!(select_image(&sprites).as_deref(), Some("https://art/1.png"));

        sprites.other = Some(OtherSprites {
            official_artwork: Some(Artwork { front_default: None }),
        });
        assert_eq!(select_image(&sprites).as_deref(), Some("https://img/1.png"));

        sprites.front_default = None;
        assert_eq!(select_image(&sprites), None);
    }

    #[test]
    fn description_placeholder_when_language_missing() {
        let entries = vec![flavor("Some text", "en"), flavor("Texte", "fr")];
        assert_eq!(select_description(&entries, "es"), DESCRIPTION_PLACEHOLDER);
        assert_eq!(select_description(&[], "es"), DESCRIPTION_PLACEHOLDER);
    }

    #[test]
    fn normalize_is_deterministic_apart_from_price() {
        let p = primary("bulbasaur", &[(1, "grass"), (2, "poison")]);
        let s = SecondaryDetail {
            flavor_text_entries: vec![flavor("Una rara semilla.", "es")],
        };
        let opts = NormalizeOptions::default();
        let mut a = normalize(&p, &s, &opts);
        let mut b = normalize(&p, &s, &opts);
        a.price = 0;
        b.price = 0;
        assert_eq!(a, b);
    }

    #[test]
    fn synthesized_price_stays_in_bounds() {
        let range = PriceRange::new(1_000, 1_005).unwrap();
        let opts = NormalizeOptions {
            language: "es".to_string(),
            price_range: range,
        };
        let p = primary("ditto", &[(1, "normal")]);
        let s = SecondaryDetail::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let e = normalize_with_rng(&p, &s, &opts, &mut rng);
            assert!(range.contains(e.price), "price {} out of range", e.price);
        }
    }

    #[test]
    fn upstream_price_is_clamped_not_replaced() {
        let mut p = primary("mew", &[(1, "psychic")]);
        p.price = Some(5_000);
        let e = normalize(&p, &SecondaryDetail::default(), &NormalizeOptions::default());
        assert_eq!(e.price, 5_000);

        p.price = Some(10);
        let e = normalize(&p, &SecondaryDetail::default(), &NormalizeOptions::default());
        assert_eq!(e.price, DEFAULT_PRICE_MIN);
    }

    #[test]
    fn price_range_rejects_inverted_or_non_positive() {
        assert!(PriceRange::new(10, 5).is_err());
        assert!(PriceRange::new(0, 5).is_err());
        assert!(PriceRange::new(5, 5).is_ok());
        assert_eq!(
            PriceRange::new(10, 5).unwrap_err().to_string(),
            "price range must satisfy 0 < min <= max, got [10, 5]"
        );
    }

    #[test]
    fn display_name_already_capitalized_is_unchanged() {
        let p = primary("Pikachu", &[(1, "electric")]);
        let e = normalize(&p, &SecondaryDetail::default(), &NormalizeOptions::default());
        assert_eq!(e.name, "Pikachu");
        assert_eq!(e.key, "pikachu");
    }
}
