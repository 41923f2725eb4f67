//! Payload builders shaped like the real upstream responses.

use dex_catalog::upstream::{
    Artwork, FlavorText, NamedResource, OtherSprites, PrimaryDetail, SecondaryDetail, Sprites,
    TypeSlot,
};
use dex_catalog::EntityDetail;

fn named(name: &str) -> NamedResource {
    NamedResource {
        name: name.to_string(),
        url: String::new(),
    }
}

pub fn primary(id: i64, name: &str, types: &[&str]) -> PrimaryDetail {
    PrimaryDetail {
        id,
        name: name.to_string(),
        types: types
            .iter()
            .enumerate()
            .map(|(i, code)| TypeSlot {
                slot: (i + 1) as u8,
                kind: named(code),
            })
            .collect(),
        sprites: Sprites {
            front_default: Some(format!("https://sprites.test/{id}.png")),
            other: Some(OtherSprites {
                official_artwork: Some(Artwork {
                    front_default: Some(format!("https://artwork.test/{id}.png")),
                }),
            }),
        },
        price: None,
    }
}

pub fn secondary(text_es: &str) -> SecondaryDetail {
    SecondaryDetail {
        flavor_text_entries: vec![
            FlavorText {
                flavor_text: "English flavor text.".to_string(),
                language: named("en"),
                version: None,
            },
            FlavorText {
                flavor_text: text_es.to_string(),
                language: named("es"),
                version: None,
            },
        ],
    }
}

/// Type codes rotated through generated entities so batches mix one- and
/// two-category records.
const TYPE_ROTATION: &[&[&str]] = &[&["grass", "poison"], &["fire"], &["water"], &["electric"]];

/// Deterministic detail for a generated entity (1-based id): id 1 is
/// grass/poison, 2 fire, 3 water, 4 electric, then repeat.
pub fn generated_detail(id: i64, name: &str) -> EntityDetail {
    let slot = (id.max(1) - 1) as usize % TYPE_ROTATION.len();
    let types = TYPE_ROTATION[slot];
    EntityDetail {
        primary: primary(id, name, types),
        secondary: secondary(&format!("Descripción de {name}.")),
    }
}

/// `count` generated listing names: `mon-001`, `mon-002`, …
pub fn generated_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("mon-{i:03}")).collect()
}
