//! Category code → display label translation.
//!
//! The table is a static slice; nothing mutates it at runtime. Codes missing
//! from the table fall back to the capitalized raw code, so translation can
//! never fail an import.

/// Upstream type code → Spanish display label.
pub static CATEGORY_LABELS: &[(&str, &str)] = &[
    ("normal", "Normal"),
    ("fire", "Fuego"),
    ("water", "Agua"),
    ("grass", "Planta"),
    ("electric", "Eléctrico"),
    ("ice", "Hielo"),
    ("fighting", "Lucha"),
    ("poison", "Veneno"),
    ("ground", "Tierra"),
    ("flying", "Volador"),
    ("psychic", "Psíquico"),
    ("bug", "Bicho"),
    ("rock", "Roca"),
    ("ghost", "Fantasma"),
    ("dragon", "Dragón"),
    ("dark", "Siniestro"),
    ("steel", "Acero"),
    ("fairy", "Hada"),
];

/// Label used when an upstream payload carries no category at all.
pub const UNKNOWN_CATEGORY_LABEL: &str = "Desconocido";

pub fn label_for(code: &str) -> Option<&'static str> {
    let code = code.trim();
    CATEGORY_LABELS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

/// Translate one category code, falling back to the capitalized code.
pub fn translate_category(code: &str) -> String {
    match label_for(code) {
        Some(label) => label.to_string(),
        None => capitalize_first(code.trim()),
    }
}

/// Uppercase the first character, leave the rest untouched.
///
/// Idempotent: `capitalize_first(capitalize_first(s)) == capitalize_first(s)`.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
