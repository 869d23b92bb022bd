use std::collections::{HashMap, HashSet};

use super::model::{Category, COL_DESCRIPCION, COL_FECHA_INSTALACION};

// ---------------------------------------------------------------------------
// Header cleanup and renaming
// ---------------------------------------------------------------------------

/// Source header (already normalized) → canonical column name.
const RENAMES: &[(&str, &str)] = &[
    ("Descripción Equipo", COL_DESCRIPCION),
    ("Fecha Instal.", COL_FECHA_INSTALACION),
    ("GOT Reactivas. (USD)", "Reactivas"),
    // Older workbooks spell it without the dot.
    ("GOT Reactivas (USD)", "Reactivas"),
    ("GOT A Falla (USD)", "Falla"),
    ("GOT Mejoras (USD)", "Mejoras"),
    ("GOT Preven. (USD)", "Preventivo"),
    ("GOT CBM (USD)", "CBM"),
];

/// Trim, drop line breaks and collapse runs of spaces.
///
/// `"  Fecha Instal.\n"` becomes `"Fecha Instal."`.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    let without_breaks: String = trimmed.chars().filter(|c| *c != '\n' && *c != '\r').collect();

    let mut out = String::with_capacity(without_breaks.len());
    let mut prev_space = false;
    for c in without_breaks.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Canonical name for a normalized header; unknown headers pass through.
pub fn canonical_name(normalized: &str) -> &str {
    RENAMES
        .iter()
        .find(|(source, _)| *source == normalized)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(normalized)
}

/// Source header that maps onto a category, for messages and sample output.
pub fn source_header(category: Category) -> &'static str {
    match category {
        Category::Reactivas => "GOT Reactivas. (USD)",
        Category::Falla => "GOT A Falla (USD)",
        Category::Mejoras => "GOT Mejoras (USD)",
        Category::Preventivo => "GOT Preven. (USD)",
        Category::Cbm => "GOT CBM (USD)",
    }
}

/// Normalize and rename every header, disambiguating duplicates as
/// `X`, `X.1`, `X.2`, ... A suffix is skipped when that name is already
/// taken by another header.
pub fn resolve_headers(raw: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut resolved = Vec::with_capacity(raw.len());

    for (idx, header) in raw.iter().enumerate() {
        let normalized = normalize_header(header);
        let mut base = canonical_name(&normalized).to_string();
        if base.is_empty() {
            base = format!("Unnamed: {idx}");
        }

        let mut name = base.clone();
        if taken.contains(&name) {
            log::debug!("duplicate column {base:?} at position {idx}");
            let seen = counts.entry(base.clone()).or_insert(0);
            loop {
                *seen += 1;
                name = format!("{base}.{seen}");
                if !taken.contains(&name) {
                    break;
                }
            }
        }
        taken.insert(name.clone());
        resolved.push(name);
    }
    resolved
}
