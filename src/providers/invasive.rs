//! Invasive species lookup.
//!
//! Identification providers report what a plant is, not whether it is a
//! problem. The service decides that itself from a list of species names.
//! Matching is case-insensitive and accepts either the scientific name or
//! any common name the provider returned.

use std::collections::HashSet;

/// Species flagged as invasive when no list is configured.
pub const DEFAULT_INVASIVE_SPECIES: &[&str] = &[
    "Reynoutria japonica",
    "Fallopia japonica",
    "Japanese knotweed",
    "Pueraria montana",
    "Kudzu",
    "Impatiens glandulifera",
    "Himalayan balsam",
    "Heracleum mantegazzianum",
    "Giant hogweed",
    "Lythrum salicaria",
    "Purple loosestrife",
    "Ailanthus altissima",
    "Tree of heaven",
    "Alliaria petiolata",
    "Garlic mustard",
    "Pontederia crassipes",
    "Eichhornia crassipes",
    "Water hyacinth",
    "Rhododendron ponticum",
    "Lonicera japonica",
    "Japanese honeysuckle",
];

/// Case-insensitive set of invasive species names.
#[derive(Debug, Clone)]
pub struct InvasiveSpecies {
    names: HashSet<String>,
}

impl Default for InvasiveSpecies {
    fn default() -> Self {
        Self::new(DEFAULT_INVASIVE_SPECIES.iter().copied())
    }
}

impl InvasiveSpecies {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| normalize(n.as_ref())).collect(),
        }
    }

    /// An empty list: nothing is ever flagged.
    pub fn none() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Add more names to the list.
    pub fn extend<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names
            .extend(names.into_iter().map(|n| normalize(n.as_ref())));
        self
    }

    /// Whether any of the given names is on the list.
    pub fn matches<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names
            .into_iter()
            .any(|name| self.names.contains(&normalize(name)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
