//! The catalog of known school subjects and their search aliases.
//!
//! The portal is inconsistent about subject naming: "Artes" shows up as
//! "Arte", "Língua Portuguesa" is split into "Gramática" and
//! "Interpretação de Texto" tabs, "Matemática" may appear as
//! "Matemática I/II/Fundamental". The irregular cases live in a static
//! table so catalog evolution never touches the matching algorithm.

use phf::phf_map;

use crate::utils::text::normalize;

/// Canonical display names, in roster order. Subjects the portal splits
/// into sub-tabs (Gramática, Matemática I/II) are unified here.
const ROSTER: &[&str] = &[
    "Filosofia",
    "Geografia",
    "Artes",
    "Química",
    "Inglês",
    "Física",
    "Matemática",
    "Biologia",
    "História",
    "Literatura",
    "Língua Portuguesa",
    "Educação Física",
    "Redação",
    "Sociologia",
    "Espanhol",
    "Projeto de Vida",
];

/// Alias search terms for subjects whose portal spelling varies, keyed by
/// the normalized canonical name. Subjects absent here are searched by
/// their normalized canonical name alone.
///
/// Order matters within a list only for readability; the scanner always
/// prefers the longest term matching at a given position.
static ALIASES: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "artes" => &["artes", "arte"],
    "ingles" => &["ingles", "lingua inglesa"],
    "espanhol" => &["espanhol", "lingua espanhola"],
    "lingua portuguesa" => &[
        "gramatica",
        "interpretacao de texto",
        "interpretacao de textos",
        "lingua portuguesa",
        "portugues",
    ],
    "matematica" => &[
        "matematica i",
        "matematica ii",
        "matematica fundamental",
        "matematica",
    ],
};

/// One catalog subject: the canonical display name plus the normalized
/// terms the extractor scans for.
#[derive(Debug, Clone)]
pub struct CatalogSubject {
    pub name: String,
    pub terms: Vec<String>,
}

/// Ordered, deduplicated set of known subjects.
#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    subjects: Vec<CatalogSubject>,
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        let mut subjects = Vec::with_capacity(ROSTER.len());
        for name in ROSTER {
            let normalized = normalize(name);
            let terms = match ALIASES.get(normalized.as_str()) {
                Some(aliases) => aliases.iter().map(|t| t.to_string()).collect(),
                None => vec![normalized],
            };
            subjects.push(CatalogSubject {
                name: name.to_string(),
                terms,
            });
        }
        SubjectCatalog { subjects }
    }
}

impl SubjectCatalog {
    pub fn subjects(&self) -> &[CatalogSubject] {
        &self.subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Resolves a user-typed name (any casing/accents) to the canonical
    /// display name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let wanted = normalize(name);
        self.subjects
            .iter()
            .find(|s| normalize(&s.name) == wanted)
            .map(|s| s.name.as_str())
    }

    /// All terms belonging to subjects other than `name`, used as the
    /// stop-word set when delimiting a section.
    pub fn other_terms(&self, name: &str) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|s| s.name != name)
            .flat_map(|s| s.terms.iter().map(|t| t.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_ordered_and_deduplicated() {
        let catalog = SubjectCatalog::default();
        assert_eq!(catalog.len(), ROSTER.len());
        let mut seen = std::collections::HashSet::new();
        for subject in catalog.subjects() {
            assert!(seen.insert(subject.name.clone()), "duplicate subject");
            assert!(!subject.terms.is_empty());
        }
        assert_eq!(catalog.subjects()[0].name, "Filosofia");
    }

    #[test]
    fn test_unified_subjects_carry_aliases() {
        let catalog = SubjectCatalog::default();
        let portuguese = catalog
            .subjects()
            .iter()
            .find(|s| s.name == "Língua Portuguesa")
            .unwrap();
        assert!(portuguese.terms.iter().any(|t| t == "gramatica"));
        assert!(portuguese.terms.iter().any(|t| t == "portugues"));

        let math = catalog
            .subjects()
            .iter()
            .find(|s| s.name == "Matemática")
            .unwrap();
        assert!(math.terms.iter().any(|t| t == "matematica ii"));
    }

    #[test]
    fn test_resolve_ignores_case_and_accents() {
        let catalog = SubjectCatalog::default();
        assert_eq!(catalog.resolve("química"), Some("Química"));
        assert_eq!(catalog.resolve("QUIMICA"), Some("Química"));
        assert_eq!(catalog.resolve("Robótica"), None);
    }

    #[test]
    fn test_other_terms_excludes_own_aliases() {
        let catalog = SubjectCatalog::default();
        let others = catalog.other_terms("Língua Portuguesa");
        assert!(!others.contains(&"gramatica"));
        assert!(others.contains(&"fisica"));
    }
}
