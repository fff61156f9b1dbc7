//! The grade text extractor: a best-effort heuristic parser that locates
//! per-subject, per-bimester scores inside raw text pasted from the
//! EscolaWeb portal.
//!
//! The portal has two copyable layouts, and students paste either one:
//!
//! - the tab-by-tab view ("Notas Parciais"), one bimester per paste, with
//!   the detailed TM/TB/TD labels;
//! - the consolidated summary ("Resultados Gerais"), all subjects and
//!   bimesters in one flat blob, with only per-bimester aggregates.
//!
//! Everything runs on normalized text (lowercase, accents stripped). Each
//! catalog subject is scanned independently against the same blob, so the
//! extractor is re-entrant and per-subject invocations never share state.

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::models::{Bimester, SubjectCatalog, SubjectMap, YearRecord};
use crate::utils::text::{format_score, normalize, parse_decimal, tail_chars};

/// How far behind a "física" match the word "educação" may sit for the
/// match to be discarded as part of "Educação Física".
const EMBEDDING_LOOKBACK: usize = 15;

/// Bimester headers closer together than this (in normalized text offsets)
/// are a navigational menu, not content headers. Empirically tuned.
const MENU_CLUSTER_SPAN: usize = 180;

/// Outcome of one label→value lookup inside a section.
#[derive(Debug, Clone, PartialEq)]
enum LabelRead {
    /// Label not present, or present with nothing readable after it.
    NotFound,
    /// Label followed by the portal's dash: recorded as ungraded.
    Blank,
    /// Label followed by a decimal number.
    Value(f64),
}

impl LabelRead {
    /// Maps onto the stored tri-state field: `NotFound` leaves the field
    /// alone, `Blank` writes the explicit-empty string, `Value` writes the
    /// two-decimal formatted score.
    fn apply(&self, field: &mut Option<String>) {
        match self {
            LabelRead::NotFound => {}
            LabelRead::Blank => *field = Some(String::new()),
            LabelRead::Value(v) => *field = Some(format_score(*v)),
        }
    }
}

/// One accepted occurrence of a subject term and the span of text
/// attributed to it.
#[derive(Debug)]
struct Section {
    start: usize,
    end: usize,
}

/// A "Nº bimestre" marker found in the full text.
#[derive(Debug, Clone, Copy)]
struct Header {
    pos: usize,
    bimester: Bimester,
}

/// Extracts a [`SubjectMap`] fragment from one raw text blob.
pub struct GradeExtractor {
    catalog: SubjectCatalog,
    monthly_test: Regex,
    bimester_test: Regex,
    various_work: Regex,
    header: Regex,
    makeup_sem1: Regex,
    makeup_sem2: Regex,
    final_label: Regex,
    number: Regex,
    blank_marker: Regex,
}

impl GradeExtractor {
    pub fn new(catalog: SubjectCatalog) -> Result<Self> {
        Ok(Self {
            catalog,
            monthly_test: Regex::new(r"teste\s*mensal")?,
            bimester_test: Regex::new(r"teste\s*bimestral")?,
            various_work: Regex::new(r"teste\s*dirigido|trabalhos")?,
            header: Regex::new(r"([1-4])\s*[ºo°]?\s*bimestre")?,
            makeup_sem1: Regex::new(r"rec(?:uperacao)?[^0-9]{0,20}1\s*[ºo°]?\s*semestre")?,
            makeup_sem2: Regex::new(r"rec(?:uperacao)?[^0-9]{0,20}2\s*[ºo°]?\s*semestre")?,
            final_label: Regex::new(r"resultado|total|media\s*final")?,
            number: Regex::new(r"\d+(?:[.,]\d+)?")?,
            blank_marker: Regex::new(r"^\s*-\s*/?")?,
        })
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    /// Runs the extraction over the whole catalog and unions the non-empty
    /// results. Subjects without evidence contribute nothing.
    ///
    /// `forced` pins every section to one bimester; the caller sets it when
    /// the paste is a single grading-period tab.
    pub fn extract(&self, raw_text: &str, forced: Option<Bimester>) -> SubjectMap {
        let text = normalize(raw_text);
        let headers = self.collect_headers(&text);

        let mut results = SubjectMap::new();
        for subject in self.catalog.subjects() {
            if let Some(record) = self.extract_subject(&text, &headers, subject.name.as_str(), forced)
            {
                results.insert(subject.name.clone(), record);
            }
        }
        debug!("extração concluída: {} matérias com dados", results.len());
        results
    }

    /// Extracts one subject's record, or `None` when no section produced
    /// any field, make-up, or final-result data.
    fn extract_subject(
        &self,
        text: &str,
        headers: &[Header],
        subject: &str,
        forced: Option<Bimester>,
    ) -> Option<YearRecord> {
        let subject_terms: Vec<&str> = self
            .catalog
            .subjects()
            .iter()
            .find(|s| s.name == subject)?
            .terms
            .iter()
            .map(|t| t.as_str())
            .collect();
        let stop_terms = self.catalog.other_terms(subject);

        let sections = self.find_sections(text, &subject_terms, &stop_terms);
        if sections.is_empty() {
            return None;
        }
        debug!("{}: {} seções encontradas", subject, sections.len());

        let multiple = sections.len() > 1;
        let mut record = YearRecord::default();

        for (index, section) in sections.iter().enumerate() {
            let body = &text[section.start..section.end];

            let detailed = forced.is_some()
                || multiple
                || self.monthly_test.is_match(body)
                || self.bimester_test.is_match(body)
                || self.various_work.is_match(body);

            if detailed {
                let bimester = self.assign_bimester(body, section.start, headers, forced, multiple, index);
                let slot = record.bimester_mut(bimester);
                self.read_label(body, &self.monthly_test).apply(&mut slot.monthly_test);
                self.read_label(body, &self.bimester_test).apply(&mut slot.bimester_test);
                self.read_label(body, &self.various_work).apply(&mut slot.various_work);
            } else {
                // Consolidated summary: the ordinal markers double as
                // generic-average labels, one per bimester. Kept apart from
                // TB so a later manual edit is never shadowed by a stale
                // aggregate.
                for bimester in Bimester::ALL {
                    let label = self.ordinal_label(bimester);
                    self.read_label(body, &label)
                        .apply(&mut record.bimester_mut(bimester).general_average);
                }
            }

            // Make-up scores attach to b2/b4 regardless of the section's
            // own bimester.
            if let LabelRead::Value(v) = self.read_label(body, &self.makeup_sem1) {
                record.b2.makeup_exam = Some(format_score(v));
            }
            if let LabelRead::Value(v) = self.read_label(body, &self.makeup_sem2) {
                record.b4.makeup_exam = Some(format_score(v));
            }

            if let Some(result) = self.read_official_result(body) {
                record.official_final_result = Some(format_score(result));
            }
        }

        if record.is_empty() {
            return None;
        }
        Some(record)
    }

    /// Left-to-right scan for every non-overlapping occurrence of the
    /// subject's terms, each delimited by the nearest following occurrence
    /// of another subject's term.
    fn find_sections(&self, text: &str, terms: &[&str], stop_terms: &[&str]) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut cursor = 0;

        while cursor < text.len() {
            let Some((start, term_len)) = self.next_occurrence(text, cursor, terms) else {
                break;
            };
            let end = self.section_end(text, start + term_len, stop_terms);
            sections.push(Section { start, end });
            cursor = start + term_len;
        }
        sections
    }

    /// Earliest accepted occurrence of any term at or after `from`.
    /// Prefers the longest term matching at the same position, so the bare
    /// "matematica" never swallows "matematica ii".
    fn next_occurrence(&self, text: &str, from: usize, terms: &[&str]) -> Option<(usize, usize)> {
        let mut cursor = from;
        loop {
            // earliest start among all terms
            let mut earliest: Option<usize> = None;
            for term in terms {
                if let Some(rel) = text[cursor..].find(term) {
                    let pos = cursor + rel;
                    earliest = Some(earliest.map_or(pos, |e: usize| e.min(pos)));
                }
            }
            let pos = earliest?;

            // longest term matching at that start which survives the checks
            let mut candidates: Vec<&str> = terms
                .iter()
                .copied()
                .filter(|t| text[pos..].starts_with(t))
                .collect();
            candidates.sort_by_key(|t| std::cmp::Reverse(t.len()));

            for term in candidates {
                if self.accept_occurrence(text, pos, term) {
                    return Some((pos, term.len()));
                }
            }
            cursor = pos + 1;
        }
    }

    /// Disambiguation rules for one candidate match.
    fn accept_occurrence(&self, text: &str, pos: usize, term: &str) -> bool {
        // a term glued to more letters/digits is a different word
        // ("matematica" inside "matematica ii")
        if let Some(next) = text[pos + term.len()..].chars().next() {
            if next.is_alphanumeric() {
                return false;
            }
        }
        // "física" right after "educação" is Educação Física
        if term == "fisica" && tail_chars(&text[..pos], EMBEDDING_LOOKBACK).contains("educacao") {
            return false;
        }
        true
    }

    /// Start of the nearest accepted occurrence of any stop term after
    /// `from`, or end-of-text.
    fn section_end(&self, text: &str, from: usize, stop_terms: &[&str]) -> usize {
        let mut end = text.len();
        for term in stop_terms {
            let mut search = from;
            while search < end {
                let Some(rel) = text[search..].find(term) else {
                    break;
                };
                let pos = search + rel;
                if pos >= end {
                    break;
                }
                if self.accept_occurrence(text, pos, term) {
                    end = pos;
                    break;
                }
                search = pos + 1;
            }
        }
        end
    }

    /// All "Nº bimestre" markers in the full text, in order.
    fn collect_headers(&self, text: &str) -> Vec<Header> {
        self.header
            .captures_iter(text)
            .filter_map(|cap| {
                let pos = cap.get(0)?.start();
                let n: u8 = cap.get(1)?.as_str().parse().ok()?;
                Some(Header {
                    pos,
                    bimester: Bimester::from_ordinal(n)?,
                })
            })
            .collect()
    }

    /// Bimester assignment priority for one detailed-mode section:
    /// forced → in-section marker → nearest preceding marker (with the
    /// clustered-menu fallback) → occurrence order → b1.
    fn assign_bimester(
        &self,
        body: &str,
        section_start: usize,
        headers: &[Header],
        forced: Option<Bimester>,
        multiple: bool,
        occurrence_index: usize,
    ) -> Bimester {
        if let Some(forced) = forced {
            return forced;
        }

        if let Some(cap) = self.header.captures(body) {
            if let Some(b) = cap
                .get(1)
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .and_then(Bimester::from_ordinal)
            {
                return b;
            }
        }

        let preceding: Vec<&Header> = headers.iter().filter(|h| h.pos <= section_start).collect();
        if let Some(nearest) = preceding.last() {
            // two headers packed close together are a navigation menu, not
            // a content header
            let clustered = preceding.len() >= 2
                && nearest.pos - preceding[preceding.len() - 2].pos <= MENU_CLUSTER_SPAN;
            if clustered {
                return Bimester::B1;
            }
            return nearest.bimester;
        }

        if multiple {
            return Bimester::from_occurrence(occurrence_index);
        }
        Bimester::B1
    }

    /// The per-bimester generic-average label ("1º bimestre", "2 bimestre"…).
    fn ordinal_label(&self, bimester: Bimester) -> Regex {
        // built from a fixed template, cannot fail
        Regex::new(&format!(r"{}\s*[ºo°]?\s*bimestre", bimester.ordinal()))
            .unwrap_or_else(|_| self.header.clone())
    }

    /// Label→value lookup: first match of the label, then either the dash
    /// marker right after it (explicit-empty) or the first decimal number.
    fn read_label(&self, body: &str, label: &Regex) -> LabelRead {
        let Some(m) = label.find(body) else {
            return LabelRead::NotFound;
        };
        let after = &body[m.end()..];

        if self.blank_marker.is_match(after) {
            return LabelRead::Blank;
        }
        if let Some(num) = self.number.find(after) {
            if let Some(v) = parse_decimal(num.as_str()) {
                return LabelRead::Value(v);
            }
        }
        LabelRead::NotFound
    }

    /// "Resultado"/"Total"/"Média Final" followed eventually by a grade in
    /// [0, 10]; the last valid match in the section wins. Numbers wearing
    /// an ordinal suffix ("1º") are never grades.
    fn read_official_result(&self, body: &str) -> Option<f64> {
        let mut result = None;
        for label in self.final_label.find_iter(body) {
            let after = &body[label.end()..];
            // a label glued to more letters is a different word
            // ("resultados gerais", "totalmente")
            if after.chars().next().map(char::is_alphanumeric).unwrap_or(false) {
                continue;
            }
            for num in self.number.find_iter(after) {
                let followed_by_ordinal = after[num.end()..]
                    .chars()
                    .next()
                    .map(|c| matches!(c, 'º' | '°' | 'o'))
                    .unwrap_or(false);
                if followed_by_ordinal {
                    continue;
                }
                if let Some(v) = parse_decimal(num.as_str()) {
                    if (0.0..=10.0).contains(&v) {
                        result = Some(v);
                        break;
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> GradeExtractor {
        GradeExtractor::new(SubjectCatalog::default()).unwrap()
    }

    #[test]
    fn test_detailed_section_under_header() {
        let text = "2º Bimestre\nFísica\nTeste Mensal 7,5\nTeste Bimestral - \nTeste Dirigido 8.0";
        let map = extractor().extract(text, None);

        let fisica = &map["Física"];
        assert_eq!(fisica.b2.monthly_test.as_deref(), Some("7.50"));
        assert_eq!(fisica.b2.bimester_test.as_deref(), Some(""));
        assert_eq!(fisica.b2.various_work.as_deref(), Some("8.00"));
        assert!(fisica.b1.is_empty());
        assert!(fisica.b3.is_empty());
        assert!(fisica.b4.is_empty());
    }

    #[test]
    fn test_fisica_not_taken_from_educacao_fisica() {
        let text = "Educação Física Teste Mensal 9,0";
        let map = extractor().extract(text, None);

        assert!(!map.contains_key("Física"));
        let ed = &map["Educação Física"];
        assert_eq!(ed.b1.monthly_test.as_deref(), Some("9.00"));
    }

    #[test]
    fn test_marker_inside_section_assigns_bimester() {
        // the marker sits after the subject name, inside the section body
        let text = "Filosofia 3º Bimestre Teste Mensal 6,0";
        let map = extractor().extract(text, None);

        let filosofia = &map["Filosofia"];
        assert_eq!(filosofia.b3.monthly_test.as_deref(), Some("6.00"));
        assert!(filosofia.b1.is_empty());
        assert!(filosofia.b2.is_empty());
        assert!(filosofia.b4.is_empty());
    }

    #[test]
    fn test_later_section_overwrites_only_its_fields() {
        // same subject, same bimester, twice: the second paste replaces the
        // score it carries and leaves the rest of the slot alone
        let text = "Química 2º Bimestre Teste Mensal 5,0 Teste Bimestral 6,0 \
                    Química 2º Bimestre Teste Mensal 7,5";
        let map = extractor().extract(text, None);

        let quimica = &map["Química"];
        assert_eq!(quimica.b2.monthly_test.as_deref(), Some("7.50"));
        assert_eq!(quimica.b2.bimester_test.as_deref(), Some("6.00"));
    }

    #[test]
    fn test_forced_bimester_pins_every_section() {
        let text = "Química Teste Mensal 6,0 Biologia Teste Mensal 7,0";
        let map = extractor().extract(text, Some(Bimester::B3));

        assert_eq!(map["Química"].b3.monthly_test.as_deref(), Some("6.00"));
        assert_eq!(map["Biologia"].b3.monthly_test.as_deref(), Some("7.00"));
    }

    #[test]
    fn test_sequential_assignment_without_headers() {
        let text = "Química Teste Mensal 5,0 Química Teste Mensal 6,0 \
                    Química Teste Mensal 7,0 Química Teste Mensal 8,0";
        let map = extractor().extract(text, None);

        let quimica = &map["Química"];
        assert_eq!(quimica.b1.monthly_test.as_deref(), Some("5.00"));
        assert_eq!(quimica.b2.monthly_test.as_deref(), Some("6.00"));
        assert_eq!(quimica.b3.monthly_test.as_deref(), Some("7.00"));
        assert_eq!(quimica.b4.monthly_test.as_deref(), Some("8.00"));
    }

    #[test]
    fn test_general_average_mode() {
        let text = "Geografia 1º Bimestre 7,0 2º Bimestre 8,0 3º Bimestre - 4º Bimestre 6,5";
        let map = extractor().extract(text, None);

        let geo = &map["Geografia"];
        assert_eq!(geo.b1.general_average.as_deref(), Some("7.00"));
        assert_eq!(geo.b2.general_average.as_deref(), Some("8.00"));
        assert_eq!(geo.b3.general_average.as_deref(), Some(""));
        assert_eq!(geo.b4.general_average.as_deref(), Some("6.50"));
        // aggregate never lands on the detailed fields
        assert!(geo.b1.bimester_test.is_none());
    }

    #[test]
    fn test_makeup_attaches_to_b2_and_b4() {
        let text = "Matemática 1º Bimestre 5,0 2º Bimestre 6,0 \
                    Recuperação 1º Semestre 8,0 Recuperação 2º Semestre 4,0";
        let map = extractor().extract(text, None);

        let math = &map["Matemática"];
        assert_eq!(math.b2.makeup_exam.as_deref(), Some("8.00"));
        assert_eq!(math.b4.makeup_exam.as_deref(), Some("4.00"));
    }

    #[test]
    fn test_official_final_result_last_match_wins() {
        let text = "História 1º Bimestre 7,0 Resultado 1º 8,5 Média Final 7,5";
        let map = extractor().extract(text, None);

        // "1º" is an ordinal, not a grade; 8.5 is valid, then 7.5 wins
        assert_eq!(
            map["História"].official_final_result.as_deref(),
            Some("7.50")
        );
    }

    #[test]
    fn test_screen_title_is_not_an_official_result() {
        let text = "Biologia Resultados Gerais 1º Bimestre 7,0";
        let map = extractor().extract(text, None);

        let bio = &map["Biologia"];
        assert!(bio.official_final_result.is_none());
        assert_eq!(bio.b1.general_average.as_deref(), Some("7.00"));
    }

    #[test]
    fn test_clustered_headers_are_a_menu() {
        // four headers packed together = tab bar; content has no headers
        let text = "1º Bimestre 2º Bimestre 3º Bimestre 4º Bimestre \
                    Sociologia Teste Mensal 6,0";
        let map = extractor().extract(text, None);

        assert_eq!(map["Sociologia"].b1.monthly_test.as_deref(), Some("6.00"));
        assert!(map["Sociologia"].b2.is_empty());
        assert!(map["Sociologia"].b3.is_empty());
        assert!(map["Sociologia"].b4.is_empty());
    }

    #[test]
    fn test_unified_portuguese_aliases() {
        let text = "Gramática Teste Mensal 8,0";
        let map = extractor().extract(text, None);

        assert_eq!(
            map["Língua Portuguesa"].b1.monthly_test.as_deref(),
            Some("8.00")
        );
        assert!(!map.contains_key("Gramática"));
    }

    #[test]
    fn test_matematica_suffix_rejection() {
        // "matematica ii" must match as one unit, not as bare "matematica"
        // plus a stray "i" section
        let text = "Matemática II Teste Mensal 9,0";
        let map = extractor().extract(text, None);

        assert_eq!(map["Matemática"].b1.monthly_test.as_deref(), Some("9.00"));
    }

    #[test]
    fn test_no_match_yields_no_entry() {
        let map = extractor().extract("texto sem nenhuma matéria", None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_section_stops_at_next_subject() {
        let text = "Biologia Teste Mensal 6,0 Filosofia Teste Mensal 9,0";
        let map = extractor().extract(text, None);

        assert_eq!(map["Biologia"].b1.monthly_test.as_deref(), Some("6.00"));
        assert_eq!(map["Filosofia"].b1.monthly_test.as_deref(), Some("9.00"));
    }
}
