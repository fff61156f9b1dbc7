//! Grade data model: one school year of bimester scores per subject.
//!
//! Score fields are stored as the raw text the user (or the importer)
//! produced, exactly like the portal shows them:
//!
//! - `None`: the field was never filled in / never produced by an import
//! - `Some("")`: explicitly recorded as ungraded (the portal's dash)
//! - `Some("7.50")`: a grade, two decimal places
//!
//! Keeping the three states apart is what makes field-level merging of an
//! import into existing manual entries possible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the four grading periods of the school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bimester {
    B1,
    B2,
    B3,
    B4,
}

impl Bimester {
    pub const ALL: [Bimester; 4] = [Bimester::B1, Bimester::B2, Bimester::B3, Bimester::B4];

    /// Zero-based index (b1 = 0).
    pub fn index(self) -> usize {
        match self {
            Bimester::B1 => 0,
            Bimester::B2 => 1,
            Bimester::B3 => 2,
            Bimester::B4 => 3,
        }
    }

    /// Ordinal as printed by the portal (b1 = 1).
    pub fn ordinal(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            1 => Some(Bimester::B1),
            2 => Some(Bimester::B2),
            3 => Some(Bimester::B3),
            4 => Some(Bimester::B4),
            _ => None,
        }
    }

    /// Sequential assignment for consolidated dumps: the n-th occurrence of
    /// a subject maps to b1..b4 in order, repeating past the fourth.
    pub fn from_occurrence(position: usize) -> Self {
        Self::ALL[position % 4]
    }
}

impl std::fmt::Display for Bimester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}º Bimestre", self.ordinal())
    }
}

/// The score field within a bimester that a manual edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    /// TM, Teste Mensal
    MonthlyTest,
    /// TB, Teste Bimestral
    BimesterTest,
    /// TD, Trabalhos / Diversos
    VariousWork,
    /// Média geral importada (fallback quando não há TM/TB/TD)
    GeneralAverage,
    /// Recuperação semestral (anexada ao b2 / b4)
    MakeupExam,
}

impl ScoreField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tm" => Some(ScoreField::MonthlyTest),
            "tb" => Some(ScoreField::BimesterTest),
            "td" => Some(ScoreField::VariousWork),
            "media" => Some(ScoreField::GeneralAverage),
            "rec" => Some(ScoreField::MakeupExam),
            _ => None,
        }
    }
}

/// One grading period's raw inputs for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BimesterScore {
    /// TM, Teste Mensal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_test: Option<String>,
    /// TB, Teste Bimestral
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bimester_test: Option<String>,
    /// TD, Trabalhos / Diversos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub various_work: Option<String>,
    /// Aggregate average as reported by the portal; only consulted when the
    /// three components above are all absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_average: Option<String>,
    /// Raw semester make-up score. Lives on b2 (1º semestre) and b4
    /// (2º semestre); the bonus is applied at semester-average time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub makeup_exam: Option<String>,
}

impl BimesterScore {
    pub fn is_empty(&self) -> bool {
        self.monthly_test.is_none()
            && self.bimester_test.is_none()
            && self.various_work.is_none()
            && self.general_average.is_none()
            && self.makeup_exam.is_none()
    }

    pub fn get(&self, field: ScoreField) -> Option<&String> {
        match field {
            ScoreField::MonthlyTest => self.monthly_test.as_ref(),
            ScoreField::BimesterTest => self.bimester_test.as_ref(),
            ScoreField::VariousWork => self.various_work.as_ref(),
            ScoreField::GeneralAverage => self.general_average.as_ref(),
            ScoreField::MakeupExam => self.makeup_exam.as_ref(),
        }
    }

    pub fn set(&mut self, field: ScoreField, value: Option<String>) {
        match field {
            ScoreField::MonthlyTest => self.monthly_test = value,
            ScoreField::BimesterTest => self.bimester_test = value,
            ScoreField::VariousWork => self.various_work = value,
            ScoreField::GeneralAverage => self.general_average = value,
            ScoreField::MakeupExam => self.makeup_exam = value,
        }
    }

    /// Field-level merge: a `Some` on `other` overwrites (including the
    /// explicit-empty `Some("")`), a `None` leaves the prior value alone.
    pub fn merge_from(&mut self, other: &BimesterScore) {
        for field in [
            ScoreField::MonthlyTest,
            ScoreField::BimesterTest,
            ScoreField::VariousWork,
            ScoreField::GeneralAverage,
            ScoreField::MakeupExam,
        ] {
            if let Some(value) = other.get(field) {
                self.set(field, Some(value.clone()));
            }
        }
    }
}

/// One subject's full-year data: the four bimesters plus the rounded final
/// result the school itself reported (display-only, never computed with).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    #[serde(default)]
    pub b1: BimesterScore,
    #[serde(default)]
    pub b2: BimesterScore,
    #[serde(default)]
    pub b3: BimesterScore,
    #[serde(default)]
    pub b4: BimesterScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_final_result: Option<String>,
}

impl YearRecord {
    pub fn bimester(&self, b: Bimester) -> &BimesterScore {
        match b {
            Bimester::B1 => &self.b1,
            Bimester::B2 => &self.b2,
            Bimester::B3 => &self.b3,
            Bimester::B4 => &self.b4,
        }
    }

    pub fn bimester_mut(&mut self, b: Bimester) -> &mut BimesterScore {
        match b {
            Bimester::B1 => &mut self.b1,
            Bimester::B2 => &mut self.b2,
            Bimester::B3 => &mut self.b3,
            Bimester::B4 => &mut self.b4,
        }
    }

    pub fn is_empty(&self) -> bool {
        Bimester::ALL.iter().all(|b| self.bimester(*b).is_empty())
            && self.official_final_result.is_none()
    }

    /// Merges an imported record into this one, bimester by bimester,
    /// field by field. Untouched fields of prior manual entries survive.
    pub fn merge_from(&mut self, other: &YearRecord) {
        for b in Bimester::ALL {
            self.bimester_mut(b).merge_from(other.bimester(b));
        }
        if let Some(result) = &other.official_final_result {
            self.official_final_result = Some(result.clone());
        }
    }
}

/// The authoritative store of all entered/imported grades, keyed by the
/// catalog's canonical subject name. A `BTreeMap` keeps serialization and
/// report order stable.
pub type SubjectMap = BTreeMap<String, YearRecord>;

/// Merges an extractor result into the authoritative map. Only the fields
/// the import explicitly produced overwrite anything.
pub fn merge_subject_map(target: &mut SubjectMap, imported: &SubjectMap) {
    for (subject, record) in imported {
        target
            .entry(subject.clone())
            .or_default()
            .merge_from(record);
    }
}
