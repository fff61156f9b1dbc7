//! Averaging engine: pure transformations from a [`YearRecord`]'s raw
//! inputs to derived bimester / semester / final averages.
//!
//! The engine is total over its input domain: anything that does not parse
//! as a decimal degrades to absent. Absent never becomes zero and never
//! becomes an error. The caller owns the "recompute after write" contract:
//! there are no observers here, just functions.

use crate::models::{Bimester, BimesterScore, YearRecord};
use crate::utils::text::parse_decimal;

/// Minimum average to pass, on the 0–10 scale.
pub const PASSING_GRADE: f64 = 7.0;

/// Maximum grade; semester averages are capped here after the make-up bonus.
pub const MAX_GRADE: f64 = 10.0;

/// Points multiplier for bimester deficit/surplus display.
pub const BIMESTER_POINTS_FACTOR: f64 = 3.0;

/// Points multiplier for the annual surplus display.
pub const FINAL_POINTS_FACTOR: f64 = 4.0;

/// Everything recomputed whenever a record changes. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedAverages {
    pub bimesters: [Option<f64>; 4],
    pub sem1: Option<f64>,
    pub sem2: Option<f64>,
    pub final_average: Option<f64>,
}

/// Display-oriented deficit/surplus relative to the passing grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointsBalance {
    /// Points still missing to reach the passing grade.
    Missing(f64),
    /// Points of slack above the passing grade.
    Surplus(f64),
}

/// Mean of the TM/TB/TD components that parse as decimals; falls back to
/// the imported aggregate average when none of the three is present.
///
/// Partial-component data is strictly preferred over the aggregate because
/// it is finer-grained.
pub fn bimester_average(score: &BimesterScore) -> Option<f64> {
    let components = [
        score.monthly_test.as_deref(),
        score.bimester_test.as_deref(),
        score.various_work.as_deref(),
    ];
    let values: Vec<f64> = components
        .iter()
        .filter_map(|c| c.and_then(parse_decimal))
        .collect();

    if !values.is_empty() {
        return Some(values.iter().sum::<f64>() / values.len() as f64);
    }

    score.general_average.as_deref().and_then(parse_decimal)
}

/// Mean of the present bimester averages of the pair, plus the make-up
/// bonus (`makeup / 4`), capped at [`MAX_GRADE`]. Absent when neither
/// bimester average is present.
pub fn semester_average(
    b_first: Option<f64>,
    b_second: Option<f64>,
    makeup_raw: Option<&str>,
) -> Option<f64> {
    let present: Vec<f64> = [b_first, b_second].into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }

    let raw = present.iter().sum::<f64>() / present.len() as f64;
    let bonus = makeup_raw.and_then(parse_decimal).unwrap_or(0.0) / 4.0;
    Some((raw + bonus).min(MAX_GRADE))
}

/// Mean of whichever semester averages are present.
pub fn final_average(sem1: Option<f64>, sem2: Option<f64>) -> Option<f64> {
    let present: Vec<f64> = [sem1, sem2].into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// Recomputes every derived number for one record.
///
/// Semester 1 uses (b1, b2) and the make-up attached to b2; semester 2 uses
/// (b3, b4) and the make-up attached to b4.
pub fn derive(record: &YearRecord) -> DerivedAverages {
    let bimesters = [
        bimester_average(&record.b1),
        bimester_average(&record.b2),
        bimester_average(&record.b3),
        bimester_average(&record.b4),
    ];

    let sem1 = semester_average(
        bimesters[0],
        bimesters[1],
        record.b2.makeup_exam.as_deref(),
    );
    let sem2 = semester_average(
        bimesters[2],
        bimesters[3],
        record.b4.makeup_exam.as_deref(),
    );

    DerivedAverages {
        bimesters,
        sem1,
        sem2,
        final_average: final_average(sem1, sem2),
    }
}

impl DerivedAverages {
    pub fn bimester(&self, b: Bimester) -> Option<f64> {
        self.bimesters[b.index()]
    }

    pub fn passed(&self) -> Option<bool> {
        self.final_average.map(|avg| avg >= PASSING_GRADE)
    }
}

/// Deficit/surplus for one bimester average: `(7.0 - a) * 3` missing below
/// the passing grade, `(a - 7.0) * 3` surplus at or above it.
pub fn bimester_points(average: f64) -> PointsBalance {
    if average < PASSING_GRADE {
        PointsBalance::Missing((PASSING_GRADE - average) * BIMESTER_POINTS_FACTOR)
    } else {
        PointsBalance::Surplus((average - PASSING_GRADE) * BIMESTER_POINTS_FACTOR)
    }
}

/// Deficit/surplus for the annual final average. Below the passing grade
/// the missing points are measured against the final-exam threshold of 10;
/// at or above it the surplus uses the annual factor of 4.
pub fn final_points(average: f64) -> PointsBalance {
    if average < PASSING_GRADE {
        PointsBalance::Missing(MAX_GRADE - average)
    } else {
        PointsBalance::Surplus((average - PASSING_GRADE) * FINAL_POINTS_FACTOR)
    }
}
