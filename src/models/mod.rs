//! Data model: score records and the subject catalog.

pub mod catalog;
pub mod score;

pub use catalog::{CatalogSubject, SubjectCatalog};
pub use score::{
    merge_subject_map, Bimester, BimesterScore, ScoreField, SubjectMap, YearRecord,
};
