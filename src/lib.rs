//! # Notas da EscolaWeb
//!
//! Acompanhamento de notas escolares (sistema TM / TB / TD) a partir de
//! texto colado do portal EscolaWeb.
//!
//! ## Arquitetura
//!
//! O sistema é dividido em camadas simples:
//!
//! ### Modelos (`models/`)
//! - `BimesterScore` / `YearRecord` - notas cruas, exatamente como importadas
//! - `SubjectCatalog` - grade de matérias e os termos que as identificam
//!
//! ### Serviços (`services/`)
//! - `GradeExtractor` - extrai notas de texto colado (heurístico)
//! - `averaging` - médias de bimestre, semestre e final, sempre derivadas
//! - `AdvisorService` - dicas de estudo via LLM
//!
//! ### Persistência (`storage/`)
//! - `JsonStore` - banco local em JSON, regravado a cada alteração
//!
//! ### Aplicação (`app`)
//! - `App` / `Command` - linha de comando: import, report, set, advise, clear

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

// Reexportações mais usadas
pub use app::{App, Command};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Bimester, BimesterScore, ScoreField, SubjectCatalog, SubjectMap, YearRecord};
pub use services::{AdvisorService, DerivedAverages, GradeExtractor};
pub use storage::JsonStore;
