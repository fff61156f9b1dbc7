use thiserror::Error;

/// Application error type.
///
/// These cover the thin outer surfaces only; the averaging engine and the
/// extractor are total: their failures degrade to absent values, never to
/// an error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("matéria desconhecida: {0}")]
    UnknownSubject(String),

    #[error("nota inválida '{value}': esperava um número entre 0 e 10")]
    InvalidScore { value: String },

    #[error("campo desconhecido '{0}': use tm, tb, td, media ou rec")]
    UnknownField(String),

    #[error("bimestre inválido '{0}': use 1, 2, 3 ou 4")]
    InvalidBimester(String),

    #[error("falha ao ler o arquivo de notas {path}")]
    StoreRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("falha ao gravar o arquivo de notas {path}")]
    StoreWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("arquivo de notas corrompido em {path}")]
    StoreCorrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;
