use thiserror::Error;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Which dimension a failed name lookup was against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Team,
    Referee,
    Season,
}

impl std::fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DimensionKind::Team => "team",
            DimensionKind::Referee => "referee",
            DimensionKind::Season => "season",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unresolved {kind} {name:?}")]
    Referential { kind: DimensionKind, name: String },

    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error(
        "row {row}: {half} result {result:?} does not match score {home_goals}-{away_goals}"
    )]
    InconsistentResult {
        row: usize,
        half: &'static str,
        result: String,
        home_goals: u16,
        away_goals: u16,
    },

    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("ledger integrity check failed: {0}")]
    Integrity(String),

    #[error("sqlite error")]
    Storage(#[from] rusqlite::Error),

    #[error("connection pool error")]
    Pool(#[from] r2d2::Error),

    #[error("csv error")]
    Csv(#[from] csv::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("workbook export failed")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl LedgerError {
    pub fn unresolved(kind: DimensionKind, name: impl Into<String>) -> Self {
        LedgerError::Referential {
            kind,
            name: name.into(),
        }
    }
}
