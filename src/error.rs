use std::fmt;

#[derive(Debug)]
pub enum TableBreakError {
    MissingPageTemplate,
    InvalidConfiguration(String),
    MeasureMismatch {
        block_id: String,
        block_rows: usize,
        measure_rows: usize,
    },
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for TableBreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableBreakError::MissingPageTemplate => write!(f, "no page template available"),
            TableBreakError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            TableBreakError::MeasureMismatch {
                block_id,
                block_rows,
                measure_rows,
            } => write!(
                f,
                "table {} has {} rows but its measure has {}",
                block_id, block_rows, measure_rows
            ),
            TableBreakError::Json(err) => write!(f, "json error: {}", err),
            TableBreakError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for TableBreakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableBreakError::Json(err) => Some(err),
            TableBreakError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TableBreakError {
    fn from(value: std::io::Error) -> Self {
        TableBreakError::Io(value)
    }
}

impl From<serde_json::Error> for TableBreakError {
    fn from(value: serde_json::Error) -> Self {
        TableBreakError::Json(value)
    }
}
