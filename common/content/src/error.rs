use thiserror::Error;

use crate::report::ValidationReport;

pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{object} rejected: {report}")]
    Rejected {
        object: &'static str,
        report: ValidationReport,
    },
}

impl ContentError {
    pub fn report(&self) -> &ValidationReport {
        match self {
            ContentError::Rejected { report, .. } => report,
        }
    }
}
