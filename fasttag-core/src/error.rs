use thiserror::Error;

/// Reasons a dashboard operation is refused.
///
/// A refused operation never changes state. The message is meant to be
/// shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("{0} required")]
    MissingField(&'static str),

    #[error("A company named \"{0}\" already exists")]
    DuplicateCompany(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Select a company first")]
    NoCompanySelected,

    #[error("Select an item first")]
    NoItemSelected,

    #[error("No copied item. Copy an item first")]
    ClipboardEmpty,

    #[error("Company \"{company}\" has no location #{index}")]
    LocationOutOfRange { company: String, index: usize },

    #[error("No {0} ids left")]
    IdsExhausted(&'static str),
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;
