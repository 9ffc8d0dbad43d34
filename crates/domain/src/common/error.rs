use thiserror::Error;

use crate::cidr::error::CidrError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Cidr(#[from] CidrError),

    #[error("blocker failure: {0}")]
    Blocker(String),
}
