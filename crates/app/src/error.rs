//! Application error type

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Not signed in. Run `finagent signin` first.")]
    NotSignedIn,

    #[error(transparent)]
    Api(#[from] finagent_net::Error),

    #[error(transparent)]
    Core(#[from] finagent_core::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
