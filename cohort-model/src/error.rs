use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("contact identifier must not be empty")]
    EmptyIdentifier,
}

pub type Result<T> = std::result::Result<T, ModelError>;
