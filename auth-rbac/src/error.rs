use thiserror::Error;

#[derive(Error, Debug)]
pub enum RbacError {
    #[error("Malformed role map: {0}")]
    MalformedRoleMap(String),

    #[error("Failed to read role map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse role map: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RbacError>;
