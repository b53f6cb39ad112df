// Domain Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("folder {0} has no usable name component")]
    UnnamedFolder(PathBuf),

    #[error("cannot build a mail address from an empty account name")]
    EmptyAccount,

    #[error("cannot build a mail address without a mail domain")]
    EmptyMailDomain,
}

pub type Result<T> = std::result::Result<T, DomainError>;
