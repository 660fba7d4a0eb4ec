use thiserror::Error;

use crate::config::ConfigError;
use crate::deliver::DeliveryError;
use crate::load::MalformedDocument;
use crate::CompileError;

/// Unified error type covering loading, compilation, configuration,
/// delivery and I/O.
///
/// Returned by convenience entry points like [`Payload::compile()`](crate::Payload::compile)
/// and [`fix()`](crate::fix).
#[derive(Debug, Error)]
pub enum SegfixError {
    #[error(transparent)]
    Load(#[from] MalformedDocument),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
