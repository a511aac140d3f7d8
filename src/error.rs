//! Определения ошибок для реестра модулей.

use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Перечисление всех возможных ошибок.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Invalid module path: {0:?}")]
    InvalidPath(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module has unknown name/path (export `{0}`)")]
    UnresolvableName(String),

    #[error("Module {0} has no bound component to derive from")]
    UnboundAncestor(String),

    #[error("Method '{method}' not found in module '{module}'")]
    MethodNotFound { module: String, method: String },

    #[error("Property '{property}' of module '{module}' is not callable")]
    NotCallable { module: String, property: String },

    #[error("Module {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Receiver of method '{0}' no longer exists")]
    ReceiverDropped(String),

    #[error("Invocation failed: {0}")]
    Invocation(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),
}
