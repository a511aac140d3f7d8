//! Пути модулей.
//!
//! Имя модуля записывается через точку или слэш: `app.ui.Button`,
//! `app/ui/Button` и `app/ui.Button` — один и тот же путь.

use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, RegistryResult};

/// Разделители сегментов пути.
const SEPARATORS: [char; 2] = ['.', '/'];

/// Путь модуля: упорядоченные непустые сегменты.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Разобрать имя модуля в путь.
    ///
    /// Пустые сегменты (`a..b`, `/a/`) отбрасываются; имя без единого
    /// сегмента — ошибка.
    pub fn parse(name: &str) -> RegistryResult<Self> {
        let segments: Vec<String> = name
            .split(|c| SEPARATORS.contains(&c))
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(RegistryError::InvalidPath(name.to_string()));
        }

        Ok(Self { segments })
    }

    /// Сегменты пути.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Последний сегмент (собственное имя модуля).
    pub fn name(&self) -> &str {
        // Путь всегда содержит хотя бы один сегмент
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Путь на один сегмент глубже.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl FromStr for Path {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_and_slashed() {
        let dotted = Path::parse("app.ui.Button").unwrap();
        let slashed = Path::parse("app/ui/Button").unwrap();
        let mixed = Path::parse("app/ui.Button").unwrap();

        assert_eq!(dotted, slashed);
        assert_eq!(dotted, mixed);
        assert_eq!(dotted.segments(), ["app", "ui", "Button"]);
        assert_eq!(dotted.name(), "Button");
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let path = Path::parse("/app..core/").unwrap();
        assert_eq!(path.segments(), ["app", "core"]);
        assert_eq!(path.to_string(), "app.core");
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(Path::parse(""), Err(RegistryError::InvalidPath(_))));
        assert!(matches!(Path::parse("./."), Err(RegistryError::InvalidPath(_))));
    }

    #[test]
    fn test_child() {
        let path: Path = "app".parse().unwrap();
        assert_eq!(path.child("core").to_string(), "app.core");
    }
}
