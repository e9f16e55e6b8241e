use std::sync::Arc;

use crate::strategy::{CourtCaseStrategy, ExtractionStrategy, NewsArticleStrategy, NewsSite};

/// Builds a fresh strategy instance.
pub type StrategyFactory = fn() -> Arc<dyn ExtractionStrategy>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown parser {name:?}; available: {available}")]
    UnknownParser { name: String, available: String },
    #[error("parser {0:?} is already registered")]
    Duplicate(String),
}

/// Name to factory table, built once at startup and passed to whoever selects a parser.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    entries: Vec<(String, StrategyFactory)>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsers shipped with OPAL: `Parser1819`, `ParserDailyNews` and `court`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [(&str, StrategyFactory); 3] = [
            ("Parser1819", news_1819),
            ("ParserDailyNews", daily_news),
            ("court", court_cases),
        ];
        for (name, factory) in builtin {
            registry.entries.push((name.to_string(), factory));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: StrategyFactory) -> Result<(), RegistryError> {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    pub fn create(&self, name: &str) -> Result<Arc<dyn ExtractionStrategy>, RegistryError> {
        self.entries
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| RegistryError::UnknownParser {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

fn news_1819() -> Arc<dyn ExtractionStrategy> {
    Arc::new(NewsArticleStrategy::new(NewsSite::News1819))
}

fn daily_news() -> Arc<dyn ExtractionStrategy> {
    Arc::new(NewsArticleStrategy::new(NewsSite::DailyNews))
}

fn court_cases() -> Arc<dyn ExtractionStrategy> {
    Arc::new(CourtCaseStrategy)
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{court_cases, ParserRegistry, RegistryError};

    #[test]
    fn builtin_names_resolve_to_matching_strategies() {
        let registry = ParserRegistry::builtin();
        assert_eq!(registry.names(), ["Parser1819", "ParserDailyNews", "court"]);
        for name in registry.names() {
            assert_eq!(registry.create(name).unwrap().name(), name);
        }
        assert!(registry.create("court").unwrap().requires_rendering());
        assert!(!registry.create("Parser1819").unwrap().requires_rendering());
    }

    #[test]
    fn unknown_names_list_the_alternatives() {
        let err = ParserRegistry::builtin().create("Nope").err().unwrap();
        assert_eq!(
            err,
            RegistryError::UnknownParser {
                name: "Nope".into(),
                available: "Parser1819, ParserDailyNews, court".into(),
            }
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ParserRegistry::builtin();
        let err = registry
            .register("court", court_cases)
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("court".into()));
        registry
            .register("court-mirror", court_cases)
            .unwrap();
        assert_eq!(registry.names().len(), 4);
    }
}
