//! Filter registry: maps filter ids to factories.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use super::{
    Base64Filter, CamelCaseFilter, EscapeFilter, FilterArgs, IntBaseFilter, ProcessFilter,
    RegexFilter, ReverseWordsFilter, SnakeCaseFilter, TextFilter, TranslateFilter,
    UrlEncodeFilter,
};
use crate::domain::FilterError;

/// Settings shared by every filter built for one invocation.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    /// Default time limit for process filters that set none
    pub process_timeout: Option<Duration>,
}

/// Builds a configured filter from its options.
pub type FilterFactory =
    fn(&FilterArgs, &FilterContext) -> Result<Box<dyn TextFilter>, FilterError>;

/// Registry of filter factories, looked up by exact id.
pub struct FilterRegistry {
    factories: BTreeMap<&'static str, FilterFactory>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in filter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register(TranslateFilter::ID, |args, _| {
            Ok(Box::new(TranslateFilter::from_args(args)?))
        });
        registry.register(RegexFilter::ID, |args, _| {
            Ok(Box::new(RegexFilter::from_args(args)?))
        });
        registry.register(IntBaseFilter::ID, |args, _| {
            Ok(Box::new(IntBaseFilter::from_args(args)?))
        });
        registry.register(Base64Filter::ID, |args, _| {
            Ok(Box::new(Base64Filter::from_args(args)?))
        });
        registry.register(UrlEncodeFilter::ID, |args, _| {
            Ok(Box::new(UrlEncodeFilter::from_args(args)?))
        });
        registry.register(EscapeFilter::ID, |args, _| {
            Ok(Box::new(EscapeFilter::from_args(args)?))
        });
        registry.register(CamelCaseFilter::ID, |args, _| {
            Ok(Box::new(CamelCaseFilter::from_args(args)?))
        });
        registry.register(SnakeCaseFilter::ID, |args, _| {
            Ok(Box::new(SnakeCaseFilter::from_args(args)?))
        });
        registry.register(ReverseWordsFilter::ID, |args, _| {
            Ok(Box::new(ReverseWordsFilter::from_args(args)?))
        });
        registry.register(ProcessFilter::ID, |args, context| {
            Ok(Box::new(ProcessFilter::from_args(args, context)?))
        });

        registry
    }

    /// Register a factory, replacing any previous one under the same id.
    pub fn register(&mut self, id: &'static str, factory: FilterFactory) {
        self.factories.insert(id, factory);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build the filter registered under `id`.
    pub fn build(
        &self,
        id: &str,
        args: &FilterArgs,
        context: &FilterContext,
    ) -> Result<Box<dyn TextFilter>, FilterError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| FilterError::UnknownFilter(id.to_string()))?;
        debug!("Building filter '{}' with {} option(s)", id, args.table().len());
        factory(args, context)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
