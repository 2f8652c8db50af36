//! Parsed template cache
//!
//! Memoises parse results per template text so a template registered by
//! several views is parsed once.

use crate::{ParseError, ParserOptions, Template, TemplateParser};
use std::collections::HashMap;
use std::rc::Rc;

/// Cache of parsed templates keyed by source text
#[derive(Default)]
pub struct TemplateCache {
    parser: TemplateParser,
    entries: HashMap<String, Rc<Template>>,
    hits: u64,
    misses: u64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            parser: TemplateParser::with_options(options),
            ..Self::default()
        }
    }

    /// Return the cached template for `text`, parsing it on first use.
    /// Parse failures are not cached.
    pub fn get_or_parse(&mut self, text: &str) -> Result<Rc<Template>, ParseError> {
        if let Some(template) = self.entries.get(text) {
            self.hits += 1;
            return Ok(Rc::clone(template));
        }

        self.misses += 1;
        let template = Rc::new(self.parser.parse(text)?);
        self.entries.insert(text.to_string(), Rc::clone(&template));
        Ok(template)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_once() {
        let mut cache = TemplateCache::new();
        let a = cache.get_or_parse("<p>x</p>").unwrap();
        let b = cache.get_or_parse("<p>x</p>").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_errors_not_cached() {
        let mut cache = TemplateCache::new();
        assert!(cache.get_or_parse("<p>").is_err());
        assert!(cache.is_empty());
    }
}
