use std::collections::HashMap;

use crate::faker::{FakeSource, Locale};
use crate::populator::Populator;

/// Cache key for a populator configuration: the locale (or `default`)
/// followed by any extra provider names, sorted so the order callers
/// list them in never matters.
pub fn codename(locale: Option<Locale>, providers: &[&str]) -> String {
    let mut name = locale.map(Locale::as_str).unwrap_or("default").to_string();
    let mut providers: Vec<&str> = providers.to_vec();
    providers.sort_unstable();
    for provider in providers {
        name.push('-');
        name.push_str(provider);
    }
    name
}

/// Caller-owned cache of populators, one per codename. Asking for the
/// same configuration twice returns the same instance, so registered
/// batches and RNG state carry over.
#[derive(Default)]
pub struct PopulatorRegistry {
    populators: HashMap<String, Populator>,
}

impl PopulatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The populator for `locale`, created on first use.
    pub fn populator(&mut self, locale: Option<Locale>) -> &mut Populator {
        self.populators
            .entry(codename(locale, &[]))
            .or_insert_with(|| Populator::new(FakeSource::new(locale.unwrap_or(Locale::En))))
    }

    /// Register a preconfigured populator (seeded source, custom options)
    /// under an explicit codename.
    pub fn insert(&mut self, codename: impl Into<String>, populator: Populator) {
        self.populators.insert(codename.into(), populator);
    }

    pub fn len(&self) -> usize {
        self.populators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populators.is_empty()
    }

    pub fn clear(&mut self) {
        self.populators.clear();
    }
}
