use crate::error::ParseError;
use crate::tpl::ast::Template;
use crate::tpl::parser::parse_template;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

/// Parsed templates keyed by name. Each entry remembers a hash of the
/// source it was parsed from; new source under the same name re-parses.
#[derive(Default)]
pub(crate) struct TemplateCache {
    entries: DashMap<String, (u64, Arc<Template>)>,
}

pub(crate) static TEMPLATE_CACHE: LazyLock<TemplateCache> = LazyLock::new(TemplateCache::default);

fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

impl TemplateCache {
    /// Returns the parsed template for `name`, parsing `source` when the
    /// name is new or its source changed. Parse failures leave the cache
    /// untouched.
    pub(crate) fn get_or_parse(&self, name: &str, source: &str) -> Result<Arc<Template>, ParseError> {
        let hash = source_hash(source);
        if let Some(entry) = self.entries.get(name) {
            if entry.0 == hash {
                return Ok(entry.1.clone());
            }
        }

        let template = Arc::new(parse_template(source)?);
        match self.entries.entry(name.to_string()) {
            // another thread parsed the same source first
            Entry::Occupied(e) if e.get().0 == hash => Ok(e.get().1.clone()),
            Entry::Occupied(mut e) => {
                e.insert((hash, template.clone()));
                Ok(template)
            }
            Entry::Vacant(e) => {
                e.insert((hash, template.clone()));
                Ok(template)
            }
        }
    }

    pub(crate) fn remove(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
