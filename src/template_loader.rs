use anyhow::{Context, Result};
use dashmap::DashMap;
use quick_xml::Writer;
use quick_xml::de;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One variant of a template id. A variant without a profile is the default
/// used when no profile-specific variant exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariant {
    pub profile: Option<String>,
    pub content: String,
}

/// namespace -> id -> variants
pub type TemplateStore = DashMap<String, DashMap<String, Vec<TemplateVariant>>>;

static TEMPLATE_SETS: OnceLock<TemplateStore> = OnceLock::new();

/// Failures from `template_assets!` registration, which runs before any
/// caller can receive an error.
static STARTUP_ERRORS: Mutex<Vec<String>> = Mutex::new(Vec::new());

#[derive(Debug, Deserialize)]
struct TemplateSet {
    #[serde(rename = "@namespace")]
    namespace: String,
    #[serde(rename = "template", default)]
    templates: Vec<TemplateItem>,
}

#[derive(Debug, Deserialize)]
struct TemplateItem {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@profile")]
    profile: Option<String>,
    #[serde(rename = "$text", default)]
    content: String,
}

impl TemplateItem {
    fn into_entry(self) -> (String, TemplateVariant) {
        let profile = self
            .profile
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        (
            self.id,
            TemplateVariant {
                profile,
                content: self.content,
            },
        )
    }
}

fn store() -> &'static TemplateStore {
    TEMPLATE_SETS.get_or_init(DashMap::new)
}

/// Loads template sets held in memory.
pub fn load(assets: &[&[u8]]) -> Result<()> {
    for data in assets {
        let content = std::str::from_utf8(data).context("Asset content is not valid UTF-8")?;
        process_template_data(content, "memory")?;
    }
    Ok(())
}

/// Loads `(source name, content)` pairs, as embedded by `template_assets!`.
pub fn load_assets(assets: Vec<(&str, &str)>) -> Result<()> {
    for (source, content) in assets {
        process_template_data(content, source)?;
    }
    Ok(())
}

/// Loads each embedded template set independently, recording failures
/// instead of returning them. Used by `template_assets!`.
pub fn register_startup_assets(assets: Vec<(&str, &str)>) {
    for (source, content) in assets {
        if let Err(e) = process_template_data(content, source) {
            if let Ok(mut errors) = STARTUP_ERRORS.lock() {
                errors.push(format!("{:#}", e));
            }
        }
    }
}

/// Errors recorded while registering embedded template sets at startup.
pub fn startup_errors() -> Vec<String> {
    STARTUP_ERRORS
        .lock()
        .map(|errors| errors.clone())
        .unwrap_or_default()
}

/// Recursively loads every `*.xml` file under `dir_path`.
pub fn load_from_path(dir_path: &Path) -> Result<()> {
    for entry in WalkDir::new(dir_path) {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", dir_path.display()))?;
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            process_template_file(path)?;
        }
    }
    Ok(())
}

/// Finds the variant of `template_id` (`namespace.id`) for `profile`,
/// falling back to the default variant.
pub fn find_template(template_id: &str, profile: Option<&str>) -> Option<TemplateVariant> {
    let (namespace, id) = template_id.rsplit_once('.')?;

    let ns_map = TEMPLATE_SETS.get()?.get(namespace)?;
    let variants = ns_map.get(id)?;

    profile
        .and_then(|p| variants.iter().find(|v| v.profile.as_deref() == Some(p)))
        .or_else(|| variants.iter().find(|v| v.profile.is_none()))
        .cloned()
}

/// All loaded template ids as `namespace.id`, sorted.
pub fn template_ids() -> Vec<String> {
    let Some(store) = TEMPLATE_SETS.get() else {
        return Vec::new();
    };
    let mut ids: Vec<String> = store
        .iter()
        .flat_map(|ns| {
            let namespace = ns.key().clone();
            ns.value()
                .iter()
                .map(|t| format!("{}.{}", namespace, t.key()))
                .collect::<Vec<_>>()
        })
        .collect();
    ids.sort();
    ids
}

fn process_template_file(path: &Path) -> Result<()> {
    let xml_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    process_template_data(&xml_content, &path.display().to_string())
}

/// Drops whitespace-only text that sits next to a CDATA section, so an
/// indented `<template>` whose body is CDATA keeps exactly the CDATA text.
fn strip_cdata_padding(xml_content: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml_content);
    let mut events = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => events.push(event),
        }
    }

    let is_padding = |event: &Event| matches!(event, Event::Text(t) if t.iter().all(u8::is_ascii_whitespace));
    let is_cdata = |event: Option<&Event>| matches!(event, Some(Event::CData(_)));

    let mut writer = Writer::new(Vec::with_capacity(xml_content.len()));
    for (i, event) in events.iter().enumerate() {
        let next_to_cdata =
            is_cdata(i.checked_sub(1).and_then(|j| events.get(j))) || is_cdata(events.get(i + 1));
        if is_padding(event) && next_to_cdata {
            continue;
        }
        writer.write_event(event.borrow())?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn process_template_data(xml_content: &str, source: &str) -> Result<()> {
    let set: TemplateSet = strip_cdata_padding(xml_content)
        .and_then(|xml| de::from_str(&xml).map_err(Into::into))
        .with_context(|| format!("Failed to parse template set in {}", source))?;
    let namespace = set.namespace;
    if namespace.is_empty() || namespace.contains('.') {
        anyhow::bail!("Invalid namespace '{}' in {}", namespace, source);
    }

    let items: Vec<(String, TemplateVariant)> = set
        .templates
        .into_iter()
        .map(TemplateItem::into_entry)
        .collect();

    // Reject the whole file before touching the store.
    let loaded = store().get(&namespace);
    for (i, (id, variant)) in items.iter().enumerate() {
        let duplicate_in_file = items[..i]
            .iter()
            .any(|(other_id, other)| other_id == id && other.profile == variant.profile);
        let duplicate_loaded = loaded.as_ref().is_some_and(|ns_map| {
            ns_map
                .get(id)
                .is_some_and(|vs| vs.iter().any(|v| v.profile == variant.profile))
        });
        if duplicate_in_file || duplicate_loaded {
            anyhow::bail!(
                "Duplicate template '{}' (profile: {}) in '{}' (namespace: '{}')",
                id,
                variant.profile.as_deref().unwrap_or("default"),
                source,
                namespace
            );
        }
    }

    drop(loaded);

    let ns_map = store().entry(namespace.clone()).or_default();
    let count = items.len();
    for (id, variant) in items {
        debug!(namespace = %namespace, id = %id, profile = ?variant.profile, "registered template");
        ns_map.entry(id).or_default().push(variant);
    }
    info!("Loaded {} template(s) into '{}' from {}", count, namespace, source);
    Ok(())
}
