use std::path::Path;
use std::sync::{LazyLock, OnceLock};

use serde::Serialize;
use tracing::{error, info};

use crate::error::TemplateError;
use crate::models::template_options::TemplateOptions;
use crate::template_loader::{self, find_template, load, load_from_path};
use crate::tpl::RenderContext;
use crate::tpl::engine;

const BUNDLED_SOURCE: &str = "bundled:templates/special.xml";
const BUNDLED_SPECIAL: &str = include_str!("../templates/special.xml");

pub static TEMPLATES: LazyLock<TemplateManager> = LazyLock::new(TemplateManager::new);

// Outcome of loading the bundled set, which happens at most once per process.
static BUNDLED: OnceLock<Result<(), String>> = OnceLock::new();

/// Loads template sets and renders templates by id and profile.
///
/// A `TemplateManager` is a handle: template sets live in the process-wide
/// store of [`template_loader`], so every instance sees the same templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateManager;

/// Returns the process-wide `TemplateManager`.
pub fn template_mgr() -> &'static TemplateManager {
    &TEMPLATES
}

impl TemplateManager {
    pub fn new() -> Self {
        Self
    }

    /// Loads every source named in `options`. Fails if any set embedded with
    /// `template_assets!` was rejected at startup.
    pub fn configure(&self, options: &TemplateOptions<'_>) -> Result<(), TemplateError> {
        let startup_errors = template_loader::startup_errors();
        if !startup_errors.is_empty() {
            for e in &startup_errors {
                error!("Embedded template set rejected: {}", e);
            }
            return Err(TemplateError::Load(startup_errors.join("; ")));
        }
        if options.bundled {
            self.load_bundled()?;
        }
        if let Some(assets) = &options.assets {
            load(assets)?;
        }
        if let Some(path) = options.assets_path {
            load_from_path(Path::new(path))?;
        }
        Ok(())
    }

    /// Loads the templates shipped with the crate. Safe to call repeatedly.
    pub fn load_bundled(&self) -> Result<(), TemplateError> {
        BUNDLED
            .get_or_init(|| {
                let result = template_loader::load_assets(vec![(BUNDLED_SOURCE, BUNDLED_SPECIAL)])
                    .map_err(|e| format!("{:#}", e));
                if result.is_ok() {
                    info!("Loaded bundled templates");
                }
                result
            })
            .clone()
            .map_err(TemplateError::Load)
    }

    /// Renders the variant of `template_id` selected by `profile`.
    pub fn render(
        &self,
        template_id: &str,
        profile: Option<&str>,
        ctx: &RenderContext,
    ) -> Result<String, TemplateError> {
        let variant = find_template(template_id, profile)
            .ok_or_else(|| TemplateError::NotFound(template_id.to_string()))?;
        let cache_key = format!(
            "{}#{}",
            template_id,
            variant.profile.as_deref().unwrap_or("default")
        );
        engine::render_template(&cache_key, &variant.content, ctx)
    }

    /// Like [`render`](Self::render), with the context built from `args`.
    pub fn render_with<T: Serialize + ?Sized>(
        &self,
        template_id: &str,
        profile: Option<&str>,
        args: &T,
    ) -> Result<String, TemplateError> {
        let ctx = RenderContext::from_serialize(args)?;
        self.render(template_id, profile, &ctx)
    }

    pub fn template_ids(&self) -> Vec<String> {
        template_loader::template_ids()
    }
}
