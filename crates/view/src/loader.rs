//! Template registry.
//!
//! The page, sidebar and result templates are compiled into the binary.
//! A deployment may override any of them by dropping `<name>.hbs` into a
//! templates directory under the root.

use crate::types::PageView;
use fsc_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::path::Path;

/// Built-in templates: (name, source). `page` is the entry point; the
/// others are registered as partials.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("page", include_str!("../templates/page.hbs")),
    ("sidebar", include_str!("../templates/sidebar.hbs")),
    ("result", include_str!("../templates/result.hbs")),
];

/// Renders page views to HTML. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    /// Create a renderer with the built-in templates.
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in BUILTIN_TEMPLATES {
            register(&mut registry, name, source)?;
        }

        Ok(Self { registry })
    }

    /// Create a renderer, letting `.hbs` files in `dir` replace built-ins.
    ///
    /// Only known template names are honored; a missing directory is fine.
    pub fn with_overrides(dir: &Path) -> AppResult<Self> {
        let mut renderer = Self::new()?;

        for name in list_templates(dir) {
            if !BUILTIN_TEMPLATES.iter().any(|(known, _)| *known == name) {
                tracing::warn!("Ignoring unknown template override: {}", name);
                continue;
            }

            let path = dir.join(format!("{}.hbs", name));
            let source = std::fs::read_to_string(&path).map_err(|e| {
                AppError::Template(format!("Failed to read template {:?}: {}", path, e))
            })?;
            register(&mut renderer.registry, &name, &source)?;
            tracing::info!("Loaded template override: {:?}", path);
        }

        Ok(renderer)
    }

    /// Render the full page.
    pub fn render_page(&self, view: &PageView) -> AppResult<String> {
        self.registry
            .render("page", view)
            .map_err(|e| AppError::Template(format!("Failed to render page: {}", e)))
    }
}

/// Register a template both as a template and as a partial.
fn register(registry: &mut Handlebars<'static>, name: &str, source: &str) -> AppResult<()> {
    registry
        .register_template_string(name, source)
        .map_err(|e| AppError::Template(format!("Failed to register template {}: {}", name, e)))?;
    registry
        .register_partial(name, source.to_string())
        .map_err(|e| AppError::Template(format!("Failed to register partial {}: {}", name, e)))?;
    Ok(())
}

/// List template names (file stems of `*.hbs`) directly inside `dir`.
pub fn list_templates(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("hbs"))
        .filter_map(|e| {
            e.path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect()
}
