use anyhow::{Context, Result};
use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;

pub const DASHBOARD: &str = "dashboard";
pub const BLUEPRINT: &str = "blueprint";

pub(crate) struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_partial("layout_style", include_str!("../templates/style.hbs"))
            .context("bad style partial")?;
        registry
            .register_partial("roster_table", include_str!("../templates/roster_table.hbs"))
            .context("bad roster table partial")?;
        registry
            .register_template_string(DASHBOARD, include_str!("../templates/dashboard.hbs"))
            .context("bad dashboard template")?;
        registry
            .register_template_string(BLUEPRINT, include_str!("../templates/blueprint.hbs"))
            .context("bad blueprint template")?;
        Ok(Self { registry })
    }

    pub fn render(&self, name: &str, data: &impl Serialize) -> Result<Html<String>> {
        let html = self
            .registry
            .render(name, data)
            .with_context(|| format!("failed to render `{name}`"))?;
        Ok(Html(html))
    }
}
