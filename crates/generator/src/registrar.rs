//! Page Registrar.
//!
//! Decides which renderer every page uses and hands it to the site builder.

use async_trait::async_trait;
use futures::future::try_join_all;
use pagegen_core::config::SiteConfig;
use pagegen_core::{
    ContentPage, Error, PageContext, PageRegistration, Result, slugify_template_name,
};
use pagegen_source::CollectionNode;
use std::path::PathBuf;
use tracing::debug;

use crate::synthesizer::{SynthesisRequest, Synthesizer};

/// The site builder's page-creation action
#[async_trait]
pub trait PageActions: Send + Sync {
    /// Register a page. Registering the same path twice keeps the last one.
    async fn create_page(&self, page: PageRegistration) -> Result<()>;
}

/// How a page was registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisteredKind {
    /// Renderer synthesized from the page's components
    Dynamic,
    /// Named static template
    Static,
}

/// Static template file for a template name, which must exist
pub fn resolve_static_template(config: &SiteConfig, template_name: &str) -> Result<PathBuf> {
    let path = config.template_file(&slugify_template_name(template_name));
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingTemplate {
            template: template_name.to_string(),
            path,
        })
    }
}

/// Register one page, synthesizing its renderer when it uses the default template
pub async fn register_page(
    config: &SiteConfig,
    synthesizer: &Synthesizer<'_>,
    actions: &dyn PageActions,
    page: &ContentPage,
) -> Result<RegisteredKind> {
    let (registration, kind) = if page.uses_default_template() {
        let components = page.unique_component_names();
        let artifact = synthesizer
            .synthesize(SynthesisRequest {
                database_id: page.database_id,
                content_type: &page.content_type,
                slug: &page.slug,
                components: &components,
            })
            .await?;
        let registration = PageRegistration {
            path: page.uri.clone(),
            component: artifact.path,
            context: PageContext {
                id: page.id.clone(),
                title: None,
            },
        };
        (registration, RegisteredKind::Dynamic)
    } else {
        let component = resolve_static_template(config, &page.template_name)?;
        let registration = PageRegistration {
            path: page.uri.clone(),
            component,
            context: PageContext {
                id: page.id.clone(),
                title: Some(page.title.clone()),
            },
        };
        (registration, RegisteredKind::Static)
    };

    debug!(
        path = %registration.path,
        component = %registration.component.display(),
        ?kind,
        "registering page"
    );
    actions.create_page(registration).await?;
    Ok(kind)
}

/// Register all pages concurrently; the first failure aborts
pub async fn register_pages(
    config: &SiteConfig,
    synthesizer: &Synthesizer<'_>,
    actions: &dyn PageActions,
    pages: &[ContentPage],
) -> Result<Vec<RegisteredKind>> {
    try_join_all(
        pages
            .iter()
            .map(|page| register_page(config, synthesizer, actions, page)),
    )
    .await
}

/// Register every node of a collection with one static template
pub async fn register_collection(
    config: &SiteConfig,
    actions: &dyn PageActions,
    template: &str,
    nodes: &[CollectionNode],
) -> Result<usize> {
    let component = resolve_static_template(config, template)?;
    try_join_all(nodes.iter().map(|node| {
        actions.create_page(PageRegistration {
            path: node.uri.clone(),
            component: component.clone(),
            context: PageContext {
                id: node.id.clone(),
                title: None,
            },
        })
    }))
    .await?;
    Ok(nodes.len())
}
