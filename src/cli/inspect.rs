//! `classify` and `inspect` command implementations.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde_json::{Value, json};

use super::InspectArgs;
use spa_page::config::classify;
use spa_page::driver::for_protocol;
use spa_page::logger::Logger;
use spa_page::page::{Component, ComponentKind, ContentKind, Model};
use spa_page::url::UrlBuilderOptions;
use spa_page::{Configuration, Page, Preloaded, Spa, log};

// ============================================================================
// classify
// ============================================================================

/// Print the protocol and effective options of a configuration.
pub fn run_classify(configuration: &Configuration) -> Result<()> {
    let protocol = classify(configuration).context("failed to classify configuration")?;
    let logger = Logger::for_debug(configuration.debug);
    let options = for_protocol(protocol)
        .prepare(configuration, &logger)
        .context("failed to derive effective options")?;

    let mut out = io::stdout().lock();
    let field = |name: &str| format!("{name:>14}");
    let or_none = |value: Option<&str>| value.unwrap_or("-").to_string();

    writeln!(out, "{} {}", field("protocol"), protocol.if_supports_color(Stream::Stdout, |t| t.bold()))?;
    writeln!(out, "{} {}", field("path"), options.path)?;
    writeln!(out, "{} {}", field("origin"), or_none(options.origin()))?;
    writeln!(
        out,
        "{} {}",
        field("token"),
        if options.authorization_token().is_some() { "present" } else { "-" }
    )?;
    writeln!(out, "{} {}", field("server id"), or_none(options.server_id()))?;
    match &options.url {
        UrlBuilderOptions::V09(url) => {
            writeln!(out, "{} {}", field("api base URL"), or_none(url.api_base_url.as_deref()))?;
            writeln!(out, "{} {}", field("cms base URL"), or_none(url.cms_base_url.as_deref()))?;
            writeln!(out, "{} {}", field("spa base URL"), url.spa_base_url)?;
        }
        UrlBuilderOptions::V10(url) => {
            writeln!(out, "{} {}", field("endpoint"), or_none(url.endpoint.as_deref()))?;
            writeln!(out, "{} {}", field("base URL"), url.base_url)?;
        }
    }
    writeln!(out, "{} {}", field("cms URL"), or_none(options.cms_url.as_deref()))?;
    Ok(())
}

// ============================================================================
// inspect
// ============================================================================

/// Initialize a page and print its component tree.
pub async fn run_inspect(configuration: Configuration, args: &InspectArgs) -> Result<()> {
    let spa = Spa::new(configuration);
    let page = match &args.model {
        Some(path) => spa.initialize_with(Preloaded::Model(read_model(path)?)).await,
        None => spa.initialize().await,
    }
    .context("failed to initialize page")?;

    let mut out = io::stdout().lock();
    if args.json {
        let tree = component_json(&page.get_component());
        writeln!(out, "{}", serde_json::to_string_pretty(&tree)?)?;
    } else {
        render_page(&mut out, &page)?;
    }

    page.destroy();
    Ok(())
}

fn read_model(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    log!("inspect"; "loaded page model from {}", path.display());
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in `{}`", path.display()))
}

fn render_page(out: &mut impl Write, page: &Page) -> io::Result<()> {
    let graph = page.graph();
    writeln!(
        out,
        "{} {}{}",
        graph.title().unwrap_or("(untitled)").if_supports_color(Stream::Stdout, |t| t.bold()),
        format!("{:?}", graph.version()).if_supports_color(Stream::Stdout, |t| t.dimmed()),
        if graph.is_preview() { " preview" } else { "" },
    )?;
    render_component(out, graph.root(), 0)
}

fn render_component(out: &mut impl Write, component: &Component, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    let tag = match component.kind() {
        ComponentKind::Container { .. } => "container",
        ComponentKind::ContainerItem { hidden: true, .. } => "item (hidden)",
        ComponentKind::ContainerItem { .. } => "item",
        ComponentKind::Plain { .. } => "component",
        ComponentKind::Undefined { .. } => "undefined",
    };

    writeln!(
        out,
        "{indent}{} {} {}",
        tag.if_supports_color(Stream::Stdout, |t| t.cyan()),
        component.render_key(),
        format!("#{}", component.id()).if_supports_color(Stream::Stdout, |t| t.dimmed()),
    )?;
    for (name, model) in component.models() {
        writeln!(out, "{indent}  - {name}: {}", describe(model))?;
    }
    for child in component.children() {
        render_component(out, child, depth + 1)?;
    }
    Ok(())
}

fn describe(model: &Model) -> String {
    match model {
        Model::Content(content) => {
            let kind = match content.kind() {
                ContentKind::Document => "document",
                ContentKind::ImageSet(_) => "imageset",
                ContentKind::Menu(_) => "menu",
                ContentKind::Pagination(_) => "pagination",
                ContentKind::Link(_) => "link",
                ContentKind::Unknown(kind) => kind.as_str(),
            };
            format!("{kind} {}", content.name().unwrap_or(content.id()))
        }
        Model::Missing(reference) => format!("missing {reference}"),
        Model::Value(value) => {
            let text = value.to_string();
            match text.char_indices().nth(40) {
                Some((idx, _)) => format!("{}...", &text[..idx]),
                None => text,
            }
        }
    }
}

fn component_json(component: &Component) -> Value {
    json!({
        "id": component.id(),
        "name": component.name(),
        "type": component.render_key(),
        "children": component
            .children()
            .iter()
            .map(|child| component_json(child))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn page() -> Page {
        Spa::new(Configuration {
            endpoint: Some("http://cms/site/resourceapi".to_string()),
            ..Default::default()
        })
        .initialize_with(Preloaded::Model(json!({
            "root": { "$ref": "/page/r" },
            "page": {
                "r": { "id": "r", "type": "component", "meta": { "pageTitle": "Home" },
                       "children": [{ "$ref": "/page/m" }] },
                "m": { "id": "m", "type": "container", "name": "main", "children": [{ "$ref": "/page/b" }] },
                "b": { "id": "b", "type": "container-item", "ctype": "Banner",
                       "models": { "document": { "$ref": "/page/d" }, "limit": 10 } },
                "d": { "type": "document", "data": { "name": "welcome" } }
            }
        })))
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_render_tree() {
        let page = page().await;
        let mut out = Vec::new();
        render_page(&mut out, &page).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Home"));
        assert!(text.contains("Banner"));
        assert!(text.contains("document: document welcome"));
        assert!(text.contains("limit: 10"));
    }

    #[tokio::test]
    async fn test_component_json() {
        let page = page().await;
        let tree = component_json(&page.get_component());
        assert_eq!(tree["children"][0]["name"], "main");
        assert_eq!(tree["children"][0]["children"][0]["type"], "Banner");
    }

    #[test]
    fn test_describe_truncates_values() {
        let long = Model::Value(Value::String("x".repeat(100)));
        assert!(describe(&long).ends_with("..."));
    }
}
