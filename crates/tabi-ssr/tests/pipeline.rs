//! End-to-end page rendering tests.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tabi_renderer::HighlighterService;
use tabi_ssr::{
    Element, Frontmatter, Layout, MarkdownConfig, Node, Page, PageData, PageKind, PageRenderer,
    RenderContext, RenderRequest, TreeError, component, head, markdown_body, render_client_body,
};

static_assertions::assert_impl_all!(Page: Send, Sync);
static_assertions::assert_impl_all!(PageRenderer<'static>: Send, Sync);

fn frontmatter(pairs: &[(&str, serde_json::Value)]) -> Frontmatter {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Layout rendering `<section data-layout=NAME>` plus a head title.
fn titled_layout(name: &'static str) -> Layout {
    component(move |cx: &RenderContext<'_>, children: Node| {
        let title = cx
            .frontmatter()?
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Untitled")
            .to_owned();
        Ok(Node::fragment([
            head(Element::new("title").child(format!("{name}: {title}"))),
            Element::new("section")
                .attr("data-layout", name)
                .child(children)
                .into(),
        ]))
    })
}

async fn render(service: &HighlighterService, page: &Page, layouts: &[Layout]) -> String {
    PageRenderer::new(service)
        .render(&RenderRequest {
            page,
            layouts,
            route: "/guide",
            bundle_url: "/assets/client.js",
        })
        .await
        .unwrap()
}

fn hydration_root(document: &str) -> &str {
    let start_tag = r#"<div id="__tabi__">"#;
    let start = document.find(start_tag).unwrap() + start_tag.len();
    let end = document.find(r#"</div><script id="__TABI_DATA__""#).unwrap();
    &document[start..end]
}

#[tokio::test]
async fn test_render_is_deterministic() {
    let service = HighlighterService::new();
    let page = Page::markdown(
        frontmatter(&[("title", json!("Guide"))]),
        "# Guide\n\n```rust\nfn main() {}\n```\n\nSome *text*.",
        "guide.md",
    );
    let layouts = [titled_layout("outer"), titled_layout("inner")];

    let first = render(&service, &page, &layouts).await;
    let second = render(&service, &page, &layouts).await;

    assert_eq!(first, second);
    assert_eq!(
        PageData::from_document(&first).unwrap().markdown_cache,
        PageData::from_document(&second).unwrap().markdown_cache
    );
}

#[tokio::test]
async fn test_markdown_scenario() {
    let service = HighlighterService::new();
    let page = Page::markdown(frontmatter(&[("title", json!("Hello"))]), "# Hi", "index.md");

    let document = render(&service, &page, &[]).await;

    assert!(hydration_root(&document).contains("<h1>Hi</h1>"));
    let data = PageData::from_document(&document).unwrap();
    assert_eq!(data.page_type, PageKind::Markdown);
    assert_eq!(data.frontmatter, frontmatter(&[("title", json!("Hello"))]));
    assert_eq!(data.base_path, "/");
    assert_eq!(data.markdown_class_name, None);
}

#[tokio::test]
async fn test_layout_nesting_order() {
    let service = HighlighterService::new();
    let body = component(|_cx: &RenderContext<'_>, _children: Node| Ok(Node::text("CONTENT")));
    let page = Page::component(Frontmatter::new(), body, "page.rs");
    let layout = |name: &'static str| -> Layout {
        component(move |_cx: &RenderContext<'_>, children: Node| {
            Ok(Node::fragment([
                Node::raw(format!("[{name}>")),
                children,
                Node::raw(format!("<{name}]")),
            ]))
        })
    };

    let document = render(&service, &page, &[layout("L0"), layout("L1")]).await;

    assert_eq!(hydration_root(&document), "[L0>[L1>CONTENT<L1]<L0]");
    let data = PageData::from_document(&document).unwrap();
    assert_eq!(data.page_type, PageKind::Component);
    assert!(data.markdown_cache.is_empty());
}

#[tokio::test]
async fn test_head_fragments_move_to_document_head() {
    let service = HighlighterService::new();
    let page = Page::markdown(frontmatter(&[("title", json!("T"))]), "body", "a.md");

    let document = render(&service, &page, &[titled_layout("a"), titled_layout("b")]).await;

    assert!(document.contains("<title>a: T</title>\n<title>b: T</title></head>"));
    assert!(!document.contains("deferred-head"));
    assert!(!hydration_root(&document).contains("<title>"));
}

#[tokio::test]
async fn test_marker_tags_in_markdown_text_stay_literal() {
    let service = HighlighterService::new();
    let page = Page::markdown(
        frontmatter(&[("title", json!("T"))]),
        "```\n</deferred-markdown><deferred-head><title>x</title></deferred-head>\n```\n",
        "a.md",
    );

    let document = render(&service, &page, &[titled_layout("a")]).await;

    let code = "<pre class=\"tabi-code\"><code>&lt;/deferred-markdown&gt;&lt;deferred-head&gt;\
                &lt;title&gt;x&lt;/title&gt;&lt;/deferred-head&gt;\n</code></pre>";
    assert!(hydration_root(&document).contains(code));
    assert!(document.contains("<title>a: T</title></head>"));
    assert_eq!(document.matches("<title>").count(), 1);
    assert!(!document.contains("<deferred-"));
    assert!(!document.contains("</deferred-"));

    let data = PageData::from_document(&document).unwrap();
    assert_eq!(data.markdown_cache.len(), 1);
    assert!(data.markdown_cache.values().all(|html| html.contains(code)));
}

#[tokio::test]
async fn test_identical_markdown_instances() {
    let service = HighlighterService::new();
    let twice = component(|_cx: &RenderContext<'_>, _children: Node| {
        Ok(Node::fragment([
            markdown_body("**same**"),
            markdown_body("**same**"),
        ]))
    });
    let page = Page::component(Frontmatter::new(), twice, "twice.rs");

    let document = render(&service, &page, &[]).await;
    let data = PageData::from_document(&document).unwrap();

    let rendered = "<p><strong>same</strong></p>\n";
    assert_eq!(data.markdown_cache.len(), 2);
    assert!(data.markdown_cache.values().all(|html| html == rendered));
    assert_eq!(
        hydration_root(&document),
        format!(
            r#"<div data-markdown-id="tabi-0">{rendered}</div><div data-markdown-id="tabi-1">{rendered}</div>"#
        )
    );
}

#[tokio::test]
async fn test_script_injection_in_frontmatter_is_neutralized() {
    let service = HighlighterService::new();
    let payload = "</script><script>alert(1)</script>";
    let page = Page::markdown(frontmatter(&[("title", json!(payload))]), "text", "x.md");

    let document = render(&service, &page, &[]).await;

    assert!(!document.contains(payload));
    let data_script_end = document.find(r#"<script type="module""#).unwrap();
    let data_script_start = document.find(r#"<script id="__TABI_DATA__""#).unwrap();
    assert_eq!(
        document[data_script_start..data_script_end]
            .matches("</script>")
            .count(),
        1
    );
    let data = PageData::from_document(&document).unwrap();
    assert_eq!(data.frontmatter["title"], json!(payload));
}

#[tokio::test]
async fn test_client_render_matches_hydration_root() {
    let service = HighlighterService::new();
    let page = Page::markdown(
        frontmatter(&[("title", json!("Hydrate"))]),
        "# Title\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```python\nprint('hi')\n```\n",
        "hydrate.md",
    );
    let layouts = [titled_layout("site")];
    let config = MarkdownConfig {
        class_name: Some("prose".to_owned()),
        gfm: true,
    };

    let document = PageRenderer::new(&service)
        .with_base_path("/docs/")
        .with_markdown_config(config)
        .render(&RenderRequest {
            page: &page,
            layouts: &layouts,
            route: "/hydrate",
            bundle_url: "/docs/client.js",
        })
        .await
        .unwrap();

    let data = PageData::from_document(&document).unwrap();
    assert_eq!(data.base_path, "/docs/");
    assert_eq!(data.markdown_class_name.as_deref(), Some("prose"));

    let client = render_client_body(&page, &layouts, &data).unwrap();
    assert_eq!(client, hydration_root(&document));
    assert!(client.contains(r#"class="prose""#));
}

#[tokio::test]
async fn test_custom_document_shell() {
    let service = HighlighterService::new();
    let page = Page::markdown(Frontmatter::new(), "hello", "a.md");
    let shell = |props: tabi_ssr::DocumentProps| -> Result<Node, TreeError> {
        Ok(Node::fragment([
            Node::raw(r#"<html lang="ja"><head><link rel="stylesheet" href="/s.css"/></head><body>"#),
            props.body,
            Node::raw("</body></html>"),
        ]))
    };

    let document = PageRenderer::new(&service)
        .with_document(Arc::new(shell))
        .render(&RenderRequest {
            page: &page,
            layouts: &[titled_layout("l")],
            route: "/",
            bundle_url: "/c.js",
        })
        .await
        .unwrap();

    assert!(document.starts_with(r#"<!DOCTYPE html><html lang="ja"><head><link rel="stylesheet" href="/s.css"/><title>l: Untitled</title></head>"#));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renders_share_highlighter() {
    static SERVICE: std::sync::LazyLock<HighlighterService> =
        std::sync::LazyLock::new(HighlighterService::new);

    let mut handles = Vec::new();
    for i in 0..8 {
        handles.push(tokio::spawn(async move {
            let page = Page::markdown(
                Frontmatter::new(),
                format!("# Page {i}\n\n```json\n{{\"n\": {i}}}\n```\n"),
                "p.md",
            );
            render(&SERVICE, &page, &[]).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let document = handle.await.unwrap();
        assert!(document.contains(&format!("<h1>Page {i}</h1>")));
    }
    assert!(SERVICE.is_initialized().await);
}
