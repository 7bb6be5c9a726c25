//! Runtime tests - the smol host loop with in-memory and delayed fetchers

use hinc_engine::{DeliveryMode, IncludeConfig, IncludeEngine, IncludeRuntime, IncludeState};
use hinc_net::{Fetch, MemoryFetcher, NetError, Response};
use std::time::Duration;
use url::Url;

const PAGE: &str = "http://example.com/index.html";

fn engine(markup: &str, config: IncludeConfig) -> IncludeEngine {
    IncludeEngine::builder(hinc_html::parse(markup, PAGE))
        .config(config)
        .build()
        .unwrap()
}

/// Serves every URL, sleeping first for URLs containing "slow"
struct DelayedFetcher {
    delay: Duration,
}

impl Fetch for DelayedFetcher {
    fn fetch(&self, url: &Url) -> Result<Response, NetError> {
        if url.path().contains("slow") {
            std::thread::sleep(self.delay);
        }
        Ok(Response::new(200, format!("<p>{}</p>", url.path())))
    }
}

#[test]
fn test_buffered_page_with_nested_includes() {
    let fetcher = MemoryFetcher::new()
        .page(
            "http://example.com/header.html",
            r#"<body><h-include source="/logo.html"></h-include></body>"#,
        )
        .page("http://example.com/logo.html", "<img src=\"logo.png\">")
        .page("http://example.com/footer.html", "<footer>f</footer>");

    let engine = engine(
        r#"<h-include id="h" source="/header.html"></h-include>
           <h-include id="f" source="/footer.html"></h-include>
           <h-include id="m" source="/missing.html">keep</h-include>"#,
        IncludeConfig::default(),
    );
    let mut runtime = IncludeRuntime::new(engine, fetcher);
    runtime.run();

    let engine = runtime.engine();
    let doc = engine.document();
    let footer = doc.get_element_by_id("f").unwrap();
    let missing = doc.get_element_by_id("m").unwrap();
    let header = doc.get_element_by_id("h").unwrap();

    assert_eq!(engine.inner_html(footer), "<footer>f</footer>");
    assert_eq!(engine.inner_html(missing), "keep");
    assert_eq!(engine.status_class(missing), Some("included_404"));
    assert_eq!(
        engine.inner_html(header),
        concat!(
            r#"<h-include source="http://example.com/logo.html" class="included_200">"#,
            r#"<img src="http://example.com/logo.png"></h-include>"#,
        )
    );
    assert_eq!(engine.state(header), Some(IncludeState::Rendered));
    assert!(!engine.has_pending_work());

    let mut requested = runtime.fetcher().requests();
    requested.sort();
    assert_eq!(
        requested,
        [
            "http://example.com/footer.html",
            "http://example.com/header.html",
            "http://example.com/logo.html",
            "http://example.com/missing.html",
        ]
    );
}

#[test]
fn test_immediate_mode_never_arms_timers() {
    let fetcher = MemoryFetcher::new().page("http://example.com/a.html", "<p>A</p>");
    let engine = engine(
        r#"<h-include id="a" source="/a.html"></h-include>"#,
        IncludeConfig::default().with_mode(DeliveryMode::Immediate),
    );
    let mut runtime = IncludeRuntime::new(engine, fetcher);
    runtime.run();

    let engine = runtime.into_engine();
    assert!(engine.delivery().coordinator().is_none());
    let a = engine.document().get_element_by_id("a").unwrap();
    assert_eq!(engine.inner_html(a), "<p>A</p>");
}

#[test]
fn test_timeout_flushes_before_slow_fetch() {
    let engine = engine(
        r#"<h-include id="fast" source="/fast.html"></h-include>
           <h-include id="slow" source="/slow.html"></h-include>"#,
        IncludeConfig::default()
            .with_mode(DeliveryMode::Buffered)
            .with_timeout(Duration::from_millis(50)),
    );
    let fetcher = DelayedFetcher {
        delay: Duration::from_millis(400),
    };
    let mut runtime = IncludeRuntime::new(engine, fetcher);
    runtime.run();

    let engine = runtime.engine();
    let fast = engine.document().get_element_by_id("fast").unwrap();
    let slow = engine.document().get_element_by_id("slow").unwrap();
    assert_eq!(engine.inner_html(fast), "<p>/fast.html</p>");
    assert_eq!(engine.inner_html(slow), "<p>/slow.html</p>");
    assert_eq!(engine.delivery().coordinator().unwrap().flushes(), 2);
}

#[test]
fn test_transport_error_settles() {
    let fetcher = MemoryFetcher::new().fail("http://example.com/a.html", "connection reset");
    let engine = engine(
        r#"<h-include id="a" source="/a.html">old</h-include>"#,
        IncludeConfig::default(),
    );
    let mut runtime = IncludeRuntime::new(engine, fetcher);
    runtime.run();

    let engine = runtime.engine();
    let a = engine.document().get_element_by_id("a").unwrap();
    assert_eq!(engine.status_class(a), Some("included_error"));
    assert_eq!(engine.inner_html(a), "old");
}

#[test]
fn test_expands_local_files() {
    let dir = std::env::temp_dir().join(format!("hinc-engine-runtime-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("parts")).unwrap();
    std::fs::write(
        dir.join("parts/nav.html"),
        r#"<body><nav><a href="home.html">Home</a></nav></body>"#,
    )
    .unwrap();
    let index = dir.join("index.html");
    std::fs::write(
        &index,
        r#"<h-include id="nav" source="parts/nav.html" fragment="nav"></h-include>"#,
    )
    .unwrap();

    let url = Url::from_file_path(&index).unwrap();
    let markup = std::fs::read_to_string(&index).unwrap();
    let engine = IncludeEngine::builder(hinc_html::parse(&markup, url.as_str()))
        .config(IncludeConfig::default().with_mode(DeliveryMode::Immediate))
        .build()
        .unwrap();
    let mut runtime = IncludeRuntime::new(engine, hinc_net::ResourceLoader::new().unwrap());
    runtime.run();

    let engine = runtime.engine();
    let nav = engine.document().get_element_by_id("nav").unwrap();
    let home = Url::from_file_path(dir.join("parts/home.html")).unwrap();
    assert_eq!(engine.inner_html(nav), format!(r#"<a href="{home}">Home</a>"#));

    std::fs::remove_dir_all(&dir).unwrap();
}
