//! hinclude - expand the includes of a page and print the result

use anyhow::{bail, Context};
use clap::Parser;
use hinc_engine::{DeliveryMode, IncludeConfig, IncludeEngine, IncludeRuntime, MediaType, Viewport};
use hinc_html::HtmlSerializer;
use hinc_net::{LoaderConfig, ResourceLoader};
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(
    name = "hinclude",
    about = "Fetch a page, expand its h-include elements and print the HTML",
    version
)]
struct Cli {
    /// Page URL (http, https, file) or local path
    input: String,

    /// Delivery mode, overriding the page's include_mode meta
    #[arg(long, value_parser = parse_mode)]
    mode: Option<DeliveryMode>,

    /// Buffered flush timeout in seconds, overriding include_timeout
    #[arg(long)]
    timeout: Option<f64>,

    /// Viewport used to evaluate media attributes, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_viewport, default_value = "1024x768")]
    viewport: (u32, u32),

    /// Evaluate media attributes for print instead of screen
    #[arg(long)]
    print: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_mode(value: &str) -> Result<DeliveryMode, String> {
    DeliveryMode::parse(value)
        .ok_or_else(|| format!("unknown mode {value:?}, expected async or buffered"))
}

fn parse_viewport(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((width, height))
}

/// Absolute URL for a command-line input
fn page_url(input: &str) -> anyhow::Result<Url> {
    if let Ok(url) = Url::parse(input) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            return Ok(url);
        }
    }
    let path = Path::new(input)
        .canonicalize()
        .with_context(|| format!("cannot open {input}"))?;
    Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("not an absolute path: {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let url = page_url(&cli.input)?;
    let loader = ResourceLoader::with_config(LoaderConfig {
        request_timeout: Duration::from_secs(cli.request_timeout),
        ..LoaderConfig::default()
    })?;

    tracing::info!("Loading {}", url);
    let response = loader.get(&url)?;
    if !response.is_success() {
        bail!("{} returned HTTP {}", url, response.status);
    }
    let document = hinc_html::parse(&response.text(), url.as_str());

    let mut config = IncludeConfig::from_document(&document);
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode);
    }
    if let Some(secs) = cli.timeout {
        let timeout = Duration::try_from_secs_f64(secs).context("invalid --timeout")?;
        config = config.with_timeout(timeout);
    }

    let (width, height) = cli.viewport;
    let mut viewport = Viewport::new(width, height);
    if cli.print {
        viewport.media_type = MediaType::Print;
    }

    let engine = IncludeEngine::builder(document)
        .config(config)
        .media(viewport)
        .build()?;
    let mut runtime = IncludeRuntime::new(engine, loader);
    runtime.run();

    let document = runtime.into_engine().into_document();
    let html = HtmlSerializer::new().serialize_outer(document.tree(), document.tree().root());
    println!("{html}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("800x600"), Ok((800, 600)));
        assert_eq!(parse_viewport("320X480"), Ok((320, 480)));
        assert!(parse_viewport("800").is_err());
        assert!(parse_viewport("wide x tall").is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("async"), Ok(DeliveryMode::Immediate));
        assert_eq!(parse_mode("buffered"), Ok(DeliveryMode::Buffered));
        assert!(parse_mode("eager").is_err());
    }

    #[test]
    fn test_page_url_keeps_web_urls() {
        let url = page_url("https://example.com/index.html").unwrap();
        assert_eq!(url.as_str(), "https://example.com/index.html");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
