//! Headless driver: loads a collection page, applies filters through the facet engine the
//! way a visitor would, and prints the regions the engine patched.
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use bus::{Bus, CoreCommand};
use clap::Parser;
use facets::{
    CacheConfig, FacetConfig, FacetEvent, FacetFilters, Location, RefError, SessionHistory,
    ThemeCollaborators,
};
use html::dom_utils::{collapsed_text, outline_from_dom};
use html::{Document, Id, Matcher};
use net::{FetchError, NetConfig, fetch_text};
use url::Url;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "facetsync", about = "Apply collection filters against a live storefront")]
struct Cli {
    /// Collection page, e.g. https://shop.example/collections/shoes?sort_by=best-selling
    page: String,

    /// Read the initial page from a file instead of fetching it
    #[arg(long)]
    page_file: Option<PathBuf>,

    /// Tick a checkbox filter, as NAME=VALUE (repeatable)
    #[arg(long = "check", value_name = "NAME=VALUE")]
    checks: Vec<String>,

    /// Type into a text filter such as a price bound, as NAME=VALUE (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    sets: Vec<String>,

    /// Render this query string directly instead of editing controls
    #[arg(long)]
    query: Option<String>,

    #[arg(long, default_value_t = 800)]
    debounce_ms: u64,

    /// Bound the fragment cache (least recently used entries are evicted)
    #[arg(long)]
    max_cache: Option<usize>,

    /// Ignore responses older than the last applied render
    #[arg(long)]
    discard_stale: bool,

    /// Expand only the price filter after each render
    #[arg(long)]
    open_price_filter: bool,

    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Lines of product grid outline to print
    #[arg(long, default_value_t = 40)]
    outline_lines: usize,
}

#[derive(Debug)]
enum CliError {
    Url(url::ParseError),
    Io(PathBuf, std::io::Error),
    Fetch(FetchError),
    Page(RefError),
    BadPair(String),
    NoControl(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Url(e) => write!(f, "invalid page url: {e}"),
            CliError::Io(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            CliError::Fetch(e) => write!(f, "cannot load page: {e}"),
            CliError::Page(e) => write!(f, "{e}"),
            CliError::BadPair(raw) => write!(f, "expected NAME=VALUE, got {raw:?}"),
            CliError::NoControl(what) => write!(f, "no filter control for {what}"),
        }
    }
}

impl std::error::Error for CliError {}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

type Engine = FacetFilters<std::sync::mpsc::Sender<CoreCommand>, SessionHistory>;

fn run(cli: Cli) -> Result<(), CliError> {
    let page_url = Url::parse(&cli.page).map_err(CliError::Url)?;
    let body = match &cli.page_file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::Io(path.clone(), e))?,
        None => {
            let net_config = net_config(&cli);
            fetch_text(page_url.as_str(), &net_config).map_err(CliError::Fetch)?.body
        }
    };

    let location = Location {
        path: page_url.path().to_string(),
        search: page_url.query().unwrap_or("").to_string(),
    };
    let config = FacetConfig {
        debounce: Duration::from_millis(cli.debounce_ms),
        cache: CacheConfig {
            max_entries: cli.max_cache,
        },
        discard_stale_responses: cli.discard_stale,
        strict_refs: false,
        ..FacetConfig::default()
    };
    let collab = ThemeCollaborators {
        markup: config.markup.clone(),
        open_price_filter: cli.open_price_filter,
    };

    let (bus, cmd_rx) = Bus::new();
    let runtime = runtime_net::start_net_runtime(page_url.clone(), net_config(&cli), cmd_rx, bus.evt_tx.clone());

    let mut engine = FacetFilters::new(
        Document::parse(&body),
        location.clone(),
        SessionHistory::new(&location.href()),
        bus.cmd_tx.clone(),
        Box::new(collab),
        config,
    )
    .map_err(CliError::Page)?;

    if let Some(query) = &cli.query {
        engine.render_page(query, None, true);
    } else {
        edit_controls(&mut engine, &cli)?;
    }
    drive(&mut engine, &bus, Duration::from_secs(cli.timeout_secs));

    let _ = bus.cmd_tx.send(CoreCommand::Shutdown);
    drop(bus);
    if runtime.join().is_err() {
        log::warn!("network runtime panicked");
    }

    report(&engine, cli.outline_lines);
    Ok(())
}

fn net_config(cli: &Cli) -> NetConfig {
    NetConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        ..NetConfig::default()
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str), CliError> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::BadPair(raw.to_string()))
}

/// Edits controls in the primary filter form and dispatches the events a browser would.
fn edit_controls(engine: &mut Engine, cli: &Cli) -> Result<(), CliError> {
    let now = Instant::now();
    let form = engine.refs().primary_form;
    for raw in &cli.checks {
        let (name, value) = split_pair(raw)?;
        let matcher = Matcher::tag("input")
            .and(Matcher::attr_eq("name", name))
            .and(Matcher::attr_eq("value", value));
        let target = find_control(engine, form, &matcher).ok_or_else(|| CliError::NoControl(raw.clone()))?;
        engine.page_mut().set_checked(target, true);
        engine.handle(FacetEvent::Input { target }, now);
    }
    for raw in &cli.sets {
        let (name, value) = split_pair(raw)?;
        let matcher = Matcher::tag("input").and(Matcher::attr_eq("name", name));
        let target = find_control(engine, form, &matcher).ok_or_else(|| CliError::NoControl(raw.clone()))?;
        engine.page_mut().set_value(target, value);
        engine.handle(FacetEvent::Change { target }, now);
        engine.handle(FacetEvent::Input { target }, now);
    }

    if cli.checks.is_empty() && cli.sets.is_empty() {
        let search = engine.location().search.clone();
        engine.render_page(&search, None, false);
    }
    Ok(())
}

fn find_control(engine: &Engine, form: Option<Id>, matcher: &Matcher) -> Option<Id> {
    let doc = engine.page().doc();
    let control = match form {
        Some(form) => doc.find_in(form, matcher),
        None => doc.find(matcher),
    };
    control.map(|n| n.id())
}

/// Runs the engine's timers and feeds fetch results back until nothing is outstanding.
fn drive(engine: &mut Engine, bus: &Bus, timeout: Duration) {
    loop {
        if let Some(deadline) = engine.next_deadline() {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            engine.tick(Instant::now());
            continue;
        }
        if engine.pending_requests() == 0 {
            break;
        }
        match bus.evt_rx.recv_timeout(timeout) {
            Ok(event) => {
                engine.on_core_event(event);
            }
            Err(e) => {
                log::warn!("gave up waiting for {} request(s): {e}", engine.pending_requests());
                break;
            }
        }
    }
}

fn report(engine: &Engine, outline_lines: usize) {
    let doc = engine.page().doc();
    let markup = engine.markup();
    println!("url: {}", engine.location().href());
    if let Some(count) = doc.element_by_id(&markup.product_count_id) {
        println!("count: {}", collapsed_text(count));
    }
    if let Some(active) = doc.find(&Matcher::class(&markup.active_facets_class)) {
        println!("active: {}", collapsed_text(active));
    }
    for block in doc.find_all(&Matcher::class(&markup.filter_block_class)) {
        let summary = html::select::select_first(block, &Matcher::class(&markup.summary_class))
            .map(collapsed_text)
            .unwrap_or_default();
        println!("filter {}: {summary}", block.html_id().unwrap_or("?"));
    }
    if let Some(grid) = doc.element_by_id(&markup.grid_container_id) {
        for line in outline_from_dom(grid, outline_lines) {
            println!("{line}");
        }
    }
    println!("cached fragments: {}", engine.cache().len());
}
