// src/badge.rs
//! Per-tab found/not-found indicator driven by cached lookups

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::DomainCache;
use crate::lookup::{normalize_domain, LookupService};
use crate::stats::StatsCollector;

pub type TabId = u32;

/// URL schemes that belong to the browser itself, never to a website
pub const INTERNAL_SCHEMES: &[&str] = &[
    "about",
    "blob",
    "brave",
    "chrome",
    "chrome-extension",
    "chrome-search",
    "data",
    "devtools",
    "edge",
    "file",
    "javascript",
    "moz-extension",
    "opera",
    "view-source",
    "vivaldi",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

/// Source of browser tab information
#[async_trait]
pub trait TabSource: Send + Sync {
    /// The currently focused tab, if any
    async fn active_tab(&self) -> Result<Option<Tab>>;

    /// A tab by id; `None` if it no longer exists
    async fn tab(&self, id: TabId) -> Result<Option<Tab>>;
}

/// Browser chrome the indicator is drawn into
#[async_trait]
pub trait BadgeRenderer: Send + Sync {
    async fn set_text(&self, tab: TabId, text: &str) -> Result<()>;

    async fn set_color(&self, tab: TabId, color: &str) -> Result<()>;

    async fn set_title(&self, tab: TabId, title: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    Found,
    NotFound,
    /// Internal pages carry no indicator at all
    Cleared,
}

impl BadgeState {
    pub fn text(&self) -> &'static str {
        match self {
            BadgeState::Found => "✓",
            BadgeState::NotFound => "✗",
            BadgeState::Cleared => "",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BadgeState::Found => "#2e7d32",
            BadgeState::NotFound => "#c62828",
            BadgeState::Cleared => "#00000000",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BadgeState::Found => "Bug bounty program found",
            BadgeState::NotFound => "No bug bounty program found",
            BadgeState::Cleared => "",
        }
    }
}

/// What a tab URL means for badge purposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTarget {
    Internal,
    Site(String),
}

/// Classify a tab URL: internal browser page, or a website domain
pub fn classify_url(raw: &str) -> Result<TabTarget> {
    let url = Url::parse(raw).with_context(|| format!("Unparseable tab URL {:?}", raw))?;

    if INTERNAL_SCHEMES.contains(&url.scheme()) {
        return Ok(TabTarget::Internal);
    }

    match url.host_str() {
        None | Some("") => Ok(TabTarget::Internal),
        Some(_) => Ok(TabTarget::Site(normalize_domain(raw)?)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    /// Navigation in the tab finished
    Navigated(TabId),
    /// The tab became the active tab
    Activated(TabId),
    Closed(TabId),
}

/// Keeps every tab's indicator in step with the cached lookup outcome.
///
/// Events are handled concurrently, so one slow lookup never holds back
/// another tab. Each dispatch takes a ticket for its tab and only the latest
/// ticket may store or draw a result.
///
/// Any failure while resolving a tab's outcome renders `NotFound`. A tab that
/// no longer exists is left untouched. Failures while drawing are logged and
/// dropped.
pub struct BadgeController {
    lookup: Arc<dyn LookupService>,
    cache: DomainCache,
    tabs: Arc<dyn TabSource>,
    renderer: Arc<dyn BadgeRenderer>,
    stats: Option<StatsCollector>,
    states: Mutex<HashMap<TabId, BadgeState>>,
    tickets: Mutex<HashMap<TabId, u64>>,
    next_ticket: AtomicU64,
}

impl BadgeController {
    pub fn new(
        lookup: Arc<dyn LookupService>,
        cache: DomainCache,
        tabs: Arc<dyn TabSource>,
        renderer: Arc<dyn BadgeRenderer>,
    ) -> Self {
        Self {
            lookup,
            cache,
            tabs,
            renderer,
            stats: None,
            states: Mutex::new(HashMap::new()),
            tickets: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Count lookups and cache hits as tabs resolve
    pub fn with_stats(mut self, stats: StatsCollector) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Process tab events until the sender side is dropped, then wait for
    /// the lookups still in flight
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TabEvent>) {
        info!("Badge controller running");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event, &mut tasks).await,
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Badge task failed: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Badge task failed: {}", e);
            }
        }
        info!("Badge controller stopped");
    }

    async fn dispatch(self: &Arc<Self>, event: TabEvent, tasks: &mut JoinSet<()>) {
        match event {
            TabEvent::Navigated(id) | TabEvent::Activated(id) => {
                // Tickets follow event order, not completion order
                let ticket = self.issue_ticket(id).await;
                let controller = Arc::clone(self);
                tasks.spawn(async move {
                    controller.apply(id, ticket).await;
                });
            }
            TabEvent::Closed(id) => self.forget(id).await,
        }
    }

    /// Handle one event to completion
    pub async fn handle_event(&self, event: TabEvent) {
        match event {
            TabEvent::Navigated(id) | TabEvent::Activated(id) => {
                self.refresh(id).await;
            }
            TabEvent::Closed(id) => self.forget(id).await,
        }
    }

    /// Last state rendered for a tab
    pub async fn state(&self, id: TabId) -> Option<BadgeState> {
        self.states.lock().await.get(&id).copied()
    }

    /// Recompute and redraw one tab's indicator.
    ///
    /// Returns `None` when the tab is gone or a newer event for it won.
    pub async fn refresh(&self, id: TabId) -> Option<BadgeState> {
        let ticket = self.issue_ticket(id).await;
        self.apply(id, ticket).await
    }

    async fn issue_ticket(&self, id: TabId) -> u64 {
        let mut tickets = self.tickets.lock().await;
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        tickets.insert(id, ticket);
        ticket
    }

    async fn forget(&self, id: TabId) {
        let mut tickets = self.tickets.lock().await;
        tickets.remove(&id);
        self.states.lock().await.remove(&id);
        debug!("Tab {} closed", id);
    }

    async fn apply(&self, id: TabId, ticket: u64) -> Option<BadgeState> {
        let state = match self.resolve(id).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("Tab {} no longer exists, leaving its badge alone", id);
                return None;
            }
            Err(e) => {
                debug!("Badge lookup for tab {} failed: {:#}", id, e);
                BadgeState::NotFound
            }
        };

        // Held through the draw so a superseded result cannot paint over a newer one
        let tickets = self.tickets.lock().await;
        if tickets.get(&id) != Some(&ticket) {
            debug!("Dropping stale badge result for tab {}", id);
            return None;
        }

        self.states.lock().await.insert(id, state);
        self.render(id, state).await;
        drop(tickets);

        Some(state)
    }

    async fn resolve(&self, id: TabId) -> Result<Option<BadgeState>> {
        let Some(tab) = self.tabs.tab(id).await? else {
            return Ok(None);
        };

        let domain = match classify_url(&tab.url)? {
            TabTarget::Internal => return Ok(Some(BadgeState::Cleared)),
            TabTarget::Site(domain) => domain,
        };

        let lookup = Arc::clone(&self.lookup);
        let target = domain.clone();
        let (result, hit) = self
            .cache
            .get_or_compute_with_hit(&domain, move || async move { lookup.lookup(&target).await })
            .await;

        if let Some(stats) = &self.stats {
            if hit {
                stats.record_cache_hit(result.found);
            } else {
                stats.record_lookup(result.programs.len());
            }
        }

        Ok(Some(if result.found {
            BadgeState::Found
        } else {
            BadgeState::NotFound
        }))
    }

    async fn render(&self, id: TabId, state: BadgeState) {
        let drawn = async {
            self.renderer.set_text(id, state.text()).await?;
            self.renderer.set_color(id, state.color()).await?;
            self.renderer.set_title(id, state.title()).await
        };

        if let Err(e) = drawn.await {
            debug!("Could not draw badge for tab {}: {:#}", id, e);
        }
    }
}

/// In-memory tab list
#[derive(Default)]
pub struct StaticTabs {
    tabs: Mutex<HashMap<TabId, String>>,
    active: Mutex<Option<TabId>>,
}

impl StaticTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, id: TabId, url: &str) {
        self.tabs.lock().await.insert(id, url.to_string());
    }

    pub async fn activate(&self, id: TabId) {
        *self.active.lock().await = Some(id);
    }

    pub async fn close(&self, id: TabId) {
        self.tabs.lock().await.remove(&id);
        let mut active = self.active.lock().await;
        if *active == Some(id) {
            *active = None;
        }
    }
}

#[async_trait]
impl TabSource for StaticTabs {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        let active = *self.active.lock().await;
        match active {
            Some(id) => self.tab(id).await,
            None => Ok(None),
        }
    }

    async fn tab(&self, id: TabId) -> Result<Option<Tab>> {
        let tabs = self.tabs.lock().await;
        Ok(tabs.get(&id).map(|url| Tab { id, url: url.clone() }))
    }
}

/// What a renderer last drew for a tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeView {
    pub text: String,
    pub color: String,
    pub title: String,
}

/// Records draw calls; used by tests and as the base of the terminal renderer
#[derive(Default)]
pub struct MemoryBadge {
    views: Mutex<HashMap<TabId, BadgeView>>,
}

impl MemoryBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn view(&self, tab: TabId) -> Option<BadgeView> {
        self.views.lock().await.get(&tab).cloned()
    }
}

#[async_trait]
impl BadgeRenderer for MemoryBadge {
    async fn set_text(&self, tab: TabId, text: &str) -> Result<()> {
        self.views.lock().await.entry(tab).or_default().text = text.to_string();
        Ok(())
    }

    async fn set_color(&self, tab: TabId, color: &str) -> Result<()> {
        self.views.lock().await.entry(tab).or_default().color = color.to_string();
        Ok(())
    }

    async fn set_title(&self, tab: TabId, title: &str) -> Result<()> {
        self.views.lock().await.entry(tab).or_default().title = title.to_string();
        Ok(())
    }
}

/// Draws badges as terminal lines, one per completed draw
pub struct TerminalBadge {
    labels: HashMap<TabId, String>,
    inner: MemoryBadge,
    use_colors: bool,
}

impl TerminalBadge {
    /// `labels` names each tab in the output (usually its URL)
    pub fn new(labels: HashMap<TabId, String>) -> Self {
        Self {
            labels,
            inner: MemoryBadge::new(),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }
}

#[async_trait]
impl BadgeRenderer for TerminalBadge {
    async fn set_text(&self, tab: TabId, text: &str) -> Result<()> {
        self.inner.set_text(tab, text).await
    }

    async fn set_color(&self, tab: TabId, color: &str) -> Result<()> {
        self.inner.set_color(tab, color).await
    }

    // Title is drawn last, so the full badge is known here
    async fn set_title(&self, tab: TabId, title: &str) -> Result<()> {
        self.inner.set_title(tab, title).await?;
        let view = self.inner.view(tab).await.unwrap_or_default();

        let label = self
            .labels
            .get(&tab)
            .cloned()
            .unwrap_or_else(|| format!("tab {}", tab));
        let text = if view.text.is_empty() { "-" } else { view.text.as_str() };

        if self.use_colors {
            let badge = match view.text.as_str() {
                "✓" => text.green().bold(),
                "✗" => text.red().bold(),
                _ => text.dimmed(),
            };
            println!("{} {} {}", badge, label.cyan(), view.title.dimmed());
        } else {
            println!("{} {} {}", text, label, view.title);
        }
        Ok(())
    }
}
