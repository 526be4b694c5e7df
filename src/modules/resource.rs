//! Generic list/detail/delete module over one resource collection.
//!
//! The API exposes each collection at
//! `{base}/projects/{project}/{collection}` returning `{"items": [...]}`,
//! and single resources at `.../{collection}/{name}`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::cache::{cache_key, TtlCache};
use crate::error::{ModuleError, NetworkError};
use crate::gateway::Gateway;
use crate::module::{Commands, Lifecycle, Module, ModuleContext, ModuleMessage, ModuleState, UiMessage};
use crate::traits::{Headers, HttpClient};

/// Static description of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    pub key: &'static str,
    pub title: &'static str,
    /// Path segment of the collection.
    pub collection: &'static str,
}

pub const INSTANCES: ResourceKind = ResourceKind {
    key: "instances",
    title: "Instances",
    collection: "instances",
};

pub const DATABASES: ResourceKind = ResourceKind {
    key: "databases",
    title: "Databases",
    collection: "databases",
};

pub const BUCKETS: ResourceKind = ResourceKind {
    key: "buckets",
    title: "Buckets",
    collection: "buckets",
};

pub const QUEUES: ResourceKind = ResourceKind {
    key: "queues",
    title: "Queues",
    collection: "queues",
};

/// One remote resource. Fields beyond the common ones are kept for the
/// detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    items: Vec<Resource>,
}

type Listing = Arc<Vec<Resource>>;

/// Cache-aware API client for one collection in one project.
#[derive(Clone)]
pub struct ResourceClient {
    kind: ResourceKind,
    project: String,
    base_url: String,
    ttl: Duration,
    http: Arc<dyn HttpClient>,
    gateway: Arc<Gateway>,
    cache: Arc<TtlCache>,
}

impl std::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("kind", &self.kind.key)
            .field("project", &self.project)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    /// Client for `kind` in `ctx.project`. Fails on an unusable project or
    /// API URL.
    pub fn connect(kind: ResourceKind, ctx: &ModuleContext) -> Result<Self, ModuleError> {
        if ctx.project.trim().is_empty() {
            return Err(ModuleError::init(kind.key, "no project selected"));
        }
        let base_url = ctx.config.api_base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ModuleError::init(
                kind.key,
                format!("invalid API URL '{}'", ctx.config.api_base_url),
            ));
        }
        Ok(Self {
            kind,
            project: ctx.project.clone(),
            base_url: base_url.to_string(),
            ttl: ctx.config.cache_ttl,
            http: Arc::clone(&ctx.http),
            gateway: Arc::clone(&ctx.gateway),
            cache: Arc::clone(&ctx.cache),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/{}",
            self.base_url, self.project, self.kind.collection
        )
    }

    pub fn cache_key(&self) -> String {
        cache_key(self.kind.key, &self.project)
    }

    /// Drop every cached listing of this kind, across projects.
    pub fn invalidate_all(&self) -> usize {
        self.cache.invalidate_prefix(&format!("{}:", self.kind.key))
    }

    /// List the collection, from cache unless `force`.
    pub async fn list(&self, force: bool) -> Result<Listing, ModuleError> {
        let key = self.cache_key();
        if !force {
            if let Some(items) = self.cache.get::<Listing>(&key) {
                tracing::debug!(key = %key, "cache hit");
                return Ok(items);
            }
        }

        let url = self.collection_url();
        let operation = format!("list {}", self.kind.key);
        let list = self
            .gateway
            .execute(&operation, || {
                let http = Arc::clone(&self.http);
                let url = url.clone();
                async move {
                    let response = http.get(&url, &json_headers()).await?.error_for_status()?;
                    response.json::<ResourceList>()
                }
            })
            .await?;

        let items: Listing = Arc::new(list.items);
        self.cache.set(key, Arc::clone(&items), self.ttl);
        Ok(items)
    }

    /// Delete one resource and drop the cached listing.
    pub async fn delete(&self, name: &str) -> Result<(), ModuleError> {
        let url = format!("{}/{}", self.collection_url(), name);
        let operation = format!("delete {}", self.kind.key);
        self.gateway
            .execute(&operation, || {
                let http = Arc::clone(&self.http);
                let url = url.clone();
                async move {
                    http.delete(&url, &json_headers()).await?.error_for_status()?;
                    Ok::<_, NetworkError>(())
                }
            })
            .await?;
        self.cache.delete(&self.cache_key());
        Ok(())
    }
}

fn json_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert("accept".to_string(), "application/json".to_string());
    headers
}

/// Results of the module's spawned work.
#[derive(Debug)]
enum ResourceEvent {
    Listed(Result<Listing, ModuleError>),
    Deleted {
        name: String,
        result: Result<(), ModuleError>,
    },
}

pub struct ResourceModule {
    kind: ResourceKind,
    client: Option<ResourceClient>,
    lifecycle: Lifecycle,
    items: Listing,
    selected: usize,
    detail: bool,
    pending_delete: Option<String>,
    error: Option<String>,
    /// Recovery hint for the category of `error`.
    hint: &'static str,
    loaded_at: Option<DateTime<Local>>,
    focused: bool,
    width: u16,
    poll_interval: Option<Duration>,
}

impl ResourceModule {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            client: None,
            lifecycle: Lifecycle::new(),
            items: Arc::new(Vec::new()),
            selected: 0,
            detail: false,
            pending_delete: None,
            error: None,
            hint: "",
            loaded_at: None,
            focused: false,
            width: 80,
            poll_interval: None,
        }
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn selected(&self) -> Option<&Resource> {
        self.items.get(self.selected)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn project(&self) -> Option<&str> {
        self.client.as_ref().map(ResourceClient::project)
    }

    fn fetch(&mut self, force: bool) -> Commands {
        let Some(client) = self.client.clone() else {
            return Commands::none();
        };
        if !self.lifecycle.begin_refresh() {
            return Commands::none();
        }
        Commands::spawn(async move { ResourceEvent::Listed(client.list(force).await) })
    }

    fn on_listed(&mut self, result: Result<Listing, ModuleError>) -> Commands {
        match result {
            Ok(items) => {
                if !self.lifecycle.load_succeeded() {
                    return Commands::none();
                }
                self.items = items;
                if self.selected >= self.items.len() {
                    self.selected = self.items.len().saturating_sub(1);
                }
                if self.items.is_empty() {
                    self.detail = false;
                }
                self.error = None;
                self.loaded_at = Some(Local::now());
                Commands::none()
            }
            Err(err) => {
                if !self.lifecycle.load_failed() {
                    return Commands::none();
                }
                tracing::warn!(module = self.kind.key, error = %err, "listing failed");
                let message = err.to_string();
                self.error = Some(message.clone());
                self.hint = err.category().recovery_hint();
                Commands::ui(UiMessage::Toast(format!("{}: {}", self.kind.title, message)))
            }
        }
    }

    fn on_deleted(&mut self, name: String, result: Result<(), ModuleError>) -> Commands {
        if self.lifecycle.state() != ModuleState::Loading {
            return Commands::none();
        }
        match result {
            Ok(()) => {
                self.detail = false;
                let Some(client) = self.client.clone() else {
                    return Commands::none();
                };
                Commands::ui(UiMessage::Toast(format!("Deleted {}", name)))
                    .and_spawn(async move { ResourceEvent::Listed(client.list(true).await) })
            }
            Err(err) => {
                self.lifecycle.load_failed();
                let message = format!("delete {} failed: {}", name, err);
                self.error = Some(message.clone());
                self.hint = err.category().recovery_hint();
                Commands::ui(UiMessage::Toast(message))
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Commands {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let (Some(name), Some(client)) = (self.pending_delete.take(), self.client.clone())
                else {
                    self.lifecycle.cancel();
                    return Commands::none();
                };
                if !self.lifecycle.confirm() {
                    return Commands::none();
                }
                Commands::spawn(async move {
                    let result = client.delete(&name).await;
                    ResourceEvent::Deleted { name, result }
                })
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_delete = None;
                self.lifecycle.cancel();
                Commands::none()
            }
            _ => Commands::none(),
        }
    }

    fn render_row(&self, idx: usize, resource: &Resource) -> String {
        let marker = if idx == self.selected {
            if self.focused {
                "»"
            } else {
                ">"
            }
        } else {
            " "
        };
        let name_width = (usize::from(self.width) / 2).clamp(12, 40);
        format!(
            "{} {} {:<10} {}",
            marker,
            pad(&resource.name, name_width),
            resource.status.as_deref().unwrap_or("-"),
            resource.region.as_deref().unwrap_or("-"),
        )
    }

    fn render_detail(&self, resource: &Resource) -> String {
        let mut lines = vec![
            format!("{} / {}", self.kind.title, resource.name),
            String::new(),
            format!("status:   {}", resource.status.as_deref().unwrap_or("-")),
            format!("region:   {}", resource.region.as_deref().unwrap_or("-")),
        ];
        if let Some(created) = resource.created_at {
            lines.push(format!(
                "created:  {}",
                created.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ));
        }
        for (key, value) in &resource.attributes {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("{}: {}", key, value));
        }
        lines.join("\n")
    }
}

/// Left-align `text` in `width` terminal columns, truncating with `…`.
fn pad(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

impl Module for ResourceModule {
    fn key(&self) -> &str {
        self.kind.key
    }

    fn title(&self) -> &str {
        self.kind.title
    }

    fn state(&self) -> ModuleState {
        self.lifecycle.state()
    }

    fn initialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        match ResourceClient::connect(self.kind, ctx) {
            Ok(client) => {
                tracing::debug!(module = self.kind.key, project = %ctx.project, "client ready");
                self.client = Some(client);
                self.poll_interval = Some(ctx.config.poll_interval);
                self.error = None;
                self.lifecycle.initialized();
                Ok(())
            }
            Err(err) => {
                self.client = None;
                self.error = Some(err.to_string());
                self.hint = err.category().recovery_hint();
                self.lifecycle.init_failed();
                Err(err)
            }
        }
    }

    fn reinitialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        if self.lifecycle.is_initialized() && self.project() == Some(ctx.project.as_str()) {
            return Ok(());
        }
        if let Some(old) = self.client.take() {
            old.invalidate_all();
        }
        self.lifecycle.teardown();
        self.items = Arc::new(Vec::new());
        self.selected = 0;
        self.detail = false;
        self.pending_delete = None;
        self.loaded_at = None;
        self.initialize(ctx)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Commands {
        if self.lifecycle.state() == ModuleState::Confirming {
            return self.handle_confirm_key(key);
        }
        if self.detail {
            if matches!(key.code, KeyCode::Esc | KeyCode::Backspace | KeyCode::Left) {
                self.detail = false;
            }
            return Commands::none();
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Commands::none()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.items.len() {
                    self.selected += 1;
                }
                Commands::none()
            }
            KeyCode::Enter => {
                self.detail = self.selected().is_some();
                Commands::none()
            }
            KeyCode::Char('r') if !self.lifecycle.is_initialized() => {
                Commands::ui(UiMessage::Reinitialize)
            }
            KeyCode::Char('r') => self.fetch(true),
            KeyCode::Char('d') => {
                let Some(name) = self.selected().map(|r| r.name.clone()) else {
                    return Commands::none();
                };
                if self.lifecycle.request_confirmation() {
                    self.pending_delete = Some(name);
                }
                Commands::none()
            }
            KeyCode::Char('/') => Commands::ui(UiMessage::OpenPalette {
                filter: "project".to_string(),
            }),
            _ => Commands::none(),
        }
    }

    fn handle_message(&mut self, msg: ModuleMessage) -> Commands {
        match msg.downcast::<ResourceEvent>() {
            Ok(ResourceEvent::Listed(result)) => self.on_listed(result),
            Ok(ResourceEvent::Deleted { name, result }) => self.on_deleted(name, result),
            Err(other) => {
                tracing::debug!(module = self.kind.key, ?other, "ignoring foreign message");
                Commands::none()
            }
        }
    }

    fn refresh(&mut self) -> Commands {
        self.fetch(false)
    }

    fn reset(&mut self) {
        self.selected = 0;
        self.detail = false;
        self.pending_delete = None;
        if self.lifecycle.is_initialized() {
            self.error = None;
        }
        self.lifecycle.reset();
    }

    fn tick(&mut self) -> Commands {
        match self.lifecycle.state() {
            ModuleState::Ready | ModuleState::Loaded | ModuleState::Error => self.fetch(true),
            _ => Commands::none(),
        }
    }

    fn resize(&mut self, width: u16, _height: u16) {
        self.width = width;
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn is_at_root(&self) -> bool {
        !self.detail && self.lifecycle.state() != ModuleState::Confirming
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        let project = self.project().unwrap_or("-");
        let loaded = self
            .loaded_at
            .map(|t| format!(" · loaded {}", t.format("%H:%M:%S")))
            .unwrap_or_default();
        lines.push(format!("{} · {}{}", self.kind.title, project, loaded));
        lines.push(String::new());

        if self.detail {
            if let Some(resource) = self.selected() {
                lines.push(self.render_detail(resource));
                return lines.join("\n");
            }
        }

        match self.lifecycle.state() {
            ModuleState::Uninitialized => lines.push("Not initialized".to_string()),
            ModuleState::Loading if self.items.is_empty() => lines.push("Loading…".to_string()),
            ModuleState::Error => {
                lines.push(format!("Error: {}", self.error.as_deref().unwrap_or("unknown")));
                lines.push(self.hint.to_string());
            }
            _ => {}
        }

        if self.items.is_empty() {
            if self.lifecycle.state() == ModuleState::Loaded {
                lines.push(format!("No {} in this project", self.kind.collection));
            }
        } else {
            for (idx, resource) in self.items.iter().enumerate() {
                lines.push(self.render_row(idx, resource));
            }
        }

        if let Some(name) = &self.pending_delete {
            lines.push(String::new());
            lines.push(format!("Delete {}? (y/n)", name));
        }
        lines.join("\n")
    }

    fn help_text(&self) -> String {
        match self.lifecycle.state() {
            ModuleState::Confirming => "y: confirm  n/Esc: cancel".to_string(),
            _ if self.detail => "Esc: back".to_string(),
            ModuleState::Error => "r: retry  Esc: home".to_string(),
            _ => "↑/↓: select  Enter: details  d: delete  r: refresh  /: project".to_string(),
        }
    }

    fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }
}

/// Summary query for the Home overview: the number of resources.
pub fn summary_query(
    kind: ResourceKind,
) -> impl Fn(&ModuleContext) -> BoxFuture<'static, Result<String, ModuleError>> + Send + Sync {
    move |ctx| {
        let client = ResourceClient::connect(kind, ctx);
        async move {
            let items = client?.list(false).await?;
            Ok::<_, ModuleError>(format!("{} {}", items.len(), kind.collection))
        }
        .boxed()
    }
}
