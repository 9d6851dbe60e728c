//! Page rendering
//!
//! Templates live in one directory: `*.page.html` files are pages and
//! `*.layout.html` files are the layouts they extend. The template cache is
//! compiled once at startup; with caching disabled it is rebuilt from disk
//! for every render so template edits show up without a restart.
//!
//! Every render merges the per-request defaults into [`TemplateData`]: the
//! one-shot flash/warning/error messages, the CSRF token and the login state.
//! Output is rendered into a `String` before anything is sent.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate};
use minijinja::{Environment, ErrorKind};
use serde::Serialize;
use shared::models::{Reservation, Room};
use shared::util::{format_date, parse_date};
use tower_sessions::Session;

use crate::calendar::MonthView;
use crate::error::{ConfigError, RenderError};
use crate::forms::Form;
use crate::csrf;
use crate::session::{self, ERROR, FLASH, WARNING};

const PAGE_SUFFIX: &str = ".page.html";
const LAYOUT_SUFFIX: &str = ".layout.html";

/// Data handed to a page template
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub string_map: HashMap<String, String>,
    pub int_map: HashMap<String, i64>,
    pub form: Form,
    pub reservation: Option<Reservation>,
    pub reservations: Vec<Reservation>,
    pub rooms: Vec<Room>,
    pub calendar: Option<MonthView>,
    pub flash: String,
    pub warning: String,
    pub error: String,
    pub csrf_token: String,
    pub is_authenticated: bool,
}

impl TemplateData {
    pub fn with_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.string_map.insert(key.to_string(), value.into());
        self
    }

    pub fn with_int(mut self, key: &str, value: i64) -> Self {
        self.int_map.insert(key.to_string(), value);
        self
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    pub fn with_reservation(mut self, reservation: Reservation) -> Self {
        self.reservation = Some(reservation);
        self
    }

    pub fn with_reservations(mut self, reservations: Vec<Reservation>) -> Self {
        self.reservations = reservations;
        self
    }

    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_calendar(mut self, calendar: MonthView) -> Self {
        self.calendar = Some(calendar);
        self
    }
}

/// Merge the session-sourced defaults into the page data
pub async fn add_default_data(mut td: TemplateData, session: &Session) -> TemplateData {
    td.flash = FLASH.take(session).await.unwrap_or_default();
    td.error = ERROR.take(session).await.unwrap_or_default();
    td.warning = WARNING.take(session).await.unwrap_or_default();
    td.csrf_token = csrf::token(session).await;
    td.is_authenticated = session::is_authenticated(session).await;
    td
}

/// Compiled pages and layouts
pub struct TemplateCache {
    env: Environment<'static>,
    pages: BTreeSet<String>,
}

impl TemplateCache {
    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains(name)
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }

    fn render(&self, name: &str, data: &TemplateData) -> Result<String, RenderError> {
        if !self.contains(name) {
            return Err(RenderError::MissingTemplate(name.to_string()));
        }
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::MissingTemplate(name.to_string()),
            _ => RenderError::Template {
                name: name.to_string(),
                source: e,
            },
        })?;
        template.render(data).map_err(|source| RenderError::Template {
            name: name.to_string(),
            source,
        })
    }
}

/// Compile every page and layout found in `dir`
pub fn create_template_cache(dir: &Path) -> Result<TemplateCache, ConfigError> {
    let mut env = Environment::new();
    env.add_filter("human_date", human_date);
    env.add_filter("format_date", format_date_filter);
    env.add_function("iterate", iterate);
    env.add_function("add", add);

    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(PAGE_SUFFIX) || name.ends_with(LAYOUT_SUFFIX) {
            files.push((name, entry.path()));
        }
    }
    files.sort();

    let mut pages = BTreeSet::new();
    for (name, path) in files {
        let source = std::fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        env.add_template_owned(name.clone(), source)
            .map_err(|source| ConfigError::TemplateCompile {
                name: name.clone(),
                source,
            })?;
        if name.ends_with(PAGE_SUFFIX) {
            pages.insert(name);
        }
    }

    tracing::debug!(dir = %dir.display(), pages = pages.len(), "Template cache built");
    Ok(TemplateCache { env, pages })
}

/// Renders pages from the cache, or from disk when caching is off
pub struct Renderer {
    dir: PathBuf,
    cache: Option<TemplateCache>,
}

impl Renderer {
    /// Compile the template directory; fails on unreadable or broken templates
    pub fn new(dir: impl Into<PathBuf>, use_cache: bool) -> Result<Self, ConfigError> {
        let dir = dir.into();
        let cache = create_template_cache(&dir)?;
        Ok(Self {
            dir,
            cache: use_cache.then_some(cache),
        })
    }

    /// Fail unless every named page exists
    pub fn verify_pages(&self, names: &[&str]) -> Result<(), ConfigError> {
        let fresh;
        let cache = match &self.cache {
            Some(cache) => cache,
            None => {
                fresh = create_template_cache(&self.dir)?;
                &fresh
            }
        };
        match names.iter().find(|name| !cache.contains(name)) {
            Some(missing) => Err(ConfigError::MissingTemplate(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Render with the given data as-is
    pub fn render_to_string(&self, name: &str, data: &TemplateData) -> Result<String, RenderError> {
        match &self.cache {
            Some(cache) => cache.render(name, data),
            None => create_template_cache(&self.dir)?.render(name, data),
        }
    }

    /// Render a page with the per-request defaults merged in
    pub async fn render(
        &self,
        session: &Session,
        name: &str,
        data: TemplateData,
    ) -> Result<Html<String>, RenderError> {
        let data = add_default_data(data, session).await;
        self.render_to_string(name, &data).map(Html)
    }

    /// Render a page, answering a bare 500 when rendering fails
    pub async fn page(&self, session: &Session, name: &str, data: TemplateData) -> Response {
        match self.render(session, name, data).await {
            Ok(html) => html.into_response(),
            Err(e @ RenderError::MissingTemplate(_)) => {
                tracing::error!(template = name, error = %e, "Template missing from deployment");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Err(e) => {
                tracing::error!(template = name, error = %e, "Failed to render page");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// `YYYY-MM-DD` for dates and timestamps; other values pass through
fn human_date(value: String) -> String {
    if let Ok(date) = parse_date(&value) {
        return format_date(date);
    }
    match DateTime::parse_from_rfc3339(&value) {
        Ok(ts) => format_date(ts.date_naive()),
        Err(_) => value,
    }
}

fn format_date_filter(value: String, layout: String) -> Result<String, minijinja::Error> {
    let date = parse_date(&value)
        .or_else(|_| DateTime::parse_from_rfc3339(&value).map(|ts| ts.date_naive()))
        .map_err(|_| {
            minijinja::Error::new(ErrorKind::InvalidOperation, format!("not a date: {value}"))
        })?;
    format_with(date, &layout)
}

fn format_with(date: NaiveDate, layout: &str) -> Result<String, minijinja::Error> {
    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date layout: {layout}"),
        ));
    }
    Ok(date.format_with_items(items.into_iter()).to_string())
}

/// `0..count`, for loops in templates
fn iterate(count: i64) -> Vec<i64> {
    (0..count.max(0)).collect()
}

fn add(a: i64, b: i64) -> i64 {
    a + b
}
