//! Application state shared by every handler

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::BookingRepository;
use crate::email::MailQueue;
use crate::render::Renderer;

/// Where notification e-mails come from and go to
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub from: String,
    pub owner: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Availability store
    pub repo: Arc<dyn BookingRepository>,
    /// Page renderer (template cache)
    pub renderer: Arc<Renderer>,
    /// Notification e-mail queue
    pub mail: MailQueue,
    pub mail_settings: MailSettings,
    /// Secure session cookies
    pub in_production: bool,
    /// Directory served under `/assets`
    pub asset_dir: PathBuf,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        renderer: Renderer,
        mail: MailQueue,
        mail_settings: MailSettings,
    ) -> Self {
        Self {
            repo,
            renderer: Arc::new(renderer),
            mail,
            mail_settings,
            in_production: true,
            asset_dir: PathBuf::from("assets"),
        }
    }

    pub fn with_production(mut self, in_production: bool) -> Self {
        self.in_production = in_production;
        self
    }

    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }
}
