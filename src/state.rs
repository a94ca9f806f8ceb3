use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::mail::Mailer;
use crate::services::token::TokenService;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub tokens: TokenService,
    pub mailer: Box<dyn Mailer>,
}
