use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};

use crate::panel::Panel;
use crate::protocol::ClientEvent;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<crate::config::Config>,
    pub panel: Arc<Mutex<Panel>>,
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub started_at: Instant,
}
