use crate::api::resource::Status;
use crate::api::{ApiService, ComplaintFilters};
use crate::config::Config;
use crate::events::network::{Event as NetworkEvent, Handler as NetworkEventHandler};
use crate::events::refresh;
use crate::proxy;
use crate::state::DashboardState;
use anyhow::{anyhow, Result};
use log::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Work requested on the command line.
///
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Health,
    Login {
        email: String,
        password: String,
    },
    Complaints(ComplaintFilters),
    Analytics,
    Dashboard {
        region: Option<String>,
        watch: bool,
    },
    Transition {
        complaint_id: String,
        to: Status,
        note: Option<String>,
    },
    Proxy,
    Config,
}

/// Oversees the API service and runs one command against it.
///
pub struct App {
    config: Config,
    api: Arc<ApiService>,
    state: Arc<Mutex<DashboardState>>,
}

impl App {
    /// Start a new application according to the given configuration and
    /// run `command`, printing its result as JSON.
    ///
    pub async fn start(config: Config, command: Command) -> Result<()> {
        info!("Starting application...");
        match command {
            Command::Proxy => {
                proxy::serve(config.proxy.port, &config.proxy.backend_url).await?;
            }
            Command::Config => print!("{}", config.to_yaml()?),
            Command::Dashboard { region, watch: true } => {
                let app = App::new(config)?;
                app.watch_dashboard(region).await?;
            }
            command => {
                let app = App::new(config)?;
                let output = app.run(command).await?;
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        info!("Exiting application...");
        Ok(())
    }

    pub fn new(config: Config) -> Result<App> {
        let api = ApiService::new(&config.base_url, config.force_demo_mode)?;
        Ok(App {
            config,
            api: Arc::new(api),
            state: Arc::new(Mutex::new(DashboardState::new())),
        })
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    /// Run a one-shot command and return what it produced.
    ///
    pub async fn run(&self, command: Command) -> Result<Value> {
        debug!("Running command {:?}", command);
        let output = match command {
            Command::Health => {
                let response = self.api.health_check().await?;
                json!({
                    "mode": self.api.mode().to_string(),
                    "transport": format!("{:?}", self.api.transport()),
                    "baseUrl": self.api.base_url(),
                    "response": response,
                })
            }
            Command::Login { email, password } => {
                to_value(self.api.login(&email, &password).await?)?
            }
            Command::Complaints(filters) => {
                to_value(self.api.search_complaints(&filters).await?)?
            }
            Command::Analytics => to_value(self.api.get_analytics().await?)?,
            Command::Dashboard { region, .. } => {
                self.refresh_dashboard(region).await?;
                self.dashboard_summary().await?
            }
            Command::Transition {
                complaint_id,
                to,
                note,
            } => self.transition(&complaint_id, to, note.as_deref()).await?,
            Command::Proxy | Command::Config => return Err(anyhow!("Not a one-shot command")),
        };
        Ok(output)
    }

    async fn refresh_dashboard(&self, region: Option<String>) -> Result<()> {
        let handler = NetworkEventHandler::new(&self.state, &self.api).with_region(region);
        if let Err(e) = handler.handle(NetworkEvent::RefreshAll).await {
            warn!("Dashboard refresh incomplete: {}", e);
        }
        Ok(())
    }

    async fn dashboard_summary(&self) -> Result<Value> {
        let state = self.state.lock().await;
        Ok(summary(&state, &self.api))
    }

    /// Refresh the dashboard on the configured interval until Ctrl+C.
    ///
    async fn watch_dashboard(&self, region: Option<String>) -> Result<()> {
        let api = Arc::clone(&self.api);
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        refresh::run(
            Arc::clone(&self.api),
            Arc::clone(&self.state),
            region,
            self.config.refresh_interval(),
            shutdown,
            |state| match serde_json::to_string(&summary(state, &api)) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to render dashboard: {}", e),
            },
        )
        .await
    }

    async fn transition(&self, complaint_id: &str, to: Status, note: Option<&str>) -> Result<Value> {
        let response = self.api.get_complaints(&ComplaintFilters::default()).await?;
        let complaint = response
            .successful_data()
            .and_then(|complaints| complaints.iter().find(|c| c.id == complaint_id))
            .ok_or_else(|| anyhow!("Complaint not found: {}", complaint_id))?;
        let result = self.api.update_complaint_status(complaint, to, note).await?;
        Ok(json!({
            "id": complaint.id,
            "from": complaint.status,
            "to": to,
            "response": result,
        }))
    }
}

fn summary(state: &DashboardState, api: &ApiService) -> Value {
    json!({
        "mode": api.mode().to_string(),
        "refreshedAt": state.last_refresh().map(|t| t.to_rfc3339()),
        "metrics": state.metrics(),
        "unreadNotifications": state.unread_count(),
        "notifications": state.notifications(),
        "analytics": state.analytics(),
    })
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
