use crate::stealth;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use harvest_engine::{DriverError, LaunchOptions, Launcher, PageSession, StealthProfile};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A launched Chromium with its single working page.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, DriverError> {
        let mut config_builder = BrowserConfig::builder();
        config_builder = config_builder.no_sandbox();
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if options.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        }

        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let config = config_builder
            .build()
            .map_err(|e| DriverError::Launch(format!("Failed to build browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(format!("Failed to create page: {}", e)))?;

        apply_stealth(&browser, &page, &options.stealth).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), DriverError> {
        self.browser
            .close()
            .await
            .map_err(|e| DriverError::Launch(format!("Error closing browser: {}", e)))?;
        if let Err(e) = self.handler_task.await {
            tracing::debug!("Error awaiting handler: {}", e);
        }

        if self.cleanup_user_data_dir {
            if let Some(dir) = &self.user_data_dir {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
                }
            }
        }

        Ok(())
    }
}

async fn apply_stealth(
    browser: &Browser,
    page: &Page,
    profile: &StealthProfile,
) -> Result<(), DriverError> {
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        stealth::init_script(profile),
    ))
    .await
    .map_err(|e| DriverError::Launch(format!("Failed to inject stealth script: {}", e)))?;

    let version = browser
        .version()
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to read browser version: {}", e)))?;
    let mut user_agent = SetUserAgentOverrideParams::new(stealth::user_agent(&version.user_agent));
    user_agent.accept_language = Some(profile.languages.join(","));
    user_agent.platform = Some(profile.platform.clone());
    page.execute(user_agent)
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to override user agent: {}", e)))?;
    Ok(())
}

/// Dialogs would block every later evaluation on the page.
async fn accept_dialogs(page: &Page) -> Result<(), DriverError> {
    let mut dialog_events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to subscribe to dialog events: {}", e)))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialog_events.next().await {
            tracing::info!("Dismissing JavaScript dialog: {}", event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn resolve_user_data_dir() -> Result<(PathBuf, bool), DriverError> {
    let io_err = |e: std::io::Error| DriverError::Launch(format!("user-data-dir: {}", e));

    if let Ok(dir) = std::env::var("HARVEST_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path).map_err(io_err)?;
        tracing::info!(
            "Using user data dir from HARVEST_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| DriverError::Launch(format!("System clock error: {}", e)))?
        .as_nanos();
    let unique = format!("harvest-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path).map_err(io_err)?;
    tracing::debug!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}

/// Handle to the page of a launched browser.
///
/// Clones share the browser; closing through any clone closes it for all.
#[derive(Clone)]
pub struct ChromiumSession {
    page: Page,
    client: Arc<Mutex<Option<CdpClient>>>,
}

impl ChromiumSession {
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn ensure_open(&self) -> Result<(), DriverError> {
        if self.client.lock().await.is_none() {
            return Err(DriverError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.ensure_open().await?;
        match self.page.goto(url).await {
            Ok(_) => Ok(()),
            Err(CdpError::Timeout) => Err(DriverError::Timeout(url.to_string())),
            Err(e) => Err(DriverError::Navigation(format!("{}: {}", url, e))),
        }
    }

    async fn close(&self) -> Result<(), DriverError> {
        let client = self.client.lock().await.take();
        match client {
            Some(client) => client.close().await,
            None => Err(DriverError::Closed),
        }
    }
}

/// Launches stealth-configured Chromium instances.
#[derive(Debug, Default, Clone)]
pub struct ChromiumLauncher;

#[async_trait]
impl Launcher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, options: &LaunchOptions) -> Result<ChromiumSession, DriverError> {
        let client = CdpClient::launch(options).await?;
        Ok(ChromiumSession {
            page: client.page.clone(),
            client: Arc::new(Mutex::new(Some(client))),
        })
    }
}
