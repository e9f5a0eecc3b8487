//! Local dev-server orchestration for the review step.
//!
//! Best effort throughout: a server that never comes up or a browser that
//! cannot be opened degrades the run to "files saved, preview unavailable".

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::component::ComponentName;
use crate::config::DevServerSettings;
use crate::http;

/// Answers whether the server is serving.
pub trait ReadinessProbe {
    fn is_ready(&self) -> bool;
}

/// Starts the server without waiting for it.
pub trait Launcher {
    fn launch(&self) -> io::Result<()>;
}

/// Opens a URL for the user.
pub trait BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// What the pipeline needs from a preview environment.
pub trait PreviewHost {
    /// True once the server answers; false if it never does.
    fn ensure_running(&self) -> bool;
    /// True if the preview page was handed to a browser.
    fn open_preview(&self, component: &ComponentName) -> bool;
}

// ── Production implementations ───────────────────────────────────────────────

/// GET against the server root; only 200 counts as ready.
pub struct HttpProbe {
    url: String,
    agent: ureq::Agent,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: http::agent(timeout),
        }
    }
}

impl ReadinessProbe for HttpProbe {
    fn is_ready(&self) -> bool {
        match self.agent.get(&self.url).call() {
            Ok(response) => response.status().as_u16() == 200,
            Err(e) => {
                tracing::trace!(url = %self.url, error = %e, "probe failed");
                false
            }
        }
    }
}

/// Runs the start command through the platform shell in the app directory,
/// detached. On Unix the shell leads its own process group, so a Ctrl-C
/// aimed at the pipeline does not reach the server. The server is left
/// running after the pipeline exits.
pub struct ProcessLauncher {
    command: String,
    dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(command: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            dir: dir.into(),
        }
    }

    #[cfg(windows)]
    fn shell_command(&self) -> Command {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

        let mut cmd = Command::new("cmd");
        cmd.args(["/C", self.command.as_str()]).creation_flags(CREATE_NEW_CONSOLE);
        cmd
    }

    #[cfg(not(windows))]
    fn shell_command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", self.command.as_str()]);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self) -> io::Result<()> {
        tracing::info!(
            command = %self.command,
            dir = %self.dir.display(),
            "starting dev server"
        );
        self.shell_command()
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// The OS default handler for `http://` URLs.
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

pub struct DevServer {
    url: String,
    probe: Box<dyn ReadinessProbe>,
    launcher: Box<dyn Launcher>,
    browser: Box<dyn BrowserOpener>,
    poll_interval: Duration,
    startup_timeout: Duration,
}

impl DevServer {
    pub fn new(
        url: impl Into<String>,
        probe: Box<dyn ReadinessProbe>,
        launcher: Box<dyn Launcher>,
        browser: Box<dyn BrowserOpener>,
        poll_interval: Duration,
        startup_timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            probe,
            launcher,
            browser,
            poll_interval,
            startup_timeout,
        }
    }

    /// HTTP probe, shell launcher and system browser wired from settings.
    pub fn from_settings(settings: &DevServerSettings, app_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            settings.url.clone(),
            Box::new(HttpProbe::new(
                settings.url.clone(),
                Duration::from_secs(settings.probe_timeout_secs),
            )),
            Box::new(ProcessLauncher::new(settings.start_command.clone(), app_dir)),
            Box::new(SystemBrowser),
            settings.poll_interval(),
            settings.startup_timeout(),
        )
    }

    pub fn preview_url(&self, component: &ComponentName) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), component)
    }

    fn wait_until_ready(&self) -> bool {
        let deadline = Instant::now() + self.startup_timeout;
        while Instant::now() < deadline {
            thread::sleep(self.poll_interval);
            if self.probe.is_ready() {
                return true;
            }
            tracing::debug!(url = %self.url, "dev server not ready yet");
        }
        false
    }
}

impl PreviewHost for DevServer {
    fn ensure_running(&self) -> bool {
        if self.probe.is_ready() {
            tracing::info!(url = %self.url, "dev server already running");
            return true;
        }

        if let Err(e) = self.launcher.launch() {
            tracing::warn!(error = %e, "could not start dev server");
            return false;
        }

        if self.wait_until_ready() {
            tracing::info!(url = %self.url, "dev server is ready");
            true
        } else {
            tracing::warn!(
                url = %self.url,
                timeout_secs = self.startup_timeout.as_secs(),
                "dev server did not start in time"
            );
            false
        }
    }

    fn open_preview(&self, component: &ComponentName) -> bool {
        let url = self.preview_url(component);
        match self.browser.open(&url) {
            Ok(()) => {
                tracing::info!(%url, "preview opened");
                true
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "could not open browser");
                false
            }
        }
    }
}
