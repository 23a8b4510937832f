//! Session lifecycle: launch the remote-desktop client, sign in, resize and
//! sign out.

use crate::config::{Settings, CITRIX_HUSK, CITRIX_VIEWER};
use crate::pacing::{pause, Pacing};
use crate::platforms::{AutomationEngine, Key};
use crate::portal::{self, BrowserOptions, ChromeBrowser, PortalPage};
use crate::preflight::{poll_until, wait_for_apps, PollConfig};
use crate::AutomationError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, instrument, warn};

/// Extension of the Citrix launch file served by the web portal.
pub const LAUNCH_FILE_EXTENSION: &str = "ica";

/// Slack for filesystems whose timestamps lag the wall clock.
const MTIME_SLACK: Duration = Duration::from_secs(2);

/// Offset of the zoom button from the top-right corner of the viewer window.
const ZOOM_BUTTON_OFFSET: (i32, i32) = (60, 15);

/// Type the stored credentials into the security dialog once the client
/// processes are up.
///
/// Fails with [`AutomationError::MissingEnvironment`] before any input when
/// credentials are missing.
#[instrument(skip_all)]
pub fn login(
    engine: &dyn AutomationEngine,
    settings: &Settings,
    poll: PollConfig,
    pacing: &Pacing,
) -> Result<(), AutomationError> {
    let credentials = settings.require_credentials()?;
    info!("Credentials check: username and password found");

    wait_for_apps(engine, &[CITRIX_VIEWER, CITRIX_HUSK], poll)?;
    info!("Waiting {:?} for the sign-in dialog to settle", pacing.login_settle);
    pause(pacing.login_settle);

    engine.activate_application(CITRIX_HUSK)?;
    pause(pacing.activation);

    engine.type_text(&credentials.username)?;
    pause(pacing.keystroke);
    engine.press_key(Key::Tab)?;
    pause(pacing.keystroke);
    engine.type_text(&credentials.password)?;
    pause(pacing.keystroke);
    engine.press_key(Key::Return)?;

    info!("Login sequence executed");
    Ok(())
}

/// Sign out of and quit the viewer. Nothing to do when it is not running.
#[instrument(skip_all)]
pub fn quit(engine: &dyn AutomationEngine) -> Result<(), AutomationError> {
    match engine.is_process_running(CITRIX_VIEWER) {
        Ok(false) => {
            info!("{} is not running. No action needed.", CITRIX_VIEWER);
            return Ok(());
        }
        Ok(true) => {}
        Err(e) => warn!("Error checking if {} is running: {}", CITRIX_VIEWER, e),
    }

    engine.quit_application(CITRIX_VIEWER)?;
    info!("Quit {}", CITRIX_VIEWER);
    Ok(())
}

/// Click the zoom button of the viewer's front window.
#[instrument(skip_all)]
pub fn resize(engine: &dyn AutomationEngine, pacing: &Pacing) -> Result<(), AutomationError> {
    engine.activate_application(CITRIX_VIEWER)?;
    pause(pacing.activation);

    let bounds = engine.window_bounds(CITRIX_VIEWER)?;
    let x = bounds.x + bounds.width - ZOOM_BUTTON_OFFSET.0;
    let y = bounds.y + ZOOM_BUTTON_OFFSET.1;
    info!(?bounds, "Clicking zoom button at ({}, {})", x, y);
    engine.click(x, y)
}

/// Sign in to the web portal, download the launch file and open it with the
/// system default application. Returns the saved launch file.
///
/// Fails with [`AutomationError::MissingEnvironment`] before a browser is
/// started when credentials are missing.
#[instrument(skip_all)]
pub fn launch(
    engine: &dyn AutomationEngine,
    settings: &Settings,
    poll: PollConfig,
) -> Result<PathBuf, AutomationError> {
    launch_with(engine, settings, poll, |settings| {
        let options = BrowserOptions {
            executable: settings.browser_path.clone(),
            headless: settings.headless,
            ..BrowserOptions::default()
        };
        ChromeBrowser::launch(&settings.base_url, &options, poll)
    })
}

/// [`launch`] with the portal page supplied by `open_portal`, which is called
/// with the settings once credentials are known to be present.
pub fn launch_with<P, F>(
    engine: &dyn AutomationEngine,
    settings: &Settings,
    poll: PollConfig,
    open_portal: F,
) -> Result<PathBuf, AutomationError>
where
    P: PortalPage,
    F: FnOnce(&Settings) -> Result<P, AutomationError>,
{
    let credentials = settings.require_credentials()?;
    info!("Credentials check: username and password found");
    fs::create_dir_all(&settings.download_dir)?;
    let started = SystemTime::now() - MTIME_SLACK;

    info!("Navigating to {}", settings.base_url);
    let page = open_portal(settings)?;
    page.allow_downloads(&settings.download_dir)?;
    portal::sign_in(&page, credentials, poll)?;
    portal::request_launch_file(&page, &settings.app_link, poll)?;

    let downloaded = wait_for_launch_file(&settings.download_dir, started, poll)?;
    drop(page);

    let file = settings.download_dir.join(launch_file_name(SystemTime::now()));
    fs::rename(&downloaded, &file)?;
    info!("Download completed successfully to: {}", file.display());

    engine.open_path(&file.to_string_lossy())?;
    Ok(file)
}

fn wait_for_launch_file(
    dir: &Path,
    since: SystemTime,
    poll: PollConfig,
) -> Result<PathBuf, AutomationError> {
    info!(
        "Waiting for a .{} file in {}",
        LAUNCH_FILE_EXTENSION,
        dir.display()
    );
    let mut found = None;
    poll_until(poll, |_| {
        match newest_launch_file(dir, since) {
            Ok(file) => found = file,
            Err(e) => warn!("Cannot read {}: {}", dir.display(), e),
        }
        found.is_some()
    });
    found.ok_or_else(|| {
        AutomationError::Timeout(format!(
            "No new .{LAUNCH_FILE_EXTENSION} file appeared in {}",
            dir.display()
        ))
    })
}

/// `PowerChart-<unix seconds>.ica`, so repeated launches never collide.
pub fn launch_file_name(at: SystemTime) -> String {
    let secs = at
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("PowerChart-{secs}.{LAUNCH_FILE_EXTENSION}")
}

/// Most recently modified launch file in `dir` that is not older than
/// `since`.
pub fn newest_launch_file(
    dir: &Path,
    since: SystemTime,
) -> Result<Option<PathBuf>, AutomationError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_launch_file = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(LAUNCH_FILE_EXTENSION));
        if !is_launch_file {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < since {
            continue;
        }
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}
