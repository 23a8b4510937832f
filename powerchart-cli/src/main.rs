//! PowerChart CLI
//!
//! Runs the session scripts (launch, login, resize, quit) and single
//! navigation actions against a PowerChart session in Citrix Viewer.
//!
//! Usage:
//!   powerchart launch                      # Sign in to the portal and open the downloaded .ica file
//!   powerchart login                       # Type CERNER_USERNAME / CERNER_PASSWORD into the sign-in dialog
//!   powerchart navigate home "Patient List"
//!   powerchart workflow check_patient_details --out-dir captures/
//!   powerchart quit                        # Sign out and quit Citrix Viewer

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use powerchart::config::CITRIX_VIEWER;
use powerchart::{
    create_engine, drag_and_hold, session, wait_for_apps, AutomationEngine, CoordinateTable,
    Navigator, Pacing, Point, PollConfig, ScrollDirection, Settings, WorkflowRunner,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "powerchart")]
#[command(about = "🏥 PowerChart CLI - coordinate-driven EHR automation through Citrix")]
struct Cli {
    /// Coordinates file to load before searching the default locations
    #[arg(long, global = true, env = "POWERCHART_COORDINATES")]
    coordinates: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct PollArgs {
    /// Seconds between checks
    #[arg(long, default_value_t = 1)]
    interval_secs: u64,

    /// Number of checks before giving up
    #[arg(long, default_value_t = 40)]
    attempts: u32,
}

impl PollArgs {
    fn config(&self) -> PollConfig {
        PollConfig::new(Duration::from_secs(self.interval_secs), self.attempts)
    }
}

#[derive(Parser, Debug)]
struct ElementArgs {
    /// Section of PowerChart where the element is located
    section: String,
    /// Name of the UI element (case-insensitive)
    element: String,
    /// Subsection for sections that have them
    #[arg(long, short)]
    subsection: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the web portal, download the .ica file and open it
    Launch {
        #[command(flatten)]
        poll: PollArgs,
        /// Show the browser window instead of running it headless
        #[arg(long)]
        show_browser: bool,
    },
    /// Sign in to the security dialog once Citrix Viewer is up
    Login(PollArgs),
    /// Click the zoom button of the Citrix Viewer window
    Resize,
    /// Sign out and quit Citrix Viewer
    Quit,
    /// Wait until the named processes are running
    WaitForApps {
        /// Process names (defaults to the Citrix Viewer processes)
        apps: Vec<String>,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Press, drag, hold and release the left mouse button
    Drag {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        /// Seconds spent moving from start to end
        #[arg(long, default_value_t = 2.0)]
        drag_secs: f64,
        /// Seconds to hold at the end before releasing
        #[arg(long, default_value_t = 3.0)]
        hold_secs: f64,
        /// Application brought to the front first
        #[arg(long, default_value = CITRIX_VIEWER)]
        app: String,
    },
    /// Click a named element
    Navigate(ElementArgs),
    /// Double-click a named element
    DoubleClick(ElementArgs),
    /// Click a section's scroll button
    Scroll {
        section: String,
        /// up or down
        direction: ScrollDirection,
        #[arg(long, default_value_t = 1)]
        clicks: u32,
    },
    /// Save a PNG of a named screen section
    Capture {
        section: String,
        /// Output file (defaults to <section>.png)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Double-click a patient in the patient list by position
    Patient { position: u32 },
    /// Run a predefined workflow
    Workflow {
        name: String,
        /// Directory for captured sections
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List the workflows that can be run
    Workflows,
    /// List sections and screenshot sections
    Sections,
    /// Show the coordinates of one section
    Coordinates { section: String },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    Settings::load_dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "❌".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::from_env();
    let engine = create_engine();
    let coordinates = cli
        .coordinates
        .clone()
        .or_else(|| settings.coordinates_path.clone());

    match cli.command {
        Commands::Launch { poll, show_browser } => {
            if show_browser {
                settings.headless = false;
            }
            let file = session::launch(engine.as_ref(), &settings, poll.config())
                .context("Failed to launch PowerChart")?;
            success(&format!("Opened {}", file.display()));
        }
        Commands::Login(poll) => {
            session::login(engine.as_ref(), &settings, poll.config(), &Pacing::default())
                .context("PowerChart login failed")?;
            success("PowerChart login successful");
        }
        Commands::Resize => {
            session::resize(engine.as_ref(), &Pacing::default())
                .context("Failed to resize Citrix Viewer")?;
            success("Resize operation complete");
        }
        Commands::Quit => {
            session::quit(engine.as_ref()).context("PowerChart quit failed")?;
            success("PowerChart quit successful");
        }
        Commands::WaitForApps { apps, poll } => {
            let apps: Vec<&str> = if apps.is_empty() {
                vec![CITRIX_VIEWER, powerchart::config::CITRIX_HUSK]
            } else {
                apps.iter().map(String::as_str).collect()
            };
            wait_for_apps(engine.as_ref(), &apps, poll.config())?;
            success("All required applications are now running");
        }
        Commands::Drag {
            from_x,
            from_y,
            to_x,
            to_y,
            drag_secs,
            hold_secs,
            app,
        } => {
            drag_and_hold(
                engine.as_ref(),
                &app,
                Point::new(from_x, from_y),
                Point::new(to_x, to_y),
                seconds(drag_secs)?,
                seconds(hold_secs)?,
                &Pacing::default(),
            )
            .context("Drag failed")?;
            success("Sequence completed");
        }
        Commands::Navigate(args) => {
            let navigator = navigator(coordinates.as_deref(), engine);
            report(navigator.navigate(&args.section, &args.element, args.subsection.as_deref()))?;
        }
        Commands::DoubleClick(args) => {
            let navigator = navigator(coordinates.as_deref(), engine);
            report(navigator.double_click(
                &args.section,
                &args.element,
                args.subsection.as_deref(),
            ))?;
        }
        Commands::Scroll {
            section,
            direction,
            clicks,
        } => {
            let navigator = navigator(coordinates.as_deref(), engine);
            report(navigator.scroll(&section, direction, clicks))?;
        }
        Commands::Capture { section, out } => {
            let navigator = navigator(coordinates.as_deref(), engine);
            let png = match navigator.capture_section(&section) {
                Ok(png) => png,
                Err(message) => bail!(message),
            };
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{section}.png")));
            write_png(&out, &png)?;
            success(&format!("Saved {} to {}", section, out.display()));
        }
        Commands::Patient { position } => {
            let navigator = navigator(coordinates.as_deref(), engine);
            report(navigator.click_patient_from_list(position))?;
        }
        Commands::Workflow { name, out_dir } => {
            let runner = WorkflowRunner::new(navigator(coordinates.as_deref(), engine));
            let report = match runner.perform(&name) {
                Ok(report) => report,
                Err(message) => bail!(message),
            };
            println!("{report}");
            if let Some(dir) = out_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                for (i, capture) in report.captures.iter().enumerate() {
                    let path = dir.join(format!("{:02}-{}.png", i + 1, capture.section));
                    write_png(&path, &capture.png)?;
                    println!("  {} {}", "saved".dimmed(), path.display());
                }
            }
        }
        Commands::Workflows => {
            let runner = WorkflowRunner::new(navigator(coordinates.as_deref(), engine));
            for name in runner.workflow_names() {
                println!("- {name}");
            }
        }
        Commands::Sections => {
            print!("{}", CoordinateTable::discover(coordinates.as_deref()).list_sections());
        }
        Commands::Coordinates { section } => {
            print!(
                "{}",
                CoordinateTable::discover(coordinates.as_deref()).describe_section(&section)
            );
        }
    }

    Ok(())
}

fn navigator(coordinates: Option<&Path>, engine: Arc<dyn AutomationEngine>) -> Navigator {
    Navigator::new(Arc::new(CoordinateTable::discover(coordinates)), engine)
}

/// Print a dispatcher message; `Error:` messages fail the command.
fn report(message: String) -> Result<()> {
    if message.starts_with("Error:") {
        bail!(message);
    }
    success(&message);
    Ok(())
}

fn success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid duration: {value}"))
}

fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_direction_is_parsed_from_the_command_line() {
        let cli = Cli::try_parse_from(["powerchart", "scroll", "labs", "DOWN", "--clicks", "3"])
            .unwrap();
        match cli.command {
            Commands::Scroll {
                section,
                direction,
                clicks,
            } => {
                assert_eq!(section, "labs");
                assert_eq!(direction, ScrollDirection::Down);
                assert_eq!(clicks, 3);
            }
            _ => panic!("expected scroll"),
        }
        assert!(Cli::try_parse_from(["powerchart", "scroll", "labs", "left"]).is_err());
    }

    #[test]
    fn drag_defaults_match_the_session_script() {
        let cli = Cli::try_parse_from(["powerchart", "drag", "586", "410", "1090", "1163"]).unwrap();
        match cli.command {
            Commands::Drag {
                drag_secs,
                hold_secs,
                app,
                ..
            } => {
                assert_eq!(drag_secs, 2.0);
                assert_eq!(hold_secs, 3.0);
                assert_eq!(app, CITRIX_VIEWER);
            }
            _ => panic!("expected drag"),
        }
    }

    #[test]
    fn launch_can_show_the_browser() {
        let cli = Cli::try_parse_from(["powerchart", "launch", "--show-browser", "--attempts", "5"])
            .unwrap();
        match cli.command {
            Commands::Launch { poll, show_browser } => {
                assert!(show_browser);
                assert_eq!(poll.attempts, 5);
            }
            _ => panic!("expected launch"),
        }
    }

    #[test]
    fn dispatcher_errors_fail_the_command() {
        assert!(report("Clicked on Pink A (coordinates: 1, 2)".to_string()).is_ok());
        assert!(report("Error: Could not find patient at position 9".to_string()).is_err());
    }

    #[test]
    fn negative_durations_are_rejected() {
        assert!(seconds(-1.0).is_err());
        assert_eq!(seconds(0.5).unwrap(), Duration::from_millis(500));
    }
}
