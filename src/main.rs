use std::error::Error;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::{Parser, Subcommand};

use web_harness::events::DEFAULT_LOG_DIR;
use web_harness::runner::REPORTS_DIR;
use web_harness::{HarnessError, RunConfig, Scenario, SessionHandle, SuiteRunner};

/// Web Harness - Browser UI testing with WebDriver session management
#[derive(Parser, Debug)]
#[command(
    name = "web-harness",
    about = "Browser UI testing with WebDriver session management and failure capture"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in smoke suite against the configured page
    Run {
        /// Configuration file name (base name, resolved in the config directory)
        #[arg(short = 'c', long = "config")]
        config: Option<String>,

        /// Directory containing the configuration file
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,

        /// Directory report artifacts are written to
        #[arg(long, default_value = REPORTS_DIR)]
        reports_dir: PathBuf,

        /// Directory the session log is written to
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,
    },
}

/// Navigate to the page under test and check that it rendered a title.
struct HomePageSmoke {
    page: String,
}

#[async_trait]
impl Scenario for HomePageSmoke {
    fn name(&self) -> &str {
        "loads_home_page"
    }

    fn suite(&self) -> &str {
        "Smoke"
    }

    async fn run(&self, session: &SessionHandle) -> Result<(), HarnessError> {
        session.goto(&self.page).await?;
        let title = session.title().await?;
        if title.trim().is_empty() {
            return Err(HarnessError::assertion(format!(
                "page {} rendered an empty title",
                self.page
            )));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    match args.command {
        Some(Commands::Run {
            config,
            config_dir,
            reports_dir,
            log_dir,
        }) => {
            if let Err(err) = run(config.as_deref(), &config_dir, reports_dir, &log_dir).await {
                eprintln!("Run failed: {}", err);
                std::process::exit(1);
            }
        }
        None => {
            println!("web-harness - Browser UI testing with WebDriver session management");
            println!();
            println!("Usage: web-harness <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run   Run the built-in smoke suite against the configured page");
            println!();
            println!("Run with --help for more information.");
        }
    }
}

async fn run(
    config_name: Option<&str>,
    config_dir: &Path,
    reports_dir: PathBuf,
    log_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    match web_harness::init_file_logging(log_dir) {
        Ok(path) => println!("Session log: {}", path.display()),
        Err(err) => eprintln!("Warning: session log unavailable: {}", err),
    }

    let config = RunConfig::load(config_dir, config_name)?;
    let scenarios: Vec<Box<dyn Scenario>> = vec![Box::new(HomePageSmoke {
        page: config.tested_page.clone(),
    })];

    let summary = SuiteRunner::new(config)
        .with_reports_dir(reports_dir)
        .run(&scenarios)
        .await?;

    println!(
        "Run completed: {} passed, {} failed ({} tests)",
        summary.passed(),
        summary.failed(),
        summary.entries.len()
    );
    println!("HTML report: {}", summary.html_path.display());
    println!("XML report:  {}", summary.xml_path.display());

    if !summary.success() {
        std::process::exit(1);
    }
    Ok(())
}
