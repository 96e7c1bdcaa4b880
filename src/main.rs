use anyhow::Context;
use clap::Parser;
use listing_autofill::{
    BrowserConfig, ChannelSink, Config, EokaHost, HttpFetcher, ListingDraft, ListingPipeline,
    Params, Phase, PhaseOutcome, PipelineSettings,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "listing-autofill")]
#[command(about = "Fill a marketplace new-listing form from a draft")]
#[command(version)]
struct Cli {
    /// Site config file
    config: PathBuf,

    /// Listing draft (YAML or JSON)
    #[arg(short, long)]
    draft: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config and draft without running
    #[arg(long)]
    check: bool,

    /// Click the submit control once it is enabled (overrides config)
    #[arg(long)]
    submit: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

async fn launch(config: &BrowserConfig) -> listing_autofill::Result<eoka::Browser> {
    let stealth = eoka::StealthConfig {
        headless: config.headless,
        proxy: config.proxy.clone(),
        user_agent: config.user_agent.clone(),
        viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
        viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
        ..Default::default()
    };
    debug!(
        "Launching browser (headless: {}, proxy: {:?})",
        config.headless, config.proxy
    );
    Ok(eoka::Browser::launch_with_config(stealth).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let params = Params::from_args(&cli.params)?;
    let mut config = Config::load_with_params(&cli.config, &params)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let draft = ListingDraft::load(&cli.draft)
        .with_context(|| format!("loading draft {}", cli.draft.display()))?;

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        if let Some(ref needle) = config.target.url_contains {
            println!("  Runs on URLs containing: {}", needle);
        }
        println!("  Auto submit: {}", config.auto_submit);
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        println!("Draft valid: {}", draft.title);
        println!("  Price: {}", draft.price);
        println!(
            "  Condition: {} -> {}",
            draft.condition,
            config.conditions.label_for(&draft.condition)
        );
        println!(
            "  Unknown conditions map to: {}",
            config.conditions.default_label()
        );
        println!("  Images: {}", draft.images.len());
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }
    if cli.submit {
        config.auto_submit = true;
    }

    println!("Running: {}", config.name);

    let fetcher = HttpFetcher::with_timeout(config.timings.fetch_timeout())
        .context("Failed to build HTTP client")?;
    let browser = launch(&config.browser).await?;
    let page = browser.new_page(&config.target.url).await?;

    let url = page.url().await?;
    if !config.target.matches(&url) {
        println!("✗ Not a listing page: {}", url);
        browser.close().await?;
        std::process::exit(1);
    }
    tokio::time::sleep(config.timings.start_delay()).await;

    let host = EokaHost::new(&page);
    let settings = PipelineSettings::from_config(&config);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let run = async {
        let pipeline = ListingPipeline::new(&host, &fetcher, ChannelSink::new(tx), settings);
        pipeline.start(&draft, &config.selectors).await
    };
    // ends when the pipeline (and with it the sender) is dropped
    let overlay = async {
        while let Some(status) = rx.recv().await {
            // keep the last outcome on screen
            if status.phase == Phase::Unblocked {
                continue;
            }
            if let Err(e) = host.show_status(&status.message).await {
                debug!("status overlay: {}", e);
            }
        }
    };
    let (outcome, ()) = tokio::join!(run, overlay);

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let _ = browser.close().await;
            return Err(e).context("listing run failed");
        }
    };

    println!();
    if result.reached_readiness {
        println!("✓ Ready");
    } else {
        println!("✗ Not ready");
    }
    for report in &result.phases {
        match &report.outcome {
            PhaseOutcome::Done(detail) => println!("  {}: {}", report.phase, detail),
            PhaseOutcome::Skipped(reason) => println!("  {}: skipped, {}", report.phase, reason),
        }
    }
    println!("  Submitted: {}", if result.submitted { "yes" } else { "no" });

    if result.reached_readiness && !result.submitted && !config.browser.headless {
        println!();
        println!("Form left open for review. Press Ctrl+C to close the browser.");
        tokio::signal::ctrl_c().await?;
    }

    browser.close().await?;

    if !result.reached_readiness {
        std::process::exit(1);
    }

    Ok(())
}
