use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use promo_studio_core::{
    Config, GenerationProvider, PromoStudio, Vibe, View, Wizard, WizardStep,
    catalog::{self, MODELS, VIBES},
    export, init,
};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit status for a run ended by Ctrl-C.
const INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Product photo to upload (PNG or JPEG)
    #[arg(short, long)]
    product: Option<PathBuf>,

    /// Virtual model to use, by name or id
    #[arg(short, long)]
    model: Option<String>,

    /// Content vibe to use, by name or id
    #[arg(short, long)]
    vibe: Option<String>,

    /// Filter the model list by name
    #[arg(short, long)]
    search: Option<String>,

    /// Directory the image and video are saved to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Seconds between video status checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Give up on the video after this many status checks
    #[arg(long)]
    max_checks: Option<u32>,

    /// List available models and exit
    #[arg(long)]
    list_models: bool,

    /// List available vibes and exit
    #[arg(long)]
    list_vibes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let mut args = Args::parse();

    // Handle --list-models / --list-vibes
    if args.list_models {
        println!("Available models:");
        for model in catalog::filter_models(MODELS, args.search.as_deref().unwrap_or("")) {
            println!("  {} ({}): {}", model.name, model.id, model.description);
        }
        return Ok(());
    }
    if args.list_vibes {
        println!("Available vibes:");
        for vibe in VIBES {
            println!("  {} ({}): {}", vibe.name, vibe.id, vibe.description);
        }
        return Ok(());
    }

    // Load config and apply CLI overrides
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(secs) = args.poll_interval {
        if secs == 0 {
            bail!("--poll-interval must be at least 1 second");
        }
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(checks) = args.max_checks {
        if checks == 0 {
            bail!("--max-checks must be at least 1");
        }
        config.max_poll_checks = Some(checks);
    }
    tracing::info!(
        image_model = %config.image_model,
        video_model = %config.video_model,
        "configuration loaded"
    );

    let studio = PromoStudio::with_config(config);
    let mut wizard = studio.wizard().context("Failed to create Gemini client")?;

    if let Some(query) = args.search.take() {
        wizard.set_search_query(query)?;
    }

    let active_run = spawn_interrupt_handler();

    loop {
        render(&wizard.view());

        match wizard.session().step() {
            WizardStep::UploadProduct => {
                let path = match args.product.take() {
                    Some(path) => path,
                    None => match prompt("Product image path (empty to quit)")? {
                        Some(input) if !input.is_empty() => PathBuf::from(input),
                        _ => return Ok(()),
                    },
                };
                // Failures are shown by the next render
                let _ = wizard.upload_file(&path).await;
            }
            WizardStep::SelectModel => {
                let choice = match args.model.take() {
                    Some(choice) => choice,
                    None => match prompt("Model (number or name, /text to search)")? {
                        Some(input) => input,
                        None => return Ok(()),
                    },
                };

                if let Some(query) = choice.strip_prefix('/') {
                    wizard.set_search_query(query)?;
                    continue;
                }

                let listed = wizard.filtered_models();
                let model =
                    pick(&listed, &choice, |m| m.name).or_else(|| catalog::find_model(&choice));
                match model {
                    Some(model) => wizard.select_model(model)?,
                    None => eprintln!("No model matches '{}'.", choice),
                }
            }
            WizardStep::SelectVibe => {
                let choice = match args.vibe.take() {
                    Some(choice) => choice,
                    None => match prompt("Vibe (number or name)")? {
                        Some(input) => input,
                        None => return Ok(()),
                    },
                };

                let listed: Vec<_> = VIBES.iter().collect();
                let vibe =
                    pick(&listed, &choice, |v| v.name).or_else(|| catalog::find_vibe(&choice));
                match vibe {
                    Some(vibe) => generate(&mut wizard, vibe, &active_run).await,
                    None => eprintln!("No vibe matches '{}'.", choice),
                }
            }
            WizardStep::Generating => {
                // select_vibe only returns once generation is over
                bail!("wizard stuck in the generating step");
            }
            WizardStep::ShowResults => {
                save_results(&wizard, &args.out_dir).await;

                match prompt("Create another? [y/N]")? {
                    Some(answer) if answer.eq_ignore_ascii_case("y") => wizard.start_over()?,
                    _ => return Ok(()),
                }
            }
        }
    }
}

/// Ctrl-C cancels the generation whose token is published, or exits the
/// process when none is running.
fn spawn_interrupt_handler() -> watch::Sender<Option<CancellationToken>> {
    let (active, current) = watch::channel(None::<CancellationToken>);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let token = current.borrow().clone();
            match token {
                Some(token) => token.cancel(),
                None => {
                    eprintln!();
                    std::process::exit(INTERRUPTED);
                }
            }
        }
    });
    active
}

/// Runs generation with a spinner fed from the session updates.
async fn generate<P: GenerationProvider>(
    wizard: &mut Wizard<P>,
    vibe: &'static Vibe,
    active_run: &watch::Sender<Option<CancellationToken>>,
) {
    println!(); // Spacer
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Creating {} content...", vibe.name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut updates = wizard.subscribe();
    let progress = spinner.clone();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let message = updates.borrow_and_update().loading_message().to_string();
            if !message.is_empty() {
                progress.set_message(message);
            }
        }
    });

    active_run.send_replace(Some(wizard.cancel_token()));
    let result = wizard.select_vibe(vibe).await;
    active_run.send_replace(None);

    watcher.abort();
    spinner.finish_and_clear();

    if let Err(e) = result {
        tracing::debug!(error = %e, "generation ended with an error");
    }
}

async fn save_results<P: GenerationProvider>(wizard: &Wizard<P>, out_dir: &Path) {
    let content = wizard.session().generated_content();

    if let Err(e) = tokio::fs::create_dir_all(out_dir).await {
        eprintln!("Warning: Could not create {}: {}", out_dir.display(), e);
        return;
    }

    match export::save_image(content, out_dir).await {
        Ok(path) => println!("Image saved to {}", path.display()),
        Err(e) => eprintln!("Warning: Failed to save image: {}", e.user_message()),
    }
    match export::save_video(content, wizard.blobs(), out_dir).await {
        Ok(path) => println!("Video saved to {}", path.display()),
        Err(e) => eprintln!("Warning: Failed to save video: {}", e.user_message()),
    }
}

/// Prints the screen for one wizard step.
fn render(view: &View<'_>) {
    match view {
        View::UploadProduct { error, is_loading } => {
            print_steps(WizardStep::UploadProduct);
            if let Some(error) = error {
                eprintln!("Error: {}", error);
            }
            if *is_loading {
                println!("Processing file...");
            }
            println!("Step 1: Upload your product image (PNG or JPG, up to 10MB).");
        }
        View::SelectModel { models, search_query } => {
            print_steps(WizardStep::SelectModel);
            println!("Step 2: Choose your virtual model.");
            if !search_query.is_empty() {
                println!("Search: '{}'", search_query);
            }
            if models.is_empty() {
                println!("No models match your search.");
            }
            for (i, model) in models.iter().enumerate() {
                println!("  {}. {} - {}", i + 1, model.name, model.description);
            }
        }
        View::SelectVibe { model, vibes } => {
            print_steps(WizardStep::SelectVibe);
            match model {
                Some(model) => println!("Step 3: Choose the vibe for {}.", model.name),
                None => println!("Step 3: Choose the vibe for your content."),
            }
            for (i, vibe) in vibes.iter().enumerate() {
                println!("  {}. {} - {}", i + 1, vibe.name, vibe.description);
            }
        }
        View::Generating { loading_message } => {
            println!("Generating your content... {}", loading_message);
        }
        View::ShowResults { content } => {
            println!("Your promotional content is ready!");
            if let Some(caption) = &content.caption {
                println!();
                println!("Suggested caption: \"{}\"", caption);
            }
            if let Some(video) = &content.video {
                println!("Video: {} ({} bytes)", video.url, video.size);
            }
        }
    }
}

fn print_steps(current: WizardStep) {
    let line: Vec<String> = WizardStep::ALL
        .iter()
        .map(|step| {
            if *step == current {
                format!("[{}]", step.label())
            } else {
                step.label().to_string()
            }
        })
        .collect();
    println!();
    println!("{}", line.join(" > "));
}

/// Resolves a 1-based index into `items`, or an exact name match.
fn pick<T>(items: &[&'static T], choice: &str, name: impl Fn(&T) -> &str) -> Option<&'static T> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| items.get(i)).copied();
    }
    items.iter().copied().find(|item| name(item).eq_ignore_ascii_case(choice))
}

/// Reads one trimmed line from stdin; `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
