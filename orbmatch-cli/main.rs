use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use orbmatch_cli::{
    ArtifactNamer, DateComponent, Headless, ImageMatcher, MatchConfig, MatchMode, OutcomeStatus, SystemClock,
    SystemViewer, Viewer, extract_date_component, get_details_from_json, retention_from_hours, sweep_expired,
};

#[derive(Parser, Debug)]
#[command(name = "orbmatch", version)]
#[command(about = "Match ORB features between two images and label image two")]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete files older than the retention window from a directory
    Sweep {
        dir: PathBuf,
        #[arg(long, default_value_t = 5.0)]
        retention_hours: f64,
    },
    /// Print the entry stored under NUMBER in a JSON object file
    Details { json: PathBuf, number: String },
    /// Print one component of an mm-dd-yyyy date
    Date {
        date: String,
        #[arg(value_parser = ["dd", "mm", "yyyy"])]
        component: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    CrossCheck,
    RatioTest,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Image whose objects are looked for
    #[arg(required = true)]
    image1: Option<PathBuf>,
    /// Image that gets annotated
    #[arg(required = true)]
    image2: Option<PathBuf>,

    /// Output path; generated under the media directory when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    media_dir: Option<PathBuf>,
    /// Added to the generated folder and file names
    #[arg(short, long)]
    keyword: Option<String>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Lowe ratio; implies --mode ratio-test
    #[arg(long)]
    ratio: Option<f32>,
    #[arg(long)]
    max_distance: Option<f32>,

    /// Label for image-one keypoints (repeatable, used cyclically)
    #[arg(short, long = "label")]
    labels: Vec<String>,
    #[arg(long)]
    capitalize: bool,
    /// TrueType font for labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// TOML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    no_display: bool,
    #[arg(long)]
    no_sweep: bool,
    #[arg(long)]
    retention_hours: Option<f64>,
}

impl RunArgs {
    /// Command-line values override the file
    fn apply(&self, config: &mut MatchConfig) {
        if let Some(dir) = &self.media_dir {
            config.output.media_dir = dir.clone();
        }
        match (self.mode, self.ratio) {
            (Some(ModeArg::CrossCheck), _) => config.matcher.mode = MatchMode::CrossCheck,
            (_, Some(ratio)) => config.matcher.mode = MatchMode::RatioTest { ratio },
            (Some(ModeArg::RatioTest), None) => {
                if !matches!(config.matcher.mode, MatchMode::RatioTest { .. }) {
                    config.matcher.mode = MatchMode::ratio_test();
                }
            }
            (None, None) => {}
        }
        if let Some(limit) = self.max_distance {
            config.matcher.max_distance = Some(limit);
        }
        if !self.labels.is_empty() {
            config.annotation.labels = Some(self.labels.clone());
        }
        if self.capitalize {
            config.annotation.capitalize = true;
        }
        if let Some(font) = &self.font {
            config.annotation.font = Some(font.clone());
        }
        if self.no_display {
            config.output.display = false;
        }
        if self.no_sweep {
            config.output.sweep = false;
        }
        if let Some(hours) = self.retention_hours {
            config.output.retention_hours = hours;
        }
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let (Some(image1), Some(image2)) = (&args.image1, &args.image2) else {
        return Err("two image paths are required".into());
    };

    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    log::debug!("{}", config.detector.summary());

    let matcher = ImageMatcher::new(image1, image2, config)?;
    let outcome = matcher.match_objects()?;
    let config = matcher.config();

    let output = match &args.output {
        Some(path) => path.clone(),
        None => {
            let mut namer = ArtifactNamer::new(&config.output.media_dir);
            let path = namer.generate(&stem(image1), &stem(image2), args.keyword.as_deref())?;
            if config.output.sweep {
                if let Some(folder) = path.parent() {
                    let report = sweep_expired(folder, config.output.retention()?, namer.clock());
                    if report.removed + report.failed > 0 {
                        log::info!("Swept {}: {} removed, {} failed", folder.display(), report.removed, report.failed);
                    }
                }
            }
            path
        }
    };

    let viewer: &dyn Viewer = if config.output.display { &SystemViewer } else { &Headless };
    matcher.save_and_display(&outcome, &output, viewer)?;

    match outcome.status {
        OutcomeStatus::Matched => {
            for (label, (x, y)) in &outcome.detected {
                println!("Object: {} found at location ({:.1}, {:.1})", label, x, y);
            }
        }
        OutcomeStatus::NoMatches => println!("No objects matched between the images."),
        OutcomeStatus::EmptyFeatures => println!("No features to match in at least one image."),
    }
    println!("{}", output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Sweep { dir, retention_hours }) => {
            let report = sweep_expired(&dir, retention_from_hours(retention_hours)?, &SystemClock);
            println!("{} removed, {} failed", report.removed, report.failed);
        }
        Some(Command::Details { json, number }) => match get_details_from_json(&json, &number)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("No details found {}", number),
        },
        Some(Command::Date { date, component }) => {
            let component: DateComponent = component.parse()?;
            println!("{}", extract_date_component(&date, component)?);
        }
        None => run(cli.run)?,
    }
    Ok(())
}
