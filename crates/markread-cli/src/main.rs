//! markread CLI — recognize scanned survey sheets from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use markread::{
    Answer, Calculation, Calibration, FileLoader, QuestionStats, RecognizeOptions, Recognizer,
    ScanPage, SheetStore, Survey,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "markread")]
#[command(about = "Optical mark recognition for scanned paper surveys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the survey definition summary.
    SurveyInfo {
        /// Path to the survey definition (JSON).
        #[arg(long)]
        survey: PathBuf,
    },

    /// Add scanned images to the sheet store.
    Add {
        #[command(flatten)]
        project: ProjectArgs,

        /// Both sides of every page were scanned, even for a simplex
        /// survey; no blank back sides are inserted.
        #[arg(long)]
        duplex_scan: bool,

        /// Scanned images, in scan order. Every page of a TIFF file is added.
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Recognize the sheets in the store.
    Recognize(RecognizeArgs),

    /// Regroup sheets of a shuffled stack by the IDs found with
    /// `recognize --identify`.
    Reorder {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Write box states of every sheet as CSV.
    Export {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print answer statistics of the valid sheets.
    Report {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print the statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct ProjectArgs {
    /// Path to the survey definition (JSON).
    #[arg(long)]
    survey: PathBuf,

    /// Path to the sheet store (JSON). Created on first use.
    #[arg(long)]
    store: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct RecognizeArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Recognize sheets that were recognized before.
    #[arg(long)]
    rerun: bool,

    /// Only resolve page numbers and IDs, leave box data alone.
    #[arg(long)]
    identify: bool,

    /// Calibration overrides (JSON).
    #[arg(long)]
    calibration: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::SurveyInfo { survey } => run_survey_info(&survey),
        Commands::Add {
            project,
            duplex_scan,
            images,
        } => run_add(&project, duplex_scan, &images),
        Commands::Recognize(args) => run_recognize(&args),
        Commands::Reorder { project } => run_reorder(&project),
        Commands::Export { project, out } => run_export(&project, out.as_deref()),
        Commands::Report { project, json } => run_report(&project, json),
    }
}

fn load_project(project: &ProjectArgs) -> CliResult<(Survey, SheetStore)> {
    let survey = Survey::from_json_file(&project.survey)?;
    let store = SheetStore::load(&project.store)?;
    Ok((survey, store))
}

// ── survey-info ────────────────────────────────────────────────────────

fn run_survey_info(path: &Path) -> CliResult<()> {
    let survey = Survey::from_json_file(path)?;
    let defs = &survey.defs;
    let questions = survey
        .questionnaire
        .qobjects
        .iter()
        .filter(|q| q.is_question())
        .count();

    println!("{}", survey.title);
    println!("  survey id:        {} (0x{:08X})", survey.survey_id, survey.survey_id);
    println!("  pages:            {}", survey.page_count());
    println!("  paper:            {}x{} mm", defs.paper_width, defs.paper_height);
    println!("  style:            {:?}", defs.style);
    println!("  check mode:       {:?}", defs.checkmode);
    println!("  duplex:           {}", defs.duplex);
    println!("  images per sheet: {}", survey.images_per_sheet());
    println!("  questions:        {}", questions);
    println!("  boxes:            {}", survey.questionnaire.boxes().count());
    println!("  computed id:      {}", survey.calculate_survey_id());
    match survey.check_settings() {
        Ok(()) => println!("  settings:         ok"),
        Err(e) => println!("  settings:         {}", e),
    }
    if survey.calculate_survey_id() != survey.survey_id {
        tracing::warn!("survey id does not match the questionnaire layout");
    }
    Ok(())
}

// ── add ────────────────────────────────────────────────────────────────

/// Directory that relative scan paths in the store are resolved against.
fn store_dir(store: &Path) -> &Path {
    match store.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn run_add(project: &ProjectArgs, duplex_scan: bool, images: &[PathBuf]) -> CliResult<()> {
    let (survey, mut store) = load_project(project)?;
    let base = store_dir(&project.store);

    let mut pages = Vec::with_capacity(images.len());
    for path in images {
        let count = match markread::raster::page_count(path) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let file = markread::relative_scan_path(path, base)?;
        tracing::debug!("{}: {} pages", file.display(), count);
        pages.extend((0..count).map(|page| ScanPage::new(file.clone(), page)));
    }

    let insert_dummies = !survey.defs.duplex && !duplex_scan;
    let leftover = store.add_scan_pages(&pages, insert_dummies, survey.images_per_sheet());
    store.save(&project.store)?;
    tracing::info!(
        "{} sheets in {}",
        store.sheets.len(),
        project.store.display()
    );
    if !leftover.is_empty() {
        return Err(format!("{} scans do not fill a whole sheet", leftover.len()).into());
    }
    Ok(())
}

// ── recognize ──────────────────────────────────────────────────────────

fn run_recognize(args: &RecognizeArgs) -> CliResult<()> {
    let (survey, mut store) = load_project(&args.project)?;
    let calibration = match &args.calibration {
        Some(path) => Calibration::from_json_file(path)?,
        None => Calibration::default(),
    };
    let loader = FileLoader {
        base_dir: args.project.store.parent().map(Path::to_path_buf),
        threshold: calibration.ink_threshold,
    };
    let recognizer = Recognizer::new(&survey)?
        .with_calibration(calibration)
        .with_loader(loader);

    let options = RecognizeOptions {
        rerun: args.rerun,
        identify: args.identify,
    };
    let reports = recognizer.recognize_store(&mut store, &args.project.store, options)?;

    let invalid = reports.iter().filter(|r| !r.skipped && !r.valid).count();
    tracing::info!(
        "{} sheets processed, {} invalid, results written to {}",
        reports.iter().filter(|r| !r.skipped).count(),
        invalid,
        args.project.store.display()
    );
    Ok(())
}

// ── reorder ────────────────────────────────────────────────────────────

fn run_reorder(project: &ProjectArgs) -> CliResult<()> {
    let (survey, mut store) = load_project(project)?;
    let summary = markread::reorder(&mut store, &survey);
    store.save(&project.store)?;
    if summary.rebuilt > 0 {
        tracing::info!("run `recognize` again to read the {} rebuilt sheets", summary.rebuilt);
    }
    Ok(())
}

// ── export ─────────────────────────────────────────────────────────────

fn csv_field(s: &str) -> String {
    if s.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn run_export(project: &ProjectArgs, out: Option<&Path>) -> CliResult<()> {
    let (_, store) = load_project(project)?;

    let mut csv = String::from("global_id,survey_id,questionnaire_id,box_id,state,quality\n");
    for sheet in store.sheets.iter().filter(|s| s.recognized) {
        let global_id = csv_field(sheet.global_id.as_deref().unwrap_or(""));
        let survey_id = sheet.survey_id.map(|id| id.to_string()).unwrap_or_default();
        let questionnaire_id = csv_field(sheet.questionnaire_id.as_deref().unwrap_or(""));
        for (id, data) in &sheet.data {
            csv.push_str(&format!(
                "{},{},{},{},{},{:.3}\n",
                global_id,
                survey_id,
                questionnaire_id,
                id,
                u8::from(data.state),
                data.quality
            ));
        }
    }

    match out {
        Some(path) => {
            std::fs::write(path, csv)?;
            tracing::info!("box data written to {}", path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

// ── report ─────────────────────────────────────────────────────────────

fn run_report(project: &ProjectArgs, json: bool) -> CliResult<()> {
    let (survey, store) = load_project(project)?;

    let mut calc = Calculation::new(&survey.questionnaire);
    for sheet in store.sheets.iter().filter(|s| s.recognized && s.valid) {
        calc.read(sheet);
    }
    let stats = calc.calculate();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}: {} valid sheets", survey.title, stats.count);
    for q in &stats.questions {
        println!("{} {} ({} answers)", q.id, q.title, q.count);
        match &q.stats {
            QuestionStats::Choice { values, .. } => {
                for (value, ratio) in values {
                    println!("    {:>4}  {:5.1} %", value, ratio * 100.0);
                }
            }
            QuestionStats::Range {
                range_values,
                mean,
                standard_deviation,
                ..
            } => {
                for (value, ratio) in range_values {
                    println!("    {:>4}  {:5.1} %", value, ratio * 100.0);
                }
                println!("    mean {:.2}, standard deviation {:.2}", mean, standard_deviation);
            }
            QuestionStats::Text { filled } => println!("    {} filled", filled),
        }
    }

    // Free-text answers are not aggregated; list the transcribed ones.
    for q in survey.questionnaire.qobjects.iter().filter(|q| q.is_question()) {
        for sheet in store.sheets.iter().filter(|s| s.recognized && s.valid) {
            if let Some(Answer::Text(Some(text), _)) = q.answer(&sheet.data) {
                println!("{} {}: {}", q.id, sheet.global_id.as_deref().unwrap_or("-"), text);
            }
        }
    }
    Ok(())
}
