//! The `studyguide quiz` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use studyguide_core::engine::{parse_selection, GradeResult, QuestionView, QuizRunEngine};
use studyguide_core::model::{RunLength, LENGTH_PRESETS};
use studyguide_core::report::RunSummary;
use studyguide_core::session::QuizSession;
use studyguide_core::traits::{BankSource, ModuleInfo, Renderer};
use studyguide_report::html::write_html_report;
use studyguide_sources::config::create_source;
use studyguide_sources::list_modules_or_fallback;

use super::resolve_config;

pub struct QuizArgs {
    pub module: Option<String>,
    pub length: Option<String>,
    pub seed: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub server: Option<String>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
}

/// Console renderer.
struct ConsoleRenderer {
    module: String,
}

impl Renderer for ConsoleRenderer {
    fn show_question(&self, view: &QuestionView) {
        let p = &view.progress;
        println!();
        println!(
            "[{}] Question {} | Seen {}/{} | Remaining {} | Mastered {}%",
            self.module, p.presented, p.unique_seen, p.total, p.remaining, p.percent_mastered
        );
        println!("{}", view.question.stem);
        for option in &view.question.options {
            println!("  {}. {}", option.letter, option.text);
        }
        if view.question.is_multi_select {
            println!("(Select all that apply, e.g. \"A C\")");
        }
        if view.previous_attempts > 0 {
            println!("(Seen before: {} attempt(s))", view.previous_attempts);
        }
    }

    fn show_grade(&self, grade: &GradeResult) {
        if grade.is_correct {
            println!("Correct!");
        } else {
            println!("Incorrect.");
        }
        let answer = grade
            .correct_options
            .iter()
            .map(|o| format!("{}. {}", o.letter, o.text))
            .collect::<Vec<_>>()
            .join("; ");
        println!("Correct answer: {answer}");
        if !grade.rationale.is_empty() {
            println!("Rationale: {}", grade.rationale);
        }
        println!("(Press Enter to continue, q to quit)");
    }

    fn show_summary(&self, summary: &RunSummary) {
        println!();
        println!(
            "Quiz complete! First-try score: {}% ({}/{})",
            summary.first_try_percent, summary.first_try_correct, summary.total
        );
        print_review(summary);
    }
}

pub async fn execute(args: QuizArgs) -> Result<()> {
    let config = resolve_config(args.config, args.data_dir, args.server)?;

    let length = match &args.length {
        Some(text) => text.parse::<RunLength>()?,
        None => config.default_length,
    };

    let source = create_source(&config)?;
    tracing::debug!("using {} bank source", source.name());
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let module = match args.module {
        Some(module) => ModuleInfo::from_file(module),
        None => {
            let modules = list_modules_or_fallback(source.as_ref(), &config.fallback_modules).await;
            match choose_module(&modules, &mut input).await? {
                Some(module) => module,
                None => return Ok(()),
            }
        }
    };

    let raw = fetch(source.as_ref(), &module).await?;

    let engine = match args.seed {
        Some(seed) => QuizRunEngine::seeded(seed),
        None => QuizRunEngine::from_entropy(),
    }
    .with_policy(config.recycle)?
    .with_normalize_options(config.normalize_options())
    .with_module(module.label.clone());

    let renderer = ConsoleRenderer {
        module: module.label.clone(),
    };
    let mut session = QuizSession::new(engine, renderer);
    session
        .start(&raw, length)
        .with_context(|| format!("cannot start quiz on {}", module.label))?;
    eprintln!(
        "Starting {} with {} question(s) (length {length})",
        module.label,
        session.engine().run_set().len()
    );

    let Some(summary) = run_loop(&mut session, &mut input).await? else {
        println!("Quiz ended before mastery.");
        return Ok(());
    };

    if let Some(format) = &args.format {
        let output = args.output.unwrap_or(config.output_dir);
        save_summary(&summary, &output, format)?;
    }

    Ok(())
}

async fn fetch(source: &dyn BankSource, module: &ModuleInfo) -> Result<serde_json::Value> {
    source
        .fetch_bank(&module.file)
        .await
        .with_context(|| format!("failed to load module {}", module.file))
}

/// Drive the session from stdin until mastery or the user quits.
async fn run_loop<R, V>(
    session: &mut QuizSession<R, V>,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<RunSummary>>
where
    R: rand::Rng,
    V: Renderer,
{
    loop {
        if !session.engine().is_graded() {
            let Some(line) = input.next_line().await? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                return Ok(None);
            }

            let selected = parse_selection(line);
            if selected.is_empty() {
                println!("Select at least one answer before submitting.");
                continue;
            }
            if let Some(question) = session.engine().current() {
                let unknown: Vec<char> = selected
                    .iter()
                    .copied()
                    .filter(|&l| question.option(l).is_none())
                    .collect();
                if !unknown.is_empty() {
                    let valid: String = question.options.iter().map(|o| o.letter).collect();
                    println!("Unknown option(s) {unknown:?}; choose from {valid}.");
                    continue;
                }
            }
            session.answer(selected)?;
        } else {
            if let Some(line) = input.next_line().await? {
                if line.trim().eq_ignore_ascii_case("q") {
                    return Ok(None);
                }
            }
            if let Some(summary) = session.next()? {
                return Ok(Some(summary));
            }
        }
    }
}

async fn choose_module(
    modules: &[ModuleInfo],
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<ModuleInfo>> {
    anyhow::ensure!(!modules.is_empty(), "no modules available");

    println!("Modules:");
    for (i, m) in modules.iter().enumerate() {
        println!("  {}. {}", i + 1, m.label);
    }
    let presets: Vec<String> = LENGTH_PRESETS.iter().map(|l| l.to_string()).collect();
    println!("(Lengths: {}; pass --length to change)", presets.join(", "));

    loop {
        println!("Select a module [1-{}]:", modules.len());
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        let picked = match choice.parse::<usize>() {
            Ok(n) if (1..=modules.len()).contains(&n) => Some(modules[n - 1].clone()),
            _ => modules
                .iter()
                .find(|m| m.file == choice || m.label.eq_ignore_ascii_case(choice))
                .cloned(),
        };
        match picked {
            Some(module) => return Ok(Some(module)),
            None => println!("Please select a module from the list."),
        }
    }
}

fn save_summary(summary: &RunSummary, output: &std::path::Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("summary-{timestamp}.json"));
                summary.save_json(&path)?;
                eprintln!("Summary saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("summary-{timestamp}.html"));
                write_html_report(summary, &path)?;
                eprintln!("HTML review: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(())
}

fn print_review(summary: &RunSummary) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Correct answer", "Missed", "Attempts"]);

    for entry in &summary.review {
        let answer = entry
            .correct_options
            .iter()
            .map(|o| format!("{}. {}", o.letter, o.text))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(&entry.stem),
            Cell::new(answer),
            Cell::new(entry.missed),
            Cell::new(entry.attempts),
        ]);
    }

    println!("\nReview (most-missed first):\n{table}");
}
