use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::{debug, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod cli;

use shikenotsukurou::libshiken::assembler::{generate_sets, Generation};
use shikenotsukurou::libshiken::bank::QuestionBank;
use shikenotsukurou::libshiken::bankfile::load_bank;
use shikenotsukurou::libshiken::config::PaperConfig;
use shikenotsukurou::libshiken::document::{render, DocumentKind, PageLayout};
use shikenotsukurou::libshiken::error::{BankFileError, ConfigError};

#[derive(Parser, Debug)]
#[command(name = "試験を作ろう！ (Shikenotsukurou!)")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate exam sets from a question bank file
    Generate {
        #[arg(value_name = "BANK")]
        bank: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        sets: Option<usize>,
        /// Skip the answer key even if the config asks for one
        #[arg(long)]
        no_answer_key: bool,
        /// Question paper goes to FILE, the answer key to FILE.key
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[arg(long, default_value = "80")]
        width: usize,
        #[arg(long, default_value = "60")]
        height: usize,
    },
    /// Interactively build a question bank
    Author {
        #[arg(short, long, value_name = "FILE")]
        bank: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("bank: {0}")]
    Bank(#[from] BankFileError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot write output")]
    Io(#[from] io::Error),
}

fn load_config(path: Option<&Path>) -> Result<PaperConfig, Error> {
    match path {
        Some(path) => Ok(PaperConfig::load(path)?),
        None => {
            debug!("[Setup] No config given, using defaults");
            Ok(PaperConfig::default())
        }
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), Error> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            info!("[Export] Wrote {:?}", path);
            println!("{}", format!("Saved {}", path.display()).green());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    match args.command {
        Commands::Generate {
            bank,
            config,
            sets,
            no_answer_key,
            out,
            width,
            height,
        } => {
            let question_bank = load_bank(&bank)?;
            let mut paper = load_config(config.as_deref())?;
            if let Some(sets) = sets {
                paper.sets = sets;
            }
            paper.answer_key &= !no_answer_key;
            paper.validate()?;
            generate(&question_bank, &paper, out.as_deref(), PageLayout { width, height })
        }
        Commands::Author { bank, config } => {
            let question_bank = match bank {
                Some(path) => load_bank(&path)?,
                None => QuestionBank::new(),
            };
            let paper = load_config(config.as_deref())?;
            cli::author_loop(question_bank, paper)
        }
    }
}

fn generate(bank: &QuestionBank, paper: &PaperConfig, out: Option<&Path>, layout: PageLayout) -> Result<(), Error> {
    let generation = generate_sets(bank, paper.sets, &paper.sections);
    match out {
        Some(_) => report(&mut io::stdout(), bank, paper, &generation, true)?,
        // stdout carries the paper itself
        None => report(&mut io::stderr(), bank, paper, &generation, false)?,
    }

    let question_paper = render(&generation.sets, paper, DocumentKind::QuestionPaper, layout);
    write_output(out, &question_paper.to_string())?;
    if paper.answer_key {
        let key = render(&generation.sets, paper, DocumentKind::AnswerKey, layout);
        let key_path = out.map(|path| {
            let mut name = path.as_os_str().to_owned();
            name.push(".key");
            PathBuf::from(name)
        });
        write_output(key_path.as_deref(), &key.to_string())?;
    }
    Ok(())
}

/// Banner, bank summary and pool warnings, plus a preview of every set when
/// `preview` is set.
fn report(
    status: &mut impl Write,
    bank: &QuestionBank,
    paper: &PaperConfig,
    generation: &Generation,
    preview: bool,
) -> io::Result<()> {
    writeln!(
        status,
        "{}",
        format!(
            "==========> {} ({} sets, {} marks) <==========",
            paper.metadata.subject,
            paper.sets,
            paper.max_marks()
        )
        .cyan()
    )?;
    cli::write_summary(status, bank)?;
    cli::write_warnings(status, &generation.warnings)?;
    if preview {
        for set in &generation.sets {
            cli::write_set(status, set)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shikenotsukurou::libshiken::shitsumon::QuestionType;

    fn short_bank() -> QuestionBank {
        let mut bank = QuestionBank::new();
        let unit = bank.add_unit();
        bank.add_question(unit, QuestionType::MultipleChoice, "Only question?\nAnswer: yes");
        bank
    }

    #[test]
    fn report_keeps_warnings_out_of_the_paper() {
        let bank = short_bank();
        let paper = PaperConfig::default();
        let generation = generate_sets(&bank, paper.sets, &paper.sections);
        assert!(!generation.warnings.is_empty());

        let mut status = Vec::new();
        report(&mut status, &bank, &paper, &generation, false).unwrap();
        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Warning:"));
        assert!(status.contains("Units:"));
        assert!(!status.contains("Set A"));

        let question_paper = render(&generation.sets, &paper, DocumentKind::QuestionPaper, PageLayout::default());
        let question_paper = question_paper.to_string();
        assert!(question_paper.contains("Only question?"));
        assert!(!question_paper.contains("Warning:"));
        assert!(!question_paper.contains("Units:"));
    }

    #[test]
    fn report_previews_sets_when_asked() {
        let bank = short_bank();
        let paper = PaperConfig::default();
        let generation = generate_sets(&bank, paper.sets, &paper.sections);
        let mut status = Vec::new();
        report(&mut status, &bank, &paper, &generation, true).unwrap();
        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Set A"));
        assert!(status.contains("Set B"));
    }
}
