use shikenotsukurou::libshiken::assembler::{generate_sets, GeneratedSet};
use shikenotsukurou::libshiken::bank::{QuestionBank, Unit};
use shikenotsukurou::libshiken::bankfile::save_bank;
use shikenotsukurou::libshiken::config::PaperConfig;
use shikenotsukurou::libshiken::error::InsufficientPoolWarning;
use shikenotsukurou::libshiken::shitsumon::{Entry, QuestionId, QuestionType, UnitId};
use crate::Error;
use colored::Colorize;
use log::{debug, error};
use std::io::{self, Write};
use std::path::PathBuf;
use text_io::try_read;

const HELP: &str = "\
unit                              add a new unit
add <unit> <type> [text]          add a question (\\n for a line break)
edit <id> <text>                  replace a question's text and answer
paste <unit> <type> [id]          paste blocks separated by blank lines, end with a '.' line
rm <unit> <type> <id>             remove a question or a whole OR-group
group <unit> <type> <id> <id>...  make an OR-group
ungroup <unit> <type> <id>        dissolve an OR-group
show [unit]                       list questions
summary                           count questions per type
generate [sets]                   preview generated sets
export <file>                     write the bank as JSON
help | quit
types: mcq, vshort, short, long";

#[derive(Debug, PartialEq)]
enum Command {
    Unit,
    Add(UnitId, QuestionType, String),
    Edit(QuestionId, String),
    Paste(UnitId, QuestionType, Option<QuestionId>),
    Remove(UnitId, QuestionType, QuestionId),
    Group(UnitId, QuestionType, Vec<QuestionId>),
    Ungroup(UnitId, QuestionType, QuestionId),
    Show(Option<UnitId>),
    Summary,
    Generate(Option<usize>),
    Export(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    fn from_str(input: &str) -> Command {
        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Command::Invalid(String::new());
        };
        let args: Vec<&str> = words.collect();
        match Self::parse(name, &args) {
            Ok(command) => command,
            Err(reason) => Command::Invalid(reason),
        }
    }

    fn parse(name: &str, args: &[&str]) -> Result<Command, String> {
        macro_rules! arg {
            ($idx:expr, $what:expr) => {
                args.get($idx)
                    .ok_or_else(|| format!("missing {}", $what))?
                    .parse()
                    .map_err(|_| format!("invalid {} '{}'", $what, args[$idx]))?
            };
        }
        let rest = |from: usize| args.get(from..).unwrap_or_default().join(" ").replace("\\n", "\n");

        Ok(match name {
            "unit" => Command::Unit,
            "add" => Command::Add(arg!(0, "unit"), arg!(1, "type"), rest(2)),
            "edit" => Command::Edit(arg!(0, "id"), rest(1)),
            "paste" => Command::Paste(
                arg!(0, "unit"),
                arg!(1, "type"),
                match args.get(2) {
                    Some(_) => Some(arg!(2, "id")),
                    None => None,
                },
            ),
            "rm" => Command::Remove(arg!(0, "unit"), arg!(1, "type"), arg!(2, "id")),
            "group" => {
                let ids = args
                    .get(2..)
                    .unwrap_or_default()
                    .iter()
                    .map(|id| id.parse().map_err(|_| format!("invalid id '{id}'")))
                    .collect::<Result<Vec<QuestionId>, String>>()?;
                Command::Group(arg!(0, "unit"), arg!(1, "type"), ids)
            }
            "ungroup" => Command::Ungroup(arg!(0, "unit"), arg!(1, "type"), arg!(2, "id")),
            "show" => Command::Show(match args.first() {
                Some(_) => Some(arg!(0, "unit")),
                None => None,
            }),
            "summary" => Command::Summary,
            "generate" => Command::Generate(match args.first() {
                Some(_) => Some(arg!(0, "number of sets")),
                None => None,
            }),
            "export" => Command::Export(PathBuf::from(args.first().ok_or("missing file")?)),
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}'")),
        })
    }
}

fn read_line() -> Option<String> {
    let line: Result<String, _> = try_read!("{}\n");
    match line {
        Ok(line) => Some(line.trim_end_matches('\r').to_string()),
        Err(err) => {
            debug!("[Shell] Input ended: {:?}", err);
            None
        }
    }
}

fn read_pasted_block() -> String {
    println!("{}", "Paste questions, separate them with a blank line, finish with '.'".cyan());
    let mut lines = Vec::new();
    while let Some(line) = read_line() {
        if line.trim() == "." {
            break;
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn write_summary(w: &mut impl Write, bank: &QuestionBank) -> io::Result<()> {
    let summary = bank.summary();
    writeln!(
        w,
        "{} {}  {} {}  {} {}  {} {}  {} {}",
        "Units:".cyan(),
        summary.units.to_string().bold(),
        "MCQs:".cyan(),
        summary.mcqs.to_string().bold(),
        "Very Short:".cyan(),
        summary.vshorts.to_string().bold(),
        "Short:".cyan(),
        summary.shorts.to_string().bold(),
        "Long:".cyan(),
        summary.longs.to_string().bold(),
    )
}

pub fn write_warnings(w: &mut impl Write, warnings: &[InsufficientPoolWarning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(w, "{} {}", "Warning:".yellow().bold(), warning.to_string().yellow())?;
    }
    Ok(())
}

fn entry_line(entry: &Entry) -> String {
    let separator = format!(" {} ", "OR".bright_magenta().bold());
    entry
        .questions()
        .iter()
        .map(|q| q.text.replace('\n', " "))
        .collect::<Vec<_>>()
        .join(separator.as_str())
}

pub fn write_set(w: &mut impl Write, set: &GeneratedSet) -> io::Result<()> {
    writeln!(w, "{}", format!("──────── Set {} ────────", set.label).cyan().bold())?;
    for question_type in QuestionType::ALL {
        let entries = set.entries(question_type);
        if entries.is_empty() {
            continue;
        }
        writeln!(w, "{}", question_type.title().bold())?;
        for (i, entry) in entries.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, entry_line(entry))?;
        }
    }
    Ok(())
}

fn print_unit(unit_id: UnitId, unit: &Unit) {
    println!("{}", format!("==========> Unit {} <==========", unit_id).cyan());
    for question_type in QuestionType::ALL {
        println!("{} ({})", question_type.title().bold(), question_type);
        for entry in unit.entries(question_type) {
            match entry {
                Entry::Single(q) => {
                    println!("  [{}] {}", q.id.to_string().green(), q.text.replace('\n', " "));
                    if !q.answer.is_empty() {
                        println!("       {}", q.answer.replace('\n', " ").dimmed());
                    }
                }
                Entry::Group(g) => {
                    println!("  [{}] {}", g.id.to_string().bright_magenta(), "OR-group".bright_magenta());
                    for q in &g.questions {
                        println!("     ├ [{}] {}", q.id.to_string().green(), q.text.replace('\n', " "));
                    }
                }
            }
        }
    }
}

fn show(bank: &QuestionBank, unit_id: Option<UnitId>) {
    match unit_id {
        Some(unit_id) => match bank.unit(unit_id) {
            Some(unit) => print_unit(unit_id, unit),
            None => println!("{}", format!("There is no Unit {}!", unit_id).bright_red()),
        },
        None => bank.units().for_each(|(id, unit)| print_unit(id, unit)),
    }
}

/// Line-oriented authoring shell over an in-memory bank.
pub fn author_loop(mut bank: QuestionBank, config: PaperConfig) -> Result<(), Error> {
    if bank.summary().units == 0 {
        let unit = bank.add_unit();
        println!("{}", format!("Created Unit {}.", unit).green());
    }
    println!("{}", "Type 'help' for the list of commands.".cyan());

    loop {
        print!("{} ", "shiken>".cyan().bold());
        io::stdout().flush()?;
        let Some(input) = read_line() else {
            break;
        };
        let command = Command::from_str(&input);
        debug!("command: {:?}", command);

        match command {
            Command::Unit => {
                let unit = bank.add_unit();
                println!("{}", format!("Created Unit {}.", unit).green());
            }
            Command::Add(unit, question_type, text) => match bank.add_question(unit, question_type, &text) {
                Some(id) => println!("{}", format!("Added question {}.", id).green()),
                None => println!("{}", format!("There is no Unit {}!", unit).bright_red()),
            },
            Command::Edit(id, text) => {
                bank.update_question(id, &text);
                match bank.find_question(id) {
                    Some(q) => println!("  [{}] {}", q.id.to_string().green(), q.raw_text().replace('\n', " ")),
                    None => println!("{}", format!("There is no question {}!", id).bright_red()),
                }
            }
            Command::Paste(unit, question_type, target) => {
                let target = match target.or_else(|| bank.add_question(unit, question_type, "")) {
                    Some(target) => target,
                    None => {
                        println!("{}", format!("There is no Unit {}!", unit).bright_red());
                        continue;
                    }
                };
                let block = read_pasted_block();
                let added = bank.bulk_import(unit, question_type, target, &block);
                println!(
                    "{}",
                    format!("Updated question {} and added {} more.", target, added.len()).green()
                );
            }
            Command::Remove(unit, question_type, id) => bank.remove_question(unit, id, question_type),
            Command::Group(unit, question_type, ids) => match bank.group(unit, question_type, &ids) {
                Ok(group) => println!("{}", format!("Created OR-group {}.", group).green()),
                Err(err) => println!("{} {}", "Selection Error:".bright_red().bold(), err),
            },
            Command::Ungroup(unit, question_type, id) => bank.ungroup(unit, id, question_type),
            Command::Show(unit) => show(&bank, unit),
            Command::Summary => write_summary(&mut io::stdout(), &bank)?,
            Command::Generate(sets) => {
                let generation = generate_sets(&bank, sets.unwrap_or(config.sets), &config.sections);
                let mut stdout = io::stdout();
                write_warnings(&mut stdout, &generation.warnings)?;
                for set in &generation.sets {
                    write_set(&mut stdout, set)?;
                }
            }
            Command::Export(path) => match save_bank(&bank, &path) {
                Ok(()) => println!("{}", format!("Saved {}", path.display()).green()),
                Err(err) => {
                    error!("[Shell] Export failed: {}", err);
                    println!("{}", format!("Could not save {}: {}", path.display(), err).bright_red());
                }
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Invalid(reason) => {
                if !reason.is_empty() {
                    println!("{} {}", reason.bright_red(), "(try 'help')".dimmed());
                }
            }
        }
    }

    println!("{}", "Quitting!".cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::from_str("unit"), Command::Unit);
        assert_eq!(
            Command::from_str("add 1 mcq What is 2+2?\\nAnswer: 4"),
            Command::Add(1, QuestionType::MultipleChoice, String::from("What is 2+2?\nAnswer: 4"))
        );
        assert_eq!(
            Command::from_str("add 2 long"),
            Command::Add(2, QuestionType::Long, String::new())
        );
        assert_eq!(
            Command::from_str("group 1 short 3 4 5"),
            Command::Group(1, QuestionType::Short, vec![3, 4, 5])
        );
        assert_eq!(Command::from_str("paste 1 vshort"), Command::Paste(1, QuestionType::VeryShort, None));
        assert_eq!(Command::from_str("paste 1 vshort 7"), Command::Paste(1, QuestionType::VeryShort, Some(7)));
        assert_eq!(Command::from_str("show"), Command::Show(None));
        assert_eq!(Command::from_str("generate 3"), Command::Generate(Some(3)));
        assert_eq!(Command::from_str("export bank.json"), Command::Export(PathBuf::from("bank.json")));
        assert_eq!(Command::from_str("q"), Command::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Command::from_str("   "), Command::Invalid(String::new()));
        assert!(matches!(Command::from_str("add x mcq"), Command::Invalid(r) if r.contains("unit")));
        assert!(matches!(Command::from_str("add 1 essay"), Command::Invalid(r) if r.contains("type")));
        assert!(matches!(Command::from_str("rm 1 mcq"), Command::Invalid(r) if r.contains("missing id")));
        assert!(matches!(Command::from_str("group 1 mcq 2 x"), Command::Invalid(r) if r.contains("'x'")));
        assert!(matches!(Command::from_str("fly"), Command::Invalid(_)));
    }
}
