use clap::{Args, Parser, Subcommand, ValueEnum};
use renamer_core::{factory, DateFormats, Mode, Rule};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "renamer")]
#[command(version)]
#[command(about = "Batch rename files with ordered regex rules")]
#[command(long_about = "A CLI tool that renames batches of files by folding an ordered chain of \
    regex rules over each file name. Replacement templates support placeholders such as {index}, \
    {date} and {upper}, and every run can be saved and later retried or undone.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub formats: FormatArgs,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    #[arg(
        long,
        global = true,
        env = "RENAMER_DATE_FORMAT",
        default_value = "YYYY-MM-DD",
        help = "Pattern used by {date}"
    )]
    pub date_format: String,

    #[arg(
        long,
        global = true,
        env = "RENAMER_TIME_FORMAT",
        default_value = "HH:mm:ss",
        help = "Pattern used by {time}"
    )]
    pub time_format: String,

    #[arg(
        long,
        global = true,
        env = "RENAMER_DATETIME_FORMAT",
        default_value = "YYYY-MM-DD_HH:mm:ss",
        help = "Pattern used by {datetime}"
    )]
    pub datetime_format: String,
}

impl FormatArgs {
    pub fn to_formats(&self) -> DateFormats {
        DateFormats {
            date: self.date_format.clone(),
            time: self.time_format.clone(),
            datetime: self.datetime_format.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Normal,
    Error,
    Undo,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => Mode::Normal,
            ModeArg::Error => Mode::ErrorRetry,
            ModeArg::Undo => Mode::Undo,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generate and apply renames for a set of files")]
    Run {
        #[arg(
            short,
            long,
            required = true,
            value_delimiter = ',',
            help = "Files or directories to rename"
        )]
        path: Vec<PathBuf>,

        #[arg(long, help = "Only include file names matching this glob")]
        pattern: Option<String>,

        #[arg(short, long, help = "Walk directories recursively")]
        recursive: bool,

        #[arg(long, conflicts_with = "rule", help = "JSON file containing the rule array")]
        rule_file: Option<PathBuf>,

        #[arg(long, help = "Inline JSON rule array")]
        rule: Option<String>,

        #[arg(long, help = "Perform a dry run without making changes")]
        dry_run: bool,

        #[arg(long, help = "Let rules rewrite the file extension too")]
        process_extension: bool,

        #[arg(short, long, help = "Write the results JSON to this file")]
        output: Option<PathBuf>,

        #[arg(long, help = "Write an old_path,new_path CSV plan to this file")]
        plan: Option<PathBuf>,

        #[arg(short, long, help = "Interactive mode - prompt for each rename")]
        interactive: bool,
    },

    #[command(about = "Replay a saved results file or CSV plan")]
    Apply {
        #[arg(short, long, help = "Results JSON or .csv plan to apply")]
        mapping: PathBuf,

        #[arg(
            long,
            value_enum,
            help = "Which entries to process [default: error, or normal for a .csv plan]"
        )]
        mode: Option<ModeArg>,

        #[arg(long, help = "Perform a dry run without making changes")]
        dry_run: bool,

        #[arg(short, long, help = "Write the results JSON to this file")]
        output: Option<PathBuf>,

        #[arg(short, long, help = "Interactive mode - prompt for each rename")]
        interactive: bool,
    },

    #[command(about = "Build a common rule and print it as JSON")]
    Rule {
        #[command(subcommand)]
        kind: RuleKind,

        #[arg(long, global = true, help = "Append the rule to this rules file instead of printing")]
        append: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RuleKind {
    AddPrefix { text: String },
    AddSuffix { text: String },
    AddAfterPattern { pattern: String, text: String },
    AddBeforePattern { pattern: String, text: String },
    AddAtPosition { position: usize, text: String },
    AddBeforeLastN { count: usize, text: String },
    RemovePattern { pattern: String },
    RemoveNumbers,
    RemoveSpaces,
    RemoveLetters,
    RemoveAtPosition { position: usize },
    RemoveFromEnd { count: usize },
    RemoveRange { start: usize, end: usize },
    RemoveBetweenDelimiters { open: String, close: String },
    RemoveWithDelimiters { open: String, close: String },
    ReplacePattern { pattern: String, replacement: String },
    ReplaceSpaces { replacement: String },
    ReplaceNumbers { replacement: String },
    ReplaceLetters { replacement: String },
    ReplaceAtPosition { position: usize, replacement: String },
    ReplaceRange { start: usize, end: usize, replacement: String },
    ReplaceBetweenDelimiters { open: String, close: String, replacement: String },
    #[command(about = "A rule with an arbitrary name, pattern and template")]
    Custom { name: String, pattern: String, replace: String },
}

impl RuleKind {
    pub fn build(&self) -> Rule {
        match self {
            Self::AddPrefix { text } => factory::add_prefix(text),
            Self::AddSuffix { text } => factory::add_suffix(text),
            Self::AddAfterPattern { pattern, text } => factory::add_after_pattern(pattern, text),
            Self::AddBeforePattern { pattern, text } => factory::add_before_pattern(pattern, text),
            Self::AddAtPosition { position, text } => factory::add_at_position(*position, text),
            Self::AddBeforeLastN { count, text } => factory::add_before_last_n(*count, text),
            Self::RemovePattern { pattern } => factory::remove_pattern(pattern),
            Self::RemoveNumbers => factory::remove_numbers(),
            Self::RemoveSpaces => factory::remove_spaces(),
            Self::RemoveLetters => factory::remove_letters(),
            Self::RemoveAtPosition { position } => factory::remove_at_position(*position),
            Self::RemoveFromEnd { count } => factory::remove_from_end(*count),
            Self::RemoveRange { start, end } => factory::remove_range(*start, *end),
            Self::RemoveBetweenDelimiters { open, close } => {
                factory::remove_between_delimiters(open, close)
            }
            Self::RemoveWithDelimiters { open, close } => {
                factory::remove_with_delimiters(open, close)
            }
            Self::ReplacePattern { pattern, replacement } => {
                factory::replace_pattern(pattern, replacement)
            }
            Self::ReplaceSpaces { replacement } => factory::replace_spaces(replacement),
            Self::ReplaceNumbers { replacement } => factory::replace_numbers(replacement),
            Self::ReplaceLetters { replacement } => factory::replace_letters(replacement),
            Self::ReplaceAtPosition { position, replacement } => {
                factory::replace_at_position(*position, replacement)
            }
            Self::ReplaceRange { start, end, replacement } => {
                factory::replace_range(*start, *end, replacement)
            }
            Self::ReplaceBetweenDelimiters { open, close, replacement } => {
                factory::replace_between_delimiters(open, close, replacement)
            }
            Self::Custom { name, pattern, replace } => Rule::new(name, pattern, replace),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_command() {
        let args = vec![
            "renamer",
            "run",
            "--path",
            "photos,docs/a.txt",
            "--rule",
            "[]",
            "--recursive",
            "--dry-run",
        ];

        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Run { path, rule, recursive, dry_run, interactive, .. } => {
                assert_eq!(path, vec![PathBuf::from("photos"), PathBuf::from("docs/a.txt")]);
                assert_eq!(rule.as_deref(), Some("[]"));
                assert!(recursive);
                assert!(dry_run);
                assert!(!interactive);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_rejects_both_rule_sources() {
        let args = vec![
            "renamer",
            "run",
            "--path",
            "a.txt",
            "--rule",
            "[]",
            "--rule-file",
            "rules.json",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_apply_command() {
        let args = vec!["renamer", "apply", "--mapping", "results.json"];

        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Apply { mapping, mode, dry_run, .. } => {
                assert_eq!(mapping, PathBuf::from("results.json"));
                assert_eq!(mode, None);
                assert!(!dry_run);
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_apply_undo_mode() {
        let args = vec!["renamer", "apply", "-m", "plan.csv", "--mode", "undo"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Apply { mode, .. } => assert_eq!(mode.map(Mode::from), Some(Mode::Undo)),
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_rule_command() {
        let args = vec![
            "renamer",
            "rule",
            "replace-range",
            "1",
            "3",
            "_",
            "--append",
            "rules.json",
        ];

        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Rule { kind, append } => {
                assert_eq!(append, Some(PathBuf::from("rules.json")));
                let rule = kind.build();
                assert_eq!(rule.name, "ReplaceRange");
                assert_eq!(rule.pattern, "^(.{1}).{2}(.*)$");
            }
            _ => panic!("Expected Rule command"),
        }
    }

    #[test]
    fn test_date_formats_default() {
        let cli = Cli::try_parse_from(vec!["renamer", "rule", "remove-numbers"]).unwrap();
        assert_eq!(cli.formats.to_formats(), DateFormats::default());
    }
}
