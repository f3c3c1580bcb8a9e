//! Command-line argument parsing for quizfolio
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quizfolio - quiz answers in, portfolio report out
#[derive(Parser, Debug)]
#[command(name = "quizfolio")]
#[command(version)]
#[command(about = "Turn investment quiz answers into a portfolio report, plus Gemini chat tooling", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress everything except results and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a portfolio report from quiz answers
    Report {
        /// Quiz text (reads --input or stdin when omitted)
        #[arg(value_name = "QUIZ_TEXT")]
        text: Option<String>,

        /// File containing the quiz answers
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output root directory (overrides report.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the methodology enhancement call
        #[arg(long)]
        no_enhance: bool,

        /// Skip PDF conversion
        #[arg(long)]
        no_pdf: bool,
    },

    /// Send a single prompt to the model
    Ask {
        /// Prompt text
        prompt: String,

        /// Optional system instruction
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Interactive chat with history (type `exit` to quit)
    Chat {
        /// Persist the conversation under this session id
        #[arg(short, long)]
        session: Option<String>,

        /// Stream tokens as they arrive
        #[arg(long)]
        stream: bool,

        /// Clear the stored session before starting
        #[arg(long, requires = "session")]
        reset: bool,
    },

    /// Run a prompt template through the model
    Chain {
        /// System message template, e.g. "You are a facts expert who knows facts about {animal}."
        #[arg(long)]
        system: Option<String>,

        /// Human message template, e.g. "Tell me {fact_count} facts."
        #[arg(long)]
        human: String,

        /// Template variables as key=value
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },

    /// Answer a question with the tool-using agent
    Agent {
        /// Question for the agent
        question: String,

        /// Iteration budget (overrides agent.max_iterations)
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Embed text files and store them in the vector store
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Collection name (overrides vector.collection)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Semantic search over ingested documents
    Search {
        /// Query text
        query: String,

        /// Number of results
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,

        /// Collection name (overrides vector.collection)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Run the generation proxy server
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log level for the tracing filter; `None` keeps the configured level
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("debug"),
            Verbosity::VeryVerbose => Some("trace"),
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

/// Split `key=value` template variables
pub fn parse_vars(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| format!("Invalid variable '{}', expected KEY=VALUE", item))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_quiet() {
        let args = parse(&["quizfolio", "-q", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert_eq!(args.verbosity().log_level(), Some("error"));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["quizfolio", "config"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["quizfolio", "-v", "config"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["quizfolio", "-vv", "config"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_report_command() {
        let args = parse(&["quizfolio", "report", "--input", "quiz.txt", "--no-pdf"]);
        match args.command {
            Commands::Report { input, no_pdf, no_enhance, text, .. } => {
                assert_eq!(input, Some(PathBuf::from("quiz.txt")));
                assert!(no_pdf);
                assert!(!no_enhance);
                assert!(text.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_chain_vars() {
        let args = parse(&[
            "quizfolio", "chain", "--human", "Tell me {fact_count} facts.",
            "--var", "animal=elephant", "--var", "fact_count=1",
        ]);
        match args.command {
            Commands::Chain { vars, .. } => {
                let parsed = parse_vars(&vars).unwrap();
                assert_eq!(parsed[0], ("animal".to_string(), "elephant".to_string()));
                assert_eq!(parsed[1], ("fact_count".to_string(), "1".to_string()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_vars_rejects_missing_equals() {
        assert!(parse_vars(&["animal".to_string()]).is_err());
        assert!(parse_vars(&["=value".to_string()]).is_err());
        // Values may contain '='
        let parsed = parse_vars(&["eq=a=b".to_string()]).unwrap();
        assert_eq!(parsed[0].1, "a=b");
    }

    #[test]
    fn test_reset_requires_session() {
        assert!(Args::try_parse_from(["quizfolio", "chat", "--reset"]).is_err());
        assert!(Args::try_parse_from(["quizfolio", "chat", "--reset", "--session", "s1"]).is_ok());
    }
}
