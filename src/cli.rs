//! Minimal CLI: compile schema files → (report | dumped rule tree)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::loader::{self, Format};
use crate::RuleTree;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile kwalify-style schema files into rule trees and report schema errors
#[derive(Parser, Debug)]
#[command(name = "kwalify-rules")]
pub struct CommandLineInterface {
    /// log compiler decisions (overrides RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile every input and report the first error of each
    Check(CheckOut),
    /// compile one input and print its rule tree as JSON
    Dump(DumpOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// input syntax
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct DumpOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn paths(&self) -> Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")
    }
}

/// Load and compile one schema file.
pub fn compile_file(path: &Path, format: Format) -> Result<RuleTree> {
    let doc = loader::load_file(path, format)?;
    let tree = crate::compile(&doc)?;
    Ok(tree)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool { self.verbose }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => {
                let settings = &target.input_settings;
                let paths = settings.paths()?;

                // Documents are independent; compile them side by side.
                let results: Vec<(&PathBuf, Result<RuleTree>)> = paths
                    .par_iter()
                    .map(|path| (path, compile_file(path, settings.format)))
                    .collect();

                let mut failed = 0usize;
                for (path, result) in &results {
                    match result {
                        Ok(tree) => {
                            println!("{} {} ({} rules)", "ok".green().bold(), path.display(), tree.len());
                        }
                        Err(error) => {
                            failed += 1;
                            println!("{} {}: {error:#}", "FAIL".red().bold(), path.display());
                        }
                    }
                }
                tracing::info!(checked = results.len(), failed, "check finished");
                Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
            Command::Dump(target) => {
                let settings = &target.input_settings;
                let paths = settings.paths()?;
                let [path] = paths.as_slice() else {
                    bail!("dump takes exactly one input, got {}", paths.len());
                };

                let tree = compile_file(path, settings.format)
                    .with_context(|| format!("failed to compile {}", path.display()))?;
                let src = serde_json::to_string_pretty(&tree.to_json())?;

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{src}");
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn globs_expand_and_literals_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "type: str\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "type: int\n").unwrap();

        let pattern = format!("{}/*.yaml", dir.path().display());
        let mut found = resolve_file_path_patterns([pattern.as_str(), "literal.json"]).unwrap();
        found.sort();
        assert_eq!(found.len(), 3);
        assert!(found.contains(&PathBuf::from("literal.json")));

        let empty = format!("{}/*.json", dir.path().display());
        assert!(resolve_file_path_patterns([empty]).is_err());
    }

    #[test]
    fn compile_file_surfaces_compile_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"type": "map"}"#).unwrap();
        let err = compile_file(&path, Format::Auto).unwrap_err();
        let err = err.downcast::<crate::CompileError>().unwrap();
        assert_eq!(err.code(), crate::codes::MAP_NOMAPPING);
    }

    #[test]
    fn parses_check_command() {
        let cli = CommandLineInterface::try_parse_from(["kwalify-rules", "check", "-i", "a.yaml", "b.yaml", "--verbose"]).unwrap();
        assert!(cli.verbose());
        let Command::Check(check) = &cli.cmd else { panic!("expected check") };
        assert_eq!(check.input_settings.input, ["a.yaml", "b.yaml"]);
    }
}
