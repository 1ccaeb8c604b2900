//! Graphing calculator command-line tools.
//!
//! Provides the `gcalc` binary:
//!
//! - `scan` classifies one equation text offline and prints its free symbols.
//! - `replay` runs a JSON script of edits through a session against the
//!   compiler at `--compiler` and prints the final equations and encoded
//!   program.

mod replay;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use gcalc_render::EncoderConfig;
use gcalc_session::{
    CascadePolicy, ExpressionCompiler, HttpCompiler, Session, SessionConfig, DEFAULT_COMPILER_URL,
};
use serde_json::json;

use crate::replay::{load_script, replay, ReplayError, Step};

/// Graphing calculator tools.
#[derive(Parser)]
#[command(name = "gcalc", about = "Graphing calculator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an equation and list its free symbols.
    Scan {
        /// LaTeX equation text, e.g. "f(x)=a\sin x".
        text: String,
    },

    /// Replay a JSON script of edits and print the resulting program.
    Replay {
        /// Path to the script file.
        script: PathBuf,

        /// Base URL of the expression compiler.
        #[arg(short, long, default_value = DEFAULT_COMPILER_URL)]
        compiler: String,

        /// Cascade policy: always or hint.
        #[arg(long, default_value = "always")]
        cascade: CascadePolicy,

        /// Program texture width in texels.
        #[arg(long, default_value_t = gcalc_render::texture::DEFAULT_TEXTURE_WIDTH)]
        texture_width: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { text } => run_scan(&text),
        Commands::Replay {
            script,
            compiler,
            cascade,
            texture_width,
        } => {
            let exit_code = run_replay(&script, compiler, cascade, texture_width);
            process::exit(exit_code);
        }
    }
}

fn run_scan(text: &str) {
    let (binding, error) = match gcalc_check::classify(text) {
        Ok(classification) => (
            json!({ "binding": classification.binding, "body": classification.body }),
            None,
        ),
        Err(err) => (json!(null), Some(err.to_string())),
    };
    let output = json!({
        "normalized": gcalc_check::normalize(text),
        "classification": binding,
        "free_symbols": gcalc_check::free_symbols(text),
        "references": gcalc_check::references_of(text),
        "error": error,
    });
    print_json(&output);
}

/// Execute the replay subcommand.
///
/// Returns exit code: 0 = success, 1 = script error, 3 = I/O error.
fn run_replay(
    script: &Path,
    compiler: String,
    cascade: CascadePolicy,
    texture_width: usize,
) -> i32 {
    let steps = match load_script(script) {
        Ok(steps) => steps,
        Err(err) => {
            eprintln!("Error: {}", err);
            return err.exit_code();
        }
    };
    let encoder = EncoderConfig { texture_width };
    if let Err(err) = encoder.validate() {
        eprintln!("Error: {}", err);
        return 1;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            return 3;
        }
    };

    let config = SessionConfig { cascade };
    tracing::info!("replaying {} steps against {}", steps.len(), compiler);
    let result = runtime.block_on(run(HttpCompiler::new(compiler), config, &steps, &encoder));

    match result {
        Ok(output) => {
            print_json(&output);
            0
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    }
}

async fn run<C: ExpressionCompiler>(
    compiler: C,
    config: SessionConfig,
    steps: &[Step],
    encoder: &EncoderConfig,
) -> Result<serde_json::Value, ReplayError> {
    let session = Session::new(compiler, config);
    let output = replay(&session, steps, encoder).await?;
    Ok(serde_json::to_value(output)?)
}

fn print_json(value: &serde_json::Value) {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize output: {}\"}}", e));
    println!("{}", text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_defaults_to_the_local_compiler() {
        let cli = Cli::try_parse_from(["gcalc", "replay", "script.json"]).unwrap();
        match cli.command {
            Commands::Replay {
                compiler, cascade, ..
            } => {
                assert_eq!(compiler, DEFAULT_COMPILER_URL);
                assert_eq!(cascade, CascadePolicy::Always);
            }
            Commands::Scan { .. } => panic!("expected replay"),
        }
    }

    #[test]
    fn replay_accepts_a_compiler_url() {
        let cli = Cli::try_parse_from([
            "gcalc",
            "replay",
            "script.json",
            "--compiler",
            "http://compiler:9000",
            "--cascade",
            "hint",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay {
                compiler, cascade, ..
            } => {
                assert_eq!(compiler, "http://compiler:9000");
                assert_eq!(cascade, CascadePolicy::FollowHint);
            }
            Commands::Scan { .. } => panic!("expected replay"),
        }
    }
}
