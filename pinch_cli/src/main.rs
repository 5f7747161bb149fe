//! `pinch-cli`: detect pinch micro-gestures in a recorded sensor session,
//! debug why the offline detector's threshold missed a peak, or train a
//! template bundle for the two-stage detector's verification stage.
//!
//! Parses args, installs `color_eyre`, initializes `tracing`, dispatches to
//! a subcommand, formats any error for the chosen output mode, and exits
//! 0 on success or 1 on any caught error.

mod cli;
mod error_fmt;
mod pipeline;
mod tracing_setup;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let _ = cli::JSON_MODE.set(cli.json);
    tracing_setup::init_tracing(cli.json, &cli.log_level, cli.log_file.as_deref());
    color_eyre::install().ok();

    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            let json = *cli::JSON_MODE.get().unwrap_or(&false);
            if json {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Detect {
            input,
            config,
            detector,
            output,
            collect_rejections,
            templates,
            expected_fs,
        } => {
            let out_path = pipeline::run_detect(
                input,
                config.as_deref(),
                *detector,
                output.as_deref(),
                *collect_rejections,
                templates.as_deref(),
                *expected_fs,
            )?;
            if cli.json {
                println!("{}", serde_json::json!({"ok": true, "report": out_path}));
            } else {
                println!("wrote report to {}", out_path.display());
            }
            Ok(())
        }
        Commands::DebugThreshold {
            input,
            config,
            expected_fs,
        } => {
            let report = pipeline::run_debug_threshold(input, config.as_deref(), *expected_fs)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_peaks_found": report.total_peaks_found,
                        "above_threshold": report.above_threshold,
                        "current_k_mad": report.current_k_mad,
                        "recommended_k_mad": report.recommended_k_mad,
                        "risk": format!("{:?}", report.risk),
                        "missed": report.missed.iter().map(|m| serde_json::json!({
                            "index": m.index,
                            "time": m.time,
                            "score": m.score,
                            "threshold": m.threshold,
                            "margin": m.margin,
                        })).collect::<Vec<_>>(),
                    })
                );
            } else {
                println!(
                    "{} of {} peaks above threshold (k_mad={:.2})",
                    report.above_threshold, report.total_peaks_found, report.current_k_mad
                );
                for m in &report.missed {
                    println!(
                        "  missed peak at t={:.3}s: score={:.3} threshold={:.3} margin={:.3}",
                        m.time, m.score, m.threshold, m.margin
                    );
                }
                println!(
                    "recommended k_mad: {:.2} ({:?} risk)",
                    report.recommended_k_mad, report.risk
                );
            }
            Ok(())
        }
        Commands::TrainTemplates {
            input,
            config,
            event_indices,
            output,
        } => {
            let n = pipeline::run_train_templates(input, config.as_deref(), event_indices, output)?;
            if cli.json {
                println!("{}", serde_json::json!({"ok": true, "templates_trained": n, "output": output}));
            } else {
                println!("trained {n} template(s), wrote bundle to {}", output.display());
            }
            Ok(())
        }
    }
}
