use std::process::ExitCode;

use anyhow::{Context, Result};
use plant_core::{
    PlantIdClient, PredictionResult, Runner, RunnerConfig, RunSummary, load_cases,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Run aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let cfg = RunnerConfig::load(&cwd).context("invalid configuration")?;
    tracing::debug!(?cfg, "configuration loaded");
    let cases = load_cases(&cfg.test_cases_path).context("cannot load test cases")?;
    let client = PlantIdClient::from_config(&cfg).context("cannot set up API client")?;

    println!(
        "Running {} test cases from {} against {}",
        cases.len(),
        cfg.test_cases_path.display(),
        client.endpoint()
    );

    let results = Runner::new(&client)
        .with_image_root(&cfg.image_root)
        .run_to_csv(&cases, &cfg.results_path, print_result)
        .with_context(|| format!("cannot write {}", cfg.results_path.display()))?;

    print_summary(&RunSummary::compute(&results));
    println!("Results written to {}", cfg.results_path.display());
    Ok(())
}

fn print_result(done: usize, total: usize, result: &PredictionResult) {
    let case = &result.case;
    println!();
    println!("[{done}/{total}] {} {} ({})", case.test_id, case.subject(), case.image_path);
    for (label, value) in case.conditions() {
        println!("  {label}: {value}");
    }
    println!("  Expected:  {}", case.expected_label);
    match &result.error {
        Some(error) => println!("  ERROR:     {error}"),
        None => println!(
            "  Predicted: {} ({:.2}%)",
            result.predicted_label,
            result.confidence.unwrap_or_default() * 100.0
        ),
    }
    if let Some(latency) = result.latency_secs {
        println!("  Latency:   {latency:.3}s");
    }
    println!("  {}", if result.pass { "PASS" } else { "FAIL" });
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!(
        "Total: {}  Passed: {}  Failed: {}  Accuracy: {:.1}%",
        summary.total,
        summary.passed,
        summary.failed,
        summary.accuracy * 100.0
    );
    match summary.avg_confidence {
        Some(avg) => println!("Average confidence: {:.2}%", avg * 100.0),
        None => println!("Average confidence: n/a"),
    }
}
