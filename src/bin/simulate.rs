use clap::Parser;
use kronologic_server::constants::MAX_GENERATION_ATTEMPTS;
use kronologic_server::scenario::{Query, Scenario};
use kronologic_server::server_utils::parse_mode;
use kronologic_server::solution::Solution;
use kronologic_server::types::GameMode;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const ALL_MODES: [GameMode; 3] = [GameMode::Jewel, GameMode::RitualEasy, GameMode::RitualHard];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// jewel, ritual_easy or ritual_hard; all modes when omitted.
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    count: Option<usize>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResultLine {
    mode: GameMode,
    seed: u32,
    attempts: usize,
    degraded: bool,
    final_answer: String,
    initial_clues: usize,
    cached_queries: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenario_count: usize,
    anomaly_count: usize,
    degraded_count: usize,
    average_attempts: f64,
    mode_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredLogLine {
    timestamp_ms: u64,
    level: String,
    event: String,
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<GameMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let modes = match resolve_modes(cli.mode.as_deref()) {
        Ok(modes) => modes,
        Err(message) => {
            eprintln!("[simulate] {message}");
            std::process::exit(2);
        }
    };
    let count = cli.count.unwrap_or(20).max(1);
    let base_seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, run_started_at_ms));

    let mut results = Vec::new();
    for mode in modes {
        for offset in 0..count {
            let seed = base_seed.wrapping_add(offset as u32);
            let line = match run_scenario(mode, seed) {
                Ok(line) => line,
                Err(message) => {
                    emit_log(
                        "error",
                        "scenario_failed",
                        &run_id,
                        Some(mode),
                        Some(seed),
                        json!({ "error": message }),
                    );
                    std::process::exit(2);
                }
            };
            for anomaly in &line.anomalies {
                emit_log(
                    "warn",
                    "anomaly_detected",
                    &run_id,
                    Some(mode),
                    Some(seed),
                    json!({ "message": anomaly }),
                );
            }
            match serde_json::to_string(&line) {
                Ok(text) => println!("{text}"),
                Err(error) => eprintln!("[simulate] result line failed to serialize: {error}"),
            }
            results.push(line);
        }
    }

    let summary = build_run_summary(run_id.clone(), run_started_at_ms, now_ms(), results);

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "degradedCount": summary.degraded_count,
            "averageAttempts": summary.average_attempts,
            "modeCounts": summary.mode_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn resolve_modes(raw: Option<&str>) -> Result<Vec<GameMode>, String> {
    match raw {
        None => Ok(ALL_MODES.to_vec()),
        Some(value) => parse_mode(value)
            .map(|mode| vec![mode])
            .ok_or_else(|| format!("unknown mode {value:?}")),
    }
}

/// Generates one scenario, asks every legal question once and checks the
/// result against the game's structural rules.
fn run_scenario(mode: GameMode, seed: u32) -> Result<ScenarioResultLine, String> {
    let mut scenario = Scenario::for_mode(mode, seed).map_err(|error| error.to_string())?;
    let mut anomalies = Vec::new();
    let mut seen = HashSet::new();

    let config = scenario.config().clone();
    let board_rows = scenario.board().rows();
    if board_rows.len() != config.actors().len() {
        push_anomaly(
            &mut anomalies,
            &mut seen,
            format!("board has {} rows for {} actors", board_rows.len(), config.actors().len()),
        );
    }

    match scenario.solution() {
        Solution::Jewel(trace) => {
            if !trace.valid {
                push_anomaly(
                    &mut anomalies,
                    &mut seen,
                    format!("no valid jewel board after {MAX_GENERATION_ATTEMPTS} attempts"),
                );
            }
            if trace.records.len() != 6 {
                push_anomaly(&mut anomalies, &mut seen, "jewel trace is incomplete".to_string());
            }
        }
        Solution::Ritual(_) => {
            let mut patterns = HashSet::new();
            for pace in scenario.paces() {
                if !patterns.insert(pace.pattern.clone()) {
                    push_anomaly(
                        &mut anomalies,
                        &mut seen,
                        format!("pattern {} assigned twice", pace.label()),
                    );
                }
                if mode == GameMode::RitualEasy && pace.pattern.len() != 3 {
                    push_anomaly(
                        &mut anomalies,
                        &mut seen,
                        format!("easy mode drew long pattern {}", pace.label()),
                    );
                }
            }
        }
    }

    let (first, last) = config.location_query_times();
    let mut queries = Vec::new();
    for location in config.locations() {
        for time in first..=last {
            queries.push(Query::Location {
                location: location.clone(),
                time,
            });
        }
        for actor in config.actors() {
            queries.push(Query::Actor {
                actor: actor.clone(),
                location: location.clone(),
            });
        }
    }
    for query in &queries {
        let first_answer = scenario.resolve_query(query).map_err(|error| error.to_string())?;
        let second_answer = scenario.resolve_query(query).map_err(|error| error.to_string())?;
        if first_answer != second_answer {
            push_anomaly(
                &mut anomalies,
                &mut seen,
                format!("answer changed on repeat: {query:?}"),
            );
        }
    }

    Ok(ScenarioResultLine {
        mode,
        seed,
        attempts: scenario.attempts(),
        degraded: scenario.is_degraded(),
        final_answer: scenario.answer_sheet().final_answer,
        initial_clues: scenario.initial_clues().len(),
        cached_queries: scenario.query_cache().len(),
        anomalies,
    })
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(anomalies: &mut Vec<String>, seen: &mut HashSet<String>, message: String) {
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let anomaly_count = scenarios.iter().map(|line| line.anomalies.len()).sum();
    let degraded_count = scenarios.iter().filter(|line| line.degraded).count();
    let total_attempts: usize = scenarios.iter().map(|line| line.attempts).sum();
    let average_attempts = if scenario_count == 0 {
        0.0
    } else {
        total_attempts as f64 / scenario_count as f64
    };
    let mut mode_counts = BTreeMap::new();
    for line in &scenarios {
        *mode_counts.entry(line.mode.as_str().to_string()).or_insert(0) += 1;
    }
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        degraded_count,
        average_attempts,
        mode_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    mode: Option<GameMode>,
    seed: Option<u32>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        mode,
        seed,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("[simulate] log line failed to serialize: {error}"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
