//! point_ledger - load driver
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────┐
//! │  Config  │───▶│   Workload   │───▶│ PointService │───▶│  Report  │
//! │  (YAML)  │    │ (N threads)  │    │ (lock/user)  │    │ (verify) │
//! └──────────┘    └──────────────┘    └──────────────┘    └──────────┘
//! ```
//!
//! Flags: `--env <name>` (config/<name>.yaml), `--users <n>`, `--ops <n>`,
//! `--json` (print the report as JSON).

use anyhow::Context;

use point_ledger::config::AppConfig;
use point_ledger::service::PointService;
use point_ledger::workload::run_workload;

fn arg_value(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|pair| names.contains(&pair[0].as_str()))
        .map(|pair| pair[1].clone())
}

fn get_env() -> String {
    arg_value(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

fn parse_override(name: &str) -> anyhow::Result<Option<u64>> {
    arg_value(&[name])
        .map(|v| v.parse::<u64>().with_context(|| format!("{} expects a number, got {}", name, v)))
        .transpose()
}

fn use_json_output() -> bool {
    std::env::args().any(|a| a == "--json")
}

fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(users) = parse_override("--users")? {
        app_config.workload.users = users;
    }
    if let Some(ops) = parse_override("--ops")? {
        app_config.workload.ops_per_user = ops;
    }

    let _log_guard = point_ledger::logging::init_logging(&app_config);
    tracing::info!(
        "Starting point_ledger ({}) in {} mode",
        env!("GIT_HASH"),
        env
    );

    let service = PointService::in_memory(app_config.store);
    let report = run_workload(&service, &app_config.workload)?;

    let mismatches = report.mismatches(&service);

    if use_json_output() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== point_ledger workload ===");
        println!(
            "Users: {}  Ops/user: {}  Threads: {}",
            app_config.workload.users,
            app_config.workload.ops_per_user,
            app_config.workload.users * app_config.workload.ops_per_user
        );
        println!("Accepted: {}  Rejected: {}", report.accepted, report.rejected);
        for (code, count) in &report.rejections {
            println!("  {:<28} {}", code, count);
        }
        println!(
            "Elapsed: {:?}  Throughput: {:.0} ops/s",
            report.elapsed,
            report.throughput()
        );
        if let (Some(p50), Some(p99), Some(max)) = (
            report.perf.percentile(50.0),
            report.perf.percentile(99.0),
            report.perf.max_latency(),
        ) {
            println!(
                "Latency: P50 {:.2}ms  P99 {:.2}ms  Max {:.2}ms",
                p50 as f64 / 1e6,
                p99 as f64 / 1e6,
                max as f64 / 1e6
            );
        }
        for balance in &report.final_balances {
            println!("  user {:>4}: {:>9}", balance.user_id(), balance.amount());
        }
    }

    anyhow::ensure!(
        mismatches.is_empty(),
        "Balance/history mismatch for users {:?}",
        mismatches
    );
    tracing::info!("Verified: every balance matches its history replay");
    Ok(())
}
