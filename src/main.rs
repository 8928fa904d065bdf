use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::fs;
use std::path::PathBuf;

use meal_tracker::{
    find_duplicates, LedgerStorage, MealTracker, PacingReport, ResourcePacing, SeriesKind,
    TrackerConfig, TrackerError,
};

const USAGE: &str = "\
Usage: meal-tracker <command> [args]

Commands:
  import-html <file>          Merge a saved statement page
  import-json <file>          Merge an exported ledger backup
  export [file]               Write the ledger as JSON (default: meal_plan_data.json)
  clear                       Remove all meal plans
  show                        List plans and transactions
  report [YYYY-MM-DD]         Pacing report (default command)
  series <blocks|flex> [date] Chart series as JSON
  calendar [YYYY-MM-DD]       Enrollment periods and day position
  dark-mode                   Toggle the saved dark mode preference

Environment: MEAL_TRACKER_CONFIG, MEAL_TRACKER_DB, MEAL_TRACKER_TODAY, RUST_LOG";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("report");

    if matches!(command, "help" | "-h" | "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = TrackerConfig::load()?;
    let storage = config.open_storage()?;
    let mut tracker = MealTracker::open(storage, config.calendar.clone())?;

    match command {
        "import-html" => run_import_html(&mut tracker, required(&args, 1, "file")?),
        "import-json" => run_import_json(&mut tracker, required(&args, 1, "file")?),
        "export" => run_export(&tracker, args.get(1).map(PathBuf::from).unwrap_or(config.export_file.clone())),
        "clear" => run_clear(&mut tracker),
        "show" => run_show(&tracker),
        "report" => run_report(&tracker, date_arg(&args, 1, &config)?),
        "series" => {
            let kind: SeriesKind = required(&args, 1, "blocks|flex")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            run_series(&tracker, kind, date_arg(&args, 2, &config)?)
        }
        "calendar" => run_calendar(&tracker, date_arg(&args, 1, &config)?),
        "dark-mode" => {
            let on = tracker.toggle_dark_mode()?;
            println!("🌓 Dark mode {}", if on { "on" } else { "off" });
            Ok(())
        }
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{}>\n\n{}", name, USAGE))
}

fn date_arg(args: &[String], index: usize, config: &TrackerConfig) -> Result<NaiveDate> {
    match args.get(index) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
        None => Ok(config.today()),
    }
}

// ============================================================================
// MUTATING COMMANDS
// ============================================================================

fn run_import_html<S: LedgerStorage>(tracker: &mut MealTracker<S>, file: &str) -> Result<()> {
    println!("📂 Reading statement {}...", file);
    let bytes = fs::read(file).with_context(|| format!("Failed to read file: {}", file))?;

    match tracker.merge_snapshot_bytes(&bytes) {
        Ok(summary) => {
            println!("✓ File parsed successfully!");
            println!("  {}", summary.summary());
            Ok(())
        }
        Err(TrackerError::NoData) => {
            eprintln!("⚠️  No data found in the file.");
            std::process::exit(1);
        }
        Err(e @ TrackerError::Storage(_)) => Err(e.into()),
        Err(e) => {
            eprintln!("❌ Error parsing file: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_import_json<S: LedgerStorage>(tracker: &mut MealTracker<S>, file: &str) -> Result<()> {
    let json = fs::read_to_string(file).with_context(|| format!("Failed to read file: {}", file))?;
    let summary = tracker
        .import_ledger(&json)
        .with_context(|| format!("Failed to import {}", file))?;
    println!("✓ Imported {}", file);
    println!("  {}", summary.summary());
    Ok(())
}

fn run_clear<S: LedgerStorage>(tracker: &mut MealTracker<S>) -> Result<()> {
    let plans = tracker.ledger().meal_plans.len();
    tracker.clear_all()?;
    println!("🗑️  Cleared {} meal plans", plans);
    Ok(())
}

// ============================================================================
// READ-ONLY COMMANDS
// ============================================================================

fn run_export<S: LedgerStorage>(tracker: &MealTracker<S>, path: PathBuf) -> Result<()> {
    let json = tracker.export_ledger()?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "💾 Exported {} plans to {}",
        tracker.ledger().meal_plans.len(),
        path.display()
    );
    Ok(())
}

fn run_show<S: LedgerStorage>(tracker: &MealTracker<S>) -> Result<()> {
    let ledger = tracker.ledger();

    if let Some(saved) = tracker.storage().last_saved_at()? {
        println!("Last saved: {} ({})", saved, tracker.storage().describe());
    }
    if let Some(option) = ledger.current_meal_option {
        println!("Current Meal Option: {}\n", option);
    }
    if ledger.meal_plans.is_empty() {
        println!("No data available");
        return Ok(());
    }

    for plan in &ledger.meal_plans {
        println!("Meal Plan: {} (Start Date: {})", plan.plan_name(), plan.start_date());
        println!("Current Balance: {}", plan.current_balance);

        if plan.transactions.is_empty() {
            println!("  No transactions available\n");
            continue;
        }
        println!("  {:<28} {:<24} {:>10} {:>10}", "Location", "Date/Time", "Requested", "Approved");
        for tx in &plan.transactions {
            println!(
                "  {:<28} {:<24} {:>10} {:>10}",
                tx.location, tx.date_time, tx.requested_amount, tx.approved_amount
            );
        }

        let dupes = find_duplicates(&plan.transactions);
        if !dupes.is_empty() {
            println!("  ⚠️  {} duplicate transactions", dupes.len());
        }
        println!();
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_resource(title: &str, pacing: &ResourcePacing, status: &str, decimals: usize, prefix: &str) {
    println!("{}", title);
    println!("  Remaining:             {}{:.*}", prefix, decimals, pacing.remaining);
    println!("  Ideal per day:         {}{}", prefix, fmt_opt(pacing.ideal_per_day, 2));
    println!("  Actual per day:        {}{}", prefix, fmt_opt(pacing.actual_per_day, 2));
    println!("  Per day from now:      {}{}", prefix, fmt_opt(pacing.projected_per_day_from_now, 2));
    println!("  Status:                {}", status);
}

fn run_report<S: LedgerStorage>(tracker: &MealTracker<S>, today: NaiveDate) -> Result<()> {
    let report: PacingReport = match tracker.pacing_report(today) {
        Some(r) => r,
        None => {
            println!("No meal option detected yet. Import a statement first: meal-tracker import-html <file>");
            return Ok(());
        }
    };

    println!("📊 {} Meal Option ({})", report.option, today);
    println!("Day {} of {} ({} left)\n", report.day_index, report.total_days, report.remaining_days());

    match (&report.blocks, report.blocks_status()) {
        (Some(blocks), Some(status)) => {
            print_resource("Meal Blocks", blocks, &status, 0, "");
            if let Some(avg) = report.average_value_per_block {
                println!("  Avg value per block:   ${:.2}", avg);
            }
            if report.ambiguous_block_plan {
                println!("  ⚠️  several block plans match; using the first");
            }
        }
        _ => println!("Meal Blocks: no block plan found"),
    }
    println!();

    match (&report.flex, report.flex_status()) {
        (Some(flex), Some(status)) => {
            print_resource("Flex Dollars", flex, &status, 2, "$");
            if report.ambiguous_flex_plan {
                println!("  ⚠️  several flex plans match; using the first");
            }
        }
        _ => println!("Flex Dollars: no flex plan found"),
    }

    Ok(())
}

fn run_series<S: LedgerStorage>(tracker: &MealTracker<S>, kind: SeriesKind, today: NaiveDate) -> Result<()> {
    match tracker.usage_series(kind, today) {
        Some(series) => println!("{}", serde_json::to_string_pretty(&series)?),
        None => bail!("no meal option detected yet; import a statement first"),
    }
    Ok(())
}

fn run_calendar<S: LedgerStorage>(tracker: &MealTracker<S>, today: NaiveDate) -> Result<()> {
    let calendar = tracker.calendar();
    for period in calendar.periods() {
        let marker = if period.contains(today) { "▶" } else { " " };
        println!(
            "{} {:<40} {} → {} ({} days)",
            marker,
            period.name,
            period.start,
            period.end,
            period.days()
        );
    }
    println!(
        "\n{}: day {} of {}",
        today,
        calendar.current_day_index(today),
        calendar.total_days()
    );
    Ok(())
}
