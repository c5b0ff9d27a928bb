use std::collections::BTreeMap;
use std::env;
use std::process;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use pantry_core::{counts_from_detections, CategoryCatalog, Detection, ModelKind, Snapshot, StockStatus};
use pantry_reports::{
    generate_analytics, generate_replenishment, load_catalog_file, load_counts_file,
    AnalyticsOptions, AnalyticsReport, PeriodType, Recommendation, ReplenishmentOptions,
    ReplenishmentReport,
};
use pantry_vision::{parse_transcript, VisionReport};

// ---------------------------------------------------------------------------
// JSON output contracts
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReplenishJson {
    generated_at: String,
    report_id: String,
    name: String,
    center_id: String,
    emergency: bool,
    pipeline_ms: u128,
    recommendations: Vec<RecommendationJson>,
    summary: ReplenishSummaryJson,
}

#[derive(Serialize)]
struct RecommendationJson {
    category: String,
    current_count: u32,
    ideal_count: u32,
    replenish_amount: u32,
    percentage_missing: f64,
    priority: u8,
    note: String,
    status: String,
}

#[derive(Serialize)]
struct ReplenishSummaryJson {
    categories: usize,
    high_priority: usize,
    total_replenish_units: u64,
}

#[derive(Serialize)]
struct AnalyticsJson {
    generated_at: String,
    report_id: String,
    name: String,
    center_id: String,
    period: String,
    start_date: String,
    end_date: String,
    day_span: i64,
    pipeline_ms: u128,
    totals: Vec<TotalJson>,
    summary: AnalyticsSummaryJson,
}

#[derive(Serialize)]
struct TotalJson {
    category: String,
    count: u32,
    movement: String,
}

#[derive(Serialize)]
struct AnalyticsSummaryJson {
    categories_moved: usize,
    total_movement: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    most_consumed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    least_consumed: Option<String>,
}

#[derive(Serialize)]
struct VisionJson {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    predominant_category: Option<String>,
    fallback: bool,
    category_distribution: BTreeMap<String, u32>,
    snapshot_counts: BTreeMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
    };

    let result = match command.as_str() {
        "replenish" => run_replenish(&args[1..]),
        "analytics" => run_analytics(&args[1..]),
        "vision" => run_vision(&args[1..]),
        "--help" | "-h" => usage(),
        other => Err(format!("unknown command: {other}")),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!(
        "pantry — inventory digest tool

USAGE:
    pantry replenish --categories <csv> --snapshot <csv> [--center <id>]
                     [--emergency] [--ideal <category=count>]... [--json]
    pantry analytics --categories <csv> --start <csv> --end <csv>
                     [--center <id>] [--period weekly|monthly]
                     [--category <name>]... [--json]
    pantry vision    --transcript <txt> [--width <px>] [--height <px>] [--json]

Category CSV columns: name,ideal_count,emergency_priority,active
Snapshot CSV columns: category,count"
    );
    process::exit(2);
}

// ---------------------------------------------------------------------------
// Flag parsing
// ---------------------------------------------------------------------------

struct Flags {
    values: Vec<(String, String)>,
    switches: Vec<String>,
}

impl Flags {
    /// Split `--flag value` pairs and bare `--switch` flags. `known_switches`
    /// decides which flags consume no value.
    fn parse(args: &[String], known_switches: &[&str]) -> Result<Self, String> {
        let mut values = Vec::new();
        let mut switches = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            let Some(name) = arg.strip_prefix("--") else {
                return Err(format!("unexpected argument: {arg}"));
            };
            if known_switches.contains(&name) {
                switches.push(name.to_string());
                i += 1;
            } else {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("--{name} requires a value"))?;
                values.push((name.to_string(), value.clone()));
                i += 2;
            }
        }
        Ok(Self { values, switches })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &str) -> Result<&str, String> {
        self.get(name).ok_or_else(|| format!("--{name} is required"))
    }

    fn all(&self, name: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_replenish(args: &[String]) -> Result<(), String> {
    let flags = Flags::parse(args, &["emergency", "json"])?;
    let catalog = load_catalog_file(flags.require("categories")?).map_err(|e| e.to_string())?;
    let counts = load_counts_file(flags.require("snapshot")?).map_err(|e| e.to_string())?;
    let center_id = flags.get("center").unwrap_or("center-1");

    let mut options = ReplenishmentOptions::new(Utc::now());
    options.emergency = flags.has("emergency");
    for pair in flags.all("ideal") {
        let (category, count) = pair
            .split_once('=')
            .ok_or_else(|| format!("--ideal expects category=count, got '{pair}'"))?;
        let count: u32 = count
            .parse()
            .map_err(|_| format!("--ideal count must be a number, got '{count}'"))?;
        options.overrides.insert(category.to_string(), count);
    }

    let snapshot = Snapshot::from_counts(center_id, "cli census", Utc::now(), counts);

    let started = Instant::now();
    let report = generate_replenishment(&snapshot, &catalog, &options);
    let pipeline_ms = started.elapsed().as_millis();
    log::info!(
        "replenishment report {} generated in {pipeline_ms}ms",
        report.id
    );

    if flags.has("json") {
        let json = build_replenish_json(&report, &catalog, pipeline_ms);
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        print_replenish(&report, &catalog);
    }
    Ok(())
}

fn run_analytics(args: &[String]) -> Result<(), String> {
    let flags = Flags::parse(args, &["json"])?;
    let mut catalog = load_catalog_file(flags.require("categories")?).map_err(|e| e.to_string())?;
    let start_counts = load_counts_file(flags.require("start")?).map_err(|e| e.to_string())?;
    let end_counts = load_counts_file(flags.require("end")?).map_err(|e| e.to_string())?;
    let center_id = flags.get("center").unwrap_or("center-1");

    let period = match flags.get("period").unwrap_or("weekly") {
        "weekly" => PeriodType::Weekly,
        "monthly" => PeriodType::Monthly,
        other => return Err(format!("--period must be weekly or monthly, got '{other}'")),
    };

    // CSV files carry no timestamps; order the pair a week apart so the
    // day span is meaningful.
    let now = Utc::now();
    let start = Snapshot::from_counts(
        center_id,
        "start census",
        now - chrono::Duration::days(7),
        start_counts,
    );
    let end = Snapshot::from_counts(center_id, "end census", now, end_counts);

    let mut options = AnalyticsOptions::new(period, now);
    let selected: Vec<String> = flags.all("category").iter().map(|s| s.to_string()).collect();
    if !selected.is_empty() {
        options.categories = Some(selected);
    }

    let started = Instant::now();
    let report = generate_analytics(&start, &end, &mut catalog, &options).map_err(|e| e.to_string())?;
    let pipeline_ms = started.elapsed().as_millis();
    log::info!("analytics report {} generated in {pipeline_ms}ms", report.id);

    if flags.has("json") {
        let json = build_analytics_json(&report, pipeline_ms);
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        print_analytics(&report);
    }
    Ok(())
}

fn run_vision(args: &[String]) -> Result<(), String> {
    let flags = Flags::parse(args, &["json"])?;
    let path = flags.require("transcript")?;
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{path}': {e}"))?;
    let width: u32 = parse_dimension(flags.get("width"), 640)?;
    let height: u32 = parse_dimension(flags.get("height"), 480)?;

    let report = parse_transcript(&text, width, height);

    // The counts a snapshot built from this transcript would receive.
    let detection = Detection::new(
        Utc::now(),
        ModelKind::VisionLanguage,
        report.detections.clone(),
        report.count,
    );
    let snapshot_counts = counts_from_detections(std::slice::from_ref(&detection));

    if flags.has("json") {
        let json = VisionJson {
            count: report.count,
            predominant_category: report.predominant_category.clone(),
            fallback: report.fallback,
            category_distribution: report.category_distribution.clone(),
            snapshot_counts,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        print_vision(&report, &snapshot_counts);
    }
    Ok(())
}

fn parse_dimension(value: Option<&str>, default: u32) -> Result<u32, String> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("dimension must be a number, got '{raw}'")),
    }
}

// ---------------------------------------------------------------------------
// JSON builders
// ---------------------------------------------------------------------------

fn recommendation_status(rec: &Recommendation, catalog: &CategoryCatalog) -> String {
    catalog
        .get(&rec.category)
        .map(|c| c.stock_status(rec.current_count))
        .unwrap_or(StockStatus::Unknown)
        .to_string()
}

fn build_replenish_json(
    report: &ReplenishmentReport,
    catalog: &CategoryCatalog,
    pipeline_ms: u128,
) -> ReplenishJson {
    ReplenishJson {
        generated_at: report.created_at.to_rfc3339(),
        report_id: report.id.clone(),
        name: report.name.clone(),
        center_id: report.center_id.clone(),
        emergency: report.emergency,
        pipeline_ms,
        recommendations: report
            .recommendations
            .iter()
            .map(|r| RecommendationJson {
                category: r.category.clone(),
                current_count: r.current_count,
                ideal_count: r.ideal_count,
                replenish_amount: r.replenish_amount(),
                percentage_missing: r.percentage_missing(),
                priority: r.priority,
                note: r.note.clone(),
                status: recommendation_status(r, catalog),
            })
            .collect(),
        summary: ReplenishSummaryJson {
            categories: report.recommendations.len(),
            high_priority: report.high_priority().count(),
            total_replenish_units: report.total_replenish_amount(),
        },
    }
}

fn build_analytics_json(report: &AnalyticsReport, pipeline_ms: u128) -> AnalyticsJson {
    AnalyticsJson {
        generated_at: report.created_at.to_rfc3339(),
        report_id: report.id.clone(),
        name: report.name.clone(),
        center_id: report.center_id.clone(),
        period: report.period.to_string(),
        start_date: report.start_date.to_rfc3339(),
        end_date: report.end_date.to_rfc3339(),
        day_span: report.day_span(),
        pipeline_ms,
        totals: report
            .totals
            .iter()
            .map(|t| TotalJson {
                category: t.category.clone(),
                count: t.count,
                movement: t.movement.to_string(),
            })
            .collect(),
        summary: AnalyticsSummaryJson {
            categories_moved: report.totals.len(),
            total_movement: report.totals.iter().map(|t| u64::from(t.count)).sum(),
            most_consumed: report.most_consumed().map(|t| t.category.clone()),
            least_consumed: report.least_consumed().map(|t| t.category.clone()),
        },
    }
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn print_replenish(report: &ReplenishmentReport, catalog: &CategoryCatalog) {
    println!();
    if report.emergency {
        println!("  PANTRY — Emergency Replenishment Digest");
    } else {
        println!("  PANTRY — Replenishment Digest");
    }
    println!("  {:─<64}", "");
    println!(
        "  {} categories  ·  {} high priority  ·  {} units to restock",
        report.recommendations.len(),
        report.high_priority().count(),
        report.total_replenish_amount()
    );
    println!();

    if report.recommendations.is_empty() {
        println!("  No active categories configured.");
        return;
    }

    for rec in &report.recommendations {
        let marker = match rec.priority {
            5 => "!!",
            4 => " !",
            _ => "  ",
        };
        let status = recommendation_status(rec, catalog);
        let note = if rec.note.is_empty() {
            String::new()
        } else {
            format!("  — {}", rec.note)
        };
        println!(
            "  {marker} P{} {:<18} {:>4} / {:<4} restock {:>4}  [{status}]{note}",
            rec.priority,
            rec.category,
            rec.current_count,
            rec.ideal_count,
            rec.replenish_amount(),
        );
    }
    println!();
}

fn print_analytics(report: &AnalyticsReport) {
    println!();
    println!("  PANTRY — {} ({})", report.name, report.period);
    println!("  {:─<64}", "");
    println!(
        "  {} day span  ·  {} categories moved  ·  {} units total movement",
        report.day_span(),
        report.totals.len(),
        report.totals.iter().map(|t| u64::from(t.count)).sum::<u64>()
    );
    println!();

    if report.totals.is_empty() {
        println!("  No movement between the two snapshots.");
        return;
    }

    for total in &report.totals {
        let arrow = if total.movement.is_increase() { "+" } else { "-" };
        println!(
            "  {arrow} {:<18} {:>5} ({})",
            total.category, total.count, total.movement
        );
    }
    if let Some(most) = report.most_consumed() {
        println!();
        println!("  largest movement: {} ({})", most.category, most.count);
    }
    println!();
}

fn print_vision(report: &VisionReport, snapshot_counts: &BTreeMap<String, u32>) {
    println!();
    println!("  PANTRY — Vision Transcript Digest");
    println!("  {:─<64}", "");
    println!(
        "  {} objects declared  ·  {} detections parsed{}",
        report.count,
        report.detections.len(),
        if report.fallback { "  ·  fallback" } else { "" }
    );
    if let Some(predominant) = &report.predominant_category {
        println!("  predominant category: {predominant}");
    }
    println!();

    for (category, count) in &report.category_distribution {
        if *count > 0 {
            println!("  {:<18} {:>4}", category, count);
        }
    }

    println!();
    if snapshot_counts.is_empty() {
        println!("  No detections qualified for snapshot counts.");
    } else {
        println!("  snapshot would record:");
        for (category, count) in snapshot_counts {
            println!("    {:<18} {:>4}", category, count);
        }
    }
    println!();
}
