//! Vertical card display for cases, verdicts, and player progress.

use chrono::Local;
use verdict_core::{
    CaseRecord, Deviation, PlayHistoryRecord, RankStanding, RankTable, ScoreBreakdown,
};
use verdict_source::Verdict;
use verdict_store::Statistics;

const LABEL_WIDTH: usize = 16;
const MAX_TEXT_CHARS: usize = 600;

// ── Case dossier ──

/// Print a case as the player sees it before judging: no verdict details.
pub fn print_dossier(case: &CaseRecord) {
    println!("=== {} ===", case.id);
    if !case.court.is_empty() {
        println!("{}", case.court);
    }
    println!();

    let d = &case.defendant;
    print_section("Case", &case_fields(case));
    print_section(
        "Defendant",
        &[
            ("name", d.name.clone()),
            ("gender", d.gender.clone()),
            ("born", d.birth_date.clone()),
            ("age", nonzero(d.age)),
            ("education", d.education.clone()),
            ("occupation", d.occupation.clone()),
            ("record", d.criminal_record.clone()),
            ("minor", flag(d.is_minor)),
            ("condition", d.physiological_status.label().to_string()),
        ],
    );

    let f = &case.factors;
    print_section(
        "Circumstances",
        &[
            ("recidivist", flag(f.is_recidivist)),
            ("attempt", flag(f.is_attempt)),
            ("surrender", flag(f.is_surrender)),
            ("surrender type", f.surrender_type.clone()),
            ("meritorious", flag(f.is_meritorious)),
            ("confessed", flag(f.is_confessed)),
            ("plea accepted", flag(f.is_plea_accepted)),
            ("repented", flag(f.is_repented)),
            ("role", f.role.clone()),
        ],
    );

    print_text("Facts", &case.facts);
    print_text("Evidence", &case.evidence);
}

/// Procedural facts; `organization` is the trial bench form (e.g. 独任审判).
fn case_fields(case: &CaseRecord) -> [(&'static str, String); 5] {
    [
        ("region", case.region.clone()),
        ("cause", case.cause.clone()),
        ("procedure", case.procedure.clone()),
        ("bench", case.organization.clone()),
        ("open hearing", yes_no(case.is_open)),
    ]
}

// ── Verdict feedback ──

pub fn print_verdict(case: &CaseRecord, verdict: &Verdict, ranks: &RankTable) {
    let b = &verdict.breakdown;
    println!();
    println!("=== Score {}/100 ===", verdict.score());
    print_breakdown(b);

    let actual = &case.actual;
    print_section(
        "Court's judgment",
        &[
            ("charge", actual.charge.clone()),
            ("penalty", actual.formatted_penalty()),
            ("fine", fine(actual.has_fine, actual.fine_amount)),
            ("date", actual.date.clone()),
        ],
    );
    print_text("Reasoning", &case.legal_reasoning);

    let rank = &verdict.rank;
    let tier_name = |id: u32| {
        ranks
            .tiers()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.as_str())
            .unwrap_or("?")
    };
    println!("Rank");
    println!("  {:<LABEL_WIDTH$} {:+}", "delta", rank.delta);
    println!("  {:<LABEL_WIDTH$} {} -> {}", "total", rank.previous, rank.total);
    if rank.promoted() {
        println!("  promoted to {}", tier_name(rank.tier));
    } else if rank.demoted() {
        println!("  demoted to {}", tier_name(rank.tier));
    } else {
        println!("  {:<LABEL_WIDTH$} {}", "tier", tier_name(rank.tier));
    }
    println!();
}

fn print_breakdown(b: &ScoreBreakdown) {
    println!("  {:<LABEL_WIDTH$} {:>3}  {}", "charge", b.charge, mark(b.charge_correct));
    println!(
        "  {:<LABEL_WIDTH$} {:>3}  {}",
        "penalty type",
        b.penalty_type,
        mark(b.deviation != Deviation::WrongPenaltyType)
    );
    println!("  {:<LABEL_WIDTH$} {:>3}  {}", "duration", b.duration, b.deviation);
    println!("  {:<LABEL_WIDTH$} {:>3}  {}", "fine", b.fine, mark(b.fine_flag_correct));
    println!();
}

// ── Progress ──

pub fn print_status(standing: &RankStanding<'_>, total: i64, stats: &Statistics) {
    println!("=== {} ===", standing.current.name);
    println!();
    println!("Rank");
    println!("  {:<LABEL_WIDTH$} {}", "score", total);
    println!("  {:<LABEL_WIDTH$} {}", "benchmark", standing.current.benchmark);
    match standing.next {
        Some(next) => println!(
            "  {:<LABEL_WIDTH$} {:.0}% towards {} ({})",
            "progress", standing.progress, next.name, next.min_score
        ),
        None => println!("  {:<LABEL_WIDTH$} top of the ladder", "progress"),
    }
    println!("Statistics");
    println!("  {:<LABEL_WIDTH$} {}", "cases judged", stats.total_cases);
    println!("  {:<LABEL_WIDTH$} {:.1}", "average score", stats.average_score);
    println!("  {:<LABEL_WIDTH$} {}", "best score", stats.best_score);
}

/// Print records newest first.
pub fn print_history(records: &[PlayHistoryRecord]) {
    if records.is_empty() {
        println!("No judgments recorded yet.");
        return;
    }
    for r in records {
        let when = r.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!(
            "{when}  {:>3}  {:>+4}  {:<8} {}  {}",
            r.score, r.score_delta, r.region, r.case_id, r.cause
        );
    }
}

// ── Helpers ──

fn print_section(header: &str, fields: &[(&str, String)]) {
    if fields.iter().all(|(_, v)| v.is_empty()) {
        return;
    }
    println!("{header}");
    for (label, value) in fields {
        if value.is_empty() {
            continue;
        }
        println!("  {label:<LABEL_WIDTH$} {value}");
    }
}

fn print_text(header: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    println!("{header}");
    println!("  {}", truncate(text, MAX_TEXT_CHARS));
    println!();
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

fn fine(has_fine: bool, amount: u64) -> String {
    if has_fine {
        format!("{amount} 元")
    } else {
        "none".into()
    }
}

/// Only set flags are shown.
fn flag(set: bool) -> String {
    if set { "yes".into() } else { String::new() }
}

fn yes_no(b: bool) -> String {
    if b { "yes".into() } else { "no".into() }
}

fn nonzero(n: u32) -> String {
    if n == 0 { String::new() } else { n.to_string() }
}

fn mark(ok: bool) -> &'static str {
    if ok { "correct" } else { "wrong" }
}
