use colored::*;
use truthtriage_core::metrics::SeriesPoint;
use truthtriage_core::{
    DocumentInfo, DoctorSearch, HealthStatus, Medicine, Message, RiskLevel, SessionMetrics,
    SessionProfile, Source, SUGGESTED_QUESTIONS,
};

/// Characters of a source excerpt shown in listings
const EXCERPT_CHARS: usize = 160;
/// Width of the widest bar in a series chart
const BAR_WIDTH: usize = 30;

/// Print an assistant turn with its confidence line and any medicines
pub fn print_answer(message: &Message) {
    println!("{}: {}", "Assistant".blue().bold(), message.content);
    print_confidence_line(message);
    if !message.medicines.is_empty() {
        print_medicines(&message.medicines);
    }
    if !message.sources.is_empty() {
        println!(
            "{}",
            format!(
                "  {} source(s) retrieved. Type /sources to inspect them.",
                message.sources.len()
            )
            .dimmed()
        );
    }
}

/// Print the synthetic turn shown when a request failed
pub fn print_failure(message: &Message, error: &str) {
    println!("{}: {}", "Assistant".blue().bold(), message.content.red());
    println!("{}", format!("  ({})", error).dimmed());
}

fn print_confidence_line(message: &Message) {
    let mut parts = Vec::new();
    if let Some(confidence) = message.confidence {
        parts.push(format!("confidence {}%", confidence));
    }
    if let Some(risk) = message.risk {
        parts.push(format!("risk {}", colored_risk(risk)));
    }
    if let Some(secs) = message.response_time {
        parts.push(format!("{:.2}s", secs));
    }
    if !parts.is_empty() {
        println!("  {}", parts.join(" | "));
    }
}

pub fn colored_risk(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::Low => risk.as_str().green().bold(),
        RiskLevel::Medium => risk.as_str().yellow().bold(),
        RiskLevel::High => risk.as_str().red().bold(),
    }
}

pub fn print_medicines(medicines: &[Medicine]) {
    println!("{}", "Medicines:".cyan().bold());
    for medicine in medicines {
        match &medicine.source {
            Some(source) => println!(
                "  {} - {} {}",
                medicine.name.green(),
                medicine.usage,
                format!("[{}]", source).dimmed()
            ),
            None => println!("  {} - {}", medicine.name.green(), medicine.usage),
        }
    }
}

/// Print the evidence behind the latest answer
pub fn print_sources(sources: &[Source]) {
    if sources.is_empty() {
        println!("{}", "No sources for the current answer.".yellow());
        return;
    }
    println!("{}", "Sources:".cyan().bold());
    for (i, source) in sources.iter().enumerate() {
        let page = source
            .metadata
            .page
            .map(|p| format!(", page {}", p))
            .unwrap_or_default();
        let score = source
            .similarity_score
            .map(|s| format!(" {}", format!("{:.0}% match", s * 100.0).magenta()))
            .unwrap_or_default();
        println!(
            "  {}. {}{}{}",
            i + 1,
            source.document_name().bold(),
            page,
            score
        );
        println!("     {}", truncate(&source.content, EXCERPT_CHARS).dimmed());
    }
}

/// Print the running figures for the session
pub fn print_metrics(profile: SessionProfile, metrics: &SessionMetrics) {
    println!("{}", format!("Session metrics ({:?})", profile).cyan().bold());
    println!("  Questions asked:    {}", metrics.questions_asked());
    println!("  Sources retrieved:  {}", metrics.sources_retrieved());
    println!("  Avg confidence:     {}%", metrics.avg_confidence());
    println!("  Avg response time:  {}s", metrics.avg_response_time_display());
    println!("  Success rate:       {}%", metrics.success_rate());
}

/// Horizontal bar chart of one per-answer series
pub fn print_series(title: &str, unit: &str, points: &[SeriesPoint]) {
    if points.is_empty() {
        return;
    }
    println!("{}", title.cyan().bold());
    for line in render_series(unit, points) {
        println!("  {}", line);
    }
}

fn render_series(unit: &str, points: &[SeriesPoint]) -> Vec<String> {
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    points
        .iter()
        .map(|p| {
            let len = if max > 0.0 {
                ((p.value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!("{:>4} {} {}{}", p.name, "#".repeat(len), p.value, unit)
        })
        .collect()
}

pub fn print_doctors(search: &DoctorSearch) {
    if search.doctors.is_empty() {
        println!(
            "{}",
            format!("No specialists found near {}.", search.location).yellow()
        );
        return;
    }
    println!(
        "{}",
        format!(
            "{} near {}:",
            title_case(&search.specialization),
            search.location
        )
        .cyan()
        .bold()
    );
    for doctor in &search.doctors {
        println!("  {} ({})", doctor.name.green().bold(), doctor.specialization);
        if let Some(address) = &doctor.address {
            println!("     {}", address);
        }
        if let Some(phone) = &doctor.phone {
            println!("     {}", phone);
        }
        println!(
            "     {}",
            format!("{:.4}, {:.4}", doctor.latitude, doctor.longitude).dimmed()
        );
    }
}

pub fn print_suggestions() {
    println!("{}", "Try asking:".cyan());
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
    println!();
}

pub fn print_health(status: &HealthStatus) {
    let label = if status.status.eq_ignore_ascii_case("ok")
        || status.status.eq_ignore_ascii_case("healthy")
    {
        status.status.green().bold()
    } else {
        status.status.yellow().bold()
    };
    if status.message.is_empty() {
        println!("Backend: {}", label);
    } else {
        println!("Backend: {} - {}", label, status.message);
    }
}

pub fn print_documents(documents: &[DocumentInfo]) {
    if documents.is_empty() {
        println!("{}", "The backend has no documents loaded.".yellow());
        return;
    }
    println!("{}", "Documents:".cyan().bold());
    for doc in documents {
        println!("  {} {}", doc.name, format!("[{}]", doc.status).dimmed());
    }
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "truthtriage \"your question\"".green().bold());
    println!("    Ask a single question");
    println!();
    println!("  {}", "truthtriage -i [--forensic]".green().bold());
    println!("    Start an interactive session (chat or forensic dashboard)");
    println!();
    println!("  {}", "truthtriage --doctors <LOCATION> \"condition\"".green().bold());
    println!("    Find specialists near a location");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --history                List saved threads");
    println!("  --show <ID>              Print a saved thread");
    println!("  --delete <ID>            Delete a saved thread");
    println!("  --clear-history          Delete all saved threads");
    println!("  --health, --documents    Query the backend");
    println!("  --help                   Show this help message");
    println!();
}

/// Interactive commands and their help text, in display order
pub const INTERACTIVE_COMMANDS: [(&str, &str); 12] = [
    ("/new", "Start a new chat"),
    ("/history", "List saved threads"),
    ("/load <N|ID>", "Continue a saved thread"),
    ("/delete <N|ID>", "Delete a saved thread"),
    ("/rename <N|ID> <TITLE>", "Rename a saved thread"),
    ("/clear", "Delete all saved threads"),
    ("/sources", "Show the sources of the latest answer"),
    ("/metrics", "Show session metrics"),
    ("/doctors <CITY>", "Find specialists for the last question"),
    ("/suggest", "Toggle suggested questions"),
    ("/help", "Show this list"),
    ("exit, quit", "End the session"),
];

pub fn print_interactive_help() {
    println!("{}", "Commands:".cyan());
    for (usage, description) in INTERACTIVE_COMMANDS {
        println!("  {:<24}{}", usage, description);
    }
    println!();
}

/// Cut `text` to at most `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Specialists".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("  short  ", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_render_series_scales_to_max() {
        let points = vec![
            SeriesPoint {
                name: "Q1".into(),
                value: 50.0,
            },
            SeriesPoint {
                name: "Q2".into(),
                value: 100.0,
            },
        ];
        let lines = render_series("%", &points);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(&"#".repeat(BAR_WIDTH / 2)));
        assert!(!lines[0].contains(&"#".repeat(BAR_WIDTH / 2 + 1)));
        assert!(lines[1].ends_with("100%"));
    }

    #[test]
    fn test_render_series_all_zero() {
        let points = vec![SeriesPoint {
            name: "Q1".into(),
            value: 0.0,
        }];
        let lines = render_series("s", &points);
        assert!(!lines[0].contains('#'));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cardiologist"), "Cardiologist");
        assert_eq!(title_case(""), "Specialists");
    }
}
