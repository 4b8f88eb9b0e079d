// Cross-run comparison: the boxed table, the "best of" summary and file exports

use super::BenchmarkResult;
use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

const TOP: &str = "╔═══════════════════════════════════════════════════════════════════════════════════════╗";
const SPLIT: &str = "╠════════════════════════╦═══════════╦════════════╦════════════╦════════════╦═══════════╣";
const MID: &str = "╠════════════════════════╬═══════════╬════════════╬════════════╬════════════╬═══════════╣";
const BOTTOM: &str = "╚════════════════════════╩═══════════╩════════════╩════════════╩════════════╩═══════════╝";

pub fn comparison_table(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TOP);
    let _ = writeln!(out, "║{:^87}║", "STRATEGY COMPARISON");
    let _ = writeln!(out, "{}", SPLIT);
    let _ = writeln!(out, "║ Strategy               ║ Reached   ║ Collisions ║ Avg Dist   ║ Avg TTG    ║ Runtime   ║");
    let _ = writeln!(out, "║                        ║ (%)       ║ (total)    ║ (units)    ║ (s)        ║ (s)       ║");
    let _ = writeln!(out, "{}", MID);

    for result in results {
        let _ = writeln!(
            out,
            "║ {:<22.22} ║ {:>8.1}% ║ {:>10} ║ {:>10.2} ║ {:>10.2} ║ {:>9.2} ║",
            result.algorithm(),
            result.goal_reach_percentage(),
            result.total_collisions(),
            result.average_distance_traveled(),
            result.average_time_to_goal(),
            result.simulation_seconds(),
        );
    }

    let _ = writeln!(out, "{}", BOTTOM);
    out.push_str(&best_of(results));
    out
}

pub fn best_of(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();

    if let Some(best) = results
        .iter()
        .max_by(|a, b| a.goal_reach_percentage().total_cmp(&b.goal_reach_percentage()))
    {
        let _ = writeln!(out, "Most Arrivals: {} ({:.1}%)", best.algorithm(), best.goal_reach_percentage());
    }

    if let Some(best) = results.iter().min_by_key(|r| r.total_collisions()) {
        let _ = writeln!(out, "Fewest Collisions: {} ({})", best.algorithm(), best.total_collisions());
    }

    if let Some(best) = results
        .iter()
        .filter(|r| r.goal_reach_percentage() > 0.0)
        .min_by(|a, b| a.average_time_to_goal().total_cmp(&b.average_time_to_goal()))
    {
        let _ = writeln!(out, "Fastest Arrival: {} ({:.2} s)", best.algorithm(), best.average_time_to_goal());
    }

    out
}

pub fn export_json(results: &[BenchmarkResult], path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(results)?)?;
    Ok(())
}

#[cfg(feature = "latex-export")]
pub fn export_latex_table(results: &[BenchmarkResult], path: impl AsRef<Path>) -> Result<()> {
    let mut tex = String::new();
    tex.push_str("\\begin{table}[h]\n\\centering\n");
    tex.push_str("\\begin{tabular}{lrrrr}\n\\hline\n");
    tex.push_str("Strategy & Reached (\\%) & Collisions & Avg. distance & Avg. time to goal (s) \\\\\n\\hline\n");
    for result in results {
        let _ = writeln!(
            tex,
            "{} & {:.1} & {} & {:.2} & {:.2} \\\\",
            escape_latex(result.algorithm()),
            result.goal_reach_percentage(),
            result.total_collisions(),
            result.average_distance_traveled(),
            result.average_time_to_goal(),
        );
    }
    tex.push_str("\\hline\n\\end{tabular}\n");
    tex.push_str("\\caption{Comparison of navigation strategies}\n\\label{tab:strategy_comparison}\n");
    tex.push_str("\\end{table}\n");

    std::fs::write(path, tex)?;
    Ok(())
}

#[cfg(feature = "latex-export")]
fn escape_latex(s: &str) -> String {
    s.replace('\\', "\\textbackslash{}")
        .replace('&', "\\&")
        .replace('%', "\\%")
        .replace('_', "\\_")
        .replace('#', "\\#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::geometry::Vec2;
    use std::time::Duration;

    fn result(label: &str, reached: bool, collisions: u64) -> BenchmarkResult {
        let mut agent = Agent::new(0, Vec2::ZERO, Vec2::new(1.0, 0.0), 5.0, 10.0);
        if reached {
            agent.advance(0.1);
        }
        for _ in 0..collisions {
            agent.record_collision();
        }
        BenchmarkResult::from_agents(label, &[agent], Duration::from_secs(1))
    }

    #[test]
    fn test_table_lists_every_result() {
        let results = vec![result("naive", true, 8), result("boids", false, 0)];
        let table = comparison_table(&results);
        assert!(table.contains("naive"));
        assert!(table.contains("boids"));
        assert!(table.contains("Most Arrivals: naive (100.0%)"));
        assert!(table.contains("Fewest Collisions: boids (0)"));
        assert!(table.contains("Fastest Arrival: naive"));
    }

    #[test]
    fn test_rare_arrivals_still_rank_after_averaging() {
        // one arrival in three runs rounds the count to zero but not the percentage
        let runs = [result("rare", true, 0), result("rare", false, 0), result("rare", false, 0)];
        let averaged = BenchmarkResult::average(&runs).unwrap();
        assert_eq!(averaged.agents_reached_goal(), 0);

        let lines = best_of(&[averaged]);
        assert!(lines.contains("Most Arrivals: rare (33.3%)"));
        assert!(lines.contains("Fastest Arrival: rare"));
    }

    #[test]
    fn test_best_of_empty() {
        assert!(best_of(&[]).is_empty());
    }

    #[test]
    fn test_export_json() {
        let path = std::env::temp_dir().join(format!("crowdbench_analyzer_{}.json", std::process::id()));
        export_json(&[result("naive", true, 2)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["algorithm"], "naive");
        assert_eq!(value[0]["total_collisions"], 2);
    }
}
