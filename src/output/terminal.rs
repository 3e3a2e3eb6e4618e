// Colored terminal output for measurement results.
//
// This module handles all terminal-specific formatting; main.rs delegates
// here. It stands in for the dashboard widgets the artifacts were built for.

use colored::Colorize;

use crate::npmi::PairedBiasTable;
use crate::stats::general::{GeneralStats, TopVocab};
use crate::stats::lengths::LengthStats;
use crate::vocab::Vocabulary;

/// Display the most frequent words of a vocabulary.
pub fn display_vocab(vocab: &Vocabulary, top_n: usize, title: &str) {
    println!(
        "\n{}",
        format!("=== {title} ({} distinct words) ===", vocab.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<24} {:>10}  {:>10}",
        "Rank".dimmed(),
        "Word".dimmed(),
        "Count".dimmed(),
        "Proportion".dimmed(),
    );
    println!("  {}", "-".repeat(54).dimmed());
    for (i, (word, entry)) in vocab.sorted_by_count().into_iter().take(top_n).enumerate() {
        println!(
            "  {:>4}. {:<24} {:>10}  {:>10.6}",
            i + 1,
            word,
            entry.count,
            entry.proportion,
        );
    }
    println!();
}

pub fn display_length_stats(stats: &LengthStats) {
    println!("\n{}", "=== Text Lengths ===".bold());
    println!("  Mean tokens per document:  {}", stats.avg_length);
    println!("  Standard deviation:        {}", stats.std_length);
    println!("  Distinct lengths:          {}", stats.num_uniq_lengths);
    println!();
}

pub fn display_general_stats(stats: &GeneralStats, top_vocab: Option<&TopVocab>) {
    println!("\n{}", "=== General Statistics ===".bold());
    println!("  Total words:       {}", stats.total_words);
    println!("  Total open words:  {}", stats.total_open_words);
    println!("  Missing texts:     {}", stats.text_nan_count);

    let dup_pct = stats.duplicate_fraction * 100.0;
    let dup_str = format!("{dup_pct:.2}%");
    let colored_dup = if stats.duplicate_fraction >= 0.1 {
        dup_str.red()
    } else if stats.duplicate_fraction > 0.0 {
        dup_str.yellow()
    } else {
        dup_str.green()
    };
    println!("  Duplicate docs:    {colored_dup}");

    if let Some(top) = top_vocab {
        let preview: Vec<&str> = top.rows.iter().take(10).map(|(w, _)| w.as_str()).collect();
        println!("  Top open words:    {}", preview.join(", ").dimmed());
    }
    println!();
}

pub fn display_available_terms(terms: &[String]) {
    println!("\n{}", "=== Available Identity Terms ===".bold());
    if terms.is_empty() {
        println!("  None of the configured terms occur often enough in this dataset.");
    } else {
        for term in terms {
            println!("  {term}");
        }
    }
    println!();
}

/// Display a pairwise bias table: the most subgroup2-leaning words first,
/// then the most subgroup1-leaning, mirroring the ascending bias sort.
pub fn display_bias(table: &PairedBiasTable, top_n: usize) {
    let s1 = &table.subgroup1;
    let s2 = &table.subgroup2;
    println!(
        "\n{}",
        format!(
            "=== nPMI Bias: {s1} vs {s2} ({} shared words) ===",
            table.rows.len()
        )
        .bold()
    );
    println!(
        "  bias = npmi({s1}) - npmi({s2}); negative leans {s2}, positive leans {s1}"
    );
    println!();
    println!(
        "  {:<24} {:>9} {:>9} {:>7} {:>7} {:>9}",
        "Word".dimmed(),
        format!("{s1}-npmi").dimmed(),
        format!("{s2}-npmi").dimmed(),
        format!("{s1}-n").dimmed(),
        format!("{s2}-n").dimmed(),
        "bias".dimmed(),
    );
    println!("  {}", "-".repeat(70).dimmed());

    // Both ends of the spectrum matter; elide only the middle.
    let n = table.rows.len();
    if n <= 2 * top_n {
        for row in &table.rows {
            print_bias_row(row);
        }
    } else {
        for row in table.rows.iter().take(top_n) {
            print_bias_row(row);
        }
        println!("  {}", format!("... {} more ...", n - 2 * top_n).dimmed());
        for row in table.rows.iter().skip(n - top_n) {
            print_bias_row(row);
        }
    }
    println!();
}

fn print_bias_row(row: &crate::npmi::PairedBiasRow) {
    let bias_str = format!("{:>9.4}", row.bias);
    let colored_bias = if row.bias < 0.0 {
        bias_str.bright_blue()
    } else if row.bias > 0.0 {
        bias_str.bright_magenta()
    } else {
        bias_str.normal()
    };
    println!(
        "  {:<24} {:>9.4} {:>9.4} {:>7} {:>7} {colored_bias}",
        row.word, row.npmi1, row.npmi2, row.count1, row.count2,
    );
}
