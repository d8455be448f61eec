//! Plain-text rendering of a `FlipperAnalysis`.
use std::io::{self, Write};

use flipper_classifiers::data_handling::{BODY_MASS, FEATURE_NAMES, FLIPPER_LENGTH};
use flipper_classifiers::metrics::{ClassMetrics, ConfusionMatrix};
use flipper_classifiers::stats::{significance_stars, Summary};

use crate::analysis::run::FlipperAnalysis;

const RULE: &str = "==================================================";

fn correlation_strength(r: f64) -> &'static str {
    let r = r.abs();
    if r >= 0.7 {
        "Strong"
    } else if r >= 0.4 {
        "Moderate"
    } else {
        "Weak"
    }
}

/// Headline conclusions computed from the analysis.
pub fn key_findings(analysis: &FlipperAnalysis) -> Vec<String> {
    let mut findings = Vec::new();

    let longest = analysis
        .flipper_by_species
        .iter()
        .max_by(|a, b| a.1.mean.total_cmp(&b.1.mean));
    if let Some((species, summary)) = longest {
        findings.push(format!(
            "{} penguins have the longest flippers on average ({:.1} mm)",
            species, summary.mean
        ));
    }

    let results = &analysis.output.results;
    let lowest = results
        .successful()
        .map(|r| r.accuracy)
        .min_by(|a, b| a.total_cmp(b));
    if let Some(lowest) = lowest {
        let trained = results.successful().count();
        if trained == results.len() {
            findings.push(format!(
                "All {} models reach at least {:.1}% test accuracy in species prediction",
                trained,
                lowest * 100.0
            ));
        } else {
            findings.push(format!(
                "{} of {} models trained; the weakest reaches {:.1}% test accuracy",
                trained,
                results.len(),
                lowest * 100.0
            ));
        }
    }

    if let Ok(importance) = &analysis.output.importance {
        if let Some(top) = importance.first() {
            findings.push(format!(
                "{} is the most important feature for species classification ({:.3})",
                top.feature, top.importance
            ));
        }
    }

    let r = analysis.correlation[(FLIPPER_LENGTH, BODY_MASS)];
    if r.is_finite() {
        findings.push(format!(
            "{} correlation between flipper length and body mass (r = {:.3})",
            correlation_strength(r),
            r
        ));
    }

    let tested: Vec<_> = analysis
        .flipper_pairwise
        .iter()
        .filter_map(|c| c.t_test)
        .collect();
    if !tested.is_empty() {
        let significant = tested.iter().filter(|t| t.p_value < 0.05).count();
        if significant == tested.len() {
            findings.push("Significant differences in flipper length between all species pairs".to_string());
        } else {
            findings.push(format!(
                "Significant flipper length differences in {} of {} species pairs",
                significant,
                tested.len()
            ));
        }
    }

    if let Some(best) = results.best() {
        findings.push(format!(
            "Best performing model: {} (Accuracy: {:.4})",
            best.name, best.accuracy
        ));
    }

    findings
}

fn write_summary_row<W: Write>(w: &mut W, label: &str, s: &Summary) -> io::Result<()> {
    writeln!(
        w,
        "{:<12} {:>6} {:>9.2} {:>8.2} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
        label, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
    )
}

fn write_metrics_row<W: Write>(w: &mut W, label: &str, m: &ClassMetrics) -> io::Result<()> {
    writeln!(
        w,
        "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>8}",
        label, m.precision, m.recall, m.f1, m.support
    )
}

fn write_confusion<W: Write>(w: &mut W, cm: &ConfusionMatrix, classes: &[String]) -> io::Result<()> {
    writeln!(w, "Confusion matrix (rows = true, columns = predicted):")?;
    write!(w, "{:>14}", "")?;
    for class in classes {
        write!(w, " {:>10}", class)?;
    }
    writeln!(w)?;
    for (i, row) in cm.counts.rows().into_iter().enumerate() {
        write!(w, "{:>14}", classes.get(i).map(String::as_str).unwrap_or("?"))?;
        for count in row {
            write!(w, " {:>10}", count)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_report<W: Write>(w: &mut W, analysis: &FlipperAnalysis) -> io::Result<()> {
    let prepared = &analysis.output.prepared;
    let classes = prepared.encoder.classes();

    writeln!(w, "Palmer Penguins Flipper Length Analysis")?;
    writeln!(w, "{}", RULE)?;
    writeln!(
        w,
        "Generated: {}",
        analysis.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(w, "Data file: {}", analysis.data_path.display())?;
    writeln!(
        w,
        "Rows read: {}, dropped with missing values: {}, kept: {}",
        analysis.load.rows_read,
        analysis.load.rows_dropped,
        analysis.load.rows_kept()
    )?;

    writeln!(w, "\n=== SPECIES DISTRIBUTION ===")?;
    for (species, count) in analysis.dataset.species_counts() {
        writeln!(w, "{:<12} {:>6}", species, count)?;
    }

    writeln!(w, "\n=== FLIPPER LENGTH STATISTICS ===")?;
    writeln!(
        w,
        "{:<12} {:>6} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    if let Some(overall) = &analysis.flipper_overall {
        write_summary_row(w, "all", overall)?;
    }
    for (species, summary) in &analysis.flipper_by_species {
        write_summary_row(w, species, summary)?;
    }

    writeln!(w, "\n=== FEATURE CORRELATION ===")?;
    write!(w, "{:<18}", "")?;
    for name in FEATURE_NAMES {
        write!(w, " {:>18}", name)?;
    }
    writeln!(w)?;
    for (i, row) in analysis.correlation.rows().into_iter().enumerate() {
        write!(w, "{:<18}", FEATURE_NAMES[i])?;
        for r in row {
            write!(w, " {:>18.3}", r)?;
        }
        writeln!(w)?;
    }

    writeln!(w, "\n=== MACHINE LEARNING MODELS ===")?;
    writeln!(w, "Species encoding: {:?}", prepared.encoder.mapping())?;
    writeln!(
        w,
        "Training set: {} x {}, test set: {} x {}",
        prepared.x_train.nrows(),
        prepared.x_train.ncols(),
        prepared.x_test.nrows(),
        prepared.x_test.ncols()
    )?;

    for outcome in analysis.output.results.iter() {
        writeln!(w, "\n--- {} ---", outcome.name)?;
        let result = match &outcome.result {
            Ok(result) => result,
            Err(e) => {
                writeln!(w, "FAILED: {}", e)?;
                continue;
            }
        };
        writeln!(w, "Test accuracy: {:.4}", result.accuracy)?;
        writeln!(
            w,
            "{:>14} {:>10} {:>10} {:>10} {:>8}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (class, metrics) in classes.iter().zip(&result.report.per_class) {
            write_metrics_row(w, class, metrics)?;
        }
        writeln!(
            w,
            "{:>14} {:>32.2} {:>8}",
            "accuracy",
            result.report.accuracy,
            result.confusion.total()
        )?;
        write_metrics_row(w, "macro avg", &result.report.macro_avg)?;
        write_metrics_row(w, "weighted avg", &result.report.weighted_avg)?;
        write_confusion(w, &result.confusion, classes)?;
    }

    let source = analysis
        .config
        .pipeline
        .importance_source()
        .map(|m| m.name.as_str())
        .unwrap_or("-");
    writeln!(w, "\n=== FEATURE IMPORTANCE ({}) ===", source)?;
    match &analysis.output.importance {
        Ok(ranked) => {
            for entry in ranked {
                writeln!(w, "{:<20} {:.4}", entry.feature, entry.importance)?;
            }
        }
        Err(e) => writeln!(w, "Unavailable: {}", e)?,
    }

    writeln!(w, "\n=== ADVANCED FLIPPER LENGTH ANALYSIS ===")?;
    writeln!(w, "T-test results for flipper length differences:")?;
    for c in &analysis.flipper_pairwise {
        match c.t_test {
            Some(t) => writeln!(
                w,
                "{} vs {}: t-stat={:.4}, p-value={:.6} {}",
                c.first,
                c.second,
                t.statistic,
                t.p_value,
                significance_stars(t.p_value)
            )?,
            None => writeln!(w, "{} vs {}: undefined", c.first, c.second)?,
        }
    }
    writeln!(w, "\nEffect sizes (Cohen's d):")?;
    for c in &analysis.flipper_pairwise {
        match c.cohens_d {
            Some(d) => writeln!(w, "{} vs {}: d={:.4}", c.first, c.second, d)?,
            None => writeln!(w, "{} vs {}: undefined", c.first, c.second)?,
        }
    }
    writeln!(w, "\nOne-way ANOVA:")?;
    match &analysis.flipper_anova {
        Some(a) => writeln!(
            w,
            "F-statistic: {:.4}, p-value: {:.6} (df = {}, {})",
            a.f_statistic, a.p_value, a.df_between, a.df_within
        )?,
        None => writeln!(w, "undefined")?,
    }

    writeln!(w, "\n=== ANALYSIS COMPLETE ===")?;
    writeln!(w, "Key findings:")?;
    for (i, finding) in key_findings(analysis).iter().enumerate() {
        writeln!(w, "{}. {}", i + 1, finding)?;
    }
    Ok(())
}

/// Render the report into a string.
pub fn render_report(analysis: &FlipperAnalysis) -> io::Result<String> {
    let mut buf = Vec::new();
    write_report(&mut buf, analysis)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
