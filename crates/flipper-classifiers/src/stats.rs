use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use statrs::statistics::Statistics;

use crate::data_handling::Dataset;

/// Descriptive summary in the layout of a pandas `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1). NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linear-interpolation quantile of already sorted values.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(Summary {
        count: values.len(),
        mean: values.mean(),
        std: values.std_dev(),
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Summary of one feature per species, in sorted species order.
pub fn describe_by_species(dataset: &Dataset, feature: usize) -> BTreeMap<String, Summary> {
    dataset
        .group_by_species(feature)
        .into_iter()
        .filter_map(|(species, values)| describe(&values).map(|s| (species, s)))
        .collect()
}

/// Pearson correlation between the columns of `x`.
///
/// Entries involving a constant column are NaN.
pub fn correlation_matrix(x: &Array2<f64>) -> Array2<f64> {
    let ncols = x.ncols();
    let mut corr = Array2::<f64>::from_elem((ncols, ncols), f64::NAN);
    let mean = match x.mean_axis(Axis(0)) {
        Some(m) => m,
        None => return corr,
    };
    let centered = x - &mean;
    let cov = centered.t().dot(&centered);
    for i in 0..ncols {
        for j in 0..ncols {
            let denom = (cov[(i, i)] * cov[(j, j)]).sqrt();
            if denom > 0.0 {
                corr[(i, j)] = cov[(i, j)] / denom;
            }
        }
    }
    corr
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

/// Two-sided, pooled-variance two-sample t-test.
///
/// Returns `None` when either group has fewer than 2 values or the pooled
/// variance is zero.
pub fn student_t_test(a: &[f64], b: &[f64]) -> Option<TTestResult> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let df = n1 + n2 - 2.0;
    let pooled_var = ((n1 - 1.0) * a.variance() + (n2 - 1.0) * b.variance()) / df;
    if !(pooled_var > 0.0) {
        return None;
    }
    let se = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
    let statistic = (a.mean() - b.mean()) / se;
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = (2.0 * (1.0 - dist.cdf(statistic.abs()))).clamp(0.0, 1.0);
    Some(TTestResult {
        statistic,
        p_value,
        df,
    })
}

/// Cohen's d: mean difference over the pooled sample standard deviation.
pub fn cohens_d(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let pooled_std =
        (((n1 - 1.0) * a.variance() + (n2 - 1.0) * b.variance()) / (n1 + n2 - 2.0)).sqrt();
    if pooled_std > 0.0 {
        Some((a.mean() - b.mean()) / pooled_std)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
}

/// One-way ANOVA across two or more groups.
pub fn one_way_anova(groups: &[&[f64]]) -> Option<AnovaResult> {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n <= k || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = g.mean();
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    if !(ss_within > 0.0) {
        return None;
    }
    let f_statistic = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).ok()?;
    let p_value = (1.0 - dist.cdf(f_statistic)).clamp(0.0, 1.0);
    Some(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub first: String,
    pub second: String,
    pub t_test: Option<TTestResult>,
    pub cohens_d: Option<f64>,
}

/// t-test and effect size for every species pair, in sorted species order.
pub fn pairwise_species_comparisons(dataset: &Dataset, feature: usize) -> Vec<PairwiseComparison> {
    let groups: Vec<(String, Vec<f64>)> = dataset.group_by_species(feature).into_iter().collect();
    let mut out = Vec::new();
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            let (a_name, a) = &groups[i];
            let (b_name, b) = &groups[j];
            out.push(PairwiseComparison {
                first: a_name.clone(),
                second: b_name.clone(),
                t_test: student_t_test(a, b),
                cohens_d: cohens_d(a, b),
            });
        }
    }
    out
}

/// ANOVA of one feature across all species.
pub fn species_anova(dataset: &Dataset, feature: usize) -> Option<AnovaResult> {
    let groups = dataset.group_by_species(feature);
    let slices: Vec<&[f64]> = groups.values().map(|v| v.as_slice()).collect();
    one_way_anova(&slices)
}

pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        "ns"
    }
}
