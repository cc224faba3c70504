// src/grading/statistics.rs

use serde::Serialize;

use crate::config::PASSING_PERCENTAGE;
use crate::models::result::QuizResult;

/// Letter band of the grade histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    A,
    B,
    C,
    D,
    F,
}

impl GradeBand {
    /// Boundary values belong to the higher band (90.0 is an A, 89.999 a B).
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            GradeBand::A
        } else if percentage >= 80.0 {
            GradeBand::B
        } else if percentage >= 70.0 {
            GradeBand::C
        } else if percentage >= 60.0 {
            GradeBand::D
        } else {
            GradeBand::F
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A (90-100)")]
    pub a: usize,
    #[serde(rename = "B (80-89)")]
    pub b: usize,
    #[serde(rename = "C (70-79)")]
    pub c: usize,
    #[serde(rename = "D (60-69)")]
    pub d: usize,
    #[serde(rename = "F (0-59)")]
    pub f: usize,
}

impl GradeDistribution {
    fn record(&mut self, band: GradeBand) {
        let slot = match band {
            GradeBand::A => &mut self.a,
            GradeBand::B => &mut self.b,
            GradeBand::C => &mut self.c,
            GradeBand::D => &mut self.d,
            GradeBand::F => &mut self.f,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.a + self.b + self.c + self.d + self.f
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStatistics {
    pub total_students: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub pass_rate: f64,
    pub grade_distribution: GradeDistribution,
}

/// Aggregator output. `Empty` serialises as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticsReport {
    Empty {},
    Summary(ClassStatistics),
}

impl StatisticsReport {
    pub fn summary(&self) -> Option<&ClassStatistics> {
        match self {
            StatisticsReport::Summary(stats) => Some(stats),
            StatisticsReport::Empty {} => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StatisticsReport::Empty {})
    }
}

/// Summarises any collection of results: one quiz, one student, or everything.
pub fn class_statistics<'a, I>(results: I) -> StatisticsReport
where
    I: IntoIterator<Item = &'a QuizResult>,
{
    summarize(results.into_iter().map(|r| r.percentage))
}

/// Same computation over bare percentages.
pub fn summarize<I>(percentages: I) -> StatisticsReport
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut highest = f64::MIN;
    let mut lowest = f64::MAX;
    let mut passed = 0usize;
    let mut distribution = GradeDistribution::default();

    for p in percentages {
        count += 1;
        sum += p;
        highest = highest.max(p);
        lowest = lowest.min(p);
        if p >= PASSING_PERCENTAGE {
            passed += 1;
        }
        distribution.record(GradeBand::from_percentage(p));
    }

    if count == 0 {
        return StatisticsReport::Empty {};
    }

    StatisticsReport::Summary(ClassStatistics {
        total_students: count,
        average_score: sum / count as f64,
        highest_score: highest,
        lowest_score: lowest,
        pass_rate: passed as f64 / count as f64 * 100.0,
        grade_distribution: distribution,
    })
}
