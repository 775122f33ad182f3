//! Per-item and per-test statistical computations.
//!
//! Every function here is pure: the engine gathers tallies and feeds them
//! through difficulty, ordinate, correlation, and classification in turn.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normal-curve ordinate used when an item's difficulty is exactly one half.
pub const ORDINATE_AT_MEDIAN: f64 = 0.39894;

/// Minimum proportion choosing a distractor, indexed by the number of choices.
const DISTRACTOR_THRESHOLDS: [f64; 9] = [0.2, 0.2, 0.1, 0.07, 0.05, 0.04, 0.04, 0.04, 0.04];

/// Proportion band outside of which the keyed choice is questionable.
pub const KEY_PROPORTION_BAND: (f64, f64) = (0.2, 0.8);

/// Relative closeness test used for the exact-value branches.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let tolerance = (1e-9 * a.abs().max(b.abs())).max(f64::EPSILON);
    (a - b).abs() <= tolerance
}

/// Fraction of students answering an item correctly.
pub fn difficulty(correct: u64, students: usize) -> f64 {
    if students == 0 {
        0.0
    } else {
        correct as f64 / students as f64
    }
}

/// Percentage-passing bucket of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassingRange {
    #[serde(rename = "0-19")]
    ZeroTo19,
    #[serde(rename = "20-39")]
    TwentyTo39,
    #[serde(rename = "40-59")]
    FortyTo59,
    #[serde(rename = "60-79")]
    SixtyTo79,
    #[serde(rename = "80-100")]
    EightyTo100,
}

impl PassingRange {
    pub const ALL: [PassingRange; 5] = [
        PassingRange::ZeroTo19,
        PassingRange::TwentyTo39,
        PassingRange::FortyTo59,
        PassingRange::SixtyTo79,
        PassingRange::EightyTo100,
    ];

    /// Bucket a difficulty. Returns `None` above 1.0.
    pub fn classify(difficulty: f64) -> Option<Self> {
        if difficulty <= 0.19 {
            Some(PassingRange::ZeroTo19)
        } else if difficulty <= 0.39 {
            Some(PassingRange::TwentyTo39)
        } else if difficulty <= 0.59 {
            Some(PassingRange::FortyTo59)
        } else if difficulty <= 0.79 {
            Some(PassingRange::SixtyTo79)
        } else if difficulty <= 1.0 {
            Some(PassingRange::EightyTo100)
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            PassingRange::ZeroTo19 => "0-19",
            PassingRange::TwentyTo39 => "20-39",
            PassingRange::FortyTo59 => "40-59",
            PassingRange::SixtyTo79 => "60-79",
            PassingRange::EightyTo100 => "80-100",
        }
    }
}

impl fmt::Display for PassingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difficulty rating 1..=5 printed in summary-only reports.
///
/// Items near the middle of the difficulty scale rate highest.
pub fn difficulty_rating(difficulty: f64) -> u8 {
    let within = |low: f64, high: f64| difficulty > low && difficulty <= high;
    if within(0.40, 0.61) {
        5
    } else if within(0.30, 0.71) {
        4
    } else if within(0.20, 0.81) {
        3
    } else if within(0.10, 0.91) {
        2
    } else {
        1
    }
}

/// Ordinate of the standard normal density at the point whose upper-tail
/// area is `area`, by Hastings' rational approximation.
///
/// The constants (including the truncated value of e) are part of the
/// historical report format and must not be changed.
pub fn hastings_ordinate(area: f64) -> f64 {
    let eta = (1.0 / (area * area)).ln().sqrt();
    let abscissa =
        eta - (2.30753 + 0.27061 * eta) / (1.0 + 0.99229 * eta + 0.04481 * eta * eta);
    0.3989422 * (1.0 / 2.7182818_f64.powf(abscissa * abscissa / 2.0))
}

/// Normal ordinate for an item of the given difficulty.
pub fn ordinate(difficulty: f64) -> f64 {
    if difficulty < 0.5 {
        hastings_ordinate(1.0 - difficulty)
    } else if difficulty > 0.5 {
        hastings_ordinate(difficulty)
    } else {
        ORDINATE_AT_MEDIAN
    }
}

/// Biserial, point-biserial, and t values of one item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub biserial: f64,
    pub point_biserial: f64,
    pub t: f64,
}

impl Correlation {
    pub const ZERO: Correlation = Correlation {
        biserial: 0.0,
        point_biserial: 0.0,
        t: 0.0,
    };
}

/// Tallies needed to correlate one item with the total score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTally {
    pub students: usize,
    pub correct: u64,
    pub correct_score_sum: u64,
    pub incorrect_score_sum: u64,
}

/// Derived discrimination values of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemCorrelation {
    pub correlation: Correlation,
    pub mean_correct: f64,
    pub mean_incorrect: f64,
    /// Zero when the ordinate branch was not reached.
    pub ordinate: f64,
    /// `p * q`, the item's contribution to the KR-20 variance sum.
    pub item_variance: f64,
    /// Everyone answered the item alike. Such items stay out of the
    /// correlation histogram and the mean difficulty and biserial sums.
    pub degenerate: bool,
}

/// Correlate an item with the total test score.
pub fn correlate(tally: &ItemTally, score_mean: f64, score_std_dev: f64) -> ItemCorrelation {
    let d = difficulty(tally.correct, tally.students);
    let degenerate = |mean_correct, mean_incorrect| ItemCorrelation {
        correlation: Correlation::ZERO,
        mean_correct,
        mean_incorrect,
        ordinate: 0.0,
        item_variance: 0.0,
        degenerate: true,
    };

    if !(0.0..=1.0).contains(&d) {
        return degenerate(0.0, 0.0);
    }
    if approx_eq(d, 0.0) {
        return degenerate(0.0, score_mean);
    }
    if approx_eq(d, 1.0) {
        return degenerate(score_mean, 0.0);
    }

    let y = ordinate(d);
    let n = tally.students as f64;
    let correct = tally.correct as f64;
    let mean_correct = tally.correct_score_sum as f64 / correct;
    let mean_incorrect = tally.incorrect_score_sum as f64 / (n - correct);
    let q = 1.0 - d;

    let correlation = if approx_eq(score_std_dev, 0.0) {
        Correlation::ZERO
    } else {
        let biserial = ((mean_correct - mean_incorrect) / score_std_dev) * d * q / y;
        let point_biserial = biserial * (y / (d * q).sqrt());
        let denominator = 1.0 - point_biserial * point_biserial;
        let t = if denominator > 0.0 && n > 2.0 {
            point_biserial * ((n - 2.0) / denominator).sqrt()
        } else {
            0.0
        };
        Correlation {
            biserial,
            point_biserial,
            t,
        }
    };

    ItemCorrelation {
        correlation,
        mean_correct,
        mean_incorrect,
        ordinate: y,
        item_variance: d * q,
        degenerate: false,
    }
}

/// Biserial-correlation quality bucket of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorrelationRange {
    VeryPoor,
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl CorrelationRange {
    pub const ALL: [CorrelationRange; 6] = [
        CorrelationRange::VeryPoor,
        CorrelationRange::Poor,
        CorrelationRange::Fair,
        CorrelationRange::Good,
        CorrelationRange::VeryGood,
        CorrelationRange::Excellent,
    ];

    pub fn classify(biserial: f64) -> Self {
        if biserial <= 0.10 {
            CorrelationRange::VeryPoor
        } else if biserial <= 0.30 {
            CorrelationRange::Poor
        } else if biserial <= 0.50 {
            CorrelationRange::Fair
        } else if biserial <= 0.70 {
            CorrelationRange::Good
        } else if biserial <= 0.90 {
            CorrelationRange::VeryGood
        } else {
            CorrelationRange::Excellent
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CorrelationRange::VeryPoor => "negative - .10",
            CorrelationRange::Poor => ".11 - .30",
            CorrelationRange::Fair => ".31 - .50",
            CorrelationRange::Good => ".51 - .70",
            CorrelationRange::VeryGood => ".71 - .90",
            CorrelationRange::Excellent => ".91 -",
        }
    }
}

impl fmt::Display for CorrelationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum chosen-proportion for a distractor when items have `choices` options.
pub fn distractor_threshold(choices: u32) -> f64 {
    let index = (choices as usize).min(DISTRACTOR_THRESHOLDS.len() - 1);
    DISTRACTOR_THRESHOLDS[index]
}

/// Mean, variance, and derived spread of a set of total scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMoments {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// Standard error of a correlation, `1 / sqrt(N - 1)`.
    pub standard_error: f64,
}

impl ScoreMoments {
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let (mut count, mut sum, mut sum_sq) = (0u128, 0u128, 0u128);
        for s in scores {
            let s = u128::from(s);
            count += 1;
            sum += s;
            sum_sq += s * s;
        }
        if count == 0 {
            return Self::default();
        }
        let n = count as f64;
        let mean = sum as f64 / n;
        if count < 2 {
            return Self {
                count: count as usize,
                mean,
                ..Self::default()
            };
        }
        // Exact in integers, so never negative.
        let numerator = count * sum_sq - sum * sum;
        let variance = numerator as f64 / (n * (n - 1.0));
        Self {
            count: count as usize,
            mean,
            variance,
            std_dev: variance.sqrt(),
            standard_error: 1.0 / (n - 1.0).sqrt(),
        }
    }
}

/// Kuder-Richardson 20 reliability over `items` items.
pub fn kr20(items: usize, test_variance: f64, item_variance_sum: f64) -> f64 {
    if items < 2 || approx_eq(test_variance, 0.0) {
        return 0.0;
    }
    let k = items as f64;
    (k / (k - 1.0)) * ((test_variance - item_variance_sum) / test_variance)
}

/// Standard error of measurement based on a reliability estimate.
pub fn standard_error_of_measurement(std_dev: f64, reliability: f64) -> f64 {
    std_dev * (1.0 - reliability).max(0.0).sqrt()
}
