//! Fixed-width printout in the historical line-printer layout.
//!
//! Lines starting with `1` begin a new page and lines starting with `0`
//! are preceded by a blank line, as carriage control characters.

use chrono::Datelike;

use itemal_core::model::{reverse_choice, Exam, ExamSection, Options};
use itemal_core::report::{ExamSummary, ItemStatistics, SectionSummary};

/// Number of group columns in the option tables.
const GROUP_COLUMNS: usize = 5;

/// Key digits per block and blocks per row of the control card summary.
const KEY_BLOCK: usize = 5;
const KEY_BLOCKS_PER_ROW: usize = 15;

/// Generate the full printout for an analyzed exam.
pub fn generate_text(exam: &Exam) -> String {
    let mut out = String::new();

    for section in exam.sections() {
        control_card(&mut out, exam, section);
        let Some(summary) = section.statistical_summary() else {
            continue;
        };
        let options = section.options();
        if options.is_summary_only() {
            for _ in 0..options.copies() {
                item_index(&mut out, summary);
            }
        } else {
            for _ in 0..options.copies() {
                item_tables(&mut out, summary);
            }
        }
    }

    if let Some(summary) = exam.statistical_summary() {
        let last = exam.sections().last().map(ExamSection::options);
        for _ in 0..summary_copies(last) {
            test_information(&mut out, summary);
        }
    }
    out
}

/// Copies of the test information page: one, or three when two were requested.
pub fn summary_copies(options: Option<&Options>) -> usize {
    match options.map(Options::copies).unwrap_or(1) {
        0 | 1 => 1,
        _ => 3,
    }
}

fn control_card(out: &mut String, exam: &Exam, section: &ExamSection) {
    let options = section.options();
    let choices = section.responses_per_question();
    let (month, day, year) = exam
        .date
        .map(|d| (d.month(), d.day(), d.format("%y").to_string()))
        .unwrap_or((0, 0, String::new()));

    out.push_str("                                  ITEM ANALYSIS FOR DATA HAVING SPECIFIABLE RIGHT-WRONG ANSWERS\n\n\n\n\n");
    out.push_str("                                 THE USER HAS SPECIFIED THE FOLLOWING INFORMATION ON CONTROL CARDS\n\n\n\n");
    out.push_str(&format!("                    JOB NUMBER{:6}\n\n", exam.id));
    out.push_str(&format!("                    COURSE  {:10.10}\n\n", exam.course));
    out.push_str(&format!("                    INSTRUCTOR  {:10.10}\n\n", exam.instructor));
    out.push_str(&format!(
        "                    DATE (MONTH, DAY, YEAR)  {month:4}{day:4}{year:>4}\n"
    ));
    out.push_str(&format!(
        "\n                    NUMBER OF STUDENTS{:6}\n\n                    NUMBER OF ITEMS{:5}\n\n",
        section.student_count(),
        section.question_count()
    ));
    out.push_str(&format!(
        "                    ITEM EVALUATION OPTION (0=NO, 1=YES){:4}\n\n                    MAXIMUM NUMBER OF ANSWER CHOICES{:4}\n\n",
        u8::from(!options.is_summary_only()),
        choices
    ));

    let format = section.input_format().unwrap_or("");
    out.push_str(&format!("\n                         INPUT FORMAT   {format}\n"));
    if options.is_reverse_order() {
        out.push_str(&format!(
            "                         RESPONSE FORM{:2}=A,{:2}=B, ...\n",
            choices,
            choices.saturating_sub(1)
        ));
    } else {
        out.push_str("                         RESPONSE FORM  1=A, 2= B, 3=C, ...ETC\n");
    }

    out.push_str(&format!(
        "\n                    NUMBER OF COPIES OF OUTPUT (MAX. ALLOWED=2){:3}\n\n                    CORRECT ANSWERS IN GROUPS OF FIVE\n",
        options.copies()
    ));
    let key: Vec<String> = section
        .answer_key()
        .iter()
        .map(|&k| match section.reversal_maximum() {
            Some(maximum) => reverse_choice(k as i32, maximum).to_string(),
            None => k.to_string(),
        })
        .collect();
    let blocks: Vec<String> = key.chunks(KEY_BLOCK).map(|block| block.concat()).collect();
    for row in blocks.chunks(KEY_BLOCKS_PER_ROW) {
        out.push_str(&format!("                         {}\n", row.join(" ")));
    }
    out.push_str("1\n");
}

fn item_tables(out: &mut String, summary: &SectionSummary) {
    out.push_str("1\n");
    let (mut l1, mut l2) = (0, 1);
    for (i, item) in summary.items.iter().enumerate() {
        l1 += 1;
        l2 += 1;
        let new_page = if i < 2 {
            false
        } else if summary.responses_per_question <= 5 {
            l2 > 3
        } else {
            l1 > 2
        };
        if new_page {
            l1 = 1;
            l2 = 1;
        }
        item_table(out, summary, item, new_page);
    }
}

fn item_table(out: &mut String, summary: &SectionSummary, item: &ItemStatistics, new_page: bool) {
    out.push_str(&format!(
        "{}               ITEM NUMBER{:4}        CORRECT ANSWER AND ITEM DIFFICULTY INDEX ARE IDENTIFIED BY  * \n\n",
        if new_page { '1' } else { ' ' },
        item.question_number
    ));
    out.push_str("   OPTIONS     1ST    2ND    3RD    4TH    5TH   RESPONSE    PROPORTION    MEAN      OPTIONS\n");
    out.push_str("              GROUP  GROUP  GROUP  GROUP  GROUP    TOTAL      CHOOSING     SCORE   QUESTIONABLE\n");

    for choice in &item.choices {
        let star = if choice.is_key { '*' } else { ' ' };
        let counts = group_columns(&choice.per_group_counts);
        if choice.answer_index == 0 {
            out.push_str(&format!(
                "   {star}OMIT     {}     {:4}        {star}{:6.3}      {:6.2}\n",
                counts,
                choice.response_total,
                choice.proportion_choosing,
                choice.mean_score
            ));
        } else {
            out.push_str(&format!(
                "  {star}{} OR {}    {}     {:4}        {star}{:6.3}      {:6.2}        {}\n",
                choice.label,
                choice.answer_index,
                counts,
                choice.response_total,
                choice.proportion_choosing,
                choice.mean_score,
                if choice.is_questionable { '?' } else { ' ' }
            ));
        }
    }

    let group_counts: Vec<u64> = summary
        .group_student_counts
        .iter()
        .map(|&n| n as u64)
        .collect();
    let tallied: u64 = item.choices.iter().map(|c| c.response_total).sum();
    out.push_str(&format!(
        "0  TOTAL     {}     {:4}\n",
        group_columns(&group_counts),
        tallied
    ));
    out.push_str(&format!(
        "0BISERIAL CORRELATION BETWEEN ITEM SCORE AND TOTAL SCORE ON TEST = {:6.3}\n",
        item.biserial
    ));
    out.push_str(&format!(
        " POINT-BISERIAL CORRELATION = {:6.3}              T = {:6.3}\n\n\n\n",
        item.point_biserial, item.t
    ));
}

/// Five right-aligned count columns; missing groups print as zero.
fn group_columns(counts: &[u64]) -> String {
    (0..GROUP_COLUMNS)
        .map(|g| format!("{:3}", counts.get(g).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join("    ")
}

fn item_index(out: &mut String, summary: &SectionSummary) {
    out.push_str("1               ITEM DIFFICULTY INDEX (5=MOST DISCRIMINATING RANGE, 1=LEAST)\n\n");
    out.push_str("      ITEM    KEY    DIFFICULTY    INDEX    BISERIAL\n");
    for item in &summary.items {
        out.push_str(&format!(
            "      {:4}    {:>3}      {:6.3}       {:2}      {:6.3}\n",
            item.question_number,
            item.correct_label,
            item.difficulty,
            item.difficulty_rating,
            item.biserial
        ));
    }
    out.push_str(" \n\n\n\n");
}

fn test_information(out: &mut String, summary: &ExamSummary) {
    out.push_str(&format!(
        "1                                                  ADDITIONAL TEST INFORMATION\n\n\n\n               THE MEAN ITEM DIFFICULTY FOR THE ENTIRE TEST ={:7.3}\n\n               THE MEAN ITEM SCORE - TOTAL SCORE BISERIAL CORRELATION ={:6.3}\n",
        summary.mean_difficulty, summary.mean_biserial
    ));
    out.push_str(&format!(
        "\n               KUDER-RICHARDSON 20 RELIABILITY ={:7.3}\n\n               TEST MEAN ={:7.2}   VARIANCE ={:10.2}   STANDARD DEVIATION ={:7.2}\n\n",
        summary.kr20_reliability, summary.score_mean, summary.variance, summary.std_deviation
    ));
    out.push_str(&format!(
        "               STANDARD ERROR OF MEASUREMENT (BASED ON KR-20) ={:7.2}\n\n               NUMBER OF STUDENTS ={:5}        NUMBER OF ITEMS ON TEST ={:5}\n\n\n\n\n",
        summary.standard_error_of_measurement, summary.student_count, summary.question_count
    ));

    out.push_str("           DISTRIBUTION OF THE TEST ITEMS                                       DISTRIBUTION OF THE TEST ITEMS\n");
    out.push_str(" IN TERMS OF THE PERCENTAGE OF STUDENTS PASSING THEM              IN TERMS OF ITEM SCORE - TOTAL SCORE BISERIAL CORRELATIONS\n\n\n");
    out.push_str("      PERCENT PASSING           NUMBER OF ITEMS                                 CORRELATIONS    NUMBER OF ITEMS\n");

    let passing = |i: usize| {
        summary
            .distribution_by_passing_range
            .get(i)
            .map_or(0, |r| r.number_of_items)
    };
    let correlation = |i: usize| {
        summary
            .distribution_by_correlation_range
            .get(i)
            .map_or(0, |r| r.number_of_items)
    };
    out.push_str(&format!(
        "0          0 - 19                    {:3}                                       NEGATIVE - .10        {:3}\n",
        passing(0),
        correlation(0)
    ));
    for (i, (percent, range)) in [
        ("20 - 39", ".11 - .30"),
        ("40 - 59", ".31 - .50"),
        ("60 - 79", ".51 - .70"),
        ("80 -100", ".71 - .90"),
    ]
    .into_iter()
    .enumerate()
    {
        out.push_str(&format!(
            "          {percent}                    {:3}                                          {range}          {:3}\n",
            passing(i + 1),
            correlation(i + 1)
        ));
    }
    out.push_str(&format!(
        "                                                                                  .91 -              {:3}\n\n\n\n\n",
        correlation(5)
    ));

    out.push_str("                                        CHOICES     % KEYED     % CHOSEN     AVG. DIFF.\n\n");
    for choice in &summary.choice_breakdown {
        out.push_str(&format!(
            "                                           {}         {:5.3}        {:5.3}         {:5.3}\n",
            choice.label, choice.keyed_frequency, choice.chosen_frequency, choice.average_difficulty
        ));
    }
    out.push_str("\n\n          % KEYED= FREQUENCY OF A GIVEN KEY DIVIDED BY THE NUMBER OF ITEMS.\n");
    out.push_str("          % CHOSEN= FREQUENCY OF A GIVEN RESPONSE DIVIDED BY THE TOTAL NUMBER OF RESPONSES TO ALL ITEMS (EXCLUDING OMITS).\n");
    out.push_str("          AVG. DIFF.= TOTAL OF ALL DIFFICULTY VALUES FOR ITEMS WITH A GIVEN KEY DIVIDED BY THE NUMBER OF SUCH ITEMS.\n");
}
