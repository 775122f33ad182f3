use criterion::{black_box, criterion_group, criterion_main, Criterion};

use itemal_core::document::ExamDocument;
use itemal_core::legacy::parse_legacy_str;
use itemal_core::model::{IdSequence, Options};

fn bench_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");

    let small = generate_document(20, 30);
    let large = generate_document(100, 1000);

    group.bench_function("json_20_items", |b| {
        b.iter(|| {
            ExamDocument::from_json_str(black_box(&small))
                .and_then(|doc| doc.into_exam(&mut IdSequence::new(), &Options::default()))
        })
    });

    group.bench_function("json_100_items_1000_students", |b| {
        b.iter(|| {
            ExamDocument::from_json_str(black_box(&large))
                .and_then(|doc| doc.into_exam(&mut IdSequence::new(), &Options::default()))
        })
    });

    group.finish();
}

fn bench_legacy(c: &mut Criterion) {
    let mut group = c.benchmark_group("legacy");

    let small = generate_legacy(20, 30);
    let large = generate_legacy(60, 1000);

    group.bench_function("20_items", |b| {
        b.iter(|| parse_legacy_str(black_box(&small)))
    });

    group.bench_function("60_items_1000_students", |b| {
        b.iter(|| parse_legacy_str(black_box(&large)))
    });

    group.finish();
}

fn answer_digits(items: usize, student: usize) -> String {
    (0..items)
        .map(|i| char::from(b'1' + ((i * 3 + student) % 4) as u8))
        .collect()
}

fn generate_document(items: usize, students: usize) -> String {
    let key = answer_digits(items, 0);
    let answers: Vec<String> = (0..students)
        .map(|s| format!("\"{}\"", answer_digits(items, s)))
        .collect();
    format!(
        r#"{{"examId": 1, "course": "BENCH", "instructor": "CRITERION", "date": "2024-01-15",
"questionSets": [{{"answerKey": "{key}", "answerRange": 4,
"responses": [{{"answers": [{}]}}]}}]}}"#,
        answers.join(",")
    )
}

fn generate_legacy(items: usize, students: usize) -> String {
    let mut s = format!(
        "{:4}{:<10}{:<10}{:5}{:6}{students:6}{items:5}{:5}{:5}{:5}{:1}{:1}\n",
        1, "BENCH", "CRITERION", "", "011524", 1, 4, 1, 5, 1
    );
    for chunk in answer_digits(items, 0).as_bytes().chunks(20) {
        s.push_str(&String::from_utf8_lossy(chunk));
        s.push('\n');
    }
    s.push_str("(I3,T6,20I1)\n");
    for student in 0..students {
        let answers = answer_digits(items, student);
        for chunk in answers.as_bytes().chunks(20) {
            s.push_str(&format!("{:3}  {}\n", 0, String::from_utf8_lossy(chunk)));
        }
    }
    s.push_str(&" -1\n".repeat(5));
    s
}

criterion_group!(benches, bench_documents, bench_legacy);
criterion_main!(benches);
