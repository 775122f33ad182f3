//! The `itemal init` command.

use std::path::Path;

use anyhow::Result;

use itemal_core::config::STARTER_CONFIG;

pub fn execute() -> Result<()> {
    if Path::new("itemal.toml").exists() {
        println!("itemal.toml already exists, skipping.");
    } else {
        std::fs::write("itemal.toml", STARTER_CONFIG)?;
        println!("Created itemal.toml");
    }

    std::fs::create_dir_all("exams")?;
    let example_path = Path::new("exams/example.json");
    if example_path.exists() {
        println!("exams/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXAM)?;
        println!("Created exams/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit exams/example.json with your answer key and responses");
    println!("  2. Run: itemal validate -i exams/example.json -f json");
    println!("  3. Run: itemal analyze -i exams/example.json -f json-pretty");

    Ok(())
}

const EXAMPLE_EXAM: &str = r#"{
  "examId": 1,
  "course": "EXAMPLE",
  "instructor": "STAFF",
  "date": "2024-09-03",
  "options": {
    "isReverseOrder": false,
    "numberOfCopies": 1,
    "testSummaryOnly": false
  },
  "questionSets": [
    {
      "answerKey": "13245",
      "answerRange": 5,
      "responses": [
        { "group": 1, "answers": ["13245", "13244", "23245", "13145"] },
        { "group": 2, "answers": ["13245", "12245", "53241"] }
      ]
    }
  ]
}
"#;
