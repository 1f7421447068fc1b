//! The `studyguide init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create studyguide.toml
    if std::path::Path::new("studyguide.toml").exists() {
        println!("studyguide.toml already exists, skipping.");
    } else {
        std::fs::write("studyguide.toml", SAMPLE_CONFIG)?;
        println!("Created studyguide.toml");
    }

    // Create sample bank
    std::fs::create_dir_all("banks")?;
    let sample_path = std::path::Path::new("banks/Module_Sample.json");
    if sample_path.exists() {
        println!("banks/Module_Sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_BANK)?;
        println!("Created banks/Module_Sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Drop your Module_*.json banks into ./banks");
    println!("  2. Run: studyguide validate --bank banks");
    println!("  3. Run: studyguide quiz --module Module_Sample");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyguide configuration

data_dir = "./banks"
# server_url = "http://localhost:8000"
default_length = 10
module_patterns = ["Module_*.json", "Learning_*.json", "Pharm_*.json", "*_Quiz_*.json"]
fallback_modules = ["Module_1.json", "Module_2.json", "Module_3.json", "Module_4.json"]
index_base = "zero"
output_dir = "./studyguide-results"

[recycle]
mode = "always"
"#;

const SAMPLE_BANK: &str = r#"{
  "questions": [
    {
      "id": "sample-1",
      "stem": "Which chamber of the heart pumps oxygenated blood to the body?",
      "options": ["Right atrium", "Right ventricle", "Left atrium", "Left ventricle"],
      "correct": ["D"],
      "rationale": "The left ventricle pumps blood into the aorta.",
      "type": "single_select"
    },
    {
      "id": "sample-2",
      "question": "Which of the following are beta blockers?",
      "A": "Metoprolol",
      "B": "Lisinopril",
      "C": "Atenolol",
      "D": "Amlodipine",
      "answer": "A, C",
      "explanation": "Beta blocker names end in -olol."
    },
    {
      "id": "sample-3",
      "prompt": "Normal adult resting heart rate range?",
      "choices": [
        { "text": "40-60 bpm" },
        { "text": "60-100 bpm", "correct": true },
        { "text": "100-140 bpm" }
      ],
      "rationale": "60-100 bpm is the normal adult range."
    }
  ]
}
"#;
