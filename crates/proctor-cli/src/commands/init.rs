//! The `proctor init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create proctor.toml
    if std::path::Path::new("proctor.toml").exists() {
        println!("proctor.toml already exists, skipping.");
    } else {
        std::fs::write("proctor.toml", SAMPLE_CONFIG)?;
        println!("Created proctor.toml");
    }

    // Create example paper
    std::fs::create_dir_all("papers")?;
    let paper_path = std::path::Path::new("papers/example.toml");
    if paper_path.exists() {
        println!("papers/example.toml already exists, skipping.");
    } else {
        std::fs::write(paper_path, EXAMPLE_PAPER)?;
        println!("Created papers/example.toml");
    }

    // Create example script
    std::fs::create_dir_all("scripts")?;
    let script_path = std::path::Path::new("scripts/example.toml");
    if script_path.exists() {
        println!("scripts/example.toml already exists, skipping.");
    } else {
        std::fs::write(script_path, EXAMPLE_SCRIPT)?;
        println!("Created scripts/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit proctor.toml with your portal URL and API token");
    println!("  2. Run: proctor validate --paper papers/example.toml");
    println!("  3. Run: proctor rehearse --paper papers/example.toml --script scripts/example.toml --tick-ms 10");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# proctor configuration

[portal]
base_url = "https://careers.example.com"
api_token = "${PROCTOR_API_TOKEN}"

[budgets]
multiple_choice_minutes = 20
essay_minutes = 30

output_dir = "./proctor-results"
"#;

const EXAMPLE_PAPER: &str = r#"[paper]
title = "Backend Engineer Assessment"

[[sections]]
kind = "multiple-choice"
title = "Technical Questions"
time_budget_minutes = 20

[[sections.questions]]
id = 1
description = "Which HTTP status code signals that a resource was created?"

[[sections.questions.options]]
id = 10
text = "200"

[[sections.questions.options]]
id = 11
text = "201"

[[sections.questions.options]]
id = 12
text = "204"

[[sections.questions]]
id = 2
description = "Which data structure gives O(1) average lookup by key?"

[[sections.questions.options]]
id = 20
text = "Linked list"

[[sections.questions.options]]
id = 21
text = "Hash map"

[[sections]]
kind = "essay"
title = "Design Question"
time_budget_minutes = 30

[[sections.questions]]
id = 3
description = "Describe how you would design a rate limiter for a public API."
"#;

const EXAMPLE_SCRIPT: &str = r#"name = "example walkthrough"

[[steps]]
action = "answer"
question = 1
option = 11

[[steps]]
action = "advance"

[[steps]]
action = "answer"
question = 2
option = 21

[[steps]]
action = "advance"

[[steps]]
action = "answer"
question = 3
text = "Token bucket per client key, refilled at a fixed rate."

[[steps]]
action = "advance"
"#;
