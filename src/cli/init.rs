//! Init command implementation
//!
//! Scaffolds a new AEGIS deployment: the configuration file, the intake
//! form schema and a few starter plan documents for the retrieval index.

use super::output::Output;
use std::fs;
use std::path::Path;

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Deployment already exists (aegis.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: std::path::PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (ollama or openai)
    pub provider: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing AEGIS deployment");

    let base_path = &config.path;

    // Check if aegis.toml already exists
    let config_path = base_path.join("aegis.toml");
    if config_path.exists() && !config.force {
        output.warning("aegis.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    // Create directories
    output.subheader("Creating directories");

    let directories = ["data", "data/forms", "data/plans"];

    for dir in &directories {
        let dir_path = base_path.join(dir);
        if !dir_path.exists() {
            if let Err(e) = fs::create_dir_all(&dir_path) {
                output.error(&format!("Failed to create {}: {}", dir, e));
                return InitResult::Error(e.to_string());
            }
            output.created_dir(dir);
        } else {
            output.skipped(dir, "already exists");
        }
    }

    // Create aegis.toml
    output.subheader("Creating configuration files");

    let toml_content = generate_aegis_toml(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create aegis.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "aegis.toml");

    // Create .env.example
    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    // Create the intake form schema
    let schema_path = base_path.join("data/forms/health_intake.json");
    if let Err(e) = write_file(&schema_path, &generate_intake_schema(), config.force) {
        output.error(&format!("Failed to create intake schema: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("schema", "data/forms/health_intake.json");

    // Create starter plan documents
    output.subheader("Creating starter plan documents");

    for (name, content) in starter_plans() {
        let plan_path = base_path.join("data/plans").join(name);
        if plan_path.exists() && !config.force {
            output.skipped(&format!("data/plans/{}", name), "already exists");
            continue;
        }
        if let Err(e) = write_file(&plan_path, content, config.force) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created("plan", &format!("data/plans/{}", name));
    }

    // Create .gitignore if it doesn't exist
    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    // Print completion message and next steps
    output.complete("AEGIS deployment initialized successfully!");

    output.header("Next Steps");
    output.newline();

    if config.provider == "openai" {
        output.info("1. Set up environment variables:");
        output.command("cp .env.example .env");
        output.command("# Edit .env and set OPENAI_API_KEY");
    } else {
        output.info("1. Start Ollama and pull the models (if not running):");
        output.command("ollama serve");
        output.command("ollama pull llama3.2:3b");
        output.command("ollama pull nomic-embed-text");
    }
    output.newline();

    output.info("2. Build the plan index:");
    output.command("aegis-server ingest");
    output.newline();

    output.info("3. Start the servers (separate terminals):");
    output.command("aegis-server agent");
    output.command("aegis-server retrieval");
    output.newline();

    output.info("4. Talk to the pipeline:");
    output.command("aegis-server chat");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_aegis_toml(config: &InitConfig) -> String {
    let llm_section = if config.provider == "openai" {
        r#"# OpenAI API (set OPENAI_API_KEY in .env)
[llm]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
"#
    } else {
        r#"# Ollama - local inference (no API key required)
[llm]
provider = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2:3b"
"#
    };

    format!(
        r#"# AEGIS configuration
# Every key is optional; omitted keys fall back to the defaults shown here.
# Any key can also be overridden from the environment: AEGIS__LLM__MODEL=...

# Task protocol server (the remote intake agent)
[agent_server]
host = "0.0.0.0"
port = 10010

# Plan retrieval server
[retrieval_server]
host = "0.0.0.0"
port = 15001
index_path = "data/plans-index.json"

# Where the orchestrator finds the servers above
[orchestrator]
remote_agent_url = "http://localhost:10010"
retrieval_url = "http://localhost:15001"
request_timeout_secs = 30
history_window = 10

{llm_section}
[embeddings]
backend = "ollama"
base_url = "http://localhost:11434"
model = "nomic-embed-text"
dimension = 768

[forms]
schema_path = "data/forms/health_intake.json"

[ingest]
chunk_size = 256
chunk_overlap = 32
"#
    )
}

fn generate_env_example() -> String {
    r#"# Environment overrides for AEGIS.
# Copy to .env; the binary loads it on startup.

# API key for OpenAI-compatible providers (only needed with llm.provider = "openai")
# OPENAI_API_KEY=sk-...

# Log filtering (standard tracing-subscriber syntax)
# RUST_LOG=aegis=debug,tower_http=info

# Any configuration key can be overridden here too, for example:
# AEGIS__LLM__MODEL=mistral
# AEGIS__AGENT_SERVER__PORT=10020
"#
    .to_string()
}

fn generate_intake_schema() -> String {
    r#"{
  "type": "object",
  "title": "Health Insurance Intake Questionnaire",
  "description": "Basic medical and lifestyle history used to assess coverage options.",
  "properties": {
    "full_name": { "type": "string", "title": "Full name" },
    "age": { "type": "number", "title": "Age" },
    "gender": {
      "type": "string",
      "title": "Gender",
      "enum": ["female", "male", "other", "prefer not to say"]
    },
    "smoker": {
      "type": "string",
      "title": "Do you smoke?",
      "enum": ["no", "occasionally", "daily"]
    },
    "height_cm": { "type": "number", "title": "Height (cm)" },
    "weight_kg": { "type": "number", "title": "Weight (kg)" },
    "pre_existing_conditions": {
      "type": "string",
      "title": "Pre-existing conditions",
      "description": "Diagnosed conditions such as diabetes, asthma or hypertension. Write none if there are none."
    },
    "current_medications": {
      "type": "string",
      "title": "Current medications",
      "description": "Prescription drugs taken regularly, or none."
    },
    "hospitalizations": {
      "type": "string",
      "title": "Hospitalizations in the last five years",
      "description": "Reason and year, or none."
    },
    "family_history": {
      "type": "string",
      "title": "Family medical history",
      "description": "Serious conditions in immediate family, or none."
    },
    "exercise_frequency": {
      "type": "string",
      "title": "Exercise frequency",
      "enum": ["rarely", "1-2 times a week", "3-5 times a week", "daily"]
    },
    "alcohol_consumption": {
      "type": "string",
      "title": "Alcohol consumption",
      "enum": ["none", "social", "regular"]
    },
    "coverage_type": {
      "type": "string",
      "title": "Coverage needed",
      "enum": ["individual", "family"]
    },
    "dependents": { "type": "number", "title": "Number of dependents" }
  },
  "required": ["full_name", "age", "gender", "smoker", "pre_existing_conditions", "coverage_type"]
}
"#
    .to_string()
}

fn starter_plans() -> [(&'static str, &'static str); 3] {
    [
        (
            "secure-family-shield.md",
            r#"# SecureLife Family Shield

A comprehensive family plan for households that want predictable costs
and broad coverage for dependents.

## Monthly Premium

- Family of up to four: 480 USD
- Each additional dependent: 55 USD

## Coverage Highlights

- Hospitalization and surgery at 90 percent after deductible
- Annual deductible of 1,500 USD per family
- Maternity and newborn care after a 10 month waiting period
- Pediatric care, vaccinations and dental checks for children under 18
- Pre-existing conditions covered after a 24 month waiting period
- Annual wellness visit and screenings at no extra cost

## Exclusions

- Cosmetic procedures
- Experimental treatments
- Injuries from extreme sports

## Good Fit For

Families with children, applicants planning for dependents, households
where at least one member has a managed pre-existing condition.
"#,
        ),
        (
            "vital-care-essential.md",
            r#"# VitalCare Essential

A budget individual plan that keeps premiums low while covering the
basics and emergencies.

## Monthly Premium

- Individual under 40: 120 USD
- Individual 40 to 60: 185 USD
- Smokers: 30 percent surcharge on the base premium

## Coverage Highlights

- Emergency room visits and ambulance transport
- Hospitalization at 70 percent after deductible
- Annual deductible of 4,000 USD
- Unlimited telehealth consultations
- One preventive care visit a year
- Generic prescription drugs at a flat 15 USD copay

## Exclusions

- Pre-existing conditions in the first 36 months
- Maternity care
- Specialist visits without a referral

## Good Fit For

Healthy single applicants, students, first-time buyers who mainly want
protection against emergencies.
"#,
        ),
        (
            "guardian-chronic-care.md",
            r#"# Guardian Plus Chronic Care

A specialized plan for applicants managing long-term conditions such as
diabetes, hypertension, asthma or heart disease.

## Monthly Premium

- Individual: 340 USD
- Couple: 610 USD

## Coverage Highlights

- No waiting period for declared pre-existing conditions
- Chronic disease management program with a named care coordinator
- Brand and generic prescription drugs at 80 percent
- Quarterly specialist consultations included
- Hospitalization at 85 percent after deductible
- Annual deductible of 2,200 USD
- Home care and physiotherapy up to 30 sessions a year

## Exclusions

- Conditions not declared at enrollment
- Cosmetic procedures
- Non-prescribed supplements

## Good Fit For

Applicants with diagnosed chronic conditions, smokers working through a
cessation program, older applicants who see specialists regularly.
"#,
        ),
    ]
}

fn generate_gitignore() -> String {
    r#"# Build artifacts
/target/

# Environment files (may contain API keys)
.env

# Plan index snapshot (rebuild with 'aegis-server ingest')
/data/plans-index.json

# OS files
.DS_Store
Thumbs.db
"#
    .to_string()
}
