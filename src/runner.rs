// src/runner.rs

use crate::backends::SimulatedBackend;
use crate::cli::{Cli, Command, FormArgs};
use crate::config::{Config, OutputMode};
use crate::engine::events::PresenterEvent;
use crate::engine::rules::{FIELD_EMAIL, FIELD_REDEEM_CODE, FIELD_TERMS, FIELD_USERNAME};
use crate::engine::{
    validate_form, FormInput, FormValidation, Presenter, RuleTable, SubmissionController,
    SubmissionOutcome, SubmitError,
};
use crate::presenters::{ConsolePresenter, RecordingPresenter};
use crate::util::{ensure_dir, read_to_string, resolve_relative_to_config};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Entry point from `main.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init => init_scaffold(Path::new(".")),

        Command::Validate {
            config,
            input,
            output,
        } => {
            let mut cfg = Config::load_or_default(&config)?;
            if let Some(mode) = output {
                cfg.output.mode = mode;
            }

            let form = build_form(&config, &cfg, &input)?;
            run_validate(&cfg, &form)
        }

        Command::Redeem {
            config,
            input,
            seed,
            output,
        } => {
            let mut cfg = Config::load_or_default(&config)?;

            // CLI overrides
            if let Some(mode) = output {
                cfg.output.mode = mode;
            }
            if seed.is_some() {
                cfg.simulation.seed = seed;
            }

            let form = build_form(&config, &cfg, &input)?;
            run_redeem(&cfg, &form).await
        }
    }
}

/* ---------------- form input ---------------- */

/// Assemble the form: fixture file first (CLI `--form` wins over config),
/// then individual flag overrides.
pub fn build_form(config_path: &Path, cfg: &Config, input: &FormArgs) -> Result<FormInput> {
    let fixture = match (&input.form, &cfg.form) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(rel)) => Some(resolve_relative_to_config(config_path, rel)),
        (None, None) => None,
    };

    let mut form = match fixture {
        Some(path) => load_form(&path)?,
        None => FormInput::new(),
    };

    if let Some(v) = &input.email {
        form.set(FIELD_EMAIL, v.as_str());
    }
    if let Some(v) = &input.username {
        form.set(FIELD_USERNAME, v.as_str());
    }
    if let Some(v) = &input.redeem_code {
        form.set(FIELD_REDEEM_CODE, v.as_str());
    }
    if input.terms {
        form.set_checkbox(FIELD_TERMS, true);
    }
    for pair in &input.fields {
        form.apply_pair(pair)?;
    }

    Ok(form)
}

fn load_form(path: &Path) -> Result<FormInput> {
    let raw: Value = serde_json::from_str(&read_to_string(path)?)
        .with_context(|| format!("Form fixture is not valid JSON: {}", path.display()))?;

    FormInput::from_json(&raw)
        .with_context(|| format!("Form fixture has an unsupported shape: {}", path.display()))
}

/* ---------------- validate ---------------- */

fn run_validate(cfg: &Config, form: &FormInput) -> Result<()> {
    let rules = RuleTable::standard()?;

    let validation = match cfg.output.mode {
        OutputMode::Simple => {
            let presenter = ConsolePresenter::stdout().show_valid(true);
            validate_form(&rules, form, &presenter)
        }
        _ => {
            let recorder = RecordingPresenter::new();
            let validation = validate_form(&rules, form, &recorder);
            let envelope = serde_json::json!({
                "ok": validation.all_valid,
                "validation": validation,
                "events": recorder.take(),
            });
            emit(cfg, &envelope)?;
            validation
        }
    };

    if !validation.all_valid {
        bail!("Validation failed");
    }

    Ok(())
}

/* ---------------- redeem ---------------- */

async fn run_redeem(cfg: &Config, form: &FormInput) -> Result<()> {
    let rules = Arc::new(RuleTable::standard()?);
    let backend = Arc::new(match cfg.simulation.seed {
        Some(seed) => SimulatedBackend::seeded(seed),
        None => SimulatedBackend::new(),
    });

    let recorder = Arc::new(RecordingPresenter::new());
    let presenter: Arc<dyn Presenter> = match cfg.output.mode {
        OutputMode::Simple => Arc::new(ConsolePresenter::stdout()),
        _ => recorder.clone(),
    };

    let controller = SubmissionController::new(rules, backend, presenter);
    let result = controller.submit(form).await;
    let json_output = !matches!(cfg.output.mode, OutputMode::Simple);

    match result {
        Ok(report) => {
            if json_output {
                let envelope = serde_json::json!({
                    "ok": report.outcome.is_success(),
                    "attempt_id": report.attempt_id,
                    "outcome": report.outcome,
                    "events": recorder.take(),
                });
                emit(cfg, &envelope)?;
            }

            if let SubmissionOutcome::Failure { reason } = report.outcome {
                bail!("Redemption failed: {}", reason);
            }
            Ok(())
        }

        Err(SubmitError::Invalid(validation)) => {
            if json_output {
                emit(cfg, &invalid_envelope(&validation, recorder.take()))?;
            }
            bail!("Validation failed");
        }

        Err(e) => Err(e.into()),
    }
}

fn invalid_envelope(validation: &FormValidation, events: Vec<PresenterEvent>) -> Value {
    serde_json::json!({
        "ok": false,
        "validation": validation,
        "events": events,
    })
}

/* ---------------- output ---------------- */

fn emit(cfg: &Config, envelope: &Value) -> Result<()> {
    match cfg.output.mode {
        OutputMode::Stdout => println!(
            "{}",
            serde_json::to_string(envelope).context("Failed to format output as JSON")?
        ),
        OutputMode::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(envelope)
                .context("Failed to format output as pretty JSON")?
        ),
        OutputMode::File => {
            let path = PathBuf::from(
                cfg.output
                    .file
                    .as_ref()
                    .context("output.file must be set when output.mode = file")?,
            );
            write_output_file(&path, envelope)?;
        }
        OutputMode::Simple => bail!("output.mode = simple is rendered live, not emitted"),
    }

    Ok(())
}

fn write_output_file(path: &Path, payload: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let bytes = serde_json::to_vec_pretty(payload).context("Failed to serialize output JSON")?;

    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write output file {:?}", path))?;

    Ok(())
}

/* ---------------- init ---------------- */

fn init_scaffold(root: &Path) -> Result<()> {
    write_if_missing(&root.join("config.yaml"), default_config_yaml())?;
    write_if_missing(&root.join("form.json"), default_form_json())?;
    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        eprintln!("{} already exists (skipping)", path.display());
        return Ok(());
    }

    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    eprintln!("Created {}", path.display());
    Ok(())
}

fn default_config_yaml() -> &'static str {
    r#"
form: form.json

# simulation:
#   seed: 42   # pin the simulated outcome

output:
  mode: simple # simple | pretty | stdout | file
  # file: result.json
"#
}

fn default_form_json() -> &'static str {
    r#"{
  "email": "user@example.com",
  "username": "player_01",
  "redeemCode": "ABC123-XYZ",
  "terms": true
}
"#
}
