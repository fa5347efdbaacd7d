mod parse;
mod state_file;
mod wizard;

use assessment_spec::{
    Action, ActionKind, Activity, RenderPayload, RenderProgress, Transition, lint, render_json_ui,
    render_text,
};
use clap::{Parser, Subcommand, ValueEnum};
use component_assessment::{AssessmentSession, MemoryBackend, QuestionController, SessionError};
use serde_json::Value;
use state_file::StateFile;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wizard::{PromptContext, Verbosity, WizardPresenter, is_finished};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based guided assessment CLI",
    long_about = "Walks, renders and lints guided assessments backed by the assessment component"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Walk the assessment in a text shell, saving progress to the state file.
    Walk {
        /// JSON state file (activities, answers, currentSection, config).
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
        /// Show verbose output (statuses, rendered groups, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON when the walk finishes.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode printed before each prompt.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print what the assessment currently shows without changing it.
    Render {
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// Check a question set for duplicate ids, unknown actions and dangling gotos.
    Lint {
        /// Path to the question set JSON (array of activities).
        #[arg(long, value_name = "QUESTIONS")]
        questions: PathBuf,
    },
    /// Print the JSON schema of a question set.
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Walk {
            state,
            verbose,
            answers_json,
            format,
        } => {
            init_tracing(verbose);
            run_walk(&state, verbose, answers_json, format).await
        }
        Command::Render {
            state,
            format,
            verbose,
        } => {
            init_tracing(verbose);
            run_render(&state, format).await
        }
        Command::Lint { questions } => {
            init_tracing(false);
            run_lint(&questions)
        }
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn run_walk(
    path: &Path,
    verbose: bool,
    answers_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let mut state = StateFile::read(path)?;
    let mut session = state.open_session();
    session.load().await?;
    state.save_session(path, &session)?;

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);

    loop {
        let payload = session.render();
        if is_finished(&payload) {
            presenter.show_completion(session.state().answers());
            break;
        }
        print_render_output(format, &payload)?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        let mut controller = session
            .controller()
            .ok_or("walk lost track of the current question")?;
        if controller.skip_if_hidden(&mut session).await?.is_some() {
            state.save_session(path, &session)?;
            continue;
        }

        presenter.show_guide(&controller.group().guide);
        let goto = collect_answers(&mut controller, &payload.progress, &presenter)?;
        match controller.submit(&mut session, goto.as_deref()).await {
            Ok(transition) => {
                state.save_session(path, &session)?;
                if matches!(transition, Transition::Exhausted { .. }) {
                    presenter.show_completion(session.state().answers());
                    break;
                }
            }
            Err(SessionError::Validation(message)) => presenter.show_rejection(&message),
            Err(err @ SessionError::ActivityLocked(_)) => {
                presenter.show_rejection(&err.to_string());
                state.save_session(path, &session)?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Prompts for every interactive action of the group and stages the answers.
/// Returns the branch targets of the first picked option that has any.
fn collect_answers(
    controller: &mut QuestionController,
    progress: &RenderProgress,
    presenter: &WizardPresenter,
) -> CliResult<Option<Vec<String>>> {
    let actions = controller.group().actions.clone();
    let mut goto = None;
    for action in &actions {
        let kind = match action {
            Action::Known(ActionKind::PhoneNumbers { numbers }) => {
                presenter.show_phone_numbers(numbers);
                continue;
            }
            Action::Known(kind) if kind.is_interactive() => kind,
            _ => continue,
        };
        let prompt = PromptContext::new(kind, progress);
        let Some(value) = prompt_action(&prompt, kind, presenter)? else {
            continue;
        };
        if goto.is_none() {
            goto = kind.goto_for(&value).map(<[String]>::to_vec);
        }
        if let Some(key) = kind.answer_key() {
            controller.stage(key, value);
        }
    }
    Ok(goto)
}

fn prompt_action(
    prompt: &PromptContext,
    kind: &ActionKind,
    presenter: &WizardPresenter,
) -> CliResult<Option<Value>> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the walk finished".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("walk aborted by user".into());
        }

        match parse::parse_answer(kind, trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

async fn run_render(path: &Path, format: RenderMode) -> CliResult<()> {
    let state = StateFile::read(path)?;
    let mut session = state.open_session();
    session.load().await?;
    let payload = session.render();
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render_json_ui(&payload))?
        ),
    }
    Ok(())
}

fn run_lint(path: &Path) -> CliResult<()> {
    let contents = fs::read_to_string(path)?;
    let activities: Vec<Activity> = serde_json::from_str(&contents)?;
    let report = lint(&activities);
    println!(
        "Lint result: {} ({} activities)",
        if report.valid { "valid" } else { "invalid" },
        activities.len()
    );

    if report.valid {
        return Ok(());
    }
    println!("Errors:");
    for error in &report.errors {
        println!(
            "  {} - {} [{}]",
            error
                .uid
                .as_deref()
                .or(error.path.as_deref())
                .unwrap_or("<unknown>"),
            error.message,
            error.code.as_deref().unwrap_or("error")
        );
    }
    Err("lint failed".into())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(Vec<Activity>);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_render_output(mode: RenderMode, payload: &RenderPayload) -> CliResult<()> {
    match mode {
        RenderMode::Text => Ok(()),
        RenderMode::Json => {
            let ui = serde_json::to_string_pretty(&render_json_ui(payload))?;
            println!("JSON UI:\n{}", ui);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../assessment-spec/tests/fixtures/assessment.json")
    }

    fn write_state(dir: &TempDir, state: &Value) -> PathBuf {
        let path = dir.path().join("state.json");
        fs::write(&path, serde_json::to_string_pretty(state).expect("json")).expect("write state");
        path
    }

    fn short_assessment() -> Value {
        json!({
            "activities": [{
                "id": "only",
                "type": "intro",
                "questions": [
                    {
                        "uid": "a",
                        "guide": ["Ready to begin?"],
                        "actions": [{ "type": "yes-no", "answerKey": "ready" }]
                    },
                    {
                        "uid": "b",
                        "hideIf": ["ready", false],
                        "actions": [{ "type": "text", "answerKey": "name", "required": true }]
                    },
                    {
                        "uid": "c",
                        "actions": [{ "type": "heard", "answerKey": "done" }]
                    }
                ]
            }]
        })
    }

    #[test]
    fn walk_skips_hidden_questions_and_saves_progress() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = TempDir::new()?;
        let path = write_state(&dir, &short_assessment());

        let output = Command::cargo_bin("guided-assessment")?
            .arg("walk")
            .arg("--state")
            .arg(&path)
            .write_stdin("maybe\nno\n\n")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let stdout = String::from_utf8(output)?;
        assert!(stdout.contains("Ready to begin?"));
        assert!(stdout.contains("Done"));

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(saved["answers"], json!({ "ready": false, "done": true }));
        assert_eq!(saved["currentSection"], json!("c"));
        assert_eq!(saved["activities"][0]["locked"], json!(true));
        Ok(())
    }

    #[test]
    fn walk_exit_keeps_starting_pointer() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = write_state(&dir, &short_assessment());

        Command::cargo_bin("guided-assessment")?
            .arg("walk")
            .arg("--state")
            .arg(&path)
            .write_stdin("exit\n")
            .assert()
            .failure();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(saved["currentSection"], json!("a"));
        assert_eq!(saved["answers"], json!({}));
        Ok(())
    }

    #[test]
    fn render_json_reports_current_question() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("guided-assessment")?
            .arg("render")
            .arg("--state")
            .arg(fixture_path())
            .arg("--format")
            .arg("json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let rendered: Value = serde_json::from_slice(&output)?;
        assert_eq!(rendered["current_uid"], json!("q1"));
        assert_eq!(rendered["activity_title"], json!("Getting started"));
        Ok(())
    }

    #[test]
    fn lint_rejects_unknown_actions() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("guided-assessment")?
            .arg("lint")
            .arg("--questions")
            .arg(fixture_path())
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        assert!(String::from_utf8(output)?.contains("unknown_action"));
        Ok(())
    }

    #[test]
    fn lint_accepts_clean_question_set() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("questions.json");
        fs::write(&path, short_assessment()["activities"].to_string())?;

        Command::cargo_bin("guided-assessment")?
            .arg("lint")
            .arg("--questions")
            .arg(&path)
            .assert()
            .success();
        Ok(())
    }

    #[test]
    fn schema_describes_activities() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("guided-assessment")?
            .arg("schema")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let schema: Value = serde_json::from_slice(&output)?;
        assert_eq!(schema["type"], json!("array"));
        Ok(())
    }
}
