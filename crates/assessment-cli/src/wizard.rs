use assessment_spec::{ActionKind, AnswerMap, RenderPayload, RenderProgress, RenderStatus};

use crate::parse::describe_input;

/// Controls which bits of state the walk prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: guide text and prompts only.
    Clean,
    /// Verbose output: status, rendered groups, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts once the session yields a question.
pub struct WizardPresenter {
    verbosity: Verbosity,
    activity_shown: Option<String>,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            activity_shown: None,
            show_answers_json,
        }
    }

    /// Prints the activity title the first time each activity comes up.
    pub fn show_header(&mut self, payload: &RenderPayload) {
        if payload.activity_id.is_none() || self.activity_shown == payload.activity_id {
            return;
        }
        let title = payload
            .activity_title
            .as_deref()
            .or(payload.activity_id.as_deref())
            .unwrap_or_default();
        println!("Activity: {}", title);
        self.activity_shown = payload.activity_id.clone();
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            payload.status.as_str(),
            payload.progress.answered,
            payload.progress.total
        );
        println!("Rendered groups:");
        for group in &payload.groups {
            let marker = if group.current { "*" } else { "-" };
            println!(" {} {}", marker, group.uid);
        }
    }

    pub fn show_guide(&self, guide: &[String]) {
        for line in guide {
            println!("{}", line);
        }
    }

    pub fn show_phone_numbers(&self, numbers: &[String]) {
        if !numbers.is_empty() {
            println!("Phone numbers: {}", numbers.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.title)
        } else {
            format!("{} {}", prompt.index, prompt.title)
        };
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if self.verbosity.is_verbose() && prompt.gated {
            println!("(checked before continuing)");
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_rejection(&self, message: &str) {
        eprintln!("Cannot continue: {}", message);
    }

    pub fn show_completion(&self, answers: &AnswerMap) {
        println!("Done ✅");
        if self.show_answers_json {
            match serde_json::to_string_pretty(answers) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub hint: Option<String>,
    pub gated: bool,
}

impl PromptContext {
    pub fn new(kind: &ActionKind, progress: &RenderProgress) -> Self {
        let title = match kind {
            ActionKind::Heard {
                label: Some(label), ..
            } => label.clone(),
            ActionKind::Video { video, .. } => format!("Watch {}", video),
            _ => kind.answer_key().unwrap_or(kind.type_name()).to_string(),
        };
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            title,
            hint: describe_input(kind),
            gated: kind.requires_validation(),
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// True once the walk has nothing left to ask.
pub fn is_finished(payload: &RenderPayload) -> bool {
    payload.status == RenderStatus::Complete || payload.current_uid.is_none()
}
