//! Interactive fallback for values not given on the command line.
//!
//! [`plan_prompts`] decides what to ask without touching the terminal; the
//! driver functions ([`ask`], [`ask_all`], [`confirm`]) run the questions
//! through a [`Prompter`].

use std::io::IsTerminal;

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;

use crate::flags::BuildFlags;
use crate::normalize;

/// Source of interactive answers.
pub trait Prompter {
    /// Shows `prompt` and returns the line entered, without the newline.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::NotATty`] if no terminal is attached, or
    /// [`TestbedError::Prompt`] if reading fails.
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Shows a message that needs no answer.
    fn notify(&mut self, message: &str);
}

/// [`Prompter`] reading from the attached terminal.
#[derive(Debug)]
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    /// Creates a prompter for stdin; every question fails if stdin is not
    /// a terminal.
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        if !self.interactive {
            return Err(TestbedError::NotATty {
                message: "did you forget to include -y in your script?".into(),
            });
        }
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| TestbedError::Prompt {
                message: e.to_string(),
            })
    }

    #[allow(clippy::print_stderr)]
    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// A top-level value that can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Blockchain name.
    Blockchain,
    /// Node count.
    Nodes,
    /// CPU limit applied to every node.
    Cpus,
    /// Memory limit applied to every node.
    Memory,
}

/// One question of the interactive fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptField {
    /// Which value the answer fills.
    pub field: Field,
    /// Text shown to the user.
    pub label: String,
    /// Answer used when the user enters nothing.
    pub default: Option<String>,
    /// Whether an empty answer is acceptable without a default.
    pub allow_empty: bool,
}

/// Answers collected for a plan. `None` means the field was not asked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    /// Blockchain name as entered.
    pub blockchain: Option<String>,
    /// Node count as entered.
    pub nodes: Option<String>,
    /// CPU limit; empty means no limit.
    pub cpus: Option<String>,
    /// Memory limit; empty means no limit.
    pub memory: Option<String>,
}

impl Answers {
    /// Returns the parsed node count, if it was asked.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::InvalidInteger`] unless the answer is a
    /// non-negative integer.
    pub fn node_count(&self) -> Result<Option<usize>> {
        self.nodes
            .as_deref()
            .map(|raw| {
                let n = normalize::parse_int("nodes", raw)?;
                usize::try_from(n).map_err(|_| TestbedError::InvalidInteger {
                    field: "nodes".into(),
                    raw: raw.to_string(),
                })
            })
            .transpose()
    }
}

/// Lists the questions needed to complete `flags`, with defaults taken
/// from `previous`.
///
/// Blockchain and nodes are asked when their flag is absent. Resource
/// limits are asked only when their flag is absent and the previous build
/// has no resources to inherit.
pub fn plan_prompts(flags: &BuildFlags, previous: &BuildConfiguration) -> Vec<PromptField> {
    let mut plan = Vec::new();

    if flags.blockchain.is_none() {
        let default = Some(previous.blockchain.clone()).filter(|b| !b.is_empty());
        plan.push(PromptField {
            field: Field::Blockchain,
            label: labelled("blockchain", default.as_deref()),
            default,
            allow_empty: false,
        });
    }
    if flags.nodes.is_none() {
        let default = Some(previous.nodes)
            .filter(|&n| n > 0)
            .map(|n| n.to_string());
        plan.push(PromptField {
            field: Field::Nodes,
            label: labelled("nodes", default.as_deref()),
            default,
            allow_empty: false,
        });
    }

    let inherits_resources = !previous.resources.is_empty();
    for (field, name, given) in [
        (Field::Cpus, "cpus", flags.cpus.is_some()),
        (Field::Memory, "memory", flags.memory.is_some()),
    ] {
        if !given && !inherits_resources {
            plan.push(PromptField {
                field,
                label: format!("{name} (empty for no limit)"),
                default: None,
                allow_empty: true,
            });
        }
    }
    plan
}

fn labelled(name: &str, default: Option<&str>) -> String {
    default.map_or_else(|| name.to_string(), |d| format!("{name} ({d})"))
}

/// Asks one question until it has an answer.
///
/// An empty line takes the default if there is one, is accepted as-is if
/// the field allows empty, and is otherwise asked again.
///
/// # Errors
///
/// Returns the prompter's error.
pub fn ask(prompter: &mut dyn Prompter, field: &PromptField) -> Result<String> {
    loop {
        let text = prompter.read_line(&field.label)?.trim().to_string();
        if !text.is_empty() {
            return Ok(text);
        }
        if let Some(default) = field.default.as_ref().filter(|d| !d.is_empty()) {
            return Ok(default.clone());
        }
        if field.allow_empty {
            return Ok(text);
        }
        prompter.notify("Value required");
    }
}

/// Asks every question of `plan` in order.
///
/// # Errors
///
/// Returns the prompter's error.
pub fn ask_all(prompter: &mut dyn Prompter, plan: &[PromptField]) -> Result<Answers> {
    let mut answers = Answers::default();
    for field in plan {
        let answer = Some(ask(prompter, field)?);
        match field.field {
            Field::Blockchain => answers.blockchain = answer,
            Field::Nodes => answers.nodes = answer,
            Field::Cpus => answers.cpus = answer,
            Field::Memory => answers.memory = answer,
        }
    }
    Ok(answers)
}

/// Asks a yes/no question until the answer is in the boolean vocabulary.
///
/// # Errors
///
/// Returns the prompter's error.
pub fn confirm(prompter: &mut dyn Prompter, message: &str) -> Result<bool> {
    let prompt = format!("{message} ([y]es/[n]o)");
    loop {
        let text = prompter.read_line(&prompt)?;
        match normalize::parse_bool("answer", &text) {
            Ok(answer) => return Ok(answer),
            Err(e) => prompter.notify(&e.to_string()),
        }
    }
}
