use autoquest_core::SessionEvent;
use autoquest_core::TokenUsage;
use owo_colors::OwoColorize;
use owo_colors::Style;

/// Prints session events to stdout as sequential stanzas: game text, the
/// model's narration and reasoning, memory contents, a token-usage line, and
/// the dispatched command.
pub(crate) struct EventRenderer {
    bold: Style,
    dimmed: Style,
    cyan: Style,
    magenta: Style,
}

impl EventRenderer {
    pub(crate) fn create_with_ansi(with_ansi: bool) -> Self {
        if with_ansi {
            Self {
                bold: Style::new().bold(),
                dimmed: Style::new().dimmed(),
                cyan: Style::new().cyan(),
                magenta: Style::new().magenta(),
            }
        } else {
            Self {
                bold: Style::new(),
                dimmed: Style::new(),
                cyan: Style::new(),
                magenta: Style::new(),
            }
        }
    }

    pub(crate) fn process_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::ScreenText(text) => {
                if !text.is_empty() {
                    println!("{}", text.style(self.bold));
                }
                println!();
            }
            SessionEvent::TurnCompleted {
                result,
                memory,
                turns_until_summary,
            } => {
                if !result.reasoning.is_empty() {
                    println!("{}", result.reasoning.style(self.dimmed));
                }
                if !result.message.is_empty() {
                    println!("{}", result.message);
                }
                if !memory.is_empty() {
                    println!("{}", "memory:".style(self.dimmed));
                    for (key, value) in memory {
                        println!("{}", format!("  {key}: {value}").style(self.dimmed));
                    }
                }
                println!(
                    "{}",
                    format_token_line(&result.usage, *turns_until_summary).style(self.dimmed)
                );
            }
            SessionEvent::CommandDispatched { command } => {
                println!(
                    "{}",
                    format!("sent: {}", display_command(command)).style(self.cyan)
                );
            }
            SessionEvent::SummarizeBegin => {
                println!("{}", "Summarizing game state...".style(self.magenta));
            }
            SessionEvent::SummarizeEnd { replaced } => {
                let line = if *replaced {
                    "History replaced with summary."
                } else {
                    "No summary available, keeping current history."
                };
                println!("{}", line.style(self.magenta));
            }
        }
    }
}

fn display_command(command: &str) -> &str {
    if command.is_empty() { "<enter>" } else { command }
}

fn format_token_line(usage: &TokenUsage, turns_until_summary: u32) -> String {
    format!(
        "input: {} ({} cached), output: {} | summary: T-{turns_until_summary}",
        usage.input_tokens, usage.cached_input_tokens, usage.output_tokens,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_line_shows_cached_split_and_countdown() {
        let usage = TokenUsage {
            input_tokens: 1200,
            cached_input_tokens: 800,
            output_tokens: 45,
            reasoning_output_tokens: 0,
            total_tokens: 1245,
        };
        assert_eq!(
            format_token_line(&usage, 7),
            "input: 1200 (800 cached), output: 45 | summary: T-7"
        );
    }

    #[test]
    fn empty_command_renders_as_enter() {
        assert_eq!(display_command(""), "<enter>");
        assert_eq!(display_command("go north"), "go north");
    }
}
