//! Demo commands for the stdio console.

use conshell_terminal::{
    Completion, Console, DefinitionSpec, Handler, ReadFlow, Session, TerminalSurface,
};
use conshell_types::error::Result;

const SIGNUP_PROMPTS: [(&str, &str); 3] = [
    ("name", "Name: "),
    ("email", "Email: "),
    ("colour", "Favourite colour: "),
];

const CONFIRM_PROMPT: &str = "Are you sure? [y/n] ";

/// Register `CONFIRM` and `SIGNUP`.
pub fn register<S: TerminalSurface>(console: &mut Console<S>) -> Result<()> {
    console.define(
        DefinitionSpec::new("CONFIRM", Handler::custom(confirm))
            .description("Asks a yes/no question")
            .usage("CONFIRM"),
    )?;
    console.define(
        DefinitionSpec::new("SIGNUP", Handler::custom(signup))
            .alias("REGISTER")
            .description("Walks through a short form")
            .usage("SIGNUP"),
    )?;
    Ok(())
}

fn confirm(session: &mut Session<'_>) -> Result<Completion> {
    session.write(CONFIRM_PROMPT);
    session.read(false, |answer, s| match answer.to_ascii_lowercase() {
        'y' => {
            s.write_line("Confirmed.");
            Ok(ReadFlow::Done)
        },
        'n' => {
            s.write_line("Cancelled.");
            Ok(ReadFlow::Done)
        },
        _ => {
            s.write_line("Please answer y or n.");
            s.write(CONFIRM_PROMPT);
            Ok(ReadFlow::Continue)
        },
    })?;
    Ok(Completion::Done)
}

fn signup(session: &mut Session<'_>) -> Result<Completion> {
    session.write(SIGNUP_PROMPTS[0].1);
    let mut answers: Vec<String> = Vec::new();
    session.read_line(move |line, s| {
        answers.push(line.trim().to_string());
        if let Some((_, prompt)) = SIGNUP_PROMPTS.get(answers.len()) {
            s.write(prompt);
            return Ok(ReadFlow::Continue);
        }
        let rows: Vec<Vec<String>> = SIGNUP_PROMPTS
            .iter()
            .zip(&answers)
            .map(|((field, _), value)| vec![field.to_string(), value.clone()])
            .collect();
        s.write_line("");
        s.write_table(&["field:10", "value:*"], &rows, true);
        Ok(ReadFlow::Done)
    })?;
    Ok(Completion::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conshell_terminal::{ConsoleState, MemorySurface};
    use conshell_types::config::ConsoleConfig;
    use conshell_types::input::SurfaceEvent;

    fn console() -> Console<MemorySurface> {
        let mut c = Console::new(MemorySurface::new(), ConsoleConfig::default());
        register(&mut c).unwrap();
        c
    }

    fn answer(c: &mut Console<MemorySurface>, text: &str) {
        c.handle_event(SurfaceEvent::LineSubmit(text.to_string()));
    }

    #[test]
    fn confirm_accepts_yes() {
        let mut c = console();
        c.submit("CONFIRM").unwrap();
        assert_eq!(c.state(), ConsoleState::AwaitingChar);
        c.handle_event(SurfaceEvent::Char('Y'));
        assert!(c.surface().lines().contains(&"Confirmed."));
        assert_eq!(c.state(), ConsoleState::Idle);
    }

    #[test]
    fn confirm_reprompts_on_other_keys() {
        let mut c = console();
        c.submit("CONFIRM").unwrap();
        c.handle_event(SurfaceEvent::Char('x'));
        assert_eq!(c.state(), ConsoleState::AwaitingChar);
        assert!(c.surface().lines().contains(&"Please answer y or n."));
        assert_eq!(c.surface().prefix(), CONFIRM_PROMPT);
        answer(&mut c, "no");
        assert!(c.surface().lines().contains(&"Cancelled."));
        assert_eq!(c.state(), ConsoleState::Idle);
    }

    #[test]
    fn signup_collects_three_answers() {
        let mut c = console();
        c.submit("signup").unwrap();
        assert_eq!(c.surface().prefix(), "Name: ");
        answer(&mut c, "Ada");
        assert_eq!(c.surface().prefix(), "Email: ");
        answer(&mut c, "ada@example.com");
        answer(&mut c, "green");
        assert_eq!(c.state(), ConsoleState::Idle);

        let lines = c.surface().lines();
        assert!(lines.contains(&"Name: Ada"));
        assert!(lines.contains(&"field     value"));
        assert!(lines.contains(&"email     ada@example.com"));
        assert!(lines.contains(&"colour    green"));
    }

    #[test]
    fn register_alias_runs_signup() {
        let mut c = console();
        c.submit("REGISTER").unwrap();
        assert_eq!(c.state(), ConsoleState::AwaitingLine);
    }
}
