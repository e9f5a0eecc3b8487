//! The human decision at the end of each generation round.

use std::io::{BufRead, Write};

use crate::error::PipelineError;

/// What the reviewer chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Accept,
    Reject,
    Regenerate,
}

impl ApprovalDecision {
    /// `A`, `R` or `G`, case-insensitive, surrounding whitespace ignored.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "A" => Some(ApprovalDecision::Accept),
            "R" => Some(ApprovalDecision::Reject),
            "G" => Some(ApprovalDecision::Regenerate),
            _ => None,
        }
    }
}

/// States of one approval round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    AwaitingChoice,
    Accepted,
    Rejected,
    Regenerating,
}

impl ApprovalState {
    /// Feed one line of input. Only `AwaitingChoice` reacts; invalid input
    /// leaves it where it is.
    pub fn transition(self, input: &str) -> ApprovalState {
        match self {
            ApprovalState::AwaitingChoice => match ApprovalDecision::parse(input) {
                Some(ApprovalDecision::Accept) => ApprovalState::Accepted,
                Some(ApprovalDecision::Reject) => ApprovalState::Rejected,
                Some(ApprovalDecision::Regenerate) => ApprovalState::Regenerating,
                None => ApprovalState::AwaitingChoice,
            },
            terminal => terminal,
        }
    }

    pub fn decision(self) -> Option<ApprovalDecision> {
        match self {
            ApprovalState::AwaitingChoice => None,
            ApprovalState::Accepted => Some(ApprovalDecision::Accept),
            ApprovalState::Rejected => Some(ApprovalDecision::Reject),
            ApprovalState::Regenerating => Some(ApprovalDecision::Regenerate),
        }
    }
}

const MENU: &str = "\
Review the component in your browser.

  [A] Accept      keep the component and its route
  [R] Reject      remove the component and revert the route
  [G] Regenerate  discard and generate again
";

/// Ask until a valid choice is entered. End of input is an error rather
/// than an implicit choice.
pub fn prompt_for_decision<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<ApprovalDecision, PipelineError> {
    let out = |e| PipelineError::io("<stdout>", e);
    writeln!(writer, "\n{}", MENU).map_err(out)?;

    let mut state = ApprovalState::AwaitingChoice;
    loop {
        write!(writer, "Your choice (A/R/G): ").map_err(out)?;
        writer.flush().map_err(out)?;

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| PipelineError::io("<stdin>", e))?;
        if read == 0 {
            return Err(PipelineError::InputClosed);
        }

        state = state.transition(&line);
        if let Some(decision) = state.decision() {
            tracing::debug!(?decision, "approval decision");
            return Ok(decision);
        }
        writeln!(writer, "Invalid choice. Please enter A, R, or G.").map_err(out)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse() {
        assert_eq!(ApprovalDecision::parse("A"), Some(ApprovalDecision::Accept));
        assert_eq!(ApprovalDecision::parse(" r \n"), Some(ApprovalDecision::Reject));
        assert_eq!(ApprovalDecision::parse("g"), Some(ApprovalDecision::Regenerate));
        assert_eq!(ApprovalDecision::parse("accept"), None);
        assert_eq!(ApprovalDecision::parse(""), None);
    }

    #[test]
    fn test_transitions() {
        let s = ApprovalState::AwaitingChoice;
        assert_eq!(s.transition("x"), ApprovalState::AwaitingChoice);
        assert_eq!(s.transition("a"), ApprovalState::Accepted);
        assert_eq!(s.transition("R"), ApprovalState::Rejected);
        assert_eq!(s.transition("G"), ApprovalState::Regenerating);
        assert_eq!(
            ApprovalState::Accepted.transition("R"),
            ApprovalState::Accepted
        );
    }

    #[test]
    fn test_prompt_reprompts_on_invalid_input() {
        let mut input = Cursor::new("maybe\n\nr\n");
        let mut output = Vec::new();
        let decision = prompt_for_decision(&mut input, &mut output).unwrap();
        assert_eq!(decision, ApprovalDecision::Reject);

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Your choice (A/R/G): ").count(), 3);
        assert_eq!(shown.matches("Invalid choice").count(), 2);
    }

    #[test]
    fn test_prompt_eof_is_input_closed() {
        let mut input = Cursor::new("nope\n");
        let mut output = Vec::new();
        let err = prompt_for_decision(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, PipelineError::InputClosed));
    }

    #[test]
    fn test_prompt_accepts_last_line_without_newline() {
        let mut input = Cursor::new("A");
        let mut output = Vec::new();
        assert_eq!(
            prompt_for_decision(&mut input, &mut output).unwrap(),
            ApprovalDecision::Accept
        );
    }
}
