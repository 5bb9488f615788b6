//! Minimal command-line splitting for the text front-end.
//!
//! Borrows directly from the input line; `arg(n)` yields whitespace-split
//! tokens and `rest_from(n)` the untouched remainder, which is how free-text
//! bodies and reasons keep their internal spacing.

/// A parsed command line: name plus raw argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    name: &'a str,
    rest: &'a str,
}

impl<'a> CommandLine<'a> {
    /// Split an input line into command name and argument text. `None` for
    /// blank input.
    pub fn parse(input: &'a str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        match input.find(char::is_whitespace) {
            Some(idx) => Some(Self {
                name: &input[..idx],
                rest: input[idx..].trim_start(),
            }),
            None => Some(Self {
                name: input,
                rest: "",
            }),
        }
    }

    /// The command name as typed.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The n-th whitespace-delimited argument.
    pub fn arg(&self, n: usize) -> Option<&'a str> {
        self.rest.split_whitespace().nth(n)
    }

    /// The raw remainder starting at the n-th argument, trailing text
    /// included. `None` when there is nothing there.
    pub fn rest_from(&self, n: usize) -> Option<&'a str> {
        let mut remaining = self.rest.trim_start();
        for _ in 0..n {
            let idx = remaining.find(char::is_whitespace)?;
            remaining = remaining[idx..].trim_start();
        }
        let remaining = remaining.trim_end();
        if remaining.is_empty() {
            None
        } else {
            Some(remaining)
        }
    }

    /// Re-parse with the first argument as the command name, for
    /// subcommand groups.
    pub fn shift(&self) -> Option<CommandLine<'a>> {
        let name = self.arg(0)?;
        Some(CommandLine {
            name,
            rest: self.rest_from(1).unwrap_or(""),
        })
    }
}
