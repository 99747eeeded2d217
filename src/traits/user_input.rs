use anyhow::Result;
#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::Mutex;

/// Trait for user input operations to enable testing with mocks
pub trait UserInput: Send + Sync {
    /// Display a confirmation prompt (yes/no)
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Real user input implementation using inquire crate
pub struct InquireUserInput;

impl UserInput for InquireUserInput {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        use inquire::Confirm;
        let answer = Confirm::new(prompt).with_default(default).prompt()?;
        Ok(answer)
    }
}

/// Mock user input implementation for testing
#[cfg(test)]
pub struct MockUserInput {
    confirmations: Mutex<VecDeque<bool>>,
}

#[cfg(test)]
impl MockUserInput {
    /// Create new mock with no pre-configured answers
    pub fn new() -> Self {
        Self::with_confirmations(Vec::new())
    }

    /// Create mock with pre-configured confirmation answers
    pub fn with_confirmations(answers: Vec<bool>) -> Self {
        Self {
            confirmations: Mutex::new(answers.into()),
        }
    }
}

#[cfg(test)]
impl Default for MockUserInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl UserInput for MockUserInput {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool> {
        self.confirmations
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No more mock responses available"))
    }
}
