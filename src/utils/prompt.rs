//! Operator prompts
//!
//! Services never talk to the terminal directly; they take a `Prompter` so
//! selection logic can run against scripted answers.

use crate::models::JinnResult;
use dialoguer::{Input, Password, Select};

pub trait Prompter: Send + Sync {
    /// Free-text line. An empty answer returns `default` when one is given.
    fn input(&self, prompt: &str, default: Option<&str>) -> JinnResult<String>;

    /// Hidden input
    fn password(&self, prompt: &str) -> JinnResult<String>;

    /// Pick one of `items`; `None` when the operator cancels
    fn select(&self, prompt: &str, items: &[String]) -> JinnResult<Option<usize>>;
}

/// Terminal prompts backed by dialoguer
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn input(&self, prompt: &str, default: Option<&str>) -> JinnResult<String> {
        let mut input = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?.trim().to_string())
    }

    fn password(&self, prompt: &str) -> JinnResult<String> {
        Ok(Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }

    fn select(&self, prompt: &str, items: &[String]) -> JinnResult<Option<usize>> {
        Ok(Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?)
    }
}
