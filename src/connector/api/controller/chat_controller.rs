use anyhow::Result;

use super::super::Container;

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn chat(&self, prompt: &str, system: &str) -> Result<String> {
        let client = self.container.chat_client()?;
        Ok(client.complete_prompt(system, prompt).await?)
    }
}
