//! Demo shell: submit one query and project the event stream onto modules.

use es_protocol::ProtocolEvent;

use crate::config::Config;
use crate::modules::{ChatModule, StaticModule};
use crate::router::{Router, SendError};

/// The module layout: one static panel plus the agent-backed chat panels.
pub struct Shell {
    pub header: String,
    pub static_module: StaticModule,
    pub chat_modules: Vec<ChatModule>,
}

impl Shell {
    pub fn from_config(config: &Config) -> Self {
        Self {
            header: config.shell.title.clone(),
            static_module: StaticModule::demo_default(),
            chat_modules: config
                .chat_modules()
                .into_iter()
                .map(|m| ChatModule::new(m.title, m.subtitle))
                .collect(),
        }
    }

    /// Hand one event to every chat module; each applies its own normalizer.
    pub fn apply(&mut self, event: &ProtocolEvent) {
        for module in &mut self.chat_modules {
            module.apply(event);
        }
    }

    /// True once any chat module shows a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.chat_modules.iter().any(ChatModule::is_terminal)
    }
}

/// Submit `query` and print each status transition until the exchange
/// concludes (or the event source ends).
pub async fn run_query(
    router: &Router,
    config: &Config,
    server_url: &str,
    query: &str,
) -> Result<(), SendError> {
    let mut shell = Shell::from_config(config);

    println!("{}", shell.header);
    println!();
    println!("[{}]", shell.static_module.title);
    println!("  {}", shell.static_module.content);
    for note in &shell.static_module.notes {
        println!("  {note}");
    }
    println!();

    let mut handle = router.send_text_message(server_url, query).await?;

    while let Some(event) = handle.next_event().await {
        shell.apply(&event);
        for module in &shell.chat_modules {
            println!("[{}] {}", module.title, module.status_line());
        }
        if shell.is_terminal() {
            break;
        }
    }

    println!();
    for module in &shell.chat_modules {
        println!("[{}]", module.title);
        if let Some(subtitle) = &module.subtitle {
            println!("  {subtitle}");
        }
        println!("  {}", module.response_line());
        println!("  {}", module.status_line());
    }

    Ok(())
}
