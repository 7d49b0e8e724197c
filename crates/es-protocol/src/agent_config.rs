//! The agent configuration document posted by the configuration form.
//!
//! The form assembles a static document describing three named agents and
//! POSTs it to the backend's configuration endpoint. The backend replies with
//! a raw success/error message that the shell displays verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration for one named agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub model: String,
    pub temperature: f64,
    pub name: String,
    pub system_prompt: String,
    pub tools_enabled: Vec<String>,
}

/// The full document, keyed by agent name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentConfigDocument {
    pub agents: BTreeMap<String, AgentSpec>,
}

impl AgentConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, key: impl Into<String>, spec: AgentSpec) -> Self {
        self.agents.insert(key.into(), spec);
        self
    }

    /// The demo pipeline: a place finder, a data gatherer, and a presenter.
    pub fn demo_default() -> Self {
        Self::new()
            .with_agent(
                "place_finder_agent",
                AgentSpec {
                    model: "xai.grok-4-fast-non-reasoning".to_string(),
                    temperature: 0.7,
                    name: "place_finder_agent".to_string(),
                    system_prompt: "You are an agent that is specialized on finding different \
                                    restaurants/caffeterias depending on type of cuisine. Return \
                                    your answer in the best way possible so other LLM can read \
                                    the information and proceed. Only return a list of the names \
                                    of restaurants/caffeterias found."
                        .to_string(),
                    tools_enabled: vec!["get_restaurants".to_string()],
                },
            )
            .with_agent(
                "data_finder_agent",
                AgentSpec {
                    model: "openai.gpt-4.1".to_string(),
                    temperature: 0.7,
                    name: "data_finder_agent".to_string(),
                    system_prompt: "You are an agent expert in finding restaurant data. You will \
                                    receive the information about a list of restaurants or \
                                    caffeterias to find information about. Your job is to gather \
                                    that information and pass the full data to a new agent that \
                                    will respond to the user. Important, consider including \
                                    links, image references and other UI data to be rendered \
                                    during next steps. Make sure to use the exact restaurant \
                                    names from information."
                        .to_string(),
                    tools_enabled: vec![
                        "get_restaurant_data".to_string(),
                        "get_cafe_data".to_string(),
                    ],
                },
            )
            .with_agent(
                "presenter_agent",
                AgentSpec {
                    model: "xai.grok-4-fast-non-reasoning".to_string(),
                    temperature: 0.7,
                    name: "presenter_agent".to_string(),
                    system_prompt: String::new(),
                    tools_enabled: vec![],
                },
            )
    }
}

/// The configuration endpoint's raw reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub status: String,
    pub message: String,
}

impl ConfigResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
