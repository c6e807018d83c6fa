use std::collections::HashMap;

/// An external request to run a catalogue command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Authenticated API call naming the command and carrying decoded args
    Api {
        name: String,
        command: String,
        args: HashMap<String, String>,
    },
    /// Webhook call carrying only the UUID and raw query pairs
    Webhook { uuid: String, query: Vec<(String, String)> },
}

impl Trigger {
    pub fn api(name: impl Into<String>, command: impl Into<String>, args: HashMap<String, String>) -> Self {
        Self::Api {
            name: name.into(),
            command: command.into(),
            args,
        }
    }

    pub fn webhook<K, V>(uuid: impl Into<String>, query: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Webhook {
            uuid: uuid.into(),
            query: query.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}

/// Build arguments from query pairs; the first value of a repeated key wins.
pub(crate) fn query_arguments(query: &[(String, String)]) -> HashMap<String, String> {
    let mut args = HashMap::with_capacity(query.len());
    for (key, value) in query {
        args.entry(key.clone()).or_insert_with(|| value.clone());
    }
    args
}
