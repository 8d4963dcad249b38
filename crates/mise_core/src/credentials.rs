use std::collections::HashMap;

/// Name under which the NYT developer API key is looked up.
pub const NYT_API_KEY: &str = "NYT_API_KEY";

const PLACEHOLDER_VALUE: &str = "your_api_key_here";
const MIN_CREDENTIAL_LEN: usize = 10;

/// Source of API credentials. Storage of the secrets themselves lives
/// outside this workspace.
pub trait CredentialSource: Send + Sync {
    fn get_credential(&self, name: &str) -> Option<String>;
}

/// Reads credentials from process environment variables.
///
/// `alias` maps a logical credential name to the variable actually read,
/// so a deployment can keep the key under a different variable name.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    aliases: HashMap<String, String>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, name: &str, variable: &str) -> Self {
        self.aliases.insert(name.to_string(), variable.to_string());
        self
    }
}

impl CredentialSource for EnvCredentials {
    fn get_credential(&self, name: &str) -> Option<String> {
        let variable = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        std::env::var(variable).ok().filter(|v| is_usable(v))
    }
}

/// Fixed set of credentials, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get_credential(&self, name: &str) -> Option<String> {
        self.values.get(name).filter(|v| is_usable(v)).cloned()
    }
}

/// Blank keys, the setup placeholder and obviously truncated keys count as absent.
fn is_usable(value: &str) -> bool {
    let value = value.trim();
    value != PLACEHOLDER_VALUE && value.len() >= MIN_CREDENTIAL_LEN
}
