use uuid::Uuid;

const PRODUCTION_FEEDBACK_HOST: &str = "feedback.push.apple.com";
const SANDBOX_FEEDBACK_HOST: &str = "feedback.sandbox.push.apple.com";
const FEEDBACK_PORT: u16 = 2196;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// Returns the host and port of the feedback service for this environment.
    #[must_use]
    pub const fn feedback_endpoint(self) -> (&'static str, u16) {
        match self {
            Self::Production => (PRODUCTION_FEEDBACK_HOST, FEEDBACK_PORT),
            Self::Sandbox => (SANDBOX_FEEDBACK_HOST, FEEDBACK_PORT),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Self::Production),
            "sandbox" | "development" => Ok(Self::Sandbox),
            _ => Err(format!("Invalid environment: {s}")),
        }
    }
}

/// A registered application and the credentials used to reach the provider on its behalf.
#[derive(Clone)]
pub struct App {
    pub id: Uuid,
    pub name: String,
    pub environment: Environment,
    /// PEM bundle holding the client certificate chain and its private key.
    pub certificate: String,
    /// Passphrase stored alongside the certificate. The TLS transport only accepts unencrypted
    /// keys, so this is carried for the registry and never used to connect.
    pub password: Option<String>,
}

// Credentials stay out of logs.
impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
