//! Global subscriber setup

use serde::Deserialize;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output style of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable lines on stderr
    #[default]
    Development,
    /// One JSON object per event on stderr
    Production,
    /// No output; pair with `init_test_capture()`
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "adamsdb=debug",
            Profile::Production | Profile::Test => "adamsdb=info",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INSTALLED: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Later calls are ignored, as is an already-installed subscriber.
pub fn init(profile: Profile) {
    INSTALLED.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(profile.filter())
            .with_writer(std::io::stderr);
        let _installed = match profile {
            Profile::Development => builder.try_init().is_ok(),
            Profile::Production => builder.json().try_init().is_ok(),
            Profile::Test => tracing_subscriber::registry().try_init().is_ok(),
        };
    });
}
