use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

/// Environment variable prefix for every configuration fallback.
pub const ENV_PREFIX: &str = "ASTRA_CHAT_";
/// Channel joined when no `channel` launch parameter is given.
pub const DEFAULT_CHANNEL: &str = "demo";
/// Visual theme applied to the window unless overridden.
pub const DEFAULT_THEME: &str = "Commerce Dark";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display(
        "required parameter `{parameter}` is missing; pass {parameter}=<value> or set {env_var}"
    ))]
    MissingParameter {
        stage: &'static str,
        parameter: &'static str,
        env_var: &'static str,
    },
    #[snafu(display("failed to merge configuration sources: {source}"))]
    Merge {
        stage: &'static str,
        source: figment::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Launch parameters passed as `key=value` command-line arguments.
///
/// These are the desktop analog of query-string parameters: present keys
/// override the corresponding environment fallbacks, absent keys serialize
/// to nothing so the figment merge leaves the fallback in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaunchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
}

impl LaunchParams {
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut params = Self::default();

        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                tracing::debug!(argument = %arg, "ignoring malformed launch argument");
                continue;
            };
            if value.is_empty() {
                continue;
            }

            match key {
                "user" => params.user = Some(value.to_string()),
                "channel" => params.channel = Some(value.to_string()),
                "user_token" => params.user_token = Some(value.to_string()),
                other => {
                    tracing::debug!(parameter = other, "ignoring unknown launch parameter");
                }
            }
        }

        params
    }
}

/// Complete session configuration, constructed once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub server_endpoint: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub user_token: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            server_endpoint: default_endpoint(),
            user: String::new(),
            user_token: String::new(),
            channel: default_channel(),
            theme: default_theme(),
        }
    }
}

impl SessionConfig {
    /// Reads configuration from process arguments and environment.
    pub fn load() -> ConfigResult<Self> {
        Self::resolve(LaunchParams::from_args(std::env::args().skip(1)))
    }

    /// Merges defaults, `ASTRA_CHAT_*` environment fallbacks, and launch
    /// parameters, in that precedence order (parameters win).
    pub fn resolve(params: LaunchParams) -> ConfigResult<Self> {
        let config: SessionConfig = Figment::from(Serialized::defaults(SessionConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                // The environment spells the user fields as defaults; launch
                // parameters use the bare names.
                let key = key.as_str().to_ascii_lowercase();
                match key.as_str() {
                    "default_user" => "user".to_string().into(),
                    "default_user_token" => "user_token".to_string().into(),
                    _ => key.into(),
                }
            }))
            .merge(Serialized::defaults(params))
            .extract()
            .context(MergeSnafu {
                stage: "merge-config-sources",
            })?;

        config.validated()
    }

    fn validated(mut self) -> ConfigResult<Self> {
        self.api_key = self.api_key.trim().to_string();
        self.server_endpoint = self.server_endpoint.trim().to_string();
        self.user = self.user.trim().to_string();
        self.user_token = self.user_token.trim().to_string();
        self.channel = self.channel.trim().to_string();
        self.theme = self.theme.trim().to_string();

        if self.channel.is_empty() {
            self.channel = default_channel();
        }
        if self.theme.is_empty() {
            self.theme = default_theme();
        }
        if self.server_endpoint.is_empty() {
            self.server_endpoint = default_endpoint();
        }

        for (value, parameter, env_var) in [
            (&self.api_key, "api_key", "ASTRA_CHAT_API_KEY"),
            (&self.user, "user", "ASTRA_CHAT_DEFAULT_USER"),
            (
                &self.user_token,
                "user_token",
                "ASTRA_CHAT_DEFAULT_USER_TOKEN",
            ),
        ] {
            if value.is_empty() {
                return MissingParameterSnafu {
                    stage: "validate-config",
                    parameter,
                    env_var,
                }
                .fail();
            }
        }

        Ok(self)
    }
}

fn default_endpoint() -> String {
    astra_client::DEFAULT_BASE_URL.to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> LaunchParams {
        LaunchParams::from_args(values.iter().map(|value| value.to_string()))
    }

    #[test]
    fn launch_parameters_win_over_environment_fallbacks() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ASTRA_CHAT_API_KEY", "key-abc");
            jail.set_env("ASTRA_CHAT_DEFAULT_USER", "env-user");
            jail.set_env("ASTRA_CHAT_DEFAULT_USER_TOKEN", "env-token");

            let config = SessionConfig::resolve(args(&["user=alice", "user_token=tok123"]))
                .expect("config must resolve");

            assert_eq!(config.user, "alice");
            assert_eq!(config.user_token, "tok123");
            assert_eq!(config.api_key, "key-abc");
            Ok(())
        });
    }

    #[test]
    fn environment_fallbacks_apply_when_parameters_are_absent() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ASTRA_CHAT_API_KEY", "key-abc");
            jail.set_env("ASTRA_CHAT_SERVER_ENDPOINT", "https://chat.internal");
            jail.set_env("ASTRA_CHAT_DEFAULT_USER", "env-user");
            jail.set_env("ASTRA_CHAT_DEFAULT_USER_TOKEN", "env-token");

            let config = SessionConfig::resolve(LaunchParams::default())
                .expect("config must resolve");

            assert_eq!(config.user, "env-user");
            assert_eq!(config.user_token, "env-token");
            assert_eq!(config.server_endpoint, "https://chat.internal");
            Ok(())
        });
    }

    #[test]
    fn channel_defaults_to_demo_when_unspecified() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ASTRA_CHAT_API_KEY", "key-abc");

            let config = SessionConfig::resolve(args(&["user=alice", "user_token=tok123"]))
                .expect("config must resolve");

            assert_eq!(config.channel, "demo");
            assert_eq!(config.theme, DEFAULT_THEME);
            Ok(())
        });
    }

    #[test]
    fn missing_user_token_aborts_resolution() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ASTRA_CHAT_API_KEY", "key-abc");

            let error = SessionConfig::resolve(args(&["user=alice"]))
                .expect_err("missing token must fail");

            assert!(matches!(
                error,
                ConfigError::MissingParameter {
                    parameter: "user_token",
                    ..
                }
            ));
            Ok(())
        });
    }

    #[test]
    fn malformed_and_unknown_arguments_are_ignored() {
        let params = args(&["verbose", "user=alice", "mode=debug", "channel="]);

        assert_eq!(params.user.as_deref(), Some("alice"));
        assert_eq!(params.channel, None);
        assert_eq!(params.user_token, None);
    }
}
