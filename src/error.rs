use thiserror::Error;

/// Error type returned by commands and collaborators that just need to bubble a failure up.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value {value:?} for environment variable {name}")]
    InvalidEnvVar { name: String, value: String },
}

#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("extension `{extension}` registers no commands")]
    Empty { extension: &'static str },

    #[error("extension `{extension}` has an invalid command name {command:?}")]
    InvalidName {
        extension: &'static str,
        command: String,
    },

    #[error("extension `{extension}` registers `{command}` more than once")]
    Duplicate {
        extension: &'static str,
        command: String,
    },
}

/// Failures that stop the bot.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Boxed due to size.
    #[error(transparent)]
    Discord(#[from] Box<serenity::Error>),

    #[error("Command sync failed, the bot was shut down")]
    CommandSync,
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}
