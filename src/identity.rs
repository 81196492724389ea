use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

const LOADING: &str = "Loading...";

/// Display name of the logged in bot user.
///
/// Cloning gives another handle to the same name. Reads return
/// `Loading...` until the gateway reports the bot as ready.
#[derive(Clone)]
pub struct BotIdentity {
    name: Arc<RwLock<Arc<str>>>,
}

impl BotIdentity {
    pub fn new() -> Self {
        Self {
            name: Arc::new(RwLock::new(Arc::from(LOADING))),
        }
    }

    pub fn set(&self, name: impl Into<Arc<str>>) {
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name.into();
    }

    pub fn get(&self) -> Arc<str> {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_as_loading() {
        assert_eq!(BotIdentity::new().to_string(), "Loading...");
    }

    #[test]
    fn clones_share_the_name() {
        let identity = BotIdentity::new();
        let reader = identity.clone();

        identity.set("watchtower#0420");
        assert_eq!(&*reader.get(), "watchtower#0420");

        identity.set("watchtower");
        assert_eq!(reader.to_string(), "watchtower");
    }

    #[test]
    fn readable_from_another_thread() {
        let identity = BotIdentity::new();
        identity.set("bot");

        let reader = identity.clone();
        let seen = std::thread::spawn(move || reader.to_string())
            .join()
            .unwrap();
        assert_eq!(seen, "bot");
    }
}
