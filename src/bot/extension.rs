use std::collections::HashSet;

use super::{Command, commands};
use crate::error::ExtensionError;

/// The command bundle loaded at startup.
pub const INFO_COMMANDS: Extension = Extension::new("info_commands", commands::all);

const MAX_NAME_LEN: usize = 32;

/// A named bundle of commands, loaded as a unit.
pub struct Extension {
    name: &'static str,
    commands: fn() -> Vec<Command>,
}

impl Extension {
    pub const fn new(name: &'static str, commands: fn() -> Vec<Command>) -> Self {
        Self { name, commands }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds the bundle's commands, rejecting any set Discord would refuse to register.
    pub fn load(&self) -> Result<Vec<Command>, ExtensionError> {
        let commands = (self.commands)();
        check_names(self.name, commands.iter().map(|command| &*command.name))?;
        Ok(commands)
    }
}

fn check_names<'a>(
    extension: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ExtensionError> {
    let mut seen = HashSet::new();

    for name in names {
        if !is_valid_name(name) {
            return Err(ExtensionError::InvalidName {
                extension,
                command: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ExtensionError::Duplicate {
                extension,
                command: name.to_string(),
            });
        }
    }

    if seen.is_empty() {
        return Err(ExtensionError::Empty { extension });
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    (1..=MAX_NAME_LEN).contains(&name.chars().count())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_commands_load() {
        let commands = INFO_COMMANDS.load().unwrap();
        let names: Vec<_> = commands.iter().map(|command| &*command.name).collect();
        assert_eq!(names, ["ping", "botinfo", "serverinfo"]);
    }

    #[test]
    fn empty_bundle_is_rejected() {
        let err = Extension::new("nothing", Vec::new).load().unwrap_err();
        assert!(matches!(
            err,
            ExtensionError::Empty {
                extension: "nothing"
            }
        ));
    }

    #[test]
    fn names_must_be_discord_compatible() {
        assert!(check_names("ext", ["ping", "server-info", "bot_info2"]).is_ok());

        for bad in ["", "Ping", "server info", "pïng", &"x".repeat(33)] {
            let err = check_names("ext", [bad]).unwrap_err();
            assert!(
                matches!(err, ExtensionError::InvalidName { ref command, .. } if command == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = check_names("ext", ["ping", "botinfo", "ping"]).unwrap_err();
        assert!(matches!(err, ExtensionError::Duplicate { ref command, .. } if command == "ping"));
    }
}
