use crate::config::ConfigError;
use std::fmt;

/// A single operation that can be granted to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ChangeDir,
    List,
    Read,
    Append,
    Delete,
    Rename,
    MakeDir,
    Write,
}

impl Permission {
    fn letter(self) -> char {
        match self {
            Permission::ChangeDir => 'e',
            Permission::List => 'l',
            Permission::Read => 'r',
            Permission::Append => 'a',
            Permission::Delete => 'd',
            Permission::Rename => 'f',
            Permission::MakeDir => 'm',
            Permission::Write => 'w',
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'e' => Permission::ChangeDir,
            'l' => Permission::List,
            'r' => Permission::Read,
            'a' => Permission::Append,
            'd' => Permission::Delete,
            'f' => Permission::Rename,
            'm' => Permission::MakeDir,
            'w' => Permission::Write,
            _ => return None,
        })
    }

    const ALL: [Permission; 8] = [
        Permission::ChangeDir,
        Permission::List,
        Permission::Read,
        Permission::Append,
        Permission::Delete,
        Permission::Rename,
        Permission::MakeDir,
        Permission::Write,
    ];
}

/// Permission set written in pyftpdlib letters, e.g. `"elradfmw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    bits: u8,
}

impl Permissions {
    pub fn parse(letters: &str) -> Result<Self, ConfigError> {
        let mut perms = Permissions::default();
        for letter in letters.chars() {
            let perm = Permission::from_letter(letter).ok_or(ConfigError::InvalidPermission(letter))?;
            perms.grant(perm);
        }
        Ok(perms)
    }

    pub fn grant(&mut self, perm: Permission) {
        self.bits |= 1 << perm as u8;
    }

    pub fn allows(&self, perm: Permission) -> bool {
        self.bits & (1 << perm as u8) != 0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for perm in Permission::ALL {
            if self.allows(perm) {
                write!(f, "{}", perm.letter())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_access_string() {
        let perms = Permissions::parse("elradfmw").unwrap();
        for perm in Permission::ALL {
            assert!(perms.allows(perm), "{:?} should be granted", perm);
        }
        assert_eq!(perms.to_string(), "elradfmw");
    }

    #[test]
    fn read_only_string() {
        let perms = Permissions::parse("elr").unwrap();
        assert!(perms.allows(Permission::List));
        assert!(perms.allows(Permission::Read));
        assert!(!perms.allows(Permission::Write));
        assert!(!perms.allows(Permission::Delete));
        assert!(!perms.allows(Permission::Rename));
        assert!(!perms.allows(Permission::MakeDir));
    }

    #[test]
    fn unknown_letter_fails() {
        assert!(matches!(
            Permissions::parse("elz"),
            Err(ConfigError::InvalidPermission('z'))
        ));
    }
}
