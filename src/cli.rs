//! `clap`-derived argument parsing and default-action resolution.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Verifies a PS3 game directory against a sidecar IRD manifest")]
pub struct Args {
    /// Sidecar IRD manifest for the game
    pub ird_file: PathBuf,

    /// Directory holding the extracted/copied game files
    pub game_dir: Option<PathBuf>,

    /// Print the expected file list
    #[arg(short = 'p', long = "print", group = "action")]
    pub print: bool,

    /// Print md5sum-compatible hashes of the expected files
    #[arg(short = 'm', long = "md5sums", group = "action")]
    pub md5sums: bool,

    /// Verify game_dir against the manifest
    #[arg(short = 'c', long = "check", group = "action")]
    pub check: bool,

    /// Enable progress diagnostics
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Print,
    Md5Sums,
    Check,
}

/// A usage error distinct from a decode/verify failure; callers map this to
/// exit code 2.
#[derive(Debug)]
pub struct UsageError(pub String);

impl Args {
    /// Resolves the chosen action, applying the spec's default (`check` if
    /// `game_dir` was given, else `print`) when none of `-p/-m/-c` is set.
    /// Mutual exclusivity between `-p`, `-m`, and `-c` is already enforced
    /// by clap's `action` arg group; this only covers the cross-argument
    /// rule clap can't express declaratively.
    pub fn resolve_action(&self) -> Result<Action, UsageError> {
        let action = if self.print {
            Action::Print
        } else if self.md5sums {
            Action::Md5Sums
        } else if self.check {
            Action::Check
        } else if self.game_dir.is_some() {
            Action::Check
        } else {
            Action::Print
        };

        if action == Action::Check && self.game_dir.is_none() {
            return Err(UsageError(
                "-c/--check requires a game_dir argument".to_string(),
            ));
        }

        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(print: bool, md5sums: bool, check: bool, game_dir: Option<&str>) -> Args {
        Args {
            ird_file: PathBuf::from("game.ird"),
            game_dir: game_dir.map(PathBuf::from),
            print,
            md5sums,
            check,
            verbose: false,
        }
    }

    #[test]
    fn defaults_to_print_without_game_dir() {
        let a = args(false, false, false, None);
        assert_eq!(a.resolve_action().unwrap(), Action::Print);
    }

    #[test]
    fn defaults_to_check_with_game_dir() {
        let a = args(false, false, false, Some("/games/X"));
        assert_eq!(a.resolve_action().unwrap(), Action::Check);
    }

    #[test]
    fn check_without_game_dir_is_a_usage_error() {
        let a = args(false, false, true, None);
        assert!(a.resolve_action().is_err());
    }

    #[test]
    fn explicit_print_wins_even_with_game_dir() {
        let a = args(true, false, false, Some("/games/X"));
        assert_eq!(a.resolve_action().unwrap(), Action::Print);
    }
}
