//! Error helpers shared by the board-watch crates.
//!
//! Most errors in the workspace are `snafu` enums wrapping another error as
//! `source`. When such an error ends up in a log line, the `Display` of the
//! outermost variant alone is rarely enough, so [`FmtCompact`] renders the
//! whole chain on one line: `outer: middle: root cause`.

use std::{error, fmt};

/// One-line rendering of an error and all of its sources.
pub struct CompactChain<'e>(&'e (dyn error::Error + 'e));

impl fmt::Display for CompactChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cur = Some(self.0);
        let mut prev: Option<String> = None;

        while let Some(err) = cur {
            let msg = err.to_string();
            // snafu variants often embed `{source}` in their own display,
            // skip a level that adds nothing new.
            let redundant = prev.as_deref().is_some_and(|p| p.ends_with(&msg));
            if !redundant {
                if prev.is_some() {
                    f.write_str(": ")?;
                }
                f.write_str(&msg)?;
            }
            prev = Some(msg);
            cur = err.source();
        }

        Ok(())
    }
}

pub trait FmtCompact<'e> {
    fn fmt_compact(self) -> CompactChain<'e>;
}

impl<'e, E> FmtCompact<'e> for &'e E
where
    E: error::Error + 'e,
{
    fn fmt_compact(self) -> CompactChain<'e> {
        CompactChain(self)
    }
}

#[cfg(test)]
mod tests {
    use snafu::{ResultExt as _, Snafu};

    use super::*;

    #[derive(Debug, Snafu)]
    #[snafu(display("disk on fire"))]
    struct RootError;

    #[derive(Debug, Snafu)]
    enum MidError {
        #[snafu(display("could not write"))]
        Write { source: RootError },
    }

    #[derive(Debug, Snafu)]
    enum TopError {
        #[snafu(display("save failed"))]
        Save { source: MidError },
        #[snafu(display("load failed: {source}"))]
        Load { source: RootError },
    }

    fn write() -> Result<(), MidError> {
        Err(RootError).context(WriteSnafu)
    }

    #[test]
    fn renders_full_chain() {
        let err = write().context(SaveSnafu).unwrap_err();
        assert_eq!(
            err.fmt_compact().to_string(),
            "save failed: could not write: disk on fire"
        );
    }

    #[test]
    fn skips_source_already_in_display() {
        let err: Result<(), TopError> = Err(RootError).context(LoadSnafu);
        assert_eq!(
            err.unwrap_err().fmt_compact().to_string(),
            "load failed: disk on fire"
        );
    }
}
