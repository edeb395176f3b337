//! Temporary variable names.

/// Mints `$<prefix>0`, `$<prefix>1`, ... for one session.
///
/// The counter only moves forward, so every name minted in a session is
/// distinct even though the driver restarts its traversal after each edit.
#[derive(Clone, Debug)]
pub(crate) struct TempNames {
    prefix: String,
    next: usize,
}

impl TempNames {
    pub(crate) fn new(prefix: &str) -> Self {
        TempNames {
            prefix: format!("${prefix}"),
            next: 0,
        }
    }

    pub(crate) fn fresh(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }

    /// How many names have been handed out.
    pub(crate) fn minted(&self) -> usize {
        self.next
    }
}

/// Whether `name` is spelled like a temporary for `prefix`.
pub(crate) fn is_temp(name: &str, prefix: &str) -> bool {
    name.strip_prefix('$')
        .and_then(|rest| rest.strip_prefix(prefix))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn counts_from_zero_without_reuse() {
        let mut names = TempNames::new("var");
        assert_eq!(names.fresh(), "$var0");
        assert_eq!(names.fresh(), "$var1");
        assert_eq!(names.minted(), 2);
    }

    #[test]
    fn recognizes_temporaries() {
        assert!(is_temp("$var0", "var"));
        assert!(is_temp("$var17", "var"));
        assert!(!is_temp("$var", "var"));
        assert!(!is_temp("$tpl_var0", "var"));
        assert!(!is_temp("$variable", "var"));
        assert!(!is_temp("var0", "var"));
    }
}
