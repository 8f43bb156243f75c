//! Canonical text form of a predicate tree
//!
//! | node                  | text                      |
//! |-----------------------|---------------------------|
//! | `Empty`               | ``                        |
//! | `NoValue`             | `name|code:`              |
//! | `SingleValue`         | `name|code:"v"`           |
//! | `MultipleValues`      | `name|code:"v1,v2"`       |
//! | `And(a, b)`           | `(a AND b)`               |
//! | `Or(a, b)`            | `(a OR b)`                |
//! | `Not(a)`              | `!a`                      |
//!
//! Inside quotes `\` and `"` are backslash-escaped, and so is `,` within the
//! elements of a multi-value literal.

use crate::predicate::{Predicate, Searchable};
use std::fmt::{self, Write};

pub(crate) const QUOTE: char = '"';
pub(crate) const ESCAPE: char = '\\';
pub(crate) const SEPARATOR: char = ',';

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str, escape_separator: bool) -> fmt::Result {
    for ch in value.chars() {
        if ch == QUOTE || ch == ESCAPE || (escape_separator && ch == SEPARATOR) {
            f.write_char(ESCAPE)?;
        }
        f.write_char(ch)?;
    }
    Ok(())
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NoValue { name, operator } => write!(f, "{}|{}:", name, operator),
            Predicate::SingleValue {
                name,
                operator,
                value,
            } => {
                write!(f, "{}|{}:{}", name, operator, QUOTE)?;
                write_escaped(f, value, false)?;
                f.write_char(QUOTE)
            }
            Predicate::MultipleValues {
                name,
                operator,
                values,
            } => {
                write!(f, "{}|{}:{}", name, operator, QUOTE)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_char(SEPARATOR)?;
                    }
                    write_escaped(f, value, true)?;
                }
                f.write_char(QUOTE)
            }
            Predicate::And(left, right) => write!(f, "({} AND {})", left, right),
            Predicate::Or(left, right) => write!(f, "({} OR {})", left, right),
            Predicate::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

impl fmt::Display for Searchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Searchable::Empty => Ok(()),
            Searchable::Predicate(predicate) => write!(f, "{}", predicate),
        }
    }
}

impl Searchable {
    /// Canonical text, suitable for a `q=` request parameter or a saved search
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}
