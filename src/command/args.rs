//! Typed access to a command's argument list.
//!
//! Nothing here fails: a missing index or a value that does not parse is
//! reported through the return value (`None` or the caller's default).
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct CommandArgs<'a> {
    args: &'a [String],
}

impl<'a> CommandArgs<'a> {
    pub fn new(args: &'a [String]) -> Self {
        Self { args }
    }

    pub fn string_at(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(String::as_str)
    }

    /// Parsed `i32`, or `default` when out of range or not a number.
    pub fn int_at(&self, index: usize, default: i32) -> i32 {
        self.parse_at(index).unwrap_or(default)
    }

    pub fn long_at(&self, index: usize, default: i64) -> i64 {
        self.parse_at(index).unwrap_or(default)
    }

    pub fn double_at(&self, index: usize, default: f64) -> f64 {
        self.parse_at(index).unwrap_or(default)
    }

    /// `true`/`false` in any case; anything else yields `default`.
    pub fn bool_at(&self, index: usize, default: bool) -> bool {
        match self.string_at(index) {
            Some(s) if s.eq_ignore_ascii_case("true") => true,
            Some(s) if s.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    pub fn uuid_at(&self, index: usize) -> Option<Uuid> {
        self.string_at(index).and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn has_at_least(&self, length: usize) -> bool {
        self.args.len() >= length
    }

    /// Arguments from `index` onward joined by single spaces (empty if past the end).
    pub fn joined_from(&self, index: usize) -> String {
        self.args.get(index..).map(|rest| rest.join(" ")).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> {
        self.args.iter().map(String::as_str)
    }

    fn parse_at<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.string_at(index).and_then(|s| s.parse().ok())
    }
}
