/// An already expanded word. The value is the concatenation of its parts;
/// parts are kept apart only so `NAME=value` can be told from a quoted
/// `'NAME=value'`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    parts: Vec<String>,
}

impl Word {
    pub fn new(value: impl Into<String>) -> Self {
        Self { parts: vec![value.into()] }
    }

    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { parts: parts.into_iter().map(Into::into).collect() }
    }

    /// Builds the `name` `=` `value` form the executor treats as an assignment.
    pub fn assignment(name: &str, value: &str) -> Self {
        Self::from_parts([name, "=", value])
    }

    pub fn value(&self) -> String {
        self.parts.concat()
    }

    /// True when the part right after the first one is a lone `=`.
    pub fn is_assignment(&self) -> bool {
        self.parts.get(1).is_some_and(|p| p == "=")
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Word::new(s)
    }
}

impl From<String> for Word {
    fn from(s: String) -> Self {
        Word::new(s)
    }
}
