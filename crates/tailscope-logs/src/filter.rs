use regex::Regex;

/// Compiled level predicate for raw log lines.
///
/// Matches the requested level token case-insensitively as a whole word,
/// which also covers bracket notation like `[ERROR]`. A level of `"all"`,
/// an empty token, or no token at all is a pass-through.
#[derive(Clone, Debug)]
pub struct LevelFilter {
    /// Compiled pattern; `None` means pass-through
    pattern: Option<Regex>,

    /// Original level token
    level: String,
}

impl LevelFilter {
    /// Create a filter for the given level token
    pub fn new(level: Option<&str>) -> Result<Self, regex::Error> {
        let token = level.unwrap_or("").trim();
        if token.is_empty() || token.eq_ignore_ascii_case("all") {
            return Ok(Self {
                pattern: None,
                level: "all".to_string(),
            });
        }

        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(token)))?;
        Ok(Self {
            pattern: Some(pattern),
            level: token.to_string(),
        })
    }

    /// Check if a single line matches the level
    pub fn matches(&self, line: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(line),
            None => true,
        }
    }

    /// Select the matching subsequence of lines, preserving order
    pub fn apply<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|l| self.matches(l.as_ref()))
            .map(|l| l.as_ref().to_string())
            .collect()
    }

    /// Check if the filter passes everything through
    pub fn is_pass_through(&self) -> bool {
        self.pattern.is_none()
    }

    /// Get the original level token
    pub fn level(&self) -> &str {
        &self.level
    }
}
