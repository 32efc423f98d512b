use serde::Serialize;

/// Flag dialect used when appending coverage and filter tokens.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlagStyle {
  Pytest,
  Js,
}

/// A literal, directly executable token sequence.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandTemplate {
  pub program: String,
  pub args: Vec<String>,
  style: FlagStyle,
  /// npm swallows trailing flags unless they follow a `--`.
  #[serde(skip)]
  needs_separator: bool,
  #[serde(skip)]
  separated: bool,
}

impl CommandTemplate {
  pub fn new<I, S>(program: &str, args: I, style: FlagStyle) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      program: program.to_string(),
      args: args.into_iter().map(Into::into).collect(),
      style,
      needs_separator: false,
      separated: false,
    }
  }

  pub fn with_forwarding_separator(mut self) -> Self {
    self.needs_separator = true;
    self
  }

  pub fn with_coverage(self) -> Self {
    let flag = match self.style {
      FlagStyle::Pytest => "--cov",
      FlagStyle::Js => "--coverage",
    };
    self.with_args([flag])
  }

  pub fn with_filter(self, name: &str) -> Self {
    let flag = match self.style {
      FlagStyle::Pytest => "-k",
      FlagStyle::Js => "-t",
    };
    self.with_args([flag, name])
  }

  pub fn with_args<I, S>(mut self, extra: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut extra = extra.into_iter().map(Into::into).peekable();
    if extra.peek().is_none() {
      return self;
    }
    if self.needs_separator && !self.separated {
      self.args.push("--".to_string());
      self.separated = true;
    }
    self.args.extend(extra);
    self
  }

  pub fn tokens(&self) -> Vec<String> {
    std::iter::once(self.program.clone())
      .chain(self.args.iter().cloned())
      .collect()
  }
}

impl std::fmt::Display for CommandTemplate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        write!(f, " {arg:?}")?;
      } else {
        write!(f, " {arg}")?;
      }
    }
    Ok(())
  }
}
