//! Command template substitution
//!
//! Scripted builds are authored as command strings with `{placeholder}`
//! markers. Templates are parsed into an explicit placeholder-to-value
//! mapping when the catalog is resolved, so an unknown placeholder is a
//! fatal configuration error instead of leaking into a toolchain
//! invocation. `{{` and `}}` escape literal braces.

use crate::error::ConfigError;

/// The placeholders a command template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Environment-setup script of the current compiler
    EnvScript,
    /// Short identifier of the current compiler
    Compiler,
    /// Toolchain version of the current compiler
    CompilerVersion,
    /// Library name
    Name,
    /// Library version
    Version,
    /// Absolute staged-binary directory
    BinPath,
    /// Absolute extracted-source directory
    SourcePath,
    /// Absolute build directory
    BuildPath,
}

impl Placeholder {
    /// All recognized placeholders
    pub const ALL: &'static [Placeholder] = &[
        Placeholder::EnvScript,
        Placeholder::Compiler,
        Placeholder::CompilerVersion,
        Placeholder::Name,
        Placeholder::Version,
        Placeholder::BinPath,
        Placeholder::SourcePath,
        Placeholder::BuildPath,
    ];

    /// Marker name as written inside braces
    pub fn marker(self) -> &'static str {
        match self {
            Placeholder::EnvScript => "env_script",
            Placeholder::Compiler => "compiler",
            Placeholder::CompilerVersion => "compiler_version",
            Placeholder::Name => "name",
            Placeholder::Version => "version",
            Placeholder::BinPath => "binpath",
            Placeholder::SourcePath => "sourcepath",
            Placeholder::BuildPath => "buildpath",
        }
    }

    /// Look up a placeholder by marker name
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.marker() == marker)
    }
}

/// Values substituted into a template at build time
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub env_script: &'a str,
    pub compiler: &'a str,
    pub compiler_version: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub bin_path: &'a str,
    pub source_path: &'a str,
    pub build_path: &'a str,
}

impl RenderContext<'_> {
    fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::EnvScript => self.env_script,
            Placeholder::Compiler => self.compiler,
            Placeholder::CompilerVersion => self.compiler_version,
            Placeholder::Name => self.name,
            Placeholder::Version => self.version,
            Placeholder::BinPath => self.bin_path,
            Placeholder::SourcePath => self.source_path,
            Placeholder::BuildPath => self.build_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    segments: Vec<Segment>,
}

impl CommandTemplate {
    /// Parse a raw template, rejecting unknown placeholders
    ///
    /// `library` only labels the error messages.
    pub fn parse(raw: &str, library: &str) -> Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut marker = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(m) => marker.push(m),
                            None => {
                                return Err(ConfigError::UnbalancedBraces {
                                    library: library.to_string(),
                                    command: raw.to_string(),
                                })
                            }
                        }
                    }

                    let placeholder = Placeholder::from_marker(&marker).ok_or_else(|| {
                        ConfigError::UnknownPlaceholder {
                            library: library.to_string(),
                            command: raw.to_string(),
                            placeholder: marker.clone(),
                        }
                    })?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                '}' => {
                    return Err(ConfigError::UnbalancedBraces {
                        library: library.to_string(),
                        command: raw.to_string(),
                    })
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Substitute every placeholder with its value
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(ctx.value(*p)),
            }
        }
        out
    }
}

/// Validate a list of raw templates without keeping the parse result
pub fn validate_commands(commands: &[String], library: &str) -> Result<(), ConfigError> {
    for command in commands {
        CommandTemplate::parse(command, library)?;
    }
    Ok(())
}
