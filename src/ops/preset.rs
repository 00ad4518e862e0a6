//! Preset mode.
//!
//! Presets are named option sets stored in INI-like files:
//!
//! ```ini
//! [preset: release]
//! mixin-preset=common
//! build-variant=release
//! anthem-version=%(version)s
//! test
//! ```
//!
//! Every `key=value` line becomes `--key=value` and every bare `key` line
//! becomes `--key`. `mixin-preset` pulls in the options of other presets at
//! that position, and `%(name)s` is replaced with a substitution given on
//! the command line. A preset expands into a complete `configure` or
//! `compose` invocation of this program.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use miette::Diagnostic as MietteDiagnostic;
use regex::Regex;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::{quote_command, ProcessBuilder};
use crate::util::shell::Shell;

/// Key that includes other presets.
const MIXIN_KEY: &str = "mixin-preset";

/// Prefix of the section headers that declare presets.
const SECTION_PREFIX: &str = "preset:";

const SUBSTITUTION_PATTERN: &str = r"%\((\w+)\)s|%%";

/// Error raised while reading or expanding presets.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PresetError {
    #[error("preset `{name}` was not found")]
    #[diagnostic(code(couplet::preset::not_found))]
    PresetNotFound { name: String, files: Vec<PathBuf> },

    #[error("missing the `--name` option")]
    #[diagnostic(code(couplet::preset::missing_name))]
    MissingPresetName,

    #[error("{}:{line}: {message}", path.display())]
    #[diagnostic(code(couplet::preset::malformed))]
    MalformedPresetFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("preset `{preset}` needs a value for `{name}`")]
    #[diagnostic(code(couplet::preset::missing_substitution))]
    MissingSubstitution { name: String, preset: String },

    #[error("invalid substitution `{arg}`; expected NAME=VALUE")]
    #[diagnostic(code(couplet::preset::malformed_substitution))]
    MalformedSubstitution { arg: String },

    #[error("preset `{name}` includes itself through `mixin-preset`")]
    #[diagnostic(code(couplet::preset::recursive_mixin))]
    RecursiveMixin { name: String },

    #[error(transparent)]
    #[diagnostic(code(couplet::preset::pattern))]
    Pattern(#[from] regex::Error),
}

impl PresetError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PresetError::PresetNotFound { name, files } => {
                let mut diag = Diagnostic::error(format!("preset `{}` was not found", name));
                for file in files {
                    diag = diag.with_context(format!("searched {}", file.display()));
                }
                diag.with_suggestion(suggestions::LIST_PRESETS)
            }

            PresetError::MissingPresetName => Diagnostic::error(self.to_string())
                .with_suggestion("Pass the preset to use with `--name NAME`")
                .with_suggestion(suggestions::LIST_PRESETS),

            PresetError::MalformedPresetFile { path, line, message } => {
                Diagnostic::error(format!("malformed preset file: {}", message))
                    .with_location(path)
                    .with_context(format!("on line {}", line))
            }

            PresetError::MissingSubstitution { name, .. } => Diagnostic::error(self.to_string())
                .with_suggestion(format!("Pass `{}=VALUE` after the preset options", name)),

            _ => Diagnostic::error(self.to_string()),
        }
    }
}

/// One line of a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PresetOption {
    key: String,
    value: Option<String>,
}

/// All presets read from a list of files.
#[derive(Debug, Default)]
pub struct PresetSet {
    presets: BTreeMap<String, Vec<PresetOption>>,
    files: Vec<PathBuf>,
}

impl PresetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file in `paths`. Files that don't exist are skipped.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut set = PresetSet::new();
        for path in paths {
            if !path.is_file() {
                tracing::trace!("no preset file at {}", path.display());
                set.files.push(path.clone());
                continue;
            }
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            set.parse(&contents, path)?;
        }
        Ok(set)
    }

    /// Add the presets in `contents`. A preset declared again extends the
    /// earlier declaration, replacing options with the same key.
    pub fn parse(&mut self, contents: &str, path: &Path) -> Result<(), PresetError> {
        self.files.push(path.to_path_buf());

        let malformed = |line: usize, message: &str| PresetError::MalformedPresetFile {
            path: path.to_path_buf(),
            line,
            message: message.to_string(),
        };

        // `None` inside a section that doesn't declare a preset
        let mut section: Option<Option<String>> = None;
        let mut last_key: Option<String> = None;

        for (index, raw) in contents.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Indented lines continue the value of the previous option.
            if line.len() != trimmed.len() {
                if let (Some(Some(name)), Some(key)) = (&section, &last_key) {
                    if let Some(option) = self
                        .presets
                        .get_mut(name)
                        .and_then(|options| options.iter_mut().find(|o| &o.key == key))
                    {
                        let value = option.value.get_or_insert_with(String::new);
                        value.push('\n');
                        value.push_str(trimmed);
                    }
                    continue;
                }
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let header = header
                    .strip_suffix(']')
                    .ok_or_else(|| malformed(line_number, "unterminated section header"))?
                    .trim();
                last_key = None;

                section = match header.strip_prefix(SECTION_PREFIX) {
                    Some(name) => {
                        let name = name.trim();
                        if name.is_empty() {
                            return Err(malformed(line_number, "preset without a name"));
                        }
                        self.presets.entry(name.to_string()).or_default();
                        Some(Some(name.to_string()))
                    }
                    None => {
                        tracing::trace!("skipping section [{}] in {}", header, path.display());
                        Some(None)
                    }
                };
                continue;
            }

            let Some(current) = &section else {
                return Err(malformed(line_number, "option outside of a preset"));
            };

            let (key, value) = match trimmed.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
                None => (trimmed, None),
            };
            if key.is_empty() {
                return Err(malformed(line_number, "option without a name"));
            }

            let Some(name) = current else {
                continue;
            };
            let options = self.presets.entry(name.clone()).or_default();
            match options.iter_mut().find(|o| o.key == key) {
                Some(option) => option.value = value,
                None => options.push(PresetOption {
                    key: key.to_string(),
                    value,
                }),
            }
            last_key = Some(key.to_string());
        }

        Ok(())
    }

    /// Names of every preset, sorted case-insensitively.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Expand a preset into command-line options.
    pub fn expand(
        &self,
        name: &str,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, PresetError> {
        let pattern = Regex::new(SUBSTITUTION_PATTERN)?;
        let mut args = Vec::new();
        self.expand_into(name, substitutions, &pattern, &mut Vec::new(), &mut args)?;
        Ok(args)
    }

    fn expand_into(
        &self,
        name: &str,
        substitutions: &BTreeMap<String, String>,
        pattern: &Regex,
        stack: &mut Vec<String>,
        args: &mut Vec<String>,
    ) -> Result<(), PresetError> {
        if stack.iter().any(|n| n == name) {
            return Err(PresetError::RecursiveMixin {
                name: name.to_string(),
            });
        }
        let options = self
            .presets
            .get(name)
            .ok_or_else(|| PresetError::PresetNotFound {
                name: name.to_string(),
                files: self.files.clone(),
            })?;

        stack.push(name.to_string());
        for option in options {
            let value = option.value.as_deref().unwrap_or("");

            if option.key == MIXIN_KEY {
                for mixin in value.split_whitespace() {
                    self.expand_into(mixin, substitutions, pattern, stack, args)?;
                }
                continue;
            }

            if value.is_empty() {
                args.push(format!("--{}", option.key));
            } else {
                let value = substitute(pattern, value, substitutions, name)?;
                args.push(format!("--{}={}", option.key, value));
            }
        }
        stack.pop();

        Ok(())
    }
}

/// Replace `%(name)s` with its substitution and `%%` with `%`.
fn substitute(
    pattern: &Regex,
    value: &str,
    substitutions: &BTreeMap<String, String>,
    preset: &str,
) -> Result<String, PresetError> {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;

    for captures in pattern.captures_iter(value) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        out.push_str(&value[last..whole.start()]);
        match captures.get(1) {
            Some(name) => {
                let replacement = substitutions.get(name.as_str()).ok_or_else(|| {
                    PresetError::MissingSubstitution {
                        name: name.as_str().to_string(),
                        preset: preset.to_string(),
                    }
                })?;
                out.push_str(replacement);
            }
            None => out.push('%'),
        }
        last = whole.end();
    }
    out.push_str(&value[last..]);

    Ok(out)
}

/// Parse `NAME=VALUE` substitution arguments.
pub fn parse_substitutions(raw: &[String]) -> Result<BTreeMap<String, String>, PresetError> {
    raw.iter()
        .map(|arg| {
            tracing::trace!("found a preset substitution: {}", arg);
            match arg.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    Ok((name.to_string(), value.to_string()))
                }
                _ => Err(PresetError::MalformedSubstitution { arg: arg.clone() }),
            }
        })
        .collect()
}

/// Preset files read when none are given.
pub fn default_preset_files(source_root: &Path, repository: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(dirs) = directories::BaseDirs::new() {
        files.push(dirs.home_dir().join(".couplet-presets"));
    }
    files.push(
        source_root
            .join(repository)
            .join("util")
            .join("build-presets.ini"),
    );
    files
}

/// The mode a preset invocation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetRunMode {
    Configure,
    Compose,
}

impl PresetRunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetRunMode::Configure => "configure",
            PresetRunMode::Compose => "compose",
        }
    }
}

impl fmt::Display for PresetRunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for preset mode.
#[derive(Debug, Clone)]
pub struct PresetOptions {
    pub mode: PresetRunMode,

    /// Preset files; empty means the default files
    pub files: Vec<PathBuf>,

    /// Preset to expand
    pub name: Option<String>,

    /// List the presets instead of running one
    pub show: bool,

    /// Print the expanded invocation without running it
    pub expand_script_invocation: bool,

    /// Raw `NAME=VALUE` substitutions
    pub substitutions: Vec<String>,

    pub dry_run: bool,
    pub clean: bool,
    pub print_debug: u8,

    /// Explicit `--jobs`, forwarded to the expanded invocation
    pub jobs: Option<usize>,
}

/// Expand the selected preset into the arguments of a direct invocation,
/// without the program name.
pub fn expand_invocation(options: &PresetOptions, presets: &PresetSet) -> Result<Vec<String>> {
    let name = options.name.as_deref().ok_or(PresetError::MissingPresetName)?;
    let substitutions = parse_substitutions(&options.substitutions)?;

    let mut args = vec![options.mode.to_string()];
    if options.dry_run {
        args.push("--dry-run".to_string());
    }
    if options.clean {
        args.push("--clean".to_string());
    }
    for _ in 0..options.print_debug {
        args.push("--print-debug".to_string());
    }
    args.extend(presets.expand(name, &substitutions)?);
    if let Some(jobs) = options.jobs {
        args.push("--jobs".to_string());
        args.push(jobs.to_string());
    }

    Ok(args)
}

/// Run preset mode.
///
/// `program` is re-run with the expanded invocation unless only the
/// expansion is requested.
pub fn run_preset(
    options: &PresetOptions,
    default_files: Vec<PathBuf>,
    program: &Path,
    shell: &Shell,
) -> Result<()> {
    let files = if options.files.is_empty() {
        default_files
    } else {
        options.files.clone()
    };
    tracing::trace!(
        "the preset files are {}",
        files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let presets = PresetSet::load(&files)?;

    if options.show {
        shell.note("the available presets are:");
        for name in presets.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let args = expand_invocation(options, &presets)?;

    let display_name = program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "couplet".to_string());
    let mut shown = vec![display_name];
    shown.extend(args.iter().cloned());
    shell.note(format!(
        "using preset '{}', which expands to\n\n{}\n",
        options.name.as_deref().unwrap_or_default(),
        quote_command(&shown)
    ));

    if options.expand_script_invocation {
        tracing::trace!("only printing the invocation");
        return Ok(());
    }

    let status = ProcessBuilder::new(program).args(&args).status()?;
    if !status.success() {
        bail!(
            "the `{}` invocation of preset `{}` failed",
            options.mode,
            options.name.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}
