//! Static rules and build parameters.
//!
//! A static rule is a named shell command template registered once and
//! instantiated by any number of build edges. Templates use ninja syntax:
//! `$out`, `$in`, `${var}` or `$var`, and `$$` for a literal dollar.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::error::BuildError;

/// A named, parameterized shell command.
#[derive(Debug, PartialEq, Eq)]
pub struct StaticRule {
    pub name: &'static str,
    pub command: &'static str,
    pub description: &'static str,
    /// Variables each edge must supply, beyond `in` and `out`.
    pub args: &'static [&'static str],
}

/// Identity copy of a single input.
pub static CP: StaticRule = StaticRule {
    name: "cp",
    command: "rm -f $out && cp $in $out",
    description: "cp $out",
    args: &[],
};

/// Parameters for one build edge, as declared by a module.
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    pub rule: Option<&'static StaticRule>,
    pub output: PathBuf,
    /// Explicit inputs, substituted for `$in`.
    pub inputs: Vec<PathBuf>,
    /// Inputs that must exist before the command runs.
    pub order_only: Vec<PathBuf>,
    pub args: BTreeMap<String, String>,
}

impl BuildParams {
    pub fn new(rule: &'static StaticRule, output: impl Into<PathBuf>) -> Self {
        Self {
            rule: Some(rule),
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn order_only(mut self, path: impl Into<PathBuf>) -> Self {
        self.order_only.push(path.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// A validated build edge owned by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEdge {
    pub module: String,
    pub rule: &'static StaticRule,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub order_only: Vec<PathBuf>,
    pub args: BTreeMap<String, String>,
}

impl BuildEdge {
    /// Check `params` against its rule and attribute the edge to `module`.
    pub fn from_params(module: &str, params: BuildParams) -> Result<Self, BuildError> {
        let rule = params.rule.ok_or(BuildError::InvalidBuildParams {
            rule: "<none>",
            reason: format!("no rule given for {}", params.output.display()),
        })?;

        if params.output.as_os_str().is_empty() {
            return Err(BuildError::InvalidBuildParams {
                rule: rule.name,
                reason: "no output given".to_string(),
            });
        }

        for key in params.args.keys() {
            if !rule.args.contains(&key.as_str()) {
                return Err(BuildError::InvalidBuildParams {
                    rule: rule.name,
                    reason: format!("unknown argument \"{}\"", key),
                });
            }
        }
        for key in rule.args {
            if !params.args.contains_key(*key) {
                return Err(BuildError::InvalidBuildParams {
                    rule: rule.name,
                    reason: format!("missing argument \"{}\"", key),
                });
            }
        }

        Ok(Self {
            module: module.to_string(),
            rule,
            output: params.output,
            inputs: params.inputs,
            order_only: params.order_only,
            args: params.args,
        })
    }

    /// The command line for this edge with every variable substituted.
    pub fn command(&self) -> Result<String, BuildError> {
        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let output = self.output.to_string_lossy();
        expand(self.rule, self.rule.command, |name| match name {
            "in" => Some(inputs.join(" ")),
            "out" => Some(output.to_string()),
            other => self.args.get(other).cloned(),
        })
    }

    /// Every path that must exist before the command runs.
    pub fn all_inputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.inputs
            .iter()
            .chain(&self.order_only)
    }
}

/// Substitute `$name`, `${name}` and `$$` in `template`.
pub fn expand(
    rule: &StaticRule,
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, BuildError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let name = match chars.peek().copied() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
                continue;
            }
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => {
                            return Err(BuildError::InvalidBuildParams {
                                rule: rule.name,
                                reason: "unterminated ${ in command".to_string(),
                            })
                        }
                    }
                }
                name
            }
            _ => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                name
            }
        };

        if name.is_empty() {
            return Err(BuildError::InvalidBuildParams {
                rule: rule.name,
                reason: "bare $ in command".to_string(),
            });
        }

        let value = lookup(&name).ok_or_else(|| BuildError::InvalidBuildParams {
            rule: rule.name,
            reason: format!("undefined variable \"{}\"", name),
        })?;
        out.push_str(&value);
    }

    Ok(out)
}
