use std::borrow::Cow;

use crate::error::{PaktError, Result};
use crate::manager::{Action, Attach, Catalog};

/// One program run: argv[0] plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation { argv: argv.into_iter().map(Into::into).collect() }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn render(&self) -> String {
        self.argv
            .iter()
            .map(|t| shell_escape::escape(Cow::from(t.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Invocations run in order, each only if the previous one succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandChain {
    invocations: Vec<Invocation>,
}

impl CommandChain {
    pub fn new(invocations: Vec<Invocation>) -> Self {
        CommandChain { invocations }
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Shell form, `&&` between invocations. Tokens are quoted only when needed.
    pub fn render(&self) -> String {
        self.invocations.iter().map(Invocation::render).collect::<Vec<_>>().join(" && ")
    }
}

/// A chain with packages attached, and the managers that received them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub chain: CommandChain,
    pub targets: Vec<String>,
}

struct Segment {
    manager: &'static str,
    invocations: Vec<Invocation>,
    attach: Attach,
}

/// Turns (action, managers) into a [`CommandChain`] using a [`Catalog`].
#[derive(Debug, Clone)]
pub struct Composer {
    catalog: Catalog,
    escalation: String,
}

impl Default for Composer {
    fn default() -> Self {
        Composer::new(Catalog::builtin(), "sudo")
    }
}

impl Composer {
    pub fn new(catalog: Catalog, escalation: impl Into<String>) -> Self {
        Composer { catalog, escalation: escalation.into() }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn escalation(&self) -> &str {
        &self.escalation
    }

    fn segments<S: AsRef<str>>(&self, action: Action, managers: &[S]) -> Vec<Segment> {
        let mut out = Vec::new();
        for id in managers.iter().map(AsRef::as_ref) {
            let Some(spec) = self.catalog.lookup(id) else {
                log::debug!("skipping unknown package manager '{}'", id);
                continue;
            };
            let Some(fragment) = spec.fragment(action) else {
                log::debug!("{} does not support {}", id, action);
                continue;
            };
            let invocations = fragment
                .steps
                .iter()
                .map(|step| {
                    let mut argv: Vec<String> = Vec::with_capacity(step.len() + 2);
                    if spec.needs_sudo { argv.push(self.escalation.clone()); }
                    argv.push(spec.program.to_string());
                    argv.extend(step.iter().map(|s| s.to_string()));
                    Invocation::new(argv)
                })
                .collect();
            out.push(Segment { manager: spec.id, invocations, attach: fragment.attach });
        }
        out
    }

    fn unsupported<S: AsRef<str>>(action: Action, managers: &[S]) -> PaktError {
        PaktError::Unsupported {
            action: action.to_string(),
            managers: managers.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", "),
        }
    }

    /// Bare command for `action` across `managers`, in input order. Managers
    /// that are unknown or lack the action are skipped; if none remain the
    /// result is [`PaktError::Unsupported`].
    pub fn compose<S: AsRef<str>>(&self, action: Action, managers: &[S]) -> Result<CommandChain> {
        let segments = self.segments(action, managers);
        if segments.is_empty() {
            return Err(Self::unsupported(action, managers));
        }
        Ok(CommandChain::new(segments.into_iter().flat_map(|s| s.invocations).collect()))
    }

    /// Like [`Composer::compose`], with `packages` attached. They trail the
    /// last invocation of the chain as separate tokens; a concatenating
    /// fragment instead glues each package onto its prefix token, wherever
    /// that segment sits in the chain.
    pub fn compose_for<S: AsRef<str>>(&self, action: Action, managers: &[S], packages: &[String]) -> Result<Composed> {
        if packages.is_empty() {
            return self.compose(action, managers).map(|chain| Composed { chain, targets: Vec::new() });
        }
        let mut segments = self.segments(action, managers);
        if segments.is_empty() {
            return Err(Self::unsupported(action, managers));
        }

        let mut targets: Vec<String> = Vec::new();
        for seg in segments.iter_mut().filter(|s| s.attach == Attach::Concatenate) {
            if let Some(last) = seg.invocations.last_mut() {
                let prefix = last.argv.pop().unwrap_or_default();
                last.argv.extend(packages.iter().map(|p| format!("{prefix}{p}")));
                targets.push(seg.manager.to_string());
            }
        }
        if let Some(seg) = segments.last_mut().filter(|s| s.attach == Attach::Separate) {
            if let Some(last) = seg.invocations.last_mut() {
                last.argv.extend(packages.iter().cloned());
                if !targets.iter().any(|t| t == seg.manager) { targets.push(seg.manager.to_string()); }
            }
        }

        let chain = CommandChain::new(segments.into_iter().flat_map(|s| s.invocations).collect());
        Ok(Composed { chain, targets })
    }
}
