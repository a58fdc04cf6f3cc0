//! Fixed catalog of supported package managers and the per-action argv
//! fragments used to drive them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Install,
    Remove,
    Update,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self { Action::Install => "install", Action::Remove => "remove", Action::Update => "update" }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a package name joins the fragment it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// Package names are separate trailing tokens.
    Separate,
    /// The fragment's last token is a prefix; each package name is glued onto it.
    Concatenate,
}

/// Arguments for one action. Each step becomes its own invocation of the
/// manager program, chained in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub steps: &'static [&'static [&'static str]],
    pub attach: Attach,
}

impl Fragment {
    pub const fn separate(steps: &'static [&'static [&'static str]]) -> Self {
        Fragment { steps, attach: Attach::Separate }
    }

    pub const fn concatenate(steps: &'static [&'static [&'static str]]) -> Self {
        Fragment { steps, attach: Attach::Concatenate }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSpec {
    pub id: &'static str,
    pub program: &'static str,
    pub needs_sudo: bool,
    pub install: Option<Fragment>,
    pub remove: Option<Fragment>,
    pub update: Option<Fragment>,
}

impl ManagerSpec {
    pub fn fragment(&self, action: Action) -> Option<&Fragment> {
        match action {
            Action::Install => self.install.as_ref(),
            Action::Remove => self.remove.as_ref(),
            Action::Update => self.update.as_ref(),
        }
    }
}

static BUILTIN: [ManagerSpec; 5] = [
    ManagerSpec {
        id: "dnf",
        program: "dnf",
        needs_sudo: true,
        install: Some(Fragment::separate(&[&["install"]])),
        remove: Some(Fragment::separate(&[&["remove"]])),
        update: Some(Fragment::separate(&[&["update"]])),
    },
    // apt refreshes metadata and upgrades packages in two separate runs
    ManagerSpec {
        id: "apt",
        program: "apt",
        needs_sudo: true,
        install: Some(Fragment::separate(&[&["install"]])),
        remove: Some(Fragment::separate(&[&["remove"]])),
        update: Some(Fragment::separate(&[&["update"], &["upgrade"]])),
    },
    ManagerSpec {
        id: "pacman",
        program: "pacman",
        needs_sudo: true,
        install: Some(Fragment::separate(&[&["-S"]])),
        remove: Some(Fragment::separate(&[&["-R"]])),
        update: Some(Fragment::separate(&[&["-Syu"]])),
    },
    ManagerSpec {
        id: "flatpak",
        program: "flatpak",
        needs_sudo: false,
        install: Some(Fragment::separate(&[&["install"]])),
        remove: Some(Fragment::separate(&[&["remove"]])),
        update: Some(Fragment::separate(&[&["update"]])),
    },
    // nix-env selects packages by attribute path: `nixpkgs.<name>`
    ManagerSpec {
        id: "nix",
        program: "nix-env",
        needs_sudo: false,
        install: Some(Fragment::concatenate(&[&["-iA", "nixpkgs."]])),
        remove: Some(Fragment::separate(&[&["-e"]])),
        update: Some(Fragment::separate(&[&["-u"]])),
    },
];

/// Immutable lookup table of manager specs. The built-in table is the
/// default; tests can hand a [`crate::command::Composer`] their own.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [ManagerSpec],
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Catalog { entries: &BUILTIN }
    }

    #[cfg(test)]
    pub fn new(entries: &'static [ManagerSpec]) -> Self {
        Catalog { entries }
    }

    pub fn lookup(&self, id: &str) -> Option<&ManagerSpec> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn specs(&self) -> &'static [ManagerSpec] {
        self.entries
    }

    /// Catalog position of `id`; unknown ids sort after every known one.
    pub fn rank(&self, id: &str) -> usize {
        self.entries.iter().position(|m| m.id == id).unwrap_or(self.entries.len())
    }
}
