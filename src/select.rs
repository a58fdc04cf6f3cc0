//! Which manager(s) an install/remove/update goes through. Strategies are
//! tried in precedence order; the first one that decides wins.

use crate::distro::{self, DistroDetector};
use crate::error::{PaktError, Result};
use crate::manager::Catalog;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub flatpak: bool,
    pub nix: bool,
    pub update_all: bool,
}

pub struct Context<'a> {
    pub flags: Flags,
    /// Overrides autodetection of the system manager.
    pub default_manager: Option<&'a str>,
    pub detector: &'a dyn DistroDetector,
    pub catalog: Catalog,
}

impl Context<'_> {
    fn system_manager(&self) -> Result<String> {
        match self.default_manager {
            Some(m) if self.catalog.lookup(m).is_some() => Ok(m.to_string()),
            Some(m) => Err(PaktError::Configuration(format!("default_manager '{m}' is not a supported package manager"))),
            None => distro::system_manager(self.detector).map(str::to_string),
        }
    }
}

type Decision = Result<Option<Vec<String>>>;

pub struct Strategy {
    pub name: &'static str,
    pub decide: fn(&Context<'_>) -> Decision,
}

fn use_flatpak(cx: &Context<'_>) -> Decision {
    Ok(cx.flags.flatpak.then(|| vec!["flatpak".to_string()]))
}

fn use_nix(cx: &Context<'_>) -> Decision {
    Ok(cx.flags.nix.then(|| vec!["nix".to_string()]))
}

fn update_all(cx: &Context<'_>) -> Decision {
    if !cx.flags.update_all {
        return Ok(None);
    }
    let system = cx.system_manager()?;
    if system == "flatpak" {
        return Ok(Some(vec![system]));
    }
    Ok(Some(vec![system, "flatpak".to_string()]))
}

fn system(cx: &Context<'_>) -> Decision {
    cx.system_manager().map(|m| Some(vec![m]))
}

pub static PRECEDENCE: &[Strategy] = &[
    Strategy { name: "--flatpak", decide: use_flatpak },
    Strategy { name: "--nix", decide: use_nix },
    Strategy { name: "--update-all", decide: update_all },
    Strategy { name: "system", decide: system },
];

pub fn select_with(strategies: &[Strategy], cx: &Context<'_>) -> Result<Vec<String>> {
    for s in strategies {
        if let Some(managers) = (s.decide)(cx)? {
            log::debug!("manager selection by {}: {:?}", s.name, managers);
            return Ok(managers);
        }
    }
    Err(PaktError::Detection("no package manager selected".into()))
}

pub fn select(cx: &Context<'_>) -> Result<Vec<String>> {
    select_with(PRECEDENCE, cx)
}
